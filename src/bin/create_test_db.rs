use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use spendbook::{
    CategoryName, ExpenseDate, PasswordHash, Username, ValidatedPassword, add_expense,
    create_category, create_user, initialize_db,
};

/// A utility for creating a test database for the spendbook server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Category names with a typical amount spent per expense.
const CATEGORIES: [(&str, f64); 5] = [
    ("Groceries", 84.2),
    ("Rent", 450.0),
    ("Eating Out", 23.5),
    ("Transport", 12.8),
    ("Entertainment", 35.0),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user 'test' with the password 'test'...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(Username::new("test")?, password_hash, &conn)?;

    println!("Creating categories and expenses...");

    for (index, (name, amount)) in CATEGORIES.into_iter().enumerate() {
        let category = create_category(user.id, CategoryName::new(name)?, &conn)?;

        for year in [2024, 2025] {
            for month in 1..=12 {
                // Spread the days out so some categories share a day and others do not.
                let day = (month * 3 + index as u32 * 5) % 28 + 1;
                let wobble = (month as f64 - 6.0) * 0.75;

                add_expense(
                    user.id,
                    ExpenseDate::new(year, month, day),
                    category.id,
                    amount + wobble,
                    &conn,
                )?;
            }
        }
    }

    println!("Success!");

    Ok(())
}
