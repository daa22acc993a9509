//! Database operations for expenses.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    auth::UserID,
    category::{CategoryId, get_category},
    expense::{Expense, ExpenseDate, ExpenseId},
};

/// Initialize the expense table and indexes.
///
/// Categories that still have expenses cannot be deleted.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id),
            category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE RESTRICT,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            day INTEGER NOT NULL,
            expense REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_expenses_user_year_month ON expenses(user_id, year, month);",
    )?;

    Ok(())
}

/// Record an expense for `user_id` and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::InvalidCategory] if `category_id` is not one of the user's categories.
pub fn add_expense(
    user_id: UserID,
    date: ExpenseDate,
    category_id: CategoryId,
    amount: f64,
    connection: &Connection,
) -> Result<Expense, Error> {
    match get_category(user_id, category_id, connection) {
        Ok(_) => {}
        Err(Error::NotFound) => return Err(Error::InvalidCategory(category_id)),
        Err(error) => return Err(error),
    }

    connection.execute(
        "INSERT INTO expenses (user_id, category_id, year, month, day, expense) \
        VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        (
            user_id.as_i64(),
            category_id,
            date.year,
            date.month,
            date.day,
            amount,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Expense {
        id,
        category_id,
        date,
        amount,
    })
}

/// Retrieve one of the user's expenses by ID.
pub fn get_expense(
    user_id: UserID,
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(
            "SELECT id, category_id, year, month, day, expense FROM expenses \
            WHERE id = :id AND user_id = :user_id;",
        )?
        .query_row(
            &[(":id", &expense_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the user's expenses recorded on the same day and in the same
/// category as `expense`, including `expense` itself, ordered by ID.
pub fn get_expenses_on_same_day(
    user_id: UserID,
    expense: &Expense,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT id, category_id, year, month, day, expense FROM expenses \
            WHERE user_id = ?1 AND year = ?2 AND month = ?3 AND day = ?4 AND category_id = ?5 \
            ORDER BY id ASC;",
        )?
        .query_map(
            (
                user_id.as_i64(),
                expense.date.year,
                expense.date.month,
                expense.date.day,
                expense.category_id,
            ),
            map_row,
        )?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Delete one of the user's expenses by ID.
///
/// # Errors
///
/// Returns [Error::DeleteMissingExpense] if the expense does not exist or
/// belongs to another user.
pub fn delete_expense(
    user_id: UserID,
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM expenses WHERE id = ?1 AND user_id = ?2;",
        (expense_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingExpense);
    }

    Ok(())
}

/// The result of a successful call to [delete_expense_with_disambiguation].
#[derive(Debug, PartialEq)]
pub enum ExpenseDeletion {
    /// The expense was the only one on its day and category and has been deleted.
    Deleted(Expense),
    /// Several expenses share the day and category. Nothing was deleted and
    /// the user must pick one of these candidates.
    Ambiguous(Vec<Expense>),
}

/// Delete the expense `expense_id` unless other expenses were recorded on the
/// same day and in the same category.
///
/// The monthly view shows one row per day and category, so a row may stand
/// for several expenses. In that case the candidates are returned and the
/// caller should follow up with [delete_expense] on the chosen one.
///
/// # Errors
///
/// Returns [Error::DeleteMissingExpense] if the expense does not exist or
/// belongs to another user.
pub fn delete_expense_with_disambiguation(
    user_id: UserID,
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<ExpenseDeletion, Error> {
    let expense = match get_expense(user_id, expense_id, connection) {
        Ok(expense) => expense,
        Err(Error::NotFound) => return Err(Error::DeleteMissingExpense),
        Err(error) => return Err(error),
    };

    let candidates = get_expenses_on_same_day(user_id, &expense, connection)?;

    if candidates.len() > 1 {
        return Ok(ExpenseDeletion::Ambiguous(candidates));
    }

    delete_expense(user_id, expense.id, connection)?;

    Ok(ExpenseDeletion::Deleted(expense))
}

fn map_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        category_id: row.get(1)?,
        date: ExpenseDate {
            year: row.get(2)?,
            month: row.get(3)?,
            day: row.get(4)?,
        },
        amount: row.get(5)?,
    })
}
