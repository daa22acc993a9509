//! Database initialization and per-user single-column lookups.

use rusqlite::{Connection, Transaction as SqlTransaction, types::FromSql};

use crate::{
    Error, auth::UserID, auth::create_user_table, category::create_category_table,
    expense::create_expense_table,
};

/// Create the tables for the users, categories and expenses if they do not
/// exist yet and turn on foreign key enforcement for `connection`.
///
/// # Errors
/// Returns an error if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it must be set first.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_expense_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// The single-column values that can be listed for a user.
///
/// Each variant maps to a fixed query, so table and column names are never
/// built from request input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserValues {
    /// The names of the user's categories in alphabetical order.
    CategoryNames,
    /// The distinct years the user has recorded expenses in, oldest first.
    ExpenseYears,
}

impl UserValues {
    fn query(self) -> &'static str {
        match self {
            UserValues::CategoryNames => {
                "SELECT category FROM categories WHERE user_id = :user_id \
                ORDER BY category COLLATE NOCASE ASC;"
            }
            UserValues::ExpenseYears => {
                "SELECT DISTINCT year FROM expenses WHERE user_id = :user_id ORDER BY year ASC;"
            }
        }
    }
}

/// List the values named by `values` for the user `user_id`.
///
/// # Errors
/// Returns an [Error::SqlError] if the query failed or a value could not be
/// converted to `T`.
pub fn get_user_values<T: FromSql>(
    values: UserValues,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<T>, Error> {
    connection
        .prepare(values.query())?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| row.get(0))?
        .map(|maybe_value| maybe_value.map_err(|error| error.into()))
        .collect()
}

#[cfg(test)]
mod db_tests {
    use rusqlite::Connection;

    use crate::{
        PasswordHash,
        auth::{Username, create_user},
        db::{UserValues, get_user_values, initialize},
    };

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("Could not initialize database");
        initialize(&connection).expect("Could not initialize database twice");
    }

    #[test]
    fn initialize_enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let enabled: bool = connection
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();

        assert!(enabled);
    }

    #[test]
    fn user_values_are_scoped_to_user() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let alice = create_user(
            Username::new_unchecked("alice"),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        let bob = create_user(
            Username::new_unchecked("bob"),
            PasswordHash::new_unchecked("hunter3"),
            &connection,
        )
        .unwrap();
        connection
            .execute_batch(&format!(
                "INSERT INTO categories (user_id, category) VALUES ({alice}, 'Rent');
                INSERT INTO categories (user_id, category) VALUES ({alice}, 'Food');
                INSERT INTO categories (user_id, category) VALUES ({bob}, 'Travel');",
                alice = alice.id,
                bob = bob.id,
            ))
            .unwrap();

        let names: Vec<String> =
            get_user_values(UserValues::CategoryNames, alice.id, &connection).unwrap();
        let years: Vec<i32> =
            get_user_values(UserValues::ExpenseYears, alice.id, &connection).unwrap();

        assert_eq!(names, vec!["Food".to_owned(), "Rent".to_owned()]);
        assert!(years.is_empty());
    }
}
