use rusqlite::Connection;

use crate::{
    auth::{PasswordHash, UserID, Username, create_user},
    category::CategoryId,
    db::initialize,
    expense::{ExpenseDate, ExpenseId, add_expense},
};

/// An in-memory database with all tables created.
pub(crate) fn get_test_db_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize test database");

    connection
}

pub(crate) fn create_test_user(username: &str, connection: &Connection) -> UserID {
    create_user(
        Username::new_unchecked(username),
        PasswordHash::new_unchecked("hunter2"),
        connection,
    )
    .expect("Could not create test user")
    .id
}

pub(crate) fn create_test_expense(
    user_id: UserID,
    category_id: CategoryId,
    (year, month, day): (i32, u32, u32),
    amount: f64,
    connection: &Connection,
) -> ExpenseId {
    add_expense(
        user_id,
        ExpenseDate::new(year, month, day),
        category_id,
        amount,
        connection,
    )
    .expect("Could not create test expense")
    .id
}
