//! The state shared by all request handlers.
//!
//! Handlers do not take [AppState] directly. Each feature declares the state it
//! needs and builds it from the app state with [FromRef].

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{Error, auth::DEFAULT_COOKIE_DURATION, db::initialize, timezone::get_local_offset};

/// The state of the web server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key for encrypting the auth and period cookies.
    pub cookie_key: Key,

    /// How long a session lasts after logging in without "remember me".
    pub cookie_duration: Duration,

    /// The canonical name of the timezone used for "today", e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The connection to the users, categories and expenses tables.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Prepare `db_connection` for the app and derive the cookie key from `cookie_secret`.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [Error::InvalidTimezoneError] if `local_timezone` is not a canonical timezone name.
    /// - a database error if the tables cannot be created.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the cookie key from `secret`, so sessions survive a server restart
/// with the same secret.
pub fn create_cookie_key(secret: &str) -> Key {
    Key::from(&Sha512::digest(secret))
}

#[cfg(test)]
mod app_state_tests {
    use rusqlite::Connection;

    use crate::Error;

    use super::{AppState, create_cookie_key};

    #[test]
    fn creates_tables() {
        let connection = Connection::open_in_memory().unwrap();

        let state = AppState::new(connection, "42", "Pacific/Auckland").unwrap();

        let connection = state.db_connection.lock().unwrap();
        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
                 AND name IN ('users', 'categories', 'expenses')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 3);
    }

    #[test]
    fn rejects_unknown_timezone() {
        let connection = Connection::open_in_memory().unwrap();

        let result = AppState::new(connection, "42", "Middle/Earth");

        assert!(
            matches!(result, Err(Error::InvalidTimezoneError(ref timezone)) if timezone == "Middle/Earth")
        );
    }

    #[test]
    fn same_secret_gives_same_key() {
        assert_eq!(
            create_cookie_key("hunter2").master(),
            create_cookie_key("hunter2").master()
        );
        assert_ne!(
            create_cookie_key("hunter2").master(),
            create_cookie_key("hunter3").master()
        );
    }
}
