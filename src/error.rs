//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    alert::Alert, category::CategoryId, html::error_view,
    internal_server_error::InternalServerError, not_found::NotFoundError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The username was not found or the password did not match its hash.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth token cookie could not be parsed or has expired.
    #[error("the auth token is invalid or has expired")]
    InvalidToken,

    /// An empty string was used for a username.
    #[error("Must provide username.")]
    EmptyUsername,

    /// An empty string was used for a password.
    #[error("Must provide password.")]
    EmptyPassword,

    /// The password and its confirmation differ.
    #[error("Passwords must be the same.")]
    PasswordMismatch,

    /// The username is already registered.
    #[error("Username already exists.")]
    DuplicateUsername(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An empty string was used to create a category name.
    #[error("Must provide category name.")]
    EmptyCategoryName,

    /// The named category does not belong to the user.
    #[error("the category \"{0}\" does not exist")]
    UnknownCategory(String),

    /// The category name already exists for the user (ignoring case).
    #[error("the category \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// The category still has expenses and cannot be deleted.
    #[error("Cannot delete. {0} category is not empty.")]
    CategoryNotEmpty(String),

    /// No category was chosen for an expense.
    #[error("Must select a category.")]
    MissingCategory,

    /// The category ID used to create an expense did not match one of the
    /// user's categories.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// The date for an expense was not in the year-month-day format.
    #[error("\"{0}\" is not a date in the format year-month-day")]
    InvalidDate(String),

    /// The expense amount was missing, zero or negative.
    #[error("Must provide an amount greater than zero.")]
    InvalidAmount,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to delete an expense that does not exist or belongs to another user.
    #[error("tried to delete an expense that is not in the database")]
    DeleteMissingExpense,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// Returns true if `error` is a failed UNIQUE constraint on `column`, e.g. "users.username".
pub(crate) fn is_unique_violation(error: &rusqlite::Error, column: &str) -> bool {
    // Code 2067 occurs when a UNIQUE constraint failed.
    matches!(
        error,
        rusqlite::Error::SqliteFailure(sql_error, Some(desc))
            if sql_error.extended_code == 2067 && desc.ends_with(column)
    )
}

/// Returns true if `error` is a failed FOREIGN KEY constraint.
pub(crate) fn is_foreign_key_violation(error: &rusqlite::Error) -> bool {
    // Code 787 occurs when a FOREIGN KEY constraint failed.
    matches!(
        error,
        rusqlite::Error::SqliteFailure(sql_error, _) if sql_error.extended_code == 787
    )
}

impl Error {
    /// The HTTP status code that best describes the error to a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::EmptyUsername
            | Error::EmptyPassword
            | Error::PasswordMismatch
            | Error::EmptyCategoryName
            | Error::UnknownCategory(_)
            | Error::MissingCategory
            | Error::InvalidCategory(_)
            | Error::InvalidDate(_)
            | Error::InvalidAmount => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::CookieMissing | Error::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Error::DuplicateUsername(_)
            | Error::DuplicateCategoryName(_)
            | Error::CategoryNotEmpty(_) => StatusCode::CONFLICT,
            Error::NotFound | Error::DeleteMissingExpense => StatusCode::NOT_FOUND,
            Error::HashingError(_)
            | Error::SqlError(_)
            | Error::InvalidTimezoneError(_)
            | Error::JSONSerializationError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::DeleteMissingExpense => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            error if error.status_code().is_client_error() => {
                let status_code = error.status_code();
                let page = error_view(
                    "Error",
                    status_code.as_str(),
                    "Sorry, that did not work.",
                    &error.to_string(),
                );

                (status_code, page).into_response()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let status_code = self.status_code();

        let alert = match self {
            Error::InvalidTimezoneError(timezone) => Alert::Error {
                message: "Invalid Timezone Settings".to_owned(),
                details: format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            },
            Error::EmptyCategoryName => Alert::ErrorSimple {
                message: "Must provide category name.".to_owned(),
            },
            Error::UnknownCategory(_) => Alert::ErrorSimple {
                message: "Must provide correct category name.".to_owned(),
            },
            Error::DuplicateCategoryName(name) => Alert::Error {
                message: "Category name already exists.".to_owned(),
                details: format!(
                    "You already have a category called {name}. \
                    Choose a different name, or rename or delete the existing category."
                ),
            },
            Error::CategoryNotEmpty(name) => Alert::Error {
                message: format!("Cannot delete. {name} category is not empty."),
                details: "Delete the expenses in this category first.".to_owned(),
            },
            Error::MissingCategory => Alert::ErrorSimple {
                message: "Must select a category.".to_owned(),
            },
            Error::InvalidCategory(category_id) => Alert::Error {
                message: "Invalid category".to_owned(),
                details: format!("Could not find a category with the ID {category_id}"),
            },
            Error::InvalidDate(date) => Alert::Error {
                message: "Invalid expense date".to_owned(),
                details: format!("\"{date}\" is not a date in the format year-month-day."),
            },
            Error::InvalidAmount => Alert::ErrorSimple {
                message: "Must provide an amount greater than zero.".to_owned(),
            },
            Error::DeleteMissingExpense => Alert::Error {
                message: "Could not delete expense".to_owned(),
                details: "The expense could not be found. \
                    Try refreshing the page to see if the expense has already been deleted."
                    .to_owned(),
            },
            Error::NotFound => Alert::ErrorSimple {
                message: "The requested resource could not be found.".to_owned(),
            },
            error if status_code.is_client_error() => Alert::ErrorSimple {
                message: error.to_string(),
            },
            _ => Alert::Error {
                message: "Something went wrong".to_owned(),
                details: "An unexpected error occurred, check the server logs for more details."
                    .to_owned(),
            },
        };

        (status_code, alert.into_html()).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{
        Error,
        test_utils::{assert_valid_html, parse_html_fragment},
    };

    #[test]
    fn status_codes_follow_error_categories() {
        assert_eq!(Error::EmptyCategoryName.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::DuplicateCategoryName("Food".to_owned()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(Error::DeleteMissingExpense.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::DatabaseLockError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn query_returned_no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[tokio::test]
    async fn alert_response_uses_status_and_message() {
        let response = Error::CategoryNotEmpty("Food".to_owned()).into_alert_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let text = html.root_element().text().collect::<String>();
        assert!(
            text.contains("Cannot delete. Food category is not empty."),
            "got alert text {text:?}"
        );
    }

    #[tokio::test]
    async fn unexpected_errors_hide_details() {
        let response = Error::HashingError("secret details".to_owned()).into_alert_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(!text.contains("secret details"));
    }

    #[test]
    fn not_found_renders_404_page() {
        let response = Error::NotFound.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
