//! The registration page for creating a new user account.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{PasswordHash, Username, ValidatedPassword, create_user, get_user_by_username},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, base, loading_spinner, log_in_register, password_input, text_input},
    internal_server_error::get_internal_server_error_redirect,
};

#[derive(Default)]
struct RegisterFormErrors<'a> {
    username: Option<&'a str>,
    password: Option<&'a str>,
    confirmation: Option<&'a str>,
}

fn registration_form(username: &str, errors: RegisterFormErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::REGISTER)
            hx-target="this"
            hx-target-error="this"
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("Username", "username", username, username.is_empty(), errors.username))
            (password_input("Password", "password", false, errors.password))
            (password_input("Confirm Password", "confirmation", false, errors.confirmation))

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Register"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", RegisterFormErrors::default());
    let content = log_in_register("Create an account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirmation: String,
}

/// Create a new user from the registration form.
///
/// The new user is not logged in. On success the client is redirected to the
/// log-in page, otherwise the form is returned with the problem highlighted.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let raw_username = user_data.username.trim();

    let form_error = |error: Error| {
        let message = error.to_string();
        let errors = match error {
            Error::EmptyUsername | Error::DuplicateUsername(_) => RegisterFormErrors {
                username: Some(&message),
                ..Default::default()
            },
            Error::EmptyPassword => RegisterFormErrors {
                password: Some(&message),
                ..Default::default()
            },
            Error::PasswordMismatch => RegisterFormErrors {
                confirmation: Some(&message),
                ..Default::default()
            },
            ref other => {
                tracing::error!("An unhandled error occurred while registering a user: {other}");
                return get_internal_server_error_redirect();
            }
        };

        (error.status_code(), registration_form(raw_username, errors)).into_response()
    };

    let username = match Username::new(raw_username) {
        Ok(username) => username,
        Err(error) => return form_error(error),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return get_internal_server_error_redirect();
        }
    };

    match get_user_by_username(username.as_ref(), &connection) {
        Ok(_) => return form_error(Error::DuplicateUsername(username.to_string())),
        Err(Error::NotFound) => {}
        Err(error) => return form_error(error),
    }

    let validated_password = match ValidatedPassword::new(&user_data.password) {
        Ok(password) => password,
        Err(error) => return form_error(error),
    };

    if user_data.password != user_data.confirmation {
        return form_error(Error::PasswordMismatch);
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("an error occurred while hashing a password: {e}");

            return get_internal_server_error_redirect();
        }
    };

    match create_user(username, password_hash, &connection) {
        Ok(user) => {
            tracing::info!("Registered user {} with ID {}", user.username, user.id);
            (
                HxRedirect(endpoints::LOG_IN.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => form_error(error),
    }
}
