//! Category rename endpoint.

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    Error,
    auth::UserID,
    category::{CategoryName, CategoryState, RenameCategoryForm, rename_category},
    endpoints,
};

/// Renaming happens on the categories page.
pub async fn get_rename_category() -> Redirect {
    Redirect::to(endpoints::CATEGORIES)
}

/// Rename one of the user's categories and reload the categories page.
///
/// The category keeps its ID, so its expenses move with it.
/// Errors are returned as an alert.
pub async fn rename_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<RenameCategoryForm>,
) -> Response {
    let old_name = match CategoryName::new(&form.old_name) {
        Ok(name) => name,
        Err(_) => return Error::UnknownCategory(form.old_name).into_alert_response(),
    };

    let new_name = match CategoryName::new(&form.new_name) {
        Ok(name) => name,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match rename_category(user_id, &old_name, new_name, &connection) {
        Ok(category) => {
            tracing::debug!("User {user_id} renamed category {old_name} to {}", category.name);
            (HxRedirect(endpoints::CATEGORIES.to_owned()), StatusCode::SEE_OTHER).into_response()
        }
        Err(error @ (Error::UnknownCategory(_) | Error::DuplicateCategoryName(_))) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while renaming a category: {error}");
            error.into_alert_response()
        }
    }
}
