//! Category creation endpoint.

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    Error,
    auth::UserID,
    category::{CategoryName, CategoryState, CreateCategoryForm, create_category},
    endpoints,
};

/// Create a category from the form data and reload the categories page.
///
/// Errors are returned as an alert.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<CreateCategoryForm>,
) -> Response {
    let name = match CategoryName::new(&form.category_name) {
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

    match create_category(user_id, name, &connection) {
        Ok(category) => {
            tracing::debug!("User {user_id} created category {}", category.name);
            (HxRedirect(endpoints::CATEGORIES.to_owned()), StatusCode::SEE_OTHER).into_response()
        }
        Err(error @ Error::DuplicateCategoryName(_)) => error.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");
            error.into_alert_response()
        }
    }
}
