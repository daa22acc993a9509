//! Category deletion endpoint.

use axum::{
    Extension, Form,
    extract::State,
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    alert::Alert,
    auth::UserID,
    category::{CategoryDeletion, CategoryName, CategoryState, DeleteCategoryForm, delete_category},
};

/// Delete one of the user's categories if it has no expenses.
///
/// Returns a success alert that replaces the category in the list, or an
/// error alert if the category still has expenses.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<DeleteCategoryForm>,
) -> Response {
    let name = match CategoryName::new(&form.del_category) {
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

    match delete_category(user_id, &name, &connection) {
        Ok(CategoryDeletion::Deleted(category)) => Alert::Success {
            message: format!("Deleted {}", category.name),
            details: String::new(),
        }
        .into_response(),
        Ok(CategoryDeletion::NotFound) => Alert::Success {
            message: format!("{name} has already been deleted"),
            details: String::new(),
        }
        .into_response(),
        Err(error @ Error::CategoryNotEmpty(_)) => error.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while deleting category {name}: {error}");
            error.into_alert_response()
        }
    }
}
