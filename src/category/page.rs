//! The categories page: lists the user's categories with forms to create,
//! rename and delete them.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{Category, list_categories},
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base,
    },
    navigation::nav_bar,
};

/// The state needed by the category pages and endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the categories page for the logged in user.
pub async fn get_categories_page(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = list_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    Ok(categories_view(&categories).into_response())
}

fn category_row(category: &Category) -> Markup {
    let confirm_message = format!("Are you sure you want to delete '{}'?", category.name);

    html!(
        li class="flex items-center justify-between py-3"
        {
            span class="font-medium" { (category.name) }

            form
                hx-post=(endpoints::DELETE_CATEGORY)
                hx-confirm=(confirm_message)
                hx-target="closest li"
                hx-target-error="#alert-container"
            {
                input type="hidden" name="del_category" value=(category.name);
                button type="submit" class=(BUTTON_DELETE_STYLE) { "Delete" }
            }
        }
    )
}

fn create_category_form() -> Markup {
    html!(
        form
            hx-post=(endpoints::CATEGORIES)
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            div
            {
                label for="category_name" class=(FORM_LABEL_STYLE) { "New category" }

                input
                    id="category_name"
                    type="text"
                    name="category_name"
                    placeholder="Category name"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add category" }
        }
    )
}

fn rename_category_form(categories: &[Category]) -> Markup {
    html!(
        form
            hx-post=(endpoints::RENAME_CATEGORY)
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            div
            {
                label for="old_name" class=(FORM_LABEL_STYLE) { "Category to rename" }

                select
                    id="old_name"
                    name="old_name"
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" disabled selected { "Choose a category" }

                    @for category in categories {
                        option value=(category.name) { (category.name) }
                    }
                }
            }

            div
            {
                label for="new_name" class=(FORM_LABEL_STYLE) { "New name" }

                input
                    id="new_name"
                    type="text"
                    name="new_name"
                    placeholder="New category name"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Rename category" }
        }
    )
}

fn categories_view(categories: &[Category]) -> Markup {
    let content = html!(
        (nav_bar(endpoints::CATEGORIES))

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-8"
            {
                section
                {
                    h1 class="text-xl font-bold mb-4" { "Categories" }

                    @if categories.is_empty() {
                        p class="text-gray-500 dark:text-gray-400"
                        {
                            "No categories yet. Add one below to start recording expenses."
                        }
                    } @else {
                        ul
                            id="category-list"
                            class="divide-y divide-gray-200 dark:divide-gray-700"
                        {
                            @for category in categories {
                                (category_row(category))
                            }
                        }
                    }
                }

                section { (create_category_form()) }

                @if !categories.is_empty() {
                    section { (rename_category_form(categories)) }
                }
            }
        }
    );

    base("Categories", &[], &content)
}
