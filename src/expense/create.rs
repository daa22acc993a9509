//! The page and endpoint for recording an expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{Category, list_categories},
    endpoints,
    expense::{ExpenseDate, ExpenseForm, add_expense, parse_amount, parse_category_id},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        base, dollar_input_styles, link, loading_spinner,
    },
    navigation::nav_bar,
    timezone::get_local_today,
};

/// The state needed for recording expenses.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical timezone name used for the default date.
    pub local_timezone: String,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the form for recording an expense.
pub async fn get_add_expense_page(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let today = ExpenseDate::new(today.year(), u8::from(today.month()) as u32, today.day() as u32);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = list_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    Ok(add_expense_view(today, &categories).into_response())
}

fn add_expense_form(today: ExpenseDate, categories: &[Category]) -> Markup {
    html!(
        form
            hx-post=(endpoints::ADD_EXPENSE)
            hx-target-error="#alert-container"
            hx-disabled-elt="find button"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    id="date"
                    type="date"
                    name="date"
                    value=(today)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select
                    id="category_id"
                    name="category_id"
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="0" selected { "Choose a category" }

                    @for category in categories {
                        option value=(category.id) { (category.name) }
                    }
                }
            }

            div
            {
                label for="expense" class=(FORM_LABEL_STYLE) { "Amount" }

                div class="input-wrapper w-full"
                {
                    input
                        id="expense"
                        type="number"
                        name="expense"
                        min="0.01"
                        step="0.01"
                        placeholder="0.00"
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" { (loading_spinner()) }
                "Add expense"
            }
        }
    )
}

fn add_expense_view(today: ExpenseDate, categories: &[Category]) -> Markup {
    let content = html!(
        (nav_bar(endpoints::ADD_EXPENSE))

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                h1 class="text-xl font-bold" { "Add expense" }

                @if categories.is_empty() {
                    p
                    {
                        "Expenses are recorded against a category. "
                        (link(endpoints::CATEGORIES, "Create a category"))
                        " first."
                    }
                } @else {
                    (add_expense_form(today, categories))
                }
            }
        }
    );

    base("Add Expense", &[dollar_input_styles()], &content)
}

/// Record an expense from the form data and redirect to the monthly view.
///
/// Errors are returned as an alert.
pub async fn add_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let date = match ExpenseDate::parse(form.date.as_deref().unwrap_or_default()) {
        Ok(date) => date,
        Err(error) => return error.into_alert_response(),
    };

    let category_id = match parse_category_id(form.category_id.as_deref()) {
        Ok(category_id) => category_id,
        Err(error) => return error.into_alert_response(),
    };

    let amount = match parse_amount(form.expense.as_deref()) {
        Ok(amount) => amount,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match add_expense(user_id, date, category_id, amount, &connection) {
        Ok(expense) => {
            tracing::debug!("User {user_id} added expense {} on {}", expense.id, expense.date);
            (HxRedirect(endpoints::ROOT.to_owned()), StatusCode::SEE_OTHER).into_response()
        }
        Err(error @ Error::InvalidCategory(_)) => {
            tracing::warn!("User {user_id} tried to add an expense with {error}");
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while adding an expense: {error}");
            error.into_alert_response()
        }
    }
}
