//! Deleting expenses from the monthly view.
//!
//! A row in the monthly view is the sum of a category's expenses on one day.
//! When that row stands for several expenses the user is shown a page to pick
//! the one to delete.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    Error,
    auth::UserID,
    category::get_category,
    endpoints,
    expense::{
        DeleteExpenseForm, Expense, ExpenseDeletion, ExpenseState, delete_expense,
        delete_expense_with_disambiguation,
    },
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::nav_bar,
    report::SelectionQuery,
};

/// Delete an expense and go back to the month the user was looking at.
///
/// `del_chosen_expense` is deleted as is. `del_expense` is only deleted if it
/// is the sole expense on its day and category, otherwise a page listing the
/// candidates is shown.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<DeleteExpenseForm>,
) -> Result<Response, Error> {
    let selection = SelectionQuery {
        disp_year: form.disp_year,
        months_radio: form.months_radio,
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    if let Some(expense_id) = form.del_chosen_expense {
        delete_expense(user_id, expense_id, &connection)
            .inspect_err(|error| tracing::warn!("Could not delete expense {expense_id}: {error}"))?;
        tracing::debug!("User {user_id} deleted expense {expense_id}");

        return Ok(redirect_to_selection(&selection));
    }

    let Some(expense_id) = form.del_expense else {
        return Ok(Redirect::to(endpoints::ROOT).into_response());
    };

    match delete_expense_with_disambiguation(user_id, expense_id, &connection)
        .inspect_err(|error| tracing::warn!("Could not delete expense {expense_id}: {error}"))?
    {
        ExpenseDeletion::Deleted(expense) => {
            tracing::debug!("User {user_id} deleted expense {}", expense.id);
            Ok(redirect_to_selection(&selection))
        }
        ExpenseDeletion::Ambiguous(candidates) => {
            let category_name = get_category(user_id, candidates[0].category_id, &connection)?
                .name
                .to_string();

            Ok(choose_expense_view(&category_name, &candidates, &selection).into_response())
        }
    }
}

fn monthly_view_url(selection: &SelectionQuery) -> String {
    match serde_urlencoded::to_string(selection) {
        Ok(query) if !query.is_empty() => format!("{}?{query}", endpoints::ROOT),
        Ok(_) => endpoints::ROOT.to_owned(),
        Err(error) => {
            tracing::warn!("Could not encode month selection {selection:?}: {error}");
            endpoints::ROOT.to_owned()
        }
    }
}

fn redirect_to_selection(selection: &SelectionQuery) -> Response {
    Redirect::to(&monthly_view_url(selection)).into_response()
}

fn candidate_row(expense: &Expense, selection: &SelectionQuery) -> Markup {
    html!(
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (expense.date) }
            td class=(TABLE_CELL_STYLE) { (format_currency(expense.amount)) }
            td class=(TABLE_CELL_STYLE)
            {
                form method="post" action=(endpoints::DELETE_EXPENSE)
                {
                    input type="hidden" name="del_chosen_expense" value=(expense.id);

                    @if let Some(year) = selection.disp_year {
                        input type="hidden" name="disp_year" value=(year);
                    }

                    @if let Some(month) = &selection.months_radio {
                        input type="hidden" name="months_radio" value=(month);
                    }

                    button type="submit" class=(BUTTON_DELETE_STYLE) { "Delete" }
                }
            }
        }
    )
}

fn choose_expense_view(
    category_name: &str,
    candidates: &[Expense],
    selection: &SelectionQuery,
) -> Markup {
    let content = html!(
        (nav_bar(endpoints::ROOT))

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-2xl space-y-6"
            {
                h1 class="text-xl font-bold" { "Choose an expense to delete" }

                p
                {
                    "There is more than one " (category_name)
                    " expense on this day. Pick the one you want to delete."
                }

                div class="relative overflow-x-auto shadow-md rounded"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Delete" } }
                            }
                        }

                        tbody
                        {
                            @for expense in candidates {
                                (candidate_row(expense, selection))
                            }
                        }
                    }
                }

                a href=(monthly_view_url(selection)) class=(LINK_STYLE) { "Cancel" }
            }
        }
    );

    base("Delete Expense", &[], &content)
}

#[cfg(test)]
mod delete_expense_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use scraper::Selector;

    use crate::{
        Error,
        auth::UserID,
        category::{CategoryName, create_category},
        endpoints,
        expense::{DeleteExpenseForm, ExpenseState, get_expense},
        test_utils::{
            assert_valid_html, create_test_expense, create_test_user, get_header,
            get_test_db_connection, parse_html_document,
        },
    };

    use super::delete_expense_endpoint;

    fn state_with_user() -> (ExpenseState, UserID, i64) {
        let connection = get_test_db_connection();
        let user_id = create_test_user("alice", &connection);
        let food =
            create_category(user_id, CategoryName::new_unchecked("Food"), &connection).unwrap();
        let state = ExpenseState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        (state, user_id, food.id)
    }

    fn add_expense(state: &ExpenseState, user_id: UserID, category_id: i64, amount: f64) -> i64 {
        create_test_expense(
            user_id,
            category_id,
            (2024, 3, 15),
            amount,
            &state.db_connection.lock().unwrap(),
        )
    }

    #[tokio::test]
    async fn sole_expense_is_deleted_and_month_is_kept() {
        let (state, user_id, food_id) = state_with_user();
        let expense_id = add_expense(&state, user_id, food_id, 10.0);

        let response = delete_expense_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(DeleteExpenseForm {
                del_expense: Some(expense_id),
                disp_year: Some(2024),
                months_radio: Some("March".to_owned()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            get_header(&response, "location"),
            format!("{}?disp_year=2024&months_radio=March", endpoints::ROOT)
        );
        assert_eq!(
            get_expense(user_id, expense_id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn shared_day_shows_chooser_and_deletes_nothing() {
        let (state, user_id, food_id) = state_with_user();
        let first = add_expense(&state, user_id, food_id, 10.0);
        let second = add_expense(&state, user_id, food_id, 2.5);

        let response = delete_expense_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(DeleteExpenseForm {
                del_expense: Some(first),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let chosen_ids = document
            .select(&Selector::parse("input[name=del_chosen_expense]").unwrap())
            .map(|input| input.value().attr("value").unwrap_or_default().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(chosen_ids, vec![first.to_string(), second.to_string()]);
        let text = document.root_element().text().collect::<String>();
        assert!(text.contains("Food"), "got {text:?}");
        assert!(text.contains("$2.50"), "got {text:?}");

        let connection = state.db_connection.lock().unwrap();
        assert!(get_expense(user_id, first, &connection).is_ok());
        assert!(get_expense(user_id, second, &connection).is_ok());
    }

    #[tokio::test]
    async fn chosen_expense_is_deleted() {
        let (state, user_id, food_id) = state_with_user();
        let first = add_expense(&state, user_id, food_id, 10.0);
        let second = add_expense(&state, user_id, food_id, 2.5);

        let response = delete_expense_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(DeleteExpenseForm {
                del_chosen_expense: Some(second),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(get_header(&response, "location"), endpoints::ROOT);
        let connection = state.db_connection.lock().unwrap();
        assert!(get_expense(user_id, first, &connection).is_ok());
        assert_eq!(get_expense(user_id, second, &connection), Err(Error::NotFound));
    }

    #[tokio::test]
    async fn other_users_expense_is_not_found() {
        let (state, user_id, food_id) = state_with_user();
        let expense_id = add_expense(&state, user_id, food_id, 10.0);
        let mallory = create_test_user("mallory", &state.db_connection.lock().unwrap());

        let result = delete_expense_endpoint(
            State(state.clone()),
            Extension(mallory),
            Form(DeleteExpenseForm {
                del_chosen_expense: Some(expense_id),
                ..Default::default()
            }),
        )
        .await;

        assert_eq!(result.err(), Some(Error::DeleteMissingExpense));
        assert!(get_expense(user_id, expense_id, &state.db_connection.lock().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn empty_form_redirects_to_monthly_view() {
        let (state, user_id, _) = state_with_user();

        let response = delete_expense_endpoint(
            State(state),
            Extension(user_id),
            Form(DeleteExpenseForm::default()),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(get_header(&response, "location"), endpoints::ROOT);
    }
}
