//! The monthly view of expenses, the landing page for logged in users.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, Query};
use maud::{Markup, html};

use crate::{
    Error,
    auth::UserID,
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::nav_bar,
    report::{
        CategoryMonth, MONTHS, Period, ReportState, Selection, SelectionQuery, get_period,
        monthly_view, set_period, year_index,
    },
    timezone::get_local_today,
};

/// Render the user's expenses for the selected month, grouped by category and day.
///
/// The resolved period is stored in the period cookie for the next request.
pub async fn get_monthly_page(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Query(query): Query<SelectionQuery>,
) -> Result<Response, Error> {
    let today = get_local_today(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let remembered = get_period(&jar, user_id);
    let selection = Selection::resolve(&query, remembered.as_ref(), today);
    let mut period = remembered.unwrap_or_else(|| Period::new(user_id, selection.year));
    period.remember(selection);
    let jar = set_period(jar, &period)
        .inspect_err(|error| tracing::error!("Could not store the selected period: {error}"))?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let months = monthly_view(user_id, selection, &connection)
        .inspect_err(|error| tracing::error!("Could not get monthly view: {error}"))?;
    let mut years = year_index(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get expense years: {error}"))?;

    if !years.contains(&today.year()) {
        years.push(today.year());
    }
    if !years.contains(&selection.year) {
        years.push(selection.year);
    }
    years.sort_unstable();

    Ok((jar, monthly_view_page(selection, &years, &months)).into_response())
}

fn selection_form(selection: Selection, years: &[i32]) -> Markup {
    html!(
        form
            method="get"
            action=(endpoints::ROOT)
            class="w-full space-y-4"
        {
            div class="flex gap-2 items-center"
            {
                label for="disp_year" class="font-medium" { "Year" }

                select id="disp_year" name="disp_year" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for year in years {
                        option value=(year) selected[*year == selection.year] { (year) }
                    }
                }
            }

            fieldset
            {
                legend class="sr-only" { "Month" }

                div class="grid grid-cols-3 sm:grid-cols-6 gap-2"
                {
                    @for (index, month) in MONTHS.iter().enumerate() {
                        @let id = format!("month-{}", index + 1);

                        div class="flex"
                        {
                            input
                                type="radio"
                                id=(id)
                                name="months_radio"
                                value=(month)
                                class={ (FORM_RADIO_INPUT_STYLE) " sr-only" }
                                checked[index as u32 + 1 == selection.month];

                            label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (month) }
                        }
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Show" }
        }
    )
}

fn category_table(category_month: &CategoryMonth, selection: Selection) -> Markup {
    html!(
        section class="w-full"
        {
            div class="flex justify-between items-baseline mb-2"
            {
                h2 class="text-lg font-semibold" { (category_month.category.name) }

                span class="font-semibold"
                {
                    @match category_month.total {
                        Some(total) => { (format_currency(total)) }
                        None => { "-" }
                    }
                }
            }

            @if !category_month.days.is_empty() {
                div class="relative overflow-x-auto shadow-md rounded"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Day" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Delete" } }
                            }
                        }

                        tbody
                        {
                            @for day in &category_month.days {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (day.day) }
                                    td class=(TABLE_CELL_STYLE) { (format_currency(day.total)) }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        form method="post" action=(endpoints::DELETE_EXPENSE)
                                        {
                                            input type="hidden" name="del_expense" value=(day.expense_id);
                                            input type="hidden" name="disp_year" value=(selection.year);
                                            input type="hidden" name="months_radio" value=(selection.month_name());
                                            button type="submit" class=(BUTTON_DELETE_STYLE) { "Delete" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    )
}

fn monthly_view_page(selection: Selection, years: &[i32], months: &[CategoryMonth]) -> Markup {
    let month_total: f64 = months.iter().filter_map(|month| month.total).sum();

    let content = html!(
        (nav_bar(endpoints::ROOT))

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-2xl space-y-6"
            {
                h1 class="text-xl font-bold"
                {
                    (selection.month_name()) " " (selection.year)
                }

                (selection_form(selection, years))

                @if months.is_empty() {
                    p
                    {
                        "You have no categories yet. "
                        a href=(endpoints::CATEGORIES) class=(LINK_STYLE) { "Create a category" }
                        " to start recording expenses."
                    }
                } @else {
                    @for category_month in months {
                        (category_table(category_month, selection))
                    }

                    p class="text-right text-lg font-bold"
                    {
                        "Total: " (format_currency(month_total))
                    }
                }
            }
        }
    );

    base("Expenses", &[], &content)
}
