//! The page with a pie chart of the year's spending by category.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, Query};
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    auth::UserID,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, PAGE_CONTAINER_STYLE, base, format_currency},
    navigation::nav_bar,
    report::{
        Period, ReportState,
        chart::{CHART_ID, category_pie_chart, chart_script},
        get_period, set_period, year_index, yearly_breakdown,
    },
    timezone::get_local_today,
};

#[derive(Debug, Default, Deserialize)]
pub struct StructureQuery {
    pub year: Option<i32>,
}

/// Render the pie chart for the session year.
///
/// The session year is the one last shown on the monthly view, or the current
/// year. A `year` in the query replaces the session year.
pub async fn get_structure_page(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Query(query): Query<StructureQuery>,
) -> Result<Response, Error> {
    let remembered = get_period(&jar, user_id);

    let year = match query.year.or(remembered.as_ref().map(|period| period.year)) {
        Some(year) => year,
        None => get_local_today(&state.local_timezone)
            .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?
            .year(),
    };

    let mut period = remembered.unwrap_or_else(|| Period::new(user_id, year));
    period.year = year;
    let jar = set_period(jar, &period)
        .inspect_err(|error| tracing::error!("Could not store the selected period: {error}"))?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let totals = yearly_breakdown(user_id, year, &connection)
        .inspect_err(|error| tracing::error!("Could not get yearly breakdown: {error}"))?;
    let years = year_index(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get expense years: {error}"))?;

    Ok((jar, structure_view(year, &years, &totals)).into_response())
}

fn year_picker(year: i32, years: &[i32]) -> Markup {
    html!(
        form
            method="get"
            action=(endpoints::STRUCTURE)
            class="flex gap-2 items-center"
        {
            label for="year" class="sr-only" { "Year" }

            select id="year" name="year" class=(FORM_TEXT_INPUT_STYLE)
            {
                @if !years.contains(&year) {
                    option value=(year) selected { (year) }
                }

                @for option_year in years {
                    option value=(option_year) selected[*option_year == year] { (option_year) }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Show" }
        }
    )
}

fn structure_view(year: i32, years: &[i32], totals: &[(String, f64)]) -> Markup {
    let grand_total: f64 = totals.iter().map(|(_, total)| total).sum();

    let head_elements = if totals.is_empty() {
        vec![]
    } else {
        let chart = category_pie_chart(year, totals);
        vec![
            HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
            chart_script(&chart),
        ]
    };

    let content = html!(
        (nav_bar(endpoints::STRUCTURE))

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-6"
            {
                div class="flex flex-wrap justify-between items-center gap-4"
                {
                    h1 class="text-xl font-bold" { "Spending in " (year) }
                    (year_picker(year, years))
                }

                @if totals.is_empty() {
                    p class="text-gray-500 dark:text-gray-400"
                    {
                        "No expenses recorded in " (year) "."
                    }
                } @else {
                    div
                        id=(CHART_ID)
                        class="min-h-[480px] rounded dark:bg-gray-100"
                    {}

                    p class="text-right font-semibold"
                    {
                        "Total: " (format_currency(grand_total))
                    }
                }
            }
        }
    );

    base("Chart", &head_elements, &content)
}
