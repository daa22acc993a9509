//! Sums of expenses per category by day, month and year.
//!
//! All queries are scoped by user, so a report never includes another user's expenses.

use std::collections::HashMap;

use rusqlite::Connection;

use crate::{
    Error,
    auth::UserID,
    category::{Category, CategoryId, list_categories},
    db::{UserValues, get_user_values},
    expense::ExpenseId,
    report::Selection,
};

/// The sum of a category's expenses on one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotal {
    /// The smallest ID of the expenses in the group. Deleting via this ID asks
    /// the user to choose when there is more than one expense.
    pub expense_id: ExpenseId,
    pub day: u32,
    pub total: f64,
}

/// A category's expenses for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMonth {
    pub category: Category,
    /// The daily totals ordered by day. Empty if there were no expenses.
    pub days: Vec<DailyTotal>,
    /// The total for the month, `None` if there were no expenses.
    pub total: Option<f64>,
}

/// Get every category of the user, alphabetically, with its expenses in the
/// selected month summed by day.
///
/// Categories without expenses in the month are included with no days.
pub fn monthly_view(
    user_id: UserID,
    selection: Selection,
    connection: &Connection,
) -> Result<Vec<CategoryMonth>, Error> {
    let categories = list_categories(user_id, connection)?;

    let mut days_by_category: HashMap<CategoryId, Vec<DailyTotal>> = HashMap::new();

    let rows = connection
        .prepare(
            "SELECT category_id, day, MIN(id), SUM(expense) FROM expenses \
            WHERE user_id = ?1 AND year = ?2 AND month = ?3 \
            GROUP BY category_id, day \
            ORDER BY day ASC;",
        )?
        .query_map((user_id.as_i64(), selection.year, selection.month), |row| {
            let category_id: CategoryId = row.get(0)?;

            Ok((
                category_id,
                DailyTotal {
                    day: row.get(1)?,
                    expense_id: row.get(2)?,
                    total: row.get(3)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;

    for (category_id, daily_total) in rows {
        days_by_category
            .entry(category_id)
            .or_default()
            .push(daily_total);
    }

    let view = categories
        .into_iter()
        .map(|category| {
            let days = days_by_category.remove(&category.id).unwrap_or_default();
            let total = (!days.is_empty()).then(|| days.iter().map(|day| day.total).sum::<f64>());

            CategoryMonth {
                category,
                days,
                total,
            }
        })
        .collect();

    Ok(view)
}

/// Get the total spent per category in `year`, ordered by category name.
///
/// Categories with no expenses in `year` are left out.
pub fn yearly_breakdown(
    user_id: UserID,
    year: i32,
    connection: &Connection,
) -> Result<Vec<(String, f64)>, Error> {
    connection
        .prepare(
            "SELECT categories.category, SUM(expenses.expense) FROM expenses \
            INNER JOIN categories \
                ON expenses.category_id = categories.id \
                AND expenses.user_id = categories.user_id \
            WHERE expenses.user_id = ?1 AND expenses.year = ?2 \
            GROUP BY categories.id \
            HAVING SUM(expenses.expense) > 0 \
            ORDER BY categories.category COLLATE NOCASE ASC;",
        )?
        .query_map((user_id.as_i64(), year), |row| Ok((row.get(0)?, row.get(1)?)))?
        .map(|maybe_total| maybe_total.map_err(|error| error.into()))
        .collect()
}

/// Get the years the user has recorded expenses in, oldest first.
pub fn year_index(user_id: UserID, connection: &Connection) -> Result<Vec<i32>, Error> {
    get_user_values(UserValues::ExpenseYears, user_id, connection)
}
