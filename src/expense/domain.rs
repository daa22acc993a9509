//! Core expense domain types and input validation.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, category::CategoryId};

/// Database identifier for an expense.
pub type ExpenseId = i64;

/// The day an expense was made.
///
/// Only the shape of the date is checked: it must be three integers separated
/// by dashes. Month and day ranges are left to the date picker in the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct ExpenseDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl ExpenseDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// Parse a date in the format year-month-day, e.g. "2024-03-15".
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidDate] if `text` is not three dash separated integers.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let invalid_date = || Error::InvalidDate(text.to_owned());

        let parts: Vec<&str> = text.trim().split('-').collect();
        let [year, month, day] = parts.as_slice() else {
            return Err(invalid_date());
        };

        Ok(Self {
            year: year.parse().map_err(|_| invalid_date())?,
            month: month.parse().map_err(|_| invalid_date())?,
            day: day.parse().map_err(|_| invalid_date())?,
        })
    }
}

impl FromStr for ExpenseDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExpenseDate::parse(s)
    }
}

impl Display for ExpenseDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Parse the amount of an expense in dollars.
///
/// # Errors
///
/// Returns [Error::InvalidAmount] if `text` is missing, not a number, or not greater than zero.
pub fn parse_amount(text: Option<&str>) -> Result<f64, Error> {
    let amount: f64 = text
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or(Error::InvalidAmount)?
        .parse()
        .map_err(|_| Error::InvalidAmount)?;

    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::InvalidAmount)
    }
}

/// Parse the category chosen for an expense.
///
/// The category select uses "0" for its placeholder option.
///
/// # Errors
///
/// Returns [Error::MissingCategory] if no category was chosen.
pub fn parse_category_id(text: Option<&str>) -> Result<CategoryId, Error> {
    match text.map(str::trim).map(str::parse::<CategoryId>) {
        Some(Ok(category_id)) if category_id != 0 => Ok(category_id),
        _ => Err(Error::MissingCategory),
    }
}

/// An expense recorded by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub category_id: CategoryId,
    pub date: ExpenseDate,
    /// The amount spent in dollars.
    pub amount: f64,
}

/// Raw form data for adding an expense.
///
/// Empty fields are read as `None`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ExpenseForm {
    pub date: Option<String>,
    pub category_id: Option<String>,
    pub expense: Option<String>,
}

/// Form data for deleting an expense.
///
/// `del_expense` asks to delete an expense, which may need the user to choose
/// between expenses on the same day. `del_chosen_expense` deletes exactly the
/// given expense.
///
/// `disp_year` and `months_radio` carry the month the user was looking at so
/// they can be sent back to it afterwards.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DeleteExpenseForm {
    pub del_expense: Option<ExpenseId>,
    pub del_chosen_expense: Option<ExpenseId>,
    pub disp_year: Option<i32>,
    pub months_radio: Option<String>,
}
