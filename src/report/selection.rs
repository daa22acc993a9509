//! The year and month a report is shown for.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::report::Period;

/// English month names, January first.
pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Get the month number (1-12) for an English month name, ignoring case.
pub fn month_number(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|month| month.eq_ignore_ascii_case(name.trim()))
        .map(|index| index as u32 + 1)
}

/// Get the English name of the month number `month` (1-12).
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTHS.get(month.checked_sub(1)? as usize).copied()
}

/// The query parameters used to pick the period for the monthly view.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SelectionQuery {
    pub disp_year: Option<i32>,
    /// An English month name, e.g. "March".
    pub months_radio: Option<String>,
}

/// The year and month to show expenses for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub year: i32,
    /// The month number, 1-12.
    pub month: u32,
}

impl Selection {
    /// Resolve the selection from the query.
    ///
    /// Anything the query leaves out or gets wrong comes from the `remembered`
    /// period, then from `today`.
    pub fn resolve(query: &SelectionQuery, remembered: Option<&Period>, today: Date) -> Self {
        let year = query
            .disp_year
            .or(remembered.map(|period| period.year))
            .unwrap_or(today.year());

        let requested_month = query.months_radio.as_deref().and_then(|name| {
            let month = month_number(name);
            if month.is_none() {
                tracing::debug!("Ignoring unknown month name \"{name}\"");
            }
            month
        });

        let month = requested_month
            .or_else(|| remembered.and_then(|period| period.month_for(year)))
            .unwrap_or(u8::from(today.month()) as u32);

        Self { year, month }
    }

    /// The English name of the selected month.
    pub fn month_name(&self) -> &'static str {
        month_name(self.month).unwrap_or(MONTHS[0])
    }
}
