//! Reports over a user's expenses: the monthly view and the yearly pie chart.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;

use crate::AppState;

mod aggregation;
mod chart;
mod monthly_page;
mod period;
mod selection;
mod structure_page;

pub use aggregation::{CategoryMonth, DailyTotal, monthly_view, year_index, yearly_breakdown};
pub use monthly_page::get_monthly_page;
pub use period::{Period, forget_period, get_period, set_period};
pub use selection::{MONTHS, Selection, SelectionQuery, month_name, month_number};
pub use structure_page::get_structure_page;

#[cfg(test)]
pub(crate) use period::{COOKIE_PERIOD, get_period_from_response};

/// The state needed by the report pages.
#[derive(Debug, Clone)]
pub struct ReportState {
    /// The key for the private cookie that remembers the selected period.
    pub cookie_key: Key,
    pub db_connection: Arc<Mutex<Connection>>,
    /// The canonical timezone name used to work out the current month and year.
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl FromRef<ReportState> for Key {
    fn from_ref(state: &ReportState) -> Self {
        state.cookie_key.clone()
    }
}

#[cfg(test)]
pub(crate) fn get_test_report_state(
    db_connection: Connection,
    local_timezone: &str,
) -> ReportState {
    ReportState {
        cookie_key: crate::app_state::create_cookie_key("foobar"),
        db_connection: Arc::new(Mutex::new(db_connection)),
        local_timezone: local_timezone.to_owned(),
    }
}
