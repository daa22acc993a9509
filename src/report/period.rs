//! Remembers the year shown on the monthly view, and the month last picked for
//! each year, across requests.
//!
//! The period lives in a private cookie next to the auth cookie, so the chart
//! page can follow the year picked on the monthly view.

use std::collections::BTreeMap;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::UserID, report::Selection};

pub(crate) const COOKIE_PERIOD: &str = "period";

/// The period a user last looked at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    /// The user the period belongs to.
    pub user_id: UserID,
    /// The year last shown.
    pub year: i32,
    /// The month number (1-12) last shown, keyed by year.
    pub months: BTreeMap<i32, u32>,
}

impl Period {
    /// A period for `year` with no months remembered yet.
    pub fn new(user_id: UserID, year: i32) -> Self {
        Self {
            user_id,
            year,
            months: BTreeMap::new(),
        }
    }

    /// Make `selection` the current period and remember its month for its year.
    pub fn remember(&mut self, selection: Selection) {
        self.year = selection.year;
        self.months.insert(selection.year, selection.month);
    }

    /// The month last shown for `year`, if any.
    pub fn month_for(&self, year: i32) -> Option<u32> {
        self.months.get(&year).copied()
    }
}

/// Get the period stored for `user_id`.
///
/// A missing or unreadable cookie, or one left behind by another user, gives `None`.
pub fn get_period(jar: &PrivateCookieJar, user_id: UserID) -> Option<Period> {
    let cookie = jar.get(COOKIE_PERIOD)?;

    let period: Period = serde_json::from_str(cookie.value())
        .inspect_err(|error| tracing::debug!("Ignoring unreadable period cookie: {error}"))
        .ok()?;

    (period.user_id == user_id).then_some(period)
}

/// Store `period` in the cookie jar.
///
/// # Errors
///
/// Returns an [Error::JSONSerializationError] if the period cannot be serialized.
pub fn set_period(jar: PrivateCookieJar, period: &Period) -> Result<PrivateCookieJar, Error> {
    let period_string = serde_json::to_string(period)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_PERIOD, period_string))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Overwrite the period cookie with an expired one so the client drops it.
pub fn forget_period(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_PERIOD, ""))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Read the period a response stores in its period cookie.
#[cfg(test)]
pub(crate) fn get_period_from_response(
    response: &axum::response::Response,
    key: &axum_extra::extract::cookie::Key,
    user_id: UserID,
) -> Option<Period> {
    use axum::http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, SET_COOKIE},
    };

    let cookie = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .filter_map(|header| Cookie::parse(header.to_owned()).ok())
        .find(|cookie| cookie.name() == COOKIE_PERIOD)?;

    let mut headers = HeaderMap::new();
    let header = format!("{}={}", cookie.name(), cookie.value());
    headers.insert(COOKIE, HeaderValue::from_str(&header).ok()?);

    get_period(&PrivateCookieJar::from_headers(&headers, key.clone()), user_id)
}
