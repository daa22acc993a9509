//! Ends a session by expiring every cookie set while logged in.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;

use crate::{auth::invalidate_auth_cookie, endpoints, report::forget_period};

/// Expire the auth and period cookies and send the client back to the log-in page.
pub async fn get_log_out(jar: PrivateCookieJar) -> Response {
    let jar = forget_period(invalidate_auth_cookie(jar));

    (jar, Redirect::to(endpoints::LOG_IN)).into_response()
}
