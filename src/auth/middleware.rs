//! Route guards that only let requests with a live session through.
//!
//! A request passes when its auth cookie holds an unexpired token. Handlers
//! behind a guard receive the user's ID with `Extension(user_id): Extension<UserID>`,
//! and every response pushes the session expiry back by [DEFAULT_COOKIE_DURATION].

use axum::{
    extract::{FromRef, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::{Duration, UtcOffset};

use crate::{
    AppState, Error,
    auth::{
        DEFAULT_COOKIE_DURATION, UserID,
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::{build_log_in_redirect_url, build_log_in_redirect_url_from_target},
    },
    endpoints,
    timezone::get_local_offset,
};

/// The state needed by the route guards.
#[derive(Clone)]
pub struct AuthState {
    /// The key for decrypting the auth cookie.
    pub cookie_key: Key,
    /// How long a session lasts after logging in without "remember me".
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// How a guard sends a client without a session to the log-in page.
#[derive(Debug, Clone, Copy)]
enum LogInPrompt {
    /// A 303 redirect, for page loads and plain form posts.
    Redirect,
    /// An `HX-Redirect` header, since HTMX does not follow redirects for swaps.
    HxRedirect,
}

impl LogInPrompt {
    fn respond(self, log_in_url: String) -> Response {
        match self {
            Self::Redirect => Redirect::to(&log_in_url).into_response(),
            Self::HxRedirect => (HxRedirect(log_in_url), StatusCode::OK).into_response(),
        }
    }
}

/// A logged in user's session, read from the request's cookies.
struct Session {
    user_id: UserID,
    jar: PrivateCookieJar,
    local_offset: UtcOffset,
}

fn open_session(state: &AuthState, parts: &Parts) -> Result<Session, Error> {
    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let jar = PrivateCookieJar::from_headers(&parts.headers, state.cookie_key.clone());
    let user_id = get_token_from_cookies(&jar)?.user_id;

    Ok(Session {
        user_id,
        jar,
        local_offset,
    })
}

/// The log-in URL that brings the client back to the page it asked for.
fn log_in_url(request: &Request) -> String {
    build_log_in_redirect_url(request)
        .or_else(|| {
            tracing::warn!("Could not build a redirect URL for {}", request.uri());
            build_log_in_redirect_url_from_target(endpoints::ROOT)
        })
        .unwrap_or_else(|| endpoints::LOG_IN.to_owned())
}

async fn guard(state: AuthState, prompt: LogInPrompt, request: Request, next: Next) -> Response {
    let log_in_url = log_in_url(&request);
    let (mut parts, body) = request.into_parts();

    let session = match open_session(&state, &parts) {
        Ok(session) => session,
        Err(error) => {
            tracing::debug!("No valid session ({error}), sending client to {log_in_url}");
            return prompt.respond(log_in_url);
        }
    };

    parts.extensions.insert(session.user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    match extend_auth_cookie_duration_if_needed(
        session.jar,
        DEFAULT_COOKIE_DURATION,
        session.local_offset,
    ) {
        Ok(jar) => (jar, response).into_response(),
        Err(error) => {
            tracing::error!("Could not extend the session of user {}: {error}", session.user_id);
            response
        }
    }
}

/// Guard for pages and plain form posts: clients without a session are
/// redirected to the log-in page.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard(state, LogInPrompt::Redirect, request, next).await
}

/// Guard for HTMX requests: clients without a session get an `HX-Redirect`
/// to the log-in page.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, LogInPrompt::HxRedirect, request, next).await
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Extension, Router,
        extract::State,
        middleware,
        routing::{get, post},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, SameSite},
    };
    use axum_test::{TestResponse, TestServer};
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error,
        app_state::create_cookie_key,
        auth::{
            AuthState, COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, UserID, auth_guard, auth_guard_hx,
            set_auth_cookie,
        },
        endpoints,
        timezone::get_local_offset,
    };

    const LOG_IN_ROUTE: &str = "/test_log_in";
    const PAGE_ROUTE: &str = "/whoami";
    const HX_ROUTE: &str = "/whoami_hx";

    async fn whoami(Extension(user_id): Extension<UserID>) -> String {
        user_id.to_string()
    }

    async fn log_in_as_user_7(
        State(state): State<AuthState>,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, Error> {
        let local_offset = get_local_offset(&state.local_timezone).unwrap();

        set_auth_cookie(jar, UserID::new(7), state.cookie_duration, local_offset)
    }

    fn get_test_server(cookie_duration: Duration, local_timezone: &str) -> TestServer {
        let state = AuthState {
            cookie_key: create_cookie_key("nafstenoas"),
            cookie_duration,
            local_timezone: local_timezone.to_owned(),
        };

        let page_routes = Router::new()
            .route(PAGE_ROUTE, get(whoami))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));
        let hx_routes = Router::new()
            .route(HX_ROUTE, post(whoami))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx));
        let app = page_routes
            .merge(hx_routes)
            .route(LOG_IN_ROUTE, post(log_in_as_user_7))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    async fn log_in(server: &TestServer) -> Cookie<'static> {
        let response = server.post(LOG_IN_ROUTE).await;
        response.assert_status_ok();

        response.cookie(COOKIE_TOKEN)
    }

    #[track_caller]
    fn assert_sent_to_log_in(response: &TestResponse, header: &str, target: &str) {
        let query = serde_urlencoded::to_string([("redirect_url", target)]).unwrap();
        let want = format!("{}?{}", endpoints::LOG_IN, query);

        assert_eq!(response.header(header), want);
    }

    #[tokio::test]
    async fn valid_session_reaches_handler_with_user_id() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION, "Etc/UTC");
        let token = log_in(&server).await;

        let response = server.get(PAGE_ROUTE).add_cookie(token).await;

        response.assert_status_ok();
        response.assert_text("7");
    }

    #[tokio::test]
    async fn session_is_extended_on_each_request() {
        let server = get_test_server(Duration::seconds(5), "Etc/UTC");
        let token = log_in(&server).await;
        let logged_in_at = OffsetDateTime::now_utc();

        let response = server.get(PAGE_ROUTE).add_cookie(token).await;

        let token = response.cookie(COOKIE_TOKEN);
        let expires_at = token.expires_datetime().unwrap();
        let want = logged_in_at + DEFAULT_COOKIE_DURATION;
        assert!(
            (expires_at - want).abs() < Duration::seconds(1),
            "got expiry {expires_at:?}, want {want:?}"
        );
        assert_eq!(token.secure(), Some(true));
        assert_eq!(token.http_only(), Some(true));
        assert_eq!(token.same_site(), Some(SameSite::Strict));
    }

    #[tokio::test]
    async fn missing_session_redirects_to_log_in() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION, "Etc/UTC");

        let response = server.get(PAGE_ROUTE).await;

        response.assert_status_see_other();
        assert_sent_to_log_in(&response, "location", PAGE_ROUTE);
    }

    #[tokio::test]
    async fn garbled_session_redirects_to_log_in() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION, "Etc/UTC");

        let response = server
            .get(PAGE_ROUTE)
            .add_cookie(Cookie::new(COOKIE_TOKEN, "FOOBAR"))
            .await;

        response.assert_status_see_other();
        assert_sent_to_log_in(&response, "location", PAGE_ROUTE);
    }

    #[tokio::test]
    async fn expired_session_redirects_to_log_in() {
        let server = get_test_server(Duration::seconds(-1), "Etc/UTC");
        let token = log_in(&server).await;

        let response = server.get(PAGE_ROUTE).add_cookie(token).await;

        response.assert_status_see_other();
        assert_sent_to_log_in(&response, "location", PAGE_ROUTE);
    }

    #[tokio::test]
    async fn bad_timezone_redirects_to_log_in() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION, "Etc/UTC");
        let token = log_in(&server).await;
        let misconfigured = get_test_server(DEFAULT_COOKIE_DURATION, "Middle/Earth");

        let response = misconfigured.get(PAGE_ROUTE).add_cookie(token).await;

        response.assert_status_see_other();
    }

    #[tokio::test]
    async fn htmx_request_gets_hx_redirect_back_to_current_page() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION, "Etc/UTC");
        let current_url = "/?disp_year=2024&months_radio=March";

        let response = server
            .post(HX_ROUTE)
            .add_header("HX-Request", "true")
            .add_header("HX-Current-URL", current_url)
            .await;

        response.assert_status_ok();
        assert_sent_to_log_in(&response, "hx-redirect", current_url);
    }
}
