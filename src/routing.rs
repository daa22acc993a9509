//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_page,
        get_rename_category, rename_category_endpoint,
    },
    endpoints,
    expense::{add_expense_endpoint, delete_expense_endpoint, get_add_expense_page},
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    report::{get_monthly_page, get_structure_page},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN, get(get_log_in_page).post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER, get(get_register_page).post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    // The expense delete form is a plain form post that responds with a full
    // page, so it uses normal redirects.
    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_monthly_page))
        .route(endpoints::ADD_EXPENSE, get(get_add_expense_page))
        .route(endpoints::CATEGORIES, get(get_categories_page))
        .route(endpoints::RENAME_CATEGORY, get(get_rename_category))
        .route(endpoints::STRUCTURE, get(get_structure_page))
        .route(endpoints::DELETE_EXPENSE, post(delete_expense_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::ADD_EXPENSE, post(add_expense_endpoint))
            .route(endpoints::CATEGORIES, post(create_category_endpoint))
            .route(endpoints::DELETE_CATEGORY, post(delete_category_endpoint))
            .route(endpoints::RENAME_CATEGORY, post(rename_category_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::{TestResponse, TestServer};
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::OffsetDateTime;

    use crate::{
        AppState, PasswordHash, ValidatedPassword,
        auth::{COOKIE_TOKEN, Username, create_user},
        endpoints,
        report::COOKIE_PERIOD,
        routing::build_router,
    };

    const PASSWORD: &str = "correct horse battery staple";

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().expect("Could not open database in memory.");
        let state = AppState::new(connection, "42", "Etc/UTC").expect("Could not create app state");

        create_user(
            Username::new_unchecked("alice"),
            PasswordHash::new(ValidatedPassword::new_unchecked(PASSWORD), 4).unwrap(),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    async fn log_in(server: &TestServer) -> Cookie<'static> {
        let response = server
            .post(endpoints::LOG_IN)
            .form(&[("username", "alice"), ("password", PASSWORD)])
            .await;

        response.assert_status_see_other();
        response.cookie(COOKIE_TOKEN)
    }

    #[tokio::test]
    async fn protected_page_redirects_to_log_in() {
        let server = get_test_server();

        let response = server.get(endpoints::CATEGORIES).await;

        response.assert_status_see_other();
        let location = response.header("location");
        let location = location.to_str().unwrap();
        assert!(
            location.starts_with(endpoints::LOG_IN),
            "want redirect to log in page, got {location}"
        );
    }

    #[tokio::test]
    async fn protected_htmx_post_uses_hx_redirect() {
        // Without a session cookie the guard replies before the handler runs.
        let server = get_test_server();

        let response = server
            .post(endpoints::CATEGORIES)
            .add_header("HX-Request", "true")
            .form(&[("category_name", "Food")])
            .await;

        let hx_redirect = response.header("hx-redirect");
        assert!(
            hx_redirect.to_str().unwrap().starts_with(endpoints::LOG_IN),
            "got {hx_redirect:?}"
        );
    }

    #[tokio::test]
    async fn log_in_page_is_public() {
        let server = get_test_server();

        server.get(endpoints::LOG_IN).await.assert_status_ok();
        server.get(endpoints::REGISTER).await.assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server();

        server
            .get("/definitely/not/a/page")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn internal_error_page_is_served() {
        let server = get_test_server();

        server
            .get(endpoints::INTERNAL_ERROR_VIEW)
            .await
            .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn rename_get_redirects_to_categories() {
        let server = get_test_server();
        let token = log_in(&server).await;

        let response = server.get(endpoints::RENAME_CATEGORY).add_cookie(token).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::CATEGORIES);
    }

    /// Create the category "Food" and record an expense in it through the forms.
    async fn add_food_expense(
        server: &TestServer,
        token: &Cookie<'static>,
        date: &str,
        amount: &str,
    ) {
        server
            .post(endpoints::CATEGORIES)
            .add_header("HX-Request", "true")
            .add_cookie(token.clone())
            .form(&[("category_name", "food")])
            .await
            .assert_status_see_other();

        let add_page = server
            .get(endpoints::ADD_EXPENSE)
            .add_cookie(token.clone())
            .await;
        add_page.assert_status_ok();
        let document = Html::parse_document(&add_page.text());
        let category_id = document
            .select(&Selector::parse("select[name=category_id] option:not([value=\"0\"])").unwrap())
            .next()
            .and_then(|option| option.value().attr("value"))
            .expect("No category option found")
            .to_owned();

        server
            .post(endpoints::ADD_EXPENSE)
            .add_header("HX-Request", "true")
            .add_cookie(token.clone())
            .form(&[
                ("date", date),
                ("category_id", category_id.as_str()),
                ("expense", amount),
            ])
            .await
            .assert_status_see_other();
    }

    fn heading(response: &TestResponse) -> String {
        Html::parse_document(&response.text())
            .select(&Selector::parse("h1").unwrap())
            .next()
            .map(|heading| heading.text().collect::<String>().trim().to_owned())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn record_expense_and_see_it_in_reports() {
        let server = get_test_server();
        let token = log_in(&server).await;

        add_food_expense(&server, &token, "2024-03-15", "42.50").await;

        let categories_page = server
            .get(endpoints::CATEGORIES)
            .add_cookie(token.clone())
            .await;
        categories_page.assert_status_ok();
        assert!(categories_page.text().contains("Food"));

        let monthly = server
            .get(endpoints::ROOT)
            .add_query_params([("disp_year", "2024"), ("months_radio", "March")])
            .add_cookie(token.clone())
            .await;
        monthly.assert_status_ok();
        assert!(monthly.text().contains("$42.50"));

        let structure = server
            .get(endpoints::STRUCTURE)
            .add_query_param("year", 2024)
            .add_cookie(token)
            .await;
        structure.assert_status_ok();
        assert!(structure.text().contains("$42.50"));
    }

    #[tokio::test]
    async fn chart_and_monthly_view_follow_selected_period() {
        let server = get_test_server();
        let token = log_in(&server).await;
        add_food_expense(&server, &token, "2024-03-15", "42.50").await;

        let monthly = server
            .get(endpoints::ROOT)
            .add_query_params([("disp_year", "2024"), ("months_radio", "March")])
            .add_cookie(token.clone())
            .await;
        monthly.assert_status_ok();
        let period = monthly.cookie(COOKIE_PERIOD);

        let structure = server
            .get(endpoints::STRUCTURE)
            .add_cookie(token.clone())
            .add_cookie(period.clone())
            .await;
        structure.assert_status_ok();
        assert_eq!(heading(&structure), "Spending in 2024");
        assert!(structure.text().contains("$42.50"));

        let monthly = server
            .get(endpoints::ROOT)
            .add_cookie(token)
            .add_cookie(period)
            .await;
        monthly.assert_status_ok();
        assert_eq!(heading(&monthly), "March 2024");
        assert!(monthly.text().contains("$42.50"));
    }

    #[tokio::test]
    async fn expense_added_after_picking_period_shows_in_that_month() {
        let server = get_test_server();
        let token = log_in(&server).await;

        let monthly = server
            .get(endpoints::ROOT)
            .add_query_params([("disp_year", "2023"), ("months_radio", "November")])
            .add_cookie(token.clone())
            .await;
        let period = monthly.cookie(COOKIE_PERIOD);
        add_food_expense(&server, &token, "2023-11-02", "9.99").await;

        let monthly = server
            .get(endpoints::ROOT)
            .add_cookie(token)
            .add_cookie(period)
            .await;

        assert_eq!(heading(&monthly), "November 2023");
        assert!(monthly.text().contains("$9.99"));
    }

    #[tokio::test]
    async fn log_out_clears_session() {
        let server = get_test_server();
        let token = log_in(&server).await;

        let response = server.get(endpoints::LOG_OUT).add_cookie(token).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN);
        for name in [COOKIE_TOKEN, COOKIE_PERIOD] {
            let cookie = response.cookie(name);
            assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        }
    }
}
