//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Dashboard (redirects to onboarding first)
//! GET  /health                    - Liveness
//! GET  /health/ready              - Readiness (database)
//!
//! # Auth
//! GET  /sign-in                   - Sign-in page
//! POST /sign-in                   - Sign-in action (rate limited)
//! GET  /sign-up                   - Sign-up page
//! POST /sign-up                   - Sign-up action (rate limited)
//! POST /sign-out                  - Sign-out action
//!
//! # Profile (requires auth)
//! GET  /onboarding                - Profile editor for new users
//! GET  /profile/edit              - Profile editor
//!
//! # Exchanges (requires auth)
//! GET  /exchanges/current         - Open exchanges not yet joined
//! GET  /exchanges/{id}/join       - Join form
//! POST /exchanges/{id}/join       - Join action
//!
//! # Resources (requires auth)
//! POST /resources/image-upload    - Multipart photo -> JSON data URI
//! POST /resources/profile-editor  - Profile editor form target
//!
//! # Pages
//! GET  /privacy, /tos, /deletion
//! GET  /static/*
//! ```

pub mod auth;
pub mod dashboard;
pub mod exchanges;
pub mod pages;
pub mod profile;
pub mod resources;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::middleware::{
    auth_rate_limiter, request_id_middleware, security_headers_middleware, upload_rate_limiter,
};
use crate::state::AppState;

/// Slack on top of the photo cap for multipart boundaries and headers.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Static assets may be cached briefly; `main.css` is cache-busted by hash.
const STATIC_CACHE_CONTROL: &str = "public, max-age=3600";

/// Create the auth routes router. Only form submissions are rate limited.
pub fn auth_routes() -> Router<AppState> {
    let submissions = Router::new()
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-up", post(auth::sign_up))
        .route_layer(auth_rate_limiter());

    Router::new()
        .route("/sign-in", get(auth::sign_in_page))
        .route("/sign-up", get(auth::sign_up_page))
        .route("/sign-out", post(auth::sign_out))
        .merge(submissions)
}

/// Create the exchange routes router.
pub fn exchange_routes() -> Router<AppState> {
    Router::new()
        .route("/current", get(exchanges::current))
        .route(
            "/{id}/join",
            get(exchanges::join_page).post(exchanges::join),
        )
}

/// Create the resource routes router.
///
/// Both endpoints accept bodies up to the photo cap; the profile editor
/// carries every corgi's photo as a data URI.
pub fn resource_routes(max_upload_bytes: usize) -> Router<AppState> {
    let body_limit = DefaultBodyLimit::max(max_upload_bytes.saturating_add(MULTIPART_OVERHEAD));

    Router::new()
        .route(
            "/image-upload",
            post(resources::image_upload).layer(upload_rate_limiter()),
        )
        .route("/profile-editor", post(profile::submit))
        .layer(body_limit)
}

/// Create all page and resource routes.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .merge(auth_routes())
        .route("/onboarding", get(profile::onboarding))
        .route("/profile/edit", get(profile::edit))
        .nest("/exchanges", exchange_routes())
        .nest("/resources", resource_routes(max_upload_bytes))
        .route("/privacy", get(pages::privacy))
        .route("/tos", get(pages::tos))
        .route("/deletion", get(pages::deletion))
}

/// Build the application router: routes, health checks, static files, and the
/// request ID and security header middleware.
///
/// Sessions, tracing and Sentry are layered on by the caller.
pub fn app(state: AppState) -> Router {
    let config = state.config();

    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static(STATIC_CACHE_CONTROL),
        ))
        .service(ServeDir::new(&config.static_dir));

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes(config.max_upload_bytes))
        .nest_service("/static", static_files)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, Response};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, Session};

    use santa_paws_core::{Email, UserId};

    use super::*;
    use crate::config::PawsConfig;
    use crate::middleware::{session_layer, set_current_identity};
    use crate::models::CurrentIdentity;

    const CLIENT_IP: (&str, &str) = ("x-forwarded-for", "203.0.113.10");

    /// Router over a pool that never connects. Any handler that reaches the
    /// database fails fast with a 500.
    fn test_app(max_upload_bytes: usize) -> Router {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://paws@127.0.0.1:1/paws")
            .unwrap();
        let mut config = PawsConfig::for_tests("postgres://paws@127.0.0.1:1/paws");
        config.max_upload_bytes = max_upload_bytes;

        app(AppState::new(config, pool))
            .route("/test/sign-in", post(test_sign_in))
            .layer(session_layer(MemoryStore::default(), false))
    }

    async fn test_sign_in(session: Session) -> StatusCode {
        let identity = CurrentIdentity {
            id: UserId::new_random(),
            email: Email::parse("tucker@example.com").unwrap(),
            first_name: Some("Tucker".to_string()),
            last_name: None,
        };
        set_current_identity(&session, &identity).await.unwrap();
        StatusCode::NO_CONTENT
    }

    /// Sign in through the test route and return the session cookie.
    async fn sign_in(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(
                Request::post("/test/sign-in")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), 4 * 1024 * 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn form_post(uri: &str, cookie: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::ACCEPT, "text/html")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    fn multipart_upload(cookie: Option<&str>, payload: &[u8]) -> Request<Body> {
        let boundary = "corgiboundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"fileUpload\"; \
                 filename=\"pup.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let mut builder = Request::post("/resources/image-upload")
            .header(CLIENT_IP.0, CLIENT_IP.1)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([210, 140, 60]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)
            .unwrap();
        out
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app(1024)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_dashboard_redirects_to_sign_in() {
        let response = test_app(1024)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/sign-in");
    }

    #[tokio::test]
    async fn test_profile_form_post_redirects_when_signed_out() {
        let response = test_app(1024)
            .oneshot(form_post("/resources/profile-editor", "", "address1=x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_upload_requires_identity() {
        let response = test_app(1024 * 1024)
            .oneshot(multipart_upload(None, &jpeg(8, 8)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!response.headers().contains_key(header::LOCATION));
    }

    #[tokio::test]
    async fn test_sign_out_redirects_to_sign_in() {
        let app = test_app(1024);
        let cookie = sign_in(&app).await;

        let response = app
            .clone()
            .oneshot(form_post("/sign-out", &cookie, ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/sign-in");

        let response = app
            .oneshot(
                Request::get("/exchanges/current")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_sign_in_page_renders() {
        let response = test_app(1024)
            .oneshot(Request::get("/sign-in").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("name=\"password\""));
    }

    #[tokio::test]
    async fn test_static_pages_render() {
        for path in ["/privacy", "/tos", "/deletion"] {
            let response = test_app(1024)
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{path}");
        }
    }

    #[tokio::test]
    async fn test_add_corgi_intent_rerenders_without_writing() {
        let app = test_app(1024 * 1024);
        let cookie = sign_in(&app).await;

        let response = app
            .oneshot(form_post(
                "/resources/profile-editor",
                &cookie,
                "address1=12+Fluff+Ln&corgis%5B0%5D.name=Biscuit&intent=add-corgi",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("value=\"Biscuit\""));
        assert!(html.contains("corgis[1].name"));
    }

    #[tokio::test]
    async fn test_onboarding_heading_survives_rerender() {
        let app = test_app(1024 * 1024);
        let cookie = sign_in(&app).await;

        let response = app
            .clone()
            .oneshot(form_post(
                "/resources/profile-editor",
                &cookie,
                "editor=onboarding&corgis%5B0%5D.name=Biscuit&intent=add-corgi",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Welcome! Tell us about your corgis"));
        assert!(html.contains(r#"name="editor" value="onboarding""#));

        let response = app
            .oneshot(form_post(
                "/resources/profile-editor",
                &cookie,
                "editor=onboarding&address1=&corgis%5B0%5D.name=Biscuit",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Welcome! Tell us about your corgis"));
    }

    #[tokio::test]
    async fn test_remove_corgi_intent() {
        let app = test_app(1024 * 1024);
        let cookie = sign_in(&app).await;

        let response = app
            .oneshot(form_post(
                "/resources/profile-editor",
                &cookie,
                "corgis%5B0%5D.name=Biscuit&corgis%5B1%5D.name=Waffles&intent=remove-corgi%3A0",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(!html.contains("Biscuit"));
        assert!(html.contains("value=\"Waffles\""));
    }

    #[tokio::test]
    async fn test_invalid_profile_is_400_with_field_errors() {
        let app = test_app(1024 * 1024);
        let cookie = sign_in(&app).await;

        let response = app
            .oneshot(form_post(
                "/resources/profile-editor",
                &cookie,
                "address1=&city=Braidwood&state=IL&zip=60408&phone=8155550100\
                 &corgis%5B0%5D.name=Biscuit&corgis%5B0%5D.birth_date=2999-01-01",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_text(response).await;
        assert!(html.contains("Date should be before today"));
        assert!(html.contains("Upload a photo"));
    }

    #[tokio::test]
    async fn test_upload_returns_webp_data_uri() {
        let app = test_app(1024 * 1024);
        let cookie = sign_in(&app).await;

        let response = app
            .oneshot(multipart_upload(Some(&cookie), &jpeg(1024, 768)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(
            json["dataUri"]
                .as_str()
                .unwrap()
                .starts_with("data:image/webp;base64,")
        );
    }

    #[tokio::test]
    async fn test_upload_rejects_non_image() {
        let app = test_app(1024 * 1024);
        let cookie = sign_in(&app).await;

        let response = app
            .oneshot(multipart_upload(Some(&cookie), b"just some text"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_over_cap_is_413() {
        let app = test_app(1024);
        let cookie = sign_in(&app).await;

        let response = app
            .oneshot(multipart_upload(Some(&cookie), &vec![0xAB; 4096]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_malformed_exchange_id_is_404() {
        let app = test_app(1024);
        let cookie = sign_in(&app).await;

        let response = app
            .oneshot(
                Request::get("/exchanges/not-a-uuid/join")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
