use std::net::SocketAddr;

use axum::{
    http::header,
    routing::get,
    Router,
};
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{auth, upload};

const APP_JS: &str = include_str!("../static/app.js");

pub fn build_app(state: AppState) -> Router {
    let limits = *state.uploads.limits();
    Router::new()
        .merge(auth::router())
        .merge(upload::router(&limits))
        .route("/health", get(|| async { "ok" }))
        .route(
            "/static/app.js",
            get(|| async { ([(header::CONTENT_TYPE, "text/javascript; charset=utf-8")], APP_JS) }),
        )
        .with_state(state)
        .layer(CookieManagerLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubColorizer;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, Response, StatusCode},
    };
    use tower::ServiceExt;

    const BOUNDARY: &str = "splash-test-boundary";

    fn form_request(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().uri(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        req.body(Body::empty()).unwrap()
    }

    fn upload_request(cookie: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"old.jpg\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/colorize")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::COOKIE, cookie)
            .body(Body::from(body))
            .unwrap()
    }

    fn location<B>(res: &Response<B>) -> Option<&str> {
        res.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// `name=value` of the session cookie set by the response.
    fn session_cookie<B>(res: &Response<B>) -> Option<String> {
        res.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("splash_session="))
            .and_then(|v| v.split(';').next())
            .map(str::to_owned)
    }

    async fn body_text(res: Response<Body>) -> String {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    const ADA: &str = "full_name=Ada+Lovelace&email=ada%40example.com&password=secret1&confirm_password=secret1&agree_terms=on";

    /// Registers Ada and signs her in; returns the session cookie.
    async fn sign_in(app: &Router) -> String {
        let res = app
            .clone()
            .oneshot(form_request("/register", ADA, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .clone()
            .oneshot(form_request(
                "/login",
                "email=ada%40example.com&password=secret1",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), Some("/"));
        session_cookie(&res).expect("session cookie")
    }

    #[tokio::test]
    async fn health_ok() {
        let app = build_app(AppState::fake(StubColorizer::succeeding()));
        let res = app.oneshot(get_request("/health", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_text(res).await, "ok");
    }

    #[tokio::test]
    async fn protected_routes_redirect_to_login_without_session() {
        let app = build_app(AppState::fake(StubColorizer::succeeding()));
        for uri in ["/", "/download", "/results/original", "/api/health"] {
            let res = app.clone().oneshot(get_request(uri, None)).await.unwrap();
            assert_eq!(res.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(location(&res), Some("/login"), "{uri}");
        }

        let res = app
            .clone()
            .oneshot(get_request("/", Some("splash_session=not-a-session")))
            .await
            .unwrap();
        assert_eq!(location(&res), Some("/login"));
    }

    #[tokio::test]
    async fn registration_then_login_establishes_session() {
        let state = AppState::fake(StubColorizer::succeeding());
        let app = build_app(state.clone());

        let res = app
            .clone()
            .oneshot(form_request("/register", ADA, None))
            .await
            .unwrap();
        assert_eq!(
            res.headers().get(header::REFRESH).and_then(|v| v.to_str().ok()),
            Some("2;url=/login")
        );
        assert!(body_text(res).await.contains("Account created successfully!"));

        let cookie = sign_in_existing(&app).await;
        assert_eq!(state.sessions.count().await, 1);

        let res = app.clone().oneshot(get_request("/", Some(&cookie))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let html = body_text(res).await;
        assert!(html.contains("Welcome, Ada Lovelace"));
        assert!(html.contains("ada@example.com"));

        let res = app.clone().oneshot(get_request("/login", Some(&cookie))).await.unwrap();
        assert_eq!(location(&res), Some("/"));
    }

    async fn sign_in_existing(app: &Router) -> String {
        let res = app
            .clone()
            .oneshot(form_request(
                "/login",
                "email=ADA%40example.com&password=secret1",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(location(&res), Some("/"));
        session_cookie(&res).expect("session cookie")
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let app = build_app(AppState::fake(StubColorizer::succeeding()));
        sign_in(&app).await;

        let res = app
            .clone()
            .oneshot(form_request("/register", ADA, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let html = body_text(res).await;
        assert!(html.contains("Email already registered. Please sign in."));
        assert!(html.contains(r#"value="Ada Lovelace""#));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let app = build_app(AppState::fake(StubColorizer::succeeding()));
        sign_in(&app).await;

        let wrong = app
            .clone()
            .oneshot(form_request(
                "/login",
                "email=ada%40example.com&password=nope123",
                None,
            ))
            .await
            .unwrap();
        let unknown = app
            .clone()
            .oneshot(form_request(
                "/login",
                "email=bob%40example.com&password=nope123",
                None,
            ))
            .await
            .unwrap();

        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert!(session_cookie(&wrong).is_none());

        let wrong = body_text(wrong).await;
        let unknown = body_text(unknown).await;
        assert!(wrong.contains("Invalid email or password"));
        assert_eq!(
            wrong.replace("ada@example.com", ""),
            unknown.replace("bob@example.com", "")
        );
    }

    #[tokio::test]
    async fn invalid_uploads_never_reach_the_api() {
        let stub = StubColorizer::succeeding();
        let app = build_app(AppState::fake(stub.clone()));
        let cookie = sign_in(&app).await;

        let res = app
            .clone()
            .oneshot(upload_request(&cookie, "application/pdf", b"%PDF-1.4"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value =
            serde_json::from_str(&body_text(res).await).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Please select a valid image file");
        assert_eq!(json["display_ms"], 5000);

        let big = vec![0u8; 10 * 1024 * 1024 + 1];
        let res = app
            .clone()
            .oneshot(upload_request(&cookie, "image/jpeg", &big))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value =
            serde_json::from_str(&body_text(res).await).unwrap();
        assert_eq!(json["error"], "File size must be less than 10MB");

        assert_eq!(stub.calls(), 0);

        let res = app.clone().oneshot(get_request("/", Some(&cookie))).await.unwrap();
        assert!(body_text(res).await.contains("File size must be less than 10MB"));
    }

    #[tokio::test]
    async fn successful_colorize_shows_results_and_downloads() {
        let stub = StubColorizer::succeeding();
        let app = build_app(AppState::fake(stub.clone()));
        let cookie = sign_in(&app).await;

        let res = app
            .clone()
            .oneshot(upload_request(&cookie, "image/jpeg", b"\xFF\xD8\xFFgrey"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json: serde_json::Value =
            serde_json::from_str(&body_text(res).await).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(
            json["colorized_url"],
            "http://colorize.test/download/colorized_old.jpg"
        );
        assert_eq!(stub.calls(), 1);

        let res = app.clone().oneshot(get_request("/", Some(&cookie))).await.unwrap();
        let html = body_text(res).await;
        assert!(html.contains(r#"<section id="results">"#));
        assert!(html.contains(r#"src="/results/original""#));
        assert!(html.contains(r#"src="http://colorize.test/download/colorized_old.jpg""#));

        let res = app
            .clone()
            .oneshot(get_request("/?view=original", Some(&cookie)))
            .await
            .unwrap();
        assert!(body_text(res).await.contains(r#"id="zoom""#));

        let res = app
            .clone()
            .oneshot(get_request("/results/original", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/jpeg");
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"\xFF\xD8\xFFgrey");

        let res = app
            .clone()
            .oneshot(get_request("/download", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"colorized_image.jpg\""
        );
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn api_failure_is_reported_as_bad_gateway() {
        let app = build_app(AppState::fake(StubColorizer::failing(Some("Colorization failed"))));
        let cookie = sign_in(&app).await;

        let res = app
            .clone()
            .oneshot(upload_request(&cookie, "image/png", b"png"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        let json: serde_json::Value =
            serde_json::from_str(&body_text(res).await).unwrap();
        assert_eq!(json["error"], "Colorization failed");
    }

    #[tokio::test]
    async fn reset_and_logout_clear_upload_state() {
        let state = AppState::fake(StubColorizer::succeeding());
        let app = build_app(state.clone());
        let cookie = sign_in(&app).await;

        app.clone()
            .oneshot(upload_request(&cookie, "image/jpeg", b"jpeg"))
            .await
            .unwrap();

        let res = app
            .clone()
            .oneshot(form_request("/reset", "", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(location(&res), Some("/"));
        let res = app
            .clone()
            .oneshot(get_request("/download", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = app
            .clone()
            .oneshot(get_request("/logout", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(location(&res), Some("/login"));
        assert_eq!(state.uploads.len().await, 0);
        assert_eq!(state.sessions.count().await, 0);

        let res = app.clone().oneshot(get_request("/", Some(&cookie))).await.unwrap();
        assert_eq!(location(&res), Some("/login"));
    }

    #[tokio::test]
    async fn api_health_relays_model_status() {
        let app = build_app(AppState::fake(StubColorizer::unreachable()));
        let cookie = sign_in(&app).await;

        let res = app
            .clone()
            .oneshot(get_request("/api/health", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        let json: serde_json::Value =
            serde_json::from_str(&body_text(res).await).unwrap();
        assert_eq!(json["model_loaded"], false);
    }

    #[tokio::test]
    async fn signing_in_again_drops_the_replaced_upload_state() {
        let state = AppState::fake(StubColorizer::succeeding());
        let app = build_app(state.clone());
        let cookie = sign_in(&app).await;

        app.clone()
            .oneshot(upload_request(&cookie, "image/jpeg", &vec![1u8; 4 * 1024 * 1024]))
            .await
            .unwrap();
        assert_eq!(state.uploads.len().await, 1);

        let res = app
            .clone()
            .oneshot(form_request(
                "/login",
                "email=ada%40example.com&password=secret1",
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(location(&res), Some("/"));
        let renewed = session_cookie(&res).expect("session cookie");
        assert_ne!(renewed, cookie);
        assert_eq!(state.sessions.count().await, 1);
        assert_eq!(state.uploads.len().await, 0);

        app.clone()
            .oneshot(get_request("/", Some(&renewed)))
            .await
            .unwrap();
        app.clone()
            .oneshot(get_request("/logout", Some(&renewed)))
            .await
            .unwrap();
        assert_eq!(state.sessions.count().await, 0);
        assert_eq!(state.uploads.len().await, 0);
    }

    #[tokio::test]
    async fn unknown_view_shows_the_regular_page() {
        let app = build_app(AppState::fake(StubColorizer::succeeding()));
        let cookie = sign_in(&app).await;

        let res = app
            .clone()
            .oneshot(get_request("/?view=bogus", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let html = body_text(res).await;
        assert!(html.contains("Welcome, Ada Lovelace"));
        assert!(!html.contains(r#"id="zoom""#));
    }

    #[tokio::test]
    async fn upload_script_checks_api_health_on_load() {
        let app = build_app(AppState::fake(StubColorizer::succeeding()));
        let res = app
            .oneshot(get_request("/static/app.js", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/javascript"));
        let js = body_text(res).await;
        assert!(js.contains("fetch('/api/health')"));
        assert!(js.contains("model_loaded"));
    }
}
