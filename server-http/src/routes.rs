use crate::handlers;
use crate::middleware::require_session;
use crate::state::AppState;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use shared::config::Config;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::normalize_path::NormalizePath;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Build and configure the application router.
///
/// Trailing slashes are trimmed before routing, so the result wraps the
/// router instead of being a `Router` itself. Serve it with
/// `ServiceExt::<Request>::into_make_service`.
pub fn build_router(state: AppState, config: &Config) -> NormalizePath<Router> {
    // Routes behind a bearer session
    let protected = Router::new()
        .route("/auth/session", get(handlers::current_session))
        .route(
            "/admin/certificates",
            get(handlers::list_certificates).post(handlers::create_certificate),
        )
        .route(
            "/admin/certificates/{id}",
            get(handlers::get_certificate)
                .put(handlers::update_certificate)
                .delete(handlers::delete_certificate),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let router = Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Public verification
        .route("/certificates/verify", get(handlers::verify_certificate))
        .route("/certificates/{id}", get(handlers::lookup_certificate))
        // Auth routes
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .merge(protected)
        // Middleware
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    NormalizePath::trim_trailing_slash(router)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    if config.allows_any_origin() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use azcert::testing::{MockBackend, Reply, record};
    use axum::ServiceExt;
    use axum::extract::Request;
    use axum::http::StatusCode;
    use reqwest::Client;
    use serde_json::{Value, json};

    const LOGIN: &str = "/Acount/login";

    struct Portal {
        base: String,
        http: Client,
    }

    impl Portal {
        async fn spawn(backend: &MockBackend) -> Self {
            Self::spawn_with(Config {
                api_base_url: backend.base_url().to_string(),
                ..Config::default()
            })
            .await
        }

        async fn spawn_with(config: Config) -> Self {
            let state = AppState::from_config(&config).unwrap();
            let app = build_router(state, &config);

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
                    .await
                    .unwrap();
            });

            Self {
                base: format!("http://{}", addr),
                http: Client::new(),
            }
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }

        async fn login(&self) -> String {
            let response = self
                .http
                .post(self.url("/auth/login"))
                .json(&json!({"email": "admin@az.example", "password": "s3cret"}))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body: Value = response.json().await.unwrap();
            body["token"].as_str().unwrap().to_string()
        }
    }

    fn accept_logins(backend: &MockBackend) {
        backend.reply(
            Method::POST,
            LOGIN,
            Reply::Text(StatusCode::OK, "Login successful".to_string()),
        );
    }

    #[tokio::test]
    async fn test_health() {
        let backend = MockBackend::spawn().await;
        let portal = Portal::spawn(&backend).await;

        let response = portal.http.get(portal.url("/health")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "OK");

        let response = portal.http.get(portal.url("/health/")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_verify_falls_back_to_name_search() {
        let backend = MockBackend::spawn().await;
        backend.reply_json(Method::GET, "/Services/searchByS_N", json!({"$values": []}));
        backend.reply_json(
            Method::GET,
            "/Services/searchByName",
            json!({"$values": [record(7, "Ali Hassan", "CERT-001")]}),
        );
        let portal = Portal::spawn(&backend).await;

        let response = portal
            .http
            .get(portal.url("/certificates/verify?q=Ali&type=all"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["timedOut"], false);
        assert_eq!(body["certificates"][0]["id"], "CERT-7");
        assert_eq!(body["certificates"][0]["status"], "active");
        assert_eq!(body["certificates"][0]["issuer"], "AZ INTERNATIONAL");
        assert_eq!(backend.hits(Method::GET, "/Services/searchByS_N"), 1);
    }

    #[tokio::test]
    async fn test_verify_rejects_blank_query_and_unknown_type() {
        let backend = MockBackend::spawn().await;
        let portal = Portal::spawn(&backend).await;

        let response = portal
            .http
            .get(portal.url("/certificates/verify?q=%20%20"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Please enter a search value");

        let response = portal
            .http
            .get(portal.url("/certificates/verify?q=Ali&type=email"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(backend.total_hits(), 0);
    }

    #[tokio::test]
    async fn test_public_lookup_by_display_id() {
        let backend = MockBackend::spawn().await;
        backend.reply_json(Method::GET, "/Services/getById", record(7, "Ali Hassan", "CERT-001"));
        let portal = Portal::spawn(&backend).await;

        let response = portal.http.get(portal.url("/certificates/CERT-7")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["name"], "Ali Hassan");
        assert_eq!(body["serialNumber"], "CERT-001");

        let request = &backend.requests(Method::GET, "/Services/getById")[0];
        assert_eq!(request.query.as_deref(), Some("id=7"));
    }

    #[tokio::test]
    async fn test_public_lookup_missing_is_404() {
        let backend = MockBackend::spawn().await;
        backend.reply_json(Method::GET, "/Services/getById", json!([]));
        let portal = Portal::spawn(&backend).await;

        let response = portal.http.get(portal.url("/certificates/99")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = portal.http.get(portal.url("/certificates/not-an-id")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_routes_require_session() {
        let backend = MockBackend::spawn().await;
        let portal = Portal::spawn(&backend).await;

        let response = portal
            .http
            .get(portal.url("/admin/certificates"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = portal
            .http
            .get(portal.url("/admin/certificates"))
            .bearer_auth("not-a-session")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(backend.total_hits(), 0);
    }

    #[tokio::test]
    async fn test_login_session_and_logout() {
        let backend = MockBackend::spawn().await;
        accept_logins(&backend);
        let portal = Portal::spawn(&backend).await;

        let token = portal.login().await;
        assert_eq!(token.len(), 64);

        let response = portal
            .http
            .get(portal.url("/auth/session"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["email"], "admin@az.example");
        assert!(body["expires_in_ms"].as_u64().unwrap() > 0);

        let response = portal
            .http
            .post(portal.url("/auth/logout"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = portal
            .http
            .get(portal.url("/auth/session"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_basic_auth_login_rejected() {
        let backend = MockBackend::spawn().await;
        backend.reply(
            Method::POST,
            LOGIN,
            Reply::Text(StatusCode::BAD_REQUEST, "Invalid email or password".to_string()),
        );
        let portal = Portal::spawn(&backend).await;

        let response = portal
            .http
            .post(portal.url("/auth/login"))
            .basic_auth("admin@az.example", Some("wrong"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let sent = backend.requests(Method::POST, LOGIN)[0].json_body().unwrap();
        assert_eq!(sent["email"], "admin@az.example");
        assert_eq!(sent["password"], "wrong");
    }

    #[tokio::test]
    async fn test_admin_create_validates_and_forwards() {
        let backend = MockBackend::spawn().await;
        accept_logins(&backend);
        backend.reply_json(Method::POST, "/Services/create", record(8, "Mona Adel", "CERT-008"));
        let portal = Portal::spawn(&backend).await;
        let token = portal.login().await;

        let response = portal
            .http
            .post(portal.url("/admin/certificates"))
            .bearer_auth(&token)
            .json(&json!({"name": "Mona Adel", "serialNumber": "  "}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["field"], "serialNumber");
        assert_eq!(backend.hits(Method::POST, "/Services/create"), 0);

        let response = portal
            .http
            .post(portal.url("/admin/certificates"))
            .bearer_auth(&token)
            .json(&json!({
                "name": "Mona Adel",
                "serialNumber": "CERT-008",
                "method": "ISO 45001",
                "startDate": "2024-05-01",
                "endDate": "2027-05-01"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["certificate"]["id"], 8);

        let sent = backend.requests(Method::POST, "/Services/create")[0]
            .json_body()
            .unwrap();
        assert_eq!(sent["s_N"], "CERT-008");
        assert_eq!(sent["method"], 1);
        assert_eq!(sent["location"]["state"], "Cairo");
    }

    #[tokio::test]
    async fn test_admin_search_and_upstream_errors() {
        let backend = MockBackend::spawn().await;
        accept_logins(&backend);
        backend.reply_json(Method::GET, "/Services/searchByName", json!([]));
        backend.reply_json(
            Method::GET,
            "/Services/searchByS_N",
            json!([record(7, "Ali Hassan", "CERT-001")]),
        );
        backend.reply_status(Method::GET, "/Services", StatusCode::SERVICE_UNAVAILABLE);
        backend.reply_status(Method::DELETE, "/Services/delete/7", StatusCode::NOT_FOUND);
        let portal = Portal::spawn(&backend).await;
        let token = portal.login().await;

        let response = portal
            .http
            .get(portal.url("/admin/certificates?search=CERT-001"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["count"], 1);
        assert_eq!(body["certificates"][0]["s_N"], "CERT-001");

        let response = portal
            .http
            .get(portal.url("/admin/certificates"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("503"));

        let response = portal
            .http
            .delete(portal.url("/admin/certificates/7"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_search_timeout_is_empty_result() {
        let backend = MockBackend::spawn().await;
        accept_logins(&backend);
        backend.reply_json(
            Method::GET,
            "/Services/searchByName",
            json!([record(7, "Ali Hassan", "CERT-001")]),
        );
        backend.reply_json(Method::GET, "/Services/searchByS_N", json!([]));
        let portal = Portal::spawn_with(Config {
            api_base_url: backend.base_url().to_string(),
            request_timeout: Duration::from_millis(100),
            ..Config::default()
        })
        .await;
        let token = portal.login().await;

        backend.set_delay(Duration::from_millis(400));
        let response = portal
            .http
            .get(portal.url("/admin/certificates?search=Ali"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["count"], 0);
        assert_eq!(body["timed_out"], true);
        // Name search timed out, so the serial search was still tried
        assert_eq!(backend.hits(Method::GET, "/Services/searchByS_N"), 1);
    }
}
