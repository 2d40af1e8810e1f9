use std::net::SocketAddr;
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::response::Envelope;
use crate::state::AppState;
use crate::{account, auth};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .nest("/api/v1",
              Router::new()
                  .merge(auth::router())
                  .merge(account::router())
                  .route("/health", get(|| async { "ok" }))
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
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

async fn index() -> Envelope<()> {
    Envelope::message("StudyGroups API")
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
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn form(method: Method, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn signup_ada(app: &Router) -> i64 {
        let (status, body) = send(
            app,
            form(
                Method::POST,
                "/api/v1/auth/signup",
                "first_name=Ada&last_name=Lovelace&email=ada%40x.com&password=secret1",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn index_banner() {
        let app = build_app(AppState::fake());
        let (status, body) = send(&app, get_req("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "StudyGroups API");
        assert_eq!(body["status"], 200);
    }

    #[tokio::test]
    async fn signup_response_hides_password() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            &app,
            form(
                Method::POST,
                "/api/v1/auth/signup",
                "first_name=Ada&last_name=Lovelace&email=ada%40x.com&password=secret1",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "ada@x.com");
        assert!(body["data"].get("password_hash").is_none());
        assert!(!body.to_string().contains("secret1"));
    }

    #[tokio::test]
    async fn credential_errors_map_to_http() {
        let app = build_app(AppState::fake());
        signup_ada(&app).await;

        let (status, body) = send(
            &app,
            form(
                Method::POST,
                "/api/v1/auth/signup",
                "first_name=Ada&last_name=Lovelace&email=ada%40x.com&password=secret1",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "account already exists");
        assert_eq!(body["data"], Value::Null);

        let (status, body) = send(
            &app,
            form(Method::POST, "/api/v1/auth/login", "email=ada%40x.com&password=wrong"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "incorrect password");

        let (status, _) = send(
            &app,
            form(Method::POST, "/api/v1/auth/login", "email=bob%40x.com&password=secret1"),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bad_ids_and_paging_are_rejected() {
        let app = build_app(AppState::fake());
        let (status, body) = send(&app, get_req("/api/v1/users/abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "invalid user id");

        let (status, body) = send(&app, get_req("/api/v1/users?page=-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "invalid params");

        let (status, _) = send(&app, get_req("/api/v1/users/41")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn paging_far_past_the_end_is_empty() {
        let app = build_app(AppState::fake());
        signup_ada(&app).await;

        let (status, body) = send(
            &app,
            get_req("/api/v1/users?page=4294967295&page_size=4294967295"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn profile_password_and_delete_flow() {
        let app = build_app(AppState::fake());
        let id = signup_ada(&app).await;

        let (status, body) = send(
            &app,
            form(
                Method::PUT,
                &format!("/api/v1/users/{id}"),
                "first_name=Ada&bio=+Engines+&school=London",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["bio"], "Engines");

        let (status, _) = send(
            &app,
            form(
                Method::PUT,
                &format!("/api/v1/users/{id}/password"),
                "current_password=secret1&new_password=newpass",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            form(Method::POST, "/api/v1/auth/login", "email=ada%40x.com&password=newpass"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/v1/users/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "account successfully deleted");

        let (status, _) = send(&app, get_req(&format!("/api/v1/users/{id}/study_groups"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn avatar_multipart_upload() {
        let app = build_app(AppState::fake());
        let id = signup_ada(&app).await;

        let boundary = "XBOUNDARYX";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; \
                 filename=\"me.PNG\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&[0x89, b'P', b'N', b'G']);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let req = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/v1/users/{id}/avatar"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], format!("https://fake.local/avatars/{id}.png"));

        let (_, user) = send(&app, get_req(&format!("/api/v1/users/{id}"))).await;
        assert_eq!(user["data"]["avatar_url"], body["data"]);
    }
}
