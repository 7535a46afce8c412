use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use time::OffsetDateTime;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{admin, analyses, auth, files, state::AppState};

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    message: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "OK",
        message: "Spreadsheet chart API is running",
        timestamp: OffsetDateTime::now_utc(),
    })
}

pub fn build_app(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(files::router(max_upload_bytes))
                .merge(analyses::router())
                .merge(admin::router())
                .route("/health", get(health)),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
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
    use crate::spreadsheet::fixtures::month_sales;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const BOUNDARY: &str = "sheetchartsboundary";

    async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        req.body(Body::empty()).unwrap()
    }

    fn upload(token: &str, field: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/api/upload")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn register(app: &Router, email: &str) -> String {
        let (status, body) = call(
            app,
            json_request(
                Method::POST,
                "/api/register",
                None,
                json!({ "email": email, "password": "password123", "name": "Tester" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, get("/api/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn gate_statuses() {
        let app = build_app(AppState::fake());

        let (status, body) = call(&app, get("/api/files", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Access token required");

        let (status, body) = call(&app, get("/api/files", Some("garbage"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Invalid token");

        let user = register(&app, "user@example.com").await;
        let (status, body) = call(&app, get("/api/admin/usage", Some(&user))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Admin access required");

        let admin = register(&app, "admin@excel.com").await;
        let (status, body) = call(&app, get("/api/admin/usage", Some(&admin))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalUsers"], 2);

        let (status, body) = call(&app, get("/api/admin/users", Some(&admin))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["email"], "user@example.com");
        assert_eq!(body[1]["email"], "admin@excel.com");
        assert!(body[0].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn upload_analyze_history_delete() {
        let app = build_app(AppState::fake());
        let token = register(&app, "ana@example.com").await;

        let (status, body) = call(&app, upload(&token, "file", "sales.xlsx", &month_sales())).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["headers"], json!(["Month", "Sales"]));
        assert_eq!(body["totalRows"], 3);
        assert_eq!(body["previewRows"][0], json!(["Jan", 100]));
        let file_id = body["fileId"].as_str().unwrap().to_string();

        let (status, body) = call(&app, get("/api/files", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["originalName"], "sales.xlsx");
        assert!(body[0].get("path").is_none());

        let (status, body) = call(
            &app,
            json_request(
                Method::POST,
                "/api/analyze",
                Some(&token),
                json!({ "fileId": file_id, "chartType": "bar", "xAxis": "Month", "yAxis": "Sales" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["title"], "Sales vs Month");
        assert_eq!(body["chartData"]["labels"], json!(["Jan", "Feb", "Mar"]));
        assert_eq!(body["chartData"]["datasets"][0]["data"], json!([100, 150, 120]));
        assert_eq!(
            body["chartData"]["datasets"][0]["borderColor"],
            "rgba(54, 162, 235, 1)"
        );
        let analysis_id = body["analysisId"].as_str().unwrap().to_string();

        let (status, body) = call(&app, get("/api/history", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], analysis_id.as_str());
        assert_eq!(body[0]["file"]["analyses"], json!([analysis_id]));

        let other = register(&app, "ben@example.com").await;
        let delete = |token: &str| {
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/analysis/{analysis_id}"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap()
        };
        let (status, _) = call(&app, delete(&other)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&app, delete(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Analysis deleted successfully");

        let (_, body) = call(&app, get("/api/history", Some(&token))).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn bad_json_bodies_get_message_errors() {
        let app = build_app(AppState::fake());
        let token = register(&app, "ana@example.com").await;

        let empty = Request::builder()
            .method(Method::POST)
            .uri("/api/analyze")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(&app, empty).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required fields");

        let (status, body) = call(
            &app,
            json_request(Method::POST, "/api/analyze", Some(&token), json!({ "fileId": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());

        let broken = Request::builder()
            .method(Method::POST)
            .uri("/api/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = call(&app, broken).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn upload_rejections() {
        let app = build_app(AppState::fake());
        let token = register(&app, "ana@example.com").await;

        let (status, body) = call(&app, upload(&token, "file", "notes.csv", b"a,b\n1,2")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Only Excel files are allowed");

        let (status, body) = call(&app, upload(&token, "other", "sales.xlsx", &month_sales())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No file uploaded");

        let (status, body) = call(
            &app,
            json_request(Method::POST, "/api/analyze", Some(&token), json!({ "fileId": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required fields");
    }
}
