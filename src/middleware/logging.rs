use axum::{
    body::Body,
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags every request with an id and logs its outcome. Bodies are never
/// logged, they carry passwords and the admin secret.
pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let span = tracing::info_span!("request", %request_id, %method, %path);

    async move {
        let started = Instant::now();
        let mut response = next.run(req).await;
        let elapsed = started.elapsed();

        let status = response.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), ?elapsed, "request failed");
        } else if status.is_client_error() {
            tracing::warn!(status = status.as_u16(), ?elapsed, "request refused");
        } else {
            tracing::info!(status = status.as_u16(), ?elapsed, "request completed");
        }

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}
