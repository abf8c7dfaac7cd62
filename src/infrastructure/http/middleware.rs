//! HTTP Middleware
//!
//! 传输层错误日志（请求体超限、JSON 解析失败、路由不存在等）

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// 传输层错误日志中间件
///
/// 只记录 HTTP 状态码为 4xx / 5xx 的响应；
/// 业务错误（errno != 0）走 HTTP 200，在 ApiError::into_response() 中记录
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP client error"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, Bytes},
        extract::DefaultBodyLimit,
        http::{Request as HttpRequest, StatusCode},
        routing::post,
        Router,
    };
    use tower::util::ServiceExt;

    async fn echo_len(body: Bytes) -> String {
        body.len().to_string()
    }

    fn limited_router(limit: usize) -> Router {
        Router::new()
            .route("/upload", post(echo_len))
            .layer(DefaultBodyLimit::max(limit))
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    fn upload(size: usize) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri("/upload")
            .body(Body::from(vec![b'x'; size]))
            .unwrap()
    }

    #[tokio::test]
    async fn test_body_limit_rejection_reaches_client() {
        let response = limited_router(16).oneshot(upload(64)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let response = limited_router(16).oneshot(upload(16)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"16");
    }
}
