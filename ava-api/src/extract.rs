/// Extractors whose rejections render as [`ApiError`]
///
/// Axum's stock `Json` and `Path` reject with plain-text bodies. These
/// wrappers route the rejection through `ApiError` so malformed bodies and
/// ids answer `400 {"error": "..."}` like every other failure.

use crate::error::ApiError;
use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    FromRequest, FromRequestParts,
};

/// JSON body extractor
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameter extractor
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected path parameter");
        ApiError::BadRequest("invalid path parameter".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::post,
        Router,
    };
    use serde::Deserialize;
    use tower::Service;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        name: String,
    }

    async fn handler(ApiPath(id): ApiPath<i64>, ApiJson(_payload): ApiJson<Payload>) -> String {
        id.to_string()
    }

    async fn send(uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, serde_json::Value) {
        let mut app = Router::new().route("/items/:id", post(handler));

        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(value) = content_type {
            builder = builder.header("content-type", value);
        }
        let response = app
            .call(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn test_missing_field_is_json_bad_request() {
        let (status, body) = send("/items/1", Some("application/json"), "{}").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_json_bad_request() {
        let (status, body) = send("/items/1", None, r#"{"name":"x"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_json_bad_request() {
        let (status, body) = send("/items/abc", Some("application/json"), r#"{"name":"x"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid path parameter");
    }
}
