//! Request and response types used throughout the pipeline.

use bytes::Bytes;
use http_body_util::Full;
use portcullis_core::AuthError;

/// The HTTP request type used in the middleware pipeline.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building error responses.
pub trait ResponseExt {
    /// Creates a JSON error response in the standard envelope.
    fn json_error(status: http::StatusCode, code: &str, message: &str) -> Response;

    /// Renders an [`AuthError`] as a JSON error response.
    ///
    /// Server-side failures carry a generic message; see
    /// [`AuthError::public_message`].
    fn from_auth_error(error: &AuthError, request_id: Option<&str>) -> Response;
}

impl ResponseExt for Response {
    fn json_error(status: http::StatusCode, code: &str, message: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message
            }
        });

        json_response(status, body.to_string())
    }

    fn from_auth_error(error: &AuthError, request_id: Option<&str>) -> Response {
        let envelope = error.to_envelope(request_id);
        let body = serde_json::to_string(&envelope).unwrap_or_else(|_| {
            format!(
                r#"{{"error":{{"code":"{}","message":"{}"}}}}"#,
                error.code(),
                error.code()
            )
        });

        json_response(error.status_code(), body)
    }
}

fn json_response(status: http::StatusCode, body: String) -> Response {
    let mut response = http::Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}
