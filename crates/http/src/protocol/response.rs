//! HTTP response head and the canonical responses synthesized by this crate.
//!
//! Only two responses are ever fabricated on failure or absence: [`not_found`] when nothing can
//! answer a request and [`internal_error`] when a deferred handler or response fails.

use http::{HeaderValue, Response, StatusCode};
use mime::Mime;

use crate::protocol::body::Body;

/// Type alias for HTTP response headers.
///
/// This type represents the status and header portion of an HTTP response, using
/// `http::Response<()>` with an empty body placeholder. The body travels separately.
pub type ResponseHead = Response<()>;

/// Body of the canonical not-found response.
pub const NOT_FOUND_BODY: &str = "not found";

/// Builds the canonical `404 Not Found` response with a short plain-text body.
pub fn not_found() -> Response<Body> {
    plain_text(StatusCode::NOT_FOUND, Body::from(NOT_FOUND_BODY))
}

/// Builds a `500 Internal Server Error` response whose body is `message` encoded as UTF-8.
pub fn internal_error(message: impl Into<String>) -> Response<Body> {
    plain_text(StatusCode::INTERNAL_SERVER_ERROR, Body::from(message.into()))
}

pub(crate) fn plain_text(status: StatusCode, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    set_content_type(&mut response, &mime::TEXT_PLAIN_UTF_8);
    response
}

pub(crate) fn set_content_type(response: &mut Response<Body>, mime: &Mime) {
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        response.headers_mut().insert(http::header::CONTENT_TYPE, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn not_found_is_plain_text() {
        let response = not_found();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers().get(http::header::CONTENT_TYPE).unwrap(), "text/plain; charset=utf-8");

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"not found");
    }

    #[tokio::test]
    async fn internal_error_carries_message() {
        let response = internal_error("backend exploded: ü");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), "backend exploded: ü");
    }
}
