//! Conversions of handler return values into complete responses.

use bytes::Bytes;
use http::{Response, StatusCode};

use crate::protocol::{Body, plain_text, set_content_type};

/// A trait for types that can be converted into an HTTP response.
///
/// Values returned by [`slice_fn`](crate::slice::slice_fn) handlers implement this trait.
pub trait Responder {
    fn into_response(self) -> Response<Body>;
}

/// Passes pre-built responses through, converting the body.
impl<B> Responder for Response<B>
where
    B: Into<Body>,
{
    fn into_response(self) -> Response<Body> {
        self.map(Into::into)
    }
}

/// Sets a status code along with the response content.
impl<T: Responder> Responder for (StatusCode, T) {
    fn into_response(self) -> Response<Body> {
        let (status, responder) = self;
        let mut response = responder.into_response();
        *response.status_mut() = status;
        response
    }
}

/// A bare status code produces an empty body.
impl Responder for StatusCode {
    fn into_response(self) -> Response<Body> {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = self;
        response
    }
}

impl Responder for () {
    fn into_response(self) -> Response<Body> {
        Response::new(Body::empty())
    }
}

impl Responder for &'static str {
    fn into_response(self) -> Response<Body> {
        plain_text(StatusCode::OK, Body::from(self))
    }
}

impl Responder for String {
    fn into_response(self) -> Response<Body> {
        plain_text(StatusCode::OK, Body::from(self))
    }
}

impl Responder for Bytes {
    fn into_response(self) -> Response<Body> {
        let mut response = Response::new(Body::from(self));
        set_content_type(&mut response, &mime::APPLICATION_OCTET_STREAM);
        response
    }
}
