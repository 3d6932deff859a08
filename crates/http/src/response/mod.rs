//! The producer side of a response.
//!
//! A [`Response`] is a possibly still pending computation that, when sent to a
//! [`Connection`](crate::connection::Connection), writes a status, headers and a body to it and
//! resolves once the connection has taken every byte. Responses are single-use: `send` consumes
//! the boxed value.

mod responder;

pub use responder::Responder;

use futures::future::BoxFuture;

use crate::connection::BoxConnection;
use crate::protocol::{Body, SendError};

pub trait Response: Send + 'static {
    fn send(self: Box<Self>, connection: BoxConnection) -> BoxFuture<'static, Result<(), SendError>>;
}

pub type BoxResponse = Box<dyn Response>;

/// Extension methods for every [`Response`].
pub trait ResponseExt: Response + Sized {
    fn boxed(self) -> BoxResponse {
        Box::new(self)
    }
}

impl<T: Response> ResponseExt for T {}

/// A fully built response is delivered by handing its parts to the connection.
impl Response for http::Response<Body> {
    fn send(self: Box<Self>, connection: BoxConnection) -> BoxFuture<'static, Result<(), SendError>> {
        let (parts, body) = (*self).into_parts();
        connection.accept(http::Response::from_parts(parts, ()), body)
    }
}
