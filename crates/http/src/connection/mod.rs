//! The sink side of a response.
//!
//! A [`Connection`] accepts exactly one `(status + headers, body)` pair and returns a completion
//! future that resolves once every byte of the body was handed off. Connections are owned by the
//! transport layer; this crate only ships stand-ins:
//!
//! - [`CollectingConnection`]: buffers the whole response, mostly for tests and demos
//!
//! The group slice in `slice-web` adds a capturing connection that holds a backend's result
//! back until the race between backends is decided.

mod collecting;

pub use collecting::Collected;
pub use collecting::CollectingConnection;
pub use collecting::collecting;

use futures::future::BoxFuture;

use crate::protocol::{Body, ResponseHead, SendError};

/// A single-use response sink.
///
/// `accept` consumes the connection, so a connection can never receive two responses.
pub trait Connection: Send + 'static {
    fn accept(self: Box<Self>, head: ResponseHead, body: Body) -> BoxFuture<'static, Result<(), SendError>>;
}

pub type BoxConnection = Box<dyn Connection>;
