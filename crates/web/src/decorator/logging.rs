//! Request logging for slices.
//!
//! [`LoggingDecorator`] wraps a slice into a [`LoggingSlice`], which logs the request line when
//! the request arrives and the response status once the response reaches its connection.

use futures::FutureExt;
use futures::future::BoxFuture;
use slice_http::connection::{BoxConnection, Connection};
use slice_http::protocol::{Body, RequestHead, RequestLine, ResponseHead, SendError};
use slice_http::response::{BoxResponse, Response, ResponseExt};
use slice_http::slice::Slice;
use tracing::Level;

use crate::decorator::Decorator;

macro_rules! log_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            level if level == Level::TRACE => tracing::trace!($($arg)+),
            level if level == Level::DEBUG => tracing::debug!($($arg)+),
            level if level == Level::INFO => tracing::info!($($arg)+),
            level if level == Level::WARN => tracing::warn!($($arg)+),
            _ => tracing::error!($($arg)+),
        }
    };
}

/// Decorates slices with request logging at a fixed level.
#[derive(Debug, Clone, Copy)]
pub struct LoggingDecorator {
    level: Level,
}

impl LoggingDecorator {
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingDecorator {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl<S: Slice> Decorator<S> for LoggingDecorator {
    type Out = LoggingSlice<S>;

    fn decorate(&self, raw: S) -> Self::Out {
        LoggingSlice { slice: raw, level: self.level }
    }
}

/// A slice that logs every request it answers.
#[derive(Debug)]
pub struct LoggingSlice<S> {
    slice: S,
    level: Level,
}

impl<S: Slice> Slice for LoggingSlice<S> {
    fn response(&self, head: RequestHead, body: Body) -> BoxResponse {
        let request_line = head.request_line();
        log_at!(self.level, request = %request_line, "request received");

        LoggedResponse { response: self.slice.response(head, body), request_line, level: self.level }.boxed()
    }
}

struct LoggedResponse {
    response: BoxResponse,
    request_line: RequestLine,
    level: Level,
}

impl Response for LoggedResponse {
    fn send(self: Box<Self>, connection: BoxConnection) -> BoxFuture<'static, Result<(), SendError>> {
        let LoggedResponse { response, request_line, level } = *self;
        let connection = LoggedConnection { connection, request_line: request_line.clone(), level };

        async move {
            let result = response.send(Box::new(connection)).await;
            if let Err(e) = &result {
                tracing::warn!(request = %request_line, cause = %e, "response delivery failed");
            }
            result
        }
        .boxed()
    }
}

struct LoggedConnection {
    connection: BoxConnection,
    request_line: RequestLine,
    level: Level,
}

impl Connection for LoggedConnection {
    fn accept(self: Box<Self>, head: ResponseHead, body: Body) -> BoxFuture<'static, Result<(), SendError>> {
        log_at!(self.level, request = %self.request_line, status = %head.status(), "response sent");
        self.connection.accept(head, body)
    }
}
