//! Adapters for values that only become available asynchronously.
//!
//! [`AsyncResponse`] and [`AsyncSlice`] put a future behind the synchronous
//! [`Response`]/[`Slice`] contracts. When the future fails, the adapter answers with a
//! `500 Internal Server Error` whose body is the failure message; this is the single place where
//! internal failures become visible on the wire.

use std::fmt;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::error;

use crate::connection::BoxConnection;
use crate::protocol::{Body, BoxError, RequestHead, SendError, internal_error};
use crate::response::{BoxResponse, Response, ResponseExt};
use crate::slice::{SharedSlice, Slice};

/// A response that is computed by a future.
pub struct AsyncResponse {
    future: BoxFuture<'static, Result<BoxResponse, BoxError>>,
}

impl AsyncResponse {
    pub fn new<F, E>(future: F) -> Self
    where
        F: Future<Output = Result<BoxResponse, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self { future: future.map(|result| result.map_err(Into::into)).boxed() }
    }
}

impl fmt::Debug for AsyncResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncResponse").finish_non_exhaustive()
    }
}

impl Response for AsyncResponse {
    fn send(self: Box<Self>, connection: BoxConnection) -> BoxFuture<'static, Result<(), SendError>> {
        async move {
            match self.future.await {
                Ok(response) => response.send(connection).await,
                Err(e) => {
                    let message = e.to_string();
                    error!(cause = %message, "deferred response failed, responding with 500");
                    internal_error(message).boxed().send(connection).await
                }
            }
        }
        .boxed()
    }
}

type SliceFuture = Shared<BoxFuture<'static, Result<SharedSlice, String>>>;

/// A slice that becomes available asynchronously.
///
/// Requests arriving before the slice is ready wait for it; once it failed every request is
/// answered with a `500` carrying the failure message.
pub struct AsyncSlice {
    slice: SliceFuture,
}

impl AsyncSlice {
    pub fn new<F, E>(future: F) -> Self
    where
        F: Future<Output = Result<SharedSlice, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let slice = future.map(|result| result.map_err(|e| e.into().to_string())).boxed().shared();
        Self { slice }
    }
}

impl fmt::Debug for AsyncSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncSlice").finish_non_exhaustive()
    }
}

impl Slice for AsyncSlice {
    fn response(&self, head: RequestHead, body: Body) -> BoxResponse {
        let slice = self.slice.clone();
        AsyncResponse::new(async move {
            let slice = slice.await.map_err(BoxError::from)?;
            Ok::<_, BoxError>(slice.response(head, body))
        })
        .boxed()
    }
}
