//! Ordered request routing.
//!
//! A [`Router`] holds an ordered list of `(filter, slice)` routes. The first route whose filter
//! matches the request head answers it; when none matches, the fallback slice does, or the
//! standard `404 Not Found` when no fallback was configured. A router is itself a [`Slice`], so
//! routers nest and can serve as backends of a group.

pub mod filter;

use std::fmt;
use std::sync::Arc;

use filter::{AllFilter, Filter};
use slice_http::protocol::{Body, RequestHead, not_found};
use slice_http::response::{BoxResponse, ResponseExt};
use slice_http::slice::{SharedSlice, Slice};
use tracing::debug;

use crate::decorator::{Chain, Decorator, DecoratorExt, Undecorated};

type RouterFilter = dyn Filter + Send + Sync + 'static;

/// Main router structure that dispatches requests to the first matching slice.
pub struct Router {
    items: Vec<RouterItem>,
    fallback: Option<SharedSlice>,
}

/// A router item containing a filter and a slice
pub struct RouterItem {
    filter: Box<RouterFilter>,
    slice: SharedSlice,
}

impl Router {
    /// Creates a new router builder without decorators
    pub fn builder() -> RouterBuilder<Undecorated> {
        RouterBuilder::new()
    }

    /// Finds the first route whose filter accepts `head`.
    pub fn find(&self, head: &RequestHead) -> Option<&RouterItem> {
        self.items.iter().find(|item| item.filter.matches(head))
    }

    /// Number of routes, not counting the fallback.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.items.len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl Slice for Router {
    fn response(&self, head: RequestHead, body: Body) -> BoxResponse {
        if let Some(item) = self.find(&head) {
            return item.slice.response(head, body);
        }

        match &self.fallback {
            Some(fallback) => fallback.response(head, body),
            None => {
                debug!(method = %head.method(), path = head.uri().path(), "no route matched, responding with 404");
                not_found().boxed()
            }
        }
    }
}

impl RouterItem {
    /// Gets the filter for this router item
    pub fn filter(&self) -> &RouterFilter {
        self.filter.as_ref()
    }

    /// Gets the slice for this router item
    pub fn slice(&self) -> &SharedSlice {
        &self.slice
    }
}

impl fmt::Debug for RouterItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterItem").finish_non_exhaustive()
    }
}

pub struct RouterBuilder<D> {
    items: Vec<RouterItemBuilder>,
    fallback: Option<SharedSlice>,
    decorator: D,
}

impl RouterBuilder<Undecorated> {
    fn new() -> Self {
        Self { items: vec![], fallback: None, decorator: Undecorated }
    }
}

impl<D> RouterBuilder<D> {
    /// Appends a route; routes are tried in the order they were added.
    pub fn route(mut self, item_builder: RouterItemBuilder) -> Self {
        self.items.push(item_builder);
        self
    }

    /// Answers requests no route matched; without a fallback they get the standard 404.
    pub fn fallback<S: Slice>(mut self, slice: S) -> Self {
        self.fallback = Some(Arc::new(slice));
        self
    }

    pub fn with_global_decorator<D2>(self, decorator: D2) -> RouterBuilder<Chain<D, D2>>
    where
        D: Decorator<SharedSlice>,
        D2: Decorator<D::Out>,
    {
        RouterBuilder { items: self.items, fallback: self.fallback, decorator: self.decorator.and_then(decorator) }
    }

    /// Builds the router, applying the global decorator to every routed slice and the fallback
    pub fn build(self) -> Router
    where
        D: Decorator<SharedSlice>,
        <D as Decorator<SharedSlice>>::Out: Slice,
    {
        let items = self
            .items
            .into_iter()
            .map(RouterItemBuilder::build)
            .map(|item| {
                let slice: SharedSlice = Arc::new(self.decorator.decorate(item.slice));
                RouterItem { slice, ..item }
            })
            .collect::<Vec<_>>();
        let fallback = self.fallback.map(|slice| Arc::new(self.decorator.decorate(slice)) as SharedSlice);

        Router { items, fallback }
    }
}

impl<D> fmt::Debug for RouterBuilder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("routes", &self.items.len())
            .field("fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

/// Creates a route that only matches through the filters added with [`RouterItemBuilder::with`].
pub fn any<S: Slice>(slice: S) -> RouterItemBuilder {
    RouterItemBuilder { filters: filter::all_filter(), slice: Arc::new(slice) }
}

macro_rules! method_router_filter {
    ($method:ident, $method_name:ident) => {
        #[doc = concat!("Creates a route that matches `", stringify!($method), "` requests.")]
        pub fn $method<S: Slice>(slice: S) -> RouterItemBuilder {
            let mut filters = filter::all_filter();
            filters.and(filter::$method_name());
            RouterItemBuilder { filters, slice: Arc::new(slice) }
        }
    };
}

method_router_filter!(get, get_method);
method_router_filter!(post, post_method);
method_router_filter!(put, put_method);
method_router_filter!(delete, delete_method);
method_router_filter!(head, head_method);
method_router_filter!(options, options_method);
method_router_filter!(connect, connect_method);
method_router_filter!(patch, patch_method);
method_router_filter!(trace, trace_method);

pub struct RouterItemBuilder {
    filters: AllFilter,
    slice: SharedSlice,
}

impl RouterItemBuilder {
    /// Narrows the route with one more filter; all filters must match.
    pub fn with<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filters.and(filter);
        self
    }

    fn build(self) -> RouterItem {
        RouterItem { filter: Box::new(self.filters), slice: self.slice }
    }
}

impl fmt::Debug for RouterItemBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterItemBuilder").field("filters", &self.filters).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::filter::{header, path, path_prefix};
    use super::*;
    use crate::decorator::LoggingDecorator;
    use bytes::Bytes;
    use http::StatusCode;
    use mockall::mock;
    use slice_http::connection::collecting;
    use slice_http::protocol::NOT_FOUND_BODY;
    use slice_http::response::Responder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts the slices it decorates.
    #[derive(Clone, Default)]
    struct Counting(Arc<AtomicUsize>);

    impl Decorator<SharedSlice> for Counting {
        type Out = SharedSlice;

        fn decorate(&self, raw: SharedSlice) -> SharedSlice {
            self.0.fetch_add(1, Ordering::SeqCst);
            raw
        }
    }

    mock! {
        pub Backend {}

        impl Slice for Backend {
            fn response(&self, head: RequestHead, body: Body) -> BoxResponse;
        }
    }

    fn answering(text: &'static str) -> MockBackend {
        let mut backend = MockBackend::new();
        backend.expect_response().times(1).returning(move |_, _| text.into_response().boxed());
        backend
    }

    fn unused() -> MockBackend {
        let mut backend = MockBackend::new();
        backend.expect_response().never();
        backend
    }

    async fn call(slice: &impl Slice, line: &str, headers: &[(&str, &str)]) -> http::Response<Bytes> {
        let head = RequestHead::from_line(line, headers.iter().copied()).unwrap();
        let (connection, collected) = collecting();
        slice.response(head, Body::empty()).send(Box::new(connection)).await.unwrap();
        collected.await.unwrap()
    }

    #[tokio::test]
    async fn first_matching_route_wins() {
        let router = Router::builder()
            .route(get(answering("users")).with(path("/users/{id}").unwrap()))
            .route(get(unused()).with(path_prefix("/users")))
            .route(post(unused()))
            .build();

        let response = call(&router, "GET /users/7 HTTP/1.1", &[]).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.into_body(), Bytes::from("users"));
    }

    #[tokio::test]
    async fn filters_are_combined() {
        let router = Router::builder()
            .route(post(unused()).with(header(http::header::CONTENT_TYPE, "application/json").unwrap()))
            .route(post(answering("form")))
            .build();

        let response = call(&router, "POST /submit HTTP/1.1", &[("content-type", "text/plain")]).await;
        assert_eq!(response.into_body(), Bytes::from("form"));
    }

    #[tokio::test]
    async fn no_match_is_404() {
        let router = Router::builder().route(get(unused())).build();

        let response = call(&router, "DELETE /anything HTTP/1.1", &[]).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.into_body(), Bytes::from(NOT_FOUND_BODY));
    }

    #[tokio::test]
    async fn fallback_answers_unmatched() {
        let router = Router::builder().route(get(unused())).fallback(answering("fallback")).build();

        let response = call(&router, "PATCH /x HTTP/1.1", &[]).await;
        assert_eq!(response.into_body(), Bytes::from("fallback"));
    }

    #[tokio::test]
    async fn global_decorator_wraps_routes() {
        let router = Router::builder()
            .route(any(answering("decorated")))
            .with_global_decorator(LoggingDecorator::default())
            .build();

        assert_eq!(router.len(), 1);
        let response = call(&router, "OPTIONS * HTTP/1.1", &[]).await;
        assert_eq!(response.into_body(), Bytes::from("decorated"));
    }

    #[tokio::test]
    async fn global_decorator_wraps_fallback() {
        let counting = Counting::default();
        let router = Router::builder()
            .route(get(unused()))
            .fallback(answering("fallback"))
            .with_global_decorator(counting.clone())
            .build();

        assert_eq!(counting.0.load(Ordering::SeqCst), 2);
        let response = call(&router, "POST /unmatched HTTP/1.1", &[]).await;
        assert_eq!(response.into_body(), Bytes::from("fallback"));
    }
}
