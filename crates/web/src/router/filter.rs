//! Request filtering module that provides composable request filters.
//!
//! This module implements a filter system that allows you to:
//! - Filter requests based on HTTP methods
//! - Filter requests based on headers
//! - Filter requests based on the request path
//! - Combine multiple filters using AND/OR logic
//! - Create custom filters using closures
//!
//! Filters are pure functions of the request line and the headers; they never see the body.
//!
//! # Examples
//!
//! ```
//! use slice_web::router::filter::{all_filter, get_method, header, path_prefix};
//!
//! let mut combined = all_filter();
//! combined.and(get_method()).and(path_prefix("/api")).and(header("Authorization", "Bearer token").unwrap());
//! ```

use std::fmt;

use http::{HeaderName, HeaderValue, Method};
use slice_http::protocol::RequestHead;

use crate::FilterError;

/// Core trait for request filtering.
///
/// The `Filter` trait requires `Send + Sync`, ensuring that filters
/// can be safely shared by concurrently handled requests.
pub trait Filter: Send + Sync {
    /// Check if the request matches this filter's criteria.
    fn matches(&self, head: &RequestHead) -> bool;
}

/// A filter that wraps a closure.
struct FnFilter<F: Fn(&RequestHead) -> bool>(F);

impl<F: Fn(&RequestHead) -> bool + Send + Sync> Filter for FnFilter<F> {
    fn matches(&self, head: &RequestHead) -> bool {
        (self.0)(head)
    }
}

impl<F: Fn(&RequestHead) -> bool> fmt::Debug for FnFilter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnFilter")
    }
}

/// Creates a new filter from a closure.
///
/// # Example
/// ```
/// use slice_web::router::filter::fn_filter;
///
/// let custom_filter = fn_filter(|head| head.uri().query().is_some());
/// ```
pub fn fn_filter<F>(f: F) -> impl Filter
where
    F: Fn(&RequestHead) -> bool + Send + Sync,
{
    FnFilter(f)
}

/// Creates a filter that always returns true.
pub fn true_filter() -> TrueFilter {
    TrueFilter
}

/// Creates a filter that always returns false.
pub fn false_filter() -> FalseFilter {
    FalseFilter
}

/// A filter that always returns true.
#[derive(Debug, Clone, Copy)]
pub struct TrueFilter;

impl Filter for TrueFilter {
    #[inline]
    fn matches(&self, _head: &RequestHead) -> bool {
        true
    }
}

/// A filter that always returns false.
#[derive(Debug, Clone, Copy)]
pub struct FalseFilter;

impl Filter for FalseFilter {
    #[inline]
    fn matches(&self, _head: &RequestHead) -> bool {
        false
    }
}

/// Creates a new OR-composed filter chain.
pub fn any_filter() -> AnyFilter {
    AnyFilter::new()
}

/// Compose filters with OR logic.
///
/// If any inner filter succeeds, the whole filter succeeds.
/// An empty filter chain returns true by default.
pub struct AnyFilter {
    filters: Vec<Box<dyn Filter>>,
}

impl AnyFilter {
    fn new() -> Self {
        Self { filters: vec![] }
    }

    /// Add a new filter to the OR chain.
    pub fn or<F: Filter + 'static>(&mut self, filter: F) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl fmt::Debug for AnyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyFilter").field("filters", &self.filters.len()).finish()
    }
}

impl Filter for AnyFilter {
    fn matches(&self, head: &RequestHead) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|filter| filter.matches(head))
    }
}

/// Creates a new AND-composed filter chain.
pub fn all_filter() -> AllFilter {
    AllFilter::new()
}

/// Compose filters with AND logic.
///
/// All inner filters must succeed for the whole filter to succeed; evaluation stops at the first
/// filter that fails. An empty filter chain returns true by default.
pub struct AllFilter {
    filters: Vec<Box<dyn Filter>>,
}

impl AllFilter {
    fn new() -> Self {
        Self { filters: vec![] }
    }

    /// Add a new filter to the AND chain.
    pub fn and<F: Filter + 'static>(&mut self, filter: F) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl fmt::Debug for AllFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllFilter").field("filters", &self.filters.len()).finish()
    }
}

impl Filter for AllFilter {
    fn matches(&self, head: &RequestHead) -> bool {
        self.filters.iter().all(|filter| filter.matches(head))
    }
}

/// A filter that matches HTTP methods.
#[derive(Debug, Clone)]
pub struct MethodFilter(Method);

impl Filter for MethodFilter {
    fn matches(&self, head: &RequestHead) -> bool {
        self.0.eq(head.method())
    }
}

macro_rules! method_filter {
    ($method:ident, $upper_case_method:ident) => {
        #[doc = concat!("Creates a filter that matches HTTP ", stringify!($upper_case_method), " requests.")]
        #[inline]
        pub fn $method() -> MethodFilter {
            MethodFilter(Method::$upper_case_method)
        }
    };
}

method_filter!(get_method, GET);
method_filter!(post_method, POST);
method_filter!(put_method, PUT);
method_filter!(delete_method, DELETE);
method_filter!(head_method, HEAD);
method_filter!(options_method, OPTIONS);
method_filter!(connect_method, CONNECT);
method_filter!(patch_method, PATCH);
method_filter!(trace_method, TRACE);

/// Creates a filter that matches a specific header name and value.
pub fn header<K, V>(header_name: K, header_value: V) -> Result<HeaderFilter, FilterError>
where
    HeaderName: TryFrom<K>,
    <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
    HeaderValue: TryFrom<V>,
    <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
{
    let name = <HeaderName as TryFrom<K>>::try_from(header_name).map_err(Into::<http::Error>::into)?;
    let value = <HeaderValue as TryFrom<V>>::try_from(header_value).map_err(Into::<http::Error>::into)?;
    Ok(HeaderFilter(name, value))
}

/// A filter that matches HTTP headers.
#[derive(Debug, Clone)]
pub struct HeaderFilter(HeaderName, HeaderValue);

impl Filter for HeaderFilter {
    fn matches(&self, head: &RequestHead) -> bool {
        head.headers().get(&self.0).is_some_and(|value| self.1.eq(value))
    }
}

/// Creates a filter that matches the request path against a route pattern such as
/// `/users/{id}` or `/static/{*file}`.
pub fn path(pattern: impl Into<String>) -> Result<PathFilter, FilterError> {
    let pattern = pattern.into();
    let mut router = matchit::Router::new();
    router.insert(pattern.clone(), ())?;
    Ok(PathFilter { pattern, router })
}

/// A filter that matches the request path against a route pattern.
pub struct PathFilter {
    pattern: String,
    router: matchit::Router<()>,
}

impl fmt::Debug for PathFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathFilter").field(&self.pattern).finish()
    }
}

impl Filter for PathFilter {
    fn matches(&self, head: &RequestHead) -> bool {
        self.router.at(head.uri().path()).is_ok()
    }
}

/// Creates a filter that matches every path below `prefix`, segment-wise: `/api` matches `/api`
/// and `/api/users` but not `/apix`.
pub fn path_prefix(prefix: impl Into<String>) -> PathPrefixFilter {
    let mut prefix = prefix.into();
    while prefix.len() > 1 && prefix.ends_with('/') {
        prefix.pop();
    }
    PathPrefixFilter(prefix)
}

/// A filter that matches a path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixFilter(String);

impl Filter for PathPrefixFilter {
    fn matches(&self, head: &RequestHead) -> bool {
        let path = head.uri().path();
        if self.0 == "/" {
            return path.starts_with('/');
        }
        path.strip_prefix(self.0.as_str()).is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}
