//! HTTP request head handling.
//!
//! A request reaches a [`Slice`](crate::slice::Slice) as a [`RequestHead`] (request line plus
//! headers) and a separate streaming [`Body`](crate::protocol::body::Body). The head wraps the
//! standard `http::Request<()>` so that the usual accessors are available without a body type.

use std::fmt;
use std::str::FromStr;

use http::request::Parts;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Uri, Version};

use crate::ensure;
use crate::protocol::ParseError;

/// Represents an HTTP request head: the request line and the header collection.
#[derive(Debug)]
pub struct RequestHead {
    inner: Request<()>,
}

impl AsRef<Request<()>> for RequestHead {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl AsMut<Request<()>> for RequestHead {
    fn as_mut(&mut self) -> &mut Request<()> {
        &mut self.inner
    }
}

impl RequestHead {
    /// Builds a head from a textual request line and an ordered header sequence.
    pub fn from_line<I, K, V>(line: &str, headers: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let request_line: RequestLine = line.parse()?;
        let mut head = RequestHead::from(request_line);

        let header_map = head.inner.headers_mut();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_ref().as_bytes()).map_err(ParseError::invalid_header)?;
            let value = HeaderValue::from_str(value.as_ref()).map_err(ParseError::invalid_header)?;
            header_map.append(name, value);
        }

        Ok(head)
    }

    /// Consumes the head and returns the inner `Request<()>`.
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Attaches a body to this head, converting it into a full `Request<T>`.
    pub fn body<T>(self, body: T) -> Request<T> {
        self.inner.map(|()| body)
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Returns the request line of this head.
    pub fn request_line(&self) -> RequestLine {
        RequestLine { method: self.method().clone(), uri: self.uri().clone(), version: self.version() }
    }
}

/// Cloning copies the request line and headers; request extensions are not carried over.
impl Clone for RequestHead {
    fn clone(&self) -> Self {
        let mut inner = Request::new(());
        *inner.method_mut() = self.method().clone();
        *inner.uri_mut() = self.uri().clone();
        *inner.version_mut() = self.version();
        *inner.headers_mut() = self.headers().clone();
        Self { inner }
    }
}

impl From<Parts> for RequestHead {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}

impl From<Request<()>> for RequestHead {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}

impl From<RequestLine> for RequestHead {
    fn from(line: RequestLine) -> Self {
        let mut inner = Request::new(());
        *inner.method_mut() = line.method;
        *inner.uri_mut() = line.uri;
        *inner.version_mut() = line.version;
        Self { inner }
    }
}

/// The first line of an HTTP/1.x request, e.g. `GET /index.html HTTP/1.1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    method: Method,
    uri: Uri,
    version: Version,
}

impl RequestLine {
    pub fn new(method: Method, uri: Uri, version: Version) -> Self {
        Self { method, uri, version }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn version(&self) -> Version {
        self.version
    }
}

impl FromStr for RequestLine {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut parts = line.split(' ');

        let (Some(method), Some(target), Some(version), None) = (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseError::invalid_request_line(line));
        };

        ensure!(!method.is_empty(), ParseError::InvalidMethod);
        let method = Method::from_bytes(method.as_bytes()).map_err(|_| ParseError::InvalidMethod)?;
        let uri = target.parse::<Uri>().map_err(|_| ParseError::InvalidUri)?;
        let version = match version {
            "HTTP/0.9" => Version::HTTP_09,
            "HTTP/1.0" => Version::HTTP_10,
            "HTTP/1.1" => Version::HTTP_11,
            "HTTP/2.0" | "HTTP/2" => Version::HTTP_2,
            other => return Err(ParseError::InvalidVersion(other.to_string())),
        };

        Ok(Self { method, uri, version })
    }
}

impl fmt::Display for RequestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.method, self.uri, self.version)
    }
}
