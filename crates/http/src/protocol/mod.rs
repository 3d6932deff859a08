//! Core HTTP protocol abstractions.
//!
//! This module provides the value types every slice works with:
//!
//! - **Request Head** ([`request`]): request line and headers
//!   - [`RequestHead`]: wraps `http::Request<()>`
//!   - [`RequestLine`]: `METHOD target VERSION`, parseable from text
//!
//! - **Response Head** ([`response`]): status and headers
//!   - [`ResponseHead`]: type alias for `http::Response<()>`
//!   - [`not_found`] / [`internal_error`]: the only responses synthesized by this crate
//!
//! - **Body Streaming** ([`body`]): the lazily-pulled byte stream
//!   - [`Body`]: implements `http_body::Body`
//!
//! - **Error Handling** ([`error`]):
//!   - [`ParseError`]: request line / header parsing errors
//!   - [`BodyError`]: body stream errors
//!   - [`SendError`]: response delivery errors
//!   - [`SplitError`]: segment tokenizer errors

mod request;
pub use request::RequestHead;
pub use request::RequestLine;

mod response;
pub use response::NOT_FOUND_BODY;
pub use response::ResponseHead;
pub use response::internal_error;
pub use response::not_found;
pub(crate) use response::plain_text;
pub(crate) use response::set_content_type;

mod error;
pub use error::BodyError;
pub use error::BoxError;
pub use error::ParseError;
pub use error::SendError;
pub use error::SplitError;

pub mod body;
pub use body::Body;
