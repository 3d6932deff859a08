use std::error::Error;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Type-erased failure produced by handler futures and upstream byte sources.
pub type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid request line: {reason}")]
    InvalidRequestLine { reason: String },

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http uri")]
    InvalidUri,

    #[error("invalid http version: {0}")]
    InvalidVersion(String),

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },
}

impl ParseError {
    pub fn invalid_request_line<S: ToString>(str: S) -> Self {
        Self::InvalidRequestLine { reason: str.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum BodyError {
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("body stream error: {source}")]
    Stream { source: BoxError },

    #[error("split error: {source}")]
    Split {
        #[from]
        source: SplitError,
    },
}

impl BodyError {
    pub fn stream<E: Into<BoxError>>(e: E) -> Self {
        Self::Stream { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("body error: {source}")]
    Body {
        #[from]
        source: BodyError,
    },

    #[error("connection closed: {reason}")]
    Closed { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn closed<S: ToString>(str: S) -> Self {
        Self::Closed { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Errors raised while splitting a byte stream into segments.
///
/// Cloneable so that one upstream failure can be handed to both the open segment and the
/// segment stream itself.
#[derive(Error, Debug, Clone)]
pub enum SplitError {
    #[error("delimiter must not be empty")]
    EmptyDelimiter,

    #[error("upstream error: {source}")]
    Upstream { source: Arc<dyn Error + Send + Sync> },
}

impl SplitError {
    pub fn upstream<E: Into<BoxError>>(e: E) -> Self {
        Self::Upstream { source: Arc::from(e.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_keeps_message_across_clones() {
        let error = SplitError::upstream("connection reset");
        let cloned = error.clone();

        assert_eq!(error.to_string(), "upstream error: connection reset");
        assert_eq!(cloned.to_string(), error.to_string());
    }

    #[test]
    fn send_error_wraps_body_error() {
        let error: SendError = BodyError::from(SplitError::EmptyDelimiter).into();
        assert_eq!(error.to_string(), "body error: split error: delimiter must not be empty");
    }
}
