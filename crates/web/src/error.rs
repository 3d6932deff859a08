use thiserror::Error;

/// Errors raised while assembling routes and filters.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("invalid header filter: {source}")]
    InvalidHeader {
        #[from]
        source: http::Error,
    },

    #[error("invalid path pattern: {source}")]
    InvalidPath {
        #[from]
        source: matchit::InsertError,
    },
}
