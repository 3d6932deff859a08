//! Routing and group broadcast on top of `slice-http`
//!
//! - [`router`]: ordered `(filter, slice)` routing with a 404 default
//! - [`decorator`]: composable slice decorators, including request logging
//! - [`group`]: a slice that broadcasts safe requests to several backends and forwards the
//!   response of the highest-priority backend that succeeded
//!
//! # Example
//!
//! ```
//! use slice_http::protocol::{Body, BoxError, RequestHead};
//! use slice_http::slice::slice_fn;
//! use slice_web::group::GroupSlice;
//! use slice_web::router::{Router, filter::path_prefix, get};
//!
//! let primary = slice_fn(|_head: RequestHead, _body: Body| async { Ok::<_, BoxError>("from primary") });
//! let mirror = slice_fn(|_head: RequestHead, _body: Body| async { Ok::<_, BoxError>("from mirror") });
//!
//! let group = GroupSlice::builder().backend(primary).backend(mirror).build();
//! let router = Router::builder().route(get(group).with(path_prefix("/repository"))).build();
//! # let _ = router;
//! ```

pub mod decorator;
pub mod group;
pub mod router;

mod error;

pub use error::FilterError;
pub use group::GroupSlice;
pub use router::Router;
