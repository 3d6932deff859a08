//! Serves one artifact request from a group of three repositories.
//!
//! The local repository is asked first, then a slow primary mirror, then a fast fallback mirror.
//! The race forwards the primary mirror's answer even though the fallback answers earlier.

use std::time::Duration;

use http::StatusCode;
use slice_http::connection::collecting;
use slice_http::protocol::{Body, BoxError, RequestHead};
use slice_http::slice::{Slice, slice_fn};
use slice_web::decorator::LoggingDecorator;
use slice_web::group::GroupSlice;
use slice_web::router::{Router, any, filter::path_prefix};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

fn repository(name: &'static str, delay: Duration, holds: bool) -> impl Slice {
    slice_fn(move |head: RequestHead, _body: Body| async move {
        tokio::time::sleep(delay).await;
        info!(repository = name, path = head.uri().path(), "lookup finished");
        if holds {
            Ok::<_, BoxError>((StatusCode::OK, format!("{} from {name}\n", head.uri().path())))
        } else {
            Ok((StatusCode::NOT_FOUND, String::new()))
        }
    })
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let group = GroupSlice::builder()
        .backend(repository("local", Duration::from_millis(10), false))
        .backend(repository("central", Duration::from_millis(200), true))
        .backend(repository("fallback", Duration::from_millis(20), true))
        .build();

    let router = Router::builder()
        .route(any(group).with(path_prefix("/repository")))
        .with_global_decorator(LoggingDecorator::new(Level::INFO))
        .build();

    for line in ["GET /repository/lib/lib-1.0.jar HTTP/1.1", "GET /elsewhere HTTP/1.1"] {
        let head = RequestHead::from_line(line, [("Host", "localhost")]).expect("valid request line");
        let (connection, collected) = collecting();
        if let Err(e) = router.response(head, Body::empty()).send(Box::new(connection)).await {
            info!(cause = %e, "failed to send response");
            continue;
        }

        match collected.await {
            Ok(response) => {
                info!(status = %response.status(), body = %String::from_utf8_lossy(response.body()), "client received")
            }
            Err(e) => info!(cause = %e, "no response received"),
        }
    }
}
