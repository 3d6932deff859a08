//! Slice decorators.
//!
//! A [`Decorator`] turns one value into another, usually a slice into a slice that wraps it. The
//! router applies its global decorator to every routed slice and to its fallback; decorators
//! chain with [`DecoratorExt::and_then`].

mod logging;

pub use logging::LoggingDecorator;
pub use logging::LoggingSlice;

pub trait Decorator<In> {
    type Out;

    fn decorate(&self, raw: In) -> Self::Out;
}

pub trait DecoratorExt<In>: Decorator<In> {
    /// Decorates with `self` first, then with `next`.
    fn and_then<D>(self, next: D) -> Chain<Self, D>
    where
        Self: Sized,
        D: Decorator<Self::Out>,
    {
        Chain { first: self, then: next }
    }
}

impl<T: Decorator<In> + ?Sized, In> DecoratorExt<In> for T {}

/// The decorator a router starts with: slices pass through unchanged.
#[derive(Default, Clone, Copy, Debug)]
pub struct Undecorated;

impl<In> Decorator<In> for Undecorated {
    type Out = In;

    fn decorate(&self, raw: In) -> In {
        raw
    }
}

/// Two decorators applied one after the other, see [`DecoratorExt::and_then`].
#[derive(Debug, Clone, Copy)]
pub struct Chain<D1, D2> {
    first: D1,
    then: D2,
}

impl<In, D1, D2> Decorator<In> for Chain<D1, D2>
where
    D1: Decorator<In>,
    D2: Decorator<D1::Out>,
{
    type Out = D2::Out;

    fn decorate(&self, raw: In) -> Self::Out {
        self.then.decorate(self.first.decorate(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use slice_http::connection::collecting;
    use slice_http::protocol::{Body, BoxError, RequestHead};
    use slice_http::response::{BoxResponse, ResponseExt};
    use slice_http::slice::{Slice, slice_fn};

    /// Answers every request with a fixed status, ignoring the slice it wraps.
    struct Override(StatusCode);

    struct Overridden(StatusCode);

    impl Slice for Overridden {
        fn response(&self, _head: RequestHead, _body: Body) -> BoxResponse {
            let mut response = http::Response::new(Body::empty());
            *response.status_mut() = self.0;
            ResponseExt::boxed(response)
        }
    }

    impl<S: Slice> Decorator<S> for Override {
        type Out = Overridden;

        fn decorate(&self, _raw: S) -> Overridden {
            Overridden(self.0)
        }
    }

    #[test]
    fn chain_applies_in_order() {
        let chain = DecoratorExt::<u32>::and_then(Undecorated, Undecorated);
        assert_eq!(chain.decorate(7), 7);
    }

    fn override_twice<S: Slice>(slice: S) -> Overridden {
        DecoratorExt::<S>::and_then(Override(StatusCode::ACCEPTED), Override(StatusCode::GONE)).decorate(slice)
    }

    #[tokio::test]
    async fn later_decorator_wraps_earlier_one() {
        let slice = slice_fn(|_head: RequestHead, _body: Body| async { Ok::<_, BoxError>("raw") });
        let decorated = override_twice(slice);

        let head = RequestHead::from_line("GET / HTTP/1.1", [("Host", "localhost")]).unwrap();
        let (connection, collected) = collecting();
        decorated.response(head, Body::empty()).send(Box::new(connection)).await.unwrap();

        let response = collected.await.unwrap();
        assert_eq!(response.status(), StatusCode::GONE);
        assert_eq!(response.into_body(), Bytes::new());
    }
}
