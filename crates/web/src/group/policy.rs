use std::fmt;

use slice_http::protocol::ResponseHead;

/// Decides whether a captured backend response may win the race.
pub trait SuccessPolicy: Send + Sync + 'static {
    fn is_success(&self, head: &ResponseHead) -> bool;
}

/// Accepts `2xx` and `3xx` responses.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusFamilyPolicy;

impl SuccessPolicy for StatusFamilyPolicy {
    fn is_success(&self, head: &ResponseHead) -> bool {
        let status = head.status();
        status.is_success() || status.is_redirection()
    }
}

/// A policy backed by a closure.
pub struct FnPolicy<F>(F);

impl<F> fmt::Debug for FnPolicy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnPolicy")
    }
}

impl<F> SuccessPolicy for FnPolicy<F>
where
    F: Fn(&ResponseHead) -> bool + Send + Sync + 'static,
{
    fn is_success(&self, head: &ResponseHead) -> bool {
        (self.0)(head)
    }
}

/// Creates a policy from a closure.
///
/// # Example
/// ```
/// use http::StatusCode;
/// use slice_web::group::fn_policy;
///
/// // anything but an explicit not-found
/// let policy = fn_policy(|head| head.status() != StatusCode::NOT_FOUND);
/// ```
pub fn fn_policy<F>(f: F) -> FnPolicy<F>
where
    F: Fn(&ResponseHead) -> bool + Send + Sync + 'static,
{
    FnPolicy(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    fn head(status: StatusCode) -> ResponseHead {
        let mut head = ResponseHead::new(());
        *head.status_mut() = status;
        head
    }

    #[test]
    fn status_family() {
        let policy = StatusFamilyPolicy;
        assert!(policy.is_success(&head(StatusCode::OK)));
        assert!(policy.is_success(&head(StatusCode::NO_CONTENT)));
        assert!(policy.is_success(&head(StatusCode::FOUND)));
        assert!(!policy.is_success(&head(StatusCode::NOT_FOUND)));
        assert!(!policy.is_success(&head(StatusCode::BAD_GATEWAY)));
        assert!(!policy.is_success(&head(StatusCode::CONTINUE)));
    }

    #[test]
    fn closure_policy() {
        let policy = fn_policy(|head| head.status() != StatusCode::NOT_FOUND);
        assert!(policy.is_success(&head(StatusCode::INTERNAL_SERVER_ERROR)));
        assert!(!policy.is_success(&head(StatusCode::NOT_FOUND)));
    }
}
