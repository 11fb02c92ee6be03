//! Waiting on the host
//!
//! Two single-shot primitives:
//! - `AckWait`: the one outstanding "wait for the next notification" slot,
//!   resolved by a matching notification or by its deadline
//! - [`ForwardButtonSettled`]: the future handed out by
//!   `enable_forward_button` / `disable_forward_button`

use crate::{trace_log, Tag};
use futures::channel::oneshot::{self, Canceled};
use futures::future::{FutureExt, Shared};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Pending acknowledgment of a corrective move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AckWait {
    expected: Tag,
    deadline: Duration,
}

impl AckWait {
    pub(crate) fn new(expected: Tag, now: Duration, timeout: Duration) -> Self {
        Self {
            expected,
            deadline: now.saturating_add(timeout),
        }
    }

    pub(crate) fn expected(&self) -> Tag {
        self.expected
    }

    pub(crate) fn deadline(&self) -> Duration {
        self.deadline
    }

    pub(crate) fn acknowledged_by(&self, tag: Option<Tag>) -> bool {
        tag == Some(self.expected)
    }

    pub(crate) fn is_expired(&self, now: Duration) -> bool {
        now >= self.deadline
    }
}

/// Resolves once the controller is resting with the requested forward state.
///
/// The output is whether the forward slot exists at that point. Clones share
/// one outcome and every clone being awaited is woken. Dropping the future
/// does not cancel anything. If the controller is dropped first the future
/// resolves to `false`.
#[derive(Clone)]
pub struct ForwardButtonSettled {
    inner: Shared<oneshot::Receiver<bool>>,
}

impl ForwardButtonSettled {
    /// Create an already resolved future
    pub(crate) fn ready(enabled: bool) -> Self {
        let (settled, resolver) = Self::pending();
        resolver.resolve(enabled);
        settled
    }

    /// Create an unresolved future and its resolver
    pub(crate) fn pending() -> (Self, SettleResolver) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                inner: receiver.shared(),
            },
            SettleResolver { sender },
        )
    }

    /// Check if the requested state has been reached
    pub fn is_settled(&self) -> bool {
        self.outcome().is_some()
    }

    /// Resolved value, if any
    pub fn outcome(&self) -> Option<bool> {
        self.inner.clone().now_or_never().map(settled_value)
    }
}

fn settled_value(result: Result<bool, Canceled>) -> bool {
    result.unwrap_or(false)
}

impl Future for ForwardButtonSettled {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        self.inner.poll_unpin(cx).map(settled_value)
    }
}

impl fmt::Debug for ForwardButtonSettled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardButtonSettled")
            .field("outcome", &self.outcome())
            .finish()
    }
}

/// Write half of [`ForwardButtonSettled`]
pub(crate) struct SettleResolver {
    sender: oneshot::Sender<bool>,
}

impl SettleResolver {
    pub(crate) fn resolve(self, enabled: bool) {
        if self.sender.send(enabled).is_err() {
            trace_log!("Forward button future dropped before it settled");
        }
    }
}

impl fmt::Debug for SettleResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettleResolver")
            .field("canceled", &self.sender.is_canceled())
            .finish()
    }
}
