//! Monotonic request tokens for discarding stale async completions.
//!
//! Every asynchronous load issues a token before its first suspension point
//! and checks it when the result arrives. Only the most recently issued token
//! is current, so the last *requested* operation wins regardless of the order
//! in which network responses complete.

use std::sync::atomic::{AtomicU64, Ordering};

/// Token handed to one in-flight operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Raw counter value, for log fields.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Issuer and checker of [`RequestToken`]s.
///
/// # Examples
/// ```
/// use portal::domain::RequestTokens;
///
/// let tokens = RequestTokens::default();
/// let first = tokens.issue();
/// let second = tokens.issue();
/// assert!(!tokens.is_current(first));
/// assert!(tokens.is_current(second));
/// ```
#[derive(Debug, Default)]
pub struct RequestTokens {
    latest: AtomicU64,
}

impl RequestTokens {
    /// Issue a new token, invalidating every earlier one.
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Invalidate all outstanding tokens without starting a new operation.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }

    /// Whether `token` is still the most recently issued one.
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::Acquire) == token.0
    }
}
