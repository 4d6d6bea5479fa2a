//! Route guard: decides whether a protected view renders, hides or
//! redirects for the current session.
//!
//! The guard is fail-closed. Loading sessions yield [`GuardDecision::Pending`]
//! and every other non-render decision withholds the protected content.

use std::fmt;

use serde::Serialize;
use tokio::sync::watch;

use super::{RoleRequirement, Session};

/// Validation errors returned by [`RedirectPath::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedirectPathError {
    #[error("redirect path must start with '/'")]
    NotAbsolute,
    #[error("redirect path '{0}' must stay on this site")]
    External(String),
}

/// Local path a denied visitor is sent to.
///
/// Only site-local paths are accepted. Protocol-relative (`//host`) and
/// scheme-bearing values are rejected.
///
/// # Examples
/// ```
/// use portal::domain::RedirectPath;
///
/// assert!(RedirectPath::new("/login").is_ok());
/// assert!(RedirectPath::new("//evil.example").is_err());
/// assert!(RedirectPath::new("https://evil.example").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct RedirectPath(String);

impl RedirectPath {
    pub fn new(raw: impl Into<String>) -> Result<Self, RedirectPathError> {
        let path = raw.into();
        if !path.starts_with('/') {
            return Err(RedirectPathError::NotAbsolute);
        }
        let external = path.starts_with("//")
            || path.contains('\\')
            || path.contains(':')
            || path.chars().any(char::is_whitespace);
        if external {
            return Err(RedirectPathError::External(path));
        }
        Ok(Self(path))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RedirectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<RedirectPath> for String {
    fn from(value: RedirectPath) -> Self {
        value.0
    }
}

/// What a guard does when access is denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialBehaviour {
    /// Render nothing in place of the view.
    Hide,
    /// Send the visitor elsewhere.
    Redirect(RedirectPath),
}

/// Result of evaluating a guard against a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "path", rename_all = "snake_case")]
pub enum GuardDecision {
    /// The session is still loading; show neither content nor denial.
    Pending,
    Render,
    Hide,
    Redirect(RedirectPath),
}

impl GuardDecision {
    pub fn is_render(&self) -> bool {
        matches!(self, Self::Render)
    }
}

/// Outcome of [`RouteGuard::gate`]: the content only when access is granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate<T> {
    Granted(T),
    Withheld(GuardDecision),
}

impl<T> Gate<T> {
    /// The protected content, if granted.
    pub fn into_content(self) -> Option<T> {
        match self {
            Self::Granted(content) => Some(content),
            Self::Withheld(_) => None,
        }
    }
}

/// Access rule for one view.
///
/// # Examples
/// ```
/// use portal::domain::{DenialBehaviour, GuardDecision, Role, RouteGuard, Session};
///
/// let guard = RouteGuard::new(Role::Staff, DenialBehaviour::Hide);
/// assert_eq!(guard.evaluate(&Session::mounting()), GuardDecision::Pending);
/// assert_eq!(guard.evaluate(&Session::logged_out(None)), GuardDecision::Hide);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    requirement: RoleRequirement,
    on_denied: DenialBehaviour,
}

impl RouteGuard {
    pub fn new(requirement: impl Into<RoleRequirement>, on_denied: DenialBehaviour) -> Self {
        Self {
            requirement: requirement.into(),
            on_denied,
        }
    }

    pub fn requirement(&self) -> &RoleRequirement {
        &self.requirement
    }

    pub fn on_denied(&self) -> &DenialBehaviour {
        &self.on_denied
    }

    /// Decide what the view should do for `session`.
    pub fn evaluate(&self, session: &Session) -> GuardDecision {
        if session.is_loading() {
            return GuardDecision::Pending;
        }
        if session.logged_in() && self.requirement.is_satisfied_by(session.role()) {
            return GuardDecision::Render;
        }
        match &self.on_denied {
            DenialBehaviour::Hide => GuardDecision::Hide,
            DenialBehaviour::Redirect(path) => GuardDecision::Redirect(path.clone()),
        }
    }

    /// Release `content` only when the guard renders.
    pub fn gate<T>(&self, session: &Session, content: T) -> Gate<T> {
        match self.evaluate(session) {
            GuardDecision::Render => Gate::Granted(content),
            withheld => Gate::Withheld(withheld),
        }
    }

    /// Follow session changes, re-evaluating on each one.
    pub fn watch(&self, sessions: watch::Receiver<Session>) -> GuardWatch {
        GuardWatch {
            guard: self.clone(),
            sessions,
        }
    }
}

/// Guard bound to a live session stream.
#[derive(Debug)]
pub struct GuardWatch {
    guard: RouteGuard,
    sessions: watch::Receiver<Session>,
}

impl GuardWatch {
    /// Decision for the latest session, marking it as seen.
    pub fn current(&mut self) -> GuardDecision {
        let session = self.sessions.borrow_and_update();
        self.guard.evaluate(&session)
    }

    /// Wait for the next session change and return the new decision.
    ///
    /// Returns `None` once the session store has been dropped.
    pub async fn changed(&mut self) -> Option<GuardDecision> {
        self.sessions.changed().await.ok()?;
        Some(self.current())
    }
}
