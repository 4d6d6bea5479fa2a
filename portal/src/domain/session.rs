//! Session store: the single in-memory record of who is logged in.
//!
//! The store is constructed explicitly and handed to whichever views need
//! it. State changes are published on a `tokio::sync::watch` channel so the
//! route guard and views observe them without re-fetching.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::ports::{IdentityApi, IdentityApiError};
use super::{Account, Error, Identity, Profile, RequestTokens, Role};

/// What the UI should offer after a refresh failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignInHint {
    /// The remote API answered and did not recognise the session.
    LogIn,
    /// The remote API could not be reached; retrying may restore the session.
    Retry,
}

/// Snapshot of the current browser session.
///
/// ## Invariants
/// - `logged_in()` is true if and only if an [`Identity`] is held, and an
///   identity always carries both the account and the profile.
/// - While a refresh is in flight the previous identity is retained but
///   [`Session::is_loading`] is set; guards treat that as pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    identity: Option<Arc<Identity>>,
    loading: bool,
    refreshed_at: Option<DateTime<Utc>>,
    sign_in_hint: Option<SignInHint>,
}

impl Session {
    /// State at application mount: nothing known, first refresh pending.
    pub fn mounting() -> Self {
        Self {
            identity: None,
            loading: true,
            refreshed_at: None,
            sign_in_hint: None,
        }
    }

    /// Logged-out state, optionally explaining why.
    pub fn logged_out(sign_in_hint: Option<SignInHint>) -> Self {
        Self {
            identity: None,
            loading: false,
            refreshed_at: None,
            sign_in_hint,
        }
    }

    fn established(identity: Identity, refreshed_at: DateTime<Utc>) -> Self {
        Self {
            identity: Some(Arc::new(identity)),
            loading: false,
            refreshed_at: Some(refreshed_at),
            sign_in_hint: None,
        }
    }

    /// Whether an account and profile were fetched in the current lifecycle.
    pub fn logged_in(&self) -> bool {
        self.identity.is_some()
    }

    /// Whether a refresh is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_deref()
    }

    pub fn account(&self) -> Option<&Account> {
        self.identity().map(Identity::account)
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.identity().map(Identity::profile)
    }

    /// Role of the logged-in account, or [`Role::Guest`] when logged out.
    pub fn role(&self) -> Role {
        self.identity().map_or(Role::Guest, Identity::role)
    }

    /// When the current identity was established.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Present only on logged-out sessions produced by a failed refresh.
    pub fn sign_in_hint(&self) -> Option<SignInHint> {
        self.sign_in_hint
    }
}

/// Result of one [`SessionStore::refresh`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The session now holds the freshly fetched identity.
    LoggedIn,
    /// The refresh failed and the session was cleared.
    LoggedOut(SignInHint),
    /// A later refresh or a logout superseded this call; its result was
    /// discarded.
    Stale,
}

/// Map an identity port failure into the domain taxonomy.
pub(crate) fn map_identity_error(error: IdentityApiError) -> Error {
    match error {
        IdentityApiError::Unauthorized { message } => Error::unauthenticated(message),
        IdentityApiError::Network { message } => Error::network_unavailable(message),
        IdentityApiError::Timeout { message } => Error::timeout(message),
        IdentityApiError::Decode { message } => {
            Error::unauthenticated(format!("identity payload rejected: {message}"))
        }
    }
}

/// Holds the authoritative [`Session`] for the lifetime of the portal.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use mockable::DefaultClock;
/// use portal::domain::ports::FixtureIdentityApi;
/// use portal::domain::{RefreshOutcome, Role, SessionStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = SessionStore::new(Arc::new(FixtureIdentityApi), Arc::new(DefaultClock));
/// assert!(store.current().is_loading());
///
/// assert_eq!(store.refresh().await, RefreshOutcome::LoggedIn);
/// assert_eq!(store.current().role(), Role::Staff);
///
/// store.logout();
/// assert!(!store.current().logged_in());
/// # }
/// ```
pub struct SessionStore {
    identity_api: Arc<dyn IdentityApi>,
    clock: Arc<dyn Clock>,
    tokens: RequestTokens,
    state: watch::Sender<Session>,
}

impl SessionStore {
    /// Create a store in the [`Session::mounting`] state.
    pub fn new(identity_api: Arc<dyn IdentityApi>, clock: Arc<dyn Clock>) -> Self {
        let (state, _initial) = watch::channel(Session::mounting());
        Self {
            identity_api,
            clock,
            tokens: RequestTokens::default(),
            state,
        }
    }

    /// Clone of the current session.
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver notified on every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Fetch the account and profile and replace the session with the result.
    ///
    /// Any failure clears the session; there is no partial state and no
    /// fallback to the previous identity.
    pub async fn refresh(&self) -> RefreshOutcome {
        let token = self.tokens.issue();
        self.state.send_modify(|session| session.loading = true);

        let fetched = self.fetch_identity().await;
        if !self.tokens.is_current(token) {
            debug!(token = token.value(), "discarding superseded session refresh");
            return RefreshOutcome::Stale;
        }

        match fetched {
            Ok(identity) => {
                info!(
                    account_id = %identity.account().id(),
                    role = %identity.role(),
                    "session established"
                );
                self.state
                    .send_replace(Session::established(identity, self.clock.utc()));
                RefreshOutcome::LoggedIn
            }
            Err(error) => {
                let hint = if error.is_retryable() {
                    SignInHint::Retry
                } else {
                    SignInHint::LogIn
                };
                warn!(error = %error, hint = ?hint, "session refresh failed; clearing session");
                self.state.send_replace(Session::logged_out(Some(hint)));
                RefreshOutcome::LoggedOut(hint)
            }
        }
    }

    /// Clear the session immediately.
    ///
    /// Any refresh still in flight is invalidated so its completion cannot
    /// restore the cleared identity. The remote logout endpoint is not
    /// called; see [`SessionStore::logout_remote`].
    pub fn logout(&self) {
        self.tokens.invalidate();
        self.state.send_replace(Session::logged_out(None));
        info!("session cleared");
    }

    /// Invalidate the remote session, then clear the local one.
    ///
    /// The local session is cleared even when the remote call fails; the
    /// failure is returned so callers can report it.
    pub async fn logout_remote(&self) -> Result<(), Error> {
        let remote = self.identity_api.logout().await;
        self.logout();
        remote.map_err(map_identity_error)
    }

    async fn fetch_identity(&self) -> Result<Identity, IdentityApiError> {
        let (account, profile) = tokio::try_join!(
            self.identity_api.fetch_account(),
            self.identity_api.fetch_profile()
        )?;
        Identity::new(account, profile).map_err(|err| IdentityApiError::decode(err.to_string()))
    }
}
