//! Request registry: cache of fetched blood requests plus the active pointer.
//!
//! Loads are token checked. A fetch only touches the cache entry for its
//! identifier when no later load of that identifier has already landed, and
//! only the most recently requested load may move the active pointer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::ports::{BloodRequestApi, BloodRequestApiError};
use super::{BloodRequest, BloodRequestId, Error, RequestStatus, RequestToken, RequestTokens};

/// Map a blood request port failure into the domain taxonomy.
pub(crate) fn map_blood_request_error(error: BloodRequestApiError) -> Error {
    let message = error.to_string();
    match error {
        BloodRequestApiError::NotFound { .. } => Error::not_found(message),
        BloodRequestApiError::Unauthorized { .. } => Error::unauthenticated(message),
        BloodRequestApiError::Forbidden { .. } => Error::forbidden(message),
        BloodRequestApiError::InsufficientStock { .. } => Error::insufficient_stock(message),
        BloodRequestApiError::Validation { .. } => Error::validation(message),
        BloodRequestApiError::Network { .. } => Error::network_unavailable(message),
        BloodRequestApiError::Timeout { .. } => Error::timeout(message),
        BloodRequestApiError::Decode { .. } => Error::internal(message),
    }
}

/// Cached record together with the token of the load that stored it.
#[derive(Debug, Clone)]
struct CachedEntry {
    request: BloodRequest,
    loaded_by: RequestToken,
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: HashMap<BloodRequestId, CachedEntry>,
    active: Option<BloodRequestId>,
}

impl RegistryState {
    /// Whether a load issued with `token` may still write the entry for `id`.
    fn accepts(&self, id: &BloodRequestId, token: RequestToken) -> bool {
        self.entries
            .get(id)
            .is_none_or(|entry| entry.loaded_by < token)
    }
}

/// In-memory record of fetched blood requests.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use portal::domain::ports::FixtureBloodRequestApi;
/// use portal::domain::{BloodRequestId, RequestRegistry};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let registry = RequestRegistry::new(Arc::new(FixtureBloodRequestApi));
/// let id = BloodRequestId::new("42").expect("valid id");
///
/// let loaded = registry.load(&id).await.expect("fixture load");
/// assert_eq!(registry.get_active(), Some(loaded));
/// # }
/// ```
pub struct RequestRegistry {
    api: Arc<dyn BloodRequestApi>,
    tokens: RequestTokens,
    state: Mutex<RegistryState>,
}

impl RequestRegistry {
    pub fn new(api: Arc<dyn BloodRequestApi>) -> Self {
        Self {
            api,
            tokens: RequestTokens::default(),
            state: Mutex::new(RegistryState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch `id`, store it, and make it active unless a later load was
    /// requested meanwhile.
    ///
    /// A failure evicts the cached copy of `id`; callers never fall back to
    /// stale data. Results of a load overtaken by a later load of the same
    /// `id` leave the cache untouched.
    pub async fn load(&self, id: &BloodRequestId) -> Result<BloodRequest, Error> {
        let token = self.tokens.issue();
        let fetched = self.api.fetch_blood_request(id).await;
        let current = self.tokens.is_current(token);

        let mut state = self.state();
        let writable = state.accepts(id, token);
        match fetched {
            Ok(request) => {
                if writable {
                    state.entries.insert(
                        id.clone(),
                        CachedEntry {
                            request: request.clone(),
                            loaded_by: token,
                        },
                    );
                } else {
                    debug!(%id, token = token.value(), "newer copy already cached");
                }
                if current {
                    state.active = Some(id.clone());
                } else {
                    debug!(%id, token = token.value(), "superseded load kept out of active pointer");
                }
                Ok(request)
            }
            Err(error) => {
                warn!(%id, error = %error, "blood request load failed");
                if writable {
                    state.entries.remove(id);
                }
                if current {
                    state.active = None;
                }
                Err(map_blood_request_error(error))
            }
        }
    }

    /// Active record, if any.
    pub fn get_active(&self) -> Option<BloodRequest> {
        let state = self.state();
        state
            .active
            .as_ref()
            .and_then(|id| state.entries.get(id))
            .map(|entry| entry.request.clone())
    }

    /// Cached record for `id`, whether or not it is active.
    pub fn cached(&self, id: &BloodRequestId) -> Option<BloodRequest> {
        self.state()
            .entries
            .get(id)
            .map(|entry| entry.request.clone())
    }

    /// Record a status the remote API confirmed.
    pub(crate) fn apply_status(
        &self,
        id: &BloodRequestId,
        status: RequestStatus,
    ) -> Option<BloodRequest> {
        let mut state = self.state();
        let entry = state.entries.get_mut(id)?;
        entry.request = entry.request.with_status(status);
        Some(entry.request.clone())
    }

    /// Drop the active pointer and retire any load still in flight.
    pub fn release(&self) {
        self.tokens.invalidate();
        self.state().active = None;
    }
}
