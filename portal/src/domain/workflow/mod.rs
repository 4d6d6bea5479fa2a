//! Blood request workflow: drives one request from load to resolution.
//!
//! The stage machine itself is pure (see [`WorkflowStage::apply`]); this
//! service wraps it with the remote calls and publishes every change on a
//! `tokio::sync::watch` channel. Completions that arrive after the page was
//! closed, or after another request was opened, are discarded.

mod stage;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub use self::stage::{FulfilmentMethod, Outcome, TransitionError, WorkflowEvent, WorkflowStage};

use super::ports::{BloodRequestApi, BloodRequestApiError, RemoteAck};
use super::request_registry::map_blood_request_error;
use super::{
    BloodRequest, BloodRequestId, ComponentSpec, DonorAssignment, Error, RequestRegistry,
    RequestStatus, RequestToken, RequestTokens,
};

/// Failures reported by [`BloodRequestWorkflow`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("no blood request is open")]
    NotOpen,
    /// The request could not be loaded; the page shows a blocking error.
    #[error("blood request unavailable: {0}")]
    Blocked(Error),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    /// The remote API rejected or failed a confirmation.
    #[error("{0}")]
    Remote(Error),
}

impl WorkflowError {
    /// Whether repeating the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Blocked(error) | Self::Remote(error) => error.is_retryable(),
            Self::NotOpen | Self::Transition(_) => false,
        }
    }
}

/// Result of an asynchronous workflow operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The workflow moved to this stage.
    Applied(WorkflowStage),
    /// The operation finished after being superseded; nothing changed.
    Discarded,
}

/// Observable state of a workflow instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Loading {
        id: BloodRequestId,
    },
    Blocked {
        id: BloodRequestId,
        error: Error,
    },
    Active {
        request: BloodRequest,
        stage: WorkflowStage,
        /// Failure of the most recent confirmation, kept for the retry prompt.
        last_error: Option<Error>,
    },
    Closed,
}

impl WorkflowState {
    pub fn stage(&self) -> Option<WorkflowStage> {
        match self {
            Self::Active { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn request(&self) -> Option<&BloodRequest> {
        match self {
            Self::Active { request, .. } => Some(request),
            _ => None,
        }
    }

    /// Error the page should display, if any.
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Blocked { error, .. } => Some(error),
            Self::Active { last_error, .. } => last_error.as_ref(),
            _ => None,
        }
    }

    fn advance(
        &mut self,
        event: WorkflowEvent,
        confirmed: Option<BloodRequest>,
        failure: Option<Error>,
    ) -> Result<WorkflowStage, WorkflowError> {
        match self {
            Self::Active {
                request,
                stage,
                last_error,
            } => {
                let next = stage.apply(event)?;
                *stage = next;
                *last_error = failure;
                if let Some(confirmed) = confirmed {
                    *request = confirmed;
                }
                Ok(next)
            }
            Self::Blocked { error, .. } => Err(WorkflowError::Blocked(error.clone())),
            Self::Idle | Self::Loading { .. } | Self::Closed => Err(WorkflowError::NotOpen),
        }
    }
}

/// Workflow for the request shown on one page.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use portal::domain::ports::FixtureBloodRequestApi;
/// use portal::domain::workflow::{
///     BloodRequestWorkflow, Completion, FulfilmentMethod, Outcome, WorkflowStage,
/// };
/// use portal::domain::{BloodComponent, BloodRequestId, ComponentSpec, RequestRegistry};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let api = Arc::new(FixtureBloodRequestApi);
/// let registry = Arc::new(RequestRegistry::new(api.clone()));
/// let workflow = BloodRequestWorkflow::new(registry, api);
///
/// let id = BloodRequestId::new("42").expect("valid id");
/// workflow.open(&id).await.expect("fixture load");
/// workflow.choose_method(FulfilmentMethod::Stock).expect("created");
///
/// let spec = ComponentSpec::new(BloodComponent::RedCells, 2).expect("units");
/// let completion = workflow.confirm_withdrawal(spec).await.expect("fixture ack");
/// assert_eq!(
///     completion,
///     Completion::Applied(WorkflowStage::Resolved {
///         method: Some(FulfilmentMethod::Stock),
///         outcome: Outcome::Fulfilled,
///     })
/// );
/// # }
/// ```
pub struct BloodRequestWorkflow {
    registry: Arc<RequestRegistry>,
    api: Arc<dyn BloodRequestApi>,
    tokens: RequestTokens,
    state: watch::Sender<WorkflowState>,
}

impl BloodRequestWorkflow {
    pub fn new(registry: Arc<RequestRegistry>, api: Arc<dyn BloodRequestApi>) -> Self {
        let (state, _initial) = watch::channel(WorkflowState::Idle);
        Self {
            registry,
            api,
            tokens: RequestTokens::default(),
            state,
        }
    }

    /// Clone of the current state.
    pub fn current(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    /// Load `id` and derive its stage from the remote status.
    ///
    /// A failed load leaves the workflow blocked; cached copies are never
    /// used in its place.
    pub async fn open(&self, id: &BloodRequestId) -> Result<Completion, WorkflowError> {
        let token = self.tokens.issue();
        self.state
            .send_replace(WorkflowState::Loading { id: id.clone() });

        let loaded = self.registry.load(id).await;
        if !self.tokens.is_current(token) {
            debug!(%id, token = token.value(), "discarding superseded open");
            return Ok(Completion::Discarded);
        }

        match loaded {
            Ok(request) => {
                let stage = WorkflowStage::from_status(request.status());
                info!(%id, status = ?request.status(), stage = ?stage, "blood request opened");
                self.state.send_replace(WorkflowState::Active {
                    request,
                    stage,
                    last_error: None,
                });
                Ok(Completion::Applied(stage))
            }
            Err(error) => {
                warn!(%id, error = %error, "blood request blocked");
                self.state.send_replace(WorkflowState::Blocked {
                    id: id.clone(),
                    error: error.clone(),
                });
                Err(WorkflowError::Blocked(error))
            }
        }
    }

    /// Pick the stock or donor branch.
    pub fn choose_method(&self, method: FulfilmentMethod) -> Result<WorkflowStage, WorkflowError> {
        self.transition(WorkflowEvent::ChooseMethod(method), None, None)
    }

    /// Return from a chosen branch to `Created`.
    ///
    /// Rejected once confirmation has been requested.
    pub fn go_back(&self) -> Result<WorkflowStage, WorkflowError> {
        self.transition(WorkflowEvent::GoBack, None, None)
    }

    /// Confirm the stock branch by withdrawing units.
    ///
    /// Dropping the returned future before it completes reverts the stage
    /// to `MethodChosen`.
    pub async fn confirm_withdrawal(
        &self,
        spec: ComponentSpec,
    ) -> Result<Completion, WorkflowError> {
        let pending = self.begin(FulfilmentMethod::Stock)?;
        let result = self.api.withdraw_from_stock(pending.id(), &spec).await;
        pending.finish(result)
    }

    /// Confirm the donor branch by recording the donor's units.
    ///
    /// Dropping the returned future before it completes reverts the stage
    /// to `MethodChosen`.
    pub async fn confirm_donor_fulfilment(
        &self,
        assignment: DonorAssignment,
    ) -> Result<Completion, WorkflowError> {
        let pending = self.begin(FulfilmentMethod::Donor)?;
        let result = self.api.fulfill_blood_request(pending.id(), &assignment).await;
        pending.finish(result)
    }

    /// Leave the page. Pending completions become no-ops.
    pub fn close(&self) {
        self.tokens.invalidate();
        self.registry.release();
        self.state.send_replace(WorkflowState::Closed);
        debug!("blood request workflow closed");
    }

    fn transition(
        &self,
        event: WorkflowEvent,
        confirmed: Option<BloodRequest>,
        failure: Option<Error>,
    ) -> Result<WorkflowStage, WorkflowError> {
        let mut outcome = Err(WorkflowError::NotOpen);
        self.state.send_if_modified(|state| {
            outcome = state.advance(event, confirmed, failure);
            outcome.is_ok()
        });
        if let Ok(stage) = &outcome {
            info!(event = ?event, stage = ?stage, "workflow stage changed");
        }
        outcome
    }

    fn begin(&self, method: FulfilmentMethod) -> Result<PendingConfirmation<'_>, WorkflowError> {
        let id = self
            .state
            .borrow()
            .request()
            .map(|request| request.id().clone());
        self.transition(WorkflowEvent::Confirm(method), None, None)?;
        let id = id.ok_or(WorkflowError::NotOpen)?;
        Ok(PendingConfirmation {
            workflow: self,
            token: self.tokens.issue(),
            id,
            settled: false,
        })
    }

    fn finish(
        &self,
        token: RequestToken,
        id: &BloodRequestId,
        result: Result<RemoteAck, BloodRequestApiError>,
    ) -> Result<Completion, WorkflowError> {
        if !self.tokens.is_current(token) {
            debug!(%id, token = token.value(), "discarding completion for closed workflow");
            return Ok(Completion::Discarded);
        }

        match result {
            Ok(RemoteAck { status }) => {
                let confirmed = self.registry.apply_status(id, status);
                let Some(outcome) = terminal_outcome(status) else {
                    let error = Error::internal(format!(
                        "remote API left blood request {id} in status {status:?}"
                    ));
                    warn!(%id, status = ?status, "confirmation did not resolve the request");
                    self.transition(WorkflowEvent::Reverted, confirmed, Some(error.clone()))?;
                    return Err(WorkflowError::Remote(error));
                };
                let stage = self.transition(WorkflowEvent::Completed(outcome), confirmed, None)?;
                Ok(Completion::Applied(stage))
            }
            Err(error) => {
                let error = map_blood_request_error(error);
                warn!(
                    %id,
                    error = %error,
                    retryable = error.is_retryable(),
                    "confirmation failed"
                );
                self.transition(WorkflowEvent::Reverted, None, Some(error.clone()))?;
                Err(WorkflowError::Remote(error))
            }
        }
    }
}

/// Confirmation whose remote call is in flight.
///
/// Reverts the stage on drop unless [`PendingConfirmation::finish`] ran, so
/// an abandoned call never leaves the workflow stuck in `Executing`.
struct PendingConfirmation<'a> {
    workflow: &'a BloodRequestWorkflow,
    token: RequestToken,
    id: BloodRequestId,
    settled: bool,
}

impl PendingConfirmation<'_> {
    fn id(&self) -> &BloodRequestId {
        &self.id
    }

    fn finish(
        mut self,
        result: Result<RemoteAck, BloodRequestApiError>,
    ) -> Result<Completion, WorkflowError> {
        self.settled = true;
        self.workflow.finish(self.token, &self.id, result)
    }
}

impl Drop for PendingConfirmation<'_> {
    fn drop(&mut self) {
        if self.settled || !self.workflow.tokens.is_current(self.token) {
            return;
        }
        warn!(id = %self.id, token = self.token.value(), "confirmation abandoned before completion");
        if let Err(error) = self
            .workflow
            .transition(WorkflowEvent::Reverted, None, None)
        {
            debug!(id = %self.id, error = %error, "abandoned confirmation left nothing to revert");
        }
    }
}

fn terminal_outcome(status: RequestStatus) -> Option<Outcome> {
    match status {
        RequestStatus::Fulfilled => Some(Outcome::Fulfilled),
        RequestStatus::Failed => Some(Outcome::Failed),
        RequestStatus::Pending | RequestStatus::Processing => None,
    }
}
