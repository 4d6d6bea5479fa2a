//! Pure stage machine for one blood request.

use serde::Serialize;

use crate::domain::RequestStatus;

/// Fulfilment branch chosen for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfilmentMethod {
    /// Withdraw units from the bank's stock.
    Stock,
    /// Assign a donor who covers the request.
    Donor,
}

/// Final result recorded by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Fulfilled,
    Failed,
}

/// Position of a request within its resolution process.
///
/// The stage is derived, never persisted. Reopening a request derives it
/// again from the remote status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum WorkflowStage {
    Created,
    MethodChosen {
        method: FulfilmentMethod,
    },
    Executing {
        method: FulfilmentMethod,
    },
    /// Terminal. `method` is absent when the request was already resolved
    /// before this lifecycle began.
    Resolved {
        method: Option<FulfilmentMethod>,
        outcome: Outcome,
    },
}

/// Input to [`WorkflowStage::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEvent {
    ChooseMethod(FulfilmentMethod),
    GoBack,
    Confirm(FulfilmentMethod),
    /// The remote call for the executing branch settled.
    Completed(Outcome),
    /// The remote call failed or left the request unresolved.
    Reverted,
}

/// Rejected transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("the request is already resolved")]
    Terminal,
    #[error("the request cannot go back once confirmation was requested")]
    Irreversible,
    #[error("the {chosen:?} branch is already chosen; go back before switching")]
    BranchLocked { chosen: FulfilmentMethod },
    #[error("cannot confirm {requested:?} while the {chosen:?} branch is chosen")]
    MethodMismatch {
        chosen: FulfilmentMethod,
        requested: FulfilmentMethod,
    },
    #[error("{event:?} is not valid in the {stage:?} stage")]
    Invalid {
        stage: WorkflowStage,
        event: WorkflowEvent,
    },
}

impl WorkflowStage {
    /// Derive the initial stage from the remote status.
    ///
    /// # Examples
    /// ```
    /// use portal::domain::RequestStatus;
    /// use portal::domain::workflow::{Outcome, WorkflowStage};
    ///
    /// assert_eq!(WorkflowStage::from_status(RequestStatus::Pending), WorkflowStage::Created);
    /// assert_eq!(
    ///     WorkflowStage::from_status(RequestStatus::Failed),
    ///     WorkflowStage::Resolved { method: None, outcome: Outcome::Failed },
    /// );
    /// ```
    pub const fn from_status(status: RequestStatus) -> Self {
        match status {
            RequestStatus::Pending | RequestStatus::Processing => Self::Created,
            RequestStatus::Fulfilled => Self::Resolved {
                method: None,
                outcome: Outcome::Fulfilled,
            },
            RequestStatus::Failed => Self::Resolved {
                method: None,
                outcome: Outcome::Failed,
            },
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// Branch chosen so far, if any.
    pub const fn method(self) -> Option<FulfilmentMethod> {
        match self {
            Self::Created => None,
            Self::MethodChosen { method } | Self::Executing { method } => Some(method),
            Self::Resolved { method, .. } => method,
        }
    }

    /// Compute the stage that follows `event`.
    pub fn apply(self, event: WorkflowEvent) -> Result<Self, TransitionError> {
        use WorkflowEvent as E;

        match (self, event) {
            (Self::Resolved { .. }, _) => Err(TransitionError::Terminal),

            (Self::Created, E::ChooseMethod(method)) => Ok(Self::MethodChosen { method }),
            (Self::MethodChosen { method }, E::ChooseMethod(requested)) if method == requested => {
                Ok(self)
            }
            (Self::MethodChosen { method }, E::ChooseMethod(_)) => {
                Err(TransitionError::BranchLocked { chosen: method })
            }
            (Self::MethodChosen { .. }, E::GoBack) => Ok(Self::Created),
            (Self::MethodChosen { method }, E::Confirm(requested)) if method == requested => {
                Ok(Self::Executing { method })
            }
            (Self::MethodChosen { method }, E::Confirm(requested)) => {
                Err(TransitionError::MethodMismatch {
                    chosen: method,
                    requested,
                })
            }
            (Self::Executing { method }, E::Completed(outcome)) => Ok(Self::Resolved {
                method: Some(method),
                outcome,
            }),
            (Self::Executing { method }, E::Reverted) => Ok(Self::MethodChosen { method }),
            (Self::Executing { .. }, E::GoBack) => Err(TransitionError::Irreversible),

            (
                Self::Created | Self::MethodChosen { .. } | Self::Executing { .. },
                E::GoBack | E::Confirm(_) | E::Completed(_) | E::Reverted | E::ChooseMethod(_),
            ) => Err(TransitionError::Invalid { stage: self, event }),
        }
    }
}
