//! Domain primitives, policies and services for the blood bank portal.
//!
//! Purpose: hold the authorization policy, the session, route guarding and
//! the blood request workflow without any knowledge of HTTP. Remote
//! collaborators are reached only through [`ports`].
//!
//! Public surface:
//! - Role, RoleRequirement, has_role, has_any_role: role hierarchy checks.
//! - SessionStore, Session: who is logged in, published on a watch channel.
//! - RouteGuard, PortalView: fail-closed access decisions per view.
//! - RequestRegistry: token-checked cache of fetched blood requests.
//! - workflow::BloodRequestWorkflow: stage machine for one request.
//! - Error (alias to `error::Error`): transport agnostic failure payload.

pub mod account;
pub mod blood_request;
pub mod blood_type;
pub mod error;
pub mod localization;
pub mod ports;
pub mod request_registry;
pub mod request_token;
pub mod role;
pub mod route_guard;
pub mod session;
pub mod views;
pub mod workflow;

pub use self::account::{Account, AccountId, AccountValidationError, Email, Identity, Profile};
pub use self::blood_request::{
    BloodComponent, BloodRequest, BloodRequestId, BloodRequestValidationError, ComponentSpec,
    DonorAssignment, RequestStatus, Urgency,
};
pub use self::blood_type::{BloodType, UnknownBloodType};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::localization::{Dictionary, LanguageCode, LanguageCodeValidationError};
pub use self::request_registry::RequestRegistry;
pub use self::request_token::{RequestToken, RequestTokens};
pub use self::role::{Role, RoleRequirement, has_any_role, has_role};
pub use self::route_guard::{
    DenialBehaviour, Gate, GuardDecision, GuardWatch, RedirectPath, RedirectPathError, RouteGuard,
};
pub use self::session::{RefreshOutcome, Session, SessionStore, SignInHint};
pub use self::views::{LOGIN_PATH, PortalView};
pub use self::workflow::{BloodRequestWorkflow, Completion, WorkflowError, WorkflowState};
