//! Driven port for the remote blood request endpoints.
//!
//! The remote API owns stock arithmetic and compatibility rules; this port
//! only carries the request to it and reports the status it settled on.

use async_trait::async_trait;

use crate::domain::{
    BloodRequest, BloodRequestId, BloodType, ComponentSpec, DonorAssignment, RequestStatus,
    Urgency,
};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by blood request adapters.
    pub enum BloodRequestApiError {
        /// No record backs the identifier.
        NotFound { id: String } =>
            "blood request {id} was not found",
        /// The remote session is missing or expired.
        Unauthorized { message: String } =>
            "blood request API rejected the session: {message}",
        /// The session lacks the role the remote API requires.
        Forbidden { message: String } =>
            "blood request API refused the operation: {message}",
        /// Stock cannot cover the requested withdrawal.
        InsufficientStock { message: String } => "{message}",
        /// The remote API rejected the payload.
        Validation { message: String } => "{message}",
        /// Transport failed before a response arrived.
        Network { message: String } =>
            "blood request API unreachable: {message}"; retryable,
        /// The call exceeded the configured ceiling.
        Timeout { message: String } =>
            "blood request API timed out: {message}"; retryable,
        /// The payload could not be decoded into a domain record.
        Decode { message: String } =>
            "blood request API returned a malformed payload: {message}",
    }
}

/// Acknowledgement returned by fulfilment calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteAck {
    /// Status the remote API recorded after handling the call.
    pub status: RequestStatus,
}

/// Port for reading and fulfilling emergency blood requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BloodRequestApi: Send + Sync {
    /// Fetch the current remote copy of a request.
    async fn fetch_blood_request(
        &self,
        id: &BloodRequestId,
    ) -> Result<BloodRequest, BloodRequestApiError>;

    /// Withdraw units from stock to cover the request.
    async fn withdraw_from_stock(
        &self,
        id: &BloodRequestId,
        spec: &ComponentSpec,
    ) -> Result<RemoteAck, BloodRequestApiError>;

    /// Record that a donor covered the request.
    async fn fulfill_blood_request(
        &self,
        id: &BloodRequestId,
        assignment: &DonorAssignment,
    ) -> Result<RemoteAck, BloodRequestApiError>;
}

/// Fixture API that treats every identifier as a pending O- request and
/// fulfils every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBloodRequestApi;

#[async_trait]
impl BloodRequestApi for FixtureBloodRequestApi {
    async fn fetch_blood_request(
        &self,
        id: &BloodRequestId,
    ) -> Result<BloodRequest, BloodRequestApiError> {
        BloodRequest::new(
            id.clone(),
            "Fixture General Hospital",
            BloodType::ONegative,
            Urgency::High,
            RequestStatus::Pending,
        )
        .map_err(|err| BloodRequestApiError::decode(err.to_string()))
    }

    async fn withdraw_from_stock(
        &self,
        _id: &BloodRequestId,
        _spec: &ComponentSpec,
    ) -> Result<RemoteAck, BloodRequestApiError> {
        Ok(RemoteAck {
            status: RequestStatus::Fulfilled,
        })
    }

    async fn fulfill_blood_request(
        &self,
        _id: &BloodRequestId,
        _assignment: &DonorAssignment,
    ) -> Result<RemoteAck, BloodRequestApiError> {
        Ok(RemoteAck {
            status: RequestStatus::Fulfilled,
        })
    }
}
