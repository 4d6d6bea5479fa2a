//! Emergency blood request records and the payloads used to fulfil them.

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, BloodType};

/// Validation errors raised while building blood request values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BloodRequestValidationError {
    /// Identifier was blank once trimmed.
    #[error("blood request id must not be empty")]
    EmptyId,
    /// Identifier carried surrounding whitespace or path separators.
    #[error("blood request id '{0}' contains unsupported characters")]
    InvalidId(String),
    /// Requester name was blank once trimmed.
    #[error("requester name must not be empty")]
    EmptyRequesterName,
    /// Urgency label was not one of high, medium, or low.
    #[error("unknown urgency '{0}'")]
    UnknownUrgency(String),
    /// Status label was outside the closed status set.
    #[error("unknown blood request status '{0}'")]
    UnknownStatus(String),
    /// Unit counts must be positive.
    #[error("unit count must be greater than zero")]
    ZeroUnits,
}

/// Identifier of a blood request as issued by the remote API.
///
/// # Examples
/// ```
/// use portal::domain::BloodRequestId;
///
/// let id = BloodRequestId::new("42").expect("valid id");
/// assert_eq!(id.as_ref(), "42");
/// assert!(BloodRequestId::new("../42").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BloodRequestId(String);

impl BloodRequestId {
    /// Validate and construct an identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, BloodRequestValidationError> {
        let value = raw.into();
        if value.trim().is_empty() {
            return Err(BloodRequestValidationError::EmptyId);
        }
        let acceptable = value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !acceptable {
            return Err(BloodRequestValidationError::InvalidId(value));
        }
        Ok(Self(value))
    }
}

impl AsRef<str> for BloodRequestId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BloodRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for BloodRequestId {
    type Error = BloodRequestValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BloodRequestId> for String {
    fn from(value: BloodRequestId) -> Self {
        value.0
    }
}

/// Clinical urgency assigned by the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

impl Urgency {
    /// Parse a case-insensitive urgency label.
    pub fn parse(raw: &str) -> Result<Self, BloodRequestValidationError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(BloodRequestValidationError::UnknownUrgency(raw.to_owned())),
        }
    }
}

/// Remote lifecycle status of a blood request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Processing,
    Fulfilled,
    Failed,
}

impl RequestStatus {
    /// Parse a case-insensitive status label.
    pub fn parse(raw: &str) -> Result<Self, BloodRequestValidationError> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "FULFILLED" => Ok(Self::Fulfilled),
            "FAILED" => Ok(Self::Failed),
            _ => Err(BloodRequestValidationError::UnknownStatus(raw.to_owned())),
        }
    }
}

/// Working copy of an emergency blood request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequest {
    id: BloodRequestId,
    requester_name: String,
    blood_type: BloodType,
    urgency: Urgency,
    status: RequestStatus,
}

impl BloodRequest {
    /// Build a request from validated parts.
    pub fn new(
        id: BloodRequestId,
        requester_name: impl Into<String>,
        blood_type: BloodType,
        urgency: Urgency,
        status: RequestStatus,
    ) -> Result<Self, BloodRequestValidationError> {
        let requester_name = requester_name.into().trim().to_owned();
        if requester_name.is_empty() {
            return Err(BloodRequestValidationError::EmptyRequesterName);
        }
        Ok(Self {
            id,
            requester_name,
            blood_type,
            urgency,
            status,
        })
    }

    pub fn id(&self) -> &BloodRequestId {
        &self.id
    }

    pub fn requester_name(&self) -> &str {
        self.requester_name.as_str()
    }

    pub fn blood_type(&self) -> BloodType {
        self.blood_type
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    /// Copy of the request carrying a status confirmed by the remote API.
    pub(crate) fn with_status(&self, status: RequestStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// Blood component drawn from stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BloodComponent {
    WholeBlood,
    RedCells,
    Plasma,
    Platelets,
}

/// What to withdraw from stock on the stock branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    pub component: BloodComponent,
    pub units: NonZeroU32,
}

impl ComponentSpec {
    /// Build a component selection, rejecting zero units.
    pub fn new(component: BloodComponent, units: u32) -> Result<Self, BloodRequestValidationError> {
        let units = NonZeroU32::new(units).ok_or(BloodRequestValidationError::ZeroUnits)?;
        Ok(Self { component, units })
    }
}

/// Donor chosen to fulfil the request on the donor branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorAssignment {
    pub donor_id: AccountId,
    pub units: NonZeroU32,
    /// Donation event the donor attended, when the donation happened at one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donation_event_id: Option<Uuid>,
}

impl DonorAssignment {
    /// Build an assignment, rejecting zero units.
    pub fn new(donor_id: AccountId, units: u32) -> Result<Self, BloodRequestValidationError> {
        let units = NonZeroU32::new(units).ok_or(BloodRequestValidationError::ZeroUnits)?;
        Ok(Self {
            donor_id,
            units,
            donation_event_id: None,
        })
    }

    /// Attach the donation event the units came from.
    pub fn at_event(mut self, event_id: Uuid) -> Self {
        self.donation_event_id = Some(event_id);
        self
    }
}
