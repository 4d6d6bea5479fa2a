//! DTOs for decoding the portal API's JSON payloads.
//!
//! The adapter decodes into these transport DTOs first, then maps into
//! domain records in one pass. Mapping failures are reported as strings and
//! wrapped into the port's `Decode` variant by the caller.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Account, AccountId, BloodComponent, BloodRequest, BloodRequestId, BloodType, ComponentSpec,
    DonorAssignment, Email, Profile, RequestStatus, Role, Urgency,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AccountDto {
    pub(super) id: String,
    pub(super) email: String,
    #[serde(default)]
    pub(super) role: Option<String>,
}

impl AccountDto {
    pub(super) fn into_domain(self) -> Result<Account, String> {
        let id = AccountId::new(&self.id).map_err(|err| err.to_string())?;
        let email = Email::new(self.email).map_err(|err| err.to_string())?;
        Ok(Account::new(id, email, Role::from_claim(self.role.as_deref())))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProfileDto {
    pub(super) account_id: String,
    pub(super) full_name: String,
    #[serde(default)]
    pub(super) blood_type: Option<String>,
    #[serde(default)]
    pub(super) phone: Option<String>,
}

impl ProfileDto {
    pub(super) fn into_domain(self) -> Result<Profile, String> {
        let account_id = AccountId::new(&self.account_id).map_err(|err| err.to_string())?;
        let blood_type = self
            .blood_type
            .as_deref()
            .map(str::parse::<BloodType>)
            .transpose()
            .map_err(|err| err.to_string())?;
        Profile::new(account_id, self.full_name, blood_type, self.phone)
            .map_err(|err| err.to_string())
    }
}

/// Identifiers arrive as JSON numbers from older records.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum RemoteIdDto {
    Text(String),
    Number(u64),
}

impl RemoteIdDto {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BloodRequestDto {
    pub(super) id: RemoteIdDto,
    pub(super) requester_name: String,
    pub(super) blood_type: String,
    pub(super) urgency: String,
    pub(super) status: String,
}

impl BloodRequestDto {
    pub(super) fn into_domain(self) -> Result<BloodRequest, String> {
        let id = BloodRequestId::new(self.id.into_string()).map_err(|err| err.to_string())?;
        let blood_type = self
            .blood_type
            .parse::<BloodType>()
            .map_err(|err| err.to_string())?;
        let urgency = Urgency::parse(&self.urgency).map_err(|err| err.to_string())?;
        let status = RequestStatus::parse(&self.status).map_err(|err| err.to_string())?;
        BloodRequest::new(id, self.requester_name, blood_type, urgency, status)
            .map_err(|err| err.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AckDto {
    pub(super) status: String,
}

impl AckDto {
    pub(super) fn into_status(self) -> Result<RequestStatus, String> {
        RequestStatus::parse(&self.status).map_err(|err| err.to_string())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StockWithdrawalDto {
    component: BloodComponent,
    units: u32,
}

impl From<&ComponentSpec> for StockWithdrawalDto {
    fn from(spec: &ComponentSpec) -> Self {
        Self {
            component: spec.component,
            units: spec.units.get(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FulfilmentDto {
    donor_id: Uuid,
    units: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    donation_event_id: Option<Uuid>,
}

impl From<&DonorAssignment> for FulfilmentDto {
    fn from(assignment: &DonorAssignment) -> Self {
        Self {
            donor_id: *assignment.donor_id.as_uuid(),
            units: assignment.units.get(),
            donation_event_id: assignment.donation_event_id,
        }
    }
}
