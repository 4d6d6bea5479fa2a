//! Scripted port doubles shared by the behaviour suites.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use portal::domain::ports::{
    BloodRequestApi, BloodRequestApiError, IdentityApi, IdentityApiError, RemoteAck,
};
use portal::domain::{
    Account, AccountId, BloodRequest, BloodRequestId, BloodType, ComponentSpec, DonorAssignment,
    Email, Profile, RequestStatus, Role, Urgency,
};

pub const ACCOUNT_ID: &str = "11111111-1111-1111-1111-111111111111";

pub fn account(role: Role) -> Account {
    Account::new(
        AccountId::new(ACCOUNT_ID).expect("fixture account id"),
        Email::new("coordinator@bloodbank.example").expect("fixture email"),
        role,
    )
}

pub fn profile() -> Profile {
    Profile::new(
        AccountId::new(ACCOUNT_ID).expect("fixture account id"),
        "Ada Lovelace",
        Some(BloodType::ONegative),
        None,
    )
    .expect("fixture profile")
}

pub fn blood_request(id: &str, status: RequestStatus) -> BloodRequest {
    BloodRequest::new(
        BloodRequestId::new(id).expect("fixture request id"),
        "St. Mary Ward 3",
        BloodType::ONegative,
        Urgency::High,
        status,
    )
    .expect("fixture blood request")
}

fn next<T>(queue: &Mutex<VecDeque<T>>) -> Option<T> {
    queue.lock().expect("script lock").pop_front()
}

/// Identity API answering from queued responses.
#[derive(Default)]
pub struct ScriptedIdentityApi {
    accounts: Mutex<VecDeque<Result<Account, IdentityApiError>>>,
    profiles: Mutex<VecDeque<Result<Profile, IdentityApiError>>>,
    logouts: AtomicUsize,
}

impl ScriptedIdentityApi {
    /// Queue one successful account and profile pair.
    pub fn answer_with(&self, role: Role) {
        self.push(Ok(account(role)), Ok(profile()));
    }

    /// Queue one failing account fetch.
    pub fn fail_with(&self, error: IdentityApiError) {
        self.push(Err(error), Ok(profile()));
    }

    fn push(
        &self,
        account: Result<Account, IdentityApiError>,
        profile: Result<Profile, IdentityApiError>,
    ) {
        self.accounts.lock().expect("script lock").push_back(account);
        self.profiles.lock().expect("script lock").push_back(profile);
    }

    pub fn logout_calls(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityApi for ScriptedIdentityApi {
    async fn fetch_account(&self) -> Result<Account, IdentityApiError> {
        next(&self.accounts)
            .unwrap_or_else(|| Err(IdentityApiError::network("no scripted account")))
    }

    async fn fetch_profile(&self) -> Result<Profile, IdentityApiError> {
        next(&self.profiles)
            .unwrap_or_else(|| Err(IdentityApiError::network("no scripted profile")))
    }

    async fn logout(&self) -> Result<(), IdentityApiError> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Blood request API answering from scripted records and queued acks.
#[derive(Default)]
pub struct ScriptedBloodRequestApi {
    records: Mutex<HashMap<String, BloodRequest>>,
    withdrawals: Mutex<VecDeque<Result<RemoteAck, BloodRequestApiError>>>,
    fulfilments: Mutex<VecDeque<Result<RemoteAck, BloodRequestApiError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBloodRequestApi {
    pub fn insert(&self, request: BloodRequest) {
        self.records
            .lock()
            .expect("script lock")
            .insert(request.id().to_string(), request);
    }

    pub fn queue_withdrawal(&self, result: Result<RemoteAck, BloodRequestApiError>) {
        self.withdrawals.lock().expect("script lock").push_back(result);
    }

    pub fn queue_fulfilment(&self, result: Result<RemoteAck, BloodRequestApiError>) {
        self.fulfilments.lock().expect("script lock").push_back(result);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("script lock").clone()
    }

    fn record_call(&self, call: String) {
        self.calls.lock().expect("script lock").push(call);
    }
}

#[async_trait]
impl BloodRequestApi for ScriptedBloodRequestApi {
    async fn fetch_blood_request(
        &self,
        id: &BloodRequestId,
    ) -> Result<BloodRequest, BloodRequestApiError> {
        self.record_call(format!("fetch:{id}"));
        self.records
            .lock()
            .expect("script lock")
            .get(id.as_ref())
            .cloned()
            .ok_or_else(|| BloodRequestApiError::not_found(id.as_ref()))
    }

    async fn withdraw_from_stock(
        &self,
        id: &BloodRequestId,
        spec: &ComponentSpec,
    ) -> Result<RemoteAck, BloodRequestApiError> {
        self.record_call(format!("withdraw:{id}:{}", spec.units));
        next(&self.withdrawals)
            .unwrap_or_else(|| Err(BloodRequestApiError::network("no scripted withdrawal")))
    }

    async fn fulfill_blood_request(
        &self,
        id: &BloodRequestId,
        assignment: &DonorAssignment,
    ) -> Result<RemoteAck, BloodRequestApiError> {
        self.record_call(format!("fulfil:{id}:{}", assignment.units));
        next(&self.fulfilments)
            .unwrap_or_else(|| Err(BloodRequestApiError::network("no scripted fulfilment")))
    }
}
