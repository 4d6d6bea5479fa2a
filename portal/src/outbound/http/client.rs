//! Reqwest-backed adapter for the portal's remote API.
//!
//! This adapter owns transport details only: URL construction, the request
//! timeout, HTTP status mapping, and JSON decoding into domain records.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::dto::{
    AccountDto, AckDto, BloodRequestDto, FulfilmentDto, ProfileDto, StockWithdrawalDto,
};
use crate::domain::ports::{
    BloodRequestApi, BloodRequestApiError, DictionarySource, IdentityApi, IdentityApiError,
    RemoteAck,
};
use crate::domain::{
    Account, BloodRequest, BloodRequestId, ComponentSpec, Dictionary, DonorAssignment,
    LanguageCode, Profile,
};

const ACCOUNT_PATH: &str = "api/v1/accounts/me";
const PROFILE_PATH: &str = "api/v1/profiles/me";
const LOGOUT_PATH: &str = "api/v1/auth/logout";
const BLOOD_REQUESTS_PATH: &str = "api/v1/blood-requests";
const LOCALES_PATH: &str = "locales";
const USER_AGENT: &str = "blood-bank-portal/0.1";

/// Transport-level failure before it is mapped into a port error.
#[derive(Debug, Clone, PartialEq, Eq)]
enum HttpFailure {
    Timeout(String),
    Transport(String),
    Decode(String),
    Status { status: StatusCode, message: String },
}

/// Remote API adapter implementing every outbound port.
pub struct HttpPortalApi {
    client: Client,
    base_url: Url,
}

impl HttpPortalApi {
    /// Build an adapter using a reqwest client with an explicit request
    /// timeout. The client keeps the session cookie between calls.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()?;
        Ok(Self {
            client,
            base_url: with_trailing_slash(base_url),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, HttpFailure> {
        self.base_url
            .join(path)
            .map_err(|err| HttpFailure::Transport(format!("invalid endpoint {path}: {err}")))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>, HttpFailure> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, HttpFailure> {
        let url = self.endpoint(path)?;
        let body = self.execute(self.client.get(url)).await?;
        decode(&body)
    }

    fn blood_request_path(id: &BloodRequestId, action: Option<&str>) -> String {
        match action {
            Some(action) => format!("{BLOOD_REQUESTS_PATH}/{id}/{action}"),
            None => format!("{BLOOD_REQUESTS_PATH}/{id}"),
        }
    }

    async fn post_for_ack<B: serde::Serialize + Sync>(
        &self,
        id: &BloodRequestId,
        action: &str,
        payload: &B,
    ) -> Result<RemoteAck, BloodRequestApiError> {
        let url = self
            .endpoint(&Self::blood_request_path(id, Some(action)))
            .map_err(|failure| map_blood_request_failure(failure, id))?;
        let body = self
            .execute(self.client.post(url).json(payload))
            .await
            .map_err(|failure| map_blood_request_failure(failure, id))?;
        let ack: AckDto = decode(&body).map_err(|failure| map_blood_request_failure(failure, id))?;
        let status = ack.into_status().map_err(BloodRequestApiError::decode)?;
        Ok(RemoteAck { status })
    }
}

#[async_trait]
impl IdentityApi for HttpPortalApi {
    async fn fetch_account(&self) -> Result<Account, IdentityApiError> {
        let dto: AccountDto = self
            .get_json(ACCOUNT_PATH)
            .await
            .map_err(map_identity_failure)?;
        dto.into_domain().map_err(IdentityApiError::decode)
    }

    async fn fetch_profile(&self) -> Result<Profile, IdentityApiError> {
        let dto: ProfileDto = self
            .get_json(PROFILE_PATH)
            .await
            .map_err(map_identity_failure)?;
        dto.into_domain().map_err(IdentityApiError::decode)
    }

    async fn logout(&self) -> Result<(), IdentityApiError> {
        let url = self.endpoint(LOGOUT_PATH).map_err(map_identity_failure)?;
        self.execute(self.client.post(url))
            .await
            .map(drop)
            .map_err(map_identity_failure)
    }
}

#[async_trait]
impl BloodRequestApi for HttpPortalApi {
    async fn fetch_blood_request(
        &self,
        id: &BloodRequestId,
    ) -> Result<BloodRequest, BloodRequestApiError> {
        let dto: BloodRequestDto = self
            .get_json(&Self::blood_request_path(id, None))
            .await
            .map_err(|failure| map_blood_request_failure(failure, id))?;
        dto.into_domain().map_err(BloodRequestApiError::decode)
    }

    async fn withdraw_from_stock(
        &self,
        id: &BloodRequestId,
        spec: &ComponentSpec,
    ) -> Result<RemoteAck, BloodRequestApiError> {
        self.post_for_ack(id, "stock-withdrawals", &StockWithdrawalDto::from(spec))
            .await
    }

    async fn fulfill_blood_request(
        &self,
        id: &BloodRequestId,
        assignment: &DonorAssignment,
    ) -> Result<RemoteAck, BloodRequestApiError> {
        self.post_for_ack(id, "fulfilment", &FulfilmentDto::from(assignment))
            .await
    }
}

#[async_trait]
impl DictionarySource for HttpPortalApi {
    async fn get_dictionary(&self, language: &LanguageCode) -> Dictionary {
        let path = format!("{LOCALES_PATH}/{language}.json");
        match self.get_json::<BTreeMap<String, String>>(&path).await {
            Ok(entries) => Dictionary::new(language.clone(), entries),
            Err(failure) => {
                warn!(%language, failure = ?failure, "dictionary unavailable; using fallbacks");
                Dictionary::empty(language.clone())
            }
        }
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, HttpFailure> {
    serde_json::from_slice(body)
        .map_err(|error| HttpFailure::Decode(format!("invalid JSON payload: {error}")))
}

fn map_transport_error(error: reqwest::Error) -> HttpFailure {
    if error.is_timeout() {
        HttpFailure::Timeout(error.to_string())
    } else if error.is_decode() {
        HttpFailure::Decode(error.to_string())
    } else {
        HttpFailure::Transport(error.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct RemoteErrorDto {
    message: String,
}

/// Prefer the remote API's own message so business rejections reach the
/// user verbatim.
fn map_status_error(status: StatusCode, body: &[u8]) -> HttpFailure {
    let message = serde_json::from_slice::<RemoteErrorDto>(body)
        .ok()
        .map(|dto| dto.message.trim().to_owned())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            let preview = body_preview(body);
            if preview.is_empty() {
                format!("status {}", status.as_u16())
            } else {
                format!("status {}: {}", status.as_u16(), preview)
            }
        });
    HttpFailure::Status { status, message }
}

fn map_identity_failure(failure: HttpFailure) -> IdentityApiError {
    match failure {
        HttpFailure::Timeout(message) => IdentityApiError::timeout(message),
        HttpFailure::Transport(message) => IdentityApiError::network(message),
        HttpFailure::Decode(message) => IdentityApiError::decode(message),
        HttpFailure::Status { status, message } => match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                IdentityApiError::unauthorized(message)
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                IdentityApiError::timeout(message)
            }
            _ => IdentityApiError::network(message),
        },
    }
}

fn map_blood_request_failure(failure: HttpFailure, id: &BloodRequestId) -> BloodRequestApiError {
    match failure {
        HttpFailure::Timeout(message) => BloodRequestApiError::timeout(message),
        HttpFailure::Transport(message) => BloodRequestApiError::network(message),
        HttpFailure::Decode(message) => BloodRequestApiError::decode(message),
        HttpFailure::Status { status, message } => match status {
            StatusCode::UNAUTHORIZED => BloodRequestApiError::unauthorized(message),
            StatusCode::FORBIDDEN => BloodRequestApiError::forbidden(message),
            StatusCode::NOT_FOUND => BloodRequestApiError::not_found(id.as_ref()),
            StatusCode::CONFLICT => BloodRequestApiError::insufficient_stock(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                BloodRequestApiError::validation(message)
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                BloodRequestApiError::timeout(message)
            }
            _ => BloodRequestApiError::network(message),
        },
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
