//! Driven port for the remote identity endpoints.
//!
//! The session store reads the current account and profile through this port
//! and never talks to HTTP directly, so tests can substitute a double.

use async_trait::async_trait;

use crate::domain::{Account, AccountId, Email, Profile, Role};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced while reading or invalidating the remote session.
    pub enum IdentityApiError {
        /// The remote API did not recognise the session.
        Unauthorized { message: String } =>
            "identity API rejected the session: {message}",
        /// Transport failed before a response arrived.
        Network { message: String } =>
            "identity API unreachable: {message}"; retryable,
        /// The call exceeded the configured ceiling.
        Timeout { message: String } =>
            "identity API timed out: {message}"; retryable,
        /// The payload could not be decoded into a domain record.
        Decode { message: String } =>
            "identity API returned a malformed payload: {message}",
    }
}

/// Port for the account, profile, and logout endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Fetch the account bound to the current remote session.
    async fn fetch_account(&self) -> Result<Account, IdentityApiError>;

    /// Fetch the profile bound to the current remote session.
    async fn fetch_profile(&self) -> Result<Profile, IdentityApiError>;

    /// Invalidate the remote session.
    ///
    /// This does not clear the local session store; callers do that
    /// separately.
    async fn logout(&self) -> Result<(), IdentityApiError>;
}

/// Fixture identity API that always answers with one staff member.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdentityApi;

impl FixtureIdentityApi {
    const ACCOUNT_ID: &'static str = "123e4567-e89b-12d3-a456-426614174000";

    fn account_id() -> Result<AccountId, IdentityApiError> {
        AccountId::new(Self::ACCOUNT_ID)
            .map_err(|err| IdentityApiError::decode(format!("invalid fixture account id: {err}")))
    }
}

#[async_trait]
impl IdentityApi for FixtureIdentityApi {
    async fn fetch_account(&self) -> Result<Account, IdentityApiError> {
        let email = Email::new("coordinator@bloodbank.invalid")
            .map_err(|err| IdentityApiError::decode(format!("invalid fixture email: {err}")))?;
        Ok(Account::new(Self::account_id()?, email, Role::Staff))
    }

    async fn fetch_profile(&self) -> Result<Profile, IdentityApiError> {
        Profile::new(Self::account_id()?, "Ada Lovelace", None, None)
            .map_err(|err| IdentityApiError::decode(format!("invalid fixture profile: {err}")))
    }

    async fn logout(&self) -> Result<(), IdentityApiError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::Identity;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn fixture_account_and_profile_pair_up() {
        let api = FixtureIdentityApi;
        let account = api.fetch_account().await.expect("fixture account");
        let profile = api.fetch_profile().await.expect("fixture profile");

        let identity = Identity::new(account, profile).expect("matching ids");
        assert_eq!(identity.role(), Role::Staff);
        assert_eq!(identity.profile().full_name(), "Ada Lovelace");
    }

    #[rstest]
    #[case(IdentityApiError::network("reset"), true)]
    #[case(IdentityApiError::timeout("10s"), true)]
    #[case(IdentityApiError::unauthorized("expired"), false)]
    #[case(IdentityApiError::decode("missing role"), false)]
    fn transport_failures_are_retryable(#[case] error: IdentityApiError, #[case] expected: bool) {
        assert_eq!(error.is_retryable(), expected);
    }
}
