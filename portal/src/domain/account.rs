//! Account and profile records cached by the session store.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BloodType, Role};

/// Validation errors returned while building accounts and profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    InvalidId,
    EmptyEmail,
    InvalidEmail,
    EmptyFullName,
    ProfileMismatch { account: AccountId, profile: AccountId },
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "account id must be a valid UUID"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must contain a local part and a domain"),
            Self::EmptyFullName => write!(f, "profile name must not be empty"),
            Self::ProfileMismatch { account, profile } => write!(
                f,
                "profile belongs to account {profile}, expected {account}",
            ),
        }
    }
}

impl std::error::Error for AccountValidationError {}

/// Stable account identifier issued by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Parse an identifier from its textual form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, AccountValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(AccountValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| AccountValidationError::InvalidId)
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address attached to an account.
///
/// Only the shape needed for display is checked: trimmed, non-empty, with a
/// local part and a domain around a single `@`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    pub fn new(raw: impl Into<String>) -> Result<Self, AccountValidationError> {
        let value = raw.into().trim().to_owned();
        if value.is_empty() {
            return Err(AccountValidationError::EmptyEmail);
        }
        match value.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(value))
            }
            _ => Err(AccountValidationError::InvalidEmail),
        }
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for Email {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

/// Identity record owned by the remote system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    id: AccountId,
    email: Email,
    role: Role,
}

impl Account {
    /// Build an account from validated parts.
    pub fn new(id: AccountId, email: Email, role: Role) -> Self {
        Self { id, email, role }
    }

    /// Account identifier.
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Account email.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Authorisation level.
    pub fn role(&self) -> Role {
        self.role
    }
}

/// Donor-facing record associated with an [`Account`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    account_id: AccountId,
    full_name: String,
    blood_type: Option<BloodType>,
    phone: Option<String>,
}

impl Profile {
    /// Build a profile, rejecting blank names.
    pub fn new(
        account_id: AccountId,
        full_name: impl Into<String>,
        blood_type: Option<BloodType>,
        phone: Option<String>,
    ) -> Result<Self, AccountValidationError> {
        let full_name = full_name.into().trim().to_owned();
        if full_name.is_empty() {
            return Err(AccountValidationError::EmptyFullName);
        }
        let phone = phone
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        Ok(Self {
            account_id,
            full_name,
            blood_type,
            phone,
        })
    }

    /// Owning account.
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Display name.
    pub fn full_name(&self) -> &str {
        self.full_name.as_str()
    }

    /// Donor blood type when known.
    pub fn blood_type(&self) -> Option<BloodType> {
        self.blood_type
    }

    /// Contact phone number when provided.
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}

/// An account together with its profile.
///
/// ## Invariants
/// - Both records are present and describe the same account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    account: Account,
    profile: Profile,
}

impl Identity {
    /// Pair an account with its profile.
    pub fn new(account: Account, profile: Profile) -> Result<Self, AccountValidationError> {
        if account.id() != profile.account_id() {
            return Err(AccountValidationError::ProfileMismatch {
                account: account.id(),
                profile: profile.account_id(),
            });
        }
        Ok(Self { account, profile })
    }

    /// The account record.
    pub fn account(&self) -> &Account {
        &self.account
    }

    /// The profile record.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Shortcut for the account role.
    pub fn role(&self) -> Role {
        self.account.role()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", AccountValidationError::EmptyEmail)]
    #[case("   ", AccountValidationError::EmptyEmail)]
    #[case("donor.example.org", AccountValidationError::InvalidEmail)]
    #[case("@example.org", AccountValidationError::InvalidEmail)]
    #[case("donor@", AccountValidationError::InvalidEmail)]
    #[case("a@b@c", AccountValidationError::InvalidEmail)]
    fn invalid_emails(#[case] raw: &str, #[case] expected: AccountValidationError) {
        assert_eq!(Email::new(raw), Err(expected));
    }

    #[rstest]
    fn email_is_trimmed() {
        let email = Email::new("  nurse@bank.example  ").expect("valid email");
        assert_eq!(email.as_ref(), "nurse@bank.example");
    }

    #[rstest]
    fn account_id_rejects_padded_values() {
        let err = AccountId::new(" 3fa85f64-5717-4562-b3fc-2c963f66afa6").expect_err("padded");
        assert_eq!(err, AccountValidationError::InvalidId);
    }

    #[rstest]
    fn profile_rejects_blank_name_and_drops_blank_phone() {
        let id = AccountId::random();
        assert_eq!(
            Profile::new(id, "  ", None, None),
            Err(AccountValidationError::EmptyFullName)
        );
        let profile =
            Profile::new(id, "Ada Donor", None, Some("  ".to_owned())).expect("valid profile");
        assert!(profile.phone().is_none());
    }

    #[rstest]
    fn identity_requires_matching_ids() {
        let email = Email::new("staff@bank.example").expect("email");
        let account = Account::new(AccountId::random(), email, Role::Staff);
        let stranger = Profile::new(AccountId::random(), "Someone Else", None, None)
            .expect("valid profile");

        let err = Identity::new(account, stranger).expect_err("mismatch must fail");
        assert!(matches!(err, AccountValidationError::ProfileMismatch { .. }));
    }
}
