//! Role hierarchy and the pure policy that compares roles.
//!
//! Roles form a strict total order `Guest < Member < Staff < Admin`. Every
//! check goes through [`has_role`], so a role satisfying a requirement also
//! satisfies every weaker one.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Authorisation level attached to an account.
///
/// The declaration order is the authorisation order; `Ord` is derived from it.
///
/// # Examples
/// ```
/// use portal::domain::Role;
///
/// assert!(Role::Admin > Role::Staff);
/// assert_eq!(Role::from_claim(Some("staff")), Role::Staff);
/// assert_eq!(Role::from_claim(Some("superuser")), Role::Guest);
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "String", into = "String")]
pub enum Role {
    #[default]
    Guest,
    Member,
    Staff,
    Admin,
}

impl Role {
    /// All roles, weakest first.
    pub const ALL: [Self; 4] = [Self::Guest, Self::Member, Self::Staff, Self::Admin];

    /// Position of the role in the hierarchy.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Guest => 0,
            Self::Member => 1,
            Self::Staff => 2,
            Self::Admin => 3,
        }
    }

    /// Parse a role claim, failing closed to [`Role::Guest`] when the value
    /// is absent or unknown.
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("member") => Self::Member,
            Some(value) if value.eq_ignore_ascii_case("staff") => Self::Staff,
            Some(value) if value.eq_ignore_ascii_case("admin") => Self::Admin,
            _ => Self::Guest,
        }
    }

    /// Wire name of the role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "GUEST",
            Self::Member => "MEMBER",
            Self::Staff => "STAFF",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::from_claim(Some(value.as_str()))
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_owned()
    }
}

/// Return whether `current` is at least as strong as `required`.
pub fn has_role(current: Role, required: Role) -> bool {
    current.rank() >= required.rank()
}

/// Return whether `current` satisfies at least one of `required`.
///
/// An empty set is never satisfied.
pub fn has_any_role<'a>(current: Role, required: impl IntoIterator<Item = &'a Role>) -> bool {
    required.into_iter().any(|role| has_role(current, *role))
}

/// Declarative role requirement attached to a protected view.
///
/// # Examples
/// ```
/// use portal::domain::{Role, RoleRequirement};
///
/// let staff_or_admin = RoleRequirement::any_of([Role::Staff, Role::Admin]);
/// assert!(staff_or_admin.is_satisfied_by(Role::Admin));
/// assert!(!staff_or_admin.is_satisfied_by(Role::Member));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRequirement {
    /// A single minimum role.
    Role(Role),
    /// At least one of the roles must be satisfied.
    AnyOf(BTreeSet<Role>),
    /// Every role must be satisfied.
    AllOf(BTreeSet<Role>),
}

impl RoleRequirement {
    /// Requirement satisfied by one of `roles`.
    pub fn any_of(roles: impl IntoIterator<Item = Role>) -> Self {
        Self::AnyOf(roles.into_iter().collect())
    }

    /// Requirement satisfied only by all of `roles`.
    pub fn all_of(roles: impl IntoIterator<Item = Role>) -> Self {
        Self::AllOf(roles.into_iter().collect())
    }

    /// Evaluate the requirement against the session's role.
    ///
    /// Empty sets deny.
    pub fn is_satisfied_by(&self, current: Role) -> bool {
        match self {
            Self::Role(required) => has_role(current, *required),
            Self::AnyOf(roles) => has_any_role(current, roles),
            Self::AllOf(roles) => {
                !roles.is_empty() && roles.iter().all(|role| has_role(current, *role))
            }
        }
    }
}

impl From<Role> for RoleRequirement {
    fn from(value: Role) -> Self {
        Self::Role(value)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    /// Rows are the current role, columns the required role, both weakest first.
    const EXPECTED_GRID: [[bool; 4]; 4] = [
        [true, false, false, false],
        [true, true, false, false],
        [true, true, true, false],
        [true, true, true, true],
    ];

    #[rstest]
    fn has_role_matches_the_full_pair_grid() {
        for (row, current) in Role::ALL.into_iter().enumerate() {
            for (column, required) in Role::ALL.into_iter().enumerate() {
                assert_eq!(
                    has_role(current, required),
                    EXPECTED_GRID[row][column],
                    "{current} vs {required}",
                );
                assert_eq!(
                    has_role(current, required),
                    current.rank() >= required.rank()
                );
            }
        }
    }

    #[rstest]
    #[case(Role::Guest, Role::Guest, true)]
    #[case(Role::Guest, Role::Member, false)]
    #[case(Role::Member, Role::Guest, true)]
    #[case(Role::Member, Role::Staff, false)]
    #[case(Role::Staff, Role::Member, true)]
    #[case(Role::Staff, Role::Admin, false)]
    #[case(Role::Admin, Role::Staff, true)]
    #[case(Role::Admin, Role::Admin, true)]
    fn has_role_spot_checks(#[case] current: Role, #[case] required: Role, #[case] expected: bool) {
        assert_eq!(has_role(current, required), expected);
    }

    #[rstest]
    fn satisfaction_is_monotonic() {
        for required in Role::ALL {
            for (weaker, stronger) in Role::ALL.iter().zip(Role::ALL.iter().skip(1)) {
                if has_role(*weaker, required) {
                    assert!(has_role(*stronger, required));
                }
            }
        }
    }

    #[rstest]
    #[case(None, Role::Guest)]
    #[case(Some(""), Role::Guest)]
    #[case(Some("root"), Role::Guest)]
    #[case(Some("GUEST"), Role::Guest)]
    #[case(Some("member"), Role::Member)]
    #[case(Some(" Staff "), Role::Staff)]
    #[case(Some("ADMIN"), Role::Admin)]
    fn claims_fail_closed_to_guest(#[case] claim: Option<&str>, #[case] expected: Role) {
        assert_eq!(Role::from_claim(claim), expected);
    }

    #[rstest]
    fn unknown_wire_roles_deserialise_as_guest() {
        let role: Role = serde_json::from_str("\"OWNER\"").expect("string role");
        assert_eq!(role, Role::Guest);
        assert_eq!(serde_json::to_string(&Role::Staff).expect("json"), "\"STAFF\"");
    }

    #[rstest]
    fn has_any_role_rejects_empty_sets() {
        assert!(!has_any_role(Role::Admin, &BTreeSet::new()));
        assert!(has_any_role(Role::Staff, &[Role::Admin, Role::Member]));
    }

    #[rstest]
    #[case(RoleRequirement::Role(Role::Staff), Role::Member, false)]
    #[case(RoleRequirement::Role(Role::Staff), Role::Admin, true)]
    #[case(RoleRequirement::any_of([Role::Admin, Role::Member]), Role::Member, true)]
    #[case(RoleRequirement::all_of([Role::Member, Role::Staff]), Role::Member, false)]
    #[case(RoleRequirement::all_of([Role::Member, Role::Staff]), Role::Staff, true)]
    #[case(RoleRequirement::any_of([]), Role::Admin, false)]
    #[case(RoleRequirement::all_of([]), Role::Admin, false)]
    fn requirements_evaluate_against_the_hierarchy(
        #[case] requirement: RoleRequirement,
        #[case] current: Role,
        #[case] expected: bool,
    ) {
        assert_eq!(requirement.is_satisfied_by(current), expected);
    }
}
