//! Declarative access table for the portal's views.
//!
//! Every role check lives here; views ask for their guard instead of
//! comparing roles themselves.

use serde::Serialize;

use super::{DenialBehaviour, RedirectPath, Role, RoleRequirement, RouteGuard};

/// Path anonymous visitors are sent to.
pub const LOGIN_PATH: &str = "/login";

/// Views whose access is policed by the route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalView {
    Dashboard,
    Profile,
    BloodStock,
    DonationEvents,
    EmergencyRequests,
    RequestDetail,
    AccountAdmin,
}

impl PortalView {
    pub const ALL: [Self; 7] = [
        Self::Dashboard,
        Self::Profile,
        Self::BloodStock,
        Self::DonationEvents,
        Self::EmergencyRequests,
        Self::RequestDetail,
        Self::AccountAdmin,
    ];

    /// Route the view is mounted at.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Dashboard => "/dashboard",
            Self::Profile => "/profile",
            Self::BloodStock => "/blood-stock",
            Self::DonationEvents => "/donation-events",
            Self::EmergencyRequests => "/blood-requests",
            Self::RequestDetail => "/blood-requests/:id",
            Self::AccountAdmin => "/admin/accounts",
        }
    }

    /// Role set required to see the view.
    pub fn requirement(self) -> RoleRequirement {
        match self {
            Self::Dashboard | Self::Profile | Self::DonationEvents => Role::Member.into(),
            Self::BloodStock | Self::EmergencyRequests | Self::RequestDetail => {
                Role::Staff.into()
            }
            Self::AccountAdmin => Role::Admin.into(),
        }
    }

    /// Guard for the view.
    ///
    /// Whole pages redirect to the login page; the administration panel is
    /// embedded in the dashboard and hides instead.
    pub fn guard(self) -> RouteGuard {
        let on_denied = match self {
            Self::AccountAdmin => DenialBehaviour::Hide,
            _ => RedirectPath::new(LOGIN_PATH)
                .map_or(DenialBehaviour::Hide, DenialBehaviour::Redirect),
        };
        RouteGuard::new(self.requirement(), on_denied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GuardDecision, Session};
    use rstest::rstest;

    #[rstest]
    fn login_path_is_a_valid_redirect() {
        assert!(RedirectPath::new(LOGIN_PATH).is_ok());
    }

    #[rstest]
    fn no_view_renders_for_anonymous_visitors() {
        let anonymous = Session::logged_out(None);
        for view in PortalView::ALL {
            assert!(!view.guard().evaluate(&anonymous).is_render(), "{view:?}");
        }
    }

    #[rstest]
    #[case(PortalView::RequestDetail, Role::Staff)]
    #[case(PortalView::Profile, Role::Member)]
    #[case(PortalView::AccountAdmin, Role::Admin)]
    fn requirements_match_the_table(#[case] view: PortalView, #[case] minimum: Role) {
        assert_eq!(view.requirement(), RoleRequirement::Role(minimum));
    }

    #[rstest]
    fn admin_panel_hides_rather_than_redirects() {
        assert_eq!(
            PortalView::AccountAdmin
                .guard()
                .evaluate(&Session::logged_out(None)),
            GuardDecision::Hide
        );
    }
}
