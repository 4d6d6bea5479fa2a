//! Behaviour tests for route guarding.
//!
//! These scenarios confirm that protected views never render for anonymous
//! or loading sessions and that each view applies its configured denial.
//
// rstest-bdd generates guard variables with double underscores, which trips
// the non_snake_case lint under -D warnings.
#![allow(non_snake_case)]

mod support;

use std::sync::Arc;

use mockable::DefaultClock;
use portal::domain::{GuardDecision, PortalView, RefreshOutcome, Role, SessionStore};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};

use support::RuntimeHandle;
use support::doubles::ScriptedIdentityApi;

const PROTECTED: &str = "blood request 42 details";

#[derive(Default, ScenarioState)]
struct GuardWorld {
    runtime: Slot<RuntimeHandle>,
    store: Slot<Arc<SessionStore>>,
    decision: Slot<GuardDecision>,
    content: Slot<Option<&'static str>>,
}

impl GuardWorld {
    fn install(&self, api: ScriptedIdentityApi) -> Arc<SessionStore> {
        let store = Arc::new(SessionStore::new(Arc::new(api), Arc::new(DefaultClock)));
        self.store.set(store.clone());
        self.runtime.set(RuntimeHandle::new());
        store
    }

    fn store(&self) -> Arc<SessionStore> {
        self.store.get().expect("session store should be set")
    }

    fn evaluate(&self, view: PortalView) {
        let session = self.store().current();
        let guard = view.guard();
        self.decision.set(guard.evaluate(&session));
        self.content
            .set(guard.gate(&session, PROTECTED).into_content());
    }

    fn decision(&self) -> GuardDecision {
        self.decision.get().expect("guard should be evaluated")
    }
}

#[fixture]
fn world() -> GuardWorld {
    GuardWorld::default()
}

#[given("an anonymous session")]
fn an_anonymous_session(world: &GuardWorld) {
    let api = ScriptedIdentityApi::default();
    api.fail_with(portal::domain::ports::IdentityApiError::unauthorized(
        "no session cookie",
    ));
    let store = world.install(api);
    let runtime = world.runtime.get().expect("runtime should be set");
    let outcome = runtime.block_on(store.refresh());
    assert!(matches!(outcome, RefreshOutcome::LoggedOut(_)));
}

#[given("a session with the {role} role")]
fn a_session_with_the_role(world: &GuardWorld, role: String) {
    let api = ScriptedIdentityApi::default();
    api.answer_with(Role::from_claim(Some(role.as_str())));
    let store = world.install(api);
    let runtime = world.runtime.get().expect("runtime should be set");
    assert_eq!(runtime.block_on(store.refresh()), RefreshOutcome::LoggedIn);
}

#[given("a session that is still loading")]
fn a_session_that_is_still_loading(world: &GuardWorld) {
    world.install(ScriptedIdentityApi::default());
}

#[when("the user logs out")]
fn the_user_logs_out(world: &GuardWorld) {
    world.store().logout();
}

#[when("the request detail guard is evaluated")]
fn the_request_detail_guard_is_evaluated(world: &GuardWorld) {
    world.evaluate(PortalView::RequestDetail);
}

#[when("the account administration guard is evaluated")]
fn the_account_administration_guard_is_evaluated(world: &GuardWorld) {
    world.evaluate(PortalView::AccountAdmin);
}

#[then("the visitor is redirected to {path}")]
fn the_visitor_is_redirected_to(world: &GuardWorld, path: String) {
    match world.decision() {
        GuardDecision::Redirect(target) => assert_eq!(target.as_str(), path),
        other => panic!("expected a redirect, got {other:?}"),
    }
}

#[then("the view renders")]
fn the_view_renders(world: &GuardWorld) {
    assert_eq!(world.decision(), GuardDecision::Render);
    assert_eq!(world.content.get(), Some(Some(PROTECTED)));
}

#[then("the view is hidden")]
fn the_view_is_hidden(world: &GuardWorld) {
    assert_eq!(world.decision(), GuardDecision::Hide);
}

#[then("the guard is pending")]
fn the_guard_is_pending(world: &GuardWorld) {
    assert_eq!(world.decision(), GuardDecision::Pending);
}

#[then("the protected content is withheld")]
fn the_protected_content_is_withheld(world: &GuardWorld) {
    assert_eq!(world.content.get(), Some(None));
}

#[scenario(
    path = "tests/features/route_guard.feature",
    name = "Anonymous visitors are redirected from the request detail page"
)]
fn anonymous_visitors_are_redirected_from_the_request_detail_page(world: GuardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/route_guard.feature",
    name = "Staff see the request detail page"
)]
fn staff_see_the_request_detail_page(world: GuardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/route_guard.feature",
    name = "Members cannot see the request detail page"
)]
fn members_cannot_see_the_request_detail_page(world: GuardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/route_guard.feature",
    name = "Staff cannot see the account administration panel"
)]
fn staff_cannot_see_the_account_administration_panel(world: GuardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/route_guard.feature",
    name = "Guards wait while the session loads"
)]
fn guards_wait_while_the_session_loads(world: GuardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/route_guard.feature",
    name = "Logging out revokes access"
)]
fn logging_out_revokes_access(world: GuardWorld) {
    drop(world);
}
