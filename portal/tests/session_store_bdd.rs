//! Behaviour tests for the session store.
//!
//! These scenarios confirm that refreshes either establish a complete
//! identity or clear the session entirely, and that the sign in hint
//! separates rejected sessions from unreachable APIs.
//
// rstest-bdd generates guard variables with double underscores, which trips
// the non_snake_case lint under -D warnings.
#![allow(non_snake_case)]

mod support;

use std::sync::Arc;

use mockable::DefaultClock;
use portal::domain::ports::IdentityApiError;
use portal::domain::{RefreshOutcome, Role, Session, SessionStore, SignInHint};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};

use support::RuntimeHandle;
use support::doubles::ScriptedIdentityApi;

#[derive(Default, ScenarioState)]
struct SessionWorld {
    runtime: Slot<RuntimeHandle>,
    api: Slot<Arc<ScriptedIdentityApi>>,
    store: Slot<Arc<SessionStore>>,
    last_outcome: Slot<RefreshOutcome>,
}

impl SessionWorld {
    fn api(&self) -> Arc<ScriptedIdentityApi> {
        if let Some(api) = self.api.get() {
            return api;
        }
        let api = Arc::new(ScriptedIdentityApi::default());
        self.api.set(api.clone());
        api
    }

    fn runtime(&self) -> RuntimeHandle {
        if let Some(runtime) = self.runtime.get() {
            return runtime;
        }
        let runtime = RuntimeHandle::new();
        self.runtime.set(runtime.clone());
        runtime
    }

    fn store(&self) -> Arc<SessionStore> {
        if let Some(store) = self.store.get() {
            return store;
        }
        let store = Arc::new(SessionStore::new(self.api(), Arc::new(DefaultClock)));
        self.store.set(store.clone());
        store
    }

    fn session(&self) -> Session {
        self.store().current()
    }
}

#[fixture]
fn world() -> SessionWorld {
    SessionWorld::default()
}

#[given("the identity API answers for a staff account")]
fn the_identity_api_answers_for_a_staff_account(world: &SessionWorld) {
    world.api().answer_with(Role::Staff);
}

#[given("the identity API rejects the session")]
fn the_identity_api_rejects_the_session(world: &SessionWorld) {
    world
        .api()
        .fail_with(IdentityApiError::unauthorized("session expired"));
}

#[given("the identity API then rejects the session")]
fn the_identity_api_then_rejects_the_session(world: &SessionWorld) {
    the_identity_api_rejects_the_session(world);
}

#[given("the identity API is unreachable")]
fn the_identity_api_is_unreachable(world: &SessionWorld) {
    world
        .api()
        .fail_with(IdentityApiError::network("connection refused"));
}

#[when("the session is refreshed")]
fn the_session_is_refreshed(world: &SessionWorld) {
    let store = world.store();
    let outcome = world.runtime().block_on(store.refresh());
    world.last_outcome.set(outcome);
}

#[when("the user logs out remotely")]
fn the_user_logs_out_remotely(world: &SessionWorld) {
    let store = world.store();
    world
        .runtime()
        .block_on(store.logout_remote())
        .expect("scripted logout succeeds");
}

#[then("the session is logged in as {role}")]
fn the_session_is_logged_in_as(world: &SessionWorld, role: String) {
    let session = world.session();
    assert_eq!(world.last_outcome.get(), Some(RefreshOutcome::LoggedIn));
    assert!(session.logged_in());
    assert_eq!(session.role(), Role::from_claim(Some(role.as_str())));
}

#[then("the profile belongs to {name}")]
fn the_profile_belongs_to(world: &SessionWorld, name: String) {
    let session = world.session();
    let profile = session.profile().expect("profile present");
    assert_eq!(profile.full_name(), name);
}

#[then("the session is fully logged out")]
fn the_session_is_fully_logged_out(world: &SessionWorld) {
    let session = world.session();
    assert!(!session.logged_in());
    assert!(!session.is_loading());
    assert!(session.account().is_none());
    assert!(session.profile().is_none());
}

#[then("the sign in hint is log in")]
fn the_sign_in_hint_is_log_in(world: &SessionWorld) {
    assert_eq!(world.session().sign_in_hint(), Some(SignInHint::LogIn));
}

#[then("the sign in hint is retry")]
fn the_sign_in_hint_is_retry(world: &SessionWorld) {
    assert_eq!(world.session().sign_in_hint(), Some(SignInHint::Retry));
}

#[then("the remote logout was called once")]
fn the_remote_logout_was_called_once(world: &SessionWorld) {
    assert_eq!(world.api().logout_calls(), 1);
}

#[scenario(
    path = "tests/features/session.feature",
    name = "A successful refresh establishes the session"
)]
fn a_successful_refresh_establishes_the_session(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session.feature",
    name = "A rejected session is cleared with a log in hint"
)]
fn a_rejected_session_is_cleared_with_a_log_in_hint(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session.feature",
    name = "An unreachable identity API offers a retry"
)]
fn an_unreachable_identity_api_offers_a_retry(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session.feature",
    name = "A second refresh that fails clears an established session"
)]
fn a_second_refresh_that_fails_clears_an_established_session(world: SessionWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session.feature",
    name = "Remote logout clears the local session"
)]
fn remote_logout_clears_the_local_session(world: SessionWorld) {
    drop(world);
}
