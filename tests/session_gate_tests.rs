//! Gate integration tests: the route guard's rule cascade over a real
//! `SessionContext`, covering precedence, the demo bootstrap, the rebind
//! switch and the redirect tie-breaks.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use gurukul::session::{
    AuthError, CredentialVerifier, Decision, MemorySessionStore, Role, RoleResolver, RouteGuard,
    SessionContext, SessionStore, VerifiedAccount, DEMO_ROLE_KEY,
};

/// Verifier that accepts `demo123` and issues the configured role.
struct RoleVerifier(Role);

impl CredentialVerifier for RoleVerifier {
    fn verify<'a>(&'a self, username: &'a str, secret: &'a str)
        -> BoxFuture<'a, Result<VerifiedAccount, AuthError>> {
        let outcome = if secret == "demo123" {
            Ok(VerifiedAccount { username: username.to_string(), role: self.0 })
        } else {
            Err(AuthError::InvalidCredentials)
        };
        async move { outcome }.boxed()
    }
}

fn gate(login_role: Role) -> (Arc<MemorySessionStore>, Arc<SessionContext>, RouteGuard) {
    let store = Arc::new(MemorySessionStore::new());
    let sessions = Arc::new(SessionContext::new(store.clone(), Arc::new(RoleVerifier(login_role))));
    let guard = RouteGuard::new(RoleResolver::default(), true);
    (store, sessions, guard)
}

#[test]
fn scenario_a_anonymous_is_redirected_to_the_role_login() {
    let (_store, sessions, guard) = gate(Role::Faculty);
    let decision = guard.decide(&sessions, &[Role::Faculty], "/faculty-dashboard");
    assert_eq!(decision, Decision::RedirectToLogin(Role::Faculty));
}

#[test]
fn anonymous_is_never_allowed_anywhere() {
    let (_store, sessions, guard) = gate(Role::Faculty);
    for role in Role::ALL {
        let decision = guard.decide(&sessions, &[role], role.dashboard_path());
        assert_eq!(decision, Decision::RedirectToLogin(role));
    }
}

#[test]
fn login_redirect_tie_break_uses_declared_order() {
    let (_store, sessions, guard) = gate(Role::Faculty);
    let decision = guard.decide(&sessions, &[Role::Student, Role::Admin], "/admin-dashboard");
    assert_eq!(decision, Decision::RedirectToLogin(Role::Student));
    let decision = guard.decide(&sessions, &[Role::Admin, Role::Student], "/admin-dashboard");
    assert_eq!(decision, Decision::RedirectToLogin(Role::Admin));
}

#[test]
fn scenario_b_bootstrap_sets_the_role_once_and_allows_twice() {
    let (store, sessions, guard) = gate(Role::Student);
    sessions.enter_demo(None);
    assert_eq!(sessions.snapshot().demo.role, None);

    let first = guard.decide(&sessions, &[Role::Student], "/student-dashboard/courses");
    assert_eq!(first, Decision::Allow);
    assert_eq!(sessions.snapshot().demo.role, Some(Role::Student));
    assert_eq!(store.get(DEMO_ROLE_KEY).unwrap().as_deref(), Some("student"));

    let second = guard.decide(&sessions, &[Role::Student], "/student-dashboard/courses");
    assert_eq!(second, Decision::Allow);
    assert_eq!(sessions.snapshot().demo.role, Some(Role::Student));
}

#[test]
fn scenario_c_visiting_another_dashboard_rebinds_the_demo_role() {
    let (_store, sessions, guard) = gate(Role::Student);
    sessions.enter_demo(Some(Role::Student));

    let decision = guard.decide(&sessions, &[Role::Admin], "/admin-dashboard");
    assert_eq!(decision, Decision::Allow);
    // The demo role flipped as a side effect of the navigation.
    assert_eq!(sessions.snapshot().demo.role, Some(Role::Admin));
}

#[test]
fn rebind_disabled_freezes_a_set_role_but_still_bootstraps_an_unset_one() {
    let store = Arc::new(MemorySessionStore::new());
    let sessions = Arc::new(SessionContext::new(store, Arc::new(RoleVerifier(Role::Student))));
    let guard = RouteGuard::new(RoleResolver::default(), false);

    sessions.enter_demo(None);
    // Unset role: bootstrap is unaffected by the rebind switch.
    assert_eq!(guard.decide(&sessions, &[Role::Student], "/student-dashboard"), Decision::Allow);
    assert_eq!(sessions.snapshot().demo.role, Some(Role::Student));

    // Set role: a mismatched dashboard no longer rebinds it.
    let decision = guard.decide(&sessions, &[Role::Admin], "/admin-dashboard");
    assert_eq!(decision, Decision::RedirectToDemoRoot);
    assert_eq!(sessions.snapshot().demo.role, Some(Role::Student));
}

#[test]
fn mismatched_bootstrap_falls_through_to_demo_root() {
    let (_store, sessions, guard) = gate(Role::Student);
    sessions.enter_demo(None);
    // The path names student, the route requires admin: no bootstrap.
    let decision = guard.decide(&sessions, &[Role::Admin], "/student-dashboard");
    assert_eq!(decision, Decision::RedirectToDemoRoot);
    assert_eq!(sessions.snapshot().demo.role, None);
}

#[test]
fn unresolvable_path_in_demo_mode_returns_to_role_selection() {
    let (_store, sessions, guard) = gate(Role::Student);
    sessions.enter_demo(None);
    let decision = guard.decide(&sessions, &[Role::Faculty], "/reports/term");
    assert_eq!(decision, Decision::RedirectToDemoRoot);
}

#[tokio::test]
async fn scenario_d_real_session_outranks_the_demo_override() {
    let (_store, sessions, guard) = gate(Role::Parent);
    sessions.login("parent@demo.com", "demo123").await.unwrap();
    sessions.enter_demo(Some(Role::Admin));

    let decision = guard.decide(&sessions, &[Role::Parent], "/parent-dashboard");
    assert_eq!(decision, Decision::Allow);
    // The mismatching real session steps aside and demo still answers.
    let decision = guard.decide(&sessions, &[Role::Admin], "/admin-dashboard");
    assert_eq!(decision, Decision::Allow);
}

#[tokio::test]
async fn rule_one_holds_regardless_of_demo_contents() {
    for demo_role in Role::ALL {
        let (_store, sessions, guard) = gate(Role::Faculty);
        sessions.login("prof", "demo123").await.unwrap();
        sessions.enter_demo(Some(demo_role));
        let decision = guard.decide(&sessions, &[Role::Faculty], "/faculty-dashboard");
        assert_eq!(decision, Decision::Allow);
    }
}

#[tokio::test]
async fn logout_always_lands_on_a_login_redirect() {
    let (_store, sessions, guard) = gate(Role::Admin);
    sessions.login("admin@demo.com", "demo123").await.unwrap();
    sessions.enter_demo(Some(Role::Admin));
    assert_eq!(guard.decide(&sessions, &[Role::Admin], "/admin-dashboard"), Decision::Allow);

    sessions.logout();
    for role in Role::ALL {
        let decision = guard.decide(&sessions, &[role], role.dashboard_path());
        assert_eq!(decision, Decision::RedirectToLogin(role));
    }
}

#[test]
fn inactive_demo_ignores_a_stale_persisted_role() {
    let store = Arc::new(MemorySessionStore::new());
    store.seed(DEMO_ROLE_KEY, "admin");
    let sessions = Arc::new(SessionContext::new(store, Arc::new(RoleVerifier(Role::Admin))));
    let guard = RouteGuard::new(RoleResolver::default(), true);
    // demoMode is absent, so the stored role must not authorize anything.
    let decision = guard.decide(&sessions, &[Role::Admin], "/admin-dashboard");
    assert_eq!(decision, Decision::RedirectToLogin(Role::Admin));
}
