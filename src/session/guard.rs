use super::context::{SessionContext, SessionSnapshot};
use super::resolver::RoleResolver;
use super::role::Role;

/// Authorization outcome for one attempted navigation. Decisions never
/// fail; every protected request maps to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Back to role selection; demo mode never presents credential forms.
    RedirectToDemoRoot,
    /// To the named role's login view.
    RedirectToLogin(Role),
}

enum Outcome {
    Allow,
    /// Allow after persisting the path-inferred role (lazy bootstrap).
    Bootstrap(Role),
    DemoRoot,
    Login(Role),
}

/// The gate consulted on every navigation to a protected view. Reads one
/// snapshot per decision and evaluates the rule cascade against it alone,
/// so a concurrent mutation cannot be half-observed.
pub struct RouteGuard {
    resolver: RoleResolver,
    /// Whether rule 3 may overwrite an already-set, mismatched demo role.
    /// On (the historical behavior) a demo user flips roles just by
    /// visiting another dashboard; off limits bootstrap to an unset role.
    rebind: bool,
}

impl RouteGuard {
    pub fn new(resolver: RoleResolver, rebind: bool) -> Self {
        Self { resolver, rebind }
    }

    /// Decide one navigation. `required` is the route's declared role list
    /// and must be non-empty; its order picks the login-redirect target.
    pub fn decide(&self, sessions: &SessionContext, required: &[Role], path: &str) -> Decision {
        debug_assert!(!required.is_empty(), "route declared without roles");
        let snapshot = sessions.snapshot();
        match self.evaluate(&snapshot, required, path) {
            Outcome::Allow => Decision::Allow,
            Outcome::Bootstrap(role) => {
                // The one guard side effect, routed through the context so
                // it owns every store write. Failure here means demo mode
                // was deactivated after the snapshot; the decision stands.
                if let Err(e) = sessions.set_demo_role(role) {
                    tracing::warn!(target: "guard", "bootstrap of {} skipped: {}", role, e);
                }
                tracing::info!(target: "guard", "demo role bootstrapped from path: {}", role);
                Decision::Allow
            }
            Outcome::DemoRoot => Decision::RedirectToDemoRoot,
            Outcome::Login(role) => Decision::RedirectToLogin(role),
        }
    }

    fn evaluate(&self, snapshot: &SessionSnapshot, required: &[Role], path: &str) -> Outcome {
        // Rule 1: a verified session always outranks the demo override.
        if let Some(real) = &snapshot.real {
            if required.contains(&real.role) {
                return Outcome::Allow;
            }
        }
        let demo = snapshot.demo;
        if demo.active {
            // Rule 2: the impersonated role matches the route.
            if let Some(role) = demo.role {
                if required.contains(&role) {
                    return Outcome::Allow;
                }
            }
            // Rule 3: infer from the path. An unset role always
            // bootstraps; a mismatched one only when rebinding is on.
            if demo.role.is_none() || self.rebind {
                if let Some(role) = self.resolver.resolve(path) {
                    if required.contains(&role) {
                        return Outcome::Bootstrap(role);
                    }
                }
            }
            // Rule 4: demo users go back to role selection.
            return Outcome::DemoRoot;
        }
        // Rule 5: no session at all; the first declared role picks the
        // login form for multi-role views.
        Outcome::Login(required[0])
    }
}
