use std::sync::Arc;

use futures_util::future::BoxFuture;
use uuid::Uuid;

use crate::tprintln;

use super::role::Role;
use super::store::{SessionStore, DEMO_ACTIVE_KEY, DEMO_ROLE_KEY};

/// Opaque token for a verified principal. Held exclusively by
/// `SessionContext`; handed out only inside snapshot clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub token: Uuid,
    pub username: String,
}

impl Identity {
    fn issue(username: &str) -> Self {
        Self { token: Uuid::new_v4(), username: username.to_string() }
    }
}

/// Identity plus role, created by a successful login and destroyed by
/// logout. Never partially valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealSession {
    pub identity: Identity,
    pub role: Role,
}

/// The persisted demo override. When `active` is false any `role` still in
/// storage is stale: tolerated, never trusted by decision logic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoState {
    pub active: bool,
    pub role: Option<Role>,
}

/// Point-in-time view the route guard reasons about. Taken once per
/// decision and never re-read mid-decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub real: Option<RealSession>,
    pub demo: DemoState,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Credential verification rejected; surfaced to the login UI.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// The verifier itself failed (storage, transport).
    #[error("credential verifier unavailable: {0}")]
    VerifierUnavailable(String),
    /// The login completed after another session mutation; its result was
    /// discarded rather than retroactively applied.
    #[error("login superseded by a later session action")]
    Superseded,
}

/// `set_demo_role` requires demo mode to be active.
#[derive(Debug, thiserror::Error)]
#[error("demo mode is not active")]
pub struct DemoInactive;

/// Outcome of a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAccount {
    pub username: String,
    pub role: Role,
}

/// External credential verification seam. Login delegates here; the gate
/// never sees secrets beyond passing them through.
pub trait CredentialVerifier: Send + Sync {
    fn verify<'a>(&'a self, username: &'a str, secret: &'a str)
        -> BoxFuture<'a, Result<VerifiedAccount, AuthError>>;
}

struct Inner {
    real: Option<RealSession>,
    demo: DemoState,
    /// Bumped by every mutation. A login captures it before suspending and
    /// refuses to install if it moved while the verifier was in flight.
    write_epoch: u64,
}

/// Process-wide session state: the in-memory real session plus the
/// persisted demo flags. Sole mutator of the injected `SessionStore`; one
/// lock guards both halves so every mutation lands atomically even on a
/// multi-threaded host.
pub struct SessionContext {
    inner: parking_lot::Mutex<Inner>,
    store: Arc<dyn SessionStore>,
    verifier: Arc<dyn CredentialVerifier>,
}

/// Role installed when the availability fallback kicks in.
const DEGRADED_DEMO_ROLE: Role = Role::Faculty;

impl SessionContext {
    /// Rehydrate demo flags from the store; a fresh process continues the
    /// demo session a previous one persisted. Read failures degrade to the
    /// anonymous state.
    pub fn new(store: Arc<dyn SessionStore>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        let active = match store.get(DEMO_ACTIVE_KEY) {
            Ok(v) => v.as_deref() == Some("true"),
            Err(e) => {
                tracing::warn!(target: "session", "session store read failed for {}: {}", DEMO_ACTIVE_KEY, e);
                false
            }
        };
        // A stale role under an inactive flag is kept in memory as-is; the
        // guard ignores it until demo mode is re-entered.
        let role = match store.get(DEMO_ROLE_KEY) {
            Ok(Some(v)) => Role::parse(&v),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(target: "session", "session store read failed for {}: {}", DEMO_ROLE_KEY, e);
                None
            }
        };
        Self {
            inner: parking_lot::Mutex::new(Inner {
                real: None,
                demo: DemoState { active, role },
                write_epoch: 0,
            }),
            store,
            verifier,
        }
    }

    /// Verify credentials and install the real session. Suspends on the
    /// verifier; if any other mutation completes meanwhile the late result
    /// is discarded (last completed user action wins, no rollback).
    /// Never touches the demo flags.
    pub async fn login(&self, username: &str, secret: &str) -> Result<RealSession, AuthError> {
        let epoch = self.inner.lock().write_epoch;
        let account = self.verifier.verify(username, secret).await?;
        let mut inner = self.inner.lock();
        if inner.write_epoch != epoch {
            tprintln!("session.login discarded stale result user={}", account.username);
            return Err(AuthError::Superseded);
        }
        inner.write_epoch += 1;
        let session = RealSession { identity: Identity::issue(&account.username), role: account.role };
        inner.real = Some(session.clone());
        tprintln!("session.login user={} role={}", session.identity.username, session.role);
        Ok(session)
    }

    /// Activate the demo override. With a role, pins it; without, leaves
    /// the current (possibly unset) role to be bootstrapped by the first
    /// protected navigation. Idempotent beyond redundant writes.
    pub fn enter_demo(&self, role: Option<Role>) {
        let mut inner = self.inner.lock();
        inner.write_epoch += 1;
        inner.demo.active = true;
        self.persist(DEMO_ACTIVE_KEY, "true");
        if let Some(r) = role {
            inner.demo.role = Some(r);
            self.persist(DEMO_ROLE_KEY, r.as_str());
        }
        tprintln!("session.enter_demo role={:?}", inner.demo.role);
    }

    /// Set the impersonated role. Used by the guard's bootstrap and by
    /// explicit role switches; valid only while demo mode is active.
    pub fn set_demo_role(&self, role: Role) -> Result<(), DemoInactive> {
        let mut inner = self.inner.lock();
        if !inner.demo.active {
            return Err(DemoInactive);
        }
        inner.write_epoch += 1;
        inner.demo.role = Some(role);
        self.persist(DEMO_ROLE_KEY, role.as_str());
        tprintln!("session.set_demo_role role={}", role);
        Ok(())
    }

    /// Clear the real session and the demo flags. Both store deletes are
    /// issued; a partial persistence failure is accepted, not compensated.
    pub fn logout(&self) {
        let mut inner = self.inner.lock();
        inner.write_epoch += 1;
        inner.real = None;
        inner.demo = DemoState::default();
        if let Err(e) = self.store.clear(&[DEMO_ACTIVE_KEY, DEMO_ROLE_KEY]) {
            tracing::warn!(target: "session", "session store clear failed: {}", e);
        }
        tprintln!("session.logout");
    }

    /// Availability fallback for unrecoverable errors: force demo mode with
    /// the degraded default role. An explicit, logged policy transition, so
    /// real defects stay visible in the logs even though the UI stays up.
    pub fn degrade_to_demo(&self) {
        tracing::warn!(
            target: "session",
            "unrecoverable error: degrading to demo mode as {}",
            DEGRADED_DEMO_ROLE
        );
        let mut inner = self.inner.lock();
        inner.write_epoch += 1;
        inner.demo.active = true;
        inner.demo.role = Some(DEGRADED_DEMO_ROLE);
        self.persist(DEMO_ACTIVE_KEY, "true");
        self.persist(DEMO_ROLE_KEY, DEGRADED_DEMO_ROLE.as_str());
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock();
        SessionSnapshot { real: inner.real.clone(), demo: inner.demo }
    }

    /// Best-effort store write: failures are logged, never raised. The
    /// in-memory state has already been applied; drift across a reload is
    /// the accepted cost.
    fn persist(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!(target: "session", "session store write failed for {}: {}", key, e);
        }
    }
}
