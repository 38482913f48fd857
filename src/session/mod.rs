//! The session/authorization gate: who is navigating, and as which role.
//! Keep the public surface thin and split implementation across sub-modules.

mod role;
mod store;
mod context;
mod resolver;
mod guard;


pub use role::Role;
pub use store::{FileSessionStore, MemorySessionStore, PersistenceError, SessionStore, DEMO_ACTIVE_KEY, DEMO_ROLE_KEY};
pub use context::{
    AuthError, CredentialVerifier, DemoInactive, DemoState, Identity, RealSession, SessionContext, SessionSnapshot,
    VerifiedAccount,
};
pub use resolver::RoleResolver;
pub use guard::{Decision, RouteGuard};
