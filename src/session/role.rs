use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The four user categories gating dashboard access. Exhaustive: absence of a
/// role is expressed by the session holding no role, never by a fifth variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Faculty,
    Student,
    Parent,
    Admin,
}

impl Role {
    /// Fixed enumeration order. Every tie-break in the gate (keyword
    /// inference, login-redirect targets) walks roles in this order.
    pub const ALL: [Role; 4] = [Role::Faculty, Role::Student, Role::Parent, Role::Admin];

    /// Canonical lowercase keyword, also the persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Faculty => "faculty",
            Role::Student => "student",
            Role::Parent => "parent",
            Role::Admin => "admin",
        }
    }

    /// Parse an exact role keyword. Unknown or stale strings yield None.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "faculty" => Some(Role::Faculty),
            "student" => Some(Role::Student),
            "parent" => Some(Role::Parent),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Product display name shown in the shell UI.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Faculty => "Dronacharya",
            Role::Student => "Eklavya",
            Role::Parent => "Gandhari/Dhritarashtra",
            Role::Admin => "Krishna",
        }
    }

    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Faculty => "/faculty-dashboard",
            Role::Student => "/student-dashboard",
            Role::Parent => "/parent-dashboard",
            Role::Admin => "/admin-dashboard",
        }
    }

    pub fn login_path(&self) -> &'static str {
        match self {
            Role::Faculty => "/faculty-login",
            Role::Student => "/student-login",
            Role::Parent => "/parent-login",
            Role::Admin => "/admin-login",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse("Admin"), None);
    }

    #[test]
    fn enumeration_order_is_stable() {
        let keywords: Vec<&str> = Role::ALL.iter().map(|r| r.as_str()).collect();
        assert_eq!(keywords, vec!["faculty", "student", "parent", "admin"]);
    }
}
