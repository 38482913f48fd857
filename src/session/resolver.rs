use once_cell::sync::Lazy;

use super::role::Role;

/// The statically declared dashboard prefixes, in the route table's role
/// order. Redirect tie-breaks observe this order, so it must stay stable.
static DECLARED_ROUTES: Lazy<Vec<(&'static str, Role)>> =
    Lazy::new(|| Role::ALL.iter().map(|r| (r.dashboard_path(), *r)).collect());

/// Pure path-to-role inference used to bootstrap a demo session from the
/// first protected path visited.
///
/// The declared prefix table is consulted first; a path like
/// `/student-dashboard/courses/admin-101` resolves from its prefix and can
/// never be misread through a course name. Paths outside the table fall
/// back to the historical keyword scan in enumeration order.
pub struct RoleResolver {
    table: Vec<(String, Role)>,
}

impl Default for RoleResolver {
    fn default() -> Self {
        Self { table: DECLARED_ROUTES.iter().map(|(p, r)| (p.to_string(), *r)).collect() }
    }
}

impl RoleResolver {
    /// Resolver over a custom prefix table, first match wins in the order
    /// given.
    pub fn with_table(table: Vec<(String, Role)>) -> Self {
        Self { table }
    }

    /// Total and pure: the same path always yields the same role-or-none.
    pub fn resolve(&self, path: &str) -> Option<Role> {
        for (prefix, role) in &self.table {
            if path.starts_with(prefix.as_str()) {
                return Some(*role);
            }
        }
        infer_from_keywords(path)
    }
}

/// Keyword containment scan in enumeration order, kept for paths the table
/// does not declare. The order doubles as the tie-break when a path
/// contains more than one role keyword.
pub fn infer_from_keywords(path: &str) -> Option<Role> {
    Role::ALL.iter().copied().find(|r| path.contains(r.as_str()))
}
