//! Mock dashboard content. Pure consumers of a resolved role: every
//! generator maps (role, display identity) to a deterministic payload and
//! persists nothing. The session gate never depends on anything here.

use serde_json::{json, Value};

use crate::session::Role;

/// The view payload behind a guarded dashboard route.
pub fn dashboard_payload(role: Role, viewer: &str) -> Value {
    let body = match role {
        Role::Faculty => faculty_dashboard(),
        Role::Student => student_dashboard(),
        Role::Parent => parent_dashboard(),
        Role::Admin => admin_dashboard(),
    };
    json!({
        "view": role.dashboard_path(),
        "role": role.as_str(),
        "role_display": role.display_name(),
        "viewer": viewer,
        "body": body,
        "recommendations": recommendations_for(role),
    })
}

fn student_dashboard() -> Value {
    json!({
        "courses": [
            { "id": "phy-301", "title": "Quantum Mechanics", "progress": 0.62, "next_lesson": "Wave functions in potential wells" },
            { "id": "mat-210", "title": "Multivariate Calculus", "progress": 0.48, "next_lesson": "Lagrange multipliers" },
            { "id": "his-120", "title": "History of Science", "progress": 0.91, "next_lesson": "The Copernican turn" },
        ],
        "learning_style": "visual",
        "streak_days": 12,
        "upcoming_quizzes": [
            { "course": "phy-301", "title": "Operators and observables", "due_in_days": 3 },
        ],
    })
}

fn faculty_dashboard() -> Value {
    json!({
        "classes": [
            { "id": "phy-301", "title": "Quantum Mechanics", "enrolled": 34 },
            { "id": "phy-101", "title": "Mechanics I", "enrolled": 58 },
        ],
        "grading_queue": [
            { "course": "phy-301", "assignment": "Problem set 6", "pending": 11 },
            { "course": "phy-101", "assignment": "Lab report 3", "pending": 23 },
        ],
        "at_risk_students": 4,
    })
}

fn parent_dashboard() -> Value {
    json!({
        "children": [
            {
                "name": "Arjun",
                "grade_average": 0.87,
                "attendance": 0.96,
                "recent_feedback": "Strong progress in calculus; encourage more lab practice.",
            },
        ],
        "unread_messages": 2,
        "next_meeting": "Thursday 16:00 with the physics faculty",
    })
}

fn admin_dashboard() -> Value {
    json!({
        "users": { "faculty": 42, "student": 1180, "parent": 804, "admin": 3 },
        "courses_active": 96,
        "system": { "status": "nominal", "storage_used_pct": 41 },
        "pending_approvals": [
            { "kind": "course", "title": "Introduction to Sanskrit Prosody" },
            { "kind": "account", "title": "2 faculty registrations" },
        ],
    })
}

/// Per-role resource suggestions shown in the dashboard sidebar.
pub fn recommendations_for(role: Role) -> Value {
    match role {
        Role::Student => json!([
            { "title": "Advanced Quantum Mechanics", "kind": "video", "reason": "follows your current module" },
            { "title": "Practical Applications of Calculus", "kind": "interactive", "reason": "reinforces a weak area" },
        ]),
        Role::Faculty => json!([
            { "title": "Designing adaptive assessments", "kind": "article", "reason": "half your cohort is ahead of schedule" },
        ]),
        Role::Parent => json!([
            { "title": "Reading a progress report", "kind": "guide", "reason": "new grading period started" },
        ]),
        Role::Admin => json!([
            { "title": "Quarterly usage review", "kind": "report", "reason": "scheduled this week" },
        ]),
    }
}

/// Payload for the public role-selection view (the demo entry point).
pub fn role_selection_payload() -> Value {
    let roles: Vec<Value> = Role::ALL
        .iter()
        .map(|r| {
            json!({
                "role": r.as_str(),
                "display": r.display_name(),
                "login_path": r.login_path(),
                "dashboard_path": r.dashboard_path(),
            })
        })
        .collect();
    json!({ "view": "/", "app": "Gurukul AI", "roles": roles })
}

/// Metadata for a role's login view.
pub fn login_view_payload(role: Role) -> Value {
    json!({
        "view": role.login_path(),
        "role": role.as_str(),
        "role_display": role.display_name(),
        "fields": ["username", "password"],
        "demo_hint": format!("{}@demo.com / demo123", role.as_str()),
    })
}
