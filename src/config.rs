//! Environment-driven startup configuration. Every switch is best-effort:
//! an unparsable value falls back to its default with a warning rather than
//! refusing to start.

use crate::session::Role;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_port: u16,
    pub data_root: String,
    /// Forces `enter_demo` at process start, before any navigation.
    pub force_demo: bool,
    /// Role installed by forced demo when none was persisted.
    pub demo_role: Role,
    /// Whether the guard may overwrite a mismatched demo role from the
    /// visited path (the historical behavior). Off limits the bootstrap to
    /// an unset role.
    pub demo_rebind: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_port: 7878,
            data_root: "data".to_string(),
            force_demo: false,
            demo_role: Role::Admin,
            demo_rebind: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let http_port = match std::env::var("GURUKUL_HTTP_PORT") {
            Ok(v) => v.parse().unwrap_or_else(|_| {
                tracing::warn!("GURUKUL_HTTP_PORT='{}' is not a port, using {}", v, defaults.http_port);
                defaults.http_port
            }),
            Err(_) => defaults.http_port,
        };
        let data_root = std::env::var("GURUKUL_DATA_FOLDER").unwrap_or_else(|_| defaults.data_root.clone());
        let force_demo = env_flag("GURUKUL_FORCE_DEMO", defaults.force_demo);
        let demo_role = match std::env::var("GURUKUL_DEMO_ROLE") {
            Ok(v) => Role::parse(&v).unwrap_or_else(|| {
                tracing::warn!("GURUKUL_DEMO_ROLE='{}' is not a role keyword, using {}", v, defaults.demo_role);
                defaults.demo_role
            }),
            Err(_) => defaults.demo_role,
        };
        let demo_rebind = env_flag("GURUKUL_DEMO_REBIND", defaults.demo_rebind);
        Self { http_port, data_root, force_demo, demo_role, demo_rebind }
    }
}

/// "true"/"false" (case-insensitive); anything else keeps the default.
fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => match v.to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_table() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.http_port, 7878);
        assert_eq!(cfg.data_root, "data");
        assert!(!cfg.force_demo);
        assert_eq!(cfg.demo_role, Role::Admin);
        assert!(cfg.demo_rebind);
    }
}
