//! Engine configuration.
//!
//! Configuration is loaded from environment variables with defaults that
//! keep the resolver a pure function of the stored policy set.

use serde::{Deserialize, Serialize};

/// Authorization engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Resource id used when a query does not name one.
    pub default_resource: String,

    /// Refuse update/delete of policies flagged as system policies.
    pub protect_system_policies: bool,

    /// Add the in-memory default policies of every asserted predefined
    /// role to the repository result during evaluation.
    pub include_role_defaults: bool,

    /// Known concrete action identifiers, used to enumerate allowed
    /// actions.
    pub action_catalog: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_resource: "*".to_string(),
            protect_system_policies: true,
            include_role_defaults: false,
            action_catalog: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `POLICY_DEFAULT_RESOURCE`: Resource id for queries without one (default: `*`)
    /// - `POLICY_PROTECT_SYSTEM`: Protect system policies (default: true)
    /// - `POLICY_INCLUDE_ROLE_DEFAULTS`: Evaluate predefined role defaults (default: false)
    /// - `POLICY_ACTION_CATALOG`: Comma-separated known action identifiers
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            default_resource: std::env::var("POLICY_DEFAULT_RESOURCE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(default.default_resource),
            protect_system_policies: std::env::var("POLICY_PROTECT_SYSTEM")
                .map(|s| parse_flag(&s))
                .unwrap_or(default.protect_system_policies),
            include_role_defaults: std::env::var("POLICY_INCLUDE_ROLE_DEFAULTS")
                .map(|s| parse_flag(&s))
                .unwrap_or(default.include_role_defaults),
            action_catalog: std::env::var("POLICY_ACTION_CATALOG")
                .map(|s| parse_catalog(&s))
                .unwrap_or(default.action_catalog),
        }
    }

    /// Set the known action catalog.
    pub fn with_action_catalog<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.action_catalog = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable evaluation of predefined role defaults.
    pub fn with_role_defaults(mut self, enabled: bool) -> Self {
        self.include_role_defaults = enabled;
        self
    }

    /// Enable or disable system policy protection.
    pub fn with_system_protection(mut self, enabled: bool) -> Self {
        self.protect_system_policies = enabled;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "false" | "0" | "no" | "off")
}

fn parse_catalog(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.default_resource, "*");
        assert!(config.protect_system_policies);
        assert!(!config.include_role_defaults);
        assert!(config.action_catalog.is_empty());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(" OFF "));
        assert!(!parse_flag("0"));
    }

    #[test]
    fn test_parse_catalog() {
        assert_eq!(
            parse_catalog("payments.create, payments.view,,"),
            vec!["payments.create".to_string(), "payments.view".to_string()]
        );
        assert!(parse_catalog("").is_empty());
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_action_catalog(["a.view"])
            .with_role_defaults(true)
            .with_system_protection(false);
        assert_eq!(config.action_catalog, vec!["a.view".to_string()]);
        assert!(config.include_role_defaults);
        assert!(!config.protect_system_policies);
    }
}
