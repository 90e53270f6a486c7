//! Policy effect and tenant scope

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ValidationError, ValidationResult};

/// Outcome attached to a policy.
///
/// When both kinds match a request, `Deny` wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Effect {
    /// Grant permission
    #[default]
    Allow,

    /// Explicitly deny
    Deny,
}

impl Effect {
    /// Wire name (`ALLOW` / `DENY`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "ALLOW",
            Effect::Deny => "DENY",
        }
    }

    /// Parse an effect (case-insensitive).
    pub fn parse(s: &str) -> ValidationResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "ALLOW" => Ok(Effect::Allow),
            "DENY" => Ok(Effect::Deny),
            _ => Err(ValidationError::InvalidEffect(s.to_string())),
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Effect {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Identifier of the profile (tenant scope) a policy belongs to.
///
/// Opaque to the engine: any string is accepted and compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    /// Wrap a profile identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProfileId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProfileId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_parse() {
        assert_eq!(Effect::parse("ALLOW"), Ok(Effect::Allow));
        assert_eq!(Effect::parse("deny"), Ok(Effect::Deny));
        assert_eq!(Effect::parse(" Allow "), Ok(Effect::Allow));
        assert!(matches!(Effect::parse("maybe"), Err(ValidationError::InvalidEffect(_))));
    }

    #[test]
    fn test_effect_default_and_wire_name() {
        assert_eq!(Effect::default(), Effect::Allow);
        assert_eq!(serde_json::to_string(&Effect::Deny).unwrap(), "\"DENY\"");
        assert_eq!(Effect::Deny.to_string(), "DENY");
    }

    #[test]
    fn test_profile_id_is_opaque() {
        let profile = ProfileId::new("profile:servicing:abc");
        assert_eq!(profile.as_str(), "profile:servicing:abc");
        assert_eq!(serde_json::to_string(&profile).unwrap(), "\"profile:servicing:abc\"");
        assert_eq!(ProfileId::from(""), ProfileId::new(""));
    }
}
