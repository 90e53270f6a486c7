//! # Resources
//!
//! Resource patterns scope a policy to a set of resource instances. A
//! pattern is a comma-separated list of globs (`acct:123,acct:456`,
//! `CAN_DDA:DDA:*`); a resource id matches when any glob matches it in
//! full.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{ValidationError, ValidationResult};

/// Separator between independent sub-patterns.
pub const PATTERN_SEPARATOR: char = ',';

/// A compiled sub-pattern.
#[derive(Clone)]
enum Matcher {
    /// The bare `*` sub-pattern.
    Any,
    /// Anchored translation of a glob.
    Glob(Regex),
}

impl Matcher {
    fn compile(pattern: &str) -> ValidationResult<Self> {
        if pattern == "*" {
            return Ok(Matcher::Any);
        }

        // Escape everything, then turn the escaped `*` back into `.*`.
        let translated = regex::escape(pattern).replace(r"\*", ".*");
        Regex::new(&format!("(?s)^{}$", translated))
            .map(Matcher::Glob)
            .map_err(|e| ValidationError::InvalidResourcePattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    fn is_match(&self, resource_id: &str) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Glob(regex) => regex.is_match(resource_id),
        }
    }
}

/// A validated, pre-compiled resource pattern list.
///
/// Equality and hashing use the raw pattern string only.
///
/// # Example
///
/// ```
/// use policy_types::Resource;
///
/// let accounts = Resource::new("acct:123,acct:456").unwrap();
/// assert!(accounts.matches("acct:123"));
/// assert!(!accounts.matches("acct:999"));
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resource {
    value: String,
    matchers: Vec<Matcher>,
}

impl Resource {
    /// Create a resource pattern.
    ///
    /// # Errors
    ///
    /// [`ValidationError::BlankResource`] if the string is blank.
    pub fn new(value: impl Into<String>) -> ValidationResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::BlankResource);
        }

        let matchers = value
            .split(PATTERN_SEPARATOR)
            .map(|pattern| Matcher::compile(pattern.trim()))
            .collect::<ValidationResult<Vec<_>>>()?;

        Ok(Self { value, matchers })
    }

    /// The `*` pattern, matching every resource.
    pub fn all() -> Self {
        Self {
            value: "*".to_string(),
            matchers: vec![Matcher::Any],
        }
    }

    /// Build a pattern list from individual resource ids or globs.
    pub fn of_list<I, S>(resource_ids: I) -> ValidationResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = resource_ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        Self::new(joined)
    }

    /// Get the raw pattern string.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Get the individual, trimmed sub-patterns.
    pub fn patterns(&self) -> Vec<&str> {
        self.value.split(PATTERN_SEPARATOR).map(str::trim).collect()
    }

    /// Check if this pattern covers every resource.
    pub fn is_unrestricted(&self) -> bool {
        self.matchers.iter().any(|m| matches!(m, Matcher::Any))
    }

    /// Check if any sub-pattern matches the whole resource id.
    pub fn matches(&self, resource_id: &str) -> bool {
        self.matchers.iter().any(|m| m.is_match(resource_id))
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Resource").field(&self.value).finish()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Resource {}

impl Hash for Resource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl Default for Resource {
    fn default() -> Self {
        Self::all()
    }
}

impl FromStr for Resource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Resource {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Resource> for String {
    fn from(resource: Resource) -> Self {
        resource.value
    }
}
