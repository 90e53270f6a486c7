//! # Actions
//!
//! Hierarchical, dot-segmented permission identifiers such as
//! `payments.create` or `security.user.lock`, and the wildcard rules used
//! when a policy's action pattern is compared against a requested action.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::{ValidationError, ValidationResult};

/// One or more dot-separated segments, each `*` or `[a-z][a-z0-9-]*`.
static ACTION_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\*|[a-z][a-z0-9-]*)(\.(\*|[a-z][a-z0-9-]*))*$")
        .expect("action grammar is a valid regex")
});

/// The bare wildcard action.
pub const WILDCARD: &str = "*";

/// A validated action identifier or action pattern.
///
/// The same type is used for the pattern stored on a policy and for the
/// concrete action being requested. Patterns are compared with
/// [`Action::matches`], never with `==`.
///
/// # Example
///
/// ```
/// use policy_types::Action;
///
/// let pattern = Action::new("payments.*").unwrap();
/// let requested = Action::new("payments.create").unwrap();
/// assert!(pattern.matches(&requested));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Action {
    value: String,
}

impl Action {
    /// Create an action, validating it against the segment grammar.
    ///
    /// # Errors
    ///
    /// [`ValidationError::BlankAction`] for blank input and
    /// [`ValidationError::InvalidAction`] for anything the grammar rejects
    /// (upper-case letters, empty segments, leading digits, ...).
    pub fn new(value: impl Into<String>) -> ValidationResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::BlankAction);
        }
        if !ACTION_GRAMMAR.is_match(&value) {
            return Err(ValidationError::InvalidAction(value));
        }
        Ok(Self { value })
    }

    /// The wildcard action `*`, matching every action.
    pub fn all() -> Self {
        Self {
            value: WILDCARD.to_string(),
        }
    }

    /// Get the string representation of the action.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Iterate over the dot-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.value.split('.')
    }

    /// Check if any segment is a wildcard.
    pub fn is_pattern(&self) -> bool {
        self.segments().any(|segment| segment == WILDCARD)
    }

    /// Check if this pattern matches the given action.
    ///
    /// Rules, in precedence order:
    /// 1. `*` matches everything.
    /// 2. A two-segment pattern starting with `*` (`*.create`) matches any
    ///    action ending in `.create`, however many segments precede it.
    /// 3. A pattern ending in `*` (`payments.*`) matches any action that
    ///    starts with `payments.`.
    /// 4. Otherwise the strings must be equal.
    ///
    /// # Example
    ///
    /// ```
    /// use policy_types::Action;
    ///
    /// let view = Action::new("*.view").unwrap();
    /// assert!(view.matches(&Action::new("payments.view").unwrap()));
    /// assert!(view.matches(&Action::new("payments.detail.view").unwrap()));
    /// ```
    pub fn matches(&self, action: &Action) -> bool {
        self.matches_str(&action.value)
    }

    fn matches_str(&self, action: &str) -> bool {
        if self.value == WILDCARD {
            return true;
        }

        let segments: Vec<&str> = self.value.split('.').collect();

        if segments.len() == 2 && segments[0] == WILDCARD {
            return action.ends_with(&format!(".{}", segments[1]));
        }

        if segments.last() == Some(&WILDCARD) {
            let prefix = &self.value[..self.value.len() - 2];
            return action.starts_with(&format!("{}.", prefix));
        }

        self.value == action
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Action {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.value
    }
}

impl AsRef<str> for Action {
    fn as_ref(&self) -> &str {
        &self.value
    }
}
