//! Predefined system roles
//!
//! This module defines the closed catalog of well-known roles and the
//! action patterns each one is granted by default. The catalog is static;
//! it is never persisted and never changes at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actions::Action;
use crate::error::{ValidationError, ValidationResult};

/// A role shipped with the engine, with a default set of action patterns.
///
/// | Role             | Default actions                       |
/// |------------------|---------------------------------------|
/// | `SECURITY_ADMIN` | `security.*`                          |
/// | `SERVICE_ADMIN`  | `*`                                   |
/// | `READER`         | `*.view`                              |
/// | `CREATOR`        | `*.create`, `*.update`, `*.delete`    |
/// | `APPROVER`       | `*.approve`                           |
///
/// # Examples
///
/// ```
/// use policy_types::PredefinedRole;
///
/// let role = PredefinedRole::from_name("READER").unwrap();
/// assert_eq!(role.action_patterns(), &["*.view"]);
/// assert!(PredefinedRole::from_name("reader").is_err());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredefinedRole {
    /// All security-related actions
    SecurityAdmin,

    /// Full access to all services and settings
    ServiceAdmin,

    /// View all resources
    Reader,

    /// Create, update, and delete resources
    Creator,

    /// Approve pending items
    Approver,
}

impl PredefinedRole {
    /// Look up a role by its exact name.
    ///
    /// # Errors
    ///
    /// [`ValidationError::UnknownPredefinedRole`] for any name not in the
    /// catalog. Matching is case-sensitive.
    pub fn from_name(name: &str) -> ValidationResult<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|role| role.role_name() == name)
            .ok_or_else(|| ValidationError::UnknownPredefinedRole(name.to_string()))
    }

    /// Check if a name belongs to the catalog. Never fails.
    pub fn is_predefined_role(name: &str) -> bool {
        Self::all().iter().any(|role| role.role_name() == name)
    }

    /// Every predefined role, in catalog order.
    pub fn all() -> &'static [PredefinedRole] {
        &[
            PredefinedRole::SecurityAdmin,
            PredefinedRole::ServiceAdmin,
            PredefinedRole::Reader,
            PredefinedRole::Creator,
            PredefinedRole::Approver,
        ]
    }

    /// Role name as used in role subjects (`role:{name}`).
    pub fn role_name(&self) -> &'static str {
        match self {
            Self::SecurityAdmin => "SECURITY_ADMIN",
            Self::ServiceAdmin => "SERVICE_ADMIN",
            Self::Reader => "READER",
            Self::Creator => "CREATOR",
            Self::Approver => "APPROVER",
        }
    }

    /// Default action patterns granted to the role.
    pub fn action_patterns(&self) -> &'static [&'static str] {
        match self {
            Self::SecurityAdmin => &["security.*"],
            Self::ServiceAdmin => &["*"],
            Self::Reader => &["*.view"],
            Self::Creator => &["*.create", "*.update", "*.delete"],
            Self::Approver => &["*.approve"],
        }
    }

    /// Default action patterns as validated [`Action`]s.
    pub fn actions(&self) -> Vec<Action> {
        self.action_patterns()
            .iter()
            .filter_map(|pattern| Action::new(*pattern).ok())
            .collect()
    }

    /// Human-readable description of the role.
    pub fn description(&self) -> &'static str {
        match self {
            Self::SecurityAdmin => "All security-related actions",
            Self::ServiceAdmin => "Full access to all services and settings",
            Self::Reader => "View all resources",
            Self::Creator => "Create, update, and delete resources",
            Self::Approver => "Approve pending items",
        }
    }
}

impl fmt::Display for PredefinedRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.role_name())
    }
}
