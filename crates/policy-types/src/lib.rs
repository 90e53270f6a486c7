//! # Policy Types
//!
//! Leaf value types for the permission policy engine. Every type here is
//! immutable and validated at construction; nothing depends on storage or
//! on the resolver.
//!
//! ## Overview
//!
//! - **Actions**: Dot-segmented permission identifiers with wildcard rules
//! - **Resources**: Comma-separated glob lists with OR matching
//! - **Subjects**: Users, groups and roles, serialized as URNs
//! - **Predefined roles**: Static catalog of default action patterns
//! - **Effect / ProfileId**: Policy outcome and tenant scope
//!
//! ## Wire Formats
//!
//! ```text
//! Action   = segment ("." segment)*      segment = "*" | [a-z][a-z0-9-]*
//! Resource = glob ("," glob)*            glob    = literal text with "*"
//! Subject  = ("user" | "group") ":" uuid | "role" ":" [A-Z][A-Z0-9_]*
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use policy_types::{Action, Resource, Subject};
//!
//! let pattern = Action::new("payments.*").unwrap();
//! assert!(pattern.matches(&Action::new("payments.create").unwrap()));
//!
//! let scope = Resource::new("acct:123,acct:456").unwrap();
//! assert!(scope.matches("acct:456"));
//!
//! let subject = Subject::from_urn("role:READER").unwrap();
//! assert_eq!(subject.to_urn(), "role:READER");
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Serialization support (enabled by default)

pub mod actions;
pub mod effect;
pub mod error;
pub mod resources;
pub mod roles;
pub mod subjects;

pub use actions::Action;
pub use effect::{Effect, ProfileId};
pub use error::{ValidationError, ValidationResult};
pub use resources::Resource;
pub use roles::PredefinedRole;
pub use subjects::{Subject, SubjectType};
