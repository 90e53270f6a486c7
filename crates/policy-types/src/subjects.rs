//! # Subjects
//!
//! A subject is who a policy applies to: a user, a group, or a named role.
//! Subjects travel as URNs of the form `user:{uuid}`, `group:{uuid}` and
//! `role:{ROLE_NAME}`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use uuid::Uuid;

use crate::error::{ValidationError, ValidationResult};

static ROLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("role name grammar is a valid regex"));

/// Separator between the subject type and its identifier.
pub const URN_SEPARATOR: char = ':';

/// Kind of subject a policy targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubjectType {
    /// An individual user, identified by UUID.
    User,
    /// A group of users, identified by UUID.
    Group,
    /// A named role such as `SECURITY_ADMIN`.
    Role,
}

impl SubjectType {
    /// Lower-case name used as the URN prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::User => "user",
            SubjectType::Group => "group",
            SubjectType::Role => "role",
        }
    }

    /// Parse a subject type (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(SubjectType::User),
            "group" => Some(SubjectType::Group),
            "role" => Some(SubjectType::Role),
            _ => None,
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated `(type, identifier)` pair.
///
/// # Example
///
/// ```
/// use policy_types::{Subject, SubjectType};
///
/// let subject = Subject::from_urn("role:SECURITY_ADMIN").unwrap();
/// assert_eq!(subject.subject_type(), SubjectType::Role);
/// assert_eq!(subject.to_urn(), "role:SECURITY_ADMIN");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subject {
    subject_type: SubjectType,
    identifier: String,
}

impl Subject {
    /// Create a subject, validating the identifier for its type.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::BlankIdentifier`] for blank identifiers
    /// - [`ValidationError::InvalidUuid`] for users and groups whose
    ///   identifier is not a UUID
    /// - [`ValidationError::InvalidRoleName`] for roles not matching
    ///   `^[A-Z][A-Z0-9_]*$`
    pub fn new(subject_type: SubjectType, identifier: impl Into<String>) -> ValidationResult<Self> {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            return Err(ValidationError::BlankIdentifier);
        }

        let identifier = match subject_type {
            // Any parseable spelling is stored lower-case hyphenated.
            SubjectType::User | SubjectType::Group => match Uuid::parse_str(&identifier) {
                Ok(uuid) => uuid.hyphenated().to_string(),
                Err(_) => {
                    return Err(ValidationError::InvalidUuid {
                        kind: subject_type.as_str(),
                        value: identifier,
                    })
                }
            },
            SubjectType::Role => {
                if !ROLE_NAME.is_match(&identifier) {
                    return Err(ValidationError::InvalidRoleName(identifier));
                }
                identifier
            }
        };

        Ok(Self {
            subject_type,
            identifier,
        })
    }

    /// User subject for a known user id.
    pub fn user(user_id: Uuid) -> Self {
        Self {
            subject_type: SubjectType::User,
            identifier: user_id.to_string(),
        }
    }

    /// Group subject for a known group id.
    pub fn group(group_id: Uuid) -> Self {
        Self {
            subject_type: SubjectType::Group,
            identifier: group_id.to_string(),
        }
    }

    /// Role subject; the name must be upper-case snake case.
    pub fn role(role_name: impl Into<String>) -> ValidationResult<Self> {
        Self::new(SubjectType::Role, role_name)
    }

    /// Parse a subject from `type:identifier`.
    ///
    /// The split happens on the first `:`; the type is matched
    /// case-insensitively and the identifier validated by [`Subject::new`].
    pub fn from_urn(urn: &str) -> ValidationResult<Self> {
        let (kind, identifier) = urn
            .split_once(URN_SEPARATOR)
            .ok_or_else(|| ValidationError::InvalidSubjectUrn(urn.to_string()))?;

        let subject_type = SubjectType::parse(kind)
            .ok_or_else(|| ValidationError::UnknownSubjectType(kind.to_string()))?;

        Self::new(subject_type, identifier)
    }

    /// Serialize as `{lowercase-type}:{identifier}`.
    pub fn to_urn(&self) -> String {
        format!("{}{}{}", self.subject_type.as_str(), URN_SEPARATOR, self.identifier)
    }

    /// Get the subject type.
    pub fn subject_type(&self) -> SubjectType {
        self.subject_type
    }

    /// Get the identifier (UUID string or role name).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Check if this is a role subject.
    pub fn is_role(&self) -> bool {
        self.subject_type == SubjectType::Role
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.subject_type.as_str(), URN_SEPARATOR, self.identifier)
    }
}

impl FromStr for Subject {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_urn(s)
    }
}

impl TryFrom<String> for Subject {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_urn(&value)
    }
}

impl From<Subject> for String {
    fn from(subject: Subject) -> Self {
        subject.to_urn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_ID: &str = "6f1c2a4e-8d3b-4c5a-9e7f-1a2b3c4d5e6f";

    #[test]
    fn test_user_subject_requires_uuid() {
        let subject = Subject::new(SubjectType::User, USER_ID).unwrap();
        assert_eq!(subject.identifier(), USER_ID);

        assert!(matches!(
            Subject::new(SubjectType::User, "alice"),
            Err(ValidationError::InvalidUuid { kind: "user", .. })
        ));
        assert!(matches!(
            Subject::new(SubjectType::Group, "not-a-uuid"),
            Err(ValidationError::InvalidUuid { kind: "group", .. })
        ));
    }

    #[test]
    fn test_user_identifier_is_canonicalized() {
        let uuid = Uuid::parse_str(USER_ID).unwrap();
        let canonical = Subject::user(uuid);

        for spelling in [
            USER_ID.to_uppercase(),
            USER_ID.replace('-', ""),
            format!("{{{}}}", USER_ID),
            format!("urn:uuid:{}", USER_ID),
        ] {
            let subject = Subject::new(SubjectType::User, spelling.as_str()).unwrap();
            assert_eq!(subject, canonical, "spelling {spelling}");
            assert_eq!(subject.identifier(), USER_ID);
        }

        let group = Subject::from_urn(&format!("group:{}", USER_ID.to_uppercase())).unwrap();
        assert_eq!(group, Subject::group(uuid));
        assert_eq!(Subject::from_urn(&group.to_urn()).unwrap(), group);
    }

    #[test]
    fn test_role_subject_requires_upper_snake_case() {
        assert!(Subject::role("SECURITY_ADMIN").is_ok());
        assert!(Subject::role("R").is_ok());
        assert!(Subject::role("ROLE_2").is_ok());

        assert!(matches!(
            Subject::role("reader"),
            Err(ValidationError::InvalidRoleName(_))
        ));
        assert!(Subject::role("2FA").is_err());
        assert!(Subject::role("SECURITY-ADMIN").is_err());
        assert!(Subject::role("_ADMIN").is_err());
        assert_eq!(Subject::role(" "), Err(ValidationError::BlankIdentifier));
    }

    #[test]
    fn test_to_urn() {
        let user = Subject::new(SubjectType::User, USER_ID).unwrap();
        assert_eq!(user.to_urn(), format!("user:{}", USER_ID));

        let role = Subject::role("READER").unwrap();
        assert_eq!(role.to_urn(), "role:READER");
        assert_eq!(role.to_string(), "role:READER");
    }

    #[test]
    fn test_from_urn_is_case_insensitive_on_type() {
        let subject = Subject::from_urn("ROLE:APPROVER").unwrap();
        assert_eq!(subject.subject_type(), SubjectType::Role);
        assert_eq!(subject.to_urn(), "role:APPROVER");

        let group = Subject::from_urn(&format!("Group:{}", USER_ID)).unwrap();
        assert_eq!(group.subject_type(), SubjectType::Group);
    }

    #[test]
    fn test_from_urn_failures() {
        assert!(matches!(
            Subject::from_urn("READER"),
            Err(ValidationError::InvalidSubjectUrn(_))
        ));
        assert!(matches!(
            Subject::from_urn("team:READER"),
            Err(ValidationError::UnknownSubjectType(_))
        ));
        assert!(matches!(
            Subject::from_urn("role:reader"),
            Err(ValidationError::InvalidRoleName(_))
        ));
        assert!(Subject::from_urn("user:").is_err());
    }

    #[test]
    fn test_identifier_keeps_later_colons() {
        // Only the first colon separates type from identifier.
        assert!(matches!(
            Subject::from_urn("role:A:B"),
            Err(ValidationError::InvalidRoleName(ref name)) if name == "A:B"
        ));
    }

    #[test]
    fn test_urn_round_trip() {
        let subjects = vec![
            Subject::user(Uuid::now_v7()),
            Subject::group(Uuid::now_v7()),
            Subject::role("SERVICE_ADMIN").unwrap(),
            Subject::new(SubjectType::User, USER_ID).unwrap(),
        ];

        for subject in subjects {
            assert_eq!(Subject::from_urn(&subject.to_urn()).unwrap(), subject);
        }
    }

    #[test]
    fn test_subject_serde_as_urn() {
        let role = Subject::role("CREATOR").unwrap();
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"role:CREATOR\"");

        let parsed: Subject = serde_json::from_str("\"role:CREATOR\"").unwrap();
        assert_eq!(parsed, role);
        assert!(serde_json::from_str::<Subject>("\"role:creator\"").is_err());
    }
}
