//! Identifier classification.
//!
//! Zimbra lookups take a `{by, _content}` selector where `by` is `id` when the
//! identifier is a Zimbra id (an RFC 4122 UUID) and `name` otherwise.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::{Uuid, Variant};

/// Lookup key kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum By {
    /// Lookup by Zimbra id
    Id,
    /// Lookup by name (email address, domain name, cos name)
    Name,
}

impl By {
    /// Returns the wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
        }
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true when the identifier is a Zimbra id.
///
/// Zimbra ids are hyphenated 8-4-4-4-12 hex UUIDs with a version nibble between
/// 1 and 5 and the RFC 4122 variant. Case is ignored.
#[must_use]
pub fn is_zimbra_id(identifier: &str) -> bool {
    if identifier.len() != 36 {
        return false;
    }
    match Uuid::try_parse(identifier) {
        Ok(uuid) => {
            matches!(uuid.get_version_num(), 1..=5) && uuid.get_variant() == Variant::RFC4122
        }
        Err(_) => false,
    }
}

/// Classifies an identifier.
#[must_use]
pub fn by_id_or_name(identifier: &str) -> By {
    if is_zimbra_id(identifier) {
        By::Id
    } else {
        By::Name
    }
}

/// `{by, _content}` selector node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    /// Lookup key kind
    pub by: By,
    /// Identifier value
    #[serde(rename = "_content")]
    pub content: String,
}

impl Selector {
    /// Builds a selector, classifying the identifier.
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        let content = identifier.into();
        Self {
            by: by_id_or_name(&content),
            content,
        }
    }

    /// Builds a selector with an explicit lookup kind.
    #[must_use]
    pub fn with_by(by: By, identifier: impl Into<String>) -> Self {
        Self {
            by,
            content: identifier.into(),
        }
    }
}
