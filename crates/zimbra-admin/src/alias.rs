//! Aliases returned by directory searches.

use crate::object::string_field;
use serde::Serialize;
use serde_json::Value;

/// An alias address and the entry it points to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alias {
    /// Alias address
    pub name: String,
    /// Zimbra id
    pub id: String,
    /// Address of the target entry
    pub target_name: String,
}

impl Alias {
    pub(crate) fn from_fragment(fragment: &Value) -> Self {
        Self {
            name: string_field(fragment, "name"),
            id: string_field(fragment, "id"),
            target_name: string_field(fragment, "targetName"),
        }
    }
}
