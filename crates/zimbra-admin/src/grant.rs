//! Grants returned by `GetGrants`.

use crate::object::{content_of, string_field};
use serde::Serialize;
use serde_json::Value;

/// Right that makes an account a domain administrator.
pub const DOMAIN_ADMIN_RIGHT: &str = "domainAdminRights";

/// Right that makes an account a distribution list owner.
pub const DISTRIBUTION_LIST_OWNER_RIGHT: &str = "sendToDistList";

/// Right that lets a domain administrator assign a class of service.
pub const ASSIGN_COS_RIGHT: &str = "assignCos";

/// Grantee or target side of a grant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GrantParty {
    /// Zimbra id
    pub id: String,
    /// Name, when the service resolved it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Type (`usr`, `grp`, `domain`, `dl`, ...)
    #[serde(rename = "type")]
    pub party_type: String,
}

impl GrantParty {
    fn from_node(node: Option<&Value>) -> Self {
        let node = match node {
            Some(Value::Array(items)) => items.first(),
            other => other,
        };
        let Some(node) = node else {
            return Self::default();
        };
        Self {
            id: string_field(node, "id"),
            name: node.get("name").and_then(Value::as_str).map(str::to_string),
            party_type: string_field(node, "type"),
        }
    }
}

/// A right held by a grantee on a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grant {
    /// Who holds the right
    pub grantee: GrantParty,
    /// What the right applies to
    pub target: GrantParty,
    right_name: String,
}

impl Grant {
    pub(crate) fn from_fragment(fragment: &Value) -> Self {
        Self {
            grantee: GrantParty::from_node(fragment.get("grantee")),
            target: GrantParty::from_node(fragment.get("target")),
            right_name: content_of(fragment.get("right")).unwrap_or_default(),
        }
    }

    /// Name of the granted right.
    #[must_use]
    pub fn right_name(&self) -> &str {
        &self.right_name
    }

    /// Zimbra id of the grantee.
    #[must_use]
    pub fn grantee_id(&self) -> &str {
        &self.grantee.id
    }

    /// Returns true for `domainAdminRights` grants.
    #[must_use]
    pub fn is_domain_admin_grant(&self) -> bool {
        self.right_name == DOMAIN_ADMIN_RIGHT
    }

    /// Returns true for `sendToDistList` grants.
    #[must_use]
    pub fn is_distribution_list_owner_grant(&self) -> bool {
        self.right_name == DISTRIBUTION_LIST_OWNER_RIGHT
    }
}
