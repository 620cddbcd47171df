//! Directory objects and the object factory.
//!
//! Response fragments are turned into typed objects by
//! [`DirectoryObject::from_fragment`]. Objects are immutable snapshots; operations
//! that change an entry return a fresh object.

use crate::account::Account;
use crate::alias::Alias;
use crate::client::ClientRef;
use crate::cos::Cos;
use crate::distribution_list::DistributionList;
use crate::domain::Domain;
use crate::grant::Grant;
use crate::parser::Collection;
use crate::request::{GrantTarget, Grantee, Right};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use zimbra_core::attrs::AttributeMap;
use zimbra_core::config::CollectionKey;
use zimbra_core::{Error, ResourceKind};

/// Attribute holding access-control entries.
pub const ACE_ATTRIBUTE: &str = "zimbraACE";

/// A typed directory object.
#[derive(Debug, Clone)]
pub enum DirectoryObject {
    /// Mail account
    Account(Account),
    /// Mail domain
    Domain(Domain),
    /// Distribution list
    DistributionList(DistributionList),
    /// Class of service
    Cos(Cos),
    /// Alias
    Alias(Alias),
    /// Grant
    Grant(Grant),
}

impl DirectoryObject {
    /// Builds the object for a response fragment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResponse`] when the fragment is not a JSON object.
    pub fn from_fragment(kind: ResourceKind, fragment: &Value, client: &ClientRef) -> Result<Self> {
        if !fragment.is_object() {
            return Err(Error::InvalidResponse(format!(
                "{kind} fragment is not an object"
            )));
        }
        Ok(match kind {
            ResourceKind::Account => Self::Account(Account::from_fragment(fragment, client.clone())),
            ResourceKind::Domain => Self::Domain(Domain::from_fragment(fragment, client.clone())),
            ResourceKind::DistributionList => {
                Self::DistributionList(DistributionList::from_fragment(fragment, client.clone()))
            }
            ResourceKind::Cos => Self::Cos(Cos::from_fragment(fragment, client.clone())),
            ResourceKind::Alias => Self::Alias(Alias::from_fragment(fragment)),
            ResourceKind::Grant => Self::Grant(Grant::from_fragment(fragment)),
        })
    }

    /// Builds the object for a resource keyword (`account`, `dl`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownResource`] for unregistered keywords.
    pub fn class_factory(keyword: &str, fragment: &Value, client: &ClientRef) -> Result<Self> {
        let kind: ResourceKind = keyword.parse()?;
        Self::from_fragment(kind, fragment, client)
    }

    /// Resource kind of the object.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Account(_) => ResourceKind::Account,
            Self::Domain(_) => ResourceKind::Domain,
            Self::DistributionList(_) => ResourceKind::DistributionList,
            Self::Cos(_) => ResourceKind::Cos,
            Self::Alias(_) => ResourceKind::Alias,
            Self::Grant(_) => ResourceKind::Grant,
        }
    }

    /// Zimbra id. Grants report the grantee id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Account(account) => &account.id,
            Self::Domain(domain) => &domain.id,
            Self::DistributionList(dl) => &dl.id,
            Self::Cos(cos) => &cos.id,
            Self::Alias(alias) => &alias.id,
            Self::Grant(grant) => grant.grantee_id(),
        }
    }

    /// Name. Grants report the grantee name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Account(account) => &account.name,
            Self::Domain(domain) => &domain.name,
            Self::DistributionList(dl) => &dl.name,
            Self::Cos(cos) => &cos.name,
            Self::Alias(alias) => &alias.name,
            Self::Grant(grant) => grant.grantee.name.as_deref().unwrap_or_default(),
        }
    }

    /// Key of the object in a keyed collection.
    #[must_use]
    pub fn key(&self, key: CollectionKey) -> &str {
        match key {
            CollectionKey::Id => self.id(),
            CollectionKey::Name => self.name(),
        }
    }
}

macro_rules! directory_object_variant {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for DirectoryObject {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        }

        impl TryFrom<DirectoryObject> for $ty {
            type Error = Error;

            fn try_from(object: DirectoryObject) -> Result<Self> {
                match object {
                    DirectoryObject::$variant(value) => Ok(value),
                    other => Err(Error::InvalidResponse(format!(
                        "expected {}, got {}",
                        ResourceKind::$variant,
                        other.kind()
                    ))),
                }
            }
        }
    };
}

directory_object_variant!(Account, Account);
directory_object_variant!(Domain, Domain);
directory_object_variant!(DistributionList, DistributionList);
directory_object_variant!(Cos, Cos);
directory_object_variant!(Alias, Alias);
directory_object_variant!(Grant, Grant);

/// One `zimbraACE` value: `<grantee id> <grantee type> <right>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    /// Grantee Zimbra id
    pub grantee_id: String,
    /// Grantee type (`usr`, `grp`, ...)
    pub grantee_type: String,
    /// Right name
    pub right: String,
}

impl AclEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(
        grantee_id: impl Into<String>,
        grantee_type: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self {
            grantee_id: grantee_id.into(),
            grantee_type: grantee_type.into(),
            right: right.into(),
        }
    }

    /// Parses one value; values with fewer than three fields are rejected.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let mut fields = value.split_whitespace();
        let grantee_id = fields.next()?;
        let grantee_type = fields.next()?;
        let right = fields.next()?;
        Some(Self::new(grantee_id, grantee_type, right))
    }
}

impl std::fmt::Display for AclEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.grantee_id, self.grantee_type, self.right)
    }
}

/// Parses `zimbraACE` values, skipping malformed ones.
#[must_use]
pub fn parse_acl<S: AsRef<str>>(values: &[S]) -> Vec<AclEntry> {
    values
        .iter()
        .filter_map(|value| AclEntry::parse(value.as_ref()))
        .collect()
}

/// Behavior shared by accounts, domains, distribution lists and classes of service.
#[async_trait]
pub trait DirectoryEntry: Send + Sync {
    /// Resource kind of the entry.
    const KIND: ResourceKind;

    /// Zimbra id.
    fn id(&self) -> &str;

    /// Name.
    fn name(&self) -> &str;

    /// Attributes.
    fn attrs(&self) -> &AttributeMap;

    /// Handle on the client that fetched the entry.
    fn client_ref(&self) -> &ClientRef;

    /// Access-control entries stored on the entry.
    fn acl(&self) -> Vec<AclEntry> {
        parse_acl(self.attrs().values(ACE_ATTRIBUTE))
    }

    /// The entry as a grant target.
    fn as_target(&self) -> GrantTarget {
        GrantTarget::for_kind(Self::KIND, self.id())
    }

    /// Grants held on the entry.
    async fn get_acls(&self) -> Result<Collection<Grant>> {
        let target = self.as_target();
        self.client_ref()
            .upgrade()?
            .get_grants(Some(&target), None)
            .await
    }

    /// Grants a right on the entry.
    async fn grant_right(&self, grantee: &Grantee, right: &Right) -> Result<Value> {
        let target = self.as_target();
        self.client_ref()
            .upgrade()?
            .grant_right(&target, grantee, right)
            .await
    }

    /// Revokes a right on the entry.
    async fn revoke_right(&self, grantee: &Grantee, right: &Right) -> Result<Value> {
        let target = self.as_target();
        self.client_ref()
            .upgrade()?
            .revoke_right(&target, grantee, right)
            .await
    }
}

/// String field of a fragment; missing fields read as empty.
pub(crate) fn string_field(fragment: &Value, key: &str) -> String {
    fragment
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Text content of a node: `"x"`, `{_content: "x"}` or `[{_content: "x"}]`.
pub(crate) fn content_of(node: Option<&Value>) -> Option<String> {
    match node? {
        Value::Array(items) => content_of(items.first()),
        Value::Object(map) => content_of(map.get("_content")),
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => None,
    }
}

/// Unsigned integer from a number or a numeric string.
pub(crate) fn u64_of(node: Option<&Value>) -> Option<u64> {
    match node? {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Array(items) => u64_of(items.first()),
        Value::Object(map) => u64_of(map.get("_content")),
        _ => None,
    }
}

/// Part of an address after `@`.
pub(crate) fn domain_part(address: &str) -> Option<String> {
    address
        .split_once('@')
        .map(|(_, domain)| domain.to_string())
        .filter(|domain| !domain.is_empty())
}
