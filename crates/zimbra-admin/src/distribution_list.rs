//! Distribution lists.
//!
//! Ownership is stored as `zimbraACE` entries of the form `<account id> usr
//! sendToDistList`; [`DistributionList::add_owner`] and
//! [`DistributionList::remove_owner`] edit that attribute directly.

use crate::client::ClientRef;
use crate::grant::DISTRIBUTION_LIST_OWNER_RIGHT;
use crate::object::{string_field, AclEntry, DirectoryEntry, ACE_ATTRIBUTE};
use crate::Result;
use serde::Serialize;
use serde_json::Value;
use zimbra_core::attrs::{build_attrs_map, AttributeMap, AttributeValue};
use zimbra_core::ResourceKind;

/// Attribute listing members when the response has no `dlm` array.
pub const FORWARDING_ADDRESS_ATTRIBUTE: &str = "zimbraMailForwardingAddress";

/// An owner of a distribution list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Owner {
    /// Owner name, when the service resolved it
    pub name: Option<String>,
    /// Owner Zimbra id
    pub id: String,
    /// Grantee type
    #[serde(rename = "type")]
    pub owner_type: String,
}

/// A distribution list.
#[derive(Debug, Clone)]
pub struct DistributionList {
    /// Zimbra id
    pub id: String,
    /// Address
    pub name: String,
    /// Attributes
    pub attrs: AttributeMap,
    /// Member addresses in response order
    pub members: Vec<String>,
    client: ClientRef,
}

impl DistributionList {
    pub(crate) fn from_fragment(fragment: &Value, client: ClientRef) -> Self {
        let attrs = build_attrs_map(fragment.get("a"));
        let members = match fragment.get("dlm").and_then(Value::as_array) {
            Some(dlm) => dlm
                .iter()
                .filter_map(|member| member.get("_content").and_then(Value::as_str))
                .map(str::to_string)
                .collect(),
            None => attrs.values(FORWARDING_ADDRESS_ATTRIBUTE).to_vec(),
        };
        Self {
            id: string_field(fragment, "id"),
            name: string_field(fragment, "name"),
            attrs,
            members,
            client,
        }
    }

    /// Adds member addresses.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn add_members<S: AsRef<str> + Sync>(&self, members: &[S]) -> Result<Value> {
        self.client
            .upgrade()?
            .add_distribution_list_members(&self.id, members)
            .await
    }

    /// Removes member addresses.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn remove_members<S: AsRef<str> + Sync>(&self, members: &[S]) -> Result<Value> {
        self.client
            .upgrade()?
            .remove_distribution_list_members(&self.id, members)
            .await
    }

    /// Renames the list, returning the renamed entry.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn rename(&self, new_name: &str) -> Result<Self> {
        self.client
            .upgrade()?
            .rename_distribution_list(&self.id, new_name)
            .await
    }

    /// Makes an account an owner, returning the modified list.
    ///
    /// # Errors
    ///
    /// Returns the service error, including an unknown account.
    pub async fn add_owner(&self, account: &str) -> Result<Self> {
        let client = self.client.upgrade()?;
        let account = client.get_account(account).await?;
        let mut aces = self.attrs.values(ACE_ATTRIBUTE).to_vec();
        aces.push(AclEntry::new(&account.id, "usr", DISTRIBUTION_LIST_OWNER_RIGHT).to_string());
        client
            .modify_distribution_list(
                &self.id,
                &AttributeMap::new().with(ACE_ATTRIBUTE, aces),
            )
            .await
    }

    /// Removes every ACL entry of an account, returning the modified list.
    ///
    /// A list without ACL entries is returned unchanged without a request.
    ///
    /// # Errors
    ///
    /// Returns the service error, including an unknown account.
    pub async fn remove_owner(&self, account: &str) -> Result<Self> {
        let aces = self.attrs.values(ACE_ATTRIBUTE);
        if aces.is_empty() {
            return Ok(self.clone());
        }
        let client = self.client.upgrade()?;
        let account = client.get_account(account).await?;
        let kept: Vec<String> = aces
            .iter()
            .filter(|ace| ace.split(' ').next() != Some(account.id.as_str()))
            .cloned()
            .collect();
        let value = if kept.is_empty() {
            AttributeValue::from("")
        } else {
            AttributeValue::from(kept)
        };
        client
            .modify_distribution_list(&self.id, &AttributeMap::new().with(ACE_ATTRIBUTE, value))
            .await
    }

    /// Owners, from the grants held on the list.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn owners(&self) -> Result<Vec<Owner>> {
        Ok(self
            .get_acls()
            .await?
            .into_vec()
            .into_iter()
            .filter(|grant| grant.is_distribution_list_owner_grant())
            .map(|grant| Owner {
                id: grant.grantee_id().to_string(),
                name: grant.grantee.name,
                owner_type: grant.grantee.party_type,
            })
            .collect())
    }
}

impl DirectoryEntry for DistributionList {
    const KIND: ResourceKind = ResourceKind::DistributionList;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn attrs(&self) -> &AttributeMap {
        &self.attrs
    }

    fn client_ref(&self) -> &ClientRef {
        &self.client
    }
}
