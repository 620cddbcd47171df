//! Mail accounts.

use crate::client::ClientRef;
use crate::distribution_list::DistributionList;
use crate::object::{domain_part, string_field, DirectoryEntry};
use crate::parser::{Collection, MailboxInfo};
use crate::request::ArchiveOptions;
use crate::Result;
use serde_json::Value;
use zimbra_core::attrs::{build_attrs_map, AttributeMap};
use zimbra_core::ResourceKind;

/// Attribute flagging an enabled archive.
pub const ARCHIVE_ENABLED_ATTRIBUTE: &str = "zimbraArchiveEnabled";

/// Attribute holding the class of service id.
pub const COS_ID_ATTRIBUTE: &str = "zimbraCOSId";

/// Builds the preauth path that opens a mailbox with a delegated token.
#[must_use]
pub fn view_mail_path(auth_token: &str) -> String {
    format!("/service/preauth?authtoken={auth_token}&isredirect=1&adminPreAuth=1")
}

/// A mail account.
#[derive(Debug, Clone)]
pub struct Account {
    /// Zimbra id
    pub id: String,
    /// Address
    pub name: String,
    /// Attributes
    pub attrs: AttributeMap,
    /// Domain part of the address
    pub domain: Option<String>,
    client: ClientRef,
}

impl Account {
    pub(crate) fn from_fragment(fragment: &Value, client: ClientRef) -> Self {
        let name = string_field(fragment, "name");
        Self {
            id: string_field(fragment, "id"),
            domain: domain_part(&name),
            name,
            attrs: build_attrs_map(fragment.get("a")),
            client,
        }
    }

    /// Returns true when `zimbraArchiveEnabled` is `TRUE`.
    #[must_use]
    pub fn archive_enabled(&self) -> bool {
        self.attrs.get_str(ARCHIVE_ENABLED_ATTRIBUTE) == Some("TRUE")
    }

    /// Changes the password.
    ///
    /// # Errors
    ///
    /// Returns the service error, or [`zimbra_core::Error::Fault`] when the service
    /// rejected the password with a message.
    pub async fn set_password(&self, password: &str) -> Result<()> {
        self.client.upgrade()?.set_password(&self.id, password).await
    }

    /// Adds an alias address.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn add_alias(&self, alias: &str) -> Result<Value> {
        self.client.upgrade()?.add_account_alias(&self.id, alias).await
    }

    /// Removes an alias address.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn remove_alias(&self, alias: &str) -> Result<Value> {
        self.client.upgrade()?.remove_account_alias(&self.id, alias).await
    }

    /// Renames the account, returning the renamed entry.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn rename(&self, new_name: &str) -> Result<Self> {
        self.client.upgrade()?.rename_account(&self.id, new_name).await
    }

    /// Mailbox of the account.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_mailbox(&self) -> Result<MailboxInfo> {
        self.client.upgrade()?.get_mailbox(&self.id).await
    }

    /// Mailbox size in bytes.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn mailbox_size(&self) -> Result<u64> {
        Ok(self.get_mailbox().await?.size)
    }

    /// Path that opens the mailbox with a delegated token.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn view_mail_path(&self, lifetime_secs: Option<u64>) -> Result<String> {
        let auth = self
            .client
            .upgrade()?
            .delegate_auth(&self.id, lifetime_secs)
            .await?;
        Ok(view_mail_path(&auth.auth_token))
    }

    /// Name of the class of service, when one is assigned.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn cos_name(&self) -> Result<Option<String>> {
        let Some(cos_id) = self.attrs.get_str(COS_ID_ATTRIBUTE) else {
            return Ok(None);
        };
        let cos = self.client.upgrade()?.get_cos(cos_id).await?;
        Ok(Some(cos.name))
    }

    /// Distribution lists the account belongs to.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn membership(&self) -> Result<Collection<DistributionList>> {
        self.client.upgrade()?.get_account_membership(&self.id).await
    }

    /// Enables archiving with a class of service and returns the refreshed account.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn enable_archiving(&self, cos: &str) -> Result<Self> {
        let client = self.client.upgrade()?;
        client
            .enable_archive(&self.id, &ArchiveOptions::new(cos))
            .await?;
        client.get_account(&self.id).await
    }

    /// Disables archiving and returns the refreshed account.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn disable_archiving(&self) -> Result<Self> {
        let client = self.client.upgrade()?;
        client.disable_archive(&self.id).await?;
        client.get_account(&self.id).await
    }
}

impl DirectoryEntry for Account {
    const KIND: ResourceKind = ResourceKind::Account;

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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zimbra_core::Error;

    fn account(fragment: Value) -> Account {
        Account::from_fragment(&fragment, ClientRef::detached())
    }

    #[test]
    fn derived_fields() {
        let account = account(json!({
            "name": "user@example.test",
            "id": "a1",
            "a": [{"n": "zimbraArchiveEnabled", "_content": "TRUE"}]
        }));
        assert_eq!(account.domain.as_deref(), Some("example.test"));
        assert!(account.archive_enabled());

        let plain = Account::from_fragment(&json!({"name": "user", "id": "a2"}), ClientRef::detached());
        assert_eq!(plain.domain, None);
        assert!(!plain.archive_enabled());
    }

    #[test]
    fn preauth_path() {
        assert_eq!(
            view_mail_path("0_tok"),
            "/service/preauth?authtoken=0_tok&isredirect=1&adminPreAuth=1"
        );
    }

    #[test]
    fn grant_target_uses_account_type() {
        let target = account(json!({"name": "user@example.test", "id": "a1"})).as_target();
        assert_eq!(target.target_type, "account");
        assert_eq!(target.identifier, "a1");
    }

    #[tokio::test]
    async fn cos_name_without_cos_skips_request() {
        let account = account(json!({"name": "user@example.test", "id": "a1"}));
        assert_eq!(account.cos_name().await.unwrap(), None);
    }

    #[tokio::test]
    async fn detached_account_cannot_call_back() {
        let account = account(json!({"name": "user@example.test", "id": "a1"}));
        let err = account.get_mailbox().await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }
}
