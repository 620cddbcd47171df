//! Account calls.

use super::AdminClient;
use crate::account::Account;
use crate::distribution_list::DistributionList;
use crate::parser::{Collection, DelegatedAuth, MailboxInfo};
use crate::request::{ArchiveOptions, RequestDescriptor, DEFAULT_DELEGATE_LIFETIME_SECS};
use crate::Result;
use serde_json::Value;
use zimbra_core::attrs::AttributeMap;
use zimbra_core::ResourceKind;

impl AdminClient {
    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns the service error (`account.ACCOUNT_EXISTS`, ...).
    pub async fn create_account(
        &self,
        name: &str,
        password: &str,
        attrs: &AttributeMap,
    ) -> Result<Account> {
        self.perform_request(&RequestDescriptor::create_account(name, password, attrs))
            .await?
            .into_typed()
    }

    /// Fetches an account by id or name.
    ///
    /// # Errors
    ///
    /// Returns the service error (`account.NO_SUCH_ACCOUNT`, ...).
    pub async fn get_account(&self, identifier: &str) -> Result<Account> {
        self.get(ResourceKind::Account, identifier).await?.try_into()
    }

    /// Modifies the attributes of an account.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn modify_account(&self, id: &str, attrs: &AttributeMap) -> Result<Account> {
        self.modify(ResourceKind::Account, id, attrs).await?.try_into()
    }

    /// Deletes an account.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn remove_account(&self, id: &str) -> Result<Value> {
        self.remove(ResourceKind::Account, id).await
    }

    /// Renames an account.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn rename_account(&self, id: &str, new_name: &str) -> Result<Account> {
        self.rename(ResourceKind::Account, id, new_name)
            .await?
            .try_into()
    }

    /// Sets the password of an account.
    ///
    /// # Errors
    ///
    /// Returns the service error, or a fault built from the `message` the service
    /// answers when it rejects the password.
    pub async fn set_password(&self, id: &str, new_password: &str) -> Result<()> {
        self.perform_request(&RequestDescriptor::set_password(id, new_password))
            .await
            .map(drop)
    }

    /// Adds an alias to an account.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn add_account_alias(&self, id: &str, alias: &str) -> Result<Value> {
        self.perform_ack(&RequestDescriptor::add_account_alias(id, alias))
            .await
    }

    /// Removes an alias from an account.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn remove_account_alias(&self, id: &str, alias: &str) -> Result<Value> {
        self.perform_ack(&RequestDescriptor::remove_account_alias(id, alias))
            .await
    }

    /// Mailbox of an account.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_mailbox(&self, account_id: &str) -> Result<MailboxInfo> {
        self.perform_request(&RequestDescriptor::get_mailbox(account_id))
            .await?
            .into_mailbox()
    }

    /// Token for acting as an account; the lifetime defaults to one hour.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn delegate_auth(
        &self,
        account: &str,
        lifetime_secs: Option<u64>,
    ) -> Result<DelegatedAuth> {
        let lifetime = lifetime_secs.unwrap_or(DEFAULT_DELEGATE_LIFETIME_SECS);
        self.perform_request(&RequestDescriptor::delegate_auth(account, lifetime))
            .await?
            .into_delegated_auth()
    }

    /// Enables archiving for an account.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn enable_archive(&self, account: &str, options: &ArchiveOptions) -> Result<Value> {
        self.perform_ack(&RequestDescriptor::enable_archive(account, options))
            .await
    }

    /// Disables archiving for an account.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn disable_archive(&self, account: &str) -> Result<Value> {
        self.perform_ack(&RequestDescriptor::disable_archive(account))
            .await
    }

    /// Distribution lists an account belongs to.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_account_membership(
        &self,
        account: &str,
    ) -> Result<Collection<DistributionList>> {
        self.perform_request(&RequestDescriptor::get_account_membership(account))
            .await?
            .into_typed_collection()
    }

    /// Preauth path that opens the mailbox of an account.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_account_view_mail_path(
        &self,
        account: &str,
        lifetime_secs: Option<u64>,
    ) -> Result<String> {
        self.get_account(account)
            .await?
            .view_mail_path(lifetime_secs)
            .await
    }
}
