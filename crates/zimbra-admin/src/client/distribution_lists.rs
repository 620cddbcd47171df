//! Distribution list calls.

use super::AdminClient;
use crate::distribution_list::{DistributionList, Owner};
use crate::parser::Collection;
use crate::request::RequestDescriptor;
use crate::Result;
use serde_json::Value;
use zimbra_core::attrs::AttributeMap;
use zimbra_core::ResourceKind;

impl AdminClient {
    /// Creates a distribution list.
    ///
    /// # Errors
    ///
    /// Returns the service error (`account.DISTRIBUTION_LIST_EXISTS`, ...).
    pub async fn create_distribution_list(
        &self,
        name: &str,
        attrs: &AttributeMap,
    ) -> Result<DistributionList> {
        self.create(ResourceKind::DistributionList, name, attrs)
            .await?
            .try_into()
    }

    /// Fetches a distribution list by id or name.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_distribution_list(&self, identifier: &str) -> Result<DistributionList> {
        self.get(ResourceKind::DistributionList, identifier)
            .await?
            .try_into()
    }

    /// Modifies the attributes of a distribution list.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn modify_distribution_list(
        &self,
        id: &str,
        attrs: &AttributeMap,
    ) -> Result<DistributionList> {
        self.modify(ResourceKind::DistributionList, id, attrs)
            .await?
            .try_into()
    }

    /// Deletes a distribution list.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn remove_distribution_list(&self, id: &str) -> Result<Value> {
        self.remove(ResourceKind::DistributionList, id).await
    }

    /// Renames a distribution list.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn rename_distribution_list(
        &self,
        id: &str,
        new_name: &str,
    ) -> Result<DistributionList> {
        self.rename(ResourceKind::DistributionList, id, new_name)
            .await?
            .try_into()
    }

    /// Adds member addresses to a list.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn add_distribution_list_members<S: AsRef<str> + Sync>(
        &self,
        id: &str,
        members: &[S],
    ) -> Result<Value> {
        self.perform_ack(&RequestDescriptor::add_distribution_list_members(id, members))
            .await
    }

    /// Removes member addresses from a list.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn remove_distribution_list_members<S: AsRef<str> + Sync>(
        &self,
        id: &str,
        members: &[S],
    ) -> Result<Value> {
        self.perform_ack(&RequestDescriptor::remove_distribution_list_members(id, members))
            .await
    }

    /// Adds an alias to a list.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn add_distribution_list_alias(&self, id: &str, alias: &str) -> Result<Value> {
        self.perform_ack(&RequestDescriptor::add_distribution_list_alias(id, alias))
            .await
    }

    /// Removes an alias from a list.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn remove_distribution_list_alias(&self, id: &str, alias: &str) -> Result<Value> {
        self.perform_ack(&RequestDescriptor::remove_distribution_list_alias(id, alias))
            .await
    }

    /// Lists a distribution list belongs to.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_distribution_list_membership(
        &self,
        dl: &str,
    ) -> Result<Collection<DistributionList>> {
        self.perform_request(&RequestDescriptor::get_distribution_list_membership(dl))
            .await?
            .into_typed_collection()
    }

    /// Makes an account an owner of a list.
    ///
    /// # Errors
    ///
    /// See [`DistributionList::add_owner`].
    pub async fn add_distribution_list_owner(
        &self,
        dl: &str,
        owner: &str,
    ) -> Result<DistributionList> {
        self.get_distribution_list(dl).await?.add_owner(owner).await
    }

    /// Removes an owner of a list.
    ///
    /// # Errors
    ///
    /// See [`DistributionList::remove_owner`].
    pub async fn remove_distribution_list_owner(
        &self,
        dl: &str,
        owner: &str,
    ) -> Result<DistributionList> {
        self.get_distribution_list(dl)
            .await?
            .remove_owner(owner)
            .await
    }

    /// Owners of a list.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_distribution_list_owners(&self, dl: &str) -> Result<Vec<Owner>> {
        self.get_distribution_list(dl).await?.owners().await
    }
}
