//! Domain calls.

use super::AdminClient;
use crate::account::Account;
use crate::batch::{BatchDescriptor, BatchResponse};
use crate::domain::Domain;
use crate::envelope::OnError;
use crate::parser::{Collection, CountByCos, MxRecord, Parsed};
use crate::request::RequestDescriptor;
use crate::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use zimbra_core::attrs::AttributeMap;
use zimbra_core::ResourceKind;

impl AdminClient {
    /// Creates a domain.
    ///
    /// # Errors
    ///
    /// Returns the service error (`account.DOMAIN_EXISTS`, ...).
    pub async fn create_domain(&self, name: &str, attrs: &AttributeMap) -> Result<Domain> {
        self.create(ResourceKind::Domain, name, attrs).await?.try_into()
    }

    /// Fetches a domain by id or name.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_domain(&self, identifier: &str) -> Result<Domain> {
        self.get(ResourceKind::Domain, identifier).await?.try_into()
    }

    /// Modifies the attributes of a domain.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn modify_domain(&self, id: &str, attrs: &AttributeMap) -> Result<Domain> {
        self.modify(ResourceKind::Domain, id, attrs).await?.try_into()
    }

    /// Deletes a domain.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn remove_domain(&self, id: &str) -> Result<Value> {
        self.remove(ResourceKind::Domain, id).await
    }

    /// Accounts per class of service in a domain.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn count_accounts(&self, domain: &str) -> Result<CountByCos> {
        self.perform_request(&RequestDescriptor::count_accounts(domain))
            .await?
            .into_count()
    }

    /// Counts accounts of several domains in one batch.
    ///
    /// Results follow the order of `domains`; a domain whose request failed yields
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns login and transport errors.
    pub async fn batch_count_accounts<S: AsRef<str>>(
        &self,
        domains: &[S],
    ) -> Result<Vec<Option<CountByCos>>> {
        let batch = domains
            .iter()
            .map(|domain| RequestDescriptor::count_accounts(domain.as_ref()))
            .collect::<BatchDescriptor>()
            .with_on_error(OnError::Continue);
        let Some(response) = self.perform_batch(batch).await? else {
            return Ok(Vec::new());
        };
        response
            .into_results(domains.len())
            .into_iter()
            .map(|result| result.map(Parsed::into_count).transpose())
            .collect()
    }

    /// Checks the MX record of a domain.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn check_domain_mx_record(&self, domain: &str) -> Result<MxRecord> {
        self.perform_request(&RequestDescriptor::check_domain_mx_record(domain))
            .await?
            .into_mx_record()
    }

    /// Accounts administering a domain.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_domain_admins(&self, domain: &str) -> Result<Collection<Account>> {
        self.get_domain(domain).await?.get_admins().await
    }

    /// Account limit per class of service id of a domain.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_domain_max_accounts_by_cos(
        &self,
        domain: &str,
    ) -> Result<Option<BTreeMap<String, u64>>> {
        Ok(self.get_domain(domain).await?.max_accounts_by_cos())
    }

    /// Makes an account administrator of a domain.
    ///
    /// # Errors
    ///
    /// See [`Domain::add_admin`].
    pub async fn add_domain_admin<S: AsRef<str>>(
        &self,
        domain: &str,
        account_id: &str,
        coses: &[S],
    ) -> Result<Option<BatchResponse>> {
        self.get_domain(domain)
            .await?
            .add_admin(account_id, coses)
            .await
    }

    /// Removes an administrator of a domain.
    ///
    /// # Errors
    ///
    /// See [`Domain::remove_admin`].
    pub async fn remove_domain_admin<S: AsRef<str>>(
        &self,
        domain: &str,
        account_id: &str,
        coses: &[S],
    ) -> Result<Option<BatchResponse>> {
        self.get_domain(domain)
            .await?
            .remove_admin(account_id, coses)
            .await
    }
}
