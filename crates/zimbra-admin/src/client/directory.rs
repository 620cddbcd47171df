//! Directory search, classes of service and server calls.

use super::AdminClient;
use crate::account::Account;
use crate::alias::Alias;
use crate::cos::Cos;
use crate::distribution_list::DistributionList;
use crate::domain::Domain;
use crate::object::DirectoryObject;
use crate::parser::{Collection, SearchResult};
use crate::request::{CacheFlush, RequestDescriptor};
use crate::Result;
use serde_json::Value;
use zimbra_core::search::SearchQuery;
use zimbra_core::{Error, ResourceKind};

impl AdminClient {
    /// Searches the directory.
    ///
    /// Only the kinds present in the response appear in the result.
    ///
    /// # Errors
    ///
    /// Returns the service error (`account.TOO_MANY_SEARCH_RESULTS`, ...).
    pub async fn directory_search(&self, query: &SearchQuery) -> Result<SearchResult> {
        self.perform_request(&RequestDescriptor::directory_search(query))
            .await?
            .into_search()
    }

    /// Accounts matching a search.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_all_accounts(&self, query: SearchQuery) -> Result<Collection<Account>> {
        self.search_kind(ResourceKind::Account, query).await
    }

    /// Domains matching a search.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_all_domains(&self, query: SearchQuery) -> Result<Collection<Domain>> {
        self.search_kind(ResourceKind::Domain, query).await
    }

    /// Distribution lists matching a search.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_all_distribution_lists(
        &self,
        query: SearchQuery,
    ) -> Result<Collection<DistributionList>> {
        self.search_kind(ResourceKind::DistributionList, query).await
    }

    /// Aliases matching a search.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_all_aliases(&self, query: SearchQuery) -> Result<Collection<Alias>> {
        self.search_kind(ResourceKind::Alias, query).await
    }

    async fn search_kind<T>(&self, kind: ResourceKind, query: SearchQuery) -> Result<Collection<T>>
    where
        T: TryFrom<DirectoryObject, Error = Error>,
    {
        self.perform_request(&RequestDescriptor::search_kind(kind, query))
            .await?
            .into_search()?
            .take(kind)
    }

    /// Fetches a class of service by id or name.
    ///
    /// # Errors
    ///
    /// Returns the service error (`account.NO_SUCH_COS`, ...).
    pub async fn get_cos(&self, identifier: &str) -> Result<Cos> {
        self.get(ResourceKind::Cos, identifier).await?.try_into()
    }

    /// Every class of service.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_all_cos(&self) -> Result<Collection<Cos>> {
        self.get_all(ResourceKind::Cos).await?.typed()
    }

    /// Flushes a server cache.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn flush_cache(&self, flush: &CacheFlush) -> Result<Value> {
        self.perform_ack(&RequestDescriptor::flush_cache(flush)).await
    }

    /// Information about the authenticated admin account.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_info(&self) -> Result<Value> {
        self.perform_ack(&RequestDescriptor::get_info()).await
    }
}
