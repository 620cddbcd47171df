//! Mail domains.
//!
//! Besides the plain entry, a [`Domain`] knows which accounts administer it (from the
//! `domainAdminRights` entries of its ACL) and how many accounts each class of
//! service may hold (`zimbraDomainCOSMaxAccounts`).

use crate::account::Account;
use crate::batch::{BatchDescriptor, BatchResponse};
use crate::client::ClientRef;
use crate::distribution_list::DistributionList;
use crate::grant::{ASSIGN_COS_RIGHT, DOMAIN_ADMIN_RIGHT};
use crate::object::{domain_part, string_field, DirectoryEntry};
use crate::parser::{Collection, CountByCos, MxRecord};
use crate::request::{GrantTarget, Grantee, RequestDescriptor, Right};
use crate::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;
use zimbra_core::attrs::{build_attrs_map, AttributeMap};
use zimbra_core::search::SearchQuery;
use zimbra_core::ResourceKind;

/// Attribute holding the domain type (`local` or `alias`).
pub const DOMAIN_TYPE_ATTRIBUTE: &str = "zimbraDomainType";

/// Attribute holding the catch-all forwarding address of alias domains.
pub const CATCH_ALL_ATTRIBUTE: &str = "zimbraMailCatchAllForwardingAddress";

/// Attribute holding `cosId:limit` entries.
pub const COS_MAX_ACCOUNTS_ATTRIBUTE: &str = "zimbraDomainCOSMaxAccounts";

/// Attribute flagging delegated administrators.
pub const DELEGATED_ADMIN_ATTRIBUTE: &str = "zimbraIsDelegatedAdminAccount";

/// A mail domain.
#[derive(Debug, Clone)]
pub struct Domain {
    /// Zimbra id
    pub id: String,
    /// Domain name
    pub name: String,
    /// Attributes
    pub attrs: AttributeMap,
    /// The domain is an alias of another domain
    pub is_alias_domain: bool,
    /// Domain an alias domain points to
    pub master_domain_name: Option<String>,
    client: ClientRef,
}

impl Domain {
    pub(crate) fn from_fragment(fragment: &Value, client: ClientRef) -> Self {
        let attrs = build_attrs_map(fragment.get("a"));
        let is_alias_domain = attrs.get_str(DOMAIN_TYPE_ATTRIBUTE) == Some("alias");
        let master_domain_name = if is_alias_domain {
            attrs.get_str(CATCH_ALL_ATTRIBUTE).and_then(domain_part)
        } else {
            None
        };
        Self {
            id: string_field(fragment, "id"),
            name: string_field(fragment, "name"),
            attrs,
            is_alias_domain,
            master_domain_name,
            client,
        }
    }

    /// Account limit per class of service id, or `None` when the domain sets none.
    #[must_use]
    pub fn max_accounts_by_cos(&self) -> Option<BTreeMap<String, u64>> {
        let entries = self.attrs.get(COS_MAX_ACCOUNTS_ATTRIBUTE)?;
        Some(
            entries
                .as_slice()
                .iter()
                .filter_map(|entry| {
                    let (cos_id, limit) = entry.split_once(':')?;
                    Some((cos_id.to_string(), limit.trim().parse().ok()?))
                })
                .collect(),
        )
    }

    /// Ids of the accounts holding `domainAdminRights` in the domain ACL.
    #[must_use]
    pub fn admin_ids_from_grants(&self) -> Vec<String> {
        self.acl()
            .into_iter()
            .filter(|entry| entry.right == DOMAIN_ADMIN_RIGHT)
            .map(|entry| entry.grantee_id)
            .collect()
    }

    /// Accounts per class of service, with the domain limit of each.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn count_accounts(&self) -> Result<CountByCos> {
        let mut counts = self.client.upgrade()?.count_accounts(&self.id).await?;
        if let Some(limits) = self.max_accounts_by_cos() {
            for count in counts.values_mut() {
                count.limit = limits.get(&count.id).copied();
            }
        }
        Ok(counts)
    }

    /// Accounts administering the domain.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_admins(&self) -> Result<Collection<Account>> {
        let ids = self.admin_ids_from_grants();
        if ids.is_empty() {
            return Ok(Collection::default());
        }
        let client = self.client.upgrade()?;
        let query = SearchQuery::new().with_query(admin_ids_query(&ids));
        client.get_all_accounts(query).await
    }

    /// Makes an account a domain administrator.
    ///
    /// Flags the account as delegated administrator, grants `domainAdminRights` on
    /// the domain, then grants `assignCos` on every class of service in one batch.
    ///
    /// # Errors
    ///
    /// Returns the first failing step; batch faults are reported in the response.
    pub async fn add_admin<S: AsRef<str>>(
        &self,
        account_id: &str,
        coses: &[S],
    ) -> Result<Option<BatchResponse>> {
        let client = self.client.upgrade()?;
        client
            .modify_account(
                account_id,
                &AttributeMap::new().with(DELEGATED_ADMIN_ATTRIBUTE, true),
            )
            .await?;
        let grantee = Grantee::account(account_id);
        self.grant_right(&grantee, &Right::new(DOMAIN_ADMIN_RIGHT))
            .await?;
        debug!(domain = %self.name, account = account_id, coses = coses.len(), "Granting cos rights");
        client
            .perform_batch(cos_rights_batch(&grantee, coses, false))
            .await
    }

    /// Removes an administrator, revoking `assignCos` on every class of service.
    ///
    /// # Errors
    ///
    /// Returns the first failing step; batch faults are reported in the response.
    pub async fn remove_admin<S: AsRef<str>>(
        &self,
        account_id: &str,
        coses: &[S],
    ) -> Result<Option<BatchResponse>> {
        let client = self.client.upgrade()?;
        let grantee = Grantee::account(account_id);
        self.revoke_right(&grantee, &Right::new(DOMAIN_ADMIN_RIGHT))
            .await?;
        client
            .perform_batch(cos_rights_batch(&grantee, coses, true))
            .await
    }

    /// Distribution lists of the domain.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn distribution_lists(&self) -> Result<Collection<DistributionList>> {
        self.client
            .upgrade()?
            .get_all_distribution_lists(SearchQuery::new().with_domain(&self.name))
            .await
    }

    /// Checks the MX record of the domain.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn check_mx_record(&self) -> Result<MxRecord> {
        self.client
            .upgrade()?
            .check_domain_mx_record(&self.id)
            .await
    }
}

/// LDAP filter matching any of the given ids: `(|(zimbraId=a)(zimbraId=b))`.
#[must_use]
pub fn admin_ids_query<S: AsRef<str>>(ids: &[S]) -> String {
    let filters: String = ids
        .iter()
        .map(|id| format!("(zimbraId={})", id.as_ref()))
        .collect();
    format!("(|{filters})")
}

fn cos_rights_batch<S: AsRef<str>>(grantee: &Grantee, coses: &[S], revoke: bool) -> BatchDescriptor {
    let right = Right::new(ASSIGN_COS_RIGHT);
    coses
        .iter()
        .map(|cos| {
            let target = GrantTarget::for_kind(ResourceKind::Cos, cos.as_ref());
            if revoke {
                RequestDescriptor::revoke_right(&target, grantee, &right)
            } else {
                RequestDescriptor::grant_right(&target, grantee, &right)
            }
        })
        .collect()
}

impl DirectoryEntry for Domain {
    const KIND: ResourceKind = ResourceKind::Domain;

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

    fn domain(attrs: Value) -> Domain {
        Domain::from_fragment(
            &json!({"name": "example.test", "id": "d1", "a": attrs}),
            ClientRef::detached(),
        )
    }

    #[test]
    fn alias_domain_detection() {
        let alias = domain(json!([
            {"n": "zimbraDomainType", "_content": "alias"},
            {"n": "zimbraMailCatchAllForwardingAddress", "_content": "@master.test"}
        ]));
        assert!(alias.is_alias_domain);
        assert_eq!(alias.master_domain_name.as_deref(), Some("master.test"));

        let local = domain(json!([{"n": "zimbraDomainType", "_content": "local"}]));
        assert!(!local.is_alias_domain);
        assert_eq!(local.master_domain_name, None);
    }

    #[test]
    fn max_accounts_by_cos() {
        assert_eq!(domain(json!([])).max_accounts_by_cos(), None);

        let single = domain(json!([{"n": "zimbraDomainCOSMaxAccounts", "_content": "c1:10"}]));
        assert_eq!(
            single.max_accounts_by_cos(),
            Some(BTreeMap::from([("c1".to_string(), 10)]))
        );

        let many = domain(json!([
            {"n": "zimbraDomainCOSMaxAccounts", "_content": "c1:10"},
            {"n": "zimbraDomainCOSMaxAccounts", "_content": "c2:25"}
        ]));
        assert_eq!(many.max_accounts_by_cos().unwrap()["c2"], 25);
    }

    #[test]
    fn admin_ids() {
        let domain = domain(json!([
            {"n": "zimbraACE", "_content": "a1 usr domainAdminRights"},
            {"n": "zimbraACE", "_content": "a2 usr sendToDistList"},
            {"n": "zimbraACE", "_content": "a3 usr domainAdminRights"}
        ]));
        let ids = domain.admin_ids_from_grants();
        assert_eq!(ids, vec!["a1", "a3"]);
        assert_eq!(admin_ids_query(&ids), "(|(zimbraId=a1)(zimbraId=a3))");
    }

    #[tokio::test]
    async fn no_admins_means_no_request() {
        let admins = domain(json!([])).get_admins().await.unwrap();
        assert!(admins.is_empty());
    }

    #[test]
    fn cos_rights_requests() {
        let grantee = Grantee::account("a1");
        let batch = cos_rights_batch(&grantee, &["c1", "c2"], false);
        assert_eq!(batch.len(), 2);
        let first = &batch.requests()[0];
        assert_eq!(first.request_name(), "GrantRight");
        assert_eq!(first.params()["target"]["type"], "cos");
        assert_eq!(first.params()["right"]["_content"], "assignCos");

        let revoke = cos_rights_batch(&grantee, &["c1"], true);
        assert_eq!(revoke.requests()[0].request_name(), "RevokeRight");
    }
}
