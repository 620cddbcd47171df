//! The resource dictionary.
//!
//! Every directory resource the client understands is a [`ResourceKind`]. Keywords are
//! matched case-insensitively, and `dl` is accepted as an alias for
//! `distributionlist`. Each kind knows the element name it uses in requests and the
//! field name it uses in responses.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Directory resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Mail account
    Account,
    /// Mail domain
    Domain,
    /// Distribution list
    DistributionList,
    /// Class of service
    Cos,
    /// Account or distribution list alias
    Alias,
    /// Access-control grant
    Grant,
}

impl ResourceKind {
    /// Returns the canonical keyword.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Domain => "domain",
            Self::DistributionList => "distributionlist",
            Self::Cos => "cos",
            Self::Alias => "alias",
            Self::Grant => "grant",
        }
    }

    /// Returns all registered kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Account,
            Self::Domain,
            Self::DistributionList,
            Self::Cos,
            Self::Alias,
            Self::Grant,
        ]
    }

    /// Resource part of request names (`Get<Account>`, `Create<DistributionList>`).
    #[must_use]
    pub const fn request_name(&self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Domain => "Domain",
            Self::DistributionList => "DistributionList",
            Self::Cos => "Cos",
            Self::Alias => "Alias",
            Self::Grant => "Grant",
        }
    }

    /// Resource part of list request names (`GetAll<Accounts>`, `GetAll<Cos>`).
    #[must_use]
    pub const fn plural_request_name(&self) -> &'static str {
        match self {
            Self::Account => "Accounts",
            Self::Domain => "Domains",
            Self::DistributionList => "DistributionLists",
            Self::Cos => "Cos",
            Self::Alias => "Aliases",
            Self::Grant => "Grants",
        }
    }

    /// Field name holding this resource in responses.
    #[must_use]
    pub const fn response_name(&self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Domain => "domain",
            Self::DistributionList => "dl",
            Self::Cos => "cos",
            Self::Alias => "alias",
            Self::Grant => "grant",
        }
    }

    /// Target type used when granting rights on this resource.
    #[must_use]
    pub const fn target_type(&self) -> &'static str {
        self.response_name()
    }

    /// `types` value selecting this resource in a directory search.
    #[must_use]
    pub const fn search_type(&self) -> Option<&'static str> {
        match self {
            Self::Account => Some("accounts"),
            Self::Domain => Some("domains"),
            Self::DistributionList => Some("distributionlists"),
            Self::Cos => Some("coses"),
            Self::Alias => Some("aliases"),
            Self::Grant => None,
        }
    }

    /// Resolves a response field name back to its kind.
    #[must_use]
    pub fn from_response_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.response_name() == name)
    }

    /// Resolves a keyword, returning the response field name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownResource`] for unregistered keywords.
    pub fn resource_response_name(keyword: &str) -> Result<&'static str> {
        keyword.parse::<Self>().map(|kind| kind.response_name())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "account" => Ok(Self::Account),
            "domain" => Ok(Self::Domain),
            "distributionlist" | "dl" => Ok(Self::DistributionList),
            "cos" => Ok(Self::Cos),
            "alias" => Ok(Self::Alias),
            "grant" => Ok(Self::Grant),
            _ => Err(Error::UnknownResource(s.to_string())),
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!("Account".parse::<ResourceKind>().unwrap(), ResourceKind::Account);
        assert_eq!("DOMAIN".parse::<ResourceKind>().unwrap(), ResourceKind::Domain);
        assert_eq!(
            "DistributionList".parse::<ResourceKind>().unwrap(),
            ResourceKind::DistributionList
        );
        assert_eq!("dl".parse::<ResourceKind>().unwrap(), ResourceKind::DistributionList);
    }

    #[test]
    fn unknown_keyword_fails() {
        let err = "printer".parse::<ResourceKind>().unwrap_err();
        assert_eq!(err, Error::UnknownResource("printer".to_string()));
        assert!(ResourceKind::resource_response_name("calendar").is_err());
    }

    #[test]
    fn distribution_list_keywords_share_response_name() {
        assert_eq!(ResourceKind::resource_response_name("dl").unwrap(), "dl");
        assert_eq!(
            ResourceKind::resource_response_name("distributionlist").unwrap(),
            "dl"
        );
    }

    #[test]
    fn request_names() {
        assert_eq!(ResourceKind::Account.request_name(), "Account");
        assert_eq!(ResourceKind::Cos.plural_request_name(), "Cos");
        assert_eq!(
            ResourceKind::DistributionList.plural_request_name(),
            "DistributionLists"
        );
    }

    #[test]
    fn response_names_round_trip() {
        for kind in ResourceKind::all() {
            assert_eq!(
                ResourceKind::from_response_name(kind.response_name()),
                Some(*kind)
            );
        }
        assert_eq!(ResourceKind::from_response_name("mbox"), None);
    }

    #[test]
    fn search_types() {
        assert_eq!(ResourceKind::Account.search_type(), Some("accounts"));
        assert_eq!(ResourceKind::Grant.search_type(), None);
    }

    #[test]
    fn display_uses_keyword() {
        assert_eq!(ResourceKind::DistributionList.to_string(), "distributionlist");
    }
}
