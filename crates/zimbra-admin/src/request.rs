//! Request descriptors.
//!
//! A [`RequestDescriptor`] is a self-describing, immutable request: namespace,
//! request name, parameter body, the resource kind it returns and the parser that
//! turns the answer into a [`Parsed`](crate::Parsed) value. Descriptors do nothing on
//! their own; they are dispatched by [`AdminClient::perform_request`] or grouped into
//! a [`BatchDescriptor`](crate::BatchDescriptor).
//!
//! [`AdminClient::perform_request`]: crate::AdminClient::perform_request

use crate::envelope::Namespace;
use crate::parser::ResponseParser;
use serde_json::{json, Map, Value};
use zimbra_core::attrs::{attributes_to_array, AttributeMap};
use zimbra_core::identifier::{by_id_or_name, Selector};
use zimbra_core::search::SearchQuery;
use zimbra_core::ResourceKind;

/// Default lifetime of delegated auth tokens, in seconds.
pub const DEFAULT_DELEGATE_LIFETIME_SECS: u64 = 3600;

/// An unsent request.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct RequestDescriptor {
    namespace: Namespace,
    request_name: String,
    resource: Option<ResourceKind>,
    params: Map<String, Value>,
    parser: ResponseParser,
}

/// Builder for [`RequestDescriptor`].
#[derive(Debug, Clone)]
#[must_use]
pub struct RequestDescriptorBuilder {
    descriptor: RequestDescriptor,
}

impl RequestDescriptorBuilder {
    /// Set the namespace (defaults to `urn:zimbraAdmin`).
    pub const fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.descriptor.namespace = namespace;
        self
    }

    /// Set the resource kind the response carries.
    pub const fn with_resource(mut self, resource: ResourceKind) -> Self {
        self.descriptor.resource = Some(resource);
        self
    }

    /// Set the response parser (defaults to [`ResponseParser::Empty`]).
    pub const fn with_parser(mut self, parser: ResponseParser) -> Self {
        self.descriptor.parser = parser;
        self
    }

    /// Add one parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.descriptor.params.insert(key.into(), value.into());
        self
    }

    /// Add every parameter of a map.
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.descriptor.params.extend(params);
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> RequestDescriptor {
        self.descriptor
    }
}

impl RequestDescriptor {
    /// Starts a descriptor for `request_name` (`GetAccount`, `SearchDirectory`).
    pub fn builder(request_name: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder {
            descriptor: Self {
                namespace: Namespace::Admin,
                request_name: request_name.into(),
                resource: None,
                params: Map::new(),
                parser: ResponseParser::Empty,
            },
        }
    }

    /// Creates a descriptor with an empty body.
    pub fn new(request_name: impl Into<String>, parser: ResponseParser) -> Self {
        Self::builder(request_name).with_parser(parser).build()
    }

    /// Request namespace.
    #[must_use]
    pub const fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Request name without suffix (`GetAccount`).
    #[must_use]
    pub fn request_name(&self) -> &str {
        &self.request_name
    }

    /// Envelope element name (`GetAccountRequest`).
    #[must_use]
    pub fn element_name(&self) -> String {
        format!("{}Request", self.request_name)
    }

    /// Response element name (`GetAccountResponse`).
    #[must_use]
    pub fn response_name(&self) -> String {
        format!("{}Response", self.request_name)
    }

    /// Resource kind carried by the response.
    #[must_use]
    pub const fn resource(&self) -> Option<ResourceKind> {
        self.resource
    }

    /// Parameter body.
    #[must_use]
    pub const fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Response parser.
    #[must_use]
    pub const fn parser(&self) -> ResponseParser {
        self.parser
    }

    // Generic verbs

    /// `Get<Resource>` by id or name.
    pub fn get(kind: ResourceKind, identifier: &str) -> Self {
        Self::builder(format!("Get{}", kind.request_name()))
            .with_resource(kind)
            .with_parser(ResponseParser::Single)
            .with_param(kind.response_name(), selector(identifier))
            .build()
    }

    /// `GetAll<Resource>s`.
    pub fn get_all(kind: ResourceKind) -> Self {
        Self::builder(format!("GetAll{}", kind.plural_request_name()))
            .with_resource(kind)
            .with_parser(ResponseParser::Collection)
            .build()
    }

    /// `Create<Resource>` with an explicit body.
    pub fn create(kind: ResourceKind, params: Map<String, Value>) -> Self {
        Self::builder(format!("Create{}", kind.request_name()))
            .with_resource(kind)
            .with_parser(ResponseParser::Single)
            .with_params(params)
            .build()
    }

    /// `Modify<Resource>` with an explicit body.
    pub fn modify(kind: ResourceKind, params: Map<String, Value>) -> Self {
        Self::builder(format!("Modify{}", kind.request_name()))
            .with_resource(kind)
            .with_parser(ResponseParser::Single)
            .with_params(params)
            .build()
    }

    /// `Delete<Resource>` with an explicit body.
    pub fn remove(kind: ResourceKind, params: Map<String, Value>) -> Self {
        Self::builder(format!("Delete{}", kind.request_name()))
            .with_resource(kind)
            .with_parser(ResponseParser::Empty)
            .with_params(params)
            .build()
    }

    /// `Rename<Resource>` with an explicit body.
    pub fn rename(kind: ResourceKind, params: Map<String, Value>) -> Self {
        Self::builder(format!("Rename{}", kind.request_name()))
            .with_resource(kind)
            .with_parser(ResponseParser::Single)
            .with_params(params)
            .build()
    }

    // Resource shortcuts

    /// `Create<Resource>` from a name and attributes.
    pub fn create_named(kind: ResourceKind, name: &str, attrs: &AttributeMap) -> Self {
        Self::create(kind, resource_data(name, attrs))
    }

    /// `CreateAccount`.
    pub fn create_account(name: &str, password: &str, attrs: &AttributeMap) -> Self {
        let mut params = resource_data(name, attrs);
        params.insert("password".to_string(), json!({ "_content": password }));
        Self::create(ResourceKind::Account, params)
    }

    /// `Modify<Resource>` of the attributes of an entry.
    pub fn modify_attrs(kind: ResourceKind, id: &str, attrs: &AttributeMap) -> Self {
        Self::modify(kind, modify_data(id, attrs))
    }

    /// `Delete<Resource>` by id.
    pub fn remove_by_id(kind: ResourceKind, id: &str) -> Self {
        Self::remove(kind, object([("id", json!(id))]))
    }

    /// `Rename<Resource>`.
    pub fn rename_to(kind: ResourceKind, id: &str, new_name: &str) -> Self {
        Self::rename(kind, object([("id", json!(id)), ("newName", json!(new_name))]))
    }

    // Search

    /// `SearchDirectory`.
    pub fn directory_search(query: &SearchQuery) -> Self {
        Self::builder("SearchDirectory")
            .with_parser(ResponseParser::Search)
            .with_params(query.to_params())
            .build()
    }

    /// `SearchDirectory` restricted to one resource kind.
    pub fn search_kind(kind: ResourceKind, query: SearchQuery) -> Self {
        Self::directory_search(&query.with_kind(kind))
    }

    /// `CountAccount`: accounts per class of service in a domain.
    pub fn count_accounts(domain: &str) -> Self {
        Self::builder("CountAccount")
            .with_parser(ResponseParser::Count)
            .with_param("domain", selector(domain))
            .build()
    }

    /// `CheckDomainMXRecord`.
    pub fn check_domain_mx_record(domain: &str) -> Self {
        Self::builder("CheckDomainMXRecord")
            .with_parser(ResponseParser::MxRecord)
            .with_param("domain", selector(domain))
            .build()
    }

    // Rights

    /// `GrantRight`.
    pub fn grant_right(target: &GrantTarget, grantee: &Grantee, right: &Right) -> Self {
        Self::builder("GrantRight")
            .with_param("target", target.to_value())
            .with_param("grantee", grantee.to_value())
            .with_param("right", right.to_value())
            .build()
    }

    /// `RevokeRight`.
    pub fn revoke_right(target: &GrantTarget, grantee: &Grantee, right: &Right) -> Self {
        Self::builder("RevokeRight")
            .with_param("target", target.to_value())
            .with_param("grantee", grantee.to_value())
            .with_param("right", right.to_value())
            .build()
    }

    /// `GetGrants` on a target, for a grantee, or both.
    pub fn get_grants(target: Option<&GrantTarget>, grantee: Option<&Grantee>) -> Self {
        let mut builder = Self::builder("GetGrants")
            .with_resource(ResourceKind::Grant)
            .with_parser(ResponseParser::Collection);
        if let Some(target) = target {
            builder = builder.with_param("target", target.to_value());
        }
        if let Some(grantee) = grantee {
            builder = builder.with_param("grantee", grantee.to_value());
        }
        builder.build()
    }

    // Accounts

    /// `SetPassword`.
    pub fn set_password(id: &str, new_password: &str) -> Self {
        Self::builder("SetPassword")
            .with_parser(ResponseParser::SetPassword)
            .with_param("id", id)
            .with_param("newPassword", new_password)
            .build()
    }

    /// `AddAccountAlias`.
    pub fn add_account_alias(id: &str, alias: &str) -> Self {
        alias_request("AddAccountAlias", id, alias)
    }

    /// `RemoveAccountAlias`.
    pub fn remove_account_alias(id: &str, alias: &str) -> Self {
        alias_request("RemoveAccountAlias", id, alias)
    }

    /// `GetMailbox`.
    pub fn get_mailbox(account_id: &str) -> Self {
        Self::builder("GetMailbox")
            .with_parser(ResponseParser::Mailbox)
            .with_param("mbox", json!({ "id": account_id }))
            .build()
    }

    /// `DelegateAuth` for `lifetime_secs` seconds.
    pub fn delegate_auth(account: &str, lifetime_secs: u64) -> Self {
        Self::builder("DelegateAuth")
            .with_parser(ResponseParser::DelegatedAuth)
            .with_param("account", selector(account))
            .with_param("duration", lifetime_secs.to_string())
            .build()
    }

    /// `EnableArchive`.
    pub fn enable_archive(account: &str, archive: &ArchiveOptions) -> Self {
        Self::builder("EnableArchive")
            .with_param("account", selector(account))
            .with_param("archive", archive.to_value())
            .build()
    }

    /// `DisableArchive`.
    pub fn disable_archive(account: &str) -> Self {
        Self::builder("DisableArchive")
            .with_param("account", selector(account))
            .build()
    }

    /// `GetAccountMembership`: distribution lists the account belongs to.
    pub fn get_account_membership(account: &str) -> Self {
        Self::builder("GetAccountMembership")
            .with_resource(ResourceKind::DistributionList)
            .with_parser(ResponseParser::Collection)
            .with_param("account", selector(account))
            .build()
    }

    // Distribution lists

    /// `AddDistributionListAlias`.
    pub fn add_distribution_list_alias(id: &str, alias: &str) -> Self {
        alias_request("AddDistributionListAlias", id, alias)
    }

    /// `RemoveDistributionListAlias`.
    pub fn remove_distribution_list_alias(id: &str, alias: &str) -> Self {
        alias_request("RemoveDistributionListAlias", id, alias)
    }

    /// `AddDistributionListMember`.
    pub fn add_distribution_list_members<S: AsRef<str>>(id: &str, members: &[S]) -> Self {
        Self::builder("AddDistributionListMember")
            .with_param("id", id)
            .with_param("dlm", member_array(members))
            .build()
    }

    /// `RemoveDistributionListMember`.
    pub fn remove_distribution_list_members<S: AsRef<str>>(id: &str, members: &[S]) -> Self {
        Self::builder("RemoveDistributionListMember")
            .with_param("id", id)
            .with_param("dlm", member_array(members))
            .build()
    }

    /// `GetDistributionListMembership`: lists the list belongs to.
    pub fn get_distribution_list_membership(dl: &str) -> Self {
        Self::builder("GetDistributionListMembership")
            .with_resource(ResourceKind::DistributionList)
            .with_parser(ResponseParser::Collection)
            .with_param("dl", selector(dl))
            .build()
    }

    // Server

    /// `FlushCache`.
    pub fn flush_cache(flush: &CacheFlush) -> Self {
        Self::builder("FlushCache")
            .with_param("cache", flush.to_value())
            .build()
    }

    /// `GetInfo` for the authenticated account.
    pub fn get_info() -> Self {
        Self::builder("GetInfo")
            .with_namespace(Namespace::Account)
            .build()
    }
}

/// `{by, _content}` node for an identifier.
#[must_use]
pub fn selector(identifier: &str) -> Value {
    json!(Selector::new(identifier))
}

/// Body of a create request: `{name: {_content}, a: [...]}`.
#[must_use]
pub fn resource_data(name: &str, attrs: &AttributeMap) -> Map<String, Value> {
    object([
        ("name", json!({ "_content": name })),
        ("a", Value::Array(attributes_to_array(attrs))),
    ])
}

/// Body of a modify request: `{id, a: [...]}`.
#[must_use]
pub fn modify_data(id: &str, attrs: &AttributeMap) -> Map<String, Value> {
    object([
        ("id", json!(id)),
        ("a", Value::Array(attributes_to_array(attrs))),
    ])
}

fn alias_request(request_name: &str, id: &str, alias: &str) -> RequestDescriptor {
    RequestDescriptor::builder(request_name)
        .with_param("id", id)
        .with_param("alias", alias)
        .build()
}

fn member_array<S: AsRef<str>>(members: &[S]) -> Value {
    members
        .iter()
        .map(|member| json!({ "_content": member.as_ref() }))
        .collect()
}

fn object<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Entry rights are granted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantTarget {
    /// Target type (`account`, `domain`, `dl`, `cos`)
    pub target_type: String,
    /// Name or Zimbra id
    pub identifier: String,
}

impl GrantTarget {
    /// Creates a target.
    #[must_use]
    pub fn new(target_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            identifier: identifier.into(),
        }
    }

    /// Targets an entry of a given resource kind.
    #[must_use]
    pub fn for_kind(kind: ResourceKind, identifier: impl Into<String>) -> Self {
        Self::new(kind.target_type(), identifier)
    }

    /// `{type, by, _content}` node.
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({
            "type": self.target_type,
            "by": by_id_or_name(&self.identifier),
            "_content": self.identifier,
        })
    }
}

/// Entry rights are granted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grantee {
    /// Grantee type (`usr`, `grp`, `dom`, ...)
    pub grantee_type: String,
    /// Name or Zimbra id
    pub identifier: String,
}

impl Grantee {
    /// Creates a grantee.
    #[must_use]
    pub fn new(grantee_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            grantee_type: grantee_type.into(),
            identifier: identifier.into(),
        }
    }

    /// An account grantee (`usr`).
    #[must_use]
    pub fn account(identifier: impl Into<String>) -> Self {
        Self::new("usr", identifier)
    }

    /// A group grantee (`grp`).
    #[must_use]
    pub fn group(identifier: impl Into<String>) -> Self {
        Self::new("grp", identifier)
    }

    /// `{type, by, all: 1, _content}` node.
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({
            "type": self.grantee_type,
            "by": by_id_or_name(&self.identifier),
            "all": 1,
            "_content": self.identifier,
        })
    }
}

/// Right name and modifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Right {
    /// Right name (`domainAdminRights`, `sendToDistList`)
    pub name: String,
    /// Negative grant
    pub deny: bool,
    /// Grantee may delegate the right
    pub can_delegate: bool,
    /// Do not inherit to sub groups
    pub disinherit_sub_groups: bool,
    /// Apply to sub domains
    pub sub_domain: bool,
}

impl Right {
    /// Creates a plain right.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Make the grant negative.
    #[must_use]
    pub const fn denied(mut self) -> Self {
        self.deny = true;
        self
    }

    /// Allow the grantee to delegate the right.
    #[must_use]
    pub const fn delegable(mut self) -> Self {
        self.can_delegate = true;
        self
    }

    /// Do not inherit to sub groups.
    #[must_use]
    pub const fn disinherit_sub_groups(mut self) -> Self {
        self.disinherit_sub_groups = true;
        self
    }

    /// Apply to sub domains.
    #[must_use]
    pub const fn sub_domain(mut self) -> Self {
        self.sub_domain = true;
        self
    }

    /// `{_content: name, ...flags}` node. Only set modifiers are sent.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut right = Map::new();
        right.insert("_content".to_string(), json!(self.name));
        for (key, set) in [
            ("deny", self.deny),
            ("canDelegate", self.can_delegate),
            ("disinheritSubGroups", self.disinherit_sub_groups),
            ("subDomain", self.sub_domain),
        ] {
            if set {
                right.insert(key.to_string(), json!(1));
            }
        }
        Value::Object(right)
    }
}

impl From<&str> for Right {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Options of `EnableArchive`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Create the archive account
    pub create: bool,
    /// Class of service of the archive account, by name or id
    pub cos: String,
    /// Archive account name
    pub name: Option<String>,
    /// Archive account password
    pub password: Option<String>,
    /// Extra attributes of the archive account
    pub attrs: AttributeMap,
}

impl ArchiveOptions {
    /// Archive with the given class of service, creating the archive account.
    #[must_use]
    pub fn new(cos: impl Into<String>) -> Self {
        Self {
            create: true,
            cos: cos.into(),
            name: None,
            password: None,
            attrs: AttributeMap::new(),
        }
    }

    /// Reuse an existing archive account.
    #[must_use]
    pub const fn without_create(mut self) -> Self {
        self.create = false;
        self
    }

    /// Set the archive account name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the archive account password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set extra attributes.
    #[must_use]
    pub fn with_attrs(mut self, attrs: AttributeMap) -> Self {
        self.attrs = attrs;
        self
    }

    fn to_value(&self) -> Value {
        let mut archive = Map::new();
        archive.insert("create".to_string(), json!(u8::from(self.create)));
        archive.insert("cos".to_string(), selector(&self.cos));
        if let Some(name) = &self.name {
            archive.insert("name".to_string(), json!({ "_content": name }));
        }
        if let Some(password) = &self.password {
            archive.insert("password".to_string(), json!({ "_content": password }));
        }
        if !self.attrs.is_empty() {
            archive.insert("a".to_string(), Value::Array(attributes_to_array(&self.attrs)));
        }
        Value::Object(archive)
    }
}

/// Options of `FlushCache`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheFlush {
    /// Comma-separated cache types (`skin`, `locale`, `account`, `cos`, `domain`, ...)
    pub cache_type: String,
    /// Flush on every server
    pub all_servers: bool,
    /// Entry to flush, by name or id
    pub entry: Option<String>,
}

impl CacheFlush {
    /// Flush caches of the given types.
    #[must_use]
    pub fn new(cache_type: impl Into<String>) -> Self {
        Self {
            cache_type: cache_type.into(),
            all_servers: false,
            entry: None,
        }
    }

    /// Flush on every server.
    #[must_use]
    pub const fn on_all_servers(mut self) -> Self {
        self.all_servers = true;
        self
    }

    /// Flush a single entry.
    #[must_use]
    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = Some(entry.into());
        self
    }

    fn to_value(&self) -> Value {
        let entry = self.entry.as_deref().map_or_else(|| json!({}), selector);
        json!({
            "type": self.cache_type,
            "allServers": u8::from(self.all_servers),
            "_content": { "entry": entry },
        })
    }
}
