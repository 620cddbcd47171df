//! Response parsers.
//!
//! Every [`RequestDescriptor`] names one [`ResponseParser`]. Parsers are pure functions
//! of the response body and the descriptor: a fault short-circuits to an error, and
//! everything else becomes one [`Parsed`] variant.

use crate::client::ClientRef;
use crate::envelope::SoapResponse;
use crate::object::{content_of, u64_of, DirectoryObject};
use crate::request::RequestDescriptor;
use crate::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use zimbra_core::config::CollectionKey;
use zimbra_core::{Error, ErrorInfo, ResourceKind};

/// How a response is turned into a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseParser {
    /// First element of the resource field, as a directory object
    Single,
    /// Every element of the resource field; absent means empty
    Collection,
    /// Directory search results grouped by resource kind
    Search,
    /// Accounts per class of service
    Count,
    /// The bare response element (acknowledgements, `GetInfo`)
    Empty,
    /// Delegated auth token
    DelegatedAuth,
    /// Mailbox id and size
    Mailbox,
    /// Password change; a `message` in the response is an error
    SetPassword,
    /// MX record check
    MxRecord,
}

/// Sequence or keyed map of objects, chosen by client configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection<T> {
    /// Objects in response order
    List(Vec<T>),
    /// Objects keyed by id or name
    Keyed(BTreeMap<String, T>),
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl<T> Collection<T> {
    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::List(items) => items.len(),
            Self::Keyed(items) => items.len(),
        }
    }

    /// Returns true when there are no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the objects.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (list, keyed) = match self {
            Self::List(items) => (Some(items.iter()), None),
            Self::Keyed(items) => (None, Some(items.values())),
        };
        list.into_iter()
            .flatten()
            .chain(keyed.into_iter().flatten())
    }

    /// Looks up an object of a keyed collection.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&T> {
        match self {
            Self::List(_) => None,
            Self::Keyed(items) => items.get(key),
        }
    }

    /// Discards keys, returning the objects.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::List(items) => items,
            Self::Keyed(items) => items.into_values().collect(),
        }
    }

    /// Converts every object, keeping the shape.
    ///
    /// # Errors
    ///
    /// Returns the first conversion error.
    pub fn try_map<U, F>(self, mut convert: F) -> Result<Collection<U>>
    where
        F: FnMut(T) -> Result<U>,
    {
        Ok(match self {
            Self::List(items) => {
                Collection::List(items.into_iter().map(convert).collect::<Result<_>>()?)
            }
            Self::Keyed(items) => Collection::Keyed(
                items
                    .into_iter()
                    .map(|(key, item)| convert(item).map(|item| (key, item)))
                    .collect::<Result<_>>()?,
            ),
        })
    }
}

impl Collection<DirectoryObject> {
    /// Converts into a collection of one object type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResponse`] when an object has another type.
    pub fn typed<T>(self) -> Result<Collection<T>>
    where
        T: TryFrom<DirectoryObject, Error = Error>,
    {
        self.try_map(T::try_from)
    }
}

/// Accounts of one class of service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CosCount {
    /// Accounts using the class of service
    pub used: u64,
    /// Class of service id
    pub id: String,
    /// Maximum accounts allowed by the domain, when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Accounts per class of service name.
pub type CountByCos = BTreeMap<String, CosCount>;

/// Results of a directory search.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// Total number of matches
    pub total: u64,
    /// More results are available
    pub more: bool,
    resources: BTreeMap<ResourceKind, Collection<DirectoryObject>>,
}

impl SearchResult {
    /// Objects of a kind, if the response carried that kind.
    #[must_use]
    pub fn resources(&self, kind: ResourceKind) -> Option<&Collection<DirectoryObject>> {
        self.resources.get(&kind)
    }

    /// Kinds present in the response.
    pub fn kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.resources.keys().copied()
    }

    /// Removes and converts the objects of a kind. Absent kinds yield an empty collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResponse`] when an object has another type.
    pub fn take<T>(&mut self, kind: ResourceKind) -> Result<Collection<T>>
    where
        T: TryFrom<DirectoryObject, Error = Error>,
    {
        self.resources
            .remove(&kind)
            .map_or_else(|| Ok(Collection::default()), Collection::typed)
    }
}

/// Token for logging in as another account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegatedAuth {
    /// Auth token
    pub auth_token: String,
    /// Lifetime in milliseconds
    pub lifetime: u64,
}

/// Mailbox of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailboxInfo {
    /// Mailbox id
    pub mbxid: u64,
    /// Account id
    pub account_id: String,
    /// Size in bytes
    pub size: u64,
}

/// Result of an MX record check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MxRecord {
    /// Expected MX entry
    pub entry: Option<String>,
    /// `Ok` or `Failed`
    pub code: Option<String>,
    /// Explanation
    pub message: Option<String>,
}

/// Parsed response.
#[derive(Debug, Clone)]
pub enum Parsed {
    /// One directory object
    Object(DirectoryObject),
    /// Several directory objects
    Collection(Collection<DirectoryObject>),
    /// Directory search results
    Search(SearchResult),
    /// Accounts per class of service
    Count(CountByCos),
    /// Bare response element
    Envelope(Value),
    /// Delegated auth token
    DelegatedAuth(DelegatedAuth),
    /// Mailbox information
    Mailbox(MailboxInfo),
    /// MX record check
    MxRecord(MxRecord),
    /// Success without payload
    Ack,
}

macro_rules! into_variant {
    ($(#[$meta:meta])* $method:ident, $variant:ident, $ty:ty) => {
        $(#[$meta])*
        ///
        /// # Errors
        ///
        /// Returns [`Error::InvalidResponse`] for any other variant.
        pub fn $method(self) -> Result<$ty> {
            match self {
                Self::$variant(value) => Ok(value),
                other => Err(other.mismatch(stringify!($variant))),
            }
        }
    };
}

impl Parsed {
    into_variant!(
        /// Returns the directory object.
        into_object, Object, DirectoryObject
    );
    into_variant!(
        /// Returns the collection.
        into_collection, Collection, Collection<DirectoryObject>
    );
    into_variant!(
        /// Returns the search results.
        into_search, Search, SearchResult
    );
    into_variant!(
        /// Returns the counts.
        into_count, Count, CountByCos
    );
    into_variant!(
        /// Returns the bare response element.
        into_envelope, Envelope, Value
    );
    into_variant!(
        /// Returns the delegated auth token.
        into_delegated_auth, DelegatedAuth, DelegatedAuth
    );
    into_variant!(
        /// Returns the mailbox information.
        into_mailbox, Mailbox, MailboxInfo
    );
    into_variant!(
        /// Returns the MX record check.
        into_mx_record, MxRecord, MxRecord
    );

    /// Returns the directory object as a concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResponse`] for other variants or object types.
    pub fn into_typed<T>(self) -> Result<T>
    where
        T: TryFrom<DirectoryObject, Error = Error>,
    {
        self.into_object()?.try_into()
    }

    /// Returns the collection with a concrete object type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResponse`] for other variants or object types.
    pub fn into_typed_collection<T>(self) -> Result<Collection<T>>
    where
        T: TryFrom<DirectoryObject, Error = Error>,
    {
        self.into_collection()?.typed()
    }

    /// Variant name, for diagnostics.
    #[must_use]
    pub const fn variant_name(&self) -> &'static str {
        match self {
            Self::Object(_) => "Object",
            Self::Collection(_) => "Collection",
            Self::Search(_) => "Search",
            Self::Count(_) => "Count",
            Self::Envelope(_) => "Envelope",
            Self::DelegatedAuth(_) => "DelegatedAuth",
            Self::Mailbox(_) => "Mailbox",
            Self::MxRecord(_) => "MxRecord",
            Self::Ack => "Ack",
        }
    }

    fn mismatch(&self, expected: &str) -> Error {
        Error::InvalidResponse(format!(
            "expected {expected} result, got {}",
            self.variant_name()
        ))
    }
}

/// What parsers need besides the response.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ParseContext<'a> {
    pub(crate) client: &'a ClientRef,
    pub(crate) collection_key: Option<CollectionKey>,
}

impl ResponseParser {
    /// Parses a response to `descriptor`.
    pub(crate) fn parse(
        self,
        response: &SoapResponse,
        descriptor: &RequestDescriptor,
        context: &ParseContext<'_>,
    ) -> Result<Parsed> {
        if let Some(fault) = response.fault() {
            return Err(Error::Fault(ErrorInfo::from_fault(fault)));
        }

        let response_name = descriptor.response_name();
        let element = response.response(&response_name).ok_or_else(|| {
            Error::InvalidResponse(format!("response has no {response_name} element"))
        })?;

        match self {
            Self::Single => {
                let kind = resource_of(descriptor)?;
                let fragment = first_element(element.get(kind.response_name())).ok_or_else(|| {
                    Error::InvalidResponse(format!(
                        "{response_name} has no {} element",
                        kind.response_name()
                    ))
                })?;
                DirectoryObject::from_fragment(kind, fragment, context.client).map(Parsed::Object)
            }
            Self::Collection => {
                let kind = resource_of(descriptor)?;
                collection(kind, element.get(kind.response_name()), context)
                    .map(Parsed::Collection)
            }
            Self::Search => search(element, context).map(Parsed::Search),
            Self::Count => Ok(Parsed::Count(count_by_cos(element.get("cos")))),
            Self::Empty => Ok(Parsed::Envelope(element.clone())),
            Self::DelegatedAuth => Ok(Parsed::DelegatedAuth(DelegatedAuth {
                auth_token: content_of(element.get("authToken")).ok_or_else(|| {
                    Error::InvalidResponse("DelegateAuthResponse has no authToken".to_string())
                })?,
                lifetime: u64_of(element.get("lifetime")).unwrap_or_default(),
            })),
            Self::Mailbox => {
                let mbox = first_element(element.get("mbox")).ok_or_else(|| {
                    Error::InvalidResponse("GetMailboxResponse has no mbox".to_string())
                })?;
                Ok(Parsed::Mailbox(MailboxInfo {
                    mbxid: u64_of(mbox.get("mbxid")).unwrap_or_default(),
                    account_id: content_of(mbox.get("id")).unwrap_or_default(),
                    size: u64_of(mbox.get("s")).unwrap_or_default(),
                }))
            }
            Self::SetPassword => match content_of(element.get("message")) {
                Some(message) if !message.is_empty() => Err(Error::Fault(
                    ErrorInfo::from_transport(500, message),
                )),
                _ => Ok(Parsed::Ack),
            },
            Self::MxRecord => Ok(Parsed::MxRecord(MxRecord {
                entry: content_of(element.get("entry")),
                code: content_of(element.get("code")),
                message: content_of(element.get("message")),
            })),
        }
    }
}

fn resource_of(descriptor: &RequestDescriptor) -> Result<ResourceKind> {
    descriptor.resource().ok_or_else(|| {
        Error::InvalidRequest(format!(
            "{} does not name the resource it returns",
            descriptor.request_name()
        ))
    })
}

fn first_element(node: Option<&Value>) -> Option<&Value> {
    match node? {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

/// Builds the objects of a resource field.
fn collection(
    kind: ResourceKind,
    fragments: Option<&Value>,
    context: &ParseContext<'_>,
) -> Result<Collection<DirectoryObject>> {
    let fragments: &[Value] = match fragments {
        Some(Value::Array(items)) => items,
        Some(single @ Value::Object(_)) => std::slice::from_ref(single),
        _ => &[],
    };

    let objects = fragments
        .iter()
        .map(|fragment| DirectoryObject::from_fragment(kind, fragment, context.client));

    Ok(match context.collection_key {
        None => Collection::List(objects.collect::<Result<_>>()?),
        Some(key) => Collection::Keyed(
            objects
                .map(|object| object.map(|object| (object.key(key).to_string(), object)))
                .collect::<Result<_>>()?,
        ),
    })
}

fn search(element: &Value, context: &ParseContext<'_>) -> Result<SearchResult> {
    let mut result = SearchResult {
        total: u64_of(element.get("searchTotal")).unwrap_or_default(),
        more: element.get("more").and_then(Value::as_bool).unwrap_or(false),
        resources: BTreeMap::new(),
    };
    for kind in ResourceKind::all() {
        if let Some(fragments) = element.get(kind.response_name()) {
            result
                .resources
                .insert(*kind, collection(*kind, Some(fragments), context)?);
        }
    }
    Ok(result)
}

/// `[{name, id, _content: used}]` to `{name: {used, id}}`.
pub(crate) fn count_by_cos(coses: Option<&Value>) -> CountByCos {
    coses
        .and_then(Value::as_array)
        .map(|coses| {
            coses
                .iter()
                .map(|cos| {
                    (
                        content_of(cos.get("name")).unwrap_or_default(),
                        CosCount {
                            used: u64_of(cos.get("_content")).unwrap_or_default(),
                            id: content_of(cos.get("id")).unwrap_or_default(),
                            limit: None,
                        },
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::distribution_list::DistributionList;
    use serde_json::json;

    fn parse_with(
        descriptor: &RequestDescriptor,
        body: Value,
        collection_key: Option<CollectionKey>,
    ) -> Result<Parsed> {
        let client = ClientRef::detached();
        let context = ParseContext {
            client: &client,
            collection_key,
        };
        descriptor
            .parser()
            .parse(&SoapResponse::from_body(body), descriptor, &context)
    }

    fn parse(descriptor: &RequestDescriptor, body: Value) -> Result<Parsed> {
        parse_with(descriptor, body, None)
    }

    #[test]
    fn single_object() {
        let descriptor = RequestDescriptor::get(ResourceKind::Account, "user@example.test");
        let parsed = parse(
            &descriptor,
            json!({"GetAccountResponse": {"account": [{"name": "user@example.test", "id": "a1", "a": []}]}}),
        )
        .unwrap();
        let account: Account = parsed.into_typed().unwrap();
        assert_eq!(account.name, "user@example.test");
        assert_eq!(account.id, "a1");
    }

    #[test]
    fn fault_short_circuits() {
        let descriptor = RequestDescriptor::get(ResourceKind::Account, "nobody@example.test");
        let err = parse(
            &descriptor,
            json!({"Fault": {
                "Code": {"Value": "soap:Sender"},
                "Reason": {"Text": "no such account: nobody@example.test"},
                "Detail": {"Error": {"Code": "account.NO_SUCH_ACCOUNT", "Trace": "t1"}}
            }}),
        )
        .unwrap_err();
        assert_eq!(err.info().unwrap().code(), "account.NO_SUCH_ACCOUNT");
    }

    #[test]
    fn collection_absent_is_empty() {
        let descriptor = RequestDescriptor::get_all(ResourceKind::Cos);
        let parsed = parse(&descriptor, json!({"GetAllCosResponse": {"_jsns": "urn:zimbraAdmin"}}))
            .unwrap();
        let coses = parsed.into_collection().unwrap();
        assert!(coses.is_empty());
        assert!(matches!(coses, Collection::List(_)));
    }

    #[test]
    fn collection_keyed_by_name() {
        let descriptor = RequestDescriptor::get_all(ResourceKind::Domain);
        let parsed = parse_with(
            &descriptor,
            json!({"GetAllDomainsResponse": {"domain": [
                {"name": "a.test", "id": "d1"},
                {"name": "b.test", "id": "d2"}
            ]}}),
            Some(CollectionKey::Name),
        )
        .unwrap();
        let domains = parsed.into_collection().unwrap();
        assert_eq!(domains.len(), 2);
        assert_eq!(domains.get("b.test").unwrap().id(), "d2");
    }

    #[test]
    fn search_omits_absent_types() {
        let descriptor = RequestDescriptor::directory_search(&Default::default());
        let mut result = parse(
            &descriptor,
            json!({"SearchDirectoryResponse": {
                "searchTotal": 2,
                "more": false,
                "account": [{"name": "a@example.test", "id": "a1"}],
                "dl": [{"name": "sales@example.test", "id": "l1"}]
            }}),
        )
        .unwrap()
        .into_search()
        .unwrap();

        assert_eq!(result.total, 2);
        assert!(!result.more);
        assert_eq!(
            result.kinds().collect::<Vec<_>>(),
            vec![ResourceKind::Account, ResourceKind::DistributionList]
        );
        assert!(result.resources(ResourceKind::Domain).is_none());
        let lists: Collection<DistributionList> =
            result.take(ResourceKind::DistributionList).unwrap();
        assert_eq!(lists.into_vec()[0].name, "sales@example.test");
    }

    #[test]
    fn search_without_matches_keeps_totals() {
        let descriptor = RequestDescriptor::directory_search(&Default::default());
        let result = parse(
            &descriptor,
            json!({"SearchDirectoryResponse": {"searchTotal": 0, "more": false}}),
        )
        .unwrap()
        .into_search()
        .unwrap();
        assert_eq!(result.total, 0);
        assert_eq!(result.kinds().count(), 0);
    }

    #[test]
    fn count_by_cos_parsing() {
        let descriptor = RequestDescriptor::count_accounts("example.test");
        let counts = parse(
            &descriptor,
            json!({"CountAccountResponse": {"cos": [
                {"name": "default", "id": "c1", "_content": "5"},
                {"name": "premium", "id": "c2", "_content": 2}
            ]}}),
        )
        .unwrap()
        .into_count()
        .unwrap();
        assert_eq!(counts["default"], CosCount { used: 5, id: "c1".to_string(), limit: None });
        assert_eq!(counts["premium"].used, 2);

        let empty = parse(&descriptor, json!({"CountAccountResponse": {}}))
            .unwrap()
            .into_count()
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn empty_returns_element() {
        let descriptor = RequestDescriptor::remove_by_id(ResourceKind::Domain, "d1");
        let envelope = parse(
            &descriptor,
            json!({"DeleteDomainResponse": {"_jsns": "urn:zimbraAdmin"}}),
        )
        .unwrap()
        .into_envelope()
        .unwrap();
        assert_eq!(envelope["_jsns"], "urn:zimbraAdmin");
    }

    #[test]
    fn missing_response_element_is_invalid() {
        let descriptor = RequestDescriptor::remove_by_id(ResourceKind::Domain, "d1");
        let err = parse(&descriptor, json!({})).unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[test]
    fn delegated_auth() {
        let descriptor = RequestDescriptor::delegate_auth("user@example.test", 3600);
        let auth = parse(
            &descriptor,
            json!({"DelegateAuthResponse": {"authToken": [{"_content": "0_tok"}], "lifetime": 3_600_000}}),
        )
        .unwrap()
        .into_delegated_auth()
        .unwrap();
        assert_eq!(auth.auth_token, "0_tok");
        assert_eq!(auth.lifetime, 3_600_000);
    }

    #[test]
    fn mailbox() {
        let descriptor = RequestDescriptor::get_mailbox("a1");
        let mailbox = parse(
            &descriptor,
            json!({"GetMailboxResponse": {"mbox": [{"mbxid": 12, "id": "a1", "s": 2048}]}}),
        )
        .unwrap()
        .into_mailbox()
        .unwrap();
        assert_eq!(
            mailbox,
            MailboxInfo {
                mbxid: 12,
                account_id: "a1".to_string(),
                size: 2048
            }
        );
    }

    #[test]
    fn set_password_message_is_an_error() {
        let descriptor = RequestDescriptor::set_password("a1", "short");
        let err = parse(
            &descriptor,
            json!({"SetPasswordResponse": {"message": [{"_content": "password too short"}]}}),
        )
        .unwrap_err();
        let info = err.info().unwrap();
        assert_eq!(info.status, 500);
        assert_eq!(info.extra.reason, "password too short");

        let ok = parse(&descriptor, json!({"SetPasswordResponse": {}})).unwrap();
        assert!(matches!(ok, Parsed::Ack));
    }

    #[test]
    fn mx_record() {
        let descriptor = RequestDescriptor::check_domain_mx_record("example.test");
        let record = parse(
            &descriptor,
            json!({"CheckDomainMXRecordResponse": {
                "entry": [{"_content": "10 mx.example.test"}],
                "code": [{"_content": "Failed"}],
                "message": [{"_content": "Domain is configured to use SMTP host"}]
            }}),
        )
        .unwrap()
        .into_mx_record()
        .unwrap();
        assert_eq!(record.entry.as_deref(), Some("10 mx.example.test"));
        assert_eq!(record.code.as_deref(), Some("Failed"));
        assert!(record.message.is_some());
    }

    #[test]
    fn accessor_mismatch() {
        let err = Parsed::Ack.into_object().unwrap_err();
        assert_eq!(
            err,
            Error::InvalidResponse("expected Object result, got Ack".to_string())
        );
    }

    #[test]
    fn collection_try_map_keeps_shape() {
        let keyed: Collection<u32> =
            Collection::Keyed(BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)]));
        let doubled = keyed.try_map(|value| Ok(value * 2)).unwrap();
        assert_eq!(doubled.get("b"), Some(&4));
        assert_eq!(doubled.iter().copied().collect::<Vec<_>>(), vec![2, 4]);
    }
}
