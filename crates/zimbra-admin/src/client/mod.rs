//! The admin client.
//!
//! [`AdminClient`] owns the transport and the session. The first request logs in
//! with the configured credentials; every later request reuses the token. The
//! credentials are dropped as soon as the login call resolves.
//!
//! Resource-specific calls live in the submodules; this module holds the session
//! gate, the dispatcher and the generic verbs.

mod accounts;
mod directory;
mod distribution_lists;
mod domains;
mod rights;

use crate::batch::{BatchDescriptor, BatchResponse};
use crate::envelope::{OnError, SoapRequest};
use crate::object::DirectoryObject;
use crate::parser::{Collection, ParseContext, Parsed};
use crate::request::{RequestDescriptor, RequestDescriptorBuilder};
use crate::transport::{HttpSoapTransport, SoapTransport};
use crate::Result;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use zimbra_core::attrs::AttributeMap;
use zimbra_core::config::{CollectionKey, ZimbraClientConfig};
use zimbra_core::credentials::AdminCredentials;
use zimbra_core::{Error, ResourceKind};

/// Version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug)]
struct Session {
    token: Option<SecretString>,
    credentials: Option<AdminCredentials>,
}

struct ClientInner {
    transport: Arc<dyn SoapTransport>,
    session: Mutex<Session>,
    collection_key: Option<CollectionKey>,
}

/// Asynchronous client for the Zimbra admin SOAP service.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("collection_key", &self.inner.collection_key)
            .finish_non_exhaustive()
    }
}

/// Non-owning handle on an [`AdminClient`], held by directory objects.
#[derive(Clone, Default)]
pub struct ClientRef(Weak<ClientInner>);

impl ClientRef {
    /// A handle that never resolves, for objects built without a client.
    #[must_use]
    pub fn detached() -> Self {
        Self(Weak::new())
    }

    /// Returns the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] when the client has been dropped.
    pub fn upgrade(&self) -> Result<AdminClient> {
        self.0
            .upgrade()
            .map(|inner| AdminClient { inner })
            .ok_or_else(|| Error::InvalidRequest("admin client is no longer available".to_string()))
    }
}

impl std::fmt::Debug for ClientRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ClientRef")
            .field(&(self.0.strong_count() > 0))
            .finish()
    }
}

impl AdminClient {
    /// Construct a client talking JSON SOAP over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] for an invalid configuration or HTTP client.
    pub fn new(config: &ZimbraClientConfig) -> Result<Self> {
        config.validate_config()?;
        let transport = HttpSoapTransport::from_config(config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Construct a client on top of an existing transport.
    pub fn with_transport(config: &ZimbraClientConfig, transport: Arc<dyn SoapTransport>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                session: Mutex::new(Session {
                    token: None,
                    credentials: Some(config.credentials()),
                }),
                collection_key: config.collection_key(),
            }),
        }
    }

    /// Library version.
    #[must_use]
    pub const fn version(&self) -> &'static str {
        VERSION
    }

    /// Handle for directory objects.
    #[must_use]
    pub fn downgrade(&self) -> ClientRef {
        ClientRef(Arc::downgrade(&self.inner))
    }

    /// Returns true once a login succeeded.
    pub async fn has_token(&self) -> bool {
        self.inner.session.lock().await.token.is_some()
    }

    /// Logs in unless a token is already held.
    ///
    /// # Errors
    ///
    /// Returns the login error, or [`Error::AuthenticationRequired`] when an earlier
    /// login consumed the credentials without producing a token.
    pub async fn login(&self) -> Result<()> {
        self.token().await.map(drop)
    }

    async fn token(&self) -> Result<String> {
        let mut session = self.inner.session.lock().await;
        if let Some(token) = &session.token {
            return Ok(token.expose_secret().to_owned());
        }

        let credentials = session.credentials.take().ok_or_else(|| {
            Error::AuthenticationRequired(
                "credentials were consumed by an earlier login attempt".to_string(),
            )
        })?;

        info!(user = credentials.user(), "Logging in to admin service");
        let auth = self.inner.transport.auth(&credentials).await;
        drop(credentials);

        match auth {
            Ok(auth) => {
                debug!(lifetime = ?auth.lifetime, "Admin session established");
                let token = auth.token.expose_secret().to_owned();
                session.token = Some(auth.token);
                Ok(token)
            }
            Err(err) => {
                warn!(error = %err, "Admin login failed");
                Err(err)
            }
        }
    }

    /// Starts a custom request descriptor (`request_name` without the `Request` suffix).
    pub fn build_request_data(&self, request_name: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptor::builder(request_name)
    }

    /// Dispatches one request and parses the answer.
    ///
    /// # Errors
    ///
    /// Returns login, transport and fault errors, and parser errors for unexpected
    /// response shapes.
    pub async fn perform_request(&self, descriptor: &RequestDescriptor) -> Result<Parsed> {
        let mut envelope = SoapRequest::single();
        envelope.add_request(
            descriptor.element_name(),
            descriptor.namespace(),
            descriptor.params().clone(),
        )?;

        let token = self.token().await?;
        debug!(
            request = descriptor.request_name(),
            namespace = descriptor.namespace().urn(),
            "Dispatching admin request"
        );
        let response = self.inner.transport.send(&envelope, &token).await?;

        let client = self.downgrade();
        let context = self.parse_context(&client);
        let parsed = descriptor.parser().parse(&response, descriptor, &context);
        if let Err(err) = &parsed {
            if err.should_log() {
                warn!(request = descriptor.request_name(), error = %err, "Admin request failed");
            } else {
                debug!(request = descriptor.request_name(), error = %err, "Admin request returned an error");
            }
        }
        parsed
    }

    /// Dispatches a batch in one round trip.
    ///
    /// An empty batch returns `Ok(None)` without logging in or sending anything.
    ///
    /// # Errors
    ///
    /// Returns login and transport errors, and a fault covering the whole batch.
    /// Faults of single requests are listed in [`BatchResponse::errors`].
    pub async fn perform_batch(&self, batch: BatchDescriptor) -> Result<Option<BatchResponse>> {
        if batch.is_empty() {
            debug!("Skipping empty batch");
            return Ok(None);
        }
        let envelope = batch.to_soap_request()?;

        let token = self.token().await?;
        info!(size = batch.len(), on_error = batch.on_error().as_str(), "Dispatching admin batch");
        let response = self.inner.transport.send(&envelope, &token).await?;

        let client = self.downgrade();
        let context = self.parse_context(&client);
        let parsed = BatchResponse::parse(&response, &batch, &context)?;
        if !parsed.errors.is_empty() {
            warn!(
                size = batch.len(),
                faults = parsed.errors.len(),
                "Admin batch completed with faults"
            );
        }
        Ok(Some(parsed))
    }

    /// Dispatches requests as one batch with an explicit on-error policy.
    ///
    /// # Errors
    ///
    /// See [`AdminClient::perform_batch`].
    pub async fn make_batch_request(
        &self,
        requests: Vec<RequestDescriptor>,
        on_error: OnError,
    ) -> Result<Option<BatchResponse>> {
        let batch = requests
            .into_iter()
            .collect::<BatchDescriptor>()
            .with_on_error(on_error);
        self.perform_batch(batch).await
    }

    fn parse_context<'a>(&self, client: &'a ClientRef) -> ParseContext<'a> {
        ParseContext {
            client,
            collection_key: self.inner.collection_key,
        }
    }

    async fn perform_ack(&self, descriptor: &RequestDescriptor) -> Result<Value> {
        self.perform_request(descriptor).await?.into_envelope()
    }

    // Generic verbs

    /// Fetches an entry by id or name.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get(&self, kind: ResourceKind, identifier: &str) -> Result<DirectoryObject> {
        self.perform_request(&RequestDescriptor::get(kind, identifier))
            .await?
            .into_object()
    }

    /// Fetches every entry of a kind.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_all(&self, kind: ResourceKind) -> Result<Collection<DirectoryObject>> {
        self.perform_request(&RequestDescriptor::get_all(kind))
            .await?
            .into_collection()
    }

    /// Creates an entry.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn create(
        &self,
        kind: ResourceKind,
        name: &str,
        attrs: &AttributeMap,
    ) -> Result<DirectoryObject> {
        self.perform_request(&RequestDescriptor::create_named(kind, name, attrs))
            .await?
            .into_object()
    }

    /// Modifies the attributes of an entry.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn modify(
        &self,
        kind: ResourceKind,
        id: &str,
        attrs: &AttributeMap,
    ) -> Result<DirectoryObject> {
        self.perform_request(&RequestDescriptor::modify_attrs(kind, id, attrs))
            .await?
            .into_object()
    }

    /// Deletes an entry by id and returns the acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn remove(&self, kind: ResourceKind, id: &str) -> Result<Value> {
        self.perform_ack(&RequestDescriptor::remove_by_id(kind, id))
            .await
    }

    /// Renames an entry.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn rename(
        &self,
        kind: ResourceKind,
        id: &str,
        new_name: &str,
    ) -> Result<DirectoryObject> {
        self.perform_request(&RequestDescriptor::rename_to(kind, id, new_name))
            .await?
            .into_object()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::object::DirectoryEntry;
    use crate::test_support::{auth_ok, client_with, config, respond, TOKEN};
    use crate::transport::MockSoapTransport;
    use serde_json::json;
    use zimbra_core::ErrorInfo;

    #[tokio::test]
    async fn gate_logs_in_once() {
        let mut transport = MockSoapTransport::new();
        transport
            .expect_auth()
            .times(1)
            .withf(|credentials| credentials.user() == "admin@example.test")
            .returning(|_| auth_ok());
        transport
            .expect_send()
            .times(2)
            .withf(|_, token| token == TOKEN)
            .returning(|_, _| respond(json!({"GetInfoResponse": {"name": "admin@example.test"}})));

        let client = client_with(transport);
        assert!(!client.has_token().await);
        client.get_info().await.unwrap();
        client.get_info().await.unwrap();
        assert!(client.has_token().await);
    }

    #[tokio::test]
    async fn concurrent_first_calls_share_one_login() {
        let mut transport = MockSoapTransport::new();
        transport.expect_auth().times(1).returning(|_| auth_ok());
        transport
            .expect_send()
            .times(2)
            .returning(|_, _| respond(json!({"GetInfoResponse": {}})));

        let client = client_with(transport);
        let (first, second) = tokio::join!(client.get_info(), client.get_info());
        first.unwrap();
        second.unwrap();
    }

    #[tokio::test]
    async fn login_failure_is_not_dispatched() {
        let mut transport = MockSoapTransport::new();
        transport.expect_auth().times(1).returning(|_| {
            Err(Error::Fault(ErrorInfo::from_fault(&json!({
                "Reason": {"Text": "authentication failed for [admin@example.test]"},
                "Detail": {"Error": {"Code": "account.AUTH_FAILED"}}
            }))))
        });
        transport.expect_send().never();

        let client = client_with(transport);
        let err = client.get_info().await.unwrap_err();
        assert_eq!(err.info().unwrap().code(), "account.AUTH_FAILED");

        let err = client.get_info().await.unwrap_err();
        assert!(matches!(err, Error::AuthenticationRequired(_)));
        assert!(!client.has_token().await);
    }

    #[tokio::test]
    async fn explicit_login_is_idempotent() {
        let mut transport = MockSoapTransport::new();
        transport.expect_auth().times(1).returning(|_| auth_ok());
        transport.expect_send().never();

        let client = client_with(transport);
        client.login().await.unwrap();
        client.login().await.unwrap();
        assert!(client.has_token().await);
    }

    #[tokio::test]
    async fn empty_batch_touches_nothing() {
        let mut transport = MockSoapTransport::new();
        transport.expect_auth().never();
        transport.expect_send().never();

        let client = client_with(transport);
        let response = client
            .make_batch_request(Vec::new(), OnError::Continue)
            .await
            .unwrap();
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn batch_with_fault_in_second_request() {
        let mut transport = MockSoapTransport::new();
        transport.expect_auth().times(1).returning(|_| auth_ok());
        transport
            .expect_send()
            .times(1)
            .withf(|request, _| {
                request.options().is_batch && request.body()["BatchRequest"]["onerror"] == "continue"
            })
            .return_once(|_, _| {
                respond(json!({"BatchResponse": {
                    "GetDomainResponse": [
                        {"requestId": "1", "domain": [{"name": "a.test", "id": "d1"}]},
                        {"requestId": "3", "domain": [{"name": "c.test", "id": "d3"}]}
                    ],
                    "Fault": [{
                        "requestId": "2",
                        "Reason": {"Text": "no such domain: b.test"},
                        "Detail": {"Error": {"Code": "account.NO_SUCH_DOMAIN"}}
                    }]
                }}))
            });

        let client = client_with(transport);
        let requests = ["a.test", "b.test", "c.test"]
            .into_iter()
            .map(|name| RequestDescriptor::get(ResourceKind::Domain, name))
            .collect();
        let response = client
            .make_batch_request(requests, OnError::Continue)
            .await
            .unwrap()
            .unwrap();

        let ids: Vec<u32> = response.responses.iter().map(|entry| entry.request_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].request_id, Some(2));
        assert_eq!(response.errors[0].error.code(), "account.NO_SUCH_DOMAIN");

        let domain: Domain = response.get(3).cloned().unwrap().into_typed().unwrap();
        assert_eq!(domain.name, "c.test");
        assert!(domain.client_ref().upgrade().is_ok());
    }

    #[tokio::test]
    async fn objects_call_back_through_the_client() {
        let mut transport = MockSoapTransport::new();
        transport.expect_auth().times(1).returning(|_| auth_ok());
        let mut sequence = mockall::Sequence::new();
        transport
            .expect_send()
            .times(1)
            .in_sequence(&mut sequence)
            .return_once(|_, _| {
                respond(json!({"GetAccountResponse": {"account": [{"name": "user@example.test", "id": "a1"}]}}))
            });
        transport
            .expect_send()
            .times(1)
            .in_sequence(&mut sequence)
            .withf(|request, _| request.body()["GetMailboxRequest"]["mbox"]["id"] == "a1")
            .return_once(|_, _| {
                respond(json!({"GetMailboxResponse": {"mbox": [{"mbxid": 3, "id": "a1"}]}}))
            });

        let client = client_with(transport);
        let account = client.get_account("user@example.test").await.unwrap();
        assert_eq!(account.mailbox_size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn dropped_client_detaches_objects() {
        let mut transport = MockSoapTransport::new();
        transport.expect_auth().times(1).returning(|_| auth_ok());
        transport.expect_send().times(1).return_once(|_, _| {
            respond(json!({"GetCosResponse": {"cos": [{"name": "default", "id": "c1"}]}}))
        });

        let client = client_with(transport);
        let cos = client.get_cos("default").await.unwrap();
        drop(client);
        assert!(cos.client_ref().upgrade().is_err());
    }

    #[tokio::test]
    async fn keyed_collections_follow_configuration() {
        let mut transport = MockSoapTransport::new();
        transport.expect_auth().times(1).returning(|_| auth_ok());
        transport.expect_send().times(1).return_once(|_, _| {
            respond(json!({"GetAllCosResponse": {"cos": [
                {"name": "default", "id": "c1"},
                {"name": "premium", "id": "c2"}
            ]}}))
        });

        let config = config().with_array_as_object(CollectionKey::Name);
        let client = AdminClient::with_transport(&config, Arc::new(transport));
        let coses = client.get_all_cos().await.unwrap();
        assert_eq!(coses.get("premium").unwrap().id, "c2");
    }

    #[test]
    fn version_is_crate_version() {
        let client = client_with(MockSoapTransport::new());
        assert_eq!(client.version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn build_request_data_starts_admin_descriptor() {
        let client = client_with(MockSoapTransport::new());
        let descriptor = client
            .build_request_data("GetServer")
            .with_param("server", json!({"by": "name", "_content": "mail.example.test"}))
            .build();
        assert_eq!(descriptor.element_name(), "GetServerRequest");
    }
}
