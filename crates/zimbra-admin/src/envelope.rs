//! JSON SOAP envelopes.
//!
//! A [`SoapRequest`] holds one request, or several when it is a batch, and renders
//! the `{"Header": .., "Body": ..}` document the admin service expects. A
//! [`SoapResponse`] wraps the `Body` of the answer.

use crate::Result;
use serde_json::{json, Map, Value};
use zimbra_core::Error;

/// XML namespaces used by the admin client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// `urn:zimbra`, used by headers and batch wrappers
    Zimbra,
    /// `urn:zimbraAdmin`
    Admin,
    /// `urn:zimbraAccount`
    Account,
}

impl Namespace {
    /// Returns the namespace URN.
    #[must_use]
    pub const fn urn(self) -> &'static str {
        match self {
            Self::Zimbra => "urn:zimbra",
            Self::Admin => "urn:zimbraAdmin",
            Self::Account => "urn:zimbraAccount",
        }
    }
}

/// What the service does with the rest of a batch once one request faults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnError {
    /// Skip the remaining requests
    #[default]
    Stop,
    /// Keep executing the remaining requests
    Continue,
}

impl OnError {
    /// Returns the wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Continue => "continue",
        }
    }
}

/// Options fixed when the envelope is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Wrap the requests in a `BatchRequest`
    pub is_batch: bool,
    /// On-error policy of the batch
    pub batch_on_error: OnError,
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    request_id: u32,
    element: String,
    namespace: Namespace,
    params: Map<String, Value>,
}

impl Entry {
    fn render(&self) -> Map<String, Value> {
        let mut element = Map::new();
        element.insert("_jsns".to_string(), json!(self.namespace.urn()));
        element.extend(self.params.clone());
        element
    }
}

/// Outgoing SOAP envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapRequest {
    options: RequestOptions,
    entries: Vec<Entry>,
}

impl SoapRequest {
    /// Creates an empty envelope.
    #[must_use]
    pub const fn new(options: RequestOptions) -> Self {
        Self {
            options,
            entries: Vec::new(),
        }
    }

    /// Creates an envelope for one request.
    #[must_use]
    pub const fn single() -> Self {
        Self::new(RequestOptions {
            is_batch: false,
            batch_on_error: OnError::Stop,
        })
    }

    /// Creates a batch envelope.
    #[must_use]
    pub const fn batch(on_error: OnError) -> Self {
        Self::new(RequestOptions {
            is_batch: true,
            batch_on_error: on_error,
        })
    }

    /// Returns the envelope options.
    #[must_use]
    pub const fn options(&self) -> RequestOptions {
        self.options
    }

    /// Adds a request and returns its 1-based request id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] when a second request is added to a
    /// non-batch envelope.
    pub fn add_request(
        &mut self,
        element: impl Into<String>,
        namespace: Namespace,
        params: Map<String, Value>,
    ) -> Result<u32> {
        if !self.options.is_batch && !self.entries.is_empty() {
            return Err(Error::InvalidRequest(
                "a non-batch envelope carries exactly one request".to_string(),
            ));
        }
        let request_id = u32::try_from(self.entries.len() + 1)
            .map_err(|_| Error::InvalidRequest("too many requests in one batch".to_string()))?;
        self.entries.push(Entry {
            request_id,
            element: element.into(),
            namespace,
            params,
        });
        Ok(request_id)
    }

    /// Number of requests in the envelope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no request was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Element names in request-id order (`GetAccountRequest`, ...).
    #[must_use]
    pub fn request_names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.element.as_str()).collect()
    }

    /// Renders the `Body` of the envelope.
    #[must_use]
    pub fn body(&self) -> Value {
        let mut body = Map::new();
        if self.options.is_batch {
            let mut batch = Map::new();
            batch.insert("_jsns".to_string(), json!(Namespace::Zimbra.urn()));
            batch.insert(
                "onerror".to_string(),
                json!(self.options.batch_on_error.as_str()),
            );
            for entry in &self.entries {
                let mut element = entry.render();
                element.insert("requestId".to_string(), json!(entry.request_id.to_string()));
                if let Value::Array(items) = batch
                    .entry(entry.element.clone())
                    .or_insert_with(|| Value::Array(Vec::new()))
                {
                    items.push(Value::Object(element));
                }
            }
            body.insert("BatchRequest".to_string(), Value::Object(batch));
        } else if let Some(entry) = self.entries.first() {
            body.insert(entry.element.clone(), Value::Object(entry.render()));
        }
        Value::Object(body)
    }

    /// Renders the whole document, with the auth token in the header when given.
    #[must_use]
    pub fn to_envelope(&self, token: Option<&str>) -> Value {
        json!({
            "Header": header(token),
            "Body": self.body(),
        })
    }
}

/// Renders the SOAP header context.
#[must_use]
pub fn header(token: Option<&str>) -> Value {
    let mut context = Map::new();
    context.insert("_jsns".to_string(), json!(Namespace::Zimbra.urn()));
    if let Some(token) = token {
        context.insert("authToken".to_string(), json!({ "_content": token }));
    }
    context.insert("format".to_string(), json!({ "type": "js" }));
    json!({ "context": context })
}

/// Incoming SOAP envelope body.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapResponse {
    body: Value,
}

impl SoapResponse {
    /// Wraps an already extracted body.
    #[must_use]
    pub const fn from_body(body: Value) -> Self {
        Self { body }
    }

    /// Extracts the `Body` of a full document. Documents without one are taken as the body.
    #[must_use]
    pub fn from_envelope(envelope: Value) -> Self {
        match envelope {
            Value::Object(mut document) => match document.remove("Body") {
                Some(body) => Self { body },
                None => Self {
                    body: Value::Object(document),
                },
            },
            other => Self { body: other },
        }
    }

    /// Returns the body.
    #[must_use]
    pub const fn get(&self) -> &Value {
        &self.body
    }

    /// Consumes the response, returning the body.
    #[must_use]
    pub fn into_body(self) -> Value {
        self.body
    }

    /// Returns the named response element (`GetAccountResponse`).
    #[must_use]
    pub fn response(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    /// Returns the fault, if the service answered with one.
    #[must_use]
    pub fn fault(&self) -> Option<&Value> {
        self.body.get("Fault")
    }

    /// Returns the `BatchResponse` element.
    #[must_use]
    pub fn batch_response(&self) -> Option<&Value> {
        self.body.get("BatchResponse")
    }
}
