//! Batch requests.
//!
//! A [`BatchDescriptor`] groups unsent descriptors into one `BatchRequest` round
//! trip. Request ids are 1-based submission positions; the service groups answers by
//! response name and lists faults separately, so results are re-associated by id.

use crate::envelope::{OnError, SoapRequest, SoapResponse};
use crate::parser::{ParseContext, Parsed};
use crate::request::RequestDescriptor;
use crate::Result;
use serde_json::{Map, Value};
use tracing::warn;
use zimbra_core::{Error, ErrorInfo};

/// Requests sent together.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct BatchDescriptor {
    requests: Vec<RequestDescriptor>,
    on_error: OnError,
}

impl BatchDescriptor {
    /// Creates an empty batch with an on-error policy.
    pub const fn new(on_error: OnError) -> Self {
        Self {
            requests: Vec::new(),
            on_error,
        }
    }

    /// Set the on-error policy.
    pub const fn with_on_error(mut self, on_error: OnError) -> Self {
        self.on_error = on_error;
        self
    }

    /// Adds a request, builder style.
    pub fn with_request(mut self, request: RequestDescriptor) -> Self {
        self.requests.push(request);
        self
    }

    /// Adds a request and returns its request id.
    pub fn push(&mut self, request: RequestDescriptor) -> u32 {
        self.requests.push(request);
        u32::try_from(self.requests.len()).unwrap_or(u32::MAX)
    }

    /// Requests in submission order.
    #[must_use]
    pub fn requests(&self) -> &[RequestDescriptor] {
        &self.requests
    }

    /// On-error policy.
    #[must_use]
    pub const fn on_error(&self) -> OnError {
        self.on_error
    }

    /// Number of requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns true when the batch holds no request.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Request with a given id.
    #[must_use]
    pub fn request(&self, request_id: u32) -> Option<&RequestDescriptor> {
        let index = usize::try_from(request_id).ok()?.checked_sub(1)?;
        self.requests.get(index)
    }

    /// Builds the batch envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] when the batch is too large to number.
    pub fn to_soap_request(&self) -> Result<SoapRequest> {
        let mut envelope = SoapRequest::batch(self.on_error);
        for request in &self.requests {
            envelope.add_request(
                request.element_name(),
                request.namespace(),
                request.params().clone(),
            )?;
        }
        Ok(envelope)
    }
}

impl FromIterator<RequestDescriptor> for BatchDescriptor {
    fn from_iter<I: IntoIterator<Item = RequestDescriptor>>(iter: I) -> Self {
        Self {
            requests: iter.into_iter().collect(),
            on_error: OnError::default(),
        }
    }
}

/// A successful request of a batch.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    /// 1-based request id
    pub request_id: u32,
    /// Request name (`CountAccount`)
    pub request_name: String,
    /// Parsed result
    pub result: Parsed,
}

/// A failed request of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFault {
    /// 1-based request id, when the service reported one
    pub request_id: Option<u32>,
    /// Request name, when the id matched a request
    pub request_name: Option<String>,
    /// Normalized error
    pub error: ErrorInfo,
}

/// Aggregate result of a batch.
#[derive(Debug, Clone)]
pub struct BatchResponse {
    /// Successful requests, by request id
    pub responses: Vec<BatchEntry>,
    /// Failed requests, by request id
    pub errors: Vec<BatchFault>,
    /// The `BatchResponse` element as received
    pub raw: Value,
}

impl BatchResponse {
    /// Returns true when no request failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Result of a request.
    #[must_use]
    pub fn get(&self, request_id: u32) -> Option<&Parsed> {
        self.responses
            .iter()
            .find(|entry| entry.request_id == request_id)
            .map(|entry| &entry.result)
    }

    /// Error of a request.
    #[must_use]
    pub fn error(&self, request_id: u32) -> Option<&ErrorInfo> {
        self.errors
            .iter()
            .find(|fault| fault.request_id == Some(request_id))
            .map(|fault| &fault.error)
    }

    /// Results indexed by `request id - 1`; failed or skipped requests are `None`.
    #[must_use]
    pub fn into_results(self, len: usize) -> Vec<Option<Parsed>> {
        let mut results = vec![None; len];
        for entry in self.responses {
            let index = usize::try_from(entry.request_id)
                .ok()
                .and_then(|id| id.checked_sub(1));
            if let Some(slot) = index.and_then(|index| results.get_mut(index)) {
                *slot = Some(entry.result);
            }
        }
        results
    }

    /// Splits a batch answer into results and faults.
    pub(crate) fn parse(
        response: &SoapResponse,
        batch: &BatchDescriptor,
        context: &ParseContext<'_>,
    ) -> Result<Self> {
        if let Some(fault) = response.fault() {
            return Err(Error::Fault(ErrorInfo::from_fault(fault)));
        }
        let raw = response
            .batch_response()
            .ok_or_else(|| Error::InvalidResponse("response has no BatchResponse element".to_string()))?;
        let elements = raw.as_object().cloned().unwrap_or_default();

        let mut responses = Vec::new();
        let mut errors = Vec::new();

        for (element, items) in &elements {
            if element == "_jsns" {
                continue;
            }
            let items = match items {
                Value::Array(items) => items.as_slice(),
                single => std::slice::from_ref(single),
            };

            if element == "Fault" {
                errors.extend(items.iter().map(|fault| {
                    let request_id = request_id_of(fault);
                    BatchFault {
                        request_id,
                        request_name: request_id
                            .and_then(|id| batch.request(id))
                            .map(|request| request.request_name().to_string()),
                        error: ErrorInfo::from_fault(fault),
                    }
                }));
                continue;
            }

            for item in items {
                let request_id = request_id_of(item);
                let matched = request_id.and_then(|id| batch.request(id).map(|request| (id, request)));
                let Some((request_id, request)) = matched else {
                    warn!(element = %element, ?request_id, "Batch response does not match a request");
                    errors.push(BatchFault {
                        request_id,
                        request_name: None,
                        error: ErrorInfo::from_error(&Error::InvalidResponse(format!(
                            "{element} does not match a request of the batch"
                        ))),
                    });
                    continue;
                };
                let mut body = Map::new();
                body.insert(element.clone(), item.clone());
                let single = SoapResponse::from_body(Value::Object(body));
                match request.parser().parse(&single, request, context) {
                    Ok(result) => responses.push(BatchEntry {
                        request_id,
                        request_name: request.request_name().to_string(),
                        result,
                    }),
                    Err(err) => errors.push(BatchFault {
                        request_id: Some(request_id),
                        request_name: Some(request.request_name().to_string()),
                        error: ErrorInfo::from_error(&err),
                    }),
                }
            }
        }

        responses.sort_by_key(|entry| entry.request_id);
        errors.sort_by_key(|fault| fault.request_id);

        Ok(Self {
            responses,
            errors,
            raw: raw.clone(),
        })
    }
}

fn request_id_of(item: &Value) -> Option<u32> {
    match item.get("requestId")? {
        Value::String(id) => id.parse().ok(),
        Value::Number(id) => id.as_u64().and_then(|id| u32::try_from(id).ok()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientRef;
    use serde_json::json;
    use zimbra_core::ResourceKind;

    fn count_batch() -> BatchDescriptor {
        ["a.test", "b.test", "c.test"]
            .into_iter()
            .map(RequestDescriptor::count_accounts)
            .collect::<BatchDescriptor>()
            .with_on_error(OnError::Continue)
    }

    fn parse(body: Value, batch: &BatchDescriptor) -> Result<BatchResponse> {
        let client = ClientRef::detached();
        let context = ParseContext {
            client: &client,
            collection_key: None,
        };
        BatchResponse::parse(&SoapResponse::from_body(body), batch, &context)
    }

    #[test]
    fn envelope_numbers_requests() {
        let envelope = count_batch().to_soap_request().unwrap();
        let body = envelope.body();
        assert_eq!(body["BatchRequest"]["onerror"], "continue");
        let requests = body["BatchRequest"]["CountAccountRequest"].as_array().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2]["requestId"], "3");
        assert_eq!(requests[2]["domain"]["_content"], "c.test");
    }

    #[test]
    fn fault_in_the_middle_is_aggregated() {
        let batch = count_batch();
        let response = parse(
            json!({"BatchResponse": {
                "_jsns": "urn:zimbra",
                "CountAccountResponse": [
                    {"requestId": "3", "cos": [{"name": "default", "id": "c1", "_content": "1"}]},
                    {"requestId": "1", "cos": []}
                ],
                "Fault": [{
                    "requestId": "2",
                    "Code": {"Value": "soap:Sender"},
                    "Reason": {"Text": "no such domain: b.test"},
                    "Detail": {"Error": {"Code": "account.NO_SUCH_DOMAIN"}}
                }]
            }}),
            &batch,
        )
        .unwrap();

        assert_eq!(
            response
                .responses
                .iter()
                .map(|entry| entry.request_id)
                .collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(response.errors.len(), 1);
        let fault = &response.errors[0];
        assert_eq!(fault.request_id, Some(2));
        assert_eq!(fault.request_name.as_deref(), Some("CountAccount"));
        assert_eq!(fault.error.code(), "account.NO_SUCH_DOMAIN");
        assert!(!response.is_success());

        let counts = response.get(3).cloned().unwrap().into_count().unwrap();
        assert_eq!(counts["default"].used, 1);
        assert_eq!(response.error(2).unwrap().title, "no such domain: b.test");

        let results = response.into_results(3);
        assert!(results[0].is_some());
        assert!(results[1].is_none());
        assert!(results[2].is_some());
    }

    #[test]
    fn mixed_request_names() {
        let batch = BatchDescriptor::new(OnError::Stop)
            .with_request(RequestDescriptor::get(ResourceKind::Domain, "example.test"))
            .with_request(RequestDescriptor::remove_by_id(ResourceKind::Account, "a1"));
        let response = parse(
            json!({"BatchResponse": {
                "DeleteAccountResponse": [{"requestId": "2", "_jsns": "urn:zimbraAdmin"}],
                "GetDomainResponse": [{"requestId": "1", "domain": [{"name": "example.test", "id": "d1"}]}]
            }}),
            &batch,
        )
        .unwrap();
        assert!(response.is_success());
        assert_eq!(response.responses[0].request_name, "GetDomain");
        assert_eq!(response.get(1).cloned().unwrap().into_object().unwrap().id(), "d1");
        assert!(matches!(response.get(2), Some(Parsed::Envelope(_))));
    }

    #[test]
    fn unknown_request_id_is_reported() {
        let batch = count_batch();
        let response = parse(
            json!({"BatchResponse": {"CountAccountResponse": [{"requestId": "9"}]}}),
            &batch,
        )
        .unwrap();
        assert!(response.responses.is_empty());
        assert_eq!(response.errors[0].request_id, Some(9));
        assert_eq!(response.errors[0].error.code(), "INVALID_RESPONSE");
    }

    #[test]
    fn whole_batch_fault() {
        let err = parse(
            json!({"Fault": {"Reason": {"Text": "auth credentials have expired"},
                             "Detail": {"Error": {"Code": "service.AUTH_EXPIRED"}}}}),
            &count_batch(),
        )
        .unwrap_err();
        assert_eq!(err.info().unwrap().code(), "service.AUTH_EXPIRED");
    }

    #[test]
    fn request_lookup_is_one_based() {
        let batch = count_batch();
        assert!(batch.request(0).is_none());
        assert_eq!(batch.request(1).unwrap().params()["domain"]["_content"], "a.test");
        assert!(batch.request(4).is_none());
    }
}
