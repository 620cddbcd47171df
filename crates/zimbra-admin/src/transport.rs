//! SOAP transport.
//!
//! [`SoapTransport`] is the seam between the client and the wire: it authenticates
//! and sends envelopes. [`HttpSoapTransport`] posts JSON SOAP documents with
//! `reqwest`; tests substitute `MockSoapTransport`.

use crate::envelope::{header, SoapRequest, SoapResponse};
use crate::object::{content_of, u64_of};
use crate::Result;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::SecretString;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;
use zimbra_core::config::ZimbraClientConfig;
use zimbra_core::credentials::AdminCredentials;
use zimbra_core::http::HttpSettings;
use zimbra_core::{Error, ErrorInfo};

/// Token returned by a successful login.
#[derive(Debug)]
pub struct AuthResponse {
    /// Session token
    pub token: SecretString,
    /// Token lifetime in milliseconds, when reported
    pub lifetime: Option<u64>,
}

/// Sends envelopes to the admin service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SoapTransport: Send + Sync {
    /// Logs in with admin credentials.
    async fn auth(&self, credentials: &AdminCredentials) -> Result<AuthResponse>;

    /// Sends an envelope with the session token and returns the response body.
    ///
    /// SOAP faults are returned as responses, not errors.
    async fn send(&self, request: &SoapRequest, token: &str) -> Result<SoapResponse>;
}

/// Builder for [`HttpSoapTransport`].
#[derive(Debug, Clone)]
pub struct HttpSoapTransportBuilder {
    endpoint: Url,
    tls_verify: bool,
    tls_ca_cert: Option<std::path::PathBuf>,
    http: HttpSettings,
}

impl HttpSoapTransportBuilder {
    /// Create a builder from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the service URL does not parse.
    pub fn new(config: &ZimbraClientConfig) -> Result<Self> {
        Ok(Self {
            endpoint: config.parse_url()?,
            tls_verify: config.tls_verify,
            tls_ca_cert: config.tls_ca_cert.clone(),
            http: HttpSettings::new(config.timeout()),
        })
    }

    /// Override the HTTP settings.
    #[must_use]
    pub fn with_http_settings(mut self, http: HttpSettings) -> Self {
        self.http = http;
        self
    }

    /// Finalise the builder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the CA certificate cannot be loaded or the
    /// HTTP client cannot be built.
    pub fn build(self) -> Result<HttpSoapTransport> {
        let http = self.http;

        let mut builder = ClientBuilder::new()
            .user_agent(http.user_agent)
            .timeout(http.timeout)
            .connect_timeout(http.connect_timeout)
            .pool_idle_timeout(http.pool_idle_timeout)
            .pool_max_idle_per_host(http.pool_max_idle_per_host)
            .gzip(http.gzip);

        if !self.tls_verify {
            warn!(endpoint = %self.endpoint, "TLS verification disabled for admin SOAP transport");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &self.tls_ca_cert {
            debug!("loading admin CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::ConfigError(format!(
                    "Failed to read admin CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes)
                .map_err(|err| Error::ConfigError(format!("Invalid admin CA certificate: {err}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder.build().map_err(|err| {
            Error::ConfigError(format!("Failed to build admin HTTP client: {err}"))
        })?;

        Ok(HttpSoapTransport {
            http,
            endpoint: self.endpoint,
        })
    }
}

/// JSON SOAP over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSoapTransport {
    http: Client,
    endpoint: Url,
}

impl HttpSoapTransport {
    /// Construct a transport directly from the configuration.
    ///
    /// # Errors
    ///
    /// See [`HttpSoapTransportBuilder::build`].
    pub fn from_config(config: &ZimbraClientConfig) -> Result<Self> {
        HttpSoapTransportBuilder::new(config)?.build()
    }

    /// Start a builder pre-populated with the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the service URL does not parse.
    pub fn builder(config: &ZimbraClientConfig) -> Result<HttpSoapTransportBuilder> {
        HttpSoapTransportBuilder::new(config)
    }

    /// Service endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post(&self, envelope: &Value) -> Result<SoapResponse> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(envelope)
            .send()
            .await?;
        let status = response.status();

        if status.is_success() {
            let document = response.json::<Value>().await.map_err(|err| {
                Error::InvalidResponse(format!("Failed to parse admin response: {err}"))
            })?;
            return Ok(SoapResponse::from_envelope(document));
        }

        let text = response.text().await.unwrap_or_default();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            if let Ok(document) = serde_json::from_str::<Value>(&text) {
                let response = SoapResponse::from_envelope(document);
                if response.fault().is_some() {
                    return Ok(response);
                }
            }
        }

        warn!(status = status.as_u16(), endpoint = %self.endpoint, "Admin service returned an error status");
        Err(Error::Transport(ErrorInfo::from_transport(
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown error"),
        )))
    }
}

#[async_trait]
impl SoapTransport for HttpSoapTransport {
    async fn auth(&self, credentials: &AdminCredentials) -> Result<AuthResponse> {
        info!(user = credentials.user(), "Authenticating with admin service");
        let envelope = json!({
            "Header": header(None),
            "Body": { "AuthRequest": credentials.auth_request_body() },
        });
        let response = self.post(&envelope).await?;
        if let Some(fault) = response.fault() {
            return Err(Error::Fault(ErrorInfo::from_fault(fault)));
        }
        parse_auth_response(&response)
    }

    async fn send(&self, request: &SoapRequest, token: &str) -> Result<SoapResponse> {
        debug!(requests = ?request.request_names(), batch = request.options().is_batch, "Sending admin request");
        self.post(&request.to_envelope(Some(token))).await
    }
}

/// Reads the token of an `AuthResponse`.
pub(crate) fn parse_auth_response(response: &SoapResponse) -> Result<AuthResponse> {
    let auth = response
        .response("AuthResponse")
        .ok_or_else(|| Error::InvalidResponse("response has no AuthResponse element".to_string()))?;
    let token = content_of(auth.get("authToken"))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::InvalidResponse("AuthResponse has no authToken".to_string()))?;
    Ok(AuthResponse {
        token: SecretString::from(token),
        lifetime: u64_of(auth.get("lifetime")),
    })
}
