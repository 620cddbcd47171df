//! Configuration structures for Zimbra admin clients.
//!
//! This module provides the configuration used to connect to the Zimbra admin SOAP
//! endpoint, including credentials, collection output shape, TLS and timeouts.

use crate::credentials::AdminCredentials;
use crate::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Default admin SOAP port.
pub const DEFAULT_ADMIN_PORT: u16 = 7071;

/// Path of the admin SOAP endpoint.
pub const ADMIN_SOAP_PATH: &str = "/service/admin/soap";

/// Key used when collections are returned as maps instead of sequences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKey {
    /// Key objects by Zimbra id
    #[default]
    Id,
    /// Key objects by name
    Name,
}

/// Configuration for an admin client instance.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ZimbraClientConfig {
    /// Admin SOAP endpoint URL
    #[validate(url)]
    pub url: String,

    /// Admin account name
    #[validate(length(min = 1))]
    pub user: String,

    /// Admin password
    #[serde(skip_serializing)]
    pub password: SecretString,

    /// Return collections keyed by [`Self::array_as_object_key`] instead of as sequences
    #[serde(default)]
    pub array_as_object: bool,

    /// Key used when `array_as_object` is set
    #[serde(default)]
    pub array_as_object_key: CollectionKey,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to custom CA certificate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl ZimbraClientConfig {
    /// Create a new client configuration with required parameters.
    ///
    /// # Arguments
    ///
    /// * `url` - The admin SOAP endpoint (e.g., `https://mail.example.com:7071/service/admin/soap`)
    /// * `user` - The admin account name
    /// * `password` - The admin password
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or validation fails.
    pub fn new(
        url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, Error> {
        let config = Self {
            url: url.into(),
            user: user.into(),
            password: SecretString::from(password.into()),
            array_as_object: false,
            array_as_object_key: CollectionKey::default(),
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            request_timeout_secs: default_request_timeout_secs(),
        };

        config.validate_config()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the failed constraints.
    pub fn validate_config(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))
    }

    /// Return collections as maps keyed by `key`.
    #[must_use]
    pub const fn with_array_as_object(mut self, key: CollectionKey) -> Self {
        self.array_as_object = true;
        self.array_as_object_key = key;
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the collection key when collections are returned as maps.
    #[must_use]
    pub const fn collection_key(&self) -> Option<CollectionKey> {
        if self.array_as_object {
            Some(self.array_as_object_key)
        } else {
            None
        }
    }

    /// Parse the endpoint URL. A URL without a path points at the admin SOAP path.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_url(&self) -> Result<Url, Error> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| Error::ConfigError(format!("Invalid admin URL: {e}")))?;
        if url.path().is_empty() || url.path() == "/" {
            url.set_path(ADMIN_SOAP_PATH);
        }
        Ok(url)
    }

    /// Credentials for the first login.
    #[must_use]
    pub fn credentials(&self) -> AdminCredentials {
        AdminCredentials::new(self.user.clone(), self.password.expose_secret())
    }
}

impl Clone for ZimbraClientConfig {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            user: self.user.clone(),
            password: SecretString::from(self.password.expose_secret().to_owned()),
            array_as_object: self.array_as_object,
            array_as_object_key: self.array_as_object_key,
            tls_verify: self.tls_verify,
            tls_ca_cert: self.tls_ca_cert.clone(),
            request_timeout_secs: self.request_timeout_secs,
        }
    }
}
