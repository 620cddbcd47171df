//! Admin credentials.
//!
//! Credentials are held by the client only until the first login resolves.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

/// Admin account name and password used by `AuthRequest`.
#[derive(Debug)]
pub struct AdminCredentials {
    user: String,
    password: SecretString,
}

impl AdminCredentials {
    /// Create new admin credentials.
    #[must_use]
    pub fn new(user: impl Into<String>, password: &str) -> Self {
        Self {
            user: user.into(),
            password: SecretString::from(password),
        }
    }

    /// Admin account name.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Admin password.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Body of the admin `AuthRequest`.
    #[must_use]
    pub fn auth_request_body(&self) -> Value {
        json!({
            "_jsns": "urn:zimbraAdmin",
            "name": self.user,
            "password": self.password.expose_secret(),
        })
    }
}
