//! Client for the Zimbra directory-administration SOAP service.
//!
//! [`AdminClient`] logs in lazily with admin credentials, sends JSON SOAP requests
//! described by [`RequestDescriptor`]s, and maps the answers onto typed directory
//! objects ([`Account`], [`Domain`], [`DistributionList`], [`Cos`], [`Alias`],
//! [`Grant`]). Several requests can share one round trip through a
//! [`BatchDescriptor`].
//!
//! ```no_run
//! use zimbra_admin::AdminClient;
//! use zimbra_core::config::ZimbraClientConfig;
//!
//! # async fn run() -> zimbra_admin::Result<()> {
//! let config = ZimbraClientConfig::new("https://mail.example.com:7071", "admin@example.com", "secret")?;
//! let client = AdminClient::new(&config)?;
//! let account = client.get_account("user@example.com").await?;
//! println!("{} uses {} bytes", account.name, account.mailbox_size().await?);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod account;
pub mod alias;
pub mod batch;
pub mod client;
pub mod cos;
pub mod distribution_list;
pub mod domain;
pub mod envelope;
pub mod grant;
pub mod object;
pub mod parser;
pub mod request;
pub mod transport;

pub use account::Account;
pub use alias::Alias;
pub use batch::{BatchDescriptor, BatchResponse};
pub use client::{AdminClient, ClientRef};
pub use cos::Cos;
pub use distribution_list::{DistributionList, Owner};
pub use domain::Domain;
pub use envelope::OnError;
pub use grant::Grant;
pub use object::{DirectoryEntry, DirectoryObject};
pub use parser::{Collection, Parsed, SearchResult};
pub use request::{GrantTarget, Grantee, RequestDescriptor, Right};
pub use transport::{HttpSoapTransport, SoapTransport};

/// Result alias over the shared error type.
pub type Result<T> = zimbra_core::Result<T>;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::envelope::SoapResponse;
    use crate::transport::{AuthResponse, MockSoapTransport};
    use crate::{AdminClient, Result};
    use secrecy::SecretString;
    use serde_json::Value;
    use std::sync::Arc;
    use zimbra_core::config::ZimbraClientConfig;

    pub const TOKEN: &str = "0_admin";

    pub fn config() -> ZimbraClientConfig {
        ZimbraClientConfig::new("https://mail.example.test:7071", "admin@example.test", "pw")
            .unwrap()
    }

    pub fn auth_ok() -> Result<AuthResponse> {
        Ok(AuthResponse {
            token: SecretString::from(TOKEN.to_string()),
            lifetime: Some(43_200_000),
        })
    }

    pub fn respond(body: Value) -> Result<SoapResponse> {
        Ok(SoapResponse::from_body(body))
    }

    pub fn client_with(transport: MockSoapTransport) -> AdminClient {
        AdminClient::with_transport(&config(), Arc::new(transport))
    }
}
