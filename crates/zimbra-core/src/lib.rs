//! # zimbra-core
//!
//! Core types and utilities for talking to the Zimbra directory-administration service.
//!
//! This crate holds the leaf pieces of the client: the error type and the error builder
//! that normalizes remote failures, the attribute codec, the identifier classifier, the
//! resource dictionary, and configuration.
//!
//! ## Modules
//!
//! - [`error`] - Error types and SOAP fault normalization
//! - [`attrs`] - Attribute maps and their `{n, _content}` wire form
//! - [`identifier`] - `by: id | name` selectors
//! - [`resource`] - The registry of directory resource kinds
//! - [`config`] - Configuration for admin clients
//! - [`credentials`] - Admin credentials consumed by login
//! - [`http`] - HTTP settings of the transport
//! - [`search`] - Directory search queries

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod attrs;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod identifier;
pub mod resource;
pub mod search;

// Re-export commonly used types
pub use attrs::{AttributeMap, AttributeValue};
pub use error::{Error, ErrorExtra, ErrorInfo, Result};
pub use identifier::{By, Selector};
pub use resource::ResourceKind;
