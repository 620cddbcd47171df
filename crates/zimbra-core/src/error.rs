//! Error types for Zimbra admin operations.
//!
//! This module provides the error hierarchy for the admin client, including the
//! error builder that turns transport failures and SOAP faults into a uniform
//! [`ErrorInfo`] shape.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// HTTP status reported for SOAP faults (the service answers faults with a 500).
pub const FAULT_STATUS: u16 = 500;

/// Main error type for Zimbra admin operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The HTTP exchange with the admin service failed
    #[error("Transport error: {0}")]
    Transport(ErrorInfo),

    /// The admin service answered with a SOAP fault
    #[error("SOAP fault: {0}")]
    Fault(ErrorInfo),

    /// Resource keyword is not registered in the resource dictionary
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Response did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// No token is held and login is no longer possible
    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Specialized result type for Zimbra admin operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Normalized description of a remote failure.
///
/// Built either from a transport failure (`status`, `statusText`) or from a SOAP
/// fault (`Fault.Detail.Error.Code`, `Fault.Reason.Text`, `Fault.Detail.Error.Trace`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    /// HTTP status of the failed exchange
    pub status: u16,
    /// Short human-readable summary
    pub title: String,
    /// SOAP fault code (`soap:Sender`, `soap:Receiver`) when the failure is a fault
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault_code: Option<String>,
    /// Service-specific details
    pub extra: ErrorExtra,
}

/// Service-specific part of an [`ErrorInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorExtra {
    /// Zimbra error code (`account.NO_SUCH_ACCOUNT`) or the HTTP status for transport errors
    pub code: String,
    /// Reason text
    pub reason: String,
    /// Server-side trace identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl ErrorInfo {
    /// Builds the error description for a failed HTTP exchange.
    #[must_use]
    pub fn from_transport(status: u16, status_text: impl Into<String>) -> Self {
        let status_text = status_text.into();
        Self {
            status,
            title: status_text.clone(),
            fault_code: None,
            extra: ErrorExtra {
                code: status.to_string(),
                reason: status_text,
                trace: None,
            },
        }
    }

    /// Builds the error description for a SOAP fault.
    ///
    /// Accepts both a wrapper holding a `Fault` member and a bare fault object
    /// (batch responses list bare faults).
    #[must_use]
    pub fn from_fault(fault: &Value) -> Self {
        let fault = fault.get("Fault").unwrap_or(fault);
        let detail = fault.pointer("/Detail/Error");
        let reason = text_at(fault, "/Reason/Text").unwrap_or_default();
        let code = detail
            .and_then(|error| error.get("Code"))
            .and_then(Value::as_str)
            .unwrap_or("service.FAILURE")
            .to_string();

        Self {
            status: FAULT_STATUS,
            title: reason.clone(),
            fault_code: text_at(fault, "/Code/Value"),
            extra: ErrorExtra {
                code,
                reason,
                trace: detail
                    .and_then(|error| error.get("Trace"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
        }
    }

    /// Builds an error description for a local failure attached to a batch entry.
    #[must_use]
    pub fn from_error(error: &Error) -> Self {
        if let Some(info) = error.info() {
            return info.clone();
        }
        let message = error.to_string();
        Self {
            status: 0,
            title: message.clone(),
            fault_code: None,
            extra: ErrorExtra {
                code: error.error_code().to_string(),
                reason: message,
                trace: None,
            },
        }
    }

    /// Returns the Zimbra error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.extra.code
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.extra.code, self.status, self.title)
    }
}

fn text_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Structured error response for serialization.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
    /// Optional request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail structure.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorDetail {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Fault(_) => "SOAP_FAULT",
            Self::UnknownResource(_) => "UNKNOWN_RESOURCE",
            Self::InvalidResponse(_) => "INVALID_RESPONSE",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::AuthenticationRequired(_) => "AUTHENTICATION_REQUIRED",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
        }
    }

    /// Returns the normalized remote error description, if this error came from the service.
    #[must_use]
    pub const fn info(&self) -> Option<&ErrorInfo> {
        match self {
            Self::Transport(info) | Self::Fault(info) => Some(info),
            _ => None,
        }
    }

    /// Converts the error into an `ErrorResponse`.
    #[must_use]
    pub fn into_error_response(self) -> ErrorResponse {
        self.into_error_response_with_id(None)
    }

    /// Converts the error into an `ErrorResponse` with a request ID.
    #[must_use]
    pub fn into_error_response_with_id(self, request_id: Option<String>) -> ErrorResponse {
        let details = self
            .info()
            .and_then(|info| serde_json::to_value(&info.extra).ok());
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details,
            },
            request_id,
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::ConfigError(_) | Self::InvalidResponse(_)
        )
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map_or(0, |status| status.as_u16());
        Self::Transport(ErrorInfo::from_transport(status, err.to_string()))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
