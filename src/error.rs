//! Error types for the placement control plane
//!
//! Provides structured error types for pool selection, dock discovery,
//! provisioning dispatch and the REST surface.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the control plane
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    #[error("Resource not found: {kind}/{id}")]
    ResourceNotFound { kind: String, id: String },

    #[error("Resource already exists: {kind}/{id}")]
    ResourceExists { kind: String, id: String },

    #[error("Resource {id} is in status {status}, expected {expected}")]
    InvalidStatus {
        id: String,
        status: String,
        expected: String,
    },

    // =========================================================================
    // Selection Errors
    // =========================================================================
    #[error("Profile resolution failed for {profile}: {reason}")]
    ProfileResolution { profile: String, reason: String },

    #[error("no available pool to meet user's requirement")]
    NoAvailablePool,

    #[error("Invalid filter predicate {key}: {value} ({reason})")]
    InvalidFilterPredicate {
        key: String,
        value: String,
        reason: String,
    },

    // =========================================================================
    // Discovery Errors
    // =========================================================================
    #[error("Backend {backend} failed to list pools: {reason}")]
    BackendList { backend: String, reason: String },

    #[error("There is no pool can be found across {docks} docks")]
    NoPoolDiscovered { docks: usize },

    #[error("Dock not found: {dock}")]
    DockNotFound { dock: String },

    // =========================================================================
    // Driver Errors
    // =========================================================================
    #[error("Driver not registered: {driver}")]
    DriverNotFound { driver: String },

    #[error("Driver dispatch failed: {driver} - {operation}: {reason}")]
    DriverDispatch {
        driver: String,
        operation: String,
        reason: String,
    },

    // =========================================================================
    // API Errors
    // =========================================================================
    #[error("API request validation failed: {0}")]
    ApiValidation(String),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable error code carried in the `GenericResponse` error envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Conflict,
    BadRequest,
    ProfileResolution,
    NoAvailablePool,
    InvalidFilterPredicate,
    BackendList,
    DriverDispatch,
    Internal,
}

impl ErrorCode {
    /// HTTP status code for this error class
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict => 409,
            ErrorCode::BadRequest | ErrorCode::InvalidFilterPredicate => 400,
            ErrorCode::ProfileResolution => 422,
            ErrorCode::NoAvailablePool => 507,
            ErrorCode::BackendList | ErrorCode::DriverDispatch => 502,
            ErrorCode::Internal => 500,
        }
    }
}

/// What the caller should do with a failed request. The core never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Resubmitting the same request may succeed
    Resubmit,
    /// Availability may change after the next discovery sweep
    WaitForDiscovery,
    /// Configuration or profile problem, resubmitting will not help
    Fatal,
}

impl Error {
    /// Error code surfaced to API clients
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ResourceNotFound { .. }
            | Error::DockNotFound { .. }
            | Error::DriverNotFound { .. } => ErrorCode::NotFound,
            Error::ResourceExists { .. } | Error::InvalidStatus { .. } => ErrorCode::Conflict,
            Error::ApiValidation(_) | Error::JsonParse(_) => ErrorCode::BadRequest,
            Error::ProfileResolution { .. } => ErrorCode::ProfileResolution,
            Error::NoAvailablePool => ErrorCode::NoAvailablePool,
            Error::InvalidFilterPredicate { .. } => ErrorCode::InvalidFilterPredicate,
            Error::BackendList { .. } | Error::NoPoolDiscovered { .. } => ErrorCode::BackendList,
            Error::DriverDispatch { .. } => ErrorCode::DriverDispatch,
            Error::Internal(_)
            | Error::Configuration(_)
            | Error::YamlParse(_)
            | Error::Io(_) => ErrorCode::Internal,
        }
    }

    /// Determine what action the caller should take for this error
    pub fn action(&self) -> ErrorAction {
        match self {
            // Capacity is refreshed by discovery, not by retrying
            Error::NoAvailablePool
            | Error::NoPoolDiscovered { .. }
            | Error::BackendList { .. } => ErrorAction::WaitForDiscovery,

            // Profile and predicate problems need an operator
            Error::ProfileResolution { .. }
            | Error::InvalidFilterPredicate { .. }
            | Error::Configuration(_)
            | Error::ApiValidation(_)
            | Error::YamlParse(_)
            | Error::JsonParse(_) => ErrorAction::Fatal,

            _ => ErrorAction::Resubmit,
        }
    }

    /// Check if resubmitting the request may succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self.action(), ErrorAction::Fatal)
    }

    /// Shorthand for a malformed predicate
    pub(crate) fn predicate(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidFilterPredicate {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for the control plane
pub type Result<T> = std::result::Result<T, Error>;
