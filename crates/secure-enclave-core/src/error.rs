// crates/secure-enclave-core/src/error.rs
// ============================================================================
// Module: Security Errors
// Description: Typed failure outcomes for security configuration resolution.
// Purpose: Report every failure to the immediate caller without retries.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! All operations in this crate return [`SecurityError`] on failure. The
//! variants form a closed taxonomy so callers can decide whether a node may
//! start; messages never include key material.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Error Types
// ============================================================================

/// Failure outcomes for security configuration resolution.
///
/// # Invariants
/// - Variants are stable; [`SecurityError::kind`] labels never change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecurityError {
    /// The caller supplied a null, empty, or malformed node identity.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// An environment variable is present but invalid, or a required one is absent.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Matching completed but no usable enclave directory exists.
    #[error("enclave not found: {0}")]
    EnclaveNotFound(String),
    /// Unexpected OS-level failure while probing the filesystem.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SecurityError {
    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> SecurityErrorKind {
        match self {
            Self::InvalidArgument(_) => SecurityErrorKind::InvalidArgument,
            Self::InvalidConfiguration(_) => SecurityErrorKind::InvalidConfiguration,
            Self::EnclaveNotFound(_) => SecurityErrorKind::EnclaveNotFound,
            Self::Internal(_) => SecurityErrorKind::Internal,
        }
    }

    /// Returns the bare failure message without the kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument(message)
            | Self::InvalidConfiguration(message)
            | Self::EnclaveNotFound(message)
            | Self::Internal(message) => message,
        }
    }
}

/// Stable classification labels for [`SecurityError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityErrorKind {
    /// See [`SecurityError::InvalidArgument`].
    InvalidArgument,
    /// See [`SecurityError::InvalidConfiguration`].
    InvalidConfiguration,
    /// See [`SecurityError::EnclaveNotFound`].
    EnclaveNotFound,
    /// See [`SecurityError::Internal`].
    Internal,
}

impl SecurityErrorKind {
    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::InvalidConfiguration => "invalid_configuration",
            Self::EnclaveNotFound => "enclave_not_found",
            Self::Internal => "internal",
        }
    }
}

/// Result alias for security resolution operations.
pub type SecurityResult<T> = Result<T, SecurityError>;
