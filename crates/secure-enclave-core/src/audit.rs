// crates/secure-enclave-core/src/audit.rs
// ============================================================================
// Module: Security Audit Logging
// Description: Structured audit events for security resolution failures.
// Purpose: Emit JSON-line audit records without a logging framework dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Resolution failures and permissive fallbacks are reported to a
//! [`SecurityAuditSink`]. Successful lookups are never recorded; the caller
//! owns logging for the normal path. Sinks are lightweight so deployments can
//! route events to their preferred pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::error::SecurityError;
use crate::error::SecurityErrorKind;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Operation that produced an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityOperation {
    /// `use_security` query.
    UseSecurity,
    /// `get_enforcement_policy` query.
    EnforcementPolicy,
    /// `get_secure_root` query.
    SecureRoot,
    /// Combined node startup decision.
    NodeDecision,
}

/// Outcome classification for an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The operation failed.
    Error,
    /// No enclave was found and the node proceeds unsecured under a permissive policy.
    PermissiveFallback,
}

/// Security audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Operation that produced the event.
    pub operation: SecurityOperation,
    /// Fully-qualified node name when the operation concerns a node.
    pub node: Option<String>,
    /// Event outcome.
    pub outcome: AuditOutcome,
    /// Error classification.
    pub error_kind: SecurityErrorKind,
    /// Error message.
    pub message: String,
}

impl SecurityAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(
        operation: SecurityOperation,
        node: Option<String>,
        outcome: AuditOutcome,
        error_kind: SecurityErrorKind,
        message: String,
    ) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "security_resolution",
            timestamp_ms,
            operation,
            node,
            outcome,
            error_kind,
            message,
        }
    }

    /// Creates an error event describing `error`.
    #[must_use]
    pub fn from_error(
        operation: SecurityOperation,
        node: Option<String>,
        error: &SecurityError,
    ) -> Self {
        Self::new(operation, node, AuditOutcome::Error, error.kind(), error.message().to_string())
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for security resolution events.
pub trait SecurityAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &SecurityAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl SecurityAuditSink for StderrAuditSink {
    fn record(&self, event: &SecurityAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl SecurityAuditSink for FileAuditSink {
    fn record(&self, event: &SecurityAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl SecurityAuditSink for NoopAuditSink {
    fn record(&self, _event: &SecurityAuditEvent) {}
}
