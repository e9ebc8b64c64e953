// crates/secure-enclave-core/src/lib.rs
// ============================================================================
// Module: Secure Enclave Core
// Description: Security configuration resolution for middleware node startup.
// Purpose: Decide enablement, enforcement policy, and enclave directory per node.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This crate answers the three security questions a node asks at startup:
//! whether hardening is enabled ([`use_security`]), which enforcement policy
//! applies ([`get_enforcement_policy`]), and which directory holds the node's
//! key material ([`get_secure_root`]). Answers derive solely from an
//! environment snapshot and the node identity; nothing is cached.
//! Invariants:
//! - Each operation snapshots the environment once via [`EnvironmentConfig`].
//! - Unset variables default; present but invalid variables fail closed.
//! - Node identities are validated before any filesystem access.
//!
//! No cryptographic operation is performed and no key material is read.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod decision;
pub mod env;
pub mod error;
pub mod identity;
pub mod policy;
pub mod resolver;
pub mod service;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod identity_tests;
#[cfg(test)]
mod service_tests;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditOutcome;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::SecurityAuditEvent;
pub use audit::SecurityAuditSink;
pub use audit::SecurityOperation;
pub use audit::StderrAuditSink;
pub use decision::NodeSecurityDecision;
pub use decision::decide;
pub use env::EnvSource;
pub use env::EnvironmentConfig;
pub use env::LookupStrategy;
pub use env::MapEnv;
pub use env::ProcessEnv;
pub use env::SecurityEnv;
pub use env::SecurityStrategy;
pub use error::SecurityError;
pub use error::SecurityErrorKind;
pub use error::SecurityResult;
pub use identity::NodeIdentity;
pub use identity::qualified_name;
pub use policy::EnforcementPolicy;
pub use policy::determine_policy;
pub use resolver::SecureRootDirectory;
pub use resolver::resolve;
pub use service::PreparedDecision;
pub use service::SecurityResolver;
pub use service::get_enforcement_policy;
pub use service::get_secure_root;
pub use service::use_security;
