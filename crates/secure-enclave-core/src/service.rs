// crates/secure-enclave-core/src/service.rs
// ============================================================================
// Module: Security Resolver Service
// Description: Public entry points for node-startup security queries.
// Purpose: Snapshot the environment once per call and report failures.
// Dependencies: crate modules
// ============================================================================

//! ## Overview
//! [`SecurityResolver`] binds an [`EnvSource`] and an audit sink. Every
//! operation captures exactly one [`EnvironmentConfig`] snapshot, runs the
//! relevant component against it, and records failures to the sink. The free
//! functions [`use_security`], [`get_enforcement_policy`], and
//! [`get_secure_root`] use the process environment with no audit sink.
//!
//! No state is kept between calls; resolving the same identity against the
//! same environment always yields the same result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::audit::AuditOutcome;
use crate::audit::NoopAuditSink;
use crate::audit::SecurityAuditEvent;
use crate::audit::SecurityAuditSink;
use crate::audit::SecurityOperation;
use crate::decision::NodeSecurityDecision;
use crate::decision::decide;
use crate::env::EnvSource;
use crate::env::EnvironmentConfig;
use crate::env::ProcessEnv;
use crate::error::SecurityResult;
use crate::identity::NodeIdentity;
use crate::identity::qualified_name;
use crate::policy::EnforcementPolicy;
use crate::policy::determine_policy;
use crate::resolver::SecureRootDirectory;
use crate::resolver::resolve;

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Security configuration resolver bound to an environment source.
///
/// # Invariants
/// - Holds no cached configuration; each call re-reads `source` once.
pub struct SecurityResolver<S = ProcessEnv> {
    /// Environment source read once per operation.
    source: S,
    /// Sink receiving failure events.
    audit: Arc<dyn SecurityAuditSink>,
}

impl<S: EnvSource> SecurityResolver<S> {
    /// Creates a resolver that discards audit events.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn SecurityAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Captures a snapshot of the bound environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a recognized variable is present but invalid.
    pub fn snapshot(&self) -> SecurityResult<EnvironmentConfig> {
        EnvironmentConfig::from_source(&self.source)
    }

    /// Reports whether security hardening is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error when the environment snapshot is invalid.
    pub fn use_security(&self) -> SecurityResult<bool> {
        let result = self.snapshot().map(|config| config.enabled());
        self.audit_failure(SecurityOperation::UseSecurity, None, result)
    }

    /// Returns the enforcement policy.
    ///
    /// # Errors
    ///
    /// Returns an error when the snapshot or the policy value is invalid.
    pub fn enforcement_policy(&self) -> SecurityResult<EnforcementPolicy> {
        let result = self.snapshot().and_then(|config| determine_policy(&config));
        self.audit_failure(SecurityOperation::EnforcementPolicy, None, result)
    }

    /// Resolves the enclave directory for a node.
    ///
    /// # Errors
    ///
    /// Returns an error when the identity is malformed, the configuration is
    /// invalid, or no enclave directory exists.
    pub fn secure_root(
        &self,
        node_name: &str,
        node_namespace: &str,
    ) -> SecurityResult<SecureRootDirectory> {
        let result = NodeIdentity::new(node_name, node_namespace)
            .and_then(|identity| resolve(&identity, &self.snapshot()?));
        self.audit_failure(
            SecurityOperation::SecureRoot,
            Some(qualified_name(node_name, node_namespace)),
            result,
        )
    }

    /// Decides whether and how a node may start.
    ///
    /// Equivalent to [`SecurityResolver::prepare_node_decision`] followed by
    /// [`SecurityResolver::decide_node`].
    ///
    /// # Errors
    ///
    /// Returns an error when the identity or configuration is invalid, or
    /// when the policy is strict and no enclave is available.
    pub fn node_security_decision(
        &self,
        node_name: &str,
        node_namespace: &str,
    ) -> SecurityResult<NodeSecurityDecision> {
        let prepared = self.prepare_node_decision(node_name, node_namespace)?;
        self.decide_node(&prepared)
    }

    /// Validates the identity and captures the snapshot a decision runs on.
    ///
    /// The enforcement policy is checked here when security is enabled, so a
    /// later [`SecurityResolver::decide_node`] can only fail on resolution.
    ///
    /// # Errors
    ///
    /// Returns an error when the identity, the snapshot, or the policy of an
    /// enabled configuration is invalid.
    pub fn prepare_node_decision(
        &self,
        node_name: &str,
        node_namespace: &str,
    ) -> SecurityResult<PreparedDecision> {
        let result = NodeIdentity::new(node_name, node_namespace).and_then(|identity| {
            let config = self.snapshot()?;
            if config.enabled() {
                determine_policy(&config)?;
            }
            Ok(PreparedDecision {
                identity,
                config,
            })
        });
        self.audit_failure(
            SecurityOperation::NodeDecision,
            Some(qualified_name(node_name, node_namespace)),
            result,
        )
    }

    /// Decides how a prepared node may start.
    ///
    /// # Errors
    ///
    /// Returns the resolution error when the policy is strict and no enclave
    /// is available; the caller must refuse to start the node.
    pub fn decide_node(&self, prepared: &PreparedDecision) -> SecurityResult<NodeSecurityDecision> {
        let node = prepared.identity.to_string();
        let result = decide(&prepared.identity, &prepared.config);
        let decision =
            self.audit_failure(SecurityOperation::NodeDecision, Some(node.clone()), result)?;
        if let NodeSecurityDecision::Unsecured {
            reason,
            message,
        } = &decision
        {
            let event = SecurityAuditEvent::new(
                SecurityOperation::NodeDecision,
                Some(node),
                AuditOutcome::PermissiveFallback,
                *reason,
                message.clone(),
            );
            self.audit.record(&event);
        }
        Ok(decision)
    }

    /// Records `result` to the audit sink when it is an error.
    fn audit_failure<T>(
        &self,
        operation: SecurityOperation,
        node: Option<String>,
        result: SecurityResult<T>,
    ) -> SecurityResult<T> {
        if let Err(err) = &result {
            self.audit.record(&SecurityAuditEvent::from_error(operation, node, err));
        }
        result
    }
}

impl Default for SecurityResolver<ProcessEnv> {
    fn default() -> Self {
        Self::new(ProcessEnv)
    }
}

/// Validated identity and environment snapshot for a startup decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDecision {
    /// Node being started.
    identity: NodeIdentity,
    /// Snapshot the decision is evaluated against.
    config: EnvironmentConfig,
}

impl PreparedDecision {
    /// Returns the node identity.
    #[must_use]
    pub const fn identity(&self) -> &NodeIdentity {
        &self.identity
    }
}

// ============================================================================
// SECTION: Process Environment Entry Points
// ============================================================================

/// Reports whether security hardening is enabled in the process environment.
///
/// # Errors
///
/// Returns [`crate::SecurityError::InvalidConfiguration`] when a recognized
/// variable is present but invalid.
pub fn use_security() -> SecurityResult<bool> {
    SecurityResolver::new(ProcessEnv).use_security()
}

/// Returns the enforcement policy from the process environment.
///
/// # Errors
///
/// Returns [`crate::SecurityError::InvalidConfiguration`] when the policy
/// value is not recognized.
pub fn get_enforcement_policy() -> SecurityResult<EnforcementPolicy> {
    SecurityResolver::new(ProcessEnv).enforcement_policy()
}

/// Resolves the enclave directory for a node from the process environment.
///
/// # Errors
///
/// Returns [`crate::SecurityError::InvalidArgument`],
/// [`crate::SecurityError::InvalidConfiguration`],
/// [`crate::SecurityError::EnclaveNotFound`], or
/// [`crate::SecurityError::Internal`].
pub fn get_secure_root(node_name: &str, node_namespace: &str) -> SecurityResult<SecureRootDirectory> {
    SecurityResolver::new(ProcessEnv).secure_root(node_name, node_namespace)
}
