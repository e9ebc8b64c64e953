// crates/secure-enclave-core/src/decision.rs
// ============================================================================
// Module: Node Security Decision
// Description: Combines enablement, policy, and enclave resolution.
// Purpose: Tell node startup whether to run secured, unsecured, or not at all.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! When security is enabled and no enclave can be resolved, the enforcement
//! policy decides: a permissive policy yields [`NodeSecurityDecision::Unsecured`]
//! while a strict policy returns the resolution error, and the caller must
//! refuse to start the node. Policy errors always propagate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::env::EnvironmentConfig;
use crate::error::SecurityErrorKind;
use crate::error::SecurityResult;
use crate::identity::NodeIdentity;
use crate::policy::EnforcementPolicy;
use crate::policy::determine_policy;
use crate::resolver::SecureRootDirectory;
use crate::resolver::resolve;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Security outcome for a node about to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NodeSecurityDecision {
    /// Security hardening is disabled.
    Disabled,
    /// The node runs with the resolved enclave.
    Secured {
        /// Enforcement policy in effect.
        policy: EnforcementPolicy,
        /// Resolved enclave directory.
        root: SecureRootDirectory,
    },
    /// No enclave was resolved; the permissive policy lets the node run unsecured.
    Unsecured {
        /// Classification of the resolution failure.
        reason: SecurityErrorKind,
        /// Resolution failure message.
        message: String,
    },
}

impl NodeSecurityDecision {
    /// Returns the enclave directory when the node runs secured.
    #[must_use]
    pub const fn secure_root(&self) -> Option<&SecureRootDirectory> {
        match self {
            Self::Secured {
                root, ..
            } => Some(root),
            Self::Disabled | Self::Unsecured { .. } => None,
        }
    }
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Decides how `identity` may start under an environment snapshot.
///
/// # Errors
///
/// Returns the policy error when the policy is invalid, or the resolution
/// error when the policy is strict and no enclave is available.
pub fn decide(
    identity: &NodeIdentity,
    config: &EnvironmentConfig,
) -> SecurityResult<NodeSecurityDecision> {
    if !config.enabled() {
        return Ok(NodeSecurityDecision::Disabled);
    }
    let policy = determine_policy(config)?;
    match (resolve(identity, config), policy) {
        (Ok(root), policy) => Ok(NodeSecurityDecision::Secured {
            policy,
            root,
        }),
        (Err(err), EnforcementPolicy::Permissive) => Ok(NodeSecurityDecision::Unsecured {
            reason: err.kind(),
            message: err.message().to_string(),
        }),
        (Err(err), EnforcementPolicy::Strict) => Err(err),
    }
}
