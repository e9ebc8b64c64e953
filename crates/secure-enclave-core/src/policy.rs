// crates/secure-enclave-core/src/policy.rs
// ============================================================================
// Module: Enforcement Policy
// Description: Maps the enforcement policy setting to a typed policy.
// Purpose: Distinguish an unset policy from an invalid one.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An unset policy defaults to [`EnforcementPolicy::Permissive`] so existing
//! unsecured deployments keep running. A set value must be one of the two
//! recognized tokens; anything else is a configuration error and is never
//! coerced to either variant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::env::EnvironmentConfig;
use crate::env::SecurityEnv;
use crate::error::SecurityError;
use crate::error::SecurityResult;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Enforcement policy applied when security is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementPolicy {
    /// A node may run unsecured when no enclave is found.
    #[default]
    Permissive,
    /// A node without an enclave must not start.
    Strict,
}

impl EnforcementPolicy {
    /// Returns the canonical token for the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Permissive => "permissive",
            Self::Strict => "strict",
        }
    }

    /// Parses a policy token, returning `None` for unrecognized values.
    #[must_use]
    pub fn from_token(value: &str) -> Option<Self> {
        let value = value.trim();
        [Self::Permissive, Self::Strict]
            .into_iter()
            .find(|policy| value.eq_ignore_ascii_case(policy.as_str()))
    }
}

// ============================================================================
// SECTION: Determination
// ============================================================================

/// Determines the enforcement policy from an environment snapshot.
///
/// # Errors
///
/// Returns [`SecurityError::InvalidConfiguration`] when the policy variable is
/// set to anything other than `permissive` or `strict`.
pub fn determine_policy(config: &EnvironmentConfig) -> SecurityResult<EnforcementPolicy> {
    let Some(raw) = config.enforcement_policy() else {
        return Ok(EnforcementPolicy::Permissive);
    };
    EnforcementPolicy::from_token(raw).ok_or_else(|| {
        SecurityError::InvalidConfiguration(format!(
            "{} must be permissive or strict",
            SecurityEnv::EnforcementPolicy.as_str()
        ))
    })
}
