// crates/secure-enclave-core/src/identity.rs
// ============================================================================
// Module: Node Identity
// Description: Validated node name and namespace.
// Purpose: Reject malformed identities before any filesystem access.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`NodeIdentity`] pairs a single-token node name with an absolute
//! namespace. Both are validated against the middleware naming grammar: tokens
//! use ASCII letters, digits, and underscores and never start with a digit.
//! That grammar excludes separators, dot segments, and every character that is
//! invalid in a filesystem path, so validated tokens can be joined onto a
//! directory without further escaping.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

use crate::env::MAX_PATH_COMPONENT_LENGTH;
use crate::env::MAX_TOTAL_PATH_LENGTH;
use crate::error::SecurityError;
use crate::error::SecurityResult;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Namespace separator used by the middleware naming grammar.
pub const NAMESPACE_SEPARATOR: char = '/';

// ============================================================================
// SECTION: Types
// ============================================================================

/// Validated node identity.
///
/// # Invariants
/// - `name` is a single non-empty token without separators.
/// - `namespace` is `/` or `/tok(/tok)*` with no empty tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NodeIdentity {
    /// Node name token.
    name: String,
    /// Absolute node namespace.
    namespace: String,
}

impl NodeIdentity {
    /// Validates and constructs a node identity.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::InvalidArgument`] when the name or namespace
    /// violates the naming grammar.
    pub fn new(name: &str, namespace: &str) -> SecurityResult<Self> {
        validate_token("node name", name)?;
        validate_namespace(namespace)?;
        Ok(Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
        })
    }

    /// Returns the node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the absolute namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the namespace tokens from outermost to innermost.
    pub fn namespace_tokens(&self) -> impl Iterator<Item = &str> {
        self.namespace.split(NAMESPACE_SEPARATOR).filter(|token| !token.is_empty())
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&qualified_name(&self.name, &self.namespace))
    }
}

/// Joins a node name onto its namespace without validating either part.
///
/// Used to label nodes in audit events and messages, including identities
/// that failed validation.
#[must_use]
pub fn qualified_name(name: &str, namespace: &str) -> String {
    if namespace.ends_with(NAMESPACE_SEPARATOR) {
        format!("{namespace}{name}")
    } else {
        format!("{namespace}{NAMESPACE_SEPARATOR}{name}")
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates an absolute namespace.
fn validate_namespace(namespace: &str) -> SecurityResult<()> {
    if namespace.is_empty() {
        return Err(SecurityError::InvalidArgument("node namespace must not be empty".to_string()));
    }
    if namespace.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SecurityError::InvalidArgument("node namespace exceeds max length".to_string()));
    }
    let Some(rest) = namespace.strip_prefix(NAMESPACE_SEPARATOR) else {
        return Err(SecurityError::InvalidArgument("node namespace must be absolute".to_string()));
    };
    if rest.is_empty() {
        return Ok(());
    }
    for token in rest.split(NAMESPACE_SEPARATOR) {
        validate_token("node namespace token", token)?;
    }
    Ok(())
}

/// Validates a single name token.
fn validate_token(label: &str, token: &str) -> SecurityResult<()> {
    if token.is_empty() {
        return Err(SecurityError::InvalidArgument(format!("{label} must not be empty")));
    }
    if token.len() > MAX_PATH_COMPONENT_LENGTH {
        return Err(SecurityError::InvalidArgument(format!("{label} exceeds max length")));
    }
    if token.starts_with(|ch: char| ch.is_ascii_digit()) {
        return Err(SecurityError::InvalidArgument(format!("{label} must not start with a digit")));
    }
    if let Some(ch) = token.chars().find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '_')) {
        return Err(SecurityError::InvalidArgument(format!(
            "{label} contains invalid character '{}'",
            ch.escape_default()
        )));
    }
    Ok(())
}
