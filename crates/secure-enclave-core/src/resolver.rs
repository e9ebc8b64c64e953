// crates/secure-enclave-core/src/resolver.rs
// ============================================================================
// Module: Enclave Path Resolver
// Description: Locates the secure enclave directory for a node.
// Purpose: Apply the override, or longest-prefix match against the enclave tree.
// Dependencies: serde, std::fs
// ============================================================================

//! ## Overview
//! Resolution order:
//! 1. A configured node directory override is returned as-is when it exists.
//!    A missing override is an error and never falls back to matching.
//! 2. Otherwise the candidate `root/<namespace tokens>/<name>` is built with
//!    native separators.
//! 3. [`LookupStrategy::MatchExact`] accepts only the candidate itself;
//!    [`LookupStrategy::MatchPrefix`] walks from the candidate up to and
//!    including the root and returns the first existing directory.
//!
//! Returned paths are absolute but symlinks are left unresolved, so the
//! operator's configured spelling survives.
//!
//! A directory found here can disappear or change before the caller opens
//! its contents. That time-of-check/time-of-use gap is inherent to directory
//! based enclave discovery and is not mitigated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::env::EnvironmentConfig;
use crate::env::LookupStrategy;
use crate::env::SecurityEnv;
use crate::error::SecurityError;
use crate::error::SecurityResult;
use crate::identity::NodeIdentity;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Absolute path of a resolved enclave directory.
///
/// # Invariants
/// - Always absolute.
/// - Referenced an existing, readable directory when it was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SecureRootDirectory(PathBuf);

impl SecureRootDirectory {
    /// Returns the directory path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Consumes the value and returns the owned path.
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for SecureRootDirectory {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SecureRootDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves the enclave directory for `identity` from an environment snapshot.
///
/// # Errors
///
/// - [`SecurityError::EnclaveNotFound`] when the override is missing or no
///   candidate directory exists.
/// - [`SecurityError::InvalidConfiguration`] when neither an override nor a
///   root directory is configured.
/// - [`SecurityError::Internal`] when probing a directory fails for a reason
///   other than absence.
pub fn resolve(
    identity: &NodeIdentity,
    config: &EnvironmentConfig,
) -> SecurityResult<SecureRootDirectory> {
    if let Some(node_directory) = config.node_directory() {
        return resolve_override(node_directory);
    }
    let root = config.root_directory().ok_or_else(|| {
        SecurityError::InvalidConfiguration(format!(
            "{} must be set when {} is unset",
            SecurityEnv::RootDirectory.as_str(),
            SecurityEnv::NodeDirectory.as_str()
        ))
    })?;
    let levels = candidate_levels(root, identity);
    match config.lookup() {
        LookupStrategy::MatchExact => {
            let candidate = levels.last().map_or(root, PathBuf::as_path);
            if probe_directory(candidate)? {
                return finalize(candidate);
            }
            Err(SecurityError::EnclaveNotFound(format!(
                "no enclave directory for {identity} at {}",
                candidate.display()
            )))
        }
        LookupStrategy::MatchPrefix => {
            for level in levels.iter().rev() {
                if probe_directory(level)? {
                    return finalize(level);
                }
            }
            Err(SecurityError::EnclaveNotFound(format!(
                "no enclave directory for {identity} under {}",
                root.display()
            )))
        }
    }
}

/// Returns the override directory when it exists.
fn resolve_override(node_directory: &Path) -> SecurityResult<SecureRootDirectory> {
    if probe_directory(node_directory)? {
        return finalize(node_directory);
    }
    Err(SecurityError::EnclaveNotFound(format!(
        "{} ({}) is not an existing directory",
        SecurityEnv::NodeDirectory.as_str(),
        node_directory.display()
    )))
}

/// Builds the search paths from the root down to the per-node candidate.
fn candidate_levels(root: &Path, identity: &NodeIdentity) -> Vec<PathBuf> {
    let mut levels = vec![root.to_path_buf()];
    let mut current = root.to_path_buf();
    for token in identity.namespace_tokens().chain(std::iter::once(identity.name())) {
        current.push(token);
        levels.push(current.clone());
    }
    levels
}

/// Reports whether `path` is an existing, readable directory.
///
/// Absence, or a non-directory anywhere along the path, yields `false`.
fn probe_directory(path: &Path) -> SecurityResult<bool> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => {
            fs::read_dir(path).map_err(|err| {
                SecurityError::Internal(format!(
                    "unable to read enclave directory {}: {err}",
                    path.display()
                ))
            })?;
            Ok(true)
        }
        Ok(_) => Ok(false),
        Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            Ok(false)
        }
        Err(err) => Err(SecurityError::Internal(format!(
            "unable to inspect {}: {err}",
            path.display()
        ))),
    }
}

/// Converts a probed directory into an absolute [`SecureRootDirectory`].
fn finalize(path: &Path) -> SecurityResult<SecureRootDirectory> {
    std::path::absolute(path).map(SecureRootDirectory).map_err(|err| {
        SecurityError::Internal(format!("unable to make {} absolute: {err}", path.display()))
    })
}
