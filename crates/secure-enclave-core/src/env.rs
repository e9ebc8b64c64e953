// crates/secure-enclave-core/src/env.rs
// ============================================================================
// Module: Security Environment
// Description: Typed snapshot of the security environment variables.
// Purpose: Read recognized variables once per operation with strict parsing.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The security environment is read into an immutable [`EnvironmentConfig`]
//! snapshot. Each public operation captures one snapshot and threads it
//! through, so a concurrently changing environment cannot produce mixed reads.
//! Missing variables fall back to defaults; values that are present but
//! lexically invalid fail closed with [`SecurityError::InvalidConfiguration`].
//!
//! Invariants:
//! - Set-but-empty (or whitespace-only) values behave exactly like unset ones.
//! - Tokens compare ASCII case-insensitively after trimming.
//! - Directory values are used verbatim; whitespace is part of the path.
//! - Non-UTF-8 values are rejected rather than lossily converted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::SecurityError;
use crate::error::SecurityResult;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum total length of a configured directory path.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a single configured path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys recognized by the security resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEnv {
    /// Turns security hardening on or off.
    Enable,
    /// Selects the validation strategy.
    Strategy,
    /// Selects the enforcement policy (`permissive` or `strict`).
    EnforcementPolicy,
    /// Selects exact or prefix enclave lookup.
    LookupType,
    /// Root of the enclave directory tree.
    RootDirectory,
    /// Explicit enclave directory that bypasses matching.
    NodeDirectory,
}

impl SecurityEnv {
    /// Every recognized key, in documentation order.
    pub const ALL: [Self; 6] = [
        Self::Enable,
        Self::Strategy,
        Self::EnforcementPolicy,
        Self::LookupType,
        Self::RootDirectory,
        Self::NodeDirectory,
    ];

    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enable => "ROS_SECURITY_ENABLE",
            Self::Strategy => "ROS_SECURITY_STRATEGY",
            Self::EnforcementPolicy => "ROS_SECURITY_ENFORCEMENT_POLICY",
            Self::LookupType => "ROS_SECURITY_LOOKUP_TYPE",
            Self::RootDirectory => "ROS_SECURITY_ROOT_DIRECTORY",
            Self::NodeDirectory => "ROS_SECURITY_NODE_DIRECTORY",
        }
    }
}

// ============================================================================
// SECTION: Environment Sources
// ============================================================================

/// Read-only view of environment variables.
pub trait EnvSource: Send + Sync {
    /// Returns the raw value for `name`, or `None` when unset.
    fn var_os(&self, name: &str) -> Option<OsString>;
}

/// Environment source backed by the current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var_os(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }
}

/// Environment source backed by an in-memory map.
///
/// # Invariants
/// - Keys absent from the map are reported as unset; the process environment
///   is never consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEnv {
    /// Variable values keyed by name.
    vars: BTreeMap<String, String>,
}

impl MapEnv {
    /// Creates an empty map source.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vars: BTreeMap::new(),
        }
    }

    /// Returns the source with `key` set to `value`.
    #[must_use]
    pub fn with(mut self, key: SecurityEnv, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: SecurityEnv, value: impl Into<String>) {
        self.vars.insert(key.as_str().to_string(), value.into());
    }

    /// Removes `key` from the map.
    pub fn remove(&mut self, key: SecurityEnv) {
        self.vars.remove(key.as_str());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn var_os(&self, name: &str) -> Option<OsString> {
        self.vars.get(name).map(OsString::from)
    }
}

// ============================================================================
// SECTION: Typed Values
// ============================================================================

/// Enclave lookup strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LookupStrategy {
    /// The per-node directory must exist exactly as constructed.
    #[serde(rename = "MATCH_EXACT")]
    MatchExact,
    /// Fall back to the most specific existing ancestor directory.
    #[default]
    #[serde(rename = "MATCH_PREFIX")]
    MatchPrefix,
}

impl LookupStrategy {
    /// Returns the canonical token for the strategy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MatchExact => "MATCH_EXACT",
            Self::MatchPrefix => "MATCH_PREFIX",
        }
    }
}

/// Security validation strategy.
///
/// Directory-based enclave discovery is the only strategy this crate resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityStrategy {
    /// Key material lives in per-node enclave directories.
    #[default]
    Enclave,
}

impl SecurityStrategy {
    /// Returns the canonical token for the strategy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enclave => "enclave",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Immutable snapshot of the security environment.
///
/// # Invariants
/// - Every parsed field has passed lexical validation.
/// - `enforcement_policy` is kept raw so unset and invalid stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvironmentConfig {
    /// Whether security hardening is enabled.
    enabled: bool,
    /// Selected validation strategy.
    strategy: SecurityStrategy,
    /// Trimmed, non-empty enforcement policy value when set.
    enforcement_policy: Option<String>,
    /// Selected lookup strategy.
    lookup: LookupStrategy,
    /// Root of the enclave tree when set.
    root_directory: Option<PathBuf>,
    /// Explicit enclave override when set.
    node_directory: Option<PathBuf>,
}

impl EnvironmentConfig {
    /// Captures a snapshot of the current process environment.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::InvalidConfiguration`] when a recognized
    /// variable is present but invalid.
    pub fn load() -> SecurityResult<Self> {
        Self::from_source(&ProcessEnv)
    }

    /// Captures a snapshot from an arbitrary environment source.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::InvalidConfiguration`] when a recognized
    /// variable is present but invalid.
    pub fn from_source(source: &dyn EnvSource) -> SecurityResult<Self> {
        let enabled = read_env_value(source, SecurityEnv::Enable)?
            .map(|value| parse_enable(&value))
            .transpose()?
            .unwrap_or(false);
        let strategy = read_env_value(source, SecurityEnv::Strategy)?
            .map(|value| parse_strategy(&value))
            .transpose()?
            .unwrap_or_default();
        let enforcement_policy = read_env_value(source, SecurityEnv::EnforcementPolicy)?;
        let lookup = read_env_value(source, SecurityEnv::LookupType)?
            .map(|value| parse_lookup(&value))
            .transpose()?
            .unwrap_or_default();
        let root_directory = read_env_path(source, SecurityEnv::RootDirectory)?
            .map(|value| parse_directory(SecurityEnv::RootDirectory, &value))
            .transpose()?;
        let node_directory = read_env_path(source, SecurityEnv::NodeDirectory)?
            .map(|value| parse_directory(SecurityEnv::NodeDirectory, &value))
            .transpose()?;
        Ok(Self {
            enabled,
            strategy,
            enforcement_policy,
            lookup,
            root_directory,
            node_directory,
        })
    }

    /// Returns whether security hardening is enabled.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the selected validation strategy.
    #[must_use]
    pub const fn strategy(&self) -> SecurityStrategy {
        self.strategy
    }

    /// Returns the raw enforcement policy value, if set.
    #[must_use]
    pub fn enforcement_policy(&self) -> Option<&str> {
        self.enforcement_policy.as_deref()
    }

    /// Returns the selected lookup strategy.
    #[must_use]
    pub const fn lookup(&self) -> LookupStrategy {
        self.lookup
    }

    /// Returns the enclave root directory, if set.
    #[must_use]
    pub fn root_directory(&self) -> Option<&Path> {
        self.root_directory.as_deref()
    }

    /// Returns the explicit enclave override directory, if set.
    #[must_use]
    pub fn node_directory(&self) -> Option<&Path> {
        self.node_directory.as_deref()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the variable contains invalid UTF-8.
pub fn read_env_strict(source: &dyn EnvSource, key: SecurityEnv) -> SecurityResult<Option<String>> {
    let name = key.as_str();
    source.var_os(name).map_or(Ok(None), |raw| {
        raw.into_string()
            .map(Some)
            .map_err(|_| SecurityError::InvalidConfiguration(format!("{name} must be valid UTF-8")))
    })
}

/// Reads a token variable, trimming it and mapping empty values to `None`.
fn read_env_value(source: &dyn EnvSource, key: SecurityEnv) -> SecurityResult<Option<String>> {
    Ok(read_env_strict(source, key)?.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
    }))
}

/// Reads a directory variable verbatim, mapping blank values to `None`.
///
/// Surrounding whitespace is part of the path and is never stripped.
fn read_env_path(source: &dyn EnvSource, key: SecurityEnv) -> SecurityResult<Option<String>> {
    Ok(read_env_strict(source, key)?.filter(|value| !value.trim().is_empty()))
}

/// Parses the enable flag.
fn parse_enable(value: &str) -> SecurityResult<bool> {
    const TRUTHY: [&str; 4] = ["true", "1", "yes", "on"];
    const FALSY: [&str; 4] = ["false", "0", "no", "off"];
    if TRUTHY.iter().any(|token| value.eq_ignore_ascii_case(token)) {
        return Ok(true);
    }
    if FALSY.iter().any(|token| value.eq_ignore_ascii_case(token)) {
        return Ok(false);
    }
    Err(SecurityError::InvalidConfiguration(format!(
        "{} must be one of true, false, 1, 0, yes, no, on, off",
        SecurityEnv::Enable.as_str()
    )))
}

/// Parses the validation strategy.
fn parse_strategy(value: &str) -> SecurityResult<SecurityStrategy> {
    if value.eq_ignore_ascii_case(SecurityStrategy::Enclave.as_str()) {
        return Ok(SecurityStrategy::Enclave);
    }
    Err(SecurityError::InvalidConfiguration(format!(
        "{} must be {}",
        SecurityEnv::Strategy.as_str(),
        SecurityStrategy::Enclave.as_str()
    )))
}

/// Parses the lookup strategy.
fn parse_lookup(value: &str) -> SecurityResult<LookupStrategy> {
    for strategy in [LookupStrategy::MatchExact, LookupStrategy::MatchPrefix] {
        if value.eq_ignore_ascii_case(strategy.as_str()) {
            return Ok(strategy);
        }
    }
    Err(SecurityError::InvalidConfiguration(format!(
        "{} must be MATCH_EXACT or MATCH_PREFIX",
        SecurityEnv::LookupType.as_str()
    )))
}

/// Validates a configured directory path against length limits.
fn parse_directory(key: SecurityEnv, value: &str) -> SecurityResult<PathBuf> {
    let name = key.as_str();
    if value.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SecurityError::InvalidConfiguration(format!("{name} exceeds max length")));
    }
    if value.contains('\0') {
        return Err(SecurityError::InvalidConfiguration(format!("{name} contains a NUL byte")));
    }
    let path = PathBuf::from(value);
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SecurityError::InvalidConfiguration(format!(
                "{name} path component too long"
            )));
        }
    }
    Ok(path)
}
