// crates/secure-enclave-cli/src/main.rs
// ============================================================================
// Module: Secure Enclave CLI Entry Point
// Description: Command dispatcher for security configuration diagnostics.
// Purpose: Let operators inspect what a node would resolve at startup.
// Dependencies: clap, secure-enclave-core, serde, serde_json, thiserror.
// ============================================================================

//! ## Overview
//! The Secure Enclave CLI reports the security environment snapshot, resolves
//! a node's enclave directory, and evaluates the startup decision for a node.
//! Reports are JSON on stdout; failures are written to stderr together with
//! audit events, and the process exits non-zero.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use secure_enclave_core::EnforcementPolicy;
use secure_enclave_core::EnvSource;
use secure_enclave_core::FileAuditSink;
use secure_enclave_core::LookupStrategy;
use secure_enclave_core::NodeSecurityDecision;
use secure_enclave_core::ProcessEnv;
use secure_enclave_core::SecureRootDirectory;
use secure_enclave_core::SecurityAuditSink;
use secure_enclave_core::SecurityError;
use secure_enclave_core::SecurityResolver;
use secure_enclave_core::SecurityStrategy;
use secure_enclave_core::StderrAuditSink;
use secure_enclave_core::determine_policy;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "secure-enclave", version, disable_help_subcommand = true)]
struct Cli {
    /// Append audit events to this file instead of stderr.
    #[arg(long, value_name = "PATH", global = true)]
    audit_log: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the security environment snapshot.
    Status,
    /// Resolve the enclave directory for a node.
    Resolve(NodeArgs),
    /// Evaluate whether a node may start and how.
    Check(NodeArgs),
}

/// Node identity arguments.
#[derive(Args, Debug)]
struct NodeArgs {
    /// Node name (single token).
    #[arg(long)]
    name: String,
    /// Absolute node namespace.
    #[arg(long, default_value = "/")]
    namespace: String,
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// JSON report for the `status` command.
#[derive(Debug, Serialize)]
struct StatusReport {
    /// Whether security hardening is enabled.
    enabled: bool,
    /// Validation strategy.
    strategy: SecurityStrategy,
    /// Enforcement policy.
    enforcement_policy: EnforcementPolicy,
    /// Enclave lookup strategy.
    lookup: LookupStrategy,
    /// Enclave tree root, if configured.
    root_directory: Option<PathBuf>,
    /// Explicit enclave override, if configured.
    node_directory: Option<PathBuf>,
}

/// JSON report for the `resolve` command.
#[derive(Debug, Serialize)]
struct ResolveReport<'a> {
    /// Node name.
    name: &'a str,
    /// Node namespace.
    namespace: &'a str,
    /// Resolved enclave directory.
    secure_root: SecureRootDirectory,
}

/// JSON report for the `check` command.
#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    /// Node name.
    name: &'a str,
    /// Node namespace.
    namespace: &'a str,
    /// Startup decision.
    decision: NodeSecurityDecision,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failure outcomes.
#[derive(Debug, Error)]
enum CliError {
    /// Security resolution failed.
    #[error(transparent)]
    Security(#[from] SecurityError),
    /// The node must not start under a strict policy.
    #[error("node {node} must not start: {source}")]
    Refused {
        /// Fully-qualified node name.
        node: String,
        /// Underlying resolution failure.
        source: SecurityError,
    },
    /// The audit log could not be opened.
    #[error("unable to open audit log {path}: {source}")]
    AuditLog {
        /// Audit log path.
        path: String,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// Output could not be written or encoded.
    #[error("unable to write output: {0}")]
    Output(String),
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    let audit = audit_sink(cli.audit_log.as_deref())?;
    let resolver = SecurityResolver::new(ProcessEnv).with_audit(audit);
    match cli.command {
        Commands::Status => command_status(&resolver),
        Commands::Resolve(args) => command_resolve(&resolver, &args),
        Commands::Check(args) => command_check(&resolver, &args),
    }
}

/// Builds the audit sink selected by the CLI flags.
fn audit_sink(path: Option<&Path>) -> CliResult<Arc<dyn SecurityAuditSink>> {
    let Some(path) = path else {
        return Ok(Arc::new(StderrAuditSink));
    };
    let sink = FileAuditSink::new(path).map_err(|source| CliError::AuditLog {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Arc::new(sink))
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `status` command.
fn command_status(resolver: &SecurityResolver) -> CliResult<ExitCode> {
    let report = status_report(resolver)?;
    write_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the status report from a single environment snapshot.
fn status_report<S: EnvSource>(resolver: &SecurityResolver<S>) -> CliResult<StatusReport> {
    let config = resolver.snapshot()?;
    Ok(StatusReport {
        enabled: config.enabled(),
        strategy: config.strategy(),
        enforcement_policy: determine_policy(&config)?,
        lookup: config.lookup(),
        root_directory: config.root_directory().map(PathBuf::from),
        node_directory: config.node_directory().map(PathBuf::from),
    })
}

/// Executes the `resolve` command.
fn command_resolve(resolver: &SecurityResolver, args: &NodeArgs) -> CliResult<ExitCode> {
    let secure_root = resolver.secure_root(&args.name, &args.namespace)?;
    write_json(&ResolveReport {
        name: &args.name,
        namespace: &args.namespace,
        secure_root,
    })?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `check` command.
///
/// Identity and configuration errors are reported as-is; only a resolution
/// failure under a strict policy refuses the node.
fn command_check(resolver: &SecurityResolver, args: &NodeArgs) -> CliResult<ExitCode> {
    let prepared = resolver.prepare_node_decision(&args.name, &args.namespace)?;
    let decision = resolver.decide_node(&prepared).map_err(|source| CliError::Refused {
        node: prepared.identity().to_string(),
        source,
    })?;
    write_json(&CheckReport {
        name: &args.name,
        namespace: &args.namespace,
        decision,
    })?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Serializes `value` as pretty JSON on stdout.
fn write_json(value: &impl Serialize) -> CliResult<()> {
    let payload =
        serde_json::to_string_pretty(value).map_err(|err| CliError::Output(err.to_string()))?;
    write_stdout_line(&payload).map_err(|err| CliError::Output(err.to_string()))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(&format!("error: {message}"));
    ExitCode::FAILURE
}
