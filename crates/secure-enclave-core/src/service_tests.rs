// crates/secure-enclave-core/src/service_tests.rs
// ============================================================================
// Module: Security Resolver Service Unit Tests
// Description: Unit coverage for resolver entry points and audit emission.
// Purpose: Ensure failures are audited and successful lookups stay silent.
// Dependencies: secure-enclave-core, tempfile
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::panic,
    clippy::unwrap_used,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::fs;
use std::sync::Arc;
use std::sync::Mutex;

use tempfile::TempDir;

use crate::audit::AuditOutcome;
use crate::audit::SecurityAuditEvent;
use crate::audit::SecurityAuditSink;
use crate::audit::SecurityOperation;
use crate::decision::NodeSecurityDecision;
use crate::env::MapEnv;
use crate::env::SecurityEnv;
use crate::error::SecurityErrorKind;
use crate::policy::EnforcementPolicy;
use crate::resolver::SecureRootDirectory;
use crate::service::SecurityResolver;

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<SecurityAuditEvent>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<SecurityAuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl SecurityAuditSink for RecordingSink {
    fn record(&self, event: &SecurityAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn resolver(env: MapEnv) -> (SecurityResolver<MapEnv>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let resolver = SecurityResolver::new(env).with_audit(sink.clone());
    (resolver, sink)
}

fn enclave_tree(dirs: &[&str]) -> TempDir {
    let root = tempfile::tempdir().expect("tempdir");
    for dir in dirs {
        fs::create_dir_all(root.path().join(dir)).expect("create enclave dir");
    }
    root
}

// ============================================================================
// SECTION: Audit Emission
// ============================================================================

#[test]
fn successful_resolution_is_not_audited() {
    let tree = enclave_tree(&["a/b/c"]);
    let env = MapEnv::new().with(SecurityEnv::RootDirectory, tree.path().to_str().unwrap());
    let (resolver, sink) = resolver(env);

    let root = resolver.secure_root("c", "/a/b").expect("resolves");
    assert_eq!(root.as_path(), tree.path().join("a/b/c"));
    assert!(resolver.use_security().is_ok());
    assert!(resolver.enforcement_policy().is_ok());
    assert!(sink.events().is_empty());
}

#[test]
fn invalid_identity_is_audited_with_node_label() {
    let (resolver, sink) = resolver(MapEnv::new().with(SecurityEnv::RootDirectory, "/secure"));

    let err = resolver.secure_root("bad/name", "/a").expect_err("invalid name");
    assert_eq!(err.kind(), SecurityErrorKind::InvalidArgument);

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].operation, SecurityOperation::SecureRoot);
    assert_eq!(events[0].outcome, AuditOutcome::Error);
    assert_eq!(events[0].error_kind, SecurityErrorKind::InvalidArgument);
    assert_eq!(events[0].node.as_deref(), Some("/a/bad/name"));
}

#[test]
fn invalid_policy_is_audited() {
    let (resolver, sink) = resolver(MapEnv::new().with(SecurityEnv::EnforcementPolicy, "maybe"));

    let err = resolver.enforcement_policy().expect_err("invalid policy");
    assert_eq!(err.kind(), SecurityErrorKind::InvalidConfiguration);
    assert_eq!(sink.events()[0].operation, SecurityOperation::EnforcementPolicy);
}

#[test]
fn audit_event_serializes_stable_labels() {
    let (resolver, sink) = resolver(MapEnv::new().with(SecurityEnv::Enable, "perhaps"));
    assert!(resolver.use_security().is_err());

    let payload = serde_json::to_value(&sink.events()[0]).expect("serialize event");
    assert_eq!(payload["event"], "security_resolution");
    assert_eq!(payload["operation"], "use_security");
    assert_eq!(payload["outcome"], "error");
    assert_eq!(payload["error_kind"], "invalid_configuration");
}

// ============================================================================
// SECTION: Node Decisions
// ============================================================================

#[test]
fn decision_is_disabled_without_enable_flag() {
    let (resolver, sink) = resolver(MapEnv::new());
    let decision = resolver.node_security_decision("c", "/a/b").expect("decision");
    assert_eq!(decision, NodeSecurityDecision::Disabled);
    assert!(sink.events().is_empty());
}

#[test]
fn decision_is_secured_when_enclave_exists() {
    let tree = enclave_tree(&["a"]);
    let env = MapEnv::new()
        .with(SecurityEnv::Enable, "true")
        .with(SecurityEnv::EnforcementPolicy, "strict")
        .with(SecurityEnv::RootDirectory, tree.path().to_str().unwrap());
    let (resolver, _sink) = resolver(env);

    let decision = resolver.node_security_decision("c", "/a/b").expect("decision");
    let expected = tree.path().join("a");
    assert_eq!(decision.secure_root().map(SecureRootDirectory::as_path), Some(expected.as_path()));
    let NodeSecurityDecision::Secured {
        policy,
        root,
    } = decision
    else {
        panic!("expected secured decision");
    };
    assert_eq!(policy, EnforcementPolicy::Strict);
    assert_eq!(root.as_path(), tree.path().join("a"));
}

#[test]
fn permissive_policy_falls_back_to_unsecured() {
    let tree = enclave_tree(&[]);
    let missing = tree.path().join("missing");
    let env = MapEnv::new()
        .with(SecurityEnv::Enable, "1")
        .with(SecurityEnv::RootDirectory, missing.to_str().unwrap());
    let (resolver, sink) = resolver(env);

    let decision = resolver.node_security_decision("c", "/a/b").expect("decision");
    assert!(matches!(
        decision,
        NodeSecurityDecision::Unsecured {
            reason: SecurityErrorKind::EnclaveNotFound,
            ..
        }
    ));
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, AuditOutcome::PermissiveFallback);
}

#[test]
fn permissive_policy_falls_back_when_root_is_unset() {
    let (resolver, _sink) = resolver(MapEnv::new().with(SecurityEnv::Enable, "on"));
    let decision = resolver.node_security_decision("c", "/").expect("decision");
    assert!(matches!(
        decision,
        NodeSecurityDecision::Unsecured {
            reason: SecurityErrorKind::InvalidConfiguration,
            ..
        }
    ));
}

#[test]
fn strict_policy_refuses_without_enclave() {
    let tree = enclave_tree(&[]);
    let missing = tree.path().join("missing");
    let env = MapEnv::new()
        .with(SecurityEnv::Enable, "yes")
        .with(SecurityEnv::EnforcementPolicy, "STRICT")
        .with(SecurityEnv::RootDirectory, missing.to_str().unwrap());
    let (resolver, sink) = resolver(env);

    let err = resolver.node_security_decision("c", "/a/b").expect_err("strict refusal");
    assert_eq!(err.kind(), SecurityErrorKind::EnclaveNotFound);
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, AuditOutcome::Error);
    assert_eq!(events[0].operation, SecurityOperation::NodeDecision);
}

#[test]
fn invalid_policy_propagates_through_decision() {
    let env = MapEnv::new()
        .with(SecurityEnv::Enable, "true")
        .with(SecurityEnv::EnforcementPolicy, "lenient");
    let (resolver, _sink) = resolver(env);
    let err = resolver.node_security_decision("c", "/").expect_err("invalid policy");
    assert_eq!(err.kind(), SecurityErrorKind::InvalidConfiguration);
}

#[test]
fn unsecured_and_disabled_decisions_have_no_secure_root() {
    let (resolver, _sink) = resolver(MapEnv::new().with(SecurityEnv::Enable, "on"));
    let decision = resolver.node_security_decision("c", "/").expect("decision");
    assert!(decision.secure_root().is_none());
    assert!(NodeSecurityDecision::Disabled.secure_root().is_none());
}

// ============================================================================
// SECTION: Prepared Decisions
// ============================================================================

#[test]
fn preparation_rejects_configuration_errors() {
    let (resolver, sink) = resolver(MapEnv::new().with(SecurityEnv::Enable, "maybe"));
    let err = resolver.prepare_node_decision("c", "/a").expect_err("invalid enable flag");
    assert_eq!(err.kind(), SecurityErrorKind::InvalidConfiguration);
    assert_eq!(sink.events()[0].node.as_deref(), Some("/a/c"));
}

#[test]
fn preparation_rejects_invalid_policy_when_enabled() {
    let env = MapEnv::new()
        .with(SecurityEnv::Enable, "true")
        .with(SecurityEnv::EnforcementPolicy, "lenient");
    let (resolver, _sink) = resolver(env);
    let err = resolver.prepare_node_decision("c", "/a").expect_err("invalid policy");
    assert_eq!(err.kind(), SecurityErrorKind::InvalidConfiguration);
}

#[test]
fn preparation_ignores_policy_when_disabled() {
    let (resolver, _sink) = resolver(MapEnv::new().with(SecurityEnv::EnforcementPolicy, "lenient"));
    let prepared = resolver.prepare_node_decision("c", "/a").expect("prepared");
    assert_eq!(prepared.identity().to_string(), "/a/c");
    assert_eq!(resolver.decide_node(&prepared).expect("decision"), NodeSecurityDecision::Disabled);
}

#[test]
fn prepared_strict_decision_fails_only_on_resolution() {
    let tree = enclave_tree(&[]);
    let env = MapEnv::new()
        .with(SecurityEnv::Enable, "true")
        .with(SecurityEnv::EnforcementPolicy, "strict")
        .with(SecurityEnv::RootDirectory, tree.path().join("missing").to_str().unwrap());
    let (resolver, sink) = resolver(env);

    let prepared = resolver.prepare_node_decision("c", "/a").expect("prepared");
    assert!(sink.events().is_empty());
    let err = resolver.decide_node(&prepared).expect_err("strict refusal");
    assert_eq!(err.kind(), SecurityErrorKind::EnclaveNotFound);
    assert_eq!(sink.events().len(), 1);
}
