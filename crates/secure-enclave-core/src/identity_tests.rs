// crates/secure-enclave-core/src/identity_tests.rs
// ============================================================================
// Module: Node Identity Unit Tests
// Description: Unit coverage for node name and namespace validation.
// Purpose: Ensure malformed identities are rejected as invalid arguments.
// Dependencies: secure-enclave-core
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use crate::error::SecurityErrorKind;
use crate::identity::NodeIdentity;
use crate::identity::qualified_name;

fn rejected(name: &str, namespace: &str) -> bool {
    NodeIdentity::new(name, namespace)
        .is_err_and(|err| err.kind() == SecurityErrorKind::InvalidArgument)
}

#[test]
fn accepts_nested_namespace() {
    let identity = NodeIdentity::new("c", "/a/b").expect("valid identity");
    assert_eq!(identity.name(), "c");
    assert_eq!(identity.namespace(), "/a/b");
    assert_eq!(identity.namespace_tokens().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(identity.to_string(), "/a/b/c");
}

#[test]
fn accepts_root_namespace() {
    let identity = NodeIdentity::new("talker", "/").expect("valid identity");
    assert_eq!(identity.namespace_tokens().count(), 0);
    assert_eq!(identity.to_string(), "/talker");
}

#[test]
fn rejects_empty_parts() {
    assert!(rejected("", "/a"));
    assert!(rejected("c", ""));
    assert!(rejected("c", "/a//b"));
    assert!(rejected("c", "/a/"));
}

#[test]
fn rejects_relative_namespace() {
    assert!(rejected("c", "a/b"));
}

#[test]
fn rejects_separators_and_dot_segments_in_name() {
    assert!(rejected("a/c", "/"));
    assert!(rejected("a\\c", "/"));
    assert!(rejected("..", "/"));
    assert!(rejected("c", "/a/../b"));
}

#[test]
fn rejects_filesystem_hostile_characters() {
    assert!(rejected("c\0d", "/"));
    assert!(rejected("c", "/a:b"));
    assert!(rejected("c d", "/"));
    assert!(rejected("caf\u{e9}", "/"));
}

#[test]
fn rejects_leading_digits() {
    assert!(rejected("1node", "/"));
    assert!(rejected("node", "/2ns"));
    assert!(NodeIdentity::new("_node2", "/_ns3").is_ok());
}

#[test]
fn rejects_oversized_tokens() {
    let long = "n".repeat(256);
    assert!(rejected(&long, "/"));
    assert!(rejected("c", &format!("/{long}")));
    assert!(NodeIdentity::new(&"n".repeat(255), "/").is_ok());
}

#[test]
fn qualified_name_labels_unvalidated_parts() {
    assert_eq!(qualified_name("talker", "/"), "/talker");
    assert_eq!(qualified_name("c", "/a/b"), "/a/b/c");
    assert_eq!(qualified_name("bad/name", "/a"), "/a/bad/name");
    assert_eq!(qualified_name("c", "/a/"), "/a/c");
}
