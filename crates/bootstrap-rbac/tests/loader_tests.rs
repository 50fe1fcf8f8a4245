//! Tests for reading service descriptions from an RBAC configuration directory.

use bootstrap_rbac::{load_service, RbacError, ResourceEntry};
use std::fs;

#[test]
fn test_load_service_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("inventory.json"),
        r#"{
            "hosts": [{"verb": "read"}, {"verb": "write"}],
            "*": [{"verb": "*"}, {"verb": "admin"}]
        }"#,
    )
    .unwrap();

    let service = load_service(dir.path(), "inventory").unwrap();

    assert_eq!(service.name, "inventory");
    assert_eq!(
        service.resources,
        vec![
            ResourceEntry::Concrete {
                name: "hosts".to_string(),
                permissions: vec!["read".to_string(), "write".to_string()],
            },
            ResourceEntry::Wildcard {
                permissions: vec!["admin".to_string()],
            },
        ]
    );
}

#[test]
fn test_load_missing_service() {
    let dir = tempfile::tempdir().unwrap();

    let err = load_service(dir.path(), "absent").unwrap_err();
    assert!(err.is_io());
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn test_load_malformed_service() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

    let err = load_service(dir.path(), "broken").unwrap_err();
    assert!(matches!(err, RbacError::Decode { ref service, .. } if service == "broken"));
}
