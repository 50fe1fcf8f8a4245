//! End-to-end tests for the document-level workflows.
//!
//! Each test works on a bootstrap document in a temporary directory:
//! 1. create the starter document
//! 2. add permissions to a resource type
//! 3. import a service from an RBAC configuration directory

use bootstrap_schema::{
    add_resource_permissions, create_bootstrap_file, import_rbac_service, ErrorKind, ImportOptions, SchemaDocument,
    SchemaError, WildcardPolicy,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Temporary workspace holding a bootstrap document and an RBAC directory.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// Create a workspace with a fresh bootstrap document.
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Self { dir };
        assert!(create_bootstrap_file(fixture.bootstrap()).unwrap());
        fs::create_dir(fixture.rbac_dir()).unwrap();
        fixture
    }

    fn bootstrap(&self) -> PathBuf {
        self.dir.path().join("bootstrap.yaml")
    }

    fn rbac_dir(&self) -> PathBuf {
        self.dir.path().join("rbac")
    }

    fn write_service(&self, name: &str, json: &str) {
        fs::write(self.rbac_dir().join(format!("{name}.json")), json).unwrap();
    }

    fn load(&self) -> SchemaDocument {
        SchemaDocument::load(self.bootstrap()).unwrap()
    }
}

#[test]
fn test_add_permissions_in_place() {
    let fx = Fixture::new();

    let summary = add_resource_permissions(fx.bootstrap(), fx.bootstrap(), "Inventory/Hosts", &["read", "write"]).unwrap();
    assert_eq!(summary.created_definitions, vec!["inventory/hosts"]);

    let document = fx.load();
    let schema = document.schema();
    assert_eq!(
        schema.permissions(),
        vec![
            "inventory_all_all",
            "inventory_all_read",
            "inventory_all_write",
            "inventory_hosts_all",
            "inventory_hosts_read",
            "inventory_hosts_write",
        ]
    );
    let hosts = schema.get("inventory/hosts").unwrap();
    assert!(hosts.has_relation("workspace"));
    assert!(hosts.has_relation("read"));
    assert!(hosts.has_relation("write"));
}

#[test]
fn test_add_permissions_to_separate_output() {
    let fx = Fixture::new();
    let output = fx.dir.path().join("out.yaml");
    let original = fs::read_to_string(fx.bootstrap()).unwrap();

    add_resource_permissions(fx.bootstrap(), &output, "svc/res", &["read"]).unwrap();

    assert_eq!(fs::read_to_string(fx.bootstrap()).unwrap(), original);
    let written = SchemaDocument::load(&output).unwrap();
    assert!(written.schema().has_permission("svc_res_read"));
}

#[test]
fn test_malformed_resource_leaves_file_untouched() {
    let fx = Fixture::new();
    let original = fs::read_to_string(fx.bootstrap()).unwrap();

    let err = add_resource_permissions(fx.bootstrap(), fx.bootstrap(), "no-slash", &["read"]).unwrap_err();
    assert!(matches!(err, SchemaError::MalformedResource(_)));
    assert_eq!(err.kind(), ErrorKind::MalformedArgument);
    assert!(err
        .to_string()
        .contains("should be <service_name>/<resource_type>"));

    assert_eq!(fs::read_to_string(fx.bootstrap()).unwrap(), original);
}

#[test]
fn test_repeated_add_is_stable() {
    let fx = Fixture::new();

    add_resource_permissions(fx.bootstrap(), fx.bootstrap(), "svc/res", &["read"]).unwrap();
    let first = fs::read_to_string(fx.bootstrap()).unwrap();

    let summary = add_resource_permissions(fx.bootstrap(), fx.bootstrap(), "svc/res", &["read"]).unwrap();
    assert!(summary.is_empty());
    assert_eq!(fs::read_to_string(fx.bootstrap()).unwrap(), first);
}

#[test]
fn test_import_service() {
    let fx = Fixture::new();
    fx.write_service(
        "inventory",
        r#"{
            "hosts": [{"verb": "read"}, {"verb": "*"}],
            "groups": [{"verb": "read"}],
            "*": [{"verb": "admin"}]
        }"#,
    );

    let summary = import_rbac_service(
        fx.bootstrap(),
        fx.bootstrap(),
        fx.rbac_dir(),
        "inventory",
        &ImportOptions::default(),
    )
    .unwrap();
    assert_eq!(summary.created_definitions, vec!["inventory/hosts", "inventory/groups"]);

    let document = fx.load();
    let schema = document.schema();
    assert!(schema.has_permission("inventory_all_admin"));
    assert!(schema.has_permission("inventory_groups_read"));
    assert!(schema.get("inventory/*").is_none());
    assert!(!schema.get("inventory/hosts").unwrap().has_relation("all"));
}

#[test]
fn test_import_service_skip_wildcards() {
    let fx = Fixture::new();
    fx.write_service("inventory", r#"{ "*": [{"verb": "admin"}] }"#);

    let options = ImportOptions {
        wildcard: WildcardPolicy::Skip,
    };
    let summary = import_rbac_service(fx.bootstrap(), fx.bootstrap(), fx.rbac_dir(), "inventory", &options).unwrap();

    assert!(summary.is_empty());
    assert_eq!(fx.load().schema().permission_count(), 0);
}

#[test]
fn test_import_missing_service_is_io() {
    let fx = Fixture::new();
    let original = fs::read_to_string(fx.bootstrap()).unwrap();

    let err = import_rbac_service(
        fx.bootstrap(),
        fx.bootstrap(),
        fx.rbac_dir(),
        "absent",
        &ImportOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(fs::read_to_string(fx.bootstrap()).unwrap(), original);
}

#[test]
fn test_missing_input_document() {
    let fx = Fixture::new();
    let missing = fx.dir.path().join("missing.yaml");

    let err = add_resource_permissions(&missing, &missing, "svc/res", &["read"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!missing.exists());
}

#[test]
fn test_relationships_preserved() {
    let fx = Fixture::new();
    let document = fs::read_to_string(fx.bootstrap())
        .unwrap()
        .replace("relationships: \"\"", "relationships: workspace:root#parent@workspace:child");
    fs::write(fx.bootstrap(), document).unwrap();

    add_resource_permissions(fx.bootstrap(), fx.bootstrap(), "svc/res", &["read"]).unwrap();

    let stored: serde_yaml::Mapping = serde_yaml::from_str(&fs::read_to_string(fx.bootstrap()).unwrap()).unwrap();
    assert_eq!(
        stored.get("relationships").and_then(serde_yaml::Value::as_str),
        Some("workspace:root#parent@workspace:child")
    );
}
