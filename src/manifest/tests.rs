#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use std::fs;

const APP_MANIFEST: &str = r#"[package]
name = "hello-app"
version = "0.1.0"
edition = "2021"

[dependencies]
serde = { version = "1", features = ["derive"] }
anyhow = "1.0"
shared = { workspace = true }
local = { path = "../local" }
"#;

fn parse(contents: &str) -> Manifest {
    Manifest::parse(Path::new("/tmp/app/Cargo.toml"), contents).unwrap()
}

#[test]
fn test_module_path_from_package_name() {
    let manifest = parse(APP_MANIFEST);
    assert_eq!(manifest.package_name(), "hello-app");
    assert_eq!(manifest.module_path(), "hello_app");
    assert_eq!(manifest.dir(), Path::new("/tmp/app"));
    assert_eq!(manifest.source_dir(), Path::new("/tmp/app/src"));
    assert_eq!(manifest.lib_root(), Path::new("/tmp/app/src/lib.rs"));
}

#[test]
fn test_lib_section_overrides_identity() {
    let manifest = parse(
        r#"[package]
name = "hello-app"

[lib]
name = "hello"
path = "code/root.rs"
"#,
    );
    assert_eq!(manifest.module_path(), "hello");
    assert_eq!(manifest.source_dir(), Path::new("/tmp/app/code"));
    assert_eq!(manifest.lib_root(), Path::new("/tmp/app/code/root.rs"));
}

#[test]
fn test_requirements_in_document_order() {
    let manifest = parse(APP_MANIFEST);
    let reqs = manifest.requirements();
    let names: Vec<_> = reqs.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["serde", "anyhow", "shared", "local"]);
    assert_eq!(reqs[0].spec.version(), Some("1"));
    assert_eq!(reqs[1].spec, DependencySpec::Version("1.0".to_string()));
    assert!(matches!(
        reqs[2].spec,
        DependencySpec::Workspace {
            workspace: true,
            ..
        }
    ));
    assert_eq!(reqs[3].spec.version(), None);
}

#[test]
fn test_add_requirement_appends_once() {
    let mut manifest = parse(APP_MANIFEST);
    assert_eq!(
        manifest.add_requirement(Requirement::version("axum", "0.8")),
        RequirementEdit::Added
    );
    assert_eq!(
        manifest.add_requirement(Requirement::version("axum", "0.7")),
        RequirementEdit::Unchanged
    );
    assert!(!manifest
        .add_requirement(Requirement::version("anyhow", "2"))
        .changed());

    let reqs = manifest.requirements();
    assert_eq!(reqs.last().unwrap(), &Requirement::version("axum", "0.8"));
    assert_eq!(reqs.len(), 5);
}

fn tokio() -> Requirement {
    Requirement::new(
        "tokio",
        DependencySpec::with_features("1", &["macros", "rt-multi-thread", "net"]),
    )
}

#[test]
fn test_add_requirement_enables_missing_features() {
    let mut manifest = parse("[package]\nname = \"app\"\n\n[dependencies]\ntokio = \"1.40\"\n");
    assert_eq!(
        manifest.add_requirement(tokio()),
        RequirementEdit::FeaturesAdded(vec![
            "macros".to_string(),
            "rt-multi-thread".to_string(),
            "net".to_string(),
        ])
    );
    let reqs = manifest.requirements();
    assert_eq!(reqs.len(), 1);
    assert_eq!(
        reqs[0].spec,
        DependencySpec::with_features("1.40", &["macros", "rt-multi-thread", "net"])
    );

    // already satisfied now
    assert_eq!(manifest.add_requirement(tokio()), RequirementEdit::Unchanged);
}

#[test]
fn test_add_requirement_keeps_existing_features_and_source() {
    let mut manifest = parse(
        r#"[package]
name = "app"

[dependencies]
tokio = { version = "1", features = ["sync", "macros"], default-features = false }
"#,
    );
    assert_eq!(
        manifest.add_requirement(tokio()),
        RequirementEdit::FeaturesAdded(vec!["rt-multi-thread".to_string(), "net".to_string()])
    );

    let text = String::from_utf8(manifest.to_bytes().unwrap()).unwrap();
    let document: toml::Table = toml::from_str(&text).unwrap();
    let entry = &document["dependencies"]["tokio"];
    assert_eq!(entry["version"].as_str(), Some("1"));
    assert_eq!(entry["default-features"].as_bool(), Some(false));
    let features: Vec<_> = entry["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_str().unwrap())
        .collect();
    assert_eq!(features, ["sync", "macros", "rt-multi-thread", "net"]);
}

#[test]
fn test_add_requirement_on_workspace_dependency() {
    let mut manifest = parse("[package]\nname = \"app\"\n\n[dependencies]\ntokio = { workspace = true }\n");
    assert!(manifest.add_requirement(tokio()).changed());
    assert_eq!(
        manifest.requirements()[0].spec,
        DependencySpec::Workspace {
            workspace: true,
            features: Some(vec![
                "macros".to_string(),
                "rt-multi-thread".to_string(),
                "net".to_string(),
            ]),
        }
    );
}

#[test]
fn test_to_bytes_drops_comments_but_keeps_entries() {
    let mut manifest = parse(
        r#"# my crate
[package]
name = "app"

[dependencies]
# runtime
serde = { version = "1", features = ["derive"] }
"#,
    );
    manifest.add_requirement(Requirement::version("axum", "0.8"));
    let text = String::from_utf8(manifest.to_bytes().unwrap()).unwrap();

    assert!(!text.contains('#'));
    let reparsed = Manifest::parse(manifest.path(), &text).unwrap();
    let names: Vec<_> = reparsed.requirements().into_iter().map(|r| r.name).collect();
    assert_eq!(names, ["serde", "axum"]);
    assert_eq!(
        reparsed.requirements()[0].spec,
        DependencySpec::with_features("1", &["derive"])
    );
}

#[test]
fn test_add_requirement_creates_dependencies_table() {
    let mut manifest = parse("[package]\nname = \"bare\"\n");
    assert!(manifest.requirements().is_empty());
    manifest.add_requirement(Requirement::new(
        "tokio",
        DependencySpec::with_features("1", &["macros", "rt-multi-thread"]),
    ));

    let text = String::from_utf8(manifest.to_bytes().unwrap()).unwrap();
    let reparsed = Manifest::parse(Path::new("/tmp/bare/Cargo.toml"), &text).unwrap();
    let reqs = reparsed.requirements();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].name, "tokio");
    assert_eq!(
        reqs[0].spec,
        DependencySpec::with_features("1", &["macros", "rt-multi-thread"])
    );
}

#[test]
fn test_serialization_keeps_sections_and_order() {
    let mut manifest = parse(APP_MANIFEST);
    manifest.add_requirement(Requirement::version("axum", "0.8"));
    let text = String::from_utf8(manifest.to_bytes().unwrap()).unwrap();

    let package = text.find("[package]").unwrap();
    let deps = text.find("[dependencies]").unwrap();
    assert!(package < deps);
    assert!(text.contains("axum = \"0.8\""));
    assert!(text.find("anyhow").unwrap() < text.find("axum").unwrap());

    let reparsed = Manifest::parse(manifest.path(), &text).unwrap();
    assert_eq!(reparsed.package_name(), "hello-app");
}

#[test]
fn test_parse_errors() {
    let path = Path::new("/tmp/x/Cargo.toml");
    assert!(matches!(
        Manifest::parse(path, "[package\nname = 1"),
        Err(Error::ManifestParse { .. })
    ));
    // workspace-only manifest
    assert!(matches!(
        Manifest::parse(path, "[workspace]\nmembers = []\n"),
        Err(Error::ManifestParse { .. })
    ));
    assert!(matches!(
        Manifest::parse(path, "dependencies = 3\n[package]\nname = \"x\"\n"),
        Err(Error::ManifestParse { .. })
    ));
}

#[test]
fn test_find_manifest_walks_up() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("src").join("api").join("users");
    fs::create_dir_all(&nested).unwrap();
    fs::write(dir.path().join(MANIFEST_FILE), APP_MANIFEST).unwrap();

    let manifest = find_manifest(&nested).unwrap();
    assert_eq!(manifest.module_path(), "hello_app");
    assert_eq!(
        fs::canonicalize(manifest.dir()).unwrap(),
        fs::canonicalize(dir.path()).unwrap()
    );
}

#[test]
fn test_find_manifest_prefers_nearest() {
    let dir = tempfile::tempdir().unwrap();
    let inner = dir.path().join("crates").join("inner");
    fs::create_dir_all(&inner).unwrap();
    fs::write(dir.path().join(MANIFEST_FILE), APP_MANIFEST).unwrap();
    fs::write(inner.join(MANIFEST_FILE), "[package]\nname = \"inner\"\n").unwrap();

    assert_eq!(find_manifest(&inner).unwrap().module_path(), "inner");
}

#[test]
fn test_find_manifest_not_found() {
    let dir = tempfile::tempdir().unwrap();
    // Only meaningful when no ancestor of the temp dir has a Cargo.toml.
    let has_ancestor_manifest = fs::canonicalize(dir.path())
        .unwrap()
        .ancestors()
        .any(|a| a.join(MANIFEST_FILE).is_file());
    if has_ancestor_manifest {
        return;
    }
    assert!(matches!(
        find_manifest(dir.path()),
        Err(Error::ManifestNotFound { .. })
    ));
}

#[test]
fn test_write_atomic_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(MANIFEST_FILE);
    fs::write(&path, APP_MANIFEST).unwrap();

    let mut manifest = Manifest::load(&path).unwrap();
    manifest.add_requirement(Requirement::version("axum", "0.8"));
    manifest.write_atomic(&path).unwrap();

    let reloaded = Manifest::load(&path).unwrap();
    assert!(reloaded.has_requirement("axum"));
    assert!(reloaded.has_requirement("serde"));
}
