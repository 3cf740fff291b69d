#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use crate::directive::Method;
use crate::manifest::find_manifest;
use std::collections::HashSet;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn package(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Cargo.toml",
        "[package]\nname = \"app\"\nversion = \"0.1.0\"\nedition = \"2021\"\n",
    );
    for (rel, contents) in files {
        write(dir.path(), rel, contents);
    }
    dir
}

fn scan_dir(dir: &Path, policy: ScanPolicy) -> Result<ScanReport> {
    let manifest = find_manifest(dir)?;
    scan(dir, &manifest, policy)
}

fn handlers(report: &ScanReport) -> Vec<String> {
    report.routes.iter().map(Route::handler_path).collect()
}

const PING: &str = r#"
use std::fmt;

/// Says hello.
///
/// do:api raw method=GET path=/ping
pub async fn Hello() -> &'static str {
    "Hello, World!"
}
"#;

#[test]
fn test_single_annotated_handler() {
    let dir = package(&[("src/lib.rs", "pub mod ping;\n"), ("src/ping.rs", PING)]);
    let report = scan_dir(dir.path(), ScanPolicy::Lenient).unwrap();

    assert_eq!(report.routes.len(), 1);
    let route = report.routes.iter().next().unwrap();
    assert_eq!(route.method(), Method::Get);
    assert_eq!(route.effective_path(), "/ping");
    assert_eq!(route.import_path, "app::ping");
    assert_eq!(route.package_name, "ping");
    assert_eq!(route.function_name, "Hello");
    assert!(report.diagnostics.is_empty());
    assert_eq!(report.files_scanned, 2);
}

#[test]
fn test_only_exported_functions_with_trailing_directive() {
    let src = r#"
/// do:api
pub fn first() {}

/// do:api
fn private() {}

/// do:api
pub(crate) fn crate_only() {}

pub fn undocumented() {}

/// do:api path=/not-last
/// More docs after the directive.
pub fn directive_not_last() {}

/// Mentions do:api in prose.
pub fn prose() {}

/// do:api method=POST
///
pub fn trailing_blank_line() {}

/** Block docs.
    do:api method=PUT
*/
pub fn block_doc() {}

#[doc = "do:api method=DELETE"]
pub fn doc_attribute() {}

pub struct Server;

impl Server {
    /// do:api
    pub fn method_on_type(&self) {}
}
"#;
    let dir = package(&[("src/lib.rs", "pub mod handlers;\n"), ("src/handlers.rs", src)]);
    let report = scan_dir(dir.path(), ScanPolicy::Lenient).unwrap();

    let found: Vec<_> = report
        .routes
        .iter()
        .map(|r| (r.function_name.as_str(), r.method()))
        .collect();
    assert_eq!(
        found,
        [
            ("first", Method::Get),
            ("trailing_blank_line", Method::Post),
            ("block_doc", Method::Put),
            ("doc_attribute", Method::Delete),
        ]
    );
    assert!(report.diagnostics.is_empty());
}

#[test]
fn test_module_paths_and_traversal_order() {
    let dir = package(&[
        ("src/lib.rs", "pub mod api;\npub mod ping;\n\n/// do:api\npub fn health() {}\n"),
        ("src/api/mod.rs", "pub mod users;\n\n/// do:api\npub fn index() {}\n"),
        (
            "src/api/users.rs",
            "/// do:api\npub fn list() {}\n\n/// do:api method=POST\npub fn create() {}\n",
        ),
        ("src/ping.rs", "/// do:api\npub fn pong() {}\n"),
    ]);
    let report = scan_dir(dir.path(), ScanPolicy::Lenient).unwrap();

    assert_eq!(
        handlers(&report),
        [
            "app::api::index",
            "app::api::users::list",
            "app::api::users::create",
            "app::health",
            "app::ping::pong",
        ]
    );
    let paths: Vec<_> = report.routes.iter().map(Route::effective_path).collect();
    assert_eq!(
        paths,
        [
            "/api.index",
            "/api.users.list",
            "/api.users.create",
            "/health",
            "/ping.pong",
        ]
    );
}

#[test]
fn test_public_inline_modules_extend_the_path() {
    let src = r#"
pub mod v1 {
    /// do:api
    pub fn status() {}

    mod hidden {
        /// do:api
        pub fn secret() {}
    }
}
"#;
    let dir = package(&[("src/lib.rs", "pub mod api;\n"), ("src/api.rs", src)]);
    let report = scan_dir(dir.path(), ScanPolicy::Lenient).unwrap();
    assert_eq!(handlers(&report), ["app::api::v1::status"]);
}

#[test]
fn test_binary_targets_and_foreign_dirs_are_skipped() {
    let handler = "/// do:api\npub fn handler() {}\n";
    let dir = package(&[
        ("src/lib.rs", "pub mod ping;\n"),
        ("src/ping.rs", handler),
        ("src/main.rs", handler),
        ("src/bin/tool.rs", handler),
        ("tests/it.rs", handler),
        ("build.rs", handler),
        ("target/debug/build/gen.rs", "this is not rust"),
        ("src/.hidden/x.rs", "neither is this"),
        ("src/not-a-module.rs", handler),
    ]);
    let report = scan_dir(dir.path(), ScanPolicy::Lenient).unwrap();
    assert_eq!(handlers(&report), ["app::ping::handler"]);
    assert_eq!(report.unreachable.len(), 1);
    assert!(report.unreachable[0].ends_with("src/not-a-module.rs"));
}

#[test]
fn test_malformed_directive_lenient() {
    let src = "/// do:api method=\npub fn broken() {}\n\n/// do:api\npub fn fine() {}\n";
    let dir = package(&[("src/lib.rs", "pub mod ping;\n"), ("src/ping.rs", src)]);
    let report = scan_dir(dir.path(), ScanPolicy::Lenient).unwrap();

    assert_eq!(handlers(&report), ["app::ping::fine"]);
    assert_eq!(report.diagnostics.len(), 1);
    let diag = &report.diagnostics[0];
    assert_eq!(diag.function, "broken");
    assert_eq!(diag.import_path, "app::ping");
    assert_eq!(diag.line, 2);
    assert_eq!(
        diag.error,
        DirectiveError::InvalidOption {
            token: "method=".to_string()
        }
    );
}

#[test]
fn test_unknown_directive_kind_is_a_diagnostic() {
    let src = "/// do:cron every=5m\npub fn tick() {}\n";
    let dir = package(&[("src/lib.rs", src)]);
    let report = scan_dir(dir.path(), ScanPolicy::Lenient).unwrap();

    assert!(report.routes.is_empty());
    assert!(matches!(
        report.diagnostics[0].error,
        DirectiveError::UnknownDirective { .. }
    ));
    assert_eq!(report.diagnostics[0].import_path, "app");
}

#[test]
fn test_malformed_directive_strict() {
    let src = "/// do:api do:ping\npub fn broken() {}\n";
    let dir = package(&[("src/lib.rs", "pub mod ping;\n"), ("src/ping.rs", src)]);
    let err = scan_dir(dir.path(), ScanPolicy::Strict).unwrap_err();

    match err {
        Error::Directive {
            function, source, ..
        } => {
            assert_eq!(function, "broken");
            assert!(matches!(source, DirectiveError::InvalidDirective { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_syntax_error_aborts_scan() {
    let dir = package(&[
        ("src/lib.rs", "pub mod ping;\npub mod broken;\n"),
        ("src/ping.rs", PING),
        ("src/broken.rs", "pub fn oops( {\n"),
    ]);
    let err = scan_dir(dir.path(), ScanPolicy::Lenient).unwrap_err();

    match err {
        Error::SourceParse { path, .. } => assert!(path.ends_with("src/broken.rs")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_scan_subtree_only() {
    let dir = package(&[
        ("src/lib.rs", "pub mod api;\npub mod ping;\n"),
        ("src/api/mod.rs", "/// do:api\npub fn index() {}\n"),
        ("src/ping.rs", "/// do:api\npub fn pong() {}\n"),
    ]);
    let manifest = find_manifest(dir.path()).unwrap();
    let report = scan(&dir.path().join("src/api"), &manifest, ScanPolicy::Lenient).unwrap();
    assert_eq!(handlers(&report), ["app::api::index"]);
}

#[test]
fn test_repeated_scans_are_stable() {
    let dir = package(&[
        ("src/lib.rs", "pub mod b;\npub mod a;\n"),
        ("src/b.rs", "/// do:api\npub fn two() {}\n"),
        ("src/a.rs", "/// do:api\npub fn one() {}\n"),
    ]);
    let first = scan_dir(dir.path(), ScanPolicy::Lenient).unwrap();
    let second = scan_dir(dir.path(), ScanPolicy::Lenient).unwrap();

    let as_set = |r: &ScanReport| r.routes.iter().cloned().collect::<HashSet<_>>();
    assert_eq!(as_set(&first), as_set(&second));
    assert_eq!(first.routes, second.routes);
    assert_eq!(handlers(&first), ["app::a::one", "app::b::two"]);
}

#[test]
fn test_private_and_undeclared_modules_are_not_exported() {
    let handler = "/// do:api\npub fn handler() {}\n";
    let dir = package(&[
        ("src/lib.rs", "mod ping;\npub(crate) mod internal;\npub mod api;\n"),
        ("src/ping.rs", handler),
        ("src/internal.rs", handler),
        ("src/orphan.rs", handler),
        ("src/api.rs", "mod helpers;\n\n/// do:api\npub fn index() {}\n"),
        ("src/api/helpers.rs", handler),
    ]);
    let report = scan_dir(dir.path(), ScanPolicy::Strict).unwrap();

    assert_eq!(handlers(&report), ["app::api::index"]);
    assert_eq!(report.files_scanned, 2);
    let unreachable: Vec<_> = report
        .unreachable
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap())
        .collect();
    assert_eq!(unreachable, ["helpers.rs", "internal.rs", "orphan.rs", "ping.rs"]);
}

#[test]
fn test_module_declarations_resolve_files() {
    let handler = "/// do:api\npub fn handler() {}\n";
    let dir = package(&[
        (
            "src/lib.rs",
            "pub mod api;\n#[path = \"legacy/old_impl.rs\"]\npub mod legacy;\n#[cfg(test)]\npub mod tests;\n",
        ),
        ("src/api.rs", "pub mod users;\npub mod v2 {\n    pub mod items;\n}\n"),
        ("src/api/users.rs", handler),
        ("src/api/v2/items.rs", handler),
        ("src/legacy/old_impl.rs", "pub mod nested;\n"),
        ("src/legacy/nested.rs", handler),
        ("src/tests.rs", handler),
    ]);
    let report = scan_dir(dir.path(), ScanPolicy::Strict).unwrap();

    assert_eq!(
        handlers(&report),
        [
            "app::api::users::handler",
            "app::api::v2::items::handler",
            "app::legacy::nested::handler",
        ]
    );
    assert_eq!(report.unreachable.len(), 1);
    assert!(report.unreachable[0].ends_with("src/tests.rs"));
}

#[test]
fn test_module_named_target_is_scanned() {
    let dir = package(&[
        ("src/lib.rs", "pub mod target;\n"),
        ("src/target/mod.rs", "/// do:api\npub fn aim() {}\n"),
        ("target/debug/build/gen.rs", "this is not rust"),
    ]);
    let report = scan_dir(dir.path(), ScanPolicy::Lenient).unwrap();
    assert_eq!(handlers(&report), ["app::target::aim"]);
    assert!(report.unreachable.is_empty());
}

#[test]
fn test_missing_library_root_exports_nothing() {
    let dir = package(&[("src/ping.rs", "/// do:api\npub fn pong() {}\n")]);
    let report = scan_dir(dir.path(), ScanPolicy::Lenient).unwrap();
    assert!(report.routes.is_empty());
    assert_eq!(report.unreachable.len(), 1);
}

#[test]
fn test_directive_line_trims_and_requires_prefix() {
    let func: ItemFn = syn::parse_quote! {
        /// Summary.
        ///    do:api path=/x
        pub fn f() {}
    };
    assert_eq!(directive_line(&func.attrs).as_deref(), Some("do:api path=/x"));

    let func: ItemFn = syn::parse_quote! {
        /// do:api
        /// trailing prose
        pub fn f() {}
    };
    assert_eq!(directive_line(&func.attrs), None);
}
