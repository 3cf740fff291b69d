//! # Scanner Module
//!
//! Collects every exported library function whose doc comment ends in a
//! `do:` directive.
//!
//! ## Module tree
//!
//! Only code the generated binary can name is considered. Starting at the
//! library root, public `mod` declarations are followed to their files:
//!
//! ```text
//! src/lib.rs       pub mod ping;              → src/ping.rs       (ping)
//! src/lib.rs       pub mod api;               → src/api/mod.rs    (api)
//! src/api/mod.rs   pub mod users;             → src/api/users.rs  (api::users)
//! src/ping.rs      pub mod v2;                → src/ping/v2.rs    (ping::v2)
//! src/lib.rs       #[path = "x.rs"] pub mod y; → src/x.rs          (y)
//! ```
//!
//! Private and `#[cfg(test)]` modules are not descended into. Library
//! sources that no public declaration reaches are listed in
//! [`ScanReport::unreachable`] and otherwise ignored.
//!
//! ## Traversal
//!
//! Route order follows a walk of the scanned root with entries sorted by
//! file name, so it only depends on the tree's contents. Within a file,
//! top-level `pub fn` items are visited in declaration order, descending
//! into public inline modules.
//!
//! ## Malformed directives
//!
//! A function whose last doc line does not start with `do:` is simply not a
//! handler. One whose last line does, but fails to parse, produces a
//! [`ScanDiagnostic`]; [`ScanPolicy`] decides whether that aborts the scan.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use proc_macro2::Span;
use serde::Serialize;
use syn::ext::IdentExt;
use syn::{Attribute, Expr, ExprLit, Item, ItemFn, ItemMod, Lit, Meta, Visibility};
use walkdir::{DirEntry, WalkDir};

use crate::directive::{is_directive_line, parse_directive, Directive};
use crate::error::{DirectiveError, Error, Result};
use crate::manifest::Manifest;
use crate::route::{import_path, Route, RouteSet, PATH_SEP};

/// What to do with a function whose directive fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanPolicy {
    /// Leave the function out and record a diagnostic
    #[default]
    Lenient,
    /// Abort the scan with [`Error::Directive`]
    Strict,
}

/// A directive-shaped doc line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanDiagnostic {
    pub file: PathBuf,
    /// 1-based line of the function name
    pub line: usize,
    pub import_path: String,
    pub function: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: DirectiveError,
}

fn serialize_display<S: serde::Serializer>(
    error: &DirectiveError,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Result of scanning a tree.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub routes: RouteSet,
    pub diagnostics: Vec<ScanDiagnostic>,
    pub files_scanned: usize,
    /// Library sources under the scanned root that are not public modules
    pub unreachable: Vec<PathBuf>,
}

/// Scan `root` for handlers belonging to the library of `manifest`.
///
/// # Errors
///
/// - [`Error::SourceParse`] as soon as any library module fails to parse
/// - [`Error::Directive`] for a malformed directive under [`ScanPolicy::Strict`]
/// - [`Error::Io`] when the tree cannot be read
pub fn scan(root: &Path, manifest: &Manifest, policy: ScanPolicy) -> Result<ScanReport> {
    let root = fs::canonicalize(root).map_err(|e| Error::io(root, e))?;
    let source_dir = canonical_or_raw(manifest.source_dir());
    let lib_root = canonical_or_raw(manifest.lib_root());
    let target_dir = canonical_or_raw(manifest.dir().join("target"));

    let mut modules = ModuleTree::default();
    if lib_root.is_file() {
        modules.load(&lib_root, String::new(), true)?;
    } else {
        tracing::debug!(lib_root = %lib_root.display(), "no library root, nothing is exported");
    }

    let mut scan = Scan {
        module_path: manifest.module_path(),
        policy,
        report: ScanReport::default(),
    };

    tracing::debug!(
        root = %root.display(),
        crate_name = %scan.module_path,
        modules = modules.len(),
        "scanning sources"
    );

    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e, &target_dir));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
            Error::io(path, e.into())
        })?;
        let path = entry.path();
        let is_rust = path.extension().and_then(|ext| ext.to_str()) == Some("rs");
        if !entry.file_type().is_file() || !is_rust {
            continue;
        }

        match modules.take(path) {
            Some(module) => {
                scan.report.files_scanned += 1;
                scan.items(path, &module.package, &module.items)?;
            }
            None if is_library_source(path, &source_dir) => {
                tracing::debug!(file = %path.display(), "not reachable through public modules, skipping");
                scan.report.unreachable.push(path.to_path_buf());
            }
            None => tracing::trace!(file = %path.display(), "not a library source"),
        }
    }

    let report = scan.report;
    tracing::debug!(
        files = report.files_scanned,
        routes = report.routes.len(),
        diagnostics = report.diagnostics.len(),
        unreachable = report.unreachable.len(),
        "scan finished"
    );
    Ok(report)
}

fn canonical_or_raw(path: PathBuf) -> PathBuf {
    fs::canonicalize(&path).unwrap_or(path)
}

/// Hidden directories anywhere, and the package's own build directory.
fn is_skipped_dir(entry: &DirEntry, target_dir: &Path) -> bool {
    entry.file_type().is_dir()
        && (entry.path() == target_dir
            || entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.')))
}

/// Sources under the library directory that are not binary targets.
fn is_library_source(file: &Path, source_dir: &Path) -> bool {
    let Ok(rel) = file.strip_prefix(source_dir) else {
        return false;
    };
    let first = rel.components().next().map(|c| c.as_os_str());
    rel != Path::new("main.rs") && first.is_some_and(|c| c != "bin")
}

fn nested_package(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}{PATH_SEP}{name}")
    }
}

/// A parsed source file and the module path it is reached under.
struct Module {
    package: String,
    items: Vec<Item>,
}

/// Library files reachable from the root through public `mod` declarations.
#[derive(Default)]
struct ModuleTree {
    modules: HashMap<PathBuf, Module>,
}

impl ModuleTree {
    fn len(&self) -> usize {
        self.modules.len()
    }

    fn take(&mut self, path: &Path) -> Option<Module> {
        self.modules.remove(path)
    }

    /// Parse `path` and follow its public module declarations.
    ///
    /// `owns_dir` marks files whose children live next to them: the crate
    /// root, `mod.rs` files and `#[path]` targets.
    fn load(&mut self, path: &Path, package: String, owns_dir: bool) -> Result<()> {
        if self.modules.contains_key(path) {
            return Ok(());
        }
        let file = parse_source(path)?;

        let parent = path.parent().unwrap_or(Path::new("")).to_path_buf();
        let owns_dir = owns_dir || path.file_name().is_some_and(|n| n == "mod.rs");
        let mod_dir = match path.file_stem() {
            Some(stem) if !owns_dir => parent.join(stem),
            _ => parent.clone(),
        };

        // registered before descending so a `#[path]` cycle terminates
        self.modules.insert(
            path.to_path_buf(),
            Module {
                package: package.clone(),
                items: Vec::new(),
            },
        );
        self.declarations(path, &parent, &mod_dir, &package, &file.items)?;
        if let Some(module) = self.modules.get_mut(path) {
            module.items = file.items;
        }
        Ok(())
    }

    /// `base` anchors `#[path]` attributes, `mod_dir` holds `name.rs` and
    /// `name/mod.rs` children.
    fn declarations(
        &mut self,
        file: &Path,
        base: &Path,
        mod_dir: &Path,
        package: &str,
        items: &[Item],
    ) -> Result<()> {
        for item in items {
            let Item::Mod(module) = item else {
                continue;
            };
            let nested = nested_package(package, &module.ident.to_string());
            if !is_public_module(module) {
                tracing::debug!(file = %file.display(), module = %nested, "module is not public, skipping");
                continue;
            }

            match &module.content {
                Some((_, inner)) => {
                    let dir = mod_dir.join(module.ident.unraw().to_string());
                    self.declarations(file, &dir, &dir, &nested, inner)?;
                }
                None => match module_file(base, mod_dir, module) {
                    Some((child, owns_dir)) => self.load(&canonical_or_raw(child), nested, owns_dir)?,
                    None => tracing::warn!(
                        file = %file.display(),
                        module = %nested,
                        "declared module has no source file, skipping"
                    ),
                },
            }
        }
        Ok(())
    }
}

fn parse_source(path: &Path) -> Result<syn::File> {
    tracing::debug!(file = %path.display(), "parsing");
    let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    syn::parse_file(&source).map_err(|e| {
        let start = e.span().start();
        Error::SourceParse {
            path: path.to_path_buf(),
            line: start.line,
            column: start.column + 1,
            message: e.to_string(),
        }
    })
}

/// File backing an out-of-line `mod` declaration, and whether it owns its directory.
fn module_file(base: &Path, mod_dir: &Path, module: &ItemMod) -> Option<(PathBuf, bool)> {
    if let Some(rel) = module.attrs.iter().find_map(|a| str_attr(a, "path")) {
        let file = base.join(rel);
        return file.is_file().then_some((file, true));
    }
    let name = module.ident.unraw().to_string();
    let flat = mod_dir.join(format!("{name}.rs"));
    if flat.is_file() {
        return Some((flat, false));
    }
    let nested = mod_dir.join(name).join("mod.rs");
    nested.is_file().then_some((nested, true))
}

fn is_public_module(module: &ItemMod) -> bool {
    is_exported(&module.vis) && !module.attrs.iter().any(is_cfg_test)
}

fn is_cfg_test(attr: &Attribute) -> bool {
    match &attr.meta {
        Meta::List(list) => list.path.is_ident("cfg") && list.tokens.to_string() == "test",
        _ => false,
    }
}

struct Scan {
    module_path: String,
    policy: ScanPolicy,
    report: ScanReport,
}

impl Scan {
    fn items(&mut self, path: &Path, package: &str, items: &[Item]) -> Result<()> {
        for item in items {
            match item {
                Item::Fn(func) if is_exported(&func.vis) => self.function(path, package, func)?,
                Item::Mod(module) if is_public_module(module) => {
                    if let Some((_, inner)) = &module.content {
                        let nested = nested_package(package, &module.ident.to_string());
                        self.items(path, &nested, inner)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn function(&mut self, path: &Path, package: &str, func: &ItemFn) -> Result<()> {
        let Some(text) = directive_line(&func.attrs) else {
            return Ok(());
        };
        let function = func.sig.ident.to_string();

        match parse_directive(&text) {
            Ok(Directive::Api(directive)) => {
                let route = Route::new(&self.module_path, package, function, directive);
                tracing::debug!(
                    handler = %route.handler_path(),
                    method = %route.method(),
                    path = %route.effective_path(),
                    "discovered route"
                );
                self.report.routes.push(route);
            }
            Err(error) => {
                let line = line_of(func.sig.ident.span());
                if self.policy == ScanPolicy::Strict {
                    return Err(Error::Directive {
                        path: path.to_path_buf(),
                        line,
                        function,
                        source: error,
                    });
                }
                let import_path = import_path(&self.module_path, package);
                tracing::warn!(
                    file = %path.display(),
                    line,
                    function = %function,
                    %error,
                    "skipping function with malformed directive"
                );
                self.report.diagnostics.push(ScanDiagnostic {
                    file: path.to_path_buf(),
                    line,
                    import_path,
                    function,
                    error,
                });
            }
        }
        Ok(())
    }
}

fn is_exported(vis: &Visibility) -> bool {
    matches!(vis, Visibility::Public(_))
}

fn line_of(span: Span) -> usize {
    span.start().line
}

/// The last non-blank line of the doc comment, trimmed, if it is directive-shaped.
pub fn directive_line(attrs: &[Attribute]) -> Option<String> {
    let docs: Vec<String> = attrs.iter().filter_map(|a| str_attr(a, "doc")).collect();
    let last = docs
        .iter()
        .rev()
        .flat_map(|text| text.lines().rev())
        .find(|line| !line.trim().is_empty())?;
    is_directive_line(last).then(|| last.trim().to_string())
}

/// Value of a `#[name = "..."]` attribute.
fn str_attr(attr: &Attribute, name: &str) -> Option<String> {
    if !attr.path().is_ident(name) {
        return None;
    }
    match &attr.meta {
        Meta::NameValue(nv) => match &nv.value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(text),
                ..
            }) => Some(text.value()),
            _ => None,
        },
        _ => None,
    }
}
