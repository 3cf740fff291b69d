//! # Manifest Module
//!
//! Locates and edits the `Cargo.toml` governing a scanned source tree.
//!
//! The manifest supplies the crate identity used to build handler import
//! paths, and is the place the generator records the router dependency the
//! generated program needs. It is read once per run and written back at most
//! once, after requirements have been applied.
//!
//! Writing re-serializes the parsed document. Keys and their order are kept,
//! but comments and formatting are not. The CLI only writes manifests of
//! staged copies.
//!
//! ```rust,no_run
//! use doroute::manifest::{find_manifest, Requirement};
//!
//! # fn main() -> Result<(), doroute::Error> {
//! let mut manifest = find_manifest("demos/hello/src".as_ref())?;
//! println!("crate: {}", manifest.module_path());
//! manifest.add_requirement(Requirement::version("axum", "0.8"));
//! let path = manifest.path().to_path_buf();
//! manifest.write_atomic(&path)?;
//! # Ok(())
//! # }
//! ```

mod dependency;
#[cfg(test)]
mod tests;

pub use dependency::{DependencySpec, Requirement};

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::artifact;
use crate::error::{Error, Result};

/// File name looked for in each ancestor directory.
pub const MANIFEST_FILE: &str = "Cargo.toml";

const DEFAULT_LIB_ROOT: &str = "src/lib.rs";

#[derive(Debug, Deserialize)]
struct Identity {
    package: Option<PackageSection>,
    lib: Option<LibSection>,
}

#[derive(Debug, Deserialize)]
struct PackageSection {
    name: String,
}

#[derive(Debug, Deserialize)]
struct LibSection {
    name: Option<String>,
    path: Option<String>,
}

/// A parsed `Cargo.toml`.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    document: toml::Table,
    package_name: String,
    lib_name: Option<String>,
    lib_path: Option<String>,
}

/// Find the manifest governing `start`, walking up through parent directories.
///
/// # Errors
///
/// [`Error::ManifestNotFound`] when no ancestor holds a `Cargo.toml`;
/// otherwise whatever [`Manifest::load`] returns for the first one found.
pub fn find_manifest(start: &Path) -> Result<Manifest> {
    let abs = fs::canonicalize(start)
        .or_else(|_| std::path::absolute(start))
        .unwrap_or_else(|_| start.to_path_buf());

    for dir in abs.ancestors() {
        let candidate = dir.join(MANIFEST_FILE);
        if candidate.is_file() {
            tracing::debug!(manifest = %candidate.display(), "found manifest");
            return Manifest::load(&candidate);
        }
    }

    Err(Error::ManifestNotFound { start: abs })
}

impl Manifest {
    /// Read and parse the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Manifest::parse(path, &contents)
    }

    /// Parse manifest `contents` that live at `path`.
    ///
    /// # Errors
    ///
    /// [`Error::ManifestParse`] for invalid TOML, a missing `[package].name`,
    /// or a `[dependencies]` entry that is not a table.
    pub fn parse(path: &Path, contents: &str) -> Result<Self> {
        let parse_err = |message: String| Error::ManifestParse {
            path: path.to_path_buf(),
            message,
        };

        let document: toml::Table = toml::from_str(contents).map_err(|e| parse_err(e.to_string()))?;
        let identity: Identity = toml::Value::Table(document.clone())
            .try_into()
            .map_err(|e: toml::de::Error| parse_err(e.to_string()))?;

        let package = identity
            .package
            .ok_or_else(|| parse_err("missing [package] section with a name".to_string()))?;

        if let Some(deps) = document.get("dependencies") {
            if !deps.is_table() {
                return Err(parse_err("[dependencies] must be a table".to_string()));
            }
        }

        let (lib_name, lib_path) = match identity.lib {
            Some(lib) => (lib.name, lib.path),
            None => (None, None),
        };

        Ok(Manifest {
            path: path.to_path_buf(),
            document,
            package_name: package.name,
            lib_name,
            lib_path,
        })
    }

    /// Where the manifest was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Package directory.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// Root file of the library target (`src/lib.rs` unless `[lib].path` says otherwise).
    pub fn lib_root(&self) -> PathBuf {
        self.dir()
            .join(self.lib_path.as_deref().unwrap_or(DEFAULT_LIB_ROOT))
    }

    /// Directory library modules are resolved against.
    pub fn source_dir(&self) -> PathBuf {
        let root = self.lib_root();
        root.parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.dir().join("src"))
    }

    /// `[package].name` as written.
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Crate identifier handler import paths start with.
    pub fn module_path(&self) -> String {
        self.lib_name
            .clone()
            .unwrap_or_else(|| self.package_name.replace('-', "_"))
    }

    /// `[dependencies]` in document order.
    ///
    /// Entries that do not fit [`DependencySpec`] are left out.
    pub fn requirements(&self) -> Vec<Requirement> {
        self.dependencies()
            .map(|deps| {
                deps.iter()
                    .filter_map(|(name, value)| {
                        value
                            .clone()
                            .try_into::<DependencySpec>()
                            .ok()
                            .map(|spec| Requirement::new(name.clone(), spec))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True when `[dependencies]` already names `name`.
    pub fn has_requirement(&self, name: &str) -> bool {
        self.dependencies()
            .is_some_and(|deps| deps.contains_key(name))
    }

    /// Make `[dependencies]` satisfy `requirement`.
    ///
    /// A missing dependency is appended as given. An existing one keeps its
    /// version or source; only features it lacks are enabled, turning a bare
    /// version string into `{ version = .., features = [..] }`.
    pub fn add_requirement(&mut self, requirement: Requirement) -> RequirementEdit {
        let entry = self
            .document
            .entry("dependencies")
            .or_insert(toml::Value::Table(toml::Table::new()));
        let toml::Value::Table(deps) = entry else {
            // rejected by `parse`
            return RequirementEdit::Unchanged;
        };

        if let Some(existing) = deps.get_mut(&requirement.name) {
            return enable_features(existing, requirement.spec.features());
        }
        deps.insert(requirement.name, toml::Value::from(&requirement.spec));
        RequirementEdit::Added
    }

    /// Serialize the (possibly edited) manifest.
    ///
    /// The document is re-emitted from its parsed form: keys and their order
    /// survive, comments and layout do not, and inline tables may come back
    /// as `[dependencies.name]` sections.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        toml::to_string(&self.document)
            .map(String::into_bytes)
            .map_err(|e| Error::ManifestParse {
                path: self.path.clone(),
                message: format!("cannot serialize manifest: {e}"),
            })
    }

    /// Serialize and write to `dest` through a temp file and rename.
    pub fn write_atomic(&self, dest: &Path) -> Result<PathBuf> {
        artifact::write_atomic(dest, &self.to_bytes()?)
    }

    fn dependencies(&self) -> Option<&toml::Table> {
        self.document.get("dependencies").and_then(toml::Value::as_table)
    }
}

/// How [`Manifest::add_requirement`] changed `[dependencies]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementEdit {
    /// The dependency was missing and got appended
    Added,
    /// The dependency existed; these features were enabled on it
    FeaturesAdded(Vec<String>),
    /// The existing entry already covers the requirement
    Unchanged,
}

impl RequirementEdit {
    pub fn changed(&self) -> bool {
        !matches!(self, RequirementEdit::Unchanged)
    }
}

fn enable_features(entry: &mut toml::Value, wanted: &[String]) -> RequirementEdit {
    if wanted.is_empty() {
        return RequirementEdit::Unchanged;
    }
    if let toml::Value::String(version) = entry {
        let mut table = toml::Table::new();
        table.insert("version".into(), toml::Value::String(version.clone()));
        *entry = toml::Value::Table(table);
    }
    let toml::Value::Table(table) = entry else {
        return RequirementEdit::Unchanged;
    };
    let features = table
        .entry("features")
        .or_insert(toml::Value::Array(Vec::new()));
    let toml::Value::Array(features) = features else {
        return RequirementEdit::Unchanged;
    };

    let missing: Vec<String> = wanted
        .iter()
        .filter(|f| !features.iter().any(|have| have.as_str() == Some(f.as_str())))
        .cloned()
        .collect();
    if missing.is_empty() {
        return RequirementEdit::Unchanged;
    }
    features.extend(missing.iter().cloned().map(toml::Value::String));
    RequirementEdit::FeaturesAdded(missing)
}
