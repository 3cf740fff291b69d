use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::templates::render_main;
use crate::artifact::PendingWrite;
use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::manifest::{find_manifest, RequirementEdit, MANIFEST_FILE};
use crate::route::{path_problem, RouteSet};
use crate::scanner::{scan, ScanDiagnostic, ScanPolicy};

/// Outcome of a successful [`generate`] run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// Routes registered by the generated program, in registration order
    pub routes: RouteSet,
    /// Malformed directives skipped under [`ScanPolicy::Lenient`]
    pub diagnostics: Vec<ScanDiagnostic>,
    pub program_path: PathBuf,
    pub manifest_path: PathBuf,
    /// Dependencies that were missing and got appended
    pub added_requirements: Vec<String>,
    /// Existing dependencies that needed extra features enabled
    pub updated_requirements: Vec<String>,
}

/// Reject the route-set mistakes axum 0.8 panics on when the router is built.
///
/// Only the statically visible ones are checked: path syntax, repeated
/// `(method, path)` pairs, and paths that differ only in capture names.
///
/// # Errors
///
/// - [`Error::InvalidRoutePath`] for a path without a leading `/`, with a
///   `:param` or `*wildcard` segment, or with a `{*wildcard}` before the end
/// - [`Error::RouteConflict`] for the first repeated `(method, path)` pair
/// - [`Error::OverlappingRoutes`] for the first pair of paths that differ only
///   in capture names
pub fn validate_routes(routes: &RouteSet) -> Result<()> {
    for route in routes {
        let path = route.effective_path();
        if let Some(reason) = path_problem(&path) {
            return Err(Error::InvalidRoutePath {
                path,
                handler: route.handler_path(),
                reason: reason.to_string(),
            });
        }
    }
    if let Some(conflict) = routes.conflicts().into_iter().next() {
        return Err(Error::RouteConflict {
            method: conflict.method.to_string(),
            path: conflict.path,
            first: conflict.first,
            second: conflict.second,
        });
    }
    if let Some(overlap) = routes.overlaps().into_iter().next() {
        return Err(Error::OverlappingRoutes {
            first_path: overlap.first_path,
            second_path: overlap.second_path,
            first: overlap.first,
            second: overlap.second,
        });
    }
    Ok(())
}

/// Scan `root`, then write the program and updated manifest into package directory `dest`.
///
/// `root` may be the package directory or any directory below it; the
/// governing `Cargo.toml` is found by walking up. `dest` is usually the same
/// package directory. The program goes to `src/bin/<bin_name>.rs` under
/// `dest` and the manifest to `dest/Cargo.toml`.
///
/// # Errors
///
/// Every stage is fatal: manifest lookup, scanning, route validation,
/// rendering and writing. Nothing is written unless all of them succeed up to
/// the final renames.
pub fn generate(
    root: &Path,
    dest: &Path,
    config: &GeneratorConfig,
    policy: ScanPolicy,
) -> Result<GenerationReport> {
    let mut manifest = find_manifest(root)?;
    debug!(manifest = %manifest.path().display(), "manifest loaded");

    if !manifest.lib_root().is_file() {
        warn!(
            lib_root = %manifest.lib_root().display(),
            "package has no library target; generated imports will not resolve"
        );
    }

    let report = scan(root, &manifest, policy)?;
    validate_routes(&report.routes)?;

    let program = render_main(&report.routes, config)?;

    let mut added_requirements = Vec::new();
    let mut updated_requirements = Vec::new();
    for requirement in config.requirements() {
        match manifest.add_requirement(requirement.clone()) {
            RequirementEdit::Added => {
                debug!(dependency = %requirement.name, "adding requirement");
                added_requirements.push(requirement.name.clone());
            }
            RequirementEdit::FeaturesAdded(features) => {
                debug!(dependency = %requirement.name, ?features, "enabling features");
                updated_requirements.push(requirement.name.clone());
            }
            RequirementEdit::Unchanged => {}
        }
    }
    let manifest_bytes = manifest.to_bytes()?;

    let program_write = PendingWrite::prepare(&config.program_path(dest), program.as_bytes())?;
    let manifest_write = PendingWrite::prepare(&dest.join(MANIFEST_FILE), &manifest_bytes)?;

    let program_path = program_write.commit()?;
    let manifest_path = manifest_write.commit()?;

    info!(
        program = %program_path.display(),
        manifest = %manifest_path.display(),
        routes = report.routes.len(),
        "generated program"
    );

    Ok(GenerationReport {
        routes: report.routes,
        diagnostics: report.diagnostics,
        program_path,
        manifest_path,
        added_requirements,
        updated_requirements,
    })
}
