//! # Generator Module
//!
//! Turns a scanned [`RouteSet`](crate::route::RouteSet) into a runnable
//! program and records the dependencies that program needs.
//!
//! ## Architecture
//!
//! The generator uses an Askama template (`templates/main.rs.txt`) for the
//! entry point:
//!
//! ```text
//! Cargo.toml → Scanner → Route validation → Template rendering → Artifacts
//! ```
//!
//! 1. **Manifest** - located by walking up from the scanned directory
//! 2. **Scanner** - collects `do:api` handlers in traversal order
//! 3. **Validation** - rejects duplicate `(method, path)` bindings, paths
//!    differing only in capture names, and path syntax the router would refuse
//! 4. **Rendering** - one `use` per handler module, one `.route(..)` per route
//! 5. **Artifacts** - the program and the updated manifest are staged as temp
//!    files, then renamed into place
//!
//! ## Generated Structure
//!
//! ```text
//! my-package/
//! ├── Cargo.toml              # gains axum and tokio, or tokio features
//! └── src/
//!     ├── lib.rs              # handlers live in its `pub mod` tree
//!     └── bin/
//!         └── doroute-server.rs
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use doroute::generator::generate;
//! use doroute::{GeneratorConfig, ScanPolicy};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), doroute::Error> {
//! let dir = Path::new("demos/hello");
//! let report = generate(dir, dir, &GeneratorConfig::default(), ScanPolicy::Lenient)?;
//! println!("wrote {}", report.program_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Atomicity
//!
//! Both artifacts are fully written to temp files before either rename. A
//! failure up to that point leaves the destination untouched. The two renames
//! themselves are separate operations, so a crash between them can still leave
//! a new program next to the old manifest.

mod project;
mod templates;


pub use project::{generate, validate_routes, GenerationReport};
pub use templates::{plan_imports, render_main, HandlerImport, MainRsTemplateData, Registration};
