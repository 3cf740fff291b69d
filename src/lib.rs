//! # doroute
//!
//! **doroute** turns annotated library functions into an HTTP server. Handlers
//! declare their route in the last line of their doc comment:
//!
//! ```rust,ignore
//! /// Says hello.
//! ///
//! /// do:api method=GET path=/ping
//! pub async fn hello() -> &'static str {
//!     "Hello, World!"
//! }
//! ```
//!
//! and doroute generates a binary target that registers every such function
//! with an [axum](https://docs.rs/axum) router and serves it.
//!
//! ## Overview
//!
//! The pipeline is a single synchronous batch:
//!
//! - **[`manifest`]** - locate the governing `Cargo.toml` and edit its dependencies
//! - **[`scanner`]** - walk the library sources and collect directive-bearing functions
//! - **[`directive`]** - parse `do:` directive lines
//! - **[`route`]** - the ordered route set and its derived paths
//! - **[`generator`]** - render the entry point and write both artifacts
//!
//! Around it sit the pieces used by the `doroute` binary:
//!
//! - **[`staging`]** - copy a package somewhere disposable before generating
//! - **[`runner`]** - `cargo run` the generated program and wait for a signal
//! - **[`cli`]** - the `inspect`, `generate` and `serve` commands
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant User
//!     participant CLI as CLI<br/>(doroute)
//!     participant Stage as staging
//!     participant Manifest as manifest::find_manifest
//!     participant Scan as scanner::scan
//!     participant Gen as generator
//!     participant Cargo as runner
//!
//!     User->>CLI: doroute serve --root demos/hello
//!     CLI->>Stage: stage_tree(package dir)
//!     Stage-->>CLI: $TMPDIR/doroute-<ulid>
//!     CLI->>Gen: generate(staged root)
//!     Gen->>Manifest: find_manifest(root)
//!     Manifest-->>Gen: Manifest (crate name, deps)
//!     Gen->>Scan: scan(root, &manifest)
//!     Scan-->>Gen: ScanReport (routes + diagnostics)
//!     Gen->>Gen: validate, render main.rs.txt
//!     Gen->>Gen: add axum + tokio requirements
//!     Gen-->>CLI: src/bin/doroute-server.rs + Cargo.toml
//!     CLI->>Cargo: cargo run --bin doroute-server
//!     User->>CLI: Ctrl-C
//!     CLI->>Cargo: stop
//!     CLI->>Stage: cleanup
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! doroute inspect --root demos/hello
//! doroute serve --root demos/hello
//! curl http://localhost:3000/ping
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use doroute::{find_manifest, scan, ScanPolicy};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), doroute::Error> {
//! let root = Path::new("demos/hello");
//! let manifest = find_manifest(root)?;
//! let report = scan(root, &manifest, ScanPolicy::Lenient)?;
//! for route in &report.routes {
//!     println!("{} {} -> {}", route.method(), route.effective_path(), route.handler_path());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Directive Grammar
//!
//! ```text
//! do:api [raw=true|false] [method=GET|HEAD|POST|PUT|PATCH|DELETE] [path=/custom/path]
//! ```
//!
//! Options may appear in any order. An omitted path derives `/<module>.<function>`
//! with nested modules joined by dots.

pub mod artifact;
pub mod cli;
pub mod config;
pub mod directive;
pub mod error;
pub mod generator;
pub mod logging;
pub mod manifest;
pub mod route;
pub mod runner;
pub mod scanner;
pub mod staging;

pub use config::GeneratorConfig;
pub use directive::{parse_directive, ApiDirective, Directive, Method};
pub use error::{DirectiveError, Error, Result};
pub use generator::{generate, render_main, GenerationReport};
pub use manifest::{find_manifest, Manifest};
pub use route::{Route, RouteSet};
pub use scanner::{scan, ScanPolicy, ScanReport};
