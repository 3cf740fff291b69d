//! # Configuration Module
//!
//! Settings for the generated program, loaded from defaults and environment
//! variables. CLI flags override both.
//!
//! ## Environment Variables
//!
//! ### `DOROUTE_PORT`
//!
//! Port the generated server listens on. Default: `3000`.
//!
//! ### `DOROUTE_BIN_NAME`
//!
//! Name of the generated binary target, written to `src/bin/<name>.rs`.
//! Default: `doroute-server`.
//!
//! ### `DOROUTE_CARGO_BIN`
//!
//! Cargo executable used to run the generated program (see [`crate::runner`]).
//! Default: `cargo`.
//!
//! ## Usage
//!
//! ```rust
//! use doroute::config::GeneratorConfig;
//!
//! let config = GeneratorConfig::from_env();
//! println!("listening on {}", config.listen_addr());
//! ```

use std::env;
use std::path::{Path, PathBuf};

use crate::manifest::{DependencySpec, Requirement};

/// Port used when nothing else is configured.
pub const DEFAULT_PORT: u16 = 3000;

/// Binary target name used when nothing else is configured.
pub const DEFAULT_BIN_NAME: &str = "doroute-server";

/// What the generator emits and which requirements it adds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Listener port of the generated server
    pub port: u16,
    /// Binary target the program is written as
    pub bin_name: String,
    /// Router crate the generated wiring targets
    pub router: Requirement,
    /// Async runtime the generated entry point runs on
    pub runtime: Requirement,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            port: DEFAULT_PORT,
            bin_name: DEFAULT_BIN_NAME.to_string(),
            router: Requirement::version("axum", "0.8"),
            runtime: Requirement::new(
                "tokio",
                DependencySpec::with_features("1", &["macros", "rt-multi-thread", "net"]),
            ),
        }
    }
}

impl GeneratorConfig {
    /// Defaults with `DOROUTE_PORT` and `DOROUTE_BIN_NAME` applied.
    ///
    /// Unparseable or empty values are ignored.
    pub fn from_env() -> Self {
        let mut config = GeneratorConfig::default();
        if let Some(port) = env::var("DOROUTE_PORT").ok().and_then(|v| v.parse().ok()) {
            config.port = port;
        }
        if let Ok(name) = env::var("DOROUTE_BIN_NAME") {
            if !name.trim().is_empty() {
                config.bin_name = name.trim().to_string();
            }
        }
        config
    }

    /// Address the generated server binds.
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Where the generated program goes inside package `dir`.
    pub fn program_path(&self, dir: &Path) -> PathBuf {
        dir.join("src")
            .join("bin")
            .join(format!("{}.rs", self.bin_name))
    }

    /// Requirements the generated program needs, router first.
    pub fn requirements(&self) -> [&Requirement; 2] {
        [&self.router, &self.runtime]
    }
}

/// Cargo executable, honoring `DOROUTE_CARGO_BIN`.
pub fn cargo_bin() -> String {
    env::var("DOROUTE_CARGO_BIN").unwrap_or_else(|_| "cargo".to_string())
}
