//! # CLI Module
//!
//! Command-line interface of the `doroute` binary.
//!
//! ## Commands
//!
//! ### `inspect`
//!
//! Scan a package and print the routes it would register:
//!
//! ```bash
//! doroute inspect --root demos/hello
//! doroute inspect --root demos/hello --json
//! ```
//!
//! ### `generate`
//!
//! Copy the package into `--output` and generate the server program there:
//!
//! ```bash
//! doroute generate --root demos/hello --output /tmp/hello-server --port 8080
//! ```
//!
//! The source package is never modified.
//!
//! ### `serve`
//!
//! Stage the package in a temp directory, generate, and `cargo run` the
//! result until SIGINT/SIGTERM:
//!
//! ```bash
//! doroute serve --root demos/hello
//! ```
//!
//! ## Options shared by all commands
//!
//! - `--root <DIR>` - directory to scan (default `.`, env `DOROUTE_ROOT`).
//!   Any directory inside a package works; the `Cargo.toml` is found by
//!   walking up.
//! - `--strict` - fail on malformed `do:` directives instead of skipping them

mod commands;


pub use commands::{execute, run_cli, Cli, Commands};
