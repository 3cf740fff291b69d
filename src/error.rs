//! Error types for directive parsing and the generation pipeline.
//!
//! Directive errors are local to one annotation and the scanner decides
//! whether they abort a run (see [`crate::scanner::ScanPolicy`]). Every other
//! [`Error`] variant is fatal for the run that produced it.

use std::path::PathBuf;

/// Error produced while parsing a single `do:` directive line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    /// More than one `do:` tag on the same line.
    #[error("invalid directive format: found tag `do:{second}` after `do:{first}`")]
    InvalidDirective {
        /// Kind named by the first tag
        first: String,
        /// Kind named by the offending second tag
        second: String,
    },
    /// An option token that is neither `flag` nor `key=value`.
    #[error("invalid option format: `{token}`")]
    InvalidOption {
        /// The malformed token as written
        token: String,
    },
    /// The tag names a directive kind that does not exist.
    #[error("unknown directive `do:{kind}`")]
    UnknownDirective {
        /// Kind named by the tag (empty when the line carries no tag)
        kind: String,
    },
}

/// Fatal error of a scan or generation run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Walked from the start directory to the filesystem root without finding a `Cargo.toml`.
    #[error("cannot find Cargo.toml in {start} or any parent directory")]
    ManifestNotFound {
        /// Directory the search started from
        start: PathBuf,
    },

    /// The manifest exists but is not usable.
    #[error("failed to parse manifest {path}: {message}")]
    ManifestParse {
        /// Manifest location
        path: PathBuf,
        /// What was wrong with it
        message: String,
    },

    /// A Rust source file under the scanned tree does not parse.
    #[error("failed to parse {path}:{line}:{column}: {message}")]
    SourceParse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// A malformed directive, surfaced under the strict scan policy.
    #[error("{path}:{line}: `{function}`: {source}")]
    Directive {
        path: PathBuf,
        line: usize,
        function: String,
        #[source]
        source: DirectiveError,
    },

    /// Two handlers bind the same method and path.
    #[error("route {method} {path} is bound to both {first} and {second}")]
    RouteConflict {
        method: String,
        path: String,
        first: String,
        second: String,
    },

    /// A directive path the router would reject at startup.
    #[error("route path `{path}` for {handler} {reason}")]
    InvalidRoutePath {
        path: String,
        handler: String,
        reason: String,
    },

    /// Two paths that differ only in capture names.
    #[error("route `{second_path}` ({second}) overlaps `{first_path}` ({first})")]
    OverlappingRoutes {
        first_path: String,
        second_path: String,
        first: String,
        second: String,
    },

    /// Template rendering failed.
    #[error("failed to render generated program: {0}")]
    Render(#[from] askama::Error),

    /// A generated artifact could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copying the package into the staging directory failed.
    #[error("failed to stage {src} into {dest}: {message}")]
    Stage {
        src: PathBuf,
        dest: PathBuf,
        message: String,
    },

    /// The generated program could not be started.
    #[error("failed to run `{command}` in {dir}: {source}")]
    Run {
        command: String,
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other I/O failure, tagged with the path involved.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;
