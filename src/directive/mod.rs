//! # Directive Module
//!
//! Parses the `do:` annotations that mark a function as a route handler.
//!
//! A directive is the final line of a function's doc comment:
//!
//! ```text
//! /// Greets the caller.
//! /// do:api method=GET path=/ping
//! pub async fn hello() -> &'static str { "Hello, World!" }
//! ```
//!
//! ## Grammar
//!
//! The line is split on whitespace. The token starting with `do:` names the
//! directive kind; every other token is an option, either a bare flag
//! (`raw`, implicitly `true`) or a `key=value` pair. Option order does not
//! matter and a later duplicate key overwrites an earlier one.
//!
//! ## Kinds
//!
//! Each kind is a variant of [`Directive`] backed by a type implementing
//! [`DirectiveKind`], which owns the interpretation of its options. Adding a
//! kind means adding a variant, an implementation, and one dispatch arm in
//! [`parse_directive`].

mod api;

pub use api::{ApiDirective, Method};

use std::collections::BTreeMap;

use crate::error::DirectiveError;

/// Prefix shared by every directive tag.
pub const TAG: &str = "do:";

/// Options given on a directive line, keyed by option name.
pub type Options = BTreeMap<String, String>;

/// A parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Directive {
    /// `do:api`: expose the function as an HTTP route
    Api(ApiDirective),
}

impl Directive {
    /// Name of the kind, as written after the tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Directive::Api(_) => ApiDirective::NAME,
        }
    }
}

/// A directive kind: knows its tag name and how to build itself from options.
pub trait DirectiveKind: Sized {
    /// Name following the `do:` prefix.
    const NAME: &'static str;

    /// Interpret the options of one directive line.
    fn from_options(options: &Options) -> Result<Self, DirectiveError>;
}

/// Returns true when `line` looks like a directive, i.e. starts with the tag
/// once leading whitespace is removed.
pub fn is_directive_line(line: &str) -> bool {
    line.trim_start().starts_with(TAG)
}

/// Parse one directive line, tag included.
///
/// # Errors
///
/// - [`DirectiveError::InvalidDirective`] when a second tag appears
/// - [`DirectiveError::InvalidOption`] for a token with more than one `=` or an
///   empty key or value
/// - [`DirectiveError::UnknownDirective`] when the kind is not known, or no tag
///   is present at all
pub fn parse_directive(raw: &str) -> Result<Directive, DirectiveError> {
    let mut kind: Option<&str> = None;
    let mut options = Options::new();

    for token in raw.split_whitespace() {
        if let Some(name) = token.strip_prefix(TAG) {
            if let Some(first) = kind {
                return Err(DirectiveError::InvalidDirective {
                    first: first.to_string(),
                    second: name.to_string(),
                });
            }
            kind = Some(name);
            continue;
        }

        let (key, value) = parse_option(token)?;
        options.insert(key.to_string(), value.to_string());
    }

    match kind.unwrap_or_default() {
        name if name == ApiDirective::NAME => {
            ApiDirective::from_options(&options).map(Directive::Api)
        }
        other => Err(DirectiveError::UnknownDirective {
            kind: other.to_string(),
        }),
    }
}

fn parse_option(token: &str) -> Result<(&str, &str), DirectiveError> {
    let invalid = || DirectiveError::InvalidOption {
        token: token.to_string(),
    };

    let mut parts = token.split('=');
    let key = parts.next().unwrap_or_default();
    match (parts.next(), parts.next()) {
        (None, _) => Ok((key, "true")),
        (Some(value), None) if !key.is_empty() && !value.is_empty() => Ok((key, value)),
        _ => Err(invalid()),
    }
}
