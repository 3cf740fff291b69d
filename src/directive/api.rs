use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::{DirectiveKind, Options};
use crate::error::DirectiveError;

/// HTTP methods a handler can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Upper-case HTTP name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Name of the method-router constructor in `axum::routing`.
    pub fn router_fn(self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Head => "head",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned for anything outside the supported method set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedMethod(pub String);

impl FromStr for Method {
    type Err = UnsupportedMethod;

    /// Case-sensitive, like the names on the wire.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(UnsupportedMethod(other.to_string())),
        }
    }
}

/// `do:api [raw=true|false] [method=GET|HEAD|POST|PUT|PATCH|DELETE] [path=/custom/path]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ApiDirective {
    /// Handler takes the raw request/response pair (default `true`)
    pub raw: bool,
    /// Bound method (default `GET`)
    pub method: Method,
    /// Explicit route path; empty means derive it from module and function name
    pub path: String,
}

impl Default for ApiDirective {
    fn default() -> Self {
        ApiDirective {
            raw: true,
            method: Method::Get,
            path: String::new(),
        }
    }
}

impl DirectiveKind for ApiDirective {
    const NAME: &'static str = "api";

    // Unrecognized `raw` and `method` values keep the defaults.
    fn from_options(options: &Options) -> Result<Self, DirectiveError> {
        let mut directive = ApiDirective::default();

        match options.get("raw").map(String::as_str) {
            Some("true") => directive.raw = true,
            Some("false") => directive.raw = false,
            _ => {}
        }

        if let Some(method) = options.get("method").and_then(|m| m.parse().ok()) {
            directive.method = method;
        }

        if let Some(path) = options.get("path") {
            directive.path = path.clone();
        }

        Ok(directive)
    }
}
