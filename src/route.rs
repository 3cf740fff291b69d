//! # Route Model
//!
//! The ordered set of handler bindings discovered by a scan.
//!
//! Routes are appended while the scanner walks the tree and are never
//! mutated afterwards; the generator consumes them in the order they were
//! found.

use std::collections::HashMap;

use serde::Serialize;

use crate::directive::{ApiDirective, Method};

/// Separator between segments of a Rust path.
pub const PATH_SEP: &str = "::";

/// `<crate>::<package>`, or just `<crate>` for the crate root.
pub fn import_path(module_path: &str, package_name: &str) -> String {
    if package_name.is_empty() {
        module_path.to_string()
    } else {
        format!("{module_path}{PATH_SEP}{package_name}")
    }
}

/// One handler function bound to a method and path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Route {
    pub directive: ApiDirective,
    /// Path the handler's module is imported by: `<crate>::<package>`
    pub import_path: String,
    /// Module path relative to the crate root, empty for the root itself
    pub package_name: String,
    pub function_name: String,
}

impl Route {
    /// Build a route for `function_name` in module `package_name` of crate `module_path`.
    pub fn new(
        module_path: &str,
        package_name: impl Into<String>,
        function_name: impl Into<String>,
        directive: ApiDirective,
    ) -> Self {
        let package_name = package_name.into();
        Route {
            directive,
            import_path: import_path(module_path, &package_name),
            package_name,
            function_name: function_name.into(),
        }
    }

    pub fn method(&self) -> Method {
        self.directive.method
    }

    /// The directive's path, or `/<package>.<function>` when none was given.
    ///
    /// Nested module separators become dots: `api::users` + `list` gives
    /// `/api.users.list`. Crate-root handlers derive `/<function>`.
    pub fn effective_path(&self) -> String {
        if !self.directive.path.is_empty() {
            return self.directive.path.clone();
        }
        if self.package_name.is_empty() {
            format!("/{}", self.function_name)
        } else {
            format!(
                "/{}.{}",
                self.package_name.replace(PATH_SEP, "."),
                self.function_name
            )
        }
    }

    /// Fully qualified handler path: `<import_path>::<function>`.
    pub fn handler_path(&self) -> String {
        format!("{}{PATH_SEP}{}", self.import_path, self.function_name)
    }
}

/// Why axum 0.8 would refuse to register `path`, if it would.
pub fn path_problem(path: &str) -> Option<&'static str> {
    if !path.starts_with('/') {
        return Some("must start with `/`");
    }
    let segments: Vec<&str> = path.split('/').skip(1).collect();
    for (i, segment) in segments.iter().enumerate() {
        if segment.starts_with(':') || segment.starts_with('*') {
            return Some("uses `:param` or `*wildcard` syntax; write `{param}` or `{*wildcard}`");
        }
        if segment.starts_with("{*") && i + 1 < segments.len() {
            return Some("has a `{*wildcard}` capture before the last segment");
        }
    }
    None
}

/// `path` with capture names erased: `/users/{id}` and `/users/{name}` share a shape.
fn capture_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let is_capture = segment.starts_with('{')
                && !segment.starts_with("{{")
                && segment.ends_with('}');
            if !is_capture {
                segment
            } else if segment.starts_with("{*") {
                "{*}"
            } else {
                "{}"
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Two routes claiming the same method and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConflict {
    pub method: Method,
    pub path: String,
    pub first: String,
    pub second: String,
}

/// Two different paths that capture the same segments under different names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOverlap {
    pub first_path: String,
    pub second_path: String,
    pub first: String,
    pub second: String,
}

/// Append-only, ordered collection of routes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteSet {
    routes: Vec<Route>,
}

impl RouteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    /// Copy ordered by import path, then function name.
    pub fn sorted(&self) -> RouteSet {
        let mut routes = self.routes.clone();
        routes.sort_by(|a, b| {
            a.import_path
                .cmp(&b.import_path)
                .then_with(|| a.function_name.cmp(&b.function_name))
        });
        RouteSet { routes }
    }

    /// Every later route that repeats the method and path of an earlier one.
    pub fn conflicts(&self) -> Vec<RouteConflict> {
        let mut seen: HashMap<(Method, String), &Route> = HashMap::new();
        let mut conflicts = Vec::new();
        for route in &self.routes {
            let key = (route.method(), route.effective_path());
            match seen.get(&key) {
                Some(first) => conflicts.push(RouteConflict {
                    method: key.0,
                    path: key.1,
                    first: first.handler_path(),
                    second: route.handler_path(),
                }),
                None => {
                    seen.insert(key, route);
                }
            }
        }
        conflicts
    }

    /// Later routes whose path differs from an earlier one only in capture names.
    ///
    /// The router matches paths regardless of method, so these clash even
    /// when the methods differ.
    pub fn overlaps(&self) -> Vec<RouteOverlap> {
        let mut seen: HashMap<String, (String, &Route)> = HashMap::new();
        let mut overlaps = Vec::new();
        for route in &self.routes {
            let path = route.effective_path();
            match seen.get(&capture_shape(&path)) {
                Some((first_path, first)) if *first_path != path => overlaps.push(RouteOverlap {
                    first_path: first_path.clone(),
                    second_path: path,
                    first: first.handler_path(),
                    second: route.handler_path(),
                }),
                Some(_) => {}
                None => {
                    seen.insert(capture_shape(&path), (path, route));
                }
            }
        }
        overlaps
    }
}

impl<'a> IntoIterator for &'a RouteSet {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

impl FromIterator<Route> for RouteSet {
    fn from_iter<I: IntoIterator<Item = Route>>(iter: I) -> Self {
        RouteSet {
            routes: iter.into_iter().collect(),
        }
    }
}
