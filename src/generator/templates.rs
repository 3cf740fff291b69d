use askama::Template;
use std::collections::{HashMap, HashSet};

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::route::{Route, RouteSet, PATH_SEP};

/// Names the generated `main.rs` uses itself; module aliases avoid them.
const RESERVED_NAMES: &[&str] = &["axum", "tokio", "routing", "main", "router", "listener"];

/// A `use` of one handler module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerImport {
    /// Full module path, e.g. `app::api::users`
    pub path: String,
    /// Name the module is referred to by in registrations
    pub alias: String,
    /// Rendered `use` statement
    pub statement: String,
}

/// One `.route(..)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// HTTP method, for the header comment
    pub method: String,
    /// Effective route path
    pub path: String,
    /// `path` as an escaped Rust string literal
    pub path_literal: String,
    /// `axum::routing` constructor
    pub method_fn: &'static str,
    /// Handler as referenced in the generated code
    pub handler: String,
    /// Fully qualified handler path
    pub qualified: String,
}

/// Template data for the generated entry point
#[derive(Template)]
#[template(path = "main.rs.txt", escape = "none")]
pub struct MainRsTemplateData {
    pub imports: Vec<HandlerImport>,
    pub registrations: Vec<Registration>,
    /// Listener address as a Rust string literal
    pub addr_literal: String,
}

/// Return `name`, or `name_1`, `name_2`, ... if it is already taken.
pub(crate) fn unique_alias(taken: &mut HashSet<String>, name: &str) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }
    let mut i = 1;
    loop {
        let candidate = format!("{name}_{i}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        i += 1;
    }
}

/// One import per distinct handler module, in order of first use.
///
/// A module is imported under its last segment. When that name is taken,
/// the `_`-joined module path is used instead, then numbered variants.
/// Crate-root handlers need no import.
pub fn plan_imports(routes: &RouteSet) -> Vec<HandlerImport> {
    let mut taken: HashSet<String> = RESERVED_NAMES.iter().map(|s| s.to_string()).collect();
    let mut planned: HashSet<&str> = HashSet::new();
    let mut imports = Vec::new();

    // an alias equal to the crate name would make `use <crate>::..` ambiguous
    if let Some(krate) = routes.iter().next().and_then(|r| r.import_path.split(PATH_SEP).next()) {
        taken.insert(krate.to_string());
    }

    for route in routes {
        if route.package_name.is_empty() || !planned.insert(route.import_path.as_str()) {
            continue;
        }

        let last = route
            .package_name
            .rsplit(PATH_SEP)
            .next()
            .unwrap_or(&route.package_name);
        let alias = if taken.insert(last.to_string()) {
            last.to_string()
        } else {
            unique_alias(&mut taken, &route.package_name.replace(PATH_SEP, "_"))
        };

        let statement = if alias == last {
            format!("use {};", route.import_path)
        } else {
            format!("use {} as {};", route.import_path, alias)
        };
        imports.push(HandlerImport {
            path: route.import_path.clone(),
            alias,
            statement,
        });
    }
    imports
}

fn registration(route: &Route, aliases: &HashMap<&str, &str>) -> Registration {
    let handler = match aliases.get(route.import_path.as_str()) {
        Some(alias) => format!("{alias}{PATH_SEP}{}", route.function_name),
        // crate root: absolute path so a module alias can never shadow the crate
        None => format!("{PATH_SEP}{}", route.handler_path()),
    };
    let path = route.effective_path();
    Registration {
        method: route.method().to_string(),
        path_literal: format!("{path:?}"),
        path,
        method_fn: route.method().router_fn(),
        handler,
        qualified: route.handler_path(),
    }
}

/// Render the entry point that registers `routes`, in order, and serves them.
///
/// Exactly one registration is emitted per route.
pub fn render_main(routes: &RouteSet, config: &GeneratorConfig) -> Result<String> {
    let imports = plan_imports(routes);
    let registrations = {
        let aliases: HashMap<&str, &str> = imports
            .iter()
            .map(|i| (i.path.as_str(), i.alias.as_str()))
            .collect();
        routes.iter().map(|r| registration(r, &aliases)).collect()
    };

    let rendered = MainRsTemplateData {
        imports,
        registrations,
        addr_literal: format!("{:?}", config.listen_addr()),
    }
    .render()?;
    Ok(rendered)
}
