use serde::{Deserialize, Serialize};

/// How a dependency is declared in `[dependencies]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DependencySpec {
    /// Simple version string: `"0.8"`
    Version(String),
    /// Workspace dependency: `{ workspace = true }`
    Workspace {
        workspace: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        features: Option<Vec<String>>,
    },
    /// Full specification: `{ version = "1", features = ["macros"] }`
    Full {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        git: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        features: Option<Vec<String>>,
    },
}

impl DependencySpec {
    /// Version requirement with features.
    pub fn with_features(version: &str, features: &[&str]) -> Self {
        DependencySpec::Full {
            version: Some(version.to_string()),
            path: None,
            git: None,
            branch: None,
            features: Some(features.iter().map(|f| f.to_string()).collect()),
        }
    }

    /// The declared version requirement, if any.
    pub fn version(&self) -> Option<&str> {
        match self {
            DependencySpec::Version(v) => Some(v),
            DependencySpec::Full { version, .. } => version.as_deref(),
            DependencySpec::Workspace { .. } => None,
        }
    }

    /// Features the declaration enables explicitly.
    pub fn features(&self) -> &[String] {
        match self {
            DependencySpec::Version(_) => &[],
            DependencySpec::Workspace { features, .. } | DependencySpec::Full { features, .. } => {
                features.as_deref().unwrap_or_default()
            }
        }
    }
}

impl From<&DependencySpec> for toml::Value {
    fn from(spec: &DependencySpec) -> Self {
        fn strings(items: &[String]) -> toml::Value {
            toml::Value::Array(items.iter().cloned().map(toml::Value::String).collect())
        }

        let mut table = toml::Table::new();
        match spec {
            DependencySpec::Version(v) => return toml::Value::String(v.clone()),
            DependencySpec::Workspace {
                workspace,
                features,
            } => {
                table.insert("workspace".into(), toml::Value::Boolean(*workspace));
                if let Some(features) = features {
                    table.insert("features".into(), strings(features));
                }
            }
            DependencySpec::Full {
                version,
                path,
                git,
                branch,
                features,
            } => {
                for (key, value) in [
                    ("version", version),
                    ("path", path),
                    ("git", git),
                    ("branch", branch),
                ] {
                    if let Some(value) = value {
                        table.insert(key.into(), toml::Value::String(value.clone()));
                    }
                }
                if let Some(features) = features {
                    table.insert("features".into(), strings(features));
                }
            }
        }
        toml::Value::Table(table)
    }
}

/// One entry of `[dependencies]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Crate name
    pub name: String,
    pub spec: DependencySpec,
}

impl Requirement {
    pub fn new(name: impl Into<String>, spec: DependencySpec) -> Self {
        Requirement {
            name: name.into(),
            spec,
        }
    }

    /// Requirement on a plain version string.
    pub fn version(name: impl Into<String>, version: impl Into<String>) -> Self {
        Requirement::new(name, DependencySpec::Version(version.into()))
    }
}
