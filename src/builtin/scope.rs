//! Variables, functions and plugins of the builtin evaluator

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use serde_json::{Value, json};

use super::statement::SelectQuery;
use crate::catalog::{CatalogEntry, FieldDescriptor, ScopeCatalog};
use crate::config::{ArtifactDefinition, Config};
use crate::error::Result;
use crate::executor::Row;

/// Name of the uploader binding
pub const UPLOADER_VAR: &str = "$uploader";

/// Name of the evaluation cache binding
pub const CACHE_VAR: &str = "$cache";

/// What a variable is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Plain value, from startup or the environment
    Value(Value),
    /// `LET name = ...`: evaluated on every use
    Stored(SelectQuery),
    /// `LET name <= ...`: rows captured when bound
    Materialized(Vec<Row>),
}

impl Binding {
    pub fn kind(&self) -> &'static str {
        match self {
            Binding::Value(_) => "value",
            Binding::Stored(_) => "stored query",
            Binding::Materialized(_) => "materialized query",
        }
    }
}

/// Builtin function or plugin description
struct Builtin {
    name: &'static str,
    doc: &'static str,
    arg_type: Option<&'static str>,
}

const FUNCTIONS: &[Builtin] = &[
    Builtin {
        name: "now",
        doc: "Returns the current time in RFC 3339 format.",
        arg_type: None,
    },
    Builtin {
        name: "hostname",
        doc: "Returns the name of this host.",
        arg_type: None,
    },
    Builtin {
        name: "version",
        doc: "Returns the console version.",
        arg_type: None,
    },
    Builtin {
        name: "upload",
        doc: "Copies a file into the dump directory.",
        arg_type: Some("UploadArgs"),
    },
    Builtin {
        name: "sleep",
        doc: "Waits for the given number of seconds. Interruptible.",
        arg_type: Some("SleepArgs"),
    },
];

const PLUGINS: &[Builtin] = &[
    Builtin {
        name: "info",
        doc: "Information about the host running the console.",
        arg_type: None,
    },
    Builtin {
        name: "scope",
        doc: "Lists the variables bound in the current scope.",
        arg_type: None,
    },
    Builtin {
        name: "artifact_definitions",
        doc: "Lists the artifacts defined in the configuration.",
        arg_type: Some("ArtifactDefinitionsArgs"),
    },
    Builtin {
        name: "range",
        doc: "Emits one row per integer in a range.",
        arg_type: Some("RangeArgs"),
    },
];

fn argument_shape(arg_type: &str) -> Option<Vec<FieldDescriptor>> {
    let fields = match arg_type {
        "UploadArgs" => vec![
            FieldDescriptor::new(
                "file",
                "string",
                false,
                "required,doc=Path of the file to upload",
            ),
            FieldDescriptor::new("name", "string", false, "doc=Name to store the file under"),
        ],
        "SleepArgs" => vec![FieldDescriptor::new(
            "time",
            "int64",
            false,
            "required,doc=Number of seconds to wait",
        )],
        "ArtifactDefinitionsArgs" => vec![FieldDescriptor::new(
            "names",
            "string",
            true,
            "doc=Only show artifacts with these names",
        )],
        "RangeArgs" => vec![
            FieldDescriptor::new("start", "int64", false, "doc=First value, 0 if omitted"),
            FieldDescriptor::new("end", "int64", false, "required,doc=Stop before this value"),
            FieldDescriptor::new("step", "int64", false, "doc=Increment, 1 if omitted"),
        ],
        _ => return None,
    };
    Some(fields)
}

/// Scope of the builtin evaluator.
///
/// Bindings are shared between the evaluator, which adds `LET` names, and
/// the completer, which lists them.
#[derive(Debug)]
pub struct BuiltinScope {
    bindings: RwLock<BTreeMap<String, Binding>>,
    artifacts: Vec<ArtifactDefinition>,
}

impl BuiltinScope {
    /// Scope with no bindings and no artifacts
    pub fn empty() -> Self {
        Self {
            bindings: RwLock::new(BTreeMap::new()),
            artifacts: Vec::new(),
        }
    }

    /// Build the startup scope
    ///
    /// # Arguments
    /// * `config` - Effective configuration
    /// * `dump_dir` - Directory handed to the uploader
    ///
    /// # Returns
    /// * `Result<Self>` - Scope with `config`, `server_config`, `$uploader`, `$cache`
    ///   and env entries
    pub fn from_config(config: &Config, dump_dir: &Path) -> Result<Self> {
        let scope = Self {
            bindings: RwLock::new(BTreeMap::new()),
            artifacts: config.artifacts.clone(),
        };

        scope.bind("config", Binding::Value(serde_json::to_value(&config.client)?));
        scope.bind("server_config", Binding::Value(serde_json::to_value(config)?));
        scope.bind(
            UPLOADER_VAR,
            Binding::Value(json!({ "upload_dir": dump_dir.display().to_string() })),
        );
        scope.bind(CACHE_VAR, Binding::Value(json!({})));
        for (name, value) in &config.env {
            scope.bind(name, Binding::Value(Value::String(value.clone())));
        }

        Ok(scope)
    }

    /// Bind or rebind a variable
    pub fn bind(&self, name: impl Into<String>, binding: Binding) {
        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), binding);
    }

    pub fn lookup(&self, name: &str) -> Option<Binding> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// All bindings, sorted by name
    pub fn bindings(&self) -> Vec<(String, Binding)> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Artifact definitions from the configuration
    pub fn artifacts(&self) -> &[ArtifactDefinition] {
        &self.artifacts
    }

    /// Directory the uploader writes to, if the uploader is bound
    pub fn upload_dir(&self) -> Option<String> {
        match self.lookup(UPLOADER_VAR)? {
            Binding::Value(value) => value.get("upload_dir")?.as_str().map(str::to_string),
            _ => None,
        }
    }
}

impl ScopeCatalog for BuiltinScope {
    fn variables(&self) -> Vec<String> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    fn functions(&self) -> Vec<CatalogEntry> {
        FUNCTIONS.iter().map(to_entry).collect()
    }

    fn plugins(&self) -> Vec<CatalogEntry> {
        PLUGINS.iter().map(to_entry).collect()
    }

    fn argument_fields(&self, arg_type: &str) -> Option<Vec<FieldDescriptor>> {
        argument_shape(arg_type)
    }
}

fn to_entry(builtin: &Builtin) -> CatalogEntry {
    let entry = CatalogEntry::new(builtin.name, builtin.doc);
    match builtin.arg_type {
        Some(arg_type) => entry.with_arg_type(arg_type),
        None => entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SuggestionSource;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn config() -> Config {
        let mut config = Config::default();
        config.client.server_urls = vec!["https://localhost:8000/".to_string()];
        config.env.insert("Hostname".to_string(), "test-host".to_string());
        config
    }

    #[test]
    fn test_startup_bindings() {
        let scope = BuiltinScope::from_config(&config(), &PathBuf::from("/tmp/dump")).unwrap();

        let vars = scope.variables();
        for name in ["config", "server_config", "$uploader", "$cache", "Hostname"] {
            assert!(vars.contains(&name.to_string()), "missing {name}");
        }

        let Some(Binding::Value(client)) = scope.lookup("config") else {
            panic!("config should be a value");
        };
        assert_eq!(client["server_urls"][0], "https://localhost:8000/");
        assert_eq!(scope.upload_dir().as_deref(), Some("/tmp/dump"));
        assert_eq!(
            scope.lookup("Hostname"),
            Some(Binding::Value(Value::String("test-host".into())))
        );
    }

    #[test]
    fn test_internal_names_hidden_from_completion() {
        let scope = BuiltinScope::from_config(&config(), Path::new(".")).unwrap();
        let source = SuggestionSource::new(Arc::new(scope), None);
        let names: Vec<String> = source.variables().into_iter().map(|s| s.text).collect();
        assert!(names.contains(&"config".to_string()));
        assert!(!names.iter().any(|n| n.starts_with('$')));
    }

    #[test]
    fn test_bind_replaces() {
        let scope = BuiltinScope::empty();
        scope.bind("x", Binding::Value(json!(1)));
        scope.bind("x", Binding::Materialized(vec![]));
        assert_eq!(scope.lookup("x").map(|b| b.kind()), Some("materialized query"));
        assert_eq!(scope.bindings().len(), 1);
    }

    #[test]
    fn test_catalog_argument_shapes() {
        let scope = BuiltinScope::empty();
        for entry in scope.functions().into_iter().chain(scope.plugins()) {
            if let Some(arg_type) = entry.arg_type {
                assert!(scope.argument_fields(&arg_type).is_some(), "{arg_type}");
            }
        }
        assert!(scope.argument_fields("Unknown").is_none());
    }
}
