//! In-memory catalogs
//!
//! Plain-data implementations of [`ScopeCatalog`] and [`ArtifactRepository`],
//! used for fixed catalogs and in tests.

use std::collections::{BTreeMap, HashMap};

use super::{Artifact, ArtifactRepository, CatalogEntry, FieldDescriptor, ScopeCatalog};
use crate::config::ArtifactDefinition;

/// Fixed scope built up front
#[derive(Debug, Clone, Default)]
pub struct MemoryScope {
    variables: Vec<String>,
    functions: Vec<CatalogEntry>,
    plugins: Vec<CatalogEntry>,
    arg_types: HashMap<String, Vec<FieldDescriptor>>,
}

impl MemoryScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(mut self, name: impl Into<String>) -> Self {
        self.variables.push(name.into());
        self
    }

    pub fn with_function(mut self, entry: CatalogEntry) -> Self {
        self.functions.push(entry);
        self
    }

    pub fn with_plugin(mut self, entry: CatalogEntry) -> Self {
        self.plugins.push(entry);
        self
    }

    /// Register the fields of an argument shape
    pub fn with_arg_type(mut self, name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        self.arg_types.insert(name.into(), fields);
        self
    }
}

impl ScopeCatalog for MemoryScope {
    fn variables(&self) -> Vec<String> {
        self.variables.clone()
    }

    fn functions(&self) -> Vec<CatalogEntry> {
        self.functions.clone()
    }

    fn plugins(&self) -> Vec<CatalogEntry> {
        self.plugins.clone()
    }

    fn argument_fields(&self, arg_type: &str) -> Option<Vec<FieldDescriptor>> {
        self.arg_types.get(arg_type).cloned()
    }
}

/// Named query templates held in a sorted map
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifacts {
    artifacts: BTreeMap<String, Artifact>,
}

impl MemoryArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.insert(artifact.name.clone(), artifact);
        self
    }

    /// Build the repository from `[[artifacts]]` config entries.
    ///
    /// The raw text of each artifact is its definition rendered back to TOML.
    pub fn from_definitions(definitions: &[ArtifactDefinition]) -> Self {
        definitions.iter().fold(Self::new(), |repo, def| {
            let raw = toml::to_string_pretty(def).unwrap_or_else(|_| def.query.clone());
            repo.with_artifact(Artifact {
                name: def.name.clone(),
                description: def.description.clone(),
                raw,
            })
        })
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ArtifactRepository for MemoryArtifacts {
    fn list(&self) -> Vec<String> {
        self.artifacts.keys().cloned().collect()
    }

    fn get(&self, name: &str) -> Option<Artifact> {
        self.artifacts.get(name).cloned()
    }
}
