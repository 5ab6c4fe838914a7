//! Read-only access to what a statement can see
//!
//! The console never owns variables, functions, plugins or named query
//! templates. It reads them through two capability traits supplied by the
//! evaluator side:
//!
//! - [`ScopeCatalog`]: variables in scope, registered functions and plugins,
//!   and the field descriptors of their argument shapes
//! - [`ArtifactRepository`]: named query templates ("artifacts")
//!
//! [`SuggestionSource`] turns both into completion [`Suggestion`]s.

pub mod memory;

use std::sync::Arc;

pub use memory::{MemoryArtifacts, MemoryScope};

/// Qualifier under which named query templates appear as plugins.
pub const ARTIFACT_PREFIX: &str = "Artifact.";

/// A single completion proposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Text inserted on completion
    pub text: String,
    /// Short description shown beside the text
    pub description: String,
}

impl Suggestion {
    /// Create a suggestion with a description
    pub fn new(text: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            description: description.into(),
        }
    }

    /// Create a suggestion without a description
    pub fn bare(text: impl Into<String>) -> Self {
        Self::new(text, "")
    }
}

/// A registered function or plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Name used in statements
    pub name: String,
    /// Documentation string
    pub doc: String,
    /// Name of the argument shape, resolved through [`ScopeCatalog::argument_fields`]
    pub arg_type: Option<String>,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, doc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: doc.into(),
            arg_type: None,
        }
    }

    /// Attach an argument shape
    pub fn with_arg_type(mut self, arg_type: impl Into<String>) -> Self {
        self.arg_type = Some(arg_type.into());
        self
    }
}

/// One declared field of an argument shape, as introspected by the evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Argument name
    pub name: String,
    /// Target type name
    pub target: String,
    /// Whether the argument accepts a list
    pub repeated: bool,
    /// Semi-structured metadata tag, e.g. `required,doc=A glob expression`
    pub tag: String,
}

impl FieldDescriptor {
    pub fn new(
        name: impl Into<String>,
        target: impl Into<String>,
        repeated: bool,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            repeated,
            tag: tag.into(),
        }
    }
}

/// A named query template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub description: String,
    /// Verbatim source of the definition
    pub raw: String,
}

/// Variables, functions and plugins visible to statements
pub trait ScopeCatalog: Send + Sync {
    /// Names of all variables currently bound
    fn variables(&self) -> Vec<String>;

    /// Registered functions, in registration order
    fn functions(&self) -> Vec<CatalogEntry>;

    /// Registered plugins, in registration order
    fn plugins(&self) -> Vec<CatalogEntry>;

    /// Field descriptors of a named argument shape
    fn argument_fields(&self, arg_type: &str) -> Option<Vec<FieldDescriptor>>;
}

/// Repository of named query templates
pub trait ArtifactRepository: Send + Sync {
    /// Names of all known templates
    fn list(&self) -> Vec<String>;

    /// Look up a template by its unqualified name
    fn get(&self, name: &str) -> Option<Artifact>;
}

/// Produces unfiltered suggestion lists from the scope and artifact catalogs.
#[derive(Clone)]
pub struct SuggestionSource {
    scope: Arc<dyn ScopeCatalog>,
    artifacts: Option<Arc<dyn ArtifactRepository>>,
}

impl SuggestionSource {
    /// Create a new suggestion source
    ///
    /// # Arguments
    /// * `scope` - Scope catalog to read from
    /// * `artifacts` - Optional artifact repository; without one no `Artifact.` names are offered
    pub fn new(
        scope: Arc<dyn ScopeCatalog>,
        artifacts: Option<Arc<dyn ArtifactRepository>>,
    ) -> Self {
        Self { scope, artifacts }
    }

    /// Scope catalog backing this source
    pub fn scope(&self) -> &Arc<dyn ScopeCatalog> {
        &self.scope
    }

    /// Artifact repository backing this source, if any
    pub fn artifacts(&self) -> Option<&Arc<dyn ArtifactRepository>> {
        self.artifacts.as_ref()
    }

    /// Visible variable names. Internal names starting with `$` or `_` are skipped.
    pub fn variables(&self) -> Vec<Suggestion> {
        self.scope
            .variables()
            .into_iter()
            .filter(|name| !name.starts_with('$') && !name.starts_with('_'))
            .map(Suggestion::bare)
            .collect()
    }

    /// Function names, optionally suffixed with `(`
    pub fn functions(&self, add_bracket: bool) -> Vec<Suggestion> {
        self.scope
            .functions()
            .into_iter()
            .map(|f| Suggestion::new(bracketed(f.name, add_bracket), f.doc))
            .collect()
    }

    /// Plugin names followed by `Artifact.<name>` entries, optionally suffixed with `(`
    pub fn plugins(&self, add_bracket: bool) -> Vec<Suggestion> {
        let mut result: Vec<Suggestion> = self
            .scope
            .plugins()
            .into_iter()
            .map(|p| Suggestion::new(bracketed(p.name, add_bracket), p.doc))
            .collect();

        let Some(repository) = &self.artifacts else {
            return result;
        };

        for name in repository.list() {
            if let Some(artifact) = repository.get(&name) {
                result.push(Suggestion::new(
                    bracketed(format!("{ARTIFACT_PREFIX}{name}"), add_bracket),
                    artifact.description,
                ));
            }
        }

        result
    }
}

fn bracketed(name: String, add_bracket: bool) -> String {
    if add_bracket { name + "(" } else { name }
}
