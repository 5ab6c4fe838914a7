//! Help lookup for functions, plugins and artifacts
//!
//! `HELP <name>` resolves the first token naming something known. Tokens are
//! tried in order: an `Artifact.<name>` token ends the search either way, other
//! tokens are looked up among functions, then plugins, and skipped when
//! neither has them.

use std::fmt;

use tracing::debug;

use crate::catalog::{ARTIFACT_PREFIX, Artifact, CatalogEntry, FieldDescriptor, SuggestionSource};
use crate::error::{LookupError, Result};
use crate::formatter::table::render_arguments;

/// Parsed argument metadata tag such as `required,doc=A glob expression`.
///
/// The tag is a comma separated list. `doc=` takes the text up to the next
/// comma and `required` must be a whole segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSet<'a> {
    doc: Option<&'a str>,
    required: bool,
}

impl<'a> TagSet<'a> {
    pub fn parse(tag: &'a str) -> Self {
        let mut doc = None;
        let mut required = false;

        for segment in tag.split(',') {
            let segment = segment.trim();
            match segment.split_once('=') {
                Some(("doc", value)) if doc.is_none() => doc = Some(value),
                Some(_) => {}
                None if segment == "required" => required = true,
                None => {}
            }
        }

        Self { doc, required }
    }

    pub fn doc(&self) -> Option<&'a str> {
        self.doc
    }

    pub fn required(&self) -> bool {
        self.required
    }
}

/// One row of the argument table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentDescriptor {
    pub field_name: String,
    pub doc: String,
    pub target_type: String,
    pub repeated: bool,
    pub required: bool,
}

impl From<&FieldDescriptor> for ArgumentDescriptor {
    fn from(field: &FieldDescriptor) -> Self {
        let tags = TagSet::parse(&field.tag);
        Self {
            field_name: field.name.clone(),
            doc: tags.doc().unwrap_or_default().to_string(),
            target_type: field.target.clone(),
            repeated: field.repeated,
            required: tags.required(),
        }
    }
}

/// Documentation of a function or plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHelp {
    pub entry: CatalogEntry,

    /// Argument table, `None` when the argument shape is unknown
    pub arguments: Option<Vec<ArgumentDescriptor>>,
}

/// Result of a successful help lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelpTopic {
    /// Named query template, shown verbatim
    Artifact(Artifact),
    Function(EntryHelp),
    Plugin(EntryHelp),
}

impl fmt::Display for HelpTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, help) = match self {
            HelpTopic::Artifact(artifact) => return write!(f, "{}", artifact.raw),
            HelpTopic::Function(help) => ("Function", help),
            HelpTopic::Plugin(help) => ("VQL Plugin", help),
        };

        write!(f, "{} {}:\n{}\n\n", kind, help.entry.name, help.entry.doc)?;
        if let Some(arguments) = &help.arguments {
            write!(f, "Args:\n{}\n", render_arguments(arguments))?;
        }
        Ok(())
    }
}

/// Resolves `HELP` statements against the scope and artifact catalogs
#[derive(Clone)]
pub struct HelpResolver {
    source: SuggestionSource,
}

impl HelpResolver {
    pub fn new(source: SuggestionSource) -> Self {
        Self { source }
    }

    /// Resolve a help statement
    ///
    /// # Arguments
    /// * `text` - Full statement, e.g. `HELP glob`
    ///
    /// # Returns
    /// * `Result<HelpTopic>` - Topic for the first resolvable token, or a lookup error
    pub fn resolve(&self, text: &str) -> Result<HelpTopic> {
        let tokens = text
            .split(' ')
            .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("HELP"));

        for token in tokens {
            if let Some(name) = token.strip_prefix(ARTIFACT_PREFIX) {
                return self.resolve_artifact(name);
            }

            if let Some(topic) = self.resolve_entry(token) {
                return Ok(topic);
            }
            debug!("No function or plugin named {}", token);
        }

        Err(LookupError::UnknownSymbol(text.to_string()).into())
    }

    fn resolve_artifact(&self, name: &str) -> Result<HelpTopic> {
        self.source
            .artifacts()
            .and_then(|repository| repository.get(name))
            .map(HelpTopic::Artifact)
            .ok_or_else(|| LookupError::UnknownArtifact(name.to_string()).into())
    }

    fn resolve_entry(&self, name: &str) -> Option<HelpTopic> {
        let scope = self.source.scope();

        if let Some(function) = scope.functions().into_iter().find(|f| f.name == name) {
            return Some(HelpTopic::Function(self.describe(function)));
        }

        scope
            .plugins()
            .into_iter()
            .find(|p| p.name == name)
            .map(|plugin| HelpTopic::Plugin(self.describe(plugin)))
    }

    fn describe(&self, entry: CatalogEntry) -> EntryHelp {
        let arguments = entry
            .arg_type
            .as_deref()
            .and_then(|arg_type| self.source.scope().argument_fields(arg_type))
            .map(|fields| fields.iter().map(ArgumentDescriptor::from).collect());

        EntryHelp { entry, arguments }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MemoryArtifacts, MemoryScope};
    use crate::error::VqlshError;
    use std::sync::Arc;

    fn resolver() -> HelpResolver {
        let scope = MemoryScope::new()
            .with_function(CatalogEntry::new("foo", "d"))
            .with_function(
                CatalogEntry::new("format", "Format a string").with_arg_type("FormatArgs"),
            )
            .with_plugin(CatalogEntry::new("glob", "Search for files").with_arg_type("GlobArgs"))
            .with_plugin(CatalogEntry::new("foo_plugin", "plugin doc"))
            .with_arg_type(
                "GlobArgs",
                vec![
                    FieldDescriptor::new(
                        "globs",
                        "string",
                        true,
                        "required,doc=One or more glob patterns",
                    ),
                    FieldDescriptor::new("root", "string", false, "doc=The root directory"),
                ],
            );
        let artifacts = MemoryArtifacts::new().with_artifact(Artifact {
            name: "Linux.Sys.Users".to_string(),
            description: "List users".to_string(),
            raw: "name: Linux.Sys.Users\nsources: []\n".to_string(),
        });
        HelpResolver::new(SuggestionSource::new(
            Arc::new(scope),
            Some(Arc::new(artifacts)),
        ))
    }

    #[test]
    fn test_tag_parsing() {
        let tags = TagSet::parse("required,doc=A glob expression");
        assert!(tags.required());
        assert_eq!(tags.doc(), Some("A glob expression"));

        let tags = TagSet::parse("doc=Path, relative to root,required");
        assert_eq!(tags.doc(), Some("Path"));
        assert!(tags.required());

        let tags = TagSet::parse("doc=not required here");
        assert!(!tags.required());

        let tags = TagSet::parse("notrequired");
        assert!(!tags.required());
        assert_eq!(tags.doc(), None);

        let tags = TagSet::parse("");
        assert!(!tags.required());
    }

    #[test]
    fn test_argument_descriptor_from_field() {
        let field = FieldDescriptor::new("globs", "string", true, "required,doc=Patterns");
        let arg = ArgumentDescriptor::from(&field);
        assert_eq!(arg.field_name, "globs");
        assert_eq!(arg.doc, "Patterns");
        assert_eq!(arg.target_type, "string");
        assert!(arg.repeated);
        assert!(arg.required);
    }

    #[test]
    fn test_function_help() {
        let topic = resolver().resolve("HELP foo").unwrap();
        assert!(matches!(&topic, HelpTopic::Function(h) if h.entry.doc == "d"));
        assert_eq!(topic.to_string(), "Function foo:\nd\n\n");
    }

    #[test]
    fn test_plugin_help_with_arguments() {
        let topic = resolver().resolve("help glob").unwrap();
        let HelpTopic::Plugin(help) = &topic else {
            panic!("expected plugin help, got {topic:?}");
        };

        let args = help.arguments.as_ref().unwrap();
        assert_eq!(args.len(), 2);
        assert!(args[0].required);
        assert!(!args[1].required);
        assert_eq!(args[1].doc, "The root directory");

        let rendered = topic.to_string();
        assert!(rendered.starts_with("VQL Plugin glob:\nSearch for files\n\nArgs:\n"));
        assert!(rendered.contains("globs"));
        assert!(rendered.contains("One or more glob patterns"));
        assert!(rendered.contains("repeated"));
        assert!(rendered.contains("required"));
    }

    #[test]
    fn test_unknown_arg_type_has_no_table() {
        let topic = resolver().resolve("HELP format").unwrap();
        let HelpTopic::Function(help) = &topic else {
            panic!("expected function help");
        };
        assert!(help.arguments.is_none());
        assert!(!topic.to_string().contains("Args:"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let err = resolver().resolve("HELP Foo").unwrap_err();
        assert!(matches!(err, VqlshError::Lookup(LookupError::UnknownSymbol(_))));
    }

    #[test]
    fn test_unknown_symbol() {
        let err = resolver().resolve("HELP bar").unwrap_err();
        assert_eq!(err.to_string(), "Unknown function or plugin.");
        assert!(resolver().resolve("HELP").is_err());
    }

    #[test]
    fn test_first_resolvable_token_wins() {
        let topic = resolver().resolve("HELP  bar glob foo").unwrap();
        assert!(matches!(topic, HelpTopic::Plugin(h) if h.entry.name == "glob"));
    }

    #[test]
    fn test_artifact_help() {
        let topic = resolver().resolve("HELP Artifact.Linux.Sys.Users").unwrap();
        assert_eq!(topic.to_string(), "name: Linux.Sys.Users\nsources: []\n");
    }

    #[test]
    fn test_unknown_artifact_stops_search() {
        let err = resolver().resolve("HELP Artifact.Nope foo").unwrap_err();
        assert!(matches!(
            err,
            VqlshError::Lookup(LookupError::UnknownArtifact(ref n)) if n == "Nope"
        ));
    }
}
