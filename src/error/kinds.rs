use std::{fmt, io};

/// Crate-wide `Result` type using [`VqlshError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, VqlshError>;

/// Top-level error type for console operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum VqlshError {
    /// Statement parsing errors.
    Parse(ParseError),

    /// Statement execution errors.
    Execution(ExecutionError),

    /// Configuration errors.
    Config(ConfigError),

    /// Catalog lookup errors.
    Lookup(LookupError),

    /// I/O errors.
    Io(io::Error),

    /// Serialization errors (JSON rendering, history files).
    Serialization(String),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Parsing-specific errors.
#[derive(Debug)]
pub enum ParseError {
    /// Syntax error in a statement.
    SyntaxError(String),

    /// Statement does not start with a known keyword.
    UnknownStatement(String),

    /// Unexpected token while parsing.
    UnexpectedToken { expected: String, found: String },

    /// Statement ended before it was complete.
    UnexpectedEnd(String),
}

/// Execution-specific errors.
#[derive(Debug)]
pub enum ExecutionError {
    /// Query evaluation failed.
    QueryFailed(String),

    /// Operation not supported by the evaluator.
    UnsupportedOperation(String),

    /// Invalid plugin or function arguments.
    InvalidParameters(String),

    /// Statement was cancelled by an interrupt.
    Cancelled(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Missing required field.
    MissingField(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/// Catalog lookup errors.
#[derive(Debug)]
pub enum LookupError {
    /// No function or plugin with this name.
    UnknownSymbol(String),

    /// No named query template with this name.
    UnknownArtifact(String),

    /// Variable is not bound in scope.
    UnknownVariable(String),
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for VqlshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VqlshError::Parse(e) => write!(f, "{e}"),
            VqlshError::Execution(e) => write!(f, "Execution error: {e}"),
            VqlshError::Config(e) => write!(f, "Configuration error: {e}"),
            VqlshError::Lookup(e) => write!(f, "{e}"),
            VqlshError::Io(e) => write!(f, "I/O error: {e}"),
            VqlshError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            VqlshError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::SyntaxError(msg) => write!(f, "Syntax error: {msg}"),
            ParseError::UnknownStatement(stmt) => write!(f, "Unknown statement: {stmt}"),
            ParseError::UnexpectedToken { expected, found } => {
                write!(f, "Expected '{expected}', found '{found}'")
            }
            ParseError::UnexpectedEnd(expected) => {
                write!(f, "Unexpected end of statement, expected {expected}")
            }
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::QueryFailed(msg) => write!(f, "Query failed: {msg}"),
            ExecutionError::UnsupportedOperation(op) => {
                write!(f, "Unsupported operation: {op}")
            }
            ExecutionError::InvalidParameters(msg) => write!(f, "Invalid parameters: {msg}"),
            ExecutionError::Cancelled(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::MissingField(field) => write!(f, "Missing required field: {field}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::UnknownSymbol(_) => write!(f, "Unknown function or plugin."),
            LookupError::UnknownArtifact(_) => write!(f, "Unknown artifact."),
            LookupError::UnknownVariable(name) => write!(f, "Symbol {name} not found."),
        }
    }
}

impl std::error::Error for VqlshError {}
impl std::error::Error for ParseError {}
impl std::error::Error for ExecutionError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for LookupError {}

impl VqlshError {
    /// Whether this error is a cooperative cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, VqlshError::Execution(ExecutionError::Cancelled(_)))
    }
}

/* ========================= Conversions to VqlshError ========================= */

impl From<io::Error> for VqlshError {
    fn from(err: io::Error) -> Self {
        VqlshError::Io(err)
    }
}

impl From<serde_json::Error> for VqlshError {
    fn from(err: serde_json::Error) -> Self {
        VqlshError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for VqlshError {
    fn from(err: toml::de::Error) -> Self {
        VqlshError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<toml::ser::Error> for VqlshError {
    fn from(err: toml::ser::Error) -> Self {
        VqlshError::Serialization(err.to_string())
    }
}

impl From<ParseError> for VqlshError {
    fn from(err: ParseError) -> Self {
        VqlshError::Parse(err)
    }
}

impl From<ExecutionError> for VqlshError {
    fn from(err: ExecutionError) -> Self {
        VqlshError::Execution(err)
    }
}

impl From<ConfigError> for VqlshError {
    fn from(err: ConfigError) -> Self {
        VqlshError::Config(err)
    }
}

impl From<LookupError> for VqlshError {
    fn from(err: LookupError) -> Self {
        VqlshError::Lookup(err)
    }
}

impl From<String> for VqlshError {
    fn from(msg: String) -> Self {
        VqlshError::Generic(msg)
    }
}

impl From<&str> for VqlshError {
    fn from(msg: &str) -> Self {
        VqlshError::Generic(msg.to_owned())
    }
}
