//! Error types for the esform crate.

use thiserror::Error;

/// A malformed field directive.
///
/// Directives are static per form type, so these errors point at a typo in
/// the annotations rather than at bad request data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// `level:` value is not an integer.
    #[error("level must be an integer, got '{0}'")]
    InvalidLevel(String),

    /// Logical chain element is not one of the supported operators.
    #[error("unsupported logical operator '{0}': expected must, not, should, filter or nested@path")]
    UnsupportedLogical(String),

    /// A group name closes the logical chain.
    #[error("group '{0}' cannot be the last element of a logical chain")]
    TerminalGroup(String),

    /// A nested path closes the logical chain of a value field.
    #[error("nested path '{0}' cannot be the last element of a logical chain")]
    TerminalNested(String),

    /// The same group name appears twice in one chain.
    #[error("group '{0}' appears more than once in the logical chain")]
    DuplicateGroup(String),

    /// Relational operator is not supported.
    #[error("unsupported relational operator '{0}'")]
    UnsupportedRelational(String),

    /// Sort mode is not supported.
    #[error("unsupported sort mode '{0}': expected default, byValue or nested")]
    UnsupportedSortMode(String),

    /// Value type hint is not supported.
    #[error("unsupported value type '{0}': expected string or number")]
    UnsupportedValueType(String),

    /// Nesting kind is not supported.
    #[error("unsupported nesting '{0}': expected nested, obj or innerHits")]
    UnsupportedNesting(String),
}

/// Errors that abort a compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A field carries a malformed directive.
    #[error("invalid directive on {form}.{field}: {source}")]
    Directive {
        form: String,
        field: String,
        #[source]
        source: TagError,
    },

    /// The index mapping could not be read.
    #[error("invalid index mapping: {0}")]
    InvalidMapping(String),

    /// The compile options could not be read.
    #[error("invalid compile options: {0}")]
    InvalidOptions(String),
}

/// Result type for esform operations.
pub type Result<T> = std::result::Result<T, CompileError>;
