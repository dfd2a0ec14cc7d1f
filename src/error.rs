use thiserror::Error;

use crate::parameters::expression::ExpressionError;
use crate::parameters::interval::IntervalError;

/// Error types for the paramtree library.
#[derive(Error, Debug)]
pub enum ParamError {
    /// A node name is empty or contains the path separator.
    #[error("Invalid node name '{0}'")]
    InvalidName(String),

    /// A sibling with the same name already exists.
    #[error("Node '{parent}' already has a child named '{name}'")]
    NameConflict { parent: String, name: String },

    /// A child selector did not resolve.
    #[error("Node not found: {0}")]
    NotFound(String),

    /// The node passed as ancestor is not an ancestor.
    #[error("Node '{ancestor}' is not an ancestor of '{node}'")]
    NotAncestor { node: String, ancestor: String },

    /// Write attempted on a read-only parameter.
    #[error("Parameter '{0}' is not editable")]
    NotEditable(String),

    /// A value could not be coerced to the declared type.
    #[error("Type mismatch for '{name}': {message}")]
    TypeMismatch { name: String, message: String },

    /// A value was rejected by the parameter's validator.
    #[error("Value {value} is not accepted by the validator of '{name}'")]
    ValidationError { name: String, value: String },

    /// A formula references the parameter holding it.
    #[error("Formula of '{0}' references itself")]
    SelfReference(String),

    /// A type tag is already registered.
    #[error("A type with tag '{0}' is already registered")]
    DuplicateTag(String),

    /// A type tag or type was never registered.
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// A serialized record refers to a parent that was not loaded before it.
    #[error("Parent '{parent}' of node '{name}' does not exist")]
    MissingParent { parent: String, name: String },

    /// A formula variable resolved neither to a sibling nor to a context entry.
    #[error("Unresolved variable '{name}' in formula of '{param}'")]
    UnresolvedVariable { param: String, name: String },

    /// A value operation was called on a group.
    #[error("Node '{0}' is a group and holds no value")]
    NotALeaf(String),

    /// A child operation was called on a leaf.
    #[error("Node '{0}' is a parameter and cannot have children")]
    NotAGroup(String),

    /// Adoption would make a node its own descendant.
    #[error("Adding '{child}' under '{parent}' would create a cycle")]
    Cycle { parent: String, child: String },

    /// Formula evaluation nested deeper than the configured limit.
    #[error("Formula evaluation of '{0}' exceeded the maximum depth of {1}")]
    RecursionLimit(String, usize),

    /// A custom predicate validator cannot be persisted.
    #[error("Validator of '{0}' cannot be serialized")]
    UnsupportedValidator(String),

    /// Interval construction or parsing failed.
    #[error("Interval error: {0}")]
    Interval(#[from] IntervalError),

    /// Formula parsing or evaluation failed.
    #[error("Expression error in '{param}': {source}")]
    Expression {
        param: String,
        #[source]
        source: ExpressionError,
    },

    /// A persisted snapshot is structurally invalid.
    #[error("Invalid snapshot: {0}")]
    Format(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary snapshot encoding/decoding error.
    #[error("Binary snapshot error: {0}")]
    Binary(#[from] postcard::Error),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParamError {
    /// Wrap an expression error raised while evaluating the formula of `param`.
    ///
    /// Undefined variables surface as [`ParamError::UnresolvedVariable`].
    pub fn from_expression(param: &str, err: ExpressionError) -> Self {
        match err {
            ExpressionError::UndefinedVariable { name } => ParamError::UnresolvedVariable {
                param: param.to_string(),
                name,
            },
            other => ParamError::Expression {
                param: param.to_string(),
                source: other,
            },
        }
    }
}

/// Result type alias for paramtree operations.
pub type Result<T> = std::result::Result<T, ParamError>;
