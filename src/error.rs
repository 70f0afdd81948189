use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = OptreeError> = std::result::Result<T, E>;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum OptreeError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ast(#[from] AstError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Serialize(#[from] SerializeError),

    #[error("`{dependency}` is not available in this build")]
    #[diagnostic(
        code(optree::dependency_unavailable),
        help("Rebuild with the `{feature}` cargo feature enabled.")
    )]
    DependencyUnavailable {
        dependency: &'static str,
        feature: &'static str,
    },
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParserError {
    #[error("Unexpected token")]
    #[diagnostic(
        code(parser::unexpected_token),
        help("The parser found a token it did not expect in this position.")
    )]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected {expected}, but found this")]
        span: SourceSpan,
        expected: String,
    },

    #[error("Unexpected end of input")]
    #[diagnostic(
        code(parser::unexpected_eof),
        help("The input ended unexpectedly. The parser expected more tokens.")
    )]
    UnexpectedEof {
        #[source_code]
        src: NamedSource<String>,
        #[label("Input ended unexpectedly here")]
        span: SourceSpan,
    },

    #[error("Invalid token")]
    #[diagnostic(
        code(parser::invalid_token),
        help("Check for unterminated strings or comments, or characters that are not part of an object literal.")
    )]
    InvalidToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("This could not be tokenized")]
        span: SourceSpan,
    },

    #[error("Unbalanced brackets in {kind} literal")]
    #[diagnostic(
        code(parser::unbalanced_callable),
        help("Every '{{', '(' and '[' inside a function or class body must be closed by its matching bracket.")
    )]
    UnbalancedCallable {
        #[source_code]
        src: NamedSource<String>,
        #[label("The {kind} starting here is never closed correctly")]
        span: SourceSpan,
        kind: String,
    },

    #[error("Invalid callable literal: {reason}")]
    #[diagnostic(
        code(parser::invalid_callable),
        help("Callable values must be `function` or `class` expressions with a braced body.")
    )]
    InvalidCallable {
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
        reason: String,
    },

    #[error("Nesting exceeds the limit of {limit} levels")]
    #[diagnostic(
        code(parser::nesting_too_deep),
        help("Raise `ParseOptions::max_depth` if this input is legitimate.")
    )]
    NestingTooDeep {
        #[source_code]
        src: NamedSource<String>,
        #[label("Limit reached here")]
        span: SourceSpan,
        limit: usize,
    },

    #[error("Invalid variable declaration: {reason}")]
    #[diagnostic(
        code(parser::variable_declaration),
        help("Expected a declaration of the form `const name = {{ ... }};`.")
    )]
    VariableDeclaration {
        #[source_code]
        src: NamedSource<String>,
        #[label("{reason}")]
        span: SourceSpan,
        reason: String,
    },
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum SchemaError {
    #[error("`{type_name}.{attribute}` (key `{key}`) expects {expected}, found {found}")]
    #[diagnostic(
        code(schema::mismatch),
        help("The value does not satisfy any validator declared for this attribute.")
    )]
    Mismatch {
        type_name: String,
        attribute: String,
        key: String,
        expected: String,
        found: String,
    },

    #[error("Unknown configuration type `{name}`")]
    #[diagnostic(
        code(schema::unknown_type),
        help("Register a schema with this name before referring to it.")
    )]
    UnknownType { name: String },

    #[error("`{type_name}` has no attribute or key named `{attribute}`")]
    #[diagnostic(code(schema::unknown_attribute))]
    UnknownAttribute {
        type_name: String,
        attribute: String,
    },

    #[error("Missing required key `{key}` in {context}")]
    #[diagnostic(
        code(schema::missing_key),
        help("Tagged values must carry a `type` property naming their concrete type.")
    )]
    MissingKey { key: String, context: String },

    #[error("`{type_name}` cannot interpret an array of {found} elements for `{attribute}`; expected {expected}")]
    #[diagnostic(code(schema::collection_arity))]
    CollectionArity {
        type_name: String,
        attribute: String,
        found: usize,
        expected: String,
    },

    #[error("Not a function or class literal: {reason}")]
    #[diagnostic(
        code(schema::invalid_callable),
        help("Callable text must start with `function`, `async function` or `class` and end with its closing brace.")
    )]
    InvalidCallable { reason: String },
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum AstError {
    #[error("`{key}` is not a legal key: {reason}")]
    #[diagnostic(
        code(ast::naming),
        help("Keys must be identifiers; hyphens are allowed and treated as underscores.")
    )]
    Naming { key: String, reason: String },

    #[error("`{key}` expects {expected}, found {found}")]
    #[diagnostic(code(ast::type_constraint))]
    TypeConstraint {
        key: String,
        expected: String,
        found: String,
    },
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum SerializeError {
    #[error("`{path}` cannot be serialized: {reason}")]
    #[diagnostic(
        code(serialize::not_serializable),
        help("Function and class literals only exist in literal notation; emit with `to_literal` instead.")
    )]
    NotSerializable { path: String, reason: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(serialize::json))]
    Json { message: String },

    #[error("YAML error: {message}")]
    #[diagnostic(code(serialize::yaml))]
    Yaml { message: String },
}

impl From<serde_json::Error> for SerializeError {
    fn from(err: serde_json::Error) -> Self {
        SerializeError::Json {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for OptreeError {
    fn from(err: serde_json::Error) -> Self {
        OptreeError::Serialize(err.into())
    }
}
