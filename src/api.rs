use crate::catalog;
use crate::emitter::{emit, emit_declaration, EmitOptions};
use crate::error::{OptreeError, Result};
use crate::marshal::Marshaller;
use crate::object::ConfigObject;
use crate::parser::{Declaration, ParseOptions, Parser};
use crate::value::Value;
use serde::ser::Error as _;
use serde::{Serialize, Serializer};

/// A parsed literal-notation document.
///
/// Holds the untyped value graph. Use [`Document::into_object`] to read it
/// as a configuration type, or the `to_*` methods to convert it directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub declaration: Option<Declaration>,
    pub root: Value,
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.root
            .to_json_value()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl Document {
    #[must_use]
    pub fn to_value(&self) -> Value {
        self.root.clone()
    }

    /// Serializes the document into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns `NotSerializable` if the document holds a function or class
    /// literal, a reference, or a non-finite number.
    pub fn to_json(&self) -> Result<String> {
        Ok(self.root.to_json()?)
    }

    /// Serializes the document into a YAML string.
    ///
    /// # Errors
    /// Fails like [`Document::to_json`], or with `DependencyUnavailable`
    /// when built without the `yaml` feature.
    pub fn to_yaml(&self) -> Result<String> {
        #[cfg(feature = "yaml")]
        {
            Ok(self.root.to_yaml()?)
        }
        #[cfg(not(feature = "yaml"))]
        {
            Err(OptreeError::DependencyUnavailable {
                dependency: "serde_yaml",
                feature: "yaml",
            })
        }
    }

    /// Re-emits the document, keeping its variable declaration if it had one.
    #[must_use]
    pub fn to_literal(&self, options: &EmitOptions) -> String {
        match &self.declaration {
            Some(decl) => emit_declaration(&decl.keyword, &decl.name, &self.root, options),
            None => emit(&self.root, options),
        }
    }

    /// Decodes the document as a `type_name` object.
    ///
    /// # Errors
    /// Returns a `SchemaError` when the type is unknown or a value does not
    /// fit its attribute.
    pub fn into_object(self, marshaller: &Marshaller<'_>, type_name: &str) -> Result<ConfigObject> {
        Ok(marshaller.from_intermediate(type_name, &self.root)?)
    }
}

/// Parses literal-notation text. `file_name` is only used in diagnostics.
///
/// # Errors
/// Returns a `ParserError` describing the first syntax problem.
pub fn parse_literal(source: &str, file_name: &str) -> Result<Document> {
    parse_literal_with(source, file_name, &ParseOptions::default())
}

/// Like [`parse_literal`], with explicit limits.
///
/// # Errors
/// Returns a `ParserError` describing the first syntax problem.
pub fn parse_literal_with(source: &str, file_name: &str, options: &ParseOptions) -> Result<Document> {
    let mut parser = Parser::new_with_name(source, file_name.to_string()).with_options(options.clone());
    let document = parser.parse_document()?;
    Ok(Document {
        declaration: document.declaration,
        root: document.root,
    })
}

/// Emits `obj` as literal text using the builtin types.
#[must_use]
pub fn to_literal(obj: &ConfigObject) -> String {
    Marshaller::new(catalog::builtin()).to_literal(obj)
}

/// Serializes `obj` as JSON using the builtin types.
///
/// # Errors
/// Returns `NotSerializable` if the tree holds a callable.
pub fn to_json(obj: &ConfigObject) -> Result<String> {
    Ok(Marshaller::new(catalog::builtin()).to_json(obj)?)
}

/// Reads a builtin `type_name` object from literal text.
///
/// # Errors
/// Returns a `ParserError` for malformed text or a `SchemaError` for values
/// that do not fit the type.
pub fn from_literal(type_name: &str, text: &str) -> Result<ConfigObject> {
    Marshaller::new(catalog::builtin()).from_literal(type_name, text)
}

/// Reads a builtin `type_name` object from JSON text.
///
/// # Errors
/// Returns a `SerializeError` for malformed JSON or a `SchemaError` for
/// values that do not fit the type.
pub fn from_json(type_name: &str, text: &str) -> Result<ConfigObject, OptreeError> {
    Marshaller::new(catalog::builtin()).from_json(type_name, text)
}
