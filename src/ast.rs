//! Typed trees for literal fragments that are not plain option objects:
//! SVG-style attribute bags, markup nodes, and identifier-keyed node maps.
//!
//! The maps are thin wrappers over [`IndexMap`] that validate keys on the way
//! in. Hyphenated keys such as `stroke-width` are accepted: they are validated
//! and looked up with underscores in place of hyphens, and keep their
//! original spelling for output.

use crate::error::AstError;
use crate::lexer::is_identifier;
use crate::value::{Map, Value};
use indexmap::IndexMap;
use std::fmt;

/// The value type an [`AttributeMap`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementKind {
    /// Any of null, boolean, number or string.
    #[default]
    Scalar,
    String,
    Number,
    Boolean,
}

impl ElementKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            ElementKind::Scalar => matches!(
                value,
                Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
            ),
            ElementKind::String => matches!(value, Value::String(_)),
            ElementKind::Number => matches!(value, Value::Number(_)),
            ElementKind::Boolean => matches!(value, Value::Bool(_)),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Scalar => write!(f, "a scalar"),
            ElementKind::String => write!(f, "a string"),
            ElementKind::Number => write!(f, "a number"),
            ElementKind::Boolean => write!(f, "a boolean"),
        }
    }
}

/// Validates `key` and returns its lookup form (hyphens replaced by underscores).
pub fn normalize_key(key: &str) -> Result<String, AstError> {
    if key.is_empty() {
        return Err(AstError::Naming {
            key: key.to_string(),
            reason: "keys cannot be empty".to_string(),
        });
    }
    let normalized = key.replace('-', "_");
    if !is_identifier(&normalized) {
        return Err(AstError::Naming {
            key: key.to_string(),
            reason: "keys must start with a letter, `_` or `$` and contain only letters, digits, `_`, `$` or `-`".to_string(),
        });
    }
    Ok(normalized)
}

/// Ordered map of validated keys to scalar values of one [`ElementKind`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeMap {
    element: ElementKind,
    // normalized key -> (key as written, value)
    entries: IndexMap<String, (String, Value)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(element: ElementKind) -> Self {
        Self {
            element,
            entries: IndexMap::new(),
        }
    }

    pub fn element(&self) -> ElementKind {
        self.element
    }

    /// Inserts `value` under `key`, returning the previous value.
    pub fn insert(
        &mut self,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, AstError> {
        let normalized = normalize_key(key)?;
        let value = value.into();
        if !self.element.accepts(&value) {
            return Err(AstError::TypeConstraint {
                key: key.to_string(),
                expected: self.element.to_string(),
                found: value.type_name().to_string(),
            });
        }
        Ok(self
            .entries
            .insert(normalized, (key.to_string(), value))
            .map(|(_, old)| old))
    }

    /// Looks up `key` in either its hyphenated or underscored spelling.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(&key.replace('-', "_")).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries
            .shift_remove(&key.replace('-', "_"))
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.replace('-', "_"))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(key as written, value)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.values().map(|(k, v)| (k.as_str(), v))
    }

    pub fn fill(&self) -> Option<&str> {
        self.get("fill").and_then(Value::as_str)
    }

    pub fn stroke(&self) -> Option<&str> {
        self.get("stroke").and_then(Value::as_str)
    }

    pub fn stroke_width(&self) -> Option<f64> {
        self.get("stroke_width").and_then(Value::as_f64)
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str)
    }

    pub fn from_value(value: &Value, element: ElementKind) -> Result<Self, AstError> {
        let map = value.as_object().ok_or_else(|| AstError::TypeConstraint {
            key: "attributes".to_string(),
            expected: "an object".to_string(),
            found: value.type_name().to_string(),
        })?;
        let mut attributes = Self::with_element(element);
        for (key, item) in map {
            attributes.insert(key, item.clone())?;
        }
        Ok(attributes)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }
}

/// A markup node: `{ tagName, attributes, children, textContent }` in
/// literal form.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    tag: String,
    attributes: AttributeMap,
    children: Vec<Node>,
    text_content: Option<String>,
}

impl Node {
    pub fn new(tag: &str) -> Result<Self, AstError> {
        normalize_key(tag)?;
        Ok(Self {
            tag: tag.to_string(),
            attributes: AttributeMap::new(),
            children: Vec::new(),
            text_content: None,
        })
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Result<Self, AstError> {
        self.attributes.insert(key, value)?;
        Ok(self)
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeMap {
        &mut self.attributes
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn text_content(&self) -> Option<&str> {
        self.text_content.as_deref()
    }

    pub fn from_value(value: &Value) -> Result<Self, AstError> {
        let map = value.as_object().ok_or_else(|| AstError::TypeConstraint {
            key: "node".to_string(),
            expected: "an object with a `tagName`".to_string(),
            found: value.type_name().to_string(),
        })?;
        let tag = match map.get("tagName") {
            Some(Value::String(tag)) => tag,
            other => {
                return Err(AstError::TypeConstraint {
                    key: "tagName".to_string(),
                    expected: "a string".to_string(),
                    found: other.map_or("nothing", Value::type_name).to_string(),
                })
            }
        };
        let mut node = Node::new(tag)?;
        if let Some(attributes) = map.get("attributes") {
            node.attributes = AttributeMap::from_value(attributes, ElementKind::Scalar)?;
        }
        match map.get("children") {
            None => {}
            Some(Value::Array(children)) => {
                for child in children {
                    node.children.push(Node::from_value(child)?);
                }
            }
            Some(other) => {
                return Err(AstError::TypeConstraint {
                    key: "children".to_string(),
                    expected: "an array of nodes".to_string(),
                    found: other.type_name().to_string(),
                })
            }
        }
        match map.get("textContent") {
            None | Some(Value::Null) => {}
            Some(Value::String(text)) => node.text_content = Some(text.clone()),
            Some(other) => {
                return Err(AstError::TypeConstraint {
                    key: "textContent".to_string(),
                    expected: "a string".to_string(),
                    found: other.type_name().to_string(),
                })
            }
        }
        for key in map.keys() {
            if !matches!(
                key.as_str(),
                "tagName" | "attributes" | "children" | "textContent"
            ) {
                log::debug!("ignoring unknown node key `{key}` on <{}>", node.tag);
            }
        }
        Ok(node)
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("tagName".to_string(), Value::String(self.tag.clone()));
        if !self.attributes.is_empty() {
            map.insert("attributes".to_string(), self.attributes.to_value());
        }
        if !self.children.is_empty() {
            map.insert(
                "children".to_string(),
                Value::Array(self.children.iter().map(Node::to_value).collect()),
            );
        }
        if let Some(text) = &self.text_content {
            map.insert("textContent".to_string(), Value::String(text.clone()));
        }
        Value::Object(map)
    }
}

/// Ordered map of validated identifiers to [`Node`]s, e.g. SVG `defs`
/// keyed by marker id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeMap {
    entries: IndexMap<String, (String, Node)>,
}

impl NodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, node: Node) -> Result<Option<Node>, AstError> {
        let normalized = normalize_key(key)?;
        Ok(self
            .entries
            .insert(normalized, (key.to_string(), node))
            .map(|(_, old)| old))
    }

    /// Inserts a node given in literal form.
    pub fn insert_value(&mut self, key: &str, value: &Value) -> Result<Option<Node>, AstError> {
        normalize_key(key)?;
        if !matches!(value, Value::Object(_)) {
            return Err(AstError::TypeConstraint {
                key: key.to_string(),
                expected: "a node".to_string(),
                found: value.type_name().to_string(),
            });
        }
        self.insert(key, Node::from_value(value)?)
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(&key.replace('-', "_")).map(|(_, n)| n)
    }

    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.entries
            .shift_remove(&key.replace('-', "_"))
            .map(|(_, n)| n)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.values().map(|(k, n)| (k.as_str(), n))
    }

    pub fn from_value(value: &Value) -> Result<Self, AstError> {
        let map = value.as_object().ok_or_else(|| AstError::TypeConstraint {
            key: "nodes".to_string(),
            expected: "an object of nodes".to_string(),
            found: value.type_name().to_string(),
        })?;
        let mut nodes = Self::new();
        for (key, item) in map {
            nodes.insert_value(key, item)?;
        }
        Ok(nodes)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(k, n)| (k.to_string(), n.to_value()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyphenated_keys_are_accepted() {
        let mut attributes = AttributeMap::new();
        attributes.insert("stroke-width", 2).unwrap();
        attributes.insert("fill", "red").unwrap();

        assert_eq!(attributes.stroke_width(), Some(2.0));
        assert_eq!(attributes.get("stroke-width"), Some(&Value::Number(2.0)));
        assert_eq!(attributes.fill(), Some("red"));
        let keys: Vec<&str> = attributes.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["stroke-width", "fill"]);
    }

    #[test]
    fn test_invalid_keys_fail_with_naming_error() {
        let mut attributes = AttributeMap::new();
        for key in ["", "1st", "has space", "a.b"] {
            let err = attributes.insert(key, 1).unwrap_err();
            assert!(matches!(err, AstError::Naming { .. }), "{key}");
        }
    }

    #[test]
    fn test_element_kind_is_enforced() {
        let mut numbers = AttributeMap::with_element(ElementKind::Number);
        numbers.insert("x1", 0).unwrap();
        let err = numbers.insert("x2", "wide").unwrap_err();
        assert_eq!(
            err,
            AstError::TypeConstraint {
                key: "x2".to_string(),
                expected: "a number".to_string(),
                found: "a string".to_string(),
            }
        );

        let mut scalars = AttributeMap::new();
        let err = scalars.insert("nested", Value::Array(vec![])).unwrap_err();
        assert!(matches!(err, AstError::TypeConstraint { .. }));
    }

    #[test]
    fn test_node_literal_round_trip() {
        let node = Node::new("marker")
            .unwrap()
            .with_attribute("id", "arrow")
            .unwrap()
            .with_attribute("refX", 0)
            .unwrap()
            .with_child(
                Node::new("path")
                    .unwrap()
                    .with_attribute("d", "M 0 0 L 10 5 L 0 10 Z")
                    .unwrap(),
            );

        let value = node.to_value();
        assert_eq!(value.get("tagName"), Some(&Value::from("marker")));
        let back = Node::from_value(&value).unwrap();
        assert_eq!(back, node);
        assert_eq!(back.children()[0].tag(), "path");
        assert_eq!(back.attributes().id(), Some("arrow"));
    }

    #[test]
    fn test_node_requires_tag_name() {
        let mut map = Map::new();
        map.insert("attributes".to_string(), Value::Object(Map::new()));
        let err = Node::from_value(&Value::Object(map)).unwrap_err();
        assert!(matches!(err, AstError::TypeConstraint { ref key, .. } if key == "tagName"));
    }

    #[test]
    fn test_node_map_rejects_non_nodes() {
        let mut defs = NodeMap::new();
        let err = defs.insert_value("arrow", &Value::from(3)).unwrap_err();
        assert!(matches!(err, AstError::TypeConstraint { .. }));

        let err = defs.insert("bad key", Node::new("g").unwrap()).unwrap_err();
        assert!(matches!(err, AstError::Naming { .. }));
    }
}
