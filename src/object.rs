use crate::ast::{AttributeMap, Node, NodeMap};
use crate::callable::CallableLiteral;
use crate::error::SchemaError;
use crate::schema::{KeyMapping, Schema, SchemaEntry};
use crate::value::Value;
use indexmap::IndexMap;
use std::sync::Arc;

/// The value held by one attribute of a [`ConfigObject`].
///
/// There is no "unset" variant: an unset attribute has no entry at all.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Written as an explicit `null`.
    EnforcedNull,
    Bool(bool),
    Number(f64),
    String(String),
    Identifier(String),
    Callable(CallableLiteral),
    Object(Box<ConfigObject>),
    Node(Node),
    Attributes(AttributeMap),
    Nodes(NodeMap),
    Array(Vec<AttrValue>),
    /// Passed through untouched, for attributes validated as `Any`.
    Raw(Value),
}

impl AttrValue {
    pub fn describe(&self) -> String {
        match self {
            AttrValue::EnforcedNull => "null".to_string(),
            AttrValue::Bool(_) => "a boolean".to_string(),
            AttrValue::Number(_) => "a number".to_string(),
            AttrValue::String(_) => "a string".to_string(),
            AttrValue::Identifier(_) => "an identifier".to_string(),
            AttrValue::Callable(_) => "a function literal".to_string(),
            AttrValue::Object(obj) => format!("a `{}` object", obj.type_name()),
            AttrValue::Node(_) => "a node".to_string(),
            AttrValue::Attributes(_) => "an attribute map".to_string(),
            AttrValue::Nodes(_) => "a node map".to_string(),
            AttrValue::Array(items) => format!("an array of {} elements", items.len()),
            AttrValue::Raw(value) => value.type_name().to_string(),
        }
    }

    /// The scalar form of this value, if it has one.
    pub fn as_scalar(&self) -> Option<Value> {
        match self {
            AttrValue::EnforcedNull => Some(Value::Null),
            AttrValue::Bool(b) => Some(Value::Bool(*b)),
            AttrValue::Number(n) => Some(Value::Number(*n)),
            AttrValue::String(s) => Some(Value::String(s.clone())),
            AttrValue::Identifier(name) => Some(Value::Identifier(name.clone())),
            AttrValue::Callable(c) => Some(Value::Callable(c.clone())),
            AttrValue::Raw(value) if !matches!(value, Value::Array(_) | Value::Object(_)) => {
                Some(value.clone())
            }
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ConfigObject> {
        match self {
            AttrValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Semantic equality: numbers compare by value (NaN matches NaN), nested
    /// objects recursively, arrays element-wise and by length.
    pub fn value_matches(&self, other: &AttrValue) -> bool {
        match (self, other) {
            (AttrValue::Number(a), AttrValue::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (AttrValue::Object(a), AttrValue::Object(b)) => a.value_matches(b),
            (AttrValue::Array(a), AttrValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.value_matches(y))
            }
            (a, b) => a == b,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<i32> for AttrValue {
    fn from(n: i32) -> Self {
        AttrValue::Number(f64::from(n))
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::String(s)
    }
}

impl From<CallableLiteral> for AttrValue {
    fn from(c: CallableLiteral) -> Self {
        AttrValue::Callable(c)
    }
}

impl From<ConfigObject> for AttrValue {
    fn from(obj: ConfigObject) -> Self {
        AttrValue::Object(Box::new(obj))
    }
}

impl From<Node> for AttrValue {
    fn from(node: Node) -> Self {
        AttrValue::Node(node)
    }
}

impl From<AttributeMap> for AttrValue {
    fn from(map: AttributeMap) -> Self {
        AttrValue::Attributes(map)
    }
}

impl From<NodeMap> for AttrValue {
    fn from(map: NodeMap) -> Self {
        AttrValue::Nodes(map)
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(items: Vec<T>) -> Self {
        AttrValue::Array(items.into_iter().map(Into::into).collect())
    }
}

/// An instance governed by a [`Schema`]: one node of the configuration tree.
#[derive(Debug, Clone)]
pub struct ConfigObject {
    schema: Arc<Schema>,
    values: IndexMap<String, AttrValue>,
}

impl ConfigObject {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            values: IndexMap::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The attribute's value, falling back to its declared default.
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values
            .get(name)
            .or_else(|| self.schema.entry_named(name).and_then(SchemaEntry::default))
    }

    /// The component values of a fan-out attribute such as `margin`, in
    /// declared order.
    pub fn components(&self, name: &str) -> Result<Vec<Option<&AttrValue>>, SchemaError> {
        let entry = self.entry(name)?;
        match entry.key() {
            KeyMapping::FanOut(components) => {
                Ok(components.iter().map(|c| self.get(c)).collect())
            }
            KeyMapping::Key(_) => Ok(vec![self.get(name)]),
        }
    }

    /// Whether the attribute was explicitly set. Fan-out attributes count as
    /// set when any component is.
    pub fn is_set(&self, name: &str) -> bool {
        match self.schema.entry_named(name).map(SchemaEntry::key) {
            Some(KeyMapping::FanOut(components)) => {
                components.iter().any(|c| self.values.contains_key(c))
            }
            _ => self.values.contains_key(name),
        }
    }

    /// Validates and stores `value`. A fan-out attribute takes either one
    /// value for every component or an array with one value per component.
    pub fn set(&mut self, name: &str, value: impl Into<AttrValue>) -> Result<(), SchemaError> {
        let schema = Arc::clone(&self.schema);
        let entry = schema.entry_named(name).ok_or_else(|| self.unknown(name))?;
        let value = value.into();

        if let KeyMapping::FanOut(components) = entry.key() {
            let parts = match value {
                AttrValue::Array(items) if items.len() == components.len() => items,
                AttrValue::Array(items) => {
                    return Err(SchemaError::CollectionArity {
                        type_name: self.type_name().to_string(),
                        attribute: name.to_string(),
                        found: items.len(),
                        expected: format!("1 value or {} values", components.len()),
                    })
                }
                single => vec![single; components.len()],
            };
            let mut conformed = Vec::with_capacity(parts.len());
            for (component, part) in components.iter().zip(parts) {
                let component_entry = schema
                    .entry_named(component)
                    .ok_or_else(|| self.unknown(component))?;
                conformed.push((component.clone(), self.conform(component_entry, part)?));
            }
            self.values.extend(conformed);
            return Ok(());
        }

        let conformed = self.conform(entry, value)?;
        self.values.insert(name.to_string(), conformed);
        Ok(())
    }

    /// Clears an attribute so it is trimmed from output.
    pub fn unset(&mut self, name: &str) -> Option<AttrValue> {
        if let Some(KeyMapping::FanOut(components)) =
            self.schema.entry_named(name).map(SchemaEntry::key)
        {
            for component in components {
                self.values.shift_remove(component);
            }
            return None;
        }
        self.values.shift_remove(name)
    }

    /// Explicitly set attributes in declared schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&SchemaEntry, &AttrValue)> {
        self.schema
            .entries()
            .iter()
            .filter_map(|entry| self.values.get(entry.name()).map(|v| (entry, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Semantic equality: same type, same set attributes, and every value
    /// matching per [`AttrValue::value_matches`].
    pub fn value_matches(&self, other: &ConfigObject) -> bool {
        self.type_name() == other.type_name()
            && self.values.len() == other.values.len()
            && self.values.iter().all(|(name, value)| {
                other
                    .values
                    .get(name)
                    .is_some_and(|theirs| value.value_matches(theirs))
            })
    }

    /// Stores an already validated value.
    pub(crate) fn store(&mut self, name: &str, value: AttrValue) {
        self.values.insert(name.to_string(), value);
    }

    fn entry(&self, name: &str) -> Result<&SchemaEntry, SchemaError> {
        self.schema.entry_named(name).ok_or_else(|| self.unknown(name))
    }

    fn conform(&self, entry: &SchemaEntry, value: AttrValue) -> Result<AttrValue, SchemaError> {
        let found = value.describe();
        entry
            .validator()
            .conform(value)
            .ok_or_else(|| SchemaError::Mismatch {
                type_name: self.type_name().to_string(),
                attribute: entry.name().to_string(),
                key: entry.external_key().unwrap_or(entry.name()).to_string(),
                expected: entry.validator().to_string(),
                found,
            })
    }

    fn unknown(&self, name: &str) -> SchemaError {
        SchemaError::UnknownAttribute {
            type_name: self.type_name().to_string(),
            attribute: name.to_string(),
        }
    }
}

impl PartialEq for ConfigObject {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name() && self.values == other.values
    }
}
