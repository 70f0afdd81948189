//! Schema-driven conversion between [`ConfigObject`] trees and the
//! intermediate [`Value`] graph, and from there to plain maps, JSON, YAML and
//! literal text.

use crate::ast::{AttributeMap, Node, NodeMap};
use crate::emitter::{emit, EmitOptions};
use crate::error::{OptreeError, SchemaError, SerializeError};
use crate::object::{AttrValue, ConfigObject};
use crate::parser::{inject_type_tag, ParseOptions, Parser};
use crate::schema::{KeyMapping, Registry, Schema, SchemaEntry};
use crate::validators::Validator;
use crate::value::{Map, Value};
use std::sync::Arc;

/// Where a value is being decoded, for error messages.
#[derive(Clone, Copy)]
struct Slot<'s> {
    type_name: &'s str,
    attribute: &'s str,
    key: &'s str,
}

impl<'s> Slot<'s> {
    fn root(type_name: &'s str) -> Self {
        Self {
            type_name,
            attribute: "(root)",
            key: "(root)",
        }
    }

    fn of(schema: &'s Schema, entry: &'s SchemaEntry) -> Self {
        Self {
            type_name: schema.name(),
            attribute: entry.name(),
            key: entry.external_key().unwrap_or(entry.name()),
        }
    }

    fn mismatch(&self, expected: impl ToString, found: impl ToString) -> SchemaError {
        SchemaError::Mismatch {
            type_name: self.type_name.to_string(),
            attribute: self.attribute.to_string(),
            key: self.key.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// Converts objects of the types in a [`Registry`].
#[derive(Debug, Clone, Copy)]
pub struct Marshaller<'r> {
    registry: &'r Registry,
}

impl<'r> Marshaller<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    // === Encoding ===

    /// Set attributes in schema order under their external keys. Unset
    /// attributes are left out; explicit nulls are kept. Tagged types end
    /// with their `type` property.
    pub fn to_intermediate(&self, obj: &ConfigObject) -> Value {
        let mut map = Map::new();
        for (entry, value) in obj.iter() {
            if let Some(key) = entry.external_key() {
                map.insert(key.to_string(), self.encode(value));
            }
        }
        let schema = obj.schema();
        if schema.capabilities().type_tagged_union && !map.contains_key("type") {
            map.insert("type".to_string(), Value::String(schema.type_tag()));
        }
        Value::Object(map)
    }

    fn encode(&self, value: &AttrValue) -> Value {
        match value {
            AttrValue::EnforcedNull => Value::Null,
            AttrValue::Bool(b) => Value::Bool(*b),
            AttrValue::Number(n) => Value::Number(*n),
            AttrValue::String(s) => Value::String(s.clone()),
            AttrValue::Identifier(name) => Value::Identifier(name.clone()),
            AttrValue::Callable(callable) => Value::Callable(callable.clone()),
            AttrValue::Object(obj) => self.to_intermediate(obj),
            AttrValue::Node(node) => node.to_value(),
            AttrValue::Attributes(map) => map.to_value(),
            AttrValue::Nodes(map) => map.to_value(),
            AttrValue::Array(items) => Value::Array(items.iter().map(|i| self.encode(i)).collect()),
            AttrValue::Raw(value) => value.clone(),
        }
    }

    pub fn to_plain_map(&self, obj: &ConfigObject) -> Result<serde_json::Value, SerializeError> {
        self.to_intermediate(obj).to_json_value()
    }

    pub fn to_json(&self, obj: &ConfigObject) -> Result<String, SerializeError> {
        self.to_intermediate(obj).to_json()
    }

    #[cfg(feature = "yaml")]
    pub fn to_yaml(&self, obj: &ConfigObject) -> Result<String, OptreeError> {
        Ok(self.to_intermediate(obj).to_yaml()?)
    }

    #[cfg(not(feature = "yaml"))]
    pub fn to_yaml(&self, _obj: &ConfigObject) -> Result<String, OptreeError> {
        Err(OptreeError::DependencyUnavailable {
            dependency: "serde_yaml",
            feature: "yaml",
        })
    }

    pub fn to_literal(&self, obj: &ConfigObject) -> String {
        self.to_literal_with(obj, &EmitOptions::default())
    }

    pub fn to_literal_with(&self, obj: &ConfigObject, options: &EmitOptions) -> String {
        emit(&self.to_intermediate(obj), options)
    }

    // === Decoding ===

    /// Builds a `type_name` object from its intermediate form.
    ///
    /// Unknown keys are ignored. An array is accepted for types with
    /// positional forms and decoded by its length.
    pub fn from_intermediate(&self, type_name: &str, value: &Value) -> Result<ConfigObject, SchemaError> {
        self.decode_object(type_name, value, Slot::root(type_name))
    }

    pub fn from_plain_map(
        &self,
        type_name: &str,
        json: &serde_json::Value,
    ) -> Result<ConfigObject, SchemaError> {
        self.from_intermediate(type_name, &Value::from_json_value(json))
    }

    pub fn from_json(&self, type_name: &str, text: &str) -> Result<ConfigObject, OptreeError> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Ok(self.from_plain_map(type_name, &json)?)
    }

    pub fn from_literal(&self, type_name: &str, text: &str) -> Result<ConfigObject, OptreeError> {
        self.from_literal_with(type_name, text, &ParseOptions::default())
    }

    /// Parses literal text (optionally wrapped in a variable declaration)
    /// into a `type_name` object. Tagged types get their `type` property
    /// filled in when the text leaves it out.
    pub fn from_literal_with(
        &self,
        type_name: &str,
        text: &str,
        options: &ParseOptions,
    ) -> Result<ConfigObject, OptreeError> {
        let schema = self.registry.get(type_name)?;
        let mut root = Parser::new(text)
            .with_options(options.clone())
            .parse_document()?
            .root;
        if schema.capabilities().type_tagged_union {
            inject_type_tag(&mut root, &schema.type_tag());
        }
        Ok(self.from_intermediate(type_name, &root)?)
    }

    /// Builds an object from attribute/value pairs. Names may be internal
    /// names or external keys; when both spellings of one attribute are
    /// given, the later pair wins.
    pub fn construct<K, V>(
        &self,
        type_name: &str,
        kwargs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<ConfigObject, SchemaError>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let schema = self.registry.get(type_name)?;
        let mut obj = ConfigObject::new(Arc::clone(schema));
        for (name, value) in kwargs {
            let name = name.as_ref();
            let value = value.into();
            let entry = schema
                .entry_named(name)
                .or_else(|| schema.entry_for_key(name))
                .ok_or_else(|| SchemaError::UnknownAttribute {
                    type_name: type_name.to_string(),
                    attribute: name.to_string(),
                })?;
            match entry.key() {
                KeyMapping::FanOut(components) => {
                    self.decode_fan_out(schema, entry, components, &value, &mut obj)?
                }
                KeyMapping::Key(_) => {
                    let decoded = self.decode(entry.validator(), &value, Slot::of(schema, entry))?;
                    obj.store(entry.name(), decoded);
                }
            }
        }
        Ok(obj)
    }

    fn decode_object(&self, type_name: &str, value: &Value, slot: Slot<'_>) -> Result<ConfigObject, SchemaError> {
        let schema = self.registry.get(type_name)?;
        let mut obj = ConfigObject::new(Arc::clone(schema));
        match value {
            Value::Object(map) => {
                for (key, item) in map {
                    if let Some(entry) = schema.entry_named(key) {
                        if let KeyMapping::FanOut(components) = entry.key() {
                            self.decode_fan_out(schema, entry, components, item, &mut obj)?;
                            continue;
                        }
                    }
                    let Some(entry) = schema.entry_for_key(key) else {
                        if key == "type" && schema.capabilities().type_tagged_union {
                            check_type_tag(schema, item)?;
                        } else {
                            log::debug!("Ignoring unknown key `{key}` for `{type_name}`");
                        }
                        continue;
                    };
                    let decoded = self.decode(entry.validator(), item, Slot::of(schema, entry))?;
                    obj.store(entry.name(), decoded);
                }
            }
            Value::Array(items) if schema.capabilities().composite_geometry => {
                let form = schema.array_form_for(items.len()).ok_or_else(|| {
                    SchemaError::CollectionArity {
                        type_name: type_name.to_string(),
                        attribute: slot.attribute.to_string(),
                        found: items.len(),
                        expected: describe_forms(schema),
                    }
                })?;
                for (name, item) in form.iter().zip(items) {
                    let entry = schema.entry_named(name).ok_or_else(|| {
                        SchemaError::UnknownAttribute {
                            type_name: type_name.to_string(),
                            attribute: name.clone(),
                        }
                    })?;
                    let decoded = self.decode(entry.validator(), item, Slot::of(schema, entry))?;
                    obj.store(entry.name(), decoded);
                }
            }
            other => {
                return Err(slot.mismatch(format!("a `{type_name}` object"), other.type_name()))
            }
        }
        Ok(obj)
    }

    fn decode_fan_out(
        &self,
        schema: &Schema,
        entry: &SchemaEntry,
        components: &[String],
        value: &Value,
        obj: &mut ConfigObject,
    ) -> Result<(), SchemaError> {
        let parts: Vec<&Value> = match value {
            Value::Array(items) if items.len() == components.len() => items.iter().collect(),
            Value::Array(items) => {
                return Err(SchemaError::CollectionArity {
                    type_name: schema.name().to_string(),
                    attribute: entry.name().to_string(),
                    found: items.len(),
                    expected: format!("1 value or {} values", components.len()),
                })
            }
            single => vec![single; components.len()],
        };
        for (component, part) in components.iter().zip(parts) {
            let component_entry =
                schema
                    .entry_named(component)
                    .ok_or_else(|| SchemaError::UnknownAttribute {
                        type_name: schema.name().to_string(),
                        attribute: component.clone(),
                    })?;
            let decoded = self.decode(
                component_entry.validator(),
                part,
                Slot::of(schema, component_entry),
            )?;
            obj.store(component, decoded);
        }
        Ok(())
    }

    fn decode(&self, validator: &Validator, value: &Value, slot: Slot<'_>) -> Result<AttrValue, SchemaError> {
        if value.is_null() {
            return Ok(AttrValue::EnforcedNull);
        }
        match validator {
            Validator::Any => Ok(AttrValue::Raw(value.clone())),
            Validator::Boolean
            | Validator::String
            | Validator::Number { .. }
            | Validator::Enum(_)
            | Validator::Color
            | Validator::Callable => validator
                .normalize(value)
                .ok_or_else(|| slot.mismatch(validator, value.type_name())),
            Validator::Object(type_name) => self
                .decode_object(type_name, value, slot)
                .map(AttrValue::from),
            Validator::TaggedUnion(type_names) => self.decode_tagged(validator, type_names, value, slot),
            Validator::Node => Node::from_value(value)
                .map(AttrValue::Node)
                .map_err(|err| slot.mismatch(validator, err)),
            Validator::Attributes(kind) => AttributeMap::from_value(value, *kind)
                .map(AttrValue::Attributes)
                .map_err(|err| slot.mismatch(validator, err)),
            Validator::Nodes => NodeMap::from_value(value)
                .map(AttrValue::Nodes)
                .map_err(|err| slot.mismatch(validator, err)),
            Validator::ArrayOf(item) => match value {
                Value::Array(items) => items
                    .iter()
                    .map(|i| self.decode(item, i, slot))
                    .collect::<Result<Vec<_>, _>>()
                    .map(AttrValue::Array),
                other => Err(slot.mismatch(validator, other.type_name())),
            },
            Validator::OneOf(candidates) => self.decode_one_of(validator, candidates, value, slot),
        }
    }

    fn decode_tagged(
        &self,
        validator: &Validator,
        type_names: &[String],
        value: &Value,
        slot: Slot<'_>,
    ) -> Result<AttrValue, SchemaError> {
        let Value::Object(map) = value else {
            return Err(slot.mismatch(validator, value.type_name()));
        };
        let tag = match map.get("type") {
            Some(Value::String(tag)) => tag,
            Some(other) => return Err(slot.mismatch("a string `type`", other.type_name())),
            None => {
                return Err(SchemaError::MissingKey {
                    key: "type".to_string(),
                    context: format!("`{}.{}`", slot.type_name, slot.attribute),
                })
            }
        };
        let type_name = self
            .registry
            .type_for_tag(tag)
            .filter(|name| type_names.iter().any(|t| t == name))
            .ok_or_else(|| slot.mismatch(validator, format!("type '{tag}'")))?;
        self.decode_object(type_name, value, slot).map(AttrValue::from)
    }

    /// Tries each candidate whose shape fits the value, in declared order.
    /// When exactly one candidate was eligible its own error is returned,
    /// since it says more than a generic mismatch.
    fn decode_one_of(
        &self,
        validator: &Validator,
        candidates: &[Validator],
        value: &Value,
        slot: Slot<'_>,
    ) -> Result<AttrValue, SchemaError> {
        let mut errors = Vec::new();
        for candidate in candidates.iter().filter(|c| self.is_eligible(c, value)) {
            match self.decode(candidate, value, slot) {
                Ok(decoded) => {
                    log::trace!(
                        "`{}.{}` matched candidate {candidate}",
                        slot.type_name,
                        slot.attribute
                    );
                    return Ok(decoded);
                }
                Err(err) => errors.push(err),
            }
        }
        match errors.len() {
            1 => Err(errors.remove(0)),
            _ => Err(slot.mismatch(validator, value.type_name())),
        }
    }

    /// Whether `candidate` could describe a value of this shape. Object
    /// candidates take a map only when it is empty or shares a key with
    /// the candidate type.
    fn is_eligible(&self, candidate: &Validator, value: &Value) -> bool {
        match (candidate, value) {
            (Validator::Any, _) => true,
            (Validator::Object(type_name), Value::Object(map)) => {
                map.is_empty()
                    || self
                        .registry
                        .get(type_name)
                        .is_ok_and(|schema| map.keys().any(|k| schema.entry_for_key(k).is_some()))
            }
            (Validator::Object(type_name), Value::Array(_)) => self
                .registry
                .get(type_name)
                .is_ok_and(|schema| schema.capabilities().composite_geometry),
            (
                Validator::TaggedUnion(_)
                | Validator::Node
                | Validator::Attributes(_)
                | Validator::Nodes,
                Value::Object(_),
            ) => true,
            (Validator::ArrayOf(_), Value::Array(_)) => true,
            (Validator::OneOf(nested), _) => nested.iter().any(|c| self.is_eligible(c, value)),
            (
                Validator::Boolean
                | Validator::String
                | Validator::Number { .. }
                | Validator::Enum(_)
                | Validator::Color
                | Validator::Callable,
                v,
            ) => !matches!(v, Value::Array(_) | Value::Object(_)),
            _ => false,
        }
    }
}

/// A `type` key on a tagged object must name that object's own tag.
fn check_type_tag(schema: &Schema, tag: &Value) -> Result<(), SchemaError> {
    let expected = schema.type_tag();
    match tag {
        Value::String(found) if *found == expected => Ok(()),
        Value::String(found) => Err(tag_mismatch(schema, &expected, format!("type '{found}'"))),
        other => Err(tag_mismatch(schema, &expected, other.type_name())),
    }
}

fn tag_mismatch(schema: &Schema, expected: &str, found: impl ToString) -> SchemaError {
    SchemaError::Mismatch {
        type_name: schema.name().to_string(),
        attribute: "type".to_string(),
        key: "type".to_string(),
        expected: format!("'{expected}'"),
        found: found.to_string(),
    }
}

fn describe_forms(schema: &Schema) -> String {
    let lengths: Vec<String> = schema
        .array_forms()
        .iter()
        .map(|form| form.len().to_string())
        .collect();
    format!("{} elements", lengths.join(" or "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::CallableLiteral;
    use crate::schema::Schema;

    fn registry() -> Registry {
        Registry::builder()
            .register(
                Schema::new("Point")
                    .entry(SchemaEntry::new("x", Validator::number()))
                    .entry(SchemaEntry::new("y", Validator::number()))
                    .entry(SchemaEntry::new("name", Validator::String))
                    .array_form(&["y"])
                    .array_form(&["x", "y"]),
            )
            .register(
                Schema::new("Fill").entry(SchemaEntry::new("pattern", Validator::String)),
            )
            .register(
                Schema::new("PieSeries")
                    .tagged()
                    .entry(SchemaEntry::new("data", Validator::array_of(Validator::object("Point")))),
            )
            .register(
                Schema::new("Holder")
                    .entry(SchemaEntry::new("visible", Validator::Boolean))
                    .entry(SchemaEntry::new(
                        "fill",
                        Validator::one_of([Validator::Color, Validator::object("Fill")]),
                    ))
                    .entry(SchemaEntry::new("formatter", Validator::Callable))
                    .entry(SchemaEntry::new("series", Validator::tagged_union(&["PieSeries"]))),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_unset_is_trimmed_and_null_is_kept() {
        let registry = registry();
        let marshaller = Marshaller::new(&registry);
        let obj = marshaller
            .construct("Holder", [("visible", Value::Null)])
            .unwrap();
        let value = marshaller.to_intermediate(&obj);
        assert_eq!(marshaller.to_literal_with(&obj, &EmitOptions::compact()), "{visible: null}");
        assert_eq!(value.get("fill"), None);
    }

    #[test]
    fn test_tagged_union_requires_type() {
        let registry = registry();
        let marshaller = Marshaller::new(&registry);
        let holder = marshaller
            .from_literal("Holder", "{ series: { type: 'pie', data: [[1], [2, 3], { name: 'c', y: 4 }] } }")
            .unwrap();
        let series = holder.get("series").and_then(AttrValue::as_object).unwrap();
        assert_eq!(series.type_name(), "PieSeries");

        let err = marshaller
            .from_literal("Holder", "{ series: { data: [] } }")
            .unwrap_err();
        assert!(matches!(
            err,
            OptreeError::Schema(SchemaError::MissingKey { ref key, .. }) if key == "type"
        ));
    }

    #[test]
    fn test_one_of_selects_by_shared_keys() {
        let registry = registry();
        let marshaller = Marshaller::new(&registry);
        let holder = marshaller
            .from_literal("Holder", "{ fill: { pattern: 'dots' } }")
            .unwrap();
        assert_eq!(
            holder.get("fill").and_then(AttrValue::as_object).map(ConfigObject::type_name),
            Some("Fill")
        );

        let holder = marshaller.from_literal("Holder", "{ fill: '#ABC' }").unwrap();
        assert_eq!(holder.get("fill"), Some(&AttrValue::String("#abc".into())));

        let err = marshaller
            .from_literal("Holder", "{ fill: { unrelated: 1 } }")
            .unwrap_err();
        assert!(matches!(err, OptreeError::Schema(SchemaError::Mismatch { .. })));
    }

    #[test]
    fn test_positional_forms() {
        let registry = registry();
        let marshaller = Marshaller::new(&registry);
        let point = marshaller
            .from_intermediate("Point", &Value::from(vec![4, 5]))
            .unwrap();
        assert_eq!(point.get("x"), Some(&AttrValue::Number(4.0)));

        let err = marshaller
            .from_intermediate("Point", &Value::from(vec![1, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, SchemaError::CollectionArity { found: 3, ref expected, .. } if expected == "1 or 2 elements"));
    }

    #[test]
    fn test_callables_survive_and_block_json() {
        let registry = registry();
        let marshaller = Marshaller::new(&registry);
        let callable = CallableLiteral::new("function () { return '}'; }").unwrap();
        let obj = marshaller
            .construct("Holder", [("formatter", Value::Callable(callable.clone()))])
            .unwrap();
        assert!(marshaller.to_literal(&obj).contains(callable.as_str()));

        let err = marshaller.to_json(&obj).unwrap_err();
        assert!(matches!(err, SerializeError::NotSerializable { ref path, .. } if path == "$.formatter"));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let registry = registry();
        let marshaller = Marshaller::new(&registry);
        let obj = marshaller
            .from_json("Holder", r#"{"visible": true, "extra": [1, 2]}"#)
            .unwrap();
        assert_eq!(marshaller.to_json(&obj).unwrap(), "{\n  \"visible\": true\n}");
    }
}
