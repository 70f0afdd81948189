//! Schemas describe configuration types: their attributes, the external key
//! each attribute is written under, and how it is validated.
//!
//! Schemas live in a [`Registry`], which is built once and then shared
//! read-only. Types refer to each other by name, so recursive types are fine.

use crate::error::SchemaError;
use crate::object::{AttrValue, ConfigObject};
use crate::validators::Validator;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

/// Internal names whose external key is not their plain camelCase form.
static KEY_OVERRIDES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("use_html", "useHTML"),
        ("allow_html", "allowHTML"),
        ("use_gpu_translations", "useGPUTranslations"),
        ("use_utc", "useUTC"),
    ])
});

/// `snake_case` to `camelCase`. Trailing underscores, used to avoid keywords
/// (`type_`), are dropped.
pub fn to_camel_case(name: &str) -> String {
    let trimmed = name.trim_end_matches('_');
    let mut out = String::with_capacity(trimmed.len());
    let mut upper_next = false;
    for c in trimmed.chars() {
        if c == '_' && !out.is_empty() {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// The external key for an internal attribute name.
pub fn external_key(name: &str) -> String {
    KEY_OVERRIDES
        .get(name)
        .map(|key| key.to_string())
        .unwrap_or_else(|| to_camel_case(name))
}

/// How an attribute appears in the external representation.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyMapping {
    Key(String),
    /// Has no key of its own: reads and writes go to the named component
    /// attributes, each of which carries its own key.
    FanOut(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    name: String,
    key: KeyMapping,
    validator: Validator,
    default: Option<AttrValue>,
}

impl SchemaEntry {
    /// An attribute keyed by the camelCase form of `name`.
    pub fn new(name: &str, validator: Validator) -> Self {
        Self {
            name: name.to_string(),
            key: KeyMapping::Key(external_key(name)),
            validator,
            default: None,
        }
    }

    /// An attribute spread over `components`, e.g. `margin` over
    /// `margin_top`, `margin_right`, `margin_bottom` and `margin_left`.
    pub fn fan_out(name: &str, components: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            key: KeyMapping::FanOut(components.iter().map(|c| c.to_string()).collect()),
            validator: Validator::Any,
            default: None,
        }
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.key = KeyMapping::Key(key.to_string());
        self
    }

    pub fn with_default(mut self, default: impl Into<AttrValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &KeyMapping {
        &self.key
    }

    /// The key this attribute is written under; `None` for fan-out entries.
    pub fn external_key(&self) -> Option<&str> {
        match &self.key {
            KeyMapping::Key(key) => Some(key),
            KeyMapping::FanOut(_) => None,
        }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn default(&self) -> Option<&AttrValue> {
        self.default.as_ref()
    }
}

/// Optional behaviors of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Written with a `type` property holding [`Schema::type_tag`], and
    /// selectable by it inside a [`Validator::TaggedUnion`].
    pub type_tagged_union: bool,
    /// Accepts a positional array as well as an object; see
    /// [`Schema::array_form`].
    pub composite_geometry: bool,
}

/// An ordered set of attribute declarations for one configuration type.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    entries: Vec<SchemaEntry>,
    capabilities: Capabilities,
    array_forms: Vec<Vec<String>>,
}

impl Schema {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
            capabilities: Capabilities::default(),
            array_forms: Vec::new(),
        }
    }

    /// Adds an entry. Redeclaring a name replaces the earlier entry in place.
    pub fn entry(mut self, entry: SchemaEntry) -> Self {
        self.push_entry(entry);
        self
    }

    /// Adds every entry of `component`, in its order. Entries already present
    /// are replaced in place, so later components win.
    pub fn merge(mut self, component: &Schema) -> Self {
        for entry in &component.entries {
            self.push_entry(entry.clone());
        }
        self
    }

    /// Marks the schema as a member of tagged unions.
    pub fn tagged(mut self) -> Self {
        self.capabilities.type_tagged_union = true;
        self
    }

    /// Declares a positional array form: an array of `names.len()` elements
    /// assigns element `i` to attribute `names[i]`.
    pub fn array_form(mut self, names: &[&str]) -> Self {
        self.capabilities.composite_geometry = true;
        self.array_forms
            .push(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn entry_named(&self, name: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entry_for_key(&self, key: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| e.external_key() == Some(key))
    }

    pub fn array_forms(&self) -> &[Vec<String>] {
        &self.array_forms
    }

    pub fn array_form_for(&self, len: usize) -> Option<&[String]> {
        self.array_forms
            .iter()
            .find(|form| form.len() == len)
            .map(Vec::as_slice)
    }

    /// The value of the `type` property: the type name without a trailing
    /// `Options` and then `Series`, lower-cased. `BoxPlotSeries` is
    /// `boxplot`.
    pub fn type_tag(&self) -> String {
        let base = self.name.strip_suffix("Options").unwrap_or(&self.name);
        let base = base.strip_suffix("Series").unwrap_or(base);
        base.to_lowercase()
    }

    fn push_entry(&mut self, entry: SchemaEntry) {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }
}

/// Read-only lookup of schemas by type name and by type tag.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    schemas: HashMap<String, Arc<Schema>>,
    tags: HashMap<String, String>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Result<&Arc<Schema>, SchemaError> {
        self.schemas.get(name).ok_or_else(|| SchemaError::UnknownType {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// The tagged type whose [`Schema::type_tag`] is `tag`.
    pub fn type_for_tag(&self, tag: &str) -> Option<&str> {
        self.tags.get(tag).map(String::as_str)
    }

    /// A fresh, empty instance of the named type.
    pub fn instantiate(&self, name: &str) -> Result<ConfigObject, SchemaError> {
        self.get(name).map(|schema| ConfigObject::new(Arc::clone(schema)))
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    schemas: Vec<Schema>,
}

impl RegistryBuilder {
    pub fn register(mut self, schema: Schema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Checks that every referenced type is registered and that fan-out
    /// components and array forms name real attributes.
    pub fn build(self) -> Result<Registry, SchemaError> {
        let mut registry = Registry::default();
        for schema in self.schemas {
            if registry.schemas.contains_key(schema.name()) {
                log::debug!("Schema `{}` registered twice; keeping the later one", schema.name());
            }
            if schema.capabilities.type_tagged_union {
                let tag = schema.type_tag();
                if let Some(previous) = registry.tags.insert(tag.clone(), schema.name.clone()) {
                    if previous != schema.name {
                        log::warn!(
                            "Type tag `{tag}` is shared by `{previous}` and `{}`; using `{}`",
                            schema.name,
                            schema.name
                        );
                    }
                }
            }
            registry
                .schemas
                .insert(schema.name.clone(), Arc::new(schema));
        }

        for schema in registry.schemas.values() {
            check_schema(&registry, schema)?;
        }
        log::debug!("Built registry with {} schemas", registry.len());
        Ok(registry)
    }
}

fn check_schema(registry: &Registry, schema: &Schema) -> Result<(), SchemaError> {
    let unknown_attribute = |attribute: &str| SchemaError::UnknownAttribute {
        type_name: schema.name.clone(),
        attribute: attribute.to_string(),
    };

    for entry in &schema.entries {
        match &entry.key {
            KeyMapping::FanOut(components) => {
                for component in components {
                    if schema.entry_named(component).is_none() {
                        return Err(unknown_attribute(component));
                    }
                }
            }
            KeyMapping::Key(_) => check_references(registry, &entry.validator)?,
        }
    }

    for form in &schema.array_forms {
        if let Some(missing) = form.iter().find(|n| schema.entry_named(n).is_none()) {
            return Err(unknown_attribute(missing));
        }
    }
    Ok(())
}

fn check_references(registry: &Registry, validator: &Validator) -> Result<(), SchemaError> {
    match validator {
        Validator::Object(name) => registry.get(name).map(|_| ()),
        Validator::TaggedUnion(names) => {
            for name in names {
                if !registry.get(name)?.capabilities.type_tagged_union {
                    log::warn!("`{name}` is a tagged-union member but is not tagged");
                }
            }
            Ok(())
        }
        Validator::ArrayOf(item) => check_references(registry, item),
        Validator::OneOf(candidates) => candidates
            .iter()
            .try_for_each(|c| check_references(registry, c)),
        _ => Ok(()),
    }
}
