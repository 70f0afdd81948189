//! Per-attribute validators and the explicit-null sentinel.

use crate::ast::ElementKind;
use crate::callable::CallableLiteral;
use crate::emitter::format_number;
use crate::object::AttrValue;
use crate::value::Value;
use std::fmt;

/// Marks an attribute that must be written as an explicit `null`, as opposed
/// to an unset attribute, which is left out of the output entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EnforcedNull;

impl From<EnforcedNull> for AttrValue {
    fn from(_: EnforcedNull) -> Self {
        AttrValue::EnforcedNull
    }
}

/// Describes which values an attribute accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    Any,
    Boolean,
    String,
    Number {
        min: Option<f64>,
        max: Option<f64>,
        integer: bool,
    },
    Enum(Vec<String>),
    /// A CSS color string. Gradients and patterns are declared as object
    /// candidates next to it in a [`Validator::OneOf`].
    Color,
    Callable,
    /// A nested object of the named type.
    Object(String),
    /// An object whose concrete type is named by its `type` property.
    TaggedUnion(Vec<String>),
    Node,
    Attributes(ElementKind),
    Nodes,
    ArrayOf(Box<Validator>),
    /// Candidates tried in declared order; the first that accepts wins.
    OneOf(Vec<Validator>),
}

impl Validator {
    pub fn number() -> Self {
        Validator::Number {
            min: None,
            max: None,
            integer: false,
        }
    }

    pub fn number_range(min: f64, max: f64) -> Self {
        Validator::Number {
            min: Some(min),
            max: Some(max),
            integer: false,
        }
    }

    pub fn non_negative() -> Self {
        Validator::Number {
            min: Some(0.0),
            max: None,
            integer: false,
        }
    }

    pub fn integer(min: Option<f64>, max: Option<f64>) -> Self {
        Validator::Number {
            min,
            max,
            integer: true,
        }
    }

    pub fn enumeration(variants: &[&str]) -> Self {
        Validator::Enum(variants.iter().map(|v| v.to_string()).collect())
    }

    pub fn object(type_name: &str) -> Self {
        Validator::Object(type_name.to_string())
    }

    pub fn tagged_union(type_names: &[&str]) -> Self {
        Validator::TaggedUnion(type_names.iter().map(|t| t.to_string()).collect())
    }

    pub fn array_of(item: Validator) -> Self {
        Validator::ArrayOf(Box::new(item))
    }

    pub fn one_of(candidates: impl IntoIterator<Item = Validator>) -> Self {
        Validator::OneOf(candidates.into_iter().collect())
    }

    /// Validates and normalizes a scalar. Returns `None` for values this
    /// validator rejects and for validators that describe structured values,
    /// which the marshalling engine decodes itself.
    pub fn normalize(&self, value: &Value) -> Option<AttrValue> {
        match (self, value) {
            (_, Value::Null) => Some(AttrValue::EnforcedNull),
            (Validator::Any, _) => Some(AttrValue::Raw(value.clone())),
            (Validator::Boolean, Value::Bool(b)) => Some(AttrValue::Bool(*b)),
            (Validator::String, Value::String(s)) => Some(AttrValue::String(s.clone())),
            (Validator::Number { .. }, Value::Number(n)) => {
                self.number_in_range(*n).then_some(AttrValue::Number(*n))
            }
            (Validator::Enum(variants), Value::String(s)) => variants
                .iter()
                .any(|v| v == s)
                .then(|| AttrValue::String(s.clone())),
            (Validator::Color, Value::String(s)) => normalize_color(s).map(AttrValue::String),
            (Validator::Callable, Value::Callable(c)) => Some(AttrValue::Callable(c.clone())),
            (Validator::Callable, Value::String(s)) => {
                CallableLiteral::new(s.as_str()).ok().map(AttrValue::Callable)
            }
            _ => None,
        }
    }

    /// Checks a value handed to a setter, normalizing scalars the same way
    /// [`Validator::normalize`] does. Returns `None` when rejected.
    pub fn conform(&self, value: AttrValue) -> Option<AttrValue> {
        if matches!(value, AttrValue::EnforcedNull) {
            return Some(value);
        }
        match self {
            Validator::Any => Some(value),
            Validator::Boolean
            | Validator::String
            | Validator::Number { .. }
            | Validator::Enum(_)
            | Validator::Color
            | Validator::Callable => self.normalize(&value.as_scalar()?),
            Validator::Object(type_name) => match &value {
                AttrValue::Object(obj) if obj.type_name() == type_name => Some(value),
                _ => None,
            },
            Validator::TaggedUnion(type_names) => match &value {
                AttrValue::Object(obj) if type_names.iter().any(|t| t == obj.type_name()) => {
                    Some(value)
                }
                _ => None,
            },
            Validator::Node => matches!(value, AttrValue::Node(_)).then_some(value),
            Validator::Attributes(kind) => match &value {
                AttrValue::Attributes(map)
                    if *kind == ElementKind::Scalar || map.element() == *kind =>
                {
                    Some(value)
                }
                _ => None,
            },
            Validator::Nodes => matches!(value, AttrValue::Nodes(_)).then_some(value),
            Validator::ArrayOf(item) => match value {
                AttrValue::Array(items) => items
                    .into_iter()
                    .map(|i| item.conform(i))
                    .collect::<Option<Vec<_>>>()
                    .map(AttrValue::Array),
                _ => None,
            },
            Validator::OneOf(candidates) => candidates
                .iter()
                .find_map(|candidate| candidate.conform(value.clone())),
        }
    }

    fn number_in_range(&self, n: f64) -> bool {
        let Validator::Number { min, max, integer } = self else {
            return false;
        };
        if *integer && n.fract() != 0.0 {
            return false;
        }
        if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
            return false;
        }
        !(n.is_nan() && (min.is_some() || max.is_some()))
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::Any => write!(f, "any value"),
            Validator::Boolean => write!(f, "a boolean"),
            Validator::String => write!(f, "a string"),
            Validator::Number { min, max, integer } => {
                write!(f, "{}", if *integer { "an integer" } else { "a number" })?;
                match (min, max) {
                    (Some(lo), Some(hi)) => {
                        write!(f, " between {} and {}", format_number(*lo), format_number(*hi))
                    }
                    (Some(lo), None) => write!(f, " of at least {}", format_number(*lo)),
                    (None, Some(hi)) => write!(f, " of at most {}", format_number(*hi)),
                    (None, None) => Ok(()),
                }
            }
            Validator::Enum(variants) => {
                let quoted: Vec<String> = variants.iter().map(|v| format!("'{v}'")).collect();
                write!(f, "one of {}", quoted.join(", "))
            }
            Validator::Color => write!(f, "a color string"),
            Validator::Callable => write!(f, "a function or class literal"),
            Validator::Object(type_name) => write!(f, "a `{type_name}` object"),
            Validator::TaggedUnion(type_names) => {
                write!(f, "an object tagged as one of {}", type_names.join(", "))
            }
            Validator::Node => write!(f, "a node with a `tagName`"),
            Validator::Attributes(kind) => write!(f, "an attribute map whose values are each {kind}"),
            Validator::Nodes => write!(f, "a map of nodes"),
            Validator::ArrayOf(item) => write!(f, "an array of {item}"),
            Validator::OneOf(candidates) => {
                let described: Vec<String> = candidates.iter().map(ToString::to_string).collect();
                write!(f, "{}", described.join(" or "))
            }
        }
    }
}

/// CSS keywords that are valid colors but not named colors.
const COLOR_KEYWORDS: [&str; 3] = ["transparent", "none", "currentcolor"];

/// Accepts hex (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`), functional
/// (`rgb(...)`, `rgba(...)`, `hsl(...)`, `hsla(...)`, `var(--...)`) and named
/// colors. Hex colors are lower-cased.
pub fn normalize_color(raw: &str) -> Option<String> {
    let color = raw.trim();
    if let Some(hex) = color.strip_prefix('#') {
        let valid = matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
        return valid.then(|| format!("#{}", hex.to_ascii_lowercase()));
    }
    if let Some(open) = color.find('(') {
        let function = color[..open].trim().to_ascii_lowercase();
        let args = color[open + 1..].strip_suffix(')')?;
        return functional_color_is_valid(&function, args).then(|| color.to_string());
    }
    let name = color.to_ascii_lowercase();
    let named = COLOR_KEYWORDS.contains(&name.as_str())
        || (name.chars().all(|c| c.is_ascii_alphabetic())
            && colornames::Color::try_from(name.as_str()).is_ok());
    named.then(|| color.to_string())
}

/// Checks the argument list of a functional color: three channels plus an
/// optional alpha, comma- or space-separated.
fn functional_color_is_valid(function: &str, args: &str) -> bool {
    if function == "var" {
        return args.trim_start().starts_with("--");
    }
    let parts: Vec<&str> = if args.contains(',') {
        args.split(',').map(str::trim).collect()
    } else {
        args.split(|c: char| c.is_whitespace() || c == '/')
            .filter(|part| !part.is_empty())
            .collect()
    };
    if !(3..=4).contains(&parts.len()) {
        return false;
    }
    let alpha = parts.get(3).map_or(true, |a| is_css_number(a) || is_css_percentage(a));
    let channels = match function {
        "rgb" | "rgba" => parts[..3].iter().all(|p| is_css_number(p) || is_css_percentage(p)),
        "hsl" | "hsla" => {
            let hue = parts[0].strip_suffix("deg").unwrap_or(parts[0]);
            is_css_number(hue) && parts[1..3].iter().all(|p| is_css_percentage(p))
        }
        _ => false,
    };
    channels && alpha
}

fn is_css_number(text: &str) -> bool {
    text.parse::<f64>().is_ok_and(f64::is_finite)
}

fn is_css_percentage(text: &str) -> bool {
    text.strip_suffix('%').is_some_and(is_css_number)
}
