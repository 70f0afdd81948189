use crate::callable::CallableLiteral;
use crate::emitter::{emit, EmitOptions};
use crate::error::SerializeError;
use indexmap::IndexMap;
use std::fmt;

/// Ordered map used for object values. Keys keep the order they were
/// inserted in, which is the declared schema order for marshalled objects.
pub type Map = IndexMap<String, Value>;

/// The format-neutral value shared by the parser, the emitter and the
/// marshalling engine.
///
/// `Null` is an explicit null in the external representation. Absent keys are
/// simply absent from the enclosing [`Map`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Map),
    /// Function or class source, kept verbatim.
    Callable(CallableLiteral),
    /// A bare (possibly dotted) reference such as `Highcharts.color`.
    Identifier(String),
}

impl Value {
    /// Short name of the value's shape, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Array(_) => "an array",
            Value::Object(_) => "an object",
            Value::Callable(_) => "a function literal",
            Value::Identifier(_) => "an identifier",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Looks up `key` when this value is an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Converts into the plain-map form. Callables and non-finite numbers
    /// have no JSON spelling and fail with the path of the offending value.
    pub fn to_json_value(&self) -> Result<serde_json::Value, SerializeError> {
        to_json_at(self, &mut String::from("$"))
    }

    /// Builds a value from the plain-map form.
    pub fn from_json_value(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json_value).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json_value(v)))
                    .collect(),
            ),
        }
    }

    /// Serializes into pretty-printed JSON text.
    pub fn to_json(&self) -> Result<String, SerializeError> {
        Ok(serde_json::to_string_pretty(&self.to_json_value()?)?)
    }

    /// Serializes into YAML text.
    #[cfg(feature = "yaml")]
    pub fn to_yaml(&self) -> Result<String, SerializeError> {
        serde_yaml::to_string(&self.to_json_value()?).map_err(|err| SerializeError::Yaml {
            message: err.to_string(),
        })
    }
}

fn to_json_at(value: &Value, path: &mut String) -> Result<serde_json::Value, SerializeError> {
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Number(n) => number_to_json(*n).ok_or_else(|| SerializeError::NotSerializable {
            path: path.clone(),
            reason: format!("{n} is not a finite number"),
        }),
        Value::String(s) => Ok(serde_json::Value::String(s.clone())),
        Value::Callable(callable) => Err(SerializeError::NotSerializable {
            path: path.clone(),
            reason: format!("{} literals are not valid JSON", callable.kind()),
        }),
        Value::Identifier(name) => Err(SerializeError::NotSerializable {
            path: path.clone(),
            reason: format!("the reference `{name}` is not valid JSON"),
        }),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let len = path.len();
                path.push_str(&format!("[{index}]"));
                out.push(to_json_at(item, path)?);
                path.truncate(len);
            }
            Ok(serde_json::Value::Array(out))
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                let len = path.len();
                path.push('.');
                path.push_str(key);
                out.insert(key.clone(), to_json_at(item, path)?);
                path.truncate(len);
            }
            Ok(serde_json::Value::Object(out))
        }
    }
}

fn number_to_json(n: f64) -> Option<serde_json::Value> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return Some(serde_json::Value::from(n as i64));
    }
    serde_json::Number::from_f64(n).map(serde_json::Value::Number)
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        Value::from_json_value(json)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<CallableLiteral> for Value {
    fn from(callable: CallableLiteral) -> Self {
        Value::Callable(callable)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

/// Formats as compact literal notation.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&emit(self, &EmitOptions::compact()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_round_trip_keeps_key_order() {
        let json = json!({ "b": 1, "a": [true, null, "x"] });
        let value = Value::from(&json);
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(value.to_json_value().unwrap(), json);
    }

    #[test]
    fn test_integers_serialize_without_fraction() {
        let value = Value::Number(12.0);
        assert_eq!(value.to_json().unwrap(), "12");
        assert_eq!(Value::Number(0.5).to_json().unwrap(), "0.5");
    }

    #[test]
    fn test_callable_is_not_json_serializable() {
        let mut inner = Map::new();
        inner.insert(
            "formatter".to_string(),
            Value::Callable(CallableLiteral::new("function () { return 1; }").unwrap()),
        );
        let mut outer = Map::new();
        outer.insert("tooltip".to_string(), Value::Object(inner));

        let err = Value::Object(outer).to_json_value().unwrap_err();
        match err {
            SerializeError::NotSerializable { path, .. } => assert_eq!(path, "$.tooltip.formatter"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_numbers_are_rejected() {
        let value = Value::Array(vec![Value::Number(1.0), Value::Number(f64::NAN)]);
        assert!(matches!(
            value.to_json_value(),
            Err(SerializeError::NotSerializable { ref path, .. }) if path == "$[1]"
        ));
    }

    #[test]
    fn test_display_is_compact_literal() {
        let mut map = Map::new();
        map.insert("text".to_string(), Value::from("Hi"));
        map.insert("stroke-width".to_string(), Value::from(2));
        assert_eq!(Value::Object(map).to_string(), "{text: 'Hi', 'stroke-width': 2}");
    }
}
