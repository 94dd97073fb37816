//! Persisting parameter values into key/value attribute stores.

use std::collections::BTreeMap;

use crate::{
    error::Error,
    parameter::{Parameter, ParameterState, ParameterType},
    value::Value,
};

pub use crate::utils::sanitize_key;

// -------------------------------------------------------------------------------------------------

/// A key/value store which parameter values get persisted into.
pub trait AttributeStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);
}

// -------------------------------------------------------------------------------------------------

/// A simple, ordered in-memory [`AttributeStore`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: BTreeMap<String, Value>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl AttributeStore for Attributes {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

#[cfg(feature = "json")]
impl Attributes {
    /// Serialize the attributes into a pretty printed JSON object. Object values can't be
    /// serialized and are skipped.
    pub fn to_json(&self) -> Result<String, Error> {
        let mut map = serde_json::Map::new();
        for (key, value) in &self.values {
            let json = match value {
                Value::Empty => serde_json::Value::Null,
                Value::Bool(b) => serde_json::Value::Bool(*b),
                Value::Int(i) => serde_json::Value::from(*i),
                Value::Float(f) => serde_json::Number::from_f64(*f)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| Error::InvalidValue(format!("'{key}' is not a finite number")))?,
                Value::String(s) => serde_json::Value::String(s.clone()),
                Value::Object(_) => {
                    log::warn!("Skipping object value '{key}' in JSON serialization");
                    continue;
                }
            };
            map.insert(key.clone(), json);
        }
        Ok(serde_json::to_string_pretty(&serde_json::Value::Object(map))?)
    }

    /// Deserialize attributes from a flat JSON object.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let serde_json::Value::Object(map) = serde_json::from_str::<serde_json::Value>(json)? else {
            return Err(Error::JsonError("expected a JSON object".to_string()));
        };
        let mut attributes = Self::new();
        for (key, json) in map {
            let value = match json {
                serde_json::Value::Null => Value::Empty,
                serde_json::Value::Bool(b) => Value::Bool(b),
                serde_json::Value::Number(number) => match number.as_i64() {
                    Some(i) => Value::Int(i),
                    None => Value::Float(number.as_f64().unwrap_or_default()),
                },
                serde_json::Value::String(s) => Value::String(s),
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                    return Err(Error::JsonError(format!(
                        "unsupported nested value for key '{key}'"
                    )));
                }
            };
            attributes.set(&key, value);
        }
        Ok(attributes)
    }
}

// -------------------------------------------------------------------------------------------------

/// Key under which the given parameter is persisted.
pub fn persistence_key(param: &dyn Parameter) -> String {
    sanitize_key(&param.name())
}

/// The value which gets persisted for the given parameter: the selected value for lists which
/// store their list value, the model's text for text models, else the plain value. `None` for
/// parameters which have nothing to persist, such as images and commands.
pub fn persistent_value(param: &dyn Parameter) -> Option<Value> {
    match param.parameter_type() {
        ParameterType::Image | ParameterType::Command => None,
        ParameterType::TextModel => Some(Value::String(param.value_string())),
        _ => match param.as_list() {
            Some(list) if list.state(ParameterState::StoreListValue) => {
                Some(list.selected_value())
            }
            _ => Some(param.value()),
        },
    }
}

/// Apply a persisted value to the given parameter, tolerating type and format drift: numbers
/// stored as text are parsed, text gets converted with the parameter's formatter, and lists
/// select the nearest entry when the stored value no longer exists.
///
/// Values which can't be applied leave the parameter unchanged.
pub fn restore_value(param: &dyn Parameter, value: &Value, update: bool) -> Result<(), Error> {
    if let Value::Object(_) = value {
        return Err(Error::TypeMismatch {
            expected: "scalar",
            found: value.kind_name(),
        });
    }

    if let Some(list) = param.as_list() {
        if list.state(ParameterState::StoreListValue) {
            if list.select_value(value, update) || list.select_nearest_value(value, update) {
                return Ok(());
            }
            return Err(Error::InvalidValue(format!(
                "no entry for '{value}' in list '{}'",
                param.name()
            )));
        }
    }

    match param.parameter_type() {
        ParameterType::String | ParameterType::TextModel => {
            param.set_string(&value.to_string(), update);
            Ok(())
        }
        ParameterType::Float => {
            let restored = if value.is_numeric() {
                Some(value.clone())
            } else {
                let text = value.to_string();
                text.trim()
                    .parse::<f64>()
                    .ok()
                    .map(Value::Float)
                    .or_else(|| param.scan_string(&text))
            };
            apply(param, restored, value, update)
        }
        ParameterType::Toggle
        | ParameterType::Integer
        | ParameterType::List
        | ParameterType::Scroll => {
            let restored = if value.is_numeric() {
                Some(value.clone())
            } else {
                let text = value.to_string();
                text.trim()
                    .parse::<i64>()
                    .ok()
                    .map(Value::Int)
                    .or_else(|| param.scan_string(&text))
            };
            apply(param, restored, value, update)
        }
        ParameterType::Color => {
            let restored = if value.is_numeric() {
                Some(value.clone())
            } else {
                param.scan_string(&value.to_string())
            };
            apply(param, restored, value, update)
        }
        ParameterType::Image | ParameterType::Command => Err(Error::TypeMismatch {
            expected: "persistable parameter",
            found: param.parameter_type().into(),
        }),
    }
}

fn apply(
    param: &dyn Parameter,
    restored: Option<Value>,
    stored: &Value,
    update: bool,
) -> Result<(), Error> {
    match restored {
        Some(value) => {
            param.set_value(value, update);
            Ok(())
        }
        None => Err(Error::ParseError(stored.to_string())),
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{
        ColorParam, FloatParam, FnFormatter, IntParam, ListParam, StringParam, ToggleParam,
    };
    use std::rc::Rc;

    #[test]
    fn numeric_drift() {
        let float = FloatParam::new(0.0, 10.0, "time").into_shared();
        restore_value(float.as_ref(), &Value::Int(3), false).unwrap();
        assert_eq!(float.float_value(), 3.0);
        restore_value(float.as_ref(), &Value::from(" 2.5"), false).unwrap();
        assert_eq!(float.float_value(), 2.5);
        assert!(restore_value(float.as_ref(), &Value::from("fast"), false).is_err());
        assert_eq!(float.float_value(), 2.5);

        let int = IntParam::new(0, 10, "count").into_shared();
        restore_value(int.as_ref(), &Value::from("7"), false).unwrap();
        assert_eq!(int.int_value(), 7);
        restore_value(int.as_ref(), &Value::Float(3.6), false).unwrap();
        assert_eq!(int.int_value(), 4);
        assert!(restore_value(int.as_ref(), &Value::from("seven"), false).is_err());
        assert_eq!(int.int_value(), 4);

        let toggle = ToggleParam::new("on").into_shared();
        restore_value(toggle.as_ref(), &Value::Bool(true), false).unwrap();
        assert!(toggle.is_on());
        restore_value(toggle.as_ref(), &Value::from("off"), false).unwrap();
        assert!(!toggle.is_on());
    }

    #[test]
    fn unparseable_toggle_keeps_state() {
        let toggle = ToggleParam::new("on").with_default(true).into_shared();
        assert_eq!(
            restore_value(toggle.as_ref(), &Value::from("garbage"), false),
            Err(Error::ParseError("garbage".to_string()))
        );
        assert!(toggle.is_on());
    }

    #[test]
    fn text_and_formatters() {
        let string = StringParam::new("title").into_shared();
        restore_value(string.as_ref(), &Value::Int(42), false).unwrap();
        assert_eq!(string.text(), "42");

        let int = IntParam::new(0, 2, "mode").into_shared();
        int.set_formatter(Some(Rc::new(FnFormatter::new(
            |value| ["Off", "Half", "Full"][value.as_int().clamp(0, 2) as usize].to_string(),
            |text| {
                ["Off", "Half", "Full"]
                    .iter()
                    .position(|s| *s == text)
                    .map(|i| Value::Int(i as i64))
            },
        ))));
        restore_value(int.as_ref(), &Value::from("Full"), false).unwrap();
        assert_eq!(int.int_value(), 2);

        let color = ColorParam::new("color").into_shared();
        restore_value(color.as_ref(), &Value::from("#102030"), false).unwrap();
        assert_eq!(color.value_string(), "#102030");
        assert!(restore_value(color.as_ref(), &Value::from("red"), false).is_err());
    }

    #[test]
    fn lists_restore_nearest() {
        let list = ListParam::new("list")
            .with_entries([Value::Int(10), Value::Int(20), Value::Int(40)])
            .into_shared();
        assert_eq!(persistent_value(list.as_ref()), Some(Value::Int(10)));
        restore_value(list.as_ref(), &Value::Int(40), false).unwrap();
        assert_eq!(list.selected_index(), 2);
        restore_value(list.as_ref(), &Value::Int(22), false).unwrap();
        assert_eq!(list.selected_value(), Value::Int(20));

        list.set_state(ParameterState::StoreListValue, false);
        assert_eq!(persistent_value(list.as_ref()), Some(Value::Int(1)));
        restore_value(list.as_ref(), &Value::Int(0), false).unwrap();
        assert_eq!(list.selected_value(), Value::Int(10));

        let empty = ListParam::new("empty").into_shared();
        assert!(restore_value(empty.as_ref(), &Value::Int(1), false).is_err());
    }

    #[cfg(feature = "json")]
    #[test]
    fn json() {
        let attributes: Attributes = [
            ("gain", Value::Float(0.5)),
            ("count", Value::Int(3)),
            ("name", Value::from("lead")),
            ("on", Value::Bool(true)),
        ]
        .into_iter()
        .collect();
        let json = attributes.to_json().unwrap();
        assert_eq!(Attributes::from_json(&json).unwrap(), attributes);

        assert!(Attributes::from_json("[1, 2]").is_err());
        assert!(Attributes::from_json("{\"a\": [1]}").is_err());
        assert!(Attributes::from_json("{").is_err());

        let mut attributes = Attributes::new();
        attributes.set("nan", Value::Float(f64::NAN));
        assert!(attributes.to_json().is_err());
    }
}
