//! Dynamically typed parameter values.

use std::{any::Any, cmp::Ordering, fmt, rc::Rc};

// -------------------------------------------------------------------------------------------------

/// A shared, reference counted external resource which can be carried in a [`Value`], such as
/// images, text models or custom list entries.
pub trait SharedObject: Any + fmt::Debug {
    /// Type erased access, to downcast the object to its concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Short human readable description, used when the object is shown as text.
    fn describe(&self) -> String {
        String::new()
    }

    /// Access the object's text model capability, if it has one.
    fn as_text_model(&self) -> Option<&dyn TextModel> {
        None
    }
}

/// Shared object reference, as carried by [`Value::Object`].
pub type ObjectRef = Rc<dyn SharedObject>;

// -------------------------------------------------------------------------------------------------

/// Text conversion capability of a [`SharedObject`] that is bound to a text model parameter.
pub trait TextModel {
    /// Convert the model's content to a plain string.
    fn to_param_string(&self) -> String;
    /// Replace the model's content from a plain string. Returns false if the text got rejected.
    fn from_param_string(&self, text: &str) -> bool;
}

// -------------------------------------------------------------------------------------------------

/// Tagged union of all value kinds a parameter can hold or be set to.
///
/// Numeric comparisons work across `Bool`, `Int` and `Float`. Objects compare by identity.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Object(ObjectRef),
}

impl Value {
    /// Name of the value's kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Object(_) => "object",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Int(_) | Value::Float(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Integer representation. Floats are rounded, strings parsed, anything else yields 0.
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Empty | Value::Object(_) => 0,
            Value::Bool(b) => *b as i64,
            Value::Int(i) => *i,
            Value::Float(f) => f.round() as i64,
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
                    .unwrap_or(0)
            }
        }
    }

    /// Float representation. Strings are parsed, anything else non numeric yields 0.
    pub fn as_float(&self) -> f64 {
        match self {
            Value::Empty | Value::Object(_) => 0.0,
            Value::Bool(b) => *b as i64 as f64,
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Value::Empty => false,
            Value::Object(_) => true,
            Value::Bool(b) => *b,
            Value::String(s) => matches!(s.trim(), "true" | "on") || self.as_float() != 0.0,
            _ => self.as_float() != 0.0,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Detect the most specific value kind in the given text: integers, then floats, then
    /// booleans. Anything else stays a string.
    pub fn parse(text: &str) -> Value {
        let trimmed = text.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            Value::Int(i)
        } else if let Ok(f) = trimmed.parse::<f64>() {
            Value::Float(f)
        } else if trimmed == "true" || trimmed == "false" {
            Value::Bool(trimmed == "true")
        } else {
            Value::String(text.to_string())
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => f.write_str("Empty"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Object(o) => f.debug_tuple("Object").field(o).finish(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => f.write_str(s),
            Value::Object(o) => f.write_str(&o.describe()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Empty, Value::Empty) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Int(a), Value::Int(b)) => a == b,
            (a, b) if a.is_numeric() && b.is_numeric() => a.as_float() == b.as_float(),
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (a, b) if a.is_numeric() && b.is_numeric() => a.as_float().partial_cmp(&b.as_float()),
            (a, b) if a == b => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Dummy;

    impl SharedObject for Dummy {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn numeric_comparisons() {
        assert_eq!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::Bool(true), Value::Int(1));
        assert_ne!(Value::Int(1), Value::String("1".into()));
        assert!(Value::Int(2) > Value::Float(1.5));
        assert!(Value::String("a".into()) < Value::String("b".into()));
        assert_eq!(Value::Int(1).partial_cmp(&Value::String("1".into())), None);
    }

    #[test]
    fn conversions() {
        assert_eq!(Value::Float(2.6).as_int(), 3);
        assert_eq!(Value::String(" 42 ".into()).as_int(), 42);
        assert_eq!(Value::String("1.5".into()).as_float(), 1.5);
        assert_eq!(Value::String("abc".into()).as_float(), 0.0);
        assert!(Value::String("true".into()).as_bool());
        assert!(!Value::Empty.as_bool());
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
        assert_eq!(Value::Int(-3).to_string(), "-3");
    }

    #[test]
    fn parse_detects_kind() {
        assert_eq!(Value::parse("12"), Value::Int(12));
        assert!(matches!(Value::parse("1.5"), Value::Float(f) if f == 1.5));
        assert!(matches!(Value::parse("false"), Value::Bool(false)));
        assert!(matches!(Value::parse("Bass"), Value::String(s) if s == "Bass"));
    }

    #[test]
    fn objects_compare_by_identity() {
        let a: ObjectRef = Rc::new(Dummy);
        let b: ObjectRef = Rc::new(Dummy);
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }
}
