use std::{fmt::Debug, rc::Rc};

use crate::value::Value;

// -------------------------------------------------------------------------------------------------

/// Converts parameter values to display text and back. Independent of curves.
pub trait Formatter: Debug {
    /// Convert a value to text.
    fn print_string(&self, value: &Value) -> String;

    /// Convert text to a value. Returns `None` when the text can't be parsed.
    fn scan_string(&self, text: &str) -> Option<Value>;

    /// When true, the formatter expects and returns normalized `0.0..=1.0` values instead of
    /// plain values.
    fn is_normalized(&self) -> bool {
        false
    }
}

// -------------------------------------------------------------------------------------------------

fn strip_unit<'a>(text: &'a str, unit: &str) -> &'a str {
    let text = text.trim();
    if unit.is_empty() {
        text
    } else {
        text.strip_suffix(unit).unwrap_or(text).trim_end()
    }
}

// -------------------------------------------------------------------------------------------------

/// Prints floats with a fixed number of decimals and an optional unit.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatFormatter {
    decimals: usize,
    unit: String,
}

impl FloatFormatter {
    pub fn new(decimals: usize) -> Self {
        Self {
            decimals,
            unit: String::new(),
        }
    }

    pub fn with_unit<S: Into<String>>(mut self, unit: S) -> Self {
        self.unit = unit.into();
        self
    }
}

impl Default for FloatFormatter {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Formatter for FloatFormatter {
    fn print_string(&self, value: &Value) -> String {
        let text = format!("{:.*}", self.decimals, value.as_float());
        if self.unit.is_empty() {
            text
        } else {
            format!("{} {}", text, self.unit)
        }
    }

    fn scan_string(&self, text: &str) -> Option<Value> {
        strip_unit(text, &self.unit)
            .parse::<f64>()
            .ok()
            .map(Value::Float)
    }
}

// -------------------------------------------------------------------------------------------------

/// Prints integers with an optional unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntFormatter {
    unit: String,
}

impl IntFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit<S: Into<String>>(mut self, unit: S) -> Self {
        self.unit = unit.into();
        self
    }
}

impl Formatter for IntFormatter {
    fn print_string(&self, value: &Value) -> String {
        if self.unit.is_empty() {
            value.as_int().to_string()
        } else {
            format!("{} {}", value.as_int(), self.unit)
        }
    }

    fn scan_string(&self, text: &str) -> Option<Value> {
        let text = strip_unit(text, &self.unit);
        text.parse::<i64>()
            .ok()
            .or_else(|| text.parse::<f64>().ok().map(|f| f.round() as i64))
            .map(Value::Int)
    }
}

// -------------------------------------------------------------------------------------------------

/// Prints normalized values as percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PercentFormatter {
    decimals: usize,
}

impl PercentFormatter {
    pub fn new(decimals: usize) -> Self {
        Self { decimals }
    }
}

impl Formatter for PercentFormatter {
    fn print_string(&self, value: &Value) -> String {
        format!("{:.*}%", self.decimals, value.as_float() * 100.0)
    }

    fn scan_string(&self, text: &str) -> Option<Value> {
        strip_unit(text, "%")
            .parse::<f64>()
            .ok()
            .map(|percent| Value::Float((percent / 100.0).clamp(0.0, 1.0)))
    }

    fn is_normalized(&self) -> bool {
        true
    }
}

// -------------------------------------------------------------------------------------------------

/// Maps integer values to entries of a string table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringListFormatter {
    strings: Vec<String>,
}

impl StringListFormatter {
    pub fn new<S: Into<String>, I: IntoIterator<Item = S>>(strings: I) -> Self {
        let strings = strings.into_iter().map(Into::into).collect();
        Self { strings }
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }
}

impl Formatter for StringListFormatter {
    fn print_string(&self, value: &Value) -> String {
        usize::try_from(value.as_int())
            .ok()
            .and_then(|index| self.strings.get(index))
            .cloned()
            .unwrap_or_default()
    }

    fn scan_string(&self, text: &str) -> Option<Value> {
        let text = text.trim();
        self.strings
            .iter()
            .position(|s| s == text)
            .map(|index| Value::Int(index as i64))
    }
}

// -------------------------------------------------------------------------------------------------

/// Formatter with custom conversion functions.
#[derive(Clone)]
pub struct FnFormatter {
    #[allow(clippy::type_complexity)]
    print: Rc<dyn Fn(&Value) -> String>,
    #[allow(clippy::type_complexity)]
    scan: Rc<dyn Fn(&str) -> Option<Value>>,
    normalized: bool,
}

impl Debug for FnFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnFormatter")
            .field("normalized", &self.normalized)
            .finish()
    }
}

impl FnFormatter {
    /// Create a new formatter from the given conversion functions. If strings cannot be parsed,
    /// `scan` should return `None`. Scanned values get bounded by the parameter automatically.
    pub fn new<Print, Scan>(print: Print, scan: Scan) -> Self
    where
        Print: Fn(&Value) -> String + 'static,
        Scan: Fn(&str) -> Option<Value> + 'static,
    {
        Self {
            print: Rc::new(print),
            scan: Rc::new(scan),
            normalized: false,
        }
    }

    /// Let the functions operate on normalized values instead of plain ones.
    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }
}

impl Formatter for FnFormatter {
    fn print_string(&self, value: &Value) -> String {
        (self.print)(value)
    }

    fn scan_string(&self, text: &str) -> Option<Value> {
        (self.scan)(text.trim())
    }

    fn is_normalized(&self) -> bool {
        self.normalized
    }
}

// -------------------------------------------------------------------------------------------------
