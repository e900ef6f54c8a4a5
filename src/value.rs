//! Runtime values rendered by printers.
//!
//! `Value` is the owned, dynamically-typed tree a schema describes. It is a
//! superset of JSON: besides the JSON kinds it carries `undefined`, bigints,
//! symbols, sets and maps, which the schema AST can also describe.
use std::fmt;

use indexmap::IndexMap;
use num_bigint::BigInt;

/// Own properties of an object, in insertion order.
pub type Object = IndexMap<PropertyKey, Value>;

/// Stand-in for absent slots and properties.
pub static UNDEFINED: Value = Value::Undefined;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(BigInt),
    String(String),
    Symbol(Symbol),
    Array(Vec<Value>),
    Object(Object),
    Set(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

/// A described symbol. Two symbols are the same symbol when their
/// descriptions match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKey {
    String(String),
    Symbol(Symbol),
}

// ————————————————————————————————————————————————————————————————————————————
// SYMBOLS & KEYS
// ————————————————————————————————————————————————————————————————————————————

impl Symbol {
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into() }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

impl PropertyKey {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Symbol(_) => None,
        }
    }

    /// The key viewed as a value, e.g. to run a refinement predicate over it.
    pub fn to_value(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Symbol(s) => Value::Symbol(s.clone()),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Symbol(s) => s.fmt(f),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(value: &str) -> Self { Self::String(value.to_owned()) }
}

impl From<String> for PropertyKey {
    fn from(value: String) -> Self { Self::String(value) }
}

impl From<Symbol> for PropertyKey {
    fn from(value: Symbol) -> Self { Self::Symbol(value) }
}

// ————————————————————————————————————————————————————————————————————————————
// VALUE
// ————————————————————————————————————————————————————————————————————————————

impl Value {
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<PropertyKey>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Default string conversion: what a debug console would show for the
    /// value when asked for its plain string form.
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Undefined => "undefined".to_owned(),
            Self::Null => "null".to_owned(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => number_to_string(*n),
            Self::BigInt(i) => i.to_string(),
            Self::String(s) => s.clone(),
            Self::Symbol(s) => s.to_string(),
            Self::Array(xs) => xs
                .iter()
                .map(|x| match x {
                    // holes and nullish elements join as empty strings
                    Self::Undefined | Self::Null => String::new(),
                    other => other.to_display_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Self::Object(_) => "[object Object]".to_owned(),
            Self::Set(_) => "[object Set]".to_owned(),
            Self::Map(_) => "[object Map]".to_owned(),
        }
    }
}

/// Shortest round-trip rendering of a double, with the exponent form used
/// outside `[1e-6, 1e21)`.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if n == 0.0 {
        // also covers -0
        return "0".to_owned();
    }
    if (1e-6..1e21).contains(&n.abs()) {
        return format!("{n}");
    }
    let s = format!("{n:e}");
    match s.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => s,
    }
}

/// Canonically escaped, double-quoted string.
pub fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}

// ————————————————————————————————————————————————————————————————————————————
// CONVERSIONS
// ————————————————————————————————————————————————————————————————————————————

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match value {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Self::String(s),
            Json::Array(xs) => Self::Array(xs.into_iter().map(Self::from).collect()),
            Json::Object(m) => Self::Object(
                m.into_iter()
                    .map(|(k, v)| (PropertyKey::String(k), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self { Self::Bool(value) }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self { Self::Number(value) }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self { Self::Number(value.into()) }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self { Self::String(value.to_owned()) }
}

impl From<String> for Value {
    fn from(value: String) -> Self { Self::String(value) }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self { Self::BigInt(value) }
}

impl From<Symbol> for Value {
    fn from(value: Symbol) -> Self { Self::Symbol(value) }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self { Self::Array(value) }
}

// ------------------------------- Tests ------------------------------------ //
