//! Runtime values and declared type hints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive value categories that expectations and type hints can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Int,
    Float,
    Str,
    Bool,
    None,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Int => "int",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Str => "str",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::None => "none",
        }
    }

    /// Recognize a primitive category name. Accepts the short and long spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => Some(PrimitiveKind::Int),
            "float" => Some(PrimitiveKind::Float),
            "str" | "string" => Some(PrimitiveKind::Str),
            "bool" | "boolean" => Some(PrimitiveKind::Bool),
            "none" => Some(PrimitiveKind::None),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value passed to or returned from an entity body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// The runtime category of this value.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Value::None => PrimitiveKind::None,
            Value::Bool(_) => PrimitiveKind::Bool,
            Value::Int(_) => PrimitiveKind::Int,
            Value::Float(_) => PrimitiveKind::Float,
            Value::Str(_) => PrimitiveKind::Str,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Parse a Python-style literal (`None`, `True`, `42`, `1.5`, `'text'`).
    pub fn from_literal(text: &str) -> Option<Self> {
        let text = text.trim();
        match text {
            "None" => return Some(Value::None),
            "True" => return Some(Value::Bool(true)),
            "False" => return Some(Value::Bool(false)),
            _ => {}
        }
        let numeric = text
            .chars()
            .next()
            .map(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
            .unwrap_or(false);
        if numeric {
            if let Ok(n) = text.parse::<i64>() {
                return Some(Value::Int(n));
            }
            if let Ok(x) = text.parse::<f64>() {
                return Some(Value::Float(x));
            }
        }
        for quote in ['"', '\''] {
            if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
                return Some(Value::Str(text[1..text.len() - 1].to_string()));
            }
        }
        None
    }
}

/// Renders values the way they would be written as literals.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// A declared type annotation on a parameter or return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeHint {
    Primitive(PrimitiveKind),
    Optional(Box<TypeHint>),
    /// Any other annotation, kept verbatim.
    Named(String),
}

impl TypeHint {
    pub const INT: TypeHint = TypeHint::Primitive(PrimitiveKind::Int);
    pub const FLOAT: TypeHint = TypeHint::Primitive(PrimitiveKind::Float);
    pub const STR: TypeHint = TypeHint::Primitive(PrimitiveKind::Str);
    pub const BOOL: TypeHint = TypeHint::Primitive(PrimitiveKind::Bool);

    /// Parse annotation text such as `int`, `Optional[str]` or `float | None`.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        if let Some(inner) = text
            .strip_prefix("Optional[")
            .or_else(|| text.strip_prefix("typing.Optional["))
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return TypeHint::Optional(Box::new(TypeHint::parse(inner)));
        }

        let parts: Vec<&str> = text.split('|').map(str::trim).collect();
        if parts.len() == 2 {
            if parts[1] == "None" {
                return TypeHint::Optional(Box::new(TypeHint::parse(parts[0])));
            }
            if parts[0] == "None" {
                return TypeHint::Optional(Box::new(TypeHint::parse(parts[1])));
            }
        }

        match PrimitiveKind::parse(text) {
            Some(kind) if text == kind.as_str() || text == "None" => TypeHint::Primitive(kind),
            _ => TypeHint::Named(text.to_string()),
        }
    }

    /// Whether a stand-in value of this type can be produced safely.
    pub fn is_synthesizable(&self) -> bool {
        match self {
            TypeHint::Primitive(_) => true,
            TypeHint::Optional(inner) => inner.is_synthesizable(),
            TypeHint::Named(_) => false,
        }
    }
}

impl From<PrimitiveKind> for TypeHint {
    fn from(kind: PrimitiveKind) -> Self {
        TypeHint::Primitive(kind)
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeHint::Primitive(PrimitiveKind::None) => write!(f, "None"),
            TypeHint::Primitive(kind) => write!(f, "{}", kind),
            TypeHint::Optional(inner) => write!(f, "Optional[{}]", inner),
            TypeHint::Named(name) => write!(f, "{}", name),
        }
    }
}
