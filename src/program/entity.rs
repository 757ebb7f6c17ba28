//! Entities: the functions and classes that annotations describe.

use std::fmt;
use std::path::PathBuf;

use super::value::{TypeHint, Value};

/// The exception analogue: a failure raised by an entity body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Fault {
    /// Exception class name, e.g. `TypeError`.
    pub kind: String,
    pub message: String,
}

impl Fault {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new("TypeError", message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new("ValueError", message)
    }
}

/// A native function body. Arguments arrive positionally, one per declared parameter.
pub type NativeFn = Box<dyn Fn(&[Value]) -> Result<Value, Fault>>;

/// A formal parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub annotation: Option<TypeHint>,
    /// Default value. Non-literal defaults parsed from source keep their text as a `Str`.
    pub default: Option<Value>,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            default: None,
        }
    }

    pub fn typed(mut self, hint: impl Into<TypeHint>) -> Self {
        self.annotation = Some(hint.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Declared parameter list and return annotation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    pub params: Vec<Param>,
    pub returns: Option<TypeHint>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns(mut self, hint: impl Into<TypeHint>) -> Self {
        self.returns = Some(hint.into());
        self
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p.name)?;
            if let Some(hint) = &p.annotation {
                write!(f, ": {}", hint)?;
            }
        }
        write!(f, ")")?;
        if let Some(ret) = &self.returns {
            write!(f, " -> {}", ret)?;
        }
        Ok(())
    }
}

/// A method declared on a class.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub signature: Signature,
    pub doc: Option<String>,
}

impl Method {
    pub fn new(name: impl Into<String>, signature: Signature) -> Self {
        Self {
            name: name.into(),
            signature,
            doc: None,
        }
    }
}

/// Where an entity was declared, when it came from a source file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Origin {
    pub file: PathBuf,
    pub line: usize,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

pub struct Function {
    pub signature: Signature,
    /// `None` for functions known only by their declaration.
    pub body: Option<NativeFn>,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("signature", &self.signature)
            .field("body", &self.body.as_ref().map(|_| "<native>"))
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Class {
    pub methods: Vec<Method>,
}

#[derive(Debug)]
pub enum EntityKind {
    Function(Function),
    Class(Class),
}

/// A function or class subject to annotation and lint checks.
#[derive(Debug)]
pub struct Entity {
    pub name: String,
    pub doc: Option<String>,
    pub kind: EntityKind,
    pub origin: Option<Origin>,
}

impl Entity {
    /// A function known only by its signature.
    pub fn function(name: impl Into<String>, signature: Signature) -> Self {
        Self {
            name: name.into(),
            doc: None,
            kind: EntityKind::Function(Function {
                signature,
                body: None,
            }),
            origin: None,
        }
    }

    /// A function with a native body.
    pub fn native<F>(name: impl Into<String>, signature: Signature, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, Fault> + 'static,
    {
        let mut entity = Self::function(name, signature);
        if let EntityKind::Function(func) = &mut entity.kind {
            func.body = Some(Box::new(body));
        }
        entity
    }

    pub fn class(name: impl Into<String>, methods: Vec<Method>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            kind: EntityKind::Class(Class { methods }),
            origin: None,
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, EntityKind::Class(_))
    }

    /// `"class"` or `"function"`.
    pub fn kind_str(&self) -> &'static str {
        match self.kind {
            EntityKind::Function(_) => "function",
            EntityKind::Class(_) => "class",
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        match &self.kind {
            EntityKind::Function(func) => Some(&func.signature),
            EntityKind::Class(_) => None,
        }
    }

    /// Invoke the native body directly. Returns `None` for classes and bodiless functions.
    pub fn call(&self, args: &[Value]) -> Option<Result<Value, Fault>> {
        match &self.kind {
            EntityKind::Function(Function {
                body: Some(body), ..
            }) => Some(body(args)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_display() {
        let sig = Signature::new()
            .param(Param::new("x").typed(TypeHint::INT))
            .param(Param::new("label"))
            .returns(TypeHint::STR);
        assert_eq!(sig.to_string(), "(x: int, label) -> str");
    }

    #[test]
    fn test_native_call() {
        let double = Entity::native(
            "double",
            Signature::new().param(Param::new("x")),
            |args| match args.first() {
                Some(Value::Int(n)) => Ok(Value::Int(n * 2)),
                _ => Err(Fault::type_error("expected int")),
            },
        );
        assert_eq!(double.call(&[Value::Int(4)]), Some(Ok(Value::Int(8))));
        assert!(matches!(double.call(&[Value::None]), Some(Err(_))));

        let decl = Entity::function("decl", Signature::new());
        assert!(decl.call(&[]).is_none());
        assert_eq!(decl.kind_str(), "function");
    }
}
