use crate::error::ValueError;
use std::fmt::{self, Display, Formatter};

/// The declared type of an action parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Bool,
    Int,
    Float,
    String,
    Vec2,
}

impl ParamType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Vec2 => "vec2",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => Self::Bool,
            "int" => Self::Int,
            "float" => Self::Float,
            "string" => Self::String,
            "vec2" => Self::Vec2,
            _ => return None,
        })
    }

    /// The value a freshly derived parameter starts with.
    pub fn empty_value(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.),
            Self::String => Value::String(String::new()),
            Self::Vec2 => Value::Vec2(0., 0.),
        }
    }

    /// Decodes the text encoding of a literal of this type.
    pub fn parse(self, text: &str) -> Result<Value, ValueError> {
        crate::parser::parse_literal(self, text)
    }
}

impl Display for ParamType {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str(self.name())
    }
}

/// A literal parameter value fixed at edit time.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Vec2(f64, f64),
}

impl Value {
    pub fn ty(&self) -> ParamType {
        match self {
            Self::Bool(_) => ParamType::Bool,
            Self::Int(_) => ParamType::Int,
            Self::Float(_) => ParamType::Float,
            Self::String(_) => ParamType::String,
            Self::Vec2(..) => ParamType::Vec2,
        }
    }
}

/// The text encoding used in tree documents.
impl Display for Value {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(fmt, "{}", b),
            Self::Int(i) => write!(fmt, "{}", i),
            Self::Float(f) => write!(fmt, "{}", f),
            Self::String(s) => fmt.write_str(s),
            Self::Vec2(x, y) => write!(fmt, "({}, {})", x, y),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<(f64, f64)> for Value {
    fn from((x, y): (f64, f64)) -> Self {
        Self::Vec2(x, y)
    }
}

/// One entry of a method signature: the parameter name and its declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub ty: ParamType,
}

impl ParamSpec {
    pub fn new(name: impl ToString, ty: ParamType) -> Self {
        Self {
            name: name.to_string(),
            ty,
        }
    }
}

/// A parameter bound on an action node: name, declared type and literal value.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionParameter {
    pub name: String,
    pub ty: ParamType,
    pub value: Value,
}

impl ActionParameter {
    pub fn new(name: impl ToString, value: Value) -> Self {
        Self {
            name: name.to_string(),
            ty: value.ty(),
            value,
        }
    }

    pub(crate) fn from_spec(spec: &ParamSpec) -> Self {
        Self {
            name: spec.name.clone(),
            ty: spec.ty,
            value: spec.ty.empty_value(),
        }
    }
}

/// Conversion out of a [`Value`] for typed access in action bodies.
pub trait FromValue<'a>: Sized {
    fn from_value(value: &'a Value) -> Option<Self>;
}

impl<'a> FromValue<'a> for bool {
    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for i64 {
    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for i32 {
    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Int(i) => i32::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for u32 {
    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Int(i) => u32::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for usize {
    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Int(i) => usize::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for f64 {
    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for f32 {
    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(*f as f32),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for &'a str {
    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for String {
    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for (f64, f64) {
    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Vec2(x, y) => Some((*x, *y)),
            _ => None,
        }
    }
}

/// The argument list handed to an action method, in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    values: &'a [ActionParameter],
}

impl<'a> Args<'a> {
    pub(crate) fn new(values: &'a [ActionParameter]) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index).map(|param| &param.value)
    }

    /// Typed access by position. `None` if out of range or of another type.
    pub fn get<T: FromValue<'a>>(&self, index: usize) -> Option<T> {
        self.value(index).and_then(T::from_value)
    }

    /// Typed access by parameter name.
    pub fn named<T: FromValue<'a>>(&self, name: &str) -> Option<T> {
        self.values
            .iter()
            .find(|param| param.name == name)
            .and_then(|param| T::from_value(&param.value))
    }
}
