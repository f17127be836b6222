use crate::{NodeId, ParamType, Symbol};
use std::fmt::{self, Display, Formatter};

/// A parent/child or arity invariant would be violated by an edit.
///
/// The edit is rejected and the tree stays as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StructuralError {
    NodeNotFound(NodeId),
    TooManyChildren { parent: NodeId, child: NodeId },
    NotAChild { parent: NodeId, child: NodeId },
    RootCannotHaveParent,
    RootCannotBeDeleted,
    AlreadyParented { child: NodeId, parent: NodeId },
    WouldCycle { parent: NodeId, child: NodeId },
    ParentStillContains { parent: NodeId, child: NodeId },
    ParentDoesNotContain { parent: NodeId, child: NodeId },
    LeafCannotHaveChildren(NodeId),
    WrongKind { node: NodeId, expected: &'static str },
    DuplicateId(NodeId),
    DuplicateRoot,
}

impl Display for StructuralError {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(fmt, "Node {} is not in the tree", id),
            Self::TooManyChildren { parent, child } => write!(
                fmt,
                "{} already has a connected child, cannot connect {}",
                parent, child
            ),
            Self::NotAChild { parent, child } => {
                write!(fmt, "{} is not a child of {}", child, parent)
            }
            Self::RootCannotHaveParent => {
                write!(fmt, "The Root node cannot have a parent connection")
            }
            Self::RootCannotBeDeleted => write!(fmt, "The Root node cannot be deleted"),
            Self::AlreadyParented { child, parent } => {
                write!(fmt, "{} is already a child of {}", child, parent)
            }
            Self::WouldCycle { parent, child } => write!(
                fmt,
                "Connecting {} under {} would create a cycle",
                child, parent
            ),
            Self::ParentStillContains { parent, child } => write!(
                fmt,
                "Cannot clear the parent of {} because {} still contains it in its children",
                child, parent
            ),
            Self::ParentDoesNotContain { parent, child } => write!(
                fmt,
                "{} must contain {} as a child before setting the child's parent",
                parent, child
            ),
            Self::LeafCannotHaveChildren(id) => {
                write!(fmt, "{} cannot have child connections", id)
            }
            Self::WrongKind { node, expected } => write!(fmt, "{} is not a {} node", node, expected),
            Self::DuplicateId(id) => write!(fmt, "Node id {} is used more than once", id),
            Self::DuplicateRoot => write!(fmt, "A tree has exactly one Root node"),
        }
    }
}

impl std::error::Error for StructuralError {}

pub type StructuralResult<T = ()> = Result<T, StructuralError>;

/// An action node's binding cannot be resolved against the registry.
///
/// At tick time this never escapes: the node reports `Status::Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BindingError {
    Unbound,
    MissingLibrary(String),
    MissingMethod {
        library: String,
        method: String,
    },
    ParameterMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },
    ParameterType {
        method: String,
        param: String,
        expected: ParamType,
        actual: ParamType,
    },
    UnknownParameter {
        method: String,
        param: String,
    },
}

impl Display for BindingError {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::Unbound => write!(fmt, "The action does not have an associated library method"),
            Self::MissingLibrary(library) => {
                write!(fmt, "Could not find the action library {:?}", library)
            }
            Self::MissingMethod { library, method } => write!(
                fmt,
                "Action library {:?} has no action method {:?}",
                library, method
            ),
            Self::ParameterMismatch {
                method,
                expected,
                actual,
            } => write!(
                fmt,
                "Action method {:?} takes {} parameters but the node binds {}",
                method, expected, actual
            ),
            Self::ParameterType {
                method,
                param,
                expected,
                actual,
            } => write!(
                fmt,
                "Parameter {:?} of {:?} is declared {} but bound as {}",
                param, method, expected, actual
            ),
            Self::UnknownParameter { method, param } => {
                write!(fmt, "Action method {:?} has no parameter {:?}", method, param)
            }
        }
    }
}

impl std::error::Error for BindingError {}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContextError {
    KeyNotFound(Symbol),
    TypeMismatch { key: Symbol, expected: &'static str },
}

impl Display for ContextError {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::KeyNotFound(key) => {
                write!(fmt, "Key {} not found in the current context", key)
            }
            Self::TypeMismatch { key, expected } => {
                write!(fmt, "Key {} does not hold a value of type {}", key, expected)
            }
        }
    }
}

impl std::error::Error for ContextError {}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValueError {
    Unparseable { ty: ParamType, text: String },
    WrongType { expected: ParamType, actual: ParamType },
    UnknownType(String),
}

impl Display for ValueError {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::Unparseable { ty, text } => {
                write!(fmt, "Cannot read {:?} as a value of type {}", text, ty)
            }
            Self::WrongType { expected, actual } => {
                write!(fmt, "Expected a value of type {}, got {}", expected, actual)
            }
            Self::UnknownType(name) => write!(fmt, "Unknown parameter type {:?}", name),
        }
    }
}

impl std::error::Error for ValueError {}

/// An action parameter could not be assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParameterError {
    Structural(StructuralError),
    UnknownParameter(String),
    Value(ValueError),
}

impl Display for ParameterError {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::Structural(e) => e.fmt(fmt),
            Self::UnknownParameter(name) => write!(fmt, "The action has no parameter {:?}", name),
            Self::Value(e) => e.fmt(fmt),
        }
    }
}

impl std::error::Error for ParameterError {}

impl From<StructuralError> for ParameterError {
    fn from(err: StructuralError) -> Self {
        Self::Structural(err)
    }
}

impl From<ValueError> for ParameterError {
    fn from(err: ValueError) -> Self {
        Self::Value(err)
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum LoadError {
    Yaml(serde_yaml::Error),
    MissingRoot,
    UnsupportedNodeKind(String),
    UnsupportedStrategy(String),
    Structural(StructuralError),
    Value { node: NodeId, error: ValueError },
    Binding { node: NodeId, error: BindingError },
}

impl Display for LoadError {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self {
            Self::Yaml(e) => e.fmt(fmt),
            Self::MissingRoot => write!(fmt, "The document does not have a root node"),
            Self::UnsupportedNodeKind(kind) => {
                write!(fmt, "{:?} deserialization not implemented", kind)
            }
            Self::UnsupportedStrategy(name) => {
                write!(fmt, "Unknown parallel resolution strategy {:?}", name)
            }
            Self::Structural(e) => e.fmt(fmt),
            Self::Value { node, error } => {
                error.fmt(fmt)?;
                write!(fmt, " in {}", node)
            }
            Self::Binding { node, error } => {
                error.fmt(fmt)?;
                write!(fmt, " in {}", node)
            }
        }
    }
}

impl std::error::Error for LoadError {}

impl From<serde_yaml::Error> for LoadError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml(err)
    }
}

impl From<StructuralError> for LoadError {
    fn from(err: StructuralError) -> Self {
        Self::Structural(err)
    }
}

#[derive(Debug)]
pub struct SaveError(pub serde_yaml::Error);

impl Display for SaveError {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        self.0.fmt(fmt)
    }
}

impl std::error::Error for SaveError {}

impl From<serde_yaml::Error> for SaveError {
    fn from(err: serde_yaml::Error) -> Self {
        Self(err)
    }
}
