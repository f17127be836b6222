use crate::{error::ContextError, Blackboard, Symbol};
use std::any::TypeId;
use std::fmt::{self, Debug, Formatter};

/// The agent-scoped blackboard.
///
/// One `Context` belongs to one agent and outlives individual ticks, so
/// actions use it to carry state between the ticks of a `Running` behavior.
#[derive(Default)]
pub struct Context {
    blackboard: Blackboard,
}

impl Context {
    pub fn new(blackboard: Blackboard) -> Self {
        Self { blackboard }
    }

    pub fn take_blackboard(self) -> Blackboard {
        self.blackboard
    }

    pub fn contains_key(&self, key: impl Into<Symbol>) -> bool {
        self.blackboard.contains_key(&key.into())
    }

    /// Whether `key` is present and holds a value of type `ty`.
    pub fn holds(&self, key: impl Into<Symbol>, ty: TypeId) -> bool {
        self.blackboard
            .get(&key.into())
            .map_or(false, |val| (**val).type_id() == ty)
    }

    pub fn get<T: 'static>(&self, key: impl Into<Symbol>) -> Result<&T, ContextError> {
        let key = key.into();
        let val = self
            .blackboard
            .get(&key)
            .ok_or(ContextError::KeyNotFound(key))?;
        val.downcast_ref().ok_or_else(|| ContextError::TypeMismatch {
            key,
            expected: std::any::type_name::<T>(),
        })
    }

    pub fn get_mut<T: 'static>(&mut self, key: impl Into<Symbol>) -> Result<&mut T, ContextError> {
        let key = key.into();
        let val = self
            .blackboard
            .get_mut(&key)
            .ok_or(ContextError::KeyNotFound(key))?;
        val.downcast_mut().ok_or_else(|| ContextError::TypeMismatch {
            key,
            expected: std::any::type_name::<T>(),
        })
    }

    /// Returns the value under `key`, storing `default` first if the key is absent.
    pub fn get_or<T: 'static>(
        &mut self,
        key: impl Into<Symbol>,
        default: T,
    ) -> Result<&T, ContextError> {
        let key = key.into();
        let val = self
            .blackboard
            .entry(key)
            .or_insert_with(|| Box::new(default));
        val.downcast_ref().ok_or_else(|| ContextError::TypeMismatch {
            key,
            expected: std::any::type_name::<T>(),
        })
    }

    pub fn set<T: 'static>(&mut self, key: impl Into<Symbol>, val: T) {
        self.blackboard.insert(key.into(), Box::new(val));
    }

    /// Removes `key`, returning whether it was present.
    pub fn unset(&mut self, key: impl Into<Symbol>) -> bool {
        self.blackboard.remove(&key.into()).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.blackboard.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.blackboard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blackboard.is_empty()
    }

    pub fn clear(&mut self) {
        self.blackboard.clear();
    }
}

impl Debug for Context {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.debug_set().entries(self.blackboard.keys()).finish()
    }
}
