use crate::Symbol;
use std::any::TypeId;

/// Whether an action reads or writes a blackboard key.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PortType {
    Input,
    Output,
}

/// A blackboard key an action declares it reads (expects) or writes (outputs).
///
/// These are metadata only. The action body does the actual reading and
/// writing; the runtime uses the declarations to document and validate
/// blackboard usage.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PortSpec {
    pub ty: PortType,
    pub key: Symbol,
    pub value_type: TypeId,
    pub value_type_name: &'static str,
}

impl PortSpec {
    pub fn new_in<T: 'static>(key: impl Into<Symbol>) -> Self {
        Self::new::<T>(PortType::Input, key)
    }

    pub fn new_out<T: 'static>(key: impl Into<Symbol>) -> Self {
        Self::new::<T>(PortType::Output, key)
    }

    fn new<T: 'static>(ty: PortType, key: impl Into<Symbol>) -> Self {
        Self {
            ty,
            key: key.into(),
            value_type: TypeId::of::<T>(),
            value_type_name: std::any::type_name::<T>(),
        }
    }
}
