use crate::{
    error::BindingError,
    nodes::Action,
    registry::{ActionMethod, ActionRegistry},
    Context, NodeId, Status,
};
use std::{any::Any, collections::HashMap, rc::Rc};
use tracing::{debug, trace, warn};

struct CachedMethod<A> {
    library: String,
    method: String,
    handle: Rc<ActionMethod<A>>,
}

/// Binds action nodes of one tree to the registry.
///
/// Owns the tree's library instances (one per library name) and a cache of
/// resolved method handles per action node. Both live exactly as long as the
/// tree that owns the dispatcher.
pub(crate) struct Dispatcher<A> {
    registry: Rc<ActionRegistry<A>>,
    libraries: HashMap<String, Box<dyn Any>>,
    methods: HashMap<NodeId, CachedMethod<A>>,
    validate_inputs: bool,
}

impl<A> Dispatcher<A> {
    pub fn new(registry: Rc<ActionRegistry<A>>, validate_inputs: bool) -> Self {
        Self {
            registry,
            libraries: HashMap::new(),
            methods: HashMap::new(),
            validate_inputs,
        }
    }

    pub fn registry(&self) -> &Rc<ActionRegistry<A>> {
        &self.registry
    }

    pub fn library<L: 'static>(&self, library: &str) -> Option<&L> {
        self.libraries.get(library)?.downcast_ref()
    }

    /// Forgets the resolved method of a node whose binding changed or which
    /// was deleted.
    pub fn invalidate(&mut self, node: NodeId) {
        self.methods.remove(&node);
    }

    /// Invokes the method bound to `action`. Binding faults are reported and
    /// turned into `Status::Error`.
    pub fn dispatch(
        &mut self,
        node: NodeId,
        action: &Action,
        agent: &mut A,
        ctx: &mut Context,
    ) -> Status {
        match self.try_dispatch(node, action, agent, ctx) {
            Ok(status) => status,
            Err(error) => {
                warn!(%node, %error, "Action dispatch failed");
                Status::Error
            }
        }
    }

    fn try_dispatch(
        &mut self,
        node: NodeId,
        action: &Action,
        agent: &mut A,
        ctx: &mut Context,
    ) -> Result<Status, BindingError> {
        let (Some(library), Some(method)) = (action.library(), action.method()) else {
            return Err(BindingError::Unbound);
        };

        if !self.libraries.contains_key(library) {
            let instance = self.registry.instantiate(library, agent, ctx)?;
            debug!(library, "Instantiated action library");
            self.libraries.insert(library.to_owned(), instance);
        }

        let handle = self.resolve(node, library, method)?;
        action.check_signature(handle.spec())?;

        if self.validate_inputs {
            for input in handle
                .spec()
                .inputs
                .iter()
                .filter(|input| !ctx.holds(input.key, input.value_type))
            {
                debug!(
                    %node,
                    key = %input.key,
                    ty = input.value_type_name,
                    "Declared input is not in the context"
                );
            }
        }

        let instance = self
            .libraries
            .get_mut(library)
            .ok_or_else(|| BindingError::MissingLibrary(library.to_owned()))?;
        trace!(%node, library, method, "Invoking action");
        Ok(handle.invoke(instance.as_mut(), agent, ctx, action.parameters()))
    }

    fn resolve(
        &mut self,
        node: NodeId,
        library: &str,
        method: &str,
    ) -> Result<Rc<ActionMethod<A>>, BindingError> {
        if let Some(cached) = self.methods.get(&node) {
            if cached.library == library && cached.method == method {
                return Ok(cached.handle.clone());
            }
        }
        let handle = self.registry.resolve(library, method)?;
        self.methods.insert(
            node,
            CachedMethod {
                library: library.to_owned(),
                method: method.to_owned(),
                handle: handle.clone(),
            },
        );
        Ok(handle)
    }
}
