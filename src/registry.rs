use crate::{
    builtin, error::BindingError, ActionParameter, Args, Context, ParamSpec, ParamType, PortSpec,
    Status, Symbol,
};
use std::{any::Any, collections::HashMap, marker::PhantomData, rc::Rc};

/// A class of behaviors that action nodes bind to.
///
/// A tree creates one instance per library the first time any of its action
/// nodes uses it, and every action node of that tree bound to the library
/// shares the instance. `start` runs once, right after creation.
pub trait ActionLibrary<A>: 'static {
    fn start(&mut self, _agent: &mut A, _ctx: &mut Context) {}
}

/// The signature of an action method: its literal parameters in declaration
/// order and the blackboard keys it reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
}

type InvokeFn<A> = dyn Fn(&mut dyn Any, &mut A, &mut Context, &[ActionParameter]) -> Status;

/// A resolved, invocable action method.
pub struct ActionMethod<A> {
    spec: MethodSpec,
    invoke: Box<InvokeFn<A>>,
}

impl<A> ActionMethod<A> {
    pub fn spec(&self) -> &MethodSpec {
        &self.spec
    }

    pub(crate) fn invoke(
        &self,
        library: &mut dyn Any,
        agent: &mut A,
        ctx: &mut Context,
        params: &[ActionParameter],
    ) -> Status {
        (self.invoke)(library, agent, ctx, params)
    }
}

struct LibraryEntry<A> {
    path: Option<String>,
    construct: Box<dyn Fn() -> Box<dyn Any>>,
    start: Box<dyn Fn(&mut dyn Any, &mut A, &mut Context)>,
    methods: HashMap<String, Rc<ActionMethod<A>>>,
}

/// The set of action libraries and their methods known to the runtime,
/// keyed by name. Populated once at startup and shared by the trees that
/// dispatch through it.
pub struct ActionRegistry<A> {
    libraries: HashMap<String, LibraryEntry<A>>,
}

impl<A: 'static> Default for ActionRegistry<A> {
    fn default() -> Self {
        let mut ret = Self::empty();
        builtin::register(&mut ret);
        ret
    }
}

impl<A: 'static> ActionRegistry<A> {
    /// A registry without the built-in blackboard library.
    pub fn empty() -> Self {
        Self {
            libraries: HashMap::new(),
        }
    }

    /// Registers a library under `name`, replacing any previous one, and
    /// returns a builder for declaring its action methods.
    pub fn register<L>(
        &mut self,
        name: impl ToString,
        constructor: impl Fn() -> L + 'static,
    ) -> LibraryBuilder<'_, A, L>
    where
        L: ActionLibrary<A>,
    {
        let name = name.to_string();
        let entry = LibraryEntry {
            path: None,
            construct: Box::new(move || Box::new(constructor()) as Box<dyn Any>),
            start: Box::new(|library: &mut dyn Any, agent: &mut A, ctx: &mut Context| {
                if let Some(library) = library.downcast_mut::<L>() {
                    library.start(agent, ctx);
                }
            }),
            methods: HashMap::new(),
        };
        self.libraries.insert(name.clone(), entry);
        LibraryBuilder {
            registry: self,
            library: name,
            last_method: None,
            _marker: PhantomData,
        }
    }
}

impl<A> ActionRegistry<A> {
    pub fn has_library(&self, library: &str) -> bool {
        self.libraries.contains_key(library)
    }

    pub fn library_names(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }

    pub fn library_path(&self, library: &str) -> Option<&str> {
        self.libraries.get(library)?.path.as_deref()
    }

    /// Signatures of every action method of a library.
    pub fn methods(&self, library: &str) -> impl Iterator<Item = &MethodSpec> {
        self.libraries
            .get(library)
            .into_iter()
            .flat_map(|entry| entry.methods.values().map(|method| &method.spec))
    }

    pub fn method_spec(&self, library: &str, method: &str) -> Option<&MethodSpec> {
        self.libraries
            .get(library)?
            .methods
            .get(method)
            .map(|method| &method.spec)
    }

    pub fn resolve(&self, library: &str, method: &str) -> Result<Rc<ActionMethod<A>>, BindingError> {
        let entry = self
            .libraries
            .get(library)
            .ok_or_else(|| BindingError::MissingLibrary(library.to_owned()))?;
        entry
            .methods
            .get(method)
            .cloned()
            .ok_or_else(|| BindingError::MissingMethod {
                library: library.to_owned(),
                method: method.to_owned(),
            })
    }

    /// Creates a fresh library instance and runs its start hook.
    pub(crate) fn instantiate(
        &self,
        library: &str,
        agent: &mut A,
        ctx: &mut Context,
    ) -> Result<Box<dyn Any>, BindingError> {
        let entry = self
            .libraries
            .get(library)
            .ok_or_else(|| BindingError::MissingLibrary(library.to_owned()))?;
        let mut instance = (entry.construct)();
        (entry.start)(instance.as_mut(), agent, ctx);
        Ok(instance)
    }
}

/// Declares the action methods of a library being registered.
pub struct LibraryBuilder<'r, A, L> {
    registry: &'r mut ActionRegistry<A>,
    library: String,
    last_method: Option<String>,
    _marker: PhantomData<fn() -> L>,
}

impl<'r, A, L> LibraryBuilder<'r, A, L>
where
    A: 'static,
    L: ActionLibrary<A>,
{
    /// Records where an authoring tool can find the library.
    pub fn path(self, path: impl ToString) -> Self {
        if let Some(entry) = self.registry.libraries.get_mut(&self.library) {
            entry.path = Some(path.to_string());
        }
        self
    }

    /// Registers a tree-invocable method taking the given literal parameters.
    pub fn action(
        mut self,
        name: impl ToString,
        params: &[(&str, ParamType)],
        method: impl Fn(&mut L, &mut A, &mut Context, Args) -> Status + 'static,
    ) -> Self {
        let name = name.to_string();
        let spec = MethodSpec {
            name: name.clone(),
            params: params
                .iter()
                .map(|(param, ty)| ParamSpec::new(param, *ty))
                .collect(),
            inputs: vec![],
            outputs: vec![],
        };
        let invoke = move |library: &mut dyn Any,
                           agent: &mut A,
                           ctx: &mut Context,
                           params: &[ActionParameter]| {
            match library.downcast_mut::<L>() {
                Some(library) => method(library, agent, ctx, Args::new(params)),
                None => Status::Error,
            }
        };
        if let Some(entry) = self.registry.libraries.get_mut(&self.library) {
            entry.methods.insert(
                name.clone(),
                Rc::new(ActionMethod {
                    spec,
                    invoke: Box::new(invoke),
                }),
            );
        }
        self.last_method = Some(name);
        self
    }

    /// Declares that the last registered method reads `key` from the context.
    pub fn expects<T: 'static>(self, key: impl Into<Symbol>) -> Self {
        let port = PortSpec::new_in::<T>(key);
        self.with_last_method(|spec| spec.inputs.push(port))
    }

    /// Declares that the last registered method writes `key` to the context.
    pub fn outputs<T: 'static>(self, key: impl Into<Symbol>) -> Self {
        let port = PortSpec::new_out::<T>(key);
        self.with_last_method(|spec| spec.outputs.push(port))
    }

    fn with_last_method(self, f: impl FnOnce(&mut MethodSpec)) -> Self {
        let method = self.last_method.as_ref().and_then(|name| {
            self.registry
                .libraries
                .get_mut(&self.library)?
                .methods
                .get_mut(name)
        });
        // Nothing else holds the handle while the library is being built
        if let Some(method) = method.and_then(Rc::get_mut) {
            f(&mut method.spec);
        }
        self
    }
}
