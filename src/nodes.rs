use crate::{
    error::{BindingError, ParameterError, ValueError},
    registry::MethodSpec,
    ActionParameter, NodeId, PortSpec, Status, Value,
};
use rand::{seq::SliceRandom, RngCore};

/// What a node kind needs from the tree while it ticks.
///
/// The tree implements this with its tick wrapper; the node kinds only decide
/// which children to tick and how to combine the results.
pub(crate) trait Ticker {
    /// Ticks a child through the tree's tick wrapper.
    fn tick_child(&mut self, child: NodeId) -> Status;

    /// Invokes the external behavior bound to an action node.
    fn dispatch(&mut self, node: NodeId, action: &Action) -> Status;

    fn rng(&mut self) -> &mut dyn RngCore;
}

/// How many children a node kind may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    Single,
    Many,
}

impl Arity {
    pub fn allows(self, count: usize) -> bool {
        match self {
            Self::None => count == 0,
            Self::Single => count <= 1,
            Self::Many => true,
        }
    }
}

/// Node kind names in the order an editor lists them.
pub const NODE_KIND_NAMES: [&str; 9] = [
    "Action",
    "Inverter",
    "Parallel",
    "RandomSelector",
    "Repeater",
    "Selector",
    "Sequence",
    "Succeeder",
    "UntilSucceed",
];

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Sequence(Sequence),
    Selector(Selector),
    RandomSelector(RandomSelector),
    Parallel(Parallel),
    Repeater(Repeater),
    UntilSucceed(UntilSucceed),
    Inverter,
    Succeeder,
    Action(Action),
}

impl NodeKind {
    /// Builds a default node of the named kind. `Root` is not buildable by name
    /// because a tree has exactly one.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Action" => Self::Action(Action::default()),
            "Inverter" => Self::Inverter,
            "Parallel" => Self::Parallel(Parallel::default()),
            "RandomSelector" => Self::RandomSelector(RandomSelector::default()),
            "Repeater" => Self::Repeater(Repeater::default()),
            "Selector" => Self::Selector(Selector::default()),
            "Sequence" => Self::Sequence(Sequence::default()),
            "Succeeder" => Self::Succeeder,
            "UntilSucceed" => Self::UntilSucceed(UntilSucceed::default()),
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::Sequence(_) => "Sequence",
            Self::Selector(_) => "Selector",
            Self::RandomSelector(_) => "RandomSelector",
            Self::Parallel(_) => "Parallel",
            Self::Repeater(_) => "Repeater",
            Self::UntilSucceed(_) => "UntilSucceed",
            Self::Inverter => "Inverter",
            Self::Succeeder => "Succeeder",
            Self::Action(_) => "Action",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Self::Root
            | Self::Repeater(_)
            | Self::UntilSucceed(_)
            | Self::Inverter
            | Self::Succeeder => Arity::Single,
            Self::Sequence(_) | Self::Selector(_) | Self::RandomSelector(_) | Self::Parallel(_) => {
                Arity::Many
            }
            Self::Action(_) => Arity::None,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.arity() == Arity::Many
    }

    pub fn as_action(&self) -> Option<&Action> {
        match self {
            Self::Action(action) => Some(action),
            _ => None,
        }
    }

    pub(crate) fn as_action_mut(&mut self) -> Option<&mut Action> {
        match self {
            Self::Action(action) => Some(action),
            _ => None,
        }
    }

    pub(crate) fn tick(&mut self, id: NodeId, children: &[NodeId], ticker: &mut dyn Ticker) -> Status {
        match self {
            Self::Root => children
                .first()
                .map_or(Status::Error, |child| ticker.tick_child(*child)),
            Self::Sequence(node) => node.tick(children, ticker),
            Self::Selector(node) => node.tick(children, ticker),
            Self::RandomSelector(node) => node.tick(children, ticker),
            Self::Parallel(node) => node.tick(children, ticker),
            Self::Repeater(node) => node.tick(children, ticker),
            Self::UntilSucceed(node) => node.tick(children, ticker),
            Self::Inverter => match single_child(children, ticker) {
                Status::Success => Status::Failure,
                Status::Failure => Status::Success,
                res => res,
            },
            // A missing child is a broken tree, not a result to mask
            Self::Succeeder => match children.first() {
                Some(child) => {
                    ticker.tick_child(*child);
                    Status::Success
                }
                None => Status::Error,
            },
            Self::Action(action) => ticker.dispatch(id, action),
        }
    }
}

fn single_child(children: &[NodeId], ticker: &mut dyn Ticker) -> Status {
    children
        .first()
        .map_or(Status::Error, |child| ticker.tick_child(*child))
}

/// Ticks children in order until one does not succeed.
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    pub remember_running: bool,
    last_running: usize,
}

impl Sequence {
    pub fn new(remember_running: bool) -> Self {
        Self {
            remember_running,
            last_running: 0,
        }
    }

    fn tick(&mut self, children: &[NodeId], ticker: &mut dyn Ticker) -> Status {
        let start = resume_index(self.remember_running, self.last_running, children.len());
        for (i, child) in children.iter().enumerate().skip(start) {
            let status = ticker.tick_child(*child);
            if status != Status::Success {
                self.last_running = if status == Status::Running { i } else { 0 };
                return status;
            }
        }
        self.last_running = 0;
        Status::Success
    }
}

/// Ticks children in order until one does not fail.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    pub remember_running: bool,
    last_running: usize,
}

impl Selector {
    pub fn new(remember_running: bool) -> Self {
        Self {
            remember_running,
            last_running: 0,
        }
    }

    fn tick(&mut self, children: &[NodeId], ticker: &mut dyn Ticker) -> Status {
        let start = resume_index(self.remember_running, self.last_running, children.len());
        for (i, child) in children.iter().enumerate().skip(start) {
            let status = ticker.tick_child(*child);
            if status != Status::Failure {
                self.last_running = if status == Status::Running { i } else { 0 };
                return status;
            }
        }
        self.last_running = 0;
        Status::Failure
    }
}

fn resume_index(remember_running: bool, last_running: usize, len: usize) -> usize {
    // An edit may have removed children since the index was stored
    if remember_running && last_running < len {
        last_running
    } else {
        0
    }
}

/// A selector that tries its children in a freshly shuffled order.
///
/// The order is drawn when a run starts and kept while a child is running, so
/// a running child is resumed instead of reshuffled away.
#[derive(Debug, Clone, Default)]
pub struct RandomSelector {
    order: Vec<usize>,
    last_running: Option<usize>,
}

impl RandomSelector {
    fn tick(&mut self, children: &[NodeId], ticker: &mut dyn Ticker) -> Status {
        let start = match self.last_running {
            Some(pos) if self.order.len() == children.len() => pos,
            _ => {
                self.order = (0..children.len()).collect();
                self.order.shuffle(ticker.rng());
                0
            }
        };
        for pos in start..self.order.len() {
            let status = ticker.tick_child(children[self.order[pos]]);
            if status != Status::Failure {
                self.last_running = (status == Status::Running).then(|| pos);
                return status;
            }
        }
        self.last_running = None;
        Status::Failure
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionStrategy {
    #[default]
    FirstSuccess,
    FirstFailure,
    FirstResolved,
    AllResolved,
}

impl ResolutionStrategy {
    pub fn name(self) -> &'static str {
        match self {
            Self::FirstSuccess => "FirstSuccess",
            Self::FirstFailure => "FirstFailure",
            Self::FirstResolved => "FirstResolved",
            Self::AllResolved => "AllResolved",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "FirstSuccess" => Self::FirstSuccess,
            "FirstFailure" => Self::FirstFailure,
            "FirstResolved" => Self::FirstResolved,
            "AllResolved" => Self::AllResolved,
            _ => return None,
        })
    }
}

/// Ticks every child on every tick and folds the results by a strategy.
///
/// Children are ticked one after another within the call; "parallel" is about
/// the control flow, not about threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parallel {
    pub strategy: ResolutionStrategy,
}

impl Parallel {
    pub fn new(strategy: ResolutionStrategy) -> Self {
        Self { strategy }
    }

    fn tick(&mut self, children: &[NodeId], ticker: &mut dyn Ticker) -> Status {
        let mut results = Vec::with_capacity(children.len());
        for child in children {
            let status = ticker.tick_child(*child);
            if status == Status::Error {
                return Status::Error;
            }
            results.push(status);
        }
        self.resolve(&results)
    }

    pub(crate) fn resolve(&self, results: &[Status]) -> Status {
        let any = |wanted: Status| results.iter().any(|res| *res == wanted);
        match self.strategy {
            ResolutionStrategy::FirstSuccess => {
                if any(Status::Success) {
                    Status::Success
                } else if any(Status::Running) {
                    Status::Running
                } else {
                    Status::Failure
                }
            }
            ResolutionStrategy::FirstFailure => {
                if any(Status::Failure) {
                    Status::Failure
                } else if any(Status::Running) {
                    Status::Running
                } else {
                    Status::Success
                }
            }
            ResolutionStrategy::FirstResolved => {
                if results.is_empty() {
                    return Status::Success;
                }
                results
                    .iter()
                    .copied()
                    .find(|res| *res != Status::Running)
                    .unwrap_or(Status::Running)
            }
            ResolutionStrategy::AllResolved => {
                if any(Status::Running) {
                    Status::Running
                } else if any(Status::Failure) {
                    Status::Failure
                } else {
                    Status::Success
                }
            }
        }
    }
}

/// Re-runs its child until it has completed `repetitions` times.
/// Zero repetitions repeats forever.
#[derive(Debug, Clone, Default)]
pub struct Repeater {
    pub repetitions: u32,
    completed: u32,
}

impl Repeater {
    pub fn new(repetitions: u32) -> Self {
        Self {
            repetitions,
            completed: 0,
        }
    }

    /// Child runs completed in the current cycle.
    pub fn completed(&self) -> u32 {
        self.completed
    }

    fn tick(&mut self, children: &[NodeId], ticker: &mut dyn Ticker) -> Status {
        match single_child(children, ticker) {
            // Repeating forever has nothing to count toward
            Status::Success | Status::Failure if self.repetitions == 0 => Status::Running,
            Status::Success | Status::Failure => {
                self.completed = self.completed.saturating_add(1);
                if self.completed >= self.repetitions {
                    self.completed = 0;
                    Status::Success
                } else {
                    Status::Running
                }
            }
            res => res,
        }
    }
}

/// Reports `Running` until its child succeeds.
#[derive(Debug, Clone, Default)]
pub struct UntilSucceed {
    attempts: u32,
}

impl UntilSucceed {
    /// Failed attempts since the last success.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn tick(&mut self, children: &[NodeId], ticker: &mut dyn Ticker) -> Status {
        match single_child(children, ticker) {
            Status::Success => {
                self.attempts = 0;
                Status::Success
            }
            Status::Failure => {
                self.attempts = self.attempts.saturating_add(1);
                Status::Running
            }
            res => res,
        }
    }
}

// Equality compares what a node is configured to do. Resume indices and
// counters are runtime state and do not take part.

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.remember_running == other.remember_running
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.remember_running == other.remember_running
    }
}

impl PartialEq for RandomSelector {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl PartialEq for Repeater {
    fn eq(&self, other: &Self) -> bool {
        self.repetitions == other.repetitions
    }
}

impl PartialEq for UntilSucceed {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

/// A leaf bound to a method of an action library.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Action {
    library: Option<String>,
    library_path: Option<String>,
    method: Option<String>,
    parameters: Vec<ActionParameter>,
    inputs: Vec<PortSpec>,
    outputs: Vec<PortSpec>,
}

impl Action {
    pub fn library(&self) -> Option<&str> {
        self.library.as_deref()
    }

    /// Where the library can be found, as recorded by the authoring tool.
    pub fn library_path(&self) -> Option<&str> {
        self.library_path.as_deref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn parameters(&self) -> &[ActionParameter] {
        &self.parameters
    }

    /// Blackboard keys the bound method expects to read.
    pub fn inputs(&self) -> &[PortSpec] {
        &self.inputs
    }

    /// Blackboard keys the bound method writes.
    pub fn outputs(&self) -> &[PortSpec] {
        &self.outputs
    }

    pub fn is_bound(&self) -> bool {
        self.library.is_some() && self.method.is_some()
    }

    /// Binds the library. Returns whether the binding changed; switching to
    /// another library unbinds the method.
    pub(crate) fn set_library(&mut self, library: Option<String>, path: Option<String>) -> bool {
        self.library_path = path;
        if self.library == library {
            return false;
        }
        self.library = library;
        self.set_method(None, None);
        true
    }

    /// Binds the method. A different method clears the parameters and the
    /// declared inputs/outputs and derives them again from `signature`.
    pub(crate) fn set_method(&mut self, method: Option<String>, signature: Option<&MethodSpec>) -> bool {
        if self.method == method {
            return false;
        }
        self.method = method;
        self.parameters.clear();
        self.inputs.clear();
        self.outputs.clear();
        if let Some(signature) = signature {
            self.derive_from(signature);
        }
        true
    }

    pub(crate) fn derive_from(&mut self, signature: &MethodSpec) {
        self.parameters = signature
            .params
            .iter()
            .map(ActionParameter::from_spec)
            .collect();
        self.inputs = signature.inputs.clone();
        self.outputs = signature.outputs.clone();
    }

    pub(crate) fn set_parameter(&mut self, name: &str, value: Value) -> Result<(), ParameterError> {
        let param = self
            .parameters
            .iter_mut()
            .find(|param| param.name == name)
            .ok_or_else(|| ParameterError::UnknownParameter(name.to_owned()))?;
        if param.ty != value.ty() {
            return Err(ParameterError::Value(ValueError::WrongType {
                expected: param.ty,
                actual: value.ty(),
            }));
        }
        param.value = value;
        Ok(())
    }

    /// Replaces the parameter list verbatim, as read from a document.
    pub(crate) fn set_parameters(&mut self, parameters: Vec<ActionParameter>) {
        self.parameters = parameters;
    }

    /// Checks the bound parameters against a method signature.
    pub(crate) fn check_signature(&self, signature: &MethodSpec) -> Result<(), BindingError> {
        if self.parameters.len() != signature.params.len() {
            return Err(BindingError::ParameterMismatch {
                method: signature.name.clone(),
                expected: signature.params.len(),
                actual: self.parameters.len(),
            });
        }
        for (bound, declared) in self.parameters.iter().zip(&signature.params) {
            if bound.name != declared.name {
                return Err(BindingError::UnknownParameter {
                    method: signature.name.clone(),
                    param: bound.name.clone(),
                });
            }
            if bound.ty != declared.ty || bound.value.ty() != declared.ty {
                return Err(BindingError::ParameterType {
                    method: signature.name.clone(),
                    param: bound.name.clone(),
                    expected: declared.ty,
                    actual: bound.value.ty(),
                });
            }
        }
        Ok(())
    }
}
