use crate::{
    container::Node,
    dispatch::Dispatcher,
    error::{BindingError, ParameterError, StructuralError, StructuralResult},
    nodes::{Action, Arity, NodeKind, ResolutionStrategy, Ticker},
    registry::ActionRegistry,
    Context, NodeId, Position, Status, Value,
};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use serde::Deserialize;
use std::{collections::HashMap, rc::Rc};
use tracing::{debug, trace, warn};

/// Spacing of the editor grid. New nodes are laid out in multiples of it.
pub const GRID_STEP: Position = Position::new(12., 12.);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Stamp every ticked node with its last status and tick index.
    pub record_status: bool,
    /// Seed of the generator behind `RandomSelector`. Drawn from the OS if unset.
    pub seed: Option<u64>,
    /// Report declared action inputs that are missing from the context.
    pub validate_inputs: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            record_status: true,
            seed: None,
            validate_inputs: false,
        }
    }
}

/// The outcome of a node's most recent tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRecord {
    pub status: Status,
    pub tick: u64,
}

type WillTickHook = Box<dyn FnMut(&Node)>;
type DidTickHook = Box<dyn FnMut(&Node, Status)>;

#[derive(Default)]
struct Hooks {
    will_tick: Option<WillTickHook>,
    did_tick: Option<DidTickHook>,
}

/// A behavior tree: the node arena, its root and the per-tree runtime state.
///
/// Every node except the root either hangs below the root or is an
/// unparented node kept for editing; only the former are ticked.
///
/// Edits take `&mut self` just like [`Tree::tick`], so the borrow checker
/// already keeps structural edits out of a running tick.
pub struct Tree<A = ()> {
    nodes: HashMap<NodeId, Node>,
    /// Insertion order of `nodes`
    order: Vec<NodeId>,
    root: NodeId,
    total_ticks: u64,
    current_node: Option<NodeId>,
    records: HashMap<NodeId, TickRecord>,
    hooks: Hooks,
    dispatcher: Dispatcher<A>,
    rng: StdRng,
    config: TreeConfig,
}

impl<A: 'static> Tree<A> {
    pub fn new(registry: Rc<ActionRegistry<A>>) -> Self {
        Self::with_config(registry, TreeConfig::default())
    }

    pub fn with_config(registry: Rc<ActionRegistry<A>>, config: TreeConfig) -> Self {
        Self::with_root(
            registry,
            config,
            Node::new(NodeKind::Root, Position::default()),
        )
    }

    pub(crate) fn with_root(registry: Rc<ActionRegistry<A>>, config: TreeConfig, root: Node) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let root_id = root.id;
        debug!(root = %root_id, "Created behavior tree");
        Self {
            nodes: HashMap::from([(root_id, root)]),
            order: vec![root_id],
            root: root_id,
            total_ticks: 0,
            current_node: None,
            records: HashMap::new(),
            hooks: Hooks::default(),
            dispatcher: Dispatcher::new(registry, config.validate_inputs),
            rng,
            config,
        }
    }

    /// Ticks the tree once against `agent` and its blackboard.
    pub fn tick(&mut self, agent: &mut A, ctx: &mut Context) -> Status {
        self.total_ticks += 1;
        let tick = self.total_ticks;
        let root = self.root;
        let record_status = self.config.record_status;

        let mut runner = Runner {
            nodes: &mut self.nodes,
            dispatcher: &mut self.dispatcher,
            records: &mut self.records,
            hooks: &mut self.hooks,
            current_node: &mut self.current_node,
            rng: &mut self.rng,
            tick,
            record_status,
            agent,
            ctx,
        };
        let status = runner.tick_node(root);

        if record_status {
            self.records.insert(root, TickRecord { status, tick });
        }
        trace!(tick, ?status, "Ticked tree");
        status
    }
}

impl<A> Tree<A> {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &Node {
        // The root is inserted on construction and can never be deleted
        &self.nodes[&self.root]
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Rc<ActionRegistry<A>> {
        self.dispatcher.registry()
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// The node ticked most recently through the tick wrapper.
    pub fn current_node(&self) -> Option<NodeId> {
        self.current_node
    }

    pub fn last_status(&self, id: NodeId) -> Option<TickRecord> {
        self.records.get(&id).copied()
    }

    pub fn on_will_tick(&mut self, hook: impl FnMut(&Node) + 'static) {
        self.hooks.will_tick = Some(Box::new(hook));
    }

    pub fn on_did_tick(&mut self, hook: impl FnMut(&Node, Status) + 'static) {
        self.hooks.did_tick = Some(Box::new(hook));
    }

    pub fn clear_hooks(&mut self) {
        self.hooks = Hooks::default();
    }

    /// The library instance this tree created for `library`, if it has ticked
    /// an action of that library yet.
    pub fn library_instance<L: 'static>(&self, library: &str) -> Option<&L> {
        self.dispatcher.library(library)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node(&self, id: NodeId) -> StructuralResult<&Node> {
        self.nodes.get(&id).ok_or(StructuralError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> StructuralResult<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or(StructuralError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node, in the order it was added.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(move |id| self.nodes.get(id))
    }

    /// Nodes without a parent, other than the root.
    pub fn unparented(&self) -> impl Iterator<Item = &Node> {
        let root = self.root;
        self.nodes()
            .filter(move |node| node.id != root && node.parent.is_none())
    }

    /// Nodes reachable from the root, parents before children.
    pub fn reachable(&self) -> Vec<NodeId> {
        let mut ret = vec![];
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                ret.push(id);
                stack.extend(node.children.iter().rev());
            }
        }
        ret
    }

    /// The parent chain of a node, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut ret = vec![];
        let mut cur = self.nodes.get(&id).and_then(|node| node.parent);
        while let Some(parent) = cur {
            // A consistent tree has no cycles, but never spin on a broken one
            if ret.contains(&parent) {
                break;
            }
            ret.push(parent);
            cur = self.nodes.get(&parent).and_then(|node| node.parent);
        }
        ret
    }

    // Structural edits ------------------------------------------------------

    /// Adds an unparented node.
    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> StructuralResult<NodeId> {
        let node = Node::new(kind, position);
        let id = node.id;
        self.insert_node(node)?;
        Ok(id)
    }

    /// Adds a node the way an editor does: below `parent` if it can take
    /// another child, laid out next to its last sibling; otherwise unparented
    /// at `position` snapped to the grid.
    pub fn add(
        &mut self,
        kind: NodeKind,
        parent: Option<NodeId>,
        position: Position,
    ) -> StructuralResult<NodeId> {
        let attach_to = match parent {
            Some(parent) => self.node(parent)?.can_connect_child().then(|| parent),
            None => None,
        };

        let Some(parent) = attach_to else {
            return self.add_node(kind, position.snapped(GRID_STEP));
        };

        let parent_node = self.node(parent)?;
        let position = match parent_node
            .children
            .last()
            .and_then(|sibling| self.nodes.get(sibling))
        {
            Some(sibling) => sibling.position.offset(GRID_STEP.x * 10., 0.),
            None => parent_node.position.offset(0., GRID_STEP.y * 10.),
        };
        let id = self.add_node(kind, position)?;
        self.connect(parent, id)?;
        Ok(id)
    }

    pub(crate) fn insert_node(&mut self, node: Node) -> StructuralResult {
        if node.is_root() {
            return Err(StructuralError::DuplicateRoot);
        }
        if self.nodes.contains_key(&node.id) {
            return Err(StructuralError::DuplicateId(node.id));
        }
        self.order.push(node.id);
        self.nodes.insert(node.id, node);
        Ok(())
    }

    /// Appends `child` to `parent`'s children and sets its parent link.
    pub fn connect_child(&mut self, parent: NodeId, child: NodeId) -> StructuralResult {
        if child == self.root {
            return Err(StructuralError::RootCannotHaveParent);
        }
        if let Some(existing) = self.node(child)?.parent {
            return Err(StructuralError::AlreadyParented {
                child,
                parent: existing,
            });
        }
        let parent_node = self.node(parent)?;
        if parent_node.kind.arity() == Arity::None {
            return Err(StructuralError::LeafCannotHaveChildren(parent));
        }
        if !parent_node.can_connect_child() {
            return Err(StructuralError::TooManyChildren { parent, child });
        }
        if parent == child || self.ancestors(parent).contains(&child) {
            return Err(StructuralError::WouldCycle { parent, child });
        }

        self.node_mut(parent)?.children.push(child);
        self.set_parent(child, Some(parent))
    }

    /// Connects and then re-sorts the parent's children.
    pub fn connect(&mut self, parent: NodeId, child: NodeId) -> StructuralResult {
        self.connect_child(parent, child)?;
        self.sort_children(parent)
    }

    pub fn disconnect_child(&mut self, parent: NodeId, child: NodeId) -> StructuralResult {
        let parent_node = self.node_mut(parent)?;
        let Some(index) = parent_node.children.iter().position(|id| *id == child) else {
            return Err(StructuralError::NotAChild { parent, child });
        };
        parent_node.children.remove(index);
        self.set_parent(child, None)
    }

    /// The single place a parent link changes. The parent's child list must
    /// already agree with the new link.
    fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> StructuralResult {
        if child == self.root {
            return Err(StructuralError::RootCannotHaveParent);
        }
        match parent {
            Some(parent) => {
                if !self.node(parent)?.contains_child(child) {
                    return Err(StructuralError::ParentDoesNotContain { parent, child });
                }
            }
            None => {
                if let Some(old) = self.node(child)?.parent {
                    if self.node(old)?.contains_child(child) {
                        return Err(StructuralError::ParentStillContains { parent: old, child });
                    }
                }
            }
        }
        self.node_mut(child)?.parent = parent;
        Ok(())
    }

    /// Detaches a node from its parent.
    pub fn unparent(&mut self, id: NodeId) -> StructuralResult {
        if id == self.root {
            return Err(StructuralError::RootCannotHaveParent);
        }
        match self.node(id)?.parent {
            Some(parent) => self.disconnect_child(parent, id),
            None => {
                warn!(node = %id, "Attempted unparenting a node without a parent");
                Ok(())
            }
        }
    }

    /// Detaches a node from its parent and from all of its children.
    pub fn disconnect(&mut self, id: NodeId) -> StructuralResult {
        if id != self.root && self.node(id)?.parent.is_some() {
            self.unparent(id)?;
        }
        let children = self.node(id)?.children.clone();
        for child in children.into_iter().rev() {
            self.disconnect_child(id, child)?;
        }
        Ok(())
    }

    /// Removes a node from the tree. Its children stay as unparented nodes.
    pub fn delete(&mut self, id: NodeId) -> StructuralResult {
        if id == self.root {
            return Err(StructuralError::RootCannotBeDeleted);
        }
        self.disconnect(id)?;
        self.nodes.remove(&id);
        self.order.retain(|node| *node != id);
        self.records.remove(&id);
        self.dispatcher.invalidate(id);
        if self.current_node == Some(id) {
            self.current_node = None;
        }
        Ok(())
    }

    /// Moves a node and keeps its parent's children in left-to-right order.
    pub fn set_position(&mut self, id: NodeId, position: Position) -> StructuralResult {
        let node = self.node_mut(id)?;
        node.position = position;
        let parent = node.parent;
        match parent {
            Some(parent) => self.sort_children(parent),
            None => Ok(()),
        }
    }

    /// Stably orders a composite's children by ascending x. Other kinds have
    /// at most one child and are left alone.
    pub fn sort_children(&mut self, id: NodeId) -> StructuralResult {
        let node = self.node_mut(id)?;
        if !node.kind.is_composite() {
            return Ok(());
        }
        let mut children = std::mem::take(&mut node.children);
        let nodes = &self.nodes;
        let x = |child: &NodeId| nodes.get(child).map_or(0., |node| node.position.x);
        children.sort_by(|lhs, rhs| x(lhs).total_cmp(&x(rhs)));
        self.node_mut(id)?.children = children;
        Ok(())
    }

    // Node configuration ----------------------------------------------------

    pub fn set_remember_running(&mut self, id: NodeId, remember: bool) -> StructuralResult {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Sequence(node) => node.remember_running = remember,
            NodeKind::Selector(node) => node.remember_running = remember,
            _ => {
                return Err(StructuralError::WrongKind {
                    node: id,
                    expected: "Sequence or Selector",
                })
            }
        }
        Ok(())
    }

    pub fn set_strategy(&mut self, id: NodeId, strategy: ResolutionStrategy) -> StructuralResult {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Parallel(node) => node.strategy = strategy,
            _ => {
                return Err(StructuralError::WrongKind {
                    node: id,
                    expected: "Parallel",
                })
            }
        }
        Ok(())
    }

    pub fn set_repetitions(&mut self, id: NodeId, repetitions: u32) -> StructuralResult {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Repeater(node) => node.repetitions = repetitions,
            _ => {
                return Err(StructuralError::WrongKind {
                    node: id,
                    expected: "Repeater",
                })
            }
        }
        Ok(())
    }

    // Action bindings -------------------------------------------------------

    pub fn action(&self, id: NodeId) -> StructuralResult<&Action> {
        self.node(id)?
            .kind
            .as_action()
            .ok_or(StructuralError::WrongKind {
                node: id,
                expected: "Action",
            })
    }

    fn action_mut(&mut self, id: NodeId) -> StructuralResult<&mut Action> {
        self.node_mut(id)?
            .kind
            .as_action_mut()
            .ok_or(StructuralError::WrongKind {
                node: id,
                expected: "Action",
            })
    }

    /// Binds an action node to a library. Switching libraries unbinds the
    /// method. Returns whether the binding changed.
    ///
    /// Without a `path`, the node records the path the library was
    /// registered with, if any.
    pub fn set_action_library(
        &mut self,
        id: NodeId,
        library: Option<&str>,
        path: Option<&str>,
    ) -> StructuralResult<bool> {
        let registry = self.dispatcher.registry().clone();
        let path = path
            .or_else(|| library.and_then(|library| registry.library_path(library)))
            .map(str::to_owned);
        let changed = self
            .action_mut(id)?
            .set_library(library.map(str::to_owned), path);
        if changed {
            self.dispatcher.invalidate(id);
        }
        Ok(changed)
    }

    /// Binds an action node to a method of its library. A different method
    /// regenerates the parameters from the registered signature.
    pub fn set_action_method(&mut self, id: NodeId, method: Option<&str>) -> StructuralResult<bool> {
        let registry = self.dispatcher.registry().clone();
        let action = self.action_mut(id)?;
        let library = action.library().map(str::to_owned);
        let signature = library
            .as_deref()
            .zip(method)
            .and_then(|(library, method)| registry.method_spec(library, method));
        let changed = action.set_method(method.map(str::to_owned), signature);
        if changed {
            self.dispatcher.invalidate(id);
        }
        Ok(changed)
    }

    pub fn set_action_parameter(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<(), ParameterError> {
        self.action_mut(id)?.set_parameter(name, value.into())
    }

    /// Checks every reachable action against the registry, reporting the
    /// ones that would tick to `Status::Error`.
    pub fn validate(&self) -> Vec<(NodeId, BindingError)> {
        let registry = self.dispatcher.registry();
        self.reachable()
            .into_iter()
            .filter_map(|id| {
                let action = self.nodes.get(&id)?.kind.as_action()?;
                let res = match (action.library(), action.method()) {
                    (Some(library), Some(method)) => registry
                        .resolve(library, method)
                        .and_then(|handle| action.check_signature(handle.spec())),
                    _ => Err(BindingError::Unbound),
                };
                res.err().map(|err| (id, err))
            })
            .collect()
    }
}

/// Two trees are equal when they hold the same nodes under the same root,
/// regardless of insertion order or runtime state.
impl<A> PartialEq for Tree<A> {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.nodes == other.nodes
    }
}

impl<A> std::fmt::Debug for Tree<A> {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct("Tree")
            .field("root", &self.root)
            .field("nodes", &self.order.len())
            .field("total_ticks", &self.total_ticks)
            .finish()
    }
}

/// Borrows the parts of a tree a tick needs, so node kinds can recurse
/// through [`Ticker`] while the arena stays mutable.
struct Runner<'t, A> {
    nodes: &'t mut HashMap<NodeId, Node>,
    dispatcher: &'t mut Dispatcher<A>,
    records: &'t mut HashMap<NodeId, TickRecord>,
    hooks: &'t mut Hooks,
    current_node: &'t mut Option<NodeId>,
    rng: &'t mut StdRng,
    tick: u64,
    record_status: bool,
    agent: &'t mut A,
    ctx: &'t mut Context,
}

impl<'t, A> Runner<'t, A> {
    fn tick_node(&mut self, id: NodeId) -> Status {
        // Taken out of the arena for the duration of its own tick; the tick
        // never edits topology, so it goes back unchanged apart from its state.
        let Some(mut node) = self.nodes.remove(&id) else {
            return Status::Error;
        };
        let status = node.kind.tick(id, &node.children, self);
        self.nodes.insert(id, node);
        status
    }
}

impl<'t, A> Ticker for Runner<'t, A> {
    fn tick_child(&mut self, child: NodeId) -> Status {
        if *self.current_node != Some(child) {
            if let (Some(hook), Some(node)) = (self.hooks.will_tick.as_mut(), self.nodes.get(&child)) {
                hook(node);
            }
        }

        let status = self.tick_node(child);

        if let (Some(hook), Some(node)) = (self.hooks.did_tick.as_mut(), self.nodes.get(&child)) {
            hook(node, status);
        }
        *self.current_node = Some(child);
        if self.record_status {
            self.records.insert(
                child,
                TickRecord {
                    status,
                    tick: self.tick,
                },
            );
        }
        status
    }

    fn dispatch(&mut self, node: NodeId, action: &Action) -> Status {
        self.dispatcher
            .dispatch(node, action, &mut *self.agent, &mut *self.ctx)
    }

    fn rng(&mut self) -> &mut dyn RngCore {
        &mut *self.rng
    }
}

#[cfg(test)]
mod test;
