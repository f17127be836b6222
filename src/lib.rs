//! # behavior-tree-graph (Rust crate)
//!
//! A behavior tree runtime with an editable node graph, action libraries bound by name and a
//! YAML document format.
//!
//!
//! ## Overview
//!
//! A behavior tree is an extension to finite state machines that makes describing transitional behavior easier.
//! Every tick, the tree is walked from its root; composite nodes decide which children to visit
//! and leaves report one of four [`Status`]es back up.
//!
//! Unlike a tree built out of nested boxes, a [`Tree`] here is an arena of nodes addressed by
//! [`NodeId`]. That makes it easy to edit while it is not ticking: nodes can be added, moved,
//! reconnected and kept around unparented, the way a visual editor works with them.
//! Only the nodes reachable from the root are ticked.
//!
//!
//! ## How it looks like
//!
//! First, you define the agent that the tree drives and a library of actions on it.
//!
//! ```rust
//! # use behavior_tree_graph::*;
//! struct Agent {
//!     hunger: i32,
//! }
//!
//! struct Eating;
//!
//! impl ActionLibrary<Agent> for Eating {}
//! ```
//!
//! Then register the library and its methods with an [`ActionRegistry`].
//! Each method declares its literal parameters, which action nodes fill in at edit time.
//!
//! ```rust
//! # use behavior_tree_graph::*;
//! # struct Agent { hunger: i32 }
//! # struct Eating;
//! # impl ActionLibrary<Agent> for Eating {}
//! let mut registry = ActionRegistry::<Agent>::default();
//! registry
//!     .register("Eating", || Eating)
//!     .action("Eat", &[("amount", ParamType::Int)], |_, agent, _, args| {
//!         agent.hunger -= args.get::<i32>(0).unwrap_or(0);
//!         if agent.hunger <= 0 {
//!             Status::Success
//!         } else {
//!             Status::Running
//!         }
//!     });
//! ```
//!
//! Then, you build a tree and bind an action node to the method.
//!
//! ```rust
//! # use behavior_tree_graph::*;
//! # use std::rc::Rc;
//! # struct Agent { hunger: i32 }
//! # struct Eating;
//! # impl ActionLibrary<Agent> for Eating {}
//! # let mut registry = ActionRegistry::<Agent>::default();
//! # registry.register("Eating", || Eating).action("Eat", &[("amount", ParamType::Int)], |_, agent, _, args| {
//! #     agent.hunger -= args.get::<i32>(0).unwrap_or(0);
//! #     if agent.hunger <= 0 { Status::Success } else { Status::Running }
//! # });
//! let registry = Rc::new(registry);
//! let mut tree = Tree::new(registry.clone());
//!
//! let eat = tree.add(NodeKind::Action(Action::default()), Some(tree.root()), Position::default())?;
//! tree.set_action_library(eat, Some("Eating"), None)?;
//! tree.set_action_method(eat, Some("Eat"))?;
//! tree.set_action_parameter(eat, "amount", 2i64)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! and call `tick()` with the agent and its [`Context`].
//!
//! ```rust
//! # use behavior_tree_graph::*;
//! # use std::rc::Rc;
//! # struct Agent { hunger: i32 }
//! # struct Eating;
//! # impl ActionLibrary<Agent> for Eating {}
//! # let mut registry = ActionRegistry::<Agent>::default();
//! # registry.register("Eating", || Eating).action("Eat", &[("amount", ParamType::Int)], |_, agent, _, args| {
//! #     agent.hunger -= args.get::<i32>(0).unwrap_or(0);
//! #     if agent.hunger <= 0 { Status::Success } else { Status::Running }
//! # });
//! # let mut tree = Tree::new(Rc::new(registry));
//! # let eat = tree.add(NodeKind::Action(Action::default()), Some(tree.root()), Position::default())?;
//! # tree.set_action_library(eat, Some("Eating"), None)?;
//! # tree.set_action_method(eat, Some("Eat"))?;
//! # tree.set_action_parameter(eat, "amount", 2i64)?;
//! let mut agent = Agent { hunger: 3 };
//! let mut ctx = Context::default();
//! assert_eq!(tree.tick(&mut agent, &mut ctx), Status::Running);
//! assert_eq!(tree.tick(&mut agent, &mut ctx), Status::Success);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The agent is borrowed only for the duration of the tick, so it does not need to be `'static`
//! and the tree does not hold on to it.
//! State that has to survive between ticks, like progress of a `Running` action, belongs in the
//! [`Context`] or in the library instance.
//!
//!
//! ## Action libraries
//!
//! A tree creates one instance of each library the first time one of its action nodes uses it.
//! All action nodes of the same tree bound to that library share the instance, and
//! [`ActionLibrary::start`] runs once right after it is created.
//! Two trees never share instances, even when they run against the same registry.
//!
//! An action node that names a library or method the registry does not know, or whose parameters
//! do not match the method's signature, ticks to [`Status::Error`] and logs a warning.
//! [`Tree::validate`] lists such nodes up front.
//!
//! The registry starts with a `Blackboard` library of helpers (`SetBool`, `IsTrue`, `Unset` and
//! `WaitTicks`). Use [`ActionRegistry::empty`] to start without it.
//!
//!
//! ## Node kinds
//!
//! * `Sequence` ticks its children in order until one does not succeed.
//! * `Selector` ticks its children in order until one does not fail.
//!   Both optionally remember a running child and resume there on the next tick.
//! * `RandomSelector` is a selector over a shuffled order of its children.
//! * `Parallel` ticks every child each tick and folds the results by a [`ResolutionStrategy`].
//! * `Repeater` reruns its child a number of times, or forever with zero repetitions.
//! * `UntilSucceed` reports `Running` until its child succeeds.
//! * `Inverter` swaps success and failure.
//! * `Succeeder` reports success whatever its child reports.
//! * `Action` calls an action library method.
//!
//! Children of composite nodes are kept in left-to-right order of their editor position.
//!
//!
//! ## Documents
//!
//! [`serialize`] writes a tree to YAML: the root with its subtree, then every unparented node
//! with its own subtree.
//!
//! ```yaml
//! root:
//!   kind: root
//!   id: 0b5b0d5e-4f5c-4b43-9a8e-2f3a1c7d9e11
//!   x: 0.0
//!   y: 0.0
//!   children:
//!     - kind: sequence
//!       id: 6f1c2f0a-9b1e-4c59-8e3d-1f7a0c4b2d33
//!       x: 0.0
//!       y: 120.0
//!       remember_running: true
//!       children:
//!         - kind: action
//!           id: 2d7e4a61-3c0b-4f8e-b1a9-5e6d7c8f9a00
//!           x: 0.0
//!           y: 240.0
//!           library: Eating
//!           method: Eat
//!           params:
//!             - name: amount
//!               type: int
//!               value: "2"
//! unparented: []
//! ```
//!
//! [`deserialize`] reads it back into an equal tree, checking the action bindings against a
//! registry when [`LoadOptions::check_bindings`] is set.

mod builtin;
mod container;
mod context;
mod dispatch;
pub mod error;
mod nodes;
mod param;
pub mod parser;
mod port;
mod registry;
mod symbol;
mod tree;

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use uuid::Uuid;

pub use crate::builtin::{BlackboardActions, BLACKBOARD_LIBRARY};
pub use crate::container::Node;
pub use crate::context::Context;
pub use crate::nodes::{
    Action, Arity, NodeKind, Parallel, RandomSelector, Repeater, ResolutionStrategy, Selector,
    Sequence, UntilSucceed, NODE_KIND_NAMES,
};
pub use crate::symbol::Symbol;
pub use crate::{
    param::{ActionParameter, Args, FromValue, ParamSpec, ParamType, Value},
    parser::{deserialize, serialize, LoadOptions},
    port::{PortSpec, PortType},
    registry::{ActionLibrary, ActionMethod, ActionRegistry, LibraryBuilder, MethodSpec},
    tree::{TickRecord, Tree, TreeConfig, GRID_STEP},
};

#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum Status {
    Success,
    Failure,
    /// The node should be ticked again in the next tick
    Running,
    /// The node could not do its job at all, e.g. an unbound action
    Error,
}

impl Display for Status {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        let s = match self {
            Self::Success => "Success",
            Self::Failure => "Failure",
            Self::Running => "Running",
            Self::Error => "Error",
        };
        fmt.write_str(s)
    }
}

/// The identity of a node, stable across save and load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for NodeId {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        self.0.fmt(fmt)
    }
}

/// Where a node sits in the editor. Only `x` has a meaning to the runtime: it orders siblings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Rounds toward zero to a multiple of `step` on each axis.
    pub fn snapped(self, step: Position) -> Self {
        Self::new(self.x - self.x % step.x, self.y - self.y % step.y)
    }
}

/// Blackboard is a mapping of a variable names and their values.
/// The value is wrapped in an `Any` trait object, so it can be any type.
///
/// Values are owned by the blackboard. Nothing copies them between scopes, so unlike a
/// subtree-passing design there is no need for shared ownership.
pub type Blackboard = HashMap<Symbol, Box<dyn Any>>;
