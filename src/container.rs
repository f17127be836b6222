use crate::{nodes::NodeKind, NodeId, Position};

/// A node as stored in a tree: its identity, editor placement, links and kind.
///
/// Links are ids into the owning tree. They are only changed through the
/// tree's edit operations, which keep a node's `parent` and the parent's
/// `children` in agreement.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) position: Position,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, position: Position) -> Self {
        Self::with_id(NodeId::new(), kind, position)
    }

    pub(crate) fn with_id(id: NodeId, kind: NodeKind, position: Position) -> Self {
        Self {
            id,
            position,
            parent: None,
            children: vec![],
            kind,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn contains_child(&self, child: NodeId) -> bool {
        self.children.contains(&child)
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root)
    }

    /// Whether one more child could be connected.
    pub fn can_connect_child(&self) -> bool {
        self.kind.arity().allows(self.children.len() + 1)
    }
}
