use crate::{error::SaveError, Node, NodeId, NodeKind, Tree};
use serde::{Deserialize, Serialize};

pub(super) const ROOT_TAG: &str = "root";

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct Document {
    pub root: NodeElement,
    #[serde(default)]
    pub unparented: Vec<NodeElement>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct NodeElement {
    pub kind: String,
    pub id: NodeId,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remember_running: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetitions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeElement>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ParamElement {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub value: String,
}

/// Document tag of a node kind: its name in lower case.
pub(super) fn kind_tag(kind: &NodeKind) -> String {
    kind.name().to_ascii_lowercase()
}

fn element<A>(tree: &Tree<A>, node: &Node) -> NodeElement {
    let mut ret = NodeElement {
        kind: kind_tag(node.kind()),
        id: node.id(),
        x: node.position().x,
        y: node.position().y,
        remember_running: None,
        strategy: None,
        repetitions: None,
        library: None,
        library_path: None,
        method: None,
        params: vec![],
        children: node
            .children()
            .iter()
            .filter_map(|child| tree.get(*child))
            .map(|child| element(tree, child))
            .collect(),
    };

    match node.kind() {
        NodeKind::Sequence(seq) => ret.remember_running = Some(seq.remember_running),
        NodeKind::Selector(sel) => ret.remember_running = Some(sel.remember_running),
        NodeKind::Parallel(par) => ret.strategy = Some(par.strategy.name().to_owned()),
        NodeKind::Repeater(rep) => ret.repetitions = Some(rep.repetitions),
        NodeKind::Action(action) => {
            ret.library = action.library().map(str::to_owned);
            ret.library_path = action.library_path().map(str::to_owned);
            ret.method = action.method().map(str::to_owned);
            ret.params = action
                .parameters()
                .iter()
                .map(|param| ParamElement {
                    name: param.name.clone(),
                    ty: param.ty.name().to_owned(),
                    value: param.value.to_string(),
                })
                .collect();
        }
        _ => {}
    }
    ret
}

/// Writes the tree as a YAML document: the root's subtree followed by every
/// unparented subtree.
pub fn serialize<A>(tree: &Tree<A>) -> Result<String, SaveError> {
    let doc = Document {
        root: element(tree, tree.root_node()),
        unparented: tree
            .unparented()
            .map(|node| element(tree, node))
            .collect(),
    };
    Ok(serde_yaml::to_string(&doc)?)
}
