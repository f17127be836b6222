use super::yaml_parser::{Document, NodeElement, ROOT_TAG};
use crate::{
    container::Node,
    error::{BindingError, LoadError, ParameterError, StructuralError, ValueError},
    nodes::ResolutionStrategy,
    Action, ActionParameter, ActionRegistry, NodeId, NodeKind, ParamType, Position, Tree,
    TreeConfig, NODE_KIND_NAMES,
};
use serde::Deserialize;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Reject action nodes whose library or method the registry does not
    /// know, or which carry parameters the method does not declare. When
    /// unset, bindings are loaded verbatim.
    pub check_bindings: bool,
    /// Configuration of the loaded tree.
    pub tree: TreeConfig,
}

/// Reads a tree from a YAML document written by [`serialize`](super::serialize).
pub fn deserialize<A: 'static>(
    text: &str,
    registry: Rc<ActionRegistry<A>>,
    options: &LoadOptions,
) -> Result<Tree<A>, LoadError> {
    let doc: Document = serde_yaml::from_str(text)?;
    if !doc.root.kind.eq_ignore_ascii_case(ROOT_TAG) {
        return Err(LoadError::MissingRoot);
    }

    let root = Node::with_id(
        doc.root.id,
        NodeKind::Root,
        Position::new(doc.root.x, doc.root.y),
    );
    let mut tree = Tree::with_root(registry, options.tree.clone(), root);

    for child in &doc.root.children {
        let child = load_element(&mut tree, child, options)?;
        tree.connect_child(doc.root.id, child)?;
    }
    for elem in &doc.unparented {
        load_element(&mut tree, elem, options)?;
    }

    debug!(nodes = tree.len(), "Loaded behavior tree");
    Ok(tree)
}

fn load_element<A: 'static>(
    tree: &mut Tree<A>,
    elem: &NodeElement,
    options: &LoadOptions,
) -> Result<NodeId, LoadError> {
    let kind = build_kind(tree.registry(), elem, options)?;
    tree.insert_node(Node::with_id(elem.id, kind, Position::new(elem.x, elem.y)))?;
    for child in &elem.children {
        let child = load_element(tree, child, options)?;
        tree.connect_child(elem.id, child)?;
    }
    Ok(elem.id)
}

fn build_kind<A>(
    registry: &ActionRegistry<A>,
    elem: &NodeElement,
    options: &LoadOptions,
) -> Result<NodeKind, LoadError> {
    if elem.kind.eq_ignore_ascii_case(ROOT_TAG) {
        return Err(StructuralError::DuplicateRoot.into());
    }
    let mut kind = NODE_KIND_NAMES
        .iter()
        .find(|name| name.eq_ignore_ascii_case(&elem.kind))
        .and_then(|name| NodeKind::from_name(name))
        .ok_or_else(|| LoadError::UnsupportedNodeKind(elem.kind.clone()))?;

    match &mut kind {
        NodeKind::Sequence(seq) => seq.remember_running = elem.remember_running.unwrap_or(false),
        NodeKind::Selector(sel) => sel.remember_running = elem.remember_running.unwrap_or(false),
        NodeKind::Parallel(par) => {
            if let Some(name) = &elem.strategy {
                par.strategy = ResolutionStrategy::from_name(name)
                    .ok_or_else(|| LoadError::UnsupportedStrategy(name.clone()))?;
            }
        }
        NodeKind::Repeater(rep) => rep.repetitions = elem.repetitions.unwrap_or(0),
        NodeKind::Action(action) => load_action(registry, elem, action, options)?,
        _ => {}
    }
    Ok(kind)
}

fn load_action<A>(
    registry: &ActionRegistry<A>,
    elem: &NodeElement,
    action: &mut Action,
    options: &LoadOptions,
) -> Result<(), LoadError> {
    let node = elem.id;
    let value_error = |error| LoadError::Value { node, error };
    let binding_error = |error| LoadError::Binding { node, error };

    let params = elem
        .params
        .iter()
        .map(|param| -> Result<_, ValueError> {
            let ty = ParamType::from_name(&param.ty)
                .ok_or_else(|| ValueError::UnknownType(param.ty.clone()))?;
            Ok(ActionParameter {
                name: param.name.clone(),
                ty,
                value: ty.parse(&param.value)?,
            })
        })
        .collect::<Result<Vec<_>, ValueError>>()
        .map_err(value_error)?;

    action.set_library(elem.library.clone(), elem.library_path.clone());
    let binding = elem.library.as_deref().zip(elem.method.as_deref());
    let signature = binding.and_then(|(library, method)| registry.method_spec(library, method));
    // Derives the declared inputs and outputs, plus default parameters
    action.set_method(elem.method.clone(), signature);

    match binding {
        Some((library, method)) if options.check_bindings => {
            registry.resolve(library, method).map_err(binding_error)?;
            for param in params {
                action
                    .set_parameter(&param.name, param.value)
                    .map_err(|err| match err {
                        ParameterError::UnknownParameter(param) => {
                            binding_error(BindingError::UnknownParameter {
                                method: method.to_owned(),
                                param,
                            })
                        }
                        ParameterError::Value(error) => value_error(error),
                        ParameterError::Structural(err) => LoadError::Structural(err),
                    })?;
            }
        }
        _ => action.set_parameters(params),
    }
    Ok(())
}
