use super::*;
use crate::{BLACKBOARD_LIBRARY, Selector, Sequence};
use std::{cell::RefCell, rc::Rc};

fn tree() -> Tree {
    Tree::new(Rc::new(ActionRegistry::default()))
}

fn blackboard_action(
    tree: &mut Tree,
    parent: Option<NodeId>,
    method: &str,
    params: &[(&str, Value)],
) -> NodeId {
    let id = tree
        .add(NodeKind::Action(Action::default()), parent, Position::default())
        .unwrap();
    tree.set_action_library(id, Some(BLACKBOARD_LIBRARY), None)
        .unwrap();
    tree.set_action_method(id, Some(method)).unwrap();
    for (name, value) in params {
        tree.set_action_parameter(id, name, value.clone()).unwrap();
    }
    id
}

fn sequence() -> NodeKind {
    NodeKind::Sequence(Sequence::default())
}

#[test]
fn test_new_tree() {
    let tree = tree();
    assert_eq!(tree.len(), 1);
    assert!(tree.root_node().is_root());
    assert_eq!(tree.root_node().id(), tree.root());
    assert_eq!(tree.unparented().count(), 0);
    assert_eq!(tree.reachable(), vec![tree.root()]);
}

#[test]
fn test_root_has_single_child() {
    let mut tree = tree();
    let root = tree.root();
    let a = tree.add_node(sequence(), Position::default()).unwrap();
    let b = tree.add_node(sequence(), Position::default()).unwrap();
    tree.connect_child(root, a).unwrap();
    assert_eq!(
        tree.connect_child(root, b),
        Err(StructuralError::TooManyChildren {
            parent: root,
            child: b
        })
    );
    assert_eq!(tree.node(root).unwrap().children(), &[a]);
    assert_eq!(tree.node(b).unwrap().parent(), None);
}

#[test]
fn test_root_is_fixed() {
    let mut tree = tree();
    let root = tree.root();
    let seq = tree.add_node(sequence(), Position::default()).unwrap();
    assert_eq!(
        tree.connect_child(seq, root),
        Err(StructuralError::RootCannotHaveParent)
    );
    assert_eq!(tree.unparent(root), Err(StructuralError::RootCannotHaveParent));
    assert_eq!(tree.delete(root), Err(StructuralError::RootCannotBeDeleted));
    assert_eq!(
        tree.add_node(NodeKind::Root, Position::default()),
        Err(StructuralError::DuplicateRoot)
    );
}

#[test]
fn test_connect_errors() {
    let mut tree = tree();
    let a = tree.add_node(sequence(), Position::default()).unwrap();
    let b = tree.add_node(sequence(), Position::default()).unwrap();
    let c = tree.add_node(sequence(), Position::default()).unwrap();
    let leaf = tree
        .add_node(NodeKind::Action(Action::default()), Position::default())
        .unwrap();

    tree.connect_child(a, b).unwrap();
    tree.connect_child(b, c).unwrap();

    assert_eq!(
        tree.connect_child(c, b),
        Err(StructuralError::AlreadyParented { child: b, parent: a })
    );
    assert_eq!(
        tree.connect_child(c, a),
        Err(StructuralError::WouldCycle { parent: c, child: a })
    );
    assert_eq!(
        tree.connect_child(a, a),
        Err(StructuralError::WouldCycle { parent: a, child: a })
    );
    assert_eq!(
        tree.connect_child(leaf, a),
        Err(StructuralError::LeafCannotHaveChildren(leaf))
    );
    assert_eq!(
        tree.disconnect_child(a, c),
        Err(StructuralError::NotAChild { parent: a, child: c })
    );
    let missing = NodeId::new();
    assert_eq!(
        tree.connect_child(a, missing),
        Err(StructuralError::NodeNotFound(missing))
    );
    assert_eq!(tree.ancestors(c), vec![b, a]);
}

#[test]
fn test_links_agree() {
    let mut tree = tree();
    let root = tree.root();
    let seq = tree.add(sequence(), Some(root), Position::default()).unwrap();
    let child = tree.add(NodeKind::Succeeder, Some(seq), Position::default()).unwrap();
    assert!(tree.node(seq).unwrap().contains_child(child));
    assert_eq!(tree.node(child).unwrap().parent(), Some(seq));

    tree.unparent(child).unwrap();
    assert!(!tree.node(seq).unwrap().contains_child(child));
    assert_eq!(tree.node(child).unwrap().parent(), None);
    assert_eq!(
        tree.unparented().map(Node::id).collect::<Vec<_>>(),
        vec![child]
    );

    // Unparenting an orphan is only a warning
    assert_eq!(tree.unparent(child), Ok(()));
}

#[test]
fn test_add_layout() {
    let mut tree = tree();
    let root = tree.root();
    let seq = tree.add(sequence(), Some(root), Position::new(999., 999.)).unwrap();
    assert_eq!(tree.node(seq).unwrap().position(), Position::new(0., 120.));

    let a = tree.add(NodeKind::Inverter, Some(seq), Position::default()).unwrap();
    let b = tree.add(NodeKind::Succeeder, Some(seq), Position::default()).unwrap();
    assert_eq!(tree.node(a).unwrap().position(), Position::new(0., 240.));
    assert_eq!(tree.node(b).unwrap().position(), Position::new(120., 240.));
    assert_eq!(tree.node(seq).unwrap().children(), &[a, b]);

    // The root is full, so the node lands unparented on the grid
    let orphan = tree.add(sequence(), Some(root), Position::new(30., 50.)).unwrap();
    assert_eq!(tree.node(orphan).unwrap().parent(), None);
    assert_eq!(tree.node(orphan).unwrap().position(), Position::new(24., 48.));
}

#[test]
fn test_children_sorted_by_x() {
    let mut tree = tree();
    let seq = tree.add_node(sequence(), Position::default()).unwrap();
    let a = tree.add_node(NodeKind::Succeeder, Position::new(300., 0.)).unwrap();
    let b = tree.add_node(NodeKind::Succeeder, Position::new(100., 0.)).unwrap();
    let c = tree.add_node(NodeKind::Succeeder, Position::new(200., 0.)).unwrap();
    for child in [a, b, c] {
        tree.connect(seq, child).unwrap();
    }
    assert_eq!(tree.node(seq).unwrap().children(), &[b, c, a]);

    tree.set_position(a, Position::new(0., 0.)).unwrap();
    assert_eq!(tree.node(seq).unwrap().children(), &[a, b, c]);

    // Plain connect_child keeps insertion order
    let d = tree.add_node(NodeKind::Succeeder, Position::new(-50., 0.)).unwrap();
    tree.connect_child(seq, d).unwrap();
    assert_eq!(tree.node(seq).unwrap().children(), &[a, b, c, d]);
}

#[test]
fn test_delete() {
    let mut tree = tree();
    let root = tree.root();
    let seq = tree.add(sequence(), Some(root), Position::default()).unwrap();
    let a = tree.add(NodeKind::Succeeder, Some(seq), Position::default()).unwrap();
    let b = tree.add(NodeKind::Inverter, Some(seq), Position::default()).unwrap();

    tree.delete(seq).unwrap();
    assert!(!tree.contains(seq));
    assert!(tree.get(seq).is_none());
    assert!(tree.node(root).unwrap().children().is_empty());
    assert_eq!(tree.node(a).unwrap().parent(), None);
    assert_eq!(tree.node(b).unwrap().parent(), None);
    assert_eq!(
        tree.unparented().map(Node::id).collect::<Vec<_>>(),
        vec![a, b]
    );
    assert_eq!(tree.delete(seq), Err(StructuralError::NodeNotFound(seq)));
}

#[test]
fn test_disconnect() {
    let mut tree = tree();
    let root = tree.root();
    let seq = tree.add(sequence(), Some(root), Position::default()).unwrap();
    let a = tree.add(NodeKind::Succeeder, Some(seq), Position::default()).unwrap();
    tree.disconnect(seq).unwrap();
    assert!(tree.contains(seq));
    assert_eq!(tree.node(seq).unwrap().parent(), None);
    assert!(tree.node(seq).unwrap().children().is_empty());
    assert_eq!(tree.node(a).unwrap().parent(), None);
}

#[test]
fn test_kind_setters() {
    let mut tree = tree();
    let seq = tree.add_node(sequence(), Position::default()).unwrap();
    let sel = tree
        .add_node(NodeKind::Selector(Selector::default()), Position::default())
        .unwrap();
    tree.set_remember_running(seq, true).unwrap();
    tree.set_remember_running(sel, true).unwrap();
    assert_eq!(
        tree.node(seq).unwrap().kind(),
        &NodeKind::Sequence(Sequence::new(true))
    );
    assert!(matches!(
        tree.set_strategy(seq, ResolutionStrategy::AllResolved),
        Err(StructuralError::WrongKind { .. })
    ));
    assert!(matches!(
        tree.set_repetitions(seq, 3),
        Err(StructuralError::WrongKind { .. })
    ));
    assert!(matches!(
        tree.set_action_method(seq, Some("IsTrue")),
        Err(StructuralError::WrongKind { .. })
    ));
}

#[test]
fn test_action_binding() {
    let mut tree = tree();
    let id = blackboard_action(&mut tree, None, "SetBool", &[("key", "flag".into())]);
    let action = tree.action(id).unwrap();
    assert_eq!(action.library(), Some(BLACKBOARD_LIBRARY));
    assert_eq!(action.parameters().len(), 2);
    assert_eq!(action.parameters()[1].value, Value::Bool(false));

    assert!(matches!(
        tree.set_action_parameter(id, "value", 1i64),
        Err(ParameterError::Value(_))
    ));
    assert!(matches!(
        tree.set_action_parameter(id, "missing", true),
        Err(ParameterError::UnknownParameter(_))
    ));

    // Rebinding the same method changes nothing
    assert_eq!(tree.set_action_method(id, Some("SetBool")), Ok(false));
    assert_eq!(tree.set_action_method(id, Some("IsTrue")), Ok(true));
    assert_eq!(tree.action(id).unwrap().parameters().len(), 1);
}

#[test]
fn test_validate() {
    let mut tree = tree();
    let root = tree.root();
    let seq = tree.add(sequence(), Some(root), Position::default()).unwrap();
    let unbound = tree
        .add(NodeKind::Action(Action::default()), Some(seq), Position::default())
        .unwrap();
    let missing = tree
        .add(NodeKind::Action(Action::default()), Some(seq), Position::default())
        .unwrap();
    tree.set_action_library(missing, Some("Nowhere"), None).unwrap();
    tree.set_action_method(missing, Some("Nothing")).unwrap();
    blackboard_action(&mut tree, Some(seq), "Unset", &[("key", "a".into())]);
    // Unreachable actions are not reported
    tree.add_node(NodeKind::Action(Action::default()), Position::default())
        .unwrap();

    let problems = tree.validate();
    assert_eq!(problems.len(), 2);
    assert_eq!(problems[0], (unbound, BindingError::Unbound));
    assert_eq!(
        problems[1],
        (missing, BindingError::MissingLibrary("Nowhere".to_owned()))
    );
}

#[test]
fn test_tick_blackboard() {
    let mut tree = tree();
    let root = tree.root();
    let seq = tree.add(sequence(), Some(root), Position::default()).unwrap();
    blackboard_action(
        &mut tree,
        Some(seq),
        "SetBool",
        &[("key", "flag".into()), ("value", true.into())],
    );
    let check = blackboard_action(&mut tree, Some(seq), "IsTrue", &[("key", "flag".into())]);

    let mut ctx = Context::default();
    assert_eq!(tree.tick(&mut (), &mut ctx), Status::Success);
    assert_eq!(ctx.get::<bool>("flag"), Ok(&true));
    assert_eq!(tree.current_node(), Some(seq));
    assert_eq!(
        tree.last_status(check),
        Some(TickRecord {
            status: Status::Success,
            tick: 1
        })
    );
    assert_eq!(tree.last_status(root).map(|rec| rec.status), Some(Status::Success));
}

#[test]
fn test_tick_empty_root() {
    let mut tree = tree();
    assert_eq!(tree.tick(&mut (), &mut Context::default()), Status::Error);
    assert_eq!(tree.total_ticks(), 1);
}

#[test]
fn test_wait_ticks() {
    let mut tree = tree();
    let root = tree.root();
    let wait = blackboard_action(
        &mut tree,
        Some(root),
        "WaitTicks",
        &[("ticks", 2i64.into()), ("counter", "waited".into())],
    );

    let mut ctx = Context::default();
    assert_eq!(tree.tick(&mut (), &mut ctx), Status::Running);
    assert_eq!(tree.tick(&mut (), &mut ctx), Status::Running);
    assert_eq!(tree.tick(&mut (), &mut ctx), Status::Success);
    assert!(!ctx.contains_key("waited"));
    assert_eq!(tree.total_ticks(), 3);
    assert_eq!(tree.last_status(wait).map(|rec| rec.tick), Some(3));
}

#[test]
fn test_hooks() {
    let mut tree = tree();
    let root = tree.root();
    let seq = tree.add(sequence(), Some(root), Position::default()).unwrap();
    let a = tree.add(NodeKind::Succeeder, Some(seq), Position::default()).unwrap();
    let b = blackboard_action(&mut tree, Some(a), "Unset", &[("key", "x".into())]);

    let will = Rc::new(RefCell::new(vec![]));
    let did = Rc::new(RefCell::new(vec![]));
    {
        let will = will.clone();
        tree.on_will_tick(move |node| will.borrow_mut().push(node.id()));
        let did = did.clone();
        tree.on_did_tick(move |node, status| did.borrow_mut().push((node.id(), status)));
    }

    let mut ctx = Context::default();
    assert_eq!(tree.tick(&mut (), &mut ctx), Status::Success);
    assert_eq!(*will.borrow(), vec![seq, a, b]);
    assert_eq!(
        *did.borrow(),
        vec![
            (b, Status::Success),
            (a, Status::Success),
            (seq, Status::Success)
        ]
    );

    // The node ticked last is not announced again
    will.borrow_mut().clear();
    tree.tick(&mut (), &mut ctx);
    assert_eq!(*will.borrow(), vec![a, b]);

    tree.clear_hooks();
    will.borrow_mut().clear();
    tree.tick(&mut (), &mut ctx);
    assert!(will.borrow().is_empty());
}

#[test]
fn test_record_status_off() {
    let mut tree = Tree::with_config(
        Rc::new(ActionRegistry::default()),
        TreeConfig {
            record_status: false,
            ..TreeConfig::default()
        },
    );
    let root = tree.root();
    let id = blackboard_action(&mut tree, Some(root), "Unset", &[("key", "x".into())]);
    assert_eq!(tree.tick(&mut (), &mut Context::default()), Status::Success);
    assert_eq!(tree.last_status(id), None);
    assert_eq!(tree.last_status(root), None);
}

#[test]
fn test_unresolvable_action_is_error() {
    let mut tree = tree();
    let root = tree.root();
    let id = tree
        .add(NodeKind::Action(Action::default()), Some(root), Position::default())
        .unwrap();
    tree.set_action_library(id, Some(BLACKBOARD_LIBRARY), None).unwrap();
    tree.set_action_method(id, Some("Fly")).unwrap();
    assert_eq!(tree.tick(&mut (), &mut Context::default()), Status::Error);

    // Fixing the binding takes effect on the next tick
    tree.set_action_method(id, Some("Unset")).unwrap();
    assert_eq!(tree.tick(&mut (), &mut Context::default()), Status::Success);
}

#[test]
fn test_random_selector_is_seeded() {
    let order = |seed| {
        let mut tree = Tree::with_config(
            Rc::new(ActionRegistry::default()),
            TreeConfig {
                seed: Some(seed),
                ..TreeConfig::default()
            },
        );
        let root = tree.root();
        let sel = tree
            .add(NodeKind::RandomSelector(Default::default()), Some(root), Position::default())
            .unwrap();
        let children: Vec<_> = (0..6)
            .map(|i| {
                blackboard_action(&mut tree, Some(sel), "IsTrue", &[("key", format!("k{}", i).into())])
            })
            .collect();
        let ticked = Rc::new(RefCell::new(vec![]));
        let sink = ticked.clone();
        tree.on_did_tick(move |node, _| sink.borrow_mut().push(node.id()));

        // Every key is false, so every child gets a turn
        let mut ctx = Context::default();
        for i in 0..6 {
            ctx.set(format!("k{}", i), false);
        }
        assert_eq!(tree.tick(&mut (), &mut ctx), Status::Failure);
        let positions = ticked
            .borrow()
            .iter()
            .filter_map(|id| children.iter().position(|child| child == id))
            .collect::<Vec<_>>();
        positions
    };
    assert_eq!(order(1).len(), 6);
    assert_eq!(order(1), order(1));
}

#[test]
fn test_equality() {
    let mut a = tree();
    let b = Tree::new(a.registry().clone());
    assert_ne!(a, b);
    let root = a.root();
    a.add(sequence(), Some(root), Position::default()).unwrap();
    assert_eq!(a, a);
}
