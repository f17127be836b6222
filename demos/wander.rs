use ::behavior_tree_graph::{
    serialize, Action, ActionLibrary, ActionRegistry, Context, NodeKind, ParamType, Position,
    Sequence, Status, Tree, BLACKBOARD_LIBRARY,
};
use std::rc::Rc;

#[derive(Debug)]
struct Walker {
    pos: (f64, f64),
}

struct Movement {
    moves: u32,
}

impl ActionLibrary<Walker> for Movement {
    fn start(&mut self, agent: &mut Walker, _ctx: &mut Context) {
        println!("Movement: starting at {:?}", agent.pos);
    }
}

impl Movement {
    fn move_to(&mut self, agent: &mut Walker, target: (f64, f64), speed: f64) -> Status {
        self.moves += 1;
        let (dx, dy) = (target.0 - agent.pos.0, target.1 - agent.pos.1);
        let dist = dx.hypot(dy);
        if dist <= speed {
            agent.pos = target;
            Status::Success
        } else {
            agent.pos.0 += dx / dist * speed;
            agent.pos.1 += dy / dist * speed;
            Status::Running
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut registry = ActionRegistry::default();
    registry
        .register("Movement", || Movement { moves: 0 })
        .action(
            "MoveTo",
            &[("target", ParamType::Vec2), ("speed", ParamType::Float)],
            |lib, agent, _, args| match (args.get(0), args.get(1)) {
                (Some(target), Some(speed)) => lib.move_to(agent, target, speed),
                _ => Status::Error,
            },
        );
    let registry = Rc::new(registry);

    let mut tree = Tree::new(registry.clone());
    let root = tree.root();
    let seq = tree.add(
        NodeKind::Sequence(Sequence::new(true)),
        Some(root),
        Position::default(),
    )?;

    let go = tree.add(NodeKind::Action(Action::default()), Some(seq), Position::default())?;
    tree.set_action_library(go, Some("Movement"), None)?;
    tree.set_action_method(go, Some("MoveTo"))?;
    tree.set_action_parameter(go, "target", (5., 0.))?;
    tree.set_action_parameter(go, "speed", 1.5)?;

    let mark = tree.add(NodeKind::Action(Action::default()), Some(seq), Position::default())?;
    tree.set_action_library(mark, Some(BLACKBOARD_LIBRARY), None)?;
    tree.set_action_method(mark, Some("SetBool"))?;
    tree.set_action_parameter(mark, "key", "visited")?;
    tree.set_action_parameter(mark, "value", true)?;

    let back = tree.add(NodeKind::Action(Action::default()), Some(seq), Position::default())?;
    tree.set_action_library(back, Some("Movement"), None)?;
    tree.set_action_method(back, Some("MoveTo"))?;
    tree.set_action_parameter(back, "target", (0., 0.))?;
    tree.set_action_parameter(back, "speed", 2.)?;

    println!("{}", serialize(&tree)?);

    tree.on_did_tick(|node, status| {
        if let NodeKind::Action(action) = node.kind() {
            println!("  {} -> {}", action.method().unwrap_or("?"), status);
        }
    });

    let mut walker = Walker { pos: (0., 0.) };
    let mut ctx = Context::default();
    for i in 0..20 {
        let status = tree.tick(&mut walker, &mut ctx);
        println!("tick {}: {} at {:?}", i, status, walker.pos);
        if status != Status::Running {
            break;
        }
    }

    if let Some(movement) = tree.library_instance::<Movement>("Movement") {
        println!("Moved {} times, visited: {:?}", movement.moves, ctx.get::<bool>("visited"));
    }
    Ok(())
}
