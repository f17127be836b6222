use ::behavior_tree_graph::{deserialize, ActionRegistry, Context, LoadOptions, Status};
use std::{fs, rc::Rc};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let file = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/tree.yaml".to_owned());
    let text = fs::read_to_string(&file)?;

    let options = LoadOptions {
        check_bindings: true,
        ..LoadOptions::default()
    };
    let mut tree = deserialize(&text, Rc::new(ActionRegistry::<()>::default()), &options)?;
    println!(
        "Loaded {} nodes from {}, {} unparented",
        tree.len(),
        file,
        tree.unparented().count()
    );
    for (node, error) in tree.validate() {
        println!("  {} will not run: {}", node, error);
    }

    tree.on_will_tick(|node| println!("  -> {}", node.name()));

    let mut ctx = Context::default();
    loop {
        let status = tree.tick(&mut (), &mut ctx);
        println!("tick {}: {}", tree.total_ticks(), status);
        if status != Status::Running {
            break;
        }
    }
    println!("Blackboard: {:?}", ctx);
    Ok(())
}
