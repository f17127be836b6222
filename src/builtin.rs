//! Actions every registry starts with. They only touch the blackboard, so
//! they work with any agent type.

use crate::{ActionLibrary, ActionRegistry, Args, Context, ParamType, Status};

/// Name of the built-in library.
pub const BLACKBOARD_LIBRARY: &str = "Blackboard";

/// Library of blackboard helpers: setting and testing flags, clearing keys
/// and waiting a number of ticks.
pub struct BlackboardActions;

impl<A> ActionLibrary<A> for BlackboardActions {}

impl BlackboardActions {
    fn set_bool(&mut self, ctx: &mut Context, args: Args) -> Status {
        match (args.get::<&str>(0), args.get::<bool>(1)) {
            (Some(key), Some(value)) if !key.is_empty() => {
                ctx.set(key, value);
                Status::Success
            }
            _ => Status::Error,
        }
    }

    fn is_true(&mut self, ctx: &mut Context, args: Args) -> Status {
        let Some(key) = args.get::<&str>(0) else {
            return Status::Error;
        };
        match ctx.get::<bool>(key) {
            Ok(true) => Status::Success,
            Ok(false) => Status::Failure,
            Err(_) => Status::Error,
        }
    }

    fn unset(&mut self, ctx: &mut Context, args: Args) -> Status {
        match args.get::<&str>(0) {
            Some(key) => {
                ctx.unset(key);
                Status::Success
            }
            None => Status::Error,
        }
    }

    /// Reports `Running` for `ticks` ticks, counting in the `counter` key.
    fn wait_ticks(&mut self, ctx: &mut Context, args: Args) -> Status {
        let (Some(ticks), Some(counter)) = (args.get::<i64>(0), args.get::<&str>(1)) else {
            return Status::Error;
        };
        let waited = match ctx.get_or(counter, 0i64) {
            Ok(waited) => *waited,
            Err(_) => return Status::Error,
        };
        if waited < ticks {
            ctx.set(counter, waited + 1);
            Status::Running
        } else {
            ctx.unset(counter);
            Status::Success
        }
    }
}

pub(crate) fn register<A: 'static>(registry: &mut ActionRegistry<A>) {
    registry
        .register(BLACKBOARD_LIBRARY, || BlackboardActions)
        .action(
            "SetBool",
            &[("key", ParamType::String), ("value", ParamType::Bool)],
            |lib, _, ctx, args| lib.set_bool(ctx, args),
        )
        .action("IsTrue", &[("key", ParamType::String)], |lib, _, ctx, args| {
            lib.is_true(ctx, args)
        })
        .action("Unset", &[("key", ParamType::String)], |lib, _, ctx, args| {
            lib.unset(ctx, args)
        })
        .action(
            "WaitTicks",
            &[("ticks", ParamType::Int), ("counter", ParamType::String)],
            |lib, _, ctx, args| lib.wait_ticks(ctx, args),
        );
}
