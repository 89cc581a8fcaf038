//! Argument slots and dependency extraction
//!
//! Arguments are explicit: either a literal [`Value`] or a [`FutureRef`].
//! At submission the builder looks at every future slot. Settled futures add
//! no edge; pending ones become dependencies; a failed one dooms the new task.
//! A pending future of another engine cannot become an edge, since only its
//! own scheduler ever settles it, so the new task is refused.

use std::sync::Arc;

use super::node::Dependencies;
use super::task_id::{EngineId, TaskId};
use crate::runtime::actor::ActorHandle;
use crate::runtime::error::TaskError;
use crate::runtime::future::{FutureRef, FutureState};
use crate::runtime::value::{Matrix, Value};

/// One argument slot of an invocation.
#[derive(Debug, Clone)]
pub enum Arg {
    /// Captured by value at submission.
    Value(Value),
    /// Result of another invocation, substituted once resolved.
    Future(FutureRef),
}

impl Arg {
    /// The future in this slot, if any.
    #[inline]
    pub fn future(&self) -> Option<&FutureRef> {
        match self {
            Arg::Future(future) => Some(future),
            Arg::Value(_) => None,
        }
    }
}

/// Build an argument vector, converting each element with `Arg::from`.
///
/// ```
/// use flowray::{args, Arg};
///
/// let slots: Vec<Arg> = args![1, "two", 3.0];
/// assert_eq!(slots.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<FutureRef> for Arg {
    fn from(future: FutureRef) -> Self {
        Arg::Future(future)
    }
}

impl From<&FutureRef> for Arg {
    fn from(future: &FutureRef) -> Self {
        Arg::Future(future.clone())
    }
}

impl From<ActorHandle> for Arg {
    fn from(handle: ActorHandle) -> Self {
        Arg::Value(Value::Actor(handle))
    }
}

impl From<&ActorHandle> for Arg {
    fn from(handle: &ActorHandle) -> Self {
        Arg::Value(Value::Actor(handle.clone()))
    }
}

macro_rules! arg_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Value(Value::from(value))
                }
            }
        )*
    };
}

arg_from_value!(bool, i32, i64, f64, &str, String, Vec<u8>, Vec<Value>, Matrix);

/// Outcome of inspecting an invocation's arguments at submission.
#[derive(Debug)]
pub enum Admission {
    /// Every future argument is already resolved.
    Ready,
    /// Awaits these distinct pending futures.
    Waiting(Dependencies),
    /// A future argument already failed.
    Doomed { dependency: TaskId, cause: TaskError },
    /// A future argument is still pending in another engine.
    Foreign { dependency: TaskId, owner: EngineId },
}

/// Compute the unresolved dependencies of an argument list.
///
/// Must run under the scheduler lock so no future settles between this check
/// and the registration of the returned edges.
pub fn admit(engine: EngineId, args: &[Arg]) -> Admission {
    let mut pending = Dependencies::new();
    for future in args.iter().filter_map(Arg::future) {
        match future.state() {
            FutureState::Resolved(_) => {}
            FutureState::Failed(cause) => {
                return Admission::Doomed {
                    dependency: future.id(),
                    cause,
                };
            }
            FutureState::Pending if future.owner() != engine => {
                return Admission::Foreign {
                    dependency: future.id(),
                    owner: future.owner(),
                };
            }
            FutureState::Pending => {
                if !pending.contains(&future.id()) {
                    pending.push(future.id());
                }
            }
        }
    }

    if pending.is_empty() {
        Admission::Ready
    } else {
        Admission::Waiting(pending)
    }
}

/// Substitute resolved values for future slots.
///
/// Blocks on futures that are still pending. A failed future turns into a
/// `DependencyFailed` error for `task`.
pub fn materialize(task: TaskId, args: &[Arg]) -> Result<Vec<Value>, TaskError> {
    args.iter()
        .map(|slot| match slot {
            Arg::Value(value) => Ok(value.clone()),
            Arg::Future(future) => future.get().map_err(|cause| TaskError::DependencyFailed {
                task,
                dependency: future.id(),
                cause: Arc::new(cause),
            }),
        })
        .collect()
}
