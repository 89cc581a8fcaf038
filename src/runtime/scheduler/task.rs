//! Task states and guarded body execution.
//!
//! Bodies of tasks and actor methods both run through [`run_guarded`], which
//! turns returned errors and panics into a [`TaskError`] so a failing body
//! never takes a worker or actor slot down with it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::runtime::dag::TaskId;
use crate::runtime::error::TaskError;
use crate::runtime::value::Value;

/// Where an invocation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting for at least one future argument.
    Waiting,
    /// In the ready queue.
    Ready,
    /// A worker is executing the body.
    Running,
    /// Accepted outside the task scheduler (an actor mailbox) and not settled.
    Queued,
    /// Resolved with a value.
    Finished,
    /// Failed (body error, panic, propagated failure, abandonment).
    Failed,
    /// Cancelled before dispatch.
    Cancelled,
}

impl TaskState {
    /// Whether the invocation can no longer change state.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Finished | TaskState::Failed | TaskState::Cancelled
        )
    }
}

/// Result of one guarded body execution.
#[derive(Debug)]
pub(crate) struct Execution {
    pub outcome: Result<Value, TaskError>,
    pub duration: Duration,
    pub panicked: bool,
}

/// Run a body, converting errors and panics into `TaskError`s.
pub(crate) fn run_guarded<F>(task: TaskId, name: &Arc<str>, body: F) -> Execution
where
    F: FnOnce() -> anyhow::Result<Value>,
{
    let start = Instant::now();
    let result = panic::catch_unwind(AssertUnwindSafe(body));
    let duration = start.elapsed();

    match result {
        Ok(Ok(value)) => Execution {
            outcome: Ok(value),
            duration,
            panicked: false,
        },
        Ok(Err(err)) => Execution {
            outcome: Err(TaskError::Execution {
                task,
                name: name.clone(),
                message: format!("{err:#}"),
            }),
            duration,
            panicked: false,
        },
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(task = %task, name = %name, %message, "body panicked");
            Execution {
                outcome: Err(TaskError::Panicked {
                    task,
                    name: name.clone(),
                    message,
                }),
                duration,
                panicked: true,
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
