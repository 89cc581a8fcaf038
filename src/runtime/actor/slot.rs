//! The execution slot: one dedicated thread per actor.
//!
//! The slot builds the actor state, then drains the mailbox in order. Method
//! arguments are materialized on the slot thread, so a call waiting on a
//! future holds back every later call to the same actor.

use std::sync::Arc;
use std::thread;

use tracing::{debug, trace, warn};

use super::class::{Actor, ActorClass};
use super::handle::{ActorShared, MethodInvocation};
use crate::runtime::dag::{materialize, Arg};
use crate::runtime::error::{EngineError, TaskError};
use crate::runtime::scheduler::task::run_guarded;
use crate::runtime::scheduler::SchedulerCore;
use crate::runtime::value::Value;

const ACTOR_THREAD_PREFIX: &str = "flowray-actor";

/// Start the slot thread of a new actor.
pub(super) fn spawn_slot(
    shared: Arc<ActorShared>,
    core: Arc<SchedulerCore>,
    class: ActorClass,
    args: Vec<Arg>,
) -> Result<thread::JoinHandle<()>, EngineError> {
    let name = format!("{}-{}", ACTOR_THREAD_PREFIX, shared.id().value());
    let stack_size = core.config().stack_size;

    thread::Builder::new()
        .name(name.clone())
        .stack_size(stack_size)
        .spawn(move || run_slot(&shared, &core, &class, &args))
        .map_err(|source| EngineError::Spawn { what: name, source })
}

fn run_slot(shared: &ActorShared, core: &SchedulerCore, class: &ActorClass, args: &[Arg]) {
    let Some(mut actor) = construct(shared, core, class, args) else {
        return;
    };
    debug!(actor = %shared.id(), class = %class.name(), "actor started");

    while let Some(call) = shared.mailbox().recv() {
        if let Err(reason) = execute(shared, core, actor.as_mut(), call) {
            shared.abandon(&reason, core);
            break;
        }
    }

    debug!(actor = %shared.id(), "actor stopped");
}

/// Build the actor state; a failure terminates the actor with its message.
fn construct(
    shared: &ActorShared,
    core: &SchedulerCore,
    class: &ActorClass,
    args: &[Arg],
) -> Option<Box<dyn Actor>> {
    let task = core.next_id();
    let name = class.shared_name();

    let outcome = materialize(task, args).and_then(|values| {
        let mut built = None;
        let execution = run_guarded(task, &name, || {
            built = Some(class.construct(&values)?);
            Ok(Value::Unit)
        });
        execution.outcome.map(|_| built)
    });

    match outcome {
        Ok(Some(actor)) => Some(actor),
        Ok(None) => None,
        Err(err) => {
            warn!(actor = %shared.id(), class = %class.name(), error = %err, "actor constructor failed");
            shared.abandon(&format!("constructor failed: {err}"), core);
            None
        }
    }
}

/// Run one call and settle its future.
///
/// Returns the termination reason when the method panicked.
fn execute(
    shared: &ActorShared,
    core: &SchedulerCore,
    actor: &mut dyn Actor,
    call: MethodInvocation,
) -> Result<(), String> {
    let MethodInvocation {
        id,
        method,
        args,
        submitted_at,
        future,
    } = call;
    trace!(
        actor = %shared.id(),
        task = %id,
        %method,
        queued_us = submitted_at.elapsed().as_micros() as u64,
        "method call dispatched"
    );

    let values = match materialize(id, &args) {
        Ok(values) => values,
        Err(err) => {
            core.settle_external(&future, Err(err));
            return Ok(());
        }
    };

    let name: Arc<str> = Arc::from(format!("{}.{}", shared.class(), method));
    let execution = run_guarded(id, &name, || actor.call(&method, &values));
    if core.config().enable_stats {
        core.stats()
            .record_method_call(execution.duration.as_micros() as usize);
    }

    let verdict = if execution.panicked {
        Err(panic_reason(&name, &execution.outcome))
    } else {
        Ok(())
    };
    core.settle_external(&future, execution.outcome);
    verdict
}

fn panic_reason(name: &str, outcome: &Result<Value, TaskError>) -> String {
    match outcome {
        Err(TaskError::Panicked { message, .. }) => format!("{name} panicked: {message}"),
        _ => format!("{name} panicked"),
    }
}
