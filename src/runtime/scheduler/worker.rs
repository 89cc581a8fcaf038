//! Worker threads of the scheduler pool.

use std::sync::Arc;
use std::thread;

use tracing::{debug, trace};

use super::task::run_guarded;
use super::SchedulerCore;
use crate::runtime::dag::{materialize, TaskInvocation};
use crate::runtime::error::{EngineError, TaskError};
use crate::runtime::value::Value;

/// Spawn `num_workers` threads pulling from the shared ready queue.
pub(super) fn spawn_workers(
    core: &Arc<SchedulerCore>,
) -> Result<Vec<thread::JoinHandle<()>>, EngineError> {
    let config = core.config();
    let mut workers = Vec::with_capacity(config.num_workers);

    for worker_id in 0..config.num_workers {
        let core = core.clone();
        let worker = thread::Builder::new()
            .name(format!("{}-{}", config.thread_name_prefix, worker_id))
            .stack_size(config.stack_size)
            .spawn(move || worker_loop(worker_id, &core))
            .map_err(|source| EngineError::Spawn {
                what: format!("worker {worker_id}"),
                source,
            })?;
        workers.push(worker);
    }

    Ok(workers)
}

/// Worker thread main loop.
fn worker_loop(worker_id: usize, core: &SchedulerCore) {
    debug!(worker_id, "worker started");

    while let Some(invocation) = core.next_task() {
        trace!(worker_id, task = %invocation.id(), "dispatching");
        let outcome = execute(core, &invocation);
        core.complete(&invocation, outcome);
    }

    debug!(worker_id, "worker stopped");
}

/// Run one ready invocation to completion.
fn execute(core: &SchedulerCore, invocation: &TaskInvocation) -> Result<Value, TaskError> {
    // Every future argument is resolved by the time a task is ready, so this
    // never blocks.
    let values = materialize(invocation.id(), invocation.args())?;

    let function = invocation.function();
    let name = function.shared_name();
    let execution = run_guarded(invocation.id(), &name, || function.call(&values));

    if core.config().enable_stats {
        let duration_us = execution.duration.as_micros() as usize;
        core.stats()
            .record_completed(duration_us, execution.outcome.is_err());
    }
    trace!(
        task = %invocation.id(),
        elapsed_us = execution.duration.as_micros() as u64,
        ok = execution.outcome.is_ok(),
        "task finished"
    );

    execution.outcome
}
