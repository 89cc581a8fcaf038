//! Walkthrough of the engine's usage patterns
//!
//! Each function here drives one pattern end to end on a caller-provided
//! engine: parallel independent tasks, a dependent task fed by futures,
//! three shapes of aggregation, a counter actor and an actor handle shared by
//! many tasks. The CLI exposes every pattern as a subcommand.

pub mod actors;
pub mod functions;

use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use serde::Serialize;
use tracing::{debug, info};

use crate::args;
use crate::runtime::dag::Arg;
use crate::runtime::engine::Engine;
use crate::runtime::function::RemoteFunction;
use crate::runtime::value::{Matrix, Value};

/// Tasks launched by [`parallel`].
pub const PARALLEL_TASKS: usize = 4;

/// Values aggregated by [`aggregate`] in the walkthrough.
pub const AGGREGATE_INPUTS: [i64; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

/// Shape of the aggregation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// `add(add(add(1, 2), 3), 4) ...`: one ready task at a time.
    Linear,
    /// Balanced pairwise reduction: every level runs in parallel.
    Tree,
    /// Queue form: pop two, push their sum to the back.
    Loop,
}

/// Result and wall time of one pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timed<T> {
    pub result: T,
    pub elapsed: Duration,
}

/// Launch [`PARALLEL_TASKS`] sleeping tasks and gather them with `get_all`.
pub fn parallel(engine: &Engine, delay: Duration) -> anyhow::Result<Timed<Vec<Value>>> {
    let f = functions::sleepy_identity(delay);
    let start = Instant::now();

    let futures: Vec<_> = (0..PARALLEL_TASKS as i64)
        .map(|i| engine.submit(&f, args![i]))
        .collect();
    let result = engine.get_all(&futures)?;

    let elapsed = start.elapsed();
    info!(tasks = PARALLEL_TASKS, ?elapsed, "parallel tasks finished");
    Ok(Timed { result, elapsed })
}

/// Create two random matrices and multiply them in a dependent task.
pub fn dependent_matrices(engine: &Engine, size: usize) -> anyhow::Result<Timed<Matrix>> {
    let create = functions::create_matrix();
    let multiply = functions::multiply_matrices();
    let size = size as i64;
    let start = Instant::now();

    let x = engine.submit(&create, args![size, size]);
    let y = engine.submit(&create, args![size, size]);
    // Waits in the task graph until both operands exist.
    let z = engine.submit(&multiply, args![&x, &y]);

    let product = engine.get(&z)?;
    let result = product
        .as_matrix()
        .cloned()
        .context("multiply_matrices did not return a matrix")?;
    Ok(Timed {
        result,
        elapsed: start.elapsed(),
    })
}

/// Sum `values` with a delayed `add` task, shaped by `strategy`.
pub fn aggregate(
    engine: &Engine,
    strategy: Aggregation,
    values: &[i64],
    delay: Duration,
) -> anyhow::Result<Timed<Value>> {
    if values.is_empty() {
        bail!("nothing to aggregate");
    }
    let add = functions::add(delay);
    let leaves: Vec<Arg> = values.iter().map(|&v| Arg::from(v)).collect();
    let start = Instant::now();

    let root = match strategy {
        Aggregation::Linear => aggregate_linear(engine, &add, leaves),
        Aggregation::Tree => aggregate_tree(engine, &add, leaves),
        Aggregation::Loop => aggregate_loop(engine, &add, leaves),
    };
    let result = match root {
        Arg::Future(future) => engine.get(&future)?,
        Arg::Value(value) => value,
    };

    let elapsed = start.elapsed();
    info!(?strategy, %result, ?elapsed, "aggregation finished");
    Ok(Timed { result, elapsed })
}

fn aggregate_linear(engine: &Engine, add: &RemoteFunction, leaves: Vec<Arg>) -> Arg {
    let mut leaves = leaves.into_iter();
    let Some(first) = leaves.next() else {
        return Arg::Value(Value::Unit);
    };
    leaves.fold(first, |acc, next| Arg::Future(engine.submit(add, vec![acc, next])))
}

fn aggregate_tree(engine: &Engine, add: &RemoteFunction, leaves: Vec<Arg>) -> Arg {
    let mut level = leaves;
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        let mut items = level.into_iter();
        while let Some(left) = items.next() {
            match items.next() {
                Some(right) => next.push(Arg::Future(engine.submit(add, vec![left, right]))),
                None => next.push(left),
            }
        }
        debug!(width = next.len(), "aggregation level submitted");
        level = next;
    }
    level.pop().unwrap_or(Arg::Value(Value::Unit))
}

fn aggregate_loop(engine: &Engine, add: &RemoteFunction, leaves: Vec<Arg>) -> Arg {
    let mut queue: VecDeque<Arg> = leaves.into();
    while queue.len() > 1 {
        let (Some(left), Some(right)) = (queue.pop_front(), queue.pop_front()) else {
            break;
        };
        queue.push_back(Arg::Future(engine.submit(add, vec![left, right])));
    }
    queue.pop_front().unwrap_or(Arg::Value(Value::Unit))
}

/// Counter readings before and after two `inc` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterReport {
    pub initial: i64,
    pub after_two_increments: i64,
}

/// Create a `Counter` actor, read it, increment twice, read again.
pub fn counter(engine: &Engine) -> anyhow::Result<CounterReport> {
    let counter = engine.instantiate(&actors::counter_class(), args![])?;

    let initial = engine
        .get(&counter.invoke("get_value", args![])?)?
        .expect_int()?;
    counter.invoke("inc", args![])?;
    counter.invoke("inc", args![])?;
    let after_two_increments = engine
        .get(&counter.invoke("get_value", args![])?)?
        .expect_int()?;

    Ok(CounterReport {
        initial,
        after_two_increments,
    })
}

/// Parameters of [`messages`].
#[derive(Debug, Clone, Copy)]
pub struct MessageRun {
    /// Worker tasks sharing the actor handle.
    pub workers: usize,
    /// Messages each worker pushes.
    pub per_worker: usize,
    /// Pause before each message.
    pub delay: Duration,
    /// Pause between two reads of the actor.
    pub poll_interval: Duration,
}

/// Feed a `MessageActor` from worker tasks holding a shared handle and drain
/// it periodically, like a monitoring loop.
///
/// `on_batch` sees every non-empty batch as it is read. Returns every
/// message received, in the order the actor stored them.
pub fn messages(
    engine: &Engine,
    run: MessageRun,
    mut on_batch: impl FnMut(&[Value]),
) -> anyhow::Result<Vec<Value>> {
    let actor = engine.instantiate(&actors::message_actor_class(), args![])?;
    let worker = functions::message_worker(run.delay, run.per_worker);

    let workers: Vec<_> = (0..run.workers as i64)
        .map(|j| engine.submit(&worker, args![&actor, j]))
        .collect();

    let mut received = Vec::with_capacity(run.workers * run.per_worker);
    let mut collect = |received: &mut Vec<Value>| -> anyhow::Result<()> {
        let batch = engine.get(&actor.invoke("get_and_clear_messages", args![])?)?;
        let batch = batch.as_list().unwrap_or_default();
        if !batch.is_empty() {
            on_batch(batch);
            received.extend_from_slice(batch);
        }
        Ok(())
    };

    loop {
        let (_, pending) = engine.wait(&workers, workers.len(), Some(Duration::ZERO));
        collect(&mut received)?;
        if pending.is_empty() {
            break;
        }
        thread::sleep(run.poll_interval);
    }
    // Every add_message was enqueued before its worker returned.
    engine.get_all(&workers)?;
    collect(&mut received)?;

    Ok(received)
}
