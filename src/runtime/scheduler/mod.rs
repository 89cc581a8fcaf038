//! Dependency-aware task scheduler
//!
//! The scheduler owns the waiting set (the [`TaskGraph`]), the FIFO ready
//! queue and a fixed pool of worker threads. All of its bookkeeping sits in
//! one mutex: submission, dependency resolution and dispatch each take it
//! once, so the ready/waiting sets are never observed half-updated.
//!
//! Every future produced by this engine, including actor method futures, is
//! settled under the scheduler lock by one publish step, which wakes dependents and
//! propagates failures transitively.
//!
//! Futures carry the [`EngineId`] of the core that settles them. A pending
//! future of another engine is never registered as an edge here: nothing would
//! ever resolve it in this graph.

pub mod queue;
pub mod stats;
pub mod task;
mod worker;

pub use queue::ReadyQueue;
pub use stats::{SchedulerStats, StatsSnapshot};
pub use task::TaskState;

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::runtime::dag::{
    admit, Admission, Arg, EngineId, TaskGraph, TaskId, TaskIdGenerator, TaskInvocation,
};
use crate::runtime::error::{EngineError, TaskError};
use crate::runtime::function::RemoteFunction;
use crate::runtime::future::{FutureRef, FutureState};
use crate::runtime::value::Value;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Number of worker threads.
    pub num_workers: usize,
    /// Stack size of worker and actor threads.
    pub stack_size: usize,
    /// Prefix of worker thread names.
    pub thread_name_prefix: String,
    /// Statistics collection enabled.
    pub enable_stats: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let num_cpus = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            num_workers: num_cpus,
            stack_size: 2 * 1024 * 1024,
            thread_name_prefix: "flowray-worker".to_string(),
            enable_stats: true,
        }
    }
}

/// Everything guarded by the scheduler mutex.
#[derive(Debug)]
struct SchedulerState {
    graph: TaskGraph,
    ready: ReadyQueue,
    running: HashSet<TaskId>,
    /// Accepted futures (tasks and actor methods) not yet settled.
    outstanding: usize,
    accepting: bool,
    stopping: bool,
}

/// Shared scheduler state, referenced by workers, actor slots and the engine.
#[derive(Debug)]
pub struct SchedulerCore {
    config: SchedulerConfig,
    state: Mutex<SchedulerState>,
    /// Signalled when the ready queue gains work or workers must stop.
    work_available: Condvar,
    /// Signalled whenever a future settles.
    progress: Condvar,
    stats: SchedulerStats,
    id: EngineId,
    ids: TaskIdGenerator,
}

/// How often [`SchedulerCore::wait`] rechecks futures settled by other engines.
const FOREIGN_POLL_INTERVAL: Duration = Duration::from_millis(5);

impl SchedulerCore {
    fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(SchedulerState {
                graph: TaskGraph::new(),
                ready: ReadyQueue::new(),
                running: HashSet::new(),
                outstanding: 0,
                accepting: true,
                stopping: false,
            }),
            work_available: Condvar::new(),
            progress: Condvar::new(),
            stats: SchedulerStats::default(),
            id: EngineId::next(),
            ids: TaskIdGenerator::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Identity stamped on every future this core settles.
    #[inline]
    pub fn id(&self) -> EngineId {
        self.id
    }

    #[inline]
    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Allocate an id for a new invocation or stored object.
    #[inline]
    pub(crate) fn next_id(&self) -> TaskId {
        self.ids.generate()
    }

    /// Submit a task; never blocks on the task itself.
    ///
    /// After shutdown the returned future is already failed with
    /// `EngineShutdown`.
    pub fn submit(&self, function: &RemoteFunction, args: Vec<Arg>) -> FutureRef {
        let id = self.next_id();
        let invocation = TaskInvocation::new(self.id, id, function.clone(), args);
        let future = invocation.future().clone();

        let mut state = self.state.lock();
        if !state.accepting {
            drop(state);
            future.settle(Err(TaskError::EngineShutdown));
            return future;
        }

        if self.config.enable_stats {
            self.stats.record_submitted();
        }
        state.outstanding += 1;

        match admit(self.id, invocation.args()) {
            Admission::Ready => {
                trace!(task = %id, function = function.name(), "task ready at submission");
                state.ready.push(invocation);
                self.work_available.notify_one();
            }
            Admission::Waiting(dependencies) => {
                trace!(
                    task = %id,
                    function = function.name(),
                    dependencies = dependencies.len(),
                    "task waiting on futures"
                );
                state.graph.insert(invocation, dependencies);
            }
            Admission::Doomed { dependency, cause } => {
                let err = TaskError::DependencyFailed {
                    task: id,
                    dependency,
                    cause: Arc::new(cause),
                };
                self.publish(&mut state, &future, Err(err));
            }
            Admission::Foreign { dependency, owner } => {
                debug!(
                    task = %id,
                    dependency = %dependency,
                    owner = %owner,
                    "refusing dependency pending in another engine"
                );
                let err = TaskError::ForeignFuture {
                    task: id,
                    dependency,
                    owner,
                };
                self.publish(&mut state, &future, Err(err));
            }
        }

        future
    }

    /// Store a value directly; the returned future is already resolved.
    pub fn put(&self, value: Value) -> FutureRef {
        FutureRef::settled(self.id, self.next_id(), Ok(value))
    }

    /// Settle `future` and everything that follows from it.
    ///
    /// Resolution moves dependents whose last dependency it was to the ready
    /// queue. Failure fails every direct and transitive dependent without
    /// running it.
    fn publish(
        &self,
        state: &mut MutexGuard<'_, SchedulerState>,
        future: &FutureRef,
        outcome: Result<Value, TaskError>,
    ) {
        let mut pending = vec![(future.clone(), outcome)];
        let mut woke_work = false;

        while let Some((future, outcome)) = pending.pop() {
            let failure = outcome.as_ref().err().cloned();
            if !future.settle(outcome) {
                continue;
            }
            debug_assert!(state.outstanding > 0, "settled an untracked future");
            state.outstanding = state.outstanding.saturating_sub(1);

            match failure {
                None => {
                    for invocation in state.graph.resolve(future.id()) {
                        trace!(task = %invocation.id(), "dependencies resolved");
                        state.ready.push(invocation);
                        woke_work = true;
                    }
                }
                Some(err) => {
                    if self.config.enable_stats {
                        match &err {
                            TaskError::DependencyFailed { .. } => {
                                self.stats.record_dependency_failure()
                            }
                            TaskError::Cancelled { .. } => self.stats.record_cancelled(),
                            _ => {}
                        }
                    }
                    let cause = Arc::new(err);
                    for invocation in state.graph.fail(future.id()) {
                        debug!(
                            task = %invocation.id(),
                            dependency = %future.id(),
                            "failing dependent task"
                        );
                        let err = TaskError::DependencyFailed {
                            task: invocation.id(),
                            dependency: future.id(),
                            cause: cause.clone(),
                        };
                        pending.push((invocation.future().clone(), Err(err)));
                    }
                }
            }
        }

        if woke_work {
            self.work_available.notify_all();
        }
        self.progress.notify_all();
    }

    /// Block a worker until a ready invocation is available.
    ///
    /// Returns `None` once the scheduler is stopping and the queue is empty.
    fn next_task(&self) -> Option<TaskInvocation> {
        let mut state = self.state.lock();
        loop {
            if let Some(invocation) = state.ready.pop() {
                state.running.insert(invocation.id());
                if self.config.enable_stats {
                    self.stats.update_parallelism(state.running.len());
                }
                return Some(invocation);
            }
            if state.stopping {
                return None;
            }
            self.work_available.wait(&mut state);
        }
    }

    /// Report the outcome of a dispatched task.
    fn complete(&self, invocation: &TaskInvocation, outcome: Result<Value, TaskError>) {
        let mut state = self.state.lock();
        state.running.remove(&invocation.id());
        self.publish(&mut state, invocation.future(), outcome);
    }

    /// Count an invocation accepted outside the task queue (actor mailbox).
    ///
    /// Returns `false` when the engine no longer accepts work.
    pub(crate) fn track_external(&self) -> bool {
        let mut state = self.state.lock();
        if !state.accepting {
            return false;
        }
        state.outstanding += 1;
        true
    }

    /// Undo [`track_external`](Self::track_external) for work that was never enqueued.
    pub(crate) fn untrack_external(&self) {
        let mut state = self.state.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
        self.progress.notify_all();
    }

    /// Settle a future produced outside the worker pool.
    pub(crate) fn settle_external(&self, future: &FutureRef, outcome: Result<Value, TaskError>) {
        let mut state = self.state.lock();
        self.publish(&mut state, future, outcome);
    }

    /// Cancel a task that has not been dispatched yet.
    ///
    /// Returns `false` for running or settled tasks and for futures this
    /// scheduler does not queue.
    pub fn cancel(&self, future: &FutureRef) -> bool {
        if future.owner() != self.id {
            return false;
        }
        let mut state = self.state.lock();
        let task = future.id();
        let removed = match state.graph.remove(task) {
            Some(invocation) => Some(invocation),
            None => state.ready.remove(task),
        };

        match removed {
            Some(invocation) => {
                debug!(task = %task, "cancelled before dispatch");
                self.publish(&mut state, invocation.future(), Err(TaskError::Cancelled { task }));
                true
            }
            None => false,
        }
    }

    /// Where the invocation behind `future` currently is.
    pub fn task_state(&self, future: &FutureRef) -> TaskState {
        if future.owner() == self.id {
            let state = self.state.lock();
            let task = future.id();
            if state.graph.contains(task) {
                return TaskState::Waiting;
            }
            if state.ready.contains(task) {
                return TaskState::Ready;
            }
            if state.running.contains(&task) {
                return TaskState::Running;
            }
        }
        match future.state() {
            FutureState::Pending => TaskState::Queued,
            FutureState::Resolved(_) => TaskState::Finished,
            FutureState::Failed(TaskError::Cancelled { .. }) => TaskState::Cancelled,
            FutureState::Failed(_) => TaskState::Failed,
        }
    }

    /// Block until at least `num_ready` futures settled or `timeout` elapsed.
    ///
    /// Returns `(settled, pending)`, each in input order. Futures of other
    /// engines do not signal this core, so while one of them is pending the
    /// wait rechecks every few milliseconds.
    pub fn wait(
        &self,
        futures: &[FutureRef],
        num_ready: usize,
        timeout: Option<Duration>,
    ) -> (Vec<FutureRef>, Vec<FutureRef>) {
        let target = num_ready.min(futures.len());
        let deadline = timeout.map(|timeout| Instant::now() + timeout);

        let mut state = self.state.lock();
        loop {
            let mut settled = 0;
            let mut foreign_pending = false;
            for future in futures {
                if future.is_settled() {
                    settled += 1;
                } else if future.owner() != self.id {
                    foreign_pending = true;
                }
            }
            if settled >= target {
                break;
            }

            let slice_end = foreign_pending.then(|| Instant::now() + FOREIGN_POLL_INTERVAL);
            let wake_at = match (deadline, slice_end) {
                (Some(deadline), Some(slice_end)) => Some(deadline.min(slice_end)),
                (deadline, slice_end) => deadline.or(slice_end),
            };
            match wake_at {
                Some(wake_at) => {
                    let timed_out = self.progress.wait_until(&mut state, wake_at).timed_out();
                    if timed_out && deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                        break;
                    }
                }
                None => self.progress.wait(&mut state),
            }
        }
        drop(state);

        futures.iter().cloned().partition(FutureRef::is_settled)
    }

    /// Block until every accepted future settled, then stop accepting work.
    pub(crate) fn drain(&self) {
        let mut state = self.state.lock();
        while state.outstanding > 0 {
            self.progress.wait(&mut state);
        }
        state.accepting = false;
    }

    /// Stop accepting work and fail every undispatched task.
    ///
    /// Returns the number of abandoned tasks.
    pub(crate) fn abandon(&self) -> usize {
        let mut state = self.state.lock();
        state.accepting = false;

        let mut abandoned = state.graph.drain();
        abandoned.extend(state.ready.drain());
        for invocation in &abandoned {
            let task = invocation.id();
            self.publish(&mut state, invocation.future(), Err(TaskError::Abandoned { task }));
        }
        abandoned.len()
    }

    /// Block until no accepted future is left unsettled.
    pub(crate) fn wait_settled(&self) {
        let mut state = self.state.lock();
        while state.outstanding > 0 {
            self.progress.wait(&mut state);
        }
    }

    /// Tell idle workers to exit once the ready queue is empty.
    fn stop(&self) {
        let mut state = self.state.lock();
        state.accepting = false;
        state.stopping = true;
        self.work_available.notify_all();
    }

    pub fn is_accepting(&self) -> bool {
        self.state.lock().accepting
    }

    /// Tasks waiting on dependencies.
    pub fn waiting_len(&self) -> usize {
        self.state.lock().graph.len()
    }

    /// Tasks ready but not yet dispatched.
    pub fn ready_len(&self) -> usize {
        self.state.lock().ready.len()
    }

    /// Tasks currently executing.
    pub fn running_len(&self) -> usize {
        self.state.lock().running.len()
    }

    /// Accepted futures not settled yet.
    pub fn outstanding(&self) -> usize {
        self.state.lock().outstanding
    }
}

/// Worker pool plus the shared scheduler core.
#[derive(Debug)]
pub struct Scheduler {
    core: Arc<SchedulerCore>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl Scheduler {
    /// Create a scheduler with default configuration.
    pub fn new() -> Result<Self, EngineError> {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create a scheduler and start its worker threads.
    pub fn with_config(config: SchedulerConfig) -> Result<Self, EngineError> {
        let core = Arc::new(SchedulerCore::new(config));
        let workers = match worker::spawn_workers(&core) {
            Ok(workers) => workers,
            Err(err) => {
                core.stop();
                return Err(err);
            }
        };
        debug!(workers = workers.len(), "scheduler started");

        Ok(Self {
            core,
            workers: Mutex::new(workers),
        })
    }

    #[inline]
    pub fn core(&self) -> &Arc<SchedulerCore> {
        &self.core
    }

    #[inline]
    pub fn num_workers(&self) -> usize {
        self.core.config.num_workers
    }

    /// Stop the workers and wait for them to exit.
    ///
    /// Ready tasks still queued are executed before the workers exit.
    pub fn join_workers(&self) {
        self.core.stop();
        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        let current = thread::current().id();
        for worker in workers {
            // A worker dropping the last engine handle cannot join itself.
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                tracing::error!("worker thread panicked outside a task body");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.join_workers();
    }
}
