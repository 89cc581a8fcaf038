//! The engine: public entry point of the runtime
//!
//! An [`Engine`] owns the scheduler (worker pool plus task graph), the actor
//! runtime and the name registries. It is cheap to clone; every clone talks to
//! the same runtime. Dropping the last clone shuts the runtime down with the
//! configured [`ShutdownMode`].
//!
//! # Example
//!
//! ```
//! use flowray::{args, Engine, EngineConfig, RemoteFunction, Value};
//!
//! let engine = Engine::init(EngineConfig::with_workers(2)).unwrap();
//! let add = RemoteFunction::new("add", |args| {
//!     Ok(flowray::runtime::value::arg(args, 0)?.add(flowray::runtime::value::arg(args, 1)?)?)
//! });
//!
//! let a = engine.submit(&add, args![1, 2]);
//! let b = engine.submit(&add, args![&a, 10]);
//! assert_eq!(engine.get(&b), Ok(Value::Int(13)));
//! engine.shutdown(flowray::ShutdownMode::Drain);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::runtime::actor::{ActorClass, ActorHandle, ActorRuntime};
use crate::runtime::dag::{Arg, EngineId};
use crate::runtime::error::{EngineError, TaskError};
use crate::runtime::function::{FunctionRegistry, RemoteFunction};
use crate::runtime::future::{self, FutureRef};
use crate::runtime::scheduler::{Scheduler, StatsSnapshot, TaskState};
use crate::runtime::value::Value;
use crate::util::config::EngineConfig;

/// How outstanding work is treated when the engine or an actor stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownMode {
    /// Run everything already accepted, then stop.
    #[default]
    Drain,
    /// Fail everything not yet dispatched, let in-flight bodies finish.
    Abandon,
}

#[derive(Debug)]
struct EngineInner {
    config: EngineConfig,
    scheduler: Scheduler,
    actors: ActorRuntime,
    functions: RwLock<FunctionRegistry>,
    classes: RwLock<IndexMap<Arc<str>, ActorClass>>,
    /// Serializes shutdown calls; held while draining.
    shutdown_lock: Mutex<()>,
    /// Set once a shutdown completed. Readable while a drain is in progress.
    shut_down: AtomicBool,
}

impl EngineInner {
    fn shutdown(&self, mode: ShutdownMode) {
        let _serialized = self.shutdown_lock.lock();
        if self.shut_down.load(Ordering::Acquire) {
            return;
        }

        let core = self.scheduler.core();
        info!(?mode, outstanding = core.outstanding(), "engine shutting down");
        match mode {
            ShutdownMode::Drain => {
                core.drain();
                self.actors.shutdown_all(ShutdownMode::Drain);
            }
            ShutdownMode::Abandon => {
                let abandoned = core.abandon();
                self.actors.shutdown_all(ShutdownMode::Abandon);
                core.wait_settled();
                debug!(abandoned, "abandoned undispatched tasks");
            }
        }
        self.scheduler.join_workers();

        self.shut_down.store(true, Ordering::Release);
        info!("engine shut down");
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        self.shutdown(self.config.shutdown_mode);
    }
}

/// Handle to a running execution engine.
#[derive(Debug, Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Validate the configuration and start the worker pool.
    pub fn init(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let scheduler = Scheduler::with_config(config.scheduler_config())?;
        let actors = ActorRuntime::new(scheduler.core().clone());
        info!(
            workers = config.num_workers,
            shutdown_mode = ?config.shutdown_mode,
            "engine started"
        );

        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                scheduler,
                actors,
                functions: RwLock::new(FunctionRegistry::new()),
                classes: RwLock::new(IndexMap::new()),
                shutdown_lock: Mutex::new(()),
                shut_down: AtomicBool::new(false),
            }),
        })
    }

    /// Engine with default configuration and `num_workers` workers.
    pub fn with_workers(num_workers: usize) -> Result<Self, EngineError> {
        Self::init(EngineConfig::with_workers(num_workers))
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Identity stamped on every future this engine produces.
    #[inline]
    pub fn id(&self) -> EngineId {
        self.inner.scheduler.core().id()
    }

    #[inline]
    pub fn num_workers(&self) -> usize {
        self.inner.scheduler.num_workers()
    }

    // Tasks

    /// Submit a task. Never blocks; see [`SchedulerCore::submit`](crate::runtime::scheduler::SchedulerCore::submit).
    pub fn submit(&self, function: &RemoteFunction, args: Vec<Arg>) -> FutureRef {
        self.inner.scheduler.core().submit(function, args)
    }

    /// Submit a task by registered function name.
    pub fn submit_named(&self, name: &str, args: Vec<Arg>) -> Result<FutureRef, EngineError> {
        let function = self
            .function(name)
            .ok_or_else(|| EngineError::UnknownFunction(name.to_string()))?;
        Ok(self.submit(&function, args))
    }

    /// Store a value; the returned future is already resolved.
    pub fn put(&self, value: impl Into<Value>) -> FutureRef {
        self.inner.scheduler.core().put(value.into())
    }

    /// Block until `future` settles.
    #[inline]
    pub fn get(&self, future: &FutureRef) -> Result<Value, TaskError> {
        future.get()
    }

    /// Block until every future settles; values in request order.
    ///
    /// The first failure in request order is returned.
    pub fn get_all(&self, futures: &[FutureRef]) -> Result<Vec<Value>, TaskError> {
        future::get_all(futures)
    }

    /// Block until `num_ready` futures settled or `timeout` passed.
    ///
    /// Returns `(settled, pending)` in input order. A timeout cancels nothing.
    pub fn wait(
        &self,
        futures: &[FutureRef],
        num_ready: usize,
        timeout: Option<Duration>,
    ) -> (Vec<FutureRef>, Vec<FutureRef>) {
        self.inner.scheduler.core().wait(futures, num_ready, timeout)
    }

    /// Cancel a task that was not dispatched yet.
    pub fn cancel(&self, future: &FutureRef) -> bool {
        self.inner.scheduler.core().cancel(future)
    }

    pub fn task_state(&self, future: &FutureRef) -> TaskState {
        self.inner.scheduler.core().task_state(future)
    }

    // Registries

    /// Make a function addressable by name; returns the one it replaced.
    pub fn register_function(&self, function: RemoteFunction) -> Option<RemoteFunction> {
        debug!(name = function.name(), "registered function");
        self.inner.functions.write().register(function)
    }

    pub fn function(&self, name: &str) -> Option<RemoteFunction> {
        self.inner.functions.read().get(name).cloned()
    }

    /// Make an actor class addressable by name; returns the one it replaced.
    pub fn register_actor_class(&self, class: ActorClass) -> Option<ActorClass> {
        debug!(name = class.name(), "registered actor class");
        self.inner.classes.write().insert(class.shared_name(), class)
    }

    pub fn actor_class(&self, name: &str) -> Option<ActorClass> {
        self.inner.classes.read().get(name).cloned()
    }

    // Actors

    /// Create an actor; its constructor runs on the actor's own thread.
    pub fn instantiate(&self, class: &ActorClass, args: Vec<Arg>) -> Result<ActorHandle, EngineError> {
        self.inner.actors.instantiate(class, args)
    }

    pub fn instantiate_named(&self, name: &str, args: Vec<Arg>) -> Result<ActorHandle, EngineError> {
        let class = self
            .actor_class(name)
            .ok_or_else(|| EngineError::UnknownActorClass(name.to_string()))?;
        self.instantiate(&class, args)
    }

    /// Stop one actor and wait for its thread.
    pub fn terminate_actor(&self, handle: &ActorHandle, mode: ShutdownMode) {
        self.inner.actors.terminate(handle, mode);
    }

    // Lifecycle

    /// Stop the engine. Idempotent; later calls return at once.
    ///
    /// Must not be called from inside a task or method body with
    /// `ShutdownMode::Drain`: draining waits for that body too.
    pub fn shutdown(&self, mode: ShutdownMode) {
        self.inner.shutdown(mode);
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.scheduler.core().stats().snapshot()
    }
}
