//! Error types of the execution engine
//!
//! [`TaskError`] is what a failed future carries. It is `Clone` because one
//! failed future can be read by any number of dependents and callers.
//! [`EngineError`] covers engine-level operations (init, registries, actor
//! creation).

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::runtime::actor::ActorId;
use crate::runtime::dag::{EngineId, TaskId};
use crate::util::config::ConfigError;

/// Failure attached to a future.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    /// The task or method body returned an error.
    #[error("{name} ({task}) failed: {message}")]
    Execution {
        task: TaskId,
        name: Arc<str>,
        message: String,
    },

    /// The task or method body panicked.
    #[error("{name} ({task}) panicked: {message}")]
    Panicked {
        task: TaskId,
        name: Arc<str>,
        message: String,
    },

    /// An upstream future failed, so this task never ran.
    #[error("{task} was not executed because dependency {dependency} failed")]
    DependencyFailed {
        task: TaskId,
        dependency: TaskId,
        #[source]
        cause: Arc<TaskError>,
    },

    /// A dependency is still pending in another engine, which this engine
    /// cannot wait on.
    #[error("{task} depends on {dependency}, still pending in another engine ({owner})")]
    ForeignFuture {
        task: TaskId,
        dependency: TaskId,
        owner: EngineId,
    },

    /// The actor's execution slot is gone.
    #[error("actor {actor} is terminated: {reason}")]
    ActorTerminated { actor: ActorId, reason: Arc<str> },

    /// Cancelled before it was dispatched.
    #[error("{task} was cancelled before dispatch")]
    Cancelled { task: TaskId },

    /// Dropped by an abandoning shutdown before it was dispatched.
    #[error("{task} was abandoned at shutdown")]
    Abandoned { task: TaskId },

    /// Submitted after the engine shut down.
    #[error("engine is shut down")]
    EngineShutdown,
}

impl TaskError {
    /// Follow `DependencyFailed` links to the failure that started the chain.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use flowray::{TaskError, runtime::dag::TaskId};
    ///
    /// let root = TaskError::Cancelled { task: TaskId(0) };
    /// let err = TaskError::DependencyFailed {
    ///     task: TaskId(1),
    ///     dependency: TaskId(0),
    ///     cause: Arc::new(root.clone()),
    /// };
    /// assert_eq!(err.root_cause(), &root);
    /// ```
    pub fn root_cause(&self) -> &TaskError {
        let mut current = self;
        while let TaskError::DependencyFailed { cause, .. } = current {
            current = cause;
        }
        current
    }

    /// Whether this failure was inherited from an upstream task.
    #[inline]
    pub fn is_dependency_failure(&self) -> bool {
        matches!(self, TaskError::DependencyFailed { .. })
    }
}

/// Errors of engine-level operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no remote function registered under `{0}`")]
    UnknownFunction(String),

    #[error("no actor class registered under `{0}`")]
    UnknownActorClass(String),

    #[error("engine is shut down")]
    ShutDown,

    #[error("failed to spawn {what} thread")]
    Spawn {
        what: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
