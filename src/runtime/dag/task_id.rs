//! Task identifiers for the task graph
//!
//! Every task invocation, actor method invocation and stored object gets a
//! `TaskId`. Futures are keyed by the id of the invocation that produces them.
//! Ids are unique per engine only; [`EngineId`] tells engines apart.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A unique identifier for an invocation in the task graph.
///
/// Ids are handed out monotonically by a [`TaskIdGenerator`], so a smaller id
/// was always submitted earlier on the same engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Create a task id from a raw value.
    ///
    /// # Examples
    ///
    /// ```
    /// use flowray::runtime::dag::TaskId;
    ///
    /// let id = TaskId::new(42);
    /// assert_eq!(id.value(), 42);
    /// ```
    #[inline]
    pub fn new(value: u64) -> Self {
        TaskId(value)
    }

    /// Returns the inner value of the task id.
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task({})", self.0)
    }
}

impl From<u64> for TaskId {
    fn from(val: u64) -> Self {
        Self(val)
    }
}

/// Thread-safe generator for task ids.
///
/// Shared by the scheduler and every actor handle of one engine, so task ids
/// and method-invocation ids never collide.
#[derive(Debug)]
pub struct TaskIdGenerator {
    next_id: AtomicU64,
}

impl TaskIdGenerator {
    /// Create a new generator starting at zero.
    #[inline]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
        }
    }

    /// Generate the next unique task id.
    ///
    /// # Examples
    ///
    /// ```
    /// use flowray::runtime::dag::TaskIdGenerator;
    ///
    /// let generator = TaskIdGenerator::new();
    /// let first = generator.generate();
    /// let second = generator.generate();
    /// assert!(first < second);
    /// ```
    #[inline]
    pub fn generate(&self) -> TaskId {
        TaskId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Number of ids handed out so far.
    #[inline]
    pub fn issued(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }
}

/// Identity of one engine (scheduler core) in this process.
///
/// Task ids are only unique per engine, so every future records the engine
/// that settles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EngineId(pub u64);

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(0);

impl EngineId {
    /// Allocate a process-unique engine id.
    pub(crate) fn next() -> Self {
        EngineId(NEXT_ENGINE_ID.fetch_add(1, Ordering::SeqCst))
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Engine({})", self.0)
    }
}

impl Default for TaskIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
