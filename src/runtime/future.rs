//! Futures: write-once handles to invocation results
//!
//! A [`FutureRef`] is returned by every submission and method invocation.
//! Clones share one cell, so any number of readers (callers, dependent tasks)
//! observe the same outcome. The cell moves from `Pending` to `Resolved` or
//! `Failed` exactly once; later settle attempts are ignored.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::runtime::dag::{EngineId, TaskId};
use crate::runtime::error::TaskError;
use crate::runtime::value::Value;

/// Settlement state of a future.
#[derive(Debug, Clone, PartialEq)]
pub enum FutureState {
    Pending,
    Resolved(Value),
    Failed(TaskError),
}

impl FutureState {
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, FutureState::Pending)
    }

    fn outcome(&self) -> Option<Result<Value, TaskError>> {
        match self {
            FutureState::Pending => None,
            FutureState::Resolved(value) => Some(Ok(value.clone())),
            FutureState::Failed(err) => Some(Err(err.clone())),
        }
    }
}

#[derive(Debug)]
struct FutureCell {
    state: Mutex<FutureState>,
    settled: Condvar,
}

/// Handle to the eventual result of one invocation.
#[derive(Clone)]
pub struct FutureRef {
    owner: EngineId,
    id: TaskId,
    cell: Arc<FutureCell>,
}

impl FutureRef {
    pub(crate) fn pending(owner: EngineId, id: TaskId) -> Self {
        Self {
            owner,
            id,
            cell: Arc::new(FutureCell {
                state: Mutex::new(FutureState::Pending),
                settled: Condvar::new(),
            }),
        }
    }

    pub(crate) fn settled(
        owner: EngineId,
        id: TaskId,
        outcome: Result<Value, TaskError>,
    ) -> Self {
        let future = Self::pending(owner, id);
        future.settle(outcome);
        future
    }

    /// Id of the invocation producing this future.
    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Engine whose scheduler settles this future.
    #[inline]
    pub fn owner(&self) -> EngineId {
        self.owner
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FutureState {
        self.cell.state.lock().clone()
    }

    /// Whether the future is resolved or failed.
    pub fn is_settled(&self) -> bool {
        !self.cell.state.lock().is_pending()
    }

    /// Outcome without blocking, `None` while pending.
    pub fn peek(&self) -> Option<Result<Value, TaskError>> {
        self.cell.state.lock().outcome()
    }

    /// Block until the future settles and return its outcome.
    ///
    /// Returns immediately once settled; repeated calls return the same result.
    pub fn get(&self) -> Result<Value, TaskError> {
        let mut state = self.cell.state.lock();
        loop {
            if let Some(outcome) = state.outcome() {
                return outcome;
            }
            self.cell.settled.wait(&mut state);
        }
    }

    /// Like [`get`](Self::get) but gives up after `timeout`, returning `None`.
    ///
    /// Timing out does not affect the underlying invocation.
    pub fn get_timeout(&self, timeout: Duration) -> Option<Result<Value, TaskError>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.cell.state.lock();
        loop {
            if let Some(outcome) = state.outcome() {
                return Some(outcome);
            }
            if self
                .cell
                .settled
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return state.outcome();
            }
        }
    }

    /// Write the outcome. Returns `false` if the future was already settled.
    pub(crate) fn settle(&self, outcome: Result<Value, TaskError>) -> bool {
        let mut state = self.cell.state.lock();
        if !state.is_pending() {
            return false;
        }
        *state = match outcome {
            Ok(value) => FutureState::Resolved(value),
            Err(err) => FutureState::Failed(err),
        };
        self.cell.settled.notify_all();
        true
    }
}

/// Block until every future settles; results come back in request order.
///
/// Waits for all of them even when an earlier one failed, then reports the
/// first failure in request order.
pub fn get_all(futures: &[FutureRef]) -> Result<Vec<Value>, TaskError> {
    let outcomes: Vec<_> = futures.iter().map(FutureRef::get).collect();
    outcomes.into_iter().collect()
}

impl PartialEq for FutureRef {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.id == other.id && Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl Eq for FutureRef {}

impl fmt::Debug for FutureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match &*self.cell.state.lock() {
            FutureState::Pending => "pending",
            FutureState::Resolved(_) => "resolved",
            FutureState::Failed(_) => "failed",
        };
        f.debug_struct("FutureRef")
            .field("id", &self.id)
            .field("state", &label)
            .finish()
    }
}
