//! Ready queue for the scheduler
//!
//! FIFO of invocations whose dependencies are all resolved. It is not locked
//! itself; it lives inside the scheduler state mutex together with the task
//! graph, so every insert/decrement/move happens in one critical section.

use std::collections::VecDeque;

use crate::runtime::dag::{TaskId, TaskInvocation};

/// FIFO of dispatchable invocations.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    inner: VecDeque<TaskInvocation>,
}

impl ReadyQueue {
    /// Create a new empty ready queue.
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: VecDeque::new(),
        }
    }

    /// Push an invocation to the back of the queue.
    #[inline]
    pub fn push(&mut self, invocation: TaskInvocation) {
        self.inner.push_back(invocation);
    }

    /// Pop the oldest ready invocation.
    #[inline]
    pub fn pop(&mut self) -> Option<TaskInvocation> {
        self.inner.pop_front()
    }

    /// Remove a queued invocation by id (cancellation).
    pub fn remove(&mut self, task: TaskId) -> Option<TaskInvocation> {
        let index = self.inner.iter().position(|inv| inv.id() == task)?;
        self.inner.remove(index)
    }

    #[inline]
    pub fn contains(&self, task: TaskId) -> bool {
        self.inner.iter().any(|inv| inv.id() == task)
    }

    /// Take every queued invocation, oldest first.
    pub fn drain(&mut self) -> Vec<TaskInvocation> {
        self.inner.drain(..).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
