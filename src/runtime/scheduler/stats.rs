//! Scheduler statistics.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

/// Live counters, updated with atomics from workers and actor slots.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    /// Tasks accepted by `submit`.
    pub tasks_submitted: AtomicUsize,
    /// Task bodies that ran to completion (successfully or not).
    pub tasks_completed: AtomicUsize,
    /// Task bodies that returned an error or panicked.
    pub tasks_failed: AtomicUsize,
    /// Tasks failed without running because an upstream future failed.
    pub dependency_failures: AtomicUsize,
    /// Tasks cancelled before dispatch.
    pub tasks_cancelled: AtomicUsize,
    /// Actor method bodies executed.
    pub method_calls: AtomicUsize,
    /// Total body execution time in microseconds.
    pub total_exec_time_us: AtomicUsize,
    /// Peak number of concurrently running tasks.
    pub peak_parallelism: AtomicUsize,
}

impl SchedulerStats {
    #[inline]
    pub fn record_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a finished task body.
    #[inline]
    pub fn record_completed(&self, duration_us: usize, failed: bool) {
        self.tasks_completed.fetch_add(1, Ordering::SeqCst);
        self.total_exec_time_us
            .fetch_add(duration_us, Ordering::SeqCst);
        if failed {
            self.tasks_failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[inline]
    pub fn record_dependency_failure(&self) {
        self.dependency_failures.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    pub fn record_cancelled(&self) {
        self.tasks_cancelled.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    pub fn record_method_call(&self, duration_us: usize) {
        self.method_calls.fetch_add(1, Ordering::SeqCst);
        self.total_exec_time_us
            .fetch_add(duration_us, Ordering::SeqCst);
    }

    /// Update peak parallelism.
    #[inline]
    pub fn update_parallelism(&self, current: usize) {
        loop {
            let peak = self.peak_parallelism.load(Ordering::SeqCst);
            if current <= peak {
                break;
            }
            if self
                .peak_parallelism
                .compare_exchange(peak, current, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                break;
            }
        }
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            tasks_submitted: self.tasks_submitted.load(Ordering::SeqCst),
            tasks_completed: self.tasks_completed.load(Ordering::SeqCst),
            tasks_failed: self.tasks_failed.load(Ordering::SeqCst),
            dependency_failures: self.dependency_failures.load(Ordering::SeqCst),
            tasks_cancelled: self.tasks_cancelled.load(Ordering::SeqCst),
            method_calls: self.method_calls.load(Ordering::SeqCst),
            total_exec_time_us: self.total_exec_time_us.load(Ordering::SeqCst),
            peak_parallelism: self.peak_parallelism.load(Ordering::SeqCst),
        }
    }
}

/// Plain copy of [`SchedulerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub tasks_submitted: usize,
    pub tasks_completed: usize,
    pub tasks_failed: usize,
    pub dependency_failures: usize,
    pub tasks_cancelled: usize,
    pub method_calls: usize,
    pub total_exec_time_us: usize,
    pub peak_parallelism: usize,
}
