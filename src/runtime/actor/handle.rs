//! Actor handles and the state shared between a handle and its slot.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::mailbox::Mailbox;
use super::ActorId;
use crate::runtime::dag::{Arg, TaskId};
use crate::runtime::error::TaskError;
use crate::runtime::future::FutureRef;
use crate::runtime::scheduler::SchedulerCore;

/// One queued method call.
#[derive(Debug)]
pub(crate) struct MethodInvocation {
    pub id: TaskId,
    pub method: Arc<str>,
    pub args: Vec<Arg>,
    pub submitted_at: Instant,
    pub future: FutureRef,
}

/// State shared by every handle of one actor and its slot thread.
#[derive(Debug)]
pub(crate) struct ActorShared {
    id: ActorId,
    class: Arc<str>,
    mailbox: Mailbox<MethodInvocation>,
    /// Why the actor stopped accepting calls; first writer wins.
    reason: Mutex<Option<Arc<str>>>,
}

impl ActorShared {
    pub fn new(id: ActorId, class: Arc<str>) -> Self {
        Self {
            id,
            class,
            mailbox: Mailbox::new(),
            reason: Mutex::new(None),
        }
    }

    #[inline]
    pub fn id(&self) -> ActorId {
        self.id
    }

    #[inline]
    pub fn class(&self) -> &Arc<str> {
        &self.class
    }

    #[inline]
    pub fn mailbox(&self) -> &Mailbox<MethodInvocation> {
        &self.mailbox
    }

    fn terminated(&self) -> TaskError {
        let reason = self
            .reason
            .lock()
            .clone()
            .unwrap_or_else(|| Arc::from("terminated"));
        TaskError::ActorTerminated {
            actor: self.id,
            reason,
        }
    }

    fn record_reason(&self, reason: &str) {
        let mut slot = self.reason.lock();
        if slot.is_none() {
            *slot = Some(Arc::from(reason));
        }
    }

    /// Stop accepting calls; queued ones still run.
    pub fn close(&self, reason: &str) {
        self.record_reason(reason);
        self.mailbox.close();
    }

    /// Stop accepting calls and fail every queued one with `ActorTerminated`.
    ///
    /// Returns the number of calls failed.
    pub fn abandon(&self, reason: &str, core: &SchedulerCore) -> usize {
        self.record_reason(reason);
        let queued = self.mailbox.close_and_take();
        let err = self.terminated();
        for call in &queued {
            core.settle_external(&call.future, Err(err.clone()));
        }
        if !queued.is_empty() {
            debug!(actor = %self.id, abandoned = queued.len(), "failed queued method calls");
        }
        queued.len()
    }
}

/// Cloneable, thread-safe reference to an actor.
///
/// A handle can only enqueue invocations. Handles may be passed to tasks and
/// other actors as arguments; every holder feeds the same mailbox.
#[derive(Clone)]
pub struct ActorHandle {
    shared: Arc<ActorShared>,
    core: Arc<SchedulerCore>,
}

impl ActorHandle {
    pub(crate) fn new(shared: Arc<ActorShared>, core: Arc<SchedulerCore>) -> Self {
        Self { shared, core }
    }

    #[inline]
    pub fn id(&self) -> ActorId {
        self.shared.id()
    }

    #[inline]
    pub fn class_name(&self) -> &str {
        self.shared.class()
    }

    /// Whether the actor stopped accepting invocations.
    pub fn is_terminated(&self) -> bool {
        self.shared.mailbox().is_closed()
    }

    #[inline]
    pub(crate) fn shared(&self) -> &Arc<ActorShared> {
        &self.shared
    }

    /// Enqueue a method invocation and return its future.
    ///
    /// Never waits for the method to run. Invocations from one caller run in
    /// the order they were issued; racing callers are ordered by arrival.
    ///
    /// # Errors
    ///
    /// `TaskError::ActorTerminated` once the actor or the engine shut down.
    pub fn invoke(&self, method: &str, args: Vec<Arg>) -> Result<FutureRef, TaskError> {
        if !self.core.track_external() {
            return Err(TaskError::ActorTerminated {
                actor: self.id(),
                reason: Arc::from("engine is shut down"),
            });
        }

        let id = self.core.next_id();
        let future = FutureRef::pending(self.core.id(), id);
        let call = MethodInvocation {
            id,
            method: Arc::from(method),
            args,
            submitted_at: Instant::now(),
            future: future.clone(),
        };

        match self.shared.mailbox().send(call) {
            Ok(()) => {
                trace!(actor = %self.id(), task = %id, method, "method call queued");
                Ok(future)
            }
            Err(_) => {
                self.core.untrack_external();
                Err(self.shared.terminated())
            }
        }
    }
}

impl PartialEq for ActorHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for ActorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorHandle")
            .field("id", &self.id())
            .field("class", &self.class_name())
            .finish()
    }
}
