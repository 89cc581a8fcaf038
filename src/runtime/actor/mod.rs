//! Actor runtime
//!
//! Each actor owns one slot thread and one FIFO mailbox. The state lives on
//! the slot thread from construction until termination, so methods of one
//! actor run strictly in enqueue order while different actors run in
//! parallel. Method futures are tracked by the scheduler core like task
//! futures and can be passed to tasks as arguments.

pub mod class;
pub mod handle;
mod mailbox;
mod slot;

pub use class::{Actor, ActorClass, ActorError};
pub use handle::ActorHandle;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::runtime::dag::Arg;
use crate::runtime::engine::ShutdownMode;
use crate::runtime::error::EngineError;
use crate::runtime::scheduler::SchedulerCore;
use self::handle::ActorShared;

/// Identifier of an actor, unique within one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorId(pub u64);

impl ActorId {
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor({})", self.0)
    }
}

#[derive(Debug)]
struct ActorSlot {
    shared: Arc<ActorShared>,
    thread: thread::JoinHandle<()>,
}

/// Registry of live actors and their slot threads.
#[derive(Debug)]
pub struct ActorRuntime {
    core: Arc<SchedulerCore>,
    next_id: AtomicU64,
    actors: Mutex<IndexMap<ActorId, ActorSlot>>,
}

impl ActorRuntime {
    pub fn new(core: Arc<SchedulerCore>) -> Self {
        Self {
            core,
            next_id: AtomicU64::new(0),
            actors: Mutex::new(IndexMap::new()),
        }
    }

    /// Create an actor and start its slot thread.
    ///
    /// The constructor runs on the slot thread once its arguments resolve;
    /// calls issued before that are queued behind it.
    pub fn instantiate(&self, class: &ActorClass, args: Vec<Arg>) -> Result<ActorHandle, EngineError> {
        if !self.core.is_accepting() {
            return Err(EngineError::ShutDown);
        }

        let id = ActorId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let shared = Arc::new(ActorShared::new(id, class.shared_name()));
        let thread = slot::spawn_slot(shared.clone(), self.core.clone(), class.clone(), args)?;

        let mut actors = self.actors.lock();
        // Forget slots whose threads already exited (panic, failed constructor).
        actors.retain(|_, slot| !slot.thread.is_finished());
        actors.insert(
            id,
            ActorSlot {
                shared: shared.clone(),
                thread,
            },
        );
        drop(actors);
        // Lost a race with shutdown: the slot would never be stopped otherwise.
        if !self.core.is_accepting() {
            shared.close("engine shut down");
        }
        debug!(actor = %id, class = %class.name(), "actor instantiated");

        Ok(ActorHandle::new(shared, self.core.clone()))
    }

    /// Stop one actor and wait for its slot thread.
    ///
    /// `Drain` lets queued calls run first; `Abandon` fails them with
    /// `ActorTerminated`. The call in flight always completes.
    pub fn terminate(&self, handle: &ActorHandle, mode: ShutdownMode) {
        stop(handle.shared(), &self.core, mode, "terminated");
        let slot = self.actors.lock().shift_remove(&handle.id());
        if let Some(slot) = slot {
            join_slot(slot);
        }
    }

    /// Stop every actor and wait for all slot threads.
    pub fn shutdown_all(&self, mode: ShutdownMode) {
        let slots: Vec<ActorSlot> = self.actors.lock().drain(..).map(|(_, slot)| slot).collect();
        for slot in &slots {
            stop(&slot.shared, &self.core, mode, "engine shut down");
        }
        for slot in slots {
            join_slot(slot);
        }
    }

    /// Actors registered and not yet terminated.
    pub fn len(&self) -> usize {
        self.actors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn stop(shared: &ActorShared, core: &SchedulerCore, mode: ShutdownMode, reason: &str) {
    match mode {
        ShutdownMode::Drain => shared.close(reason),
        ShutdownMode::Abandon => {
            shared.abandon(reason, core);
        }
    }
}

fn join_slot(slot: ActorSlot) {
    // An actor terminating itself cannot join its own thread.
    if slot.thread.thread().id() == thread::current().id() {
        return;
    }
    if slot.thread.join().is_err() {
        error!(actor = %slot.shared.id(), "actor thread panicked outside a method body");
    }
}
