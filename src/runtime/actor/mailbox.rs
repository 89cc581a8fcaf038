//! Per-actor FIFO mailbox.
//!
//! Many producers (any holder of a handle), one consumer (the actor's slot
//! thread). Insertion order is execution order. Once closed, sends are
//! rejected; the consumer still receives what was queued before the close
//! unless the queue was taken.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

#[derive(Debug)]
struct MailboxState<T> {
    queue: VecDeque<T>,
    closed: bool,
}

/// Unbounded multi-producer mailbox with a blocking receiver.
#[derive(Debug)]
pub(crate) struct Mailbox<T> {
    state: Mutex<MailboxState<T>>,
    available: Condvar,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MailboxState {
                queue: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Enqueue a message; hands it back if the mailbox is closed.
    pub fn send(&self, message: T) -> Result<(), T> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(message);
        }
        state.queue.push_back(message);
        self.available.notify_one();
        Ok(())
    }

    /// Block until a message arrives.
    ///
    /// Returns `None` once the mailbox is closed and empty.
    pub fn recv(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(message) = state.queue.pop_front() {
                return Some(message);
            }
            if state.closed {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Reject further sends; queued messages are still delivered.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.available.notify_all();
    }

    /// Reject further sends and take every queued message.
    pub fn close_and_take(&self) -> Vec<T> {
        let mut state = self.state.lock();
        state.closed = true;
        self.available.notify_all();
        state.queue.drain(..).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }
}
