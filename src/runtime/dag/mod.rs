//! Task graph: invocations, argument slots and dependency tracking
//!
//! This module provides the data structures the scheduler uses to decide when
//! a submitted invocation may run.
//!
//! # Architecture
//!
//! - [`TaskId`](task_id::TaskId) - Unique, monotonic id of an invocation
//! - [`TaskIdGenerator`](task_id::TaskIdGenerator) - Thread-safe id generator
//! - [`EngineId`](task_id::EngineId) - Engine that owns and settles a future
//! - [`Arg`](builder::Arg) - Literal value or future argument slot
//! - [`admit`](builder::admit) - Dependency extraction at submission
//! - [`TaskInvocation`](node::TaskInvocation) - Immutable record of one submission
//! - [`TaskNode`](node::TaskNode) - Invocation parked until its futures resolve
//! - [`TaskGraph`](graph::TaskGraph) - Waiting set indexed by awaited future

pub mod builder;
pub mod graph;
pub mod node;
pub mod task_id;

pub use builder::{admit, materialize, Admission, Arg};
pub use graph::TaskGraph;
pub use node::{Dependencies, TaskInvocation, TaskNode};
pub use task_id::{EngineId, TaskId, TaskIdGenerator};

#[cfg(test)]
mod tests;
