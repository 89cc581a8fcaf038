//! Runtime system
//!
//! This module contains the task graph, the dependency scheduler with its
//! worker pool, the actor runtime and the engine tying them together.

pub mod actor;
pub mod dag;
pub mod engine;
pub mod error;
pub mod function;
pub mod future;
pub mod scheduler;
pub mod value;
