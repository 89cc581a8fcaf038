//! Value types carried through the task graph
//!
//! Arguments and results of tasks and actor methods are [`Value`]s.

pub mod matrix;
pub mod runtime_value;

pub use matrix::{Matrix, ShapeError};
pub use runtime_value::*;
