//! flowray: in-process task and actor execution engine
//!
//! Plain Rust closures become remote functions whose invocations return
//! futures. Futures can be passed as arguments to further invocations; the
//! engine records the dependency and runs the task once every argument is
//! resolved, on a fixed pool of worker threads. Actors are stateful objects
//! whose methods run one at a time, in call order, on a dedicated thread.
//!
//! # Example
//!
//! ```
//! use flowray::{args, Actor, ActorClass, Engine, EngineConfig, RemoteFunction, Value};
//!
//! let engine = Engine::init(EngineConfig::with_workers(4)).unwrap();
//!
//! let square = RemoteFunction::new("square", |args| {
//!     let x = flowray::runtime::value::arg(args, 0)?.expect_int()?;
//!     Ok(Value::Int(x * x))
//! });
//! let squares: Vec<_> = (1..=4).map(|i| engine.submit(&square, args![i])).collect();
//! let values = engine.get_all(&squares).unwrap();
//! assert_eq!(values, vec![Value::Int(1), Value::Int(4), Value::Int(9), Value::Int(16)]);
//!
//! #[derive(Default)]
//! struct Counter(i64);
//!
//! impl Actor for Counter {
//!     fn call(&mut self, method: &str, _args: &[Value]) -> anyhow::Result<Value> {
//!         match method {
//!             "inc" => { self.0 += 1; Ok(Value::Unit) }
//!             _ => Ok(Value::Int(self.0)),
//!         }
//!     }
//! }
//!
//! let counter = engine
//!     .instantiate(&ActorClass::new("Counter", |_| Ok(Counter::default())), args![])
//!     .unwrap();
//! counter.invoke("inc", args![]).unwrap();
//! let value = counter.invoke("get_value", args![]).unwrap();
//! assert_eq!(engine.get(&value), Ok(Value::Int(1)));
//! ```

#![doc(html_root_url = "https://docs.rs/flowray")]
#![warn(rust_2018_idioms)]

// Public modules
pub mod runtime;
pub mod walkthrough;

// Utility modules
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};

pub use runtime::actor::{Actor, ActorClass, ActorError, ActorHandle, ActorId};
pub use runtime::dag::{Arg, EngineId, TaskId};
pub use runtime::engine::{Engine, ShutdownMode};
pub use runtime::error::{EngineError, TaskError};
pub use runtime::function::RemoteFunction;
pub use runtime::future::{get_all, FutureRef, FutureState};
pub use runtime::scheduler::{StatsSnapshot, TaskState};
pub use runtime::value::{Matrix, Value};
pub use util::config::EngineConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "flowray";
