//! Shared fixtures for the integration tests.

use std::thread;
use std::time::Duration;

use flowray::runtime::value::arg;
use flowray::{Engine, EngineConfig, RemoteFunction, Value};

pub fn engine(workers: usize) -> Engine {
    Engine::init(EngineConfig::with_workers(workers)).unwrap()
}

/// `add(x, y)` that sleeps first.
pub fn slow_add(delay: Duration) -> RemoteFunction {
    RemoteFunction::new("add", move |args| {
        thread::sleep(delay);
        Ok(arg(args, 0)?.add(arg(args, 1)?)?)
    })
}

pub fn add() -> RemoteFunction {
    slow_add(Duration::ZERO)
}

pub fn fail(message: &'static str) -> RemoteFunction {
    RemoteFunction::new("fail", move |_| anyhow::bail!(message))
}

pub fn int(value: &Value) -> i64 {
    value.as_int().unwrap()
}
