//! Remote functions used by the walkthrough.

use std::thread;
use std::time::Duration;

use crate::runtime::function::RemoteFunction;
use crate::runtime::value::{arg, Matrix, Value};
use crate::args;

/// `f(x)`: sleep, then return `x`.
pub fn sleepy_identity(delay: Duration) -> RemoteFunction {
    RemoteFunction::new("f", move |args| {
        thread::sleep(delay);
        Ok(arg(args, 0)?.clone())
    })
}

/// `create_matrix(rows, cols)`: standard-normal random matrix.
pub fn create_matrix() -> RemoteFunction {
    RemoteFunction::new("create_matrix", |args| {
        let rows = arg(args, 0)?.expect_int()?;
        let cols = arg(args, 1)?.expect_int()?;
        anyhow::ensure!(rows > 0 && cols > 0, "matrix shape must be positive, got {rows}x{cols}");
        Ok(Value::Matrix(Matrix::random_normal(rows as usize, cols as usize)))
    })
}

/// `multiply_matrices(x, y)`: matrix product.
pub fn multiply_matrices() -> RemoteFunction {
    RemoteFunction::new("multiply_matrices", |args| {
        let x = arg(args, 0)?.expect_matrix()?;
        let y = arg(args, 1)?.expect_matrix()?;
        Ok(Value::Matrix(x.dot(y)?))
    })
}

/// `add(x, y)`: sleep, then add.
pub fn add(delay: Duration) -> RemoteFunction {
    RemoteFunction::new("add", move |args| {
        thread::sleep(delay);
        Ok(arg(args, 0)?.add(arg(args, 1)?)?)
    })
}

/// `worker(message_actor, j)`: push `count` messages to the actor, one per
/// `delay`. Returns the number of messages sent.
pub fn message_worker(delay: Duration, count: usize) -> RemoteFunction {
    RemoteFunction::new("worker", move |args| {
        let actor = arg(args, 0)?.expect_actor()?;
        let worker = arg(args, 1)?.expect_int()?;
        for i in 0..count {
            thread::sleep(delay);
            actor.invoke("add_message", args![format!("Message {i} from worker {worker}.")])?;
        }
        Ok(Value::Int(count as i64))
    })
}
