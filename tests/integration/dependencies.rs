//! Dependency resolution through the public engine API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use flowray::runtime::value::arg;
use flowray::{args, RemoteFunction, ShutdownMode, TaskError, TaskState, Value};

use crate::common::{add, engine, int, slow_add};

#[test]
fn test_get_submit_matches_direct_call() {
    let engine = engine(2);
    let future = engine.submit(&add(), args![20, 22]);
    assert_eq!(engine.get(&future), Ok(Value::Int(42)));
    // Reading a settled future again returns the same outcome.
    assert_eq!(future.get(), Ok(Value::Int(42)));
}

#[test]
fn test_parallel_tasks_overlap() {
    let engine = engine(4);
    let delay = Duration::from_millis(100);
    let sleepy = RemoteFunction::new("f", move |args| {
        std::thread::sleep(delay);
        Ok(arg(args, 0)?.clone())
    });

    let start = Instant::now();
    let futures: Vec<_> = (0..4).map(|i| engine.submit(&sleepy, args![i])).collect();
    let values = engine.get_all(&futures).unwrap();
    let elapsed = start.elapsed();

    assert_eq!(values, (0..4).map(Value::Int).collect::<Vec<_>>());
    assert!(elapsed < delay * 3, "took {elapsed:?}");
}

#[test]
fn test_dependent_task_sees_resolved_values() {
    let engine = engine(2);
    let x = engine.submit(&add(), args![1, 1]);
    let y = engine.submit(&add(), args![2, 2]);
    let z = engine.submit(&add(), args![&x, &y]);
    assert_eq!(int(&engine.get(&z).unwrap()), 6);
}

#[test]
fn test_same_future_twice_is_one_dependency() {
    let engine = engine(1);
    let x = engine.submit(&slow_add(Duration::from_millis(20)), args![2, 3]);
    let doubled = engine.submit(&add(), args![&x, &x]);
    assert_eq!(engine.get(&doubled), Ok(Value::Int(10)));
}

#[test]
fn test_dependent_runs_after_its_dependency() {
    let engine = engine(4);
    let order = Arc::new(AtomicUsize::new(0));

    let stamp = |order: Arc<AtomicUsize>| {
        RemoteFunction::new("stamp", move |_| {
            Ok(Value::Int(order.fetch_add(1, Ordering::SeqCst) as i64))
        })
    };
    let first = engine.submit(&stamp(order.clone()), args![]);
    let second = engine.submit(&stamp(order.clone()), args![&first]);

    let first = int(&engine.get(&first).unwrap());
    let second = int(&engine.get(&second).unwrap());
    assert!(first < second);
}

#[test]
fn test_put_values_compose() {
    let engine = engine(1);
    let stored = engine.put(Value::from("flow"));
    assert_eq!(engine.task_state(&stored), TaskState::Finished);
    let joined = engine.submit(&add(), args![&stored, "ray"]);
    assert_eq!(engine.get(&joined), Ok(Value::from("flowray")));
}

#[test]
fn test_registered_function_by_name() {
    let engine = engine(1);
    assert!(engine.register_function(add()).is_none());
    let future = engine.submit_named("add", args![1, 2]).unwrap();
    assert_eq!(engine.get(&future), Ok(Value::Int(3)));
    assert!(engine.submit_named("missing", args![]).is_err());
}

#[test]
fn test_pending_future_of_another_engine_fails_fast() {
    let upstream = engine(1);
    let downstream = engine(1);
    assert_ne!(upstream.id(), downstream.id());

    let pending = upstream.submit(&slow_add(Duration::from_millis(100)), args![1, 2]);
    let dependent = downstream.submit(&add(), args![&pending, 10]);
    match downstream.get(&dependent) {
        Err(TaskError::ForeignFuture { dependency, owner, .. }) => {
            assert_eq!(dependency, pending.id());
            assert_eq!(owner, upstream.id());
        }
        other => panic!("expected a foreign future failure, got {other:?}"),
    }
    assert_eq!(downstream.task_state(&dependent), TaskState::Failed);

    // Task ids overlap between engines; the other engine must not touch it.
    assert!(!downstream.cancel(&pending));
    assert_ne!(upstream.task_state(&pending), TaskState::Cancelled);

    // Waiting from the other engine still sees it settle.
    let (ready, waiting) = downstream.wait(
        std::slice::from_ref(&pending),
        1,
        Some(Duration::from_secs(5)),
    );
    assert_eq!(ready, vec![pending.clone()]);
    assert!(waiting.is_empty());
    assert_eq!(upstream.get(&pending), Ok(Value::Int(3)));

    downstream.shutdown(ShutdownMode::Drain);
    assert!(downstream.is_shut_down());
}

#[test]
fn test_settled_future_of_another_engine_is_a_plain_value() {
    let upstream = engine(1);
    let downstream = engine(1);
    let sum = upstream.submit(&add(), args![1, 2]);
    assert_eq!(upstream.get(&sum), Ok(Value::Int(3)));

    let total = downstream.submit(&add(), args![&sum, 10]);
    assert_eq!(downstream.get(&total), Ok(Value::Int(13)));
    downstream.shutdown(ShutdownMode::Drain);
}
