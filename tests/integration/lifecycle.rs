//! wait, cancel, shutdown and configuration.

use std::sync::{Arc, Barrier};
use std::time::Duration;

use flowray::walkthrough::actors::counter_class;
use flowray::{args, Engine, EngineConfig, EngineError, RemoteFunction, ShutdownMode, TaskError, TaskState, Value};

use crate::common::{add, engine, slow_add};

fn gate(barrier: Arc<Barrier>) -> RemoteFunction {
    RemoteFunction::new("gate", move |_| {
        barrier.wait();
        Ok(Value::Unit)
    })
}

#[test]
fn test_wait_returns_settled_first_in_input_order() {
    let engine = engine(2);
    let slow = engine.submit(&slow_add(Duration::from_millis(300)), args![1, 1]);
    let fast = engine.submit(&add(), args![2, 2]);
    let stored = engine.put(Value::Int(7));

    let (ready, pending) = engine.wait(&[slow.clone(), fast.clone(), stored.clone()], 2, None);
    assert_eq!(ready, vec![fast, stored]);
    assert_eq!(pending, vec![slow.clone()]);
    assert_eq!(engine.get(&slow), Ok(Value::Int(2)));
}

#[test]
fn test_wait_timeout_cancels_nothing() {
    let engine = engine(1);
    let slow = engine.submit(&slow_add(Duration::from_millis(200)), args![1, 2]);
    let (ready, pending) = engine.wait(std::slice::from_ref(&slow), 1, Some(Duration::from_millis(10)));
    assert!(ready.is_empty());
    assert_eq!(pending.len(), 1);
    assert_eq!(engine.get(&slow), Ok(Value::Int(3)));
}

#[test]
fn test_cancel_before_dispatch() {
    let engine = engine(1);
    let barrier = Arc::new(Barrier::new(2));
    let blocker = engine.submit(&gate(barrier.clone()), args![]);
    let waiting = engine.submit(&add(), args![&blocker, 1]);
    let dependent = engine.submit(&add(), args![&waiting, 1]);

    assert_eq!(engine.task_state(&waiting), TaskState::Waiting);
    assert!(engine.cancel(&waiting));
    assert_eq!(engine.task_state(&waiting), TaskState::Cancelled);
    assert!(matches!(
        engine.get(&dependent).unwrap_err().root_cause(),
        TaskError::Cancelled { .. }
    ));

    barrier.wait();
    assert_eq!(engine.get(&blocker), Ok(Value::Unit));
    assert!(!engine.cancel(&blocker));
    assert!(!engine.cancel(&engine.put(Value::Unit)));
}

#[test]
fn test_drain_shutdown_completes_everything() {
    let engine = engine(2);
    let counter = engine.instantiate(&counter_class(), args![]).unwrap();
    let futures: Vec<_> = (0..6)
        .map(|i| engine.submit(&slow_add(Duration::from_millis(10)), args![i, 1]))
        .collect();
    let incs: Vec<_> = (0..5).map(|_| counter.invoke("inc", args![]).unwrap()).collect();

    engine.shutdown(ShutdownMode::Drain);
    assert!(engine.is_shut_down());
    assert!(futures.iter().chain(&incs).all(|f| f.get().is_ok()));

    assert_eq!(
        engine.get(&engine.submit(&add(), args![1, 1])),
        Err(TaskError::EngineShutdown)
    );
    assert!(matches!(
        counter.invoke("inc", args![]),
        Err(TaskError::ActorTerminated { .. })
    ));
    assert!(matches!(
        engine.instantiate(&counter_class(), args![]),
        Err(EngineError::ShutDown)
    ));

    // Idempotent.
    engine.shutdown(ShutdownMode::Abandon);
}

#[test]
fn test_shutdown_flag_readable_from_task_during_drain() {
    let engine = engine(1);
    let barrier = Arc::new(Barrier::new(2));

    let observer = engine.clone();
    let body_barrier = barrier.clone();
    let observe = RemoteFunction::new("observe", move |_| {
        body_barrier.wait();
        Ok(Value::from(observer.is_shut_down()))
    });
    let seen = engine.submit(&observe, args![]);
    drop(observe);

    let releaser = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        barrier.wait();
    });
    engine.shutdown(ShutdownMode::Drain);
    releaser.join().unwrap();

    assert_eq!(seen.get(), Ok(Value::from(false)));
    assert!(engine.is_shut_down());
}

#[test]
fn test_abandon_shutdown_fails_undispatched_work() {
    let engine = engine(1);
    let barrier = Arc::new(Barrier::new(2));
    let blocker = engine.submit(&gate(barrier.clone()), args![]);
    let queued = engine.submit(&add(), args![1, 1]);
    let waiting = engine.submit(&add(), args![&blocker, 1]);
    while engine.task_state(&blocker) != TaskState::Running {
        std::thread::yield_now();
    }

    let releaser = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        barrier.wait();
    });
    engine.shutdown(ShutdownMode::Abandon);
    releaser.join().unwrap();

    assert_eq!(engine.get(&blocker), Ok(Value::Unit));
    assert!(matches!(engine.get(&queued), Err(TaskError::Abandoned { .. })));
    assert!(matches!(engine.get(&waiting), Err(TaskError::Abandoned { .. })));
}

#[test]
fn test_drop_runs_configured_shutdown() {
    let config = EngineConfig {
        shutdown_mode: ShutdownMode::Drain,
        ..EngineConfig::with_workers(2)
    };
    let engine = Engine::init(config).unwrap();
    let clone = engine.clone();
    let future = clone.submit(&slow_add(Duration::from_millis(20)), args![1, 2]);

    drop(engine);
    drop(clone);
    assert_eq!(future.get(), Ok(Value::Int(3)));
}

#[test]
fn test_invalid_config_rejected() {
    let err = Engine::init(EngineConfig::with_workers(0)).unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}

#[test]
fn test_stats_snapshot_serializes() {
    let engine = engine(2);
    let futures: Vec<_> = (0..3).map(|i| engine.submit(&add(), args![i, i])).collect();
    engine.get_all(&futures).unwrap();

    let stats = engine.stats();
    assert_eq!(stats.tasks_submitted, 3);
    let json = serde_json::to_value(stats).unwrap();
    assert_eq!(json["tasks_completed"], 3);
}
