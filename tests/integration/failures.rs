//! Failure capture and propagation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use flowray::{args, RemoteFunction, TaskError, Value};

use crate::common::{add, engine, fail};

fn counted(runs: Arc<AtomicUsize>) -> RemoteFunction {
    RemoteFunction::new("counted", move |_| {
        runs.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Unit)
    })
}

#[test]
fn test_dependents_fail_and_never_run() {
    let engine = engine(2);
    let runs = Arc::new(AtomicUsize::new(0));

    let root = engine.submit(&fail("disk full"), args![]);
    let child = engine.submit(&counted(runs.clone()), args![&root]);
    let grandchild = engine.submit(&counted(runs.clone()), args![&child, 1]);
    let independent = engine.submit(&add(), args![1, 2]);

    let err = engine.get(&grandchild).unwrap_err();
    match err.root_cause() {
        TaskError::Execution { message, .. } => assert_eq!(message, "disk full"),
        other => panic!("unexpected root cause {other:?}"),
    }
    assert!(engine.get(&child).unwrap_err().is_dependency_failure());
    assert_eq!(engine.get(&independent), Ok(Value::Int(3)));
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn test_get_all_waits_for_all_and_reports_first_failure() {
    let engine = engine(2);
    let ok = engine.submit(&add(), args![1, 1]);
    let first = engine.submit(&fail("first"), args![]);
    let second = engine.submit(&fail("second"), args![]);

    let err = engine.get_all(&[ok.clone(), first, second.clone()]).unwrap_err();
    assert!(matches!(err, TaskError::Execution { ref message, .. } if message == "first"));
    assert!(ok.is_settled() && second.is_settled());
}

#[test]
fn test_panicking_task_does_not_stop_engine() {
    let engine = engine(1);
    let panics = RemoteFunction::new("panics", |_| -> anyhow::Result<Value> { panic!("bad input") });

    let err = engine.get(&engine.submit(&panics, args![])).unwrap_err();
    match err {
        TaskError::Panicked { message, .. } => assert_eq!(message, "bad input"),
        other => panic!("expected a panic, got {other:?}"),
    }
    assert_eq!(engine.get(&engine.submit(&add(), args![2, 3])), Ok(Value::Int(5)));
    assert_eq!(engine.stats().tasks_failed, 1);
}

#[test]
fn test_type_mismatch_is_an_execution_error() {
    let engine = engine(1);
    let err = engine.get(&engine.submit(&add(), args![1, true])).unwrap_err();
    assert!(err.to_string().contains("cannot add"));
}

#[test]
fn test_method_failure_propagates_to_tasks() {
    let engine = engine(1);
    let counter = engine
        .instantiate(&flowray::walkthrough::actors::counter_class(), args![])
        .unwrap();
    let missing = counter.invoke("dec", args![]).unwrap();
    let dependent = engine.submit(&add(), args![&missing, 1]);

    let err = engine.get(&dependent).unwrap_err();
    assert!(err.is_dependency_failure());
    assert!(err.root_cause().to_string().contains("unknown method `dec`"));
}
