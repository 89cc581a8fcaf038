//! Actor semantics through the public engine API.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use flowray::runtime::value::arg;
use flowray::walkthrough::actors::{counter_class, message_actor_class};
use flowray::walkthrough::functions::message_worker;
use flowray::{args, RemoteFunction, ShutdownMode, TaskError, Value};

use crate::common::{engine, int};

#[test]
fn test_counter_walkthrough() {
    let engine = engine(2);
    let counter = engine.instantiate(&counter_class(), args![]).unwrap();

    assert_eq!(engine.get(&counter.invoke("get_value", args![]).unwrap()), Ok(Value::Int(0)));
    counter.invoke("inc", args![]).unwrap();
    counter.invoke("inc", args![]).unwrap();
    assert_eq!(engine.get(&counter.invoke("get_value", args![]).unwrap()), Ok(Value::Int(2)));
}

#[test]
fn test_concurrent_invocations_keep_per_caller_order() {
    let engine = engine(2);
    let log = engine.instantiate(&message_actor_class(), args![]).unwrap();
    let threads: i64 = 8;
    let per_thread: i64 = 50;
    let barrier = Arc::new(Barrier::new(threads as usize));

    // Each message is `caller * 1000 + sequence`.
    let callers: Vec<_> = (0..threads)
        .map(|caller| {
            let log = log.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    log.invoke("add_message", args![caller * 1000 + i]).unwrap();
                }
            })
        })
        .collect();
    for caller in callers {
        caller.join().unwrap();
    }

    let messages = match engine.get(&log.invoke("get_and_clear_messages", args![]).unwrap()) {
        Ok(Value::List(items)) => items.iter().map(int).collect::<Vec<_>>(),
        other => panic!("expected a list, got {other:?}"),
    };
    assert_eq!(messages.len() as i64, threads * per_thread);
    for caller in 0..threads {
        let seen: Vec<_> = messages.iter().copied().filter(|m| m / 1000 == caller).collect();
        let issued: Vec<_> = (0..per_thread).map(|i| caller * 1000 + i).collect();
        assert_eq!(seen, issued, "caller {caller}");
    }
}

#[test]
fn test_handle_shared_by_tasks() {
    let engine = engine(4);
    let log = engine.instantiate(&message_actor_class(), args![]).unwrap();
    let worker = message_worker(Duration::ZERO, 1);

    let tasks = 12;
    let workers: Vec<_> = (0..tasks).map(|j| engine.submit(&worker, args![&log, j])).collect();
    engine.get_all(&workers).unwrap();

    let messages = engine
        .get(&log.invoke("get_and_clear_messages", args![]).unwrap())
        .unwrap();
    assert_eq!(messages.as_list().unwrap().len(), tasks as usize);

    let drained = engine
        .get(&log.invoke("get_and_clear_messages", args![]).unwrap())
        .unwrap();
    assert_eq!(drained, Value::List(vec![]));
}

#[test]
fn test_actors_run_in_parallel() {
    let engine = engine(1);
    let delay = Duration::from_millis(100);
    let barrier = Arc::new(Barrier::new(2));

    // Both actors must be inside a method at the same time to pass the barrier.
    let meet = {
        let barrier = barrier.clone();
        flowray::ActorClass::new("Meet", move |_| {
            Ok(Meet {
                barrier: barrier.clone(),
            })
        })
    };
    let a = engine.instantiate(&meet, args![]).unwrap();
    let b = engine.instantiate(&meet, args![]).unwrap();
    let fa = a.invoke("meet", args![]).unwrap();
    let fb = b.invoke("meet", args![]).unwrap();

    let (ready, pending) = engine.wait(&[fa, fb], 2, Some(delay * 20));
    assert_eq!(ready.len(), 2);
    assert!(pending.is_empty());
}

struct Meet {
    barrier: Arc<Barrier>,
}

impl flowray::Actor for Meet {
    fn call(&mut self, _method: &str, _args: &[Value]) -> anyhow::Result<Value> {
        self.barrier.wait();
        Ok(Value::Unit)
    }
}

#[test]
fn test_method_future_as_task_argument() {
    let engine = engine(2);
    let counter = engine.instantiate(&counter_class(), args![]).unwrap();
    counter.invoke("inc", args![]).unwrap();
    let value = counter.invoke("get_value", args![]).unwrap();

    let times_ten = RemoteFunction::new("times_ten", |args| {
        Ok(Value::Int(arg(args, 0)?.expect_int()? * 10))
    });
    let scaled = engine.submit(&times_ten, args![&value]);
    assert_eq!(engine.get(&scaled), Ok(Value::Int(10)));
}

#[test]
fn test_registered_class_by_name() {
    let engine = engine(1);
    engine.register_actor_class(counter_class());
    let counter = engine.instantiate_named("Counter", args![]).unwrap();
    assert_eq!(counter.class_name(), "Counter");
    assert!(engine.instantiate_named("Nope", args![]).is_err());
}

#[test]
fn test_terminated_actor_rejects_calls() {
    let engine = engine(1);
    let counter = engine.instantiate(&counter_class(), args![]).unwrap();
    let queued: Vec<_> = (0..10).map(|_| counter.invoke("inc", args![]).unwrap()).collect();

    engine.terminate_actor(&counter, ShutdownMode::Drain);
    assert!(queued.iter().all(|f| f.get() == Ok(Value::Unit)));
    assert!(matches!(
        counter.invoke("get_value", args![]),
        Err(TaskError::ActorTerminated { .. })
    ));
}
