//! Task graph unit tests
//!
//! Covers argument admission, readiness bookkeeping and failure fan-out.

use std::sync::Arc;

use crate::runtime::dag::{
    admit, materialize, Admission, Arg, Dependencies, EngineId, TaskGraph, TaskId,
    TaskIdGenerator, TaskInvocation, TaskNode,
};
use crate::runtime::error::TaskError;
use crate::runtime::function::RemoteFunction;
use crate::runtime::future::FutureRef;
use crate::runtime::value::Value;

fn noop() -> RemoteFunction {
    RemoteFunction::new("noop", |_| Ok(Value::Unit))
}

fn invocation(id: u64, args: Vec<Arg>) -> TaskInvocation {
    TaskInvocation::new(EngineId(0), TaskId(id), noop(), args)
}

fn deps(ids: &[u64]) -> Dependencies {
    ids.iter().map(|&id| TaskId(id)).collect()
}

#[cfg(test)]
mod task_id_tests {
    use super::*;

    #[test]
    fn test_task_id_new() {
        let id = TaskId::new(1);
        assert_eq!(id.value(), 1);
    }

    #[test]
    fn test_task_id_display() {
        assert_eq!(format!("{}", TaskId(42)), "Task(42)");
    }

    #[test]
    fn test_generator_is_monotonic() {
        let generator = TaskIdGenerator::new();
        let ids: Vec<_> = (0..5).map(|_| generator.generate()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(generator.issued(), 5);
    }

    #[test]
    fn test_generator_is_unique_across_threads() {
        let generator = Arc::new(TaskIdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = generator.clone();
                std::thread::spawn(move || {
                    (0..100).map(|_| generator.generate()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<_> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 400);
    }
}

#[cfg(test)]
mod admission_tests {
    use super::*;

    #[test]
    fn test_literals_are_ready() {
        let args = crate::args![1, "two", 3.0];
        assert!(matches!(admit(EngineId(0), &args), Admission::Ready));
    }

    #[test]
    fn test_resolved_future_adds_no_edge() {
        let done = FutureRef::settled(EngineId(0), TaskId(0), Ok(Value::Int(3)));
        let args = crate::args![&done, 4];
        assert!(matches!(admit(EngineId(0), &args), Admission::Ready));
    }

    #[test]
    fn test_pending_futures_are_deduplicated() {
        let pending = FutureRef::pending(EngineId(0), TaskId(5));
        let other = FutureRef::pending(EngineId(0), TaskId(6));
        let args = crate::args![&pending, &pending, &other];
        match admit(EngineId(0), &args) {
            Admission::Waiting(found) => assert_eq!(found.as_slice(), &[TaskId(5), TaskId(6)]),
            other => panic!("expected waiting, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_future_dooms_task() {
        let failed = FutureRef::settled(
            EngineId(0),
            TaskId(9),
            Err(TaskError::Cancelled { task: TaskId(9) }),
        );
        let pending = FutureRef::pending(EngineId(0), TaskId(10));
        let args = crate::args![&pending, &failed];
        match admit(EngineId(0), &args) {
            Admission::Doomed { dependency, cause } => {
                assert_eq!(dependency, TaskId(9));
                assert_eq!(cause, TaskError::Cancelled { task: TaskId(9) });
            }
            other => panic!("expected doomed, got {other:?}"),
        }
    }

    #[test]
    fn test_pending_future_of_other_engine_is_refused() {
        let local = FutureRef::pending(EngineId(0), TaskId(5));
        let foreign = FutureRef::pending(EngineId(1), TaskId(5));
        let args = crate::args![&local, &foreign];
        match admit(EngineId(0), &args) {
            Admission::Foreign { dependency, owner } => {
                assert_eq!(dependency, TaskId(5));
                assert_eq!(owner, EngineId(1));
            }
            other => panic!("expected foreign, got {other:?}"),
        }
    }

    #[test]
    fn test_settled_future_of_other_engine_is_accepted() {
        let resolved = FutureRef::settled(EngineId(1), TaskId(0), Ok(Value::Int(3)));
        assert!(matches!(
            admit(EngineId(0), &crate::args![&resolved, 4]),
            Admission::Ready
        ));

        let failed = FutureRef::settled(
            EngineId(1),
            TaskId(1),
            Err(TaskError::Cancelled { task: TaskId(1) }),
        );
        assert!(matches!(
            admit(EngineId(0), &crate::args![&failed]),
            Admission::Doomed { dependency: TaskId(1), .. }
        ));
    }

    #[test]
    fn test_materialize_substitutes_values() {
        let done = FutureRef::settled(EngineId(0), TaskId(0), Ok(Value::Int(3)));
        let values = materialize(TaskId(1), &crate::args![&done, 4]).unwrap();
        assert_eq!(values, vec![Value::Int(3), Value::Int(4)]);
    }

    #[test]
    fn test_materialize_wraps_failure() {
        let failed = FutureRef::settled(
            EngineId(0),
            TaskId(0),
            Err(TaskError::Cancelled { task: TaskId(0) }),
        );
        let err = materialize(TaskId(1), &crate::args![&failed]).unwrap_err();
        assert!(err.is_dependency_failure());
        assert_eq!(err.root_cause(), &TaskError::Cancelled { task: TaskId(0) });
    }
}

#[cfg(test)]
mod node_tests {
    use super::*;

    #[test]
    fn test_node_counts_down() {
        let mut node = TaskNode::new(invocation(3, vec![]), deps(&[1, 2]));
        assert_eq!(node.remaining(), 2);
        assert!(node.depends_on(TaskId(1)));
        assert!(!node.depends_on(TaskId(3)));
        assert!(!node.resolve_one());
        assert!(node.resolve_one());
    }

    #[test]
    #[should_panic(expected = "dependency count underflow")]
    fn test_node_underflow_is_fatal() {
        let mut node = TaskNode::new(invocation(3, vec![]), deps(&[1]));
        node.resolve_one();
        node.resolve_one();
    }

    #[test]
    fn test_node_display() {
        let node = TaskNode::new(invocation(3, vec![]), deps(&[1]));
        let display = node.to_string();
        assert!(display.contains("noop"));
        assert!(display.contains("1/1"));
    }
}

#[cfg(test)]
mod graph_tests {
    use super::*;

    #[test]
    fn test_resolve_releases_single_dependency() {
        let mut graph = TaskGraph::new();
        graph.insert(invocation(2, vec![]), deps(&[1]));
        assert!(graph.contains(TaskId(2)));
        assert_eq!(graph.waiters_of(TaskId(1)), 1);

        let ready = graph.resolve(TaskId(1));
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id(), TaskId(2));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_fan_in_waits_for_all() {
        let mut graph = TaskGraph::new();
        graph.insert(invocation(3, vec![]), deps(&[1, 2]));

        assert!(graph.resolve(TaskId(1)).is_empty());
        assert_eq!(graph.get(TaskId(3)).unwrap().remaining(), 1);
        let ready = graph.resolve(TaskId(2));
        assert_eq!(ready.len(), 1);
    }

    #[test]
    fn test_fan_out_releases_every_waiter() {
        let mut graph = TaskGraph::new();
        for id in 2..6 {
            graph.insert(invocation(id, vec![]), deps(&[1]));
        }
        let ready = graph.resolve(TaskId(1));
        assert_eq!(ready.len(), 4);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_resolve_unknown_future_is_noop() {
        let mut graph = TaskGraph::new();
        assert!(graph.resolve(TaskId(99)).is_empty());
    }

    #[test]
    fn test_fail_returns_direct_dependents_only() {
        let mut graph = TaskGraph::new();
        // 2 <- 1, 3 <- 2
        graph.insert(invocation(2, vec![]), deps(&[1]));
        graph.insert(invocation(3, vec![]), deps(&[2]));

        let failed = graph.fail(TaskId(1));
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id(), TaskId(2));
        assert!(graph.contains(TaskId(3)));

        let failed = graph.fail(TaskId(2));
        assert_eq!(failed[0].id(), TaskId(3));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_fail_unlinks_other_dependencies() {
        let mut graph = TaskGraph::new();
        graph.insert(invocation(3, vec![]), deps(&[1, 2]));
        assert_eq!(graph.fail(TaskId(1)).len(), 1);
        assert_eq!(graph.waiters_of(TaskId(2)), 0);
        // A later failure of the other dependency finds nothing to fail twice.
        assert!(graph.fail(TaskId(2)).is_empty());
    }

    #[test]
    fn test_remove_waiting_task() {
        let mut graph = TaskGraph::new();
        graph.insert(invocation(2, vec![]), deps(&[1]));
        graph.insert(invocation(3, vec![]), deps(&[1]));

        let removed = graph.remove(TaskId(2)).unwrap();
        assert_eq!(removed.id(), TaskId(2));
        assert_eq!(graph.waiters_of(TaskId(1)), 1);
        assert!(graph.remove(TaskId(2)).is_none());

        let ready = graph.resolve(TaskId(1));
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id(), TaskId(3));
    }

    #[test]
    fn test_drain_returns_oldest_first() {
        let mut graph = TaskGraph::new();
        graph.insert(invocation(7, vec![]), deps(&[1]));
        graph.insert(invocation(4, vec![]), deps(&[2]));
        graph.insert(invocation(5, vec![]), deps(&[1, 2]));

        let drained: Vec<_> = graph.drain().iter().map(TaskInvocation::id).collect();
        assert_eq!(drained, vec![TaskId(4), TaskId(5), TaskId(7)]);
        assert!(graph.is_empty());
        assert_eq!(graph.waiters_of(TaskId(1)), 0);
    }
}
