//! Actor classes
//!
//! An actor is any `Send` type implementing [`Actor`]: one `call` entry point
//! that dispatches on the method name. An [`ActorClass`] pairs a class name
//! with a constructor, so the engine can build the state on the actor's own
//! thread.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::runtime::value::Value;

/// Stateful object driven by method invocations.
///
/// Methods of one actor never run concurrently, so `call` gets `&mut self`.
pub trait Actor: Send + 'static {
    fn call(&mut self, method: &str, args: &[Value]) -> anyhow::Result<Value>;
}

/// Errors an actor reports from `call`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActorError {
    #[error("unknown method `{method}`")]
    UnknownMethod { method: String },
}

impl ActorError {
    pub fn unknown_method(method: &str) -> Self {
        ActorError::UnknownMethod {
            method: method.to_string(),
        }
    }
}

type Constructor = dyn Fn(&[Value]) -> anyhow::Result<Box<dyn Actor>> + Send + Sync;

/// Named actor constructor.
///
/// # Examples
///
/// ```
/// use flowray::{Actor, ActorClass, Value};
///
/// #[derive(Default)]
/// struct Echo;
///
/// impl Actor for Echo {
///     fn call(&mut self, _method: &str, args: &[Value]) -> anyhow::Result<Value> {
///         Ok(args.first().cloned().unwrap_or_default())
///     }
/// }
///
/// let class = ActorClass::new("Echo", |_| Ok(Echo));
/// assert_eq!(class.name(), "Echo");
/// ```
#[derive(Clone)]
pub struct ActorClass {
    name: Arc<str>,
    constructor: Arc<Constructor>,
}

impl ActorClass {
    pub fn new<A, F>(name: impl Into<Arc<str>>, constructor: F) -> Self
    where
        A: Actor,
        F: Fn(&[Value]) -> anyhow::Result<A> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            constructor: Arc::new(move |args: &[Value]| {
                constructor(args).map(|actor| Box::new(actor) as Box<dyn Actor>)
            }),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub(crate) fn shared_name(&self) -> Arc<str> {
        self.name.clone()
    }

    pub(crate) fn construct(&self, args: &[Value]) -> anyhow::Result<Box<dyn Actor>> {
        (self.constructor)(args)
    }
}

impl fmt::Debug for ActorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorClass")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
