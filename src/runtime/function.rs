//! Remote function descriptors and their registry
//!
//! A plain Rust closure becomes submittable by wrapping it in a
//! [`RemoteFunction`]. The descriptor carries the name used in logs and errors;
//! the [`FunctionRegistry`] makes descriptors addressable by that name.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::runtime::value::Value;

/// Body of a remote function.
pub type TaskBody = dyn Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync;

/// Submittable function descriptor.
///
/// # Examples
///
/// ```
/// use flowray::{RemoteFunction, Value};
///
/// let double = RemoteFunction::new("double", |args| {
///     let x = flowray::runtime::value::arg(args, 0)?.expect_int()?;
///     Ok(Value::Int(x * 2))
/// });
/// assert_eq!(double.name(), "double");
/// ```
#[derive(Clone)]
pub struct RemoteFunction {
    name: Arc<str>,
    body: Arc<TaskBody>,
}

impl RemoteFunction {
    pub fn new<F>(name: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            body: Arc::new(body),
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

    /// Run the body on the calling thread.
    #[inline]
    pub(crate) fn call(&self, args: &[Value]) -> anyhow::Result<Value> {
        (self.body)(args)
    }
}

impl fmt::Debug for RemoteFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Name-indexed collection of remote functions, in registration order.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: IndexMap<Arc<str>, RemoteFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, replacing any previous one with the same name.
    ///
    /// Returns the replaced descriptor.
    pub fn register(&mut self, function: RemoteFunction) -> Option<RemoteFunction> {
        self.functions.insert(function.shared_name(), function)
    }

    pub fn get(&self, name: &str) -> Option<&RemoteFunction> {
        self.functions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(|name| name.as_ref())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
