//! Dynamically typed values carried through the task graph
//!
//! `Value` is the unified representation of task arguments, task results and
//! actor method results. Large payloads sit behind `Arc` so fan-out to many
//! dependents clones a pointer, not the data.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::matrix::Matrix;
use crate::runtime::actor::ActorHandle;

/// Value kind, used in conversion errors and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Unit,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    List,
    Matrix,
    Actor,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Unit => "unit",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "str",
            ValueType::Bytes => "bytes",
            ValueType::List => "list",
            ValueType::Matrix => "matrix",
            ValueType::Actor => "actor",
        };
        f.write_str(name)
    }
}

/// Errors raised by value operations inside task bodies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Argument list shorter than the body expects.
    #[error("missing argument #{index}")]
    MissingArgument { index: usize },

    /// Value had the wrong kind.
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: ValueType, found: ValueType },

    /// Binary operation not defined for the operand kinds.
    #[error("cannot add {left} and {right}")]
    UnsupportedAdd { left: ValueType, right: ValueType },
}

/// Runtime value passed between tasks and actors.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Empty value
    #[default]
    Unit,

    Bool(bool),

    Int(i64),

    Float(f64),

    /// Shared string
    Str(Arc<str>),

    /// Shared byte buffer
    Bytes(Arc<[u8]>),

    List(Vec<Value>),

    /// Dense row-major matrix
    Matrix(Matrix),

    /// Handle to a live actor; lets tasks invoke methods on a shared actor.
    Actor(ActorHandle),
}

impl Value {
    /// Kind of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Unit => ValueType::Unit,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Str(_) => ValueType::Str,
            Value::Bytes(_) => ValueType::Bytes,
            Value::List(_) => ValueType::List,
            Value::Matrix(_) => ValueType::Matrix,
            Value::Actor(_) => ValueType::Actor,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float view; integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            Value::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_actor(&self) -> Option<&ActorHandle> {
        match self {
            Value::Actor(handle) => Some(handle),
            _ => None,
        }
    }

    /// Checked integer view for task bodies.
    pub fn expect_int(&self) -> Result<i64, ValueError> {
        self.as_int().ok_or(ValueError::TypeMismatch {
            expected: ValueType::Int,
            found: self.value_type(),
        })
    }

    /// Checked matrix view for task bodies.
    pub fn expect_matrix(&self) -> Result<&Matrix, ValueError> {
        self.as_matrix().ok_or(ValueError::TypeMismatch {
            expected: ValueType::Matrix,
            found: self.value_type(),
        })
    }

    /// Checked actor view for task bodies.
    pub fn expect_actor(&self) -> Result<&ActorHandle, ValueError> {
        self.as_actor().ok_or(ValueError::TypeMismatch {
            expected: ValueType::Actor,
            found: self.value_type(),
        })
    }

    /// Addition used by aggregation workloads.
    ///
    /// `Int + Int` stays integral (wrapping), any float operand promotes to
    /// `Float`, and `Str + Str` concatenates.
    ///
    /// # Examples
    ///
    /// ```
    /// use flowray::Value;
    ///
    /// assert_eq!(Value::Int(1).add(&Value::Int(2)).unwrap(), Value::Int(3));
    /// assert_eq!(Value::Int(1).add(&Value::Float(0.5)).unwrap(), Value::Float(1.5));
    /// ```
    pub fn add(&self, other: &Value) -> Result<Value, ValueError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(*b))),
            (Value::Float(_), Value::Float(_) | Value::Int(_))
            | (Value::Int(_), Value::Float(_)) => {
                // Both sides widen to f64 here.
                let a = self.as_float().unwrap_or_default();
                let b = other.as_float().unwrap_or_default();
                Ok(Value::Float(a + b))
            }
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(Arc::from(format!("{a}{b}")))),
            _ => Err(ValueError::UnsupportedAdd {
                left: self.value_type(),
                right: other.value_type(),
            }),
        }
    }
}

/// Fetch argument `index` from a task body's argument list.
///
/// # Examples
///
/// ```
/// use flowray::{runtime::value::arg, Value};
///
/// let args = [Value::Int(7)];
/// assert_eq!(arg(&args, 0).unwrap(), &Value::Int(7));
/// assert!(arg(&args, 1).is_err());
/// ```
pub fn arg(args: &[Value], index: usize) -> Result<&Value, ValueError> {
    args.get(index).ok_or(ValueError::MissingArgument { index })
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(Arc::from(bytes))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Matrix> for Value {
    fn from(m: Matrix) -> Self {
        Value::Matrix(m)
    }
}

impl From<ActorHandle> for Value {
    fn from(handle: ActorHandle) -> Self {
        Value::Actor(handle)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "bytes[{}]", b.len()),
            Value::List(items) => {
                write!(
                    f,
                    "[{}]",
                    items
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Value::Matrix(m) => write!(f, "matrix[{}x{}]", m.rows(), m.cols()),
            Value::Actor(handle) => write!(f, "actor({})", handle.id()),
        }
    }
}
