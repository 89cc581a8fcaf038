//! Actors used by the walkthrough.

use std::mem;

use crate::runtime::actor::{Actor, ActorClass, ActorError};
use crate::runtime::value::{arg, Value};

/// Integer counter with `inc` and `get_value`.
#[derive(Debug, Default)]
pub struct Counter {
    value: i64,
}

impl Actor for Counter {
    fn call(&mut self, method: &str, _args: &[Value]) -> anyhow::Result<Value> {
        match method {
            "inc" => {
                self.value += 1;
                Ok(Value::Unit)
            }
            "get_value" => Ok(Value::Int(self.value)),
            _ => Err(ActorError::unknown_method(method).into()),
        }
    }
}

pub fn counter_class() -> ActorClass {
    ActorClass::new("Counter", |_| Ok(Counter::default()))
}

/// Message log with `add_message` and `get_and_clear_messages`.
#[derive(Debug, Default)]
pub struct MessageActor {
    messages: Vec<Value>,
}

impl Actor for MessageActor {
    fn call(&mut self, method: &str, args: &[Value]) -> anyhow::Result<Value> {
        match method {
            "add_message" => {
                self.messages.push(arg(args, 0)?.clone());
                Ok(Value::Unit)
            }
            "get_and_clear_messages" => Ok(Value::List(mem::take(&mut self.messages))),
            _ => Err(ActorError::unknown_method(method).into()),
        }
    }
}

pub fn message_actor_class() -> ActorClass {
    ActorClass::new("MessageActor", |_| Ok(MessageActor::default()))
}
