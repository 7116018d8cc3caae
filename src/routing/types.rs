use crate::error::Result;

use std::sync::Arc;

/// A backend reply, passed around without interpretation.
///
/// Only acceptance predicates and the command helpers look inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Nil,
    Int(i64),
    Status(String),
    Bulk(Vec<u8>),
    Array(Vec<Value>),
    /// Error reply nested inside an array. Top-level error replies never
    /// become a `Value`; the connection surfaces them as `Error::Invocation`.
    Error(String),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Bytes of a bulk or status reply.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bulk(b) => Some(b),
            Value::Status(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Wire form of a value used as a command argument.
    pub fn to_arg_bytes(&self) -> Vec<u8> {
        match self {
            Value::Nil => Vec::new(),
            Value::Int(n) => n.to_string().into_bytes(),
            Value::Status(s) | Value::Error(s) => s.clone().into_bytes(),
            Value::Bulk(b) => b.clone(),
            Value::Array(items) => items
                .iter()
                .map(|v| String::from_utf8_lossy(&v.to_arg_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(" ")
                .into_bytes(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Bulk(s.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Bulk(s.into_bytes())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bulk(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

/// What one shard answered: the value, or why there is none.
pub type Reply = Result<Value>;

/// Caller-supplied test deciding whether a shard's reply proves key ownership.
///
/// Receives acquisition and invocation failures too, so a predicate may
/// choose to treat a particular error as proof of ownership.
pub type AcceptFn = Arc<dyn Fn(&Reply) -> bool + Send + Sync>;

/// A command whose first positional argument is the key it operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    key: String,
    args: Vec<Value>,
}

impl Command {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// `[key] ++ args`, the argument list sent after the command name.
    pub fn wire_args(&self) -> Vec<Value> {
        let mut wire = Vec::with_capacity(self.args.len() + 1);
        wire.push(Value::from(self.key.as_str()));
        wire.extend(self.args.iter().cloned());
        wire
    }
}

/// Accepts any reply that is present and not an error.
pub fn accept_present() -> AcceptFn {
    Arc::new(|reply: &Reply| matches!(reply, Ok(v) if !v.is_nil()))
}

/// Accepts only array replies; a blocking pop that timed out answers nil.
pub fn accept_array() -> AcceptFn {
    Arc::new(|reply: &Reply| matches!(reply, Ok(Value::Array(_))))
}
