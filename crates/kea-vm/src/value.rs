//! Runtime values.
//!
//! [`Value`] is a closed tagged union: every callee and receiver kind the VM
//! understands is a variant here, and call dispatch matches on it explicitly.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::builtin::Builtin;
use crate::function::Function;
use crate::host::HostObject;
use crate::instance::Instance;
use crate::unit::Unit;

/// A value on the operand stack or bound in a scope.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    /// Interpreted function compiled from Kea source.
    Function(Rc<Function>),
    /// Native function implemented in Rust.
    Builtin(Rc<dyn Builtin>),
    /// Object with its own field/method scope.
    Instance(Rc<Instance>),
    /// Module-like namespace.
    Unit(Rc<Unit>),
    /// Arbitrary host object reachable through the host registry.
    Host(Rc<dyn HostObject>),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn host(object: impl HostObject + 'static) -> Self {
        Value::Host(Rc::new(object))
    }

    pub fn builtin(builtin: impl Builtin + 'static) -> Self {
        Value::Builtin(Rc::new(builtin))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Function(_) => ValueKind::Function,
            Value::Builtin(_) => ValueKind::Builtin,
            Value::Instance(_) => ValueKind::Instance,
            Value::Unit(_) => ValueKind::Unit,
            Value::Host(_) => ValueKind::Host,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Type name used in diagnostics, e.g. `Point` for an instance of class `Point`.
    pub fn type_name(&self) -> String {
        match self {
            Value::Instance(instance) => instance.class().name().to_string(),
            Value::Unit(unit) => unit.name().to_string(),
            Value::Host(host) => host.type_name().to_string(),
            other => other.kind().to_string(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Function(func) => write!(f, "fn {}({})", func.name(), func.params().join(", ")),
            Value::Builtin(b) => write!(f, "builtin {}/{}", b.name(), b.arity()),
            Value::Instance(i) => write!(f, "instance of {}", i.class().name()),
            Value::Unit(u) => write!(f, "unit {}", u.name()),
            Value::Host(h) => write!(f, "host {h:?}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Primitive values compare structurally, reference values by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Unit(a), Value::Unit(b)) => Rc::ptr_eq(a, b),
            (Value::Host(a), Value::Host(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(Rc::new(func))
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Instance(Rc::new(instance))
    }
}

impl From<Unit> for Value {
    fn from(unit: Unit) -> Self {
        Value::Unit(Rc::new(unit))
    }
}

/// Discriminant of a [`Value`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Function,
    Builtin,
    Instance,
    Unit,
    Host,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "Null",
            ValueKind::Bool => "Bool",
            ValueKind::Number => "Number",
            ValueKind::String => "String",
            ValueKind::Function => "Function",
            ValueKind::Builtin => "Builtin",
            ValueKind::Instance => "Instance",
            ValueKind::Unit => "Unit",
            ValueKind::Host => "Host",
        };
        f.write_str(name)
    }
}

/// Constant embedded in compiled instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::string(s),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Number(n) => write!(f, "{n}"),
            Literal::String(s) => write!(f, "{s:?}"),
        }
    }
}
