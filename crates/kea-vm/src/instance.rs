//! Object instances and their type descriptors.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::address::Address;
use crate::error::{Result, RuntimeErrorKind};
use crate::frame::Frame;
use crate::value::Value;
use crate::vm::Vm;

/// Type descriptor shared by every instance of a class.
#[derive(Debug, Default)]
pub struct Class {
    name: String,
    methods: IndexMap<String, Value>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: IndexMap::new(),
        }
    }

    /// Adds a method bound into every instance created afterwards.
    pub fn with_method(mut self, name: impl Into<String>, method: impl Into<Value>) -> Self {
        self.methods.insert(name.into(), method.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.methods.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// An object value: a class plus a scope holding fields and bound methods.
#[derive(Debug)]
pub struct Instance {
    class: Rc<Class>,
    scope: Rc<Frame>,
}

impl Instance {
    /// Creates an instance with the class's methods bound into its scope.
    pub fn new(class: Rc<Class>) -> Self {
        let scope = Frame::new();
        for (name, method) in class.methods() {
            scope.set(name, method.clone());
        }
        Self {
            class,
            scope: Rc::new(scope),
        }
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    pub fn scope(&self) -> &Rc<Frame> {
        &self.scope
    }

    pub fn set_field(&self, name: impl Into<String>, value: Value) {
        self.scope.set(name, value);
    }

    /// Qualified display name of a member, `Class->member`.
    pub fn qualified(&self, name: &str) -> String {
        format!("{}->{}", self.class.name(), name)
    }

    /// Resolves a field or method.
    pub fn lookup(&self, addr: &Address, name: &str) -> Result<Value> {
        self.scope.get(name).ok_or_else(|| {
            RuntimeErrorKind::NotFound {
                name: self.qualified(name),
            }
            .at(addr)
        })
    }

    /// Calls the member `name` with its arguments already on the stack.
    ///
    /// Interpreted methods run in a frame whose parent is this instance's
    /// scope, with the receiver bound as `self`.
    pub fn call(
        self: &Rc<Self>,
        addr: &Address,
        name: &str,
        vm: &mut Vm,
        should_push_result: bool,
    ) -> Result<()> {
        match self.lookup(addr, name)? {
            Value::Function(func) => func.exec_in(
                vm,
                addr,
                self.scope.clone(),
                Some(Value::Instance(self.clone())),
                should_push_result,
            ),
            Value::Builtin(builtin) => builtin.exec(vm, addr),
            other => Err(RuntimeErrorKind::NotCallable {
                name: self.qualified(name),
                found: other.kind(),
            }
            .at(addr)),
        }
    }
}
