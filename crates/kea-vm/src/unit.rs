//! Units: module-like namespaces of fields and functions.

use std::rc::Rc;

use crate::address::Address;
use crate::error::{Result, RuntimeErrorKind};
use crate::frame::Frame;
use crate::value::Value;
use crate::vm::Vm;

#[derive(Debug)]
pub struct Unit {
    name: String,
    fields: Rc<Frame>,
}

impl Unit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Rc::new(Frame::new()),
        }
    }

    /// Binds `name` in the unit's namespace.
    pub fn with_field(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.set(name, value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &Rc<Frame> {
        &self.fields
    }

    pub fn qualified(&self, name: &str) -> String {
        format!("{}->{}", self.name, name)
    }

    pub fn lookup(&self, addr: &Address, name: &str) -> Result<Value> {
        self.fields.get(name).ok_or_else(|| {
            RuntimeErrorKind::NotFound {
                name: self.qualified(name),
            }
            .at(addr)
        })
    }

    /// Calls the member `name` with its arguments already on the stack.
    ///
    /// Interpreted functions see the unit's fields as their enclosing scope.
    pub fn call(
        &self,
        addr: &Address,
        name: &str,
        vm: &mut Vm,
        should_push_result: bool,
    ) -> Result<()> {
        match self.lookup(addr, name)? {
            Value::Function(func) => {
                func.exec_in(vm, addr, self.fields.clone(), None, should_push_result)
            }
            Value::Builtin(builtin) => builtin.exec(vm, addr),
            other => Err(RuntimeErrorKind::NotCallable {
                name: self.qualified(name),
                found: other.kind(),
            }
            .at(addr)),
        }
    }
}
