//! Member access on scope-bearing values.

use std::fmt;
use std::rc::Rc;

use crate::address::Address;
use crate::error::{Result, RuntimeErrorKind};
use crate::frame::Frame;
use crate::instruction::Instruction;
use crate::value::Value;
use crate::vm::Vm;

/// Replaces a receiver on top of the stack with one of its members.
///
/// Only instances and units carry a scope; any other receiver fails.
#[derive(Debug, Clone)]
pub struct Access {
    addr: Address,
    name: String,
}

impl Access {
    /// Reads member `name` of the receiver on top of the stack.
    pub fn new(addr: Address, name: impl Into<String>) -> Self {
        Self {
            addr,
            name: name.into(),
        }
    }

    /// Same as [`Access::new`], boxed for an [`InstructionBox`](super::InstructionBox).
    pub fn boxed(addr: Address, name: impl Into<String>) -> Box<dyn Instruction> {
        Box::new(Self::new(addr, name))
    }
}

impl Instruction for Access {
    fn run(&self, vm: &mut Vm, _frame: &Rc<Frame>) -> Result<()> {
        let member = match vm.pop(&self.addr)? {
            Value::Instance(instance) => instance.lookup(&self.addr, &self.name)?,
            Value::Unit(unit) => unit.lookup(&self.addr, &self.name)?,
            other => {
                return Err(RuntimeErrorKind::AccessFailure {
                    name: self.name.clone(),
                    found: other.kind(),
                }
                .at(&self.addr));
            }
        };
        vm.push(&self.addr, member)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ACCESS({})", self.name)
    }
}
