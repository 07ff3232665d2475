//! Literal, binding and stack-shuffling instructions.

use std::fmt;
use std::rc::Rc;

use crate::address::Address;
use crate::error::{Result, RuntimeErrorKind};
use crate::frame::Frame;
use crate::instruction::Instruction;
use crate::value::{Literal, Value};
use crate::vm::Vm;

/// Pushes a constant.
#[derive(Debug, Clone)]
pub struct PushLiteral {
    addr: Address,
    literal: Literal,
}

impl PushLiteral {
    /// Pushes `literal` converted to a [`Value`].
    pub fn new(addr: Address, literal: Literal) -> Self {
        Self { addr, literal }
    }

    /// Boxed for an [`InstructionBox`](super::InstructionBox).
    pub fn boxed(addr: Address, literal: Literal) -> Box<dyn Instruction> {
        Box::new(Self::new(addr, literal))
    }
}

impl Instruction for PushLiteral {
    fn run(&self, vm: &mut Vm, _frame: &Rc<Frame>) -> Result<()> {
        vm.push(&self.addr, Value::from(&self.literal))
    }
}

impl fmt::Display for PushLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PUSH({})", self.literal)
    }
}

/// Pushes the value bound to `name`.
///
/// The frame chain is searched first, then the VM globals.
#[derive(Debug, Clone)]
pub struct Load {
    addr: Address,
    name: String,
}

impl Load {
    /// Reads `name` when run.
    pub fn new(addr: Address, name: impl Into<String>) -> Self {
        Self {
            addr,
            name: name.into(),
        }
    }

    /// Boxed for an [`InstructionBox`](super::InstructionBox).
    pub fn boxed(addr: Address, name: impl Into<String>) -> Box<dyn Instruction> {
        Box::new(Self::new(addr, name))
    }
}

impl Instruction for Load {
    fn run(&self, vm: &mut Vm, frame: &Rc<Frame>) -> Result<()> {
        let value = frame
            .get(&self.name)
            .or_else(|| vm.globals().get(&self.name))
            .ok_or_else(|| {
                RuntimeErrorKind::NotFound {
                    name: self.name.clone(),
                }
                .at(&self.addr)
            })?;
        vm.push(&self.addr, value)
    }
}

impl fmt::Display for Load {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LOAD({})", self.name)
    }
}

/// Pops a value and binds it as a new name in the current frame.
#[derive(Debug, Clone)]
pub struct Define {
    addr: Address,
    name: String,
}

impl Define {
    /// Binds `name` when run; fails if the current frame already has it.
    pub fn new(addr: Address, name: impl Into<String>) -> Self {
        Self {
            addr,
            name: name.into(),
        }
    }

    /// Boxed for an [`InstructionBox`](super::InstructionBox).
    pub fn boxed(addr: Address, name: impl Into<String>) -> Box<dyn Instruction> {
        Box::new(Self::new(addr, name))
    }
}

impl Instruction for Define {
    fn run(&self, vm: &mut Vm, frame: &Rc<Frame>) -> Result<()> {
        let value = vm.pop(&self.addr)?;
        frame.define(&self.addr, &self.name, value)
    }
}

impl fmt::Display for Define {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DEFINE({})", self.name)
    }
}

/// Pops a value and stores it in the nearest existing binding of `name`.
#[derive(Debug, Clone)]
pub struct Assign {
    addr: Address,
    name: String,
}

impl Assign {
    /// Rebinds `name` when run; fails if no scope binds it.
    pub fn new(addr: Address, name: impl Into<String>) -> Self {
        Self {
            addr,
            name: name.into(),
        }
    }

    /// Boxed for an [`InstructionBox`](super::InstructionBox).
    pub fn boxed(addr: Address, name: impl Into<String>) -> Box<dyn Instruction> {
        Box::new(Self::new(addr, name))
    }
}

impl Instruction for Assign {
    fn run(&self, vm: &mut Vm, frame: &Rc<Frame>) -> Result<()> {
        let value = vm.pop(&self.addr)?;
        if !frame.has(&self.name) && vm.globals().has_own(&self.name) {
            return vm.globals().assign(&self.addr, &self.name, value);
        }
        frame.assign(&self.addr, &self.name, value)
    }
}

impl fmt::Display for Assign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ASSIGN({})", self.name)
    }
}

/// Discards the top of the stack.
#[derive(Debug, Clone)]
pub struct Pop {
    addr: Address,
}

impl Pop {
    /// Drops one value when run.
    pub fn new(addr: Address) -> Self {
        Self { addr }
    }

    /// Boxed for an [`InstructionBox`](super::InstructionBox).
    pub fn boxed(addr: Address) -> Box<dyn Instruction> {
        Box::new(Self::new(addr))
    }
}

impl Instruction for Pop {
    fn run(&self, vm: &mut Vm, _frame: &Rc<Frame>) -> Result<()> {
        vm.pop(&self.addr).map(|_| ())
    }
}

impl fmt::Display for Pop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("POP")
    }
}
