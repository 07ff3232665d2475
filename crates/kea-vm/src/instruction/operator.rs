//! Arithmetic.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::{Result, RuntimeErrorKind};
use crate::frame::Frame;
use crate::instruction::Instruction;
use crate::value::Value;
use crate::vm::Vm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    fn apply(self, addr: &Address, left: Value, right: Value) -> Result<Value> {
        match (self, &left, &right) {
            (BinaryOp::Add, Value::String(_), _) | (BinaryOp::Add, _, Value::String(_)) => {
                Ok(Value::from(format!("{left}{right}")))
            }
            (_, Value::Number(a), Value::Number(b)) => Ok(Value::Number(match self {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
            })),
            _ => Err(RuntimeErrorKind::TypeMismatch {
                op: self.symbol(),
                expected: "numbers",
                found: format!("{} and {}", left.kind(), right.kind()),
            }
            .at(addr)),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Pops two operands and pushes the result of `op`.
///
/// `+` concatenates when either side is a string. Division follows IEEE 754,
/// so dividing by zero yields an infinity rather than an error.
#[derive(Debug, Clone)]
pub struct Binary {
    addr: Address,
    op: BinaryOp,
}

impl Binary {
    pub fn new(addr: Address, op: BinaryOp) -> Self {
        Self { addr, op }
    }

    pub fn boxed(addr: Address, op: BinaryOp) -> Box<dyn Instruction> {
        Box::new(Self::new(addr, op))
    }
}

impl Instruction for Binary {
    fn run(&self, vm: &mut Vm, _frame: &Rc<Frame>) -> Result<()> {
        let right = vm.pop(&self.addr)?;
        let left = vm.pop(&self.addr)?;
        let result = self.op.apply(&self.addr, left, right)?;
        vm.push(&self.addr, result)
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BINARY({})", self.op)
    }
}
