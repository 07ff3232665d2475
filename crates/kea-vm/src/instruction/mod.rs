//! Instructions and instruction sequences.
//!
//! Every instruction communicates only through the operand stack and the
//! frame it runs against. An [`InstructionBox`] is an ordered, immutable
//! sequence run top to bottom by [`Vm::run_in`](crate::Vm::run_in).
//!
//! | Instruction | Stack effect | Display |
//! |---|---|---|
//! | [`PushLiteral`] | `[] -> [v]` | `PUSH(<lit>)` |
//! | [`Load`] | `[] -> [v]` | `LOAD(<name>)` |
//! | [`Define`] | `[v] -> []` | `DEFINE(<name>)` |
//! | [`Assign`] | `[v] -> []` | `ASSIGN(<name>)` |
//! | [`Access`] | `[recv] -> [v]` | `ACCESS(<name>)` |
//! | [`Binary`] | `[l, r] -> [l op r]` | `BINARY(<op>)` |
//! | [`Pop`] | `[v] -> []` | `POP` |
//! | [`Call`] | see [`call`] | `CALL_FUNCTION(<name>, instrs:<count>)` |

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::frame::Frame;
use crate::vm::Vm;

pub mod call;
mod member;
mod operator;
mod scope;


pub use call::Call;
pub use member::Access;
pub use operator::{Binary, BinaryOp};
pub use scope::{Assign, Define, Load, Pop, PushLiteral};

/// A single executable step.
pub trait Instruction: fmt::Debug + fmt::Display {
    /// Executes against the VM's stack and `frame`.
    fn run(&self, vm: &mut Vm, frame: &Rc<Frame>) -> Result<()>;
}

/// Ordered instruction sequence.
#[derive(Debug, Default)]
pub struct InstructionBox {
    instructions: Vec<Box<dyn Instruction>>,
}

impl InstructionBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an instruction to the end of the sequence.
    pub fn push(&mut self, instruction: Box<dyn Instruction>) {
        self.instructions.push(instruction);
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instructions in execution order.
    pub fn iter(&self) -> std::slice::Iter<'_, Box<dyn Instruction>> {
        self.instructions.iter()
    }
}

impl From<Vec<Box<dyn Instruction>>> for InstructionBox {
    fn from(instructions: Vec<Box<dyn Instruction>>) -> Self {
        Self { instructions }
    }
}

impl FromIterator<Box<dyn Instruction>> for InstructionBox {
    fn from_iter<I: IntoIterator<Item = Box<dyn Instruction>>>(iter: I) -> Self {
        Self {
            instructions: iter.into_iter().collect(),
        }
    }
}

/// One instruction per line.
impl fmt::Display for InstructionBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, instruction) in self.instructions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{instruction}")?;
        }
        Ok(())
    }
}
