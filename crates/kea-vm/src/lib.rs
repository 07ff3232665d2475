//! Kea VM - execution core
//!
//! Runs pre-compiled instruction sequences against a layered scope model and
//! dispatches calls to interpreted functions, builtins, object instances,
//! units and host-native values.
//!
//! # Architecture
//!
//! - [`address`] - Source locations attached to instructions and errors
//! - [`stack`] - The shared operand stack
//! - [`frame`] - Name to value scopes with parent escalation
//! - [`value`] - The tagged union of runtime values
//! - [`function`] - Interpreted functions
//! - [`builtin`] - Native functions implemented in Rust
//! - [`instance`] / [`unit`] - Scope-bearing entities
//! - [`host`] - Registry-based bridge to host objects
//! - [`instruction`] - The instruction contract and the concrete instructions
//! - [`vm`] - The execution context threaded through every instruction
//!
//! # Execution Model
//!
//! Execution is single-threaded and synchronous. A call into an interpreted
//! function recurses directly into [`Vm::run_in`] for the callee's body, so
//! nesting depth is bounded by the host call stack unless
//! [`VmConfig::max_call_depth`] is set.

pub mod address;
pub mod builtin;
pub mod config;
pub mod error;
pub mod frame;
pub mod function;
pub mod host;
pub mod instance;
pub mod instruction;
pub mod stack;
pub mod unit;
pub mod value;
pub mod vm;

pub use address::Address;
pub use builtin::{Builtin, NativeFunction};
pub use config::{ConfigError, VmConfig};
pub use error::{KeaError, ParsingError, Result, RuntimeError, RuntimeErrorKind};
pub use frame::Frame;
pub use function::Function;
pub use host::{HostError, HostMethod, HostObject, HostRegistry};
pub use instance::{Class, Instance};
pub use instruction::{
    Access, Assign, Binary, BinaryOp, Call, Define, Instruction, InstructionBox, Load, Pop,
    PushLiteral,
};
pub use stack::{OperandStack, StackError};
pub use unit::Unit;
pub use value::{Literal, Value, ValueKind};
pub use vm::Vm;
