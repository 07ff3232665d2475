//! Native functions.
//!
//! A builtin declares a fixed arity that call dispatch queries before
//! invoking it. Once invoked, the builtin owns the stack protocol: it pops its
//! own arguments and pushes a result if it has one.
//!
//! # Example
//!
//! ```
//! use kea_vm::{Address, NativeFunction, Value, Vm};
//!
//! fn abs(_addr: &Address, args: &[Value]) -> kea_vm::Result<Value> {
//!     Ok(Value::Number(args[0].as_number().unwrap_or_default().abs()))
//! }
//!
//! let mut vm = Vm::new();
//! vm.define_builtin(NativeFunction::pure("abs", 1, abs));
//! assert!(vm.globals().has("abs"));
//! ```

use std::fmt;

use crate::address::Address;
use crate::error::Result;
use crate::value::Value;
use crate::vm::Vm;

/// Contract every native callable fulfils.
pub trait Builtin {
    /// Display name used in diagnostics.
    fn name(&self) -> &str;

    /// Declared argument count.
    fn arity(&self) -> usize;

    /// Runs the builtin. Arguments are on top of the stack.
    fn exec(&self, vm: &mut Vm, addr: &Address) -> Result<()>;
}

/// Builtin body that receives its arguments as a slice, in call order.
pub type PureFn = fn(&Address, &[Value]) -> Result<Value>;

/// Builtin body that manipulates the stack directly.
pub type RawFn = fn(&mut Vm, &Address) -> Result<()>;

/// The function pointer, tagged by how it talks to the stack.
#[derive(Clone, Copy)]
pub enum NativeImpl {
    /// Arguments are popped for it and the return value is always pushed.
    Pure(PureFn),
    /// Full control over the stack.
    Raw(RawFn),
}

/// Descriptor for a native function.
#[derive(Clone)]
pub struct NativeFunction {
    name: String,
    arity: usize,
    implementation: NativeImpl,
}

impl NativeFunction {
    pub fn pure(name: impl Into<String>, arity: usize, f: PureFn) -> Self {
        Self {
            name: name.into(),
            arity,
            implementation: NativeImpl::Pure(f),
        }
    }

    pub fn raw(name: impl Into<String>, arity: usize, f: RawFn) -> Self {
        Self {
            name: name.into(),
            arity,
            implementation: NativeImpl::Raw(f),
        }
    }
}

impl Builtin for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn exec(&self, vm: &mut Vm, addr: &Address) -> Result<()> {
        match self.implementation {
            NativeImpl::Pure(f) => {
                let mut args = Vec::with_capacity(self.arity);
                for _ in 0..self.arity {
                    args.push(vm.pop(addr)?);
                }
                args.reverse();
                let result = f(addr, &args)?;
                vm.push(addr, result)
            }
            NativeImpl::Raw(f) => f(vm, addr),
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}
