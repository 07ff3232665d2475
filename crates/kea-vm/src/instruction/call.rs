//! Call dispatch.
//!
//! A [`Call`] evaluates its argument instructions, then routes the call
//! along one of four paths chosen by the receiver:
//!
//! 1. No receiver (`has_previous == false`): the callee is looked up in the
//!    current frame chain, then in the VM globals.
//! 2. An [`Instance`](crate::Instance) receiver: the callee is a member of
//!    the instance scope and, if interpreted, sees the receiver as `self`.
//! 3. A [`Unit`](crate::Unit) receiver: the callee is a member of the unit.
//! 4. Any other receiver: the call goes through the
//!    [`HostRegistry`](crate::HostRegistry).
//!
//! The receiver is popped before arguments are evaluated, and the argument
//! count is the stack growth across evaluating them. Every path validates
//! that count against the callee's declared arity before invoking it.

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::address::Address;
use crate::error::{KeaError, Result, RuntimeErrorKind};
use crate::frame::Frame;
use crate::host::{HostError, HostObject};
use crate::instance::Instance;
use crate::instruction::{Instruction, InstructionBox};
use crate::unit::Unit;
use crate::value::Value;
use crate::vm::Vm;

/// Fails unless `actual` equals `expected`.
///
/// The error message carries `<name>(<actual>/<expected>)`.
pub fn check_arity(addr: &Address, name: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(RuntimeErrorKind::InvalidArgsAmount {
            name: name.to_string(),
            actual,
            expected,
        }
        .at(addr));
    }
    Ok(())
}

/// Invokes a named callable with arguments computed by `args`.
#[derive(Debug)]
pub struct Call {
    addr: Address,
    name: String,
    args: InstructionBox,
    has_previous: bool,
    should_push_result: bool,
}

impl Call {
    /// Creates a call of `name`.
    ///
    /// `has_previous` marks a receiver on top of the stack, below the
    /// arguments `args` will push. `should_push_result` controls whether the
    /// callee's result survives the call.
    pub fn new(
        addr: Address,
        name: impl Into<String>,
        args: InstructionBox,
        has_previous: bool,
        should_push_result: bool,
    ) -> Self {
        Self {
            addr,
            name: name.into(),
            args,
            has_previous,
            should_push_result,
        }
    }

    /// Same as [`Call::new`], boxed for an [`InstructionBox`].
    pub fn boxed(
        addr: Address,
        name: impl Into<String>,
        args: InstructionBox,
        has_previous: bool,
        should_push_result: bool,
    ) -> Box<dyn Instruction> {
        Box::new(Self::new(addr, name, args, has_previous, should_push_result))
    }

    /// Source location reported by call errors.
    pub fn address(&self) -> &Address {
        &self.addr
    }

    /// Callee name, unqualified.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instructions that push the arguments.
    pub fn args(&self) -> &InstructionBox {
        &self.args
    }

    /// Whether a receiver is popped before the arguments run.
    pub fn has_previous(&self) -> bool {
        self.has_previous
    }

    /// Whether the result is left on the stack.
    pub fn should_push_result(&self) -> bool {
        self.should_push_result
    }

    /// Evaluates the arguments and returns how many values they left.
    ///
    /// Fails if evaluation shrank the stack below where it started.
    fn pass_args(&self, vm: &mut Vm, frame: &Rc<Frame>) -> Result<usize> {
        let before = vm.stack().len();
        vm.run_in(&self.args, frame)?;
        let after = vm.stack().len();
        if after < before {
            return Err(RuntimeErrorKind::ArgumentUnderflow {
                name: self.name.clone(),
                consumed: before - after,
            }
            .at(&self.addr));
        }
        Ok(after - before)
    }

    fn call_global(&self, vm: &mut Vm, frame: &Rc<Frame>, argc: usize) -> Result<()> {
        let callee = frame
            .get(&self.name)
            .or_else(|| vm.globals().get(&self.name))
            .ok_or_else(|| {
                RuntimeErrorKind::NotFound {
                    name: self.name.clone(),
                }
                .at(&self.addr)
            })?;

        match callee {
            Value::Function(func) => {
                check_arity(&self.addr, func.name(), func.arity(), argc)?;
                func.exec(vm, &self.addr, self.should_push_result)
            }
            Value::Builtin(builtin) => {
                check_arity(&self.addr, builtin.name(), builtin.arity(), argc)?;
                builtin.exec(vm, &self.addr)
            }
            other => Err(RuntimeErrorKind::NotCallable {
                name: self.name.clone(),
                found: other.kind(),
            }
            .at(&self.addr)),
        }
    }

    fn call_instance(&self, vm: &mut Vm, instance: &Rc<Instance>, argc: usize) -> Result<()> {
        let member = instance.lookup(&self.addr, &self.name)?;
        self.check_member_arity(&member, &instance.qualified(&self.name), argc)?;
        instance.call(&self.addr, &self.name, vm, self.should_push_result)
    }

    fn call_unit(&self, vm: &mut Vm, unit: &Unit, argc: usize) -> Result<()> {
        let member = unit.lookup(&self.addr, &self.name)?;
        self.check_member_arity(&member, &unit.qualified(&self.name), argc)?;
        unit.call(&self.addr, &self.name, vm, self.should_push_result)
    }

    /// Arity check for instance and unit members. Non-callable members are
    /// left for the entity's own `call` to reject.
    fn check_member_arity(&self, member: &Value, qualified: &str, argc: usize) -> Result<()> {
        match member {
            Value::Function(func) => check_arity(&self.addr, qualified, func.arity(), argc),
            Value::Builtin(builtin) => check_arity(&self.addr, qualified, builtin.arity(), argc),
            _ => Ok(()),
        }
    }

    fn call_host(&self, vm: &mut Vm, receiver: &Value, argc: usize) -> Result<()> {
        let mut args = Vec::with_capacity(argc);
        for _ in 0..argc {
            args.push(vm.pop(&self.addr)?);
        }
        args.reverse();

        let Value::Host(object) = receiver else {
            return Err(self.host_not_found(&receiver.type_name()));
        };
        let object: &dyn HostObject = &**object;

        let method = vm
            .host()
            .resolve(object, &self.name, argc + 1)
            .cloned()
            .ok_or_else(|| self.host_not_found(object.type_name()))?;

        let qualified = format!("{}->{}", object.type_name(), self.name);
        check_arity(&self.addr, &qualified, method.parameter_count() - 1, argc)?;

        let result = method
            .invoke(object, &self.addr, &args)
            .map_err(|err| match err {
                HostError::Kea(err) => err,
                other => RuntimeErrorKind::HostCall {
                    message: other.to_string(),
                }
                .at(&self.addr),
            })?;

        if self.should_push_result {
            vm.push(&self.addr, result)?;
        }
        Ok(())
    }

    /// Evaluates the arguments and routes the call by receiver kind.
    fn dispatch(&self, vm: &mut Vm, frame: &Rc<Frame>, receiver: Option<Value>) -> Result<()> {
        let argc = self.pass_args(vm, frame)?;

        let path = match &receiver {
            None => "global",
            Some(Value::Instance(_)) => "instance",
            Some(Value::Unit(_)) => "unit",
            Some(_) => "host",
        };
        debug!(callee = %self.name, path, args = argc, "call");

        match &receiver {
            None => self.call_global(vm, frame, argc),
            Some(Value::Instance(instance)) => self.call_instance(vm, instance, argc),
            Some(Value::Unit(unit)) => self.call_unit(vm, unit, argc),
            Some(other) => self.call_host(vm, other, argc),
        }
    }

    fn host_not_found(&self, type_name: &str) -> KeaError {
        RuntimeErrorKind::HostMethodNotFound {
            type_name: type_name.to_string(),
            name: self.name.clone(),
        }
        .at(&self.addr)
    }
}

impl Instruction for Call {
    fn run(&self, vm: &mut Vm, frame: &Rc<Frame>) -> Result<()> {
        let receiver = if self.has_previous {
            Some(vm.pop(&self.addr)?)
        } else {
            None
        };

        let base = vm.stack().len();
        let outcome = self.dispatch(vm, frame, receiver);
        if outcome.is_err() || !self.should_push_result {
            // Builtins push unconditionally, and a failed call leaves partial
            // arguments behind.
            vm.truncate_stack(base);
        }
        outcome
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CALL_FUNCTION({}, instrs:{})", self.name, self.args.len())
    }
}
