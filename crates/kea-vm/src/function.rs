//! Interpreted functions.

use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::address::Address;
use crate::error::Result;
use crate::frame::Frame;
use crate::instruction::InstructionBox;
use crate::value::Value;
use crate::vm::Vm;

/// Name under which an instance method sees its receiver.
pub const SELF_BINDING: &str = "self";

/// A user-defined callable compiled from Kea source.
///
/// The parameter list is fixed at construction; its length is the function's
/// arity. Executing the function runs `body` against a fresh child frame that
/// holds the bound arguments.
pub struct Function {
    name: String,
    params: Vec<String>,
    body: Rc<InstructionBox>,
    closure: Option<Rc<Frame>>,
}

impl Function {
    pub fn new(name: impl Into<String>, params: Vec<String>, body: InstructionBox) -> Self {
        Self {
            name: name.into(),
            params,
            body: Rc::new(body),
            closure: None,
        }
    }

    /// Captures `frame` as the enclosing scope of every call.
    pub fn with_closure(mut self, frame: Rc<Frame>) -> Self {
        self.closure = Some(frame);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn body(&self) -> &InstructionBox {
        &self.body
    }

    /// Calls the function with its arguments already on the stack.
    ///
    /// Misses in the call frame escalate to the captured closure, or to the VM
    /// globals when there is none.
    pub fn exec(&self, vm: &mut Vm, addr: &Address, should_push_result: bool) -> Result<()> {
        let parent = match &self.closure {
            Some(closure) => closure.clone(),
            None => vm.globals().clone(),
        };
        self.exec_in(vm, addr, parent, None, should_push_result)
    }

    /// Calls the function with an explicit enclosing scope.
    ///
    /// Arguments are popped in reverse so the first declared parameter
    /// receives the first pushed argument. The value the body leaves on top
    /// of the stack is the call result; the stack is restored to its size
    /// before the body ran, on success and on failure, and the result is
    /// pushed only when requested.
    pub(crate) fn exec_in(
        &self,
        vm: &mut Vm,
        addr: &Address,
        parent: Rc<Frame>,
        receiver: Option<Value>,
        should_push_result: bool,
    ) -> Result<()> {
        let frame = Rc::new(Frame::with_parent(parent));
        if let Some(receiver) = receiver {
            frame.set(SELF_BINDING, receiver);
        }
        for param in self.params.iter().rev() {
            let value = vm.pop(addr)?;
            frame.set(param.clone(), value);
        }

        trace!(function = %self.name, "entering function body");
        vm.enter_call(addr)?;
        let base = vm.stack().len();
        let outcome = vm.run_in(&self.body, &frame);
        vm.exit_call();
        if let Err(err) = outcome {
            vm.truncate_stack(base);
            return Err(err);
        }

        let result = if vm.stack().len() > base {
            vm.pop(addr)?
        } else {
            Value::Null
        };
        vm.truncate_stack(base);
        if should_push_result {
            vm.push(addr, result)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("body", &self.body)
            .finish()
    }
}
