//! The execution context threaded through every instruction.

use std::rc::Rc;

use tracing::{instrument, trace};

use crate::address::Address;
use crate::builtin::{Builtin, NativeFunction};
use crate::config::{ConfigError, VmConfig};
use crate::error::{Result, RuntimeErrorKind};
use crate::frame::Frame;
use crate::host::HostRegistry;
use crate::instruction::InstructionBox;
use crate::stack::OperandStack;
use crate::value::Value;

/// Owns the operand stack, the global frame and the host registry.
///
/// A `Vm` is single-threaded. Interpreted calls recurse into [`Vm::run_in`]
/// for the callee body, so the only nesting state kept here is the call depth
/// counter used by [`VmConfig::max_call_depth`].
#[derive(Debug)]
pub struct Vm {
    stack: OperandStack,
    globals: Rc<Frame>,
    host: HostRegistry,
    config: VmConfig,
    call_depth: usize,
}

impl Vm {
    /// Creates a VM with an empty global frame, no host methods and no limits.
    pub fn new() -> Self {
        Self {
            stack: OperandStack::new(),
            globals: Rc::new(Frame::new()),
            host: HostRegistry::new(),
            config: VmConfig::default(),
            call_depth: 0,
        }
    }

    /// Creates a VM with validated resource limits.
    pub fn with_config(config: VmConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            stack: OperandStack::with_limit(config.max_stack_depth),
            config,
            ..Self::new()
        })
    }

    /// Installs the host method table.
    pub fn with_host(mut self, host: HostRegistry) -> Self {
        self.host = host;
        self
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn host(&self) -> &HostRegistry {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut HostRegistry {
        &mut self.host
    }

    pub fn globals(&self) -> &Rc<Frame> {
        &self.globals
    }

    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    /// Number of interpreted calls currently executing.
    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    /// Binds `name` in the global frame, replacing any previous binding.
    pub fn define_global(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.globals.set(name, value.into());
    }

    /// Binds a native function in the global frame under its own name.
    pub fn define_builtin(&mut self, builtin: NativeFunction) {
        let name = builtin.name().to_string();
        self.globals.set(name, Value::builtin(builtin));
    }

    /// Pushes onto the operand stack; overflow is reported at `addr`.
    pub fn push(&mut self, addr: &Address, value: Value) -> Result<()> {
        self.stack
            .push(value)
            .map_err(|err| RuntimeErrorKind::from(err).at(addr))
    }

    /// Pops the operand stack; underflow is reported at `addr`.
    pub fn pop(&mut self, addr: &Address) -> Result<Value> {
        self.stack
            .pop()
            .map_err(|err| RuntimeErrorKind::from(err).at(addr))
    }

    pub(crate) fn truncate_stack(&mut self, len: usize) {
        self.stack.truncate(len);
    }

    /// Runs `program` against the global frame.
    #[instrument(skip_all, fields(instructions = program.len()))]
    pub fn run(&mut self, program: &InstructionBox) -> Result<()> {
        let globals = self.globals.clone();
        self.run_in(program, &globals)
    }

    /// Runs `program` top to bottom against `frame`, stopping at the first error.
    pub fn run_in(&mut self, program: &InstructionBox, frame: &Rc<Frame>) -> Result<()> {
        for instruction in program.iter() {
            trace!(instruction = %instruction, "exec");
            instruction.run(self, frame)?;
        }
        Ok(())
    }

    pub(crate) fn enter_call(&mut self, addr: &Address) -> Result<()> {
        if let Some(limit) = self.config.max_call_depth {
            if self.call_depth >= limit {
                return Err(RuntimeErrorKind::CallDepthExceeded { limit }.at(addr));
            }
        }
        self.call_depth += 1;
        Ok(())
    }

    pub(crate) fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
