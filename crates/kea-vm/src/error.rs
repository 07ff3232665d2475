//! Structured errors crossing the VM boundary.
//!
//! Two error kinds leave the core: [`RuntimeError`], raised by instructions and
//! call dispatch, and [`ParsingError`], which the core never constructs but
//! propagates unchanged when it escapes a host call.

use thiserror::Error;

use crate::address::Address;
use crate::stack::StackError;
use crate::value::ValueKind;

/// Result type used throughout the VM.
pub type Result<T> = std::result::Result<T, KeaError>;

/// Any structured Kea error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KeaError {
    /// Failure during execution.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Failure raised by the front end, passed through untouched.
    #[error(transparent)]
    Parsing(#[from] ParsingError),
}

impl KeaError {
    /// Returns the runtime error, if this is one.
    pub fn as_runtime(&self) -> Option<&RuntimeError> {
        match self {
            KeaError::Runtime(err) => Some(err),
            KeaError::Parsing(_) => None,
        }
    }

    /// Source address the error is bound to.
    pub fn address(&self) -> &Address {
        match self {
            KeaError::Runtime(err) => &err.address,
            KeaError::Parsing(err) => &err.address,
        }
    }
}

/// Execution-time failure bound to a source address.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{address}: {kind}")]
pub struct RuntimeError {
    address: Address,
    kind: RuntimeErrorKind,
    hint: String,
}

impl RuntimeError {
    /// Creates an error with the default remediation hint for `kind`.
    pub fn new(address: &Address, kind: RuntimeErrorKind) -> Self {
        let hint = kind.default_hint().to_string();
        Self {
            address: address.clone(),
            kind,
            hint,
        }
    }

    /// Replaces the remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn line(&self) -> u32 {
        self.address.line()
    }

    pub fn file(&self) -> &str {
        self.address.file()
    }

    pub fn kind(&self) -> &RuntimeErrorKind {
        &self.kind
    }

    /// Human-readable description of what went wrong.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Suggested remediation.
    pub fn hint(&self) -> &str {
        &self.hint
    }
}

/// What went wrong at runtime.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeErrorKind {
    /// A name was not bound in any reachable scope.
    #[error("not found: {name}")]
    NotFound {
        /// Qualified name that failed to resolve.
        name: String,
    },

    /// A call resolved to a value that cannot be invoked.
    #[error("can't call {name}: {found} is not callable")]
    NotCallable {
        /// Qualified callee name.
        name: String,
        /// Kind of the value that was found instead.
        found: ValueKind,
    },

    /// Argument count differs from the callee's declared arity.
    #[error("invalid args amount for call of func: {name}({actual}/{expected})")]
    InvalidArgsAmount {
        /// Qualified callee name.
        name: String,
        /// Number of evaluated arguments.
        actual: usize,
        /// Declared parameter count.
        expected: usize,
    },

    /// Argument evaluation popped values that belong to the caller.
    #[error("arguments of {name} consumed {consumed} value(s) from the caller's stack")]
    ArgumentUnderflow {
        /// Callee name.
        name: String,
        /// How far the stack shrank below its size before evaluation.
        consumed: usize,
    },

    /// No host method matched the receiver type, name and arity.
    #[error("host func not found: {type_name}->{name}")]
    HostMethodNotFound {
        /// Host type of the receiver.
        type_name: String,
        /// Requested method name.
        name: String,
    },

    /// A host method failed with a non-Kea error.
    #[error("host call error: {message}")]
    HostCall {
        /// Description of the underlying cause.
        message: String,
    },

    /// Member access on a value without a scope.
    #[error("can't access {name} on {found}")]
    AccessFailure {
        /// Member name.
        name: String,
        /// Kind of the receiver.
        found: ValueKind,
    },

    /// A name was defined twice in the same frame.
    #[error("already defined: {name}")]
    AlreadyDefined {
        /// The duplicated name.
        name: String,
    },

    /// An operation received operands of the wrong kind.
    #[error("type mismatch in {op}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Operation name.
        op: &'static str,
        /// Expected operand description.
        expected: &'static str,
        /// Actual operand description.
        found: String,
    },

    /// Operand stack misuse.
    #[error(transparent)]
    Stack(#[from] StackError),

    /// Interpreted call nesting exceeded the configured limit.
    #[error("call depth limit of {limit} exceeded")]
    CallDepthExceeded {
        /// Configured maximum depth.
        limit: usize,
    },
}

impl RuntimeErrorKind {
    /// Binds this kind to `address`, producing a propagatable error.
    pub fn at(self, address: &Address) -> KeaError {
        KeaError::Runtime(RuntimeError::new(address, self))
    }

    fn default_hint(&self) -> &'static str {
        match self {
            RuntimeErrorKind::NotFound { .. } | RuntimeErrorKind::HostMethodNotFound { .. } => {
                "Check name for mistakes and args amount!"
            }
            RuntimeErrorKind::InvalidArgsAmount { .. }
            | RuntimeErrorKind::ArgumentUnderflow { .. } => "Check arguments amount!",
            RuntimeErrorKind::AlreadyDefined { .. } => "Rename one of the definitions!",
            RuntimeErrorKind::Stack(_) | RuntimeErrorKind::CallDepthExceeded { .. } => {
                "Check for unbounded recursion!"
            }
            _ => "Check your code!",
        }
    }
}

/// Front-end error. Only ever propagated by the core.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{address}: {message}")]
pub struct ParsingError {
    address: Address,
    message: String,
    hint: String,
}

impl ParsingError {
    pub fn new(address: &Address, message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            address: address.clone(),
            message: message.into(),
            hint: hint.into(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }
}
