//! Host interop boundary.
//!
//! Values that are neither instances nor units are host objects. Calls on
//! them resolve through a [`HostRegistry`], an explicit table from
//! `(host type, method name, parameter count)` to an invocable thunk. The
//! table is built once per embedding and handed to the [`Vm`](crate::Vm).
//!
//! Parameter counts include the implicit leading address parameter, so a
//! method callable as `obj.len()` is registered with arity 0 and stored with
//! parameter count 1. Registering the same key twice is rejected, which keeps
//! resolution independent of registration order.
//!
//! # Example
//!
//! ```
//! use kea_vm::{HostObject, HostRegistry, Value};
//!
//! #[derive(Debug)]
//! struct Counter(u32);
//!
//! impl HostObject for Counter {
//!     fn type_name(&self) -> &str {
//!         "Counter"
//!     }
//! }
//!
//! let mut host = HostRegistry::new();
//! host.register::<Counter, _>("get", 0, |counter, _addr, _args| {
//!     Ok(Value::Number(counter.0 as f64))
//! })
//! .unwrap();
//! assert!(host.contains::<Counter>("get", 0));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::address::Address;
use crate::error::KeaError;
use crate::value::Value;

/// Upcast helper so host objects can be downcast to their concrete type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A host-native value exposed to Kea code.
pub trait HostObject: AsAny + fmt::Debug {
    /// Type name used in diagnostics.
    fn type_name(&self) -> &str;
}

/// Failure raised by or around a host method.
#[derive(Debug, Error)]
pub enum HostError {
    /// A structured Kea error raised inside the host method. Re-raised unchanged.
    #[error(transparent)]
    Kea(#[from] KeaError),

    /// An argument had an unusable value.
    #[error("invalid argument {index}: {message}")]
    InvalidArgument {
        /// Zero-based index among the user-visible arguments.
        index: usize,
        /// What was wrong with it.
        message: String,
    },

    /// The host method failed.
    #[error("{0}")]
    Failed(String),

    /// The thunk was handed a receiver of another type.
    #[error("receiver is not a {expected}")]
    ReceiverMismatch {
        /// Rust type the thunk was registered for.
        expected: &'static str,
    },

    /// The arity leaves no room for the implicit address parameter.
    #[error("host method {name} declares unsupported arity {arity}")]
    ArityOutOfRange {
        /// Method name.
        name: String,
        /// Requested user-visible argument count.
        arity: usize,
    },

    /// A method with the same type, name and arity already exists.
    #[error("host method {type_name}->{name} with {arity} argument(s) registered twice")]
    DuplicateMethod {
        /// Rust type of the receiver.
        type_name: &'static str,
        /// Method name.
        name: String,
        /// User-visible argument count.
        arity: usize,
    },
}

type Thunk = Rc<dyn Fn(&dyn Any, &Address, &[Value]) -> Result<Value, HostError>>;

/// A resolved host method.
#[derive(Clone)]
pub struct HostMethod {
    name: String,
    parameter_count: usize,
    thunk: Thunk,
}

impl HostMethod {
    /// Method name as registered.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter count, including the implicit address.
    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    /// Invokes the method. `args` excludes the address.
    pub fn invoke(
        &self,
        receiver: &dyn HostObject,
        addr: &Address,
        args: &[Value],
    ) -> Result<Value, HostError> {
        (self.thunk)((*receiver).as_any(), addr, args)
    }
}

impl fmt::Debug for HostMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostMethod")
            .field("name", &self.name)
            .field("parameter_count", &self.parameter_count)
            .finish_non_exhaustive()
    }
}

type MethodKey = (TypeId, String, usize);

/// Table of host methods callable from Kea code.
#[derive(Default, Debug)]
pub struct HostRegistry {
    methods: IndexMap<MethodKey, HostMethod>,
}

impl HostRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` as method `name` of host type `T` taking `arity` arguments.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::DuplicateMethod`] if `T` already has a method with
    /// this name and arity, and [`HostError::ArityOutOfRange`] for
    /// `usize::MAX`, which cannot fit the address parameter.
    pub fn register<T, F>(
        &mut self,
        name: impl Into<String>,
        arity: usize,
        f: F,
    ) -> Result<&mut Self, HostError>
    where
        T: HostObject + 'static,
        F: Fn(&T, &Address, &[Value]) -> Result<Value, HostError> + 'static,
    {
        let name = name.into();
        let Some(parameter_count) = arity.checked_add(1) else {
            return Err(HostError::ArityOutOfRange { name, arity });
        };
        let key = (TypeId::of::<T>(), name.clone(), parameter_count);
        if self.methods.contains_key(&key) {
            return Err(HostError::DuplicateMethod {
                type_name: std::any::type_name::<T>(),
                name,
                arity,
            });
        }

        let thunk: Thunk = Rc::new(move |receiver: &dyn Any, addr: &Address, args: &[Value]| {
            let receiver = receiver
                .downcast_ref::<T>()
                .ok_or(HostError::ReceiverMismatch {
                    expected: std::any::type_name::<T>(),
                })?;
            f(receiver, addr, args)
        });

        debug!(host_type = std::any::type_name::<T>(), method = %name, arity, "host method registered");
        self.methods.insert(
            key,
            HostMethod {
                name,
                parameter_count,
                thunk,
            },
        );
        Ok(self)
    }

    /// Finds the method of `receiver`'s type with this name and parameter
    /// count (address included).
    pub fn resolve(
        &self,
        receiver: &dyn HostObject,
        name: &str,
        parameter_count: usize,
    ) -> Option<&HostMethod> {
        let key = ((*receiver).as_any().type_id(), name.to_string(), parameter_count);
        self.methods.get(&key)
    }

    /// Whether `T` has a method `name` taking `arity` user-visible arguments.
    pub fn contains<T: HostObject + 'static>(&self, name: &str, arity: usize) -> bool {
        arity.checked_add(1).is_some_and(|parameter_count| {
            self.methods
                .contains_key(&(TypeId::of::<T>(), name.to_string(), parameter_count))
        })
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
