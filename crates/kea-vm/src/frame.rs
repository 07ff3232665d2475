//! Lexical scopes.
//!
//! A [`Frame`] maps names to values and optionally points at an enclosing
//! frame. Lookups that miss escalate through the parent chain and fail with a
//! runtime error at the end of it; there is no silent default.
//!
//! Instances and units own frames of their own, independent of the frame an
//! instruction is currently running in.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::address::Address;
use crate::error::{Result, RuntimeErrorKind};
use crate::value::Value;

/// A lexical scope: ordered bindings plus an optional enclosing frame.
#[derive(Debug, Default)]
pub struct Frame {
    values: RefCell<IndexMap<String, Value>>,
    parent: Option<Rc<Frame>>,
}

impl Frame {
    /// Creates a root frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frame whose misses escalate to `parent`.
    pub fn with_parent(parent: Rc<Frame>) -> Self {
        Self {
            values: RefCell::default(),
            parent: Some(parent),
        }
    }

    /// The enclosing frame, if any.
    pub fn parent(&self) -> Option<&Rc<Frame>> {
        self.parent.as_ref()
    }

    /// Binds `name` in this frame.
    ///
    /// Names are unique within a frame; redefining fails. Shadowing a binding
    /// from an enclosing frame is allowed.
    pub fn define(&self, addr: &Address, name: &str, value: Value) -> Result<()> {
        let mut values = self.values.borrow_mut();
        if values.contains_key(name) {
            return Err(RuntimeErrorKind::AlreadyDefined {
                name: name.to_string(),
            }
            .at(addr));
        }
        values.insert(name.to_string(), value);
        Ok(())
    }

    /// Binds or rebinds `name` in this frame without the uniqueness check.
    ///
    /// Used by embedders seeding globals and by call setup, where the frame is
    /// freshly created.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.values.borrow_mut().insert(name.into(), value);
    }

    /// Updates the nearest existing binding of `name` in the chain.
    pub fn assign(&self, addr: &Address, name: &str, value: Value) -> Result<()> {
        let mut frame = self;
        loop {
            if let Some(slot) = frame.values.borrow_mut().get_mut(name) {
                *slot = value;
                return Ok(());
            }
            match &frame.parent {
                Some(parent) => frame = parent,
                None => {
                    return Err(RuntimeErrorKind::NotFound {
                        name: name.to_string(),
                    }
                    .at(addr));
                }
            }
        }
    }

    /// Whether `name` is bound in this frame or any enclosing one.
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether `name` is bound in this frame itself.
    pub fn has_own(&self, name: &str) -> bool {
        self.values.borrow().contains_key(name)
    }

    /// Resolves `name` through the chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut frame = self;
        loop {
            if let Some(value) = frame.values.borrow().get(name) {
                return Some(value.clone());
            }
            frame = frame.parent.as_deref()?;
        }
    }

    /// Resolves `name` through the chain or fails with a "not found" error.
    pub fn lookup(&self, addr: &Address, name: &str) -> Result<Value> {
        self.get(name).ok_or_else(|| {
            RuntimeErrorKind::NotFound {
                name: name.to_string(),
            }
            .at(addr)
        })
    }

    /// Names bound in this frame, in definition order.
    pub fn names(&self) -> Vec<String> {
        self.values.borrow().keys().cloned().collect()
    }

    /// Number of bindings in this frame, excluding parents.
    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}
