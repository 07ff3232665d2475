//! Operand stack shared by every instruction.

use thiserror::Error;

use crate::value::Value;

/// Operand stack misuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    /// Attempted to pop from an empty stack.
    #[error("stack underflow: tried to pop from empty stack")]
    Underflow,

    /// Pushing would exceed the configured depth limit.
    #[error("stack overflow: stack size limit of {limit} exceeded")]
    Overflow {
        /// Configured maximum depth.
        limit: usize,
    },
}

/// LIFO evaluation workspace.
///
/// Arguments and return values travel between instructions through this stack.
/// The depth limit is optional; without one the stack grows as needed.
#[derive(Debug, Default)]
pub struct OperandStack {
    values: Vec<Value>,
    limit: Option<usize>,
}

impl OperandStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stack that refuses to grow past `limit` values.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            values: Vec::with_capacity(limit.unwrap_or(64).min(256)),
            limit,
        }
    }

    pub fn push(&mut self, value: Value) -> Result<(), StackError> {
        if let Some(limit) = self.limit {
            if self.values.len() >= limit {
                return Err(StackError::Overflow { limit });
            }
        }
        self.values.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Value, StackError> {
        self.values.pop().ok_or(StackError::Underflow)
    }

    pub fn peek(&self) -> Option<&Value> {
        self.values.last()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drops everything above `len`.
    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    /// Values from bottom to top.
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifo_order() {
        let mut stack = OperandStack::new();
        stack.push(Value::Number(1.0)).unwrap();
        stack.push(Value::Number(2.0)).unwrap();
        assert_eq!(stack.pop().unwrap(), Value::Number(2.0));
        assert_eq!(stack.pop().unwrap(), Value::Number(1.0));
        assert_eq!(stack.pop(), Err(StackError::Underflow));
    }

    #[test]
    fn test_limit() {
        let mut stack = OperandStack::with_limit(Some(1));
        stack.push(Value::Null).unwrap();
        assert_eq!(stack.push(Value::Null), Err(StackError::Overflow { limit: 1 }));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_truncate() {
        let mut stack = OperandStack::new();
        for i in 0..4 {
            stack.push(Value::Number(i as f64)).unwrap();
        }
        stack.truncate(1);
        assert_eq!(stack.as_slice(), &[Value::Number(0.0)]);
    }
}
