//! VM configuration types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A setting has an unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Resource guards for a [`Vm`](crate::Vm).
///
/// Both limits default to `None`, leaving the operand stack and call nesting
/// bounded only by host memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Maximum number of values on the operand stack.
    pub max_stack_depth: Option<usize>,
    /// Maximum nesting of interpreted function calls.
    pub max_call_depth: Option<usize>,
}

impl VmConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_stack_depth == Some(0) {
            return Err(ConfigError::Invalid(
                "max_stack_depth must be > 0".to_string(),
            ));
        }
        if self.max_call_depth == Some(0) {
            return Err(ConfigError::Invalid(
                "max_call_depth must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
