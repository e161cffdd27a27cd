//! Runtime fault raised by a node while ticking.

use std::fmt;

/// A failure inside a node that is not an ordinary "did not apply".
///
/// Faults carry the name of the node that raised them so the scheduler can
/// log and count them without knowing the node's concrete type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehaviorFault {
    node: &'static str,
    message: String,
}

impl BehaviorFault {
    /// Creates a fault attributed to `node`.
    pub fn new(node: &'static str, message: impl Into<String>) -> Self {
        Self {
            node,
            message: message.into(),
        }
    }

    /// Name of the node that raised the fault.
    pub fn node(&self) -> &'static str {
        self.node
    }

    /// Human-readable description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BehaviorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} faulted: {}", self.node, self.message)
    }
}

impl std::error::Error for BehaviorFault {}
