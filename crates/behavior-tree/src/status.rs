//! Status returned by behavior nodes.

/// The result of evaluating a behavior node.
///
/// # Tick Semantics
///
/// Every node finishes within a single tick:
/// - `Success` means the node used the agent's slot for this tick
/// - `Failure` means nothing applied and lower-priority nodes may run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The behavior ran and consumed the slot.
    Success,

    /// The behavior did not apply this tick.
    ///
    /// Preconditions were not met, a random roll declined, or no target
    /// could be found. Never a fault.
    Failure,
}

impl Status {
    /// Returns `true` if this status is `Success`.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    /// Returns `true` if this status is `Failure`.
    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Failure)
    }
}

impl From<bool> for Status {
    #[inline]
    fn from(consumed: bool) -> Self {
        if consumed {
            Status::Success
        } else {
            Status::Failure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_maps_to_status() {
        assert_eq!(Status::from(true), Status::Success);
        assert_eq!(Status::from(false), Status::Failure);
        assert!(Status::from(true).is_success());
        assert!(Status::from(false).is_failure());
    }
}
