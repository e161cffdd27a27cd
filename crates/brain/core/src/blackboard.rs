//! Per-agent short-term memory.
//!
//! Each [`MemoryKey`] is in exactly one of three states for a given agent:
//!
//! - **Absent**: never registered; tasks that depend on it cannot compile
//! - **Registered**: declared by some task or sensor, currently empty
//! - **Present**: holds a value, optionally until an expiry tick
//!
//! A value written with a time-to-live of `n` at tick `t` is present on
//! ticks `t..t + n` and reads as registered from tick `t + n` onward.

use std::collections::BTreeMap;

use crate::agent::Tick;
use crate::error::BlackboardError;
use crate::memory::{MemoryKey, MemoryValue};

/// Observed state of one key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MemoryState<'a> {
    Absent,
    Registered,
    Present {
        value: &'a MemoryValue,
        expires_at: Option<Tick>,
    },
}

impl MemoryState<'_> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Registered and currently holding no value.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Registered)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Slot {
    Empty,
    Filled {
        value: MemoryValue,
        expires_at: Option<Tick>,
    },
}

/// Per-agent key/value memory with tick-based expiry.
#[derive(Clone, Debug, Default)]
pub struct Blackboard {
    now: Tick,
    slots: BTreeMap<MemoryKey, Slot>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `key` for this agent. Registering twice keeps the value.
    pub fn register(&mut self, key: MemoryKey) {
        self.slots.entry(key).or_insert(Slot::Empty);
    }

    pub fn register_all(&mut self, keys: impl IntoIterator<Item = MemoryKey>) {
        for key in keys {
            self.register(key);
        }
    }

    pub fn is_registered(&self, key: MemoryKey) -> bool {
        self.slots.contains_key(&key)
    }

    /// Registered keys in key order.
    pub fn registered(&self) -> impl Iterator<Item = MemoryKey> + '_ {
        self.slots.keys().copied()
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    /// Moves the clock to `now` and drops every value whose expiry has come.
    ///
    /// Returns the number of values that expired.
    pub fn advance(&mut self, now: Tick) -> usize {
        self.now = now;
        let mut expired = 0;
        for slot in self.slots.values_mut() {
            if let Slot::Filled {
                expires_at: Some(at),
                ..
            } = slot
                && *at <= now
            {
                *slot = Slot::Empty;
                expired += 1;
            }
        }
        expired
    }

    pub fn check_state(&self, key: MemoryKey) -> MemoryState<'_> {
        match self.slots.get(&key) {
            None => MemoryState::Absent,
            Some(Slot::Empty) => MemoryState::Registered,
            Some(Slot::Filled { expires_at, .. })
                if expires_at.is_some_and(|at| at <= self.now) =>
            {
                MemoryState::Registered
            }
            Some(Slot::Filled { value, expires_at }) => MemoryState::Present {
                value,
                expires_at: *expires_at,
            },
        }
    }

    pub fn get(&self, key: MemoryKey) -> Option<&MemoryValue> {
        match self.check_state(key) {
            MemoryState::Present { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn has_value(&self, key: MemoryKey) -> bool {
        self.check_state(key).is_present()
    }

    /// Expiry tick of the current value, if it has one.
    pub fn expires_at(&self, key: MemoryKey) -> Option<Tick> {
        match self.check_state(key) {
            MemoryState::Present { expires_at, .. } => expires_at,
            _ => None,
        }
    }

    /// Stores a value with no expiry.
    pub fn set(&mut self, key: MemoryKey, value: MemoryValue) -> Result<(), BlackboardError> {
        self.store(key, value, None)
    }

    /// Stores a value that reverts to registered `ttl` ticks from now.
    pub fn set_with_expiry(
        &mut self,
        key: MemoryKey,
        value: MemoryValue,
        ttl: u64,
    ) -> Result<(), BlackboardError> {
        let expires_at = self.now + ttl;
        self.store(key, value, Some(expires_at))
    }

    /// Clears the value of `key`. Returns whether a value was removed.
    ///
    /// Erasing a key that is not registered is a no-op; herd tasks erase
    /// memories on other agents whose templates may not declare them.
    pub fn erase(&mut self, key: MemoryKey) -> bool {
        let had_value = self.has_value(key);
        if let Some(slot) = self.slots.get_mut(&key) {
            *slot = Slot::Empty;
        }
        had_value
    }

    pub fn satisfies(&self, requirement: &MemoryRequirement) -> bool {
        let state = self.check_state(requirement.key);
        match requirement.condition {
            MemoryCondition::ValuePresent => state.is_present(),
            MemoryCondition::ValueAbsent => state.is_empty(),
            MemoryCondition::Registered => !state.is_absent(),
        }
    }

    pub fn satisfies_all(&self, requirements: &[MemoryRequirement]) -> bool {
        requirements.iter().all(|req| self.satisfies(req))
    }

    fn store(
        &mut self,
        key: MemoryKey,
        value: MemoryValue,
        expires_at: Option<Tick>,
    ) -> Result<(), BlackboardError> {
        if value.kind() != key.kind() {
            return Err(BlackboardError::KindMismatch {
                key,
                expected: key.kind(),
                found: value.kind(),
            });
        }
        let slot = self
            .slots
            .get_mut(&key)
            .ok_or(BlackboardError::Unregistered(key))?;
        *slot = Slot::Filled { value, expires_at };
        Ok(())
    }
}

/// What a precondition demands of one key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemoryCondition {
    /// The key holds a value.
    ValuePresent,
    /// The key is registered and holds no value.
    ValueAbsent,
    /// The key is registered; its value does not matter.
    Registered,
}

/// One entry of a task's precondition table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MemoryRequirement {
    pub key: MemoryKey,
    pub condition: MemoryCondition,
}

impl MemoryRequirement {
    pub const fn present(key: MemoryKey) -> Self {
        Self {
            key,
            condition: MemoryCondition::ValuePresent,
        }
    }

    pub const fn absent(key: MemoryKey) -> Self {
        Self {
            key,
            condition: MemoryCondition::ValueAbsent,
        }
    }

    pub const fn registered(key: MemoryKey) -> Self {
        Self {
            key,
            condition: MemoryCondition::Registered,
        }
    }
}
