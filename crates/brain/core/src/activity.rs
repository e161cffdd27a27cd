//! Activity labels and the scheduler that owns which one is active.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Coarse behavior-set label.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    /// Always-on group (sensing reactions, panic triggers).
    Core,
    Idle,
    Panic,
    Fight,
    Rest,
    Herd,
    Pollinate,
    Chat,
}

#[derive(Clone, Debug, PartialEq)]
struct Group {
    labels: Vec<Activity>,
    active: Activity,
}

/// Holds exactly one active label per priority group.
///
/// Group numbers double as evaluation order: lower groups run first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActivityScheduler {
    groups: BTreeMap<u8, Group>,
}

impl ActivityScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `label` to `group`. The first label of a group starts active.
    ///
    /// A label belongs to at most one group; adding it again is a no-op.
    pub fn add(&mut self, group: u8, label: Activity) {
        if self.group_of(label).is_some() {
            return;
        }
        self.groups
            .entry(group)
            .and_modify(|g| g.labels.push(label))
            .or_insert_with(|| Group {
                labels: vec![label],
                active: label,
            });
    }

    /// Makes `label` the active label of its group.
    ///
    /// Returns false if `label` is not scheduled.
    pub fn set_active(&mut self, label: Activity) -> bool {
        let Some(group) = self.group_of(label) else {
            return false;
        };
        if let Some(g) = self.groups.get_mut(&group) {
            g.active = label;
        }
        true
    }

    pub fn is_active(&self, label: Activity) -> bool {
        self.groups.values().any(|g| g.active == label)
    }

    pub fn active_in(&self, group: u8) -> Option<Activity> {
        self.groups.get(&group).map(|g| g.active)
    }

    /// Active labels in group order.
    pub fn active_labels(&self) -> Vec<Activity> {
        self.groups.values().map(|g| g.active).collect()
    }

    pub fn group_of(&self, label: Activity) -> Option<u8> {
        self.groups
            .iter()
            .find(|(_, g)| g.labels.contains(&label))
            .map(|(group, _)| *group)
    }

    pub fn contains(&self, label: Activity) -> bool {
        self.group_of(label).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> ActivityScheduler {
        let mut s = ActivityScheduler::new();
        s.add(0, Activity::Core);
        s.add(1, Activity::Idle);
        s.add(1, Activity::Panic);
        s.add(1, Activity::Rest);
        s
    }

    #[test]
    fn first_label_in_group_starts_active() {
        let s = scheduler();
        assert_eq!(s.active_labels(), vec![Activity::Core, Activity::Idle]);
    }

    #[test]
    fn switching_replaces_only_its_group() {
        let mut s = scheduler();
        assert!(s.set_active(Activity::Panic));
        assert!(s.is_active(Activity::Panic));
        assert!(!s.is_active(Activity::Idle));
        assert!(s.is_active(Activity::Core));
        assert_eq!(s.active_in(1), Some(Activity::Panic));
    }

    #[test]
    fn unscheduled_label_cannot_activate() {
        let mut s = scheduler();
        assert!(!s.set_active(Activity::Fight));
        assert_eq!(s.active_in(1), Some(Activity::Idle));
    }

    #[test]
    fn label_names_parse_case_insensitively() {
        assert_eq!("PANIC".parse::<Activity>(), Ok(Activity::Panic));
        assert_eq!(Activity::Pollinate.to_string(), "pollinate");
    }
}
