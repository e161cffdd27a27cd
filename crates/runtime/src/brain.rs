//! Compiled per-agent brains and the fault boundary around each unit.

use std::collections::{BTreeMap, BTreeSet};

use behavior_tree::{Behavior, BehaviorFault, Selector, Status};
use brain_core::{
    Activity, ActivityScheduler, AgentId, AgentWorld, Evaluator, MemoryKey, SensorKind,
    TaskContext, TaskUnit, VariableTable,
};
use rand::rngs::SmallRng;
use tracing::error;

/// Runs one unit and turns its faults into "did not run".
///
/// A faulting unit is logged and counted; its siblings in the same bucket
/// still get their turn, and the agent keeps ticking.
pub struct Isolated {
    unit: TaskUnit,
    faults: u64,
}

impl Isolated {
    pub fn new(unit: TaskUnit) -> Self {
        Self { unit, faults: 0 }
    }

    pub fn faults(&self) -> u64 {
        self.faults
    }
}

impl Behavior<TaskContext<'_>> for Isolated {
    fn tick(&mut self, ctx: &mut TaskContext<'_>) -> Result<Status, BehaviorFault> {
        match self.unit.tick(ctx) {
            Ok(status) => Ok(status),
            Err(fault) => {
                self.faults += 1;
                error!(
                    target: "brain::tick",
                    agent = %ctx.agent,
                    unit = self.unit.name(),
                    node = fault.node(),
                    error = fault.message(),
                    "task unit faulted"
                );
                Ok(Status::Failure)
            }
        }
    }

    fn name(&self) -> &'static str {
        self.unit.name()
    }
}

/// Units of one activity sharing a priority. At most one of them runs per tick.
pub struct Bucket {
    pub priority: u32,
    selector: Selector<Isolated>,
}

impl Bucket {
    pub fn new(priority: u32, units: Vec<TaskUnit>) -> Self {
        Self {
            priority,
            selector: Selector::new(units.into_iter().map(Isolated::new).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.selector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selector.is_empty()
    }

    fn faults(&self) -> u64 {
        self.selector.children().map(Isolated::faults).sum()
    }
}

/// Everything an agent was compiled into.
pub struct Brain {
    agent: AgentId,
    variables: VariableTable,
    /// Buckets per activity, in ascending priority.
    activities: BTreeMap<Activity, Vec<Bucket>>,
    memories: BTreeSet<MemoryKey>,
    sensors: BTreeSet<SensorKind>,
}

impl Brain {
    pub fn new(
        agent: AgentId,
        variables: VariableTable,
        units: Vec<(Activity, u32, Vec<TaskUnit>)>,
        memories: BTreeSet<MemoryKey>,
        sensors: BTreeSet<SensorKind>,
    ) -> Self {
        let mut grouped: BTreeMap<Activity, BTreeMap<u32, Vec<TaskUnit>>> = BTreeMap::new();
        for (activity, priority, compiled) in units {
            grouped
                .entry(activity)
                .or_default()
                .entry(priority)
                .or_default()
                .extend(compiled);
        }

        let activities = grouped
            .into_iter()
            .map(|(activity, buckets)| {
                let buckets = buckets
                    .into_iter()
                    .filter(|(_, units)| !units.is_empty())
                    .map(|(priority, units)| Bucket::new(priority, units))
                    .collect();
                (activity, buckets)
            })
            .collect();

        Self {
            agent,
            variables,
            activities,
            memories,
            sensors,
        }
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    pub fn memories(&self) -> &BTreeSet<MemoryKey> {
        &self.memories
    }

    pub fn sensors(&self) -> &BTreeSet<SensorKind> {
        &self.sensors
    }

    pub fn buckets(&self, activity: Activity) -> &[Bucket] {
        self.activities.get(&activity).map_or(&[], Vec::as_slice)
    }

    /// Total number of compiled units.
    pub fn unit_count(&self) -> usize {
        self.activities.values().flatten().map(Bucket::len).sum()
    }

    /// Faults caught across all units since spawn.
    pub fn fault_count(&self) -> u64 {
        self.activities.values().flatten().map(Bucket::faults).sum()
    }

    /// Ticks every bucket of every active activity, in group order.
    ///
    /// Active labels are read once up front: an activity switched on during
    /// this tick starts running on the next one. Returns the number of
    /// buckets in which a unit ran.
    pub fn tick(
        &mut self,
        world: &mut dyn AgentWorld,
        evaluator: &dyn Evaluator,
        rng: &mut SmallRng,
    ) -> usize {
        let Some(active) = world
            .activities(self.agent)
            .map(ActivityScheduler::active_labels)
        else {
            return 0;
        };

        let Brain {
            agent,
            variables,
            activities,
            ..
        } = self;
        let mut ctx = TaskContext::new(*agent, world, evaluator, variables, rng);

        let mut ran = 0;
        for label in active {
            let Some(buckets) = activities.get_mut(&label) else {
                continue;
            };
            for bucket in buckets.iter_mut() {
                match bucket.selector.tick(&mut ctx) {
                    Ok(Status::Success) => ran += 1,
                    Ok(Status::Failure) => {}
                    Err(fault) => {
                        error!(target: "brain::tick", agent = %agent, %fault, "bucket faulted");
                    }
                }
            }
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct Counting {
        hits: Arc<AtomicU32>,
        outcome: Result<bool, &'static str>,
    }

    impl Behavior<TaskContext<'_>> for Counting {
        fn tick(&mut self, _ctx: &mut TaskContext<'_>) -> Result<Status, BehaviorFault> {
            self.hits.fetch_add(1, Ordering::Relaxed);
            match self.outcome {
                Ok(ran) => Ok(Status::from(ran)),
                Err(message) => Err(BehaviorFault::new("counting", message)),
            }
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn unit(hits: &Arc<AtomicU32>, outcome: Result<bool, &'static str>) -> TaskUnit {
        Box::new(Counting {
            hits: Arc::clone(hits),
            outcome,
        })
    }

    #[test]
    fn units_are_grouped_into_sorted_buckets() {
        let hits = Arc::new(AtomicU32::new(0));
        let brain = Brain::new(
            AgentId(1),
            VariableTable::new(),
            vec![
                (Activity::Idle, 5, vec![unit(&hits, Ok(true))]),
                (Activity::Idle, 1, vec![unit(&hits, Ok(true)), unit(&hits, Ok(false))]),
                (Activity::Idle, 3, Vec::new()),
                (Activity::Core, 0, vec![unit(&hits, Ok(true))]),
            ],
            BTreeSet::new(),
            BTreeSet::new(),
        );

        let priorities: Vec<u32> = brain.buckets(Activity::Idle).iter().map(|b| b.priority).collect();
        assert_eq!(priorities, vec![1, 5]);
        assert_eq!(brain.unit_count(), 4);
        assert!(brain.buckets(Activity::Rest).is_empty());
    }
}
