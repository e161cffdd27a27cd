use brain_core::{AgentId, AgentWorld, BlackboardError, MemoryKey, MemoryValue, Sensor, SensorKind};

/// Lists living agents within range, nearest first.
///
/// The list is always written, empty when nobody is around, so tasks that
/// need it only have to wait for the first sensing tick.
#[derive(Debug)]
pub struct NearestVisibleSensor {
    range: f64,
    interval: u64,
}

impl NearestVisibleSensor {
    pub fn new(range: f64, interval: u64) -> Self {
        Self {
            range,
            interval: interval.max(1),
        }
    }
}

impl Sensor for NearestVisibleSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::NearestVisible
    }

    fn interval(&self) -> u64 {
        self.interval
    }

    fn sense(&self, agent: AgentId, world: &mut dyn AgentWorld) -> Result<(), BlackboardError> {
        let Some(me) = world.agent(agent) else {
            return Ok(());
        };

        let mut visible: Vec<(f64, AgentId)> = world
            .agent_ids()
            .into_iter()
            .filter(|&id| id != agent)
            .filter_map(|id| world.agent(id))
            .filter(|other| other.is_alive())
            .map(|other| (me.distance_to(&other), other.id))
            .filter(|(distance, _)| *distance <= self.range)
            .collect();
        visible.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let ids = visible.into_iter().map(|(_, id)| id).collect();
        match world.blackboard_mut(agent) {
            Some(board) => board.set(MemoryKey::NearestVisibleAgents, MemoryValue::Agents(ids)),
            None => Ok(()),
        }
    }
}
