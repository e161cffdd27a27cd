use brain_core::{AgentId, AgentWorld, BlackboardError, MemoryKey, MemoryValue, Sensor, SensorKind};

/// Sets `drowsy` at night and clears it by day.
#[derive(Debug)]
pub struct DrowsySensor {
    interval: u64,
}

impl DrowsySensor {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
        }
    }
}

impl Sensor for DrowsySensor {
    fn kind(&self) -> SensorKind {
        SensorKind::Drowsy
    }

    fn interval(&self) -> u64 {
        self.interval
    }

    fn sense(&self, agent: AgentId, world: &mut dyn AgentWorld) -> Result<(), BlackboardError> {
        let night = world.clock().is_night();
        let Some(board) = world.blackboard_mut(agent) else {
            return Ok(());
        };
        if night {
            board.set(MemoryKey::Drowsy, MemoryValue::Flag)
        } else {
            board.erase(MemoryKey::Drowsy);
            Ok(())
        }
    }
}
