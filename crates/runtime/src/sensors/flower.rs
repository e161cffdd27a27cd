use brain_core::{
    AgentId, AgentWorld, BlackboardError, FeatureKind, MemoryKey, MemoryValue, Sensor, SensorKind,
};

/// Vertical reach of the flower search.
const VERTICAL_RANGE: f64 = 4.0;

/// Tracks the nearest flower, or clears the memory when none is in range.
#[derive(Debug)]
pub struct NearbyFlowerSensor {
    range: f64,
    interval: u64,
}

impl NearbyFlowerSensor {
    pub fn new(range: f64, interval: u64) -> Self {
        Self {
            range,
            interval: interval.max(1),
        }
    }
}

impl Sensor for NearbyFlowerSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::NearbyFlower
    }

    fn interval(&self) -> u64 {
        self.interval
    }

    fn sense(&self, agent: AgentId, world: &mut dyn AgentWorld) -> Result<(), BlackboardError> {
        let Some(me) = world.agent(agent) else {
            return Ok(());
        };
        let flower = world.find_feature(me.position, FeatureKind::Flower, self.range, VERTICAL_RANGE);
        let Some(board) = world.blackboard_mut(agent) else {
            return Ok(());
        };
        match flower {
            Some(position) => board.set(MemoryKey::NearbyFlower, MemoryValue::Position(position)),
            None => {
                board.erase(MemoryKey::NearbyFlower);
                Ok(())
            }
        }
    }
}
