use brain_core::{AgentId, AgentWorld, BlackboardError, MemoryKey, MemoryValue, Sensor, SensorKind};

/// Remembers the last hit for a fixed number of ticks after it landed.
///
/// `hurt_by` holds the tick of the hit and `hurt_by_entity` the attacker.
/// Both expire together, counted from the hit rather than from sensing.
#[derive(Debug)]
pub struct HurtBySensor {
    memory_ticks: u64,
}

impl HurtBySensor {
    pub fn new(memory_ticks: u64) -> Self {
        Self { memory_ticks }
    }
}

impl Sensor for HurtBySensor {
    fn kind(&self) -> SensorKind {
        SensorKind::HurtBy
    }

    fn sense(&self, agent: AgentId, world: &mut dyn AgentWorld) -> Result<(), BlackboardError> {
        let now = world.now();
        let Some((attacker, hit_at)) = world.last_attacker(agent) else {
            return Ok(());
        };
        let remaining = (hit_at + self.memory_ticks) - now;
        if remaining == 0 {
            return Ok(());
        }

        let Some(board) = world.blackboard_mut(agent) else {
            return Ok(());
        };
        board.set_with_expiry(
            MemoryKey::HurtBy,
            MemoryValue::Number(hit_at.value() as f64),
            remaining,
        )?;
        board.set_with_expiry(MemoryKey::HurtByEntity, MemoryValue::Agent(attacker), remaining)
    }
}
