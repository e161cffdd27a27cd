use brain_core::{AgentId, AgentWorld, BlackboardError, MemoryKey, MemoryValue, Sensor, SensorKind};

/// Points `wanted_item` at the nearest loose item.
///
/// An existing want is kept while its item is still lying around, so the
/// pursuit budget of `move_to_item` is not reset by a closer item showing up.
#[derive(Debug)]
pub struct WantedItemSensor {
    range: f64,
    interval: u64,
}

impl WantedItemSensor {
    pub fn new(range: f64, interval: u64) -> Self {
        Self {
            range,
            interval: interval.max(1),
        }
    }
}

impl Sensor for WantedItemSensor {
    fn kind(&self) -> SensorKind {
        SensorKind::WantedItem
    }

    fn interval(&self) -> u64 {
        self.interval
    }

    fn sense(&self, agent: AgentId, world: &mut dyn AgentWorld) -> Result<(), BlackboardError> {
        let Some(me) = world.agent(agent) else {
            return Ok(());
        };
        let current = world
            .blackboard(agent)
            .and_then(|board| board.get(MemoryKey::WantedItem))
            .and_then(MemoryValue::as_item);
        if current.is_some_and(|item| world.item_position(item).is_some()) {
            return Ok(());
        }

        let nearest = world.nearest_item(me.position, self.range);
        let Some(board) = world.blackboard_mut(agent) else {
            return Ok(());
        };
        match nearest {
            Some(item) => board.set(MemoryKey::WantedItem, MemoryValue::Item(item)),
            None => {
                board.erase(MemoryKey::WantedItem);
                Ok(())
            }
        }
    }
}
