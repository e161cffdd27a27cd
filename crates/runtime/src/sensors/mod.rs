//! Built-in sensors and the registry the engine looks them up in.
//!
//! Sensors are stateless; the same instance serves every agent that asked
//! for its kind. Each one writes only the memories [`SensorKind::memories`]
//! lists for it.
mod drowsy;
mod flower;
mod hurt;
mod item;
mod visible;

use std::collections::BTreeMap;
use std::sync::Arc;

use brain_content::SensorSettings;
use brain_core::{Sensor, SensorKind};

pub use drowsy::DrowsySensor;
pub use flower::NearbyFlowerSensor;
pub use hurt::HurtBySensor;
pub use item::WantedItemSensor;
pub use visible::NearestVisibleSensor;

/// Sensor implementation per kind.
#[derive(Clone, Default)]
pub struct SensorRegistry {
    sensors: BTreeMap<SensorKind, Arc<dyn Sensor>>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in sensor, tuned by `settings`.
    pub fn from_settings(settings: &SensorSettings) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(NearestVisibleSensor::new(
            settings.visible_range,
            settings.visible_interval,
        )));
        registry.register(Arc::new(HurtBySensor::new(settings.hurt_memory_ticks)));
        registry.register(Arc::new(DrowsySensor::new(settings.drowsy_interval)));
        registry.register(Arc::new(NearbyFlowerSensor::new(
            settings.flower_range,
            settings.flower_interval,
        )));
        registry.register(Arc::new(WantedItemSensor::new(
            settings.item_range,
            settings.item_interval,
        )));
        registry
    }

    /// Installs `sensor` for its kind, replacing any earlier one.
    pub fn register(&mut self, sensor: Arc<dyn Sensor>) {
        self.sensors.insert(sensor.kind(), sensor);
    }

    pub fn get(&self, kind: SensorKind) -> Option<&Arc<dyn Sensor>> {
        self.sensors.get(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = SensorKind> + '_ {
        self.sensors.keys().copied()
    }
}

impl std::fmt::Debug for SensorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.sensors.keys()).finish()
    }
}
