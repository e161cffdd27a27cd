//! Engine context: loaded content plus everything needed to turn a
//! template into a [`Brain`] for one concrete agent.

use brain_content::{
    AgentTemplate, CompileContext, ContentFactory, ContentSet, EngineSettings, SpawnSpec,
    TaskConfigRegistry,
};
use brain_content::loaders::LoadResult;
use brain_core::{
    Activity, ActivityScheduler, AgentId, AgentInfo, ConfigError, Evaluator, ExpressionEvaluator,
    WorldClock,
};
use rand::rngs::SmallRng;
use tracing::{debug, info};

use crate::brain::Brain;
use crate::error::{Result, RuntimeError};
use crate::sensors::SensorRegistry;

/// Scheduler group of [`Activity::Core`]; it always runs first.
pub const CORE_GROUP: u8 = 0;
/// Scheduler group shared by every other activity.
pub const BEHAVIOR_GROUP: u8 = 1;

/// Shared, read-only state behind every spawned agent.
pub struct Engine {
    registry: TaskConfigRegistry,
    sensors: SensorRegistry,
    evaluator: Box<dyn Evaluator>,
    settings: EngineSettings,
    content: ContentSet,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Loads settings and templates from a data directory.
    pub fn from_factory(factory: &ContentFactory) -> LoadResult<Self> {
        let settings = factory.load_settings()?;
        let registry = TaskConfigRegistry::with_builtin();
        let content = factory.load_templates(&registry)?;
        Ok(Self::builder()
            .settings(settings)
            .registry(registry)
            .content(content)
            .build())
    }

    pub fn registry(&self) -> &TaskConfigRegistry {
        &self.registry
    }

    pub fn sensors(&self) -> &SensorRegistry {
        &self.sensors
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator.as_ref()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn content(&self) -> &ContentSet {
        &self.content
    }

    /// Looks up a loaded template, distinguishing disabled from unknown.
    pub fn template(&self, name: &str) -> Result<&AgentTemplate> {
        if let Some(template) = self.content.get(name) {
            return Ok(template);
        }
        if self.content.is_disabled(name) {
            Err(RuntimeError::DisabledTemplate {
                name: name.to_owned(),
            })
        } else {
            Err(RuntimeError::UnknownTemplate {
                name: name.to_owned(),
            })
        }
    }

    /// Snapshot of a freshly spawned agent.
    pub fn agent_info(template: &AgentTemplate, spawn: &SpawnSpec, id: AgentId) -> AgentInfo {
        let max_health = template.max_health;
        AgentInfo {
            id,
            species: template.species.clone(),
            level: spawn.level,
            health: spawn.health.unwrap_or(max_health).min(max_health),
            max_health,
            position: spawn.position,
            in_water: false,
            in_lava: false,
        }
    }

    /// Activity scheduler in the template's initial state.
    pub fn schedule(template: &AgentTemplate) -> ActivityScheduler {
        let mut activities = ActivityScheduler::new();
        activities.add(CORE_GROUP, Activity::Core);
        for activity in template.scheduled_activities() {
            activities.add(BEHAVIOR_GROUP, activity);
        }
        activities.set_active(template.default_activity);
        activities
    }

    /// Compiles `template` for one agent.
    ///
    /// Guards and spawn-time choices are resolved here, against `entity`
    /// and with `rng`; the resulting brain only holds what survived.
    pub fn instantiate(
        &self,
        template: &AgentTemplate,
        spawn: &SpawnSpec,
        entity: &AgentInfo,
        clock: WorldClock,
        rng: &mut SmallRng,
    ) -> std::result::Result<Brain, ConfigError> {
        let mut table = template.variable_table()?;
        let overrides = template.path().field("overrides");
        for (name, value) in &spawn.overrides {
            table.apply_override(name, value.clone(), &overrides.field(name))?;
        }

        let mut units = Vec::new();
        let (memories, sensors) = {
            let mut ctx = CompileContext::new(
                template.path(),
                entity,
                &table,
                self.evaluator(),
                clock,
                rng,
            );
            for (path, activity, task) in template.tasks() {
                let compiled = ctx.within(path, |ctx| task.task.create_tasks(ctx))?;
                units.push((activity, task.priority, compiled));
            }
            ctx.into_requirements()
        };

        let brain = Brain::new(entity.id, table, units, memories, sensors);
        debug!(
            target: "brain::compile",
            agent = %entity.id,
            template = %template.name,
            units = brain.unit_count(),
            memories = brain.memories().len(),
            sensors = brain.sensors().len(),
            "brain compiled"
        );
        Ok(brain)
    }
}

/// Builder for [`Engine`].
pub struct EngineBuilder {
    registry: Option<TaskConfigRegistry>,
    sensors: Option<SensorRegistry>,
    evaluator: Option<Box<dyn Evaluator>>,
    settings: EngineSettings,
    content: ContentSet,
}

impl EngineBuilder {
    fn new() -> Self {
        Self {
            registry: None,
            sensors: None,
            evaluator: None,
            settings: EngineSettings::default(),
            content: ContentSet::new(),
        }
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Tag registry; the built-in tags when not set.
    pub fn registry(mut self, registry: TaskConfigRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sensor implementations; the built-ins tuned by the settings when not set.
    pub fn sensors(mut self, sensors: SensorRegistry) -> Self {
        self.sensors = Some(sensors);
        self
    }

    pub fn evaluator(mut self, evaluator: impl Evaluator + 'static) -> Self {
        self.evaluator = Some(Box::new(evaluator));
        self
    }

    pub fn content(mut self, content: ContentSet) -> Self {
        self.content = content;
        self
    }

    /// Parses, validates and adds one JSON template.
    ///
    /// A bad template is recorded as disabled instead of failing the build.
    pub fn template(mut self, origin: &str, document: &serde_json::Value) -> Self {
        let registry = self.registry.get_or_insert_with(TaskConfigRegistry::with_builtin);
        self.content.ingest(registry, origin, document);
        self
    }

    pub fn build(self) -> Engine {
        let sensors = self
            .sensors
            .unwrap_or_else(|| SensorRegistry::from_settings(&self.settings.sensors));
        let engine = Engine {
            registry: self.registry.unwrap_or_else(TaskConfigRegistry::with_builtin),
            sensors,
            evaluator: self
                .evaluator
                .unwrap_or_else(|| Box::new(ExpressionEvaluator::new())),
            settings: self.settings,
            content: self.content,
        };
        info!(
            target: "brain::content",
            templates = engine.content.templates.len(),
            disabled = engine.content.disabled.len(),
            "engine ready"
        );
        engine
    }
}

#[cfg(test)]
mod tests {
    use brain_core::{Position, Tick};
    use rand::SeedableRng;
    use serde_json::json;

    use super::*;

    fn engine() -> Engine {
        Engine::builder()
            .template(
                "mareep",
                &json!({
                    "name": "mareep",
                    "max_health": 30.0,
                    "herd": { "tolerated_leaders": [{ "species": "mareep" }], "max_size": 3 },
                    "activities": [
                        { "activity": "core", "tasks": [
                            { "priority": 0, "task": { "type": "maintain_herd_leader" } }
                        ]},
                        { "activity": "idle", "tasks": [
                            { "priority": 0, "task": { "type": "find_herd_leader" } },
                            { "priority": 5, "task": { "type": "wander", "condition": "q.entity.level > 10" } }
                        ]},
                        { "activity": "herd", "tasks": [
                            { "priority": 0, "task": { "type": "follow_herd_leader" } }
                        ]}
                    ]
                }),
            )
            .template("broken", &json!({ "name": "broken", "activities": 3 }))
            .build()
    }

    fn compile(engine: &Engine, level: u32) -> Brain {
        let template = engine.template("mareep").unwrap();
        let spawn = SpawnSpec::new("mareep", level, Position::new(0.0, 64.0, 0.0));
        let entity = Engine::agent_info(template, &spawn, AgentId(1));
        let mut rng = SmallRng::seed_from_u64(3);
        engine
            .instantiate(template, &spawn, &entity, WorldClock::new(Tick::ZERO, 2400), &mut rng)
            .unwrap()
    }

    #[test]
    fn lookups_distinguish_disabled_and_unknown() {
        let engine = engine();
        assert!(engine.template("mareep").is_ok());
        assert!(matches!(
            engine.template("broken"),
            Err(RuntimeError::DisabledTemplate { .. })
        ));
        assert!(matches!(
            engine.template("wooloo"),
            Err(RuntimeError::UnknownTemplate { .. })
        ));
    }

    #[test]
    fn compile_time_guards_depend_on_the_agent() {
        let engine = engine();
        assert_eq!(compile(&engine, 5).unit_count(), 3);
        assert_eq!(compile(&engine, 20).unit_count(), 4);
    }

    #[test]
    fn memories_of_sensors_are_collected() {
        let brain = compile(&engine(), 5);
        assert!(brain.memories().contains(&brain_core::MemoryKey::HerdLeader));
        assert!(brain.memories().contains(&brain_core::MemoryKey::NearestVisibleAgents));
        assert!(brain.sensors().contains(&brain_core::SensorKind::NearestVisible));
    }

    #[test]
    fn scheduler_starts_in_the_default_activity() {
        let engine = engine();
        let activities = Engine::schedule(engine.template("mareep").unwrap());
        assert_eq!(activities.active_labels(), vec![Activity::Core, Activity::Idle]);
        assert!(activities.contains(Activity::Herd));
    }

    #[test]
    fn spawn_health_is_capped() {
        let engine = engine();
        let template = engine.template("mareep").unwrap();
        let mut spawn = SpawnSpec::new("mareep", 3, Position::ORIGIN);
        spawn.health = Some(99.0);
        let info = Engine::agent_info(template, &spawn, AgentId(4));
        assert_eq!(info.health, 30.0);
        assert_eq!(info.species.as_str(), "mareep");
    }
}
