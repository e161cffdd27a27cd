//! Fixed-step simulation loop.
//!
//! Each step runs, in order:
//! 1. clock advance and memory expiry
//! 2. scripted hits scheduled for the new tick
//! 3. sensors whose interval divides the tick
//! 4. every living agent's brain, in ascending id order
//! 5. queued intents, then movement
//!
//! All randomness comes from one seeded RNG, so a run is fully determined
//! by the settings seed, the content and the scenario.

use std::collections::BTreeMap;

use brain_content::{HitSpec, Scenario, SpawnSpec};
use brain_core::{Activity, AgentId, AgentWorld, MemoryKey, MemoryValue, Pose, Position, Tick};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::brain::Brain;
use crate::engine::Engine;
use crate::error::{Result, RuntimeError};
use crate::world::{Body, SimWorld, WorldStats};

/// A scenario spawn that could not be instantiated.
#[derive(Clone, Debug, Serialize)]
pub struct FailedSpawn {
    pub template: String,
    pub error: String,
}

pub struct Simulation {
    engine: Engine,
    world: SimWorld,
    brains: BTreeMap<AgentId, Brain>,
    rng: SmallRng,
    /// Scripted hits not yet applied, earliest first.
    hits: Vec<HitSpec>,
    failed_spawns: Vec<FailedSpawn>,
}

impl Simulation {
    /// Empty world on default terrain.
    pub fn new(engine: Engine) -> Self {
        Self::from_scenario(engine, &Scenario::default())
    }

    /// Builds the world a scenario describes and spawns its agents.
    ///
    /// A spawn that fails is logged and skipped; the remaining agents still
    /// spawn.
    pub fn from_scenario(engine: Engine, scenario: &Scenario) -> Self {
        let settings = engine.settings();
        let seed = settings.seed;
        let mut world = SimWorld::new(scenario.terrain, settings.day_length, settings.movement_speed);
        for feature in &scenario.features {
            world.add_feature(feature.kind, feature.position);
        }
        for item in &scenario.items {
            world.add_item(item.id, item.position);
        }
        let mut hits = scenario.hits.clone();
        hits.sort_by_key(|hit| hit.tick);

        let mut simulation = Self {
            rng: SmallRng::seed_from_u64(seed),
            engine,
            world,
            brains: BTreeMap::new(),
            hits,
            failed_spawns: Vec::new(),
        };

        for spawn in &scenario.agents {
            if let Err(error) = simulation.spawn(spawn) {
                warn!(target: "brain::sim", template = %spawn.template, %error, "spawn failed");
                simulation.failed_spawns.push(FailedSpawn {
                    template: spawn.template.clone(),
                    error: error.to_string(),
                });
            }
        }
        info!(
            target: "brain::sim",
            agents = simulation.brains.len(),
            failed = simulation.failed_spawns.len(),
            "scenario ready"
        );
        simulation
    }

    /// Compiles a brain for `spawn` and places the agent in the world.
    pub fn spawn(&mut self, spawn: &SpawnSpec) -> Result<AgentId> {
        let id = match spawn.id {
            Some(id) if self.world.contains(id) => return Err(RuntimeError::DuplicateAgent { id }),
            Some(id) => id,
            None => self.next_id(),
        };

        let template = self.engine.template(&spawn.template)?;
        let entity = Engine::agent_info(template, spawn, id);
        let brain =
            self.engine
                .instantiate(template, spawn, &entity, self.world.clock(), &mut self.rng)?;

        let mut body = Body::new(
            entity,
            template.name.as_str(),
            template.herd.clone(),
            Engine::schedule(template),
        );
        body.blackboard.register_all(brain.memories().iter().copied());
        body.blackboard.advance(self.world.now());

        debug!(
            target: "brain::sim",
            agent = %id,
            template = %spawn.template,
            level = spawn.level,
            units = brain.unit_count(),
            "spawned"
        );
        self.world.insert_body(body);
        self.brains.insert(id, brain);
        Ok(id)
    }

    /// Removes an agent and its brain.
    pub fn despawn(&mut self, id: AgentId) -> Result<()> {
        if self.brains.remove(&id).is_none() {
            return Err(RuntimeError::UnknownAgent { id });
        }
        self.world.remove_body(id);
        Ok(())
    }

    /// Runs one tick and returns it.
    pub fn step(&mut self) -> Tick {
        let now = self.world.advance_clock();
        self.apply_hits(now);
        self.run_sensors(now);

        let Self {
            engine,
            world,
            brains,
            rng,
            ..
        } = self;
        for (id, brain) in brains.iter_mut() {
            if !world.agent(*id).is_some_and(|agent| agent.is_alive()) {
                continue;
            }
            brain.tick(&mut *world, engine.evaluator(), &mut *rng);
        }

        self.world.apply_intents();
        self.world.move_agents();
        now
    }

    /// Runs `ticks` steps.
    pub fn run(&mut self, ticks: u64) -> Tick {
        for _ in 0..ticks {
            self.step();
        }
        self.world.now()
    }

    /// Applies damage from `attacker` to `victim` as if it landed this tick.
    pub fn hit(&mut self, attacker: AgentId, victim: AgentId, damage: f64) -> Result<()> {
        if !self.world.contains(victim) {
            return Err(RuntimeError::UnknownAgent { id: victim });
        }
        self.world.damage(attacker, victim, damage);
        Ok(())
    }

    fn apply_hits(&mut self, now: Tick) {
        let due = self.hits.partition_point(|hit| hit.tick <= now);
        for hit in self.hits.drain(..due) {
            if !self.world.damage(hit.attacker, hit.victim, hit.damage) {
                debug!(target: "brain::sim", victim = %hit.victim, "scripted hit missed");
            }
        }
    }

    fn run_sensors(&mut self, now: Tick) {
        for (id, brain) in &self.brains {
            if !self.world.agent(*id).is_some_and(|agent| agent.is_alive()) {
                continue;
            }
            for kind in brain.sensors() {
                let Some(sensor) = self.engine.sensors().get(*kind) else {
                    continue;
                };
                if !now.is_multiple_of(sensor.interval()) {
                    continue;
                }
                if let Err(error) = sensor.sense(*id, &mut self.world) {
                    warn!(target: "brain::sensor", agent = %id, sensor = %kind, %error, "sensor failed");
                }
            }
        }
    }

    fn next_id(&self) -> AgentId {
        let last = self
            .world
            .bodies()
            .map(|body| body.info.id.0)
            .max()
            .unwrap_or(0);
        AgentId(last + 1)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut SimWorld {
        &mut self.world
    }

    pub fn brain(&self, id: AgentId) -> Option<&Brain> {
        self.brains.get(&id)
    }

    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.brains.keys().copied()
    }

    pub fn now(&self) -> Tick {
        self.world.now()
    }

    pub fn failed_spawns(&self) -> &[FailedSpawn] {
        &self.failed_spawns
    }

    /// Leader the agent currently follows.
    pub fn leader_of(&self, id: AgentId) -> Option<AgentId> {
        self.memory(id, MemoryKey::HerdLeader)
            .and_then(MemoryValue::as_agent)
    }

    /// Followers the agent last counted as a leader.
    pub fn herd_size(&self, id: AgentId) -> Option<u32> {
        self.memory(id, MemoryKey::HerdSize)
            .and_then(MemoryValue::as_count)
    }

    pub fn memory(&self, id: AgentId, key: MemoryKey) -> Option<&MemoryValue> {
        self.world.blackboard(id)?.get(key)
    }

    pub fn is_active(&self, id: AgentId, activity: Activity) -> bool {
        self.world
            .activities(id)
            .is_some_and(|activities| activities.is_active(activity))
    }

    /// Faults caught across every brain.
    pub fn fault_count(&self) -> u64 {
        self.brains.values().map(Brain::fault_count).sum()
    }

    /// Summary of the current state.
    pub fn report(&self) -> SimulationReport {
        let agents = self
            .world
            .bodies()
            .map(|body| {
                let id = body.info.id;
                AgentReport {
                    id,
                    template: body.template.clone(),
                    level: body.info.level,
                    health: body.info.health,
                    position: body.info.position,
                    pose: body.pose,
                    activities: body.activities.active_labels(),
                    leader: self.leader_of(id),
                    herd_size: self.herd_size(id),
                    inventory: body.inventory.len(),
                    faults: self.brains.get(&id).map_or(0, Brain::fault_count),
                }
            })
            .collect();
        SimulationReport {
            tick: self.world.now(),
            agents,
            stats: self.world.stats(),
            faults: self.fault_count(),
            failed_spawns: self.failed_spawns.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SimulationReport {
    pub tick: Tick,
    pub agents: Vec<AgentReport>,
    pub stats: WorldStats,
    pub faults: u64,
    pub failed_spawns: Vec<FailedSpawn>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AgentReport {
    pub id: AgentId,
    pub template: String,
    pub level: u32,
    pub health: f64,
    pub position: Position,
    pub pose: Pose,
    pub activities: Vec<Activity>,
    pub leader: Option<AgentId>,
    pub herd_size: Option<u32>,
    pub inventory: usize,
    pub faults: u64,
}
