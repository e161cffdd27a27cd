//! In-memory world the simulation ticks agents against.
//!
//! Terrain is a flat square; features and items are points on it. Bodies
//! move by following their `walk_target` memory, so a task that forgets the
//! target stops the agent on the next movement step.

use std::collections::{BTreeMap, BTreeSet};

use brain_content::{FeatureSpec, TerrainSpec};
use brain_core::{
    ActivityScheduler, AgentId, AgentInfo, AgentWorld, Blackboard, FeatureKind, HerdProfile,
    Intent, ItemId, MemoryKey, MemoryValue, Pose, Position, Tick, WalkTarget, WorldClock,
};
use serde::Serialize;
use tracing::{debug, info, trace};

/// Damage dealt by one `Attack` intent.
pub const ATTACK_DAMAGE: f64 = 2.0;

/// Reach of `Attack` and `PickUp` intents.
pub const REACH: f64 = 1.5;

/// An agent counts as standing in a fluid within this distance of its feature.
const FLUID_RANGE: f64 = 1.5;

/// Simulated state of one agent.
#[derive(Clone, Debug)]
pub struct Body {
    pub info: AgentInfo,
    pub template: String,
    pub herd: HerdProfile,
    pub blackboard: Blackboard,
    pub activities: ActivityScheduler,
    pub pose: Pose,
    pub aspects: BTreeSet<String>,
    pub look_at: Option<Position>,
    /// Last `Walk` intent, followed when the agent keeps no `walk_target` memory.
    pub heading: Option<WalkTarget>,
    pub last_hit: Option<(AgentId, Tick)>,
    pub inventory: Vec<ItemId>,
}

impl Body {
    pub fn new(
        info: AgentInfo,
        template: impl Into<String>,
        herd: HerdProfile,
        activities: ActivityScheduler,
    ) -> Self {
        Self {
            info,
            template: template.into(),
            herd,
            blackboard: Blackboard::new(),
            activities,
            pose: Pose::Standing,
            aspects: BTreeSet::new(),
            look_at: None,
            heading: None,
            last_hit: None,
            inventory: Vec::new(),
        }
    }

    /// Where the body is currently walking to.
    fn walk_target(&self) -> Option<WalkTarget> {
        if self.blackboard.is_registered(MemoryKey::WalkTarget) {
            self.blackboard
                .get(MemoryKey::WalkTarget)
                .and_then(MemoryValue::as_walk_target)
        } else {
            self.heading
        }
    }
}

/// Counters reported at the end of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WorldStats {
    pub attacks: u64,
    pub pickups: u64,
    pub deaths: u64,
    pub expired_memories: u64,
}

pub struct SimWorld {
    clock: WorldClock,
    terrain: TerrainSpec,
    movement_speed: f64,
    bodies: BTreeMap<AgentId, Body>,
    features: Vec<FeatureSpec>,
    items: BTreeMap<ItemId, Position>,
    intents: Vec<(AgentId, Intent)>,
    stats: WorldStats,
}

impl SimWorld {
    pub fn new(terrain: TerrainSpec, day_length: u64, movement_speed: f64) -> Self {
        Self {
            clock: WorldClock::new(Tick::ZERO, day_length),
            terrain,
            movement_speed,
            bodies: BTreeMap::new(),
            features: Vec::new(),
            items: BTreeMap::new(),
            intents: Vec::new(),
            stats: WorldStats::default(),
        }
    }

    pub fn insert_body(&mut self, body: Body) {
        self.bodies.insert(body.info.id, body);
    }

    pub fn remove_body(&mut self, id: AgentId) -> Option<Body> {
        self.intents.retain(|(agent, _)| *agent != id);
        self.bodies.remove(&id)
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn body(&self, id: AgentId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn body_mut(&mut self, id: AgentId) -> Option<&mut Body> {
        self.bodies.get_mut(&id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    pub fn add_feature(&mut self, kind: FeatureKind, position: Position) {
        self.features.push(FeatureSpec { kind, position });
    }

    pub fn add_item(&mut self, item: ItemId, position: Position) {
        self.items.insert(item, position);
    }

    pub fn items(&self) -> impl Iterator<Item = (ItemId, Position)> + '_ {
        self.items.iter().map(|(id, pos)| (*id, *pos))
    }

    /// Teleports an agent; used by scenarios and tests.
    pub fn place(&mut self, id: AgentId, position: Position) -> bool {
        let Some(body) = self.bodies.get_mut(&id) else {
            return false;
        };
        body.info.position = position;
        self.refresh_fluids(id);
        true
    }

    pub fn stats(&self) -> WorldStats {
        self.stats
    }

    pub fn pending_intents(&self) -> &[(AgentId, Intent)] {
        &self.intents
    }

    /// Moves the clock forward one tick and expires memories that ran out.
    pub fn advance_clock(&mut self) -> Tick {
        self.clock.now = self.clock.now.next();
        let now = self.clock.now;
        let expired: usize = self
            .bodies
            .values_mut()
            .map(|body| body.blackboard.advance(now))
            .sum();
        self.stats.expired_memories += expired as u64;
        now
    }

    /// Applies damage and records the attacker. Returns false when the
    /// victim is unknown or already dead.
    pub fn damage(&mut self, attacker: AgentId, victim: AgentId, amount: f64) -> bool {
        let now = self.clock.now;
        let Some(body) = self.bodies.get_mut(&victim) else {
            return false;
        };
        if !body.info.is_alive() {
            return false;
        }

        body.info.health = (body.info.health - amount).max(0.0);
        body.last_hit = Some((attacker, now));
        trace!(
            target: "brain::world",
            %attacker,
            %victim,
            amount,
            health = body.info.health,
            "hit"
        );
        if !body.info.is_alive() {
            self.stats.deaths += 1;
            info!(target: "brain::world", agent = %victim, killer = %attacker, "agent died");
        }
        true
    }

    /// Applies every queued intent in issue order.
    pub fn apply_intents(&mut self) {
        for (agent, intent) in std::mem::take(&mut self.intents) {
            self.apply(agent, intent);
        }
    }

    fn apply(&mut self, agent: AgentId, intent: Intent) {
        match intent {
            Intent::Walk(target) => {
                if let Some(body) = self.bodies.get_mut(&agent) {
                    body.heading = Some(target);
                }
            }
            Intent::LookAt(position) => {
                if let Some(body) = self.bodies.get_mut(&agent) {
                    body.look_at = Some(position);
                }
            }
            Intent::StopMoving => {
                if let Some(body) = self.bodies.get_mut(&agent) {
                    body.heading = None;
                    body.blackboard.erase(MemoryKey::WalkTarget);
                }
            }
            Intent::Attack(victim) => {
                let in_reach = self.position(agent).zip(self.position(victim)).is_some_and(
                    |(from, to)| from.distance(&to) <= REACH,
                );
                if in_reach && self.damage(agent, victim, ATTACK_DAMAGE) {
                    self.stats.attacks += 1;
                }
            }
            Intent::PickUp(item) => self.pick_up(agent, item),
            Intent::SetPose(pose) => {
                if let Some(body) = self.bodies.get_mut(&agent) {
                    body.pose = pose;
                    debug!(target: "brain::world", %agent, %pose, "pose changed");
                }
            }
            Intent::SetAspect { name, enabled } => {
                if let Some(body) = self.bodies.get_mut(&agent) {
                    if enabled {
                        body.aspects.insert(name);
                    } else {
                        body.aspects.remove(&name);
                    }
                }
            }
            Intent::PlaySound(sound) => {
                trace!(target: "brain::world", %agent, %sound, "sound");
            }
        }
    }

    fn pick_up(&mut self, agent: AgentId, item: ItemId) {
        let Some(from) = self.position(agent) else {
            return;
        };
        let Some(at) = self.items.get(&item).copied() else {
            return;
        };
        if from.distance(&at) > REACH {
            return;
        }
        self.items.remove(&item);
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.inventory.push(item);
        }
        self.stats.pickups += 1;
        debug!(target: "brain::world", %agent, %item, "picked up item");
    }

    /// Steps every awake, living agent toward its walk target.
    pub fn move_agents(&mut self) {
        let ids: Vec<AgentId> = self.bodies.keys().copied().collect();
        for id in ids {
            self.move_agent(id);
        }
    }

    fn move_agent(&mut self, id: AgentId) {
        let step_base = self.movement_speed;
        let Some(body) = self.bodies.get_mut(&id) else {
            return;
        };
        if !body.info.is_alive() || body.pose == Pose::Sleeping {
            return;
        }
        let Some(target) = body.walk_target() else {
            return;
        };

        let from = body.info.position;
        if !target.is_reached_from(&from) {
            let step = step_base * target.speed.max(0.0);
            body.info.position = from.step_toward(&target.position, step);
        }
        if target.is_reached_from(&body.info.position) {
            body.heading = None;
            body.blackboard.erase(MemoryKey::WalkTarget);
            trace!(target: "brain::world", agent = %id, position = %body.info.position, "arrived");
        }
        self.refresh_fluids(id);
    }

    fn refresh_fluids(&mut self, id: AgentId) {
        let Some(position) = self.position(id) else {
            return;
        };
        let near = |kind: FeatureKind| {
            self.features
                .iter()
                .any(|f| f.kind == kind && f.position.distance(&position) <= FLUID_RANGE)
        };
        let (water, lava) = (near(FeatureKind::Water), near(FeatureKind::Lava));
        if let Some(body) = self.bodies.get_mut(&id) {
            body.info.in_water = water;
            body.info.in_lava = lava;
        }
    }

    fn position(&self, id: AgentId) -> Option<Position> {
        self.bodies.get(&id).map(|body| body.info.position)
    }
}

impl AgentWorld for SimWorld {
    fn clock(&self) -> WorldClock {
        self.clock
    }

    fn agent_ids(&self) -> Vec<AgentId> {
        self.bodies
            .values()
            .filter(|body| body.info.is_alive())
            .map(|body| body.info.id)
            .collect()
    }

    fn agent(&self, id: AgentId) -> Option<AgentInfo> {
        self.bodies.get(&id).map(|body| body.info.clone())
    }

    fn herd_profile(&self, id: AgentId) -> Option<&HerdProfile> {
        self.bodies.get(&id).map(|body| &body.herd)
    }

    fn blackboard(&self, id: AgentId) -> Option<&Blackboard> {
        self.bodies.get(&id).map(|body| &body.blackboard)
    }

    fn blackboard_mut(&mut self, id: AgentId) -> Option<&mut Blackboard> {
        self.bodies.get_mut(&id).map(|body| &mut body.blackboard)
    }

    fn activities(&self, id: AgentId) -> Option<&ActivityScheduler> {
        self.bodies.get(&id).map(|body| &body.activities)
    }

    fn activities_mut(&mut self, id: AgentId) -> Option<&mut ActivityScheduler> {
        self.bodies.get_mut(&id).map(|body| &mut body.activities)
    }

    fn find_feature(
        &self,
        origin: Position,
        kind: FeatureKind,
        horizontal: f64,
        vertical: f64,
    ) -> Option<Position> {
        self.features
            .iter()
            .filter(|f| f.kind == kind)
            .map(|f| (origin.horizontal_distance(&f.position), f.position))
            .filter(|(distance, at)| *distance <= horizontal && (at.y - origin.y).abs() <= vertical)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, at)| at)
    }

    fn walkable(&self, candidate: Position) -> Option<Position> {
        let extent = self.terrain.half_extent;
        if candidate.x.abs() > extent || candidate.z.abs() > extent {
            return None;
        }
        Some(Position::new(candidate.x, self.terrain.ground_level, candidate.z))
    }

    fn item_position(&self, item: ItemId) -> Option<Position> {
        self.items.get(&item).copied()
    }

    fn nearest_item(&self, origin: Position, range: f64) -> Option<ItemId> {
        self.items
            .iter()
            .map(|(id, at)| (origin.distance(at), *id))
            .filter(|(distance, _)| *distance <= range)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id)
    }

    fn last_attacker(&self, id: AgentId) -> Option<(AgentId, Tick)> {
        self.bodies.get(&id).and_then(|body| body.last_hit)
    }

    fn issue(&mut self, agent: AgentId, intent: Intent) {
        self.intents.push((agent, intent));
    }
}
