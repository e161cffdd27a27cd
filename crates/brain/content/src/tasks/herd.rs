//! Herd coordination: choosing, keeping and following a leader.
//!
//! Membership lives entirely in blackboards. A follower holds `HerdLeader`;
//! a leader's `HerdSize` is recomputed from its neighbours' memories every
//! few ticks and may lag behind joins and departures in between.

use std::cmp::Ordering;

use behavior_tree::BehaviorFault;
use brain_core::{
    Activity, AgentId, AgentInfo, AgentWorld, CompiledParam, ConfigError, HerdProfile, MemoryKey,
    MemoryRequirement, MemoryValue, ParamBinding, SensorKind, TaskContext, TaskUnit,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compile::CompileContext;
use crate::config::TaskDefinition;
use crate::tasks::{LeafTask, malformed_memory, random_destination, walk_speed, walk_to};

/// What leader selection needs to know about one neighbour.
#[derive(Clone, Debug, PartialEq)]
pub struct LeaderCandidate {
    pub info: AgentInfo,
    /// The candidate currently follows someone itself.
    pub following: bool,
    /// Last recorded follower count; zero when never counted.
    pub herd_size: u32,
    /// The candidate's own follower limit.
    pub max_size: u32,
}

impl LeaderCandidate {
    /// Snapshots `id` from the world. Unknown agents yield `None`.
    pub fn observe(world: &dyn AgentWorld, id: AgentId) -> Option<Self> {
        let info = world.agent(id)?;
        let board = world.blackboard(id);
        Some(Self {
            info,
            following: board.is_some_and(|board| board.has_value(MemoryKey::HerdLeader)),
            herd_size: board
                .and_then(|board| board.get(MemoryKey::HerdSize))
                .and_then(|value| value.as_count())
                .unwrap_or(0),
            max_size: world.herd_profile(id).map_or(0, |profile| profile.max_size),
        })
    }
}

/// Picks the leader `follower` should join among `candidates`.
///
/// A candidate qualifies when it is another living agent that `profile`
/// tolerates, follows nobody, and is below its own capacity. With
/// `above_level` set, only candidates of a strictly higher level qualify.
///
/// Ties go to the highest level, then the nearest, then the lowest id.
pub fn best_leader<'a>(
    follower: &AgentInfo,
    profile: &HerdProfile,
    candidates: impl IntoIterator<Item = &'a LeaderCandidate>,
    above_level: Option<u32>,
) -> Option<AgentId> {
    candidates
        .into_iter()
        .filter(|candidate| {
            let info = &candidate.info;
            info.id != follower.id
                && info.is_alive()
                && profile.match_leader(follower, info).is_some()
                && !candidate.following
                && candidate.herd_size < candidate.max_size
                && above_level.is_none_or(|level| info.level > level)
        })
        .min_by(|a, b| rank(follower, a, b))
        .map(|candidate| candidate.info.id)
}

fn rank(follower: &AgentInfo, a: &LeaderCandidate, b: &LeaderCandidate) -> Ordering {
    let distance = |c: &LeaderCandidate| follower.position.distance(&c.info.position);
    b.info
        .level
        .cmp(&a.info.level)
        .then_with(|| distance(a).total_cmp(&distance(b)))
        .then_with(|| a.info.id.cmp(&b.info.id))
}

fn nearby_agents(ctx: &TaskContext<'_>, node: &'static str) -> Result<Vec<AgentId>, BehaviorFault> {
    ctx.memory(MemoryKey::NearestVisibleAgents)
        .and_then(|value| value.as_agents())
        .map(<[AgentId]>::to_vec)
        .ok_or_else(|| malformed_memory(node, MemoryKey::NearestVisibleAgents))
}

fn observe_all(world: &dyn AgentWorld, ids: &[AgentId]) -> Vec<LeaderCandidate> {
    ids.iter()
        .filter_map(|&id| LeaderCandidate::observe(world, id))
        .collect()
}

fn current_leader(ctx: &TaskContext<'_>, node: &'static str) -> Result<AgentId, BehaviorFault> {
    ctx.memory(MemoryKey::HerdLeader)
        .and_then(|value| value.as_agent())
        .ok_or_else(|| malformed_memory(node, MemoryKey::HerdLeader))
}

/// Clears `leader`'s own leader so it cannot lead while following.
fn claim_leader(ctx: &mut TaskContext<'_>, leader: AgentId) -> Result<(), BehaviorFault> {
    if let Some(board) = ctx.world.blackboard_mut(leader) {
        board.erase(MemoryKey::HerdLeader);
    }
    ctx.remember(MemoryKey::HerdLeader, MemoryValue::Agent(leader))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FindHerdLeaderConfig {
    pub check_ticks: ParamBinding,
}

impl Default for FindHerdLeaderConfig {
    fn default() -> Self {
        Self {
            check_ticks: ParamBinding::from(60.0),
        }
    }
}

impl TaskDefinition for FindHerdLeaderConfig {
    fn tag(&self) -> &'static str {
        "find_herd_leader"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![("check_ticks", &self.check_ticks)]
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        let check_ticks = ctx.resolve_interval(&self.check_ticks, "check_ticks")?;
        Ok(vec![ctx.leaf(FindHerdLeader { check_ticks })?])
    }
}

pub struct FindHerdLeader {
    check_ticks: u64,
}

impl LeafTask for FindHerdLeader {
    fn name(&self) -> &'static str {
        "find_herd_leader"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] = &[
            MemoryRequirement::present(MemoryKey::NearestVisibleAgents),
            MemoryRequirement::absent(MemoryKey::HerdLeader),
        ];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[MemoryKey::HerdLeader]
    }

    fn sensors(&self) -> &[SensorKind] {
        &[SensorKind::NearestVisible]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        if !ctx.now().is_multiple_of(self.check_ticks) {
            return Ok(false);
        }
        let me = ctx.me()?;
        let Some(profile) = ctx.world.herd_profile(me.id).cloned() else {
            return Ok(false);
        };
        let nearby = nearby_agents(ctx, "find_herd_leader")?;
        let candidates = observe_all(&*ctx.world, &nearby);

        let Some(leader) = best_leader(&me, &profile, &candidates, None) else {
            return Ok(false);
        };
        claim_leader(ctx, leader)?;
        debug!(target: "brain::tick", agent = %me.id, %leader, "joined herd");
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaintainHerdLeaderConfig {
    pub check_ticks: ParamBinding,
}

impl Default for MaintainHerdLeaderConfig {
    fn default() -> Self {
        Self {
            check_ticks: ParamBinding::from(20.0),
        }
    }
}

impl TaskDefinition for MaintainHerdLeaderConfig {
    fn tag(&self) -> &'static str {
        "maintain_herd_leader"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![("check_ticks", &self.check_ticks)]
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        let check_ticks = ctx.resolve_interval(&self.check_ticks, "check_ticks")?;
        Ok(vec![ctx.leaf(MaintainHerdLeader { check_ticks })?])
    }
}

/// Drops an invalid leader, or trades up to a strictly higher-level one.
pub struct MaintainHerdLeader {
    check_ticks: u64,
}

impl LeafTask for MaintainHerdLeader {
    fn name(&self) -> &'static str {
        "maintain_herd_leader"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] = &[
            MemoryRequirement::present(MemoryKey::HerdLeader),
            MemoryRequirement::registered(MemoryKey::NearestVisibleAgents),
        ];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[MemoryKey::HerdLeader]
    }

    fn sensors(&self) -> &[SensorKind] {
        &[SensorKind::NearestVisible]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        if !ctx.now().is_multiple_of(self.check_ticks) {
            return Ok(false);
        }
        let me = ctx.me()?;
        let leader_id = current_leader(ctx, "maintain_herd_leader")?;
        let profile = ctx.world.herd_profile(me.id).cloned().unwrap_or_default();

        let leader = ctx.world.agent(leader_id).filter(|leader| {
            leader.id != me.id
                && leader.is_alive()
                && profile.tolerates_species(&leader.species)
                && !ctx
                    .world
                    .blackboard(leader_id)
                    .is_some_and(|board| board.has_value(MemoryKey::HerdLeader))
        });
        let Some(leader) = leader else {
            ctx.forget(MemoryKey::HerdLeader);
            debug!(target: "brain::tick", agent = %me.id, leader = %leader_id, "left herd");
            return Ok(true);
        };

        let nearby = ctx
            .memory(MemoryKey::NearestVisibleAgents)
            .and_then(|value| value.as_agents())
            .map(<[AgentId]>::to_vec)
            .unwrap_or_default();
        let candidates = observe_all(&*ctx.world, &nearby);
        let others = candidates.iter().filter(|c| c.info.id != leader_id);
        let Some(better) = best_leader(&me, &profile, others, Some(leader.level)) else {
            return Ok(true);
        };

        claim_leader(ctx, better)?;
        debug!(
            target: "brain::tick",
            agent = %me.id,
            from = %leader_id,
            to = %better,
            "switched herd leader"
        );
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CountFollowersConfig {
    pub check_ticks: ParamBinding,
}

impl Default for CountFollowersConfig {
    fn default() -> Self {
        Self {
            check_ticks: ParamBinding::from(10.0),
        }
    }
}

impl TaskDefinition for CountFollowersConfig {
    fn tag(&self) -> &'static str {
        "count_followers"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![("check_ticks", &self.check_ticks)]
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        let check_ticks = ctx.resolve_interval(&self.check_ticks, "check_ticks")?;
        Ok(vec![ctx.leaf(CountFollowers { check_ticks })?])
    }
}

/// Recomputes `HerdSize` from the visible agents that follow this one.
pub struct CountFollowers {
    check_ticks: u64,
}

impl LeafTask for CountFollowers {
    fn name(&self) -> &'static str {
        "count_followers"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] = &[
            MemoryRequirement::present(MemoryKey::NearestVisibleAgents),
            MemoryRequirement::registered(MemoryKey::HerdSize),
        ];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[MemoryKey::HerdSize]
    }

    fn sensors(&self) -> &[SensorKind] {
        &[SensorKind::NearestVisible]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        if !ctx.now().is_multiple_of(self.check_ticks) {
            return Ok(false);
        }
        let me = ctx.agent;
        let nearby = nearby_agents(ctx, "count_followers")?;
        let followers = nearby
            .iter()
            .filter(|&&id| {
                ctx.world
                    .blackboard(id)
                    .and_then(|board| board.get(MemoryKey::HerdLeader))
                    .and_then(|value| value.as_agent())
                    == Some(me)
            })
            .count();

        if followers == 0 {
            ctx.forget(MemoryKey::HerdSize);
        } else {
            let count = u32::try_from(followers).unwrap_or(u32::MAX);
            ctx.remember(MemoryKey::HerdSize, MemoryValue::Count(count))?;
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FollowHerdLeaderConfig {
    /// Beyond this distance the follower walks back to the leader.
    pub too_far: ParamBinding,
    /// Radius around the leader (or its destination) to walk to.
    pub close_enough: ParamBinding,
    /// Per-tick chance of trailing a walking leader.
    pub follow_chance: ParamBinding,
    pub speed: ParamBinding,
}

impl Default for FollowHerdLeaderConfig {
    fn default() -> Self {
        Self {
            too_far: ParamBinding::from(8.0),
            close_enough: ParamBinding::from(4.0),
            follow_chance: ParamBinding::from(1.0 / 60.0),
            speed: walk_speed(),
        }
    }
}

impl TaskDefinition for FollowHerdLeaderConfig {
    fn tag(&self) -> &'static str {
        "follow_herd_leader"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![
            ("too_far", &self.too_far),
            ("close_enough", &self.close_enough),
            ("follow_chance", &self.follow_chance),
            ("speed", &self.speed),
        ]
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        let task = FollowHerdLeader {
            too_far: ctx.resolve_number(&self.too_far, "too_far")?,
            close_enough: ctx.resolve_number(&self.close_enough, "close_enough")?,
            follow_chance: ctx.resolve_number(&self.follow_chance, "follow_chance")?,
            speed: ctx.simplify(&self.speed, "speed")?,
        };
        Ok(vec![ctx.leaf(task)?])
    }
}

pub struct FollowHerdLeader {
    too_far: f64,
    close_enough: f64,
    follow_chance: f64,
    speed: CompiledParam,
}

impl LeafTask for FollowHerdLeader {
    fn name(&self) -> &'static str {
        "follow_herd_leader"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] = &[
            MemoryRequirement::present(MemoryKey::HerdLeader),
            MemoryRequirement::registered(MemoryKey::WalkTarget),
        ];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[
            MemoryKey::HerdLeader,
            MemoryKey::WalkTarget,
            MemoryKey::LookTarget,
        ]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        let leader_id = current_leader(ctx, "follow_herd_leader")?;
        let Some(leader) = ctx.world.agent(leader_id).filter(|info| info.is_alive()) else {
            ctx.forget(MemoryKey::HerdLeader);
            return Ok(false);
        };
        let me = ctx.me()?;
        let heading = ctx
            .memory(MemoryKey::WalkTarget)
            .and_then(|value| value.as_walk_target());

        let anchor = if me.distance_to(&leader) > self.too_far {
            let already_returning = heading.is_some_and(|target| {
                target.position.distance(&leader.position) <= self.close_enough
            });
            if already_returning {
                return Ok(false);
            }
            leader.position
        } else {
            let leader_target = ctx
                .world
                .blackboard(leader_id)
                .and_then(|board| board.get(MemoryKey::WalkTarget))
                .and_then(|value| value.as_walk_target());
            match leader_target {
                Some(target) if heading.is_none() && ctx.chance(self.follow_chance) => {
                    target.position
                }
                _ => return Ok(false),
            }
        };

        let Some(destination) = random_destination(ctx, anchor, self.close_enough, 1.0, 10)? else {
            return Ok(false);
        };
        let speed = ctx.resolve_number(&self.speed)?;
        walk_to(ctx, destination, speed, 1.0)?;
        Ok(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchToHerdConfig {}

impl TaskDefinition for SwitchToHerdConfig {
    fn tag(&self) -> &'static str {
        "switch_to_herd"
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        Ok(vec![ctx.leaf(SwitchToHerd)?])
    }
}

pub struct SwitchToHerd;

impl LeafTask for SwitchToHerd {
    fn name(&self) -> &'static str {
        "switch_to_herd"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] =
            &[MemoryRequirement::present(MemoryKey::HerdLeader)];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[MemoryKey::HerdLeader]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        let agent = ctx.agent;
        Ok(ctx.world.activities_mut(agent).is_some_and(|activities| {
            !activities.is_active(Activity::Herd) && activities.set_active(Activity::Herd)
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwitchFromHerdConfig {
    /// Activity resumed once the agent stops following.
    pub activity: Activity,
}

impl Default for SwitchFromHerdConfig {
    fn default() -> Self {
        Self {
            activity: Activity::Idle,
        }
    }
}

impl TaskDefinition for SwitchFromHerdConfig {
    fn tag(&self) -> &'static str {
        "switch_from_herd"
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        Ok(vec![ctx.leaf(SwitchFromHerd {
            activity: self.activity,
        })?])
    }
}

pub struct SwitchFromHerd {
    activity: Activity,
}

impl LeafTask for SwitchFromHerd {
    fn name(&self) -> &'static str {
        "switch_from_herd"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] =
            &[MemoryRequirement::absent(MemoryKey::HerdLeader)];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[MemoryKey::HerdLeader]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        let agent = ctx.agent;
        let target = self.activity;
        Ok(ctx.world.activities_mut(agent).is_some_and(|activities| {
            activities.is_active(Activity::Herd) && activities.set_active(target)
        }))
    }
}

#[cfg(test)]
mod tests {
    use brain_core::{Position, Species, ToleratedLeader};

    use super::*;

    fn info(id: u32, species: &str, level: u32, x: f64) -> AgentInfo {
        AgentInfo {
            id: AgentId(id),
            species: Species::new(species),
            level,
            health: 10.0,
            max_health: 10.0,
            position: Position::new(x, 64.0, 0.0),
            in_water: false,
            in_lava: false,
        }
    }

    fn candidate(id: u32, level: u32, x: f64) -> LeaderCandidate {
        LeaderCandidate {
            info: info(id, "mareep", level, x),
            following: false,
            herd_size: 0,
            max_size: 4,
        }
    }

    fn profile() -> HerdProfile {
        HerdProfile::new(vec![ToleratedLeader::new("mareep")], 4)
    }

    #[test]
    fn prefers_level_then_distance_then_id() {
        let me = info(1, "mareep", 10, 0.0);
        let candidates = [
            candidate(5, 12, 2.0),
            candidate(4, 15, 9.0),
            candidate(3, 15, 3.0),
            candidate(2, 15, 3.0),
        ];
        assert_eq!(best_leader(&me, &profile(), &candidates, None), Some(AgentId(2)));

        let nearer = [candidate(7, 15, 9.0), candidate(6, 15, 3.0)];
        assert_eq!(best_leader(&me, &profile(), &nearer, None), Some(AgentId(6)));
    }

    #[test]
    fn skips_unsuitable_candidates() {
        let me = info(1, "mareep", 10, 0.0);
        let mut full = candidate(2, 20, 1.0);
        full.herd_size = 4;
        let mut follower = candidate(3, 20, 1.0);
        follower.following = true;
        let mut dead = candidate(4, 20, 1.0);
        dead.info.health = 0.0;
        let weaker = candidate(5, 9, 1.0);
        let mut stranger = candidate(6, 30, 1.0);
        stranger.info.species = Species::new("wooloo");
        let myself = LeaderCandidate {
            info: me.clone(),
            following: false,
            herd_size: 0,
            max_size: 4,
        };

        let candidates = [full, follower, dead, weaker, stranger, myself];
        assert_eq!(best_leader(&me, &profile(), &candidates, None), None);
    }

    #[test]
    fn lower_level_allowed_when_tolerated() {
        let me = info(1, "mareep", 10, 0.0);
        let mut lenient = profile();
        lenient.tolerated_leaders[0].allow_lower_level = true;
        let candidates = [candidate(2, 3, 1.0)];
        assert_eq!(best_leader(&me, &lenient, &candidates, None), Some(AgentId(2)));
    }

    #[test]
    fn above_level_is_strict() {
        let me = info(1, "mareep", 10, 0.0);
        let equal = [candidate(2, 15, 1.0)];
        assert_eq!(best_leader(&me, &profile(), &equal, Some(15)), None);

        let higher = [candidate(2, 15, 1.0), candidate(3, 16, 8.0)];
        assert_eq!(best_leader(&me, &profile(), &higher, Some(15)), Some(AgentId(3)));
    }
}
