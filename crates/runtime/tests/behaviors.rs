mod common;

use brain_content::{EngineSettings, SensorSettings, SpawnSpec};
use brain_core::{Activity, AgentId, ConfigError, ItemId, MemoryKey, MemoryValue, Tick};
use brain_runtime::{Engine, RuntimeError, Simulation};
use serde_json::json;

use common::{engine, ground, simulation, spawn};

#[test]
fn a_faulting_unit_does_not_stop_its_bucket() {
    let mut sim = simulation(&[
        json!({
            "name": "mareep",
            "activities": [{ "activity": "idle", "tasks": [
                { "priority": 0, "task": { "type": "wander", "wander_chance": "q.entity.wingspan" } },
                { "priority": 0, "task": { "type": "wander", "wander_chance": 1.0 } }
            ]}]
        }),
        json!({
            "name": "wooloo",
            "activities": [{ "activity": "idle", "tasks": [
                { "priority": 0, "task": { "type": "wander", "wander_chance": 1.0 } }
            ]}]
        }),
    ]);
    let faulty = spawn(&mut sim, 1, "mareep", 5, ground(0.0, 0.0));
    let healthy = spawn(&mut sim, 2, "wooloo", 5, ground(20.0, 20.0));
    assert_eq!(sim.brain(faulty).unwrap().buckets(Activity::Idle).len(), 1);

    let start = sim.world().body(faulty).unwrap().info.position;
    sim.run(50);

    assert!(sim.brain(faulty).unwrap().fault_count() > 0);
    assert_eq!(sim.brain(healthy).unwrap().fault_count(), 0);
    assert_ne!(sim.world().body(faulty).unwrap().info.position, start);
}

fn huge() -> String {
    format!("{}.0", "9".repeat(400))
}

#[test]
fn unbounded_wander_ranges_fault_without_stopping_the_bucket() {
    let mut sim = simulation(&[json!({
        "name": "wooloo",
        "activities": [{ "activity": "idle", "tasks": [
            { "priority": 0, "task": {
                "type": "wander",
                "wander_chance": 1.0,
                "path_cooldown_ticks": 0,
                "horizontal_range": format!("q.entity.level * {}", huge())
            }},
            { "priority": 0, "task": { "type": "move_to_item", "speed": 0.0 } }
        ]}]
    })]);
    let agent = spawn(&mut sim, 1, "wooloo", 5, ground(0.0, 0.0));
    let bystander = spawn(&mut sim, 2, "wooloo", 5, ground(30.0, 30.0));
    sim.world_mut().add_item(ItemId(1), ground(5.0, 0.0));

    assert_eq!(sim.run(9).value(), 9);

    assert!(sim.brain(agent).unwrap().fault_count() >= 5);
    assert!(sim.brain(bystander).unwrap().fault_count() >= 5);
    assert_eq!(
        sim.fault_count(),
        sim.brain(agent).unwrap().fault_count() + sim.brain(bystander).unwrap().fault_count()
    );
    // The item sensor first fires on tick 5; the pursuit ran every tick since.
    assert_eq!(
        sim.memory(agent, MemoryKey::TimeTryingToReachItem),
        Some(&MemoryValue::Count(5))
    );
    assert!(sim.memory(agent, MemoryKey::WalkTarget).is_some());
}

#[test]
fn literal_infinite_ranges_are_refused_at_spawn() {
    let mut sim = simulation(&[
        json!({
            "name": "mareep",
            "activities": [{ "activity": "idle", "tasks": [
                { "priority": 0, "task": { "type": "wander", "horizontal_range": huge() } }
            ]}]
        }),
        json!({
            "name": "wooloo",
            "activities": [{ "activity": "idle", "tasks": [
                { "priority": 0, "task": { "type": "wander", "wander_chance": 1.0 } }
            ]}]
        }),
    ]);

    let refused = sim.spawn(&SpawnSpec::new("mareep", 5, ground(0.0, 0.0)));
    assert!(matches!(
        refused,
        Err(RuntimeError::Config(ConfigError::InvalidParameter {
            field: "horizontal_range",
            ..
        }))
    ));

    let healthy = spawn(&mut sim, 2, "wooloo", 5, ground(0.0, 0.0));
    let start = sim.world().body(healthy).unwrap().info.position;
    sim.run(20);
    assert_eq!(sim.fault_count(), 0);
    assert_ne!(sim.world().body(healthy).unwrap().info.position, start);
}

#[test]
fn hurt_agents_panic_until_the_memory_expires() {
    let mut sim = simulation(&[json!({
        "name": "mareep",
        "activities": [
            { "activity": "core", "tasks": [
                { "priority": 0, "task": { "type": "switch_to_panic_when_hurt" } },
                { "priority": 1, "task": { "type": "calm_down" } }
            ]},
            { "activity": "idle", "tasks": [
                { "priority": 0, "task": { "type": "do_nothing" } }
            ]},
            { "activity": "panic", "tasks": [
                { "priority": 0, "task": { "type": "do_nothing" } }
            ]}
        ]
    })]);
    let victim = spawn(&mut sim, 1, "mareep", 5, ground(0.0, 0.0));

    sim.run(10);
    assert!(sim.is_active(victim, Activity::Idle));
    sim.hit(AgentId(7), victim, 1.0).unwrap();

    sim.step();
    assert!(sim.is_active(victim, Activity::Panic));
    assert_eq!(
        sim.memory(victim, MemoryKey::HurtByEntity).and_then(|v| v.as_agent()),
        Some(AgentId(7))
    );

    // Hit at tick 10 with the default 100-tick memory.
    sim.run(98);
    assert_eq!(sim.now().value(), 109);
    assert!(sim.is_active(victim, Activity::Panic));
    assert!(sim.memory(victim, MemoryKey::HurtBy).is_some());

    sim.step();
    assert!(sim.memory(victim, MemoryKey::HurtBy).is_none());
    assert!(sim.is_active(victim, Activity::Idle));
}

fn chooser() -> serde_json::Value {
    json!({
        "name": "bee",
        "activities": [{ "activity": "idle", "tasks": [
            { "priority": 0, "task": {
                "type": "random",
                "choices": [
                    { "weight": 1.0, "task": { "type": "wander" } },
                    { "weight": 1.0, "task": { "type": "do_nothing" } }
                ]
            }}
        ]}]
    })
}

fn wanderers(sim: &mut Simulation, count: u32) -> Vec<bool> {
    (1..=count)
        .map(|id| {
            let agent = spawn(sim, id, "bee", 3, ground(f64::from(id), 0.0));
            sim.brain(agent)
                .unwrap()
                .memories()
                .contains(&MemoryKey::PathCooldown)
        })
        .collect()
}

#[test]
fn spawn_time_choices_vary_per_agent_and_follow_the_seed() {
    let mut first = Simulation::new(engine(&[chooser()]));
    let mut second = Simulation::new(engine(&[chooser()]));

    let picks = wanderers(&mut first, 40);
    assert!(picks.iter().any(|&wanders| wanders));
    assert!(picks.iter().any(|&wanders| !wanders));
    assert_eq!(picks, wanderers(&mut second, 40));

    for id in 1..=40 {
        assert_eq!(first.brain(AgentId(id)).unwrap().unit_count(), 1);
    }
}

#[test]
fn one_of_guard_is_checked_every_tick() {
    let mut sim = simulation(&[json!({
        "name": "mareep",
        "activities": [{ "activity": "idle", "tasks": [
            { "priority": 0, "task": {
                "type": "one_of",
                "condition": "q.entity.health > 10",
                "options": [{ "weight": 1, "task": { "type": "wander", "wander_chance": 1.0 } }]
            }}
        ]}]
    })]);
    let agent = spawn(&mut sim, 1, "mareep", 5, ground(0.0, 0.0));
    assert_eq!(sim.brain(agent).unwrap().unit_count(), 1);

    sim.hit(AgentId(9), agent, 15.0).unwrap();
    let start = sim.world().body(agent).unwrap().info.position;
    sim.run(100);

    assert_eq!(sim.world().body(agent).unwrap().info.position, start);
    assert!(sim.memory(agent, MemoryKey::WalkTarget).is_none());
}

#[test]
fn duplicate_ids_are_refused() {
    let mut sim = simulation(&[chooser()]);
    spawn(&mut sim, 4, "bee", 1, ground(0.0, 0.0));
    let again = sim.spawn(&SpawnSpec::new("bee", 1, ground(1.0, 0.0)).with_id(AgentId(4)));
    assert!(matches!(again, Err(RuntimeError::DuplicateAgent { .. })));

    let next = sim.spawn(&SpawnSpec::new("bee", 1, ground(2.0, 0.0))).unwrap();
    assert_eq!(next, AgentId(5));
}

#[test]
fn item_pursuit_times_out_and_backs_off() {
    let mut sim = simulation(&[json!({
        "name": "wooloo",
        "activities": [{ "activity": "idle", "tasks": [
            { "priority": 0, "task": {
                "type": "move_to_item",
                "speed": 0.0,
                "max_attempts": 5,
                "disable_ticks": 20
            }}
        ]}]
    })]);
    let agent = spawn(&mut sim, 1, "wooloo", 5, ground(0.0, 0.0));
    sim.world_mut().add_item(ItemId(1), ground(5.0, 0.0));

    // The item sensor first fires on tick 5.
    sim.run(9);
    assert_eq!(
        sim.memory(agent, MemoryKey::TimeTryingToReachItem),
        Some(&MemoryValue::Count(5))
    );

    sim.step();
    assert!(sim.memory(agent, MemoryKey::TimeTryingToReachItem).is_none());
    assert!(sim.memory(agent, MemoryKey::WalkTarget).is_none());
    assert!(sim.memory(agent, MemoryKey::DisableWalkToItem).is_some());

    sim.run(19);
    assert!(sim.memory(agent, MemoryKey::DisableWalkToItem).is_some());
    assert!(sim.memory(agent, MemoryKey::TimeTryingToReachItem).is_none());

    sim.step();
    assert!(sim.memory(agent, MemoryKey::DisableWalkToItem).is_none());
    assert_eq!(
        sim.memory(agent, MemoryKey::TimeTryingToReachItem),
        Some(&MemoryValue::Count(1))
    );
    assert_eq!(sim.world().items().count(), 1);
}

#[test]
fn failed_rest_searches_still_back_off() {
    let settings = EngineSettings {
        day_length: 200,
        sensors: SensorSettings {
            drowsy_interval: 1,
            ..SensorSettings::default()
        },
        ..EngineSettings::default()
    };
    let engine = Engine::builder()
        .settings(settings)
        .template(
            "mareep",
            &json!({
                "name": "mareep",
                "activities": [{ "activity": "idle", "tasks": [
                    { "priority": 0, "task": { "type": "find_resting_place", "cooldown_ticks": 30 } }
                ]}]
            }),
        )
        .build();
    let mut sim = Simulation::new(engine);
    let agent = spawn(&mut sim, 1, "mareep", 5, ground(0.0, 0.0));
    let cooldown = |sim: &Simulation| {
        sim.world()
            .body(agent)
            .unwrap()
            .blackboard
            .expires_at(MemoryKey::PathCooldown)
    };

    sim.run(99);
    assert_eq!(cooldown(&sim), None);

    // Night starts halfway through the day; no rest spot exists.
    sim.step();
    assert_eq!(cooldown(&sim), Some(Tick(130)));
    assert!(sim.memory(agent, MemoryKey::WalkTarget).is_none());

    sim.run(29);
    assert_eq!(cooldown(&sim), Some(Tick(130)));
    sim.step();
    assert_eq!(cooldown(&sim), Some(Tick(160)));
}
