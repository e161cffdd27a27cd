mod common;

use brain_content::SpawnSpec;
use brain_core::{AgentId, MemoryKey};
use serde_json::json;

use common::{ground, simulation, spawn};

#[test]
fn overriding_a_variable_removes_the_wander_unit() {
    let mut sim = simulation(&[json!({
        "name": "mareep",
        "declarations": [
            { "category": "wander", "name": "wanders", "type": "boolean", "default": "true" }
        ],
        "activities": [{ "activity": "idle", "tasks": [
            { "priority": 0, "task": { "type": "wander", "condition": { "variable": "wanders" } } }
        ]}]
    })]);

    let wanderer = spawn(&mut sim, 1, "mareep", 5, ground(0.0, 0.0));
    let homebody = sim
        .spawn(
            &SpawnSpec::new("mareep", 5, ground(4.0, 0.0))
                .with_id(AgentId(2))
                .with_override("wanders", false),
        )
        .unwrap();

    assert_eq!(sim.brain(wanderer).unwrap().unit_count(), 1);
    assert_eq!(sim.brain(homebody).unwrap().unit_count(), 0);
}

#[test]
fn false_gate_never_walks() {
    let mut sim = simulation(&[json!({
        "name": "mareep",
        "activities": [{ "activity": "idle", "tasks": [
            { "priority": 0, "task": {
                "type": "all_of",
                "condition": "q.entity.level > 10",
                "tasks": [{ "type": "wander", "wander_chance": 1.0 }]
            }}
        ]}]
    })]);

    let gated = spawn(&mut sim, 1, "mareep", 5, ground(0.0, 0.0));
    let control = spawn(&mut sim, 2, "mareep", 20, ground(10.0, 10.0));
    assert_eq!(sim.brain(gated).unwrap().unit_count(), 0);
    assert_eq!(sim.brain(control).unwrap().unit_count(), 1);

    let start = sim.world().body(gated).unwrap().info.position;
    let control_start = sim.world().body(control).unwrap().info.position;
    let mut control_moved = false;
    for _ in 0..1_000 {
        sim.step();
        let body = sim.world().body(gated).unwrap();
        assert_eq!(body.info.position, start);
        assert!(body.heading.is_none());
        assert!(!body.blackboard.has_value(MemoryKey::WalkTarget));
        control_moved |= sim.world().body(control).unwrap().info.position != control_start;
    }
    assert!(control_moved);
}

#[test]
fn two_followers_join_the_only_leader() {
    let mut sim = simulation(&[json!({
        "name": "mareep",
        "herd": { "tolerated_leaders": [{ "species": "mareep" }], "max_size": 2 },
        "activities": [
            { "activity": "core", "tasks": [
                { "priority": 0, "task": { "type": "count_followers" } }
            ]},
            { "activity": "idle", "tasks": [
                { "priority": 0, "task": { "type": "find_herd_leader" } }
            ]}
        ]
    })]);

    let leader = spawn(&mut sim, 1, "mareep", 10, ground(0.0, 0.0));
    let first = spawn(&mut sim, 2, "mareep", 5, ground(2.0, 0.0));
    let second = spawn(&mut sim, 3, "mareep", 5, ground(0.0, 3.0));

    sim.run(59);
    assert_eq!(sim.leader_of(first), None);

    sim.step();
    assert_eq!(sim.leader_of(first), Some(leader));
    assert_eq!(sim.leader_of(second), Some(leader));
    assert_eq!(sim.leader_of(leader), None);

    sim.run(10);
    assert_eq!(sim.herd_size(leader), Some(2));
    assert_eq!(sim.herd_size(first), None);
}
