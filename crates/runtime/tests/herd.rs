mod common;

use brain_core::{AgentId, ItemId, MemoryKey, MemoryValue};
use brain_runtime::Simulation;
use serde_json::{Value, json};

use common::{ground, simulation, spawn};

fn follower(name: &str, find_ticks: u32) -> Value {
    json!({
        "name": name,
        "species": "mareep",
        "herd": { "tolerated_leaders": [{ "species": "mareep" }] },
        "activities": [
            { "activity": "core", "tasks": [
                { "priority": 0, "task": { "type": "count_followers" } }
            ]},
            { "activity": "idle", "tasks": [
                { "priority": 0, "task": { "type": "find_herd_leader", "check_ticks": find_ticks } },
                { "priority": 1, "task": { "type": "maintain_herd_leader" } }
            ]}
        ]
    })
}

#[test]
fn full_leaders_turn_away_late_followers() {
    let mut sim = simulation(&[
        json!({
            "name": "ram",
            "species": "mareep",
            "herd": { "max_size": 1 },
            "activities": [{ "activity": "core", "tasks": [
                { "priority": 0, "task": { "type": "count_followers" } }
            ]}]
        }),
        follower("mareep", 60),
        follower("straggler", 90),
    ]);

    let leader = spawn(&mut sim, 1, "ram", 10, ground(0.0, 0.0));
    let early = spawn(&mut sim, 2, "mareep", 5, ground(2.0, 0.0));
    let late = spawn(&mut sim, 3, "straggler", 5, ground(0.0, 2.0));

    sim.run(60);
    assert_eq!(sim.leader_of(early), Some(leader));

    sim.run(10);
    assert_eq!(sim.herd_size(leader), Some(1));

    sim.run(20);
    assert_eq!(sim.leader_of(late), None);
    assert_eq!(sim.leader_of(early), Some(leader));
}

#[test]
fn followers_trade_up_to_a_stronger_leader() {
    let mut sim = simulation(&[follower("mareep", 60)]);
    let weak = spawn(&mut sim, 1, "mareep", 8, ground(0.0, 0.0));
    let member = spawn(&mut sim, 3, "mareep", 5, ground(2.0, 0.0));

    sim.run(60);
    assert_eq!(sim.leader_of(member), Some(weak));

    let strong = spawn(&mut sim, 2, "mareep", 12, ground(0.0, 2.0));
    sim.run(20);
    assert_eq!(sim.leader_of(member), Some(strong));
    assert_eq!(sim.leader_of(strong), None);
}

#[test]
fn equal_level_leaders_are_not_worth_switching_to() {
    let mut sim = simulation(&[follower("mareep", 60)]);
    let first = spawn(&mut sim, 1, "mareep", 8, ground(0.0, 0.0));
    let member = spawn(&mut sim, 3, "mareep", 5, ground(2.0, 0.0));

    sim.run(60);
    spawn(&mut sim, 2, "mareep", 8, ground(2.5, 0.0));
    sim.run(40);
    assert_eq!(sim.leader_of(member), Some(first));
}

#[test]
fn dead_leaders_are_forgotten_at_the_next_check() {
    let mut sim = simulation(&[follower("mareep", 60)]);
    let leader = spawn(&mut sim, 1, "mareep", 8, ground(0.0, 0.0));
    let member = spawn(&mut sim, 2, "mareep", 5, ground(2.0, 0.0));

    sim.run(65);
    assert_eq!(sim.leader_of(member), Some(leader));

    sim.hit(AgentId(99), leader, 100.0).unwrap();
    sim.run(14);
    assert_eq!(sim.leader_of(member), Some(leader));

    sim.step();
    assert_eq!(sim.leader_of(member), None);
}

#[test]
fn a_confirmed_leader_still_takes_the_bucket_slot() {
    let mut sim = simulation(&[
        json!({
            "name": "ram",
            "species": "mareep",
            "herd": { "max_size": 4 },
            "activities": [{ "activity": "core", "tasks": [
                { "priority": 0, "task": { "type": "count_followers" } }
            ]}]
        }),
        json!({
            "name": "mareep",
            "species": "mareep",
            "herd": { "tolerated_leaders": [{ "species": "mareep" }] },
            "activities": [{ "activity": "idle", "tasks": [
                { "priority": 0, "task": { "type": "find_herd_leader", "check_ticks": 1 } },
                { "priority": 1, "task": { "type": "maintain_herd_leader", "check_ticks": 20 } },
                { "priority": 1, "task": { "type": "move_to_item", "speed": 0.0, "max_attempts": 100 } }
            ]}]
        }),
    ]);
    let leader = spawn(&mut sim, 1, "ram", 10, ground(0.0, 0.0));
    let member = spawn(&mut sim, 2, "mareep", 5, ground(2.0, 0.0));
    sim.world_mut().add_item(ItemId(1), ground(2.0, 5.0));
    let attempts =
        |sim: &Simulation| sim.memory(member, MemoryKey::TimeTryingToReachItem).cloned();

    // Pursuit starts with the first item scan on tick 5.
    sim.run(19);
    assert_eq!(sim.leader_of(member), Some(leader));
    assert_eq!(attempts(&sim), Some(MemoryValue::Count(15)));

    sim.step();
    assert_eq!(sim.leader_of(member), Some(leader));
    assert_eq!(attempts(&sim), Some(MemoryValue::Count(15)));

    sim.step();
    assert_eq!(attempts(&sim), Some(MemoryValue::Count(16)));
}
