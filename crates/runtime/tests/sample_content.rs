use brain_content::ContentFactory;
use brain_core::AgentId;
use brain_runtime::{Engine, Simulation};

const DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../brain/content/data");

fn load() -> Simulation {
    let factory = ContentFactory::new(DATA_DIR);
    let engine = Engine::from_factory(&factory).unwrap();
    let scenario = factory.load_scenario().unwrap();
    Simulation::from_scenario(engine, &scenario)
}

#[test]
fn bundled_scenario_spawns_every_agent() {
    let sim = load();
    assert!(sim.engine().content().disabled.is_empty());
    assert!(sim.failed_spawns().is_empty());
    assert_eq!(sim.agent_ids().count(), 8);
    assert!(sim.brain(AgentId(1)).unwrap().unit_count() > 0);
}

#[test]
fn bundled_scenario_runs_without_faults() {
    let mut sim = load();
    let end = sim.run(1_200);

    assert_eq!(end.value(), 1_200);
    assert_eq!(sim.fault_count(), 0);
    assert!(sim.world().stats().expired_memories > 0);
}

#[test]
fn identical_runs_produce_identical_reports() {
    let mut first = load();
    let mut second = load();
    first.run(300);
    second.run(300);

    let first = serde_json::to_string(&first.report()).unwrap();
    let second = serde_json::to_string(&second.report()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn a_broken_template_only_takes_down_its_own_spawns() {
    let dir = tempfile::tempdir().unwrap();
    let templates = dir.path().join("templates");
    std::fs::create_dir(&templates).unwrap();
    std::fs::write(
        templates.join("calm.json"),
        r#"{ "name": "calm", "activities": [
            { "activity": "idle", "tasks": [{ "task": { "type": "do_nothing" } }] }
        ] }"#,
    )
    .unwrap();
    std::fs::write(
        templates.join("broken.json"),
        r#"{ "name": "broken", "activities": [
            { "activity": "idle", "tasks": [{ "task": { "type": "wander", "condition": { "variable": "nope" } } }] }
        ] }"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("scenario.ron"),
        r#"(agents: [
            (template: "broken", position: (x: 0.0, y: 64.0, z: 0.0)),
            (template: "calm", position: (x: 2.0, y: 64.0, z: 0.0)),
        ])"#,
    )
    .unwrap();

    let factory = ContentFactory::new(dir.path());
    let engine = Engine::from_factory(&factory).unwrap();
    assert!(engine.content().is_disabled("broken"));
    assert!(engine.content().get("calm").is_some());

    let mut sim = Simulation::from_scenario(engine, &factory.load_scenario().unwrap());
    assert_eq!(sim.failed_spawns().len(), 1);
    assert_eq!(sim.failed_spawns()[0].template, "broken");
    assert_eq!(sim.agent_ids().collect::<Vec<_>>(), vec![AgentId(1)]);

    sim.run(20);
    assert_eq!(sim.fault_count(), 0);
}
