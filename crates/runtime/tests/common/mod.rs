#![allow(dead_code)]

use brain_content::SpawnSpec;
use brain_core::{AgentId, Position};
use brain_runtime::{Engine, Simulation};
use serde_json::Value;

/// Engine with default settings and the given JSON templates.
pub fn engine(templates: &[Value]) -> Engine {
    templates
        .iter()
        .fold(Engine::builder(), |builder, template| {
            let origin = template["name"].as_str().unwrap_or("template");
            builder.template(origin, template)
        })
        .build()
}

pub fn simulation(templates: &[Value]) -> Simulation {
    Simulation::new(engine(templates))
}

pub fn ground(x: f64, z: f64) -> Position {
    Position::new(x, 64.0, z)
}

pub fn spawn(sim: &mut Simulation, id: u32, template: &str, level: u32, at: Position) -> AgentId {
    sim.spawn(&SpawnSpec::new(template, level, at).with_id(AgentId(id)))
        .unwrap()
}
