//! Headless scenario runner.
//!
//! Loads a data directory, runs its scenario for a number of ticks and
//! prints the final state of every agent.
use std::path::PathBuf;

use anyhow::{Context, Result};
use brain_content::{ContentFactory, TaskConfigRegistry};
use brain_runtime::{Engine, Simulation, SimulationReport};
use clap::Parser;
use tracing::info;

/// Runs a behavior scenario headless
#[derive(Parser)]
#[command(name = "brain-sim")]
#[command(about = "Run data-driven agent brains against a simulated world", long_about = None)]
#[command(version)]
struct Cli {
    /// Content directory holding settings.toml, templates/ and scenarios
    #[arg(short, long, value_name = "DIR", default_value = "crates/brain/content/data")]
    data_dir: PathBuf,

    /// Scenario file stem inside the data directory
    #[arg(short, long, value_name = "NAME", default_value = "scenario")]
    scenario: String,

    /// Ticks to run; falls back to `ticks` in settings.toml
    #[arg(short, long, value_name = "TICKS")]
    ticks: Option<u64>,

    /// Overrides the seed from settings.toml
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// One line per agent
    Summary,
    /// Full report as JSON
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let factory = ContentFactory::new(&cli.data_dir);

    let mut settings = factory
        .load_settings()
        .with_context(|| format!("Failed to load settings from {}", cli.data_dir.display()))?;
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }
    let ticks = cli.ticks.unwrap_or(settings.ticks);

    let registry = TaskConfigRegistry::with_builtin();
    let content = factory.load_templates(&registry)?;
    let scenario = factory
        .load_named_scenario(&cli.scenario)
        .with_context(|| format!("Failed to load scenario `{}`", cli.scenario))?;

    let engine = Engine::builder()
        .settings(settings)
        .registry(registry)
        .content(content)
        .build();
    let mut simulation = Simulation::from_scenario(engine, &scenario);

    info!(target: "brain::sim", ticks, scenario = %cli.scenario, "running");
    simulation.run(ticks);
    let report = simulation.report();

    match cli.format {
        OutputFormat::Summary => print_summary(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn print_summary(report: &SimulationReport) {
    println!(
        "{}: {} agents, {} faults, {} failed spawns",
        report.tick,
        report.agents.len(),
        report.faults,
        report.failed_spawns.len()
    );
    for agent in &report.agents {
        let activities: Vec<String> = agent.activities.iter().map(ToString::to_string).collect();
        let leader = agent
            .leader
            .map_or_else(|| "-".to_owned(), |leader| leader.to_string());
        println!(
            "  {:>4} {:<10} lvl {:>3} hp {:>5.1} at {} {} [{}] leader {} herd {}",
            agent.id,
            agent.template,
            agent.level,
            agent.health,
            agent.position,
            agent.pose,
            activities.join(","),
            leader,
            agent.herd_size.unwrap_or(0),
        );
    }
    for failed in &report.failed_spawns {
        println!("  failed {}: {}", failed.template, failed.error);
    }
    println!(
        "  attacks {} pickups {} deaths {} expired memories {}",
        report.stats.attacks, report.stats.pickups, report.stats.deaths, report.stats.expired_memories
    );
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn usage_names_the_installed_binary() {
        Cli::command().debug_assert();
        assert_eq!(Cli::command().get_name(), env!("CARGO_BIN_NAME"));
    }
}
