//! damage_sim - headless scenario runner for the ship damage model

mod simulation;

use clap::Parser;
use damage_core::config::{
    load_constants, load_ship_classes, load_weapons, DamageConstants, ShipClassRegistry, WeaponRegistry,
};
use simulation::{CombatSimulation, ScenarioConfig, ScenarioSummary};
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Run a seeded combat scenario against one ship class
#[derive(Parser, Debug)]
#[command(name = "damage_sim")]
#[command(about = "Run a deterministic damage scenario and report the outcome")]
struct Args {
    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Ship class id from the registry
    #[arg(long, default_value = "escort_frigate")]
    ship_class: String,

    /// Simulated seconds
    #[arg(long, default_value_t = 60.0)]
    duration: f64,

    /// Ticks per simulated second
    #[arg(long, default_value_t = 10.0)]
    tick_rate: f64,

    /// Directory holding constants.toml, ship_classes.toml and weapons.toml
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let (constants, classes, weapons) = match &args.config_dir {
        Some(dir) => {
            tracing::info!("Loading configuration from {}", dir.display());
            (
                load_constants(&dir.join("constants.toml"))?,
                load_ship_classes(&dir.join("ship_classes.toml"))?,
                load_weapons(&dir.join("weapons.toml"))?,
            )
        }
        None => (
            DamageConstants::default(),
            ShipClassRegistry::with_defaults(),
            WeaponRegistry::with_defaults(),
        ),
    };

    let Some(class) = classes.get(&args.ship_class) else {
        return Err(format!(
            "unknown ship class '{}' (available: {})",
            args.ship_class,
            classes.ids().join(", ")
        )
        .into());
    };

    let config = ScenarioConfig {
        seed: args.seed,
        duration: args.duration,
        tick_rate: args.tick_rate,
    };
    tracing::info!(
        "Running {} for {:.1}s at {} ticks/s (seed {})",
        class.id,
        config.duration,
        config.tick_rate,
        config.seed
    );

    let summary = CombatSimulation::new(class, &weapons, constants).run(&config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &ScenarioSummary) {
    println!("=== {} (seed {}) ===", summary.ship_class, summary.seed);
    println!("Elapsed:          {:.1}s", summary.elapsed);
    println!("Shots fired:      {}", summary.shots_fired);
    println!("Raw damage:       {:.1}", summary.raw_damage);
    println!("Shield absorbed:  {:.1}", summary.shield_absorbed);
    println!("Armor absorbed:   {:.1}", summary.armor_absorbed);
    println!("Hull damage:      {:.1}", summary.hull_damage);
    println!("Subsystem damage: {:.1}", summary.subsystem_damage);
    println!("Ricochets:        {}", summary.ricochets);
    println!("Penetrations:     {}", summary.penetrations);
    println!("Collision damage: {:.1}", summary.collision_damage);
    println!("Hazard damage:    {:.1}", summary.hazard_damage);
    println!();
    println!(
        "Hull: {:.1}/{:.1} ({:.1}%)",
        summary.hull.current_strength, summary.hull.max_strength, summary.hull.integrity
    );
    println!("Critical state: {:?}", summary.critical.state);
    match summary.destroyed_at {
        Some(t) => println!("Destroyed at {:.1}s", t),
        None => println!("Survived"),
    }

    if !summary.notifications.is_empty() {
        println!();
        println!("Notifications:");
        for (kind, count) in &summary.notifications {
            println!("  {:<32} {}", kind, count);
        }
    }
}
