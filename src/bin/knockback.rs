//! knockback binary
//!
//! Loads the knockback override registry, migrating legacy data on first
//! run, and either serves it (periodic autosave) or runs a one-shot admin
//! command.
//!
//! ## Configuration (env / TOML via `config` crate)
//!
//! | Key                                 | Default        | Description                       |
//! |-------------------------------------|----------------|-----------------------------------|
//! | `KNOCKBACK_CONFIG`                  | *(none)*       | Optional TOML config file         |
//! | `KNOCKBACK_DATA_DIR`                | `.`            | Directory with the override files |
//! | `KNOCKBACK_WORLDS`                  | *(none)*       | Comma-separated loaded worlds     |
//! | `KNOCKBACK_MIGRATE_LEGACY`          | `true`         | Migrate `config.yml` on first run |
//! | `KNOCKBACK_AUTOSAVE_INTERVAL_SECS`  | `300`          | Autosave period for `serve`       |

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use pvp_knockback::{
    Autosaver, Combatant, InMemoryWorlds, OverrideRegistry, RegistryConfig, Vec3, WorldHandle,
    WorldManager,
};
use std::path::PathBuf;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "knockback", about = "PvP knockback override registry", version)]
struct Args {
    /// Optional TOML config file
    #[arg(long, env = "KNOCKBACK_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding worlds.json / areas.json
    #[arg(long, env = "KNOCKBACK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Worlds to treat as loaded
    #[arg(long = "world", env = "KNOCKBACK_WORLDS", value_delimiter = ',')]
    worlds: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the registry and autosave it until Ctrl-C
    Serve,
    /// Load (migrating legacy data if needed) and save in the current format
    Migrate,
    /// Print world and area overrides as JSON
    List,
    /// Print the profile that applies to two combatants in one world
    Resolve {
        world: String,
        /// First combatant position, `x,y,z`
        #[arg(value_parser = parse_vec3, allow_hyphen_values = true)]
        a: Vec3,
        /// Second combatant position, `x,y,z`
        #[arg(value_parser = parse_vec3, allow_hyphen_values = true)]
        b: Vec3,
    },
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid coordinate in '{}': {}", s, e))?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z but got '{}'", s)),
    }
}

/// Stand-in combatant for `resolve`: a position in a world, nothing else.
struct Probe {
    world: WorldHandle,
    position: Vec3,
}

impl Combatant for Probe {
    fn world(&self) -> WorldHandle {
        self.world.clone()
    }
    fn position(&self) -> Vec3 {
        self.position
    }
    fn knockback_resistance(&self) -> f64 {
        0.0
    }
    fn motion(&self) -> Vec3 {
        Vec3::zero()
    }
    fn set_motion(&mut self, _motion: Vec3) {}
    fn attack_cooldown(&self) -> u32 {
        0
    }
    fn set_attack_cooldown(&mut self, _ticks: u32) {}
    fn is_player(&self) -> bool {
        true
    }
}

fn load_config(args: &Args) -> Result<RegistryConfig> {
    let mut builder = config::Config::builder();
    if let Some(path) = &args.config {
        builder = builder.add_source(config::File::from(path.as_path()));
    }
    builder = builder.add_source(config::Environment::with_prefix("KNOCKBACK"));

    let mut cfg: RegistryConfig = builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;
    if let Some(dir) = &args.data_dir {
        cfg.data_dir = dir.clone();
    }
    Ok(cfg)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pvp_knockback=debug".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    tracing::info!(
        data_dir = %config.data_dir.display(),
        worlds = args.worlds.len(),
        "Starting knockback registry"
    );

    let worlds = Arc::new(InMemoryWorlds::with_loaded(args.worlds.iter().cloned()));
    let mut registry = OverrideRegistry::load(config, worlds.clone())
        .context("Failed to load knockback overrides")?;

    match args.command {
        Command::Serve => {
            registry.list_resolvable_worlds();
            let registry = Arc::new(Mutex::new(registry));
            Autosaver::from_config(registry).run().await
        }
        Command::Migrate => {
            registry.save().context("Failed to save knockback overrides")?;
            log::info!("Overrides written in the current format");
            Ok(())
        }
        Command::List => {
            let snapshot = registry.snapshot()?;
            let out = serde_json::json!({
                "worlds": snapshot.worlds,
                "areas": snapshot.areas,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        Command::Resolve { world, a, b } => {
            let handle = worlds.world_by_name(&world).with_context(|| {
                format!("World '{}' is not loaded (pass --world {})", world, world)
            })?;
            let a = Probe {
                world: handle.clone(),
                position: a,
            };
            let b = Probe {
                world: handle,
                position: b,
            };
            let resolved = registry.resolve_with_source(&a, &b);
            println!("{} ({})", resolved.profile, resolved.source);
            Ok(())
        }
    }
}
