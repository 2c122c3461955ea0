//! realty-scene-demo binary
//!
//! Loads a scene description and drives a [`RealtyPlugin`] from stdin
//! commands against logging collaborators and a delayed, simulated loader.
//!
//! ## Configuration (TOML/JSON file + env via `config` crate)
//!
//! | Key                                     | Default      | Description                  |
//! |-----------------------------------------|--------------|------------------------------|
//! | `REALTY_GROUND_COVERING_COLOR`          | `#F8F8EBCC`  | Underground mask color       |
//! | `REALTY_FLOOR_CONTROL_POSITION`         | `center_left`| Floor control placement      |
//! | `REALTY_CAMERA_ANIMATION__DURATION_MS`  | `500`        | Camera preset animation      |
//!
//! ## Commands
//!
//! | Command              | Effect                                  |
//! |----------------------|-----------------------------------------|
//! | `select <model_id>`  | floor control selection                 |
//! | `click <model_id>`   | pointer click on a model                |
//! | `hover <model_id>`   | pointer over a model (popup)            |
//! | `out <model_id>`     | pointer leaves a model                  |
//! | `poi <group> <n>`    | click on label `n` of a label group     |
//! | `hide` / `show`      | scene visibility                        |
//! | `color <#hex>`       | ground covering color                   |
//! | `state`              | print committed state and stats         |
//! | `remove`             | remove the scene                        |
//! | `quit`               | exit                                    |

use anyhow::{bail, Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use realty_scene::{
    sim::{self, LogFloorControl, LogMap, SimRenderer},
    BuildingOptions, EventKind, LngLat, PluginConfig, PluginEvent, PluginOptions, PointerEvent,
    PointerTarget, RealtyPlugin, SceneFocus,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "realty-scene-demo", about = "Realty scene interactive driver", version)]
struct Args {
    /// Scene description (JSON array of buildings)
    #[arg(long, env = "REALTY_SCENE")]
    scene: PathBuf,

    /// Plugin options file (TOML, JSON or YAML)
    #[arg(long, env = "REALTY_CONFIG")]
    config: Option<PathBuf>,

    /// Building focused on start
    #[arg(long)]
    focus_building: Option<String>,

    /// Floor focused on start (requires --focus-building)
    #[arg(long, requires = "focus_building")]
    focus_floor: Option<String>,

    /// Simulated model load latency
    #[arg(long, env = "REALTY_LOAD_DELAY_MS", default_value_t = 400)]
    load_delay_ms: u64,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
enum Command {
    Select(String),
    Pointer(EventKind, String),
    Poi(String, usize),
    Hide,
    Show,
    Color(String),
    State,
    Remove,
    Quit,
}

impl std::str::FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            bail!("empty command");
        };
        let mut arg = || {
            parts
                .next()
                .map(str::to_string)
                .with_context(|| format!("'{verb}' needs an argument"))
        };

        Ok(match verb {
            "select" => Command::Select(arg()?),
            "click" => Command::Pointer(EventKind::Click, arg()?),
            "hover" => Command::Pointer(EventKind::MouseOver, arg()?),
            "out" => Command::Pointer(EventKind::MouseOut, arg()?),
            "poi" => {
                let group = arg()?;
                let index = arg()?.parse().context("label index must be a number")?;
                Command::Poi(group, index)
            }
            "hide" => Command::Hide,
            "show" => Command::Show,
            "color" => Command::Color(arg()?),
            "state" => Command::State,
            "remove" => Command::Remove,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command '{other}'"),
        })
    }
}

/// Apply one command. Returns false when the session should end.
fn run_command(plugin: &Mutex<RealtyPlugin>, command: Command) -> Result<bool> {
    let mut p = plugin.lock();
    match command {
        Command::Select(id) => p.handle_floor_selected(&id),
        Command::Pointer(kind, model_id) => p.handle_pointer_event(PointerEvent {
            kind,
            target: PointerTarget::Model { model_id },
            lng_lat: LngLat::new(0.0, 0.0),
            point: Default::default(),
        }),
        Command::Poi(group_id, label_index) => p.handle_pointer_event(PointerEvent {
            kind: EventKind::Click,
            target: PointerTarget::Label {
                group_id,
                label_index,
            },
            lng_lat: LngLat::new(0.0, 0.0),
            point: Default::default(),
        }),
        Command::Hide => p.hide(),
        Command::Show => p.show(),
        Command::Color(c) => p.set_ground_covering_color(&c)?,
        Command::State => {
            let state = p.state().map(|s| format!("{s:#?}"));
            println!("{}", state.unwrap_or_else(|| "no scene".into()));
            if let Some(stats) = p.stats() {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            if let Some(engine) = p.scene() {
                let deferred = engine.deferred_buildings();
                if !deferred.is_empty() {
                    println!("deferred: {}", deferred.join(", "));
                }
            }
        }
        Command::Remove => p.remove_realty_scene(),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn load_options(args: &Args) -> Result<PluginOptions> {
    let mut builder = config::Config::builder();
    if let Some(path) = &args.config {
        builder = builder.add_source(config::File::from(path.as_path()));
    }
    builder = builder.add_source(
        config::Environment::with_prefix("REALTY")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );
    builder
        .build()?
        .try_deserialize()
        .context("Invalid plugin options")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("realty_scene=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    let config = PluginConfig::resolve(load_options(&args)?)?;
    let raw = std::fs::read_to_string(&args.scene)
        .with_context(|| format!("Failed to read scene {}", args.scene.display()))?;
    let buildings: Vec<BuildingOptions> =
        serde_json::from_str(&raw).context("Failed to parse scene description")?;

    let focus = args.focus_building.clone().map(|building_id| SceneFocus {
        building_id,
        floor_id: args.focus_floor.clone(),
    });

    tracing::info!(
        "Starting realty-scene-demo (scene='{}', buildings={}, delay={}ms)",
        args.scene.display(),
        buildings.len(),
        args.load_delay_ms,
    );

    let (req_tx, req_rx) = mpsc::unbounded_channel();
    let mut outcomes = sim::spawn_loader(req_rx, Duration::from_millis(args.load_delay_ms));

    let plugin = Arc::new(Mutex::new(RealtyPlugin::new(
        config,
        Box::new(LogMap),
        Box::new(SimRenderer::new(req_tx)),
        Box::new(LogFloorControl),
    )));

    {
        let mut p = plugin.lock();
        p.on(
            EventKind::Click,
            Box::new(|e: &PluginEvent| log::info!("[event] click {:?}", e.target)),
        );
        p.add_realty_scene(buildings, focus)
            .context("Failed to add realty scene")?;
    }

    // Deliver simulated load results. Hold the lock only per outcome.
    let loads = {
        let plugin = plugin.clone();
        tokio::spawn(async move {
            while let Some(outcome) = outcomes.recv().await {
                let mut p = plugin.lock();
                match outcome.result {
                    Ok(()) => p.handle_model_loaded(&outcome.model_id),
                    Err(e) => p.handle_model_load_failed(&outcome.model_id, &e),
                }
            }
        })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(cmd) => match run_command(&plugin, cmd) {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(e) => log::warn!("{e:#}"),
                    },
                    Err(e) => log::warn!("{e:#}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Shutting down (SIGINT)");
                break;
            }
        }
    }

    plugin.lock().destroy();
    loads.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(
            "select mall_p1".parse::<Command>().unwrap(),
            Command::Select("mall_p1".into())
        );
        assert_eq!(
            "  poi mall_l1_shops 2 ".parse::<Command>().unwrap(),
            Command::Poi("mall_l1_shops".into(), 2)
        );
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!("".parse::<Command>().is_err());
        assert!("click".parse::<Command>().is_err());
        assert!("poi shops x".parse::<Command>().is_err());
        assert!("jump".parse::<Command>().is_err());
    }
}
