#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the traffic watch toolchain.
//!
//! ```text
//! traffic_watch query --bbox 19.03,72.82,19.12,72.93 --zoom 14
//! traffic_watch overlay --bbox 19.03,72.82,19.12,72.93 --zoom 13 [--seed 7] [--geojson out.geojson]
//! traffic_watch cameras
//! traffic_watch simulate [--ticks 10800] [--seed 7] [--q-table q_table.json] [--no-save]
//! traffic_watch serve
//! ```
//!
//! Running with no subcommand enters interactive mode.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dialoguer::{Input, Select};
use traffic_watch_cameras::{CameraPlayer, all_cameras, player_for};
use traffic_watch_geodata::overpass::OverpassClient;
use traffic_watch_geodata::query::build_query;
use traffic_watch_geodata::service_config::OverpassConfig;
use traffic_watch_geodata_models::{BoundingBox, Viewport};
use traffic_watch_overlay::geojson_export::to_feature_collection;
use traffic_watch_overlay::style::{RandomStyler, TrafficStyler};
use traffic_watch_overlay::{CycleOutcome, MapView};
use traffic_watch_signal_control::agent::{load_table, save_table};
use traffic_watch_signal_control::{Action, AgentConfig, QAgent, Simulation};

/// Central Mumbai, matching the dashboard's initial view.
const DEFAULT_BBOX: &str = "19.03,72.82,19.12,72.93";
const DEFAULT_ZOOM: u8 = 13;
/// Three minutes at 60 ticks per second.
const DEFAULT_TICKS: u64 = 10_800;
const DEFAULT_Q_TABLE: &str = "q_table.json";

#[derive(Parser)]
#[command(name = "traffic_watch", about = "Traffic watch dashboard toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Overpass query a refresh cycle would send
    Query {
        /// Bounding box as south,west,north,east
        #[arg(long, default_value = DEFAULT_BBOX, value_parser = parse_bbox)]
        bbox: BoundingBox,
        /// Map zoom level
        #[arg(long, default_value_t = DEFAULT_ZOOM)]
        zoom: u8,
    },
    /// Run one refresh cycle against Overpass and summarise the layers
    Overlay {
        /// Bounding box as south,west,north,east
        #[arg(long, default_value = DEFAULT_BBOX, value_parser = parse_bbox)]
        bbox: BoundingBox,
        /// Map zoom level
        #[arg(long, default_value_t = DEFAULT_ZOOM)]
        zoom: u8,
        /// Seed for the congestion styler (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Write the layers as a GeoJSON FeatureCollection to this path
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
    /// List the camera roster and how each stream would be played
    Cameras,
    /// Train the signal controller on a simulated intersection
    Simulate {
        /// Number of ticks to run
        #[arg(long, default_value_t = DEFAULT_TICKS)]
        ticks: u64,
        /// Seed for arrivals and exploration (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Q-table to resume from and save to
        #[arg(long, default_value = DEFAULT_Q_TABLE)]
        q_table: PathBuf,
        /// Do not write the learned table back
        #[arg(long)]
        no_save: bool,
    },
    /// Start the API server
    Serve,
}

fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    BoundingBox::parse(s)
        .ok_or_else(|| format!("invalid bbox '{s}', expected south,west,north,east"))
}

/// Top-level tool selection for interactive mode.
enum Tool {
    Query,
    Overlay,
    Cameras,
    Simulate,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[
        Self::Overlay,
        Self::Query,
        Self::Cameras,
        Self::Simulate,
        Self::Server,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Query => "Print Overpass query",
            Self::Overlay => "Fetch traffic overlay",
            Self::Cameras => "List cameras",
            Self::Simulate => "Train signal controller",
            Self::Server => "Start server",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive().await;
    };

    match command {
        Commands::Query { bbox, zoom } => print_query(Viewport::new(bbox, zoom)),
        Commands::Overlay {
            bbox,
            zoom,
            seed,
            geojson,
        } => run_overlay(Viewport::new(bbox, zoom), seed, geojson.as_deref()).await?,
        Commands::Cameras => print_cameras(),
        Commands::Simulate {
            ticks,
            seed,
            q_table,
            no_save,
        } => simulate(ticks, seed, &q_table, !no_save)?,
        Commands::Serve => serve().await?,
    }

    Ok(())
}

async fn interactive() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    println!("Traffic Watch");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Query => print_query(prompt_viewport()?),
        Tool::Overlay => {
            let viewport = prompt_viewport()?;
            let path: String = Input::new()
                .with_prompt("GeoJSON output path (blank to skip)")
                .allow_empty(true)
                .interact_text()?;
            let path = Some(path.trim()).filter(|p| !p.is_empty()).map(PathBuf::from);
            run_overlay(viewport, None, path.as_deref()).await?;
        }
        Tool::Cameras => print_cameras(),
        Tool::Simulate => {
            let ticks: u64 = Input::new()
                .with_prompt("Ticks to simulate")
                .default(DEFAULT_TICKS)
                .interact_text()?;
            let path: String = Input::new()
                .with_prompt("Q-table path")
                .default(DEFAULT_Q_TABLE.to_string())
                .interact_text()?;
            simulate(ticks, None, Path::new(path.trim()), true)?;
        }
        Tool::Server => {
            // The server uses actix-web's runtime, so it runs in a blocking
            // task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(traffic_watch_server::interactive::run())
            })
            .await??;
        }
    }

    Ok(())
}

fn prompt_viewport() -> Result<Viewport, dialoguer::Error> {
    let text: String = Input::new()
        .with_prompt("Bounding box (south,west,north,east)")
        .default(DEFAULT_BBOX.to_string())
        .validate_with(|s: &String| parse_bbox(s).map(|_| ()))
        .interact_text()?;
    let bbox = BoundingBox::parse(&text).unwrap_or_else(|| unreachable!());

    let zoom: u8 = Input::new()
        .with_prompt("Zoom level")
        .default(DEFAULT_ZOOM)
        .interact_text()?;

    Ok(Viewport::new(bbox, zoom))
}

fn print_query(viewport: Viewport) {
    let config = OverpassConfig::embedded();
    print!("{}", build_query(&viewport, config.server_timeout_secs));
}

async fn run_overlay(
    viewport: Viewport,
    seed: Option<u64>,
    geojson: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client = OverpassClient::from_env()?;
    let server_timeout = client.config().server_timeout_secs;
    log::info!("Querying {} for {}", client.config().endpoint, viewport.bounds);

    let styler: Arc<dyn TrafficStyler> =
        Arc::new(seed.map_or_else(RandomStyler::new, RandomStyler::seeded));
    let view = MapView::new(Arc::new(client), styler).with_server_timeout(server_timeout);

    match view.refresh(viewport).await {
        CycleOutcome::Committed { roads, signals, .. } => {
            println!(
                "Zoom {}: {roads} road segment(s), {signals} traffic signal(s)",
                viewport.zoom
            );
        }
        CycleOutcome::Failed { error, .. } => return Err(error.into()),
        CycleOutcome::Superseded { sequence, latest, .. } => {
            return Err(format!("cycle {sequence} superseded by {latest}").into());
        }
    }

    if let Some(path) = geojson {
        let collection = to_feature_collection(&view.snapshot());
        std::fs::write(path, collection.to_string())?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn print_cameras() {
    println!("{:<10} {:<18} {:<8} {:<8} PLAYER", "ID", "NAME", "STATUS", "TYPE");
    println!("{}", "-".repeat(90));

    for camera in all_cameras() {
        let player = match player_for(&camera) {
            CameraPlayer::Youtube { embed_url, .. } => embed_url,
            CameraPlayer::Hls { feed_url, .. } => feed_url,
            CameraPlayer::Unavailable { message } => format!("({message})"),
        };
        println!(
            "{:<10} {:<18} {:<8} {:<8} {player}",
            camera.id, camera.name, camera.status, camera.kind
        );
    }
}

fn simulate(
    ticks: u64,
    seed: Option<u64>,
    q_table: &Path,
    save: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = AgentConfig::default();
    let agent = seed.map_or_else(
        || QAgent::new(config),
        |seed| QAgent::seeded(config, seed.wrapping_add(1)),
    );
    let agent = match load_table(q_table)? {
        Some(table) => {
            log::info!("Resuming from {} ({} states)", q_table.display(), table.len());
            agent.with_table(table)
        }
        None => agent,
    };

    let mut sim = match seed {
        Some(seed) => Simulation::seeded(agent, seed),
        None => Simulation::new(agent),
    };
    let stats = sim.run(ticks);

    println!("Ticks:      {}", stats.ticks);
    println!(
        "Arrivals:   {} ({} dropped at a full entrance)",
        stats.spawned, stats.spawn_blocked
    );
    println!("Cleared:    {}", stats.cleared);
    println!("Decisions:  {}", stats.decisions);
    println!("Switches:   {}", stats.switches);
    println!("Reward:     {:.0}", stats.total_reward);

    let agent = sim.into_agent();
    println!();
    println!("{:<8} {:>10} {:>10}", "STATE", "KEEP", "SWITCH");
    for (state, actions) in agent.table() {
        let value = |key: &str| {
            actions
                .get(key)
                .map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
        };
        println!(
            "{state:<8} {:>10} {:>10}",
            value(Action::Keep.key()),
            value(Action::Switch.key())
        );
    }

    if save {
        save_table(q_table, agent.table())?;
        println!("Wrote {}", q_table.display());
    }

    Ok(())
}

async fn serve() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tokio::task::spawn_blocking(|| {
        actix_web::rt::System::new().block_on(traffic_watch_server::run_server())
    })
    .await??;
    Ok(())
}
