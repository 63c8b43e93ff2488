mod script;

use anyhow::Context;
use clap::{Parser, Subcommand};
use propyard_assets::AssetCatalog;
use propyard_persist::FileStore;
use propyard_render::DebugTextRenderer;
use propyard_session::{SessionBuilder, SessionConfig};
use propyard_tools::{Palette, SessionInspector};
use script::Script;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Frame length used for headless simulation.
const FRAME_DT: f32 = 1.0 / 60.0;

#[derive(Parser)]
#[command(name = "propyard", about = "Headless runner for the propyard sandbox")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Session configuration (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Asset catalog (JSON or YAML); the built-in catalog when omitted
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// List the asset catalog and the placement palette
    Catalog {
        /// Highlight this palette index
        #[arg(short, long, default_value = "0")]
        selected: usize,
    },
    /// Run an input script headless against a scene directory
    Simulate {
        /// Input script (YAML)
        script: PathBuf,
        /// Scene data directory
        #[arg(long, default_value = "./scene_data")]
        data_dir: PathBuf,
        /// Print the final debug render
        #[arg(long)]
        render: bool,
    },
    /// Check a persisted object list and report entries that would be skipped
    Validate {
        /// JSON file holding the object list
        scene: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let catalog = load_catalog(cli.catalog.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("propyard v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", propyard_assets::crate_info());
            println!(
                "catalog: {} assets, {} placeable, fingerprint {}",
                catalog.len(),
                catalog.decoration_count(),
                catalog.fingerprint()?
            );
            println!("scene schema: v{}", propyard_persist::SCENE_SCHEMA_VERSION);
        }
        Commands::Catalog { selected } => {
            for asset in catalog.assets() {
                let [w, h, d] = asset.bounding_size;
                println!(
                    "{:<10} {:<16} {:>5.1} x {:>5.1} x {:>5.1}  {}{}",
                    asset.id,
                    asset.display_name,
                    w,
                    h,
                    d,
                    asset.color,
                    if asset.is_structural { "  (structural)" } else { "" }
                );
            }
            println!();
            for swatch in Palette::build(&catalog, selected).swatches {
                let marker = if swatch.highlighted { ">" } else { " " };
                println!("{marker} [{}] {} {}", swatch.index, swatch.label, swatch.color_hex);
            }
        }
        Commands::Simulate {
            script,
            data_dir,
            render,
        } => {
            let config = load_config(cli.config.as_deref())?;
            simulate(config, catalog, &script, &data_dir, render)?;
        }
        Commands::Validate { scene } => {
            let text = std::fs::read_to_string(&scene)
                .with_context(|| format!("reading {}", scene.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", scene.display()))?;
            let (objects, skipped) = propyard_author::decode_list(&value, &catalog)?;
            println!("{} valid, {} skipped", objects.len(), skipped.len());
            for entry in &skipped {
                println!("  #{}: {}", entry.index, entry.error);
            }
            if !skipped.is_empty() {
                anyhow::bail!("{} invalid entries in {}", skipped.len(), scene.display());
            }
        }
    }

    Ok(())
}

fn load_catalog(path: Option<&Path>) -> anyhow::Result<AssetCatalog> {
    match path {
        Some(path) => AssetCatalog::load(path)
            .with_context(|| format!("loading catalog {}", path.display())),
        None => Ok(AssetCatalog::builtin()),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SessionConfig> {
    match path {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(SessionConfig::default()),
    }
}

fn simulate(
    config: SessionConfig,
    catalog: AssetCatalog,
    script_path: &Path,
    data_dir: &Path,
    render: bool,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(script_path)
        .with_context(|| format!("reading {}", script_path.display()))?;
    let script = Script::from_yaml_str(&text)?;

    let store = Arc::new(FileStore::open(data_dir)?);
    let mut session = SessionBuilder::new(config)
        .with_defaults()
        .renderer(DebugTextRenderer::new())
        .catalog(Arc::new(catalog))
        .persistence(store.clone())
        .build()?;
    // Let the initial load land before the first frame.
    store.flush();

    let frames = script.play(|intent| {
        session.frame(FRAME_DT, intent);
    });
    store.flush();
    tracing::info!(frames, dir = %data_dir.display(), "simulation finished");

    println!("{}", SessionInspector::summary(&session));
    for id in SessionInspector::list_objects(&session) {
        if let Some(info) = SessionInspector::inspect_object(&session, &id) {
            println!("  {info}");
        }
    }
    if render {
        print!("{}", session.renderer().last_frame());
    }
    Ok(())
}
