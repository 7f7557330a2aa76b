//! Grid Cache - headless driver
//!
//! Loads the configured grid, fetching whatever is not cached yet, and prints
//! the state of every slot. Optional removal and reset mimic the grid's
//! tap-to-remove and pull-to-refresh gestures.

use clap::Parser;
use grid_cache::{Coordinator, Entry, EntryState, GridConfig, HttpSource, JsonSettings, Presenter};
use std::path::PathBuf;

/// Image grid cache - fetch, cache and list grid slots
#[derive(Parser, Debug)]
#[command(name = "grid_cache")]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the cache root (the resources directory is created inside)
    #[arg(long)]
    cache_root: Option<PathBuf>,

    /// Override the settings file holding the manifest
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Image size segment of the endpoint, e.g. 800x600
    #[arg(long)]
    size: Option<String>,

    /// Image category of the endpoint, e.g. cars
    #[arg(long)]
    category: Option<String>,

    /// Slots reported as visible (default: all slots)
    #[arg(long, value_delimiter = ',')]
    visible: Option<Vec<usize>>,

    /// Remove this slot after loading
    #[arg(long)]
    remove: Option<usize>,

    /// Clear the cache and refetch as many slots as were cached
    #[arg(long, default_value_t = false)]
    reset: bool,
}

/// Presenter that logs a one-line summary of every update
struct LogPresenter;

impl Presenter for LogPresenter {
    fn entries_changed(&mut self, entries: &[Entry]) {
        let loaded = entries
            .iter()
            .filter(|e| e.state() == EntryState::Loaded)
            .count();
        let failed = entries
            .iter()
            .filter(|e| e.state() == EntryState::Failed)
            .count();
        log::info!(
            "Entries updated: {} total, {} loaded, {} failed",
            entries.len(),
            loaded,
            failed
        );
    }
}

fn build_config(args: &Args) -> grid_cache::Result<GridConfig> {
    let mut config = match &args.config {
        Some(path) => GridConfig::from_file(path)?,
        None => GridConfig::default(),
    };
    if let Some(root) = &args.cache_root {
        config.cache_root = root.clone();
    }
    if let Some(path) = &args.settings {
        config.settings_path = path.clone();
    }
    if let Some(size) = &args.size {
        config.endpoint.size = size.clone();
    }
    if let Some(category) = &args.category {
        config.endpoint.category = category.clone();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    log::info!("Starting grid_cache...");
    log::info!("Endpoint: {}", config.endpoint.url());
    log::info!("Settings path: {}", config.settings_path.display());

    let settings = JsonSettings::load(&config.settings_path);
    let source = HttpSource::from_endpoint(&config.endpoint);
    let (mut coordinator, mut events) =
        Coordinator::from_config(&config, Box::new(settings), source, Box::new(LogPresenter));

    let visible = args
        .visible
        .clone()
        .unwrap_or_else(|| (0..config.slot_count).collect());
    coordinator.on_visible_slots_changed(&visible);
    coordinator.settle(&mut events).await;

    if let Some(slot) = args.remove {
        coordinator.on_slot_removed(slot);
    }

    if args.reset {
        coordinator.on_full_reset();
        coordinator.settle(&mut events).await;
    }

    for (slot, entry) in coordinator.entries().iter().enumerate() {
        let name = coordinator.manifest().get(slot).unwrap_or("-");
        match entry.state() {
            EntryState::Loaded => {
                let (w, h) = entry
                    .image()
                    .map(|img| (img.width(), img.height()))
                    .unwrap_or_default();
                println!("slot {:>2}: loaded {}x{} [{}]", slot, w, h, name);
            }
            EntryState::Failed => {
                println!("slot {:>2}: failed: {}", slot, entry.error().unwrap_or(""));
            }
            EntryState::Loading => println!("slot {:>2}: loading", slot),
        }
    }
}
