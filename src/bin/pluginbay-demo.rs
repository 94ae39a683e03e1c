//! Drives a plugin session from the command line.
//!
//! ```bash
//! RUST_LOG=debug cargo run --features demo --bin pluginbay-demo -- --kind effect --select 1 --save "My Preset"
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use pluginbay::{
    CatalogRegistry, DescriptorInfo, DirectoryRegistry, Dispatcher, PluginKind, PluginRegistry,
    Preset, RecordingGraph, Result, SessionConfig, SessionManager, VirtualHost, VirtualPlugin,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pluginbay-demo")]
struct Args {
    /// Plugin kind to discover
    #[arg(long, value_name = "KIND", value_parser = parse_kind, default_value = "effect")]
    kind: PluginKind,

    /// Index into the discovered list to select
    #[arg(long, value_name = "INDEX")]
    select: Option<usize>,

    /// Scan these directories instead of using the built-in catalog
    #[arg(long = "plugin-dir", value_name = "PATH")]
    plugin_dirs: Vec<PathBuf>,

    /// Scan the platform's standard plugin folders
    #[arg(long, conflicts_with = "plugin_dirs")]
    system: bool,

    /// Keep user presets as JSON files in this directory
    #[arg(long, value_name = "PATH")]
    preset_dir: Option<PathBuf>,

    /// Session configuration (JSON)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Save a user preset with this name on the selected plugin
    #[arg(long, value_name = "NAME")]
    save: Option<String>,

    /// Switch to the other view layout after selecting
    #[arg(long)]
    toggle_view: bool,
}

fn parse_kind(value: &str) -> std::result::Result<PluginKind, String> {
    match value.to_ascii_lowercase().as_str() {
        "effect" | "fx" => Ok(PluginKind::Effect),
        "instrument" | "inst" | "synth" => Ok(PluginKind::Instrument),
        other => Err(format!("unknown plugin kind: {other}")),
    }
}

fn catalog() -> Vec<VirtualPlugin> {
    vec![
        VirtualPlugin::new(
            DescriptorInfo::new("demo.reverb", "Reverb", PluginKind::Effect).vendor("Demo"),
        )
        .factory_presets(["Small Room", "Large Hall", "Plate"])
        .views(true, true),
        VirtualPlugin::new(
            DescriptorInfo::new("demo.delay", "Delay", PluginKind::Effect).vendor("Demo"),
        )
        .factory_presets(["Slapback", "Ping Pong"]),
        VirtualPlugin::new(
            DescriptorInfo::new("demo.synth", "Poly Synth", PluginKind::Instrument).vendor("Demo"),
        )
        .factory_presets(["Init", "Warm Pad", "Pluck"]),
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    let (registry, mut host) = if args.system || !args.plugin_dirs.is_empty() {
        let registry = if args.system {
            DirectoryRegistry::system()
        } else {
            DirectoryRegistry::new(args.plugin_dirs.clone())
        };
        (
            Arc::new(registry) as Arc<dyn PluginRegistry>,
            VirtualHost::new([]).permissive(),
        )
    } else {
        let plugins = catalog();
        let registry = CatalogRegistry::new(plugins.iter().map(|p| p.info().clone()));
        (
            Arc::new(registry) as Arc<dyn PluginRegistry>,
            VirtualHost::new(plugins),
        )
    };
    if let Some(dir) = &args.preset_dir {
        host = host.preset_dir(dir);
    }

    let (dispatcher, delivery) = Dispatcher::spawn("pluginbay-delivery")?;
    let graph = Arc::new(RecordingGraph::new());

    let session = SessionManager::builder()
        .config(config)
        .registry(registry)
        .host(Arc::new(host))
        .graph(graph.clone())
        .dispatcher(dispatcher)
        .build()?;

    session.add_listener(|event| {
        println!("presets changed ({:?}):", event.kind);
        for preset in &event.presets {
            println!("  #{} {}", preset.number, preset.name);
        }
    });

    let descriptors = session.discover(args.kind).await?;
    println!("{} plugin(s):", args.kind);
    for (i, descriptor) in descriptors.iter().enumerate() {
        match descriptor.info() {
            Some(info) => println!("  [{}] {} ({})", i, info.name, info.vendor),
            None => println!("  [{}] {}", i, descriptor.name()),
        }
    }

    let Some(index) = args.select else {
        return Ok(());
    };

    if !session.select_descriptor(index).await? {
        println!("no plugin selected");
        return Ok(());
    }

    if let Some(info) = session.active_descriptor() {
        println!("selected {}", info.name);
    }

    for preset in session.list_factory_presets() {
        println!("  factory #{} {}", preset.number, preset.name);
    }
    for preset in session.list_user_presets() {
        println!("  user #{} {}", preset.number, preset.name);
    }

    if let Some(name) = &args.save {
        let saved = session.save_preset(&Preset::unsaved(name.as_str()))?;
        println!("saved #{} {}", saved.number, saved.name);
    }

    if args.toggle_view {
        match session.toggle_view_mode() {
            Some(config) => println!("view {}x{}", config.width, config.height),
            None => println!("view unchanged"),
        }
    }

    match session.request_view_handle().await {
        Some(handle) => println!("view handle {:#x}", handle.0),
        None => println!("plugin has no interface"),
    }

    session.start_playback()?;
    println!("graph: {:?}", graph.events());
    session.stop_playback();

    // Joins the delivery thread once every queued notification has run.
    drop(delivery);

    Ok(())
}
