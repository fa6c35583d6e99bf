use clap::{Parser, Subcommand, ValueEnum};
use orbit::config::{self, Settings};
use orbit::events::AppEvent;
use orbit::layout::{Layout, LayoutPaths};
use orbit::report::Report;
use orbit::sys::runtime;
use orbit_core::nest::{self, NestId, ROOT_NEST};
use orbit_core::{Navigator, protocol};
use std::path::{Path, PathBuf};
use strum::Display as StrumDisplay;

#[derive(Parser, Debug)]
#[command(name = "orbit", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Point list to work on (overrides the configured location)
    #[arg(long, global = true)]
    points: Option<PathBuf>,

    /// Nest list to work on (overrides the configured location)
    #[arg(long, global = true)]
    nests: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Decode the layout and list anything wrong with it
    Check,
    /// Re-encode a single document
    Fmt {
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = DocumentKind::Points)]
        kind: DocumentKind,
        /// Print on one line instead of indented
        #[arg(long)]
        compact: bool,
    },
    /// Place a new point at a free angle
    Add {
        #[arg(short, long)]
        circle: i32,
        #[arg(short, long, default_value_t = ROOT_NEST)]
        nest: NestId,
        /// Action as JSON, e.g. '{"type":"LaunchApp","package":"org.example"}'
        #[arg(short, long)]
        action: Option<String>,
    },
    /// Spread out overlapping points on every ring
    Tidy,
    /// Print every nest with its parent chain
    Nests,
    /// Create an empty nest
    NewNest {
        #[arg(short, long, default_value_t = ROOT_NEST)]
        parent: NestId,
    },
    /// Delete a nest, its sub-nests and their points
    RemoveNest { id: NestId },
    /// Run `check` again whenever the layout or config changes
    Watch,
    /// Write the default config file
    InitConfig,
}

#[derive(Debug, Clone, Copy, ValueEnum, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
enum DocumentKind {
    Points,
    Nests,
    Action,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let settings = config::load_or_default();

    if let Commands::InitConfig = cli.command {
        let path = config::write_default_config()?;
        println!("{}", path.display());
        return Ok(());
    }
    if let Commands::Fmt {
        file,
        kind,
        compact,
    } = &cli.command
    {
        return format_document(file, *kind, *compact);
    }

    let paths = layout_paths(&cli, &settings)?;
    match cli.command {
        Commands::Check => {
            let report = check(&paths, &settings)?;
            if !report.is_clean() {
                anyhow::bail!("layout has problems");
            }
            Ok(())
        }
        Commands::Add {
            circle,
            nest,
            action,
        } => add(&paths, &settings, circle, nest, action),
        Commands::Tidy => tidy(&paths, &settings),
        Commands::Nests => print_nests(&paths),
        Commands::NewNest { parent } => new_nest(&paths, &settings, parent),
        Commands::RemoveNest { id } => remove_nest(&paths, &settings, id),
        Commands::Watch => watch(paths, settings),
        Commands::InitConfig | Commands::Fmt { .. } => Ok(()),
    }
}

fn layout_paths(cli: &Cli, settings: &Settings) -> anyhow::Result<LayoutPaths> {
    let overridden = Settings {
        points_file: cli.points.clone().or_else(|| settings.points_file.clone()),
        nests_file: cli.nests.clone().or_else(|| settings.nests_file.clone()),
        ..settings.clone()
    };
    let paths = overridden.layout_paths()?;

    // watcher events carry absolute paths
    Ok(LayoutPaths {
        points: std::path::absolute(&paths.points)?,
        nests: std::path::absolute(&paths.nests)?,
    })
}

fn load(paths: &LayoutPaths) -> anyhow::Result<Layout> {
    let loaded = Layout::load(paths)?;
    if let Some((path, e)) = loaded.rejected.first() {
        anyhow::bail!(
            "refusing to overwrite {}, it does not decode: {}",
            path.display(),
            e
        );
    }
    Ok(loaded.layout)
}

fn check(paths: &LayoutPaths, settings: &Settings) -> anyhow::Result<Report> {
    let loaded = Layout::load(paths)?;
    let report = Report::build(&loaded, settings);
    print!("{}", report);
    Ok(report)
}

fn format_document(file: &Path, kind: DocumentKind, compact: bool) -> anyhow::Result<()> {
    let text = fs_err::read_to_string(file)?;
    log::debug!("Formatting {} as {}", file.display(), kind);

    let output = match kind {
        DocumentKind::Points => {
            let points = protocol::try_decode_points(&text)?;
            if compact {
                protocol::encode_points(&points)
            } else {
                protocol::encode_points_pretty(&points)
            }
        }
        DocumentKind::Nests => {
            let nests = protocol::try_decode_nests(&text)?;
            if compact {
                protocol::encode_nests(&nests)
            } else {
                protocol::encode_nests_pretty(&nests)
            }
        }
        DocumentKind::Action => {
            let action = protocol::try_decode_action(&text)?;
            if compact {
                protocol::encode_action(action.as_ref())
            } else {
                protocol::encode_action_pretty(action.as_ref())
            }
        }
    };
    println!("{}", output);
    Ok(())
}

fn add(
    paths: &LayoutPaths,
    settings: &Settings,
    circle: i32,
    nest_id: NestId,
    action: Option<String>,
) -> anyhow::Result<()> {
    let action = match action {
        Some(text) => protocol::try_decode_action(&text)?,
        None => None,
    };
    let mut layout = load(paths)?;
    if nest_id != ROOT_NEST && !layout.nests.iter().any(|n| n.id == nest_id) {
        log::warn!("Nest {} is not declared, adding the point anyway", nest_id);
    }

    let point = layout.add_point(settings, circle, nest_id, action)?;
    println!("{} {:.1}", point.id, point.angle);
    layout.save(paths, settings.pretty)?;
    Ok(())
}

fn tidy(paths: &LayoutPaths, settings: &Settings) -> anyhow::Result<()> {
    let mut layout = load(paths)?;
    let moved = layout.tidy(&settings.geometry(), &settings.circles);
    for (nest_id, circle, resolution) in &moved {
        println!(
            "nest {} circle {}: {} passes{}",
            nest_id,
            circle,
            resolution.passes,
            if resolution.converged { "" } else { ", still crowded" }
        );
    }
    if !moved.is_empty() {
        layout.save(paths, settings.pretty)?;
    }
    Ok(())
}

fn print_nests(paths: &LayoutPaths) -> anyhow::Result<()> {
    let layout = Layout::load(paths)?.layout;
    for id in layout.nest_ids() {
        let chain: Vec<String> = Navigator::new(id)
            .ancestors(&layout.nests)
            .iter()
            .map(|n| n.to_string())
            .collect();
        let nest = nest::resolve(&layout.nests, id);
        let zones: Vec<String> = nest
            .drag_distances
            .iter()
            .map(|(ring, distance)| format!("{}:{}", ring, distance))
            .collect();
        println!(
            "{:<4} {:<16} points={:<3} zones=[{}]",
            id,
            chain.join(" > "),
            layout.points.iter().filter(|p| p.nest_id == id).count(),
            zones.join(", ")
        );
    }
    Ok(())
}

fn new_nest(paths: &LayoutPaths, settings: &Settings, parent: NestId) -> anyhow::Result<()> {
    let mut layout = load(paths)?;
    if parent != ROOT_NEST && !layout.nests.iter().any(|n| n.id == parent) {
        anyhow::bail!("parent nest {} does not exist", parent);
    }
    let id = layout.add_nest(parent)?;
    layout.save(paths, settings.pretty)?;
    println!("{}", id);
    Ok(())
}

fn remove_nest(paths: &LayoutPaths, settings: &Settings, id: NestId) -> anyhow::Result<()> {
    let mut layout = load(paths)?;
    let removed = layout.remove_nest(id)?;
    layout.save(paths, settings.pretty)?;
    println!(
        "removed {}",
        removed
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    );
    Ok(())
}

fn watch(paths: LayoutPaths, mut settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = check(&paths, &settings) {
        log::error!("Check failed: {}", e);
    }

    let files = paths.all().map(|p| p.to_path_buf()).to_vec();
    runtime::watch_blocking(files, config::get_config_path().ok(), |events| {
        if events.iter().any(|e| matches!(e, AppEvent::ConfigReload)) {
            log::info!("Config changed, reloading");
            settings = config::load_or_default();
        }
        println!("---");
        if let Err(e) = check(&paths, &settings) {
            log::error!("Check failed: {}", e);
        }
    })
}
