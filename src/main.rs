use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use termtree::Tree;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use livelog::export::{ExportComposer, format_show_line, palette};
use livelog::render::RasterSnapshot;
use livelog::{AppConfig, SessionState, ShowId};

#[derive(Parser)]
#[command(name = "livelog")]
#[command(about = "Pick the live shows you attended and export them as a shareable image")]
struct Cli {
    /// Config file (defaults to ./livelog.toml when present)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Tour document: file path or http(s) URL
    #[arg(long, value_name = "PATH_OR_URL", global = true)]
    source: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the tour tree with checkbox states
    List {
        #[command(flatten)]
        select: SelectArgs,

        /// List shows of collapsed tours too
        #[arg(long)]
        all: bool,
    },
    /// Show the available backgrounds
    Palette,
    /// Render the selection to a PNG
    Export(ExportArgs),
}

#[derive(Args)]
struct SelectArgs {
    /// Select every show of a tour
    #[arg(long = "tour", value_name = "TOUR")]
    tours: Vec<String>,

    /// Select every show of one year of a tour
    #[arg(long = "year", value_name = "TOUR/YEAR")]
    years: Vec<String>,

    /// Select a single show
    #[arg(long = "show", value_name = "TOUR/YEAR/INDEX")]
    shows: Vec<ShowId>,

    /// Deselect a single show (applied last)
    #[arg(long = "except", value_name = "TOUR/YEAR/INDEX")]
    except: Vec<ShowId>,
}

#[derive(Args)]
struct ExportArgs {
    #[command(flatten)]
    select: SelectArgs,

    /// Background id from `livelog palette`
    #[arg(short, long)]
    background: Option<String>,

    /// Display name shown above the listing
    #[arg(long)]
    name: Option<String>,

    /// Handle shown next to the name (`@` added if missing)
    #[arg(long)]
    handle: Option<String>,

    /// Output PNG path
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Font used for all text
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Save each render step under DIR/attempt_NN (one subdirectory per render)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    setup_logging(args.verbose);

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(source) = args.source {
        config.source = source;
    }

    let mut session = SessionState::initialize(&config.source(), config.collapse_policy()).await;
    print_notices(&mut session);

    match args.command {
        Commands::List { select, all } => {
            apply_selection(&mut session, &select)?;
            print_tree(&session, &config, all);
        }
        Commands::Palette => {
            for option in palette::palette() {
                println!("{:<8} {:<10} {:?}", option.id, option.label, option.spec);
            }
        }
        Commands::Export(export) => run_export(&mut session, config, export)?,
    }

    Ok(())
}

fn run_export(session: &mut SessionState, config: AppConfig, args: ExportArgs) -> anyhow::Result<()> {
    apply_selection(session, &args.select)?;

    if let Some(id) = &args.background {
        let option = palette::find(id).with_context(|| {
            let ids: Vec<String> = palette::palette().into_iter().map(|b| b.id).collect();
            format!("Unknown background {:?} (available: {})", id, ids.join(", "))
        })?;
        session.selection_mut().set_background(Some(option));
    }

    // Same gate as the disabled export button: report and leave before loading fonts
    let gate = session.check_export_ready();
    print_notices(session);
    gate?;

    let mut snapshot = RasterSnapshot::discover(args.font.as_deref().or(config.font.as_deref()))?;
    if let Some(dir) = args.debug_out {
        snapshot = snapshot.with_debug(dir);
    }
    let composer = ExportComposer::new(snapshot, config.labels.clone(), config.canvas);

    let result = session.export(&composer, args.name.as_deref(), args.handle.as_deref());
    print_notices(session);
    let artifact = result?;

    let out = args.out.unwrap_or(config.output);
    let path = artifact.save(&out)?;
    println!("Saved {}x{} image to {}", artifact.width, artifact.height, path.display());
    Ok(())
}

fn apply_selection(session: &mut SessionState, select: &SelectArgs) -> anyhow::Result<()> {
    let catalog = session.catalog();
    for tour in &select.tours {
        anyhow::ensure!(catalog.tour(tour).is_some(), "Unknown tour {:?}", tour);
    }
    let mut years = Vec::with_capacity(select.years.len());
    for spec in &select.years {
        let (tour, year) = spec
            .rsplit_once('/')
            .and_then(|(t, y)| Some((t, y.parse::<i32>().ok()?)))
            .with_context(|| format!("Expected TOUR/YEAR, got {:?}", spec))?;
        anyhow::ensure!(
            catalog.tour(tour).and_then(|t| t.year(year)).is_some(),
            "Unknown year {}",
            spec
        );
        years.push((tour, year));
    }
    for id in select.shows.iter().chain(&select.except) {
        anyhow::ensure!(catalog.show(id).is_some(), "Unknown show {}", id);
    }

    // Everything is known to exist; nothing was toggled before this point
    let tree = session.selection_mut();
    for tour in &select.tours {
        tree.toggle_tour(tour, true);
    }
    for (tour, year) in years {
        tree.toggle_year(tour, year, true);
    }
    for id in &select.shows {
        tree.toggle_show(id, true);
    }
    for id in &select.except {
        tree.toggle_show(id, false);
    }
    Ok(())
}

fn print_tree(session: &SessionState, config: &AppConfig, all: bool) {
    let tree = session.selection();
    let mut root = Tree::new(config.source.clone());
    for tour in &session.catalog().tours {
        let open = tree.is_expanded(&tour.name);
        let marker = if open { "▾" } else { "▸" };
        let mut tour_node = Tree::new(format!(
            "{} {} {}",
            tree.tour_state(&tour.name).glyph(),
            marker,
            tour.name
        ));
        if open || all {
            for year in &tour.years {
                let mut year_node = Tree::new(format!(
                    "{} {}",
                    tree.year_state(&tour.name, year.year).glyph(),
                    year.year
                ));
                for (index, show) in year.shows.iter().enumerate() {
                    let id = ShowId::new(&tour.name, year.year, index);
                    let glyph = if tree.is_selected(&id) { "[x]" } else { "[ ]" };
                    year_node.push(format!(
                        "{} {}  ({})",
                        glyph,
                        format_show_line(show, &config.labels),
                        id
                    ));
                }
                tour_node.push(year_node);
            }
        }
        root.push(tour_node);
    }
    print!("{}", root);
    println!(
        "{} of {} shows selected",
        tree.selected_count(),
        session.catalog().show_count()
    );
}

fn print_notices(session: &mut SessionState) {
    for notice in session.take_notices() {
        eprintln!("{}", notice);
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
