//! track-import - authoring tool for the track catalog
//!
//! Usage:
//!   track-import <file> [--epsilon <deg>] [--type hike] [--has-blog]
//!                [--name <name>] [--date <YYYY-MM-DDThh:mm>]
//!                [--out-dir <dir>] [--dry-run]
//!
//! Imports a raw GPS trace (GPX, GeoJSON-like JSON, or a bare `[lat, lng]`
//! array), simplifies it at the working epsilon, writes the exportable
//! `<id>.json` track file, and prints the manifest entry ready to splice
//! into the published manifest array.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use track_atlas::simplify::epsilon_to_meters;
use track_atlas::{
    build_entry, import_track, ActivityType, EntryConfig, Result, DEFAULT_WORKING_EPSILON,
};

#[derive(Parser)]
#[command(name = "track-import")]
#[command(about = "Import a raw GPS trace and emit catalog artifacts", long_about = None)]
struct Cli {
    /// Raw trace file (GPX, GeoJSON-like JSON, or a JSON [lat, lng] array)
    input: PathBuf,

    /// Working epsilon in degrees for the exported high-resolution track
    #[arg(short, long, default_value_t = DEFAULT_WORKING_EPSILON)]
    epsilon: f64,

    /// Activity type: hike, bike-ride, backpacking, walk
    #[arg(short = 't', long = "type", default_value = "hike")]
    activity_type: ActivityType,

    /// Mark the entry as having an associated blog post
    #[arg(long)]
    has_blog: bool,

    /// Override the activity name taken from the file
    #[arg(long)]
    name: Option<String>,

    /// Override the local date-time (YYYY-MM-DDThh:mm)
    #[arg(long)]
    date: Option<String>,

    /// Output directory for the exported track file
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Import and report only; write nothing
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let text = fs::read_to_string(&cli.input)?;
    let file_name = cli
        .input
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("track");

    let mut raw = import_track(&text, file_name, None)?;
    if let Some(name) = &cli.name {
        raw.name = name.clone();
    }
    if let Some(date) = &cli.date {
        raw.date_local = track_atlas::import::format_datetime_local(date);
    }

    let export = build_entry(
        &raw,
        &EntryConfig {
            epsilon: cli.epsilon,
            activity_type: cli.activity_type,
            has_blog: cli.has_blog,
        },
    );
    let stats = &export.stats;

    println!(
        "  [OK] {} - {} -> {} points ({:.0}% reduction)",
        raw.name, stats.raw_points, stats.simplified_points, stats.reduction_percent
    );
    println!(
        "       {:.2} mi simplified, {:.0} ft distance loss",
        stats.simplified_miles, stats.distance_loss_feet
    );
    println!(
        "       precision ~{:.1} m (epsilon {:.6}), timezone {}",
        epsilon_to_meters(cli.epsilon),
        cli.epsilon,
        raw.timezone.as_deref().unwrap_or("unknown")
    );

    if cli.dry_run {
        println!("  dry run: nothing written");
        return Ok(());
    }

    let path = export.write_track_file(&cli.out_dir)?;
    println!("  wrote {}", path.display());
    println!("\nManifest entry (splice into the manifest array):");
    println!("{}", export.manifest_snippet()?);

    Ok(())
}
