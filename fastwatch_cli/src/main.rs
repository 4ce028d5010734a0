use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use fastwatch_core::export::{write_csv, write_csv_file};
use fastwatch_core::phase::hours_to_next_phase;
use fastwatch_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fastwatch")]
#[command(about = "Fasting status and history from a consumption log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read events from this feed file (JSON array or JSON Lines)
    #[arg(long, global = true)]
    feed: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current fasting status (default)
    Status {
        /// Evaluate at this instant (RFC 3339) instead of now
        #[arg(long)]
        now: Option<String>,

        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show inferred fast durations per day
    History {
        /// Time range: week, month, year or all
        #[arg(long, default_value = "all", value_parser = parse_range)]
        range: HistoryRange,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write CSV to this file instead of stdout (implies --format csv)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Evaluate at this instant (RFC 3339) instead of now
        #[arg(long)]
        now: Option<String>,
    },

    /// Show which refeed protocol a fast of the given length selects
    Refeed {
        /// Length of the fast that ended, in hours
        #[arg(long)]
        hours: f64,

        /// Hours since the fast ended
        #[arg(long, default_value_t = 0.0)]
        since: f64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the configured phase and refeed tables
    Phases,

    /// Write the effective configuration as TOML
    InitConfig {
        /// Destination file (defaults to the standard config location)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

fn parse_range(s: &str) -> std::result::Result<HistoryRange, String> {
    s.parse::<HistoryRange>().map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    // Initialize logging
    fastwatch_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let engine = FastingEngine::from_config(&config)?;

    // Determine feed location
    let feed_path = cli.feed.clone().unwrap_or_else(|| {
        let mut data = config.data.clone();
        if let Some(dir) = &cli.data_dir {
            data.data_dir = dir.clone();
        }
        data.feed_path()
    });
    tracing::debug!("Using event feed {:?}", feed_path);

    match cli.command {
        Some(Commands::Status { now, json }) => cmd_status(&engine, &feed_path, now, json),
        Some(Commands::History {
            range,
            format,
            output,
            now,
        }) => cmd_history(&engine, &feed_path, range, format, output, now),
        Some(Commands::Refeed { hours, since, json }) => cmd_refeed(&engine, hours, since, json),
        Some(Commands::Phases) => cmd_phases(&engine),
        Some(Commands::InitConfig { path, force }) => cmd_init_config(&config, path, force),
        None => {
            // Default to "status" command
            cmd_status(&engine, &feed_path, None, false)
        }
    }
}

fn resolve_now(now: Option<String>) -> Result<DateTime<Utc>> {
    match now {
        Some(s) => parse_timestamp(&s)
            .ok_or_else(|| Error::Other(format!("Invalid --now timestamp: {}", s))),
        None => Ok(Utc::now()),
    }
}

fn cmd_status(
    engine: &FastingEngine,
    feed_path: &std::path::Path,
    now: Option<String>,
    json: bool,
) -> Result<()> {
    let now = resolve_now(now)?;
    let events = FileFeed::new(feed_path).events()?;
    let status = engine.status(&events, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    display_status(engine, &status);
    Ok(())
}

fn display_status(engine: &FastingEngine, status: &FastingStatus) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  FASTING STATUS");
    println!("╰─────────────────────────────────────────╯");
    println!();

    let (Some(hours), Some(phase)) = (status.hours_elapsed, status.phase) else {
        println!("  No fasting breaker logged yet - status unknown.");
        println!();
        return;
    };

    println!("  Elapsed: {}", format_hours(hours));
    println!(
        "  Phase:   {} ({})",
        phase,
        status.phase_color.as_deref().unwrap_or("-")
    );
    println!("  {}", phase.guidance());

    if let Some(next) = hours_to_next_phase(hours, engine.phases()) {
        println!("  Next phase in {}", format_hours(next));
    }

    if status.needs_electrolytes {
        println!();
        println!("  ⚠ Electrolytes: take sodium, potassium and magnesium.");
    }

    if let Some(ref refeed) = status.refeed_status {
        println!();
        println!(
            "  Refeed protocol {} after a {} fast: {} left of {} ({:.0}% done)",
            refeed.protocol_id,
            format_hours(refeed.fast_duration_hours),
            format_hours(refeed.refeed_hours_left),
            format_hours(refeed.total_refeed_window_hours),
            refeed.progress() * 100.0
        );
    }

    println!();
}

fn cmd_history(
    engine: &FastingEngine,
    feed_path: &std::path::Path,
    range: HistoryRange,
    format: OutputFormat,
    output: Option<PathBuf>,
    now: Option<String>,
) -> Result<()> {
    let now = resolve_now(now)?;
    let today = now.with_timezone(&Local).date_naive();

    let events = FileFeed::new(feed_path).events()?;
    let samples = range.filter(&engine.history(&events, now), today);

    if let Some(path) = output {
        write_csv_file(&samples, &path)?;
        println!("Wrote {} fasts to {}", samples.len(), path.display());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&samples)?),
        OutputFormat::Csv => write_csv(&samples, std::io::stdout().lock())?,
        OutputFormat::Text => {
            if samples.is_empty() {
                println!("Not enough data to infer any fasts.");
                return Ok(());
            }

            for sample in &samples {
                println!("  {}  {:>9}", sample.date, format_hours(sample.duration_hours));
            }

            let summary = HistorySummary::from_samples(&samples);
            println!();
            println!("  Fasts:   {}", summary.fast_count);
            if let Some(longest) = summary.longest_hours {
                println!("  Longest: {}", format_hours(longest));
            }
            if let Some(average) = summary.average_hours {
                println!("  Average: {}", format_hours(average));
            }
        }
    }

    Ok(())
}

fn cmd_refeed(engine: &FastingEngine, hours: f64, since: f64, json: bool) -> Result<()> {
    let status = engine
        .select_refeed(hours)
        .and_then(|selected| selected.remaining_at(since));

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    match status {
        Some(refeed) => {
            println!("Refeed protocol {}", refeed.protocol_id);
            println!(
                "  {} left of a {} monitoring window",
                format_hours(refeed.refeed_hours_left),
                format_hours(refeed.total_refeed_window_hours)
            );
        }
        None => println!("No refeed protocol applies."),
    }

    Ok(())
}

fn cmd_phases(engine: &FastingEngine) -> Result<()> {
    let table = engine.phases();
    println!("Phase table v{}", table.version);
    println!();

    for threshold in &table.thresholds {
        println!(
            "  {:>5}h  {:<32} {}{}",
            threshold.lower_bound_hours,
            threshold.phase.display_name(),
            threshold.color,
            if threshold.requires_electrolytes {
                "  electrolytes"
            } else {
                ""
            }
        );
    }

    let refeed = engine.refeed_table();
    println!();
    println!("Refeed table v{}", refeed.version);
    println!();

    for protocol in &refeed.protocols {
        println!(
            "  {}  fast > {}h  monitor {}h",
            protocol.id, protocol.min_fast_hours_exclusive, protocol.monitoring_window_hours
        );
    }

    let gaps = engine.gap_policy();
    println!();
    println!(
        "History counts gaps of {}h to {}h",
        gaps.min_gap_hours, gaps.max_gap_hours
    );

    Ok(())
}

fn cmd_init_config(config: &Config, path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(Config::default_config_path);
    if path.exists() && !force {
        return Err(Error::Other(format!(
            "{} already exists, pass --force to replace it",
            path.display()
        )));
    }

    config.save_to(&path)?;
    println!("Wrote config to {}", path.display());
    Ok(())
}
