use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use toponym::config::{self, Config};
use toponym::evaluation::ground_truth::{write_template, GroundTruth};
use toponym::evaluation::precision::precision_curve;
use toponym::model::{BackgroundPrior, CoreWordEngine, Model, RunReport};
use toponym::output;
use toponym::places::loader::load_directory;

/// Toponym: core-word extraction for crowd-sourced place names.
///
/// Learns which word of a place title ("Hyde" in "Hyde Park") identifies the
/// place, from the title corpus alone or with local spatial context.
#[derive(Parser)]
#[command(name = "toponym", version, about)]
struct Cli {
    /// Directory of place JSON files (overrides TOPONYM_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Tiling mode: coordinates or city (overrides TOPONYM_TILING)
    #[arg(long, global = true)]
    tiling: Option<String>,

    /// Tile edge in degrees for coordinate tiling (overrides TOPONYM_TILE_SIZE)
    #[arg(long, global = true)]
    tile_size: Option<f64>,

    /// Background seeding: uniform or frequency (overrides TOPONYM_BACKGROUND_PRIOR)
    #[arg(long, global = true)]
    prior: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and show the top core word of each place
    Run {
        /// Model to train: name, spatial or idf
        #[arg(long, default_value = "name")]
        model: String,

        /// EM step cap (default: TOPONYM_MAX_STEPS)
        #[arg(long)]
        max_steps: Option<usize>,

        /// Convergence threshold (default: TOPONYM_THRESHOLD)
        #[arg(long)]
        threshold: Option<f64>,

        /// Number of places to display (default: 25)
        #[arg(long, default_value = "25")]
        limit: usize,

        /// Also write every posterior as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Score an arbitrary title against a trained name model
    Score {
        /// The title to score (e.g. "Hyde Park")
        title: String,
    },

    /// Measure precision against a hand-annotated ground truth file
    Evaluate {
        /// Ground truth file (id|title|words|core words)
        ground_truth: PathBuf,

        /// Model to train: name, spatial or idf
        #[arg(long, default_value = "name")]
        model: String,

        /// Comma-separated sample sizes
        #[arg(long, value_delimiter = ',', default_value = "10,25,50,100,200")]
        sizes: Vec<usize>,

        /// Write `size<delimiter>precision` rows to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Field delimiter for --output
        #[arg(long, default_value = ";")]
        delimiter: char,
    },

    /// Write a ground truth template for manual annotation
    Template {
        /// Destination file
        output: PathBuf,

        /// Maximum number of places to export (default: 200)
        #[arg(long, default_value = "200")]
        max: usize,
    },

    /// Show corpus statistics and tiling layout
    Status,
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("toponym=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Run {
            model,
            max_steps,
            threshold,
            limit,
            json,
        } => {
            let model: Model = model.parse()?;
            let mut engine = build_engine(&config)?;

            let report = train(
                &mut engine,
                model,
                max_steps.unwrap_or(config.em.max_steps),
                threshold.unwrap_or(config.em.threshold),
            )?;
            output::terminal::display_run_report(&report);
            output::terminal::display_core_words(engine.posteriors(), limit);

            if let Some(path) = json {
                let dump: serde_json::Map<String, serde_json::Value> = engine
                    .posteriors()
                    .map(|(place, posterior)| {
                        (place.id.to_string(), serde_json::json!(posterior.to_map()))
                    })
                    .collect();
                let file = File::create(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                serde_json::to_writer_pretty(BufWriter::new(file), &dump)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!(
                    "\n{}",
                    format!("Posteriors saved to: {}", path.display()).bold()
                );
            }
        }

        Commands::Score { title } => {
            let mut engine = build_engine(&config)?;
            train(&mut engine, Model::Name, config.em.max_steps, config.em.threshold)?;

            let known = !engine.store().get_by_title(&title).is_empty();
            let posterior = engine.compute_core_probability(&title);
            if !known {
                info!(title = %title, "Scored unseen title as a new place");
            }
            output::terminal::display_posterior(&title, &posterior);
        }

        Commands::Evaluate {
            ground_truth,
            model,
            sizes,
            output: output_path,
            delimiter,
        } => {
            let model: Model = model.parse()?;
            let ground_truth = GroundTruth::load(&ground_truth)?;
            if ground_truth.is_empty() {
                warn!("Ground truth file has no records; every precision will be 0");
            }

            let mut engine = build_engine(&config)?;
            let report = train(&mut engine, model, config.em.max_steps, config.em.threshold)?;
            output::terminal::display_run_report(&report);

            let curve = precision_curve(&ground_truth, &engine, &sizes);
            println!(
                "{}",
                format!(
                    "Evaluated {} against {} annotated places ({})",
                    model,
                    ground_truth.len(),
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
                )
                .dimmed()
            );
            output::terminal::display_precision_curve(&curve);

            if let Some(path) = output_path {
                let file = File::create(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                let mut out = BufWriter::new(file);
                output::write_precision_rows(&mut out, &curve, delimiter)?;
                out.flush()
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!(
                    "{}",
                    format!("Precision rows saved to: {}", path.display()).bold()
                );
            }
        }

        Commands::Template { output: path, max } => {
            let mut engine = build_engine(&config)?;
            train(&mut engine, Model::Name, config.em.max_steps, config.em.threshold)?;

            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            let written = write_template(&mut out, engine.posteriors(), max)?;
            out.flush()
                .with_context(|| format!("Failed to write {}", path.display()))?;

            println!(
                "Wrote {written} template lines to {}",
                path.display().to_string().bold()
            );
            println!(
                "{}",
                "Fill in the last field of each line with the core word(s), then run `toponym evaluate`."
                    .dimmed()
            );
        }

        Commands::Status => {
            let engine = build_engine(&config)?;
            toponym::status::show(&engine, &config);
        }
    }

    Ok(())
}

/// Environment configuration with CLI overrides applied.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load()?;

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    let tile_size = cli.tile_size.unwrap_or(match config.tiling {
        toponym::tiling::Tiling::Coordinates { tile_size } => tile_size,
        toponym::tiling::Tiling::City => config::DEFAULT_TILE_SIZE,
    });
    match &cli.tiling {
        Some(name) => config.tiling = config::parse_tiling(name, tile_size)?,
        None => {
            if let toponym::tiling::Tiling::Coordinates { .. } = config.tiling {
                config.tiling = toponym::tiling::Tiling::Coordinates { tile_size };
            }
        }
    }
    if let Some(prior) = &cli.prior {
        config.em.background_prior = prior.parse::<BackgroundPrior>()?;
    }

    config.validate()?;
    Ok(config)
}

fn build_engine(config: &Config) -> Result<CoreWordEngine> {
    let store = load_directory(&config.data_dir)?;
    CoreWordEngine::new(store, config.tiling, config.em)
}

/// Run `model` behind a spinner.
fn train(
    engine: &mut CoreWordEngine,
    model: Model,
    max_steps: usize,
    threshold: f64,
) -> Result<RunReport> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("  {spinner} {msg} [{elapsed}]")?);
    pb.set_message(format!("Training {model} model..."));
    pb.enable_steady_tick(Duration::from_millis(100));

    let report = engine.run(model, max_steps, threshold);

    pb.finish_and_clear();
    Ok(report)
}
