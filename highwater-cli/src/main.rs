//! Highwater CLI: backtest, inspection and config commands.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config over CSV or synthetic data
//! - `inspect`: list high-point days and swing sections of one instrument
//! - `init-config`: print or write the default config

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use highwater_core::indicators::{high_point_days, swing_sections, swings, turning_points};
use highwater_runner::data_loader::{load_series, InstrumentInfo, LoadOptions};
use highwater_runner::runner::{load_data, run_backtest_from_store};
use highwater_runner::{generate_synthetic, save_artifacts, BacktestConfig, BacktestResult};

#[derive(Parser)]
#[command(
    name = "highwater",
    about = "Highwater: high-point breakout backtester for daily equity data"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of `<id>.csv` bar files (overrides the config).
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// `id,name` instrument list (overrides the config).
        #[arg(long)]
        instruments: Option<PathBuf>,

        /// Run on N synthetic instruments instead of files.
        #[arg(long, conflicts_with_all = ["data_dir", "instruments"])]
        synthetic: Option<usize>,

        /// Trading days per synthetic instrument.
        #[arg(long, default_value_t = 1500)]
        synthetic_days: usize,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// List the high-point days and swing sections of one instrument.
    Inspect {
        /// Directory of `<id>.csv` bar files.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Instrument id.
        #[arg(long)]
        id: String,

        /// Trailing window for a fresh high.
        #[arg(long, default_value_t = 500)]
        window: usize,

        /// Widest span of bars a swing section may cover.
        #[arg(long, default_value_t = swings::DEFAULT_MAX_SPAN)]
        max_span: usize,

        /// Minimum high/low ratio of a swing section.
        #[arg(long, default_value_t = swings::DEFAULT_MIN_RATIO)]
        min_ratio: f64,
    },
    /// Print the default config, or write it to a file.
    InitConfig {
        /// Write here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            data_dir,
            instruments,
            synthetic,
            synthetic_days,
            output_dir,
        } => run_backtest_cmd(
            config,
            data_dir,
            instruments,
            synthetic,
            synthetic_days,
            output_dir,
        ),
        Commands::Inspect {
            data_dir,
            id,
            window,
            max_span,
            min_ratio,
        } => run_inspect(data_dir, id, window, max_span, min_ratio),
        Commands::InitConfig { output, force } => run_init_config(output, force),
    }
}

fn init_tracing() -> Result<()> {
    let filter = std::env::var("HIGHWATER_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| anyhow::anyhow!("invalid log filter: {err}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn run_backtest_cmd(
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    instruments: Option<PathBuf>,
    synthetic: Option<usize>,
    synthetic_days: usize,
    output_dir: PathBuf,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => BacktestConfig::from_file(path)?,
        None => BacktestConfig::default(),
    };
    if let Some(dir) = data_dir {
        config.data.dir = dir;
    }
    if let Some(list) = instruments {
        config.data.instruments = list;
    }
    tracing::debug!(config = ?config_path, synthetic = ?synthetic, "starting backtest");

    let loaded = match synthetic {
        Some(0) => bail!("--synthetic needs at least one instrument"),
        Some(count) => {
            let start = NaiveDate::from_ymd_opt(2015, 1, 5).context("invalid synthetic start")?;
            generate_synthetic(count, start, synthetic_days)?
        }
        None => load_data(&config)?,
    };

    let result = run_backtest_from_store(&config, &loaded)?;
    print_summary(&result);

    let run_dir = save_artifacts(&result, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let s = &result.summary;
    println!();
    println!("=== Backtest Result ===");
    println!("Run:            {}", result.run_id);
    if let (Some(start), Some(end)) = (result.start_date, result.end_date) {
        println!("Period:         {start} to {end}");
    }
    println!("Instruments:    {}", result.instrument_count);
    println!("Days:           {}", s.simulated_days);
    println!();
    println!("--- Performance ---");
    println!("Initial Cash:   {:.2}", s.initial_cash);
    println!("Final Cash:     {:.2}", s.final_cash);
    println!(
        "Total Return:   {:.2} ({:.2}%)",
        s.total_return, s.return_pct
    );
    println!("Max Drawdown:   {:.2}%", s.max_drawdown_pct);
    println!("Sharpe:         {:.3}", s.sharpe);
    println!("Buys / Sells:   {} / {}", s.buy_count, s.sell_count);
    println!(
        "Win Rate:       {:.1}% ({} won, {} lost)",
        s.win_rate_pct, s.wins, s.losses
    );
    println!("Avg Hold:       {:.1} days", s.avg_hold_days);
    println!("Max Positions:  {}", s.max_concurrent_positions);
    println!("Fees:           {:.2} ({:.3}%)", s.total_fees, s.fees_pct);
    if result.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    for (id, reason) in &result.skipped {
        println!("WARNING: skipped {id}: {reason}");
    }
    println!();
}

fn run_inspect(
    data_dir: PathBuf,
    id: String,
    window: usize,
    max_span: usize,
    min_ratio: f64,
) -> Result<()> {
    if window == 0 {
        bail!("--window must be positive");
    }
    let info = InstrumentInfo {
        name: id.clone(),
        id,
    };
    let series = load_series(&data_dir, &info, &LoadOptions::default())
        .with_context(|| format!("failed to load '{}'", info.id))?;
    let bars = series.bars();
    let closes = series.closes();

    let highs = high_point_days(&closes, window);
    println!("{} high-point days ({}-day window):", highs.len(), window);
    for i in &highs {
        println!("  {}  {:.2}", bars[*i].date, closes[*i]);
    }

    let points = turning_points(&closes);
    let sections = swing_sections(&points, max_span, min_ratio);
    println!();
    println!(
        "{} swing sections from {} turning points:",
        sections.len(),
        points.len()
    );
    for section in &sections {
        println!(
            "  {} {:.2} -> {} {:.2}  x{:.2} {}",
            bars[section.start.index].date,
            section.start.price,
            bars[section.end.index].date,
            section.end.price,
            section.ratio(),
            if section.is_rally() { "rally" } else { "decline" }
        );
    }

    Ok(())
}

fn run_init_config(output: Option<PathBuf>, force: bool) -> Result<()> {
    let toml = BacktestConfig::default().to_toml()?;
    match output {
        Some(path) => {
            if path.exists() && !force {
                bail!("{} exists (use --force to overwrite)", path.display());
            }
            std::fs::write(&path, toml)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{toml}"),
    }
    Ok(())
}
