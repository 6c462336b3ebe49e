//! Market Health CLI: compute sector scores and render rating bands.
//!
//! Commands:
//! - `scores`: fetch prices, score every sector and write the JSON payload (and optional CSV)
//! - `rate`: load rows (demo, payload file or live) and print the overview or the rating grid

mod demo;
mod output;
mod render;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use market_health_core::config::{normalize_sectors, parse_quantiles};
use market_health_core::data::{CircuitBreaker, FetchCache, YahooProvider};
use market_health_core::rating::{self, BandState, RatingScheme};
use market_health_core::{compute_scores, payload, AppConfig, ConfigError, SectorRow};
use output::ExportFormat;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "market-health",
    version,
    about = "Market Health: sector ETF health scores and rating bands"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that may compute scores.
#[derive(Args, Debug, Clone, Default)]
struct ScoreArgs {
    /// Sector symbols, space or comma separated. Defaults to the SPDR sector ETFs.
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    sectors: Option<Vec<String>>,

    /// Lookback window for live fetches, e.g. 6mo, 1y.
    #[arg(long)]
    period: Option<String>,

    /// Sampling interval, e.g. 1d, 1h.
    #[arg(long)]
    interval: Option<String>,

    /// Seconds a fetched series stays fresh.
    #[arg(long)]
    ttl: Option<u64>,

    /// TOML config file. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute live scores and write the JSON payload.
    Scores {
        #[command(flatten)]
        common: ScoreArgs,

        /// Payload path.
        #[arg(long, default_value = "scores.json")]
        out: PathBuf,

        /// Also write per-category totals as CSV.
        #[arg(long)]
        out_csv: Option<PathBuf>,

        /// Also print the payload to stdout; `--out` is still written.
        #[arg(long, default_value_t = false)]
        stdout: bool,

        /// Indent the JSON payload.
        #[arg(long, default_value_t = false)]
        pretty: bool,

        /// Recompute every N seconds (minimum 1). Runs once when absent or 0.
        #[arg(long)]
        watch: Option<u64>,
    },
    /// Rate sectors and print the overview or the rating grid.
    Rate {
        #[command(flatten)]
        common: ScoreArgs,

        /// Use a seeded random dataset.
        #[arg(long, default_value_t = false)]
        demo: bool,

        /// Read rows from a payload file instead of computing them.
        #[arg(long, conflicts_with = "demo")]
        json_path: Option<PathBuf>,

        /// fixed, quantile or hybrid.
        #[arg(long, value_parser = parse_scheme)]
        rating_scheme: Option<RatingScheme>,

        /// Four ascending percentiles, e.g. 10,30,70,90.
        #[arg(long, value_parser = parse_quantiles)]
        quantiles: Option<[f64; 4]>,

        /// Points required to leave a committed band.
        #[arg(long)]
        hysteresis: Option<u32>,

        /// Refresh every N seconds (minimum 1). Runs once when absent or 0.
        #[arg(long)]
        watch: Option<u64>,

        /// Print `symbol,score` rows and exit.
        #[arg(long, value_enum)]
        export: Option<ExportFormat>,

        /// Rows shown in the details section.
        #[arg(long, default_value_t = 3)]
        topk: usize,

        /// Render compact rating tiles instead of the overview.
        #[arg(long, default_value_t = false)]
        grid: bool,

        /// Tiles per line in grid mode.
        #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
        grid_cols: u16,
    },
}

fn parse_scheme(s: &str) -> Result<RatingScheme, ConfigError> {
    s.parse()
}

fn main() -> Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let cli = Cli::parse();

    match cli.command {
        Commands::Scores {
            common,
            out,
            out_csv,
            stdout,
            pretty,
            watch,
        } => {
            let config = load_config(&common)?;
            run_scores(&config, &out, out_csv.as_deref(), stdout, pretty, watch)
        }
        Commands::Rate {
            common,
            demo,
            json_path,
            rating_scheme,
            quantiles,
            hysteresis,
            watch,
            export,
            topk,
            grid,
            grid_cols,
        } => {
            let mut config = load_config(&common)?;
            if let Some(scheme) = rating_scheme {
                config.rating.scheme = scheme;
            }
            if let Some(qs) = quantiles {
                config.rating.quantiles = qs;
            }
            if let Some(h) = hysteresis {
                config.rating.hysteresis = h;
            }
            config.validate().context("invalid configuration")?;

            let filter = sector_filter(&common);
            let mut source = if demo {
                RowSource::Demo
            } else if let Some(path) = json_path {
                RowSource::Json(path)
            } else {
                RowSource::live()
            };

            if let Some(format) = export {
                let rows = source.load(&config, &filter);
                print!("{}", output::export_rows(&rows, format)?);
                return Ok(());
            }

            let view = RateView {
                topk,
                grid,
                grid_cols: usize::from(grid_cols),
            };
            let mut bands = BandState::new();
            watch_loop(watch, || {
                let rows = source.load(&config, &filter);
                view.render(&rows, &config, &mut bands, &source);
                Ok(())
            })
        }
    }
}

/// Config file (or defaults) with command-line overrides applied, validated.
fn load_config(args: &ScoreArgs) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };

    if let Some(sectors) = &args.sectors {
        config.score.sectors = normalize_sectors(sectors);
    }
    if let Some(period) = &args.period {
        config.score.period = period.clone();
    }
    if let Some(interval) = &args.interval {
        config.score.interval = interval.clone();
    }
    if let Some(ttl) = args.ttl {
        config.score.ttl = ttl;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Symbols a payload file is narrowed to. Empty keeps every row.
fn sector_filter(args: &ScoreArgs) -> Vec<String> {
    args.sectors
        .as_deref()
        .map(normalize_sectors)
        .unwrap_or_default()
}

/// Run `pass` once, or forever with a pause of at least one second between passes.
fn watch_loop(watch: Option<u64>, mut pass: impl FnMut() -> Result<()>) -> Result<()> {
    let Some(secs) = watch.filter(|n| *n > 0) else {
        return pass();
    };
    let pause = Duration::from_secs(secs.max(1));
    log::info!("watch mode: refreshing every {}s", pause.as_secs());
    loop {
        pass()?;
        std::thread::sleep(pause);
    }
}

fn live_source() -> Result<YahooProvider> {
    let breaker = Arc::new(CircuitBreaker::default());
    YahooProvider::new(breaker).context("failed to build HTTP client")
}

fn run_scores(
    config: &AppConfig,
    out: &Path,
    out_csv: Option<&Path>,
    stdout: bool,
    pretty: bool,
    watch: Option<u64>,
) -> Result<()> {
    let provider = live_source()?;
    let mut cache = FetchCache::new();

    watch_loop(watch, || {
        let rows = compute_scores(&provider, &mut cache, &config.score);
        let mut sink = std::io::stdout().lock();
        output::emit_scores(&rows, out, out_csv, pretty, stdout, &mut sink)
    })
}

/// Where `rate` gets its rows. Live sources keep their cache across watch passes.
enum RowSource {
    Demo,
    Json(PathBuf),
    Live {
        provider: YahooProvider,
        cache: FetchCache,
    },
    Unavailable,
}

impl RowSource {
    fn live() -> Self {
        match live_source() {
            Ok(provider) => RowSource::Live {
                provider,
                cache: FetchCache::new(),
            },
            Err(e) => {
                eprintln!("Failed to compute live scores: {e:#}");
                RowSource::Unavailable
            }
        }
    }

    /// Rows for one pass. Read and parse failures are reported and yield no rows.
    fn load(&mut self, config: &AppConfig, filter: &[String]) -> Vec<SectorRow> {
        match self {
            RowSource::Demo => demo::demo_rows(&config.score.sectors, demo::DEMO_SEED),
            RowSource::Json(path) => match payload::load(path) {
                Ok(decoded) => decoded.filter_sectors(filter).rows,
                Err(e) => {
                    eprintln!("Failed to read JSON: {e}");
                    Vec::new()
                }
            },
            RowSource::Live { provider, cache } => {
                compute_scores(&*provider, cache, &config.score)
            }
            RowSource::Unavailable => Vec::new(),
        }
    }

    fn empty_message(&self) -> String {
        match self {
            RowSource::Json(path) => format!("No matching sectors in {}", path.display()),
            _ => "No data to display.".to_string(),
        }
    }
}

struct RateView {
    topk: usize,
    grid: bool,
    grid_cols: usize,
}

impl RateView {
    fn render(
        &self,
        rows: &[SectorRow],
        config: &AppConfig,
        bands: &mut BandState,
        source: &RowSource,
    ) {
        println!(
            "\nMarket Health  {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        if rows.is_empty() {
            println!("{}", source.empty_message());
            return;
        }

        if self.grid {
            let scores: Vec<(String, u32)> = rows
                .iter()
                .map(|r| (r.symbol.clone(), r.percent()))
                .collect();
            let (bounds, rated) = rating::rate(&scores, &config.rating, bands);
            println!("{}", render::bounds_line(config.rating.scheme, &bounds));
            print!("{}", render::grid(&rated, self.grid_cols));
        } else {
            print!("{}", render::overview(rows));
            print!("{}", render::details(rows, self.topk));
        }
    }
}
