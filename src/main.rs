use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::net::SocketAddr;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use drawdown_mc::api::{self, ApiState};
use drawdown_mc::engine::{resolve_seed, run_batch};
use drawdown_mc::export::write_batch_csv_file;
use drawdown_mc::simulation::Progress;
use drawdown_mc::{
    suggest, validate, ExecutionMode, Histogram, RiskError, RiskInput, RiskParameters,
    SimulationBatch, SimulationConfig,
};

#[derive(Parser, Debug)]
#[command(name = "drawdown-mc")]
#[command(author, version, about = "Monte Carlo drawdown simulation and risk-per-trade sizing")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Print verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(ClapArgs, Debug, Clone)]
struct RunSettings {
    /// Base seed for reproducible runs (random if omitted)
    #[arg(long, env = "DRAWDOWN_MC_SEED")]
    seed: Option<u64>,

    /// Trial execution: parallel or sequential
    #[arg(long, env = "DRAWDOWN_MC_MODE", default_value = "parallel")]
    mode: ExecutionMode,

    /// Trials per chunk between progress updates
    #[arg(long, env = "DRAWDOWN_MC_CHUNK_SIZE", default_value = "1000")]
    chunk_size: usize,

    /// Histogram bins for the drawdown distribution
    #[arg(long, default_value = "50")]
    bins: usize,
}

impl RunSettings {
    fn config(&self) -> SimulationConfig {
        SimulationConfig {
            seed: self.seed,
            mode: self.mode,
            chunk_size: self.chunk_size,
            histogram_bins: self.bins,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate trade sequences and print a risk suggestion
    Simulate {
        /// Win rate in percent (0-100)
        #[arg(short, long)]
        win_rate: f64,

        /// Reward ratio: winner size as a multiple of the 1R loss
        #[arg(short, long, default_value = "1.0")]
        reward_ratio: f64,

        /// Trades per simulated sequence
        #[arg(short, long, default_value = "100")]
        n_trades: i64,

        /// Number of simulated sequences
        #[arg(short = 's', long, default_value = "10000")]
        n_sim: i64,

        /// Max tolerated drawdown in percent of equity (0-100]
        #[arg(short = 'd', long, default_value = "20.0")]
        max_dd_limit: f64,

        /// Write per-trial statistics to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print the summary as JSON instead of a table
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        settings: RunSettings,
    },

    /// Serve the JSON API
    Serve {
        /// Port to run the web server on
        #[arg(short, long, env = "PORT", default_value = "3000")]
        port: u16,

        /// Per-request simulation timeout in seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,

        /// Largest accepted n_sim * n_trades per request
        #[arg(long, env = "DRAWDOWN_MC_MAX_WORK", default_value_t = api::DEFAULT_MAX_WORK)]
        max_work: u64,

        #[command(flatten)]
        settings: RunSettings,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = if args.verbose { "drawdown_mc=debug" } else { "drawdown_mc=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Commands::Simulate {
            win_rate,
            reward_ratio,
            n_trades,
            n_sim,
            max_dd_limit,
            csv,
            json,
            settings,
        } => {
            let input = RiskInput {
                win_rate_pct: win_rate,
                reward_ratio,
                n_trades,
                n_sim,
                max_dd_limit_pct: max_dd_limit,
            };
            run_simulate(&input, &settings.config(), csv, json)
        }
        Commands::Serve {
            port,
            timeout_secs,
            max_work,
            settings,
        } => run_serve(port, timeout_secs, max_work, settings.config()).await,
    }
}

fn run_simulate(
    input: &RiskInput,
    config: &SimulationConfig,
    csv: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let params = validate(input).context("Invalid simulation parameters")?;
    let seed = resolve_seed(config)?;

    let start = Instant::now();
    let batch = run_batch(&params, config, seed, |p: Progress| {
        let elapsed = start.elapsed().as_secs_f64();
        let rate = p.completed as f64 / elapsed.max(f64::EPSILON);
        let eta = (p.total - p.completed) as f64 / rate;
        eprint!("\r[{}/{}] {:.0} trials/s, ETA: {:.0}s       ", p.completed, p.total, rate, eta);
        ControlFlow::Continue(())
    })?;
    eprintln!();

    if let Some(path) = csv {
        write_batch_csv_file(&batch, &path)?;
    }

    let summary = match suggest(params.max_dd_limit(), batch.max_dds()) {
        Ok(summary) => Some(summary),
        Err(RiskError::DegenerateRisk {
            statistic,
            max_dd_max,
            risk_suggestion_worst_pct,
        }) => {
            info!("No risk suggestion: {} drawdown is zero", statistic);
            if let Some(worst_pct) = risk_suggestion_worst_pct {
                info!("Worst max DD {:.2}R -> worst-case risk {:.3}%", max_dd_max, worst_pct);
            }
            None
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        let out = serde_json::json!({
            "seed": seed,
            "parameters": params,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_report(&params, seed, &batch, summary.as_ref());

    let histogram = Histogram::from_samples(batch.max_dds(), config.histogram_bins)?;
    print_histogram(&histogram);
    Ok(())
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

fn print_report(
    params: &RiskParameters,
    seed: u64,
    batch: &SimulationBatch,
    summary: Option<&drawdown_mc::RiskSummary>,
) {
    println!("\n{}", "=".repeat(60));
    println!("MONTE CARLO DRAWDOWN SIMULATION");
    println!("{}", "=".repeat(60));
    println!("Win Rate: {:.1}% | Reward Ratio: {:.2}R", params.win_rate() * 100.0, params.reward_ratio());
    println!("Trades: {} | Simulations: {} | Seed: {}", params.n_trades(), params.n_sim(), seed);
    println!("Max DD limit: {:.1}%", params.max_dd_limit() * 100.0);
    println!();
    println!("DISTRIBUTION ({} runs):", batch.len());
    println!("{}", "-".repeat(40));

    let worst_streak = batch.max_streaks().iter().copied().max().unwrap_or(0);
    println!("  Avg max drawdown:   {:.2}R", mean(batch.max_dds().iter().copied()));
    println!("  Avg loss streak:    {:.1}", mean(batch.max_streaks().iter().map(|&s| s as f64)));
    println!("  Worst loss streak:  {}", worst_streak);
    println!("  Avg total profit:   {:+.2}R", mean(batch.total_profits().iter().copied()));
    println!("  Avg winner:         {:.2}R", mean(batch.avg_winners().iter().copied()));
    println!("  Avg loser:          {:.2}R", mean(batch.avg_losers().iter().copied()));
    println!();

    match summary {
        Some(s) => {
            println!("RISK SUGGESTION:");
            println!("{}", "-".repeat(40));
            println!("  95th percentile max DD: {:.2}R", s.perc95_max_dd);
            println!("  Worst max DD:           {:.2}R", s.max_dd_max);
            println!("  Risk per trade (p95):   {:.3}%", s.risk_suggestion_pct);
            println!("  Risk per trade (worst): {:.3}%", s.risk_suggestion_worst_pct);
        }
        None => {
            println!("RISK SUGGESTION: undefined (no simulated drawdown)");
        }
    }
}

fn print_histogram(histogram: &Histogram) {
    const WIDTH: usize = 40;
    let peak = histogram.mode().map(|b| b.count).unwrap_or(0).max(1);

    println!("\nMAX DRAWDOWN HISTOGRAM (R):");
    println!("{}", "-".repeat(60));
    for bin in histogram.bins.iter().filter(|b| b.count > 0) {
        let bar = "#".repeat((bin.count * WIDTH).div_ceil(peak));
        println!("  {:>7.2} - {:<7.2} {:>7} {}", bin.lower, bin.upper, bin.count, bar);
    }
}

async fn run_serve(
    port: u16,
    timeout_secs: u64,
    max_work: u64,
    config: SimulationConfig,
) -> Result<()> {
    let state = Arc::new(ApiState {
        config,
        timeout: Duration::from_secs(timeout_secs),
        max_work,
    });

    let app = api::router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
