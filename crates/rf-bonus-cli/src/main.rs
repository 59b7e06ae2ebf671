//! Bonus board command line driver
//!
//! Usage:
//!   rf-bonus play [--seed N] [--turbo] [--json]   - Play one round step by step
//!   rf-bonus simulate --rounds N [--seed N]        - Batch rounds, print stats
//!   rf-bonus autoplay [--pacing-ms N]              - Autoplay one round on a thread
//!   rf-bonus config                                - Print the default config

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rf_bonus_board::{
    BonusConfig, BonusSession, EffectRecord, Presenter, RoundSnapshot, SessionStats,
    SpinOrchestrator, Symbol,
};

#[derive(Parser)]
#[command(name = "rf-bonus", about = "Cascading bonus board engine")]
struct Cli {
    /// Config file (JSON); defaults apply to missing fields
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one round step by step
    Play {
        /// RNG seed
        #[arg(short, long)]
        seed: Option<u64>,
        /// Use turbo timing
        #[arg(short, long)]
        turbo: bool,
        /// Print each step report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Play many rounds and print aggregate stats
    Simulate {
        /// Number of rounds
        #[arg(short, long, default_value_t = 1000)]
        rounds: u64,
        /// RNG seed
        #[arg(short, long)]
        seed: Option<u64>,
        /// Print stats as JSON
        #[arg(long)]
        json: bool,
    },
    /// Autoplay one round on a background thread
    Autoplay {
        /// RNG seed
        #[arg(short, long)]
        seed: Option<u64>,
        /// Delay between steps (default: timing profile)
        #[arg(long)]
        pacing_ms: Option<u64>,
    },
    /// Print the effective config as JSON
    Config,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Play { seed, turbo, json } => play(config, seed, turbo, json),
        Commands::Simulate { rounds, seed, json } => simulate(config, rounds, seed, json),
        Commands::Autoplay { seed, pacing_ms } => autoplay(config, seed, pacing_ms),
        Commands::Config => {
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<BonusConfig> {
    let Some(path) = path else {
        log::debug!("No config file, using defaults");
        return Ok(BonusConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = BonusConfig::from_json(&json)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    log::info!(
        "Loaded config {} ({}x{} board, respin base {})",
        path.display(),
        config.cols,
        config.max_rows,
        config.respin_base
    );
    Ok(config)
}

fn orchestrator(config: BonusConfig, seed: Option<u64>) -> Result<SpinOrchestrator> {
    let mut orch = SpinOrchestrator::with_config(config).context("Failed to create engine")?;
    if let Some(seed) = seed {
        log::info!("Seeding engine with {seed}");
        orch.seed(seed);
    }
    Ok(orch)
}

/// Prints effects as they are replayed
struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn on_effect(&mut self, record: &EffectRecord) {
        println!(
            "  [{:>7.0} ms] {:?}  (total {}, respins {}, rows {})",
            record.timestamp_ms,
            record.effect,
            record.state.total,
            record.state.respins,
            record.state.rows
        );
    }
}

fn play(config: BonusConfig, seed: Option<u64>, turbo: bool, json: bool) -> Result<()> {
    let mut orch = orchestrator(config, seed)?;
    orch.set_turbo(turbo);
    orch.start_bonus()?;

    loop {
        let report = if json {
            let report = orch.spin_step()?;
            println!("{}", serde_json::to_string(&report)?);
            report
        } else {
            println!("Step {}:", orch.steps() + 1);
            let report = orch.spin_step_with(&mut ConsolePresenter)?;
            print_grid(&orch.snapshot());
            report
        };

        if let Some(outcome) = report.outcome {
            if !json {
                println!(
                    "Round over ({:?}) after {} steps: total {} = {:.2}{}",
                    outcome.reason,
                    outcome.steps,
                    outcome.total,
                    outcome.win_amount,
                    if outcome.big_win { "  BIG WIN" } else { "" }
                );
            }
            return Ok(());
        }
    }
}

fn print_grid(snapshot: &RoundSnapshot) {
    for row in &snapshot.grid {
        let cells: Vec<String> = row.iter().map(cell_label).collect();
        println!("  | {} |", cells.join(" "));
    }
    println!(
        "  total {}  respins {}  rows {}",
        snapshot.total, snapshot.state.respins, snapshot.rows
    );
}

fn cell_label(cell: &Option<Symbol>) -> String {
    let Some(symbol) = cell else {
        return format!("{:>5}", ".");
    };
    let label = match symbol {
        Symbol::Coin { value } => value.to_string(),
        Symbol::Collector { .. } => "COL".into(),
        Symbol::Payer { value, .. } => format!("P{value}"),
        Symbol::ComboCp { .. } => "CP".into(),
        Symbol::Sniper { .. } => "SNP".into(),
        Symbol::Necromancer => "NEC".into(),
        Symbol::Unlock => "UNL".into(),
        Symbol::ArmsDealer { .. } => "ARM".into(),
        Symbol::Upgrader => "UPG".into(),
        Symbol::ResetPlus => "R+".into(),
    };
    let mark = if symbol.is_persistent() { "*" } else { "" };
    format!("{:>5}", format!("{label}{mark}"))
}

fn simulate(config: BonusConfig, rounds: u64, seed: Option<u64>, json: bool) -> Result<()> {
    if rounds == 0 {
        bail!("--rounds must be > 0");
    }
    let mut orch = orchestrator(config, seed)?;
    let mut stats = SessionStats::default();

    log::info!("Simulating {rounds} rounds");
    for round in 0..rounds {
        let report = orch
            .play_round()
            .with_context(|| format!("Round {round} failed"))?;
        stats.record(&report);
        log::debug!("Round {round}: {:?}, total {}", report.reason, report.total);
    }
    log::info!(
        "Simulation done: {} rounds, average win {:.2}",
        stats.rounds,
        stats.average_win()
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Rounds:        {}", stats.rounds);
        println!("Average win:   {:.2}", stats.average_win());
        println!("Best total:    {}", stats.best_total);
        println!("Big wins:      {}", stats.big_wins);
        println!(
            "Max wins:      {} ({:.3}%)",
            stats.max_win_hits,
            stats.max_win_rate()
        );
        println!("Average rows:  {:.2}", stats.average_rows());
        println!(
            "Average steps: {:.2}",
            stats.total_steps as f64 / stats.rounds as f64
        );
    }
    Ok(())
}

fn autoplay(config: BonusConfig, seed: Option<u64>, pacing_ms: Option<u64>) -> Result<()> {
    let session = BonusSession::new(orchestrator(config, seed)?);
    log::info!("Starting autoplay (pacing {pacing_ms:?} ms)");
    let handle = session.spawn_autoplay(pacing_ms.map(Duration::from_millis));

    let outcome = match handle.join() {
        Ok(result) => result?,
        Err(_) => bail!("Autoplay thread panicked"),
    };
    log::info!("Autoplay returned after {} steps", session.total_steps());

    match outcome {
        Some(report) => println!(
            "Autoplay finished ({:?}) after {} steps: total {} = {:.2}",
            report.reason, report.steps, report.total, report.win_amount
        ),
        None => println!("Autoplay stopped"),
    }
    print_grid(&session.snapshot());
    Ok(())
}
