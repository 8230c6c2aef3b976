use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use rand::{rngs::SmallRng, SeedableRng};
use tracing_subscriber::EnvFilter;

use cellblock::experiment::{analyze_cycles, run_experiment, ExperimentConfig};
use cellblock::search::Strategy;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "cellblock",
    about = "Monte Carlo simulation of the 100 prisoners problem."
)]
struct Cli {
    /// Number of prisoners (and boxes).
    #[arg(long, short = 'n', value_name = "COUNT", default_value_t = 100)]
    prisoners: usize,
    /// Number of simulated trials.
    #[arg(long, short, value_name = "COUNT", default_value_t = 10_000)]
    trials: usize,
    /// Search strategy the prisoners use.
    #[arg(long, short, value_enum, default_value_t = StrategyArg::Loop)]
    strategy: StrategyArg,
    /// Boxes each prisoner may open (defaults to half the boxes).
    #[arg(long, short, value_name = "COUNT")]
    budget: Option<usize>,
    /// Seed for the random source (drawn from entropy when omitted).
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Decompose one random assignment into cycles instead of simulating.
    #[arg(long)]
    cycles: bool,
    /// Increase log verbosity (-v shows per-prisoner failures, -vv the walks).
    #[arg(long, short, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
enum StrategyArg {
    /// Follow the slips, starting from your own number.
    Loop,
    /// Open boxes independently at random.
    Random,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Loop => Strategy::CycleFollowing,
            StrategyArg::Random => Strategy::RandomIndependent,
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut rng = match cli.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };

    if cli.cycles {
        let (perm, cycles) = analyze_cycles(cli.prisoners, &mut rng)?;
        println!("assignment: {perm}");
        println!("cycles:     {cycles}");
        println!(
            "{} cycles, longest {} of {} boxes",
            cycles.len(),
            cycles.longest_len(),
            perm.len()
        );
        return Ok(());
    }

    let config = ExperimentConfig::new(cli.prisoners, cli.trials, cli.strategy.into())
        .with_budget(cli.budget.unwrap_or(cli.prisoners / 2));
    let outcome = run_experiment(&config, &mut rng)?;

    println!(
        "In {:.2}% ({}/{}) of the simulations with strategy \"{}\", all {} prisoners found their box.",
        outcome.success_rate() * 100.0,
        outcome.successes,
        outcome.trials,
        config.strategy,
        config.prisoners,
    );
    Ok(())
}
