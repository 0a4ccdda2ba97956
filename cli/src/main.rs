//! Thin external driver for the payment operations agent.
//!
//! Reads newline-delimited JSON [`Transaction`] records from a file or
//! stdin, feeds them into an [`Engine`], and runs one or more cycles,
//! printing each [`CycleReport`] as JSON to stdout. All agent logic lives
//! in `payment-agent-core`; this binary owns only I/O and cadence — the
//! sleep-loop driving `run_continuous` in the original belongs here, not
//! in the core.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use clap::Parser;
use payment_agent_core::{EngineConfig, ProductionEngine, Transaction};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "payment-agent")]
#[command(about = "Runs the payment operations agent over a batch of transactions")]
struct Args {
    /// Newline-delimited JSON transaction file. Reads stdin when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Sliding observation window, in minutes.
    #[arg(long, default_value_t = 10)]
    window_minutes: i64,

    /// Number of cycles to run after ingestion.
    #[arg(long, default_value_t = 1)]
    cycles: u32,

    /// Seconds to sleep between cycles (0 runs them back to back).
    #[arg(long, default_value_t = 0)]
    interval_seconds: u64,

    /// Require explicit approval before low-risk actions auto-execute.
    #[arg(long, default_value_t = false)]
    no_auto_approve: bool,
}

fn read_transactions(input: Option<&PathBuf>) -> io::Result<Vec<Transaction>> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Box::new(io::Cursor::new(buf))
        }
    };

    let mut transactions = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Transaction>(&line) {
            Ok(txn) => transactions.push(txn),
            Err(err) => {
                tracing::warn!(line = lineno + 1, error = %err, "skipping malformed transaction record");
            }
        }
    }
    Ok(transactions)
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let transactions = read_transactions(args.input.as_ref())?;
    tracing::info!(count = transactions.len(), "loaded transactions");

    let config = EngineConfig {
        window_size_minutes: args.window_minutes,
        auto_approve_low_risk: !args.no_auto_approve,
        ..EngineConfig::default()
    };
    let mut engine = ProductionEngine::production(config);

    for txn in transactions {
        if let Err(err) = engine.ingest(txn) {
            tracing::warn!(error = %err, "rejected transaction at ingestion boundary");
        }
    }

    for i in 0..args.cycles {
        let report = engine.run_cycle();
        println!("{}", serde_json::to_string_pretty(&report).expect("CycleReport always serializes"));

        if i + 1 < args.cycles && args.interval_seconds > 0 {
            std::thread::sleep(StdDuration::from_secs(args.interval_seconds));
        }
    }

    Ok(())
}
