// The tether CLI.
// You can check a problem file, or search for proofs of its obligations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use tether::problem::Problem;
use tether::prover::{Outcome, ProverConfig};
use tether::theorem::TheoremLibrary;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(
    name = "tether",
    about = "An automated prover for verification conditions",
    long_about = "Tether searches for proofs of verification conditions by rewriting with theorems.\n\nYou can:\n- Check that a problem file is well formed\n- Search for proofs of its obligations",
    version = env!("CARGO_PKG_VERSION")
)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search for proofs of the obligations in a problem file.
    /// Ctrl-C stops the current search and skips the remaining obligations.
    Prove {
        #[clap(value_name = "FILE", help = "The JSON problem file.")]
        file: PathBuf,

        /// Only prove the obligation with this name
        #[clap(long, help = "Only prove the obligation with this name.", value_name = "NAME")]
        obligation: Option<String>,

        #[clap(long, help = "How deep the main search may recurse.", value_name = "N")]
        max_tether: Option<usize>,

        #[clap(long, help = "Stop after this many heartbeats.", value_name = "N")]
        max_heartbeats: Option<u64>,

        #[clap(long, help = "Stop after this many applications.", value_name = "N")]
        max_applications: Option<usize>,

        #[clap(
            long,
            help = "Timeout in seconds for each proof search.",
            value_name = "SECONDS"
        )]
        timeout: Option<f32>,

        #[clap(long, help = "Allow the search to revisit states on the same branch.")]
        no_cycle_detection: bool,

        #[clap(long, help = "Don't shrink the goal before searching.")]
        no_minimize: bool,

        #[clap(long, help = "Print reports as JSON.")]
        json: bool,
    },

    /// Check that a problem file parses and its theorems compile
    Check {
        #[clap(value_name = "FILE", help = "The JSON problem file.")]
        file: PathBuf,
    },
}

fn load(file: &Path) -> (Problem, Arc<TheoremLibrary>) {
    let problem = Problem::load(file).unwrap_or_else(|e| {
        println!("Error loading problem: {}", e);
        std::process::exit(1);
    });
    let library = problem.library().unwrap_or_else(|e| {
        println!("Error compiling theorems: {}", e);
        std::process::exit(1);
    });
    (problem, Arc::new(library))
}

#[tokio::main]
async fn main() {
    // Use RUST_LOG env var to control log levels, e.g.:
    //   RUST_LOG=tether::prover=debug tether prove problem.json
    //   RUST_LOG=tether::automator=trace tether prove problem.json
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).without_time())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    match args.command {
        Command::Check { file } => {
            let (problem, library) = load(&file);
            let mut failed = false;
            for obligation in &problem.obligations {
                if let Err(e) = Problem::proof_state(obligation, library.clone()) {
                    println!("{}", e);
                    failed = true;
                }
            }
            println!(
                "{} theorems ({} transformations), {} obligations",
                library.theorems().len(),
                library.transformations().len(),
                problem.obligations.len()
            );
            if failed {
                std::process::exit(1);
            }
        }

        Command::Prove {
            file,
            obligation,
            max_tether,
            max_heartbeats,
            max_applications,
            timeout,
            no_cycle_detection,
            no_minimize,
            json,
        } => {
            let (problem, library) = load(&file);
            let defaults = ProverConfig::default();
            let config = ProverConfig {
                max_tether: max_tether.unwrap_or(defaults.max_tether),
                max_heartbeats,
                max_applications,
                timeout_secs: timeout,
                cycle_detection: !no_cycle_detection,
                minimize: !no_minimize,
                ..defaults
            };

            let obligations: Vec<_> = match &obligation {
                Some(name) => match problem.obligation(name) {
                    Some(o) => vec![o.clone()],
                    None => {
                        println!("No obligation named {}", name);
                        std::process::exit(1);
                    }
                },
                None => problem.obligations.clone(),
            };
            let obligations_count = obligations.len();

            let token = CancellationToken::new();
            let worker_token = token.clone();

            // The prover isn't Send, so the searches run on a blocking thread.
            let mut search = tokio::task::spawn_blocking(move || {
                Problem::prove_obligations(&obligations, library, &config, &worker_token, |report| {
                    if !json {
                        print!("{}", report);
                    }
                })
            });

            let result = tokio::select! {
                result = &mut search => result,
                _ = tokio::signal::ctrl_c() => {
                    token.cancel();
                    search.await
                }
            };

            let reports = match result {
                Ok(Ok(reports)) => reports,
                Ok(Err(e)) => {
                    println!("Error: {}", e);
                    std::process::exit(1);
                }
                Err(e) => {
                    println!("Search panicked: {}", e);
                    std::process::exit(1);
                }
            };
            let all_proved = reports.len() == obligations_count
                && reports.iter().all(|r| r.outcome == Outcome::Proved);

            if json {
                match serde_json::to_string_pretty(&reports) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        println!("Error serializing reports: {}", e);
                        std::process::exit(1);
                    }
                }
            }
            if !all_proved {
                std::process::exit(1);
            }
        }
    }
}
