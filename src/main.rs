//! Bank Ledger CLI
//!
//! Command-line interface for applying ledger operations from CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --accounts accounts.csv operations.csv > balances.csv
//! cargo run -- --accounts accounts.csv --strategy sync operations.csv > balances.csv
//! cargo run -- --accounts accounts.csv --journal journal.csv operations.csv > balances.csv
//! cargo run -- --accounts accounts.csv --config ledger.toml --batch-size 2000 operations.csv
//! ```
//!
//! Final balances go to stdout. Logs go to stderr; set `RUST_LOG` or
//! `LEDGER_LOG` to change verbosity.
//!
//! # Processing Strategies
//!
//! - **sync**: Operations run one at a time on the main thread
//! - **async**: Batches split into independent account groups run in parallel (default)
//!
//! # Exit Codes
//!
//! - 0: Success, including runs where some operations were rejected
//! - 1: Error (missing arguments, unreadable file, invalid configuration, etc.)

use bank_ledger::cli;
use bank_ledger::observability;
use bank_ledger::strategy;
use std::process;
use tracing::{error, info};

fn main() {
    let args = cli::parse_args();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    observability::init(&config.log_filter);

    let strategy = {
        let batch_config = match args.strategy {
            cli::StrategyType::Async => Some(args.to_batch_config(&config.batch)),
            cli::StrategyType::Sync => None,
        };
        strategy::create_strategy(args.strategy, batch_config)
    };

    let inputs = args.to_inputs(config);
    let mut output = std::io::stdout();
    match strategy.process(&inputs, &mut output) {
        Ok(summary) => info!(
            completed = summary.completed,
            rejected = summary.rejected,
            rolled_back = summary.rolled_back,
            malformed = summary.malformed,
            "run finished"
        ),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
