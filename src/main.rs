//! callbatch - boundary call batching benchmark

use std::path::PathBuf;
use std::process;

use callbatch::batch::FlushMode;
use callbatch::boundary::BoundaryKind;
use callbatch::config::RunConfig;
use callbatch::harness;
use clap::{ArgAction, Parser};
use tracing::Level;

/// Compare one boundary crossing per call against batched crossings
#[derive(Debug, Parser)]
#[command(name = "callbatch", version, about)]
struct Cli {
    /// Number of function calls per batch
    #[arg(long = "bs", value_name = "N")]
    batch_size: Option<usize>,

    /// Number of placeholder arguments per call
    #[arg(long = "args", value_name = "N")]
    arg_count: Option<usize>,

    /// Number of calls to perform with each strategy
    #[arg(long = "calls", value_name = "N")]
    call_count: Option<u64>,

    /// When to flush: threshold or modulo
    #[arg(long, value_name = "MODE")]
    flush_mode: Option<FlushMode>,

    /// Boundary to cross: thread (default) or native
    #[arg(long, value_name = "KIND")]
    boundary: Option<BoundaryKind>,

    /// TOML file with run parameters (flags override it)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn run_config(&self) -> Result<RunConfig, callbatch::ConfigError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };

        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(arg_count) = self.arg_count {
            config.arg_count = arg_count;
        }
        if let Some(call_count) = self.call_count {
            config.call_count = call_count;
        }
        if let Some(flush_mode) = self.flush_mode {
            config.flush_mode = flush_mode;
        }
        if let Some(boundary) = self.boundary {
            config.boundary = boundary;
        }
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match cli.run_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: configuration: {}", e);
            process::exit(1);
        }
    };

    match harness::run(&config) {
        Ok(report) => println!("{}", report),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
