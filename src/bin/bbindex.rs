//! Blackboard index command line tool
//!
//! Small driver around the library for inspecting index behaviour:
//! - hashing variable names
//! - loading a list of names and printing occupancy
//! - churning the index with add/remove rounds
//!
//! # Examples
//!
//! ```bash
//! bbindex hash Vehicle.Speed Engine.Rpm
//! bbindex load signals.txt --json
//! bbindex --config index.toml churn --count 5000 --rounds 10
//! ```

use anyhow::Context;
use bbindex::{hash_name, IndexConfig, IndexStats, Registration, VariableRegistry};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Blackboard hash index tool
#[derive(Parser, Debug)]
#[command(name = "bbindex")]
#[command(version = bbindex::VERSION)]
#[command(about = "Inspect and exercise the blackboard hash index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Index config file (TOML)
    #[arg(long, global = true, env = "BBINDEX_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Also write logs to daily rolling files in this directory
    #[arg(long, global = true, env = "BBINDEX_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the hash of each name
    Hash {
        /// Variable names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Register every non-empty line of a file
    Load(LoadArgs),

    /// Add and remove names repeatedly, checking invariants each round
    Churn(ChurnArgs),

    /// Show version
    Version,
}

#[derive(Args, Debug)]
struct LoadArgs {
    /// File with one variable name per line
    file: PathBuf,

    /// Print stats as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ChurnArgs {
    /// Names registered per round
    #[arg(long, default_value = "1000")]
    count: usize,

    /// Number of rounds
    #[arg(long, default_value = "10")]
    rounds: usize,

    /// Print final stats as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli)?;

    match cli.command {
        Commands::Hash { names } => {
            for name in names {
                println!("{:>20}  {}", hash_name(&name), name);
            }
            Ok(())
        }
        Commands::Load(args) => load_command(load_config(cli.config.as_deref())?, args),
        Commands::Churn(args) => churn_command(load_config(cli.config.as_deref())?, args),
        Commands::Version => {
            println!("bbindex {}", bbindex::VERSION);
            Ok(())
        }
    }
}

/// Console logging plus an optional rolling file
fn setup_logging(cli: &Cli) -> anyhow::Result<()> {
    let file_layer = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log dir {}", dir.display()))?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "bbindex.log");
            Some(fmt::layer().with_writer(appender).with_ansi(false))
        }
        None => None,
    };

    let log_level = cli
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color),
        )
        .with(file_layer)
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<IndexConfig> {
    let config = match path {
        Some(path) => IndexConfig::from_file(path)?.overridden_from_env(),
        None => IndexConfig::from_env(),
    };
    config.validate()?;
    debug!(?config, "Loaded index config");
    Ok(config)
}

fn load_command(config: IndexConfig, args: LoadArgs) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let mut registry = VariableRegistry::new(config)?;

    let (mut created, mut existing, mut rejected) = (0usize, 0usize, 0usize);
    for name in source.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match registry.add(name)? {
            Registration::Created(_) => created += 1,
            Registration::Existing(_) => existing += 1,
            Registration::TableFull => rejected += 1,
        }
    }
    registry.check_invariants()?;

    info!(created, existing, rejected, "Loaded {}", args.file.display());
    if rejected > 0 {
        warn!(rejected, "Names rejected, slot table is full");
    }
    print_stats(&registry.stats(), args.json)
}

fn churn_command(config: IndexConfig, args: ChurnArgs) -> anyhow::Result<()> {
    let mut registry = VariableRegistry::new(config)?;

    for round in 0..args.rounds {
        for i in 0..args.count {
            let name = format!("var_{}", i);
            if registry.add(&name)? == Registration::TableFull {
                warn!(round, "Slot table full after {} names", registry.len());
                break;
            }
        }
        // Every other name goes, alternating which half by round
        for i in (round % 2..args.count).step_by(2) {
            registry.remove(&format!("var_{}", i))?;
        }
        registry
            .check_invariants()
            .with_context(|| format!("Invariant violated in round {}", round))?;

        let stats = registry.stats();
        info!(
            round,
            entries = stats.entries,
            blocks = stats.blocks,
            max_block_len = stats.max_block_len,
            "Churn round done"
        );
    }

    print_stats(&registry.stats(), args.json)
}

fn print_stats(stats: &IndexStats, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
    } else {
        println!("entries:      {}", stats.entries);
        println!("blocks:       {}", stats.blocks);
        println!(
            "block len:    {}..={} (capacity {})",
            stats.min_block_len, stats.max_block_len, stats.block_capacity
        );
        println!(
            "slots:        {} used, {} free of {}",
            stats.used_slots, stats.free_slots, stats.capacity
        );
    }
    Ok(())
}
