//! Footprint ledger operator binary entry point.

mod cli;

use base_consistency::{
    ConsistencyArgs, ConsistencyConfig, FileLedger, FootprintManager, is_valid_footprint,
};
use clap::Parser;
use eyre::{OptionExt, bail};
use tracing::info;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

use crate::cli::{Cli, Commands};

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    match cli.command {
        Commands::Validate { footprint } => {
            if !is_valid_footprint(&footprint) {
                bail!("invalid footprint: expected empty or 64 hex digits, optionally 0x-prefixed");
            }
            println!("valid");
        }
        Commands::Stats => {
            let manager = open_manager(cli.consistency)?;
            println!("{}", serde_json::to_string_pretty(&manager.stats())?);
        }
        Commands::Check { tx_hash } => {
            let manager = open_manager(cli.consistency)?;
            let status = if manager.is_known_mismatch(&tx_hash) { "known" } else { "unknown" };
            println!("{tx_hash:#x} {status}");
        }
        Commands::Record { tx_hash } => {
            let manager = open_manager(cli.consistency)?;
            manager.record_mismatch(tx_hash)?;
            println!("{tx_hash:#x} recorded");
        }
    }

    Ok(())
}

fn open_manager(args: ConsistencyArgs) -> eyre::Result<FootprintManager> {
    let config = ConsistencyConfig::from(args);
    let data_dir = config.data_dir.ok_or_eyre("--datadir is required for ledger commands")?;
    let ledger = FileLedger::in_dir(&data_dir);
    info!(path = %ledger.path().display(), "Opening footprint mismatch ledger");
    Ok(FootprintManager::new(config.footprint, ledger))
}

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(cli.log_level).into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if cli.log_json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}
