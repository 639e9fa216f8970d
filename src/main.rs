use std::io;

use clap::Parser;
use form_autofill::cli::commands::{
    cmd_detect, cmd_fill, cmd_highlight, cmd_mappings, cmd_replay, cmd_serve, cmd_sync_profiles,
    load_profile,
};
use form_autofill::cli::config::{Cli, Commands, load_config, resolve_store_path};
use form_autofill::mapping::profile::UserProfile;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref())?;
    let trace = cli.trace.as_deref();

    match cli.command {
        Commands::Detect { page } => cmd_detect(&page, &config)?,
        Commands::Fill {
            page,
            profile,
            csv,
            row,
            output,
            json,
        } => {
            let profile = match (profile, csv) {
                (Some(path), _) => load_profile(&path)?,
                (None, Some(path)) => UserProfile::from_csv(std::fs::File::open(path)?, row)?,
                (None, None) => return Err("either --profile or --csv is required".into()),
            };
            if !cmd_fill(&page, profile, output.as_deref(), json, &config)? {
                std::process::exit(1);
            }
        }
        Commands::Highlight {
            page,
            profile,
            output,
        } => cmd_highlight(&page, &profile, output.as_deref(), &config)?,
        Commands::Mappings => cmd_mappings(&config)?,
        Commands::Replay { scenario } => {
            let all_passed = cmd_replay(&scenario, &config, trace, cli.verbose)?;
            if !all_passed {
                std::process::exit(1);
            }
        }
        Commands::Serve { page, store } => {
            let store_path = resolve_store_path(store.as_deref(), &config);
            let stdin = io::stdin();
            cmd_serve(&page, &store_path, &config, trace, stdin.lock(), io::stdout())?;
        }
        Commands::SyncProfiles { endpoint, store } => {
            let endpoint = endpoint
                .or_else(|| config.storage.profiles_endpoint.clone())
                .ok_or("no profile endpoint given (--endpoint or storage.profiles_endpoint)")?;
            let store_path = resolve_store_path(store.as_deref(), &config);
            cmd_sync_profiles(&endpoint, &store_path)?;
        }
    }

    Ok(())
}
