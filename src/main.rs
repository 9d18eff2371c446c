use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use short_track_scrobbler::config::Config;
use short_track_scrobbler::engine::ScrobblePolicy;
use short_track_scrobbler::host::script::SessionScript;
use short_track_scrobbler::replay::{self, JsonLinesInvoker};
use short_track_scrobbler::threshold::{self, ThresholdResolver};

#[derive(Parser)]
#[command(name = "short-track-scrobbler", version, about = "Scrobble tracks shorter than 30 seconds")]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the threshold currently in effect
    Threshold {
        /// Host API revision to resolve the default for
        #[arg(long, default_value_t = threshold::API_REVISION_BOUNDARY + 1)]
        api_revision: i32,
    },
    /// Store a threshold override in milliseconds
    SetThreshold { milliseconds: String },
    /// Remove the threshold override
    ResetThreshold {
        #[arg(long, default_value_t = threshold::API_REVISION_BOUNDARY + 1)]
        api_revision: i32,
    },
    /// Replay a recorded host session, printing each submission as JSON
    Replay {
        session: PathBuf,

        /// Override the configured policy
        #[arg(long, value_enum)]
        policy: Option<ScrobblePolicy>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let style = if atty::is(atty::Stream::Stderr) {
        env_logger::WriteStyle::Auto
    } else {
        env_logger::WriteStyle::Never
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .write_style(style)
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    let mut config = Config::load_from(&config_path)?;

    match cli.command {
        Command::Threshold { api_revision } => {
            let resolver = ThresholdResolver::new(&config.user_threshold, api_revision);
            println!("{}", resolver.resolve());
        }
        Command::SetThreshold { milliseconds } => {
            config.set_user_threshold(&milliseconds)?;
            config.save_to(&config_path)?;
            println!("Threshold set to {}ms", config.user_threshold);
        }
        Command::ResetThreshold { api_revision } => {
            config.reset_user_threshold();
            config.save_to(&config_path)?;
            println!(
                "Threshold reset to default ({}ms)",
                threshold::default_for(api_revision)
            );
        }
        Command::Replay { session, policy } => {
            if let Some(policy) = policy {
                config.policy = policy;
            }
            let script = SessionScript::load(&session)?;
            let summary = replay::replay(&script, config, Arc::new(JsonLinesInvoker::stdout()))?;

            log::info!(
                "{} events, {} submissions ({} tracks), {} dropped",
                summary.events,
                summary.submissions,
                summary.tracks,
                summary.dropped
            );
            if let Some(e) = summary.resolver_error {
                anyhow::bail!("API call could not be resolved: {}", e);
            }
        }
    }

    Ok(())
}
