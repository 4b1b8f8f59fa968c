//! Signal Lab CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use signal_lab::cli::commands::{audit, config, known_config, repair, verify};
use signal_lab::cli::{handle_error, AppContext, Cli, Commands};
use signal_lab::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let ctx = match AppContext::load(cli.config.as_deref(), cli.driver) {
        Ok(ctx) => ctx,
        Err(err) => return handle_error(&err, cli.json),
    };

    // Dropping the guard flushes the file appender.
    let _logger = match LoggerImpl::init(&LogConfig::from(&ctx.config.logging)) {
        Ok(logger) => logger,
        Err(err) => return handle_error(&err, cli.json),
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    debug!(command = ?cli.command, "dispatching");
    let result = match cli.command {
        Commands::Verify(args) => verify::execute(args, ctx, &cancel, cli.json).await,
        Commands::Audit(args) => audit::execute(args, ctx, &cancel, cli.json).await,
        Commands::Repair(args) => repair::execute(args, ctx, cli.json).await,
        Commands::KnownConfig(args) => known_config::execute(args, &ctx, cli.json),
        Commands::Config(args) => config::execute(args, ctx, cli.json),
    };

    result.unwrap_or_else(|err| handle_error(&err, cli.json))
}
