mod collect;
mod report;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::collect::CollectArgs;

#[derive(Debug, Parser)]
#[command(name = "chatpulse")]
#[command(about = "Live chat sentiment collector")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Poll a live chat feed, classify new messages and write a report
    Collect(CollectArgs),
    /// Classify a single message with the configured classifier
    Classify {
        /// Message text to classify
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = chatpulse_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(config.env.ansi_logs())
        .init();
    tracing::debug!(env = %config.env, "configuration loaded");

    match cli.command {
        Some(Commands::Collect(args)) => collect::run_collect(&config, &args).await?,
        Some(Commands::Classify { text }) => collect::run_classify(&config, &text).await?,
        None => println!("chatpulse: run `chatpulse collect --help` to start a collection"),
    }

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping collection");
}
