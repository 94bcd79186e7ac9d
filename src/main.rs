use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use dmdrip::cli::Cli;
use dmdrip::config::{Config, RunSettings};
use dmdrip::discord::{RestGateway, RestGatewayConfig};
use dmdrip::pacer::{Pacer, PacerReport, StopReason, StopToken};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    Ok(())
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

async fn run_application(cli: &Cli, config: &Config) -> Result<ExitCode> {
    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let settings = RunSettings::resolve(cli, config)?;

    let gateway = Arc::new(RestGateway::new(
        settings.token.clone(),
        RestGatewayConfig::default(),
    )?);

    let bot_tag = gateway
        .current_user_tag()
        .await
        .context("Login failed")?;
    println!("Logged in as {}", bot_tag.green());
    println!("Target user ID: {}", settings.target);
    println!(
        "Base delay: {} ms. Press Ctrl+C to stop.\n",
        settings.pacer.base_delay.as_millis()
    );

    let stop = StopToken::new();
    tokio::spawn({
        let stop = stop.clone();
        async move {
            shutdown_signal().await;
            if stop.trigger() {
                println!(
                    "\n{}",
                    "Stopping... will finish current iteration and exit.".yellow()
                );
            }
        }
    });

    let pacer = Pacer::new(gateway, settings.pacer, stop);
    let report = pacer.run(&settings.target).await?;

    Ok(report_exit(&report))
}

/// Print the final summary and pick the exit status: 0 for operator stop
/// or limit reached, 2 when the recipient cannot receive DMs.
fn report_exit(report: &PacerReport) -> ExitCode {
    match &report.reason {
        StopReason::LimitReached | StopReason::Stopped => {
            println!(
                "\n{} Sent {} DMs total.",
                "Stopped.".green(),
                report.sent
            );
            ExitCode::SUCCESS
        }
        StopReason::RecipientUnreachable(description) => {
            println!(
                "\n{} {} Sent {} DMs total.",
                "Recipient unreachable:".red(),
                description,
                report.sent
            );
            ExitCode::from(2)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).await
}
