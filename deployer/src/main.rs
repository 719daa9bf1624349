//! deployerai - Entry Point
//!
//! Chooses a deployment target for a build, or finds the open pull request
//! for a ticket.

use std::env;
use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;
use tracing::{error, info};

use deployerai::app::options::{parse_args, Action, AppOptions};
use deployerai::app::run::run;
use deployerai::app::state::AppState;
use deployerai::authn::credentials::Credentials;
use deployerai::filesys::file::File;
use deployerai::invoke::Message;
use deployerai::logs::{init_logging, LogOptions};
use deployerai::storage::settings::Settings;
use deployerai::utils::version_info;

#[tokio::main]
async fn main() -> ExitCode {
    match try_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

async fn try_main() -> anyhow::Result<ExitCode> {
    let cli_args = parse_args(env::args().skip(1));
    let options = AppOptions::from_args(&cli_args)?;

    // Print version and exit
    if options.action == Action::Version {
        let version = version_info();
        println!("{}", serde_json::to_string_pretty(&version)?);
        return Ok(ExitCode::SUCCESS);
    }

    // Retrieve the settings file
    let settings = match &options.settings_file {
        Some(path) => Settings::load(&File::new(path))
            .await
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level,
        quiet: options.quiet,
        json_format: options.json_output,
    };
    if let Err(e) = init_logging(&log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!("Running deployerai with options: {:?}", options);
    let state = AppState::new(settings, Credentials::from_env());
    let message = run(&state, &options, await_shutdown_signal()).await?;

    if options.json_output {
        println!("{}", serde_json::to_string_pretty(&message)?);
    } else {
        print_message(&message);
    }

    Ok(match message {
        Message::Failed(_) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

fn print_message(message: &Message) {
    match message {
        Message::TargetSelected(outcome) => {
            println!(
                "{} {} -> {}",
                "deploy".green().bold(),
                outcome.deployment_image.bold(),
                outcome.deployment_target_name.cyan().bold()
            );
            println!("{}", outcome.message);
        }
        Message::TicketResolved(pr) => {
            println!("{} #{} {}", pr.repo.cyan().bold(), pr.number, pr.title);
        }
        Message::Failed(failure) => {
            error!("{}", failure);
            eprintln!("{} {}", format!("{}:", failure.kind).red().bold(), failure.message);
        }
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!("Unable to listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down...");
        }
    }
}
