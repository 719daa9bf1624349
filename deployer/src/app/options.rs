//! Command-line options

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::DeployerError;
use crate::models::selection::Model;

/// What the front-end was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print version info and exit
    Version,

    /// Resolve a ticket to its open pull request
    ResolveTicket { ticket: String },

    /// Choose a deployment target
    SelectTarget {
        message: String,
        targets_file: PathBuf,
        notes: String,
        model: Option<Model>,
        local: bool,
    },
}

/// Parsed front-end options
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub action: Action,

    /// Settings file; defaults apply when absent
    pub settings_file: Option<PathBuf>,

    /// Deadline for the whole operation
    pub timeout: Option<Duration>,

    /// Print results as JSON
    pub json_output: bool,

    /// Suppress logs; only the result is printed
    pub quiet: bool,
}

/// Split `--key=value` and `--flag` arguments into a map
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> HashMap<String, String> {
    let mut cli_args = HashMap::new();

    for arg in args {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    cli_args
}

fn flag(cli_args: &HashMap<String, String>, key: &str) -> bool {
    cli_args
        .get(key)
        .is_some_and(|v| matches!(v.as_str(), "true" | "1" | "yes"))
}

impl AppOptions {
    pub fn from_args(cli_args: &HashMap<String, String>) -> Result<Self, DeployerError> {
        let action = if flag(cli_args, "version") {
            Action::Version
        } else if let Some(ticket) = cli_args.get("ticket") {
            Action::ResolveTicket {
                ticket: ticket.clone(),
            }
        } else if let Some(message) = cli_args.get("deploy") {
            let targets_file = cli_args.get("targets").ok_or_else(|| {
                DeployerError::ConstructionError("--deploy requires --targets=<file>".to_string())
            })?;
            let model = cli_args
                .get("model")
                .map(|m| m.parse::<Model>())
                .transpose()
                .map_err(DeployerError::ConstructionError)?;

            Action::SelectTarget {
                message: message.clone(),
                targets_file: PathBuf::from(targets_file),
                notes: cli_args.get("notes").cloned().unwrap_or_default(),
                model,
                local: flag(cli_args, "local"),
            }
        } else {
            return Err(DeployerError::ConstructionError(
                "nothing to do: pass --ticket=<id> or --deploy=<message> --targets=<file>"
                    .to_string(),
            ));
        };

        let timeout = cli_args
            .get("timeout")
            .map(|t| {
                t.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                    DeployerError::ConstructionError(format!("invalid --timeout value: {}", t))
                })
            })
            .transpose()?;

        Ok(Self {
            action,
            settings_file: cli_args.get("settings").map(PathBuf::from),
            timeout,
            json_output: flag(cli_args, "json"),
            quiet: flag(cli_args, "quiet"),
        })
    }
}
