//! Front-end run loop

use std::future::Future;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::app::options::{Action, AppOptions};
use crate::app::state::AppState;
use crate::context::CallContext;
use crate::errors::DeployerError;
use crate::filesys::file::File;
use crate::invoke::{self, Command, Message};
use crate::models::selection::{DeploymentTarget, SelectionRequest};

/// Run the requested operation as a command and wait for its message.
///
/// `shutdown_signal` cancels the operation; the command still reports back,
/// as a cancellation failure.
pub async fn run(
    state: &AppState,
    options: &AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<Message, DeployerError> {
    let (mut ctx, canceller) = CallContext::with_cancel();
    if let Some(timeout) = options.timeout {
        ctx = ctx.with_timeout(timeout);
    }

    let command = build_command(state, &options.action, ctx).await?;

    let (tx, mut rx) = mpsc::channel(1);
    let handle = invoke::dispatch(command, tx);

    tokio::pin!(shutdown_signal);
    let message = tokio::select! {
        message = rx.recv() => message,
        _ = &mut shutdown_signal => {
            info!("Shutdown signal received, cancelling...");
            canceller.cancel();
            rx.recv().await
        }
    };

    if let Err(e) = handle.await {
        warn!("Command task ended abnormally: {}", e);
    }

    message.ok_or_else(|| DeployerError::Cancelled("command ended without a result".to_string()))
}

async fn build_command(
    state: &AppState,
    action: &Action,
    ctx: CallContext,
) -> Result<Command, DeployerError> {
    match action {
        Action::Version => Err(DeployerError::ConstructionError(
            "version is not a command".to_string(),
        )),
        Action::ResolveTicket { ticket } => {
            let resolver = state.resolver()?;
            Ok(invoke::resolve_ticket(resolver, ctx, ticket.clone()))
        }
        Action::SelectTarget {
            message,
            targets_file,
            notes,
            model,
            local,
        } => {
            let targets: Vec<DeploymentTarget> = File::new(targets_file).read_json().await?;
            let request = SelectionRequest::new(message.clone(), targets, notes.clone());
            let model = model.clone().unwrap_or_else(|| state.settings.oracle.model.clone());
            let selector = state.selector(*local)?;
            Ok(invoke::select_target(selector, ctx, model, request))
        }
    }
}
