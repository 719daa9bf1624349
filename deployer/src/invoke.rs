//! Cancellable units of work for event-driven front-ends
//!
//! A [`Command`] is a boxed future that always resolves to a [`Message`]:
//! either the success value or a classified failure. Front-ends hand commands
//! to [`dispatch`], which runs them on the runtime and delivers the message
//! into the UI's channel without blocking its loop.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::context::CallContext;
use crate::errors::{DeployerError, ErrorKind};
use crate::models::review::ReviewRequest;
use crate::models::selection::{Model, SelectionOutcome, SelectionRequest};
use crate::resolve::resolver::TicketResolver;
use crate::select::client::TargetSelector;

/// Which operation a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    SelectTarget,
    ResolveTicket,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::SelectTarget => f.write_str("select target"),
            Operation::ResolveTicket => f.write_str("resolve ticket"),
        }
    }
}

/// A failed operation, flattened for delivery to a UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub operation: Operation,
    pub kind: ErrorKind,
    pub message: String,
}

impl Failure {
    fn new(operation: Operation, err: &DeployerError) -> Self {
        Self {
            operation,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed ({}): {}", self.operation, self.kind, self.message)
    }
}

/// Result of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    TargetSelected(SelectionOutcome),
    TicketResolved(ReviewRequest),
    Failed(Failure),
}

/// A unit of work yielding exactly one message
pub type Command = Pin<Box<dyn Future<Output = Message> + Send + 'static>>;

/// Wrap target selection as a command
pub fn select_target(
    selector: TargetSelector,
    ctx: CallContext,
    model: Model,
    request: SelectionRequest,
) -> Command {
    Box::pin(async move {
        match selector.select_target(&ctx, &model, &request).await {
            Ok(outcome) => Message::TargetSelected(outcome),
            Err(e) => Message::Failed(Failure::new(Operation::SelectTarget, &e)),
        }
    })
}

/// Wrap ticket resolution as a command
pub fn resolve_ticket(resolver: TicketResolver, ctx: CallContext, ticket: String) -> Command {
    Box::pin(async move {
        match resolver.resolve_ticket(&ctx, &ticket).await {
            Ok(pr) => Message::TicketResolved(pr),
            Err(e) => Message::Failed(Failure::new(Operation::ResolveTicket, &e)),
        }
    })
}

/// Run a command in the background and send its message to `tx`
pub fn dispatch(command: Command, tx: mpsc::Sender<Message>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let message = command.await;
        debug!("Command finished, delivering message");
        if tx.send(message).await.is_err() {
            warn!("Message receiver dropped before command finished");
        }
    })
}
