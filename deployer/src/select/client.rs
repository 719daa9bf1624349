//! Target selection client

use std::sync::Arc;

use tracing::{info, warn};

use crate::context::CallContext;
use crate::errors::DeployerError;
use crate::models::selection::{Model, SelectionOutcome, SelectionRequest};
use crate::select::oracle::DecisionOracle;
use crate::select::policy::build_prompt;

/// Builds decision requests, consults an oracle and validates its reply
#[derive(Clone)]
pub struct TargetSelector {
    oracle: Arc<dyn DecisionOracle>,
}

impl TargetSelector {
    pub fn new(oracle: Arc<dyn DecisionOracle>) -> Self {
        Self { oracle }
    }

    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    /// Choose a deployment target for the request.
    ///
    /// The returned outcome always names one of the request's targets.
    pub async fn select_target(
        &self,
        ctx: &CallContext,
        model: &Model,
        request: &SelectionRequest,
    ) -> Result<SelectionOutcome, DeployerError> {
        request.validate()?;
        let prompt = build_prompt(request)?;

        info!(
            "Selecting a deployment target among [{}] with {} ({})",
            request.target_names().join(", "),
            self.oracle.name(),
            model
        );

        let reply = ctx.run(self.oracle.decide(model, &prompt, request)).await?;

        let outcome = validate_reply(&reply, request).inspect_err(|e| {
            warn!("Rejected oracle reply: {}", e);
        })?;

        info!(
            "Chose {} for image {}",
            outcome.deployment_target_name, outcome.deployment_image
        );
        Ok(outcome)
    }
}

/// Parse a raw oracle reply and check it against the request
pub fn validate_reply(
    reply: &str,
    request: &SelectionRequest,
) -> Result<SelectionOutcome, DeployerError> {
    let outcome: SelectionOutcome = serde_json::from_str(strip_code_fence(reply)).map_err(|e| {
        DeployerError::InvalidOutcome(format!("reply is not a selection outcome: {}", e))
    })?;

    let matches = request
        .deployment_targets
        .iter()
        .filter(|t| t.name == outcome.deployment_target_name)
        .count();

    match matches {
        1 => {}
        0 => {
            return Err(DeployerError::InvalidOutcome(format!(
                "oracle chose unknown deployment target {:?}; expected one of [{}]",
                outcome.deployment_target_name,
                request.target_names().join(", ")
            )))
        }
        n => {
            return Err(DeployerError::InvalidOutcome(format!(
                "oracle chose {:?}, which names {} targets",
                outcome.deployment_target_name, n
            )))
        }
    }

    if outcome.deployment_image.trim().is_empty() {
        return Err(DeployerError::InvalidOutcome(
            "oracle reply has no deployment image".to_string(),
        ));
    }

    Ok(outcome)
}

/// Models sometimes wrap JSON in a markdown fence despite being asked not to
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
