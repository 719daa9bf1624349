//! The fixed instruction sent to the decision oracle, and the per-call prompt

use crate::errors::DeployerError;
use crate::models::selection::SelectionRequest;

/// System-level policy statement. Always sent verbatim ahead of the request.
pub const SYSTEM_POLICY: &str = r#"
You are a devops engineer responsible for choosing which development
environment (a "deployment target") a test build should be deployed to.

You will be given JSON data describing a deployment request: a message from
the developer, a list of possible deployment targets with their usage
timestamps, and optional additional notes. Choose exactly one target using
these rules, in order:

1. If the additional notes exclude a target by name (for example "avoid devb"
   or "devb is in use"), never choose that target. If the notes ask for a
   specific target, choose it unless it is also excluded.
2. A target that has never been used (its last_used_time is
   0001-01-01T00:00:00Z) is preferred over any target that has been used.
3. Among used targets, prefer the one whose last_used_time is the oldest.
4. Break ties by choosing the first qualifying target in the order given.

The image to deploy is the one named in the developer's message, never the
image currently deployed on the chosen target.

Respond with a JSON object containing exactly these fields:
- "deployment_target_name": the name of the chosen target, spelled exactly as
  it appears in the request
- "deployment_image": the image to deploy
- "message": a short explanation for the developer of why the target was
  chosen, plus anything else relevant
"#;

/// The two messages that make up one decision request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionPrompt {
    pub system: &'static str,
    pub user: String,
}

/// Embed the request, as compact JSON, in the per-call instruction
pub fn build_prompt(request: &SelectionRequest) -> Result<DecisionPrompt, DeployerError> {
    let json = serde_json::to_string(request).map_err(|e| {
        DeployerError::ConstructionError(format!("could not serialize deployment request: {}", e))
    })?;

    Ok(DecisionPrompt {
        system: SYSTEM_POLICY,
        user: format!(
            "I have a deployment request for you. Here is the JSON data:\n\n{}",
            json
        ),
    })
}
