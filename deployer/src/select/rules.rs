//! Local rule evaluator implementing the selection policy deterministically

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::errors::DeployerError;
use crate::models::selection::{DeploymentTarget, Model, SelectionOutcome, SelectionRequest};
use crate::select::oracle::DecisionOracle;
use crate::select::policy::DecisionPrompt;

const AVOID_PATTERN: &str = r"(?i)\b(?:avoid|exclude|don'?t|do not|not use|skip|busy|being used|in use|reserved|off[ -]limits)\b";

const PREFER_PATTERN: &str = r"(?i)\b(?:use|prefer|deploy to|put it on|only)\b";

/// An image named after "image" or "build" wins over one named after "deploy"
const IMAGE_PATTERNS: &[&str] = &[
    r"(?i)\b(?:image|build)\s+([A-Za-z0-9][A-Za-z0-9._/:@-]*)",
    r"(?i)\bdeploy(?:ing)?\s+(?:the\s+)?([A-Za-z0-9][A-Za-z0-9._/:@-]*)",
];

/// Words that can follow "deploy" or "image" without naming an image
const NOT_IMAGES: &[&str] = &[
    "a", "an", "the", "to", "on", "onto", "into", "in", "it", "this", "that", "is", "for",
    "me", "now", "please", "image", "build",
];

/// What the operator notes say about one target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoteVerdict {
    Neutral,
    Preferred,
    Excluded,
}

/// Picks a target from the request alone: honors notes, then prefers unused
/// targets, then the least recently used, ties going to the earliest target.
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    image_patterns: Vec<Regex>,
    avoid_pattern: Regex,
    prefer_pattern: Regex,
}

fn compile(source: &str) -> Result<Regex, DeployerError> {
    Regex::new(source).map_err(|e| DeployerError::ConfigError(format!("invalid rule pattern: {}", e)))
}

impl RuleEvaluator {
    pub fn new() -> Result<Self, DeployerError> {
        Ok(Self {
            image_patterns: IMAGE_PATTERNS
                .iter()
                .map(|p| compile(p))
                .collect::<Result<_, _>>()?,
            avoid_pattern: compile(AVOID_PATTERN)?,
            prefer_pattern: compile(PREFER_PATTERN)?,
        })
    }

    /// The image named in the developer's message
    pub fn requested_image(&self, message: &str) -> Option<String> {
        self.image_patterns
            .iter()
            .flat_map(|re| re.captures_iter(message))
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim_end_matches(['.', ':', '-', '/']).to_string())
            .find(|image| {
                !image.is_empty() && !NOT_IMAGES.contains(&image.to_lowercase().as_str())
            })
    }

    fn verdict(&self, target: &DeploymentTarget, notes: &str) -> NoteVerdict {
        // Target names may contain '-', so it cannot count as a boundary
        let name_pattern = match Regex::new(&format!(
            r"(?i)(?:^|[^\w-]){}(?:$|[^\w-])",
            regex::escape(&target.name)
        )) {
            Ok(re) => re,
            Err(_) => return NoteVerdict::Neutral,
        };

        let mut verdict = NoteVerdict::Neutral;
        for clause in split_clauses(notes) {
            if !name_pattern.is_match(clause) {
                continue;
            }
            if self.avoid_pattern.is_match(clause) {
                return NoteVerdict::Excluded;
            }
            if self.prefer_pattern.is_match(clause) {
                verdict = NoteVerdict::Preferred;
            }
        }
        verdict
    }

    /// Apply the policy to a request
    pub fn evaluate(&self, request: &SelectionRequest) -> Result<SelectionOutcome, DeployerError> {
        let image = self.requested_image(&request.message_from_user).ok_or_else(|| {
            DeployerError::ConstructionError(format!(
                "could not determine which image to deploy from {:?}",
                request.message_from_user
            ))
        })?;

        let verdicts: Vec<(&DeploymentTarget, NoteVerdict)> = request
            .deployment_targets
            .iter()
            .map(|t| (t, self.verdict(t, &request.additional_notes)))
            .collect();

        let eligible: Vec<&DeploymentTarget> = verdicts
            .iter()
            .filter(|(_, v)| *v != NoteVerdict::Excluded)
            .map(|(t, _)| *t)
            .collect();
        let preferred: Vec<&DeploymentTarget> = verdicts
            .iter()
            .filter(|(_, v)| *v == NoteVerdict::Preferred)
            .map(|(t, _)| *t)
            .collect();
        let excluded = verdicts.len() - eligible.len();

        let (pool, reason) = if !preferred.is_empty() {
            (preferred, "it was requested in the notes")
        } else {
            (eligible, "")
        };

        let chosen = pick_stalest(&pool).ok_or_else(|| {
            DeployerError::ConstructionError(
                "every deployment target is excluded by the notes".to_string(),
            )
        })?;

        let why = if !reason.is_empty() {
            reason.to_string()
        } else {
            match chosen.last_used {
                None => "it has never been used".to_string(),
                Some(ts) => format!(
                    "it is the least recently used target (last used {})",
                    ts.format("%Y-%m-%d %H:%M UTC")
                ),
            }
        };

        let mut message = format!("Deploying {} to {} because {}.", image, chosen.name, why);
        if excluded > 0 {
            message.push_str(&format!(" {} target(s) were excluded by the notes.", excluded));
        }

        debug!("Rule evaluator chose {} for {}", chosen.name, image);

        Ok(SelectionOutcome {
            deployment_target_name: chosen.name.clone(),
            deployment_image: image,
            message,
        })
    }
}

/// Never-used targets first; otherwise the oldest last use. The first target
/// in order wins ties.
fn pick_stalest<'a>(pool: &[&'a DeploymentTarget]) -> Option<&'a DeploymentTarget> {
    if let Some(unused) = pool.iter().find(|t| t.is_unused()) {
        return Some(*unused);
    }

    let mut best: Option<&'a DeploymentTarget> = None;
    for target in pool {
        best = match best {
            Some(b) if b.last_used <= target.last_used => Some(b),
            _ => Some(*target),
        };
    }
    best
}

fn split_clauses(notes: &str) -> impl Iterator<Item = &str> {
    notes
        .split(['.', ';', '!', '?', '\n', ','])
        .flat_map(|s| s.split(" but "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl DecisionOracle for RuleEvaluator {
    async fn decide(
        &self,
        _model: &Model,
        _prompt: &DecisionPrompt,
        request: &SelectionRequest,
    ) -> Result<String, DeployerError> {
        let outcome = self.evaluate(request)?;
        Ok(serde_json::to_string(&outcome)?)
    }

    fn name(&self) -> &str {
        "rules"
    }
}
