use serde::{Deserialize, Serialize};

use crate::config::DeploymentPolicy;
use crate::id::CommunityId;

/// Lower bound on deployer dominance.
pub const DOMINANCE_MIN: f64 = 1.0;
/// Upper bound on deployer dominance.
pub const DOMINANCE_MAX: f64 = 5.0;

/// The single deploying actor. Holds the current dominance score, the
/// targeting policy chosen at construction, and the selection made for the
/// round in progress.
///
/// Dominance only moves through the feedback rule applied at the start of
/// each round; nothing else touches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployer {
    dominance: f64,
    policy: DeploymentPolicy,
    current_targets: Vec<CommunityId>,
}

impl Deployer {
    pub fn new(policy: DeploymentPolicy, initial_dominance: f64) -> Self {
        Self {
            dominance: initial_dominance.clamp(DOMINANCE_MIN, DOMINANCE_MAX),
            policy,
            current_targets: Vec::new(),
        }
    }

    pub fn dominance(&self) -> f64 {
        self.dominance
    }

    pub fn policy(&self) -> DeploymentPolicy {
        self.policy
    }

    /// This round's selection, recomputed from scratch every round.
    pub fn current_targets(&self) -> &[CommunityId] {
        &self.current_targets
    }

    pub(crate) fn set_targets(&mut self, targets: Vec<CommunityId>) {
        self.current_targets = targets;
    }

    pub(crate) fn set_dominance(&mut self, value: f64) {
        self.dominance = value.clamp(DOMINANCE_MIN, DOMINANCE_MAX);
    }
}
