//! Deployer round: per-round target selection and the dominance feedback
//! rule, applied before any community updates.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::DeploymentPolicy;
use crate::id::CommunityId;
use crate::model::{Community, Deployer};

/// Digital access score at or above which a community counts as high-access.
pub const HIGH_ACCESS_CUTOFF: f64 = 0.6;
/// Digital access score below which a community counts as low-access.
pub const LOW_ACCESS_CUTOFF: f64 = 0.4;

/// Neutral dominance the mixed-outcome regime drifts toward.
const DOMINANCE_BASELINE: f64 = 3.0;
const DOMINANCE_DRIFT: f64 = 0.05;
const FAILURE_TOLERANCE: f64 = 0.3;
const FAILURE_PRESSURE: f64 = 0.3;
const SUCCESS_TOLERANCE: f64 = 0.4;
const SUCCESS_GAIN: f64 = 0.2;

/// Run the deployer's half of the round: reset targeting flags, select this
/// round's targets, then adjust dominance from the pre-round outcome counts.
pub fn deployer_round(
    deployer: &mut Deployer,
    roster: &mut BTreeMap<CommunityId, Community>,
    rng: &mut impl Rng,
) {
    // Reset-then-set every round: targeting has no memory beyond the round.
    for community in roster.values_mut() {
        community.was_targeted = false;
    }

    let targets = select_targets(deployer.policy(), roster, rng);
    for id in &targets {
        if let Some(community) = roster.get_mut(id) {
            community.was_targeted = true;
        }
    }
    deployer.set_targets(targets);

    update_dominance(deployer, roster);
}

/// Select this round's targets among non-banned, non-collapsed communities.
pub fn select_targets(
    policy: DeploymentPolicy,
    roster: &BTreeMap<CommunityId, Community>,
    rng: &mut impl Rng,
) -> Vec<CommunityId> {
    let eligible: Vec<&Community> = roster.values().filter(|c| c.state.active()).collect();

    match policy {
        DeploymentPolicy::All => eligible.iter().map(|c| c.id).collect(),
        DeploymentPolicy::Filtered => eligible
            .iter()
            .filter(|c| c.digital_access_score >= HIGH_ACCESS_CUTOFF)
            .map(|c| c.id)
            .collect(),
        DeploymentPolicy::Random => stratified_sample(&eligible, rng),
        DeploymentPolicy::Nothing => Vec::new(),
    }
}

/// Half of all eligible communities, split evenly between the high-access
/// and low-access strata (high share rounded down, remainder to low).
/// Sampling is without replacement; a stratum with too few members is
/// simply exhausted. Mid-access communities pad the eligible count but are
/// never drawn.
fn stratified_sample(eligible: &[&Community], rng: &mut impl Rng) -> Vec<CommunityId> {
    let mut high: Vec<CommunityId> = eligible
        .iter()
        .filter(|c| c.digital_access_score >= HIGH_ACCESS_CUTOFF)
        .map(|c| c.id)
        .collect();
    let mut low: Vec<CommunityId> = eligible
        .iter()
        .filter(|c| c.digital_access_score < LOW_ACCESS_CUTOFF)
        .map(|c| c.id)
        .collect();

    let total = eligible.len() / 2;
    let high_share = (total / 2).min(high.len());
    let low_share = (total - total / 2).min(low.len());

    high.shuffle(rng);
    low.shuffle(rng);

    let mut targets: Vec<CommunityId> = high[..high_share].to_vec();
    targets.extend_from_slice(&low[..low_share]);
    targets
}

/// Feedback rule tying aggregate outcomes back into future deployer
/// behavior. Constants are deliberately kept verbatim — the emergent
/// dynamics are sensitive to them.
fn update_dominance(deployer: &mut Deployer, roster: &BTreeMap<CommunityId, Community>) {
    let total = roster.len();
    if total == 0 {
        return;
    }

    let adopted = roster.values().filter(|c| c.adopted()).count();
    let collapsed = roster.values().filter(|c| c.collapsed()).count();
    let banned = roster.values().filter(|c| c.banned()).count() - collapsed;
    let deployed = deployer.current_targets().len();

    // +1 guards division by zero and slightly dampens the rate.
    let success_rate = adopted as f64 / (deployed + 1) as f64;
    let failure_rate = (banned + collapsed) as f64 / total as f64;

    let before = deployer.dominance();
    if failure_rate > FAILURE_TOLERANCE {
        deployer.set_dominance(before - FAILURE_PRESSURE * (failure_rate - FAILURE_TOLERANCE));
    } else if success_rate > SUCCESS_TOLERANCE {
        deployer.set_dominance(before + SUCCESS_GAIN * (success_rate - SUCCESS_TOLERANCE));
    } else if (0.1..FAILURE_TOLERANCE).contains(&failure_rate)
        && success_rate > 0.2
        && success_rate < SUCCESS_TOLERANCE
    {
        // Mixed outcomes: regress toward the neutral equilibrium from
        // either side, without overshooting.
        if before > DOMINANCE_BASELINE {
            deployer.set_dominance((before - DOMINANCE_DRIFT).max(DOMINANCE_BASELINE));
        } else if before < DOMINANCE_BASELINE {
            deployer.set_dominance((before + DOMINANCE_DRIFT).min(DOMINANCE_BASELINE));
        }
    }

    if deployer.dominance() != before {
        tracing::debug!(
            success_rate,
            failure_rate,
            dominance = deployer.dominance(),
            "dominance adjusted"
        );
    }
}
