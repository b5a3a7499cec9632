//! Per-round community decision cycle: adoption, wellbeing, ban, collapse.
//!
//! Pure helper functions over the roster — no system object. Each call reads
//! neighbor state and mutates only the one community whose round is being
//! run.

use std::collections::BTreeMap;

use rand::Rng;

use crate::config::SimParams;
use crate::id::CommunityId;
use crate::model::{AdoptionState, Community};
use crate::network::InfluenceNetwork;

/// Floor on perceived utility, so adoption never becomes structurally
/// impossible for under-resourced communities.
pub const UTILITY_FLOOR: f64 = 0.3;

/// Mean wellbeing over a full history window below which an adopted
/// community bans the technology.
pub const BAN_MEAN_THRESHOLD: f64 = 65.0;

/// An adopted neighbor below this wellbeing counts as visibly suffering.
pub const NEIGHBOR_SUFFERING_THRESHOLD: f64 = 70.0;

/// Wellbeing below this value collapses the community.
pub const SURVIVAL_THRESHOLD: f64 = 35.0;

const PEER_ADOPT_WEIGHT: f64 = 0.4;
const PEER_BAN_WEIGHT: f64 = 0.3;
const RESILIENCE_WEIGHT: f64 = 0.5;
const INFRASTRUCTURE_WEAR: f64 = 0.4;
const CRISIS_PROBABILITY: f64 = 0.08;

/// How attractive the technology looks to this community right now.
pub fn perceived_utility(
    community: &Community,
    implementation_cost: f64,
    cultural_fit: f64,
    dominance: f64,
) -> f64 {
    let raw = (community.infrastructure_strength / implementation_cost)
        * cultural_fit
        * community.digital_access_score
        * (1.0 + dominance / 10.0);
    raw.max(UTILITY_FLOOR)
}

/// Network-neighbor adjustment to the adoption score, in roughly
/// [-0.3, 0.4]. Zero for isolated communities or ids absent from the network.
pub fn peer_influence(
    network: &InfluenceNetwork,
    roster: &BTreeMap<CommunityId, Community>,
    id: CommunityId,
) -> f64 {
    let neighbors = network.neighbors(id);
    if neighbors.is_empty() {
        return 0.0;
    }

    let mut adopted = 0usize;
    let mut banned = 0usize;
    for neighbor in neighbors {
        if let Some(c) = roster.get(neighbor) {
            if c.adopted() {
                adopted += 1;
            } else if c.banned() {
                banned += 1;
            }
        }
    }

    (PEER_ADOPT_WEIGHT * adopted as f64 - PEER_BAN_WEIGHT * banned as f64) / neighbors.len() as f64
}

/// Whether observation of the neighborhood forces a ban this round.
///
/// Any collapsed neighbor triggers an immediate panic ban regardless of own
/// state. Otherwise the trigger is at least one currently-adopted neighbor
/// with at least one of those visibly suffering.
pub fn network_ban_triggered(
    network: &InfluenceNetwork,
    roster: &BTreeMap<CommunityId, Community>,
    id: CommunityId,
) -> bool {
    let mut has_adopted_neighbor = false;
    let mut has_suffering_neighbor = false;

    for neighbor in network.neighbors(id) {
        let Some(c) = roster.get(neighbor) else {
            continue;
        };
        if c.collapsed() {
            return true;
        }
        if c.adopted() {
            has_adopted_neighbor = true;
            if c.wellbeing < NEIGHBOR_SUFFERING_THRESHOLD {
                has_suffering_neighbor = true;
            }
        }
    }

    has_adopted_neighbor && has_suffering_neighbor
}

/// Run one community's full round cycle.
///
/// Collapsed communities are inert. Banned communities can never adopt
/// again, but they still sit outside the technology: the non-participation
/// penalty keeps accruing, so `Banned` can still fall through to
/// `Collapsed` in a later round. Reads neighbors' *current* state from
/// `roster` — within a round, communities later in the shuffle see
/// already-updated neighbors, which is intentional asynchrony. Mutates only
/// `community`; the round order of random draws (adoption perturbation,
/// then wellbeing) is fixed for reproducibility.
pub fn run_round(
    community: &mut Community,
    roster: &BTreeMap<CommunityId, Community>,
    network: &InfluenceNetwork,
    dominance: f64,
    params: &SimParams,
    rng: &mut impl Rng,
) {
    if community.collapsed() {
        return;
    }

    if community.banned() {
        community.wellbeing -= nonparticipation_penalty(rng);
        community.wellbeing = community.wellbeing.clamp(0.0, 100.0);
        if community.wellbeing < SURVIVAL_THRESHOLD {
            community.collapse();
            tracing::debug!(id = %community.id, "community collapsed");
        }
        return;
    }

    // 1. Adoption decision, only when targeted this round and unexposed.
    if community.was_targeted && community.state == AdoptionState::NotAdopted {
        let utility = perceived_utility(
            community,
            params.implementation_cost,
            params.cultural_fit,
            dominance,
        );
        let peer = peer_influence(network, roster, community.id);
        // Perturbation is biased positive, modeling persuasive pressure.
        let score = utility + peer - RESILIENCE_WEIGHT * community.cultural_resilience
            + rng.random_range(-0.2..0.3);
        if score > community.adoption_threshold {
            community.adopt();
            tracing::debug!(id = %community.id, score, "community adopted");
        }
    }

    // 2. Wellbeing update, independent of targeting.
    if community.adopted() {
        community.wellbeing += (community.infrastructure_strength - 5.0) * 4.0;
        community.infrastructure_strength -= INFRASTRUCTURE_WEAR;
        if rng.random_range(0.0..1.0) < CRISIS_PROBABILITY {
            community.wellbeing -= rng.random_range(15.0..30.0);
        }
    } else {
        community.wellbeing -= nonparticipation_penalty(rng);
    }
    community.wellbeing = community.wellbeing.clamp(0.0, 100.0);

    // 3. Ban evaluation over the rolling window, then the network triggers.
    community.history.push(community.wellbeing);
    if community.adopted()
        && community.history.is_full()
        && community.history.mean() < BAN_MEAN_THRESHOLD
    {
        community.ban();
        tracing::debug!(id = %community.id, "community banned after adoption");
    }
    if !community.banned() && network_ban_triggered(network, roster, community.id) {
        community.ban();
        tracing::debug!(id = %community.id, "community banned from neighbor observation");
    }

    // 4. Collapse evaluation.
    if community.wellbeing < SURVIVAL_THRESHOLD {
        community.collapse();
        tracing::debug!(id = %community.id, "community collapsed");
    }
}

/// Steady digital-divide penalty paid by every community that does not run
/// the technology, banned or merely unexposed.
fn nonparticipation_penalty(rng: &mut impl Rng) -> f64 {
    2.5 + rng.random_range(0.0..2.0)
}
