//! In-memory statistics collection for the out-of-scope reporting layer.
//!
//! Rows are captured at the top of every step, before the deployer acts, so
//! round `n` describes the population as left by round `n - 1`. No
//! persistence format is defined here; consumers serialize rows themselves.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::id::CommunityId;
use crate::model::{Community, Deployer};

/// Aggregate snapshot of one round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSummary {
    pub round: u64,
    pub adopted: usize,
    pub banned: usize,
    pub collapsed: usize,
    pub mean_wellbeing: f64,
    pub dominance: f64,
}

/// Per-community snapshot of one round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunitySample {
    pub round: u64,
    pub id: CommunityId,
    pub adopted: bool,
    pub banned: bool,
    pub collapsed: bool,
    pub wellbeing: f64,
    pub infrastructure_strength: f64,
    pub was_targeted: bool,
}

/// Accumulated statistics for a run.
#[derive(Debug, Clone, Default)]
pub struct StatsLog {
    summaries: Vec<RoundSummary>,
    samples: Vec<CommunitySample>,
}

impl StatsLog {
    pub(crate) fn record(
        &mut self,
        round: u64,
        roster: &BTreeMap<CommunityId, Community>,
        deployer: &Deployer,
    ) {
        let total = roster.len();
        let collapsed = roster.values().filter(|c| c.collapsed()).count();
        let banned = roster.values().filter(|c| c.banned()).count() - collapsed;
        let mean_wellbeing = if total == 0 {
            0.0
        } else {
            roster.values().map(|c| c.wellbeing).sum::<f64>() / total as f64
        };

        self.summaries.push(RoundSummary {
            round,
            adopted: roster.values().filter(|c| c.adopted()).count(),
            banned,
            collapsed,
            mean_wellbeing,
            dominance: deployer.dominance(),
        });

        for community in roster.values() {
            self.samples.push(CommunitySample {
                round,
                id: community.id,
                adopted: community.adopted(),
                banned: community.banned(),
                collapsed: community.collapsed(),
                wellbeing: community.wellbeing,
                infrastructure_strength: community.infrastructure_strength,
                was_targeted: community.was_targeted,
            });
        }
    }

    pub fn summaries(&self) -> &[RoundSummary] {
        &self.summaries
    }

    pub fn samples(&self) -> &[CommunitySample] {
        &self.samples
    }

    pub fn samples_for_round(&self, round: u64) -> impl Iterator<Item = &CommunitySample> {
        self.samples.iter().filter(move |s| s.round == round)
    }
}
