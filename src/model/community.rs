use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::id::CommunityId;

/// Length of the rolling wellbeing history consulted by the post-adoption
/// ban rule.
pub const BAN_WINDOW: usize = 3;

/// Share of communities sampled as privileged at construction.
const PRIVILEGED_SHARE: f64 = 0.3;

/// Adoption lifecycle of a community.
///
/// A single tagged state instead of three loosely-coupled booleans, so the
/// invalid combinations (adopted and banned at once, collapsed but not
/// banned) cannot be represented. `Banned` and `Collapsed` are terminal with
/// respect to adoption; `Collapsed` is terminal with respect to everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdoptionState {
    NotAdopted,
    Adopted,
    Banned,
    Collapsed,
}

impl AdoptionState {
    /// The community currently runs the technology.
    pub fn adopted(self) -> bool {
        self == Self::Adopted
    }

    /// The community has rejected the technology. Collapse implies a ban:
    /// a collapsed community is permanently out of the adoption pool.
    pub fn banned(self) -> bool {
        matches!(self, Self::Banned | Self::Collapsed)
    }

    pub fn collapsed(self) -> bool {
        self == Self::Collapsed
    }

    /// Still participating in the round cycle (neither banned nor collapsed).
    pub fn active(self) -> bool {
        matches!(self, Self::NotAdopted | Self::Adopted)
    }
}

/// Wealth stratum assigned at sampling time, following the correlated
/// infrastructure/access split used to model economic inequality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunityClass {
    Privileged,
    Average,
}

/// Fixed-capacity ring buffer over the last [`BAN_WINDOW`] wellbeing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellbeingWindow {
    values: [f64; BAN_WINDOW],
    len: usize,
    head: usize,
}

impl WellbeingWindow {
    pub fn new() -> Self {
        Self {
            values: [0.0; BAN_WINDOW],
            len: 0,
            head: 0,
        }
    }

    /// Append a value, dropping the oldest once the window is full.
    pub fn push(&mut self, value: f64) {
        self.values[self.head] = value;
        self.head = (self.head + 1) % BAN_WINDOW;
        if self.len < BAN_WINDOW {
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == BAN_WINDOW
    }

    /// Mean of the recorded values; 0.0 when empty.
    pub fn mean(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        self.values[..self.len].iter().sum::<f64>() / self.len as f64
    }
}

impl Default for WellbeingWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// A receiving community: static traits sampled at creation plus the mutable
/// state driven by its own per-round cycle. Never mutated by other entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: CommunityId,
    pub class: CommunityClass,

    // Static traits. Infrastructure is the one exception to immutability:
    // it erodes with continued use once adopted.
    pub cultural_resilience: f64,
    pub infrastructure_strength: f64,
    pub adoption_threshold: f64,
    pub digital_access_score: f64,

    // Mutable state.
    pub wellbeing: f64,
    pub state: AdoptionState,
    pub was_targeted: bool,
    pub history: WellbeingWindow,
}

impl Community {
    /// Sample a fresh community. With probability 0.3 it is privileged
    /// (strong infrastructure, high digital access); otherwise average.
    /// Resilience and threshold are independent of wealth.
    pub fn sample(id: CommunityId, rng: &mut impl Rng) -> Self {
        let (class, infrastructure_strength, digital_access_score) =
            if rng.random_range(0.0..1.0) < PRIVILEGED_SHARE {
                (
                    CommunityClass::Privileged,
                    rng.random_range(8.0..12.0),
                    rng.random_range(0.7..1.0),
                )
            } else {
                (
                    CommunityClass::Average,
                    rng.random_range(2.0..8.0),
                    rng.random_range(0.2..0.7),
                )
            };
        let cultural_resilience = rng.random_range(0.05..0.8);
        let adoption_threshold = rng.random_range(0.1..1.0);

        Self::with_traits(
            id,
            class,
            cultural_resilience,
            infrastructure_strength,
            adoption_threshold,
            digital_access_score,
        )
    }

    /// Build a community with explicit traits (scenario/diagnostic entry
    /// point). Starts unexposed at full wellbeing.
    pub fn with_traits(
        id: CommunityId,
        class: CommunityClass,
        cultural_resilience: f64,
        infrastructure_strength: f64,
        adoption_threshold: f64,
        digital_access_score: f64,
    ) -> Self {
        Self {
            id,
            class,
            cultural_resilience,
            infrastructure_strength,
            adoption_threshold,
            digital_access_score,
            wellbeing: 100.0,
            state: AdoptionState::NotAdopted,
            was_targeted: false,
            history: WellbeingWindow::new(),
        }
    }

    pub fn adopted(&self) -> bool {
        self.state.adopted()
    }

    pub fn banned(&self) -> bool {
        self.state.banned()
    }

    pub fn collapsed(&self) -> bool {
        self.state.collapsed()
    }

    /// Adopt the technology. No-op unless currently unexposed.
    pub fn adopt(&mut self) {
        if self.state == AdoptionState::NotAdopted {
            self.state = AdoptionState::Adopted;
        }
    }

    /// Ban the technology, revoking adoption. No-op once collapsed.
    pub fn ban(&mut self) {
        if self.state.active() {
            self.state = AdoptionState::Banned;
        }
    }

    /// Collapse: permanent, forces the ban, ends all further behavior.
    pub fn collapse(&mut self) {
        self.state = AdoptionState::Collapsed;
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn sampled(seed: u64) -> Community {
        let mut rng = SmallRng::seed_from_u64(seed);
        Community::sample(CommunityId(1), &mut rng)
    }

    #[test]
    fn sampled_traits_within_bounds() {
        for seed in 0..200 {
            let c = sampled(seed);
            assert!((0.05..0.8).contains(&c.cultural_resilience));
            assert!((2.0..12.0).contains(&c.infrastructure_strength));
            assert!((0.1..1.0).contains(&c.adoption_threshold));
            assert!((0.2..1.0).contains(&c.digital_access_score));
            assert_eq!(c.wellbeing, 100.0);
            assert_eq!(c.state, AdoptionState::NotAdopted);
        }
    }

    #[test]
    fn class_correlates_with_access_and_infrastructure() {
        for seed in 0..200 {
            let c = sampled(seed);
            match c.class {
                CommunityClass::Privileged => {
                    assert!(c.infrastructure_strength >= 8.0);
                    assert!(c.digital_access_score >= 0.7);
                }
                CommunityClass::Average => {
                    assert!(c.infrastructure_strength < 8.0);
                    assert!(c.digital_access_score < 0.7);
                }
            }
        }
    }

    #[test]
    fn state_flags_are_mutually_consistent() {
        let mut c = sampled(3);
        assert!(!c.adopted() && !c.banned() && !c.collapsed());

        c.adopt();
        assert!(c.adopted() && !c.banned());

        c.ban();
        assert!(!c.adopted() && c.banned() && !c.collapsed());

        c.collapse();
        assert!(!c.adopted() && c.banned() && c.collapsed());
    }

    #[test]
    fn banned_community_cannot_readopt() {
        let mut c = sampled(4);
        c.ban();
        c.adopt();
        assert_eq!(c.state, AdoptionState::Banned);
    }

    #[test]
    fn collapse_is_permanent() {
        let mut c = sampled(5);
        c.collapse();
        c.ban();
        c.adopt();
        assert_eq!(c.state, AdoptionState::Collapsed);
    }

    #[test]
    fn window_drops_oldest() {
        let mut w = WellbeingWindow::new();
        assert!(w.is_empty());
        w.push(90.0);
        assert!(!w.is_full());
        assert!((w.mean() - 90.0).abs() < f64::EPSILON);

        w.push(60.0);
        w.push(30.0);
        assert!(w.is_full());
        assert!((w.mean() - 60.0).abs() < f64::EPSILON);

        // Oldest (90) falls out.
        w.push(30.0);
        assert_eq!(w.len(), BAN_WINDOW);
        assert!((w.mean() - 40.0).abs() < f64::EPSILON);
    }
}
