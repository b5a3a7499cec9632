//! Hand-crafted simulations for tests and the diagnostic layer.
//!
//! `Scenario` assembles an explicit roster and explicit edges instead of
//! sampled traits and a generated topology, then hands over to the normal
//! round protocol.

use crate::config::{DeploymentPolicy, SimParams};
use crate::id::{CommunityId, IdGenerator};
use crate::model::{Community, CommunityClass};
use crate::network::InfluenceNetwork;
use crate::sim::Simulation;

pub struct Scenario {
    params: SimParams,
    communities: Vec<Community>,
    edges: Vec<(CommunityId, CommunityId)>,
    id_gen: IdGenerator,
}

impl Scenario {
    /// Empty scenario with a fixed seed and the `all` policy; individual
    /// knobs are overridden through the chained setters.
    pub fn new() -> Self {
        Self {
            params: SimParams {
                policy: DeploymentPolicy::All,
                seed: Some(0),
                ..SimParams::default()
            },
            communities: Vec::new(),
            edges: Vec::new(),
            id_gen: IdGenerator::new(),
        }
    }

    pub fn policy(mut self, policy: DeploymentPolicy) -> Self {
        self.params.policy = policy;
        self
    }

    pub fn implementation_cost(mut self, cost: f64) -> Self {
        self.params.implementation_cost = cost;
        self
    }

    pub fn cultural_fit(mut self, fit: f64) -> Self {
        self.params.cultural_fit = fit;
        self
    }

    pub fn dominance(mut self, dominance: f64) -> Self {
        self.params.initial_dominance = dominance;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.params.seed = Some(seed);
        self
    }

    /// Add a community with neutral default traits; chain field setters on
    /// the returned ref and terminate with [`CommunityRef::id`].
    pub fn community(&mut self) -> CommunityRef<'_> {
        let id = self.id_gen.next_id();
        self.communities.push(Community::with_traits(
            id,
            CommunityClass::Average,
            0.4,
            5.0,
            0.5,
            0.5,
        ));
        let index = self.communities.len() - 1;
        CommunityRef {
            scenario: self,
            index,
        }
    }

    /// Add an undirected influence edge between two communities.
    pub fn link(mut self, a: CommunityId, b: CommunityId) -> Self {
        self.edges.push((a, b));
        self
    }

    /// Assemble the simulation.
    ///
    /// # Panics
    /// Panics when the scenario is degenerate (no communities, bad cost).
    pub fn build(self) -> Simulation {
        let ids: Vec<CommunityId> = self.communities.iter().map(|c| c.id).collect();
        let mut network = InfluenceNetwork::with_nodes(&ids);
        for (a, b) in self.edges {
            network.add_edge(a, b);
        }
        Simulation::from_parts(self.params, self.communities, network)
            .expect("scenario parameters must be valid")
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed reference to a community being configured, enabling chained field
/// mutation. Call [`id`](CommunityRef::id) to terminate the chain.
pub struct CommunityRef<'a> {
    scenario: &'a mut Scenario,
    index: usize,
}

impl<'a> CommunityRef<'a> {
    fn data_mut(&mut self) -> &mut Community {
        &mut self.scenario.communities[self.index]
    }

    pub fn class(mut self, v: CommunityClass) -> Self {
        self.data_mut().class = v;
        self
    }

    pub fn resilience(mut self, v: f64) -> Self {
        self.data_mut().cultural_resilience = v;
        self
    }

    pub fn infrastructure(mut self, v: f64) -> Self {
        self.data_mut().infrastructure_strength = v;
        self
    }

    pub fn threshold(mut self, v: f64) -> Self {
        self.data_mut().adoption_threshold = v;
        self
    }

    pub fn access(mut self, v: f64) -> Self {
        self.data_mut().digital_access_score = v;
        self
    }

    pub fn wellbeing(mut self, v: f64) -> Self {
        self.data_mut().wellbeing = v;
        self
    }

    /// Start the scenario with the technology already adopted.
    pub fn adopted(mut self) -> Self {
        self.data_mut().adopt();
        self
    }

    /// Start the scenario already banned.
    pub fn banned(mut self) -> Self {
        self.data_mut().ban();
        self
    }

    /// Start the scenario already collapsed.
    pub fn collapsed(mut self) -> Self {
        self.data_mut().collapse();
        self
    }

    /// Escape hatch: apply an arbitrary closure to the community.
    pub fn with(mut self, f: impl FnOnce(&mut Community)) -> Self {
        f(self.data_mut());
        self
    }

    /// Terminate the chain and return the community ID.
    pub fn id(self) -> CommunityId {
        self.scenario.communities[self.index].id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_assigns_sequential_ids() {
        let mut s = Scenario::new();
        let a = s.community().id();
        let b = s.community().id();
        assert_eq!(a, CommunityId(1));
        assert_eq!(b, CommunityId(2));
    }

    #[test]
    fn chained_setters_apply() {
        let mut s = Scenario::new();
        let id = s
            .community()
            .resilience(0.05)
            .infrastructure(12.0)
            .threshold(0.1)
            .access(1.0)
            .id();
        let sim = s.build();
        let c = sim.community(id).unwrap();
        assert_eq!(c.infrastructure_strength, 12.0);
        assert_eq!(c.adoption_threshold, 0.1);
    }

    #[test]
    fn links_land_in_the_network() {
        let mut s = Scenario::new();
        let a = s.community().id();
        let b = s.community().id();
        let sim = s.link(a, b).build();
        assert!(sim.network().are_linked(a, b));
        assert_eq!(sim.network().len(), 2);
    }

    #[test]
    fn prebuilt_states_survive_into_the_simulation() {
        let mut s = Scenario::new();
        let a = s.community().collapsed().id();
        let b = s.community().adopted().wellbeing(60.0).id();
        let sim = s.build();
        assert!(sim.community(a).unwrap().collapsed());
        assert!(sim.community(b).unwrap().adopted());
    }
}
