use std::collections::BTreeMap;

use rand::Rng;

use crate::id::CommunityId;

/// Ring-lattice degree used by the small-world builder.
pub const SMALL_WORLD_K: usize = 4;
/// Edge rewiring probability used by the small-world builder.
pub const SMALL_WORLD_REWIRE_P: f64 = 0.3;

/// Undirected influence graph over community identifiers.
///
/// Built once at simulation construction and never mutated afterwards.
/// BTreeMap with sorted neighbor lists for deterministic iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfluenceNetwork {
    adjacency: BTreeMap<CommunityId, Vec<CommunityId>>,
}

impl InfluenceNetwork {
    /// An edgeless network over the given nodes.
    pub fn with_nodes(ids: &[CommunityId]) -> Self {
        let mut network = Self::default();
        for &id in ids {
            network.adjacency.entry(id).or_default();
        }
        network
    }

    /// Watts-Strogatz small world: each node linked to its `k` nearest ring
    /// neighbors, then each rightward lattice edge rewired with probability
    /// `p` to a uniformly chosen non-neighbor. Ring order follows `ids`.
    ///
    /// Drawn entirely from the supplied stream, so a fixed seed yields an
    /// identical topology.
    pub fn small_world(ids: &[CommunityId], k: usize, p: f64, rng: &mut impl Rng) -> Self {
        let mut network = Self::with_nodes(ids);
        let n = ids.len();
        if n < 2 {
            return network;
        }

        let half = k / 2;
        for j in 1..=half {
            for i in 0..n {
                let target = ids[(i + j) % n];
                if target != ids[i] {
                    network.add_edge(ids[i], target);
                }
            }
        }

        // Rewire rightward lattice edges. Skip nodes already connected to
        // everyone; picking the original endpoint again is a no-op rewire.
        for j in 1..=half {
            for i in 0..n {
                let source = ids[i];
                let old_target = ids[(i + j) % n];
                if old_target == source || !network.are_linked(source, old_target) {
                    continue;
                }
                if rng.random_range(0.0..1.0) >= p {
                    continue;
                }
                if network.degree(source) >= n - 1 {
                    continue;
                }
                network.remove_edge(source, old_target);
                let candidates: Vec<CommunityId> = ids
                    .iter()
                    .copied()
                    .filter(|&c| c != source && !network.are_linked(source, c))
                    .collect();
                let pick = candidates[rng.random_range(0..candidates.len())];
                network.add_edge(source, pick);
            }
        }

        network
    }

    /// Add a bidirectional edge. Maintains sorted neighbor lists.
    pub fn add_edge(&mut self, a: CommunityId, b: CommunityId) {
        let a_neighbors = self.adjacency.entry(a).or_default();
        if let Err(pos) = a_neighbors.binary_search(&b) {
            a_neighbors.insert(pos, b);
        }

        let b_neighbors = self.adjacency.entry(b).or_default();
        if let Err(pos) = b_neighbors.binary_search(&a) {
            b_neighbors.insert(pos, a);
        }
    }

    fn remove_edge(&mut self, a: CommunityId, b: CommunityId) {
        if let Some(neighbors) = self.adjacency.get_mut(&a)
            && let Ok(pos) = neighbors.binary_search(&b)
        {
            neighbors.remove(pos);
        }
        if let Some(neighbors) = self.adjacency.get_mut(&b)
            && let Ok(pos) = neighbors.binary_search(&a)
        {
            neighbors.remove(pos);
        }
    }

    /// Sorted neighbors of a community; empty for isolated or unknown ids.
    pub fn neighbors(&self, id: CommunityId) -> &[CommunityId] {
        self.adjacency.get(&id).map_or(&[], |v| v.as_slice())
    }

    pub fn are_linked(&self, a: CommunityId, b: CommunityId) -> bool {
        self.adjacency
            .get(&a)
            .is_some_and(|neighbors| neighbors.binary_search(&b).is_ok())
    }

    pub fn contains(&self, id: CommunityId) -> bool {
        self.adjacency.contains_key(&id)
    }

    pub fn degree(&self, id: CommunityId) -> usize {
        self.neighbors(id).len()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = CommunityId> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn ids(n: u64) -> Vec<CommunityId> {
        (1..=n).map(CommunityId).collect()
    }

    #[test]
    fn edges_are_bidirectional_and_sorted() {
        let mut network = InfluenceNetwork::with_nodes(&ids(4));
        network.add_edge(CommunityId(3), CommunityId(1));
        network.add_edge(CommunityId(3), CommunityId(2));

        assert_eq!(
            network.neighbors(CommunityId(3)),
            &[CommunityId(1), CommunityId(2)]
        );
        assert!(network.are_linked(CommunityId(1), CommunityId(3)));
        assert!(!network.are_linked(CommunityId(1), CommunityId(2)));
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut network = InfluenceNetwork::with_nodes(&ids(2));
        network.add_edge(CommunityId(1), CommunityId(2));
        network.add_edge(CommunityId(2), CommunityId(1));
        assert_eq!(network.degree(CommunityId(1)), 1);
    }

    #[test]
    fn isolated_and_unknown_nodes_have_no_neighbors() {
        let network = InfluenceNetwork::with_nodes(&ids(2));
        assert!(network.neighbors(CommunityId(1)).is_empty());
        assert!(network.neighbors(CommunityId(99)).is_empty());
        assert!(network.contains(CommunityId(1)));
        assert!(!network.contains(CommunityId(99)));
    }

    #[test]
    fn small_world_covers_exactly_the_given_nodes() {
        let mut rng = SmallRng::seed_from_u64(11);
        let nodes = ids(30);
        let network =
            InfluenceNetwork::small_world(&nodes, SMALL_WORLD_K, SMALL_WORLD_REWIRE_P, &mut rng);
        assert_eq!(network.len(), 30);
        let got: Vec<CommunityId> = network.node_ids().collect();
        assert_eq!(got, nodes);
    }

    #[test]
    fn small_world_without_rewiring_is_a_ring_lattice() {
        let mut rng = SmallRng::seed_from_u64(1);
        let network = InfluenceNetwork::small_world(&ids(10), 4, 0.0, &mut rng);
        for id in ids(10) {
            assert_eq!(network.degree(id), 4, "node {id} should keep lattice degree");
        }
    }

    #[test]
    fn small_world_preserves_edge_count_under_rewiring() {
        let mut rng = SmallRng::seed_from_u64(7);
        let network = InfluenceNetwork::small_world(&ids(40), 4, 0.3, &mut rng);
        let total_degree: usize = ids(40).iter().map(|&id| network.degree(id)).sum();
        // Rewiring moves edges, it never creates or destroys them.
        assert_eq!(total_degree, 40 * 4);
    }

    #[test]
    fn small_world_is_deterministic_for_a_fixed_seed() {
        let a = InfluenceNetwork::small_world(&ids(25), 4, 0.3, &mut SmallRng::seed_from_u64(42));
        let b = InfluenceNetwork::small_world(&ids(25), 4, 0.3, &mut SmallRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn tiny_populations_do_not_panic() {
        let mut rng = SmallRng::seed_from_u64(5);
        let one = InfluenceNetwork::small_world(&ids(1), 4, 0.3, &mut rng);
        assert_eq!(one.degree(CommunityId(1)), 0);

        let two = InfluenceNetwork::small_world(&ids(2), 4, 0.3, &mut rng);
        assert!(two.are_linked(CommunityId(1), CommunityId(2)));

        let three = InfluenceNetwork::small_world(&ids(3), 4, 0.3, &mut rng);
        for id in ids(3) {
            assert_eq!(three.degree(id), 2);
        }
    }
}
