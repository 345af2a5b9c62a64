//! Per-node search state: partitioned domains, weight accumulators, results
//! and the entropy queue.
//!
//! A node's domain is a slice of length `K` inside one flat buffer. Slots
//! `0..entropy` hold live candidates; the tail keeps removed states in the
//! order they left so that restoring the most recent removal is one swap.

use crate::queue::IndexedPriorityQueue;
use crate::topology::Topology;
use wfc_rules::{CompatibilityOracle, TileId};

/// Direction of a weight update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Contribution {
    Add,
    Subtract,
}

/// Search state of every node.
///
/// `weights[m][b]` is the sum of `oracle.weight(a, b, d)` over every
/// neighbour `n` of `m` (with `d` pointing from `n` to `m`) and every live
/// candidate `a` of `n`. Commands keep it in step with the domains.
#[derive(Debug, Clone)]
pub struct Wave {
    num_states: usize,
    entropy: Vec<usize>,
    domains: Vec<TileId>,
    weights: Vec<u64>,
    results: Vec<Option<TileId>>,
    ordered_results: Vec<usize>,
    queue: IndexedPriorityQueue<usize>,
}

impl Wave {
    /// Every node starts with all `num_states` candidates and zero weights.
    /// The queue starts empty.
    pub fn new(node_count: usize, num_states: usize) -> Self {
        let domains = (0..node_count)
            .flat_map(|_| (0..num_states).map(TileId))
            .collect();
        Self {
            num_states,
            entropy: vec![num_states; node_count],
            domains,
            weights: vec![0; node_count * num_states],
            results: vec![None; node_count],
            ordered_results: Vec::with_capacity(node_count),
            queue: IndexedPriorityQueue::new(node_count),
        }
    }

    /// Builds a wave over `topology` with every candidate of every node
    /// contributing to its neighbours' accumulators.
    pub fn for_topology<O: CompatibilityOracle + ?Sized>(topology: &Topology, oracle: &O) -> Self {
        let mut wave = Self::new(topology.node_count(), oracle.num_states());
        for node in 0..topology.node_count() {
            for state in 0..wave.num_states {
                wave.contribute(topology, oracle, node, TileId(state), Contribution::Add);
            }
        }
        wave
    }

    /// Adds or removes what `state` at `node` contributes to its neighbours.
    pub(crate) fn contribute<O: CompatibilityOracle + ?Sized>(
        &mut self,
        topology: &Topology,
        oracle: &O,
        node: usize,
        state: TileId,
        mode: Contribution,
    ) {
        for (direction, neighbor) in topology.neighbors(node) {
            let accumulators = self.weights_mut(neighbor);
            for (candidate, accumulator) in accumulators.iter_mut().enumerate() {
                let weight = u64::from(oracle.weight(state, TileId(candidate), direction));
                match mode {
                    Contribution::Add => *accumulator += weight,
                    Contribution::Subtract => *accumulator -= weight,
                }
            }
        }
    }

    /// Number of nodes the wave covers.
    pub fn node_count(&self) -> usize {
        self.entropy.len()
    }

    /// Number of states `K` every domain starts with.
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Live candidate count of `node`.
    #[inline]
    pub fn entropy(&self, node: usize) -> usize {
        self.entropy[node]
    }

    /// Live candidate counts of all nodes.
    pub fn entropies(&self) -> &[usize] {
        &self.entropy
    }

    /// Live candidates of `node`, in slot order.
    #[inline]
    pub fn domain(&self, node: usize) -> &[TileId] {
        let start = node * self.num_states;
        &self.domains[start..start + self.entropy[node]]
    }

    /// Full domain of `node` including the removed tail.
    pub fn full_domain(&self, node: usize) -> &[TileId] {
        let start = node * self.num_states;
        &self.domains[start..start + self.num_states]
    }

    /// State held at `slot` of `node`, live or not.
    #[inline]
    pub fn state_at(&self, node: usize, slot: usize) -> TileId {
        self.domains[node * self.num_states + slot]
    }

    /// Slot currently holding `state` among the live candidates of `node`.
    pub fn slot_of(&self, node: usize, state: TileId) -> Option<usize> {
        self.domain(node).iter().position(|&s| s == state)
    }

    /// Weight accumulators of `node`, indexed by state.
    pub fn weights(&self, node: usize) -> &[u64] {
        let start = node * self.num_states;
        &self.weights[start..start + self.num_states]
    }

    pub(crate) fn weights_mut(&mut self, node: usize) -> &mut [u64] {
        let start = node * self.num_states;
        &mut self.weights[start..start + self.num_states]
    }

    /// Accumulated weight of each live candidate, in slot order.
    pub fn candidate_weights(&self, node: usize) -> Vec<u64> {
        let weights = self.weights(node);
        self.domain(node).iter().map(|state| weights[state.0]).collect()
    }

    /// Chosen state of `node`, if it is collapsed.
    pub fn result(&self, node: usize) -> Option<TileId> {
        self.results[node]
    }

    /// Chosen state of every node.
    pub fn results(&self) -> &[Option<TileId>] {
        &self.results
    }

    /// Nodes in the order they were collapsed.
    pub fn ordered_results(&self) -> &[usize] {
        &self.ordered_results
    }

    /// Number of collapsed nodes.
    pub fn result_count(&self) -> usize {
        self.ordered_results.len()
    }

    /// Open nodes keyed by entropy.
    pub fn queue(&self) -> &IndexedPriorityQueue<usize> {
        &self.queue
    }

    pub(crate) fn queue_mut(&mut self) -> &mut IndexedPriorityQueue<usize> {
        &mut self.queue
    }

    fn swap_slots(&mut self, node: usize, a: usize, b: usize) {
        let base = node * self.num_states;
        self.domains.swap(base + a, base + b);
    }

    /// Moves the candidate at `slot` to the head of the removed tail.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not a live slot.
    pub(crate) fn remove_slot(&mut self, node: usize, slot: usize) {
        let live = self.entropy[node];
        assert!(slot < live, "slot {slot} of node {node} is not live ({live})");
        self.swap_slots(node, slot, live - 1);
        self.entropy[node] = live - 1;
        if self.queue.contains(node) {
            self.queue.update(node, live - 1);
        }
    }

    /// Inverse of [`Wave::remove_slot`] for the most recent removal at `node`.
    ///
    /// # Panics
    ///
    /// Panics if the domain has no removed tail.
    pub(crate) fn restore_slot(&mut self, node: usize, slot: usize) {
        let live = self.entropy[node];
        assert!(
            live < self.num_states && slot <= live,
            "node {node} has nothing to restore into slot {slot}"
        );
        self.swap_slots(node, slot, live);
        self.entropy[node] = live + 1;
        if self.queue.contains(node) {
            self.queue.update(node, live + 1);
        }
    }

    /// Freezes `node` to the candidate at `slot`. Returns the entropy it had.
    ///
    /// # Panics
    ///
    /// Panics if the node is already collapsed, still queued, or `slot` is not live.
    pub(crate) fn collapse_slot(&mut self, node: usize, slot: usize) -> usize {
        assert!(self.results[node].is_none(), "node {node} is already collapsed");
        assert!(!self.queue.contains(node), "node {node} is still queued");
        let live = self.entropy[node];
        assert!(slot < live, "slot {slot} of node {node} is not live ({live})");
        self.swap_slots(node, 0, slot);
        self.entropy[node] = 1;
        self.results[node] = Some(self.state_at(node, 0));
        self.ordered_results.push(node);
        live
    }

    /// Inverse of [`Wave::collapse_slot`]; puts the node back in the queue.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not the most recently collapsed node.
    pub(crate) fn uncollapse(&mut self, node: usize, slot: usize, prior_entropy: usize) {
        assert_eq!(
            self.ordered_results.last(),
            Some(&node),
            "node {node} is not the most recent collapse"
        );
        self.ordered_results.pop();
        self.results[node] = None;
        self.swap_slots(node, 0, slot);
        self.entropy[node] = prior_entropy;
        self.queue.insert(node, prior_entropy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoundaryCondition;
    use wfc_rules::AdjacencyRules;

    #[test]
    fn test_remove_and_restore_are_inverse() {
        let mut wave = Wave::new(2, 4);
        wave.queue_mut().insert(0, 4);
        let before = wave.full_domain(0).to_vec();

        wave.remove_slot(0, 1);
        wave.remove_slot(0, 0);
        assert_eq!(wave.entropy(0), 2);
        assert_eq!(wave.queue().priority(0), Some(2));
        assert!(!wave.domain(0).contains(&TileId(1)));
        assert!(!wave.domain(0).contains(&TileId(0)));

        wave.restore_slot(0, 0);
        wave.restore_slot(0, 1);
        assert_eq!(wave.full_domain(0), before.as_slice());
        assert_eq!(wave.queue().priority(0), Some(4));
    }

    #[test]
    fn test_collapse_and_uncollapse() {
        let mut wave = Wave::new(1, 3);
        wave.remove_slot(0, 0);
        let slot = wave.slot_of(0, TileId(2)).unwrap();
        let prior = wave.collapse_slot(0, slot);
        assert_eq!(prior, 2);
        assert_eq!(wave.domain(0), &[TileId(2)]);
        assert_eq!(wave.result(0), Some(TileId(2)));
        assert_eq!(wave.ordered_results(), &[0]);

        wave.uncollapse(0, slot, prior);
        assert_eq!(wave.entropy(0), 2);
        assert_eq!(wave.result(0), None);
        assert_eq!(wave.queue().priority(0), Some(2));
        assert!(wave.ordered_results().is_empty());
    }

    #[test]
    fn test_for_topology_seeds_neighbour_weights() {
        let topology = Topology::grid(3, 1, 1, BoundaryCondition::Finite).unwrap();
        let rules = AdjacencyRules::from_weighted_tuples(
            2,
            4,
            vec![
                (0, TileId(0), TileId(1), 3),
                (1, TileId(1), TileId(0), 3),
                (0, TileId(1), TileId(1), 1),
                (1, TileId(1), TileId(1), 1),
            ],
        );
        let wave = Wave::for_topology(&topology, &rules);
        // Node 0 only hears from node 1 along -x.
        assert_eq!(wave.weights(0), &[3, 1]);
        // Node 1 hears from node 0 along +x and node 2 along -x.
        assert_eq!(wave.weights(1), &[3, 5]);
        assert_eq!(wave.weights(2), &[0, 4]);
        assert!(wave.queue().is_empty());
    }

    #[test]
    #[should_panic(expected = "not live")]
    fn test_remove_dead_slot_panics() {
        let mut wave = Wave::new(1, 2);
        wave.remove_slot(0, 1);
        wave.remove_slot(0, 1);
    }
}
