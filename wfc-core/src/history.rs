//! Reversible edits to the [`Wave`] and the undo stack that records them.

use crate::topology::Topology;
use crate::wave::{Contribution, Wave};
use wfc_rules::{CompatibilityOracle, TileId};

/// One reversible edit. Each variant carries exactly what its inverse needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Drop the candidate at `slot` from an open node.
    Remove { node: usize, slot: usize },
    /// Freeze `node` to the candidate at `slot`; `prior_entropy` is the live
    /// count before the collapse.
    Collapse {
        node: usize,
        slot: usize,
        prior_entropy: usize,
    },
}

impl Command {
    pub fn node(&self) -> usize {
        match *self {
            Self::Remove { node, .. } | Self::Collapse { node, .. } => node,
        }
    }

    pub fn is_collapse(&self) -> bool {
        matches!(self, Self::Collapse { .. })
    }

    /// Applies the edit. Every state leaving the live domain takes its
    /// contribution out of the neighbours' accumulators first.
    pub(crate) fn apply<O: CompatibilityOracle + ?Sized>(
        &mut self,
        wave: &mut Wave,
        topology: &Topology,
        oracle: &O,
    ) {
        match self {
            Self::Remove { node, slot } => {
                let state = wave.state_at(*node, *slot);
                wave.contribute(topology, oracle, *node, state, Contribution::Subtract);
                wave.remove_slot(*node, *slot);
            }
            Self::Collapse {
                node,
                slot,
                prior_entropy,
            } => {
                for state in others(wave, *node, *slot) {
                    wave.contribute(topology, oracle, *node, state, Contribution::Subtract);
                }
                *prior_entropy = wave.collapse_slot(*node, *slot);
            }
        }
    }

    /// Undoes the edit. Must run in exact reverse order of `apply`.
    pub(crate) fn revert<O: CompatibilityOracle + ?Sized>(
        &self,
        wave: &mut Wave,
        topology: &Topology,
        oracle: &O,
    ) {
        match *self {
            Self::Remove { node, slot } => {
                wave.restore_slot(node, slot);
                let state = wave.state_at(node, slot);
                wave.contribute(topology, oracle, node, state, Contribution::Add);
            }
            Self::Collapse {
                node,
                slot,
                prior_entropy,
            } => {
                wave.uncollapse(node, slot, prior_entropy);
                for state in others(wave, node, slot) {
                    wave.contribute(topology, oracle, node, state, Contribution::Add);
                }
            }
        }
    }
}

/// Live candidates of `node` other than the one at `slot`.
fn others(wave: &Wave, node: usize, slot: usize) -> Vec<TileId> {
    wave.domain(node)
        .iter()
        .enumerate()
        .filter(|&(s, _)| s != slot)
        .map(|(_, &state)| state)
        .collect()
}

/// Append-only stack of applied commands, consumed back to front on undo.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    commands: Vec<Command>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Applies `command` and pushes it. Returns its position in the log.
    pub fn execute<O: CompatibilityOracle + ?Sized>(
        &mut self,
        mut command: Command,
        wave: &mut Wave,
        topology: &Topology,
        oracle: &O,
    ) -> usize {
        command.apply(wave, topology, oracle);
        self.commands.push(command);
        self.commands.len() - 1
    }

    /// Pops and reverts the most recent command.
    pub fn undo_last<O: CompatibilityOracle + ?Sized>(
        &mut self,
        wave: &mut Wave,
        topology: &Topology,
        oracle: &O,
    ) -> Option<Command> {
        let command = self.commands.pop()?;
        command.revert(wave, topology, oracle);
        Some(command)
    }

    /// Reverts every command at `position` or later, newest first.
    ///
    /// Returns the command that sat at `position`, or `None` if the log was
    /// already shorter.
    pub fn rewind_to<O: CompatibilityOracle + ?Sized>(
        &mut self,
        position: usize,
        wave: &mut Wave,
        topology: &Topology,
        oracle: &O,
    ) -> Option<Command> {
        let mut last = None;
        while self.commands.len() > position {
            last = self.undo_last(wave, topology, oracle);
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoundaryCondition;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use wfc_rules::AdjacencyRules;

    fn weighted_rules() -> AdjacencyRules {
        let mut tuples = Vec::new();
        for axis in 0..4 {
            for a in 0..3 {
                for b in 0..3 {
                    tuples.push((axis, TileId(a), TileId(b), (a * 3 + b + axis) as u32));
                }
            }
        }
        AdjacencyRules::from_weighted_tuples(3, 4, tuples)
    }

    /// Accumulators recomputed from scratch out of the live domains.
    fn expected_weights(wave: &Wave, topology: &Topology, rules: &AdjacencyRules) -> Vec<Vec<u64>> {
        let mut expected = vec![vec![0u64; wave.num_states()]; wave.node_count()];
        for node in 0..wave.node_count() {
            for (direction, neighbor) in topology.neighbors(node) {
                for &state in wave.domain(node) {
                    for (candidate, total) in expected[neighbor].iter_mut().enumerate() {
                        *total += u64::from(rules.weight(state, TileId(candidate), direction));
                    }
                }
            }
        }
        expected
    }

    fn actual_weights(wave: &Wave) -> Vec<Vec<u64>> {
        (0..wave.node_count()).map(|n| wave.weights(n).to_vec()).collect()
    }

    #[test]
    fn test_collapse_drops_other_candidates_from_weights() {
        let topology = Topology::grid(3, 1, 1, BoundaryCondition::Finite).unwrap();
        let rules = weighted_rules();
        let mut wave = Wave::for_topology(&topology, &rules);
        let mut log = CommandLog::new();
        assert_eq!(wave.weights(2), &[9, 12, 15]);
        assert_eq!(wave.weights(0), &[12, 15, 18]);
        assert_eq!(wave.weights(1), &[21, 27, 33]);

        let slot = wave.slot_of(1, TileId(2)).unwrap();
        log.execute(
            Command::Collapse {
                node: 1,
                slot,
                prior_entropy: 0,
            },
            &mut wave,
            &topology,
            &rules,
        );
        // Node 2 sits on node 1's +x side, node 0 on its -x side.
        assert_eq!(wave.weights(2), &[6, 7, 8]);
        assert_eq!(wave.weights(0), &[7, 8, 9]);
        assert_eq!(wave.weights(1), &[21, 27, 33]);
        assert!(matches!(
            log.commands()[0],
            Command::Collapse {
                prior_entropy: 3,
                ..
            }
        ));

        let undone = log.undo_last(&mut wave, &topology, &rules).unwrap();
        assert!(undone.is_collapse());
        assert_eq!(undone.node(), 1);
        assert_eq!(wave.weights(2), &[9, 12, 15]);
        assert_eq!(wave.weights(0), &[12, 15, 18]);
        assert_eq!(wave.result(1), None);
        assert!(log.is_empty());
    }

    #[test]
    fn test_remove_on_open_node_updates_neighbour_weights() {
        let topology = Topology::grid(3, 1, 1, BoundaryCondition::Finite).unwrap();
        let rules = weighted_rules();
        let mut wave = Wave::for_topology(&topology, &rules);
        let mut log = CommandLog::new();

        let slot = wave.slot_of(1, TileId(0)).unwrap();
        log.execute(Command::Remove { node: 1, slot }, &mut wave, &topology, &rules);
        assert_eq!(wave.entropy(1), 2);
        assert_eq!(wave.weights(2), &[9, 11, 13]);
        assert_eq!(wave.weights(0), &[11, 13, 15]);
        assert_eq!(actual_weights(&wave), expected_weights(&wave, &topology, &rules));

        log.undo_last(&mut wave, &topology, &rules).unwrap();
        assert_eq!(wave.weights(2), &[9, 12, 15]);
        assert_eq!(wave.weights(0), &[12, 15, 18]);
    }

    #[test]
    fn test_uniform_line_removal_keeps_weights_consistent() {
        let topology = Topology::grid(3, 1, 1, BoundaryCondition::Finite).unwrap();
        let rules = AdjacencyRules::from_weighted_tuples(
            2,
            4,
            (0..4).flat_map(|axis| {
                (0..2).flat_map(move |a| (0..2).map(move |b| (axis, TileId(a), TileId(b), 5)))
            }),
        );
        let mut wave = Wave::for_topology(&topology, &rules);
        let mut log = CommandLog::new();
        log.execute(Command::Remove { node: 1, slot: 0 }, &mut wave, &topology, &rules);
        assert_eq!(wave.weights(0), &[5, 5]);
        assert_eq!(wave.weights(2), &[5, 5]);
        log.undo_last(&mut wave, &topology, &rules).unwrap();
        assert_eq!(wave.weights(0), &[10, 10]);
        assert_eq!(wave.weights(2), &[10, 10]);
    }

    #[test]
    fn test_rewind_returns_command_at_position() {
        let topology = Topology::grid(2, 1, 1, BoundaryCondition::Finite).unwrap();
        let rules = AdjacencyRules::uniform(3, 4);
        let mut wave = Wave::for_topology(&topology, &rules);
        wave.queue_mut().insert(1, 3);
        let mut log = CommandLog::new();

        log.execute(Command::Remove { node: 1, slot: 0 }, &mut wave, &topology, &rules);
        let position = log.execute(
            Command::Collapse {
                node: 0,
                slot: 1,
                prior_entropy: 0,
            },
            &mut wave,
            &topology,
            &rules,
        );
        log.execute(Command::Remove { node: 1, slot: 1 }, &mut wave, &topology, &rules);
        assert_eq!(wave.entropy(1), 1);

        let reverted = log.rewind_to(position, &mut wave, &topology, &rules);
        assert_eq!(reverted.map(|c| c.node()), Some(0));
        assert_eq!(log.len(), 1);
        assert_eq!(wave.entropy(1), 2);
        assert_eq!(wave.queue().priority(0), Some(3));
        assert_eq!(log.rewind_to(5, &mut wave, &topology, &rules), None);
    }

    type Snapshot = (
        Vec<usize>,
        Vec<Vec<TileId>>,
        Vec<Vec<u64>>,
        Vec<Option<usize>>,
        Vec<Option<TileId>>,
    );

    fn snapshot(wave: &Wave) -> Snapshot {
        let nodes = 0..wave.node_count();
        (
            wave.entropies().to_vec(),
            nodes.clone().map(|n| wave.full_domain(n).to_vec()).collect(),
            nodes.map(|n| wave.weights(n).to_vec()).collect(),
            wave.queue().priorities().to_vec(),
            wave.results().to_vec(),
        )
    }

    proptest! {
        #[test]
        fn collapse_then_removals_undo_exactly(seed in any::<u64>(), removals in 0usize..24) {
            let topology = Topology::grid(3, 3, 1, BoundaryCondition::Periodic).unwrap();
            let rules = weighted_rules();
            let mut wave = Wave::for_topology(&topology, &rules);
            for node in 0..9 {
                wave.queue_mut().insert(node, 3);
            }
            let before = snapshot(&wave);
            let mut rng = StdRng::seed_from_u64(seed);
            let mut log = CommandLog::new();

            let node = rng.gen_range(0..9);
            wave.queue_mut().remove(node);
            let slot = rng.gen_range(0..3);
            log.execute(Command::Collapse { node, slot, prior_entropy: 0 }, &mut wave, &topology, &rules);
            prop_assert_eq!(actual_weights(&wave), expected_weights(&wave, &topology, &rules));

            for _ in 0..removals {
                let open: Vec<usize> = (0..9)
                    .filter(|&n| wave.result(n).is_none() && wave.entropy(n) > 1)
                    .collect();
                if open.is_empty() {
                    break;
                }
                let target = open[rng.gen_range(0..open.len())];
                let slot = rng.gen_range(0..wave.entropy(target));
                log.execute(Command::Remove { node: target, slot }, &mut wave, &topology, &rules);
                prop_assert_eq!(actual_weights(&wave), expected_weights(&wave, &topology, &rules));
            }

            while log.undo_last(&mut wave, &topology, &rules).is_some() {}
            prop_assert_eq!(snapshot(&wave), before);
        }
    }
}
