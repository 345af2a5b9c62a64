//! Constraint propagation outward from a changed node.

use crate::history::{Command, CommandLog};
use crate::topology::Topology;
use crate::wave::Wave;
use bitvec::prelude::*;
use log::trace;
use thiserror::Error;
use wfc_rules::CompatibilityOracle;

/// Errors that can occur during the constraint propagation phase of WFC.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PropagationError {
    /// Pruning would have left the node with no candidate at all.
    #[error("Contradiction detected during propagation at node {0}")]
    Contradiction(usize),
}

/// Depth-first pruning driven by an explicit stack.
///
/// Each frame is `(node, next direction)`, so the walk visits neighbours in
/// the same order a recursive fan-out would. A node gets a fresh frame every
/// time it shrinks, so its neighbours are re-pruned against the smaller
/// domain. The visited marker only limits step notifications to one per node
/// and is cleared when the next pass starts.
#[derive(Debug, Clone)]
pub struct Propagator {
    visited: BitVec,
    stack: Vec<(usize, usize)>,
}

impl Propagator {
    pub fn new(node_count: usize) -> Self {
        Self {
            visited: bitvec![0; node_count],
            stack: Vec::new(),
        }
    }

    /// Prunes the neighbourhood of `origin` until nothing else changes.
    ///
    /// For every neighbour, each live candidate that no live state of the
    /// current node supports is removed through `history`. `on_step` fires
    /// the first time a node shrinks during the pass.
    ///
    /// # Errors
    ///
    /// Returns `PropagationError::Contradiction` as soon as a neighbour would
    /// lose its last candidate. Removals made before that point stay in
    /// `history` so the caller can rewind them.
    pub fn propagate<O: CompatibilityOracle + ?Sized>(
        &mut self,
        origin: usize,
        wave: &mut Wave,
        history: &mut CommandLog,
        topology: &Topology,
        oracle: &O,
        on_step: &mut dyn FnMut(usize, &Wave),
    ) -> Result<(), PropagationError> {
        self.visited.fill(false);
        self.stack.clear();
        self.visited.set(origin, true);
        self.stack.push((origin, 0));

        while let Some(frame) = self.stack.last_mut() {
            let (node, direction) = *frame;
            if direction >= topology.arity() {
                self.stack.pop();
                continue;
            }
            frame.1 += 1;
            let Some(neighbor) = topology.neighbor(node, direction) else {
                continue;
            };
            let changed = prune(node, neighbor, direction, wave, history, topology, oracle)?;
            if changed {
                if !self.visited[neighbor] {
                    self.visited.set(neighbor, true);
                    on_step(neighbor, wave);
                }
                self.stack.push((neighbor, 0));
            }
        }
        Ok(())
    }
}

/// Removes the candidates of `neighbor` left unsupported by `node`.
/// Returns whether anything was removed.
fn prune<O: CompatibilityOracle + ?Sized>(
    node: usize,
    neighbor: usize,
    direction: usize,
    wave: &mut Wave,
    history: &mut CommandLog,
    topology: &Topology,
    oracle: &O,
) -> Result<bool, PropagationError> {
    let mut changed = false;
    // Walking backwards keeps unvisited slots in place: a removal only swaps
    // with the last live slot, which has already been checked.
    let mut slot = wave.entropy(neighbor);
    while slot > 0 {
        slot -= 1;
        let candidate = wave.state_at(neighbor, slot);
        let supported = wave
            .domain(node)
            .iter()
            .any(|&state| oracle.is_compatible(state, candidate, direction));
        if supported {
            continue;
        }
        if wave.entropy(neighbor) == 1 {
            return Err(PropagationError::Contradiction(neighbor));
        }
        trace!("Removing {candidate:?} from node {neighbor} (unsupported by node {node})");
        history.execute(
            Command::Remove {
                node: neighbor,
                slot,
            },
            wave,
            topology,
            oracle,
        );
        changed = true;
    }
    Ok(changed)
}
