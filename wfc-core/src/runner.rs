use crate::entropy::select_candidate;
use crate::history::{Command, CommandLog};
use crate::propagator::{PropagationError, Propagator};
use crate::queue::IndexedPriorityQueue;
use crate::topology::Topology;
use crate::wave::Wave;
use crate::WfcError;
use bitvec::prelude::*;
use log::{debug, error, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wfc_rules::{CompatibilityOracle, TileId};

/// Called at the two suspension points. Returning `Break` asks the solver to
/// stop at the top of its next iteration.
pub type StepCallback = Box<dyn FnMut(&StepInfo) -> ControlFlow<()> + Send>;

/// Which suspension point produced a [`StepInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StepEvent {
    /// A node shrank and propagation entered it.
    Propagated,
    /// A collapse and its propagation finished.
    Collapsed,
}

/// Snapshot handed to the step callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepInfo {
    /// What just happened.
    pub event: StepEvent,
    /// The node that shrank or was collapsed.
    pub node: usize,
    /// Nodes holding a result at this point.
    pub collapsed_nodes: usize,
    /// Node count of the topology.
    pub total_nodes: usize,
    /// Main loop iterations so far.
    pub iteration: u64,
    /// Backtracks performed so far.
    pub backtracks: u64,
}

/// Global solver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolverState {
    /// Constructed, `run` not called yet.
    Ready,
    Running,
    Backtracking,
    Succeeded,
    Failed,
    Cancelled,
}

/// Outcome of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Verdict {
    /// Every node holds a result satisfying all constraints.
    Succeeded,
    /// Backtracking ran out of alternatives.
    Failed,
    /// Stopped on request; results are partial.
    Cancelled,
}

/// Counters collected during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolveStats {
    /// Main loop passes, collapse and backtrack alike.
    pub iterations: u64,
    pub backtracks: u64,
    pub collapses: u64,
    pub elapsed: Duration,
}

/// Configuration options for the solver.
pub struct SolverConfig {
    pub seed: Option<u64>,
    pub shutdown_signal: Arc<AtomicBool>,
    pub step_callback: Option<StepCallback>,
    pub max_iterations: Option<u64>,
}

impl SolverConfig {
    /// Creates a new builder for `SolverConfig`.
    pub fn builder() -> SolverConfigBuilder {
        SolverConfigBuilder::default()
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            seed: None,
            shutdown_signal: Arc::new(AtomicBool::new(false)),
            step_callback: None,
            max_iterations: None,
        }
    }
}

/// Builder for `SolverConfig`.
#[derive(Default)]
pub struct SolverConfigBuilder {
    seed: Option<u64>,
    shutdown_signal: Option<Arc<AtomicBool>>,
    step_callback: Option<StepCallback>,
    max_iterations: Option<u64>,
}

impl SolverConfigBuilder {
    /// Sets the seed for the random number generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Provides an external shutdown signal.
    /// If not provided, a new signal will be created.
    pub fn shutdown_signal(mut self, signal: Arc<AtomicBool>) -> Self {
        self.shutdown_signal = Some(signal);
        self
    }

    pub fn step_callback(mut self, callback: StepCallback) -> Self {
        self.step_callback = Some(callback);
        self
    }

    /// Sets the maximum number of iterations allowed.
    pub fn max_iterations(mut self, max: u64) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn build(self) -> SolverConfig {
        SolverConfig {
            seed: self.seed,
            shutdown_signal: self
                .shutdown_signal
                .unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
            step_callback: self.step_callback,
            max_iterations: self.max_iterations,
        }
    }
}

/// Wave Function Collapse search over a fixed topology.
///
/// The solver owns every piece of mutable state. Each collapse made by the
/// main loop is a milestone in the command log; on contradiction the log is
/// rewound to the newest milestone and the tried state is excluded. Seeds are
/// applied before the first milestone and are never undone.
pub struct Solver<O> {
    topology: Topology,
    oracle: O,
    wave: Wave,
    history: CommandLog,
    milestones: Vec<usize>,
    propagator: Propagator,
    seeds: Vec<(usize, TileId)>,
    rng: StdRng,
    config: SolverConfig,
    state: SolverState,
    stats: SolveStats,
    cancel_requested: bool,
}

impl<O: CompatibilityOracle> Solver<O> {
    /// Prepares a solver. Nodes without a seed are queued with priority `K`.
    ///
    /// # Errors
    ///
    /// * `WfcError::Configuration` if the oracle has no states or its
    ///   direction count differs from the topology's arity.
    /// * `WfcError::InvalidSeed` if a seed is out of range or repeats a node.
    pub fn new(
        topology: Topology,
        oracle: O,
        seeds: Vec<(usize, TileId)>,
        config: SolverConfig,
    ) -> Result<Self, WfcError> {
        let num_states = oracle.num_states();
        if num_states == 0 {
            return Err(WfcError::Configuration(
                "oracle defines no states".to_owned(),
            ));
        }
        if oracle.num_directions() != topology.arity() {
            return Err(WfcError::Configuration(format!(
                "oracle has {} directions but the topology has arity {}",
                oracle.num_directions(),
                topology.arity()
            )));
        }

        let node_count = topology.node_count();
        let mut seeded = bitvec![0; node_count];
        for &(node, state) in &seeds {
            if node >= node_count {
                return Err(WfcError::InvalidSeed(format!(
                    "node {node} is outside 0..{node_count}"
                )));
            }
            if state.0 >= num_states {
                return Err(WfcError::InvalidSeed(format!(
                    "state {} at node {node} is outside 0..{num_states}",
                    state.0
                )));
            }
            if seeded[node] {
                return Err(WfcError::InvalidSeed(format!("node {node} is seeded twice")));
            }
            seeded.set(node, true);
        }

        let mut wave = Wave::for_topology(&topology, &oracle);
        for node in seeded.iter_zeros() {
            wave.queue_mut().insert(node, num_states);
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            propagator: Propagator::new(node_count),
            topology,
            oracle,
            wave,
            history: CommandLog::new(),
            milestones: Vec::new(),
            seeds,
            rng,
            config,
            state: SolverState::Ready,
            stats: SolveStats::default(),
            cancel_requested: false,
        })
    }

    /// Runs the search to a verdict.
    ///
    /// # Errors
    ///
    /// * `WfcError::AlreadyStarted` on a second call.
    /// * `WfcError::IncompatibleSeeds` if seeding alone produces a contradiction.
    /// * `WfcError::MaxIterationsReached` when the configured limit is hit.
    /// * `WfcError::Internal` / `WfcError::IncompleteCollapse` if an internal
    ///   invariant breaks.
    pub fn run(&mut self) -> Result<Verdict, WfcError> {
        if self.state != SolverState::Ready {
            return Err(WfcError::AlreadyStarted);
        }
        info!(
            "Starting WFC run over {} nodes with {} states ({} seeds)",
            self.topology.node_count(),
            self.wave.num_states(),
            self.seeds.len()
        );
        let start = Instant::now();
        self.state = SolverState::Running;

        let outcome = self.search();
        self.stats.elapsed = start.elapsed();
        match &outcome {
            Ok(verdict) => info!(
                "WFC run finished: {:?} after {} iterations, {} backtracks in {:?}",
                verdict, self.stats.iterations, self.stats.backtracks, self.stats.elapsed
            ),
            Err(e) => {
                error!("WFC run aborted: {e}");
                self.state = SolverState::Failed;
            }
        }
        outcome
    }

    fn search(&mut self) -> Result<Verdict, WfcError> {
        self.apply_seeds()?;

        if self.seeds.is_empty() && !self.wave.queue().is_empty() {
            let node = self.rng.gen_range(0..self.topology.node_count());
            self.wave.queue_mut().update(node, 0);
            debug!("No seeds given, starting from node {node}");
        }

        loop {
            if self.cancel_requested || self.config.shutdown_signal.load(Ordering::Relaxed) {
                warn!(
                    "WFC run cancelled with {}/{} nodes collapsed",
                    self.wave.result_count(),
                    self.topology.node_count()
                );
                self.state = SolverState::Cancelled;
                return Ok(Verdict::Cancelled);
            }

            if self.state == SolverState::Backtracking {
                self.tick()?;
                if !self.backtrack()? {
                    self.state = SolverState::Failed;
                    return Ok(Verdict::Failed);
                }
                self.state = SolverState::Running;
                continue;
            }

            if self.wave.queue().is_empty() {
                break;
            }
            self.tick()?;
            self.step();
        }

        self.verify_complete()?;
        self.state = SolverState::Succeeded;
        Ok(Verdict::Succeeded)
    }

    fn tick(&mut self) -> Result<(), WfcError> {
        if let Some(max) = self.config.max_iterations {
            if self.stats.iterations >= max {
                warn!("Maximum iterations ({max}) reached");
                return Err(WfcError::MaxIterationsReached(max));
            }
        }
        self.stats.iterations += 1;
        Ok(())
    }

    /// Collapses every seed in order and propagates it. Any contradiction is fatal.
    fn apply_seeds(&mut self) -> Result<(), WfcError> {
        for index in 0..self.seeds.len() {
            let (node, state) = self.seeds[index];
            let Some(slot) = self.wave.slot_of(node, state) else {
                error!("Seed {state:?} at node {node} was already ruled out by earlier seeds");
                return Err(WfcError::IncompatibleSeeds {
                    node,
                    state,
                    conflict: node,
                });
            };
            self.history.execute(
                Command::Collapse {
                    node,
                    slot,
                    prior_entropy: 0,
                },
                &mut self.wave,
                &self.topology,
                &self.oracle,
            );
            if let Err(PropagationError::Contradiction(conflict)) = self.propagate_from(node) {
                error!("Seed {state:?} at node {node} contradicts at node {conflict}");
                return Err(WfcError::IncompatibleSeeds {
                    node,
                    state,
                    conflict,
                });
            }
        }
        debug!(
            "Applied {} seeds, {} commands recorded",
            self.seeds.len(),
            self.history.len()
        );
        Ok(())
    }

    /// One observation: dequeue, choose, collapse, propagate.
    fn step(&mut self) {
        let node = self.wave.queue_mut().dequeue_min();
        let weights = self.wave.candidate_weights(node);
        let slot = select_candidate(&weights, &mut self.rng);
        debug!(
            "Iteration {}: collapsing node {node} to {:?} out of {} candidates",
            self.stats.iterations,
            self.wave.state_at(node, slot),
            weights.len()
        );

        let position = self.history.execute(
            Command::Collapse {
                node,
                slot,
                prior_entropy: 0,
            },
            &mut self.wave,
            &self.topology,
            &self.oracle,
        );
        self.milestones.push(position);
        self.stats.collapses += 1;

        if let Err(PropagationError::Contradiction(at)) = self.propagate_from(node) {
            debug!("Contradiction at node {at} after collapsing node {node}");
            self.state = SolverState::Backtracking;
        }
        self.notify(StepEvent::Collapsed, node);
    }

    fn propagate_from(&mut self, node: usize) -> Result<(), PropagationError> {
        let Self {
            propagator,
            wave,
            history,
            topology,
            oracle,
            config,
            stats,
            cancel_requested,
            ..
        } = self;
        let total_nodes = topology.node_count();
        let mut on_step = |changed: usize, wave: &Wave| {
            if let Some(callback) = config.step_callback.as_mut() {
                let info = StepInfo {
                    event: StepEvent::Propagated,
                    node: changed,
                    collapsed_nodes: wave.result_count(),
                    total_nodes,
                    iteration: stats.iterations,
                    backtracks: stats.backtracks,
                };
                if callback(&info).is_break() {
                    *cancel_requested = true;
                }
            }
            if config.shutdown_signal.load(Ordering::Relaxed) {
                *cancel_requested = true;
            }
        };
        propagator.propagate(node, wave, history, &*topology, &*oracle, &mut on_step)
    }

    fn notify(&mut self, event: StepEvent, node: usize) {
        let info = StepInfo {
            event,
            node,
            collapsed_nodes: self.wave.result_count(),
            total_nodes: self.topology.node_count(),
            iteration: self.stats.iterations,
            backtracks: self.stats.backtracks,
        };
        if let Some(callback) = self.config.step_callback.as_mut() {
            if callback(&info).is_break() {
                self.cancel_requested = true;
            }
        }
        if self.config.shutdown_signal.load(Ordering::Relaxed) {
            self.cancel_requested = true;
        }
    }

    /// Rewinds to the newest milestone that still has an untried alternative
    /// and excludes the state it tried. Returns `false` when none is left.
    fn backtrack(&mut self) -> Result<bool, WfcError> {
        self.stats.backtracks += 1;
        while let Some(position) = self.milestones.pop() {
            let reverted =
                self.history
                    .rewind_to(position, &mut self.wave, &self.topology, &self.oracle);
            match reverted {
                Some(Command::Collapse { node, slot, .. }) => match self.wave.entropy(node) {
                    0 => {
                        return Err(WfcError::Internal(format!(
                            "node {node} has an empty domain after undoing its collapse"
                        )));
                    }
                    1 => trace!("Node {node} has no alternative left"),
                    _ => {
                        debug!(
                            "Backtrack {}: excluding {:?} from node {node}",
                            self.stats.backtracks,
                            self.wave.state_at(node, slot)
                        );
                        let position = self.history.execute(
                            Command::Remove { node, slot },
                            &mut self.wave,
                            &self.topology,
                            &self.oracle,
                        );
                        self.milestones.push(position);
                        return Ok(true);
                    }
                },
                Some(Command::Remove { .. }) => {}
                None => {
                    return Err(WfcError::Internal(format!(
                        "milestone {position} lies beyond a history of {} commands",
                        self.history.len()
                    )));
                }
            }
        }
        warn!("Backtracking exhausted every alternative");
        Ok(false)
    }

    fn verify_complete(&self) -> Result<(), WfcError> {
        if let Some(node) = self.wave.results().iter().position(Option::is_none) {
            error!("Queue drained but node {node} has no result");
            return Err(WfcError::IncompleteCollapse);
        }
        Ok(())
    }

    /// Live candidate count per node.
    pub fn entropy(&self) -> &[usize] {
        self.wave.entropies()
    }

    /// Chosen state per node. Partial unless the verdict was `Succeeded`.
    pub fn results(&self) -> &[Option<TileId>] {
        self.wave.results()
    }

    /// Collapsed nodes in collapse order, usable for replay.
    pub fn ordered_results(&self) -> &[usize] {
        self.wave.ordered_results()
    }

    pub fn result_count(&self) -> usize {
        self.wave.result_count()
    }

    pub fn queue(&self) -> &IndexedPriorityQueue<usize> {
        self.wave.queue()
    }

    pub fn wave(&self) -> &Wave {
        &self.wave
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn stats(&self) -> SolveStats {
        self.stats
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }
}
