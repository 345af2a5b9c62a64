//! Core library for the Wave Function Collapse solver.
//! Holds the search state, the undo log, propagation and the solver loop.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Weighted choice among remaining candidates.
pub mod entropy;
/// Generic 3D grid used to lay results out for output.
pub mod grid;
/// Reversible commands and the undo stack.
pub mod history;
/// Constraint propagation.
pub mod propagator;
/// Indexed min-heap keyed by node.
pub mod queue;
/// The solver state machine.
pub mod runner;
/// Neighbour graphs and grid builders.
pub mod topology;
/// Per-node domains, weights and results.
pub mod wave;

pub use crate::grid::Grid;
pub use crate::history::{Command, CommandLog};
pub use crate::propagator::PropagationError;
pub use crate::queue::IndexedPriorityQueue;
pub use crate::runner::{
    SolveStats, Solver, SolverConfig, SolverConfigBuilder, SolverState, StepCallback, StepEvent,
    StepInfo, Verdict,
};
pub use crate::topology::Topology;
pub use crate::wave::Wave;
pub use wfc_rules::{CompatibilityOracle, TileId};

/// Errors that can occur while setting up or running the solver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WfcError {
    /// Two seeds (or a seed and the rules) cannot hold at the same time.
    #[error("Seed {state:?} at node {node} is incompatible with earlier seeds (conflict at node {conflict})")]
    IncompatibleSeeds {
        node: usize,
        state: TileId,
        conflict: usize,
    },
    /// A seed names a node or state that does not exist, or repeats a node.
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),
    /// The neighbour graph is malformed.
    #[error("Topology error: {0}")]
    Topology(String),
    /// The oracle and topology disagree, or the oracle is unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// An internal invariant was broken.
    #[error("Internal error: {0}")]
    Internal(String),
    /// The loop ended but some node has no result.
    #[error("WFC finished prematurely due to incomplete collapse")]
    IncompleteCollapse,
    /// WFC exceeded the configured maximum number of iterations.
    #[error("Maximum iterations ({0}) reached")]
    MaxIterationsReached(u64),
    /// `run` was called on a solver that already ran.
    #[error("Solver has already been started")]
    AlreadyStarted,
}

/// Defines different boundary handling strategies for the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum BoundaryCondition {
    /// Edges wrap around (toroidal topology).
    Periodic,
    /// Grid boundaries act as hard walls; neighbors outside the grid are ignored.
    #[default]
    Finite,
}
