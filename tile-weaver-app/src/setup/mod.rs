//! Setup module for the Tile Weaver application.
//!
//! Wires the loaded rules, the solver worker and the output writers together.

pub mod execution;
