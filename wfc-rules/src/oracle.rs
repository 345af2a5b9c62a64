use crate::types::TileId;

/// Answers the two questions the solver asks about a pair of states.
///
/// Directions are plain indices and must agree with the order in which the
/// solver's adjacency lists were built: `direction` always points from the
/// cell holding `a` towards the neighbour holding `b`.
pub trait CompatibilityOracle {
    /// Number of distinct states (tiles).
    fn num_states(&self) -> usize;

    /// Number of directions the rules are defined for.
    fn num_directions(&self) -> usize;

    /// Whether a cell in state `a` may have a neighbour in state `b` along `direction`.
    fn is_compatible(&self, a: TileId, b: TileId, direction: usize) -> bool;

    /// How much `a` adds to its neighbour's accumulator for candidate `b` along `direction`.
    fn weight(&self, a: TileId, b: TileId, direction: usize) -> u32;
}

impl<T: CompatibilityOracle + ?Sized> CompatibilityOracle for &T {
    fn num_states(&self) -> usize {
        (**self).num_states()
    }

    fn num_directions(&self) -> usize {
        (**self).num_directions()
    }

    fn is_compatible(&self, a: TileId, b: TileId, direction: usize) -> bool {
        (**self).is_compatible(a, b, direction)
    }

    fn weight(&self, a: TileId, b: TileId, direction: usize) -> u32 {
        (**self).weight(a, b, direction)
    }
}

impl<T: CompatibilityOracle + ?Sized> CompatibilityOracle for std::sync::Arc<T> {
    fn num_states(&self) -> usize {
        (**self).num_states()
    }

    fn num_directions(&self) -> usize {
        (**self).num_directions()
    }

    fn is_compatible(&self, a: TileId, b: TileId, direction: usize) -> bool {
        (**self).is_compatible(a, b, direction)
    }

    fn weight(&self, a: TileId, b: TileId, direction: usize) -> u32 {
        (**self).weight(a, b, direction)
    }
}
