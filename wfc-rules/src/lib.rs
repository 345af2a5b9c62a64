//! Tile catalogues, adjacency rules and the compatibility oracle consumed by
//! the solver, plus loaders for the supported rule file formats.

use thiserror::Error;

pub mod formats;
pub mod loader;
pub mod oracle;
pub mod types;

pub use oracle::CompatibilityOracle;
pub use types::{AdjacencyRules, TileId, TileSet, TileSetError};

/// Axis names in index order: `+x, -x, +y, -y, +z, -z`.
pub const AXIS_NAMES: [&str; 6] = ["+x", "-x", "+y", "-y", "+z", "-z"];

/// Returns the axis pointing the other way (`+x` <-> `-x`, ...).
#[inline]
pub const fn opposite_axis(axis: usize) -> usize {
    axis ^ 1
}

/// Maps an axis name such as `"+x"` to its index.
pub fn axis_index(name: &str) -> Option<usize> {
    AXIS_NAMES.iter().position(|candidate| *candidate == name)
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error reading file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse rules format: {0}")]
    ParseError(String),
    #[error("Invalid rule data: {0}")]
    InvalidData(String),
}

impl From<TileSetError> for LoadError {
    fn from(error: TileSetError) -> Self {
        Self::InvalidData(format!("TileSet Error: {error}"))
    }
}
