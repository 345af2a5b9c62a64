use crate::oracle::CompatibilityOracle;
use crate::opposite_axis;
use std::collections::HashSet;
use thiserror::Error;

/// Represents a unique identifier for a tile.
///
/// Used as an index into tile-related data structures and as the state
/// value the solver assigns to each cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub usize);

/// Errors that can occur during TileSet creation or validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TileSetError {
    /// The tile list was empty.
    #[error("TileSet cannot be empty.")]
    Empty,
    /// Names and glyphs must describe the same tiles.
    #[error("TileSet has {names} names but {glyphs} glyphs.")]
    LengthMismatch { names: usize, glyphs: usize },
    /// Two tiles share a name.
    #[error("Duplicate tile name: {0}")]
    DuplicateName(String),
}

/// The catalogue of tiles a rule set talks about.
///
/// Each tile has a name (used in rule files) and a single display glyph
/// (used by the text output and the example-content format).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSet {
    names: Vec<String>,
    glyphs: Vec<char>,
}

impl TileSet {
    /// Creates a new `TileSet`.
    ///
    /// # Errors
    ///
    /// Returns `TileSetError::Empty` if `names` is empty,
    /// `TileSetError::LengthMismatch` if the glyph list has a different length and
    /// `TileSetError::DuplicateName` if a name appears twice.
    pub fn new(names: Vec<String>, glyphs: Vec<char>) -> Result<Self, TileSetError> {
        if names.is_empty() {
            return Err(TileSetError::Empty);
        }
        if names.len() != glyphs.len() {
            return Err(TileSetError::LengthMismatch {
                names: names.len(),
                glyphs: glyphs.len(),
            });
        }
        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(TileSetError::DuplicateName(name.clone()));
            }
        }
        Ok(Self { names, glyphs })
    }

    pub fn num_tiles(&self) -> usize {
        self.names.len()
    }

    pub fn name(&self, tile: TileId) -> Option<&str> {
        self.names.get(tile.0).map(String::as_str)
    }

    pub fn glyph(&self, tile: TileId) -> Option<char> {
        self.glyphs.get(tile.0).copied()
    }

    /// Looks a tile up by name.
    pub fn find(&self, name: &str) -> Option<TileId> {
        self.names.iter().position(|n| n == name).map(TileId)
    }

    /// Looks a tile up by glyph. The first tile using the glyph wins.
    pub fn find_glyph(&self, glyph: char) -> Option<TileId> {
        self.glyphs.iter().position(|&g| g == glyph).map(TileId)
    }
}

/// Represents adjacency rules between tiles for different axes.
///
/// Stores the rules in flattened vectors for fast lookup.
/// The indexing scheme is `axis * num_tiles * num_tiles + tile1 * num_tiles + tile2`,
/// meaning "`tile2` may sit next to `tile1` on `tile1`'s `axis` side".
/// Alongside each allowed pair sits an integer weight, which the solver adds
/// to the neighbour's accumulator when `tile1` is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyRules {
    num_tiles: usize,
    num_axes: usize,
    allowed: Vec<bool>,
    weights: Vec<u32>,
}

impl AdjacencyRules {
    /// Creates new `AdjacencyRules` from a pre-flattened boolean table.
    ///
    /// Every allowed pair receives weight 1.
    ///
    /// # Panics
    ///
    /// Panics if the length of `allowed` is not equal to `num_axes * num_tiles * num_tiles`.
    pub fn new(num_tiles: usize, num_axes: usize, allowed: Vec<bool>) -> Self {
        assert_eq!(
            allowed.len(),
            num_axes * num_tiles * num_tiles,
            "Provided 'allowed' vector has incorrect size."
        );
        let weights = allowed.iter().map(|&ok| u32::from(ok)).collect();
        Self {
            num_tiles,
            num_axes,
            allowed,
            weights,
        }
    }

    /// Builds rules from `(axis, tile1, tile2, weight)` tuples.
    ///
    /// Repeated tuples accumulate their weights. A tuple with weight 0 still
    /// marks the pair as compatible.
    ///
    /// # Panics
    ///
    /// Panics if a tuple references a tile or axis outside the declared range.
    pub fn from_weighted_tuples<I>(num_tiles: usize, num_axes: usize, tuples: I) -> Self
    where
        I: IntoIterator<Item = (usize, TileId, TileId, u32)>,
    {
        let size = num_axes * num_tiles * num_tiles;
        let mut rules = Self {
            num_tiles,
            num_axes,
            allowed: vec![false; size],
            weights: vec![0; size],
        };
        for (axis, tile1, tile2, weight) in tuples {
            assert!(
                axis < num_axes && tile1.0 < num_tiles && tile2.0 < num_tiles,
                "rule ({axis}, {}, {}) is outside {num_tiles} tiles x {num_axes} axes",
                tile1.0,
                tile2.0
            );
            let index = rules.flat_index(tile1, tile2, axis);
            rules.allowed[index] = true;
            rules.weights[index] = rules.weights[index].saturating_add(weight);
        }
        rules
    }

    /// Rules where every tile may sit next to every tile on every axis, all with weight 1.
    pub fn uniform(num_tiles: usize, num_axes: usize) -> Self {
        Self::new(num_tiles, num_axes, vec![true; num_axes * num_tiles * num_tiles])
    }

    /// Gets the number of different tile types these rules apply to.
    pub fn num_tiles(&self) -> usize {
        self.num_tiles
    }

    /// Gets the number of axes these rules are defined for (4 for 2D, 6 for 3D).
    pub fn num_axes(&self) -> usize {
        self.num_axes
    }

    #[inline]
    fn flat_index(&self, tile1: TileId, tile2: TileId, axis: usize) -> usize {
        axis * self.num_tiles * self.num_tiles + tile1.0 * self.num_tiles + tile2.0
    }

    #[inline]
    fn in_range(&self, tile1: TileId, tile2: TileId, axis: usize) -> bool {
        tile1.0 < self.num_tiles && tile2.0 < self.num_tiles && axis < self.num_axes
    }

    /// Checks if `tile2` is allowed to be placed adjacent to `tile1` along `axis`.
    ///
    /// Out-of-range arguments are treated as disallowed.
    #[inline]
    pub fn check(&self, tile1: TileId, tile2: TileId, axis: usize) -> bool {
        self.in_range(tile1, tile2, axis) && self.allowed[self.flat_index(tile1, tile2, axis)]
    }

    /// Weight `tile1` contributes towards `tile2` on its `axis` side. Zero when out of range.
    #[inline]
    pub fn weight(&self, tile1: TileId, tile2: TileId, axis: usize) -> u32 {
        if self.in_range(tile1, tile2, axis) {
            self.weights[self.flat_index(tile1, tile2, axis)]
        } else {
            0
        }
    }

    /// Returns a copy where every allowed `(a, b, axis)` also allows `(b, a, opposite(axis))`.
    ///
    /// A missing reverse pair inherits the forward weight; existing pairs keep their own.
    pub fn mirrored(&self) -> Self {
        let mut tuples = Vec::new();
        for axis in 0..self.num_axes {
            for a in 0..self.num_tiles {
                for b in 0..self.num_tiles {
                    let (a, b) = (TileId(a), TileId(b));
                    if self.check(a, b, axis) {
                        let weight = self.weight(a, b, axis);
                        tuples.push((axis, a, b, weight));
                        let opposite = opposite_axis(axis);
                        if opposite < self.num_axes && !self.check(b, a, opposite) {
                            tuples.push((opposite, b, a, weight));
                        }
                    }
                }
            }
        }
        Self::from_weighted_tuples(self.num_tiles, self.num_axes, tuples)
    }

    /// Keeps only the first `num_axes` axes, e.g. the planar part of 3D rules.
    ///
    /// Returns `None` when asked for more axes than the rules define or an
    /// odd count, which would split an axis from its opposite.
    pub fn restricted_to_axes(&self, num_axes: usize) -> Option<Self> {
        if num_axes > self.num_axes || num_axes % 2 != 0 {
            return None;
        }
        let size = num_axes * self.num_tiles * self.num_tiles;
        Some(Self {
            num_tiles: self.num_tiles,
            num_axes,
            allowed: self.allowed[..size].to_vec(),
            weights: self.weights[..size].to_vec(),
        })
    }

    /// True when every allowed pair is also allowed seen from the other side.
    pub fn is_symmetric(&self) -> bool {
        (0..self.num_axes).all(|axis| {
            (0..self.num_tiles).all(|a| {
                (0..self.num_tiles).all(|b| {
                    self.check(TileId(a), TileId(b), axis)
                        == self.check(TileId(b), TileId(a), opposite_axis(axis))
                })
            })
        })
    }
}

impl CompatibilityOracle for AdjacencyRules {
    fn num_states(&self) -> usize {
        self.num_tiles
    }

    fn num_directions(&self) -> usize {
        self.num_axes
    }

    fn is_compatible(&self, a: TileId, b: TileId, direction: usize) -> bool {
        self.check(a, b, direction)
    }

    fn weight(&self, a: TileId, b: TileId, direction: usize) -> u32 {
        Self::weight(self, a, b, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tileset_validation() {
        assert_eq!(TileSet::new(vec![], vec![]), Err(TileSetError::Empty));
        assert_eq!(
            TileSet::new(vec!["a".into()], vec!['a', 'b']),
            Err(TileSetError::LengthMismatch { names: 1, glyphs: 2 })
        );
        assert_eq!(
            TileSet::new(vec!["a".into(), "a".into()], vec!['a', 'b']),
            Err(TileSetError::DuplicateName("a".into()))
        );

        let tileset = TileSet::new(vec!["grass".into(), "water".into()], vec!['.', '~']).unwrap();
        assert_eq!(tileset.num_tiles(), 2);
        assert_eq!(tileset.find("water"), Some(TileId(1)));
        assert_eq!(tileset.find_glyph('.'), Some(TileId(0)));
        assert_eq!(tileset.glyph(TileId(1)), Some('~'));
        assert_eq!(tileset.name(TileId(2)), None);
    }

    #[test]
    fn test_weighted_tuples_accumulate() {
        let rules = AdjacencyRules::from_weighted_tuples(
            2,
            4,
            vec![
                (0, TileId(0), TileId(1), 3),
                (0, TileId(0), TileId(1), 2),
                (2, TileId(1), TileId(1), 0),
            ],
        );
        assert!(rules.check(TileId(0), TileId(1), 0));
        assert_eq!(rules.weight(TileId(0), TileId(1), 0), 5);
        assert!(rules.check(TileId(1), TileId(1), 2));
        assert_eq!(rules.weight(TileId(1), TileId(1), 2), 0);
        assert!(!rules.check(TileId(1), TileId(0), 0));
        // Out of range is simply disallowed.
        assert!(!rules.check(TileId(5), TileId(0), 0));
        assert!(!rules.check(TileId(0), TileId(1), 9));
        assert_eq!(rules.weight(TileId(0), TileId(1), 9), 0);
    }

    #[test]
    fn test_mirrored_rules_are_symmetric() {
        let rules =
            AdjacencyRules::from_weighted_tuples(2, 4, vec![(0, TileId(0), TileId(1), 4)]);
        assert!(!rules.is_symmetric());

        let mirrored = rules.mirrored();
        assert!(mirrored.is_symmetric());
        assert!(mirrored.check(TileId(1), TileId(0), 1));
        assert_eq!(mirrored.weight(TileId(1), TileId(0), 1), 4);
        assert_eq!(mirrored.weight(TileId(0), TileId(1), 0), 4);
    }

    #[test]
    fn test_uniform_rules_as_oracle() {
        let rules = AdjacencyRules::uniform(3, 6);
        let oracle: &dyn CompatibilityOracle = &rules;
        assert_eq!(oracle.num_states(), 3);
        assert_eq!(oracle.num_directions(), 6);
        assert!(oracle.is_compatible(TileId(2), TileId(0), 5));
        assert_eq!(oracle.weight(TileId(2), TileId(0), 5), 1);
        assert!(rules.is_symmetric());
    }

    #[test]
    fn test_restricted_to_planar_axes() {
        let rules = AdjacencyRules::from_weighted_tuples(
            2,
            6,
            vec![(0, TileId(0), TileId(1), 2), (4, TileId(1), TileId(1), 1)],
        );
        let planar = rules.restricted_to_axes(4).unwrap();
        assert_eq!(planar.num_axes(), 4);
        assert_eq!(planar.weight(TileId(0), TileId(1), 0), 2);
        assert!(!planar.check(TileId(1), TileId(1), 4));
        assert!(rules.restricted_to_axes(3).is_none());
        assert!(planar.restricted_to_axes(6).is_none());
    }

    #[test]
    #[should_panic(expected = "incorrect size")]
    fn test_new_rejects_wrong_size() {
        let _ = AdjacencyRules::new(2, 4, vec![true; 3]);
    }
}
