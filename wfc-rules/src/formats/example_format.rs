//! Learns adjacency rules from an example layout drawn as text.
//!
//! Every non-space character is a tile. Rows are lines (`+y` points to the
//! next line), and blank lines separate z-layers. Each observed neighbour
//! pair counts once per axis; the count is the pair's weight and any
//! observed pair is compatible. Because both cells of a pair are visited,
//! the learned rules are always symmetric.

use crate::formats::FormatParser;
use crate::types::{AdjacencyRules, TileId, TileSet};
use crate::LoadError;

#[derive(Debug, Default, Clone, Copy)]
pub struct ExampleFormatParser;

impl ExampleFormatParser {
    pub fn new() -> Self {
        Self
    }
}

/// Splits text into z-layers of rows of optional glyphs.
fn read_layers(content: &str) -> Vec<Vec<Vec<Option<char>>>> {
    let mut layers = Vec::new();
    let mut current: Vec<Vec<Option<char>>> = Vec::new();
    for line in content.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if !current.is_empty() {
                layers.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(
            line.chars()
                .map(|c| if c == ' ' { None } else { Some(c) })
                .collect(),
        );
    }
    if !current.is_empty() {
        layers.push(current);
    }
    layers
}

impl FormatParser for ExampleFormatParser {
    fn format_name(&self) -> &'static str {
        "example layout (text)"
    }

    fn parse(&self, content: &str) -> Result<(TileSet, AdjacencyRules), LoadError> {
        let layers = read_layers(content);

        // Tiles are numbered in order of first appearance.
        let mut glyphs: Vec<char> = Vec::new();
        let mut cells: Vec<Vec<Vec<Option<TileId>>>> = Vec::with_capacity(layers.len());
        for rows in &layers {
            let mut layer = Vec::with_capacity(rows.len());
            for row in rows {
                let mut ids = Vec::with_capacity(row.len());
                for cell in row {
                    ids.push(cell.map(|glyph| match glyphs.iter().position(|&g| g == glyph) {
                        Some(index) => TileId(index),
                        None => {
                            glyphs.push(glyph);
                            TileId(glyphs.len() - 1)
                        }
                    }));
                }
                layer.push(ids);
            }
            cells.push(layer);
        }

        if glyphs.is_empty() {
            return Err(LoadError::InvalidData(
                "Example layout contains no tiles".to_owned(),
            ));
        }

        let num_axes = if cells.len() > 1 { 6 } else { 4 };
        let at = |x: isize, y: isize, z: isize| -> Option<TileId> {
            if x < 0 || y < 0 || z < 0 {
                return None;
            }
            cells
                .get(z as usize)?
                .get(y as usize)?
                .get(x as usize)
                .copied()
                .flatten()
        };
        const OFFSETS: [(isize, isize, isize); 6] = [
            (1, 0, 0),
            (-1, 0, 0),
            (0, 1, 0),
            (0, -1, 0),
            (0, 0, 1),
            (0, 0, -1),
        ];

        let mut tuples = Vec::new();
        for (z, rows) in cells.iter().enumerate() {
            for (y, row) in rows.iter().enumerate() {
                for (x, cell) in row.iter().enumerate() {
                    let Some(tile) = *cell else { continue };
                    for (axis, &(dx, dy, dz)) in OFFSETS.iter().enumerate().take(num_axes) {
                        if let Some(neighbor) =
                            at(x as isize + dx, y as isize + dy, z as isize + dz)
                        {
                            tuples.push((axis, tile, neighbor, 1));
                        }
                    }
                }
            }
        }

        let names = glyphs.iter().map(char::to_string).collect();
        let tileset = TileSet::new(names, glyphs)?;
        log::debug!(
            "Learned {} adjacency observations over {} tiles and {} axes",
            tuples.len(),
            tileset.num_tiles(),
            num_axes
        );
        let rules = AdjacencyRules::from_weighted_tuples(tileset.num_tiles(), num_axes, tuples);
        Ok((tileset, rules))
    }
}
