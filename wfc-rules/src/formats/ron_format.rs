use crate::formats::FormatParser;
use crate::types::{AdjacencyRules, TileId, TileSet};
use crate::{axis_index, LoadError};
use ron::extensions::Extensions;
use serde::Deserialize;
use std::collections::HashMap;

/// A parser implementation for RON (Rusty Object Notation) format rules.
///
/// ```ron
/// (
///     axes: 4,
///     mirror: true,
///     tiles: [
///         (name: "grass", glyph: '.'),
///         (name: "water", glyph: '~'),
///     ],
///     adjacency: [
///         (from: "grass", to: "water", axis: "+x", weight: 2),
///         (from: "grass", to: "grass", axis: "+x"),
///     ],
/// )
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct RonFormatParser;

impl RonFormatParser {
    /// Creates a new RON format parser
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RonTileData {
    /// The unique identifier name for the tile used in rule definitions.
    name: String,
    /// Display glyph; defaults to the first character of `name`.
    #[serde(default)]
    glyph: Option<char>,
}

#[derive(Debug, Clone, Deserialize)]
struct RonAdjacency {
    from: String,
    to: String,
    axis: String,
    #[serde(default = "default_weight")]
    weight: u32,
}

/// Top-level structure of a RON rule file.
#[derive(Debug, Clone, Deserialize)]
struct RonRuleFile {
    #[serde(default = "default_axes")]
    axes: usize,
    /// Also allow every rule seen from the neighbour's side.
    #[serde(default)]
    mirror: bool,
    tiles: Vec<RonTileData>,
    adjacency: Vec<RonAdjacency>,
}

const fn default_weight() -> u32 {
    1
}

const fn default_axes() -> usize {
    6
}

impl FormatParser for RonFormatParser {
    fn format_name(&self) -> &'static str {
        "Rusty Object Notation (RON)"
    }

    fn parse(&self, ron_content: &str) -> Result<(TileSet, AdjacencyRules), LoadError> {
        let rule_file: RonRuleFile = ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(ron_content)
            .map_err(|e| LoadError::ParseError(format!("RON deserialization failed: {e}")))?;

        if rule_file.axes != 4 && rule_file.axes != 6 {
            return Err(LoadError::InvalidData(format!(
                "Unsupported axis count {} (expected 4 or 6)",
                rule_file.axes
            )));
        }

        let mut names = Vec::with_capacity(rule_file.tiles.len());
        let mut glyphs = Vec::with_capacity(rule_file.tiles.len());
        for tile in &rule_file.tiles {
            let glyph = match tile.glyph.or_else(|| tile.name.chars().next()) {
                Some(glyph) => glyph,
                None => return Err(LoadError::InvalidData("Tile names cannot be empty".into())),
            };
            names.push(tile.name.clone());
            glyphs.push(glyph);
        }
        let tileset = TileSet::new(names, glyphs)?;
        let tile_ids: HashMap<&str, TileId> = rule_file
            .tiles
            .iter()
            .enumerate()
            .map(|(index, tile)| (tile.name.as_str(), TileId(index)))
            .collect();

        let mut tuples = Vec::with_capacity(rule_file.adjacency.len());
        for rule in &rule_file.adjacency {
            let from = *tile_ids
                .get(rule.from.as_str())
                .ok_or_else(|| LoadError::InvalidData(format!("Unknown tile: {}", rule.from)))?;
            let to = *tile_ids
                .get(rule.to.as_str())
                .ok_or_else(|| LoadError::InvalidData(format!("Unknown tile: {}", rule.to)))?;
            let axis = axis_index(&rule.axis)
                .filter(|&axis| axis < rule_file.axes)
                .ok_or_else(|| {
                    LoadError::InvalidData(format!(
                        "Invalid axis name '{}' for a {}-axis rule file",
                        rule.axis, rule_file.axes
                    ))
                })?;
            tuples.push((axis, from, to, rule.weight));
        }

        let mut rules =
            AdjacencyRules::from_weighted_tuples(tileset.num_tiles(), rule_file.axes, tuples);
        if rule_file.mirror {
            rules = rules.mirrored();
        }
        log::debug!(
            "Parsed RON rules: {} tiles, {} axes, {} adjacency entries (mirror: {})",
            tileset.num_tiles(),
            rule_file.axes,
            rule_file.adjacency.len(),
            rule_file.mirror
        );

        Ok((tileset, rules))
    }
}

/// Parses WFC rules defined in a RON string.
pub fn parse_ron_rules(ron_content: &str) -> Result<(TileSet, AdjacencyRules), LoadError> {
    RonFormatParser::new().parse(ron_content)
}
