use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use wfc_core::grid::Grid;
use wfc_core::TileId;
use wfc_rules::TileSet;

/// Renders a fully collapsed grid as tile glyphs.
///
/// One line per row (y), a blank line between layers (z). The text can be fed
/// back to the example-layout loader.
pub fn render_glyphs(grid: &Grid<Option<TileId>>, tileset: &TileSet) -> Result<String> {
    let mut text = String::with_capacity(grid.len() + grid.height * grid.depth * 2);
    for z in 0..grid.depth {
        if z > 0 {
            text.push('\n');
        }
        for y in 0..grid.height {
            for x in 0..grid.width {
                let Some(&cell) = grid.get(x, y, z) else {
                    bail!("Internal error: Failed to access grid cell ({x},{y},{z})");
                };
                let Some(tile) = cell else {
                    bail!("Grid cell ({x},{y},{z}) is not collapsed, cannot render.");
                };
                let glyph = tileset
                    .glyph(tile)
                    .with_context(|| format!("Tile {} has no glyph", tile.0))?;
                text.push(glyph);
            }
            text.push('\n');
        }
    }
    Ok(text)
}

/// Saves the final collapsed grid to a file as glyph text.
pub fn save_grid_to_file(
    grid: &Grid<Option<TileId>>,
    tileset: &TileSet,
    output_path: &Path,
) -> Result<()> {
    log::info!("Attempting to save grid to {:?}...", output_path);
    let text = render_glyphs(grid, tileset)?;

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create output file: {:?}", output_path))?;
    let mut writer = io::BufWriter::new(file);
    writer
        .write_all(text.as_bytes())
        .context("Failed to write output grid")?;
    writer
        .flush()
        .context("Failed to flush writer for output file")?;
    log::info!("Successfully saved grid to {:?}", output_path);
    Ok(())
}

/// One collapse in a replay log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayStep {
    pub node: usize,
    pub x: usize,
    pub y: usize,
    pub z: usize,
    pub tile: usize,
    pub name: String,
}

/// Collapse order of a finished run, for step-by-step replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayLog {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub steps: Vec<ReplayStep>,
}

impl ReplayLog {
    /// Pairs each node of `order` with its coordinates and chosen tile.
    pub fn new(grid: &Grid<Option<TileId>>, tileset: &TileSet, order: &[usize]) -> Result<Self> {
        let steps = order
            .iter()
            .map(|&node| -> Result<ReplayStep> {
                let (x, y, z) = grid
                    .coords(node)
                    .with_context(|| format!("Node {node} is outside the grid"))?;
                let tile = grid
                    .as_slice()
                    .get(node)
                    .copied()
                    .flatten()
                    .with_context(|| format!("Node {node} has no result"))?;
                Ok(ReplayStep {
                    node,
                    x,
                    y,
                    z,
                    tile: tile.0,
                    name: tileset.name(tile).unwrap_or_default().to_owned(),
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            width: grid.width,
            height: grid.height,
            depth: grid.depth,
            steps,
        })
    }
}

/// Writes `log` as pretty-printed JSON.
pub fn save_replay(log: &ReplayLog, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create replay file: {:?}", path))?;
    let mut writer = io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, log).context("Failed to serialize replay log")?;
    writer.flush().context("Failed to flush replay file")?;
    log::info!("Saved replay of {} steps to {:?}", log.steps.len(), path);
    Ok(())
}
