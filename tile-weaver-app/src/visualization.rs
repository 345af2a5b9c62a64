use colored::{Color, Colorize};
use std::io::{self, Write};
use wfc_core::grid::Grid;
use wfc_core::TileId;
use wfc_rules::TileSet;

/// Trait for types that can present a solved or partial grid to the user.
pub trait Visualizer {
    /// Displays the current state of `grid`.
    ///
    /// Cells without a result are shown as `?`.
    fn display_state(&mut self, grid: &Grid<Option<TileId>>, tileset: &TileSet)
        -> anyhow::Result<()>;
}

const PALETTE: [Color; 6] = [
    Color::Blue,
    Color::Green,
    Color::Yellow,
    Color::Red,
    Color::Magenta,
    Color::Cyan,
];

const UNKNOWN_GLYPH: char = '?';

/// Renders the grid as glyph text on stdout, optionally tinted per tile.
#[derive(Debug, Clone, Default)]
pub struct TerminalVisualizer {
    colored: bool,
    layer: Option<usize>,
}

impl TerminalVisualizer {
    pub fn new(colored: bool) -> Self {
        Self {
            colored,
            layer: None,
        }
    }

    /// Restricts output to a single z-layer. `None` shows all layers.
    pub fn set_layer(&mut self, layer: Option<usize>) {
        self.layer = layer;
    }

    pub fn layer(&self) -> Option<usize> {
        self.layer
    }

    fn paint(&self, cell: Option<TileId>, tileset: &TileSet) -> String {
        let Some(tile) = cell else {
            return UNKNOWN_GLYPH.to_string();
        };
        let glyph = tileset.glyph(tile).unwrap_or(UNKNOWN_GLYPH).to_string();
        if self.colored {
            glyph.color(PALETTE[tile.0 % PALETTE.len()]).to_string()
        } else {
            glyph
        }
    }

    /// Builds the text `display_state` prints.
    pub fn render(&self, grid: &Grid<Option<TileId>>, tileset: &TileSet) -> String {
        let layers: Vec<usize> = match self.layer {
            Some(z) if z < grid.depth => vec![z],
            Some(_) => Vec::new(),
            None => (0..grid.depth).collect(),
        };

        let mut out = String::new();
        for z in layers {
            out.push_str(&format!("--- Layer {} ---\n", z));
            for y in 0..grid.height {
                for x in 0..grid.width {
                    let cell = grid.get(x, y, z).copied().flatten();
                    out.push_str(&self.paint(cell, tileset));
                }
                out.push('\n');
            }
        }
        out
    }
}

impl Visualizer for TerminalVisualizer {
    fn display_state(
        &mut self,
        grid: &Grid<Option<TileId>>,
        tileset: &TileSet,
    ) -> anyhow::Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(
            handle,
            "Grid: {}x{}x{}",
            grid.width, grid.height, grid.depth
        )?;
        handle.write_all(self.render(grid, tileset).as_bytes())?;
        handle.flush()?;
        Ok(())
    }
}
