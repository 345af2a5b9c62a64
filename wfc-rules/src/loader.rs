use crate::formats::{ExampleFormatParser, FormatParser, RonFormatParser};
use crate::{AdjacencyRules, LoadError, TileSet};
use std::fs;
use std::path::Path;

/// Picks the parser for a path: `.ron` files hold authored rules, anything
/// else is treated as an example layout to learn from.
pub fn parser_for_path(path: &Path) -> Box<dyn FormatParser> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("ron") => Box::new(RonFormatParser::new()),
        _ => Box::new(ExampleFormatParser::new()),
    }
}

/// Loads the tile set and adjacency rules from a specified file.
///
/// # Arguments
///
/// * `path` - The path to the rule definition file (RON) or example layout (text).
///
/// # Returns
///
/// A `Result` containing the loaded `TileSet` and `AdjacencyRules` on success,
/// or a `LoadError` on failure.
pub fn load_from_file(path: &Path) -> Result<(TileSet, AdjacencyRules), LoadError> {
    let content = fs::read_to_string(path)?;
    let parser = parser_for_path(path);
    log::info!(
        "Loading rules from {:?} as {}",
        path,
        parser.format_name()
    );
    parser.parse(&content)
}
