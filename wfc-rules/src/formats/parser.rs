use crate::{AdjacencyRules, LoadError, TileSet};

/// Trait defining the interface for format-specific rule parsers.
///
/// Implementors turn file content into a `TileSet` and the `AdjacencyRules`
/// the solver queries, whether the content is hand-authored rules or an
/// example layout the rules are learned from.
pub trait FormatParser {
    /// Parses rule content into a TileSet and corresponding AdjacencyRules.
    ///
    /// # Arguments
    ///
    /// * `content` - A string slice containing the rule content
    ///
    /// # Returns
    ///
    /// * `Ok((TileSet, AdjacencyRules))` - Successfully parsed rules
    /// * `Err(LoadError)` - Error encountered during parsing
    fn parse(&self, content: &str) -> Result<(TileSet, AdjacencyRules), LoadError>;

    /// Returns a descriptive name for this parser format.
    ///
    /// Used in log and error messages.
    fn format_name(&self) -> &'static str;
}
