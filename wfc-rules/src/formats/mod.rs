//! Module defining parsers for different rule file formats.

// Export the core parser trait
pub mod parser;
pub use parser::FormatParser;

// Format-specific implementations
pub mod example_format;
pub mod ron_format;

pub use example_format::ExampleFormatParser;
pub use ron_format::RonFormatParser;
