use crate::error::AppError;
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use wfc_core::BoundaryCondition;

/// Prefix for environment variables read into the configuration.
pub const ENV_PREFIX: &str = "TILE_WEAVER_";

/// Represents the different visualization modes available.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    #[default]
    None,
    /// Plain glyphs on stdout.
    Terminal,
    /// Glyphs tinted per tile.
    Colored,
}

/// Log level for progress reports.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
}

/// Global log level for the application.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobalLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// A seed given on the command line as `x,y,z=tile`.
///
/// `tile` is matched against tile names first, then against glyphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub x: usize,
    pub y: usize,
    pub z: usize,
    pub tile: String,
}

impl FromStr for Pin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (coords, tile) = s
            .split_once('=')
            .ok_or_else(|| format!("pin '{s}' must look like x,y,z=tile"))?;
        let parts: Vec<&str> = coords.split(',').map(str::trim).collect();
        if parts.len() != 3 || tile.is_empty() {
            return Err(format!("pin '{s}' must look like x,y,z=tile"));
        }
        let parse = |part: &str| {
            part.parse::<usize>()
                .map_err(|_| format!("invalid coordinate '{part}' in pin '{s}'"))
        };
        Ok(Self {
            x: parse(parts[0])?,
            y: parse(parts[1])?,
            z: parse(parts[2])?,
            tile: tile.to_owned(),
        })
    }
}

/// Configuration for the Tile Weaver application.
///
/// Values come from, lowest priority first: built-in defaults, the TOML
/// file named by `--config`, `TILE_WEAVER_*` environment variables, and
/// flags given explicitly on the command line.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct AppConfig {
    /// Rule file: RON rules (`.ron`) or an example layout to learn from.
    #[arg(short, long, value_name = "FILE")]
    pub rule_file: Option<PathBuf>,

    /// Optional TOML file with default settings.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Width of the output grid.
    #[arg(long, default_value_t = 10)]
    pub width: usize,

    /// Height of the output grid.
    #[arg(long, default_value_t = 10)]
    pub height: usize,

    /// Depth of the output grid. A depth of 1 solves a planar grid.
    #[arg(long, default_value_t = 1)]
    pub depth: usize,

    /// How neighbours are found at the grid edge.
    #[arg(long, value_enum, default_value_t = BoundaryCondition::Finite)]
    pub boundary: BoundaryCondition,

    /// Optional seed for the random number generator.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Pre-collapse a cell before solving, e.g. `--pin 0,0,0=water`. Repeatable.
    #[arg(long = "pin", value_name = "X,Y,Z=TILE")]
    pub pins: Vec<Pin>,

    /// Abort after this many solver iterations.
    #[arg(long)]
    pub max_iterations: Option<u64>,

    /// Cancel the search after this long (e.g. "30s").
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Report progress updates every specified interval (e.g., "1s", "500ms").
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub report_progress_interval: Option<Duration>,

    /// Path to save the generated output grid. Empty to skip.
    #[arg(short, long, value_name = "FILE", default_value = "output.txt")]
    pub output_path: PathBuf,

    /// Optional path for a JSON log of the collapse order.
    #[arg(long, value_name = "FILE")]
    pub replay_path: Option<PathBuf>,

    /// Choose the visualization mode.
    #[arg(long, value_enum, default_value_t = VisualizationMode::None)]
    pub visualization_mode: VisualizationMode,

    /// Log level for progress reports.
    #[arg(long, value_enum, default_value_t = ProgressLogLevel::Info)]
    pub progress_log_level: ProgressLogLevel,

    /// Global log level when RUST_LOG is not set.
    #[arg(long, value_enum, default_value_t = GlobalLogLevel::Info)]
    pub global_log_level: GlobalLogLevel,
}

/// Settings readable from the TOML file and the environment.
///
/// Durations are humantime strings and pins use the command-line syntax.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub rule_file: Option<PathBuf>,
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub depth: Option<usize>,
    pub boundary: Option<BoundaryCondition>,
    pub seed: Option<u64>,
    pub pins: Option<Vec<String>>,
    pub max_iterations: Option<u64>,
    pub timeout: Option<String>,
    pub report_progress_interval: Option<String>,
    pub output_path: Option<PathBuf>,
    pub replay_path: Option<PathBuf>,
    pub visualization_mode: Option<VisualizationMode>,
    pub progress_log_level: Option<ProgressLogLevel>,
    pub global_log_level: Option<GlobalLogLevel>,
}

impl ConfigLayer {
    /// Reads the optional TOML file, then the `TILE_WEAVER_*` environment on top.
    pub fn load(file: Option<&PathBuf>) -> Result<Self, AppError> {
        let mut figment = Figment::new();
        if let Some(path) = file {
            if !path.exists() {
                return Err(AppError::Config(format!(
                    "configuration file {} does not exist",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| AppError::Config(format!("Invalid configuration: {e}")))
    }
}

fn from_command_line(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

fn parse_duration(field: &str, value: &str) -> Result<Duration, AppError> {
    humantime::parse_duration(value)
        .map_err(|e| AppError::Config(format!("invalid {field} '{value}': {e}")))
}

impl AppConfig {
    /// Parses `args` and layers the file and environment settings underneath.
    ///
    /// # Errors
    ///
    /// `AppError::Cli` for malformed flags (including `--help`), and
    /// `AppError::Config` for bad layered values or a missing rule file.
    pub fn load<I, T>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        let mut config = Self::from_arg_matches(&matches)?;
        let layer = ConfigLayer::load(config.config.as_ref())?;
        config.apply_layer(layer, &matches)?;
        if config.rule_file.is_none() {
            return Err(AppError::Config(
                "no rule file given (use --rule-file, the config file or TILE_WEAVER_RULE_FILE)"
                    .to_owned(),
            ));
        }
        Ok(config)
    }

    /// Copies every layered value whose flag was not given on the command line.
    fn apply_layer(&mut self, layer: ConfigLayer, matches: &ArgMatches) -> Result<(), AppError> {
        macro_rules! fill {
            ($field:ident) => {
                if let Some(value) = layer.$field {
                    if !from_command_line(matches, stringify!($field)) {
                        self.$field = value;
                    }
                }
            };
            ($field:ident, optional) => {
                if let Some(value) = layer.$field {
                    if !from_command_line(matches, stringify!($field)) {
                        self.$field = Some(value);
                    }
                }
            };
        }

        fill!(rule_file, optional);
        fill!(width);
        fill!(height);
        fill!(depth);
        fill!(boundary);
        fill!(seed, optional);
        fill!(max_iterations, optional);
        fill!(output_path);
        fill!(replay_path, optional);
        fill!(visualization_mode);
        fill!(progress_log_level);
        fill!(global_log_level);

        if let Some(pins) = layer.pins {
            if !from_command_line(matches, "pins") {
                self.pins = pins
                    .iter()
                    .map(|p| p.parse())
                    .collect::<Result<_, _>>()
                    .map_err(AppError::Config)?;
            }
        }
        if let Some(timeout) = layer.timeout {
            if !from_command_line(matches, "timeout") {
                self.timeout = Some(parse_duration("timeout", &timeout)?);
            }
        }
        if let Some(interval) = layer.report_progress_interval {
            if !from_command_line(matches, "report_progress_interval") {
                self.report_progress_interval =
                    Some(parse_duration("report_progress_interval", &interval)?);
            }
        }
        Ok(())
    }
}
