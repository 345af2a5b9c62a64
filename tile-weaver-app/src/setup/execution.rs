//! Handles the core execution logic: load rules, solve on a worker thread, save results.

use crate::{
    config::{AppConfig, Pin, VisualizationMode},
    error::AppError,
    output::{self, ReplayLog},
    progress::{ConsoleProgressReporter, ProgressReporter},
    visualization::{TerminalVisualizer, Visualizer},
};
use anyhow::anyhow;
use log::{debug, error, info, warn};
use std::{
    ops::ControlFlow,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};
use wfc_core::{grid::Grid, Solver, SolverConfig, StepInfo, TileId, Topology, Verdict};
use wfc_rules::{loader::load_from_file, AdjacencyRules, TileSet};

const WATCHDOG_POLL: Duration = Duration::from_millis(10);

type SharedReporter = Arc<Mutex<ConsoleProgressReporter>>;

/// Adapts loaded rules to the axis count of the requested grid.
///
/// Planar grids use the four x/y axes, so six-axis rules are cut down to
/// their first four. Four-axis rules cannot describe a grid with depth.
pub fn fit_rules_to_grid(rules: AdjacencyRules, depth: usize) -> Result<AdjacencyRules, AppError> {
    let needed = if depth == 1 { 4 } else { 6 };
    if rules.num_axes() == needed {
        return Ok(rules);
    }
    let fitted = rules.restricted_to_axes(needed).ok_or_else(|| {
        AppError::Config(format!(
            "rules define {} axes but a grid of depth {} needs {}",
            rules.num_axes(),
            depth,
            needed
        ))
    })?;
    info!(
        "Using the first {} of {} rule axes for a planar grid",
        needed,
        rules.num_axes()
    );
    Ok(fitted)
}

/// Maps `x,y,z=tile` pins to solver seeds.
///
/// The tile is looked up by name first, then as a single glyph.
pub fn resolve_pins(
    pins: &[Pin],
    tileset: &TileSet,
    layout: &Grid<()>,
) -> Result<Vec<(usize, TileId)>, AppError> {
    pins.iter()
        .map(|pin| {
            let node = layout.index(pin.x, pin.y, pin.z).ok_or_else(|| {
                AppError::Config(format!(
                    "pin {},{},{} is outside the {}x{}x{} grid",
                    pin.x, pin.y, pin.z, layout.width, layout.height, layout.depth
                ))
            })?;
            let tile = tileset
                .find(&pin.tile)
                .or_else(|| {
                    let mut chars = pin.tile.chars();
                    match (chars.next(), chars.next()) {
                        (Some(glyph), None) => tileset.find_glyph(glyph),
                        _ => None,
                    }
                })
                .ok_or_else(|| AppError::Config(format!("unknown tile '{}' in pin", pin.tile)))?;
            Ok((node, tile))
        })
        .collect()
}

fn with_reporter(
    reporter: &SharedReporter,
    f: impl FnOnce(&mut ConsoleProgressReporter) -> anyhow::Result<()>,
) {
    match reporter.lock() {
        Ok(mut guard) => {
            if let Err(e) = f(&mut guard) {
                error!("Progress reporting failed: {}", e);
            }
        }
        Err(_) => error!("Progress reporter mutex poisoned!"),
    }
}

/// Runs a single solve as configured and writes its results.
///
/// The search runs on its own thread. With a `config.timeout` this thread
/// watches the clock and raises `shutdown_signal` once it passes; without
/// one it simply joins the worker. The solver checks the signal between
/// steps.
pub fn run_standard_mode(
    config: &AppConfig,
    shutdown_signal: Arc<AtomicBool>,
) -> Result<(), AppError> {
    info!("Running WFC standard mode...");

    let rule_file = config
        .rule_file
        .as_ref()
        .ok_or_else(|| AppError::Config("no rule file given".to_owned()))?;
    info!("Loading rules from: {:?}", rule_file);
    let (tileset, rules) = load_from_file(rule_file)?;
    info!(
        "Rules loaded: {} tiles, {} axes",
        tileset.num_tiles(),
        rules.num_axes()
    );
    let rules = fit_rules_to_grid(rules, config.depth)?;

    info!(
        "Initializing {}x{}x{} grid ({:?} boundary)",
        config.width, config.height, config.depth, config.boundary
    );
    let topology = Topology::grid(config.width, config.height, config.depth, config.boundary)?;
    let layout: Grid<()> = Grid::new(config.width, config.height, config.depth);
    let seeds = resolve_pins(&config.pins, &tileset, &layout)?;
    if !seeds.is_empty() {
        debug!("Seeds: {:?}", seeds);
    }

    // --- Solver configuration ---
    let mut builder = SolverConfig::builder().shutdown_signal(Arc::clone(&shutdown_signal));
    if let Some(seed) = config.seed {
        builder = builder.seed(seed);
    }
    if let Some(max) = config.max_iterations {
        builder = builder.max_iterations(max);
    }
    let reporter: Option<SharedReporter> = config.report_progress_interval.map(|interval| {
        Arc::new(Mutex::new(ConsoleProgressReporter::new(
            interval,
            config.progress_log_level,
        )))
    });
    if let Some(reporter) = &reporter {
        let reporter = Arc::clone(reporter);
        builder = builder.step_callback(Box::new(move |info: &StepInfo| {
            with_reporter(&reporter, |r| r.report(info));
            ControlFlow::Continue(())
        }));
    }

    let mut solver = Solver::new(topology, rules, seeds, builder.build())?;

    // --- Run the search on a worker thread ---
    info!("Starting WFC core algorithm...");
    let handle = thread::Builder::new()
        .name("wfc-solver".to_owned())
        .spawn(move || {
            let outcome = solver.run();
            (outcome, solver)
        })?;

    if let Some(timeout) = config.timeout {
        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline && !shutdown_signal.swap(true, Ordering::SeqCst) {
                warn!("Timeout of {:?} reached, cancelling the search", timeout);
            }
            thread::sleep(WATCHDOG_POLL);
        }
    }
    let (outcome, solver) = handle.join().map_err(|_| AppError::WorkerPanicked)?;
    info!("WFC core algorithm finished.");

    let stats = solver.stats();
    let grid = Grid::from_vec(
        config.width,
        config.height,
        config.depth,
        solver.results().to_vec(),
    )
    .ok_or_else(|| AppError::Anyhow(anyhow!("solver results do not match the grid size")))?;

    if config.visualization_mode != VisualizationMode::None {
        let mut visualizer =
            TerminalVisualizer::new(config.visualization_mode == VisualizationMode::Colored);
        if let Err(e) = visualizer.display_state(&grid, &tileset) {
            error!("Failed to display grid: {}", e);
        }
    }

    // --- Process Result ---
    match outcome {
        Ok(Verdict::Succeeded) => {
            info!("WFC completed successfully.");
            if let Some(reporter) = &reporter {
                with_reporter(reporter, |r| r.finish(&stats));
            }

            if config.output_path.as_os_str().is_empty() {
                debug!("No output path given, skipping grid output");
            } else {
                output::save_grid_to_file(&grid, &tileset, &config.output_path)
                    .map_err(AppError::SaveError)?;
            }
            if let Some(path) = &config.replay_path {
                let log = ReplayLog::new(&grid, &tileset, solver.ordered_results())
                    .map_err(AppError::SaveError)?;
                output::save_replay(&log, path).map_err(AppError::SaveError)?;
            }
            Ok(())
        }
        Ok(Verdict::Failed) => {
            if let Some(reporter) = &reporter {
                with_reporter(reporter, |r| r.fail("no valid assignment exists"));
            }
            error!(
                "WFC failed after {} iterations and {} backtracks",
                stats.iterations, stats.backtracks
            );
            Err(AppError::Failed)
        }
        Ok(Verdict::Cancelled) => {
            if let Some(reporter) = &reporter {
                with_reporter(reporter, |r| r.fail("cancelled"));
            }
            warn!(
                "WFC cancelled with {}/{} nodes collapsed",
                solver.result_count(),
                grid.len()
            );
            Err(AppError::Cancelled)
        }
        Err(e) => {
            if let Some(reporter) = &reporter {
                with_reporter(reporter, |r| r.fail(&e.to_string()));
            }
            Err(AppError::WfcCore(e))
        }
    }
}
