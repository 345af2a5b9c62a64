use crate::config::ProgressLogLevel;
use anyhow::Result;
use log::Level;
use std::time::{Duration, Instant};
use wfc_core::{SolveStats, StepEvent, StepInfo};

/// Trait for reporting the progress of the solver.
///
/// Reporters are driven from the solver thread through the step callback.
pub trait ProgressReporter: Send {
    /// Called on every step the solver reports.
    ///
    /// Implementations decide themselves how often to actually emit anything.
    fn report(&mut self, info: &StepInfo) -> Result<()>;

    /// Called when the search ends with a complete assignment.
    fn finish(&mut self, stats: &SolveStats) -> Result<()>;

    /// Called when the search ends without one.
    fn fail(&mut self, reason: &str) -> Result<()>;
}

/// A `ProgressReporter` that logs throttled status lines.
pub struct ConsoleProgressReporter {
    start_time: Instant,
    last_report_time: Option<Instant>,
    report_interval: Duration,
    level: Level,
}

impl ConsoleProgressReporter {
    /// Creates a reporter emitting at most one line per `report_interval`.
    pub fn new(report_interval: Duration, level: ProgressLogLevel) -> Self {
        let level = match level {
            ProgressLogLevel::Trace => Level::Trace,
            ProgressLogLevel::Debug => Level::Debug,
            ProgressLogLevel::Info => Level::Info,
            ProgressLogLevel::Warn => Level::Warn,
        };
        Self {
            start_time: Instant::now(),
            last_report_time: None,
            report_interval,
            level,
        }
    }

    fn format_duration(duration: Duration) -> String {
        let secs = duration.as_secs();
        let millis = duration.subsec_millis();
        format!("{}.{:03}s", secs, millis)
    }

    /// Builds the status line for `info`.
    pub fn format_report(info: &StepInfo, elapsed: Duration) -> String {
        let percentage = if info.total_nodes > 0 {
            (info.collapsed_nodes as f32 / info.total_nodes as f32) * 100.0
        } else {
            100.0
        };
        let elapsed_secs = elapsed.as_secs_f32();
        let rate = if elapsed_secs > 0.0 {
            info.collapsed_nodes as f32 / elapsed_secs
        } else {
            0.0
        };
        format!(
            "Progress: Iter {} | Collapsed {}/{} ({:.1}%) | Backtracks {} | Elapsed: {} | Rate: {:.1} nodes/s",
            info.iteration,
            info.collapsed_nodes,
            info.total_nodes,
            percentage,
            info.backtracks,
            Self::format_duration(elapsed),
            rate
        )
    }

    /// Whether enough time has passed since the last emitted line.
    fn due(&mut self, now: Instant) -> bool {
        match self.last_report_time {
            Some(last) if now.duration_since(last) < self.report_interval => false,
            _ => {
                self.last_report_time = Some(now);
                true
            }
        }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report(&mut self, info: &StepInfo) -> Result<()> {
        // Only completed collapses carry a meaningful count.
        if info.event != StepEvent::Collapsed {
            return Ok(());
        }
        if self.due(Instant::now()) {
            let msg = Self::format_report(info, self.start_time.elapsed());
            log::log!(self.level, "{}", msg);
        }
        Ok(())
    }

    fn finish(&mut self, stats: &SolveStats) -> Result<()> {
        log::log!(
            self.level,
            "WFC finished after {} iterations ({} collapses, {} backtracks). Total time: {}",
            stats.iterations,
            stats.collapses,
            stats.backtracks,
            Self::format_duration(self.start_time.elapsed())
        );
        Ok(())
    }

    fn fail(&mut self, reason: &str) -> Result<()> {
        log::error!(
            "WFC failed: {}. Total time: {}",
            reason,
            Self::format_duration(self.start_time.elapsed())
        );
        Ok(())
    }
}
