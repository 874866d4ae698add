use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::time::{Duration, Instant};

/// Receives training progress from the stacked RBM curriculum.
///
/// The curriculum calls [`ProgressMonitor::tick`] every `progress_interval` rounds with the
/// number of rounds completed so far across all layers and the total number of rounds. How (or
/// whether) that is displayed is up to the implementation.
///
/// Any `FnMut(usize, usize)` closure is a monitor.
pub trait ProgressMonitor {
    /// Reports that `step` of `total` rounds have been started.
    fn tick(&mut self, step: usize, total: usize);

    /// Called once when training has finished.
    fn finish(&mut self) {}
}

impl<F> ProgressMonitor for F
where
    F: FnMut(usize, usize),
{
    fn tick(&mut self, step: usize, total: usize) {
        self(step, total)
    }
}

/// Minimum time between two reports of a [`StepMonitor`].
const STEP_MONITOR_PERIOD: Duration = Duration::from_millis(1500);

/// Logs percentage complete and an estimate of the remaining time, at most every 1.5 seconds.
///
/// The first tick only starts the clock.
#[derive(Debug, Default)]
pub struct StepMonitor {
    start: Option<Instant>,
    last_report: Duration,
}

impl StepMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Formats a report line for `step` of `total` rounds after `elapsed` time.
    pub fn describe(step: usize, total: usize, elapsed: Duration) -> String {
        let percent = if total == 0 { 100 } else { 100 * step / total };
        let remaining = if step == 0 {
            Duration::ZERO
        } else {
            elapsed.mul_f64((total.saturating_sub(step)) as f64 / step as f64)
        };
        format!(
            "{:02}% complete, {}s remaining, #{}",
            percent,
            remaining.as_secs(),
            step
        )
    }
}

impl ProgressMonitor for StepMonitor {
    fn tick(&mut self, step: usize, total: usize) {
        let start = match self.start {
            Some(start) => start,
            None => {
                self.start = Some(Instant::now());
                return;
            }
        };

        let elapsed = start.elapsed();
        if elapsed >= self.last_report + STEP_MONITOR_PERIOD {
            self.last_report = elapsed;
            info!("{}", Self::describe(step, total, elapsed));
        }
    }
}

/// Renders training progress as an `indicatif` progress bar.
pub struct ProgressBarMonitor {
    bar: Option<ProgressBar>,
}

impl ProgressBarMonitor {
    pub fn new() -> Self {
        ProgressBarMonitor { bar: None }
    }

    fn bar(&mut self, total: usize) -> &ProgressBar {
        self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} rounds | ETA {eta}")
            {
                bar.set_style(style.progress_chars("█▓░"));
            }
            bar
        })
    }
}

impl Default for ProgressBarMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressMonitor for ProgressBarMonitor {
    fn tick(&mut self, step: usize, total: usize) {
        self.bar(total).set_position(step as u64);
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_with_message("Training completed");
        }
    }
}
