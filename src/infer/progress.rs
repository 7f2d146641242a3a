//! Pass progress with Kalman-filtered ETA
//!
//! Progress is informational: it is logged at `debug` level and never affects
//! how many steps a pass runs.

use std::time::Instant;

use tracing::debug;

use crate::config::ProgressConfig;

/// Kalman filter over per-step duration.
#[derive(Debug, Clone)]
pub struct KalmanEta {
    estimate: f64,
    error_cov: f64,
    process_noise: f64,
    measurement_noise: f64,
}

impl Default for KalmanEta {
    fn default() -> Self {
        Self { estimate: 1.0, error_cov: 1.0, process_noise: 0.01, measurement_noise: 0.1 }
    }
}

impl KalmanEta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one measured step duration (seconds).
    pub fn update(&mut self, measured: f64) {
        let predicted_error = self.error_cov + self.process_noise;
        let gain = predicted_error / (predicted_error + self.measurement_noise);
        self.estimate += gain * (measured - self.estimate);
        self.error_cov = (1.0 - gain) * predicted_error;
    }

    pub fn eta_seconds(&self, remaining_steps: usize) -> f64 {
        self.estimate * remaining_steps as f64
    }
}

/// Format duration in seconds to human-readable string.
pub fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{secs:.0}s")
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor();
        let s = (secs % 60.0).floor();
        format!("{mins}m {s:02.0}s")
    } else {
        let hours = (secs / 3600.0).floor();
        let mins = ((secs % 3600.0) / 60.0).floor();
        format!("{hours}h {mins:02.0}m")
    }
}

/// Step counter for one inference pass.
#[derive(Debug, Clone)]
pub struct PassProgress {
    label: &'static str,
    total: Option<usize>,
    current: usize,
    config: ProgressConfig,
    kalman: KalmanEta,
    last_step: Option<Instant>,
}

impl PassProgress {
    /// Start tracking a pass of `total` steps (unknown if `None`).
    pub fn new(label: &'static str, total: Option<usize>, config: &ProgressConfig) -> Self {
        Self {
            label,
            total,
            current: 0,
            config: config.clone(),
            kalman: KalmanEta::new(),
            last_step: Some(Instant::now()),
        }
    }

    /// Record one finished step.
    pub fn step(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_step {
            self.kalman.update(now.duration_since(last).as_secs_f64());
        }
        self.last_step = Some(now);
        self.current += 1;

        let at_end = self.total == Some(self.current);
        if self.config.enabled && (self.current.is_multiple_of(self.config.log_interval) || at_end) {
            debug!(runner = self.label, step = self.current, total = ?self.total, "{}", self.render());
        }
    }

    /// Steps finished so far
    pub fn current(&self) -> usize {
        self.current
    }

    /// Completion percentage; `None` when the total is unknown.
    pub fn percent(&self) -> Option<f32> {
        match self.total {
            Some(0) => Some(100.0),
            Some(total) => Some((self.current as f32 / total as f32 * 100.0).min(100.0)),
            None => None,
        }
    }

    /// Render a one-line progress bar.
    pub fn render(&self) -> String {
        let (Some(total), Some(percent)) = (self.total, self.percent()) else {
            return format!("{} steps", self.current);
        };
        let width = self.config.bar_width;
        let filled = ((percent / 100.0) * width as f32).round() as usize;
        let bar: String = std::iter::repeat_n('█', filled)
            .chain(std::iter::repeat_n('░', width.saturating_sub(filled)))
            .collect();
        let eta = format_duration(self.kalman.eta_seconds(total.saturating_sub(self.current)));

        format!("[{bar}] {percent:>5.1}% │ {}/{total} │ ETA: {eta}", self.current)
    }
}
