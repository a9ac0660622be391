use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use crate::drivers::SessionLayout;
pub const DEFAULT_CONFIG_FILE: &str = "ctg_monitor.json";
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}
impl AxisBounds {
    pub fn range(&self) -> Range<f64> {
        self.min..self.max
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    pub sample_rate_hz: f64,
    pub batch_size: usize,
    pub tick_ms: u64,
    pub base_bpm: f64,
    pub variability_bpm: f64,
    pub min_bpm: f64,
    pub max_bpm: f64,
    /// Seconds between simulated contraction peaks.
    pub contraction_period_sec: f64,
    pub seed: Option<u64>,
}
impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 4.0,
            batch_size: 8,
            tick_ms: 500,
            base_bpm: 140.0,
            variability_bpm: 8.0,
            min_bpm: 60.0,
            max_bpm: 210.0,
            contraction_period_sec: 180.0,
            seed: None,
        }
    }
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Samples kept per channel while streaming.
    pub live_window_points: usize,
    /// Samples kept per channel when replaying a recorded stream.
    pub replay_window_points: usize,
    pub hr_time_scale: f64,
    pub uc_time_scale: f64,
    pub hr_axis: AxisBounds,
    pub uc_axis: AxisBounds,
    pub emulator: EmulatorConfig,
    /// Where saved sessions and chart exports go.
    pub output_dir: PathBuf,
}
impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            live_window_points: 52,
            replay_window_points: 600,
            hr_time_scale: 1.0,
            uc_time_scale: 1.0,
            hr_axis: AxisBounds {
                min: 50.0,
                max: 200.0,
            },
            uc_axis: AxisBounds {
                min: 0.0,
                max: 100.0,
            },
            emulator: EmulatorConfig::default(),
            output_dir: PathBuf::from("recordings"),
        }
    }
}
impl MonitorConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        let config: MonitorConfig = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config in {}", path.display()))?
        } else {
            log::info!("no config at {}, using defaults", path.display());
            MonitorConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
    /// First CLI argument if given, otherwise the default file name.
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let path = args
            .into_iter()
            .nth(1)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load(&path)
    }
    pub fn validate(&self) -> Result<()> {
        if self.live_window_points == 0 || self.replay_window_points == 0 {
            bail!("window sizes must be greater than zero");
        }
        if self.hr_time_scale <= 0.0 || self.uc_time_scale <= 0.0 {
            bail!("time scales must be positive");
        }
        if self.emulator.sample_rate_hz <= 0.0 || self.emulator.batch_size == 0 {
            bail!("emulator needs a positive sample rate and batch size");
        }
        if self.emulator.variability_bpm < 0.0 || self.emulator.min_bpm > self.emulator.max_bpm {
            bail!("emulator heart-rate limits are inconsistent");
        }
        if self.hr_axis.min >= self.hr_axis.max || self.uc_axis.min >= self.uc_axis.max {
            bail!("axis bounds must satisfy min < max");
        }
        Ok(())
    }
    pub fn live_layout(&self) -> SessionLayout {
        SessionLayout {
            live_window: self.live_window_points,
            hr_time_scale: self.hr_time_scale,
            uc_time_scale: self.uc_time_scale,
        }
    }
    pub fn replay_layout(&self) -> SessionLayout {
        SessionLayout {
            live_window: self.replay_window_points,
            ..self.live_layout()
        }
    }
    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}
