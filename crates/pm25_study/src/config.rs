//! # Study Configuration
//!
//! Loaded from TOML. Every section has defaults, so a file only lists what
//! differs:
//!
//! ```toml
//! participant_id = 12
//! construction = "active_drilling"
//! mode = "training"
//!
//! [[targets]]
//! name = "BurstPoint_1"
//! position = { x = 0.0, y = 1.0, z = 0.5 }
//!
//! [training]
//! iterations = 3
//! ```

use std::path::{Path, PathBuf};

use pm25_shared::Vec3;
use pm25_transport::{DensityConfig, EmissionConfig, TransportConfig};
use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentConfig;
use crate::error::{StudyError, StudyResult};
use crate::exposure::ExposureConfig;
use crate::training::TrainingConfig;

/// Operating mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    /// Autonomous training bursts on one target.
    Training,
    /// Participant drills with the visualisation hidden.
    #[default]
    Study,
}

impl OperationMode {
    /// The other mode.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Training => Self::Study,
            Self::Study => Self::Training,
        }
    }
}

impl std::fmt::Display for OperationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Training => write!(f, "Training"),
            Self::Study => write!(f, "Study"),
        }
    }
}

/// Study condition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionType {
    /// The participant drills at the targets.
    #[default]
    ActiveDrilling,
    /// The participant watches; exposure rises on a timer.
    PassiveMoving,
}

impl std::fmt::Display for ConstructionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ActiveDrilling => write!(f, "ActiveDrilling"),
            Self::PassiveMoving => write!(f, "PassiveMoving"),
        }
    }
}

/// One burst point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Name used in log labels.
    pub name: String,
    /// World position; the emission source sits here.
    #[serde(default)]
    pub position: Vec3,
}

/// Event log settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Write the CSV log.
    pub enabled: bool,
    /// Directory receiving `Data_PID{id}_{construction}.csv`.
    pub directory: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("Data_Collected"),
        }
    }
}

/// Complete session configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Participant number used in the log file name.
    pub participant_id: u32,
    /// Study condition.
    pub construction: ConstructionType,
    /// Mode at start.
    pub mode: OperationMode,
    /// Seconds of continuous hold that complete a target.
    pub required_hold_time: f64,
    /// Visualisation visible at start (Study hides it on entry).
    pub show_visualization: bool,
    /// Stop the run once every target is completed.
    pub exit_on_complete: bool,
    /// Seed for every stochastic component.
    pub seed: u64,
    /// Capacity of the control queue and the event bus.
    pub channel_capacity: usize,
    /// Burst points in priority order.
    pub targets: Vec<TargetConfig>,
    /// Emission at each burst point.
    pub emission: EmissionConfig,
    /// Particle transport.
    pub transport: TransportConfig,
    /// Density colouring.
    pub density: DensityConfig,
    /// Training schedule.
    pub training: TrainingConfig,
    /// Exposure rates.
    pub exposure: ExposureConfig,
    /// Telemetry drift.
    pub environment: EnvironmentConfig,
    /// Event log.
    pub log: LogConfig,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            participant_id: 0,
            construction: ConstructionType::ActiveDrilling,
            mode: OperationMode::Study,
            required_hold_time: 3.0,
            show_visualization: true,
            exit_on_complete: true,
            seed: 123,
            channel_capacity: 1024,
            targets: default_targets(),
            emission: EmissionConfig {
                total_budget: 50,
                duration: 3.0,
                burst_force: 10.0,
                burst_spread: 5.0,
                ..EmissionConfig::default()
            },
            transport: TransportConfig::drilling_burst(),
            density: DensityConfig::default(),
            training: TrainingConfig::default(),
            exposure: ExposureConfig::default(),
            environment: EnvironmentConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Four burst points on a wall panel.
fn default_targets() -> Vec<TargetConfig> {
    (0..4)
        .map(|i| TargetConfig {
            name: format!("BurstPoint_{}", i + 1),
            position: Vec3::new(-0.45 + 0.3 * i as f32, 1.2, 0.6),
        })
        .collect()
}

impl StudyConfig {
    /// Parses TOML and sanitizes the result.
    ///
    /// # Errors
    ///
    /// Returns [`StudyError::Config`] if the text is not valid TOML for
    /// this structure.
    pub fn from_toml_str(text: &str) -> StudyResult<Self> {
        let config: Self = toml::from_str(text)?;
        Ok(config.sanitize())
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`StudyError::ConfigRead`] if the file cannot be read and
    /// [`StudyError::Config`] if it cannot be parsed.
    pub fn from_file(path: impl AsRef<Path>) -> StudyResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| StudyError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Clamps invalid values into range, logging each change.
    #[must_use]
    pub fn sanitize(mut self) -> Self {
        if !(self.required_hold_time.is_finite() && self.required_hold_time > 0.0) {
            tracing::warn!("required_hold_time {} clamped to 3.0", self.required_hold_time);
            self.required_hold_time = 3.0;
        }

        if self.targets.is_empty() {
            tracing::warn!("no targets configured; the session can never complete");
        } else if self.training.target_index >= self.targets.len() {
            let clamped = self.targets.len() - 1;
            tracing::warn!(
                "training target_index {} out of range, clamped to {clamped}",
                self.training.target_index
            );
            self.training.target_index = clamped;
        }

        let training = &mut self.training;
        training.interval = non_negative("training.interval", training.interval);
        training.burst_duration = non_negative("training.burst_duration", training.burst_duration);

        let exposure = &mut self.exposure;
        exposure.study_rate = non_negative("exposure.study_rate", exposure.study_rate);
        exposure.training_rate = non_negative("exposure.training_rate", exposure.training_rate);
        exposure.decay = non_negative("exposure.decay", exposure.decay);
        if exposure.passive_max < exposure.passive_min {
            tracing::warn!("exposure.passive_max below passive_min, swapped");
            std::mem::swap(&mut exposure.passive_min, &mut exposure.passive_max);
        }
        if !(exposure.passive_interval.is_finite() && exposure.passive_interval > 0.0) {
            tracing::warn!("exposure.passive_interval {} clamped to 1.5", exposure.passive_interval);
            exposure.passive_interval = 1.5;
        }

        if self.channel_capacity == 0 {
            tracing::warn!("channel_capacity 0 clamped to 1");
            self.channel_capacity = 1;
        }

        self.emission = self.emission.sanitized();
        self.transport = self.transport.sanitized();
        self.density = self.density.sanitized();
        self.environment = self.environment.sanitized();
        self
    }

    /// Log file path for this participant and condition.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.log.directory.join(crate::record::CsvEventLog::file_name(
            self.participant_id,
            &self.construction.to_string(),
        ))
    }
}

fn non_negative(name: &str, value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        tracing::warn!("{name} {value} clamped to 0");
        0.0
    }
}
