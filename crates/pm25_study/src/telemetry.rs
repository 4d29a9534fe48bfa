//! Read-only snapshot of what the participant display shows.

use crate::config::OperationMode;
use crate::environment::EnvironmentReading;

/// Display values at the end of a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TelemetrySnapshot {
    /// Exposure reading.
    pub exposure: f64,
    /// Environment values.
    pub environment: EnvironmentReading,
    /// Contact is required for emission (always on in this study).
    pub touch_required: bool,
    /// Particle visualisation visible.
    pub visualization: bool,
    /// Current mode.
    pub mode: OperationMode,
    /// Training bursts started.
    pub training_iteration: u32,
    /// Training bursts planned.
    pub training_iterations: u32,
    /// Training repeats forever.
    pub training_continuous: bool,
    /// Targets completed so far.
    pub completed_targets: usize,
    /// Targets in the session.
    pub total_targets: usize,
}

impl TelemetrySnapshot {
    /// `PM2.5: 1.2 μg/m³`
    #[must_use]
    pub fn exposure_text(&self) -> String {
        format!("PM2.5: {:.1} μg/m³", self.exposure)
    }

    /// `Wind Speed: 0.20 m/s` (magnitude only)
    #[must_use]
    pub fn wind_text(&self) -> String {
        format!("Wind Speed: {:.2} m/s", self.environment.wind_speed.abs())
    }

    /// `Humidity: 60.0%`
    #[must_use]
    pub fn humidity_text(&self) -> String {
        format!("Humidity: {:.1}%", self.environment.humidity)
    }

    /// `Temperature: 25.0°C`
    #[must_use]
    pub fn temperature_text(&self) -> String {
        format!("Temperature: {:.1}°C", self.environment.temperature)
    }

    /// `Touch Required: ON`
    #[must_use]
    pub fn touch_text(&self) -> String {
        format!("Touch Required: {}", on_off(self.touch_required))
    }

    /// `PM2.5 Visualization: OFF`
    #[must_use]
    pub fn visualization_text(&self) -> String {
        format!("PM2.5 Visualization: {}", on_off(self.visualization))
    }

    /// `Mode: Study`
    #[must_use]
    pub fn mode_text(&self) -> String {
        format!("Mode: {}", self.mode)
    }

    /// `Training: 2/5` or `Training: Continuous Mode`
    #[must_use]
    pub fn training_text(&self) -> String {
        if self.training_continuous {
            "Training: Continuous Mode".to_string()
        } else {
            format!("Training: {}/{}", self.training_iteration, self.training_iterations)
        }
    }

    /// Every display line in panel order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        vec![
            self.exposure_text(),
            self.wind_text(),
            self.humidity_text(),
            self.temperature_text(),
            self.touch_text(),
            self.visualization_text(),
            self.mode_text(),
            self.training_text(),
        ]
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "ON"
    } else {
        "OFF"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> TelemetrySnapshot {
        TelemetrySnapshot {
            exposure: 1.26,
            environment: EnvironmentReading {
                wind_speed: -0.213,
                humidity: 60.04,
                temperature: 25.16,
            },
            touch_required: true,
            visualization: false,
            mode: OperationMode::Study,
            training_iteration: 2,
            training_iterations: 5,
            training_continuous: false,
            completed_targets: 0,
            total_targets: 4,
        }
    }

    #[test]
    fn test_display_strings() {
        let s = snapshot();
        assert_eq!(s.exposure_text(), "PM2.5: 1.3 μg/m³");
        assert_eq!(s.wind_text(), "Wind Speed: 0.21 m/s");
        assert_eq!(s.humidity_text(), "Humidity: 60.0%");
        assert_eq!(s.temperature_text(), "Temperature: 25.2°C");
        assert_eq!(s.touch_text(), "Touch Required: ON");
        assert_eq!(s.visualization_text(), "PM2.5 Visualization: OFF");
        assert_eq!(s.mode_text(), "Mode: Study");
        assert_eq!(s.training_text(), "Training: 2/5");
    }

    #[test]
    fn test_continuous_training_text() {
        let s = TelemetrySnapshot {
            training_continuous: true,
            ..snapshot()
        };
        assert_eq!(s.training_text(), "Training: Continuous Mode");
        assert_eq!(s.lines().len(), 8);
    }
}
