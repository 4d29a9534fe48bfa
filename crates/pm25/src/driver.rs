//! # Scripted Participants
//!
//! Headless stand-ins for a participant. A [`Driver`] is called before every
//! tick and acts on the session exactly as input devices would: contacts,
//! the held trigger, mode toggles.

use pm25_study::{ControlAction, OperationMode, Session, TargetId};

/// Scenario selected on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Script {
    /// Touch and hold every target in order until the session completes.
    #[default]
    Sweep,
    /// Do nothing; useful for the passive construction condition.
    Idle,
    /// Switch to Training mode and watch the bursts.
    Training,
}

impl Script {
    /// Builds the driver for this scenario.
    #[must_use]
    pub fn driver(self) -> Box<dyn Driver> {
        match self {
            Self::Sweep => Box::new(SweepDriver::default()),
            Self::Idle => Box::new(IdleDriver),
            Self::Training => Box::new(TrainingDriver::default()),
        }
    }
}

/// Acts on a session before each tick.
pub trait Driver {
    /// Called with the `dt` of the upcoming tick.
    fn drive(&mut self, session: &mut Session, dt: f64);
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum SweepState {
    /// Moving to the next target.
    Approaching { index: usize, remaining: f64 },
    /// Touching with the trigger held.
    Holding { index: usize },
    Done,
}

/// Walks the driller across every target in configured order, holding each
/// one until it completes and marking a manual record after each.
#[derive(Clone, Debug)]
pub struct SweepDriver {
    state: SweepState,
    approach_time: f64,
    record_on_complete: bool,
    entered_study: bool,
}

impl SweepDriver {
    /// Creates a sweep that spends `approach_time` seconds between targets.
    #[must_use]
    pub fn new(approach_time: f64, record_on_complete: bool) -> Self {
        Self {
            state: SweepState::Approaching {
                index: 0,
                remaining: approach_time,
            },
            approach_time,
            record_on_complete,
            entered_study: false,
        }
    }

    /// All targets visited.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == SweepState::Done
    }
}

impl Default for SweepDriver {
    fn default() -> Self {
        Self::new(0.5, true)
    }
}

impl Driver for SweepDriver {
    fn drive(&mut self, session: &mut Session, dt: f64) {
        if !self.entered_study {
            self.entered_study = true;
            if session.mode() != OperationMode::Study {
                session.apply(ControlAction::ToggleMode);
            }
        }

        match self.state {
            SweepState::Approaching { index, remaining } => {
                if index >= session.activation().targets().len() {
                    self.state = SweepState::Done;
                    return;
                }
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.state = SweepState::Approaching { index, remaining };
                    return;
                }
                tracing::debug!("Sweep reached target {index}");
                session.apply(ControlAction::ContactEnter(TargetId(index)));
                session.apply(ControlAction::PrimaryActivation(true));
                self.state = SweepState::Holding { index };
            }
            SweepState::Holding { index } => {
                let completed = session
                    .target(TargetId(index))
                    .is_some_and(|t| t.is_completed());
                if !completed {
                    return;
                }
                session.apply(ControlAction::PrimaryActivation(false));
                session.apply(ControlAction::ContactExit(TargetId(index)));
                if self.record_on_complete {
                    session.apply(ControlAction::RecordManualEvent);
                }
                self.state = SweepState::Approaching {
                    index: index + 1,
                    remaining: self.approach_time,
                };
            }
            SweepState::Done => {}
        }
    }
}

/// Never touches anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdleDriver;

impl Driver for IdleDriver {
    fn drive(&mut self, _session: &mut Session, _dt: f64) {}
}

/// Puts the session into Training mode once, then watches.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrainingDriver {
    switched: bool,
}

impl Driver for TrainingDriver {
    fn drive(&mut self, session: &mut Session, _dt: f64) {
        if self.switched {
            return;
        }
        self.switched = true;
        if session.mode() != OperationMode::Training {
            session.apply(ControlAction::ToggleMode);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pm25_study::StudyConfig;

    fn session() -> Session {
        Session::new(StudyConfig {
            exit_on_complete: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_sweep_waits_before_first_contact() {
        let mut session = session();
        let mut driver = SweepDriver::new(0.3, false);

        driver.drive(&mut session, 0.1);
        session.tick(0.1);
        assert!(!session.target(TargetId(0)).unwrap().is_touching());

        for _ in 0..4 {
            driver.drive(&mut session, 0.1);
            session.tick(0.1);
        }
        assert!(session.target(TargetId(0)).unwrap().is_touching());
        assert_eq!(session.activation().active(), Some(TargetId(0)));
    }

    #[test]
    fn test_sweep_completes_every_target() {
        let mut session = session();
        let mut driver = SweepDriver::default();

        for _ in 0..400 {
            driver.drive(&mut session, 0.05);
            session.tick(0.05);
        }
        assert!(driver.is_done());
        assert!(session.is_completed());
        assert_eq!(session.stats().manual_records, 4);
    }

    #[test]
    fn test_sweep_leaves_training_mode() {
        let mut session = Session::new(StudyConfig {
            mode: OperationMode::Training,
            ..Default::default()
        });
        SweepDriver::default().drive(&mut session, 0.1);
        assert_eq!(session.mode(), OperationMode::Study);
    }

    #[test]
    fn test_training_driver_switches_once() {
        let mut session = session();
        let mut driver = TrainingDriver::default();
        driver.drive(&mut session, 0.1);
        driver.drive(&mut session, 0.1);
        assert_eq!(session.mode(), OperationMode::Training);
        assert!(session.training().is_running());
    }
}
