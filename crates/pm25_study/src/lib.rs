//! # PM25 Study
//!
//! Session logic for the drilling exposure study:
//! - Touch-and-hold activation over a set of burst-point targets
//! - Training mode (autonomous bursts) and Study mode (participant drills)
//! - Exposure reading and environment drift
//! - Append-only event log
//!
//! ## Architecture Rules
//!
//! 1. **One tick, one thread** - [`Session::tick`] owns all state
//! 2. **Channels at the edge** - inputs arrive on a [`ControlQueue`], events leave on an [`EventBus`]
//! 3. **Injected time** - every `dt` comes from the caller or a [`TimeSource`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use pm25_study::{ControlAction, Session, StudyConfig, TargetId};
//!
//! let mut session = Session::new(StudyConfig::default());
//! let input = session.control_handle();
//! input.send(ControlAction::ContactEnter(TargetId(0)));
//! input.send(ControlAction::PrimaryActivation(true));
//! session.tick(1.0 / 60.0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod activation;
pub mod clock;
pub mod config;
pub mod control;
pub mod environment;
pub mod error;
pub mod events;
pub mod exposure;
pub mod record;
pub mod session;
pub mod target;
pub mod telemetry;
pub mod training;

pub use activation::{ActivationFrame, ActivationMachine, ContactRelease};
pub use clock::{FixedStep, TimeSource, WallClock, MAX_FRAME_DELTA};
pub use config::{ConstructionType, LogConfig, OperationMode, StudyConfig, TargetConfig};
pub use control::{ControlAction, ControlHandle, ControlQueue};
pub use environment::{Environment, EnvironmentConfig, EnvironmentReading};
pub use error::{StudyError, StudyResult};
pub use events::{EventBus, EventReceiver, EventSender, StudyEvent};
pub use exposure::{ExposureConfig, ExposureMeter};
pub use record::{CsvEventLog, EventRecord, EventSink, MemoryEventLog, WriterEventLog};
pub use session::{Session, SessionStats, SessionStatus};
pub use target::{Target, TargetId, TargetPhase};
pub use telemetry::TelemetrySnapshot;
pub use training::{TrainingConfig, TrainingCycle, TrainingPhase, TrainingTick};
