//! # PM25 DrillSim
//!
//! Simulation of PM2.5 dust released while drilling, built for a user study
//! on exposure awareness.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            PM25 DRILLSIM                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐   │
//! │  │  pm25_study     │     │ pm25_transport  │     │  pm25_shared    │   │
//! │  │                 │────>│                 │────>│                 │   │
//! │  │  • Activation   │     │  • Emission     │     │  • Vec3 / Color │   │
//! │  │  • Modes        │     │  • Drift        │     │  • Cadence      │   │
//! │  │  • Exposure     │     │  • Diffusion    │     │                 │   │
//! │  │  • Event log    │     │  • Density      │     │                 │   │
//! │  └────────┬────────┘     └─────────────────┘     └─────────────────┘   │
//! │           │                                                             │
//! │           v                                                             │
//! │  ┌─────────────────┐                                                    │
//! │  │  pm25 (this)    │  scripted drivers, headless runner, `drillsim`     │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `driver`: scripted participants
//! - `runner`: headless run loop and summary

pub mod driver;
pub mod runner;

pub use pm25_shared as shared;
pub use pm25_study as study;
pub use pm25_transport as transport;

pub use driver::{Driver, IdleDriver, Script, SweepDriver, TrainingDriver};
pub use runner::{run, EventCounts, RunOptions, RunSummary};
