//! # PM25 Shared
//!
//! Common types used by the transport model and the study session.
//!
//! ## RULE
//!
//! This crate must NEVER depend on simulation crates. It only holds plain
//! data that both sides agree on.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod math;
pub mod timing;

pub use math::{Color, Vec3};
pub use timing::Cadence;
