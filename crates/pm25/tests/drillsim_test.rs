//! # DrillSim Run Tests
//!
//! Full headless runs of each scripted participant against the default
//! study setup.
//!
//! Run with: cargo test -p pm25 --test drillsim_test

use pm25::study::{
    ConstructionType, FixedStep, OperationMode, Session, SessionStatus, StudyConfig, TimeSource,
};
use pm25::{run, RunOptions, Script};

fn options(max_seconds: f64) -> RunOptions {
    RunOptions {
        max_seconds,
        ..RunOptions::default()
    }
}

/// Test: the sweep completes every target and the run stops on completion.
#[test]
fn sweep_run_finishes() {
    let mut session = Session::new(StudyConfig::default());
    let mut driver = Script::Sweep.driver();
    let mut clock = FixedStep::from_rate(60);

    let summary = run(&mut session, driver.as_mut(), &mut clock, options(60.0));

    assert_eq!(summary.status, SessionStatus::Finished);
    assert_eq!(summary.events.targets_completed, 4);
    assert_eq!(summary.events.sessions_completed, 1);
    assert_eq!(summary.session.manual_records, 3);
    assert_eq!(summary.telemetry.completed_targets, 4);
    assert!(summary.peak_particles > 0);
    assert!(summary.telemetry.exposure > 1.0);
    // four 3 s holds plus approaches
    assert!(summary.simulated_seconds > 12.0);
    assert!(summary.simulated_seconds < 20.0);
}

/// Test: the training script runs every burst, then the cycle finishes.
#[test]
fn training_run_bursts() {
    let mut session = Session::new(StudyConfig::default());
    let mut driver = Script::Training.driver();
    let mut clock = FixedStep::from_rate(60);

    let summary = run(&mut session, driver.as_mut(), &mut clock, options(30.0));

    assert_eq!(summary.status, SessionStatus::Running);
    assert_eq!(summary.telemetry.mode, OperationMode::Training);
    assert_eq!(summary.events.mode_changes, 1);
    assert_eq!(summary.events.training_bursts, 5);
    assert_eq!(summary.events.training_finished, 1);
    assert_eq!(summary.telemetry.training_iteration, 5);
    assert!(summary.particles_spawned > 0);
    assert_eq!(summary.telemetry.completed_targets, 0);
}

/// Test: an idle passive participant still accumulates exposure.
#[test]
fn idle_passive_run_accumulates_exposure() {
    let mut session = Session::new(StudyConfig {
        construction: ConstructionType::PassiveMoving,
        ..Default::default()
    });
    let mut driver = Script::Idle.driver();
    let mut clock = FixedStep::from_rate(30);

    let summary = run(&mut session, driver.as_mut(), &mut clock, options(10.0));

    assert_eq!(summary.status, SessionStatus::Running);
    assert_eq!(summary.peak_particles, 0);
    assert!(summary.telemetry.exposure > 1.0);
    assert!(summary.simulated_seconds >= 10.0);
}

/// A clock that never advances.
struct FrozenClock;

impl TimeSource for FrozenClock {
    fn next_dt(&mut self) -> f64 {
        0.0
    }
}

/// Test: a disabled session stops the run instead of spinning forever.
#[test]
fn disabled_session_run_returns() {
    let mut session = Session::new(StudyConfig::default());
    session.disable();
    let mut driver = Script::Sweep.driver();
    let mut clock = FixedStep::from_rate(60);

    let summary = run(&mut session, driver.as_mut(), &mut clock, options(60.0));

    assert_eq!(summary.status, SessionStatus::Running);
    assert_eq!(summary.ticks, RunOptions::default().stall_ticks);
    assert_eq!(summary.simulated_seconds, 0.0);
}

/// Test: a clock yielding `dt = 0` stops the run.
#[test]
fn frozen_clock_run_returns() {
    let mut session = Session::new(StudyConfig::default());
    let mut driver = Script::Idle.driver();
    let summary = run(
        &mut session,
        driver.as_mut(),
        &mut FrozenClock,
        RunOptions {
            stall_ticks: 10,
            ..options(60.0)
        },
    );

    assert_eq!(summary.ticks, 10);
    assert_eq!(summary.simulated_seconds, 0.0);
}

/// Test: the tick limit ends a run before the time limit.
#[test]
fn tick_limit_ends_run() {
    let mut session = Session::new(StudyConfig::default());
    let mut driver = Script::Idle.driver();
    let mut clock = FixedStep::from_rate(60);
    let summary = run(
        &mut session,
        driver.as_mut(),
        &mut clock,
        RunOptions {
            max_ticks: Some(120),
            ..options(60.0)
        },
    );

    assert_eq!(summary.ticks, 120);
    assert!((summary.simulated_seconds - 2.0).abs() < 1e-9);
    assert_eq!(summary.status, SessionStatus::Running);
}
