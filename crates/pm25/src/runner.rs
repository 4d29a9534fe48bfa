//! # Headless Runner
//!
//! Drives a [`Session`] from a [`TimeSource`] until it finishes, a time or
//! tick limit is reached, or session time stops advancing. Collects the
//! counters printed at the end of a run.
//!
//! ```text
//! ┌──────────┐   dt    ┌──────────┐  actions  ┌──────────┐
//! │  Clock   │────────>│  Driver  │──────────>│ Session  │
//! └──────────┘         └──────────┘           └────┬─────┘
//!                                                  │ events
//!                                                  v
//!                                            ┌──────────┐
//!                                            │ Summary  │
//!                                            └──────────┘
//! ```

use std::time::{Duration, Instant};

use pm25_shared::Cadence;
use pm25_study::{
    Session, SessionStats, SessionStatus, StudyEvent, TelemetrySnapshot, TimeSource,
};

use crate::driver::Driver;

/// Run limits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunOptions {
    /// Stop after this much session time (s).
    pub max_seconds: f64,
    /// Stop after this many ticks.
    pub max_ticks: Option<u64>,
    /// Stop after this many consecutive ticks in which session time did not
    /// advance (disabled session, clock yielding `dt <= 0`).
    pub stall_ticks: u64,
    /// Sleep this long after each tick (real-time pacing).
    pub pace: Option<Duration>,
    /// Seconds between telemetry log lines.
    pub telemetry_interval: f32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_seconds: 120.0,
            max_ticks: None,
            stall_ticks: 600,
            pace: None,
            telemetry_interval: 1.0,
        }
    }
}

/// Study events seen during a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventCounts {
    /// `TargetCompleted`.
    pub targets_completed: u32,
    /// `SessionCompleted`.
    pub sessions_completed: u32,
    /// `ModeChanged`.
    pub mode_changes: u32,
    /// `TrainingIterationStarted`.
    pub training_bursts: u32,
    /// `TrainingFinished`.
    pub training_finished: u32,
    /// `VisualizationToggled`.
    pub visualization_toggles: u32,
}

impl EventCounts {
    fn record(&mut self, event: &StudyEvent) {
        match event {
            StudyEvent::TargetCompleted { .. } => self.targets_completed += 1,
            StudyEvent::SessionCompleted { .. } => self.sessions_completed += 1,
            StudyEvent::ModeChanged { .. } => self.mode_changes += 1,
            StudyEvent::TrainingIterationStarted { .. } => self.training_bursts += 1,
            StudyEvent::TrainingFinished { .. } => self.training_finished += 1,
            StudyEvent::VisualizationToggled { .. } => self.visualization_toggles += 1,
        }
    }
}

/// Outcome of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// Ticks executed.
    pub ticks: u64,
    /// Session time at the end (s).
    pub simulated_seconds: f64,
    /// Real time spent.
    pub wall_time: Duration,
    /// Status after the last tick.
    pub status: SessionStatus,
    /// Most particles alive at once.
    pub peak_particles: u32,
    /// Particles spawned over the run.
    pub particles_spawned: u64,
    /// Events seen.
    pub events: EventCounts,
    /// Session counters.
    pub session: SessionStats,
    /// Display values at the end.
    pub telemetry: TelemetrySnapshot,
}

impl RunSummary {
    /// Mean real time per tick in milliseconds.
    #[must_use]
    pub fn avg_tick_ms(&self) -> f64 {
        if self.ticks == 0 {
            return 0.0;
        }
        self.wall_time.as_secs_f64() * 1000.0 / self.ticks as f64
    }

    /// Prints the boxed end-of-run report.
    pub fn print_summary(&self) {
        let t = &self.telemetry;
        println!("╔══════════════════════════════════════════════════════════════════╗");
        println!("║                      DRILLSIM RUN SUMMARY                        ║");
        println!("╚══════════════════════════════════════════════════════════════════╝");
        println!();
        println!("┌─ SESSION ────────────────────────────────────────────────────────┐");
        println!("│ Status:             {:?}", self.status);
        println!("│ Mode:               {}", t.mode);
        println!("│ Simulated:          {:.2} s ({} ticks)", self.simulated_seconds, self.ticks);
        println!("│ Wall Time:          {:.1} ms ({:.4} ms/tick)", self.wall_time.as_secs_f64() * 1000.0, self.avg_tick_ms());
        println!("│ Targets:            {}/{}", t.completed_targets, t.total_targets);
        if let Some(at) = self.session.completed_at {
            println!("│ Completed At:       {at:.2} s");
        }
        println!("└──────────────────────────────────────────────────────────────────┘");
        println!();
        println!("┌─ EXPOSURE ───────────────────────────────────────────────────────┐");
        for line in t.lines() {
            println!("│ {line}");
        }
        println!("└──────────────────────────────────────────────────────────────────┘");
        println!();
        println!("┌─ PARTICLES ──────────────────────────────────────────────────────┐");
        println!("│ Spawned:            {}", self.particles_spawned);
        println!("│ Peak Alive:         {}", self.peak_particles);
        println!("└──────────────────────────────────────────────────────────────────┘");
        println!();
        println!("┌─ EVENTS ─────────────────────────────────────────────────────────┐");
        println!("│ Targets Completed:  {}", self.events.targets_completed);
        println!("│ Session Completed:  {}", self.events.sessions_completed);
        println!("│ Mode Changes:       {}", self.events.mode_changes);
        println!("│ Training Bursts:    {}", self.events.training_bursts);
        println!("│ Manual Records:     {}", self.session.manual_records);
        println!("│ Log Rows:           {} ({} failed)", self.session.events_logged, self.session.log_failures);
        println!("└──────────────────────────────────────────────────────────────────┘");
    }
}

/// Runs `session` until it finishes or one of the [`RunOptions`] limits is
/// hit.
pub fn run(
    session: &mut Session,
    driver: &mut dyn Driver,
    clock: &mut dyn TimeSource,
    options: RunOptions,
) -> RunSummary {
    let events = session.events();
    let mut counts = EventCounts::default();
    let mut telemetry = Cadence::new(options.telemetry_interval, options.telemetry_interval);
    let mut peak_particles = 0;
    let mut particles_spawned = 0_u64;
    let mut ticks = 0_u64;
    let mut stalled = 0_u64;
    let mut status = SessionStatus::Running;
    let started = Instant::now();

    tracing::info!("Run started: up to {:.1} s of session time", options.max_seconds);

    while session.elapsed() < options.max_seconds {
        if options.max_ticks.is_some_and(|max| ticks >= max) {
            tracing::warn!("Tick limit {ticks} reached at {:.2} s", session.elapsed());
            break;
        }

        let before = session.elapsed();
        let dt = clock.next_dt();
        driver.drive(session, dt);
        status = session.tick(dt);
        ticks += 1;

        let stats = session.transport().stats();
        peak_particles = peak_particles.max(stats.alive_count);
        particles_spawned += u64::from(stats.spawned_this_frame);

        for event in events.drain() {
            counts.record(&event);
        }
        if telemetry.advance(dt as f32) > 0 {
            tracing::debug!("{}", session.telemetry().lines().join(" | "));
        }

        if status == SessionStatus::Finished {
            tracing::info!("Session finished at {:.2} s", session.elapsed());
            break;
        }
        if session.elapsed() > before {
            stalled = 0;
        } else {
            stalled += 1;
            if stalled >= options.stall_ticks {
                tracing::warn!(
                    "Session time stuck at {:.2} s for {stalled} ticks; stopping",
                    session.elapsed()
                );
                break;
            }
        }
        if let Some(pace) = options.pace {
            std::thread::sleep(pace);
        }
    }

    RunSummary {
        ticks,
        simulated_seconds: session.elapsed(),
        wall_time: started.elapsed(),
        status,
        peak_particles,
        particles_spawned,
        events: counts,
        session: session.stats(),
        telemetry: session.telemetry(),
    }
}
