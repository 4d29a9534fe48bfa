//! # Study Session
//!
//! Owns every piece of session state and advances it once per tick.
//!
//! ## Tick Order
//!
//! ```text
//! 1. Drain queued control actions (input level, toggles, contacts)
//! 2. Passive construction pulse (passive condition only)
//! 3. Mode logic:
//!    Study    → activation frame → emission → exposure → completion check
//!    Training → training cycle   → emission → exposure
//! 4. Transport step (emission, integration, density cadence)
//! 5. Environment drift cadence
//! ```
//!
//! Everything runs on the caller's thread. Other threads reach the session
//! through [`ControlHandle`] and observe it through [`EventReceiver`].

use pm25_shared::Cadence;
use pm25_transport::{ParticleInstance, SourceId, TransportSystem};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::activation::{ActivationMachine, ContactRelease};
use crate::config::{ConstructionType, OperationMode, StudyConfig};
use crate::control::{ControlAction, ControlHandle, ControlQueue};
use crate::environment::{Environment, EnvironmentReading};
use crate::error::StudyResult;
use crate::events::{EventBus, EventReceiver, EventSender, StudyEvent};
use crate::exposure::ExposureMeter;
use crate::record::{CsvEventLog, EventRecord, EventSink};
use crate::target::{Target, TargetId};
use crate::telemetry::TelemetrySnapshot;
use crate::training::TrainingCycle;

/// Whether the runner should keep ticking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// Keep going.
    Running,
    /// Every target completed and `exit_on_complete` is set.
    Finished,
}

/// Session counters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SessionStats {
    /// Ticks processed.
    pub ticks: u64,
    /// Manual records requested by the participant.
    pub manual_records: u32,
    /// Rows appended to the event log.
    pub events_logged: u64,
    /// Rows that failed to append.
    pub log_failures: u64,
    /// Session time at which every target was completed.
    pub completed_at: Option<f64>,
}

/// A participant session.
pub struct Session {
    config: StudyConfig,
    mode: OperationMode,
    activation: ActivationMachine,
    transport: TransportSystem,
    sources: Vec<SourceId>,
    training: TrainingCycle,
    exposure: ExposureMeter,
    environment: Environment,
    passive_cadence: Cadence,
    passive_rng: ChaCha8Rng,
    controls: ControlQueue,
    events: EventBus,
    publisher: EventSender,
    sink: Option<Box<dyn EventSink>>,
    contact_started: Vec<Option<f64>>,
    input_held: bool,
    visualization: bool,
    completion_reported: bool,
    finished: bool,
    enabled: bool,
    elapsed: f64,
    stats: SessionStats,
}

impl Session {
    /// Creates a session without an event log. Invalid configuration is
    /// clamped.
    #[must_use]
    pub fn new(config: StudyConfig) -> Self {
        let config = config.sanitize();

        let mut transport = TransportSystem::new(config.transport.clone(), config.density.clone(), config.seed);
        let mut targets = Vec::with_capacity(config.targets.len());
        let mut sources = Vec::with_capacity(config.targets.len());
        for (index, target) in config.targets.iter().enumerate() {
            targets.push(Target::new(TargetId(index), target.name.clone(), target.position));
            sources.push(transport.add_source(target.position, config.emission.clone()));
        }

        let events = EventBus::new(config.channel_capacity);
        let mut session = Self {
            mode: config.mode,
            activation: ActivationMachine::new(targets, config.required_hold_time),
            transport,
            contact_started: vec![None; sources.len()],
            sources,
            training: TrainingCycle::new(config.training.clone()),
            exposure: ExposureMeter::new(config.exposure.clone()),
            environment: Environment::new(config.environment.clone(), config.seed.wrapping_add(1)),
            passive_cadence: Cadence::new(
                config.exposure.passive_interval as f32,
                config.exposure.passive_interval as f32,
            ),
            passive_rng: ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(2)),
            controls: ControlQueue::new(config.channel_capacity),
            publisher: events.sender(),
            events,
            sink: None,
            input_held: false,
            visualization: config.show_visualization,
            completion_reported: false,
            finished: false,
            enabled: true,
            elapsed: 0.0,
            stats: SessionStats::default(),
            config,
        };

        tracing::info!(
            "Session PID{} ({}) with {} targets, starting in {} mode",
            session.config.participant_id,
            session.config.construction,
            session.sources.len(),
            session.mode
        );
        session.setup_mode(session.mode);
        session
    }

    /// Attaches an event log.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Creates a session writing the CSV log named by its configuration
    /// (or no log when logging is disabled).
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be created.
    pub fn with_csv_log(config: StudyConfig) -> StudyResult<Self> {
        if !config.log.enabled {
            return Ok(Self::new(config));
        }
        let log = CsvEventLog::for_participant(
            &config.log.directory,
            config.participant_id,
            &config.construction.to_string(),
        )?;
        Ok(Self::new(config).with_sink(Box::new(log)))
    }

    // =========================================================================
    // TICK
    // =========================================================================

    /// Advances the session by `dt` seconds.
    ///
    /// Non-positive or non-finite `dt` only drains the control queue.
    pub fn tick(&mut self, dt: f64) -> SessionStatus {
        for action in self.controls.drain() {
            self.apply(action);
        }
        if !self.enabled || !dt.is_finite() || dt <= 0.0 {
            return self.status();
        }

        self.elapsed += dt;
        self.stats.ticks += 1;

        if self.config.construction == ConstructionType::PassiveMoving {
            self.passive_tick(dt);
        }

        if !self.finished {
            match self.mode {
                OperationMode::Study => self.study_tick(dt),
                OperationMode::Training => self.training_tick(dt),
            }
        }

        self.environment.tick(dt as f32);
        self.status()
    }

    fn study_tick(&mut self, dt: f64) {
        self.transport.stop_all();

        let input = self.input_held && self.accepts_contacts();
        let frame = self.activation.update(input, dt);
        if let Some(id) = frame.emit.filter(|&id| !self.is_target_completed(id)) {
            self.start_source(id);
        }
        if let Some(id) = frame.completed {
            self.on_target_completed(id);
        }

        if self.transport.any_emitting() {
            self.exposure.accumulate_study(dt);
        } else {
            self.exposure.idle();
        }

        self.check_completion();
        self.transport.step(dt as f32);
    }

    fn training_tick(&mut self, dt: f64) {
        let tick = self.training.tick(dt);
        let target = TargetId(self.config.training.target_index);

        if let Some(iteration) = tick.started {
            self.start_source(target);
            self.publisher.send(StudyEvent::TrainingIterationStarted { iteration });
        }
        if tick.bursting {
            self.exposure.accumulate_training(dt);
        }

        self.transport.step(dt as f32);

        if tick.burst_ended {
            self.stop_source(target);
        }
        if tick.finished {
            self.publisher.send(StudyEvent::TrainingFinished {
                iterations: self.training.iteration(),
            });
        }
    }

    fn passive_tick(&mut self, dt: f64) {
        if self.passive_cadence.advance(dt as f32) == 0 {
            return;
        }
        let exposure = self.exposure.config();
        let (low, high) = (exposure.passive_min, exposure.passive_max);
        let sample = if high > low {
            self.passive_rng.gen_range(low..high)
        } else {
            low
        };
        self.exposure.passive_pulse(sample, dt);
        self.environment.drift();
    }

    fn start_source(&mut self, id: TargetId) {
        if let Some(&source) = self.sources.get(id.0) {
            if let Err(err) = self.transport.start_emission(source) {
                tracing::warn!("Cannot start emission for {id}: {err}");
            }
        }
    }

    fn stop_source(&mut self, id: TargetId) {
        if let Some(&source) = self.sources.get(id.0) {
            if let Err(err) = self.transport.stop_emission(source) {
                tracing::warn!("Cannot stop emission for {id}: {err}");
            }
        }
    }

    fn is_target_completed(&self, id: TargetId) -> bool {
        self.activation.target(id).is_some_and(Target::is_completed)
    }

    /// A completed target's source goes quiet and its plume is destroyed
    /// until the next reset.
    fn on_target_completed(&mut self, id: TargetId) {
        self.stop_source(id);
        if let Some(&source) = self.sources.get(id.0) {
            match self.transport.clear_source(source) {
                Ok(cleared) => tracing::debug!("Cleared {cleared} particles of {id}"),
                Err(err) => tracing::warn!("Cannot clear particles of {id}: {err}"),
            }
        }

        let name = self.target_name(id);
        self.record(format!("TARGET_COMPLETED_{name}"));
        self.publisher.send(StudyEvent::TargetCompleted {
            target: id,
            elapsed: self.elapsed,
        });
    }

    /// Fires the terminal action the first time every target is completed.
    fn check_completion(&mut self) {
        if self.completion_reported || !self.activation.all_completed() {
            return;
        }
        self.completion_reported = true;
        self.stats.completed_at = Some(self.elapsed);
        tracing::info!("All targets completed after {:.2}s", self.elapsed);

        self.record("SESSION_COMPLETED".to_string());
        self.publisher.send(StudyEvent::SessionCompleted { elapsed: self.elapsed });
        if self.config.exit_on_complete {
            self.finished = true;
            self.transport.stop_all();
        }
    }

    // =========================================================================
    // CONTROL
    // =========================================================================

    /// Producer handle for input threads.
    #[must_use]
    pub fn control_handle(&self) -> ControlHandle {
        self.controls.handle()
    }

    /// Applies one action immediately.
    pub fn apply(&mut self, action: ControlAction) {
        match action {
            ControlAction::PrimaryActivation(held) => self.input_held = held,
            ControlAction::ToggleVisualization => self.set_visualization(!self.visualization),
            ControlAction::ToggleMode => self.switch_mode(self.mode.toggled()),
            ControlAction::RestartTraining => self.restart_training(),
            ControlAction::RecordManualEvent => self.record_manual_event(),
            ControlAction::ResetSession => self.reset(),
            ControlAction::ContactEnter(id) => self.contact_enter(id),
            ControlAction::ContactExit(id) => self.contact_exit(id),
        }
    }

    fn contact_enter(&mut self, id: TargetId) {
        if !self.accepts_contacts() {
            tracing::debug!("Contact with {id} ignored ({}, {})", self.mode, self.config.construction);
            return;
        }
        match self.activation.contact_enter(id) {
            None => tracing::warn!("Contact enter for unknown {id} ignored"),
            Some(false) => {}
            Some(true) => {
                self.contact_started[id.0] = Some(self.elapsed);
                let name = self.target_name(id);
                self.record(format!("CONTACT_START_{name}"));
            }
        }
    }

    fn contact_exit(&mut self, id: TargetId) {
        if !self.accepts_contacts() {
            tracing::debug!("Contact with {id} ignored ({}, {})", self.mode, self.config.construction);
            return;
        }
        let Some(release) = self.activation.contact_exit(id) else {
            tracing::warn!("Contact exit for unknown {id} ignored");
            return;
        };
        if release == ContactRelease::StillTouching {
            return;
        }
        if release == ContactRelease::Interrupted {
            self.stop_source(id);
            tracing::info!("Hold on {} interrupted", self.target_name(id));
        }

        let duration = self.contact_started[id.0]
            .take()
            .map_or(0.0, |start| self.elapsed - start);
        let name = self.target_name(id);
        self.record(format!("CONTACT_END_{name}_Duration:{duration:.2}s"));
    }

    /// Contacts drive activation only in Study mode with an active driller.
    fn accepts_contacts(&self) -> bool {
        self.mode == OperationMode::Study
            && self.config.construction == ConstructionType::ActiveDrilling
    }

    fn target_name(&self, id: TargetId) -> String {
        self.activation
            .target(id)
            .map(|t| t.name().to_string())
            .unwrap_or_default()
    }

    /// Shows or hides the particle visualisation.
    pub fn set_visualization(&mut self, visible: bool) {
        self.visualization = visible;
        tracing::info!("PM2.5 visualization is now {}", if visible { "ON" } else { "OFF" });
        self.publisher.send(StudyEvent::VisualizationToggled { visible });
    }

    /// Switches mode, resetting emission, hold timers, the active target and
    /// the training cycle.
    pub fn switch_mode(&mut self, mode: OperationMode) {
        self.mode = mode;
        self.setup_mode(mode);
        tracing::info!("Switched to {mode} mode");
        self.record(format!("MODE_{mode}"));
        self.publisher.send(StudyEvent::ModeChanged { mode });
    }

    fn setup_mode(&mut self, mode: OperationMode) {
        self.training.cancel();
        self.transport.stop_all();
        self.activation.reset_progress();
        self.exposure.idle();

        match mode {
            OperationMode::Training => {
                if self.sources.is_empty() {
                    tracing::error!("No targets available for training mode");
                    return;
                }
                self.set_visualization(true);
                self.training.start();
            }
            OperationMode::Study => self.set_visualization(false),
        }
    }

    /// Restarts the training cycle from iteration zero (Training mode only).
    pub fn restart_training(&mut self) {
        if self.mode != OperationMode::Training || self.sources.is_empty() {
            tracing::debug!("Restart training ignored in {} mode", self.mode);
            return;
        }
        self.training.cancel();
        self.transport.stop_all();
        self.training.start();
        tracing::info!("Training restarted");
    }

    /// Participant-marked moment in the log.
    pub fn record_manual_event(&mut self) {
        self.stats.manual_records += 1;
        tracing::info!(
            "Recording time: {:.2}; pressed times: {}",
            self.elapsed,
            self.stats.manual_records
        );
        self.record("MANUAL_RECORD".to_string());
    }

    /// Returns every target to idle, clears the active target, destroys
    /// every particle and restores the initial exposure and environment
    /// readings. Safe to call repeatedly.
    pub fn reset(&mut self) {
        self.activation.reset();
        self.transport.clear();
        self.exposure.reset();
        self.environment.reset();
        self.contact_started.iter_mut().for_each(|c| *c = None);
        self.completion_reported = false;
        self.finished = false;
        self.stats.completed_at = None;
        tracing::info!("All targets have been reset");
    }

    /// Cancels the training cycle and stops emission; later ticks only drain
    /// the control queue until [`Self::enable`].
    pub fn disable(&mut self) {
        self.training.cancel();
        self.transport.stop_all();
        self.enabled = false;
    }

    /// Resumes ticking after [`Self::disable`]. The training cycle stays
    /// cancelled.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    fn record(&mut self, label: String) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let record = EventRecord::now(
            self.elapsed,
            self.stats.manual_records,
            self.exposure.value(),
            label,
        );
        match sink.append(&record) {
            Ok(()) => self.stats.events_logged += 1,
            Err(err) => {
                self.stats.log_failures += 1;
                tracing::error!("Error saving event log row: {err}");
            }
        }
    }

    // =========================================================================
    // OBSERVATION
    // =========================================================================

    fn status(&self) -> SessionStatus {
        if self.finished {
            SessionStatus::Finished
        } else {
            SessionStatus::Running
        }
    }

    /// Receiver for study events.
    #[must_use]
    pub fn events(&self) -> EventReceiver {
        self.events.receiver()
    }

    /// Display values.
    #[must_use]
    pub fn telemetry(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            exposure: self.exposure.value(),
            environment: self.environment.reading(),
            touch_required: true,
            visualization: self.visualization,
            mode: self.mode,
            training_iteration: self.training.iteration(),
            training_iterations: self.config.training.iterations,
            training_continuous: self.config.training.loop_forever,
            completed_targets: self.activation.completed_count(),
            total_targets: self.activation.targets().len(),
        }
    }

    /// Particle instances to draw; empty while the visualisation is hidden.
    pub fn render_instances(&mut self) -> &[ParticleInstance] {
        if self.visualization {
            self.transport.refresh_instances()
        } else {
            &[]
        }
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> OperationMode {
        self.mode
    }

    /// Activation state (targets, active target).
    #[must_use]
    pub fn activation(&self) -> &ActivationMachine {
        &self.activation
    }

    /// A target by handle.
    #[must_use]
    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.activation.target(id)
    }

    /// Emission source of a target.
    #[must_use]
    pub fn source_for(&self, id: TargetId) -> Option<SourceId> {
        self.sources.get(id.0).copied()
    }

    /// Particle transport.
    #[must_use]
    pub fn transport(&self) -> &TransportSystem {
        &self.transport
    }

    /// Training cycle.
    #[must_use]
    pub fn training(&self) -> &TrainingCycle {
        &self.training
    }

    /// Exposure reading.
    #[must_use]
    pub fn exposure(&self) -> f64 {
        self.exposure.value()
    }

    /// Environment values.
    #[must_use]
    pub fn environment(&self) -> EnvironmentReading {
        self.environment.reading()
    }

    /// Session time (s).
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Visualisation visible.
    #[must_use]
    pub fn visualization_visible(&self) -> bool {
        self.visualization
    }

    /// Every target completed (terminal action fired).
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completion_reported
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Configuration in use (after clamping).
    #[must_use]
    pub fn config(&self) -> &StudyConfig {
        &self.config
    }
}
