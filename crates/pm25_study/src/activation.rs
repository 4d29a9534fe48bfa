//! # Touch-and-Hold Activation
//!
//! Decides once per frame which target (if any) emits, and advances hold time
//! toward completion.
//!
//! ## Frame Order
//!
//! 1. Every source is stopped (done by the caller before applying the result)
//! 2. Input released: incomplete targets lose their hold time, no active target
//! 3. Input held: an active target that stopped touching is dropped; with no
//!    active target the first touching one in declaration order is adopted
//! 4. Active and touching: emit; if incomplete add `dt`, completing at the
//!    required hold time
//!
//! Emission is re-derived from input every frame and never sticks.

use crate::target::{Target, TargetId};

/// What the caller must do after [`ActivationMachine::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActivationFrame {
    /// Target whose source emits this frame.
    pub emit: Option<TargetId>,
    /// Target adopted as active this frame.
    pub selected: Option<TargetId>,
    /// Target that completed this frame.
    pub completed: Option<TargetId>,
}

/// Effect of a contact ending.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactRelease {
    /// Other contacts remain open.
    StillTouching,
    /// Target stopped touching; nothing was in progress on it.
    Released,
    /// The active, incomplete target stopped touching: its hold time was
    /// reset and its emission must stop now.
    Interrupted,
}

/// Per-frame activation state machine over a fixed set of targets.
#[derive(Clone, Debug)]
pub struct ActivationMachine {
    targets: Vec<Target>,
    active: Option<TargetId>,
    required_hold_time: f64,
}

impl ActivationMachine {
    /// Creates a machine over `targets` in priority order.
    #[must_use]
    pub fn new(targets: Vec<Target>, required_hold_time: f64) -> Self {
        Self {
            targets,
            active: None,
            required_hold_time,
        }
    }

    /// All targets in declaration order.
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// A target by handle.
    #[must_use]
    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(id.0)
    }

    /// Currently active target.
    #[must_use]
    pub fn active(&self) -> Option<TargetId> {
        self.active
    }

    /// Hold time needed to complete a target.
    #[must_use]
    pub fn required_hold_time(&self) -> f64 {
        self.required_hold_time
    }

    /// Every target completed. A machine without targets is never complete.
    #[must_use]
    pub fn all_completed(&self) -> bool {
        !self.targets.is_empty() && self.targets.iter().all(Target::is_completed)
    }

    /// Number of completed targets.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.targets.iter().filter(|t| t.is_completed()).count()
    }

    /// Runs one frame. `input` is the level of the primary activation input.
    pub fn update(&mut self, input: bool, dt: f64) -> ActivationFrame {
        let mut frame = ActivationFrame::default();

        if !input {
            for target in &mut self.targets {
                target.reset_hold();
            }
            self.active = None;
            return frame;
        }

        if let Some(id) = self.active {
            if !self.targets[id.0].is_touching() {
                self.active = None;
            }
        }

        if self.active.is_none() {
            if let Some(target) = self.targets.iter().find(|t| t.is_touching()) {
                tracing::info!(
                    "Selected active target: {} (completed: {})",
                    target.name(),
                    target.is_completed()
                );
                self.active = Some(target.id());
                frame.selected = Some(target.id());
            }
        }

        let Some(id) = self.active else {
            return frame;
        };
        let target = &mut self.targets[id.0];
        if !target.is_touching() {
            return frame;
        }

        frame.emit = Some(id);
        if target.accumulate(dt, self.required_hold_time) {
            tracing::info!("Target completed: {} after {:.2}s", target.name(), target.hold_time());
            frame.completed = Some(id);
        }
        frame
    }

    /// Registers a contact. `None` for an unknown target.
    pub fn contact_enter(&mut self, id: TargetId) -> Option<bool> {
        let target = self.targets.get_mut(id.0)?;
        let started = target.contact_enter();
        tracing::debug!("Contact enter {}: count {}", target.name(), target.contact_count());
        Some(started)
    }

    /// Releases a contact. `None` for an unknown target.
    pub fn contact_exit(&mut self, id: TargetId) -> Option<ContactRelease> {
        let target = self.targets.get_mut(id.0)?;
        if !target.contact_exit() {
            return Some(ContactRelease::StillTouching);
        }
        tracing::debug!("Contact exit {}: count {}", target.name(), target.contact_count());

        if self.active != Some(id) {
            return Some(ContactRelease::Released);
        }
        self.active = None;
        if target.is_completed() {
            Some(ContactRelease::Released)
        } else {
            target.reset_hold();
            Some(ContactRelease::Interrupted)
        }
    }

    /// Clears the active target and the hold time of incomplete targets.
    /// Completion and contacts are kept.
    pub fn reset_progress(&mut self) {
        self.active = None;
        for target in &mut self.targets {
            target.reset_hold();
        }
    }

    /// Returns every target to idle and clears the active target.
    pub fn reset(&mut self) {
        self.active = None;
        for target in &mut self.targets {
            target.reset();
        }
    }
}
