//! # Study Event Bus
//!
//! Session notifications for observers (UI, runner, analysis).
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │   Session   │─────>│   Event     │─────>│  Observer   │
//! │   (tick)    │      │   Channel   │      │ (UI/runner) │
//! └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! Bounded crossbeam channel; when observers fall behind, events are dropped
//! rather than stalling the tick.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::config::OperationMode;
use crate::target::TargetId;

/// Notifications published by the session.
#[derive(Clone, Debug, PartialEq)]
pub enum StudyEvent {
    /// A target reached its required hold time.
    TargetCompleted {
        /// Target handle.
        target: TargetId,
        /// Session time (s).
        elapsed: f64,
    },

    /// Every target is completed. Published once per session (until reset).
    SessionCompleted {
        /// Session time (s).
        elapsed: f64,
    },

    /// Operating mode changed.
    ModeChanged {
        /// New mode.
        mode: OperationMode,
    },

    /// A training burst started.
    TrainingIterationStarted {
        /// 1-based iteration.
        iteration: u32,
    },

    /// The training cycle ran all its iterations.
    TrainingFinished {
        /// Bursts run.
        iterations: u32,
    },

    /// Particle visualisation shown or hidden.
    VisualizationToggled {
        /// New visibility.
        visible: bool,
    },
}

/// Bounded event channel.
pub struct EventBus {
    sender: Sender<StudyEvent>,
    receiver: Receiver<StudyEvent>,
}

impl EventBus {
    /// Creates a bus holding at most `capacity` undelivered events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Creates a sender handle.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

/// Handle for publishing events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<StudyEvent>,
}

impl EventSender {
    /// Publishes without blocking. Returns `false` if the event was dropped.
    #[inline]
    pub fn send(&self, event: StudyEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::debug!("study event dropped, bus full: {event:?}");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for consuming events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<StudyEvent>,
}

impl EventReceiver {
    /// Takes every pending event.
    #[inline]
    pub fn drain(&self) -> Vec<StudyEvent> {
        self.receiver.try_iter().collect()
    }

    /// Takes one pending event.
    #[inline]
    pub fn try_recv(&self) -> Option<StudyEvent> {
        self.receiver.try_recv().ok()
    }

    /// Number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}
