//! Participant and operator inputs.
//!
//! Input devices and the contact detector may live on other threads; they
//! push [`ControlAction`]s into a [`ControlQueue`], and the session drains it
//! at the start of every tick.

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::target::TargetId;

/// Discrete inputs mapped onto session transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlAction {
    /// Level of the primary activation input (held button / trigger).
    PrimaryActivation(bool),
    /// Show or hide the particle visualisation.
    ToggleVisualization,
    /// Switch between Training and Study.
    ToggleMode,
    /// Restart the training cycle (Training mode only).
    RestartTraining,
    /// Participant marks a moment in the log.
    RecordManualEvent,
    /// Return every target and the exposure reading to their initial state.
    ResetSession,
    /// The driller touched a target.
    ContactEnter(TargetId),
    /// The driller left a target.
    ContactExit(TargetId),
}

/// Bounded multi-producer queue of control actions.
pub struct ControlQueue {
    sender: Sender<ControlAction>,
    receiver: Receiver<ControlAction>,
}

impl ControlQueue {
    /// Creates a queue holding at most `capacity` pending actions.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Producer handle for another thread.
    #[must_use]
    pub fn handle(&self) -> ControlHandle {
        ControlHandle {
            sender: self.sender.clone(),
        }
    }

    /// Takes every pending action in arrival order.
    pub fn drain(&self) -> Vec<ControlAction> {
        self.receiver.try_iter().collect()
    }
}

/// Cloneable producer side of a [`ControlQueue`].
#[derive(Clone, Debug)]
pub struct ControlHandle {
    sender: Sender<ControlAction>,
}

impl ControlHandle {
    /// Queues an action without blocking. Returns `false` if the queue is
    /// full or the session is gone.
    pub fn send(&self, action: ControlAction) -> bool {
        let sent = self.sender.try_send(action).is_ok();
        if !sent {
            tracing::warn!("control action dropped: {action:?}");
        }
        sent
    }
}
