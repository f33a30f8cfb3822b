//! Display blanking sequence.
//!
//! Some panels show artifacts when they switch power mode. Before revealing the new
//! state the controller then covers everything with an opaque black front scrim and
//! waits in two steps:
//!
//! 1. **AwaitingFrame**: a fixed delay until the blank frame has reached the display.
//!    The transition callback is then told the display is blanked so the power mode can
//!    change.
//! 2. **AwaitingReveal**: a second delay that gives the power mode change time to take
//!    effect. It is short when the screen is already on and long otherwise. The screen
//!    turning on during this wait ends it early.
//!
//! While either phase is pending no layer update or animation completion is processed.

use std::time::Duration;

use crate::backend::{ScrimTask, Scheduler};
use crate::common::constants::{
    BLANKING_FRAME_DELAY, BLANKING_REVEAL_DELAY_SCREEN_OFF, BLANKING_REVEAL_DELAY_SCREEN_ON,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlankingPhase {
    #[default]
    Idle,
    AwaitingFrame,
    AwaitingReveal,
}

/// Tracks the single blanking sequence that can be pending at a time.
#[derive(Debug, Default)]
pub struct BlankingCoordinator {
    phase: BlankingPhase,
}

impl BlankingCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> BlankingPhase {
        self.phase
    }

    /// Returns true while a blank frame is being held on screen.
    pub fn is_pending(&self) -> bool {
        self.phase != BlankingPhase::Idle
    }

    /// Start waiting for the blank frame. The caller has already drawn it.
    pub fn begin(&mut self, scheduler: &mut dyn Scheduler) {
        self.phase = BlankingPhase::AwaitingFrame;
        scheduler.post_delayed(ScrimTask::PendingFrame, BLANKING_FRAME_DELAY);
    }

    /// The blank frame is on the display; schedule the reveal.
    ///
    /// Returns the reveal delay, or `None` if no frame was awaited.
    pub fn frame_committed(
        &mut self,
        scheduler: &mut dyn Scheduler,
        screen_on: bool,
    ) -> Option<Duration> {
        if self.phase != BlankingPhase::AwaitingFrame {
            return None;
        }
        let delay = if screen_on {
            BLANKING_REVEAL_DELAY_SCREEN_ON
        } else {
            BLANKING_REVEAL_DELAY_SCREEN_OFF
        };
        self.phase = BlankingPhase::AwaitingReveal;
        scheduler.post_delayed(ScrimTask::BlankingTransition, delay);
        Some(delay)
    }

    /// Finish the sequence. Returns whether a reveal was awaited.
    pub fn reveal(&mut self) -> bool {
        if self.phase != BlankingPhase::AwaitingReveal {
            return false;
        }
        self.phase = BlankingPhase::Idle;
        true
    }

    /// Pull a pending reveal forward. Returns whether the caller should reveal now.
    pub fn expedite_reveal(&mut self, scheduler: &mut dyn Scheduler) -> bool {
        if self.phase != BlankingPhase::AwaitingReveal
            || !scheduler.has_pending(ScrimTask::BlankingTransition)
        {
            return false;
        }
        scheduler.cancel(ScrimTask::BlankingTransition);
        true
    }

    /// Abandon any pending sequence.
    pub fn cancel(&mut self, scheduler: &mut dyn Scheduler) {
        scheduler.cancel(ScrimTask::PendingFrame);
        scheduler.cancel(ScrimTask::BlankingTransition);
        self.phase = BlankingPhase::Idle;
    }
}
