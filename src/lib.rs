//! # scrimctl
//!
//! Scrim controller for a phone system UI: the translucent overlay layers drawn above
//! and below the notification shade, the lock screen and the always-on display.
//!
//! The library exists to enable testing of the controller internals and to keep the
//! CLI dispatch in `main.rs` separate from the state machine.
//!
//! ## Architecture
//!
//! - **Controller**: `controller` owns the state machine, reacts to host events and
//!   pushes opacity and tint to the layers
//! - **States**: `state` names the scrim states, `state::catalog` resolves their targets
//! - **Animation**: `animation` interpolates layers toward targets, `expansion` maps
//!   panel and quick settings expansion onto layer opacity, `blanking` sequences the
//!   black frame needed for display power changes
//! - **Collaborators**: `backend` defines the surface, scheduler, alarm, wake lock and
//!   color seams, with virtual-clock implementations in `backend::simulated`
//! - **Simulation**: `simulate` drives the controller against the simulated backend,
//!   including scripted scenarios
//! - **Infrastructure**: configuration, CLI parsing, commands and logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod animation;
pub mod args;
pub mod backend;
pub mod blanking;
pub mod commands;
pub mod common;
pub mod config;
pub mod controller;
pub mod error;
pub mod expansion;
pub mod layer;
pub mod simulate;
pub mod state;
pub mod wakelock;

pub use controller::{ControllerSettings, ScrimController};
pub use error::{ScrimError, ScrimResult};
pub use state::ScrimState;
