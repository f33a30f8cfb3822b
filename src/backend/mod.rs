//! Collaborator seams for the scrim controller.
//!
//! The controller never renders, sleeps, or talks to the power subsystem itself. It
//! drives a handful of external services through the traits in this module:
//!
//! - **ScrimSurface**: one per layer, a dumb sink for opacity, tint and palette, plus
//!   the frame-ready (pre-draw) registration used to coalesce updates
//! - **Scheduler**: the event loop clock, delayed tasks, and animation frame requests
//! - **AlarmTimer**: the one-shot timer that fades an ambient wallpaper away in AOD
//! - **WakeLock**: keeps the device awake while low-power animations play
//! - **ColorProvider**: theme palette lookup
//!
//! ## Re-entry
//!
//! All of these are called synchronously from controller methods. The host delivers
//! events back into the controller through its public entry points: `on_pre_draw` when
//! a frame-ready listener is registered, `on_animation_frame` after a frame request,
//! `run_task` when a posted [`ScrimTask`] comes due, and `on_hide_wallpaper_timeout`
//! when the alarm fires.
//!
//! The `simulated` submodule implements every trait over a virtual clock.

use std::time::Duration;

use crate::common::color::{Color, GradientColors};

pub mod simulated;

/// Deferred work the controller hands to its [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrimTask {
    /// The blank frame has reached the display.
    PendingFrame,
    /// The display had time to change power mode; reveal the real targets.
    BlankingTransition,
    /// Arm the wallpaper fade timer once the current traversal completed.
    ScheduleWallpaperTimeout,
    /// Disarm the wallpaper fade timer once the current traversal completed.
    CancelWallpaperTimeout,
}

impl ScrimTask {
    pub fn name(self) -> &'static str {
        match self {
            ScrimTask::PendingFrame => "pending_frame",
            ScrimTask::BlankingTransition => "blanking_transition",
            ScrimTask::ScheduleWallpaperTimeout => "schedule_wallpaper_timeout",
            ScrimTask::CancelWallpaperTimeout => "cancel_wallpaper_timeout",
        }
    }
}

/// How [`AlarmTimer::schedule`] treats an alarm that is already pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    /// Replace any pending alarm.
    Normal,
    /// Leave a pending alarm untouched.
    IgnoreIfScheduled,
}

/// A rendered overlay layer.
pub trait ScrimSurface {
    fn set_tint(&mut self, tint: Color);

    fn tint(&self) -> Color;

    /// Set the opacity the layer is drawn with.
    fn set_view_alpha(&mut self, alpha: f32);

    fn view_alpha(&self) -> f32;

    /// Apply a theme palette, optionally cross-fading to it.
    fn set_colors(&mut self, colors: GradientColors, animate: bool);

    fn colors(&self) -> GradientColors;

    /// Ask for `on_pre_draw` to be delivered before the next frame is drawn.
    fn add_pre_draw_listener(&mut self);

    fn remove_pre_draw_listener(&mut self);
}

/// Clock and delayed task queue of the event loop.
pub trait Scheduler {
    /// Monotonic time since an arbitrary origin.
    fn now(&self) -> Duration;

    /// Run `task` on the next loop iteration.
    fn post(&mut self, task: ScrimTask);

    /// Run `task` after `delay`.
    fn post_delayed(&mut self, task: ScrimTask, delay: Duration);

    /// Remove every pending instance of `task`.
    fn cancel(&mut self, task: ScrimTask);

    fn has_pending(&self, task: ScrimTask) -> bool;

    /// Ask for `on_animation_frame` to be delivered on the next frame.
    fn request_animation_frame(&mut self);
}

/// One-shot system alarm.
pub trait AlarmTimer {
    /// Arm the alarm. Returns whether it was (re)armed.
    fn schedule(&mut self, duration: Duration, mode: ScheduleMode) -> bool;

    fn cancel(&mut self);

    fn is_scheduled(&self) -> bool;
}

/// A wake lock held while low-power animations play.
#[cfg_attr(test, mockall::automock)]
pub trait WakeLock {
    fn acquire(&mut self, tag: &str);

    fn release(&mut self, tag: &str);
}

/// Source of the theme palette.
#[cfg_attr(test, mockall::automock)]
pub trait ColorProvider {
    fn theme_colors(&self) -> GradientColors;
}
