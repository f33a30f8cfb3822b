//! Per-layer opacity animations.
//!
//! The driver owns at most one [`AnimationRecord`] per layer. A record stores everything
//! needed to sample it: start and end values, timing, and the callback registered when
//! it started. Sampling is pure; the controller pushes the sampled values to the
//! surfaces and reacts to completions.
//!
//! Two operations change an in-flight record:
//!
//! - **cancel** drops the record. The layer keeps whatever value it last rendered and
//!   no completion is reported.
//! - **retarget** moves the end value while keeping progress. The start value is shifted
//!   by the same amount as the end value so the remaining motion keeps its shape.

use std::time::Duration;

use crate::common::color::Color;
use crate::common::utils::{constrain, decelerate, lerp};
use crate::controller::callback::CallbackHandle;
use crate::layer::{PerLayer, ScrimLayer};

/// An in-flight opacity and tint animation for one layer.
#[derive(Debug, Clone)]
pub struct AnimationRecord {
    pub start_alpha: f32,
    pub end_alpha: f32,
    pub start_tint: Color,
    pub end_tint: Color,
    /// Clock value when the animation was started.
    pub start_time: Duration,
    pub delay: Duration,
    pub duration: Duration,
    callback: Option<CallbackHandle>,
}

impl AnimationRecord {
    pub fn new(
        from: (f32, Color),
        to: (f32, Color),
        start_time: Duration,
        delay: Duration,
        duration: Duration,
        callback: Option<CallbackHandle>,
    ) -> Self {
        Self {
            start_alpha: from.0,
            end_alpha: to.0,
            start_tint: from.1,
            end_tint: to.1,
            start_time,
            delay,
            duration,
            callback,
        }
    }

    /// The callback that was active when the animation started.
    pub fn callback(&self) -> Option<&CallbackHandle> {
        self.callback.as_ref()
    }

    /// Returns true once the start delay has elapsed at `now`.
    pub fn has_started(&self, now: Duration) -> bool {
        now >= self.start_time + self.delay
    }

    /// Linear progress in `[0, 1]` at `now`.
    pub fn progress(&self, now: Duration) -> f32 {
        let elapsed = now.saturating_sub(self.start_time + self.delay);
        if self.duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0) as f32
    }

    /// Alpha and tint for a linear progress value.
    pub fn sample(&self, progress: f32) -> (f32, Color) {
        let amount = decelerate(progress);
        let alpha = constrain(lerp(self.start_alpha, self.end_alpha, amount), 0.0, 1.0);
        let tint = self.start_tint.blend(self.end_tint, amount);
        (alpha, tint)
    }
}

/// Values to push to a layer after advancing an animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    pub layer: ScrimLayer,
    pub alpha: f32,
    pub tint: Color,
}

/// An animation that ran to its end.
#[derive(Debug, Clone)]
pub struct AnimationCompletion {
    pub layer: ScrimLayer,
    pub callback: Option<CallbackHandle>,
}

/// Result of advancing every record to the current time.
#[derive(Debug, Default)]
pub struct AnimationStep {
    pub frames: Vec<AnimationFrame>,
    pub completions: Vec<AnimationCompletion>,
}

/// Owner of the per-layer animation records.
#[derive(Debug, Default)]
pub struct AnimationDriver {
    records: PerLayer<Option<AnimationRecord>>,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `record` on `layer`, dropping any record already there.
    pub fn start(&mut self, layer: ScrimLayer, record: AnimationRecord) {
        self.records.set(layer, Some(record));
    }

    /// Cancel the animation on `layer`. Returns whether one was running.
    pub fn cancel(&mut self, layer: ScrimLayer) -> bool {
        self.records.get_mut(layer).take().is_some()
    }

    pub fn is_animating(&self, layer: ScrimLayer) -> bool {
        self.records.get(layer).is_some()
    }

    pub fn any_animating(&self) -> bool {
        self.records.iter().any(|(_, record)| record.is_some())
    }

    pub fn record(&self, layer: ScrimLayer) -> Option<&AnimationRecord> {
        self.records.get(layer).as_ref()
    }

    /// Move the end of the animation on `layer` to a new target, keeping its progress.
    ///
    /// # Arguments
    /// * `layer` - Layer whose animation is adapted
    /// * `end_alpha` - New target opacity
    /// * `end_tint` - New target tint
    /// * `now` - Current clock value, used to resample the animation
    ///
    /// # Returns
    /// The resampled frame, or `None` if the layer was not animating.
    pub fn retarget(
        &mut self,
        layer: ScrimLayer,
        end_alpha: f32,
        end_tint: Color,
        now: Duration,
    ) -> Option<AnimationFrame> {
        let record = self.records.get_mut(layer).as_mut()?;
        let relative_diff = end_alpha - record.end_alpha;
        record.start_alpha += relative_diff;
        record.end_alpha = end_alpha;
        record.end_tint = end_tint;

        let (alpha, tint) = record.sample(record.progress(now));
        Some(AnimationFrame { layer, alpha, tint })
    }

    /// Advance every started record to `now`.
    ///
    /// Records still waiting for their start delay produce no frame. Finished records
    /// produce a final frame at their end value and are removed.
    pub fn step(&mut self, now: Duration) -> AnimationStep {
        let mut step = AnimationStep::default();

        for layer in ScrimLayer::ALL {
            let slot = self.records.get_mut(layer);
            let Some(record) = slot.as_ref() else {
                continue;
            };
            if !record.has_started(now) {
                continue;
            }

            let progress = record.progress(now);
            let (alpha, tint) = record.sample(progress);
            step.frames.push(AnimationFrame { layer, alpha, tint });

            if progress >= 1.0
                && let Some(finished) = slot.take()
            {
                step.completions.push(AnimationCompletion {
                    layer,
                    callback: finished.callback,
                });
            }
        }

        step
    }
}
