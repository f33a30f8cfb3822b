//! In-memory collaborators driven by a virtual clock.
//!
//! Every type here is a cheap handle around shared state: the controller owns one clone
//! and the host (a test or the `simulate` command) keeps another to inspect what was
//! rendered and to deliver due events.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;

use super::{AlarmTimer, ColorProvider, ScheduleMode, Scheduler, ScrimSurface, ScrimTask, WakeLock};
use crate::common::color::{Color, GradientColors};

#[derive(Debug, Default)]
struct SurfaceState {
    alpha: f32,
    tint: Color,
    colors: GradientColors,
    colors_animated: bool,
    pre_draw_listener: bool,
    alpha_history: Vec<f32>,
}

/// A layer that records what it was asked to draw.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSurface {
    inner: Rc<RefCell<SurfaceState>>,
}

impl SimulatedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alpha(&self) -> f32 {
        self.inner.borrow().alpha
    }

    pub fn current_tint(&self) -> Color {
        self.inner.borrow().tint
    }

    pub fn current_colors(&self) -> GradientColors {
        self.inner.borrow().colors
    }

    /// Whether the last palette change was cross-faded.
    pub fn colors_animated(&self) -> bool {
        self.inner.borrow().colors_animated
    }

    pub fn has_pre_draw_listener(&self) -> bool {
        self.inner.borrow().pre_draw_listener
    }

    /// Every opacity written to the layer, in order.
    pub fn alpha_history(&self) -> Vec<f32> {
        self.inner.borrow().alpha_history.clone()
    }
}

impl ScrimSurface for SimulatedSurface {
    fn set_tint(&mut self, tint: Color) {
        self.inner.borrow_mut().tint = tint;
    }

    fn tint(&self) -> Color {
        self.current_tint()
    }

    fn set_view_alpha(&mut self, alpha: f32) {
        let mut state = self.inner.borrow_mut();
        state.alpha = alpha;
        state.alpha_history.push(alpha);
    }

    fn view_alpha(&self) -> f32 {
        self.alpha()
    }

    fn set_colors(&mut self, colors: GradientColors, animate: bool) {
        let mut state = self.inner.borrow_mut();
        state.colors = colors;
        state.colors_animated = animate;
    }

    fn colors(&self) -> GradientColors {
        self.current_colors()
    }

    fn add_pre_draw_listener(&mut self) {
        self.inner.borrow_mut().pre_draw_listener = true;
    }

    fn remove_pre_draw_listener(&mut self) {
        self.inner.borrow_mut().pre_draw_listener = false;
    }
}

#[derive(Debug, Default)]
struct SchedulerState {
    now: Duration,
    sequence: u64,
    queue: Vec<(Duration, u64, ScrimTask)>,
    frame_requested: bool,
}

/// Virtual clock with a delayed task queue.
///
/// Tasks with the same due time run in the order they were posted.
#[derive(Debug, Clone, Default)]
pub struct SimulatedScheduler {
    inner: Rc<RefCell<SchedulerState>>,
}

impl SimulatedScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward. Moving backwards is ignored.
    pub fn advance_to(&self, time: Duration) {
        let mut state = self.inner.borrow_mut();
        if time > state.now {
            state.now = time;
        }
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<Duration> {
        self.inner.borrow().queue.iter().map(|(due, _, _)| *due).min()
    }

    /// Remove and return the earliest task that is due at the current time.
    pub fn pop_due(&self) -> Option<ScrimTask> {
        let mut state = self.inner.borrow_mut();
        let now = state.now;
        let index = state
            .queue
            .iter()
            .enumerate()
            .filter(|(_, (due, _, _))| *due <= now)
            .min_by_key(|(_, (due, sequence, _))| (*due, *sequence))
            .map(|(index, _)| index)?;
        Some(state.queue.remove(index).2)
    }

    pub fn pending_tasks(&self) -> Vec<ScrimTask> {
        let mut queue = self.inner.borrow().queue.clone();
        queue.sort_by_key(|(due, sequence, _)| (*due, *sequence));
        queue.into_iter().map(|(_, _, task)| task).collect()
    }

    /// Consume an outstanding animation frame request.
    pub fn take_frame_request(&self) -> bool {
        std::mem::take(&mut self.inner.borrow_mut().frame_requested)
    }

    pub fn frame_requested(&self) -> bool {
        self.inner.borrow().frame_requested
    }

    fn enqueue(&self, task: ScrimTask, delay: Duration) {
        let mut state = self.inner.borrow_mut();
        let due = state.now + delay;
        state.sequence += 1;
        let sequence = state.sequence;
        state.queue.push((due, sequence, task));
    }
}

impl Scheduler for SimulatedScheduler {
    fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    fn post(&mut self, task: ScrimTask) {
        self.enqueue(task, Duration::ZERO);
    }

    fn post_delayed(&mut self, task: ScrimTask, delay: Duration) {
        self.enqueue(task, delay);
    }

    fn cancel(&mut self, task: ScrimTask) {
        self.inner
            .borrow_mut()
            .queue
            .retain(|(_, _, pending)| *pending != task);
    }

    fn has_pending(&self, task: ScrimTask) -> bool {
        self.inner
            .borrow()
            .queue
            .iter()
            .any(|(_, _, pending)| *pending == task)
    }

    fn request_animation_frame(&mut self) {
        self.inner.borrow_mut().frame_requested = true;
    }
}

#[derive(Debug, Default)]
struct AlarmState {
    deadline: Option<Duration>,
    schedule_count: usize,
}

/// Alarm whose deadline is measured on a [`SimulatedScheduler`] clock.
#[derive(Debug, Clone)]
pub struct SimulatedAlarm {
    clock: SimulatedScheduler,
    inner: Rc<RefCell<AlarmState>>,
}

impl SimulatedAlarm {
    pub fn new(clock: SimulatedScheduler) -> Self {
        Self {
            clock,
            inner: Rc::default(),
        }
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.inner.borrow().deadline
    }

    /// How many times the alarm was actually armed.
    pub fn schedule_count(&self) -> usize {
        self.inner.borrow().schedule_count
    }

    /// Disarm and report the alarm if its deadline has passed.
    pub fn fire_if_due(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.inner.borrow_mut();
        match state.deadline {
            Some(deadline) if deadline <= now => {
                state.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl AlarmTimer for SimulatedAlarm {
    fn schedule(&mut self, duration: Duration, mode: ScheduleMode) -> bool {
        let now = self.clock.now();
        let mut state = self.inner.borrow_mut();
        if mode == ScheduleMode::IgnoreIfScheduled && state.deadline.is_some() {
            return false;
        }
        state.deadline = Some(now + duration);
        state.schedule_count += 1;
        true
    }

    fn cancel(&mut self) {
        self.inner.borrow_mut().deadline = None;
    }

    fn is_scheduled(&self) -> bool {
        self.inner.borrow().deadline.is_some()
    }
}

/// A wake lock call as observed by [`SimulatedWakeLock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeLockEvent {
    Acquire,
    Release,
}

/// Wake lock that records every call.
#[derive(Debug, Clone, Default)]
pub struct SimulatedWakeLock {
    events: Rc<RefCell<Vec<WakeLockEvent>>>,
}

impl SimulatedWakeLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<WakeLockEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, event: WakeLockEvent) -> usize {
        self.events.borrow().iter().filter(|e| **e == event).count()
    }

    pub fn is_held(&self) -> bool {
        self.events.borrow().last() == Some(&WakeLockEvent::Acquire)
    }
}

impl WakeLock for SimulatedWakeLock {
    fn acquire(&mut self, _tag: &str) {
        self.events.borrow_mut().push(WakeLockEvent::Acquire);
    }

    fn release(&mut self, _tag: &str) {
        self.events.borrow_mut().push(WakeLockEvent::Release);
    }
}

/// Theme palette that can be swapped at runtime.
#[derive(Debug, Clone, Default)]
pub struct StaticColorProvider {
    colors: Rc<RefCell<GradientColors>>,
}

impl StaticColorProvider {
    pub fn new(colors: GradientColors) -> Self {
        Self {
            colors: Rc::new(RefCell::new(colors)),
        }
    }

    pub fn set_colors(&self, colors: GradientColors) {
        *self.colors.borrow_mut() = colors;
    }
}

impl ColorProvider for StaticColorProvider {
    fn theme_colors(&self) -> GradientColors {
        *self.colors.borrow()
    }
}
