//! Virtual-clock host for the scrim controller.
//!
//! [`Simulation`] wires a [`ScrimController`] to the simulated backend and plays the
//! part of the event loop: it delivers posted tasks when they come due, fires the
//! wallpaper alarm, and produces frames at a fixed interval whenever the controller
//! asked for one (an animation frame request or a registered pre-draw listener).
//! Nothing sleeps; time only moves when [`Simulation::advance`] is called.
//!
//! A [`Scenario`] is a TOML script of timed controller events. The `simulate`
//! command replays one and prints the resulting per-frame trace.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use crate::backend::simulated::{
    SimulatedAlarm, SimulatedScheduler, SimulatedSurface, SimulatedWakeLock, StaticColorProvider,
};
use crate::backend::{Scheduler, ScrimSurface};
use crate::common::color::{Color, GradientColors};
use crate::common::constants::DEFAULT_FRAME_INTERVAL_MS;
use crate::controller::{
    ControllerSettings, ScrimCallback, ScrimController, ScrimLayers, ScrimVisibility,
};
use crate::error::ScrimResult;
use crate::layer::{PerLayer, ScrimLayer};
use crate::state::ScrimState;

/// Knobs of the simulated host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationOptions {
    pub frame_interval: Duration,
    /// Attach the optional auxiliary layer.
    pub auxiliary: bool,
    /// Wire a wake lock. Without one, holds are logged and skipped.
    pub wake_lock: bool,
    /// Report the screen as on right after attaching.
    pub screen_on: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(DEFAULT_FRAME_INTERVAL_MS),
            auxiliary: true,
            wake_lock: true,
            screen_on: true,
        }
    }
}

/// One `(state, behind alpha)` signal received by the state listener.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateDispatch {
    pub time_ms: u64,
    pub state: ScrimState,
    pub behind_alpha: f32,
}

/// Rendered values of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerSample {
    pub layer: ScrimLayer,
    pub alpha: f32,
    pub tint: Color,
}

/// Snapshot taken after every simulated frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceFrame {
    pub time_ms: u64,
    pub state: ScrimState,
    pub layers: Vec<LayerSample>,
    pub visibility: Option<ScrimVisibility>,
    pub wake_lock_held: bool,
}

impl TraceFrame {
    /// Returns true if both frames rendered the same thing.
    pub fn same_output(&self, other: &TraceFrame) -> bool {
        self.state == other.state
            && self.layers == other.layers
            && self.visibility == other.visibility
            && self.wake_lock_held == other.wake_lock_held
    }
}

/// Progress notification received by a [`RecordingCallback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackEventKind {
    Start,
    DisplayBlanked,
    Finished,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallbackEvent {
    pub time_ms: u64,
    pub label: String,
    pub kind: CallbackEventKind,
}

type CallbackLog = Rc<RefCell<Vec<CallbackEvent>>>;

/// Transition callback that appends every notification to a shared log.
pub struct RecordingCallback {
    label: String,
    clock: SimulatedScheduler,
    log: CallbackLog,
}

impl RecordingCallback {
    fn record(&self, kind: CallbackEventKind) {
        self.log.borrow_mut().push(CallbackEvent {
            time_ms: self.clock.now().as_millis() as u64,
            label: self.label.clone(),
            kind,
        });
    }
}

impl ScrimCallback for RecordingCallback {
    fn on_start(&self) {
        self.record(CallbackEventKind::Start);
    }

    fn on_display_blanked(&self) {
        self.record(CallbackEventKind::DisplayBlanked);
    }

    fn on_finished(&self) {
        self.record(CallbackEventKind::Finished);
    }

    fn on_cancelled(&self) {
        self.record(CallbackEventKind::Cancelled);
    }
}

/// A controller driven by a virtual clock.
pub struct Simulation {
    controller: ScrimController,
    scheduler: SimulatedScheduler,
    alarm: SimulatedAlarm,
    surfaces: PerLayer<Option<SimulatedSurface>>,
    wake_lock: SimulatedWakeLock,
    colors: StaticColorProvider,
    frame_interval: Duration,
    last_frame: Option<Duration>,
    dispatches: Rc<RefCell<Vec<StateDispatch>>>,
    visibility_changes: Rc<RefCell<Vec<ScrimVisibility>>>,
    callback_log: CallbackLog,
    trace: Vec<TraceFrame>,
}

impl Simulation {
    pub fn new(settings: ControllerSettings, options: SimulationOptions) -> ScrimResult<Self> {
        let scheduler = SimulatedScheduler::new();
        let alarm = SimulatedAlarm::new(scheduler.clone());
        let wake_lock = SimulatedWakeLock::new();
        let colors = StaticColorProvider::new(GradientColors::from_theme(
            Color(0xff20_2124),
            Color(0xff8a_b4f8),
        ));

        let front = SimulatedSurface::new();
        let behind = SimulatedSurface::new();
        let notifications = SimulatedSurface::new();
        let auxiliary = options.auxiliary.then(SimulatedSurface::new);

        let dispatches = Rc::new(RefCell::new(Vec::new()));
        let visibility_changes = Rc::new(RefCell::new(Vec::new()));

        let mut builder = ScrimController::builder(
            settings,
            Box::new(scheduler.clone()),
            Box::new(alarm.clone()),
            Box::new(colors.clone()),
        )
        .state_listener({
            let dispatches = Rc::clone(&dispatches);
            let clock = scheduler.clone();
            Box::new(move |state: ScrimState, behind_alpha: f32, _colors: GradientColors| {
                dispatches.borrow_mut().push(StateDispatch {
                    time_ms: clock.now().as_millis() as u64,
                    state,
                    behind_alpha,
                });
            })
        })
        .visibility_listener({
            let visibility_changes = Rc::clone(&visibility_changes);
            Box::new(move |visibility: ScrimVisibility| {
                visibility_changes.borrow_mut().push(visibility)
            })
        });
        if options.wake_lock {
            builder = builder.wake_lock(Box::new(wake_lock.clone()));
        }

        let mut controller = builder.attach(ScrimLayers {
            front: Box::new(front.clone()),
            behind: Box::new(behind.clone()),
            notifications: Box::new(notifications.clone()),
            auxiliary: auxiliary
                .clone()
                .map(|surface| Box::new(surface) as Box<dyn ScrimSurface>),
        })?;
        if options.screen_on {
            controller.on_screen_turned_on()?;
        }

        Ok(Self {
            controller,
            scheduler,
            alarm,
            surfaces: PerLayer::new(Some(front), Some(behind), Some(notifications), auxiliary),
            wake_lock,
            colors,
            frame_interval: options.frame_interval,
            last_frame: None,
            dispatches,
            visibility_changes,
            callback_log: Rc::new(RefCell::new(Vec::new())),
            trace: Vec::new(),
        })
    }

    pub fn controller(&self) -> &ScrimController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ScrimController {
        &mut self.controller
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn scheduler(&self) -> &SimulatedScheduler {
        &self.scheduler
    }

    pub fn alarm(&self) -> &SimulatedAlarm {
        &self.alarm
    }

    pub fn wake_lock(&self) -> &SimulatedWakeLock {
        &self.wake_lock
    }

    pub fn surface(&self, layer: ScrimLayer) -> Option<&SimulatedSurface> {
        self.surfaces.get(layer).as_ref()
    }

    /// Rendered opacity of an attached layer, 0 for a missing one.
    pub fn alpha(&self, layer: ScrimLayer) -> f32 {
        self.surface(layer).map_or(0.0, SimulatedSurface::alpha)
    }

    pub fn tint(&self, layer: ScrimLayer) -> Color {
        self.surface(layer)
            .map_or(Color::TRANSPARENT, SimulatedSurface::current_tint)
    }

    /// Swap the theme palette and notify the controller.
    pub fn set_theme(&mut self, colors: GradientColors) -> ScrimResult<()> {
        self.colors.set_colors(colors);
        self.controller.on_theme_changed()
    }

    pub fn state_dispatches(&self) -> Vec<StateDispatch> {
        self.dispatches.borrow().clone()
    }

    pub fn visibility_changes(&self) -> Vec<ScrimVisibility> {
        self.visibility_changes.borrow().clone()
    }

    /// A callback whose notifications land in [`Simulation::callback_events`].
    pub fn recording_callback(&self, label: &str) -> Rc<dyn ScrimCallback> {
        Rc::new(RecordingCallback {
            label: label.to_string(),
            clock: self.scheduler.clone(),
            log: Rc::clone(&self.callback_log),
        })
    }

    pub fn callback_events(&self) -> Vec<CallbackEvent> {
        self.callback_log.borrow().clone()
    }

    /// How many times `label` received `kind`.
    pub fn callback_count(&self, label: &str, kind: CallbackEventKind) -> usize {
        self.callback_log
            .borrow()
            .iter()
            .filter(|event| event.label == label && event.kind == kind)
            .count()
    }

    pub fn trace(&self) -> &[TraceFrame] {
        &self.trace
    }

    /// Transition with a recording callback labeled `label`.
    pub fn transition(&mut self, state: ScrimState, label: &str) -> ScrimResult<()> {
        let callback = self.recording_callback(label);
        self.controller.transition_to(state, Some(callback))
    }

    /// Returns true while the host owes the controller a frame.
    pub fn needs_frame(&self) -> bool {
        self.scheduler.frame_requested()
            || self
                .surface(ScrimLayer::Behind)
                .is_some_and(SimulatedSurface::has_pre_draw_listener)
    }

    /// Returns true when nothing is pending besides the wallpaper alarm.
    pub fn is_idle(&self) -> bool {
        !self.needs_frame() && self.scheduler.next_due().is_none()
    }

    /// Move the clock forward by `duration`, delivering every event that comes due.
    pub fn advance(&mut self, duration: Duration) -> ScrimResult<()> {
        let until = self.now() + duration;
        while let Some(next) = self.next_event_time() {
            if next > until {
                break;
            }
            self.scheduler.advance_to(next);
            self.process_due()?;
        }
        self.scheduler.advance_to(until);
        Ok(())
    }

    /// Advance until [`Simulation::is_idle`] holds or `limit` elapsed.
    pub fn run_until_idle(&mut self, limit: Duration) -> ScrimResult<()> {
        let until = self.now() + limit;
        while !self.is_idle() {
            let Some(next) = self.next_event_time() else {
                break;
            };
            if next > until {
                break;
            }
            self.scheduler.advance_to(next);
            self.process_due()?;
        }
        Ok(())
    }

    fn next_event_time(&self) -> Option<Duration> {
        let frame = self.needs_frame().then(|| self.next_frame_time());
        [frame, self.scheduler.next_due(), self.alarm.deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    /// Frames land on multiples of the frame interval, at most one per instant.
    fn next_frame_time(&self) -> Duration {
        let interval = self.frame_interval.as_nanos().max(1) as u64;
        let now = self.now().as_nanos() as u64;
        let mut frame = Duration::from_nanos(now.div_ceil(interval) * interval);
        if let Some(last) = self.last_frame
            && frame <= last
        {
            frame = last + self.frame_interval;
        }
        frame
    }

    fn process_due(&mut self) -> ScrimResult<()> {
        while let Some(task) = self.scheduler.pop_due() {
            self.controller.run_task(task)?;
        }
        if self.alarm.fire_if_due() {
            self.controller.on_hide_wallpaper_timeout()?;
        }
        if self.needs_frame() && self.next_frame_time() <= self.now() {
            self.run_frame()?;
        }
        Ok(())
    }

    fn run_frame(&mut self) -> ScrimResult<()> {
        self.last_frame = Some(self.now());
        // Animation callbacks run before traversal, as on a real display pipeline
        if self.scheduler.take_frame_request() {
            self.controller.on_animation_frame()?;
        }
        if self
            .surface(ScrimLayer::Behind)
            .is_some_and(SimulatedSurface::has_pre_draw_listener)
        {
            self.controller.on_pre_draw()?;
        }
        self.record_frame();
        Ok(())
    }

    fn record_frame(&mut self) {
        let layers = ScrimLayer::ALL
            .into_iter()
            .filter_map(|layer| {
                self.surface(layer).map(|surface| LayerSample {
                    layer,
                    alpha: surface.alpha(),
                    tint: surface.current_tint(),
                })
            })
            .collect();
        self.trace.push(TraceFrame {
            time_ms: self.now().as_millis() as u64,
            state: self.controller.state(),
            layers,
            visibility: self.controller.visibility(),
            wake_lock_held: self.controller.is_wake_lock_held(),
        });
    }

    /// Replay `scenario`, then keep running for its settle time.
    pub fn run_scenario(&mut self, scenario: &Scenario) -> Result<()> {
        let mut steps: Vec<&ScenarioStep> = scenario.steps.iter().collect();
        steps.sort_by_key(|step| step.at_ms);

        for (index, step) in steps.into_iter().enumerate() {
            let at = Duration::from_millis(step.at_ms);
            self.advance(at.saturating_sub(self.now()))?;
            self.apply_event(&step.event, &format!("step-{}", index + 1))
                .with_context(|| format!("Scenario step {} at {} ms failed", index + 1, step.at_ms))?;
            log_debug!("t={}ms applied {:?}", step.at_ms, step.event);
        }
        self.advance(Duration::from_millis(scenario.settle_ms))?;
        Ok(())
    }

    fn apply_event(&mut self, event: &ScenarioEvent, label: &str) -> ScrimResult<()> {
        if let ScenarioEvent::Transition { state } = *event {
            let callback = self.recording_callback(label);
            return self.controller.transition_to(state, Some(callback));
        }

        let controller = &mut self.controller;
        match *event {
            ScenarioEvent::Transition { .. } => {}
            ScenarioEvent::PanelExpansion { fraction } => controller.set_panel_expansion(fraction)?,
            ScenarioEvent::QsPosition { fraction, bottom_y } => {
                controller.set_qs_position(fraction, bottom_y)?
            }
            ScenarioEvent::TrackingStarted {
                can_dismiss_lock_screen,
            } => controller.on_tracking_started(can_dismiss_lock_screen),
            ScenarioEvent::ExpandingFinished => controller.on_expanding_finished(),
            ScenarioEvent::ScreenOn => controller.on_screen_turned_on()?,
            ScenarioEvent::ScreenOff => controller.on_screen_turned_off(),
            ScenarioEvent::AodFrontAlpha { alpha } => controller.set_aod_front_scrim_alpha(alpha)?,
            ScenarioEvent::WakeLockScreenSensor { active } => {
                controller.set_wake_lock_screen_sensor_active(active)?
            }
            ScenarioEvent::Backdrop { visible } => controller.set_has_backdrop(visible)?,
            ScenarioEvent::AmbientWallpaper { supported } => {
                controller.set_wallpaper_supports_ambient_mode(supported)
            }
            ScenarioEvent::KeyguardOccluded { occluded } => controller.set_keyguard_occluded(occluded)?,
            ScenarioEvent::ExpansionAffectsAlpha { affects } => {
                controller.set_expansion_affects_alpha(affects)?
            }
            ScenarioEvent::KeyguardFadingAway {
                fading_away,
                duration_ms,
            } => controller.set_keyguard_fading_away(fading_away, Duration::from_millis(duration_ms)),
            ScenarioEvent::LaunchingAffordance { with_preview } => {
                controller.set_launching_affordance_with_preview(with_preview)
            }
            ScenarioEvent::Docked { docked } => controller.set_docked(docked),
            ScenarioEvent::AlwaysOn { enabled } => controller.set_always_on(enabled),
            ScenarioEvent::SlowUnlock { enabled } => controller.set_needs_slow_unlock_transition(enabled),
            ScenarioEvent::ThemeChanged => controller.on_theme_changed()?,
        }
        Ok(())
    }
}

/// A scripted sequence of controller events.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scenario {
    /// Attach the auxiliary layer.
    #[serde(default = "default_true")]
    pub auxiliary: bool,
    /// Report the screen as on before the first step.
    #[serde(default = "default_true")]
    pub screen_on: bool,
    /// How long to keep running after the last step.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default, rename = "step")]
    pub steps: Vec<ScenarioStep>,
}

fn default_true() -> bool {
    true
}

fn default_settle_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioStep {
    pub at_ms: u64,
    pub event: ScenarioEvent,
}

/// Controller inputs a scenario can script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioEvent {
    Transition { state: ScrimState },
    PanelExpansion { fraction: f32 },
    QsPosition { fraction: f32, bottom_y: i32 },
    TrackingStarted { can_dismiss_lock_screen: bool },
    ExpandingFinished,
    ScreenOn,
    ScreenOff,
    AodFrontAlpha { alpha: f32 },
    WakeLockScreenSensor { active: bool },
    Backdrop { visible: bool },
    AmbientWallpaper { supported: bool },
    KeyguardOccluded { occluded: bool },
    ExpansionAffectsAlpha { affects: bool },
    KeyguardFadingAway { fading_away: bool, duration_ms: u64 },
    LaunchingAffordance { with_preview: bool },
    Docked { docked: bool },
    AlwaysOn { enabled: bool },
    SlowUnlock { enabled: bool },
    ThemeChanged,
}

impl Scenario {
    /// Parse a scenario from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content).context("Failed to parse scenario")?;
        if let Some(step) = scenario.steps.iter().find(|step| {
            matches!(step.event, ScenarioEvent::Transition { state } if state == ScrimState::Uninitialized)
        }) {
            anyhow::bail!(
                "Scenario step at {} ms transitions to the uninitialized state",
                step.at_ms
            );
        }
        Ok(scenario)
    }

    /// Load a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid scenario: {}", path.display()))
    }
}
