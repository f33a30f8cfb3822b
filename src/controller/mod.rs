//! The scrim controller.
//!
//! [`ScrimController`] owns the active [`ScrimState`], the per-layer targets and the
//! animation records, and pushes rendered values to the attached surfaces. It reacts to:
//!
//! - **Transitions** requested through [`ScrimController::transition_to`]
//! - **Gestures**: panel and quick settings expansion
//! - **Environment facts**: AOD front opacity, backdrop, ambient wallpaper, occlusion
//! - **Host events**: pre-draw, animation frames, posted tasks, the wallpaper alarm
//!
//! ## Update coalescing
//!
//! Most changes do not touch the surfaces immediately. They set `update_pending` and
//! register a pre-draw listener on the behind surface; every further change before the
//! next frame is folded into the single recompute that runs in [`ScrimController::on_pre_draw`].
//! Gesture updates are the exception: they adapt running animations in place so the
//! scrims follow the finger without waiting for a frame.
//!
//! ## Callbacks
//!
//! At most one transition callback is registered. A new transition cancels it, and it is
//! finished once every animation settled. See [`callback`] for the exactly-once rule.

pub mod callback;
pub mod events;


use std::fmt::Write as _;
use std::rc::Rc;
use std::time::Duration;

use crate::animation::{AnimationDriver, AnimationRecord};
use crate::backend::{
    AlarmTimer, ColorProvider, ScheduleMode, Scheduler, ScrimSurface, ScrimTask, WakeLock,
};
use crate::blanking::{BlankingCoordinator, BlankingPhase};
use crate::common::color::{Color, GradientColors};
use crate::common::constants::{
    DEFAULT_DARKEN_WHILE_DRAGGING, FADE_KEYGUARD_START_DELAY, GAR_SCRIM_ALPHA,
    KEYGUARD_SCRIM_ALPHA,
};
use crate::common::utils::format_duration;
use crate::error::{ScrimError, ScrimResult};
use crate::expansion::ExpansionModel;
use crate::layer::{PerLayer, ScrimLayer};
use crate::state::{DozeParameters, ScrimState, StateCatalog};
use crate::wakelock::WakeLockGuard;

pub use callback::{CallbackHandle, ScrimCallback};
pub use events::{ScrimVisibility, StateListener, VisibilityListener, VisibilityTracker};

/// Fixed parameters the controller is built with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    /// Behind opacity of the bouncer and shade states.
    pub default_scrim_alpha: f32,
    /// Behind opacity on the lock screen.
    pub keyguard_behind_alpha: f32,
    /// Darken instead of reveal while dragging on the keyguard, until a drag says otherwise.
    pub darken_while_dragging: bool,
    pub doze: DozeParameters,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            default_scrim_alpha: GAR_SCRIM_ALPHA,
            keyguard_behind_alpha: KEYGUARD_SCRIM_ALPHA,
            darken_while_dragging: DEFAULT_DARKEN_WHILE_DRAGGING,
            doze: DozeParameters::default(),
        }
    }
}

/// Surfaces handed to [`ScrimControllerBuilder::attach`].
pub struct ScrimLayers {
    pub front: Box<dyn ScrimSurface>,
    pub behind: Box<dyn ScrimSurface>,
    pub notifications: Box<dyn ScrimSurface>,
    pub auxiliary: Option<Box<dyn ScrimSurface>>,
}

/// Collects collaborators until the surfaces are attached.
pub struct ScrimControllerBuilder {
    settings: ControllerSettings,
    scheduler: Box<dyn Scheduler>,
    alarm: Box<dyn AlarmTimer>,
    color_provider: Box<dyn ColorProvider>,
    wake_lock: Option<Box<dyn WakeLock>>,
    state_listener: Option<StateListener>,
    visibility_listener: Option<VisibilityListener>,
}

impl ScrimControllerBuilder {
    pub fn wake_lock(mut self, wake_lock: Box<dyn WakeLock>) -> Self {
        self.wake_lock = Some(wake_lock);
        self
    }

    pub fn state_listener(mut self, listener: StateListener) -> Self {
        self.state_listener = Some(listener);
        self
    }

    pub fn visibility_listener(mut self, listener: VisibilityListener) -> Self {
        self.visibility_listener = Some(listener);
        self
    }

    /// Wire the surfaces, apply the theme palette and run the initial update.
    pub fn attach(self, layers: ScrimLayers) -> ScrimResult<ScrimController> {
        let settings = self.settings;
        if settings.default_scrim_alpha.is_nan() || settings.keyguard_behind_alpha.is_nan() {
            return Err(ScrimError::InvalidArgument("scrim alpha should not be NaN"));
        }

        let catalog = StateCatalog::new(
            settings.default_scrim_alpha,
            settings.keyguard_behind_alpha,
            settings.doze,
        );
        let initial = catalog.descriptor(ScrimState::Uninitialized, ScrimState::Uninitialized);

        let mut controller = ScrimController {
            state: ScrimState::Uninitialized,
            catalog,
            expansion: ExpansionModel::new(settings.darken_while_dragging),
            animations: AnimationDriver::new(),
            blanking: BlankingCoordinator::new(),
            wake_lock: WakeLockGuard::new(self.wake_lock),
            surfaces: PerLayer::new(
                Some(layers.front),
                Some(layers.behind),
                Some(layers.notifications),
                layers.auxiliary,
            ),
            scheduler: self.scheduler,
            alarm: self.alarm,
            color_provider: self.color_provider,
            state_listener: self.state_listener,
            visibility_listener: self.visibility_listener,
            visibility: VisibilityTracker::default(),
            colors: GradientColors::default(),
            target_alpha: initial.alpha,
            target_tint: initial.tint,
            animation_duration: initial.duration,
            animation_delay: Duration::ZERO,
            callback: None,
            blank_screen: false,
            animate_change: false,
            screen_on: false,
            keyguard_occluded: false,
            update_pending: false,
            wallpaper_visibility_timed_out: false,
            needs_drawable_color_update: false,
            screen_blanking_callback_called: false,
            needs_slow_unlock_transition: false,
        };

        controller.update_theme_colors();
        controller.update_scrims()?;
        log_debug!(
            "Scrim controller attached (auxiliary layer: {})",
            controller.has_layer(ScrimLayer::Auxiliary)
        );
        Ok(controller)
    }
}

/// Drives scrim opacity and tint for every state and gesture.
pub struct ScrimController {
    state: ScrimState,
    catalog: StateCatalog,
    expansion: ExpansionModel,
    animations: AnimationDriver,
    blanking: BlankingCoordinator,
    wake_lock: WakeLockGuard,
    surfaces: PerLayer<Option<Box<dyn ScrimSurface>>>,
    scheduler: Box<dyn Scheduler>,
    alarm: Box<dyn AlarmTimer>,
    color_provider: Box<dyn ColorProvider>,
    state_listener: Option<StateListener>,
    visibility_listener: Option<VisibilityListener>,
    visibility: VisibilityTracker,
    colors: GradientColors,

    target_alpha: PerLayer<f32>,
    target_tint: PerLayer<Color>,
    animation_duration: Duration,
    animation_delay: Duration,
    callback: Option<CallbackHandle>,

    blank_screen: bool,
    animate_change: bool,
    screen_on: bool,
    keyguard_occluded: bool,
    update_pending: bool,
    wallpaper_visibility_timed_out: bool,
    needs_drawable_color_update: bool,
    screen_blanking_callback_called: bool,
    needs_slow_unlock_transition: bool,
}

impl ScrimController {
    /// Start building a controller.
    ///
    /// # Arguments
    /// * `settings` - Scrim opacities and doze parameters
    /// * `scheduler` - Event loop clock and task queue
    /// * `alarm` - Timer used to fade an ambient wallpaper away in AOD
    /// * `color_provider` - Source of the theme palette
    pub fn builder(
        settings: ControllerSettings,
        scheduler: Box<dyn Scheduler>,
        alarm: Box<dyn AlarmTimer>,
        color_provider: Box<dyn ColorProvider>,
    ) -> ScrimControllerBuilder {
        ScrimControllerBuilder {
            settings,
            scheduler,
            alarm,
            color_provider,
            wake_lock: None,
            state_listener: None,
            visibility_listener: None,
        }
    }

    // Transitions

    /// Move to `state`, optionally reporting progress to `callback`.
    ///
    /// Requesting the active state does not restart it; a callback that is not already
    /// registered is finished immediately instead.
    ///
    /// # Errors
    /// - `InvalidArgument` when `state` is [`ScrimState::Uninitialized`]
    /// - `NanOpacity` when the resolved targets contain NaN
    pub fn transition_to(
        &mut self,
        state: ScrimState,
        callback: Option<Rc<dyn ScrimCallback>>,
    ) -> ScrimResult<()> {
        if state == ScrimState::Uninitialized {
            return Err(ScrimError::InvalidArgument(
                "cannot transition to the uninitialized state",
            ));
        }
        if state == self.state {
            if let Some(callback) = callback {
                let already_registered = self
                    .callback
                    .as_ref()
                    .is_some_and(|active| active.wraps(&callback));
                if !already_registered {
                    callback.on_finished();
                }
            }
            return Ok(());
        }
        log_debug!("State changed to: {state}");

        let previous = self.state;
        self.state = state;

        if let Some(active) = self.callback.take() {
            active.cancel();
        }
        self.callback = callback.map(CallbackHandle::new);

        let descriptor = self.catalog.descriptor(state, previous);
        self.screen_blanking_callback_called = false;
        self.animation_delay = Duration::ZERO;
        self.blank_screen = descriptor.blanks_screen;
        self.animate_change = descriptor.animate_change;
        self.animation_duration = descriptor.duration;

        // The notifications layer follows quick settings, not the state
        for layer in [ScrimLayer::Front, ScrimLayer::Behind, ScrimLayer::Auxiliary] {
            self.target_tint.set(layer, *descriptor.tint.get(layer));
            self.target_alpha.set(layer, *descriptor.alpha.get(layer));
        }
        self.check_opacity()?;
        self.expansion.apply(
            state,
            &self.catalog,
            &mut self.target_alpha,
            &mut self.target_tint,
        )?;

        // Blanking requested by the previous state is obsolete
        self.blanking.cancel(self.scheduler.as_mut());

        self.needs_drawable_color_update = state != ScrimState::BrightnessMirror;

        // Keep the device awake until the low-power animation played to its last frame
        if descriptor.low_power {
            self.wake_lock.hold();
        }

        self.wallpaper_visibility_timed_out = false;
        if self.should_fade_away_wallpaper() {
            self.scheduler.post(ScrimTask::ScheduleWallpaperTimeout);
        } else {
            self.scheduler.post(ScrimTask::CancelWallpaperTimeout);
        }

        let doze = *self.catalog.doze();
        let leaving_doze = previous == ScrimState::Aod
            && (!doze.always_on || state == ScrimState::Unlocked);
        let entering_doze_without_blanking =
            state == ScrimState::Aod && !doze.display_needs_blanking;

        if self.needs_slow_unlock_transition && state == ScrimState::Unlocked {
            self.animation_delay = FADE_KEYGUARD_START_DELAY;
            self.schedule_update()?;
        } else if leaving_doze || entering_doze_without_blanking {
            // Waiting for a frame is not possible when the display is about to change
            // power mode underneath us
            self.on_pre_draw()?;
        } else {
            self.schedule_update()?;
        }

        let behind = self.view_alpha(ScrimLayer::Behind)?;
        self.dispatch_scrim_state(behind)
    }

    // Gestures

    /// Shade expansion, 1 when fully expanded over the keyguard and 0 when collapsed.
    ///
    /// # Errors
    /// - `InvalidArgument` when `fraction` is NaN
    pub fn set_panel_expansion(&mut self, fraction: f32) -> ScrimResult<()> {
        if !self.expansion.set_panel_expansion(fraction)? {
            return Ok(());
        }
        if !(self.state.tracks_panel_expansion() && self.expansion.expansion_affects_alpha()) {
            return Ok(());
        }
        self.apply_and_dispatch_expansion()
    }

    /// Quick settings expansion and the absolute position of the panel bottom.
    ///
    /// A NaN fraction is ignored.
    pub fn set_qs_position(&mut self, fraction: f32, qs_panel_bottom_y: i32) -> ScrimResult<()> {
        if fraction.is_nan() {
            return Ok(());
        }
        self.update_notifications_alpha(fraction, qs_panel_bottom_y)?;
        if !self.expansion.set_qs_expansion(fraction) {
            return Ok(());
        }
        if !(self.state.tracks_qs_expansion() && self.expansion.expansion_affects_alpha()) {
            return Ok(());
        }
        self.apply_and_dispatch_expansion()
    }

    pub fn on_tracking_started(&mut self, can_dismiss_lock_screen: bool) {
        self.expansion.on_tracking_started(can_dismiss_lock_screen);
    }

    pub fn on_expanding_finished(&mut self) {
        self.expansion.on_expanding_finished();
    }

    pub fn set_expansion_affects_alpha(&mut self, affects: bool) -> ScrimResult<()> {
        self.expansion.set_expansion_affects_alpha(affects);
        if affects {
            self.apply_and_dispatch_expansion()?;
        }
        Ok(())
    }

    // Environment

    /// Front opacity in AOD, lowered in dark surroundings.
    ///
    /// Applied right away while dozing with an always-on display (or docked) and while
    /// pulsing; otherwise it is picked up by the next transition.
    ///
    /// # Errors
    /// - `InvalidArgument` when `alpha` is NaN
    pub fn set_aod_front_scrim_alpha(&mut self, alpha: f32) -> ScrimResult<()> {
        if alpha.is_nan() {
            return Err(ScrimError::InvalidArgument("AOD front alpha should not be NaN"));
        }
        let apply_now =
            *self.target_alpha.get(ScrimLayer::Front) != alpha && self.should_update_front_alpha();
        self.catalog.overrides_mut().aod_front_alpha = alpha;
        if apply_now {
            self.target_alpha.set(ScrimLayer::Front, alpha);
            self.update_scrims()?;
        }
        Ok(())
    }

    pub fn set_wake_lock_screen_sensor_active(&mut self, active: bool) -> ScrimResult<()> {
        self.catalog.overrides_mut().wake_lock_screen_sensor_active = active;
        if self.state == ScrimState::Pulsing {
            self.refresh_behind_alpha()?;
        }
        Ok(())
    }

    /// A backdrop (such as album art) is shown behind the lock screen.
    pub fn set_has_backdrop(&mut self, has_backdrop: bool) -> ScrimResult<()> {
        self.catalog.overrides_mut().has_backdrop = has_backdrop;
        // The backdrop may arrive after the state was applied
        if self.state.is_low_power() {
            self.refresh_behind_alpha()?;
        }
        Ok(())
    }

    pub fn set_wallpaper_supports_ambient_mode(&mut self, supported: bool) {
        self.catalog.overrides_mut().wallpaper_supports_ambient_mode = supported;
    }

    /// An activity shown over the lock screen. In AOD it is hidden behind an opaque scrim.
    pub fn set_keyguard_occluded(&mut self, occluded: bool) -> ScrimResult<()> {
        self.keyguard_occluded = occluded;
        self.update_scrims()
    }

    pub fn set_keyguard_fading_away(&mut self, fading_away: bool, duration: Duration) {
        let overrides = self.catalog.overrides_mut();
        overrides.keyguard_fading_away = fading_away;
        overrides.keyguard_fading_away_duration = duration;
    }

    pub fn set_launching_affordance_with_preview(&mut self, launching: bool) {
        self.catalog.overrides_mut().launching_affordance_with_preview = launching;
    }

    pub fn set_docked(&mut self, docked: bool) {
        self.catalog.overrides_mut().docked = docked;
    }

    pub fn set_always_on(&mut self, always_on: bool) {
        self.catalog.doze_mut().always_on = always_on;
    }

    /// Delay the next unlock animation, used when unlocking with a slow biometric.
    pub fn set_needs_slow_unlock_transition(&mut self, needs_slow_unlock: bool) {
        self.needs_slow_unlock_transition = needs_slow_unlock;
    }

    /// # Errors
    /// - `InvalidArgument` when `alpha` is NaN
    pub fn set_keyguard_behind_alpha(&mut self, alpha: f32) -> ScrimResult<()> {
        if alpha.is_nan() {
            return Err(ScrimError::InvalidArgument("keyguard alpha should not be NaN"));
        }
        self.catalog.set_keyguard_behind_alpha(alpha);
        self.schedule_update()
    }

    /// Provide the wake lock if it was not available when the controller was built.
    pub fn set_wake_lock(&mut self, wake_lock: Box<dyn WakeLock>) {
        self.wake_lock.set_wake_lock(wake_lock);
    }

    pub fn on_theme_changed(&mut self) -> ScrimResult<()> {
        self.update_theme_colors();
        self.schedule_update()
    }

    pub fn on_keyguard_visibility_changed(&mut self, showing: bool) -> ScrimResult<()> {
        log_debug!("Keyguard visibility changed: showing={showing}");
        self.needs_drawable_color_update = true;
        self.schedule_update()
    }

    /// The display finished turning on. Cuts a long blanking wait short.
    pub fn on_screen_turned_on(&mut self) -> ScrimResult<()> {
        self.screen_on = true;
        if self.blanking.expedite_reveal(self.scheduler.as_mut()) {
            log_debug!("Shorter blanking because screen turned on");
            self.reveal_after_blanking()?;
        }
        Ok(())
    }

    pub fn on_screen_turned_off(&mut self) {
        self.screen_on = false;
    }

    // Host events

    /// Frame-ready notification, delivered while a pre-draw listener is registered.
    pub fn on_pre_draw(&mut self) -> ScrimResult<()> {
        self.surface_mut(ScrimLayer::Behind)?.remove_pre_draw_listener();
        self.update_pending = false;
        if let Some(callback) = &self.callback {
            callback.start();
        }
        self.update_scrims()
    }

    /// Advance running animations to the scheduler's current time.
    pub fn on_animation_frame(&mut self) -> ScrimResult<()> {
        let step = self.animations.step(self.scheduler.now());
        for frame in step.frames {
            self.update_scrim_color(frame.layer, frame.alpha, frame.tint)?;
        }
        for completion in step.completions {
            self.on_finished(completion.callback)?;
            self.dispatch_scrims_visible()?;
        }
        if self.animations.any_animating() {
            self.scheduler.request_animation_frame();
        }
        Ok(())
    }

    /// Run a task previously handed to the scheduler.
    pub fn run_task(&mut self, task: ScrimTask) -> ScrimResult<()> {
        match task {
            ScrimTask::PendingFrame => {
                if let Some(delay) = self
                    .blanking
                    .frame_committed(self.scheduler.as_mut(), self.screen_on)
                {
                    if let Some(callback) = &self.callback {
                        callback.display_blanked();
                        self.screen_blanking_callback_called = true;
                    }
                    log_debug!("Fading out scrims with delay: {}", format_duration(delay));
                }
            }
            ScrimTask::BlankingTransition => {
                if self.blanking.reveal() {
                    self.finish_blanking()?;
                }
            }
            ScrimTask::ScheduleWallpaperTimeout => {
                let duration = self.catalog.doze().wallpaper_aod_duration;
                self.alarm
                    .schedule(duration, ScheduleMode::IgnoreIfScheduled);
            }
            ScrimTask::CancelWallpaperTimeout => self.alarm.cancel(),
        }
        Ok(())
    }

    /// The wallpaper alarm fired. Fades an ambient wallpaper away behind an opaque scrim.
    pub fn on_hide_wallpaper_timeout(&mut self) -> ScrimResult<()> {
        if !self.state.is_low_power() {
            return Ok(());
        }
        self.wake_lock.hold();
        self.wallpaper_visibility_timed_out = true;
        self.animate_change = true;
        self.animation_duration = self.catalog.doze().wallpaper_fade_out_duration;
        self.schedule_update()
    }

    // Introspection

    pub fn state(&self) -> ScrimState {
        self.state
    }

    pub fn catalog(&self) -> &StateCatalog {
        &self.catalog
    }

    pub fn has_layer(&self, layer: ScrimLayer) -> bool {
        self.surfaces.get(layer).is_some()
    }

    /// Opacity the layer is currently drawn with.
    pub fn rendered_alpha(&self, layer: ScrimLayer) -> ScrimResult<f32> {
        self.view_alpha(layer)
    }

    pub fn rendered_tint(&self, layer: ScrimLayer) -> ScrimResult<Color> {
        Ok(self.surface(layer)?.tint())
    }

    pub fn target_alpha(&self, layer: ScrimLayer) -> f32 {
        *self.target_alpha.get(layer)
    }

    pub fn target_tint(&self, layer: ScrimLayer) -> Color {
        *self.target_tint.get(layer)
    }

    pub fn is_animating(&self, layer: ScrimLayer) -> bool {
        self.animations.is_animating(layer)
    }

    pub fn visibility(&self) -> Option<ScrimVisibility> {
        self.visibility.current()
    }

    pub fn is_wake_lock_held(&self) -> bool {
        self.wake_lock.is_held()
    }

    pub fn blanking_phase(&self) -> BlankingPhase {
        self.blanking.phase()
    }

    pub fn is_update_pending(&self) -> bool {
        self.update_pending
    }

    pub fn is_tracking(&self) -> bool {
        self.expansion.is_tracking()
    }

    pub fn panel_expansion(&self) -> f32 {
        self.expansion.panel_expansion()
    }

    pub fn qs_expansion(&self) -> f32 {
        self.expansion.qs_expansion()
    }

    pub fn colors(&self) -> GradientColors {
        self.colors
    }

    /// Human-readable snapshot of the controller.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, " ScrimController:");
        let _ = writeln!(out, "  state: {}", self.state);
        for (layer, surface) in self.surfaces.iter() {
            let Some(surface) = surface else {
                continue;
            };
            let _ = writeln!(
                out,
                "  {layer}: viewAlpha={} alpha={} tint={}",
                surface.view_alpha(),
                self.target_alpha.get(layer),
                surface.tint()
            );
        }
        let _ = writeln!(out, "  tracking={}", self.expansion.is_tracking());
        let _ = writeln!(
            out,
            "  defaultScrimAlpha={}",
            self.catalog.default_scrim_alpha()
        );
        let _ = writeln!(out, "  expansionFraction={}", self.expansion.panel_expansion());
        out
    }

    // Internals

    fn surface(&self, layer: ScrimLayer) -> ScrimResult<&dyn ScrimSurface> {
        self.surfaces
            .get(layer)
            .as_deref()
            .ok_or(ScrimError::LayerNotAttached(layer))
    }

    fn surface_mut(&mut self, layer: ScrimLayer) -> ScrimResult<&mut dyn ScrimSurface> {
        match self.surfaces.get_mut(layer) {
            Some(surface) => Ok(&mut **surface),
            None => Err(ScrimError::LayerNotAttached(layer)),
        }
    }

    fn view_alpha(&self, layer: ScrimLayer) -> ScrimResult<f32> {
        Ok(self.surface(layer)?.view_alpha())
    }

    fn is_active_callback(&self, callback: &CallbackHandle) -> bool {
        self.callback
            .as_ref()
            .is_some_and(|active| active.is_same_registration(callback))
    }

    fn check_opacity(&self) -> ScrimResult<()> {
        let front = *self.target_alpha.get(ScrimLayer::Front);
        let behind = *self.target_alpha.get(ScrimLayer::Behind);
        if front.is_nan() || behind.is_nan() {
            return Err(ScrimError::NanOpacity {
                state: self.state,
                front,
                behind,
            });
        }
        Ok(())
    }

    fn should_fade_away_wallpaper(&self) -> bool {
        let overrides = self.catalog.overrides();
        overrides.wallpaper_supports_ambient_mode
            && self.state == ScrimState::Aod
            && (self.catalog.doze().always_on || overrides.docked)
    }

    fn should_update_front_alpha(&self) -> bool {
        match self.state {
            ScrimState::Aod => self.catalog.doze().always_on || self.catalog.overrides().docked,
            ScrimState::Pulsing => true,
            _ => false,
        }
    }

    fn refresh_behind_alpha(&mut self) -> ScrimResult<()> {
        let behind = self.catalog.behind_alpha(self.state);
        if behind == *self.target_alpha.get(ScrimLayer::Behind) {
            return Ok(());
        }
        self.target_alpha.set(ScrimLayer::Behind, behind);
        self.check_opacity()?;
        self.update_scrims()
    }

    fn update_theme_colors(&mut self) {
        self.colors = self.color_provider.theme_colors();
        self.needs_drawable_color_update = true;
    }

    fn schedule_update(&mut self) -> ScrimResult<()> {
        if self.update_pending {
            return Ok(());
        }
        self.surface_mut(ScrimLayer::Behind)?.add_pre_draw_listener();
        self.update_pending = true;
        Ok(())
    }

    fn update_notifications_alpha(
        &mut self,
        qs_fraction: f32,
        qs_panel_bottom_y: i32,
    ) -> ScrimResult<()> {
        let alpha = self
            .expansion
            .notifications_alpha(self.state, qs_fraction, qs_panel_bottom_y);
        if alpha != *self.target_alpha.get(ScrimLayer::Notifications) {
            self.target_alpha.set(ScrimLayer::Notifications, alpha);
            // Follows the finger, never animated
            self.surface_mut(ScrimLayer::Notifications)?
                .set_view_alpha(alpha);
        }
        Ok(())
    }

    fn apply_and_dispatch_expansion(&mut self) -> ScrimResult<()> {
        self.expansion.apply(
            self.state,
            &self.catalog,
            &mut self.target_alpha,
            &mut self.target_tint,
        )?;
        if self.update_pending {
            return Ok(());
        }

        for layer in [
            ScrimLayer::Behind,
            ScrimLayer::Notifications,
            ScrimLayer::Front,
            ScrimLayer::Auxiliary,
        ] {
            if self.has_layer(layer) {
                self.set_or_adapt_current_animation(layer)?;
            }
        }
        let behind = self.view_alpha(ScrimLayer::Behind)?;
        self.dispatch_scrim_state(behind)?;

        // Expanding while pulsing or docked brings the wallpaper back, so the fade
        // timer starts over
        if self.wallpaper_visibility_timed_out {
            self.wallpaper_visibility_timed_out = false;
            self.scheduler.post(ScrimTask::ScheduleWallpaperTimeout);
        }
        Ok(())
    }

    fn set_or_adapt_current_animation(&mut self, layer: ScrimLayer) -> ScrimResult<()> {
        let alpha = *self.target_alpha.get(layer);
        let tint = *self.target_tint.get(layer);
        let now = self.scheduler.now();
        match self.animations.retarget(layer, alpha, tint, now) {
            Some(frame) => self.update_scrim_color(layer, frame.alpha, frame.tint),
            None => self.update_scrim_color(layer, alpha, tint),
        }
    }

    fn update_scrims(&mut self) -> ScrimResult<()> {
        if self.needs_drawable_color_update {
            self.needs_drawable_color_update = false;
            for layer in [
                ScrimLayer::Front,
                ScrimLayer::Behind,
                ScrimLayer::Notifications,
            ] {
                self.apply_colors(layer)?;
            }
            let behind = self.view_alpha(ScrimLayer::Behind)?;
            self.dispatch_scrim_state(behind)?;
        }

        // Hide the wallpaper once its AOD time is up, and hide activities shown over
        // the lock screen while dozing
        if self.state.is_low_power() && (self.wallpaper_visibility_timed_out || self.keyguard_occluded)
        {
            self.target_alpha.set(ScrimLayer::Behind, 1.0);
        }

        for layer in [
            ScrimLayer::Front,
            ScrimLayer::Behind,
            ScrimLayer::Notifications,
        ] {
            self.update_scrim(layer, *self.target_alpha.get(layer))?;
        }
        if self.has_layer(ScrimLayer::Auxiliary) {
            self.apply_colors(ScrimLayer::Auxiliary)?;
            self.update_scrim(
                ScrimLayer::Auxiliary,
                *self.target_alpha.get(ScrimLayer::Auxiliary),
            )?;
        }

        // Nothing may be animating at all, in which case everything settled already
        self.on_finished(self.callback.clone())?;
        self.dispatch_scrims_visible()
    }

    fn apply_colors(&mut self, layer: ScrimLayer) -> ScrimResult<()> {
        let colors = self.colors;
        let blank_screen = self.blank_screen;
        let surface = self.surface_mut(layer)?;
        // Only cross-fade colors on a layer that is actually visible
        let animate = surface.view_alpha() != 0.0 && !blank_screen;
        surface.set_colors(colors, animate);
        Ok(())
    }

    fn update_scrim(&mut self, layer: ScrimLayer, alpha: f32) -> ScrimResult<()> {
        let current = self.view_alpha(layer)?;

        // Overlapping animations would leave the layer in a state no transition asked for
        self.animations.cancel(layer);

        if self.blanking.is_pending() {
            return Ok(());
        }
        if self.blank_screen {
            return self.blank_display();
        }
        if !self.screen_blanking_callback_called
            && let Some(callback) = &self.callback
        {
            // No blanking needed, the new content can replace the old one right away
            callback.display_blanked();
            self.screen_blanking_callback_called = true;
        }

        if layer == ScrimLayer::Behind {
            self.dispatch_scrim_state(alpha)?;
        }

        let tint = *self.target_tint.get(layer);
        let wants_alpha_update = alpha != current;
        let wants_tint_update = self.surface(layer)?.tint() != tint;
        if wants_alpha_update || wants_tint_update {
            if self.animate_change {
                self.start_animation(layer, current)?;
            } else {
                self.update_scrim_color(layer, alpha, tint)?;
            }
        }
        Ok(())
    }

    fn start_animation(&mut self, layer: ScrimLayer, current: f32) -> ScrimResult<()> {
        let start_tint = self.surface(layer)?.tint();
        let record = AnimationRecord::new(
            (current, start_tint),
            (*self.target_alpha.get(layer), *self.target_tint.get(layer)),
            self.scheduler.now(),
            self.animation_delay,
            self.animation_duration,
            self.callback.clone(),
        );
        self.animations.start(layer, record);
        self.scheduler.request_animation_frame();
        Ok(())
    }

    fn update_scrim_color(&mut self, layer: ScrimLayer, alpha: f32, tint: Color) -> ScrimResult<()> {
        let alpha = alpha.clamp(0.0, 1.0);
        let surface = self.surface_mut(layer)?;
        surface.set_tint(tint);
        surface.set_view_alpha(alpha);
        self.dispatch_scrims_visible()
    }

    fn blank_display(&mut self) -> ScrimResult<()> {
        self.update_scrim_color(ScrimLayer::Front, 1.0, Color::BLACK)?;
        // The display may only change power mode once the black frame is visible
        self.blanking.begin(self.scheduler.as_mut());
        log_debug!("Blanking display before revealing {}", self.state);
        Ok(())
    }

    fn reveal_after_blanking(&mut self) -> ScrimResult<()> {
        if self.blanking.reveal() {
            self.finish_blanking()?;
        }
        Ok(())
    }

    fn finish_blanking(&mut self) -> ScrimResult<()> {
        self.blank_screen = false;
        self.update_scrims()
    }

    fn on_finished(&mut self, callback: Option<CallbackHandle>) -> ScrimResult<()> {
        // Nothing can finish while the display is blanked
        if self.blanking.is_pending() {
            return Ok(());
        }

        if self.animations.any_animating() {
            // Only the active callback waits for everything to settle. A superseded
            // one is finished with its own animation.
            if let Some(callback) = callback
                && !self.is_active_callback(&callback)
            {
                callback.finish();
            }
            return Ok(());
        }

        self.wake_lock.release();

        if let Some(callback) = callback {
            callback.finish();
            if self.is_active_callback(&callback) {
                self.callback = None;
            }
        }

        // Unlocking from AOD fades from black; drop the tint once that is done
        if self.state == ScrimState::Unlocked {
            self.target_tint.set(ScrimLayer::Front, Color::TRANSPARENT);
            self.target_tint.set(
                ScrimLayer::Behind,
                self.catalog.behind_tint(ScrimState::Unlocked),
            );
            self.target_tint.set(ScrimLayer::Auxiliary, Color::TRANSPARENT);
            for layer in [ScrimLayer::Front, ScrimLayer::Behind, ScrimLayer::Auxiliary] {
                if self.has_layer(layer) {
                    self.update_scrim_color(
                        layer,
                        *self.target_alpha.get(layer),
                        *self.target_tint.get(layer),
                    )?;
                }
            }
        }
        Ok(())
    }

    fn dispatch_scrim_state(&mut self, behind_alpha: f32) -> ScrimResult<()> {
        let colors = self.surface(ScrimLayer::Front)?.colors();
        if let Some(listener) = self.state_listener.as_mut() {
            listener(self.state, behind_alpha, colors);
        }
        Ok(())
    }

    fn dispatch_scrims_visible(&mut self) -> ScrimResult<()> {
        let front = self.view_alpha(ScrimLayer::Front)?;
        let behind = self.view_alpha(ScrimLayer::Behind)?;
        if let Some(visibility) = self.visibility.observe(front, behind) {
            log_debug!("Scrims are now {visibility}");
            if let Some(listener) = self.visibility_listener.as_mut() {
                listener(visibility);
            }
        }
        Ok(())
    }
}
