//! Gesture-driven scrim opacity.
//!
//! While the shade is dragged the behind scrim follows the drag instead of the state's
//! fixed target. The raw fraction is eased so that nothing happens over the first sixth
//! of the drag and the darkening then accelerates along a cosine profile:
//!
//! ```text
//! frac  = f * 1.2 - 0.2
//! eased = 0                                        if frac <= 0
//!       = 1 - 0.5 * (1 - cos(3.14159 * (1 - frac)²)) otherwise
//! ```
//!
//! The curve is evaluated with the same single/double precision mix used on the
//! platform side so that identical inputs produce identical opacities bit for bit.

use crate::common::color::Color;
use crate::common::utils::lerp;
use crate::error::{ScrimError, ScrimResult};
use crate::layer::{PerLayer, ScrimLayer};
use crate::state::{ScrimState, StateCatalog};

/// Approximation of π baked into the curve. Changing it moves where darkening ends.
const CURVE_PI: f32 = 3.14159;

/// Exponent applied to the eased fraction in the darkening states.
const DARKEN_EXPONENT: f32 = 0.8;

/// Ease a shade expansion fraction.
pub fn eased_fraction(fraction: f32) -> f32 {
    let frac = fraction * 1.2 - 0.2;
    if frac <= 0.0 {
        0.0
    } else {
        let distance = (1.0 - frac) as f64;
        (1.0 - 0.5 * (1.0 - (CURVE_PI as f64 * distance.powf(2.0)).cos())) as f32
    }
}

/// Continuous gesture inputs and the flags that decide how they affect opacity.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionModel {
    /// Shade expansion, 1 when fully expanded over the keyguard.
    panel_expansion: f32,
    /// Quick settings expansion.
    qs_expansion: f32,
    /// Darken rather than reveal while dragging on a secure keyguard.
    darken_while_dragging: bool,
    expansion_affects_alpha: bool,
    tracking: bool,
}

impl ExpansionModel {
    pub fn new(darken_while_dragging: bool) -> Self {
        Self {
            // Assume the shade is expanded during initialization
            panel_expansion: 1.0,
            qs_expansion: 0.0,
            darken_while_dragging,
            expansion_affects_alpha: true,
            tracking: false,
        }
    }

    pub fn panel_expansion(&self) -> f32 {
        self.panel_expansion
    }

    pub fn qs_expansion(&self) -> f32 {
        self.qs_expansion
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn expansion_affects_alpha(&self) -> bool {
        self.expansion_affects_alpha
    }

    pub fn set_expansion_affects_alpha(&mut self, affects: bool) {
        self.expansion_affects_alpha = affects;
    }

    /// Update the panel fraction. Returns whether the value changed.
    ///
    /// NaN is rejected: it always indicates a broken gesture pipeline.
    pub fn set_panel_expansion(&mut self, fraction: f32) -> ScrimResult<bool> {
        if fraction.is_nan() {
            return Err(ScrimError::InvalidArgument("fraction should not be NaN"));
        }
        if self.panel_expansion == fraction {
            return Ok(false);
        }
        self.panel_expansion = fraction;
        Ok(true)
    }

    /// Update the quick settings fraction. Returns whether the value changed.
    ///
    /// Unlike the panel fraction, NaN is ignored here.
    pub fn set_qs_expansion(&mut self, fraction: f32) -> bool {
        if fraction.is_nan() || self.qs_expansion == fraction {
            return false;
        }
        self.qs_expansion = fraction;
        true
    }

    /// A drag started; darkening is used unless the lock screen can be dismissed.
    pub fn on_tracking_started(&mut self, can_dismiss_lock_screen: bool) {
        self.tracking = true;
        self.darken_while_dragging = !can_dismiss_lock_screen;
    }

    pub fn on_expanding_finished(&mut self) {
        self.tracking = false;
    }

    /// Eased panel fraction.
    pub fn interpolated_fraction(&self) -> f32 {
        eased_fraction(self.panel_expansion)
    }

    /// Overlay the gesture-driven opacities and behind tint onto `alpha` and `tint`.
    ///
    /// States that do not track the shade are left untouched.
    pub fn apply(
        &self,
        state: ScrimState,
        catalog: &StateCatalog,
        alpha: &mut PerLayer<f32>,
        tint: &mut PerLayer<Color>,
    ) -> ScrimResult<()> {
        if !self.expansion_affects_alpha {
            return Ok(());
        }

        let default_alpha = catalog.default_scrim_alpha();

        if state.darkens_with_expansion() {
            let behind_fraction =
                (self.interpolated_fraction() as f64).powf(DARKEN_EXPONENT as f64) as f32;
            alpha.set(ScrimLayer::Behind, behind_fraction * default_alpha);
            alpha.set(ScrimLayer::Front, 0.0);
        } else if state.reveals_with_expansion() {
            let interpolated = self.interpolated_fraction();
            let state_behind = catalog.behind_alpha(state);
            let start = if self.darken_while_dragging {
                default_alpha
            } else {
                0.0
            };
            let mut behind = lerp(start, state_behind, interpolated);
            let mut behind_tint = catalog
                .behind_tint(ScrimState::Bouncer)
                .blend(catalog.behind_tint(state), interpolated);

            if self.qs_expansion > 0.0 {
                behind = lerp(behind, default_alpha, self.qs_expansion);
                behind_tint =
                    behind_tint.blend(catalog.behind_tint(ScrimState::ShadeLocked), self.qs_expansion);
            }

            alpha.set(ScrimLayer::Behind, behind);
            alpha.set(ScrimLayer::Front, catalog.front_alpha(state));
            tint.set(ScrimLayer::Behind, behind_tint);
        }

        let front = *alpha.get(ScrimLayer::Front);
        let behind = *alpha.get(ScrimLayer::Behind);
        if front.is_nan() || behind.is_nan() {
            return Err(ScrimError::NanOpacity {
                state,
                front,
                behind,
            });
        }
        Ok(())
    }

    /// Opacity of the notifications scrim for a quick settings position.
    ///
    /// Hidden while the panel bottom is off screen. In the unlocked and shade-locked
    /// states it follows the shade, elsewhere it follows `qs_fraction`.
    pub fn notifications_alpha(
        &self,
        state: ScrimState,
        qs_fraction: f32,
        qs_panel_bottom_y: i32,
    ) -> f32 {
        if qs_panel_bottom_y <= 0 {
            return 0.0;
        }
        let amount = match state {
            ScrimState::Unlocked | ScrimState::ShadeLocked => self.interpolated_fraction(),
            _ => qs_fraction,
        };
        lerp(0.0, 1.0, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::test_constants::*;
    use crate::common::constants::KEYGUARD_SCRIM_ALPHA;
    use crate::state::DozeParameters;

    fn catalog() -> StateCatalog {
        StateCatalog::new(TEST_DEFAULT_SCRIM_ALPHA, KEYGUARD_SCRIM_ALPHA, DozeParameters::default())
    }

    fn targets(catalog: &StateCatalog, state: ScrimState) -> (PerLayer<f32>, PerLayer<Color>) {
        let descriptor = catalog.descriptor(state, ScrimState::Uninitialized);
        (descriptor.alpha, descriptor.tint)
    }

    #[test]
    fn test_eased_fraction_endpoints() {
        assert_eq!(eased_fraction(0.0), 0.0);
        assert_eq!(eased_fraction(1.0), 1.0);
    }

    #[test]
    fn test_eased_fraction_dead_zone() {
        // The first sixth of the drag does nothing
        assert_eq!(eased_fraction(0.1), 0.0);
        assert_eq!(eased_fraction(0.16666), 0.0);
        assert!(eased_fraction(0.1667).abs() < 1e-6);
        assert!(eased_fraction(0.5) > 0.0);
    }

    #[test]
    fn test_eased_fraction_is_monotonic() {
        let mut previous = 0.0;
        for step in 0..=100 {
            let value = eased_fraction(step as f32 / 100.0);
            assert!(value >= previous, "curve decreased at step {step}");
            previous = value;
        }
    }

    #[test]
    fn test_darken_state_endpoints() {
        let catalog = catalog();
        let mut model = ExpansionModel::new(true);
        let (mut alpha, mut tint) = targets(&catalog, ScrimState::Unlocked);

        model.set_panel_expansion(0.0).unwrap();
        model.apply(ScrimState::Unlocked, &catalog, &mut alpha, &mut tint).unwrap();
        assert_eq!(*alpha.get(ScrimLayer::Behind), 0.0);
        assert_eq!(*alpha.get(ScrimLayer::Front), 0.0);

        model.set_panel_expansion(1.0).unwrap();
        model.apply(ScrimState::Unlocked, &catalog, &mut alpha, &mut tint).unwrap();
        assert!((*alpha.get(ScrimLayer::Behind) - TEST_DEFAULT_SCRIM_ALPHA).abs() < TEST_EPSILON);
    }

    #[test]
    fn test_reveal_state_darken_while_dragging() {
        let catalog = catalog();
        let mut model = ExpansionModel::new(true);
        model.set_panel_expansion(0.0).unwrap();

        let (mut alpha, mut tint) = targets(&catalog, ScrimState::Keyguard);
        model.apply(ScrimState::Keyguard, &catalog, &mut alpha, &mut tint).unwrap();
        // Collapsed shade on a secure keyguard shows the bouncer-like dim
        assert_eq!(*alpha.get(ScrimLayer::Behind), TEST_DEFAULT_SCRIM_ALPHA);
        assert_eq!(*tint.get(ScrimLayer::Behind), Color::TRANSPARENT);

        model.set_panel_expansion(1.0).unwrap();
        model.apply(ScrimState::Keyguard, &catalog, &mut alpha, &mut tint).unwrap();
        assert!((*alpha.get(ScrimLayer::Behind) - KEYGUARD_SCRIM_ALPHA).abs() < TEST_EPSILON);
        assert_eq!(*tint.get(ScrimLayer::Behind), Color::BLACK);
    }

    #[test]
    fn test_reveal_state_without_darkening() {
        let catalog = catalog();
        let mut model = ExpansionModel::new(true);
        model.on_tracking_started(true);
        assert!(model.is_tracking());
        model.set_panel_expansion(0.0).unwrap();

        let (mut alpha, mut tint) = targets(&catalog, ScrimState::Keyguard);
        model.apply(ScrimState::Keyguard, &catalog, &mut alpha, &mut tint).unwrap();
        assert_eq!(*alpha.get(ScrimLayer::Behind), 0.0);
    }

    #[test]
    fn test_qs_expansion_blends_toward_default() {
        let catalog = catalog();
        let mut model = ExpansionModel::new(false);
        model.set_panel_expansion(1.0).unwrap();
        assert!(model.set_qs_expansion(1.0));

        let (mut alpha, mut tint) = targets(&catalog, ScrimState::Keyguard);
        model.apply(ScrimState::Keyguard, &catalog, &mut alpha, &mut tint).unwrap();
        assert!((*alpha.get(ScrimLayer::Behind) - TEST_DEFAULT_SCRIM_ALPHA).abs() < TEST_EPSILON);
        assert_eq!(*tint.get(ScrimLayer::Behind), Color::BLACK);
    }

    #[test]
    fn test_nan_policies_differ() {
        let mut model = ExpansionModel::new(true);
        assert!(matches!(
            model.set_panel_expansion(f32::NAN),
            Err(ScrimError::InvalidArgument(_))
        ));
        assert!(!model.set_qs_expansion(f32::NAN));
        assert_eq!(model.qs_expansion(), 0.0);
    }

    #[test]
    fn test_expansion_disabled_leaves_targets() {
        let catalog = catalog();
        let mut model = ExpansionModel::new(true);
        model.set_expansion_affects_alpha(false);
        model.set_panel_expansion(0.0).unwrap();

        let (mut alpha, mut tint) = targets(&catalog, ScrimState::Keyguard);
        model.apply(ScrimState::Keyguard, &catalog, &mut alpha, &mut tint).unwrap();
        assert_eq!(*alpha.get(ScrimLayer::Behind), KEYGUARD_SCRIM_ALPHA);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let catalog = catalog();
        let mut model = ExpansionModel::new(true);
        model.set_panel_expansion(0.42).unwrap();
        model.set_qs_expansion(0.3);

        let (mut first_alpha, mut first_tint) = targets(&catalog, ScrimState::ShadeLocked);
        model
            .apply(ScrimState::ShadeLocked, &catalog, &mut first_alpha, &mut first_tint)
            .unwrap();
        let (mut second_alpha, mut second_tint) = (first_alpha, first_tint);
        model
            .apply(ScrimState::ShadeLocked, &catalog, &mut second_alpha, &mut second_tint)
            .unwrap();

        assert_eq!(
            first_alpha.get(ScrimLayer::Behind).to_bits(),
            second_alpha.get(ScrimLayer::Behind).to_bits()
        );
        assert_eq!(first_tint, second_tint);
    }

    #[test]
    fn test_notifications_alpha() {
        let model = ExpansionModel::new(true);
        assert_eq!(model.notifications_alpha(ScrimState::Keyguard, 0.25, 0), 0.0);
        assert_eq!(model.notifications_alpha(ScrimState::Keyguard, 0.25, 800), 0.25);
        // Shade is fully expanded at startup
        assert_eq!(model.notifications_alpha(ScrimState::ShadeLocked, 0.25, 800), 1.0);
    }
}
