//! Signals emitted by the controller.

use serde::Serialize;
use std::fmt;

use crate::common::color::GradientColors;
use crate::state::ScrimState;

/// Coarse visibility of the front and behind scrims together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrimVisibility {
    /// Both layers fully transparent.
    Transparent,
    /// Neither layer opaque, at least one partially visible.
    SemiTransparent,
    /// At least one layer fully opaque.
    Opaque,
}

impl ScrimVisibility {
    /// Classify a pair of rendered opacities.
    pub fn classify(front_alpha: f32, behind_alpha: f32) -> Self {
        if front_alpha == 1.0 || behind_alpha == 1.0 {
            ScrimVisibility::Opaque
        } else if front_alpha == 0.0 && behind_alpha == 0.0 {
            ScrimVisibility::Transparent
        } else {
            ScrimVisibility::SemiTransparent
        }
    }
}

impl fmt::Display for ScrimVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrimVisibility::Transparent => write!(f, "transparent"),
            ScrimVisibility::SemiTransparent => write!(f, "semi-transparent"),
            ScrimVisibility::Opaque => write!(f, "opaque"),
        }
    }
}

/// Remembers the last reported category so that only changes are reported.
#[derive(Debug, Default)]
pub struct VisibilityTracker {
    last: Option<ScrimVisibility>,
}

impl VisibilityTracker {
    pub fn current(&self) -> Option<ScrimVisibility> {
        self.last
    }

    /// Returns the new category if it differs from the last one observed.
    pub fn observe(&mut self, front_alpha: f32, behind_alpha: f32) -> Option<ScrimVisibility> {
        let visibility = ScrimVisibility::classify(front_alpha, behind_alpha);
        if self.last == Some(visibility) {
            return None;
        }
        self.last = Some(visibility);
        Some(visibility)
    }
}

/// Receives `(state, behind alpha, front palette)` every time the state is dispatched.
pub type StateListener = Box<dyn FnMut(ScrimState, f32, GradientColors)>;

/// Receives the visibility category whenever it changes.
pub type VisibilityListener = Box<dyn FnMut(ScrimVisibility)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_only_category_changes() {
        let mut tracker = VisibilityTracker::default();
        let reported: Vec<_> = [0.0, 0.0, 0.3, 0.3, 1.0, 1.0, 0.0]
            .into_iter()
            .filter_map(|alpha| tracker.observe(0.0, alpha))
            .collect();

        assert_eq!(
            reported,
            vec![
                ScrimVisibility::Transparent,
                ScrimVisibility::SemiTransparent,
                ScrimVisibility::Opaque,
                ScrimVisibility::Transparent,
            ]
        );
    }

    #[test]
    fn test_either_layer_makes_it_opaque() {
        assert_eq!(ScrimVisibility::classify(1.0, 0.2), ScrimVisibility::Opaque);
        assert_eq!(ScrimVisibility::classify(0.2, 1.0), ScrimVisibility::Opaque);
        assert_eq!(
            ScrimVisibility::classify(0.0, 0.01),
            ScrimVisibility::SemiTransparent
        );
    }
}
