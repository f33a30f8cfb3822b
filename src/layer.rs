//! Scrim layer identities and per-layer storage.
//!
//! A layer owns no value itself. The controller keeps per-layer targets and animation
//! records in a [`PerLayer`] keyed by [`ScrimLayer`], and the surfaces stay dumb sinks
//! for alpha and tint.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the overlay layers driven by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrimLayer {
    /// In front of the notifications, used for bouncer dimming and blanking.
    Front,
    /// Behind the notifications, over the wallpaper.
    Behind,
    /// Behind the notification stack inside the shade.
    Notifications,
    /// Optional layer under an expanded auxiliary surface.
    Auxiliary,
}

impl ScrimLayer {
    /// All layers in update order.
    pub const ALL: [ScrimLayer; 4] = [
        ScrimLayer::Front,
        ScrimLayer::Behind,
        ScrimLayer::Notifications,
        ScrimLayer::Auxiliary,
    ];

    fn index(self) -> usize {
        match self {
            ScrimLayer::Front => 0,
            ScrimLayer::Behind => 1,
            ScrimLayer::Notifications => 2,
            ScrimLayer::Auxiliary => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScrimLayer::Front => "front_scrim",
            ScrimLayer::Behind => "behind_scrim",
            ScrimLayer::Notifications => "notifications_scrim",
            ScrimLayer::Auxiliary => "auxiliary_scrim",
        }
    }
}

impl fmt::Display for ScrimLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-size map from every [`ScrimLayer`] to a value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerLayer<T> {
    values: [T; 4],
}

impl<T> PerLayer<T> {
    pub fn new(front: T, behind: T, notifications: T, auxiliary: T) -> Self {
        Self {
            values: [front, behind, notifications, auxiliary],
        }
    }

    pub fn get(&self, layer: ScrimLayer) -> &T {
        &self.values[layer.index()]
    }

    pub fn get_mut(&mut self, layer: ScrimLayer) -> &mut T {
        &mut self.values[layer.index()]
    }

    pub fn set(&mut self, layer: ScrimLayer, value: T) {
        self.values[layer.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScrimLayer, &T)> {
        ScrimLayer::ALL.into_iter().zip(self.values.iter())
    }
}

impl<T: Copy> PerLayer<T> {
    /// The same value for every layer.
    pub fn splat(value: T) -> Self {
        Self { values: [value; 4] }
    }
}
