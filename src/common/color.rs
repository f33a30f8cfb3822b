//! ARGB colors and the gradient palette handed to scrim surfaces.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::constants::DARK_TEXT_CONTRAST_THRESHOLD;

/// A packed 32-bit ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const TRANSPARENT: Color = Color(0x0000_0000);
    pub const BLACK: Color = Color(0xFF00_0000);
    pub const WHITE: Color = Color(0xFFFF_FFFF);

    /// Build a color from its four 8-bit channels.
    pub const fn from_argb(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Color(((alpha as u32) << 24) | ((red as u32) << 16) | ((green as u32) << 8) | blue as u32)
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Blend two colors channel by channel.
    ///
    /// `ratio` 0 yields `self`, 1 yields `other`. Channels are truncated, not rounded.
    pub fn blend(self, other: Color, ratio: f32) -> Color {
        let inverse = 1.0 - ratio;
        let mix = |a: u8, b: u8| (a as f32 * inverse + b as f32 * ratio) as u8;
        Color::from_argb(
            mix(self.alpha(), other.alpha()),
            mix(self.red(), other.red()),
            mix(self.green(), other.green()),
            mix(self.blue(), other.blue()),
        )
    }

    /// Relative luminance as defined by WCAG, ignoring alpha.
    pub fn luminance(self) -> f64 {
        let linear = |channel: u8| {
            let c = channel as f64 / 255.0;
            if c < 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        0.2126 * linear(self.red()) + 0.7152 * linear(self.green()) + 0.0722 * linear(self.blue())
    }

    /// WCAG contrast ratio between two opaque colors.
    pub fn contrast(self, other: Color) -> f64 {
        let a = self.luminance() + 0.05;
        let b = other.luminance() + 0.05;
        a.max(b) / a.min(b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Palette extracted from the current theme and forwarded to every surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GradientColors {
    pub main_color: Color,
    pub secondary_color: Color,
    pub supports_dark_text: bool,
}

impl GradientColors {
    /// Derive a palette from a background and accent color.
    ///
    /// Dark text is supported when the background contrasts enough with white.
    pub fn from_theme(background: Color, accent: Color) -> Self {
        Self {
            main_color: background,
            secondary_color: accent,
            supports_dark_text: background.contrast(Color::WHITE) > DARK_TEXT_CONTRAST_THRESHOLD,
        }
    }
}
