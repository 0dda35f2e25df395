// SPDX-License-Identifier: PMPL-1.0-or-later
//! Color model: computed-style color parsing, WCAG relative luminance and
//! contrast ratio.
//!
//! Computed styles always serialize colors as `rgb(r, g, b)` or
//! `rgba(r, g, b, a)`. Anything else is treated as unknown and resolved to
//! opaque black, the worst case for light backgrounds.
//! <https://www.w3.org/TR/WCAG21/#dfn-contrast-ratio>

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static RGB_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)rgba?\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*(?:,\s*([0-9]*\.?[0-9]+)\s*)?\)")
        .expect("valid regex")
});

/// An sRGB color with straight alpha
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Alpha in `[0, 1]`
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 1.0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 1.0 };
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0.0 };

    /// Opaque color from channel values
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Build a color from unchecked channel values, clamping each into range
    pub fn clamped(r: i64, g: i64, b: i64, a: f64) -> Self {
        let channel = |v: i64| v.clamp(0, 255) as u8;
        let alpha = if a.is_nan() { 1.0 } else { a.clamp(0.0, 1.0) };
        Self {
            r: channel(r),
            g: channel(g),
            b: channel(b),
            a: alpha,
        }
    }

    /// Parse `rgb()`/`rgba()` notation. Unparseable input yields opaque black.
    pub fn parse(value: &str) -> Self {
        Self::try_parse(value).unwrap_or(Self::BLACK)
    }

    /// Parse `rgb()`/`rgba()` notation, returning `None` on anything else
    pub fn try_parse(value: &str) -> Option<Self> {
        let caps = RGB_FUNCTION.captures(value.trim())?;
        // Saturate absurdly long digit runs instead of failing the parse.
        let channel = |s: &str| s.parse::<i64>().unwrap_or(i64::MAX);
        let alpha = match caps.get(4) {
            Some(m) => m.as_str().parse::<f64>().ok()?,
            None => 1.0,
        };
        Some(Self::clamped(
            channel(&caps[1]),
            channel(&caps[2]),
            channel(&caps[3]),
            alpha,
        ))
    }

    /// Same color with alpha forced to 1
    pub fn opaque(self) -> Self {
        Self { a: 1.0, ..self }
    }

    /// WCAG relative luminance of this color, ignoring alpha
    pub fn luminance(&self) -> f64 {
        relative_luminance(self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.a >= 1.0 {
            write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }
}

/// Calculate relative luminance per WCAG 2.x
pub fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    let srgb = [r, g, b].map(|c| {
        let v = c as f64 / 255.0;
        if v <= 0.03928 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    });
    0.2126 * srgb[0] + 0.7152 * srgb[1] + 0.0722 * srgb[2]
}

/// Contrast ratio between two colors, in `[1, 21]`. Argument order does not matter.
pub fn contrast_ratio(fg: Color, bg: Color) -> f64 {
    let l1 = fg.luminance();
    let l2 = bg.luminance();
    (l1.max(l2) + 0.05) / (l1.min(l2) + 0.05)
}
