//! Colour triples used by banner palettes.

use serde::{Deserialize, Serialize};

/// Largest palette a banner record may store.
pub const MAX_STORED_PALETTE: usize = 9;

/// An sRGB colour.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Sum of the three channels, used as a cheap vibrancy proxy.
    pub fn intensity(&self) -> u16 {
        self.r as u16 + self.g as u16 + self.b as u16
    }

    /// CSS `rgba()` with the given alpha.
    pub fn css_rgba(&self, alpha: f32) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}
