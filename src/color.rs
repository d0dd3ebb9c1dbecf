//! Particle color.
//!
//! One color for the whole cloud, chosen independently of shape.

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An sRGB color with 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Preset colors, cycled with the `C` key.
pub const PALETTE: [Rgb; 7] = [
    Rgb::new(0x60, 0xa5, 0xfa), // blue
    Rgb::new(0xf4, 0x72, 0xb6), // pink
    Rgb::new(0xa7, 0x8b, 0xfa), // purple
    Rgb::new(0x34, 0xd3, 0x99), // green
    Rgb::new(0xfb, 0xbf, 0x24), // amber
    Rgb::new(0xf8, 0x71, 0x71), // red
    Rgb::new(0xff, 0xff, 0xff), // white
];

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(text: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor(text.to_string());
        let hex = text.trim().strip_prefix('#').unwrap_or(text.trim());
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Linear RGBA floats for the shader.
    pub fn to_linear(self) -> [f32; 4] {
        let lin = |c: u8| {
            let c = c as f32 / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        [lin(self.r), lin(self.g), lin(self.b), 1.0]
    }

    /// Palette entry after this color, wrapping. Colors outside the palette
    /// go to the first entry.
    pub fn next_preset(self) -> Rgb {
        let next = PALETTE
            .iter()
            .position(|c| *c == self)
            .map_or(0, |i| (i + 1) % PALETTE.len());
        PALETTE[next]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        PALETTE[0]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::from_hex(s)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Rgb::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
