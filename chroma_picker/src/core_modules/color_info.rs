// THEORY:
// The `color_info` module is the Color Deriver. It is a pure function from a
// `ChannelTriple` to everything the display layer shows about a sample:
//
// - `ColorInfo`: the canonical hex string, the `rgb(...)` string and the name bucket.
//   It can only be built from a triple, so the three fields can never disagree.
// - `Contrast`: which foreground (black or white) stays legible on top of the color.
//   It is computed on demand and never stored.
//
// The contrast decision is the broadcast-luma heuristic (Rec. 601 weights, cut at
// 128). It is an intentional approximation, not a perceptual contrast model.

use crate::core_modules::channel::channel::ChannelTriple;
use crate::core_modules::color_name::ColorName;
use serde::Serialize;
use std::fmt;

/// Luma (0..=255 scale, in thousandths) at and above which black text is used.
const CONTRAST_LUMA_THRESHOLD_MILLI: u32 = 128_000;

/// Everything derived from one sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColorInfo {
    hex: String,
    rgb: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<ColorName>,
    #[serde(skip)]
    triple: ChannelTriple,
}

impl ColorInfo {
    pub fn hex(&self) -> &str {
        &self.hex
    }

    pub fn rgb(&self) -> &str {
        &self.rgb
    }

    pub fn name(&self) -> Option<ColorName> {
        self.name
    }

    pub fn triple(&self) -> ChannelTriple {
        self.triple
    }

    pub fn contrast(&self) -> Contrast {
        Contrast::for_triple(&self.triple)
    }
}

impl From<ChannelTriple> for ColorInfo {
    fn from(triple: ChannelTriple) -> Self {
        Self {
            hex: triple.to_hex(),
            rgb: triple.to_rgb_string(),
            name: Some(ColorName::classify(&triple)),
            triple,
        }
    }
}

/// Foreground choice for text or icons drawn over a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Contrast {
    Black,
    White,
}

impl Contrast {
    pub fn for_triple(triple: &ChannelTriple) -> Self {
        if triple.luma_milli() >= CONTRAST_LUMA_THRESHOLD_MILLI {
            Contrast::Black
        } else {
            Contrast::White
        }
    }

    /// Contrast for a hex string. Unparseable input gets black.
    pub fn for_hex(hex: &str) -> Self {
        ChannelTriple::from_hex(hex)
            .map(|triple| Self::for_triple(&triple))
            .unwrap_or(Contrast::Black)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Contrast::Black => "black",
            Contrast::White => "white",
        }
    }
}

impl fmt::Display for Contrast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_red_end_to_end() {
        let info = ColorInfo::from(ChannelTriple::new(255, 0, 0));
        assert_eq!(info.hex(), "#ff0000");
        assert_eq!(info.rgb(), "rgb(255, 0, 0)");
        assert_eq!(info.name(), Some(ColorName::Red));
        assert_eq!(info.contrast(), Contrast::White);
        assert_eq!(Contrast::for_hex(info.hex()), Contrast::White);
    }

    #[test]
    fn pure_white_end_to_end() {
        let info = ColorInfo::from(ChannelTriple::new(255, 255, 255));
        assert_eq!(info.hex(), "#ffffff");
        assert_eq!(info.name(), Some(ColorName::White));
        assert_eq!(info.contrast(), Contrast::Black);
    }

    #[test]
    fn threshold_is_inclusive_at_128() {
        // 128 * (299 + 587 + 114) = 128_000 exactly.
        assert_eq!(Contrast::for_triple(&ChannelTriple::new(128, 128, 128)), Contrast::Black);
        assert_eq!(Contrast::for_triple(&ChannelTriple::new(127, 127, 127)), Contrast::White);
    }

    #[test]
    fn contrast_is_deterministic_for_every_gray() {
        for level in 0..=255u8 {
            let hex = ChannelTriple::new(level, level, level).to_hex();
            let first = Contrast::for_hex(&hex);
            assert_eq!(first, Contrast::for_hex(&hex));
            assert_eq!(first == Contrast::Black, level >= 128);
        }
    }

    #[test]
    fn garbage_hex_falls_back_to_black() {
        assert_eq!(Contrast::for_hex("#zzzzzz"), Contrast::Black);
    }

    #[test]
    fn serializes_as_display_record() {
        let info = ColorInfo::from(ChannelTriple::new(0, 0, 255));
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "hex": "#0000ff", "rgb": "rgb(0, 0, 255)", "name": "Blue" })
        );
    }
}
