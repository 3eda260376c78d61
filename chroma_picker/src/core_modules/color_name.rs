// THEORY:
// The name bucket is a deliberately coarse label for a color family. It is an
// ordered list of threshold rules where the first match wins, not a nearest-color
// search. Rules overlap on purpose, so the order below *is* the behavior:
//
//   White, Black, Red, Orange, Yellow, Green, Teal, Blue, Purple, Brown,
//   Red-ish, Green-ish, Blue-ish, Gray
//
// Two consequences worth knowing:
// - A light gray such as (220, 220, 220) is "White", never "Gray".
// - "Yellow" can never match: every triple it accepts is already "Orange".
//   The rule stays so the list keeps the same cut points as the product.

use crate::core_modules::channel::channel::ChannelTriple;
use serde::Serialize;
use std::fmt;

/// Coarse color-family label for a channel triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColorName {
    White,
    Black,
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    Purple,
    Brown,
    #[serde(rename = "Red-ish")]
    Reddish,
    #[serde(rename = "Green-ish")]
    Greenish,
    #[serde(rename = "Blue-ish")]
    Bluish,
    Gray,
}

impl ColorName {
    /// Applies the bucket rules in order and returns the first match.
    pub fn classify(triple: &ChannelTriple) -> Self {
        let (r, g, b) = (triple.red(), triple.green(), triple.blue());

        if r > 200 && g > 200 && b > 200 {
            return ColorName::White;
        }
        if r < 50 && g < 50 && b < 50 {
            return ColorName::Black;
        }

        if r > 200 && g < 100 && b < 100 {
            return ColorName::Red;
        }
        if r > 200 && g > 150 && b < 100 {
            return ColorName::Orange;
        }
        if r > 200 && g > 200 && b < 100 {
            return ColorName::Yellow;
        }
        if r < 100 && g > 150 && b < 100 {
            return ColorName::Green;
        }
        if r < 100 && g > 150 && b > 150 {
            return ColorName::Teal;
        }
        if r < 100 && g < 100 && b > 150 {
            return ColorName::Blue;
        }
        if r > 150 && g < 100 && b > 150 {
            return ColorName::Purple;
        }
        if r > 150 && g < 100 && b < 100 {
            return ColorName::Brown;
        }

        if r > g && r > b {
            return ColorName::Reddish;
        }
        if g > r && g > b {
            return ColorName::Greenish;
        }
        if b > r && b > g {
            return ColorName::Bluish;
        }

        ColorName::Gray
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorName::White => "White",
            ColorName::Black => "Black",
            ColorName::Red => "Red",
            ColorName::Orange => "Orange",
            ColorName::Yellow => "Yellow",
            ColorName::Green => "Green",
            ColorName::Teal => "Teal",
            ColorName::Blue => "Blue",
            ColorName::Purple => "Purple",
            ColorName::Brown => "Brown",
            ColorName::Reddish => "Red-ish",
            ColorName::Greenish => "Green-ish",
            ColorName::Bluish => "Blue-ish",
            ColorName::Gray => "Gray",
        }
    }
}

impl fmt::Display for ColorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket label for a hex string; "Unknown" when the string does not parse.
pub fn name_for_hex(hex: &str) -> &'static str {
    ChannelTriple::from_hex(hex)
        .map(|triple| ColorName::classify(&triple).as_str())
        .unwrap_or("Unknown")
}
