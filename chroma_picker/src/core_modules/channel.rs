// THEORY (Channel Triple):
// The `ChannelTriple` is the most fundamental unit of the picker. It is a "dumb"
// value holding the red, green and blue bytes of exactly one sampled pixel, plus the
// two canonical text encodings of those bytes. Alpha never makes it this far: the
// pixel reader drops it at the buffer boundary.
//
// Key principles:
// 1) Single-pixel scope: nothing here averages, blends or looks at neighbors.
// 2) Lossless text form: `to_hex` and `from_hex` are exact inverses. Any triple
//    survives hex -> triple -> hex, and any six-digit hex survives in lowercase.
// 3) Integer luma: the Rec. 601 weights are applied in thousandths so the
//    128 threshold comparison has no floating point edge cases.

pub mod channel {
    use crate::error::HexParseError;
    use std::fmt;
    use std::str::FromStr;

    pub type Channel = u8;
    /// Rec. 601 luma scaled by 1000 (0..=255_000).
    pub type LumaMilli = u32;

    const RED_WEIGHT: LumaMilli = 299;
    const GREEN_WEIGHT: LumaMilli = 587;
    const BLUE_WEIGHT: LumaMilli = 114;
    const HEX_DIGITS: usize = 6;

    /// The (r, g, b) bytes of one sampled pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChannelTriple {
        red: Channel,
        green: Channel,
        blue: Channel,
    }

    impl ChannelTriple {
        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Self { red, green, blue }
        }

        pub const fn red(&self) -> Channel {
            self.red
        }

        pub const fn green(&self) -> Channel {
            self.green
        }

        pub const fn blue(&self) -> Channel {
            self.blue
        }

        /// `#rrggbb`, two lowercase digits per channel.
        pub fn to_hex(&self) -> String {
            format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
        }

        /// `rgb(r, g, b)` in decimal.
        pub fn to_rgb_string(&self) -> String {
            format!("rgb({}, {}, {})", self.red, self.green, self.blue)
        }

        /// Parses six hex digits, with or without a leading `#`, in either case.
        /// Surrounding whitespace is ignored; shorthand (`#f00`) is rejected.
        pub fn from_hex(input: &str) -> Result<Self, HexParseError> {
            let invalid = || HexParseError {
                input: input.to_string(),
            };
            let trimmed = input.trim();
            let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
            if digits.len() != HEX_DIGITS || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            let channel = |range: std::ops::Range<usize>| {
                Channel::from_str_radix(&digits[range], 16).map_err(|_| invalid())
            };
            Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
        }

        /// Luma in thousandths: `299r + 587g + 114b`.
        pub fn luma_milli(&self) -> LumaMilli {
            RED_WEIGHT * self.red as LumaMilli
                + GREEN_WEIGHT * self.green as LumaMilli
                + BLUE_WEIGHT * self.blue as LumaMilli
        }

        /// Luma on the 0..=255 scale, e.g. 76.245 for pure red.
        pub fn luma(&self) -> f64 {
            self.luma_milli() as f64 / 1000.0
        }
    }

    impl From<(Channel, Channel, Channel)> for ChannelTriple {
        fn from((red, green, blue): (Channel, Channel, Channel)) -> Self {
            Self::new(red, green, blue)
        }
    }

    impl From<ChannelTriple> for (Channel, Channel, Channel) {
        fn from(triple: ChannelTriple) -> Self {
            (triple.red, triple.green, triple.blue)
        }
    }

    impl FromStr for ChannelTriple {
        type Err = HexParseError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            Self::from_hex(s)
        }
    }

    impl fmt::Display for ChannelTriple {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.to_hex())
        }
    }

    /// Lowercase canonical form of a six-digit hex string.
    pub fn normalize_hex(input: &str) -> Result<String, HexParseError> {
        ChannelTriple::from_hex(input).map(|triple| triple.to_hex())
    }
}
