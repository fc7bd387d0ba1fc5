//! Frequency and offset codec
//!
//! The IC-R71 stores frequencies as nine little-endian BCD-like nibbles:
//!
//! ```text
//! nibble:  8 7 6 5 4 3 2 1 0
//!          0 0 M M k k k h t      M = MHz, k/h = kHz and 100 Hz, t = 10 Hz
//! ```
//!
//! Arithmetic happens on the 100 Hz accumulator (nibbles 1-4). The 10 Hz
//! digit (nibble 0) never takes part in offset correction or carries; it is
//! appended to the rendered value as an extra decimal, the way the radio's
//! own display behaves.

use core::fmt;

use crate::config::FREQUENCY_NIBBLES;
use crate::types::Nibble;

/// Span of the sub-MHz accumulator in 100 Hz units
const SUB_MHZ_SPAN: i16 = 10_000;

/// Signed per-mode frequency correction, in 0.1 kHz units
///
/// Stored as two BCD nibbles; bit 3 of the high nibble is the sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Offset {
    low: Nibble,
    high: Nibble,
}

impl Offset {
    /// No correction
    pub const ZERO: Self = Self {
        low: Nibble::MIN,
        high: Nibble::MIN,
    };

    /// Build an offset from its stored nibbles
    #[must_use]
    pub const fn from_nibbles(low: Nibble, high: Nibble) -> Self {
        Self { low, high }
    }

    /// Check the sign bit
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.high.bit(3)
    }

    /// kHz digit (high nibble without the sign bit)
    #[must_use]
    pub const fn khz_digit(self) -> u8 {
        self.high.value() & 0b111
    }

    /// 0.1 kHz digit
    #[must_use]
    pub const fn tenths_digit(self) -> u8 {
        self.low.value()
    }

    /// Signed value in 0.1 kHz (= 100 Hz) units
    #[must_use]
    pub const fn tenths_khz(self) -> i16 {
        let magnitude = (self.khz_digit() as i16) * 10 + self.tenths_digit() as i16;
        if self.is_negative() {
            -magnitude
        } else {
            magnitude
        }
    }
}

/// Renders `-D.D kHz`, or ` D.D kHz` for non-negative offsets
impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.tenths_khz() < 0 { '-' } else { ' ' };
        write!(
            f,
            "{sign}{}.{} kHz",
            self.khz_digit(),
            self.tenths_digit()
        )
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Offset {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=i16} x100Hz", self.tenths_khz());
    }
}

/// Decode a stored offset into 0.1 kHz units
///
/// No range validation; `hi >= 8` negates the value.
#[must_use]
pub const fn decode_offset(low: Nibble, high: Nibble) -> i16 {
    Offset::from_nibbles(low, high).tenths_khz()
}

/// Raw nine-nibble frequency field, in storage (address) order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrequencyField(pub [Nibble; FREQUENCY_NIBBLES]);

impl FrequencyField {
    /// Build a field from raw values; each is truncated to 4 bits
    #[must_use]
    pub fn from_values(values: [u8; FREQUENCY_NIBBLES]) -> Self {
        Self(values.map(Nibble::from_low_bits))
    }

    /// Check the "unprogrammed channel" marker
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0[0] == Nibble::MAX
    }

    fn digit(&self, index: usize) -> i16 {
        i16::from(self.0[index].value())
    }

    /// Decode with a per-mode offset; see [`decode_frequency`]
    #[must_use]
    pub fn decode(&self, offset: Offset) -> Option<ChannelFrequency> {
        decode_frequency(self, offset.tenths_khz())
    }
}

/// A decoded channel frequency
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelFrequency {
    /// Whole MHz after carry/borrow correction
    mhz: i16,
    /// Sub-MHz part in 100 Hz units, always in `0..10_000`
    hundred_hz: i16,
    /// 10 Hz display digit, copied verbatim from the field
    ten_hz: u8,
}

impl ChannelFrequency {
    /// Whole MHz
    #[must_use]
    pub const fn mhz(&self) -> i16 {
        self.mhz
    }

    /// Sub-MHz accumulator in 100 Hz units
    #[must_use]
    pub const fn hundred_hz(&self) -> i16 {
        self.hundred_hz
    }

    /// Trailing 10 Hz display digit
    #[must_use]
    pub const fn ten_hz(&self) -> u8 {
        self.ten_hz
    }

    /// Whole kHz within the MHz
    #[must_use]
    pub const fn khz(&self) -> i16 {
        self.hundred_hz / 10
    }

    /// Two decimals after the kHz point: 100 Hz digit then the 10 Hz digit
    #[must_use]
    pub const fn khz_decimals(&self) -> i16 {
        (self.hundred_hz % 10) * 10 + self.ten_hz as i16
    }

    /// Approximate value in Hz
    #[must_use]
    pub const fn as_hz(&self) -> i32 {
        self.mhz as i32 * 1_000_000 + self.hundred_hz as i32 * 100 + self.ten_hz as i32 * 10
    }
}

/// Renders `MM KKK.DD` (the caller appends the unit)
impl fmt::Display for ChannelFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:2} {:03}.{:02}",
            self.mhz,
            self.khz(),
            self.khz_decimals()
        )
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ChannelFrequency {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{=i16} MHz {=i16}.{=i16} kHz",
            self.mhz,
            self.khz(),
            self.khz_decimals()
        );
    }
}

/// Decode a frequency field, applying `offset` (0.1 kHz units)
///
/// Returns `None` for a blank channel. A single carry or borrow step keeps
/// the accumulator in range because offsets never exceed ±7.9 kHz.
#[must_use]
pub fn decode_frequency(field: &FrequencyField, offset: i16) -> Option<ChannelFrequency> {
    if field.is_blank() {
        return None;
    }

    let mut mhz = field.digit(6) * 10 + field.digit(5);
    let mut hundred_hz =
        field.digit(4) * 1000 + field.digit(3) * 100 + field.digit(2) * 10 + field.digit(1);

    hundred_hz += offset;
    if hundred_hz >= SUB_MHZ_SPAN {
        hundred_hz -= SUB_MHZ_SPAN;
        mhz += 1;
    } else if hundred_hz < 0 {
        hundred_hz += SUB_MHZ_SPAN;
        mhz -= 1;
    }

    Some(ChannelFrequency {
        mhz,
        hundred_hz,
        ten_hz: field.0[0].value(),
    })
}
