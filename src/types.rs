//! Shared types used across the programmer firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at compile time and provide type safety throughout the codebase.

use core::fmt;

/// A 4-bit value, the storage and transport quantum of the IC-R71 RAM
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Nibble(u8);

impl Nibble {
    /// Smallest nibble
    pub const MIN: Self = Self(0x0);

    /// Largest nibble, also the "blank" marker of a frequency field
    pub const MAX: Self = Self(0xF);

    /// Create a nibble, returns None if the value does not fit in 4 bits
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= 0xF {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create a nibble from the low 4 bits of a byte
    #[must_use]
    pub const fn from_low_bits(value: u8) -> Self {
        Self(value & 0x0F)
    }

    /// Decode a hex digit (either case)
    #[must_use]
    pub const fn from_hex_char(c: u8) -> Option<Self> {
        match c {
            b'0'..=b'9' => Some(Self(c - b'0')),
            b'A'..=b'F' => Some(Self(c - b'A' + 10)),
            b'a'..=b'f' => Some(Self(c - b'a' + 10)),
            _ => None,
        }
    }

    /// Upper-case hex digit for this nibble
    #[must_use]
    pub const fn to_hex_char(self) -> char {
        const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
        DIGITS[self.0 as usize] as char
    }

    /// Get the raw value (0-15)
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Check a single bit (0 = least significant)
    #[must_use]
    pub const fn bit(self, index: u8) -> bool {
        self.0 & (1 << index) != 0
    }
}

impl fmt::Debug for Nibble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nibble({:X})", self.0)
    }
}

impl fmt::Display for Nibble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Nibble {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=u8:X}", self.0);
    }
}

/// Position of the ripple counter, counted in advances since the last reset
///
/// Addresses are never used to seek; they only describe where a sequential
/// walk currently is. `Address::END` is the position after the last nibble.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u16);

impl Address {
    /// First nibble of the image
    pub const START: Self = Self(0);

    /// One past the last nibble of the image
    pub const END: Self = Self(crate::config::MEMORY_NIBBLES);

    /// Create an address from a raw position
    #[must_use]
    pub const fn new(position: u16) -> Self {
        Self(position)
    }

    /// Get the raw position
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Check whether a nibble exists at this position
    #[must_use]
    pub const fn is_in_image(self) -> bool {
        self.0 < crate::config::MEMORY_NIBBLES
    }

    /// Number of nibbles between this position and `target` (zero if behind)
    #[must_use]
    pub const fn distance_to(self, target: Self) -> u16 {
        target.0.saturating_sub(self.0)
    }

    /// Position after one more advance
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({:03X})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03X}", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Address {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=u16:X}", self.0);
    }
}

/// Operating mode stored in a channel record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Lower Sideband
    Lsb,
    /// Upper Sideband
    Usb,
    /// Amplitude Modulation
    Am,
    /// Continuous Wave
    Cw,
    /// Radio teletype
    Rtty,
    /// Frequency Modulation (optional FM unit)
    Fm,
}

impl Mode {
    /// All modes in storage order
    pub const ALL: [Self; 6] = [Self::Lsb, Self::Usb, Self::Am, Self::Cw, Self::Rtty, Self::Fm];

    /// Decode a mode nibble, values 6-15 are unknown
    #[must_use]
    pub const fn from_nibble(nibble: Nibble) -> Option<Self> {
        match nibble.value() {
            0 => Some(Self::Lsb),
            1 => Some(Self::Usb),
            2 => Some(Self::Am),
            3 => Some(Self::Cw),
            4 => Some(Self::Rtty),
            5 => Some(Self::Fm),
            _ => None,
        }
    }

    /// Storage index of this mode
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Lsb => 0,
            Self::Usb => 1,
            Self::Am => 2,
            Self::Cw => 3,
            Self::Rtty => 4,
            Self::Fm => 5,
        }
    }

    /// Four-column label used in listings
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Lsb => "LSB ",
            Self::Usb => "USB ",
            Self::Am => "AM  ",
            Self::Cw => "CW  ",
            Self::Rtty => "RTTY",
            Self::Fm => "FM  ",
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Mode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Lsb => defmt::write!(f, "LSB"),
            Self::Usb => defmt::write!(f, "USB"),
            Self::Am => defmt::write!(f, "AM"),
            Self::Cw => defmt::write!(f, "CW"),
            Self::Rtty => defmt::write!(f, "RTTY"),
            Self::Fm => defmt::write!(f, "FM"),
        }
    }
}

/// Slot of the channel table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelSlot {
    /// VFO A (first record)
    VfoA,
    /// VFO B (second record)
    VfoB,
    /// Memory channel 1..=32
    Memory(u8),
}

impl ChannelSlot {
    /// Iterate every slot in storage order
    pub fn all() -> impl Iterator<Item = Self> {
        [Self::VfoA, Self::VfoB]
            .into_iter()
            .chain((1..=crate::config::MEMORY_CHANNELS).map(Self::Memory))
    }

    /// Signed slot number: -1 for VFO A, 0 for VFO B, 1..=32 for memories
    #[must_use]
    pub const fn number(self) -> i8 {
        match self {
            Self::VfoA => -1,
            Self::VfoB => 0,
            Self::Memory(n) => n as i8,
        }
    }

    /// Check whether this slot closes a listing row
    #[must_use]
    pub const fn ends_row(self) -> bool {
        self.number() % 2 == 0
    }
}

impl fmt::Display for ChannelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VfoA => f.write_str("VFO  A: "),
            Self::VfoB => f.write_str("VFO  B: "),
            Self::Memory(n) => write!(f, "MEM {n:02}: "),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ChannelSlot {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::VfoA => defmt::write!(f, "VFO A"),
            Self::VfoB => defmt::write!(f, "VFO B"),
            Self::Memory(n) => defmt::write!(f, "MEM {}", n),
        }
    }
}

/// Console command, selected by the first character of a line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Dump the memory as N2CBU records
    Read,
    /// Write N2CBU records into the memory
    Program,
    /// Compare N2CBU records against the memory
    Verify,
    /// Decode and list offsets, band limits and channels
    List,
}

impl Command {
    /// Parse a command line (case-insensitive, only the first character counts)
    #[must_use]
    pub fn from_line(line: &str) -> Option<Self> {
        match line.bytes().next()?.to_ascii_uppercase() {
            b'R' => Some(Self::Read),
            b'P' => Some(Self::Program),
            b'V' => Some(Self::Verify),
            b'L' => Some(Self::List),
            _ => None,
        }
    }

    /// Name echoed when the command starts
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::Program => "Program",
            Self::Verify => "Verify",
            Self::List => "List",
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Command {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.name());
    }
}

/// What to do with a non-hex character inside an N2CBU data field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HexPolicy {
    /// Refuse the whole line; nothing is written or compared
    #[default]
    Reject,
    /// Keep the line; the bad character becomes `0xF` (sentinel truncated to 4 bits)
    Mask,
}

#[cfg(feature = "embedded")]
impl defmt::Format for HexPolicy {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Reject => defmt::write!(f, "reject"),
            Self::Mask => defmt::write!(f, "mask"),
        }
    }
}
