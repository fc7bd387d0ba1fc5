//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the IC-R71 programmer.
//! Memory geometry, pin mappings, serial settings and bus timings are
//! centralized here.

use crate::types::{Address, HexPolicy};

/// Number of nibbles in the IC-R71 configuration RAM
pub const MEMORY_NIBBLES: u16 = 0x400;

/// Nibbles carried by one N2CBU record line
pub const RECORD_NIBBLES: usize = 64;

/// Characters kept per edited console line
pub const LINE_CAPACITY: usize = 80;

/// UART baud rate (8-N-1)
pub const UART_BAUD_RATE: u32 = 57_600;

/// XON: resume sending
pub const XON: u8 = 0x11;

/// XOFF: pause sending
pub const XOFF: u8 = 0x13;

/// Settle time between /CE falling and sampling the data bus
pub const CHIP_ENABLE_SETTLE_US: u32 = 10;

/// Width of the /WR strobe and the hold time after it
pub const WRITE_STROBE_US: u32 = 5;

/// Half period of the ripple counter clock pulse
pub const COUNTER_PULSE_US: u32 = 5;

/// Width of the ripple counter reset pulse
pub const RESET_PULSE_US: u32 = 5;

/// Delay after configuring the pins at power-up
pub const POWER_UP_SETTLE_MS: u32 = 10;

/// First nibble of the per-mode offset table
pub const OFFSET_TABLE_START: Address = Address::new(0x010);

/// First nibble of the band-limit pair
pub const BAND_LIMITS_START: Address = Address::new(0x02D);

/// First nibble of the VFO/memory channel table
pub const CHANNEL_TABLE_START: Address = Address::new(0x12A);

/// Modes with an entry in the offset table (LSB, USB, AM, CW, RTTY)
pub const OFFSET_TABLE_MODES: usize = 5;

/// Numbered memory channels following VFO A and VFO B
pub const MEMORY_CHANNELS: u8 = 32;

/// Opaque nibbles at the start of every channel record
pub const CHANNEL_FILLER_NIBBLES: usize = 8;

/// Nibbles in a packed frequency field
pub const FREQUENCY_NIBBLES: usize = 9;

/// Handling of non-hex characters inside N2CBU data fields
pub const DEFAULT_HEX_POLICY: HexPolicy = HexPolicy::Reject;
