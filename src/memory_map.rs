//! IC-R71 Memory Map Interpreter
//!
//! Decodes the interesting regions of the RAM in one forward walk:
//!
//! | Start   | Nibbles | Contents                                          |
//! |--------:|--------:|:--------------------------------------------------|
//! | `0x010` | 5 × 2   | offset table (LSB, USB, AM, CW, RTTY)             |
//! | `0x02D` | 2 × 9   | band limits (low, high)                           |
//! | `0x12A` | 34 × 18 | VFO A, VFO B, MEM 1..32 (8 filler, mode, 9 freq)  |
//!
//! Everything between the regions is read and discarded, since the counter
//! cannot skip. The offset table decoded at the start of the walk is
//! applied to the channel frequencies at the end of the same walk.

use core::fmt::{self, Write};

use crate::config::{
    BAND_LIMITS_START, CHANNEL_FILLER_NIBBLES, CHANNEL_TABLE_START, OFFSET_TABLE_MODES,
    OFFSET_TABLE_START,
};
use crate::drivers::r71_memory::SequentialMemory;
use crate::frequency::{ChannelFrequency, FrequencyField, Offset};
use crate::types::{Address, ChannelSlot, Mode, Nibble};

/// Per-mode offsets, indexed by storage order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct OffsetTable([Offset; OFFSET_TABLE_MODES]);

impl OffsetTable {
    /// All offsets zero
    #[must_use]
    pub const fn new() -> Self {
        Self([Offset::ZERO; OFFSET_TABLE_MODES])
    }

    /// Store the offset for a mode; modes without a table entry are ignored
    pub fn set(&mut self, mode: Mode, offset: Offset) {
        if let Some(slot) = self.0.get_mut(mode.index()) {
            *slot = offset;
        }
    }

    /// Offset applied to channels in `mode`
    ///
    /// FM and unknown modes have no table entry and get no correction.
    #[must_use]
    pub fn get(&self, mode: Option<Mode>) -> Offset {
        mode.and_then(|m| self.0.get(m.index()).copied())
            .unwrap_or_default()
    }
}

/// One decoded channel table entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelRecord {
    /// Which VFO or memory
    pub slot: ChannelSlot,
    /// Raw mode nibble
    pub mode_nibble: Nibble,
    /// Decoded mode, None for values 6-15
    pub mode: Option<Mode>,
    /// Frequency after offset correction, None if the channel is blank
    pub frequency: Option<ChannelFrequency>,
}

/// A decoded region, in walk order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapEvent {
    /// One offset table entry (emitted five times)
    Offset {
        /// Mode the offset applies to
        mode: Mode,
        /// Stored correction
        offset: Offset,
    },
    /// The tuning range limits
    BandLimits {
        /// Lower limit, None if blank
        low: Option<ChannelFrequency>,
        /// Upper limit, None if blank
        high: Option<ChannelFrequency>,
    },
    /// One VFO or memory channel (emitted 34 times)
    Channel(ChannelRecord),
}

/// Single-walk interpreter state
#[derive(Clone, Debug, Default)]
pub struct MemoryMap {
    offsets: OffsetTable,
}

impl MemoryMap {
    /// Fresh interpreter with an all-zero offset table
    #[must_use]
    pub const fn new() -> Self {
        Self {
            offsets: OffsetTable::new(),
        }
    }

    /// Offsets decoded by the last walk
    #[must_use]
    pub const fn offsets(&self) -> &OffsetTable {
        &self.offsets
    }

    /// Walk the whole memory, reporting each decoded region to `on_event`
    ///
    /// The memory must be freshly reset and in read mode. On success the
    /// cursor ends at [`Address::END`].
    ///
    /// # Errors
    ///
    /// Stops at, and returns, the first error from `on_event`.
    pub fn walk<M, E, F>(&mut self, memory: &mut M, mut on_event: F) -> Result<(), E>
    where
        M: SequentialMemory,
        F: FnMut(&MapEvent) -> Result<(), E>,
    {
        memory.skip_to(OFFSET_TABLE_START);
        for mode in &Mode::ALL[..OFFSET_TABLE_MODES] {
            let low = memory.read_advance();
            let high = memory.read_advance();
            let offset = Offset::from_nibbles(low, high);
            self.offsets.set(*mode, offset);
            on_event(&MapEvent::Offset {
                mode: *mode,
                offset,
            })?;
        }

        memory.skip_to(BAND_LIMITS_START);
        let low = read_field(memory).decode(Offset::ZERO);
        let high = read_field(memory).decode(Offset::ZERO);
        on_event(&MapEvent::BandLimits { low, high })?;

        memory.skip_to(CHANNEL_TABLE_START);
        for slot in ChannelSlot::all() {
            for _ in 0..CHANNEL_FILLER_NIBBLES {
                memory.read_advance();
            }
            let mode_nibble = memory.read_advance();
            let mode = Mode::from_nibble(mode_nibble);
            let frequency = read_field(memory).decode(self.offsets.get(mode));
            on_event(&MapEvent::Channel(ChannelRecord {
                slot,
                mode_nibble,
                mode,
                frequency,
            }))?;
        }

        memory.skip_to(Address::END);
        Ok(())
    }
}

fn read_field<M: SequentialMemory>(memory: &mut M) -> FrequencyField {
    let mut field = FrequencyField::default();
    for nibble in &mut field.0 {
        *nibble = memory.read_advance();
    }
    field
}

/// A frequency column: the value with its unit, or a padded `BLANK`
struct FrequencyCell(Option<ChannelFrequency>);

impl fmt::Display for FrequencyCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(frequency) => write!(f, "{frequency} kHz "),
            None => write!(f, "BLANK{:13}", ""),
        }
    }
}

/// Render one event of the listing
///
/// Offsets are laid out three per row and channels two per row, so the
/// layout depends only on the event itself.
///
/// # Errors
///
/// Propagates output errors.
pub fn render_event<W: Write>(out: &mut W, event: &MapEvent) -> fmt::Result {
    match event {
        MapEvent::Offset { mode, offset } => {
            write!(out, "{} Offset: {offset}   ", mode.label())?;
            match mode.index() {
                2 => out.write_str("\r\n"),
                i if i + 1 == OFFSET_TABLE_MODES => out.write_str("\r\n\r\n"),
                _ => Ok(()),
            }
        }
        MapEvent::BandLimits { low, high } => write!(
            out,
            "LLimit: {}      HLimit: {}\r\n\r\n",
            FrequencyCell(*low),
            FrequencyCell(*high)
        ),
        MapEvent::Channel(record) => {
            write!(out, "{}{}", record.slot, FrequencyCell(record.frequency))?;
            if let Some(mode) = record.mode {
                out.write_str(mode.label())?;
            }
            out.write_str(if record.slot.ends_row() { "\r\n" } else { "  " })
        }
    }
}
