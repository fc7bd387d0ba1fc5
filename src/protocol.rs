//! N2CBU Transport Format
//!
//! Memory images travel over the serial link as N2CBU text: one record per
//! 64 nibbles, each record a 3-digit hex start address, a `": "` separator
//! and 64 hex digits, one per nibble in address order.
//!
//! ```text
//! 000: 0123456789ABCDEF0123456789ABCDEF0123456789ABCDEF0123456789ABCDEF
//! ^^^  ^ data field, columns 5..69
//! ```
//!
//! On input only the leading digit (`0`-`3`) and the line length are checked.
//! Anything else (rulers, comments, short lines) is skipped silently and an
//! empty line ends the stream. Records are applied in arrival order; the
//! address label is informational only because the RAM cannot seek.
//!
//! Every framed record occupies 64 positions, including one rejected for
//! malformed hex, so record k always covers addresses 64k..64k+63.

use core::fmt::{self, Write};

use crate::config::RECORD_NIBBLES;
use crate::drivers::r71_memory::SequentialMemory;
use crate::types::{Address, HexPolicy, Nibble};

/// Value a non-hex character decodes to before any masking
pub const HEX_SENTINEL: u8 = 0xFF;

/// Blocking, line-oriented input
pub trait LineSource {
    /// Transport error
    type Error;

    /// Wait for the next line (without its terminator)
    ///
    /// An empty line is the end-of-stream marker for Program and Verify.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the underlying read fails.
    fn read_line(&mut self) -> Result<&str, Self::Error>;
}

/// Character class accepted by a field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    /// Leading digit of a record address (`0`-`3`)
    BlockDigit,
    /// Hex digit, either case
    HexDigit,
}

impl CharClass {
    /// Check a single character
    #[must_use]
    pub const fn accepts(self, c: u8) -> bool {
        match self {
            Self::BlockDigit => matches!(c, b'0'..=b'3'),
            Self::HexDigit => Nibble::from_hex_char(c).is_some(),
        }
    }
}

/// A fixed-column field of a record line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    /// First column
    pub start: usize,
    /// Number of columns
    pub width: usize,
    /// Expected characters
    pub class: CharClass,
}

impl FieldSpec {
    /// Define a field
    #[must_use]
    pub const fn new(start: usize, width: usize, class: CharClass) -> Self {
        Self {
            start,
            width,
            class,
        }
    }

    /// Column after the last one of the field
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.width
    }

    /// The field's characters, or None if the line is too short
    #[must_use]
    pub fn slice<'a>(&self, line: &'a str) -> Option<&'a [u8]> {
        line.as_bytes().get(self.start..self.end())
    }

    /// Check that the field is present and every character is in its class
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        self.slice(line)
            .is_some_and(|field| field.iter().all(|&c| self.class.accepts(c)))
    }
}

/// Outcome of classifying one input line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Empty line, end of stream
    End,
    /// Not a record (bad framing); ignored
    Skipped,
    /// Record framing but a malformed data field under [`HexPolicy::Reject`]
    Rejected(Record<'a>),
    /// A record to apply
    Data(Record<'a>),
}

/// Column layout of an N2CBU record line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordLayout {
    /// Framing check: first character of the address
    pub block: FieldSpec,
    /// Start address label
    pub address: FieldSpec,
    /// One hex digit per nibble
    pub data: FieldSpec,
}

/// The N2CBU layout: `AAA: ` then 64 data digits
pub const N2CBU_LAYOUT: RecordLayout = RecordLayout {
    block: FieldSpec::new(0, 1, CharClass::BlockDigit),
    address: FieldSpec::new(0, 3, CharClass::HexDigit),
    data: FieldSpec::new(5, RECORD_NIBBLES, CharClass::HexDigit),
};

impl RecordLayout {
    /// Shortest line that can hold a record
    #[must_use]
    pub const fn min_len(&self) -> usize {
        self.data.end()
    }

    /// Classify a line under the given hex policy
    ///
    /// Characters past the data field are ignored.
    #[must_use]
    pub fn classify<'a>(&self, line: &'a str, policy: HexPolicy) -> LineKind<'a> {
        if line.is_empty() {
            return LineKind::End;
        }
        if line.len() < self.min_len() || !self.block.matches(line) {
            return LineKind::Skipped;
        }
        let Some(data) = self.data.slice(line) else {
            return LineKind::Skipped;
        };
        let address = self.address.slice(line).and_then(parse_address);
        let record = Record { address, data };
        if policy == HexPolicy::Reject && !self.data.matches(line) {
            return LineKind::Rejected(record);
        }
        LineKind::Data(record)
    }
}

fn parse_address(label: &[u8]) -> Option<Address> {
    label
        .iter()
        .try_fold(0u16, |acc, &c| {
            Nibble::from_hex_char(c).map(|n| (acc << 4) | u16::from(n.value()))
        })
        .map(Address::new)
}

/// A framed record line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record<'a> {
    address: Option<Address>,
    data: &'a [u8],
}

impl<'a> Record<'a> {
    /// Address label, if it is valid hex
    #[must_use]
    pub const fn address(&self) -> Option<Address> {
        self.address
    }

    /// Decoded nibbles in address order
    ///
    /// A non-hex character becomes [`HEX_SENTINEL`] truncated to 4 bits.
    pub fn nibbles(&self) -> impl Iterator<Item = Nibble> + 'a {
        self.data.iter().map(|&c| {
            Nibble::from_hex_char(c).unwrap_or(Nibble::from_low_bits(HEX_SENTINEL))
        })
    }
}

/// Write the three-line column ruler that precedes a dump
///
/// Every ruler line starts with a space, so a pasted-back dump skips them.
///
/// # Errors
///
/// Propagates output errors.
pub fn write_ruler<W: Write>(out: &mut W) -> fmt::Result {
    out.write_str("      ")?;
    for group in 1..=3 {
        write!(out, "{:14}+{group}", "")?;
    }
    out.write_str("\r\n     ")?;
    for _ in 0..RECORD_NIBBLES / 16 {
        out.write_str("0123456789ABCDEF")?;
    }
    out.write_str("\r\n     ")?;
    for _ in 0..RECORD_NIBBLES {
        out.write_char('|')?;
    }
    Ok(())
}

/// Write one record, preceded by CR LF
///
/// # Errors
///
/// Propagates output errors.
pub fn write_record<W, I>(out: &mut W, address: Address, nibbles: I) -> fmt::Result
where
    W: Write,
    I: IntoIterator<Item = Nibble>,
{
    write!(out, "\r\n{address}: ")?;
    for nibble in nibbles {
        out.write_char(nibble.to_hex_char())?;
    }
    Ok(())
}

/// Stream the whole memory as N2CBU text (ruler, records, final CR LF)
///
/// The memory must be freshly reset and in read mode.
///
/// # Errors
///
/// Propagates output errors; the memory walk stops where the error occurred.
pub fn write_dump<M, W>(memory: &mut M, out: &mut W) -> fmt::Result
where
    M: SequentialMemory,
    W: Write,
{
    write_ruler(out)?;
    while memory.position().is_in_image() {
        let address = memory.position();
        write_record(
            out,
            address,
            (0..RECORD_NIBBLES).map(|_| memory.read_advance()),
        )?;
    }
    out.write_str("\r\n")
}

/// Line counters shared by Program and Verify
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineTally {
    /// Records applied
    pub accepted: u16,
    /// Lines without record framing
    pub skipped: u16,
    /// Records refused for malformed hex
    pub rejected: u16,
}

impl LineTally {
    /// Every record was applied
    #[must_use]
    pub const fn all_accepted(&self) -> bool {
        self.rejected == 0
    }
}

/// Result of a Program session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgramReport {
    /// Input line counters
    pub lines: LineTally,
    /// Nibbles stored
    pub nibbles_written: u16,
    /// Nibbles received after the end of the image
    pub nibbles_dropped: u16,
    /// Positions stepped over unwritten for rejected records
    pub nibbles_skipped: u16,
    /// Cursor at the start of the most recent rejected record
    pub last_rejected: Option<Address>,
}

/// Result of a Verify session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Input line counters
    pub lines: LineTally,
    /// Nibbles read back and compared
    pub nibbles_compared: u16,
    /// Nibbles received after the end of the image
    pub nibbles_dropped: u16,
    /// Most recent mismatching address; earlier ones are overwritten
    pub last_mismatch: Option<Address>,
}

impl VerifyReport {
    /// No mismatch seen and every record was compared as sent
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.last_mismatch.is_none() && self.lines.all_accepted()
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ProgramReport {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "written={} dropped={} skipped={} lines={}/{}/{}",
            self.nibbles_written,
            self.nibbles_dropped,
            self.nibbles_skipped,
            self.lines.accepted,
            self.lines.skipped,
            self.lines.rejected
        );
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for VerifyReport {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "compared={} last_mismatch={} lines={}/{}/{}",
            self.nibbles_compared,
            self.last_mismatch,
            self.lines.accepted,
            self.lines.skipped,
            self.lines.rejected
        );
    }
}

/// Pull lines until the end marker, handing each framed record to `apply`
///
/// `apply` gets `false` for a record rejected for malformed hex; it must
/// still step the cursor over the record's positions.
fn for_each_record<S, F>(
    source: &mut S,
    policy: HexPolicy,
    tally: &mut LineTally,
    mut apply: F,
) -> Result<(), S::Error>
where
    S: LineSource,
    F: FnMut(&Record<'_>, bool),
{
    loop {
        let line = source.read_line()?;
        match N2CBU_LAYOUT.classify(line, policy) {
            LineKind::End => return Ok(()),
            LineKind::Skipped => tally.skipped += 1,
            LineKind::Rejected(record) => {
                tally.rejected += 1;
                apply(&record, false);
            }
            LineKind::Data(record) => {
                tally.accepted += 1;
                apply(&record, true);
            }
        }
    }
}

fn check_label<M: SequentialMemory>(memory: &M, record: &Record<'_>) {
    if let Some(label) = record.address() {
        if label != memory.position() {
            warn!(
                "record labelled {} lands at {}",
                label.as_u16(),
                memory.position().as_u16()
            );
        }
    }
}

/// Write every record from `source` into the memory, in arrival order
///
/// The memory must be freshly reset, in write mode and unprotected. Nibbles
/// past the end of the image are counted and dropped. A rejected record
/// leaves its 64 positions unwritten and the following records in place.
///
/// # Errors
///
/// Returns the transport error if reading a line fails.
pub fn program_records<M, S>(
    memory: &mut M,
    source: &mut S,
    policy: HexPolicy,
) -> Result<ProgramReport, S::Error>
where
    M: SequentialMemory,
    S: LineSource,
{
    let mut report = ProgramReport::default();
    let mut lines = LineTally::default();

    for_each_record(source, policy, &mut lines, |record, valid| {
        check_label(memory, record);
        if !valid {
            warn!(
                "malformed record at {}, left unwritten",
                memory.position().as_u16()
            );
            report.last_rejected = Some(memory.position());
        }
        for nibble in record.nibbles() {
            if !memory.position().is_in_image() {
                report.nibbles_dropped += 1;
            } else if valid {
                memory.write_advance(nibble);
                report.nibbles_written += 1;
            } else {
                memory.advance();
                report.nibbles_skipped += 1;
            }
        }
    })?;

    report.lines = lines;
    Ok(report)
}

/// Compare every record from `source` against the memory
///
/// The memory must be freshly reset and in read mode. Only the address of
/// the most recent mismatch is kept. Every position of a rejected record is
/// read and counted as a mismatch.
///
/// # Errors
///
/// Returns the transport error if reading a line fails.
pub fn verify_records<M, S>(
    memory: &mut M,
    source: &mut S,
    policy: HexPolicy,
) -> Result<VerifyReport, S::Error>
where
    M: SequentialMemory,
    S: LineSource,
{
    let mut report = VerifyReport::default();
    let mut lines = LineTally::default();

    for_each_record(source, policy, &mut lines, |record, valid| {
        check_label(memory, record);
        if !valid {
            warn!(
                "malformed record at {}, counted as mismatch",
                memory.position().as_u16()
            );
        }
        for expected in record.nibbles() {
            let address = memory.position();
            if !address.is_in_image() {
                report.nibbles_dropped += 1;
                continue;
            }
            if memory.read_advance() != expected || !valid {
                report.last_mismatch = Some(address);
            }
            report.nibbles_compared += 1;
        }
    })?;

    report.lines = lines;
    Ok(report)
}
