//! Host-side test doubles
//!
//! `SimChip` models the IC-R71 RAM together with its CD4040 address
//! counter at the pin level, so the real driver can be exercised without
//! hardware. Scripted consoles feed lines or bytes and capture output.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use r71_programmer::drivers::r71_memory::{ControlPins, R71Memory};
use r71_programmer::hal::data_bus::NibbleBus;
use r71_programmer::protocol::LineSource;
use r71_programmer::types::Nibble;

/// Nibbles in the simulated RAM
pub const IMAGE_LEN: usize = 1024;

// =============================================================================
// Simulated RAM + counter
// =============================================================================

/// Control line of the simulated chip
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Line {
    ChipEnable,
    WriteStrobe,
    WriteProtect,
    Clock,
    Reset,
    Led,
}

/// Pin-level model of the RAM and its ripple counter
#[derive(Debug)]
pub struct SimChip {
    pub mem: [u8; IMAGE_LEN],
    pub counter: u16,
    pub chip_enable: bool,
    pub write_strobe: bool,
    pub write_protect: bool,
    pub clock: bool,
    pub reset: bool,
    pub led: bool,
    pub bus_output: bool,
    pub bus_value: u8,
    /// Strobes that stored a nibble
    pub writes: usize,
    /// Strobes ignored because /WP was low
    pub blocked_writes: usize,
}

impl SimChip {
    pub fn new(image: [u8; IMAGE_LEN]) -> Self {
        Self {
            mem: image,
            counter: 0,
            chip_enable: true,
            write_strobe: true,
            write_protect: false,
            clock: false,
            reset: true,
            led: true,
            bus_output: false,
            bus_value: 0,
            writes: 0,
            blocked_writes: 0,
        }
    }

    fn drive(&mut self, line: Line, high: bool) {
        match line {
            Line::ChipEnable => self.chip_enable = high,
            Line::WriteProtect => self.write_protect = high,
            Line::Led => self.led = high,
            Line::Reset => {
                self.reset = high;
                if high {
                    self.counter = 0;
                }
            }
            Line::Clock => {
                if !self.clock && high && !self.reset {
                    self.counter = (self.counter + 1) % IMAGE_LEN as u16;
                }
                self.clock = high;
            }
            Line::WriteStrobe => {
                let rising = !self.write_strobe && high;
                if rising && !self.chip_enable && self.bus_output {
                    if self.write_protect {
                        self.mem[usize::from(self.counter)] = self.bus_value;
                        self.writes += 1;
                    } else {
                        self.blocked_writes += 1;
                    }
                }
                self.write_strobe = high;
            }
        }
    }
}

pub type SharedChip = Rc<RefCell<SimChip>>;

/// One control line wired to the simulated chip
pub struct SimPin {
    chip: SharedChip,
    line: Line,
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.chip.borrow_mut().drive(self.line, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.chip.borrow_mut().drive(self.line, true);
        Ok(())
    }
}

/// Data bus wired to the simulated chip
pub struct SimBus {
    chip: SharedChip,
}

impl NibbleBus for SimBus {
    fn set_input(&mut self) {
        self.chip.borrow_mut().bus_output = false;
    }

    fn set_output(&mut self) {
        self.chip.borrow_mut().bus_output = true;
    }

    fn read(&mut self) -> Nibble {
        let chip = self.chip.borrow();
        if chip.chip_enable {
            // Floating bus, pull-ups read as all ones
            Nibble::MAX
        } else {
            Nibble::from_low_bits(chip.mem[usize::from(chip.counter)])
        }
    }

    fn write(&mut self, value: Nibble) {
        self.chip.borrow_mut().bus_value = value.value();
    }
}

/// Delay that returns immediately
pub struct NoopDelay;

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

pub type SimMemory = R71Memory<SimBus, SimPin, SimPin, SimPin, SimPin, SimPin, SimPin, NoopDelay>;

/// Driver over a simulated chip preloaded with `image`
pub fn sim_memory_with(image: [u8; IMAGE_LEN]) -> (SharedChip, SimMemory) {
    let chip = Rc::new(RefCell::new(SimChip::new(image)));
    let pin = |line| SimPin {
        chip: Rc::clone(&chip),
        line,
    };
    let pins = ControlPins {
        chip_enable: pin(Line::ChipEnable),
        write_strobe: pin(Line::WriteStrobe),
        write_protect: pin(Line::WriteProtect),
        counter_clock: pin(Line::Clock),
        counter_reset: pin(Line::Reset),
        led: pin(Line::Led),
    };
    let bus = SimBus {
        chip: Rc::clone(&chip),
    };
    let memory = R71Memory::new(bus, pins, NoopDelay);
    (chip, memory)
}

/// Driver over a simulated chip filled with zeros
pub fn sim_memory() -> (SharedChip, SimMemory) {
    sim_memory_with([0; IMAGE_LEN])
}

/// Image where every nibble holds the low bits of its address
pub fn counting_image() -> [u8; IMAGE_LEN] {
    let mut image = [0; IMAGE_LEN];
    for (i, nibble) in image.iter_mut().enumerate() {
        *nibble = (i % 16) as u8;
    }
    image
}

// =============================================================================
// N2CBU text helpers
// =============================================================================

/// Format one record line from raw nibble values
pub fn record_line(address: u16, nibbles: &[u8]) -> String {
    let mut line = format!("{address:03X}: ");
    for &n in nibbles {
        line.push(char::from_digit(u32::from(n), 16).unwrap().to_ascii_uppercase());
    }
    line
}

/// All sixteen record lines of an image
pub fn image_lines(image: &[u8; IMAGE_LEN]) -> Vec<String> {
    image
        .chunks(64)
        .enumerate()
        .map(|(i, chunk)| record_line((i * 64) as u16, chunk))
        .collect()
}

/// Record lines found in dump output, in order
pub fn dump_records(output: &str) -> Vec<&str> {
    output
        .split("\r\n")
        .filter(|line| line.len() == 69 && line.as_bytes()[3] == b':')
        .collect()
}

// =============================================================================
// Scripted consoles
// =============================================================================

/// The script ran out of lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptEnd;

/// Line-level console: replays queued lines, captures everything written
#[derive(Default)]
pub struct ScriptedConsole {
    lines: VecDeque<String>,
    current: String,
    pub output: String,
}

impl ScriptedConsole {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            current: String::new(),
            output: String::new(),
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}

impl LineSource for ScriptedConsole {
    type Error = ScriptEnd;

    fn read_line(&mut self) -> Result<&str, Self::Error> {
        self.current = self.lines.pop_front().ok_or(ScriptEnd)?;
        Ok(&self.current)
    }
}

impl fmt::Write for ScriptedConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.output.push_str(s);
        Ok(())
    }
}

/// Byte-level receive half: replays bytes, then reports end of stream
pub struct ScriptedRx {
    bytes: VecDeque<u8>,
}

impl ScriptedRx {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.iter().copied().collect(),
        }
    }
}

impl embedded_io::ErrorType for ScriptedRx {
    type Error = Infallible;
}

impl embedded_io::Read for ScriptedRx {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match (buf.first_mut(), self.bytes.pop_front()) {
            (Some(slot), Some(byte)) => {
                *slot = byte;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

/// Byte-level transmit half: records everything sent
#[derive(Default)]
pub struct CaptureTx {
    pub sent: Vec<u8>,
    pub flushes: usize,
}

impl embedded_io::ErrorType for CaptureTx {
    type Error = Infallible;
}

impl embedded_io::Write for CaptureTx {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.sent.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }
}
