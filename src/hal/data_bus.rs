//! Nibble Data Bus
//!
//! The IC-R71 RAM has a 4-bit bidirectional data bus (DB0-DB3). The
//! programmer samples it with pull-ups enabled in read mode and drives all
//! four lines in write mode.

use crate::types::Nibble;

/// Direction of the data bus
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BusDirection {
    /// Lines are inputs with pull-ups; the RAM drives them
    #[default]
    Input,
    /// Lines are push-pull outputs driven by the programmer
    Output,
}

#[cfg(feature = "embedded")]
impl defmt::Format for BusDirection {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Input => defmt::write!(f, "IN"),
            Self::Output => defmt::write!(f, "OUT"),
        }
    }
}

/// A 4-bit bidirectional bus
///
/// Operations cannot fail: the bus is a set of GPIO lines with no
/// acknowledge, so a wrong value can only be caught by reading back.
pub trait NibbleBus {
    /// Release the lines (inputs with pull-ups)
    fn set_input(&mut self);

    /// Drive the lines from the programmer
    fn set_output(&mut self);

    /// Sample the lines
    fn read(&mut self) -> Nibble;

    /// Drive a value onto the lines
    fn write(&mut self, value: Nibble);
}

#[cfg(feature = "embedded")]
pub use stm32::FlexDataBus;

#[cfg(feature = "embedded")]
mod stm32 {
    use embassy_stm32::gpio::{Flex, Level, Pull, Speed};

    use super::NibbleBus;
    use crate::types::Nibble;

    /// Data bus on four flexible STM32 GPIO pins, DB0 first
    pub struct FlexDataBus<'d> {
        lines: [Flex<'d>; 4],
    }

    impl<'d> FlexDataBus<'d> {
        /// Create the bus in input mode
        #[must_use]
        pub fn new(db0: Flex<'d>, db1: Flex<'d>, db2: Flex<'d>, db3: Flex<'d>) -> Self {
            let mut bus = Self {
                lines: [db0, db1, db2, db3],
            };
            bus.set_input();
            bus
        }
    }

    impl NibbleBus for FlexDataBus<'_> {
        fn set_input(&mut self) {
            for line in &mut self.lines {
                line.set_as_input(Pull::Up);
            }
        }

        fn set_output(&mut self) {
            for line in &mut self.lines {
                line.set_as_output(Speed::Low);
            }
        }

        fn read(&mut self) -> Nibble {
            let value = self
                .lines
                .iter()
                .enumerate()
                .fold(0u8, |acc, (bit, line)| acc | (u8::from(line.is_high()) << bit));
            Nibble::from_low_bits(value)
        }

        fn write(&mut self, value: Nibble) {
            for (bit, line) in (0u8..).zip(self.lines.iter_mut()) {
                line.set_level(if value.bit(bit) { Level::High } else { Level::Low });
            }
        }
    }
}
