//! IC-R71 Configuration RAM Driver
//!
//! The radio's RAM has no address pins reachable from the programmer.
//! Address lines AD0-AD9 are fed by a CD4040 ripple counter that can only
//! be cleared or clocked forward, so every access is a sequential walk from
//! address zero. This driver owns the counter, the nibble bus and the RAM
//! control strobes and exposes exactly that cursor model.
//!
//! Connections:
//!
//! ```text
//! AD0..AD9   Q1..Q10 of CD4040
//! /CE (AD10) chip enable, pulled up
//! /WR        write strobe, pulled up
//! /WP        write protect, high = writes allowed
//! DB0..DB3   nibble data bus
//! CLK, RST   CD4040 clock and reset (reset high holds the counter at 0)
//! ```

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::{
    CHIP_ENABLE_SETTLE_US, COUNTER_PULSE_US, POWER_UP_SETTLE_MS, RESET_PULSE_US, WRITE_STROBE_US,
};
use crate::hal::data_bus::{BusDirection, NibbleBus};
use crate::hal::gpio::{drive, ActivityLed, LedState};
use crate::types::{Address, Nibble};

/// Advance-only access to a nibble-wide memory
///
/// There is no seek. The position is the number of advances since the last
/// [`reset`](Self::reset), and reaching an offset means reading (and
/// discarding) every nibble before it. None of the operations can fail;
/// data integrity is only established by reading back.
pub trait SequentialMemory {
    /// Clear the address counter to zero and start a session
    fn reset(&mut self);

    /// Configure the bus for sampling
    fn enter_read_mode(&mut self);

    /// Configure the bus for driving
    fn enter_write_mode(&mut self);

    /// Sample the nibble at the cursor, then advance
    fn read_advance(&mut self) -> Nibble;

    /// Store a nibble at the cursor, then advance
    fn write_advance(&mut self, nibble: Nibble);

    /// Advance without touching the nibble at the cursor
    ///
    /// Works in either bus direction; the RAM is never selected.
    fn advance(&mut self);

    /// Assert (`true`) or release (`false`) the RAM write protection
    fn set_write_protect(&mut self, protected: bool);

    /// End a session: counter held in reset, writes protected, bus released
    fn release(&mut self);

    /// Advances issued since the last reset
    fn position(&self) -> Address;

    /// Read and discard nibbles until the cursor reaches `target`
    ///
    /// Does nothing if the cursor is already at or past `target`.
    fn skip_to(&mut self, target: Address) {
        for _ in 0..self.position().distance_to(target) {
            self.read_advance();
        }
    }
}

/// RAM control lines
pub struct ControlPins<CE, WR, WP, CLK, RST, LED> {
    /// /CE, active low
    pub chip_enable: CE,
    /// /WR, active low
    pub write_strobe: WR,
    /// /WP, low = protected
    pub write_protect: WP,
    /// Counter clock, advances on the rising edge
    pub counter_clock: CLK,
    /// Counter reset, high holds the counter at zero
    pub counter_reset: RST,
    /// Activity LED
    pub led: LED,
}

/// IC-R71 RAM behind a CD4040 address counter
pub struct R71Memory<BUS, CE, WR, WP, CLK, RST, LED, D> {
    bus: BUS,
    chip_enable: CE,
    write_strobe: WR,
    write_protect: WP,
    counter_clock: CLK,
    counter_reset: RST,
    led: ActivityLed<LED>,
    delay: D,
    direction: BusDirection,
    position: Address,
    write_protected: bool,
}

impl<BUS, CE, WR, WP, CLK, RST, LED, D> R71Memory<BUS, CE, WR, WP, CLK, RST, LED, D>
where
    BUS: NibbleBus,
    CE: OutputPin<Error = Infallible>,
    WR: OutputPin<Error = Infallible>,
    WP: OutputPin<Error = Infallible>,
    CLK: OutputPin<Error = Infallible>,
    RST: OutputPin<Error = Infallible>,
    LED: OutputPin<Error = Infallible>,
    D: DelayNs,
{
    /// Take over the pins and put them in the idle state
    ///
    /// Idle: chip deselected, counter clock low and held in reset, bus
    /// released, /WR high, writes protected, LED off.
    pub fn new(bus: BUS, pins: ControlPins<CE, WR, WP, CLK, RST, LED>, delay: D) -> Self {
        let mut memory = Self {
            bus,
            chip_enable: pins.chip_enable,
            write_strobe: pins.write_strobe,
            write_protect: pins.write_protect,
            counter_clock: pins.counter_clock,
            counter_reset: pins.counter_reset,
            led: ActivityLed::new(pins.led),
            delay,
            direction: BusDirection::Input,
            position: Address::START,
            write_protected: true,
        };

        drive(&mut memory.chip_enable, true);
        drive(&mut memory.counter_clock, false);
        drive(&mut memory.counter_reset, true);
        memory.enter_read_mode();
        memory.delay.delay_ms(POWER_UP_SETTLE_MS);
        memory.set_write_protect(true);

        debug!("R71 memory idle");
        memory
    }

    /// Current bus direction
    #[must_use]
    pub const fn direction(&self) -> BusDirection {
        self.direction
    }

    /// Whether writes are currently blocked by /WP
    #[must_use]
    pub const fn is_write_protected(&self) -> bool {
        self.write_protected
    }

    /// Activity LED state
    #[must_use]
    pub const fn led_state(&self) -> LedState {
        self.led.state()
    }

    /// Clock the CD4040 forward by one
    fn pulse_counter(&mut self) {
        debug_assert!(
            self.position.is_in_image(),
            "advance past the end of the image"
        );
        drive(&mut self.counter_clock, true);
        self.delay.delay_us(COUNTER_PULSE_US);
        drive(&mut self.counter_clock, false);
        self.delay.delay_us(COUNTER_PULSE_US);
        self.position = self.position.next();
    }
}

impl<BUS, CE, WR, WP, CLK, RST, LED, D> SequentialMemory
    for R71Memory<BUS, CE, WR, WP, CLK, RST, LED, D>
where
    BUS: NibbleBus,
    CE: OutputPin<Error = Infallible>,
    WR: OutputPin<Error = Infallible>,
    WP: OutputPin<Error = Infallible>,
    CLK: OutputPin<Error = Infallible>,
    RST: OutputPin<Error = Infallible>,
    LED: OutputPin<Error = Infallible>,
    D: DelayNs,
{
    fn reset(&mut self) {
        self.led.on();
        drive(&mut self.counter_reset, true);
        self.delay.delay_us(RESET_PULSE_US);
        drive(&mut self.counter_reset, false);
        self.position = Address::START;
    }

    fn enter_read_mode(&mut self) {
        self.bus.set_input();
        drive(&mut self.write_strobe, true);
        self.direction = BusDirection::Input;
    }

    fn enter_write_mode(&mut self) {
        drive(&mut self.write_strobe, true);
        self.bus.set_output();
        self.direction = BusDirection::Output;
    }

    fn read_advance(&mut self) -> Nibble {
        debug_assert_eq!(self.direction, BusDirection::Input, "read in write mode");

        drive(&mut self.chip_enable, false);
        self.delay.delay_us(CHIP_ENABLE_SETTLE_US);
        let nibble = self.bus.read();
        drive(&mut self.chip_enable, true);

        self.pulse_counter();
        nibble
    }

    fn write_advance(&mut self, nibble: Nibble) {
        debug_assert_eq!(self.direction, BusDirection::Output, "write in read mode");

        self.bus.write(nibble);
        drive(&mut self.chip_enable, false);
        drive(&mut self.write_strobe, false);
        self.delay.delay_us(WRITE_STROBE_US);
        drive(&mut self.write_strobe, true);
        self.delay.delay_us(WRITE_STROBE_US);
        drive(&mut self.chip_enable, true);

        self.pulse_counter();
    }

    fn advance(&mut self) {
        self.pulse_counter();
    }

    fn set_write_protect(&mut self, protected: bool) {
        drive(&mut self.write_protect, !protected);
        self.write_protected = protected;
    }

    fn release(&mut self) {
        drive(&mut self.counter_reset, true);
        self.set_write_protect(true);
        self.enter_read_mode();
        self.led.off();
        self.position = Address::START;
    }

    fn position(&self) -> Address {
        self.position
    }
}
