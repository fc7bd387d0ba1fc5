//! GPIO Abstractions
//!
//! Type-safe GPIO pin wrappers for the programmer board.
//! Provides semantic meaning to pins through the type system.

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;

/// Drive an infallible output pin
///
/// Board GPIO writes are plain register stores and cannot fail.
pub fn drive<P>(pin: &mut P, high: bool)
where
    P: OutputPin<Error = Infallible>,
{
    let Ok(()) = pin.set_state(high.into());
}

/// Status LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// LED is off
    #[default]
    Off,
    /// LED is on
    On,
}

#[cfg(feature = "embedded")]
impl defmt::Format for LedState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Off => defmt::write!(f, "OFF"),
            Self::On => defmt::write!(f, "ON"),
        }
    }
}

/// Activity LED, wired to sink current (active low)
pub struct ActivityLed<P> {
    pin: P,
    state: LedState,
}

impl<P> ActivityLed<P>
where
    P: OutputPin<Error = Infallible>,
{
    /// Create an activity LED (initially off)
    #[must_use]
    pub fn new(pin: P) -> Self {
        let mut led = Self {
            pin,
            state: LedState::Off,
        };
        led.off();
        led
    }

    /// Turn LED on
    pub fn on(&mut self) {
        drive(&mut self.pin, false);
        self.state = LedState::On;
    }

    /// Turn LED off
    pub fn off(&mut self) {
        drive(&mut self.pin, true);
        self.state = LedState::Off;
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> LedState {
        self.state
    }
}
