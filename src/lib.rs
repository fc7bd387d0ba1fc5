//! IC-R71 Programmer Firmware Library
//!
//! This library provides the core functionality of a serial programmer for
//! the configuration RAM of the Icom IC-R71 receiver. The RAM holds 1024
//! nibbles and is addressed through a CD4040 ripple counter, so every
//! access is a forward walk from address zero.
//!
//! # Architecture
//!
//! The firmware is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  Programmer (Read / Program / Verify / List)  │  Console     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      CODEC LAYER                             │
//! │  N2CBU records  │  Memory map  │  Frequency/offset codec     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / DRIVER LAYER                         │
//! │  Sequential memory driver  │  Nibble bus  │  GPIO  │  UART   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Advance-only addressing**: the memory is a cursor with reset and
//!   advance, never an indexable array
//! - **Streaming**: the image is never held in RAM; records and channels are
//!   decoded as the walk passes them
//! - **No unsafe in application code**: hardware access goes through
//!   `embedded-hal` traits and embassy drivers
//! - **Explicit error handling**: only the serial transport can fail, and
//!   those failures are returned as `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Must come first so the logging macros are visible everywhere
#[macro_use]
mod fmt;

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// Nibble bus and GPIO wrappers.
pub mod hal;

/// Peripheral Drivers
///
/// The sequential RAM driver behind the address counter.
pub mod drivers;

/// Frequency and offset codec
pub mod frequency;

/// Memory map interpreter for the List command
pub mod memory_map;

/// N2CBU text transport format
pub mod protocol;

/// Serial line editor with XON/XOFF flow control
pub mod console;

/// Command dispatcher and the four operations
pub mod programmer;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::drivers::r71_memory::{ControlPins, R71Memory, SequentialMemory};
    pub use crate::hal::data_bus::NibbleBus;
    pub use crate::protocol::LineSource;

    // Common traits
    pub use embedded_hal::delay::DelayNs;
    pub use embedded_hal::digital::OutputPin;

    // Embassy
    #[cfg(feature = "embedded")]
    pub use embassy_time::{Delay, Duration, Timer};

    // Error handling
    pub use core::result::Result;

    // Logging
    #[cfg(feature = "embedded")]
    pub use defmt::{debug, error, info, trace, warn};
}
