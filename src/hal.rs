//! Hardware Abstraction Layer
//!
//! Pin-level building blocks for the programmer board. The traits here are
//! what the memory driver is generic over; the STM32 implementations are
//! only compiled for the target.

pub mod data_bus;
pub mod gpio;
