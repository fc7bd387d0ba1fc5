//! Peripheral Drivers
//!
//! High-level drivers for the external memory and its address counter.
//! These provide domain-specific abstractions over the HAL layer.

pub mod r71_memory;
