//! Halyard Hardware Abstraction Layer
//!
//! Board-agnostic half of the Halyard HAL. Maps fixed peripherals onto
//! logical handles: digital outputs by [`gpio::Pin`], UARTs by
//! [`channel::ChannelId`]. Chip-specific crates implement the register
//! traits and own the interrupt vectors.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application                            │
//! └─────────────────────────────────────────┘
//!          │ UartDevice, Led
//!          ▼
//! ┌─────────────────────────────────────────┐
//! │  halyard-hal (this crate)               │
//! │  descriptors · channel · dispatch table │
//! └─────────────────────────────────────────┘
//!          │ UartRegisters, GpioDriver
//!          ▼
//! ┌─────────────────────────────────────────┐
//! │  halyard-hal-stm32f1                    │
//! │  registers · interrupt handlers         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Receive path
//!
//! [`device::UartDevice::set_listener`] stores a [`registry::Listener`] in
//! the global [`registry::REGISTRY`] and then arms the receive interrupt.
//! The chip crate's handler calls [`registry::on_interrupt`], which reads
//! the byte and runs the listener inside the interrupt.
//!
//! # Configuration
//!
//! `HALYARD_UART_CHANNELS` (1..=5, default 5) sets how many descriptor table
//! entries are usable and sizes the dispatch registry.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod channel;
pub mod device;
pub mod gpio;
pub mod led;
pub mod registry;
pub mod uart;

#[cfg(test)]
mod sim;

// Re-export key types at crate root for convenience
pub use channel::{ChannelDescriptor, ChannelError, ChannelId, UartInstance, ENABLED_CHANNELS};
pub use device::{DeviceConfig, UartDevice};
pub use gpio::{DigitalOutput, GpioDriver, Pin, PinMode, Polarity, Port};
pub use led::{Led, LedConfig};
pub use registry::{on_interrupt, DispatchRegistry, Listener, REGISTRY};
pub use uart::{UartChannel, UartConfig, UartRegisters};
