//! STM32F1-specific HAL for Halyard
//!
//! This crate implements the `halyard-hal` register traits for STM32F10x
//! parts and owns the UART interrupt vectors:
//!
//! - STM32F103C8 (medium density, USART1..USART3)
//! - STM32F103RC / STM32F103ZE (high density, adds UART4 and UART5)
//!
//! # Features
//!
//! - `stm32f103c8`, `stm32f103rc`, `stm32f103ze` - Select the chip
//! - `defmt` - Enable debug formatting support
//!
//! # Usage
//!
//! Clock tree setup is left to the board. Once the bus clocks are known:
//!
//! ```ignore
//! static ECHO: Listener = Listener::from_fn(on_byte);
//!
//! let mut uart = uart_device(DeviceConfig::new(0, 115_200), Clocks::HSE_8MHZ_PLL_72MHZ);
//! uart.set_listener(&ECHO);
//! uart.tx("ready\r\n");
//! ```
//!
//! Build medium-density firmware with `HALYARD_UART_CHANNELS=3`; enabling
//! more channels than the part has UARTs fails the build.

#![cfg_attr(not(test), no_std)]

// Vector table and reset handler
use cortex_m_rt as _;

pub mod gpio;
pub mod rcc;
pub mod uart;

pub use gpio::Stm32Gpio;
pub use rcc::Clocks;
pub use uart::{uart_device, Usart, UART_COUNT};

/// LED on an STM32F1 pin
pub type Led = halyard_hal::Led<Stm32Gpio>;

/// Digital output on an STM32F1 pin
pub type DigitalOutput = halyard_hal::DigitalOutput<Stm32Gpio>;
