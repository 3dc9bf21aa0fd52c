//! UART peripheral abstractions
//!
//! [`UartRegisters`] is the register contract a chip-specific HAL fulfils for
//! one peripheral instance. [`UartChannel`] drives that contract: bring-up,
//! blocking transmit and receive-interrupt arming.
//!
//! Transmission busy-waits on the transmit-empty flag and has no timeout. A
//! stuck line hangs the caller. Avoid transmitting from a receive listener if
//! the extra interrupt latency matters.

use core::convert::Infallible;
use core::fmt;

use crate::channel::{ChannelDescriptor, ClockEnable, Irq, UartInstance};
use crate::gpio::{Pin, PinMode};

/// UART configuration
///
/// Only the baud rate is adjustable; every channel uses an 8N1 frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self { baudrate: 115_200 }
    }
}

impl UartConfig {
    pub const fn new(baudrate: u32) -> Self {
        Self { baudrate }
    }
}

/// Compute the baud rate register value for a peripheral clock
///
/// Rounds to the nearest divisor. Returns `None` when the requested rate
/// cannot be represented (zero, faster than `pclk / 16`, or a divisor that
/// overflows 16 bits).
pub const fn baud_divisor(pclk_hz: u32, baudrate: u32) -> Option<u16> {
    if baudrate == 0 {
        return None;
    }
    let div = (pclk_hz as u64 + baudrate as u64 / 2) / baudrate as u64;
    if div < 16 || div > u16::MAX as u64 {
        None
    } else {
        Some(div as u16)
    }
}

/// Register-level contract for one UART peripheral instance
///
/// Chip HALs implement this over their PAC. A value of the implementing type
/// addresses exactly one physical peripheral.
pub trait UartRegisters {
    /// Which peripheral these registers belong to
    fn instance(&self) -> UartInstance;

    /// Set a clock-enable bit on its bus
    fn enable_clock(&mut self, clock: ClockEnable);

    /// Configure a GPIO line for the peripheral
    fn configure_pin(&mut self, pin: Pin, mode: PinMode);

    /// Program the baud rate with an 8N1 frame
    fn set_format(&mut self, baudrate: u32);

    /// Turn on the peripheral with transmitter and receiver enabled
    fn enable(&mut self);

    /// Transmit data register empty flag
    fn tx_empty(&self) -> bool;

    /// Hand one byte to the transmit data register
    fn write_data(&mut self, byte: u8);

    /// Receive data register not empty flag
    fn rx_not_empty(&self) -> bool;

    /// Read the received byte, clearing the not-empty condition
    fn read_data(&mut self) -> u8;

    /// Arm the receive interrupt at the peripheral and the interrupt controller
    fn listen_rx(&mut self, irq: Irq);

    /// Disarm the receive interrupt at both levels
    fn unlisten_rx(&mut self, irq: Irq);
}

/// Lifecycle of a constructed channel
///
/// There is no way back: a listening channel stays listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// Transmit usable, receive interrupt disabled
    Initialized,
    /// Receive interrupt armed
    Listening,
}

/// One initialized UART peripheral
///
/// Owns its registers exclusively for the rest of the program. Constructing
/// two channels over the same peripheral is a contract violation.
pub struct UartChannel<R> {
    regs: R,
    irq: Irq,
    state: ChannelState,
}

impl<R: UartRegisters> UartChannel<R> {
    /// Bring up the peripheral described by `descriptor`
    ///
    /// Enables port and peripheral clocks, puts TX in alternate push-pull and
    /// RX in floating input, programs `config.baudrate` with an 8N1 frame and
    /// enables TX and RX.
    ///
    /// # Panics
    /// If `regs` addresses a different peripheral than `descriptor`.
    pub fn new(descriptor: &ChannelDescriptor, config: UartConfig, mut regs: R) -> Self {
        assert_eq!(
            regs.instance(),
            descriptor.instance,
            "registers do not match the channel descriptor"
        );

        regs.enable_clock(descriptor.tx_port_clock);
        regs.enable_clock(descriptor.rx_port_clock);
        regs.enable_clock(descriptor.clock);

        regs.configure_pin(descriptor.tx, PinMode::AlternatePushPull);
        regs.configure_pin(descriptor.rx, PinMode::InputFloating);

        regs.set_format(config.baudrate);
        regs.enable();

        Self {
            regs,
            irq: descriptor.irq,
            state: ChannelState::Initialized,
        }
    }

    /// Arm the receive interrupt
    ///
    /// Only call once a listener is installed for this channel.
    pub fn enable_interrupt(&mut self) {
        self.regs.listen_rx(self.irq);
        self.state = ChannelState::Listening;
    }

    /// Disarm the receive interrupt while a listener is being replaced
    ///
    /// The channel is still considered listening; callers re-arm right after.
    pub fn disable_interrupt(&mut self) {
        self.regs.unlisten_rx(self.irq);
    }

    /// Transmit one byte, waiting for the data register to free up
    pub fn tx_byte(&mut self, byte: u8) {
        while !self.regs.tx_empty() {
            core::hint::spin_loop();
        }
        self.regs.write_data(byte);
    }

    /// Transmit bytes in order
    pub fn tx_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.tx_byte(byte);
        }
    }

    /// Transmit a string
    pub fn tx(&mut self, s: &str) {
        self.tx_bytes(s.as_bytes());
    }

    /// Transmit formatted text without buffering
    ///
    /// ```ignore
    /// channel.tx_fmt(format_args!("T={} C\r\n", temp));
    /// ```
    pub fn tx_fmt(&mut self, args: fmt::Arguments<'_>) {
        // write_str never fails, so an error comes from a Display impl and the
        // output is cut short at that argument
        let result = fmt::Write::write_fmt(self, args);
        debug_assert!(result.is_ok(), "formatting error while transmitting");
    }

    /// Wait until the last byte has left the data register
    pub fn flush(&mut self) {
        while !self.regs.tx_empty() {
            core::hint::spin_loop();
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn instance(&self) -> UartInstance {
        self.regs.instance()
    }
}

impl<R: UartRegisters> fmt::Write for UartChannel<R> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.tx(s);
        Ok(())
    }
}

impl<R: UartRegisters> embedded_io::ErrorType for UartChannel<R> {
    type Error = Infallible;
}

impl<R: UartRegisters> embedded_io::Write for UartChannel<R> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        UartChannel::flush(self);
        Ok(())
    }
}
