//! UART device facade
//!
//! Addresses a UART by logical channel ID: resolves the channel's descriptor,
//! brings up the peripheral and wires receive listeners into the dispatch
//! registry.

use core::convert::Infallible;
use core::fmt;
use core::sync::atomic::{fence, Ordering};

use crate::channel::ChannelId;
use crate::registry::{DispatchRegistry, Listener, REGISTRY};
use crate::uart::{ChannelState, UartChannel, UartConfig, UartRegisters};

/// Device configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    /// Logical channel ID
    pub id: u8,
    /// Baud rate in bits per second
    pub baudrate: u32,
}

impl DeviceConfig {
    pub const fn new(id: u8, baudrate: u32) -> Self {
        Self { id, baudrate }
    }
}

/// UART addressed by logical channel
pub struct UartDevice<R> {
    id: ChannelId,
    uart: UartChannel<R>,
    registry: &'static DispatchRegistry,
}

impl<R: UartRegisters> UartDevice<R> {
    /// Bring up a channel dispatching through the global [`REGISTRY`]
    ///
    /// # Panics
    /// If the channel ID is invalid, the channel was already brought up, or
    /// `regs` addresses a different peripheral than the channel's descriptor.
    pub fn new(config: DeviceConfig, regs: R) -> Self {
        Self::with_registry(config, regs, &REGISTRY)
    }

    /// Bring up a channel dispatching through `registry`
    pub fn with_registry(
        config: DeviceConfig,
        regs: R,
        registry: &'static DispatchRegistry,
    ) -> Self {
        let id = ChannelId::new(config.id);
        if let Err(e) = registry.claim(id) {
            panic!("UART channel {} cannot be brought up: {:?}", config.id, e);
        }

        let uart = UartChannel::new(id.descriptor(), UartConfig::new(config.baudrate), regs);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "uart{}: {} at {} baud",
            id.as_u8(),
            uart.instance(),
            config.baudrate
        );

        Self { id, uart, registry }
    }

    /// Install the receive listener and arm the receive interrupt
    ///
    /// The listener is stored before the interrupt is armed, so the handler
    /// never finds an armed channel with an empty slot. Installing again
    /// replaces the previous listener; the interrupt is disarmed around the
    /// swap.
    pub fn set_listener(&mut self, listener: &'static Listener) {
        let rearm = self.uart.state() == ChannelState::Listening;
        if rearm {
            self.uart.disable_interrupt();
        }

        self.registry.set(self.id, listener);
        // Slot store must be visible before the arming register write
        fence(Ordering::SeqCst);
        self.uart.enable_interrupt();

        #[cfg(feature = "defmt")]
        defmt::debug!("uart{}: listener installed (replaced: {})", self.id.as_u8(), rearm);
    }

    /// Transmit one byte, blocking
    pub fn tx_byte(&mut self, byte: u8) {
        self.uart.tx_byte(byte);
    }

    /// Transmit bytes, blocking
    pub fn tx_bytes(&mut self, bytes: &[u8]) {
        self.uart.tx_bytes(bytes);
    }

    /// Transmit a string, blocking
    pub fn tx(&mut self, s: &str) {
        self.uart.tx(s);
    }

    /// Transmit formatted text, blocking
    pub fn tx_fmt(&mut self, args: fmt::Arguments<'_>) {
        self.uart.tx_fmt(args);
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn state(&self) -> ChannelState {
        self.uart.state()
    }
}

impl<R: UartRegisters> fmt::Write for UartDevice<R> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.tx(s);
        Ok(())
    }
}

impl<R: UartRegisters> embedded_io::ErrorType for UartDevice<R> {
    type Error = Infallible;
}

impl<R: UartRegisters> embedded_io::Write for UartDevice<R> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        embedded_io::Write::write(&mut self.uart, buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        embedded_io::Write::flush(&mut self.uart)
    }
}
