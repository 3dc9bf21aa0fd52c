//! UART channel descriptors
//!
//! Maps logical channel IDs onto the fixed hardware resources of the
//! STM32F10x family. The table is static; which of its entries are usable
//! is decided at build time by `HALYARD_UART_CHANNELS`.

use crate::gpio::{Pin, Port};

include!(concat!(env!("OUT_DIR"), "/uart_channels.rs"));

/// Number of UART peripherals on the largest supported part
pub const MAX_CHANNELS: usize = 5;

const _: () = assert!(ENABLED_CHANNELS >= 1 && ENABLED_CHANNELS <= MAX_CHANNELS);

/// Physical UART peripheral instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartInstance {
    Usart1,
    Usart2,
    Usart3,
    Uart4,
    Uart5,
}

/// Peripheral bus a clock-enable bit lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bus {
    Apb1,
    Apb2,
}

/// One clock-enable bit (or bits) in a bus enable register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockEnable {
    pub bus: Bus,
    pub mask: u32,
}

impl ClockEnable {
    const fn apb1(bit: u8) -> Self {
        Self {
            bus: Bus::Apb1,
            mask: 1 << bit,
        }
    }

    const fn apb2(bit: u8) -> Self {
        Self {
            bus: Bus::Apb2,
            mask: 1 << bit,
        }
    }

    /// Clock gate of a GPIO port (IOPxEN on APB2)
    pub const fn gpio(port: Port) -> Self {
        Self::apb2(2 + port as u8)
    }
}

/// Interrupt vector number at the interrupt controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Irq(pub u16);

/// Static hardware resources bound to a logical channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelDescriptor {
    pub instance: UartInstance,
    /// Peripheral clock gate
    pub clock: ClockEnable,
    pub tx_port_clock: ClockEnable,
    pub rx_port_clock: ClockEnable,
    pub tx: Pin,
    pub rx: Pin,
    pub irq: Irq,
}

const fn descriptor_entry(
    instance: UartInstance,
    clock: ClockEnable,
    tx: Pin,
    rx: Pin,
    irq: u16,
) -> ChannelDescriptor {
    ChannelDescriptor {
        instance,
        clock,
        tx_port_clock: ClockEnable::gpio(tx.port),
        rx_port_clock: ClockEnable::gpio(rx.port),
        tx,
        rx,
        irq: Irq(irq),
    }
}

/// Default pin mapping of every UART (no AFIO remap)
static DESCRIPTORS: [ChannelDescriptor; MAX_CHANNELS] = [
    descriptor_entry(
        UartInstance::Usart1,
        ClockEnable::apb2(14),
        Pin::new(Port::A, 9),
        Pin::new(Port::A, 10),
        37,
    ),
    descriptor_entry(
        UartInstance::Usart2,
        ClockEnable::apb1(17),
        Pin::new(Port::A, 2),
        Pin::new(Port::A, 3),
        38,
    ),
    descriptor_entry(
        UartInstance::Usart3,
        ClockEnable::apb1(18),
        Pin::new(Port::B, 10),
        Pin::new(Port::B, 11),
        39,
    ),
    descriptor_entry(
        UartInstance::Uart4,
        ClockEnable::apb1(19),
        Pin::new(Port::C, 10),
        Pin::new(Port::C, 11),
        52,
    ),
    descriptor_entry(
        UartInstance::Uart5,
        ClockEnable::apb1(20),
        Pin::new(Port::C, 12),
        Pin::new(Port::D, 2),
        53,
    ),
];

/// Errors from channel validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError {
    /// ID is beyond what any supported part provides
    OutOfRange,
    /// ID exists on the part but is not enabled by the build
    Disabled,
    /// Channel is already owned by another device
    AlreadyClaimed,
}

/// Logical UART channel ID, always below [`ENABLED_CHANNELS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(u8);

impl ChannelId {
    /// Validate a raw channel number
    ///
    /// # Panics
    /// If the ID is out of range or not enabled. Either one is a
    /// configuration bug, so there is nothing to recover.
    pub fn new(raw: u8) -> Self {
        match Self::try_from(raw) {
            Ok(id) => id,
            Err(e) => panic!("invalid UART channel {}: {:?}", raw, e),
        }
    }

    /// Logical ID statically bound to a hardware instance, if enabled
    pub fn for_instance(instance: UartInstance) -> Option<Self> {
        DESCRIPTORS[..ENABLED_CHANNELS]
            .iter()
            .position(|d| d.instance == instance)
            .map(|index| Self(index as u8))
    }

    /// Iterate over every enabled channel
    pub fn all() -> impl Iterator<Item = ChannelId> {
        (0..ENABLED_CHANNELS as u8).map(ChannelId)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn as_u8(self) -> u8 {
        self.0
    }

    /// Hardware resources of this channel
    pub fn descriptor(self) -> &'static ChannelDescriptor {
        &DESCRIPTORS[self.index()]
    }
}

impl TryFrom<u8> for ChannelId {
    type Error = ChannelError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        let index = raw as usize;
        if index >= MAX_CHANNELS {
            return Err(ChannelError::OutOfRange);
        }
        if index >= ENABLED_CHANNELS {
            return Err(ChannelError::Disabled);
        }
        Ok(Self(raw))
    }
}

/// Resolve the descriptor for a raw channel number
///
/// # Panics
/// If the channel is out of range or not enabled by the build.
pub fn descriptor(raw: u8) -> &'static ChannelDescriptor {
    ChannelId::new(raw).descriptor()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_zero_is_usart1() {
        let d = descriptor(0);
        assert_eq!(d.instance, UartInstance::Usart1);
        assert_eq!(d.tx, Pin::new(Port::A, 9));
        assert_eq!(d.rx, Pin::new(Port::A, 10));
        assert_eq!(d.irq, Irq(37));
        assert_eq!(d.clock, ClockEnable { bus: Bus::Apb2, mask: 1 << 14 });
        assert_eq!(d.tx_port_clock, ClockEnable { bus: Bus::Apb2, mask: 1 << 2 });
        assert_eq!(d.rx_port_clock, d.tx_port_clock);
    }

    #[test]
    fn test_uart5_split_ports() {
        if ENABLED_CHANNELS < 5 {
            return;
        }
        let d = descriptor(4);
        assert_eq!(d.instance, UartInstance::Uart5);
        assert_eq!(d.tx_port_clock.mask, 1 << 4); // IOPCEN
        assert_eq!(d.rx_port_clock.mask, 1 << 5); // IOPDEN
        assert_eq!(d.clock.bus, Bus::Apb1);
    }

    #[test]
    fn test_try_from() {
        assert_eq!(ChannelId::try_from(0u8).map(ChannelId::index), Ok(0));
        assert_eq!(ChannelId::try_from(5u8), Err(ChannelError::OutOfRange));
        assert_eq!(ChannelId::try_from(200u8), Err(ChannelError::OutOfRange));
        if ENABLED_CHANNELS < MAX_CHANNELS {
            assert_eq!(
                ChannelId::try_from(ENABLED_CHANNELS as u8),
                Err(ChannelError::Disabled)
            );
        }
    }

    #[test]
    #[should_panic(expected = "invalid UART channel")]
    fn test_out_of_range_panics() {
        let _ = descriptor(MAX_CHANNELS as u8);
    }

    #[test]
    fn test_instance_mapping_round_trips() {
        for id in ChannelId::all() {
            let instance = id.descriptor().instance;
            assert_eq!(ChannelId::for_instance(instance), Some(id));
        }
    }

    #[test]
    fn test_descriptors_are_unique() {
        for a in ChannelId::all() {
            for b in ChannelId::all() {
                if a != b {
                    let (da, db) = (a.descriptor(), b.descriptor());
                    assert_ne!(da.instance, db.instance);
                    assert_ne!(da.irq, db.irq);
                    assert_ne!(da.clock, db.clock);
                }
            }
        }
    }
}
