//! USART driver for STM32F1
//!
//! Implements the `halyard-hal` register contract for USART1..UART5 and
//! owns their interrupt vectors. Each vector reads its data register and
//! forwards the byte through the global dispatch registry.
//!
//! Do not bind embassy's own USART interrupt handlers in the same firmware;
//! the vectors below would collide with them.

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;
use embassy_stm32::interrupt;
use embassy_stm32::pac;
use halyard_hal::channel::{Bus, ClockEnable, Irq, UartInstance};
use halyard_hal::device::{DeviceConfig, UartDevice};
use halyard_hal::gpio::{Pin, PinMode};
use halyard_hal::registry::{on_interrupt, REGISTRY};
use halyard_hal::uart::{baud_divisor, UartRegisters};
use halyard_hal::ChannelId;

use crate::gpio;
use crate::rcc::{self, Clocks};

// SR bits
const SR_RXNE: u32 = 1 << 5;
const SR_TXE: u32 = 1 << 7;

// CR1 bits
const CR1_RE: u32 = 1 << 2;
const CR1_TE: u32 = 1 << 3;
const CR1_RXNEIE: u32 = 1 << 5;
const CR1_PS: u32 = 1 << 9;
const CR1_PCE: u32 = 1 << 10;
const CR1_M: u32 = 1 << 12;
const CR1_UE: u32 = 1 << 13;

// CR2 STOP[1:0]
const CR2_STOP_MASK: u32 = 0b11 << 12;

fn base_address(instance: UartInstance) -> usize {
    match instance {
        UartInstance::Usart1 => 0x4001_3800,
        UartInstance::Usart2 => 0x4000_4400,
        UartInstance::Usart3 => 0x4000_4800,
        UartInstance::Uart4 => 0x4000_4C00,
        UartInstance::Uart5 => 0x4000_5000,
    }
}

fn bus(instance: UartInstance) -> Bus {
    match instance {
        UartInstance::Usart1 => Bus::Apb2,
        _ => Bus::Apb1,
    }
}

/// NVIC position of a UART vector
#[derive(Debug, Clone, Copy)]
struct IrqNumber(u16);

// SAFETY: the numbers come from the channel descriptor table, which only
// holds valid STM32F1 UART vector positions.
unsafe impl InterruptNumber for IrqNumber {
    fn number(self) -> u16 {
        self.0
    }
}

/// Register handle for one USART/UART instance
///
/// Zero-cost handle over the instance's fixed address. Foreground code owns
/// one through its `UartChannel`; interrupt handlers create their own.
pub struct Usart {
    instance: UartInstance,
    pclk_hz: u32,
}

impl Usart {
    /// Handle for `instance`, with `clocks` used to derive its baud divisor
    pub fn new(instance: UartInstance, clocks: Clocks) -> Self {
        Self {
            instance,
            pclk_hz: clocks.pclk(bus(instance)),
        }
    }

    /// Receive-side handle for interrupt handlers
    ///
    /// Does not know the peripheral clock and must not program the format.
    fn for_interrupt(instance: UartInstance) -> Self {
        Self {
            instance,
            pclk_hz: 0,
        }
    }

    fn regs(&self) -> pac::usart::Usart {
        // SAFETY: every UART instance has a fixed address sharing the SR, DR,
        // BRR and CR1..CR3 layout the block describes.
        unsafe { pac::usart::Usart::from_ptr(base_address(self.instance) as *mut ()) }
    }
}

impl UartRegisters for Usart {
    fn instance(&self) -> UartInstance {
        self.instance
    }

    fn enable_clock(&mut self, clock: ClockEnable) {
        rcc::enable(clock);
    }

    fn configure_pin(&mut self, pin: Pin, mode: PinMode) {
        gpio::configure(pin, mode);
    }

    fn set_format(&mut self, baudrate: u32) {
        let div = match baud_divisor(self.pclk_hz, baudrate) {
            Some(div) => div,
            None => panic!(
                "{:?}: {} baud unreachable from {} Hz",
                self.instance, baudrate, self.pclk_hz
            ),
        };

        let regs = self.regs();
        regs.brr().write(|w| w.0 = div as u32);

        // 8 data bits, no parity, 1 stop bit (STOP = 0b00)
        regs.cr1().modify(|w| w.0 &= !(CR1_M | CR1_PCE | CR1_PS));
        regs.cr2().modify(|w| w.0 &= !CR2_STOP_MASK);

        #[cfg(feature = "defmt")]
        defmt::debug!("{}: BRR={} for {} baud", self.instance, div, baudrate);
    }

    fn enable(&mut self) {
        self.regs()
            .cr1()
            .modify(|w| w.0 |= CR1_UE | CR1_TE | CR1_RE);
    }

    fn tx_empty(&self) -> bool {
        self.regs().sr().read().0 & SR_TXE != 0
    }

    fn write_data(&mut self, byte: u8) {
        self.regs().dr().write(|w| w.0 = byte as u32);
    }

    fn rx_not_empty(&self) -> bool {
        self.regs().sr().read().0 & SR_RXNE != 0
    }

    fn read_data(&mut self) -> u8 {
        // SR read followed by DR read clears RXNE
        (self.regs().dr().read().0 & 0xFF) as u8
    }

    fn listen_rx(&mut self, irq: Irq) {
        self.regs().cr1().modify(|w| w.0 |= CR1_RXNEIE);
        NVIC::unpend(IrqNumber(irq.0));
        // SAFETY: the handler for this vector is defined below and only
        // touches the dispatch registry, which is safe to use concurrently.
        unsafe { NVIC::unmask(IrqNumber(irq.0)) };
    }

    fn unlisten_rx(&mut self, irq: Irq) {
        NVIC::mask(IrqNumber(irq.0));
        self.regs().cr1().modify(|w| w.0 &= !CR1_RXNEIE);
    }
}

/// UART instances present on the selected part
pub const UART_COUNT: usize = if cfg!(feature = "high-density") { 5 } else { 3 };

const _: () = assert!(
    halyard_hal::ENABLED_CHANNELS <= UART_COUNT,
    "medium-density parts have 3 UARTs; set HALYARD_UART_CHANNELS<=3"
);

/// Whether `instance` exists on the selected part
pub fn is_present(instance: UartInstance) -> bool {
    (instance as usize) < UART_COUNT
}

/// Bring up a UART by logical channel
///
/// # Panics
/// On an invalid or already used channel, or an unreachable baud rate.
pub fn uart_device(config: DeviceConfig, clocks: Clocks) -> UartDevice<Usart> {
    let instance = ChannelId::new(config.id).descriptor().instance;
    UartDevice::new(config, Usart::new(instance, clocks))
}

fn on_receive(instance: UartInstance) {
    on_interrupt(&mut Usart::for_interrupt(instance), &REGISTRY);
}

#[interrupt]
fn USART1() {
    on_receive(UartInstance::Usart1);
}

#[interrupt]
fn USART2() {
    on_receive(UartInstance::Usart2);
}

#[interrupt]
fn USART3() {
    on_receive(UartInstance::Usart3);
}

#[cfg(feature = "high-density")]
#[interrupt]
fn UART4() {
    on_receive(UartInstance::Uart4);
}

#[cfg(feature = "high-density")]
#[interrupt]
fn UART5() {
    on_receive(UartInstance::Uart5);
}
