//! GPIO driver for STM32F1
//!
//! F1 ports are configured through the CRL/CRH nibbles (CNF + MODE per
//! pin) rather than the MODER/AFR layout of later families.

use core::convert::Infallible;

use embassy_stm32::pac;
use halyard_hal::channel::ClockEnable;
use halyard_hal::gpio::{GpioDriver, Pin, PinMode, Port};

use crate::rcc;

const GPIOA_BASE: usize = 0x4001_0800;
const GPIO_STRIDE: usize = 0x400;

/// Port register block
fn port_regs(port: Port) -> pac::gpio::Gpio {
    let base = GPIOA_BASE + port.index() * GPIO_STRIDE;
    // SAFETY: GPIOA..GPIOG sit at fixed, evenly spaced addresses on every
    // F1 part; the block is a thin handle with no ownership of its own.
    unsafe { pac::gpio::Gpio::from_ptr(base as *mut ()) }
}

/// CNF[1:0] MODE[1:0] nibble for a pin mode (outputs at 50 MHz)
fn mode_bits(mode: PinMode) -> u32 {
    match mode {
        PinMode::OutputPushPull => 0b0011,
        PinMode::AlternatePushPull => 0b1011,
        PinMode::InputFloating => 0b0100,
    }
}

/// Program the configuration nibble of `pin`
///
/// The port clock must already be on.
pub fn configure(pin: Pin, mode: PinMode) {
    let regs = port_regs(pin.port);
    let n = pin.number as usize;
    let shift = (n % 8) * 4;

    regs.cr(n / 8).modify(|w| {
        w.0 = (w.0 & !(0xF << shift)) | (mode_bits(mode) << shift);
    });
}

/// Drive a pin through BSRR
fn write_level(pin: Pin, high: bool) {
    let n = pin.number;
    let bits = if high { 1u32 << n } else { 1u32 << (n + 16) };
    port_regs(pin.port).bsrr().write(|w| w.0 = bits);
}

/// Output latch level of a pin
fn output_level(pin: Pin) -> bool {
    port_regs(pin.port).odr().read().0 & (1 << pin.number) != 0
}

/// One GPIO line on an STM32F1
pub struct Stm32Gpio {
    pin: Pin,
}

impl GpioDriver for Stm32Gpio {
    fn new(pin: Pin, mode: PinMode) -> Self {
        rcc::enable(ClockEnable::gpio(pin.port));
        configure(pin, mode);
        Self { pin }
    }

    fn set_level(&mut self, high: bool) {
        write_level(self.pin, high);
    }

    fn level(&self) -> bool {
        output_level(self.pin)
    }
}

impl embedded_hal::digital::ErrorType for Stm32Gpio {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for Stm32Gpio {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_level(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_level(true);
        Ok(())
    }
}

impl embedded_hal::digital::StatefulOutputPin for Stm32Gpio {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_bits() {
        // CNF[1:0] MODE[1:0], outputs at 50 MHz
        assert_eq!(mode_bits(PinMode::OutputPushPull), 0b0011);
        assert_eq!(mode_bits(PinMode::AlternatePushPull), 0b1011);
        assert_eq!(mode_bits(PinMode::InputFloating), 0b0100);
    }
}
