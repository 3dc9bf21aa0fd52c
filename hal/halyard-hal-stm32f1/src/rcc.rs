//! Peripheral clock gates

use embassy_stm32::pac;
use halyard_hal::channel::{Bus, ClockEnable};

/// Set a clock-enable bit
///
/// Read-modify-write of the bus enable register. Only called from
/// foreground bring-up, never from interrupt handlers.
pub fn enable(clock: ClockEnable) {
    match clock.bus {
        Bus::Apb1 => pac::RCC.apb1enr().modify(|w| w.0 |= clock.mask),
        Bus::Apb2 => pac::RCC.apb2enr().modify(|w| w.0 |= clock.mask),
    }
}

/// Bus clock frequencies after board clock setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clocks {
    pub apb1_hz: u32,
    pub apb2_hz: u32,
}

impl Clocks {
    /// 72 MHz SYSCLK from an 8 MHz HSE: APB1 at 36 MHz, APB2 at 72 MHz
    pub const HSE_8MHZ_PLL_72MHZ: Self = Self {
        apb1_hz: 36_000_000,
        apb2_hz: 72_000_000,
    };

    /// Clock of peripherals on `bus`
    pub fn pclk(&self, bus: Bus) -> u32 {
        match bus {
            Bus::Apb1 => self.apb1_hz,
            Bus::Apb2 => self.apb2_hz,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pclk_by_bus() {
        let clocks = Clocks::HSE_8MHZ_PLL_72MHZ;
        assert_eq!(clocks.pclk(Bus::Apb1), 36_000_000);
        assert_eq!(clocks.pclk(Bus::Apb2), 72_000_000);
    }
}
