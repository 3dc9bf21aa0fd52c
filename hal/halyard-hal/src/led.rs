//! LED output
//!
//! On/off wrapper over [`DigitalOutput`]. An LED always starts off; if a
//! board shows it lit after construction, the line has an external pull
//! resistor fighting the output.

use crate::gpio::{DigitalOutput, GpioDriver, Pin};

/// LED configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedConfig {
    /// Line driving the LED, polarity included
    pub pin: Pin,
}

/// Single LED
pub struct Led<G> {
    output: DigitalOutput<G>,
}

impl<G: GpioDriver> Led<G> {
    pub fn new(config: LedConfig) -> Self {
        Self {
            output: DigitalOutput::new(config.pin),
        }
    }

    /// Turn the LED on or off
    pub fn set_enable(&mut self, on: bool) {
        self.output.set_enable(on);
    }

    /// Toggle the LED
    pub fn switch(&mut self) {
        self.output.switch();
    }

    pub fn is_on(&self) -> bool {
        self.output.is_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::tests::MockGpio;
    use crate::gpio::{Polarity, Port};

    #[test]
    fn test_led_starts_off() {
        let pin = Pin::parse("!PC13").unwrap();
        let led: Led<MockGpio> = Led::new(LedConfig { pin });

        assert!(!led.is_on());
        // Active-low: off means the line sits high
        assert!(led.output.level());
    }

    #[test]
    fn test_led_toggle() {
        let pin = Pin::new(Port::A, 1).with_polarity(Polarity::ActiveHigh);
        let mut led: Led<MockGpio> = Led::new(LedConfig { pin });

        led.switch();
        assert!(led.is_on());
        assert!(led.output.level());

        led.switch();
        assert!(!led.is_on());

        led.set_enable(true);
        led.set_enable(true);
        assert!(led.is_on());
    }
}
