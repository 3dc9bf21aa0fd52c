//! GPIO pin abstractions
//!
//! Provides the pin identity type, the driver trait chip-specific HALs
//! implement, and a polarity-aware digital output built on top of it.

/// GPIO port identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Port {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
    G = 6,
}

impl Port {
    /// Zero-based port index (A = 0)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Port from its letter, as written in board configs
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'A' => Some(Port::A),
            'B' => Some(Port::B),
            'C' => Some(Port::C),
            'D' => Some(Port::D),
            'E' => Some(Port::E),
            'F' => Some(Port::F),
            'G' => Some(Port::G),
            _ => None,
        }
    }
}

/// Electrical polarity of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Logical "on" is a high level
    #[default]
    ActiveHigh,
    /// Logical "on" is a low level
    ActiveLow,
}

/// Highest pin number within a port
pub const PINS_PER_PORT: u8 = 16;

/// One physical GPIO line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin {
    pub port: Port,
    pub number: u8,
    pub polarity: Polarity,
}

impl Pin {
    /// Active-high pin
    ///
    /// # Panics
    /// If `number` is not below [`PINS_PER_PORT`].
    pub const fn new(port: Port, number: u8) -> Self {
        assert!(number < PINS_PER_PORT, "pin number out of range");
        Self {
            port,
            number,
            polarity: Polarity::ActiveHigh,
        }
    }

    /// Same line with the given polarity
    pub const fn with_polarity(self, polarity: Polarity) -> Self {
        Self { polarity, ..self }
    }

    /// Check whether logical "on" maps to a low level
    pub fn is_active_low(&self) -> bool {
        self.polarity == Polarity::ActiveLow
    }

    /// Parse a pin string from a board config
    ///
    /// Supports formats:
    /// - "PA9" -> (Port A, Pin 9, active high)
    /// - "!PC13" -> (Port C, Pin 13, active low)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();

        let (s, polarity) = match s.strip_prefix('!') {
            Some(rest) => (rest, Polarity::ActiveLow),
            None => (s, Polarity::ActiveHigh),
        };

        let rest = s.strip_prefix('P')?;
        let mut chars = rest.chars();
        let port = Port::from_letter(chars.next()?)?;

        let number: u8 = chars.as_str().parse().ok()?;
        if number >= PINS_PER_PORT {
            return None;
        }

        Some(Pin {
            port,
            number,
            polarity,
        })
    }
}

/// Electrical configuration applied when a driver takes over a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Software-driven push-pull output
    OutputPushPull,
    /// Peripheral-driven push-pull output (UART TX and similar)
    AlternatePushPull,
    /// High-impedance input (UART RX)
    InputFloating,
}

/// GPIO driver for a single line
///
/// Implemented by chip-specific HALs on top of their port registers.
/// Levels here are electrical, polarity is handled by [`DigitalOutput`].
pub trait GpioDriver {
    /// Configure `pin` in `mode` and take ownership of it
    fn new(pin: Pin, mode: PinMode) -> Self
    where
        Self: Sized;

    /// Drive the line high (`true`) or low (`false`)
    fn set_level(&mut self, high: bool);

    /// Currently driven level
    fn level(&self) -> bool;
}

/// Polarity-aware digital output
///
/// Owns the driver for one pin and translates logical on/off into the
/// electrical level according to the pin's polarity.
pub struct DigitalOutput<G> {
    pin: Pin,
    gpio: G,
}

impl<G: GpioDriver> DigitalOutput<G> {
    /// Take over `pin` as a push-pull output, starting logically off
    pub fn new(pin: Pin) -> Self {
        let mut output = Self {
            pin,
            gpio: G::new(pin, PinMode::OutputPushPull),
        };
        output.set_enable(false);
        output
    }

    /// Set the logical state
    pub fn set_enable(&mut self, on: bool) {
        // active-high: on → high, active-low: on → low
        self.gpio.set_level(on != self.pin.is_active_low());
    }

    /// Current logical state read back from the driver
    pub fn is_enabled(&self) -> bool {
        self.gpio.level() != self.pin.is_active_low()
    }

    /// Invert the logical state
    pub fn switch(&mut self) {
        let on = self.is_enabled();
        self.set_enable(!on);
    }

    /// The pin this output drives
    pub fn pin(&self) -> Pin {
        self.pin
    }

    /// Electrical level currently driven
    pub fn level(&self) -> bool {
        self.gpio.level()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Mock GPIO driver recording the electrical level
    pub(crate) struct MockGpio {
        pub(crate) pin: Pin,
        pub(crate) mode: PinMode,
        pub(crate) high: bool,
        pub(crate) writes: usize,
    }

    impl GpioDriver for MockGpio {
        fn new(pin: Pin, mode: PinMode) -> Self {
            // Reset state of an output latch is low
            Self {
                pin,
                mode,
                high: false,
                writes: 0,
            }
        }

        fn set_level(&mut self, high: bool) {
            self.high = high;
            self.writes += 1;
        }

        fn level(&self) -> bool {
            self.high
        }
    }

    #[test]
    fn test_parse_pin() {
        assert_eq!(Pin::parse("PA9"), Some(Pin::new(Port::A, 9)));
        assert_eq!(
            Pin::parse("!PC13"),
            Some(Pin::new(Port::C, 13).with_polarity(Polarity::ActiveLow))
        );
        assert_eq!(Pin::parse(" PD2 "), Some(Pin::new(Port::D, 2)));
        assert_eq!(Pin::parse("PG15"), Some(Pin::new(Port::G, 15)));

        // Invalid
        assert_eq!(Pin::parse("PA16"), None);
        assert_eq!(Pin::parse("PH1"), None);
        assert_eq!(Pin::parse("A9"), None);
        assert_eq!(Pin::parse("PA"), None);
        assert_eq!(Pin::parse(""), None);
    }

    #[test]
    fn test_active_high_output() {
        let mut out: DigitalOutput<MockGpio> = DigitalOutput::new(Pin::new(Port::A, 5));

        // Initially off, pin low
        assert_eq!(out.gpio.mode, PinMode::OutputPushPull);
        assert!(!out.is_enabled());
        assert!(!out.level());

        out.set_enable(true);
        assert!(out.is_enabled());
        assert!(out.level());

        out.set_enable(false);
        assert!(!out.is_enabled());
        assert!(!out.level());
    }

    #[test]
    fn test_active_low_output() {
        let pin = Pin::new(Port::C, 13).with_polarity(Polarity::ActiveLow);
        let mut out: DigitalOutput<MockGpio> = DigitalOutput::new(pin);

        // Initially off, which is a high level for active-low
        assert!(!out.is_enabled());
        assert!(out.level());

        // On drives the line low
        out.set_enable(true);
        assert!(out.is_enabled());
        assert!(!out.level());
    }

    #[test]
    fn test_switch_twice_restores_level() {
        for polarity in [Polarity::ActiveHigh, Polarity::ActiveLow] {
            let pin = Pin::new(Port::B, 1).with_polarity(polarity);
            let mut out: DigitalOutput<MockGpio> = DigitalOutput::new(pin);
            let original = out.level();

            out.switch();
            assert_ne!(out.level(), original);
            assert!(out.is_enabled());

            out.switch();
            assert_eq!(out.level(), original);
            assert!(!out.is_enabled());
        }
    }

    #[test]
    fn test_set_enable_is_single_write() {
        let mut out: DigitalOutput<MockGpio> = DigitalOutput::new(Pin::new(Port::A, 0));
        let before = out.gpio.writes;
        out.set_enable(true);
        assert_eq!(out.gpio.writes, before + 1);
        assert_eq!(out.gpio.pin, Pin::new(Port::A, 0));
    }
}
