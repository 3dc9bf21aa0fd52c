//! Simulated UART register block for host tests
//!
//! Handles are cheap clones sharing one state, so a test can give one to a
//! channel, keep another to inspect, and hand a third to the interrupt path.

use std::cell::RefCell;
use std::rc::Rc;

use crate::channel::{ClockEnable, Irq, UartInstance};
use crate::gpio::{Pin, PinMode};
use crate::uart::UartRegisters;

#[derive(Debug, Clone, Default)]
pub(crate) struct SimState {
    pub(crate) clocks: Vec<ClockEnable>,
    pub(crate) pins: Vec<(Pin, PinMode)>,
    /// Baud rate of the last 8N1 format programmed
    pub(crate) format: Option<u32>,
    pub(crate) enabled: bool,
    pub(crate) tx_log: Vec<u8>,
    /// Polls left before the data register reads empty again
    pub(crate) shifting: u32,
    /// Total polls that found the data register full
    pub(crate) busy_polls: u32,
    /// Set if a byte was written while the register was still full
    pub(crate) overwrote_tx: bool,
    pub(crate) rx_data: u8,
    pub(crate) rxne: bool,
    pub(crate) rx_armed: bool,
    pub(crate) armed_irq: Option<Irq>,
    pub(crate) arm_count: u32,
}

#[derive(Clone)]
pub(crate) struct SimUart {
    instance: UartInstance,
    state: Rc<RefCell<SimState>>,
}

impl SimUart {
    /// Polls the transmit register stays full after each write
    pub(crate) const SHIFT_POLLS: u32 = 2;

    pub(crate) fn new(instance: UartInstance) -> Self {
        Self {
            instance,
            state: Rc::new(RefCell::new(SimState::default())),
        }
    }

    /// Snapshot of the register state
    pub(crate) fn state(&self) -> SimState {
        self.state.borrow().clone()
    }

    /// Latch a received byte and raise RXNE
    pub(crate) fn receive(&self, byte: u8) {
        let mut state = self.state.borrow_mut();
        state.rx_data = byte;
        state.rxne = true;
    }
}

impl UartRegisters for SimUart {
    fn instance(&self) -> UartInstance {
        self.instance
    }

    fn enable_clock(&mut self, clock: ClockEnable) {
        self.state.borrow_mut().clocks.push(clock);
    }

    fn configure_pin(&mut self, pin: Pin, mode: PinMode) {
        self.state.borrow_mut().pins.push((pin, mode));
    }

    fn set_format(&mut self, baudrate: u32) {
        self.state.borrow_mut().format = Some(baudrate);
    }

    fn enable(&mut self) {
        self.state.borrow_mut().enabled = true;
    }

    fn tx_empty(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.shifting > 0 {
            state.shifting -= 1;
            state.busy_polls += 1;
            false
        } else {
            true
        }
    }

    fn write_data(&mut self, byte: u8) {
        let mut state = self.state.borrow_mut();
        if state.shifting > 0 {
            state.overwrote_tx = true;
        }
        state.tx_log.push(byte);
        state.shifting = Self::SHIFT_POLLS;
    }

    fn rx_not_empty(&self) -> bool {
        self.state.borrow().rxne
    }

    fn read_data(&mut self) -> u8 {
        let mut state = self.state.borrow_mut();
        state.rxne = false;
        state.rx_data
    }

    fn listen_rx(&mut self, irq: Irq) {
        let mut state = self.state.borrow_mut();
        state.rx_armed = true;
        state.armed_irq = Some(irq);
        state.arm_count += 1;
    }

    fn unlisten_rx(&mut self, _irq: Irq) {
        self.state.borrow_mut().rx_armed = false;
    }
}
