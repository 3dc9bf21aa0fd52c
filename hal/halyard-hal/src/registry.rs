//! Receive-interrupt dispatch
//!
//! The registry is the only state shared between foreground code and UART
//! interrupt handlers: one slot per enabled channel, each holding at most one
//! listener. Slots are atomic pointers, so there is no lock anywhere on the
//! interrupt path.
//!
//! Ordering: a slot is stored with `Release` and a fence separates that store
//! from arming the interrupt, so a handler that runs at all sees the listener.
//! Handlers load with `Acquire`.

#![allow(unsafe_code)]

use core::ptr;
use core::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use crate::channel::{ChannelError, ChannelId, ENABLED_CHANNELS};
use crate::uart::UartRegisters;

/// Receive callback for one channel
///
/// Runs in interrupt context, so it must be `Sync` and should return quickly.
/// Plain functions go straight into a static:
///
/// ```ignore
/// fn on_byte(byte: u8) { /* ... */ }
///
/// static ECHO: Listener = Listener::from_fn(on_byte);
/// ```
///
/// Closures with state need a `'static` home first (a `static_cell::StaticCell`
/// or similar), then [`Listener::new`].
pub struct Listener {
    callback: Callback,
}

enum Callback {
    Fn(fn(u8)),
    Closure(&'static (dyn Fn(u8) + Sync)),
}

impl Listener {
    pub const fn new(on_byte: &'static (dyn Fn(u8) + Sync)) -> Self {
        Self {
            callback: Callback::Closure(on_byte),
        }
    }

    pub const fn from_fn(on_byte: fn(u8)) -> Self {
        Self {
            callback: Callback::Fn(on_byte),
        }
    }

    /// Invoke the callback
    pub fn call(&self, byte: u8) {
        match self.callback {
            Callback::Fn(f) => f(byte),
            Callback::Closure(f) => f(byte),
        }
    }
}

/// Fixed-capacity table of receive listeners indexed by channel
pub struct DispatchRegistry {
    slots: [AtomicPtr<Listener>; ENABLED_CHANNELS],
    claimed: [AtomicBool; ENABLED_CHANNELS],
}

/// Registry the UART interrupt handlers dispatch through
pub static REGISTRY: DispatchRegistry = DispatchRegistry::new();

impl Default for DispatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchRegistry {
    /// Empty registry, every slot unset and unclaimed
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicPtr::new(ptr::null_mut()) }; ENABLED_CHANNELS],
            claimed: [const { AtomicBool::new(false) }; ENABLED_CHANNELS],
        }
    }

    /// Mark a channel as owned by a device
    ///
    /// Fails with [`ChannelError::AlreadyClaimed`] on the second claim, which
    /// would otherwise mean two drivers programming one peripheral.
    pub fn claim(&self, id: ChannelId) -> Result<(), ChannelError> {
        if self.claimed[id.index()].swap(true, Ordering::AcqRel) {
            return Err(ChannelError::AlreadyClaimed);
        }
        Ok(())
    }

    /// Store a listener, replacing any previous one
    ///
    /// Returns `true` if a listener was replaced. Does not arm anything;
    /// see [`crate::device::UartDevice::set_listener`] for the full sequence.
    pub fn set(&self, id: ChannelId, listener: &'static Listener) -> bool {
        let new = listener as *const Listener as *mut Listener;
        let old = self.slots[id.index()].swap(new, Ordering::AcqRel);
        !old.is_null()
    }

    /// Current listener of a channel
    pub fn get(&self, id: ChannelId) -> Option<&'static Listener> {
        let ptr = self.slots[id.index()].load(Ordering::Acquire);
        // SAFETY: slots only ever hold null or a pointer taken from a
        // `&'static Listener` in `set`, which stays valid for the program.
        unsafe { ptr.as_ref() }
    }

    /// Check whether a listener is installed
    pub fn is_set(&self, id: ChannelId) -> bool {
        !self.slots[id.index()].load(Ordering::Acquire).is_null()
    }

    /// Hand a received byte to the channel's listener
    ///
    /// Returns `false` when no listener is installed; the byte is dropped.
    pub fn dispatch(&self, id: ChannelId, byte: u8) -> bool {
        match self.get(id) {
            Some(listener) => {
                listener.call(byte);
                true
            }
            None => {
                #[cfg(feature = "defmt")]
                defmt::trace!("uart{}: no listener, dropped {=u8:#x}", id.as_u8(), byte);
                false
            }
        }
    }
}

/// Receive interrupt body for one UART instance
///
/// Call from the instance's interrupt handler with a fresh register handle.
/// When RXNE is set the data register is read (which clears RXNE) and the
/// byte goes to the listener of the channel bound to this instance. Without
/// a listener, or for an instance no channel is bound to, the byte is
/// discarded so the interrupt does not fire again forever.
pub fn on_interrupt<R: UartRegisters>(regs: &mut R, registry: &DispatchRegistry) {
    if !regs.rx_not_empty() {
        return;
    }

    let byte = regs.read_data();
    if let Some(id) = ChannelId::for_instance(regs.instance()) {
        registry.dispatch(id, byte);
    }
}
