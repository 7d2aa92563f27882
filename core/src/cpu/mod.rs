//! Host CPU surface.
//!
//! The instruction decoder is an external collaborator; the core only
//! depends on the cycle-steal and interrupt surface. The board grants the
//! CPU one bus cycle per free slot, and the display-list controller drives
//! the NMI line through `signal_nmi`.

use crate::core::bus::Bus;

/// A bus master executing one machine cycle per call.
///
/// `execute_cycle` is invoked only on cycles the arbiter has not stolen;
/// the CPU never needs to poll the busy flag itself, but may via
/// `Bus::is_halted_for` when modelling RDY-aware opcodes.
pub trait HostCpu {
    fn execute_cycle(&mut self, bus: &mut dyn Bus<Address = u16, Data = u8>);

    /// Edge-triggered non-maskable interrupt from the display-list
    /// controller (display-list interrupt, vertical blank, reset key).
    fn signal_nmi(&mut self) {}

    /// Level-triggered maskable interrupt line.
    fn signal_irq(&mut self, _asserted: bool) {}

    fn reset(&mut self) {}
}
