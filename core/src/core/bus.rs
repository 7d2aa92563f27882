/// Identifies who is accessing the bus (for CPU/DMA arbitration)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusMaster {
    /// The host CPU, routed through the full register decode.
    Cpu,
    /// Video DMA reads from the display chips. These go through their own
    /// view of memory, which may differ from the CPU view under banking.
    VideoDma,
}

/// Generic bus interface supporting halt/arbitration (RDY, HALT, DMA stall)
pub trait Bus {
    type Address: Copy + Into<u64>; // u16 for 8-bit machines
    type Data; // u8

    fn read(&mut self, master: BusMaster, addr: Self::Address) -> Self::Data;
    fn write(&mut self, master: BusMaster, addr: Self::Address, data: Self::Data);

    /// Check if the bus is halted for this master (DMA steal or WSYNC wait).
    /// Returns true if the master must pause before the next bus cycle.
    fn is_halted_for(&self, master: BusMaster) -> bool;

    /// Generic interrupt query. CPUs pick what they need.
    fn check_interrupts(&self, target: BusMaster) -> InterruptState;

    /// Current beam position as (scanline, cycle within the line). Devices
    /// with cycle-exact side effects and test drivers use this to align bus
    /// traffic with the video chips.
    fn beam_position(&self) -> (u16, usize) {
        (0, 0)
    }
}

#[derive(Default, Clone, Copy, Debug)]
pub struct InterruptState {
    pub nmi: bool,
    pub irq: bool,
}

/// Read-only view of guest memory.
///
/// The display chips fetch through an `AdrSpace`, never through the CPU's
/// `Bus`: under banking the two mappings can differ, and video DMA must not
/// trigger register side effects.
pub trait AdrSpace {
    fn read(&self, addr: u16) -> u8;

    fn read_word(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }
}

impl AdrSpace for [u8; 0x10000] {
    fn read(&self, addr: u16) -> u8 {
        self[addr as usize]
    }
}

impl AdrSpace for [u8] {
    fn read(&self, addr: u16) -> u8 {
        self.get(addr as usize).copied().unwrap_or(0xFF)
    }
}

impl<T: AdrSpace + ?Sized> AdrSpace for &T {
    fn read(&self, addr: u16) -> u8 {
        (**self).read(addr)
    }
}
