pub mod core;
pub mod cpu;
pub mod device;
pub mod display;
pub mod snapshot;

pub mod prelude {
    pub use crate::core::{
        AdrSpace, Bus, BusMaster, CYCLES_PER_SCANLINE, CycleArbiter, GuestFault, InputButton,
        InterruptState, Machine,
    };
    pub use crate::cpu::HostCpu;
    pub use crate::device::antic::{Antic, AnticConfig};
    pub use crate::device::gtia::{Gtia, GtiaConfig};
    pub use crate::display::{FrameSink, VideoSink};
    pub use crate::snapshot::Snapshot;
}
