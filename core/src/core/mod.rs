pub mod bus;
pub mod machine;
pub mod timing;

pub use bus::{AdrSpace, Bus, BusMaster, InterruptState};
pub use machine::{GuestFault, InputButton, Machine};
pub use timing::{CYCLES_PER_SCANLINE, CycleArbiter, WSYNC_RELEASE_SLOT};
