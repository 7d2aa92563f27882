#![allow(dead_code)]

use colleen_core::core::bus::{Bus, BusMaster};
use colleen_core::cpu::HostCpu;

/// A bus master that issues scheduled register writes at exact beam
/// positions and counts the NMIs it receives. Stands in for the 6502,
/// whose decoder is outside the core.
pub struct ScriptedCpu {
    writes: Vec<(u16, usize, u16, u8)>,
    pub nmi_count: u32,
    pub executed_cycles: u64,
}

impl ScriptedCpu {
    pub fn new() -> Self {
        Self {
            writes: Vec::new(),
            nmi_count: 0,
            executed_cycles: 0,
        }
    }

    /// Schedule a write for `(line, cycle)`. The cycle must be one the
    /// DMA schedule leaves free, like a real instruction's store cycle.
    pub fn schedule(&mut self, line: u16, cycle: usize, addr: u16, data: u8) {
        self.writes.push((line, cycle, addr, data));
    }
}

impl HostCpu for ScriptedCpu {
    fn execute_cycle(&mut self, bus: &mut dyn Bus<Address = u16, Data = u8>) {
        self.executed_cycles += 1;
        let (line, cycle) = bus.beam_position();
        let mut i = 0;
        while i < self.writes.len() {
            if self.writes[i].0 == line && self.writes[i].1 == cycle {
                let (_, _, addr, data) = self.writes.remove(i);
                bus.write(BusMaster::Cpu, addr, data);
            } else {
                i += 1;
            }
        }
    }

    fn signal_nmi(&mut self) {
        self.nmi_count += 1;
    }
}

impl Default for ScriptedCpu {
    fn default() -> Self {
        Self::new()
    }
}
