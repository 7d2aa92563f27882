/// Describes a single input button that a machine accepts.
pub struct InputButton {
    /// Machine-defined button identifier, passed to `set_input()`.
    pub id: u8,
    /// Human-readable name for display/configuration (e.g., "Start", "Trigger 1").
    pub name: &'static str,
}

/// Machine-agnostic interface for emulated systems.
///
/// The enclosing driver is a pure rendering/input engine that does not know
/// about specific hardware (display chips, palette formats, register files).
pub trait Machine {
    /// Native display resolution as (width, height) in pixels.
    fn display_size(&self) -> (u32, u32);

    /// Run one frame of emulation (advance the clock by one frame's worth of cycles).
    fn run_frame(&mut self);

    /// Render the current video state into an RGB24 pixel buffer.
    ///
    /// The buffer must be at least `width * height * 3` bytes (from `display_size()`).
    /// Pixels are stored left-to-right, top-to-bottom, 3 bytes per pixel (R, G, B).
    fn render_frame(&self, buffer: &mut [u8]);

    /// Handle an input event. `button` is a machine-defined ID from `input_map()`.
    /// `pressed` is true for key-down, false for key-up.
    fn set_input(&mut self, button: u8, pressed: bool);

    /// Get the list of input buttons this machine accepts.
    fn input_map(&self) -> &[InputButton];

    /// Reset the machine to its initial power-on state.
    fn reset(&mut self);
}

/// A fault raised by the guest program, reported out-of-band.
///
/// The core never propagates these across a per-cycle boundary: they are
/// queued by the board and drained by the enclosing driver (typically a
/// debugger front-end). Core state is not modified by a fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuestFault {
    /// An opcode with unreliable silicon behaviour was executed.
    UnreliableOpcode { pc: u16, opcode: u8 },
    /// A jam/halt opcode stopped the CPU.
    JamOpcode { pc: u16, opcode: u8 },
    /// Execution entered an unmapped address region.
    UnmappedExecution { addr: u16 },
}
