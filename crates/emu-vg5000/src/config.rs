//! VG5000µ model configuration.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use emu_core::Z80Pins;

/// Supported VG5000µ models. They differ only by their BASIC ROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Vg5000Model {
    /// ROM 1.0.
    V10,
    /// ROM 1.1.
    #[default]
    V11,
}

/// Per-tick callback and the flag it raises to stop execution.
pub struct DebugHook {
    /// Checked before every tick while the hook is installed.
    pub stopped: Rc<Cell<bool>>,
    /// Called after every tick with the CPU pins.
    pub callback: Box<dyn FnMut(Z80Pins)>,
}

impl fmt::Debug for DebugHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugHook")
            .field("stopped", &self.stopped.get())
            .finish_non_exhaustive()
    }
}

/// Configuration for creating a VG5000µ instance.
#[derive(Debug, Default)]
pub struct Vg5000Config {
    pub model: Vg5000Model,
    /// BASIC ROM for the model, 16,384 bytes. Shorter images are padded
    /// with 0xFF.
    pub rom: Vec<u8>,
    /// EF9345 character generator, 8,192 bytes. Empty reads as blank glyphs.
    pub charset: Vec<u8>,
    pub debug: Option<DebugHook>,
}
