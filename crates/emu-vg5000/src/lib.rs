//! Cycle-accurate Philips VG5000µ.
//!
//! The board ticks at the Z80's 4 MHz; the EF9345 runs three ticks per
//! system tick from its 12 MHz crystal. The CPU core is supplied by the
//! caller through [`emu_core::PinCpu`], everything else lives here: the
//! 7807 I/O decoder, keyboard matrix, cassette recorder and the board
//! wiring.

#[cfg(feature = "capture")]
pub mod capture;
mod config;
pub mod decoder;
pub mod keyboard;
pub mod tape;
mod vg5000;

pub use config::{DebugHook, Vg5000Config, Vg5000Model};
pub use decoder::{ServiceBus, decode, select_lines};
pub use keyboard::{KeyPosition, Keyboard};
pub use tape::{CodecState, PulseBuffer, ReadOutcome, TapeCodec, TapeRecorder};
pub use vg5000::{
    CPU_FREQUENCY, DisplayInfo, ROM_SIZE, VDP_TICKS_PER_CPU_TICK, Vg5000, display_info,
};
