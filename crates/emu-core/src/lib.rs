//! Core traits and types for cycle-accurate emulation.
//!
//! Everything ticks at a declared crystal frequency and all component timing
//! derives from it. Components talk to each other through pin buses: plain
//! bit vectors whose layout is fixed per chip, wrapped in typed accessors.

mod bus;
mod clock;
mod cpu;
mod memory;
mod observable;
mod pins;

pub use bus::Bus;
pub use clock::{MasterClock, Tickable, Ticks};
pub use cpu::PinCpu;
pub use memory::{MemoryMap, PAGE_SIZE};
pub use observable::{Observable, Value, parse_address};
pub use pins::Z80Pins;
