//! Pin-level CPU trait.

/// A CPU core driven at the pin level.
///
/// Each call to `tick()` advances one clock cycle. The CPU receives the pin
/// state produced by the rest of the system on the previous cycle (data bus,
/// INT, NMI, WAIT) and returns its own outputs (address bus, MREQ, IORQ, RD,
/// WR, data on writes). The system owns all routing between the returned
/// pins and memory or peripherals; the CPU never sees a bus object.
pub trait PinCpu {
    /// The pin bus layout of this CPU.
    type Pins: Copy;

    /// Advance the CPU by one clock cycle.
    fn tick(&mut self, pins: Self::Pins) -> Self::Pins;

    /// Reset the CPU and return the pins to feed into the first tick.
    fn reset(&mut self) -> Self::Pins;
}
