//! Clock configuration and the tick unit.

/// A count of clock ticks.
///
/// Always expressed in ticks of the clock that drives the component doing
/// the counting (CPU T-states for a system loop, pixel clocks for a video
/// chip).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(pub u64);

impl Ticks {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl core::ops::Add for Ticks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl core::ops::AddAssign for Ticks {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

/// Crystal configuration for one clock domain.
///
/// Each chip on a board runs from a crystal (or a division of one). Timing
/// tables are derived from the declared frequency once, as constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterClock {
    /// Crystal frequency in Hz (e.g. `4_000_000` for the VG5000µ Z80).
    pub frequency_hz: u64,
}

impl MasterClock {
    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// Number of ticks in one microsecond (integer division).
    #[must_use]
    pub const fn ticks_per_us(&self) -> u64 {
        self.frequency_hz / 1_000_000
    }

    /// Convert a wall-clock duration in microseconds into a tick count.
    #[must_use]
    pub const fn us_to_ticks(&self, micro_seconds: u64) -> Ticks {
        Ticks::new(self.frequency_hz * micro_seconds / 1_000_000)
    }

    /// How many ticks of `faster` fit in one tick of this clock.
    ///
    /// # Panics
    ///
    /// Panics if `faster` does not run at an integer multiple of this clock.
    #[must_use]
    pub const fn ratio_to(&self, faster: MasterClock) -> u64 {
        assert!(
            faster.frequency_hz % self.frequency_hz == 0,
            "clock ratio must be an integer"
        );
        faster.frequency_hz / self.frequency_hz
    }
}

/// A component that can be advanced by clock ticks.
pub trait Tickable {
    /// Advance the component by one tick of its own clock.
    fn tick(&mut self);

    /// Advance the component by `count` ticks, checking `stop` once per
    /// iteration before each tick. Returns the number of ticks executed.
    fn tick_until(&mut self, count: Ticks, mut stop: impl FnMut(&Self) -> bool) -> Ticks
    where
        Self: Sized,
    {
        let mut done = 0;
        while done < count.get() && !stop(self) {
            self.tick();
            done += 1;
        }
        Ticks::new(done)
    }
}
