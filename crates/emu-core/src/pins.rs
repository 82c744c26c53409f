//! Z80 pin bus.
//!
//! Layout (bit positions in the `u64`):
//!
//! | Bits  | Signal       |
//! |-------|--------------|
//! | 0-15  | A0-A15       |
//! | 16-23 | D0-D7        |
//! | 24    | M1           |
//! | 25    | MREQ         |
//! | 26    | IORQ         |
//! | 27    | RD           |
//! | 28    | WR           |
//! | 29    | HALT         |
//! | 30    | INT          |
//! | 31    | RES          |
//! | 32    | NMI          |
//! | 33    | WAIT         |
//! | 34    | RFSH         |
//!
//! Control lines are stored active-high: a set bit means the signal is
//! asserted, whatever its physical polarity on the chip.

/// Z80 pin state as a bit vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Z80Pins(pub u64);

impl Z80Pins {
    pub const PIN_D0: u32 = 16;
    pub const M1: u64 = 1 << 24;
    pub const MREQ: u64 = 1 << 25;
    pub const IORQ: u64 = 1 << 26;
    pub const RD: u64 = 1 << 27;
    pub const WR: u64 = 1 << 28;
    pub const HALT: u64 = 1 << 29;
    pub const INT: u64 = 1 << 30;
    pub const RES: u64 = 1 << 31;
    pub const NMI: u64 = 1 << 32;
    pub const WAIT: u64 = 1 << 33;
    pub const RFSH: u64 = 1 << 34;

    const ADDR_MASK: u64 = 0xFFFF;
    const DATA_MASK: u64 = 0xFF << Self::PIN_D0;

    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Address bus A0-A15.
    #[must_use]
    pub const fn address(self) -> u16 {
        (self.0 & Self::ADDR_MASK) as u16
    }

    pub fn set_address(&mut self, address: u16) {
        self.0 = (self.0 & !Self::ADDR_MASK) | u64::from(address);
    }

    /// Level of a single address line (0-15).
    #[must_use]
    pub const fn address_bit(self, line: u32) -> bool {
        self.0 & (1 << line) != 0
    }

    /// Data bus D0-D7.
    #[must_use]
    pub const fn data(self) -> u8 {
        ((self.0 & Self::DATA_MASK) >> Self::PIN_D0) as u8
    }

    pub fn set_data(&mut self, data: u8) {
        self.0 = (self.0 & !Self::DATA_MASK) | (u64::from(data) << Self::PIN_D0);
    }

    /// Is every line in `mask` asserted?
    #[must_use]
    pub const fn is_set(self, mask: u64) -> bool {
        self.0 & mask == mask
    }

    /// Is any line in `mask` asserted?
    #[must_use]
    pub const fn any(self, mask: u64) -> bool {
        self.0 & mask != 0
    }

    /// Assert or release the lines in `mask`.
    pub fn set(&mut self, mask: u64, active: bool) {
        if active {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    /// Builder form of `set`, for composing test and trace states.
    #[must_use]
    pub const fn with(self, mask: u64) -> Self {
        Self(self.0 | mask)
    }
}
