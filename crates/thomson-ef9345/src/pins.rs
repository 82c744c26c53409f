//! EF9345 pin bus.
//!
//! | Bits  | Signal                                   |
//! |-------|------------------------------------------|
//! | 0-7   | AD0-AD7, multiplexed address/data bus    |
//! | 8     | AS, address strobe (latch on falling)    |
//! | 9     | DS, data strobe (latched by AS)          |
//! | 10    | R/W, read high                           |
//! | 11    | CS/, chip select (tied low on the board) |
//! | 12    | OE/, output enable                       |
//! | 13    | WE/, write enable                        |
//! | 14    | ASM/, memory address strobe              |
//! | 15    | HVS/HS, horizontal sync                  |
//! | 16-23 | ADM0-ADM7, memory address/data           |
//! | 24-29 | AM8-AM13, memory address                 |
//! | 30    | PC/VS, vertical sync                     |
//! | 31-33 | B, G, R                                  |
//!
//! Unlike the Z80 bus, bits hold physical levels: a set bit is a high pin.

/// EF9345 pin levels as a bit vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct VdpPins(pub u64);

/// Transition of one pin between two consecutive ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Steady,
    Rising,
    Falling,
}

impl VdpPins {
    pub const AS: u64 = 1 << 8;
    pub const DS: u64 = 1 << 9;
    pub const RW: u64 = 1 << 10;
    pub const CS: u64 = 1 << 11;
    pub const OE: u64 = 1 << 12;
    pub const WE: u64 = 1 << 13;
    pub const ASM: u64 = 1 << 14;
    pub const HVS_HS: u64 = 1 << 15;
    pub const PC_VS: u64 = 1 << 30;
    pub const B: u64 = 1 << 31;
    pub const G: u64 = 1 << 32;
    pub const R: u64 = 1 << 33;

    const AD_MASK: u64 = 0xFF;

    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Byte on the multiplexed AD0-AD7 bus.
    #[must_use]
    pub const fn mux_data(self) -> u8 {
        (self.0 & Self::AD_MASK) as u8
    }

    pub fn set_mux_data(&mut self, data: u8) {
        self.0 = (self.0 & !Self::AD_MASK) | u64::from(data);
    }

    #[must_use]
    pub const fn is_high(self, mask: u64) -> bool {
        self.0 & mask != 0
    }

    pub fn set(&mut self, mask: u64, high: bool) {
        if high {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    /// How `mask` moved from `previous` to `self`.
    #[must_use]
    pub const fn edge(self, previous: VdpPins, mask: u64) -> Edge {
        match (previous.is_high(mask), self.is_high(mask)) {
            (true, false) => Edge::Falling,
            (false, true) => Edge::Rising,
            _ => Edge::Steady,
        }
    }
}
