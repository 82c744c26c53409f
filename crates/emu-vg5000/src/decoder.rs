//! 7807 I/O decoder (a 74LS138 on the VG5000µ board).
//!
//! The decoder turns Z80 I/O cycles into the EF9345 strobes and the
//! peripheral selects. Enables: G1 = A7, G2/ = not (IORQ and (RD or WR)).
//! Select inputs: A = A5, B = A6, C = WR/ (physical level, high on reads).
//!
//! | Output | Index | Cycle              | Drives         |
//! |--------|-------|--------------------|----------------|
//! | Y0/    | 0     | OUT, A6=0 A5=0     | EF9345 AS (inverted) |
//! | Y1/    | 1     | OUT, A6=0 A5=1     | WK7, cassette write  |
//! | Y2/    | 2     | OUT, A6=1 A5=0     | EF9345 R/W     |
//! | Y4/    | 4     | IN,  A6=0 A5=0     | RKY, keyboard  |
//! | Y5/    | 5     | IN,  A6=0 A5=1     | RK7, cassette read   |
//! | Y6/    | 6     | IN,  A6=1 A5=0     | EF9345 DS      |
//!
//! Outputs are physical: the selected line is low, the others high. With
//! the chip disabled every output is high, which leaves AS low.

use emu_core::Z80Pins;
use thomson_ef9345::VdpPins;

/// Peripheral select lines from the decoder, physical levels.
///
/// | Bit | Line |
/// |-----|------|
/// | 0   | RKY/ |
/// | 1   | RK7/ |
/// | 2   | WK7/ |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceBus(pub u8);

impl ServiceBus {
    pub const RKY: u8 = 1 << 0;
    pub const RK7: u8 = 1 << 1;
    pub const WK7: u8 = 1 << 2;

    /// Nothing selected.
    pub const IDLE: Self = Self(Self::RKY | Self::RK7 | Self::WK7);

    /// Is the active-low line `mask` selected?
    #[must_use]
    pub const fn selected(self, mask: u8) -> bool {
        self.0 & mask == 0
    }

    #[must_use]
    pub const fn keyboard(self) -> bool {
        self.selected(Self::RKY)
    }

    #[must_use]
    pub const fn tape_read(self) -> bool {
        self.selected(Self::RK7)
    }

    #[must_use]
    pub const fn tape_write(self) -> bool {
        self.selected(Self::WK7)
    }
}

impl Default for ServiceBus {
    fn default() -> Self {
        Self::IDLE
    }
}

const A5: u32 = 5;
const A6: u32 = 6;
const A7: u32 = 7;

/// Physical Y0/-Y7/ outputs for the given CPU pins.
#[must_use]
pub fn select_lines(cpu: Z80Pins) -> u8 {
    let g1 = cpu.address_bit(A7);
    let g2_active = cpu.is_set(Z80Pins::IORQ) && cpu.any(Z80Pins::RD | Z80Pins::WR);
    if !(g1 && g2_active) {
        return 0xFF;
    }

    let a = u8::from(cpu.address_bit(A5));
    let b = u8::from(cpu.address_bit(A6));
    let c = u8::from(!cpu.is_set(Z80Pins::WR));
    let index = (c << 2) | (b << 1) | a;
    !(1 << index)
}

/// Route the decoder outputs onto the EF9345 strobes and the service bus.
///
/// Only AS, DS and R/W are touched in `vdp`.
#[must_use]
pub fn decode(cpu: Z80Pins, mut vdp: VdpPins) -> (VdpPins, ServiceBus) {
    let y = select_lines(cpu);

    vdp.set(VdpPins::AS, y & 0x01 == 0);
    vdp.set(VdpPins::DS, y & 0x40 != 0);
    vdp.set(VdpPins::RW, y & 0x04 != 0);

    let mut service = 0;
    if y & 0x10 != 0 {
        service |= ServiceBus::RKY;
    }
    if y & 0x20 != 0 {
        service |= ServiceBus::RK7;
    }
    if y & 0x02 != 0 {
        service |= ServiceBus::WK7;
    }

    (vdp, ServiceBus(service))
}
