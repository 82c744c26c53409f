//! Character row fetch and double-size bookkeeping.
//!
//! At the start of every character row the 40 cells are read from video RAM
//! into a row buffer of (A, B, C) triplets in the 40-long layout, whatever
//! the code in memory:
//!
//! - A: `N F3 F2 F1 I3 B3 B2 B1` (negative, foreground, flash, background)
//! - B: `R U . W C H I` style mode byte (in RAM, underline, width, conceal,
//!   height, insert)
//! - C: character code
//!
//! The 40-short code packs two bytes per cell and relies on delimiter cells
//! to carry background, underline, conceal and insert along the row.

use emu_core::MemoryMap;

use crate::address::triplet_address;

pub const COLUMNS: usize = 40;

const PLANE: u16 = 0x0400;

const B_IN_RAM: u8 = 0x80;
const B_ALPHA: u8 = 0x20;
const B_DOUBLE_WIDTH: u8 = 0x08;
const B_DOUBLE_HEIGHT: u8 = 0x02;

/// One decoded character cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Triplet {
    pub a: u8,
    pub b: u8,
    pub c: u8,
}

impl Triplet {
    #[must_use]
    pub const fn background(self) -> u8 {
        self.a & 0x07
    }

    #[must_use]
    pub const fn foreground(self) -> u8 {
        (self.a & 0x70) >> 4
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        self.c & 0x7F
    }

    #[must_use]
    pub const fn double_width(self) -> bool {
        self.b & B_DOUBLE_WIDTH != 0
    }

    #[must_use]
    pub const fn double_height(self) -> bool {
        self.b & B_DOUBLE_HEIGHT != 0
    }
}

/// Memory row shown on screen row `row`. Row 0 is the service row and
/// always reads memory row 0.
#[must_use]
pub fn memory_row(row: u8, origin_row: u8) -> u8 {
    if row == 0 {
        0
    } else {
        crate::address::wrap_row(origin_row + row - 1)
    }
}

/// Attributes carried from a delimiter to the following cells.
#[derive(Default)]
struct Latched {
    underline: u8,
    conceal: u8,
    insert: u8,
    background: u8,
}

/// Fetch a row in the 40-short code: A' at the triplet address, B' one
/// plane up.
#[must_use]
pub fn load_40_short(vram: &MemoryMap, y: u8, z: u8) -> [Triplet; COLUMNS] {
    let mut row = [Triplet::default(); COLUMNS];
    let mut latched = Latched::default();

    for (x, cell) in (0u8..).zip(row.iter_mut()) {
        let address = triplet_address(x, y, z);
        let a_prime = vram.peek(address);
        let b_prime = vram.peek(address + PLANE);

        if b_prime & 0b1110_0000 == 0b1000_0000 {
            // Delimiter
            latched.underline = (b_prime & 0b100) << 2;
            latched.insert = (b_prime & 0b010) >> 1;
            latched.conceal = (b_prime & 0b001) << 2;
            latched.background = a_prime & 0b111;
            *cell = Triplet {
                a: a_prime,
                b: B_ALPHA | latched.underline | latched.conceal | latched.insert,
                c: 0,
            };
        } else if a_prime & 0x80 != 0 {
            // Semi-graphic
            let a = a_prime & 0x7F;
            latched.background = a & 0b111;
            *cell = Triplet {
                a,
                b: (b_prime & B_IN_RAM) | B_ALPHA | latched.conceal | latched.insert,
                c: b_prime,
            };
        } else {
            let colour = (a_prime & 0b0000_0111) << 4;
            let flash = a_prime & 0b0000_1000;
            let height = (a_prime & 0b0001_0000) >> 3;
            let width = (a_prime & 0b0010_0000) >> 2;
            let negative = (a_prime & 0b0100_0000) << 1;
            *cell = Triplet {
                a: negative | colour | flash | latched.background,
                b: (b_prime & B_IN_RAM)
                    | latched.underline
                    | width
                    | latched.conceal
                    | height
                    | latched.insert,
                c: b_prime,
            };
        }
    }
    row
}

/// Fetch a row in the 40-long code: C, B and A on three consecutive planes.
#[must_use]
pub fn load_40_long(vram: &MemoryMap, y: u8, z: u8) -> [Triplet; COLUMNS] {
    let mut row = [Triplet::default(); COLUMNS];
    for (x, cell) in (0u8..).zip(row.iter_mut()) {
        let address = triplet_address(x, y, z);
        *cell = Triplet {
            c: vram.peek(address),
            b: vram.peek(address + PLANE),
            a: vram.peek(address + 2 * PLANE),
        };
    }
    row
}

/// Part of a double-size group a cell draws.
///
/// The discriminant is a bit set: bit 0 left half, bit 1 right half,
/// bit 2 top half, bit 3 bottom half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Quadrant {
    #[default]
    Normal = 0x0,
    WideLeft = 0x1,
    WideRight = 0x2,
    TallTop = 0x4,
    TopLeft = 0x5,
    TopRight = 0x6,
    TallBottom = 0x8,
    BottomLeft = 0x9,
    BottomRight = 0xA,
}

impl Quadrant {
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn is_wide(self) -> bool {
        self.bits() & 0x3 != 0
    }

    #[must_use]
    pub const fn is_right(self) -> bool {
        self.bits() & 0x2 != 0
    }

    #[must_use]
    pub const fn is_tall(self) -> bool {
        self.bits() & 0xC != 0
    }

    #[must_use]
    pub const fn is_bottom(self) -> bool {
        self.bits() & 0x8 != 0
    }
}

/// Update `quadrants` in place for a freshly loaded row.
///
/// On entry `quadrants` holds the previous row's values (same column
/// history); it is rewritten left to right so the left neighbour is always
/// the current row's.
pub fn compute_quadrants(row: &[Triplet; COLUMNS], quadrants: &mut [Quadrant; COLUMNS]) {
    let mut left = Quadrant::Normal;
    for (cell, quadrant) in row.iter().zip(quadrants.iter_mut()) {
        let wide = cell.double_width();
        let tall = cell.double_height();
        let both = wide && tall;
        let above = *quadrant;

        let next = match (left, above) {
            (Quadrant::TopLeft, _) if both => Quadrant::TopRight,
            (Quadrant::BottomLeft, _) if both => Quadrant::BottomRight,
            (Quadrant::WideLeft, _) if wide => Quadrant::WideRight,
            (_, Quadrant::TallTop) if tall => Quadrant::TallBottom,
            (_, Quadrant::TopLeft) if both => Quadrant::BottomLeft,
            _ if both => Quadrant::TopLeft,
            _ if wide => Quadrant::WideLeft,
            _ if tall => Quadrant::TallTop,
            _ => Quadrant::Normal,
        };
        *quadrant = next;
        left = next;
    }
}
