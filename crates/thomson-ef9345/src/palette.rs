//! EF9345 8-colour palette.
//!
//! The chip drives three digital R, G, B outputs. A framebuffer byte holds
//! the 3-bit colour index with R in bit 0, G in bit 1 and B in bit 2.

/// RGBA palette, `0xRRGGBBAA`: 8 entries.
pub const PALETTE: [u32; 8] = [
    0x0000_00FF, // 0: Black
    0xFF00_00FF, // 1: Red
    0x00FF_00FF, // 2: Green
    0xFFFF_00FF, // 3: Yellow
    0x0000_FFFF, // 4: Blue
    0xFF00_FFFF, // 5: Magenta
    0x00FF_FFFF, // 6: Cyan
    0xFFFF_FFFF, // 7: White
];
