//! 8x10 alphanumeric cell rendering.
//!
//! Glyphs sit in the charset ROM from `0x0800`, four characters interleaved
//! per 64-byte block: slice `s` of code `c` is at
//! `0x0800 + (c >> 2) * 0x40 + (c & 3) + s * 4`. Bit 0 of a slice is the
//! leftmost pixel.

use emu_core::MemoryMap;

use crate::row::{Quadrant, Triplet};

pub const CELL_WIDTH: usize = 8;
pub const CELL_HEIGHT: u16 = 10;

const GLYPH_BASE: u16 = 0x0800;

/// Charset ROM address of slice `slice` of character `code`.
#[must_use]
pub const fn glyph_address(code: u8, slice: u16) -> u16 {
    let code = (code & 0x7F) as u16;
    GLYPH_BASE + (code >> 2) * 0x40 + (code & 0x03) + slice * 4
}

/// Glyph slice to draw on line `row_line` (0-9) of a cell. Tall cells
/// stretch half a glyph over the full height.
#[must_use]
pub const fn slice_for(row_line: u16, quadrant: Quadrant) -> u16 {
    let divisor = if quadrant.is_tall() { 2 } else { 1 };
    let offset = if quadrant.is_bottom() { 5 } else { 0 };
    row_line / divisor + offset
}

/// Draw one line of one cell into `out` as palette indices.
pub fn render_cell(
    out: &mut [u8],
    cell: Triplet,
    quadrant: Quadrant,
    row_line: u16,
    cursor: bool,
    charset: &MemoryMap,
) {
    let out = &mut out[..CELL_WIDTH];
    let background = cell.background();
    let foreground = cell.foreground();

    if cell.code() == 0 {
        out.fill(background);
        return;
    }

    let mut slice = charset.peek(glyph_address(cell.code(), slice_for(row_line, quadrant)));
    if cursor {
        slice = !slice;
    }

    let colour = |bit: u8| if bit & 1 != 0 { foreground } else { background };

    if quadrant.is_wide() {
        if quadrant.is_right() {
            slice >>= 4;
        }
        for (n, pair) in out.chunks_exact_mut(2).enumerate() {
            pair.fill(colour(slice >> n));
        }
    } else {
        for (n, pixel) in out.iter_mut().enumerate() {
            *pixel = colour(slice >> n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charset_with(code: u8, slices: &[u8]) -> MemoryMap {
        let mut rom = vec![0u8; 0x2000];
        for (s, &value) in slices.iter().enumerate() {
            rom[usize::from(glyph_address(code, s as u16))] = value;
        }
        let mut map = MemoryMap::new();
        map.map_rom(0x0000, &rom);
        map
    }

    fn cell(code: u8) -> Triplet {
        // Yellow on blue
        Triplet { a: 0x34, b: 0, c: code }
    }

    #[test]
    fn glyph_addresses_interleave() {
        assert_eq!(glyph_address(0x00, 0), 0x0800);
        assert_eq!(glyph_address(0x01, 0), 0x0801);
        assert_eq!(glyph_address(0x04, 0), 0x0840);
        assert_eq!(glyph_address(0x41, 2), 0x0800 + 16 * 0x40 + 1 + 8);
        assert_eq!(glyph_address(0xC1, 0), glyph_address(0x41, 0));
    }

    #[test]
    fn tall_slices() {
        assert_eq!(slice_for(7, Quadrant::Normal), 7);
        assert_eq!(slice_for(7, Quadrant::TallTop), 3);
        assert_eq!(slice_for(7, Quadrant::TallBottom), 8);
        assert_eq!(slice_for(9, Quadrant::BottomRight), 9);
        assert_eq!(slice_for(0, Quadrant::WideLeft), 0);
    }

    #[test]
    fn code_zero_fills_background() {
        let charset = charset_with(0, &[0xFF]);
        let mut out = [0xEE; 8];
        render_cell(&mut out, cell(0x80), Quadrant::Normal, 0, true, &charset);
        assert_eq!(out, [4; 8]);
    }

    #[test]
    fn normal_width_lsb_first() {
        let charset = charset_with(0x41, &[0b0000_0101]);
        let mut out = [0; 8];
        render_cell(&mut out, cell(0x41), Quadrant::Normal, 0, false, &charset);
        assert_eq!(out, [3, 4, 3, 4, 4, 4, 4, 4]);
    }

    #[test]
    fn cursor_inverts() {
        let charset = charset_with(0x41, &[0b0000_0101]);
        let mut out = [0; 8];
        render_cell(&mut out, cell(0x41), Quadrant::Normal, 0, true, &charset);
        assert_eq!(out, [4, 3, 4, 3, 3, 3, 3, 3]);
    }

    #[test]
    fn double_width_halves() {
        let charset = charset_with(0x41, &[0b1000_0001]);
        let mut out = [0; 8];
        render_cell(&mut out, cell(0x41), Quadrant::WideLeft, 0, false, &charset);
        assert_eq!(out, [3, 3, 4, 4, 4, 4, 4, 4]);
        render_cell(&mut out, cell(0x41), Quadrant::WideRight, 0, false, &charset);
        assert_eq!(out, [4, 4, 4, 4, 4, 4, 3, 3]);
    }

    #[test]
    fn writes_exactly_one_cell() {
        let charset = charset_with(0x41, &[0xFF]);
        let mut out = [0xEE; 10];
        render_cell(&mut out, cell(0x41), Quadrant::Normal, 0, false, &charset);
        assert_eq!(&out[8..], &[0xEE, 0xEE]);
    }
}
