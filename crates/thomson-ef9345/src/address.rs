//! Video RAM address transcoding.
//!
//! The EF9345 addresses its 16K memory space through (X, Y, Z) triples:
//! X is the column (0-39), Y the memory row (0-1 service rows, 8-31 bulk
//! rows), Z the block. The mapping from triple to physical offset
//! interleaves bits differently for the service rows and for the left and
//! right parts of the bulk (datasheet figure 11, table 2).
//!
//! `transcode` is the only place that knows the interleaving. The memory
//! pointer (MP: R6, R7), the auxiliary pointer (AP: R4, R5) and the row
//! fetch during display all go through it.

use crate::registers::{R4, R5, R6, R7};

/// Interleave column `x`, row `y` and block bit `b0` into address bits
/// 3-10. Bits 0-2 (low X) and 11-13 (high Z) are added by the callers.
#[must_use]
pub fn transcode(x: u8, y: u8, b0: bool) -> u16 {
    let x = u16::from(x);
    let y = u16::from(y);
    let b0 = u16::from(b0);
    let mut address = 0;

    if y >= 8 {
        address |= b0 << 10;
        if x & 0b10_0000 != 0 {
            address |= (y & 0b111) << 5;
            address |= y & 0b1_1000;
        } else {
            address |= x & 0b1_1000;
            address |= (y & 0b1_1111) << 5;
        }
    } else if y & 1 != 0 {
        let not_x4_x5 = (!x & 0b11_0000) >> 1;
        address |= 1 << 7;
        address |= not_x4_x5;
        if b0 == 0 {
            address |= (x & 0b1000) << 7;
        } else {
            address |= 1 << 10;
        }
    } else {
        address |= b0 << 10;
        address |= (x & 0b11_1000) << 2;
    }
    address
}

/// Physical address of the memory pointer.
///
/// X = R7 bits 0-5, Y = R6 bits 0-4, Z = {R6.7, R6.5, R7.6, R7.7}.
#[must_use]
pub fn mp_address(direct: &[u8; 8]) -> u16 {
    let x = direct[R7] & 0x3F;
    debug_assert!(x < 40, "EF9345: MP column {x} out of range");
    let y = direct[R6] & 0x1F;
    let b0 = direct[R7] & 0x80 != 0;

    let high_z = u16::from((direct[R7] & 0x40) >> 6) // b1
        | u16::from((direct[R6] & 0x20) >> 4) // d0
        | u16::from((direct[R6] & 0x80) >> 5); // d1
    u16::from(x & 0x07) | transcode(x, y, b0) | (high_z << 11)
}

/// Physical address of the auxiliary pointer.
///
/// X = R5 bits 0-5, Y = R4 bits 0-4, Z = {R6.6, R4.5, R5.6, R5.7}.
#[must_use]
pub fn ap_address(direct: &[u8; 8]) -> u16 {
    let x = direct[R5] & 0x3F;
    debug_assert!(x < 40, "EF9345: AP column {x} out of range");
    let y = direct[R4] & 0x1F;
    let b0 = direct[R5] & 0x80 != 0;

    let high_z = u16::from((direct[R5] & 0x40) >> 6) // b'1
        | u16::from((direct[R4] & 0x20) >> 4) // d'0
        | u16::from((direct[R6] & 0x40) >> 4); // d'1
    u16::from(x & 0x07) | transcode(x, y, b0) | (high_z << 11)
}

/// Physical address of a character triplet fetched during display.
#[must_use]
pub fn triplet_address(x: u8, y: u8, z: u8) -> u16 {
    let high_z = u16::from(z & 0b1110);
    u16::from(x & 0x07) | transcode(x & 0x3F, y & 0x1F, z & 1 != 0) | (high_z << 10)
}

/// Map a display row (1-24) to a memory row through the origin YOR.
/// Bulk rows wrap from 31 back to 8.
#[must_use]
pub fn wrap_row(row: u8) -> u8 {
    let mut row = row;
    while row > 31 {
        row -= 24;
    }
    row
}

/// Increment the MP row: 31 wraps to 8.
pub fn increment_mp_y(direct: &mut [u8; 8]) {
    let y = wrap_row((direct[R6] & 0x1F) + 1);
    direct[R6] = (direct[R6] & 0xE0) | y;
}

/// Increment the MP column modulo 40, carrying into the row on wrap when
/// `carry_y` is set.
pub fn increment_mp_x(direct: &mut [u8; 8], carry_y: bool) {
    let x = ((direct[R7] & 0x3F) + 1) % 40;
    direct[R7] = (direct[R7] & 0xC0) | x;
    if x == 0 && carry_y {
        increment_mp_y(direct);
    }
}

/// Increment the AP column modulo 40. The AP never carries.
pub fn increment_ap_x(direct: &mut [u8; 8]) {
    let x = ((direct[R5] & 0x3F) + 1) % 40;
    direct[R5] = (direct[R5] & 0xC0) | x;
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    fn full_address(x: u8, y: u8, b0: bool) -> u16 {
        u16::from(x & 7) | transcode(x, y, b0)
    }

    #[test]
    fn bulk_left_part_is_linear() {
        // X < 32: X in bits 0-4, Y in bits 5-9
        assert_eq!(full_address(0, 8, false), 8 << 5);
        assert_eq!(full_address(31, 31, false), (31 << 5) | 31);
        assert_eq!(full_address(5, 9, true), 0x400 | (9 << 5) | 5);
    }

    #[test]
    fn bulk_right_part_packs_rows() {
        // X >= 32: low Y in bits 5-7, Y3-Y4 in bits 3-4
        assert_eq!(full_address(32, 8, false), 0b0_0000_1000);
        assert_eq!(full_address(39, 31, false), (7 << 5) | 0b1_1000 | 7);
    }

    #[test]
    fn service_rows() {
        assert_eq!(full_address(0, 0, false), 0);
        assert_eq!(full_address(39, 0, false), (4 << 5) | 7);
        // Odd service row: bit 7 set, inverted X4/X5 in bits 3-4
        assert_eq!(full_address(0, 1, false), 0x80 | 0x18);
        assert_eq!(full_address(8, 1, false), 0x400 | 0x80 | 0x18);
        assert_eq!(full_address(0, 1, true), 0x400 | 0x80 | 0x18);
    }

    #[test]
    fn bulk_rows_are_distinct_within_a_plane() {
        for b0 in [false, true] {
            let mut seen = HashSet::new();
            for y in 8..32 {
                for x in 0..40 {
                    assert!(seen.insert(full_address(x, y, b0)), "collision at x={x} y={y}");
                }
            }
        }
    }

    #[test]
    fn service_rows_are_distinct_within_a_plane() {
        for b0 in [false, true] {
            let mut seen = HashSet::new();
            for y in 0..2 {
                for x in 0..40 {
                    assert!(seen.insert(full_address(x, y, b0)), "collision at x={x} y={y}");
                }
            }
        }
    }

    #[test]
    fn mp_uses_r6_r7() {
        let mut direct = [0u8; 8];
        direct[R6] = 8;
        direct[R7] = 3;
        assert_eq!(mp_address(&direct), (8 << 5) | 3);

        // d0 (R6.5) and b1 (R7.6) select the high Z bits
        direct[R6] = 0x20 | 8;
        direct[R7] = 0x40 | 3;
        assert_eq!(mp_address(&direct), (0b011 << 11) | (8 << 5) | 3);
    }

    #[test]
    fn ap_uses_r4_r5() {
        let mut direct = [0u8; 8];
        direct[R4] = 9;
        direct[R5] = 0x80 | 2;
        assert_eq!(ap_address(&direct), 0x400 | (9 << 5) | 2);

        // d'1 comes from R6.6
        direct[R6] = 0x40;
        assert_eq!(ap_address(&direct), (0b100 << 11) | 0x400 | (9 << 5) | 2);
    }

    #[test]
    fn triplet_block_origin() {
        assert_eq!(triplet_address(1, 8, 0), (8 << 5) | 1);
        assert_eq!(triplet_address(1, 8, 1), 0x400 | (8 << 5) | 1);
        assert_eq!(triplet_address(1, 8, 2), 0x800 | (8 << 5) | 1);
    }

    #[test]
    fn column_wraps_without_carry() {
        let mut direct = [0u8; 8];
        direct[R6] = 8;
        direct[R7] = 0x80 | 39;
        increment_mp_x(&mut direct, false);
        assert_eq!(direct[R7], 0x80);
        assert_eq!(direct[R6], 8);
    }

    #[test]
    fn column_wrap_carries_into_row() {
        let mut direct = [0u8; 8];
        direct[R6] = 0xA0 | 12;
        direct[R7] = 39;
        increment_mp_x(&mut direct, true);
        assert_eq!(direct[R7], 0);
        assert_eq!(direct[R6], 0xA0 | 13);
    }

    #[test]
    fn row_wraps_to_eight() {
        let mut direct = [0u8; 8];
        direct[R6] = 0x40 | 31;
        increment_mp_y(&mut direct);
        assert_eq!(direct[R6], 0x40 | 8);

        direct[R6] = 0;
        for expected in 1..=31 {
            increment_mp_y(&mut direct);
            assert_eq!(direct[R6], expected);
        }
    }

    #[test]
    fn aux_column_stays_in_r5() {
        let mut direct = [0u8; 8];
        direct[R5] = 0xC0 | 39;
        direct[R7] = 0x11;
        increment_ap_x(&mut direct);
        assert_eq!(direct[R5], 0xC0);
        assert_eq!(direct[R7], 0x11);
    }

    proptest! {
        #[test]
        fn prop_offset_fits_video_ram(x in 0u8..40, y in 0u8..32, b0 in any::<bool>()) {
            prop_assert!(full_address(x, y, b0) < 0x2000);
        }

        #[test]
        fn prop_column_increment_stays_below_40(x in 0u8..40, high in 0u8..4) {
            let mut direct = [0u8; 8];
            direct[R7] = (high << 6) | x;
            increment_mp_x(&mut direct, false);
            prop_assert_eq!(direct[R7] & 0x3F, (x + 1) % 40);
            prop_assert_eq!(direct[R7] >> 6, high);
        }
    }
}
