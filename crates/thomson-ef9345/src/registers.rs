//! Register file and cached display configuration.

/// Direct register indices (CPU-addressable).
pub const R0: usize = 0;
pub const R1: usize = 1;
pub const R2: usize = 2;
pub const R3: usize = 3;
pub const R4: usize = 4;
pub const R5: usize = 5;
pub const R6: usize = 6;
pub const R7: usize = 7;

/// Indirect register indices (reachable through the IND command only).
pub const ROM: usize = 0;
pub const TGS: usize = 1;
pub const MAT: usize = 2;
pub const PAT: usize = 3;
pub const DOR: usize = 4;
pub const ROR: usize = 7;

/// Names of the indirect registers, `-` for the unused slots.
pub const INDIRECT_NAMES: [&str; 8] = ["ROM", "TGS", "MAT", "PAT", "DOR", "-", "-", "ROR"];

/// Both register banks. Each bank is one array; the index constants above
/// are the only names for its slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    pub direct: [u8; 8],
    pub indirect: [u8; 8],
}

/// Character code selected by TGS bits 6-7 and PAT bit 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharCode {
    /// 40 characters per row, 24-bit code (C, B, A bytes).
    Long40,
    /// 40 characters per row, variable-length code.
    Var40,
    /// 80 characters per row, 12-bit code.
    Short80,
    /// 80 characters per row, 16-bit code.
    Long80,
    /// 40 characters per row, 16-bit code with delimiter attributes.
    Short40,
}

impl CharCode {
    /// Decode the 3-bit selector `PAT.7 TGS.7 TGS.6`. Values 5-7 have no
    /// meaning on the chip.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Long40),
            1 => Some(Self::Var40),
            2 => Some(Self::Short80),
            3 => Some(Self::Long80),
            4 => Some(Self::Short40),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Long40 => "40 long",
            Self::Var40 => "40 var",
            Self::Short80 => "80 short",
            Self::Long80 => "80 long",
            Self::Short40 => "40 short",
        }
    }
}

/// Configuration derived from the indirect registers.
///
/// Recomputed after every IND command, never per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub lines_per_frame: u16,
    /// TGS bit 0. Decoded but not emulated: frames are always progressive.
    pub interlaced: bool,
    /// TGS bit 2: HVS/HS carries composite sync instead of H sync.
    pub composite_sync: bool,
    /// Raw selector, kept so an impossible value is reported when rendered.
    pub char_code_bits: u8,
    /// ROR bits 5-7 shifted to a Z value with an implicit even block.
    pub block_origin: u8,
    /// ROR bits 0-4, the memory row displayed on screen row 1 (YOR).
    pub origin_row: u8,
}

impl Config {
    #[must_use]
    pub fn from_registers(regs: &Registers) -> Self {
        let tgs = regs.indirect[TGS];
        let pat = regs.indirect[PAT];
        let ror = regs.indirect[ROR];
        Self {
            lines_per_frame: if tgs & 0x02 != 0 { 312 } else { 262 },
            interlaced: tgs & 0x01 != 0,
            composite_sync: tgs & 0x04 != 0,
            char_code_bits: ((tgs >> 6) & 0x03) | ((pat >> 5) & 0x04),
            block_origin: (ror & 0b1110_0000) >> 4,
            origin_row: ror & 0b1_1111,
        }
    }

    #[must_use]
    pub const fn char_code(&self) -> Option<CharCode> {
        CharCode::from_bits(self.char_code_bits)
    }

    /// First raster line of the 250-line active window.
    #[must_use]
    pub const fn first_active_line(&self) -> u16 {
        self.lines_per_frame - crate::ACTIVE_LINES
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_registers(&Registers::default())
    }
}
