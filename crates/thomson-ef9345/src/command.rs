//! Command decoding.
//!
//! R0 holds the command: the high nibble selects the opcode, the low nibble
//! carries parameter bits (read/write, pointer choice, auto-increment).
//!
//! | R0    | Mnemonic        | Status          |
//! |-------|-----------------|-----------------|
//! | `0x0_`| KRF/KRG/CLF/CLG | KRG only        |
//! | `0x1_`| KRE             | not implemented |
//! | `0x2_`| KRV             | not implemented |
//! | `0x3_`| OCT             | implemented     |
//! | `0x4_`| KRC             | not implemented |
//! | `0x5_`| KRL             | not implemented |
//! | `0x6_`| EXP             | not implemented |
//! | `0x7_`| CMP             | not implemented |
//! | `0x8_`| IND             | implemented     |
//! | `0x9_`| VSM/VRM/NOP     | not implemented |
//! | `0xA_`| -               | impossible      |
//! | `0xB_`| INY             | implemented     |
//! | `0xC_`| -               | impossible      |
//! | `0xD_`| MVB             | not implemented |
//! | `0xE_`| MVD             | not implemented |
//! | `0xF_`| MVT             | not implemented |

const PARAM_READ: u8 = 0x08;
const PARAM_AUX: u8 = 0x04;
const PARAM_INCREMENT: u8 = 0x01;

/// A decoded EF9345 command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Read/write character code, 40 long, via MP.
    Krf,
    /// Read/write R1 and R2 at the MP address and the next plane.
    Krg { read: bool, increment: bool },
    /// Clear page, 24 bits.
    Clf,
    /// Clear page, 16 bits.
    Clg,
    Kre,
    Krv,
    /// Read/write one byte through R1 at the MP or AP address.
    Oct { read: bool, aux: bool, increment: bool },
    Krc,
    Krl,
    Exp,
    Cmp,
    /// Transfer R1 to or from an indirect register.
    Ind { register: usize, read: bool },
    Vsm,
    Vrm,
    Nop,
    /// Increment the MP row.
    Iny,
    Mvb,
    Mvd,
    Mvt,
}

/// Result of running a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Executed,
    /// Decoded but not emulated. Registers and video RAM are untouched.
    NotImplemented,
}

impl Command {
    /// Decode the value of R0. Returns `None` for the two opcodes the chip
    /// does not define (`0xA_`, `0xC_`).
    #[must_use]
    pub const fn decode(r0: u8) -> Option<Self> {
        let param = r0 & 0x0F;
        let read = param & PARAM_READ != 0;
        let increment = param & PARAM_INCREMENT != 0;

        let command = match r0 & 0xF0 {
            0x00 => match param & 0x06 {
                0x00 => Self::Krf,
                0x02 => Self::Krg { read, increment },
                0x04 => Self::Clf,
                _ => Self::Clg,
            },
            0x10 => Self::Kre,
            0x20 => Self::Krv,
            0x30 => Self::Oct {
                read,
                aux: param & PARAM_AUX != 0,
                increment,
            },
            0x40 => Self::Krc,
            0x50 => Self::Krl,
            0x60 => Self::Exp,
            0x70 => Self::Cmp,
            0x80 => Self::Ind {
                register: (param & 0x07) as usize,
                read,
            },
            0x90 => {
                if param & 0x08 != 0 {
                    Self::Vsm
                } else if param & 0x04 != 0 {
                    Self::Vrm
                } else {
                    Self::Nop
                }
            }
            0xB0 => Self::Iny,
            0xD0 => Self::Mvb,
            0xE0 => Self::Mvd,
            0xF0 => Self::Mvt,
            _ => return None,
        };
        Some(command)
    }

    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Krf => "KRF",
            Self::Krg { .. } => "KRG",
            Self::Clf => "CLF",
            Self::Clg => "CLG",
            Self::Kre => "KRE",
            Self::Krv => "KRV",
            Self::Oct { .. } => "OCT",
            Self::Krc => "KRC",
            Self::Krl => "KRL",
            Self::Exp => "EXP",
            Self::Cmp => "CMP",
            Self::Ind { .. } => "IND",
            Self::Vsm => "VSM",
            Self::Vrm => "VRM",
            Self::Nop => "NOP",
            Self::Iny => "INY",
            Self::Mvb => "MVB",
            Self::Mvd => "MVD",
            Self::Mvt => "MVT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn krg_parameters() {
        assert_eq!(
            Command::decode(0x03),
            Some(Command::Krg { read: false, increment: true })
        );
        assert_eq!(
            Command::decode(0x0A),
            Some(Command::Krg { read: true, increment: false })
        );
        assert_eq!(Command::decode(0x00), Some(Command::Krf));
        assert_eq!(Command::decode(0x05), Some(Command::Clf));
        assert_eq!(Command::decode(0x06), Some(Command::Clg));
    }

    #[test]
    fn oct_parameters() {
        assert_eq!(
            Command::decode(0x31),
            Some(Command::Oct { read: false, aux: false, increment: true })
        );
        assert_eq!(
            Command::decode(0x3C),
            Some(Command::Oct { read: true, aux: true, increment: false })
        );
    }

    #[test]
    fn ind_register_index() {
        assert_eq!(Command::decode(0x81), Some(Command::Ind { register: 1, read: false }));
        assert_eq!(Command::decode(0x8F), Some(Command::Ind { register: 7, read: true }));
    }

    #[test]
    fn undefined_opcodes() {
        for param in 0..16 {
            assert_eq!(Command::decode(0xA0 | param), None);
            assert_eq!(Command::decode(0xC0 | param), None);
        }
    }

    #[test]
    fn every_defined_opcode_has_a_mnemonic() {
        for r0 in 0..=255u8 {
            if let Some(command) = Command::decode(r0) {
                assert_eq!(command.mnemonic().len(), 3, "{r0:#04X}");
            }
        }
        assert_eq!(Command::decode(0x99).map(Command::mnemonic), Some("VSM"));
        assert_eq!(Command::decode(0x95).map(Command::mnemonic), Some("VRM"));
        assert_eq!(Command::decode(0x91).map(Command::mnemonic), Some("NOP"));
        assert_eq!(Command::decode(0xB0), Some(Command::Iny));
    }
}
