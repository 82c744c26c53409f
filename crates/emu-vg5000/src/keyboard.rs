//! VG5000µ keyboard matrix.
//!
//! The keyboard is an 8×8 matrix behind a 74LS156 (7808 on the board).
//! An `IN` from ports 0x80-0x87 selects the RKY line; A0-A2 pick one
//! column and the eight rows come back on the data bus, active low.
//!
//! Host keys are ASCII codes. Two layers map them onto the matrix, the
//! second one pressing SHIFT (row 0, column 2) along with the key.
//!
//! | Code | Key          | Row | Column | Shift |
//! |------|--------------|-----|--------|-------|
//! | 0x01 | Accent       | 0   | 6      | yes   |
//! | 0x02 | EFFE         | 0   | 0      | yes   |
//! | 0x06 | INS          | 0   | 7      |       |
//! | 0x07 | STOP         | 1   | 0      | yes   |
//! | 0x08 | Cursor left  | 0   | 3      |       |
//! | 0x09 | Cursor right | 0   | 4      |       |
//! | 0x0A | Cursor down  | 0   | 5      |       |
//! | 0x0B | Cursor up    | 1   | 6      |       |
//! | 0x0C | EFF          | 7   | 1      |       |
//! | 0x0D | RET          | 1   | 5      |       |
//! | 0x0E | Caps lock    | 1   | 3      |       |
//! | 0x0F | CTRL         | 0   | 6      |       |
//! | 0x20 | Space        | 1   | 2      |       |
//!
//! A released key stays down until the next [`Keyboard::update`], so a
//! press and release inside one execution quantum is still seen by the
//! ROM's scan.

use tracing::debug;

/// Keys held at once; further presses are ignored.
pub const MAX_PRESSED: usize = 4;

/// SHIFT position in the matrix.
pub const SHIFT: KeyPosition = KeyPosition::new(0, 2, false);

/// One string per row, column 7 first. Spaces are unused positions.
const LAYERS: [[&[u8; 8]; 8]; 2] = [
    [
        b"        ",
        b"A     Q ",
        b"Z:1BVCXW",
        b";26543ES",
        b"POIUGF*/",
        b"987,\\]0 ",
        b"D <YTR+-",
        b"MLKHJN =",
    ],
    [
        b"        ",
        b"a     q ",
        b"z*#bvcxw",
        b"@!%$ \"es",
        b"poiugf|_",
        b"( &  [) ",
        b"d >ytr.?",
        b"mlkhjn ^",
    ],
];

const SPECIAL_KEYS: [(u8, KeyPosition); 13] = [
    (0x08, KeyPosition::new(0, 3, false)),
    (0x09, KeyPosition::new(0, 4, false)),
    (0x0A, KeyPosition::new(0, 5, false)),
    (0x0F, KeyPosition::new(0, 6, false)),
    (0x06, KeyPosition::new(0, 7, false)),
    (b' ', KeyPosition::new(1, 2, false)),
    (0x0E, KeyPosition::new(1, 3, false)),
    (0x0D, KeyPosition::new(1, 5, false)),
    (0x0B, KeyPosition::new(1, 6, false)),
    (0x0C, KeyPosition::new(7, 1, false)),
    (0x02, KeyPosition::new(0, 0, true)),
    (0x07, KeyPosition::new(1, 0, true)),
    (0x01, KeyPosition::new(0, 6, true)),
];

/// Where a host key lands in the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPosition {
    /// Data bit driven when the key is down.
    pub row: u8,
    /// Column selected by A0-A2.
    pub column: u8,
    /// Also presses SHIFT.
    pub shift: bool,
}

impl KeyPosition {
    #[must_use]
    pub const fn new(row: u8, column: u8, shift: bool) -> Self {
        Self { row, column, shift }
    }
}

#[derive(Debug, Clone, Copy)]
struct Pressed {
    code: u8,
    position: KeyPosition,
    released: bool,
}

/// Keyboard matrix with the host key map.
#[derive(Debug, Clone)]
pub struct Keyboard {
    keymap: [Option<KeyPosition>; 128],
    pressed: Vec<Pressed>,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyboard {
    #[must_use]
    pub fn new() -> Self {
        let mut keymap = [None; 128];
        for (layer, rows) in LAYERS.iter().enumerate() {
            for (row, keys) in rows.iter().enumerate() {
                for (index, &code) in keys.iter().enumerate() {
                    if code != b' ' {
                        keymap[usize::from(code)] =
                            Some(KeyPosition::new(row as u8, 7 - index as u8, layer > 0));
                    }
                }
            }
        }
        for (code, position) in SPECIAL_KEYS {
            keymap[usize::from(code)] = Some(position);
        }
        Self {
            keymap,
            pressed: Vec::with_capacity(MAX_PRESSED),
        }
    }

    /// Matrix position of a host key code.
    #[must_use]
    pub fn position(&self, code: u8) -> Option<KeyPosition> {
        self.keymap.get(usize::from(code)).copied().flatten()
    }

    pub fn key_down(&mut self, code: u8) {
        let Some(position) = self.position(code) else {
            debug!(code, "keyboard: unmapped key");
            return;
        };
        if let Some(key) = self.pressed.iter_mut().find(|k| k.code == code) {
            key.released = false;
        } else if self.pressed.len() < MAX_PRESSED {
            self.pressed.push(Pressed {
                code,
                position,
                released: false,
            });
        }
    }

    /// Mark a key released. It leaves the matrix on the next update.
    pub fn key_up(&mut self, code: u8) {
        if let Some(key) = self.pressed.iter_mut().find(|k| k.code == code) {
            key.released = true;
        }
    }

    /// Drop released keys. Called once per execution quantum.
    pub fn update(&mut self) {
        self.pressed.retain(|k| !k.released);
    }

    pub fn release_all(&mut self) {
        self.pressed.clear();
    }

    /// Rows with a key down in `column`, active high.
    #[must_use]
    pub fn scan(&self, column: u8) -> u8 {
        self.pressed.iter().fold(0, |mut rows, key| {
            if key.position.column == column {
                rows |= 1 << key.position.row;
            }
            if key.position.shift && SHIFT.column == column {
                rows |= 1 << SHIFT.row;
            }
            rows
        })
    }

    /// Host codes currently held in the matrix.
    pub fn pressed(&self) -> impl Iterator<Item = u8> + '_ {
        self.pressed.iter().map(|k| k.code)
    }
}
