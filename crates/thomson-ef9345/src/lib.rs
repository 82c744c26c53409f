//! Thomson EF9345 semi-graphic display processor.
//!
//! The EF9345 generates a 40 or 80 column character display from its own
//! 16K address space (8K fitted on the VG5000µ). The CPU talks to it through
//! eight direct registers R0-R7 over a multiplexed address/data bus; a
//! further eight indirect registers configure the display and are reached
//! through the IND command.
//!
//! # Bus protocol (Intel mode, as wired on the VG5000µ)
//!
//! - AS falling: latch the address byte from AD0-AD7, the DS level and the
//!   execute flag (address bit 3).
//! - DS falling: on a read cycle, drive direct register `address & 7`.
//! - R/W falling: on a write cycle with address bit 5 set, store the bus
//!   byte into direct register `address & 7`.
//! - R/W rising: if the execute flag is set, run the command in R0.
//!
//! Strobes are handled on edges only. The chip is ticked three times per
//! CPU cycle and would otherwise repeat a transfer while a strobe is held.
//!
//! # Timing
//!
//! - 12 MHz clock, 768 ticks (64 µs) per line
//! - 262 or 312 lines per frame (TGS bit 1)
//! - HS low for the first 120 ticks (10 µs) of every line
//! - VS low on lines 0 and 1
//! - 250 active lines at the end of the frame: 25 rows of 10 lines, row 0
//!   being the service row
//! - one 8-pixel cell per µs over the first 40 µs of an active line
//!
//! # Framebuffer
//!
//! 320x250 bytes, one palette index per pixel. Only the 40-column
//! alphanumeric path is rendered; 80-column and variable-length codes are
//! not implemented.

mod address;
mod command;
mod palette;
mod pins;
mod registers;
mod render;
mod row;

pub use address::{ap_address, mp_address, transcode, triplet_address};
pub use command::{Command, CommandOutcome};
pub use palette::PALETTE;
pub use pins::{Edge, VdpPins};
pub use registers::{CharCode, Config, INDIRECT_NAMES, Registers};
pub use row::{Quadrant, Triplet};

use emu_core::{Bus, MemoryMap, Observable, Value, parse_address};
use tracing::{debug, trace, warn};

use crate::registers::{MAT, PAT, R0, R1, R2, R6, R7, ROR, TGS};
use crate::render::{CELL_HEIGHT, CELL_WIDTH};
use crate::row::COLUMNS;

/// Crystal frequency.
pub const FREQUENCY: u64 = 12_000_000;

/// Ticks in one microsecond.
const TICKS_PER_US: u16 = (FREQUENCY / 1_000_000) as u16;

/// Ticks per scan line (64 µs).
pub const TICKS_PER_LINE: u16 = TICKS_PER_US * 64;

/// HS is held low for this many ticks at the start of each line (10 µs).
pub const HBLANK_TICKS: u16 = TICKS_PER_US * 10;

/// Lines at the end of the frame that carry the picture.
pub const ACTIVE_LINES: u16 = 250;

/// Framebuffer dimensions.
pub const FB_WIDTH: u32 = 320;
pub const FB_HEIGHT: u32 = ACTIVE_LINES as u32;

/// Video RAM fitted on the board.
pub const VRAM_SIZE: usize = 0x2000;

/// Charset ROM size.
pub const CHARSET_SIZE: usize = 0x2000;

const ROWS: u16 = 25;
const VS_LINES: u16 = 2;
const MAT_CURSOR: u8 = 0x40;
const PLANE: u16 = 0x0400;

/// Thomson EF9345.
pub struct Ef9345 {
    regs: Registers,
    config: Config,
    /// Pin state after the last tick.
    pins: VdpPins,

    /// Address byte latched on the last AS falling edge.
    latched_address: u8,
    /// DS level latched with the address. High selects Intel mode.
    latched_ds: bool,
    execution_flag: bool,
    last_command: Option<(Command, CommandOutcome)>,

    vram: MemoryMap,
    charset: MemoryMap,

    line_tick: u16,
    line: u16,
    row_buffer: [Triplet; COLUMNS],
    quadrants: [Quadrant; COLUMNS],
    loaded_row: Option<u16>,

    framebuffer: Vec<u8>,
}

impl Ef9345 {
    /// Create a chip with an optional charset ROM image. Anything past
    /// 8K is ignored; a missing or short image reads as zero.
    #[must_use]
    pub fn new(charset: Option<&[u8]>) -> Self {
        let mut image = vec![0u8; CHARSET_SIZE];
        if let Some(data) = charset {
            let len = data.len().min(CHARSET_SIZE);
            image[..len].copy_from_slice(&data[..len]);
        }
        let mut charset = MemoryMap::new();
        charset.map_rom(0x0000, &image);

        let mut vdp = Self {
            regs: Registers::default(),
            config: Config::default(),
            pins: VdpPins::default(),
            latched_address: 0,
            latched_ds: false,
            execution_flag: false,
            last_command: None,
            vram: MemoryMap::new(),
            charset,
            line_tick: 0,
            line: 0,
            row_buffer: [Triplet::default(); COLUMNS],
            quadrants: [Quadrant::Normal; COLUMNS],
            loaded_row: None,
            framebuffer: vec![0; (FB_WIDTH * FB_HEIGHT) as usize],
        };
        vdp.reset();
        vdp
    }

    /// Return to the power-on state. The charset ROM is kept.
    pub fn reset(&mut self) {
        self.regs = Registers::default();
        self.config = Config::from_registers(&self.regs);
        self.pins = VdpPins::default();
        self.latched_address = 0;
        self.latched_ds = false;
        self.execution_flag = false;
        self.last_command = None;
        self.vram.clear();
        self.vram.map_ram(0x0000, VRAM_SIZE);
        self.line_tick = 0;
        self.line = 0;
        self.row_buffer = [Triplet::default(); COLUMNS];
        self.quadrants = [Quadrant::Normal; COLUMNS];
        self.loaded_row = None;
        self.framebuffer.fill(0);
    }

    /// Advance one 12 MHz tick.
    ///
    /// `pins` carries the strobes and AD0-AD7 driven by the board. The
    /// returned pins hold the data driven on a read, the sync outputs and
    /// the rest of the input unchanged.
    pub fn tick(&mut self, pins: VdpPins) -> VdpPins {
        let pins = self.bus_transfer(pins);
        let pins = self.beam_update(pins);
        self.pins = pins;
        pins
    }

    fn bus_transfer(&mut self, mut pins: VdpPins) -> VdpPins {
        let previous = self.pins;

        if pins.edge(previous, VdpPins::AS) == Edge::Falling {
            self.latched_address = pins.mux_data();
            self.latched_ds = pins.is_high(VdpPins::DS);
            self.execution_flag = self.latched_address & 0x08 != 0;
        }

        // Only Intel mode (DS high at AS time) is wired on the VG5000µ
        if pins.edge(previous, VdpPins::DS) == Edge::Falling && self.latched_ds {
            let index = usize::from(self.latched_address & 0x07);
            // R0 status is not emulated and reads as zero
            let data = if index == R0 { 0x00 } else { self.regs.direct[index] };
            pins.set_mux_data(data);
        }

        match pins.edge(previous, VdpPins::RW) {
            Edge::Falling if self.latched_ds && self.latched_address & 0x20 != 0 => {
                let index = usize::from(self.latched_address & 0x07);
                self.regs.direct[index] = pins.mux_data();
            }
            // The datasheet starts commands on DS rising; the VG5000µ ROM
            // never follows a command with a read, so R/W rising is used.
            Edge::Rising if self.execution_flag => {
                self.execute();
            }
            _ => {}
        }

        pins
    }

    /// Run the command held in R0.
    ///
    /// # Panics
    ///
    /// Panics on the two opcodes the chip does not define.
    pub fn execute(&mut self) -> CommandOutcome {
        let r0 = self.regs.direct[R0];
        let Some(command) = Command::decode(r0) else {
            panic!("EF9345: unknown command code {r0:#04X}");
        };
        trace!(r0, command = command.mnemonic(), "EF9345 command");

        let outcome = match command {
            Command::Krg { read, increment } => {
                let address = mp_address(&self.regs.direct);
                if read {
                    self.regs.direct[R1] = self.vram.peek(address);
                    self.regs.direct[R2] = self.vram.peek(address + PLANE);
                } else {
                    self.vram.write(address, self.regs.direct[R1]);
                    self.vram.write(address + PLANE, self.regs.direct[R2]);
                }
                if increment {
                    address::increment_mp_x(&mut self.regs.direct, false);
                }
                CommandOutcome::Executed
            }
            Command::Oct { read, aux, increment } => {
                let address = if aux {
                    ap_address(&self.regs.direct)
                } else {
                    mp_address(&self.regs.direct)
                };
                if read {
                    self.regs.direct[R1] = self.vram.peek(address);
                } else {
                    self.vram.write(address, self.regs.direct[R1]);
                }
                if increment {
                    if aux {
                        address::increment_ap_x(&mut self.regs.direct);
                    } else {
                        address::increment_mp_x(&mut self.regs.direct, true);
                    }
                }
                CommandOutcome::Executed
            }
            Command::Ind { register, read } => {
                if read {
                    self.regs.direct[R1] = self.regs.indirect[register];
                } else {
                    self.regs.indirect[register] = self.regs.direct[R1];
                }
                self.recompute_configuration();
                CommandOutcome::Executed
            }
            Command::Iny => {
                address::increment_mp_y(&mut self.regs.direct);
                CommandOutcome::Executed
            }
            _ => {
                warn!(r0, command = command.mnemonic(), "EF9345 command not implemented");
                CommandOutcome::NotImplemented
            }
        };

        self.last_command = Some((command, outcome));
        outcome
    }

    fn recompute_configuration(&mut self) {
        self.config = Config::from_registers(&self.regs);
        debug!(
            lines_per_frame = self.config.lines_per_frame,
            char_code = self.config.char_code_bits,
            block_origin = self.config.block_origin,
            origin_row = self.config.origin_row,
            "EF9345 configuration"
        );
    }

    fn beam_update(&mut self, mut pins: VdpPins) -> VdpPins {
        let lines_per_frame = self.config.lines_per_frame;

        self.line_tick = (self.line_tick + 1) % TICKS_PER_LINE;
        if self.line_tick == 0 {
            self.line = (self.line + 1) % lines_per_frame;
        }

        pins.set(VdpPins::PC_VS, self.line >= VS_LINES);
        pins.set(VdpPins::HVS_HS, self.line_tick >= HBLANK_TICKS);

        let first_active = self.config.first_active_line();
        if self.line < first_active || self.line >= lines_per_frame {
            return pins;
        }

        let active_line = self.line - first_active;
        let row = active_line / CELL_HEIGHT;

        // TODO: fetch during the last line of the previous row as the chip does
        if self.loaded_row != Some(row) {
            self.loaded_row = Some(row);
            if row == 0 {
                self.quadrants = [Quadrant::Normal; COLUMNS];
            }
            if row < ROWS {
                self.load_row(row as u8);
                row::compute_quadrants(&self.row_buffer, &mut self.quadrants);
            }
        }

        let columns_end = COLUMNS as u16 * TICKS_PER_US;
        if self.line_tick < columns_end && self.line_tick % TICKS_PER_US == 0 {
            let x = (self.line_tick / TICKS_PER_US) as usize;
            let cursor = self.cursor_at(x as u8, row as u8);
            let offset = usize::from(active_line) * FB_WIDTH as usize + x * CELL_WIDTH;
            render::render_cell(
                &mut self.framebuffer[offset..],
                self.row_buffer[x],
                self.quadrants[x],
                active_line % CELL_HEIGHT,
                cursor,
                &self.charset,
            );
        }

        pins
    }

    fn load_row(&mut self, row: u8) {
        let y = row::memory_row(row, self.config.origin_row);
        let z = self.config.block_origin;
        self.row_buffer = match self.config.char_code() {
            Some(CharCode::Short40) => row::load_40_short(&self.vram, y, z),
            Some(CharCode::Long40) => row::load_40_long(&self.vram, y, z),
            Some(code @ (CharCode::Var40 | CharCode::Short80 | CharCode::Long80)) => {
                unimplemented!("EF9345: {} character code", code.name())
            }
            None => panic!(
                "EF9345: unknown character code {}",
                self.config.char_code_bits
            ),
        };
    }

    fn cursor_at(&self, x: u8, row: u8) -> bool {
        if self.regs.indirect[MAT] & MAT_CURSOR == 0 {
            return false;
        }
        let cursor_x = self.regs.direct[R7] & 0x3F;
        let cursor_y = self.regs.direct[R6] & 0x1F;
        if cursor_x != x {
            return false;
        }
        if row == 0 {
            cursor_y == 0
        } else {
            cursor_y >= 8 && cursor_y == row::memory_row(row, self.config.origin_row)
        }
    }

    #[must_use]
    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    #[must_use]
    pub fn direct(&self, index: usize) -> u8 {
        self.regs.direct[index & 7]
    }

    #[must_use]
    pub fn indirect(&self, index: usize) -> u8 {
        self.regs.indirect[index & 7]
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn pins(&self) -> VdpPins {
        self.pins
    }

    #[must_use]
    pub fn line(&self) -> u16 {
        self.line
    }

    #[must_use]
    pub fn line_tick(&self) -> u16 {
        self.line_tick
    }

    #[must_use]
    pub fn last_command(&self) -> Option<(Command, CommandOutcome)> {
        self.last_command
    }

    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    #[must_use]
    pub fn framebuffer_width(&self) -> u32 {
        FB_WIDTH
    }

    #[must_use]
    pub fn framebuffer_height(&self) -> u32 {
        FB_HEIGHT
    }

    /// Video RAM, readable without side effects.
    #[must_use]
    pub fn vram(&self) -> &MemoryMap {
        &self.vram
    }

    /// Video RAM for direct loading (tests, snapshots).
    pub fn vram_mut(&mut self) -> &mut MemoryMap {
        &mut self.vram
    }

    /// Move the beam, e.g. to start a test just before a given line.
    pub fn set_position(&mut self, line: u16, line_tick: u16) {
        self.line = line % self.config.lines_per_frame;
        self.line_tick = line_tick % TICKS_PER_LINE;
    }
}

impl Observable for Ef9345 {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("vram.") {
            return parse_address(rest).map(|a| Value::U8(self.vram.peek(a)));
        }
        if let Some(n) = path.strip_prefix('r').and_then(|n| n.parse::<usize>().ok()) {
            return (n < 8).then(|| Value::U8(self.regs.direct[n]));
        }
        match path {
            "rom" => Some(self.regs.indirect[registers::ROM].into()),
            "tgs" => Some(self.regs.indirect[TGS].into()),
            "mat" => Some(self.regs.indirect[MAT].into()),
            "pat" => Some(self.regs.indirect[PAT].into()),
            "dor" => Some(self.regs.indirect[registers::DOR].into()),
            "ror" => Some(self.regs.indirect[ROR].into()),
            "line" => Some(self.line.into()),
            "line_tick" => Some(self.line_tick.into()),
            "lines_per_frame" => Some(self.config.lines_per_frame.into()),
            "interlaced" => Some(self.config.interlaced.into()),
            "composite_sync" => Some(self.config.composite_sync.into()),
            "char_code" => Some(
                self.config
                    .char_code()
                    .map_or("unknown", CharCode::name)
                    .into(),
            ),
            "block_origin" => Some(self.config.block_origin.into()),
            "origin_row" => Some(self.config.origin_row.into()),
            "latched_address" => Some(self.latched_address.into()),
            "latched_ds" => Some(self.latched_ds.into()),
            "execution_flag" => Some(self.execution_flag.into()),
            "last_command" => Some(
                self.last_command
                    .map_or("none", |(command, _)| command.mnemonic())
                    .into(),
            ),
            "vs" => Some(self.pins.is_high(VdpPins::PC_VS).into()),
            "hs" => Some(self.pins.is_high(VdpPins::HVS_HS).into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "r0",
            "r1",
            "r2",
            "r3",
            "r4",
            "r5",
            "r6",
            "r7",
            "rom",
            "tgs",
            "mat",
            "pat",
            "dor",
            "ror",
            "line",
            "line_tick",
            "lines_per_frame",
            "interlaced",
            "composite_sync",
            "char_code",
            "block_origin",
            "origin_row",
            "latched_address",
            "latched_ds",
            "execution_flag",
            "last_command",
            "vs",
            "hs",
            "vram.<address>",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{R3, R4, R5};

    /// Drive a full Intel-mode register access: AS pulse with the address,
    /// then a DS (read) or R/W (write) pulse. Each phase lasts three ticks.
    struct Driver {
        vdp: Ef9345,
        pins: VdpPins,
    }

    impl Driver {
        fn new() -> Self {
            let mut pins = VdpPins::default();
            pins.set(VdpPins::DS, true);
            pins.set(VdpPins::RW, true);
            Self {
                vdp: Ef9345::new(None),
                pins,
            }
        }

        fn hold(&mut self, ticks: usize) {
            for _ in 0..ticks {
                self.pins = self.vdp.tick(self.pins);
            }
        }

        fn latch(&mut self, address: u8) {
            self.pins.set_mux_data(address);
            self.pins.set(VdpPins::AS, true);
            self.hold(3);
            self.pins.set(VdpPins::AS, false);
            self.hold(3);
        }

        fn write(&mut self, address: u8, value: u8) {
            self.latch(0x20 | address);
            self.pins.set_mux_data(value);
            self.pins.set(VdpPins::RW, false);
            self.hold(3);
            self.pins.set(VdpPins::RW, true);
            self.hold(3);
        }

        fn read(&mut self, register: u8) -> u8 {
            self.latch(register);
            self.pins.set_mux_data(0xEE);
            self.pins.set(VdpPins::DS, false);
            self.hold(3);
            let data = self.pins.mux_data();
            self.pins.set(VdpPins::DS, true);
            self.hold(3);
            data
        }

        /// Write R0 with the execute bit set.
        fn command(&mut self, r0: u8) {
            self.write(0x08, r0);
        }

        fn write_indirect(&mut self, register: u8, value: u8) {
            self.write(1, value);
            self.command(0x80 | register);
        }

        fn read_indirect(&mut self, register: u8) -> u8 {
            self.command(0x88 | register);
            self.read(1)
        }
    }

    #[test]
    fn direct_register_round_trip() {
        let mut d = Driver::new();
        for n in 1..8u8 {
            d.write(n, 0x10 + n);
        }
        for n in 1..8u8 {
            assert_eq!(d.read(n), 0x10 + n, "R{n}");
        }
    }

    #[test]
    fn r0_reads_zero() {
        let mut d = Driver::new();
        d.write(0, 0x91);
        assert_eq!(d.vdp.direct(R0), 0x91);
        assert_eq!(d.read(0), 0x00);
    }

    #[test]
    fn write_without_bit5_is_ignored() {
        let mut d = Driver::new();
        d.latch(0x03);
        d.pins.set_mux_data(0x55);
        d.pins.set(VdpPins::RW, false);
        d.hold(3);
        d.pins.set(VdpPins::RW, true);
        d.hold(3);
        assert_eq!(d.vdp.direct(R3), 0);
    }

    #[test]
    fn motorola_mode_is_ignored() {
        let mut d = Driver::new();
        d.pins.set(VdpPins::DS, false);
        d.latch(0x21);
        d.pins.set(VdpPins::DS, true);
        d.hold(3);
        d.pins.set_mux_data(0x77);
        d.pins.set(VdpPins::RW, false);
        d.hold(3);
        assert_eq!(d.vdp.direct(R1), 0);
    }

    #[test]
    fn latch_without_execute_bit_runs_nothing() {
        let mut d = Driver::new();
        d.write(0, 0xB0);
        assert_eq!(d.vdp.last_command(), None);
        assert_eq!(d.vdp.query("execution_flag"), Some(Value::Bool(false)));
    }

    #[test]
    fn indirect_round_trip_and_config() {
        let mut d = Driver::new();
        assert_eq!(d.vdp.config().lines_per_frame, 262);

        d.write_indirect(TGS as u8, 0x02);
        assert_eq!(d.vdp.config().lines_per_frame, 312);
        assert_eq!(d.read_indirect(TGS as u8), 0x02);

        d.write_indirect(TGS as u8, 0x00);
        assert_eq!(d.vdp.config().lines_per_frame, 262);

        d.write_indirect(ROR as u8, 0x28);
        assert_eq!(d.vdp.config().origin_row, 8);
        assert_eq!(d.vdp.config().block_origin, 2);
        d.write_indirect(MAT as u8, 0x40);
        assert_eq!(d.read_indirect(MAT as u8), 0x40);
        assert_eq!(d.read_indirect(ROR as u8), 0x28);
    }

    #[test]
    fn krg_writes_two_planes_and_increments() {
        let mut d = Driver::new();
        d.write(6, 8);
        d.write(7, 39);
        d.write(1, 0x41);
        d.write(2, 0x07);
        d.command(0x03); // KRG write, auto-increment

        let address = mp_address(&[0, 0, 0, 0, 0, 0, 8, 39]);
        assert_eq!(d.vdp.vram().peek(address), 0x41);
        assert_eq!(d.vdp.vram().peek(address + PLANE), 0x07);
        // Column wraps without touching the row
        assert_eq!(d.vdp.direct(R7), 0);
        assert_eq!(d.vdp.direct(R6), 8);
        assert_eq!(
            d.vdp.last_command(),
            Some((Command::Krg { read: false, increment: true }, CommandOutcome::Executed))
        );

        d.write(7, 39);
        d.command(0x0A); // KRG read, no increment
        assert_eq!(d.read(1), 0x41);
        assert_eq!(d.read(2), 0x07);
        assert_eq!(d.vdp.direct(R7), 39);
    }

    #[test]
    fn oct_mp_carries_into_row() {
        let mut d = Driver::new();
        d.write(6, 31);
        d.write(7, 39);
        d.write(1, 0x99);
        d.command(0x31); // OCT write MP, increment
        assert_eq!(d.vdp.vram().peek(mp_address(&[0, 0, 0, 0, 0, 0, 31, 39])), 0x99);
        assert_eq!(d.vdp.direct(R7), 0);
        assert_eq!(d.vdp.direct(R6), 8);
    }

    #[test]
    fn oct_aux_pointer() {
        let mut d = Driver::new();
        d.write(4, 10);
        d.write(5, 3);
        d.write(1, 0x5A);
        d.command(0x35); // OCT write AP, increment
        let address = ap_address(&[0, 0, 0, 0, 10, 3, 0, 0]);
        assert_eq!(d.vdp.vram().peek(address), 0x5A);
        assert_eq!(d.vdp.direct(R5), 4);
        assert_eq!(d.vdp.direct(R7), 0);

        d.write(5, 3);
        d.write(1, 0);
        d.command(0x3C); // OCT read AP
        assert_eq!(d.vdp.direct(R1), 0x5A);
        assert_eq!(d.vdp.direct(R4), 10);
    }

    #[test]
    fn iny_wraps_to_eight() {
        let mut d = Driver::new();
        d.write(6, 0x80 | 31);
        d.command(0xB0);
        assert_eq!(d.vdp.direct(R6), 0x80 | 8);
    }

    #[test]
    fn unimplemented_command_leaves_state() {
        let mut d = Driver::new();
        d.write(1, 0x12);
        d.write(6, 9);
        let before = *d.vdp.registers();
        d.command(0x50); // KRL
        let mut after = *d.vdp.registers();
        assert_eq!(d.vdp.last_command(), Some((Command::Krl, CommandOutcome::NotImplemented)));
        after.direct[R0] = before.direct[R0];
        assert_eq!(after, before);
    }

    #[test]
    #[should_panic(expected = "unknown command code")]
    fn undefined_opcode_panics() {
        let mut d = Driver::new();
        d.command(0xA0);
    }

    /// Run the beam onto the first active line, which loads the service row.
    fn enter_active_window(d: &mut Driver) {
        let first = d.vdp.config().first_active_line();
        d.vdp.set_position(first - 1, TICKS_PER_LINE - 1);
        d.hold(1);
    }

    #[test]
    #[should_panic(expected = "character code")]
    fn variable_40_code_is_not_rendered() {
        let mut d = Driver::new();
        d.write_indirect(TGS as u8, 0x40);
        assert_eq!(d.vdp.config().char_code(), Some(CharCode::Var40));
        enter_active_window(&mut d);
    }

    #[test]
    #[should_panic(expected = "character code")]
    fn short_80_code_is_not_rendered() {
        let mut d = Driver::new();
        d.write_indirect(TGS as u8, 0x80);
        assert_eq!(d.vdp.config().char_code(), Some(CharCode::Short80));
        enter_active_window(&mut d);
    }

    #[test]
    #[should_panic(expected = "unknown character code 5")]
    fn undefined_code_selector_panics() {
        let mut d = Driver::new();
        d.write_indirect(PAT as u8, 0x80);
        d.write_indirect(TGS as u8, 0x40);
        assert_eq!(d.vdp.config().char_code(), None);
        enter_active_window(&mut d);
    }

    #[test]
    fn double_size_cells_reach_the_framebuffer() {
        let mut charset = vec![0u8; CHARSET_SIZE];
        charset[usize::from(crate::render::glyph_address(0x41, 0))] = 0b1000_0001;
        let mut vdp = Ef9345::new(Some(&charset));

        // Service row, 40 long code: two white-on-black 'A' in double size
        for x in 0..2 {
            let address = triplet_address(x, 0, 0);
            vdp.vram_mut().write(address, 0x41);
            vdp.vram_mut().write(address + PLANE, 0x0A);
            vdp.vram_mut().write(address + 2 * PLANE, 0x70);
        }

        let first = vdp.config().first_active_line();
        vdp.set_position(first - 1, TICKS_PER_LINE - 1);
        for _ in 0..3 * TICKS_PER_LINE {
            vdp.tick(VdpPins::default());
        }

        let width = FB_WIDTH as usize;
        let fb = vdp.framebuffer();
        // Top half of the glyph, each slice doubled in both directions
        for line in 0..2 {
            let pixels = &fb[line * width..line * width + 16];
            assert_eq!(&pixels[..8], &[7, 7, 0, 0, 0, 0, 0, 0], "line {line}");
            assert_eq!(&pixels[8..], &[0, 0, 0, 0, 0, 0, 7, 7], "line {line}");
        }
        assert_eq!(&fb[2 * width..2 * width + 16], &[0; 16]);
    }

    #[test]
    fn sync_timing() {
        let mut vdp = Ef9345::new(None);
        let pins = VdpPins::default();
        let total = u32::from(TICKS_PER_LINE) * 262;
        for _ in 0..total {
            let out = vdp.tick(pins);
            assert_eq!(out.is_high(VdpPins::PC_VS), vdp.line() >= 2, "line {}", vdp.line());
            assert_eq!(
                out.is_high(VdpPins::HVS_HS),
                vdp.line_tick() >= HBLANK_TICKS,
                "tick {}",
                vdp.line_tick()
            );
        }
        // Back at the start of the frame
        assert_eq!(vdp.line(), 0);
        assert_eq!(vdp.line_tick(), 0);
    }

    #[test]
    fn frame_length_follows_tgs() {
        let mut d = Driver::new();
        d.write_indirect(TGS as u8, 0x02);
        d.vdp.set_position(311, TICKS_PER_LINE - 1);
        d.hold(1);
        assert_eq!(d.vdp.line(), 0);

        d.write_indirect(TGS as u8, 0x00);
        d.vdp.set_position(261, TICKS_PER_LINE - 1);
        d.hold(1);
        assert_eq!(d.vdp.line(), 0);
    }

    #[test]
    fn renders_cursor_cell_in_service_row() {
        let mut vdp = Ef9345::new(None);
        // Short 40 code, cursor enabled at (0, 0), block 0
        vdp.regs.indirect[PAT] = 0x80;
        vdp.regs.indirect[MAT] = MAT_CURSOR;
        vdp.recompute_configuration();

        // Service row cell 0: code 0x20, white on black
        let address = triplet_address(0, 0, 0);
        vdp.vram_mut().write(address, 0x07);
        vdp.vram_mut().write(address + PLANE, 0x20);

        let first = vdp.config().first_active_line();
        vdp.set_position(first - 1, TICKS_PER_LINE - 1);
        vdp.tick(VdpPins::default());

        // Blank glyph inverted by the cursor: all foreground
        assert_eq!(&vdp.framebuffer()[..8], &[7; 8]);
        // Next cell is rendered one µs later
        assert_eq!(vdp.framebuffer()[8], 0);
    }

    #[test]
    fn unused_registers_are_reachable() {
        let mut d = Driver::new();
        d.write_indirect(5, 0xAB);
        assert_eq!(d.vdp.indirect(5), 0xAB);
        assert_eq!(d.vdp.config(), &Config::default());
    }

    #[test]
    fn query_paths_resolve() {
        let mut d = Driver::new();
        d.write(6, 0x2A);
        assert_eq!(d.vdp.query("r6"), Some(Value::U8(0x2A)));
        assert_eq!(d.vdp.query("r8"), None);
        assert_eq!(d.vdp.query("lines_per_frame"), Some(Value::U16(262)));
        assert_eq!(d.vdp.query("char_code"), Some(Value::from("40 long")));
        assert_eq!(d.vdp.query("vram.0x0000"), Some(Value::U8(0)));
        assert_eq!(d.vdp.query("vram.0x3000"), Some(Value::U8(0xFF)));
        for path in d.vdp.query_paths() {
            if !path.contains('<') {
                assert!(d.vdp.query(path).is_some(), "{path}");
            }
        }
    }

    #[test]
    fn reset_keeps_charset() {
        let mut charset = vec![0u8; CHARSET_SIZE];
        charset[0x0800] = 0xA5;
        let mut vdp = Ef9345::new(Some(&charset));
        vdp.vram_mut().write(0x10, 0x33);
        vdp.reset();
        assert_eq!(vdp.vram().peek(0x10), 0);
        assert_eq!(vdp.charset.peek(0x0800), 0xA5);
    }
}
