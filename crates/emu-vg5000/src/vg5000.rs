//! The VG5000µ board: Z80, EF9345, 7807 decoder, keyboard and cassette.
//!
//! One system tick is one 4 MHz CPU cycle. Within it the board routes the
//! CPU's memory request, decodes the I/O lines, runs the VDP for three of
//! its 12 MHz ticks and merges whatever drives the data bus back into the
//! CPU pins.
//!
//! | Range         | Device              |
//! |---------------|---------------------|
//! | 0x0000-0x3FFF | BASIC ROM           |
//! | 0x4000-0xFFFF | RAM                 |
//! | I/O 0x8F      | EF9345 address (OUT) |
//! | I/O 0xCF      | EF9345 data (IN/OUT) |
//! | I/O 0x80-0x87 | keyboard (IN)       |
//! | I/O 0xA0/0xAF | cassette (IN/OUT)   |
//!
//! VS from the EF9345 drives INT. The "triangle" key drives NMI for the
//! rest of the current execution quantum.

use emu_core::{
    Bus, MasterClock, MemoryMap, Observable, PinCpu, Tickable, Ticks, Value, Z80Pins,
    parse_address,
};
use format_k7::K7Error;
use thomson_ef9345::{Ef9345, FB_HEIGHT, FB_WIDTH, PALETTE, VdpPins};
use tracing::{debug, info};

use crate::config::{DebugHook, Vg5000Config, Vg5000Model};
use crate::decoder::{self, ServiceBus};
use crate::keyboard::Keyboard;
use crate::tape::TapeRecorder;

/// Z80 clock in Hz.
pub const CPU_FREQUENCY: u64 = 4_000_000;

const CPU_CLOCK: MasterClock = MasterClock::new(CPU_FREQUENCY);

/// EF9345 ticks per system tick.
pub const VDP_TICKS_PER_CPU_TICK: u64 =
    CPU_CLOCK.ratio_to(MasterClock::new(thomson_ef9345::FREQUENCY));

pub const ROM_SIZE: usize = 0x4000;
const RAM_BASE: u16 = 0x4000;
const RAM_SIZE: usize = 0xC000;

/// Address line selecting the keyboard decoder (low = keyboard).
const KEYBOARD_A3: u32 = 3;

/// Philips VG5000µ.
pub struct Vg5000<C> {
    model: Vg5000Model,
    cpu: C,
    /// CPU pins as returned by the last system tick.
    cpu_pins: Z80Pins,
    memory: MemoryMap,
    vdp: Ef9345,
    /// VDP pins after the last system tick.
    vdp_pins: VdpPins,
    service_bus: ServiceBus,
    keyboard: Keyboard,
    tape: TapeRecorder,
    nmi: bool,
    debug: Option<DebugHook>,
    tick_count: u64,
}

impl<C: PinCpu<Pins = Z80Pins>> Vg5000<C> {
    /// Build the board around `cpu` and reset it.
    #[must_use]
    pub fn new(cpu: C, config: Vg5000Config) -> Self {
        let mut rom = vec![0xFF; ROM_SIZE];
        let len = config.rom.len().min(ROM_SIZE);
        rom[..len].copy_from_slice(&config.rom[..len]);
        if config.rom.len() != ROM_SIZE {
            debug!(size = config.rom.len(), "ROM image resized to 16K");
        }

        let mut memory = MemoryMap::new();
        memory.map_rom(0x0000, &rom);
        memory.map_ram(RAM_BASE, RAM_SIZE);

        let charset = (!config.charset.is_empty()).then_some(config.charset.as_slice());
        let vdp = Ef9345::new(charset);

        let mut system = Self {
            model: config.model,
            cpu,
            cpu_pins: Z80Pins::new(),
            memory,
            vdp_pins: vdp.pins(),
            vdp,
            service_bus: ServiceBus::IDLE,
            keyboard: Keyboard::new(),
            tape: TapeRecorder::new(),
            nmi: false,
            debug: config.debug,
            tick_count: 0,
        };
        system.reset();
        system
    }

    /// Reset the CPU and the VDP. Memory contents, keys and tape are kept.
    pub fn reset(&mut self) {
        info!(model = ?self.model, "VG5000µ reset");
        self.cpu_pins = self.cpu.reset();
        self.vdp.reset();
        self.vdp_pins = self.vdp.pins();
        self.service_bus = ServiceBus::IDLE;
        self.nmi = false;
    }

    /// Run for `micro_seconds` of emulated time.
    ///
    /// With a debug hook installed its stop flag is checked before every
    /// tick and its callback runs after every tick. Returns the number of
    /// system ticks actually executed.
    pub fn exec(&mut self, micro_seconds: u64) -> u64 {
        let ticks = CPU_CLOCK.us_to_ticks(micro_seconds);

        let executed = match self.debug.take() {
            None => self.tick_until(ticks, |_| false),
            Some(mut hook) => {
                let mut done = 0;
                while done < ticks.get() && !hook.stopped.get() {
                    self.tick();
                    (hook.callback)(self.cpu_pins);
                    done += 1;
                }
                self.debug = Some(hook);
                Ticks::new(done)
            }
        };

        self.nmi = false;
        self.keyboard.update();
        executed.get()
    }

    fn step(&mut self, pins: Z80Pins) -> Z80Pins {
        let mut pins = self.cpu.tick(pins);

        if pins.is_set(Z80Pins::MREQ) {
            let address = pins.address();
            if pins.is_set(Z80Pins::RD) {
                pins.set_data(self.memory.read(address));
            } else if pins.is_set(Z80Pins::WR) {
                self.memory.write(address, pins.data());
            }
        }

        let (mut vdp_pins, service) = decoder::decode(pins, self.vdp.pins());
        self.service_bus = service;

        // AD0-AD7 follow D0-D7 whatever the cycle
        vdp_pins.set_mux_data(pins.data());
        for _ in 0..VDP_TICKS_PER_CPU_TICK {
            vdp_pins = self.vdp.tick(vdp_pins);
        }

        if !vdp_pins.is_high(VdpPins::DS) {
            pins.set_data(vdp_pins.mux_data());
        }

        if service.keyboard() && !pins.address_bit(KEYBOARD_A3) {
            let column = (pins.address() & 0x07) as u8;
            pins.set_data(!self.keyboard.scan(column));
        }

        pins.set(Z80Pins::INT, !vdp_pins.is_high(VdpPins::PC_VS));
        self.vdp_pins = vdp_pins;

        pins.set(Z80Pins::NMI, self.nmi);

        self.tape.tick(service, pins)
    }

    /// Insert a K7 image. A rejected image leaves the current tape in.
    pub fn insert_tape(&mut self, data: &[u8]) -> Result<(), K7Error> {
        self.tape.insert_tape(data)
    }

    pub fn eject_tape(&mut self) {
        self.tape.eject_tape();
    }

    /// Press a host key (ASCII, see [`crate::keyboard`]).
    pub fn key_down(&mut self, code: u8) {
        self.keyboard.key_down(code);
    }

    pub fn key_up(&mut self, code: u8) {
        self.keyboard.key_up(code);
    }

    /// The "triangle" key raises NMI until the end of the next `exec`.
    pub fn triangle_key_pressed(&mut self) {
        self.nmi = true;
    }

    pub fn set_debug_hook(&mut self, hook: Option<DebugHook>) {
        self.debug = hook;
    }

    /// Indexed framebuffer, one byte per pixel (see [`PALETTE`]).
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        self.vdp.framebuffer()
    }

    #[must_use]
    pub fn framebuffer_width(&self) -> u32 {
        self.vdp.framebuffer_width()
    }

    #[must_use]
    pub fn framebuffer_height(&self) -> u32 {
        self.vdp.framebuffer_height()
    }

    #[must_use]
    pub fn model(&self) -> Vg5000Model {
        self.model
    }

    #[must_use]
    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    #[must_use]
    pub fn cpu_pins(&self) -> Z80Pins {
        self.cpu_pins
    }

    #[must_use]
    pub fn vdp(&self) -> &Ef9345 {
        &self.vdp
    }

    pub fn vdp_mut(&mut self) -> &mut Ef9345 {
        &mut self.vdp
    }

    #[must_use]
    pub fn vdp_pins(&self) -> VdpPins {
        self.vdp_pins
    }

    #[must_use]
    pub fn service_bus(&self) -> ServiceBus {
        self.service_bus
    }

    #[must_use]
    pub fn memory(&self) -> &MemoryMap {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryMap {
        &mut self.memory
    }

    #[must_use]
    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    #[must_use]
    pub fn tape(&self) -> &TapeRecorder {
        &self.tape
    }

    /// System ticks since power-on.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

impl<C: PinCpu<Pins = Z80Pins>> Tickable for Vg5000<C> {
    fn tick(&mut self) {
        self.cpu_pins = self.step(self.cpu_pins);
        self.tick_count += 1;
    }
}

/// What a frontend needs to show the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayInfo<'a> {
    pub width: u32,
    pub height: u32,
    pub bytes_per_pixel: u32,
    /// Indexed pixels, only with a running system.
    pub framebuffer: Option<&'a [u8]>,
    /// RGBA colours (`0xRRGGBBAA`) for the indices, only with a running
    /// system.
    pub palette: Option<&'a [u32]>,
}

/// Display geometry, usable before a system exists.
#[must_use]
pub fn display_info<C>(system: Option<&Vg5000<C>>) -> DisplayInfo<'_> {
    DisplayInfo {
        width: FB_WIDTH,
        height: FB_HEIGHT,
        bytes_per_pixel: 1,
        framebuffer: system.map(|s| s.vdp.framebuffer()),
        palette: system.map(|_| &PALETTE[..]),
    }
}

impl<C: PinCpu<Pins = Z80Pins> + Observable> Observable for Vg5000<C> {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("vdp.") {
            self.vdp.query(rest)
        } else if let Some(rest) = path.strip_prefix("tape.") {
            self.tape.query(rest)
        } else if let Some(rest) = path.strip_prefix("memory.") {
            parse_address(rest).map(|a| Value::U8(self.memory.peek(a)))
        } else {
            match path {
                "model" => Some(format!("{:?}", self.model).into()),
                "tick_count" => Some(self.tick_count.into()),
                "pins.address" => Some(self.cpu_pins.address().into()),
                "pins.data" => Some(self.cpu_pins.data().into()),
                "int" => Some(self.cpu_pins.is_set(Z80Pins::INT).into()),
                "nmi" => Some(self.nmi.into()),
                "service_bus" => Some(self.service_bus.0.into()),
                "keyboard.pressed" => Some(Value::Array(
                    self.keyboard.pressed().map(Value::from).collect(),
                )),
                _ => None,
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<cpu_paths>",
            "vdp.<ef9345_paths>",
            "tape.<tape_paths>",
            "memory.<address>",
            "model",
            "tick_count",
            "pins.address",
            "pins.data",
            "int",
            "nmi",
            "service_bus",
            "keyboard.pressed",
        ]
    }
}
