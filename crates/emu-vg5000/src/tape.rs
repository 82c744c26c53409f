//! Cassette recorder and its pulse-width decoder.
//!
//! The ROM saves by toggling data bit 0 on the WK7 select. Each toggle
//! ends a pulse; the recorder measures it in system ticks and hands it to
//! the codec, which classifies pulses as long or short:
//!
//! | Pattern          | Meaning                   |
//! |------------------|---------------------------|
//! | long, long       | synchro, or a 0 bit once synchronised |
//! | 4 × short        | 1 bit                     |
//!
//! Bits arrive LSB first, eight per byte, each byte closed by a synchro.
//! Only the write path decodes; reading back from tape is not done yet.

use std::fmt;

use emu_core::{Observable, Value, Z80Pins};
use format_k7::{K7Error, K7Image, MAX_TAPE_SIZE};
use tracing::{debug, info, trace, warn};

use crate::decoder::ServiceBus;

/// Long pulse window in system ticks, both ends exclusive.
pub const LONG_PULSE: (u16, u16) = (1500, 2000);
/// Short pulse window in system ticks, both ends exclusive.
pub const SHORT_PULSE: (u16, u16) = (600, 1000);
/// Pulse samples the codec holds before dropping new ones.
pub const PULSE_CAPACITY: usize = 12;
/// Samples logged and dropped after a header decode error.
pub const ERROR_DRAIN: u8 = 8;

const DATA_BIT: u8 = 0b0001;
const MOTOR_BIT: u8 = 0b0010;
const SOUND_BIT: u8 = 0b1000;

fn is_long(ticks: u16) -> bool {
    ticks > LONG_PULSE.0 && ticks < LONG_PULSE.1
}

fn is_short(ticks: u16) -> bool {
    ticks > SHORT_PULSE.0 && ticks < SHORT_PULSE.1
}

/// Decoder state. The read path will share these states once written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecState {
    #[default]
    InitialSynchro,
    HeaderData,
    SecondSynchro,
    PayloadData,
    Finished,
    Error,
}

impl CodecState {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::InitialSynchro => "initial_synchro",
            Self::HeaderData => "header_data",
            Self::SecondSynchro => "second_synchro",
            Self::PayloadData => "payload_data",
            Self::Finished => "finished",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for CodecState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a tape read select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    NotImplemented,
}

/// Fixed-capacity FIFO of pulse lengths. Oldest samples are consumed first.
#[derive(Debug, Clone, Default)]
pub struct PulseBuffer {
    samples: [u16; PULSE_CAPACITY],
    head: usize,
    len: usize,
}

impl PulseBuffer {
    /// Append a sample. Returns false, keeping the buffer as is, when full.
    pub fn push(&mut self, ticks: u16) -> bool {
        if self.len == PULSE_CAPACITY {
            return false;
        }
        self.samples[(self.head + self.len) % PULSE_CAPACITY] = ticks;
        self.len += 1;
        true
    }

    /// Sample `index` counted from the oldest.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<u16> {
        (index < self.len).then(|| self.samples[(self.head + index) % PULSE_CAPACITY])
    }

    /// Drop the `count` oldest samples.
    pub fn consume(&mut self, count: usize) {
        let count = count.min(self.len);
        self.head = (self.head + count) % PULSE_CAPACITY;
        self.len -= count;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    fn all(&self, count: usize, test: fn(u16) -> bool) -> bool {
        self.len == count && (0..count).filter_map(|i| self.get(i)).all(test)
    }
}

/// Pulse-width decoder for the write path.
#[derive(Debug, Clone, Default)]
pub struct TapeCodec {
    state: CodecState,
    pulses: PulseBuffer,
    current_byte: u8,
    valid_byte: u8,
    bit_count: u8,
    decoded: Vec<u8>,
}

impl TapeCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, including the decoded bytes.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed one pulse length, measured between two toggles of the line.
    pub fn pulse(&mut self, ticks: u16) {
        if !self.pulses.push(ticks) {
            trace!(ticks, "tape: pulse buffer full, sample dropped");
        }

        let consumed = match self.state {
            CodecState::InitialSynchro => {
                let (consumed, found) = self.wait_for_synchro();
                if found {
                    debug!("tape: synchro found");
                    self.state = CodecState::HeaderData;
                }
                consumed
            }
            CodecState::HeaderData if self.bit_count < 8 => self.header_bit(),
            CodecState::HeaderData => {
                let (consumed, found) = self.wait_for_synchro();
                if found {
                    debug!(
                        byte = format_args!("{:#04X}", self.valid_byte),
                        "tape: byte decoded"
                    );
                    if self.decoded.len() < MAX_TAPE_SIZE {
                        self.decoded.push(self.valid_byte);
                    } else {
                        trace!("tape: decoded bytes at tape capacity, byte dropped");
                    }
                }
                consumed
            }
            CodecState::SecondSynchro => {
                self.state = CodecState::PayloadData;
                0
            }
            CodecState::PayloadData => {
                self.state = CodecState::InitialSynchro;
                0
            }
            CodecState::Error if self.bit_count > 0 => {
                warn!(
                    ticks = self.pulses.get(0).unwrap_or_default(),
                    pending = self.pulses.len(),
                    "tape: discarding pulse"
                );
                self.bit_count -= 1;
                1
            }
            CodecState::Error => {
                self.state = CodecState::Finished;
                0
            }
            CodecState::Finished => 0,
        };

        self.pulses.consume(consumed);
    }

    /// Returns (samples consumed, synchro found).
    fn wait_for_synchro(&mut self) -> (usize, bool) {
        if self.pulses.all(2, is_long) {
            self.valid_byte = self.current_byte;
            self.current_byte = 0;
            self.bit_count = 0;
            return (2, true);
        }
        match self.pulses.get(0) {
            // Keep a lone long pulse for the next toggle
            Some(first) if self.pulses.len() == 1 && is_long(first) => (0, false),
            _ if self.pulses.len() == 1 => (1, false),
            _ => {
                warn!(
                    bits = self.bit_count,
                    pending = self.pulses.len(),
                    "tape: synchro lost"
                );
                self.state = CodecState::Error;
                (1, false)
            }
        }
    }

    fn header_bit(&mut self) -> usize {
        if self.pulses.all(2, is_long) {
            self.current_byte >>= 1;
            self.bit_count += 1;
            2
        } else if self.pulses.all(4, is_short) {
            self.current_byte = (self.current_byte >> 1) | 0x80;
            self.bit_count += 1;
            4
        } else if self.pulses.len() >= 4 {
            warn!(bits = self.bit_count, "tape: wrong header data");
            self.state = CodecState::Error;
            self.bit_count = ERROR_DRAIN;
            4
        } else {
            0
        }
    }

    #[must_use]
    pub fn state(&self) -> CodecState {
        self.state
    }

    #[must_use]
    pub fn bit_count(&self) -> u8 {
        self.bit_count
    }

    /// Byte assembled so far.
    #[must_use]
    pub fn current_byte(&self) -> u8 {
        self.current_byte
    }

    /// Last byte closed by a synchro.
    #[must_use]
    pub fn valid_byte(&self) -> u8 {
        self.valid_byte
    }

    #[must_use]
    pub fn pulses(&self) -> &PulseBuffer {
        &self.pulses
    }

    /// Bytes decoded since the last reset, at most one tape's worth.
    #[must_use]
    pub fn decoded(&self) -> &[u8] {
        &self.decoded
    }
}

/// Cassette recorder wired to the WK7/RK7 selects.
#[derive(Debug, Clone)]
pub struct TapeRecorder {
    tape: K7Image,
    codec: TapeCodec,
    motor_on: bool,
    sound_in: bool,
    data_value: bool,
    previous_data_value: bool,
    /// Ticks since the last toggle, saturating.
    tick_counter: u16,
    reading: bool,
    last_read: Option<ReadOutcome>,
}

impl Default for TapeRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TapeRecorder {
    /// A recorder holding a blank tape.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tape: K7Image::blank(),
            codec: TapeCodec::new(),
            motor_on: false,
            sound_in: false,
            data_value: false,
            previous_data_value: false,
            tick_counter: 0,
            reading: false,
            last_read: None,
        }
    }

    /// Insert a K7 image. On failure the current tape stays in.
    pub fn insert_tape(&mut self, data: &[u8]) -> Result<(), K7Error> {
        let image = match K7Image::parse(data) {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "tape rejected");
                return Err(e);
            }
        };
        if let Some(header) = image.header() {
            info!(
                name = %header.name_str(),
                format = header.format,
                version = header.version,
                start_line = %header.start_line_str(),
                protection = header.protection,
                start_address = format_args!("{:#06X}", header.start_address),
                data_length = header.data_length,
                checksum = format_args!("{:#06X}", header.checksum),
                "tape inserted"
            );
        }
        self.tape = image;
        self.rewind();
        Ok(())
    }

    /// Replace the tape with a blank one.
    pub fn eject_tape(&mut self) {
        info!("tape ejected");
        self.tape = K7Image::blank();
        self.rewind();
    }

    fn rewind(&mut self) {
        self.motor_on = false;
        self.tick_counter = 0;
        self.codec.reset();
    }

    /// Advance one system tick.
    ///
    /// `cpu` carries the data bus driven during the select. The pins are
    /// returned unchanged until the read path exists.
    pub fn tick(&mut self, service: ServiceBus, cpu: Z80Pins) -> Z80Pins {
        let write = service.tape_write();
        let read = service.tape_read();
        let data = cpu.data();

        if write {
            self.sound_in = data & SOUND_BIT != 0;
            self.data_value = data & DATA_BIT != 0;
        }
        if write || read {
            self.motor_on = data & MOTOR_BIT != 0;
        }

        if self.motor_on && !self.tape.is_empty() {
            self.tick_counter = self.tick_counter.saturating_add(1);

            if write && self.data_value != self.previous_data_value {
                self.previous_data_value = self.data_value;
                let ticks = self.tick_counter;
                self.tick_counter = 0;
                trace!(ticks, level = self.data_value, "tape: pulse");
                self.codec.pulse(ticks);
                self.sound_in = self.data_value;
            }

            if read && !self.reading {
                self.last_read = Some(self.read());
            }
        }
        self.reading = read;

        cpu
    }

    fn read(&mut self) -> ReadOutcome {
        warn!(state = %self.codec.state(), "tape: read path not implemented");
        ReadOutcome::NotImplemented
    }

    #[must_use]
    pub fn tape(&self) -> &K7Image {
        &self.tape
    }

    #[must_use]
    pub fn codec(&self) -> &TapeCodec {
        &self.codec
    }

    #[must_use]
    pub fn motor_on(&self) -> bool {
        self.motor_on
    }

    /// Level seen by the sound-in input.
    #[must_use]
    pub fn sound_in(&self) -> bool {
        self.sound_in
    }

    #[must_use]
    pub fn tick_counter(&self) -> u16 {
        self.tick_counter
    }

    #[must_use]
    pub fn last_read(&self) -> Option<ReadOutcome> {
        self.last_read
    }
}

impl Observable for TapeRecorder {
    fn query(&self, path: &str) -> Option<Value> {
        let header = self.tape.header();
        match path {
            "state" => Some(self.codec.state.name().into()),
            "motor" => Some(self.motor_on.into()),
            "sound_in" => Some(self.sound_in.into()),
            "data" => Some(self.data_value.into()),
            "tick_counter" => Some(self.tick_counter.into()),
            "pulses" => Some(Value::Array(
                (0..self.codec.pulses.len())
                    .filter_map(|i| self.codec.pulses.get(i))
                    .map(Value::from)
                    .collect(),
            )),
            "bit_count" => Some(self.codec.bit_count.into()),
            "current_byte" => Some(self.codec.current_byte.into()),
            "valid_byte" => Some(self.codec.valid_byte.into()),
            "decoded" => Some(self.codec.decoded.as_slice().into()),
            "size" => Some((self.tape.len() as u32).into()),
            "blank" => Some(self.tape.is_blank().into()),
            "name" => header.map(|h| h.name_str().into()),
            "format" => header.map(|h| h.format.into()),
            "version" => header.map(|h| h.version.into()),
            "start_line" => header.map(|h| h.start_line_str().into()),
            "protection" => header.map(|h| h.protection.into()),
            "check_pos" => header.map(|h| h.check_pos.into()),
            "start_address" => header.map(|h| h.start_address.into()),
            "data_length" => header.map(|h| h.data_length.into()),
            "checksum" => header.map(|h| h.checksum.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "state",
            "motor",
            "sound_in",
            "data",
            "tick_counter",
            "pulses",
            "bit_count",
            "current_byte",
            "valid_byte",
            "decoded",
            "size",
            "blank",
            "name",
            "format",
            "version",
            "start_line",
            "protection",
            "check_pos",
            "start_address",
            "data_length",
            "checksum",
        ]
    }
}
