//! Byte-addressable read/write interface.

/// Byte-addressable read/write interface.
///
/// Anything that answers to a 16-bit address implements this: the system
/// memory map, a chip's private video RAM, a charset ROM window. Reads take
/// `&mut self` so implementations may track access side effects.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}
