//! Headless capture: PNG screenshots.

use std::error::Error;
use std::fs;
use std::io::BufWriter;
use std::path::Path;

use emu_core::{PinCpu, Z80Pins};
use thomson_ef9345::PALETTE;

use crate::Vg5000;

/// Expand the indexed framebuffer to RGBA bytes through the palette.
#[must_use]
pub fn framebuffer_rgba(indexed: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(indexed.len() * 4);
    for &index in indexed {
        rgba.extend_from_slice(&PALETTE[usize::from(index & 0x07)].to_be_bytes());
    }
    rgba
}

/// Save the current framebuffer as a PNG file.
pub fn save_screenshot<C: PinCpu<Pins = Z80Pins>>(
    system: &Vg5000<C>,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let width = system.framebuffer_width();
    let height = system.framebuffer_height();

    let file = fs::File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&framebuffer_rgba(system.framebuffer()))?;
    Ok(())
}
