use std::fs::File;
use std::io::{Write, BufWriter};
use std::path::Path;
use byteorder::{WriteBytesExt, LittleEndian};
use anyhow::{Result, Context};

const IMAGE_FORMAT_RGBA8888: u32 = 0;
const IMAGE_FORMAT_DXT1: u32 = 13;

/// Flags: CLAMPS | CLAMPT | NOMIP | NOLOD
/// 0x030c = 0000 0011 0000 1100
/// BIT 2: CLAMPS
/// BIT 3: CLAMPT
/// BIT 8: NOMIP
/// BIT 9: NOLOD
/// Bilinear filtering stays on so the cookie edge is smooth.
const FLAGS: u32 = 0x0000030c;

pub const HEADER_SIZE: usize = 96;
const THUMBNAIL_SIZE: usize = 128;
pub const IMAGE_DATA_OFFSET: usize = HEADER_SIZE + THUMBNAIL_SIZE;

pub struct VtfParams {
    pub width: u16,
    pub height: u16,
}

/// Writes raw RGBA8888 data to a VTF file.
/// `data` must hold 4 bytes per pixel (R, G, B, A), i.e. width * height * 4 bytes.
pub fn write_rgba8888_vtf(path: &Path, params: VtfParams, data: &[u8]) -> Result<()> {
    let f = File::create(path).context("Failed to create VTF file")?;
    let mut writer = BufWriter::new(f);
    write_rgba8888(&mut writer, params, data)?;
    writer.flush()?;
    Ok(())
}

pub fn write_rgba8888<W: Write>(writer: &mut W, params: VtfParams, data: &[u8]) -> Result<()> {
    let pixel_count = params.width as usize * params.height as usize;
    if data.len() != pixel_count * 4 {
        anyhow::bail!("Data length mismatch. Expected {} bytes, got {}",
            pixel_count * 4, data.len());
    }

    // --- Calculate Reflectivity ---
    // Average R, G, B in 0..1
    let mut sum = [0.0_f64; 3];
    for chunk in data.chunks_exact(4) {
        sum[0] += chunk[0] as f64;
        sum[1] += chunk[1] as f64;
        sum[2] += chunk[2] as f64;
    }
    let reflectivity = sum.map(|s| (s / (pixel_count.max(1) as f64 * 255.0)) as f32);

    // --- Header (96 bytes) ---
    writer.write_all(b"VTF\0")?; // Signature
    writer.write_u32::<LittleEndian>(7)?; // Version[0] (Major)
    writer.write_u32::<LittleEndian>(4)?; // Version[1] (Minor) -> 7.4
    writer.write_u32::<LittleEndian>(HEADER_SIZE as u32)?;
    writer.write_u16::<LittleEndian>(params.width)?;
    writer.write_u16::<LittleEndian>(params.height)?;
    writer.write_u32::<LittleEndian>(FLAGS)?;
    writer.write_u16::<LittleEndian>(1)?; // Frames
    writer.write_u16::<LittleEndian>(0)?; // First Frame
    writer.write_all(&[0u8; 4])?; // Padding

    // Reflectivity (32-44)
    for r in reflectivity {
        writer.write_f32::<LittleEndian>(r)?;
    }

    writer.write_all(&[0u8; 4])?; // Padding
    writer.write_f32::<LittleEndian>(1.0)?; // Bump scale
    writer.write_u32::<LittleEndian>(IMAGE_FORMAT_RGBA8888)?; // HiRes Format
    writer.write_u8(1)?; // Mip Count
    writer.write_u32::<LittleEndian>(IMAGE_FORMAT_DXT1)?; // LowRes Format
    writer.write_u8(16)?; // LowRes Width
    writer.write_u8(16)?; // LowRes Height
    writer.write_u16::<LittleEndian>(1)?; // Depth

    // Padding (65-67)
    writer.write_all(&[0u8; 3])?;

    // Num Resources (68-71)
    writer.write_u32::<LittleEndian>(2)?;

    // Padding (72-79)
    writer.write_all(&[0u8; 8])?;

    // --- Resource Dictionary (Starts at 80) ---
    // Resource 1: Low Res Image (Thumb)
    writer.write_all(b"\x01\x00\x00")?;
    writer.write_u8(0)?;
    writer.write_u32::<LittleEndian>(HEADER_SIZE as u32)?;

    // Resource 2: Image Data
    writer.write_all(b"\x30\x00\x00")?;
    writer.write_u8(0)?;
    writer.write_u32::<LittleEndian>(IMAGE_DATA_OFFSET as u32)?;

    // --- Body ---

    // 1. Low Res Data (16x16 DXT1 = 128 bytes), black
    writer.write_all(&[0u8; THUMBNAIL_SIZE])?;

    // 2. High Res Data (RGBA8888)
    writer.write_all(data)?;

    Ok(())
}
