//! Fixed-layout MRC header encoding and decoding
//!
//! The header occupies exactly 1024 bytes, laid out as 256 little-endian
//! 32-bit words. Some word ranges are reinterpreted as 32-bit floats:
//!
//! | Words | Field |
//! |---|---|
//! | 0-2 | nx, ny, nz (i32) |
//! | 3 | datatype mode code (i32) |
//! | 7-9 | mx, my, mz grid size, mirrors nx, ny, nz (i32) |
//! | 10-12 | cell lengths x, y, z (f32) |
//! | 13-15 | cell angles, fixed 90.0 (f32) |
//! | 16-18 | axis order, fixed [1, 2, 3] (i32) |
//! | 19-21 | dmin, dmax, dmean (f32) |
//! | 52-53 | 'MAP ' magic words (i32) |
//!
//! All unspecified words are zero.

use crate::error::{MrcError, Result};
use crate::types::DataType;
use serde::{Deserialize, Serialize};

/// Size of the MRC header in bytes
pub const HEADER_LEN: usize = 1024;

/// Number of 32-bit words in the header
pub const HEADER_WORDS: usize = 256;

/// The two magic words at word offsets 52 and 53 ('MAP ' tag)
pub const MAP_MAGIC: [i32; 2] = [542_130_509, 16708];

/// Decoded MRC header.
///
/// Immutable value data once decoded; derived fields (cell lengths, grid
/// mirror, angles, axis order, magic) are reconstructed on encode, so a
/// header round trips byte-identically through `encode`/`decode`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MrcHeader {
    /// Number of columns (fastest-varying index in the byte stream)
    pub nx: u32,
    /// Number of rows
    pub ny: u32,
    /// Number of sections (z slices)
    pub nz: u32,
    /// Element datatype
    pub data_type: DataType,
    /// Physical pixel size (Angstrom per pixel); cell length = size * dim
    pub pixel_size: f32,
    /// Minimum density value
    pub dmin: f32,
    /// Maximum density value
    pub dmax: f32,
    /// Mean density value
    pub dmean: f32,
}

impl MrcHeader {
    /// Build a header from caller-supplied dimensions and statistics.
    pub fn new(
        nx: u32,
        ny: u32,
        nz: u32,
        data_type: DataType,
        pixel_size: f32,
        dmin: f32,
        dmax: f32,
        dmean: f32,
    ) -> Self {
        Self {
            nx,
            ny,
            nz,
            data_type,
            pixel_size,
            dmin,
            dmax,
            dmean,
        }
    }

    /// Decode a header from the first 1024 bytes of a file.
    ///
    /// Fails with `CorruptHeader` if fewer than 1024 bytes are available
    /// or a dimension word is negative, and with `UnsupportedDatatype`
    /// if the mode code is unrecognized.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(MrcError::CorruptHeader(format!(
                "expected {} header bytes, got {}",
                HEADER_LEN,
                bytes.len()
            )));
        }

        let dim = |word: usize| -> Result<u32> {
            let v = read_i32(bytes, word);
            u32::try_from(v).map_err(|_| {
                MrcError::CorruptHeader(format!("negative dimension {} at word {}", v, word))
            })
        };

        let nx = dim(0)?;
        let ny = dim(1)?;
        let nz = dim(2)?;
        let data_type = DataType::from_code(read_i32(bytes, 3))?;

        // Pixel size is stored indirectly as cell length = pixel_size * dim.
        let xlen = read_f32(bytes, 10);
        let pixel_size = if nx > 0 { xlen / nx as f32 } else { 0.0 };

        Ok(Self {
            nx,
            ny,
            nz,
            data_type,
            pixel_size,
            dmin: read_f32(bytes, 19),
            dmax: read_f32(bytes, 20),
            dmean: read_f32(bytes, 21),
        })
    }

    /// Encode this header into its fixed 1024-byte layout.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];

        write_i32(&mut bytes, 0, self.nx as i32);
        write_i32(&mut bytes, 1, self.ny as i32);
        write_i32(&mut bytes, 2, self.nz as i32);
        write_i32(&mut bytes, 3, self.data_type.code());

        // mx, my, mz grid size mirrors nx, ny, nz
        write_i32(&mut bytes, 7, self.nx as i32);
        write_i32(&mut bytes, 8, self.ny as i32);
        write_i32(&mut bytes, 9, self.nz as i32);

        // Cell lengths in Angstrom
        write_f32(&mut bytes, 10, self.pixel_size * self.nx as f32);
        write_f32(&mut bytes, 11, self.pixel_size * self.ny as f32);
        write_f32(&mut bytes, 12, self.pixel_size * self.nz as f32);

        // Cell angles, always orthogonal
        for word in 13..16 {
            write_f32(&mut bytes, word, 90.0);
        }

        // Axis order
        write_i32(&mut bytes, 16, 1);
        write_i32(&mut bytes, 17, 2);
        write_i32(&mut bytes, 18, 3);

        write_f32(&mut bytes, 19, self.dmin);
        write_f32(&mut bytes, 20, self.dmax);
        write_f32(&mut bytes, 21, self.dmean);

        write_i32(&mut bytes, 52, MAP_MAGIC[0]);
        write_i32(&mut bytes, 53, MAP_MAGIC[1]);

        bytes
    }

    /// Number of elements in one section
    pub fn section_len(&self) -> usize {
        self.nx as usize * self.ny as usize
    }

    /// Number of elements in the full volume
    pub fn volume_len(&self) -> usize {
        self.section_len() * self.nz as usize
    }

    /// Size in bytes of one section
    pub fn section_bytes(&self) -> u64 {
        self.section_len() as u64 * self.data_type.size_in_bytes() as u64
    }

    /// File offset of the first element of a section
    pub fn section_offset(&self, index: u32) -> u64 {
        HEADER_LEN as u64 + index as u64 * self.section_bytes()
    }
}

fn read_i32(bytes: &[u8], word: usize) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[word * 4..word * 4 + 4]);
    i32::from_le_bytes(buf)
}

fn read_f32(bytes: &[u8], word: usize) -> f32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[word * 4..word * 4 + 4]);
    f32::from_le_bytes(buf)
}

fn write_i32(bytes: &mut [u8], word: usize, value: i32) {
    bytes[word * 4..word * 4 + 4].copy_from_slice(&value.to_le_bytes());
}

fn write_f32(bytes: &mut [u8], word: usize, value: f32) {
    bytes[word * 4..word * 4 + 4].copy_from_slice(&value.to_le_bytes());
}
