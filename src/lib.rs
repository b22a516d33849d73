//! mrcstack - MRC volume I/O and prime-key mask compression
//!
//! The binary encoding and storage core of a cryo-EM micrograph pipeline:
//!
//! - Fixed-layout MRC header encode/decode (1024 bytes, 256 LE words)
//! - Whole-volume, single-section, and sub-rectangle reads with explicit
//!   per-call offsets
//! - Zero-copy memory-mapped volume views
//! - Sequential header + section writing
//! - Lossless packing of overlapping boolean masks into one u64 array
//!   via products of distinct prime keys
//!
//! Segmentation itself, filtering, and pipeline orchestration live
//! outside this crate; it only moves structured bytes.
//!
//! # Example
//!
//! ```rust,ignore
//! use mrcstack::{MrcReader, MrcWriter, DataType, section_stats};
//!
//! let mut reader = MrcReader::open("micrograph.mrc")?;
//! let section = reader.read_section::<f32>(0)?;
//!
//! let (dmin, dmax, dmean) = section_stats(section.view());
//! let mut writer = MrcWriter::create("copy.mrc")?;
//! writer.write_header(
//!     reader.header().nx, reader.header().ny, 1,
//!     DataType::F32, reader.header().pixel_size,
//!     dmin, dmax, dmean,
//! )?;
//! writer.write_section(section.view())?;
//! ```

pub mod error;
pub mod header;
pub mod masks;
pub mod reader;
pub mod types;
pub mod writer;

// Re-exports
pub use error::{MrcError, Result};
pub use header::{MrcHeader, HEADER_LEN, MAP_MAGIC};
pub use masks::{prime_keys, CompositeMaskSet, Mask, MaskRecord};
pub use reader::{MappedVolume, MrcReader};
pub use types::{DataType, Element};
pub use writer::{section_stats, MrcWriter};

/// Version of the mrcstack implementation
pub const MRCSTACK_VERSION: &str = env!("CARGO_PKG_VERSION");
