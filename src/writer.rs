//! Sequential writing of MRC volumes
//!
//! Sections are serialized in the same row-major (x fastest) byte order
//! the reader expects, so a write-then-read round trip is exact.

use crate::error::Result;
use crate::header::MrcHeader;
use crate::types::{DataType, Element};
use ndarray::ArrayView2;
use num_traits::ToPrimitive;
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

/// Writer over an open MRC file.
///
/// `write_header` always lands at offset 0; sections append at the
/// current write position, so the caller is responsible for writing the
/// header first and sections in z order.
pub struct MrcWriter<W> {
    inner: W,
}

impl MrcWriter<File> {
    /// Create (or truncate) an MRC file at a path.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write + Seek> MrcWriter<W> {
    /// Wrap an open file for writing.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Encode and write a header at offset 0, overwriting any existing
    /// header. Leaves the cursor at the first section offset.
    #[allow(clippy::too_many_arguments)]
    pub fn write_header(
        &mut self,
        nx: u32,
        ny: u32,
        nz: u32,
        data_type: DataType,
        pixel_size: f32,
        dmin: f32,
        dmax: f32,
        dmean: f32,
    ) -> Result<MrcHeader> {
        let header = MrcHeader::new(nx, ny, nz, data_type, pixel_size, dmin, dmax, dmean);
        self.inner.seek(SeekFrom::Start(0))?;
        self.inner.write_all(&header.encode())?;
        Ok(header)
    }

    /// Serialize a (ny, nx) section at the current write position.
    ///
    /// Elements are emitted in logical row-major order with x contiguous,
    /// regardless of the array's memory layout.
    pub fn write_section<T: Element>(&mut self, section: ArrayView2<'_, T>) -> Result<()> {
        let esize = T::DATA_TYPE.size_in_bytes();
        let mut bytes = vec![0u8; section.len() * esize];
        for (value, chunk) in section.iter().zip(bytes.chunks_exact_mut(esize)) {
            value.write_le_bytes(chunk);
        }
        self.inner.write_all(&bytes)?;
        Ok(())
    }

    /// Flush buffered writes to the underlying file.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Consume the writer, returning the underlying file.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Compute (dmin, dmax, dmean) over a section for header statistics.
///
/// The mean accumulates in f64 before narrowing to the header's f32
/// fields. An empty section yields all zeros.
pub fn section_stats<T: Element + ToPrimitive>(section: ArrayView2<'_, T>) -> (f32, f32, f32) {
    if section.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0f64;
    for value in section.iter() {
        let v = value.to_f64().unwrap_or(f64::NAN);
        min = min.min(v);
        max = max.max(v);
        sum += v;
    }

    (
        min as f32,
        max as f32,
        (sum / section.len() as f64) as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_section_stats() {
        let section = array![[1.0f32, 2.0], [3.0, 6.0]];
        let (dmin, dmax, dmean) = section_stats(section.view());
        assert_eq!(dmin, 1.0);
        assert_eq!(dmax, 6.0);
        assert_eq!(dmean, 3.0);
    }

    #[test]
    fn test_section_stats_integer_elements() {
        let section = array![[-4i16, 0], [4, 8]];
        let (dmin, dmax, dmean) = section_stats(section.view());
        assert_eq!(dmin, -4.0);
        assert_eq!(dmax, 8.0);
        assert_eq!(dmean, 2.0);
    }

    #[test]
    fn test_write_section_respects_logical_order() {
        let section = array![[1i16, 2], [3, 4]];
        // A reversed-axis view changes memory order but not logical order.
        let flipped = section.t();

        let mut writer = MrcWriter::new(std::io::Cursor::new(Vec::new()));
        writer.write_section(flipped.view()).unwrap();
        let bytes = writer.into_inner().into_inner();

        assert_eq!(
            bytes,
            [1i16, 3, 2, 4]
                .iter()
                .flat_map(|v| v.to_le_bytes())
                .collect::<Vec<u8>>()
        );
    }
}
