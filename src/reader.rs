//! Random-access reading of MRC volumes
//!
//! All read paths use one axis convention: row-major (C order) with x as
//! the fastest-varying index in the byte stream. A full volume is indexed
//! (z, y, x), a section (y, x), and a region (ysize, xsize). The legacy
//! column-major section layout some MRC tooling produces is deliberately
//! not replicated; see `writer` for the symmetric write path.

use crate::error::{MrcError, Result};
use crate::header::{MrcHeader, HEADER_LEN};
use crate::types::Element;
use memmap2::{Mmap, MmapOptions};
use ndarray::{Array2, Array3, ArrayView3};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::marker::PhantomData;
use std::path::Path;

/// Reader over an open MRC file.
///
/// Decodes the header once on construction; every read computes its file
/// offset explicitly from the header, so calls do not depend on cursor
/// state left behind by earlier reads.
pub struct MrcReader<R> {
    inner: R,
    header: MrcHeader,
}

impl MrcReader<File> {
    /// Open an MRC file from a path and decode its header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(File::open(path)?)
    }
}

impl<R: Read + Seek> MrcReader<R> {
    /// Wrap an open file, decoding the 1024-byte header.
    pub fn new(mut inner: R) -> Result<Self> {
        inner.seek(SeekFrom::Start(0))?;
        let mut bytes = [0u8; HEADER_LEN];
        inner.read_exact(&mut bytes).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                MrcError::CorruptHeader(format!("file shorter than {} bytes", HEADER_LEN))
            } else {
                MrcError::Io(e)
            }
        })?;
        let header = MrcHeader::decode(&bytes)?;
        Ok(Self { inner, header })
    }

    /// The decoded header
    pub fn header(&self) -> &MrcHeader {
        &self.header
    }

    /// Read the full volume as a (nz, ny, nx) array.
    pub fn read_volume<T: Element>(&mut self) -> Result<Array3<T>> {
        self.check_element::<T>()?;
        let shape = (
            self.header.nz as usize,
            self.header.ny as usize,
            self.header.nx as usize,
        );

        self.inner.seek(SeekFrom::Start(HEADER_LEN as u64))?;
        let data = read_elements::<T, R>(&mut self.inner, self.header.volume_len())?;
        Array3::from_shape_vec(shape, data)
            .map_err(|e| MrcError::CorruptHeader(e.to_string()))
    }

    /// Read one z-slice as a (ny, nx) array.
    pub fn read_section<T: Element>(&mut self, index: u32) -> Result<Array2<T>> {
        self.check_element::<T>()?;
        if index >= self.header.nz {
            return Err(MrcError::OutOfRange(format!(
                "section {} out of range for nz={}",
                index, self.header.nz
            )));
        }

        self.inner
            .seek(SeekFrom::Start(self.header.section_offset(index)))?;
        let data = read_elements::<T, R>(&mut self.inner, self.header.section_len())?;
        Array2::from_shape_vec((self.header.ny as usize, self.header.nx as usize), data)
            .map_err(|e| MrcError::CorruptHeader(e.to_string()))
    }

    /// Read a sub-rectangle of one section as a (ysize, xsize) array.
    ///
    /// Rows of the rectangle are not contiguous in the file whenever
    /// `xstop - xstart < nx`, so this seeks once per row rather than
    /// attempting a single block read.
    pub fn read_region<T: Element>(
        &mut self,
        xstart: usize,
        xstop: usize,
        ystart: usize,
        ystop: usize,
        section: u32,
    ) -> Result<Array2<T>> {
        self.check_element::<T>()?;
        let nx = self.header.nx as usize;
        let ny = self.header.ny as usize;
        if section >= self.header.nz {
            return Err(MrcError::OutOfRange(format!(
                "section {} out of range for nz={}",
                section, self.header.nz
            )));
        }
        if xstop > nx || ystop > ny || xstart >= xstop || ystart >= ystop {
            return Err(MrcError::OutOfRange(format!(
                "region x={}..{} y={}..{} invalid for nx={} ny={}",
                xstart, xstop, ystart, ystop, nx, ny
            )));
        }

        let esize = self.header.data_type.size_in_bytes() as u64;
        let xsize = xstop - xstart;
        let ysize = ystop - ystart;
        let base = self.header.section_offset(section);

        let mut data = Vec::with_capacity(xsize * ysize);
        for y in ystart..ystop {
            let offset = base + (y * nx + xstart) as u64 * esize;
            self.inner.seek(SeekFrom::Start(offset))?;
            data.extend(read_elements::<T, R>(&mut self.inner, xsize)?);
        }

        Array2::from_shape_vec((ysize, xsize), data)
            .map_err(|e| MrcError::CorruptHeader(e.to_string()))
    }

    fn check_element<T: Element>(&self) -> Result<()> {
        if T::DATA_TYPE != self.header.data_type {
            return Err(MrcError::DatatypeMismatch {
                stored: self.header.data_type,
                requested: T::DATA_TYPE,
            });
        }
        Ok(())
    }
}

/// Read `count` elements from the stream, decoding little-endian bytes.
fn read_elements<T: Element, R: Read>(reader: &mut R, count: usize) -> Result<Vec<T>> {
    let esize = T::DATA_TYPE.size_in_bytes();
    let mut buf = vec![0u8; count * esize];
    reader.read_exact(&mut buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            MrcError::IncompleteSection(format!(
                "file ends before {} requested elements",
                count
            ))
        } else {
            MrcError::Io(e)
        }
    })?;
    Ok(buf.chunks_exact(esize).map(T::from_le_bytes).collect())
}

/// Read-only zero-copy view of a volume backed by a memory mapping.
///
/// The mapping covers the whole file; element data starts at byte 1024.
/// Safe for arbitrary concurrent readers of the same file, since no
/// writer contends. Element bytes are interpreted in native byte order,
/// which matches the on-disk little-endian layout on little-endian hosts.
pub struct MappedVolume<T: Element> {
    mmap: Mmap,
    header: MrcHeader,
    _marker: PhantomData<T>,
}

impl<T: Element> MappedVolume<T> {
    /// Map an MRC file from a path.
    ///
    /// Fails with `DatatypeMismatch` if `T` does not match the stored
    /// datatype, and with `IncompleteSection` if the file is shorter than
    /// the volume the header declares.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let header = *MrcReader::new(&file)?.header();
        if T::DATA_TYPE != header.data_type {
            return Err(MrcError::DatatypeMismatch {
                stored: header.data_type,
                requested: T::DATA_TYPE,
            });
        }

        let volume_bytes = header.volume_len() * header.data_type.size_in_bytes();
        // Read-only shared mapping; the file is never mutated through it.
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        if mmap.len() < HEADER_LEN + volume_bytes {
            return Err(MrcError::IncompleteSection(format!(
                "file holds {} bytes, header declares {}",
                mmap.len(),
                HEADER_LEN + volume_bytes
            )));
        }

        Ok(Self {
            mmap,
            header,
            _marker: PhantomData,
        })
    }

    /// The decoded header
    pub fn header(&self) -> &MrcHeader {
        &self.header
    }

    /// View the mapped elements as a (nz, ny, nx) array without copying.
    pub fn as_array(&self) -> ArrayView3<'_, T> {
        let shape = (
            self.header.nz as usize,
            self.header.ny as usize,
            self.header.nx as usize,
        );
        let data = &self.mmap[HEADER_LEN..];
        // Safety: open() verified the mapping covers the declared volume,
        // the map base is page aligned and the 1024-byte header offset
        // preserves alignment for every supported element width.
        unsafe { ArrayView3::from_shape_ptr(shape, data.as_ptr() as *const T) }
    }
}
