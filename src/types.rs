//! Core data types for MRC volumes

use crate::error::{MrcError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element datatypes supported by the MRC format, tagged with their
/// on-disk mode code (header word 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum DataType {
    /// Signed 8-bit integer
    I8 = 0,
    /// Signed 16-bit integer
    I16 = 1,
    /// 32-bit floating point
    F32 = 2,
    /// Unsigned 16-bit integer
    U16 = 6,
}

impl DataType {
    /// Look up a datatype from its header mode code.
    ///
    /// The mapping is total over the recognized codes {0, 1, 2, 6};
    /// any other code fails with `UnsupportedDatatype`.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(DataType::I8),
            1 => Ok(DataType::I16),
            2 => Ok(DataType::F32),
            6 => Ok(DataType::U16),
            other => Err(MrcError::UnsupportedDatatype(other)),
        }
    }

    /// The mode code written into the header
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Size in bytes of one element of this datatype
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DataType::I8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::F32 => 4,
        }
    }

    /// Check if this is a floating point type
    pub fn is_float(&self) -> bool {
        matches!(self, DataType::F32)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A Rust scalar that can be stored as an MRC volume element.
///
/// Binds the scalar to its `DataType` tag and provides the little-endian
/// byte conversions used for all file I/O. Offset arithmetic must go
/// through `DataType::size_in_bytes` rather than assuming 4-byte elements.
pub trait Element: Copy + Default + PartialEq + Send + Sync + 'static {
    /// The datatype tag this scalar is stored as
    const DATA_TYPE: DataType;

    /// Decode one element from its little-endian byte representation.
    /// `bytes` holds exactly `DATA_TYPE.size_in_bytes()` bytes.
    fn from_le_bytes(bytes: &[u8]) -> Self;

    /// Encode one element into `out`, which holds exactly
    /// `DATA_TYPE.size_in_bytes()` bytes.
    fn write_le_bytes(&self, out: &mut [u8]);
}

impl Element for i8 {
    const DATA_TYPE: DataType = DataType::I8;

    fn from_le_bytes(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }

    fn write_le_bytes(&self, out: &mut [u8]) {
        out[0] = *self as u8;
    }
}

impl Element for i16 {
    const DATA_TYPE: DataType = DataType::I16;

    fn from_le_bytes(bytes: &[u8]) -> Self {
        i16::from_le_bytes([bytes[0], bytes[1]])
    }

    fn write_le_bytes(&self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_le_bytes());
    }
}

impl Element for f32 {
    const DATA_TYPE: DataType = DataType::F32;

    fn from_le_bytes(bytes: &[u8]) -> Self {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn write_le_bytes(&self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_le_bytes());
    }
}

impl Element for u16 {
    const DATA_TYPE: DataType = DataType::U16;

    fn from_le_bytes(bytes: &[u8]) -> Self {
        u16::from_le_bytes([bytes[0], bytes[1]])
    }

    fn write_le_bytes(&self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_codes() {
        assert_eq!(DataType::from_code(0).unwrap(), DataType::I8);
        assert_eq!(DataType::from_code(1).unwrap(), DataType::I16);
        assert_eq!(DataType::from_code(2).unwrap(), DataType::F32);
        assert_eq!(DataType::from_code(6).unwrap(), DataType::U16);

        assert!(matches!(
            DataType::from_code(3),
            Err(MrcError::UnsupportedDatatype(3))
        ));
        assert!(matches!(
            DataType::from_code(-1),
            Err(MrcError::UnsupportedDatatype(-1))
        ));
    }

    #[test]
    fn test_data_type_sizes() {
        assert_eq!(DataType::I8.size_in_bytes(), 1);
        assert_eq!(DataType::I16.size_in_bytes(), 2);
        assert_eq!(DataType::F32.size_in_bytes(), 4);
        assert_eq!(DataType::U16.size_in_bytes(), 2);
    }

    #[test]
    fn test_element_round_trip() {
        let mut buf = [0u8; 4];

        let v: f32 = -12.75;
        v.write_le_bytes(&mut buf);
        assert_eq!(<f32 as Element>::from_le_bytes(&buf), v);

        let v: i16 = -300;
        v.write_le_bytes(&mut buf[..2]);
        assert_eq!(<i16 as Element>::from_le_bytes(&buf[..2]), v);

        let v: u16 = 40000;
        v.write_le_bytes(&mut buf[..2]);
        assert_eq!(<u16 as Element>::from_le_bytes(&buf[..2]), v);

        let v: i8 = -5;
        v.write_le_bytes(&mut buf[..1]);
        assert_eq!(<i8 as Element>::from_le_bytes(&buf[..1]), v);
    }
}
