//! Lossless multi-mask compression via prime keys
//!
//! An arbitrary number of possibly-overlapping boolean masks is packed
//! into a single u64 array: each mask carries a distinct prime key, and
//! every cell of the composite holds the product of the keys of the masks
//! covering it (1 where nothing does). Because the keys are pairwise
//! coprime, membership of one mask is recovered by a modulo test that is
//! unaffected by the presence of the others.

use crate::error::{MrcError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A live segmentation mask with its prime key and scalar attributes
/// (area and similar, attached by upstream processing).
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pub segmentation: Array2<bool>,
    pub prime_key: u64,
    pub attributes: HashMap<String, f64>,
}

impl Mask {
    pub fn new(segmentation: Array2<bool>, prime_key: u64) -> Self {
        Self {
            segmentation,
            prime_key,
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// Per-mask metadata persisted alongside the composite: the prime key and
/// attributes, explicitly excluding the boolean array itself. Dropping the
/// arrays is the size reduction that motivates the encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskRecord {
    pub prime_key: u64,
    pub attributes: HashMap<String, f64>,
}

/// The compressed representation of a mask collection: one u64 composite
/// array of the shared mask shape plus light per-mask metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeMaskSet {
    pub composite: Array2<u64>,
    pub masks: Vec<MaskRecord>,
}

impl CompositeMaskSet {
    /// Encode a collection of masks into a composite array.
    ///
    /// `shape` is the shared (rows, cols) shape of every mask; an empty
    /// collection is valid and yields an all-ones composite with no
    /// records. Fails with `InvalidPrimeKey` if a key is not prime or not
    /// unique within the collection, with `OutOfRange` if a mask's shape
    /// disagrees with `shape`, and with `EncodingOverflow` the moment a
    /// per-cell product would exceed u64 range.
    pub fn encode(masks: &[Mask], shape: (usize, usize)) -> Result<Self> {
        let mut seen = HashSet::new();
        for mask in masks {
            if !is_prime(mask.prime_key) || !seen.insert(mask.prime_key) {
                return Err(MrcError::InvalidPrimeKey(mask.prime_key));
            }
            if mask.segmentation.dim() != shape {
                return Err(MrcError::OutOfRange(format!(
                    "mask with key {} has shape {:?}, expected {:?}",
                    mask.prime_key,
                    mask.segmentation.dim(),
                    shape
                )));
            }
        }

        let mut composite = Array2::from_elem(shape, 1u64);
        let mut records = Vec::with_capacity(masks.len());
        for mask in masks {
            for (cell, &covered) in composite.iter_mut().zip(mask.segmentation.iter()) {
                if covered {
                    let prev = *cell;
                    *cell = prev.checked_mul(mask.prime_key).ok_or_else(|| {
                        MrcError::EncodingOverflow(format!(
                            "cell product {} * {} exceeds u64",
                            prev, mask.prime_key
                        ))
                    })?;
                }
            }
            records.push(MaskRecord {
                prime_key: mask.prime_key,
                attributes: mask.attributes.clone(),
            });
        }

        Ok(Self {
            composite,
            masks: records,
        })
    }

    /// Reconstruct the boolean masks: a cell belongs to a mask iff the
    /// composite value is divisible by that mask's prime key.
    pub fn decode(&self) -> Result<Vec<Mask>> {
        self.masks
            .iter()
            .map(|record| {
                if record.prime_key < 2 {
                    return Err(MrcError::InvalidPrimeKey(record.prime_key));
                }
                Ok(Mask {
                    segmentation: self.composite.mapv(|cell| cell % record.prime_key == 0),
                    prime_key: record.prime_key,
                    attributes: record.attributes.clone(),
                })
            })
            .collect()
    }

    /// Persist the container to disk.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = BufWriter::new(File::create(path)?);
        bincode::serialize_into(file, self)?;
        Ok(())
    }

    /// Load a container previously written by `save`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(file)?)
    }
}

/// The first `n` primes, for tagging a fresh batch of masks with valid
/// pairwise-distinct keys.
pub fn prime_keys(n: usize) -> Vec<u64> {
    let mut keys = Vec::with_capacity(n);
    let mut candidate = 2u64;
    while keys.len() < n {
        if is_prime(candidate) {
            keys.push(candidate);
        }
        candidate += 1;
    }
    keys
}

/// Trial-division primality test. Keys in practice stay small (one per
/// mask on a micrograph), so this is never a hot path.
fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3u64;
    while d.saturating_mul(d) <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn row_mask(shape: (usize, usize), row: usize) -> Array2<bool> {
        Array2::from_shape_fn(shape, |(y, _)| y == row)
    }

    fn col_mask(shape: (usize, usize), col: usize) -> Array2<bool> {
        Array2::from_shape_fn(shape, |(_, x)| x == col)
    }

    #[test]
    fn test_overlapping_masks_round_trip() {
        let shape = (4, 4);
        let masks = vec![
            Mask::new(row_mask(shape, 0), 2).with_attribute("area", 4.0),
            Mask::new(col_mask(shape, 0), 3).with_attribute("area", 4.0),
        ];

        let set = CompositeMaskSet::encode(&masks, shape).unwrap();

        // Overlap cell holds the product, non-overlap cells a single key
        assert_eq!(set.composite[[0, 0]], 6);
        for x in 1..4 {
            assert_eq!(set.composite[[0, x]], 2);
        }
        for y in 1..4 {
            assert_eq!(set.composite[[y, 0]], 3);
        }
        for y in 1..4 {
            for x in 1..4 {
                assert_eq!(set.composite[[y, x]], 1);
            }
        }

        let decoded = set.decode().unwrap();
        assert_eq!(decoded, masks);
    }

    #[test]
    fn test_empty_mask_set() {
        let set = CompositeMaskSet::encode(&[], (3, 5)).unwrap();
        assert!(set.masks.is_empty());
        assert!(set.composite.iter().all(|&cell| cell == 1));
        assert_eq!(set.composite.dim(), (3, 5));

        assert!(set.decode().unwrap().is_empty());
    }

    #[test]
    fn test_metadata_survives_round_trip() {
        let shape = (2, 2);
        let masks = vec![Mask::new(row_mask(shape, 1), 5)
            .with_attribute("area", 2.0)
            .with_attribute("area_asq", 18.0)];

        let decoded = CompositeMaskSet::encode(&masks, shape)
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(decoded[0].attributes["area"], 2.0);
        assert_eq!(decoded[0].attributes["area_asq"], 18.0);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let shape = (2, 2);
        let masks = vec![
            Mask::new(row_mask(shape, 0), 7),
            Mask::new(row_mask(shape, 1), 7),
        ];
        assert!(matches!(
            CompositeMaskSet::encode(&masks, shape),
            Err(MrcError::InvalidPrimeKey(7))
        ));
    }

    #[test]
    fn test_composite_key_rejected() {
        let masks = vec![Mask::new(row_mask((2, 2), 0), 9)];
        assert!(matches!(
            CompositeMaskSet::encode(&masks, (2, 2)),
            Err(MrcError::InvalidPrimeKey(9))
        ));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let masks = vec![Mask::new(row_mask((2, 3), 0), 2)];
        assert!(matches!(
            CompositeMaskSet::encode(&masks, (3, 3)),
            Err(MrcError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_overflow_detected() {
        let shape = (1, 1);
        let full = Array2::from_elem(shape, true);

        // Stacking the same cell with large primes overruns u64 quickly.
        let masks: Vec<Mask> = prime_keys(100)
            .into_iter()
            .rev()
            .map(|key| Mask::new(full.clone(), key))
            .collect();

        assert!(matches!(
            CompositeMaskSet::encode(&masks, shape),
            Err(MrcError::EncodingOverflow(_))
        ));
    }

    #[test]
    fn test_prime_keys() {
        assert_eq!(prime_keys(0), Vec::<u64>::new());
        assert_eq!(prime_keys(8), vec![2, 3, 5, 7, 11, 13, 17, 19]);
    }

    #[test]
    fn test_is_prime() {
        assert!(is_prime(2));
        assert!(is_prime(97));
        assert!(!is_prime(0));
        assert!(!is_prime(1));
        assert!(!is_prime(91)); // 7 * 13
    }
}
