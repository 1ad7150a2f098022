//! Contiguous block partitioning of a change set.
//!
//! A collection of `len` changes under granularity `n` is split into `n`
//! blocks of `len / n` changes each; the last block extends to the end of the
//! collection and absorbs the remainder. Block `i` and its complement are
//! always disjoint and together reproduce the collection.

use std::ops::Range;

use crate::error::{MinimizerError, Result};

/// Block layout for one collection size and granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    len: usize,
    granularity: usize,
}

impl Partition {
    /// Create a layout, rejecting `granularity == 0` and `granularity > len`.
    pub fn new(len: usize, granularity: usize) -> Result<Self> {
        if granularity == 0 || granularity > len {
            return Err(MinimizerError::InvalidGranularity { granularity, len });
        }
        Ok(Self { len, granularity })
    }

    /// Number of blocks.
    pub fn granularity(&self) -> usize {
        self.granularity
    }

    /// Size of the partitioned collection.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the partitioned collection is empty. Always false for a valid layout.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index range covered by block `index`.
    pub fn block(&self, index: usize) -> Result<Range<usize>> {
        if index >= self.granularity {
            return Err(MinimizerError::PartitionOutOfRange {
                index,
                granularity: self.granularity,
            });
        }

        let block_size = self.len / self.granularity;
        let start = index * block_size;
        let end = if index == self.granularity - 1 {
            self.len
        } else {
            start + block_size
        };
        Ok(start..end)
    }
}

/// Copy block `index` of `changes` under granularity `granularity`.
pub fn subset_at<T: Clone>(changes: &[T], index: usize, granularity: usize) -> Result<Vec<T>> {
    let range = Partition::new(changes.len(), granularity)?.block(index)?;
    Ok(changes[range].to_vec())
}

/// Copy `changes` with block `index` removed.
pub fn complement_at<T: Clone>(
    changes: &[T],
    index: usize,
    granularity: usize,
) -> Result<Vec<T>> {
    let range = Partition::new(changes.len(), granularity)?.block(index)?;
    let mut complement = Vec::with_capacity(changes.len() - range.len());
    complement.extend_from_slice(&changes[..range.start]);
    complement.extend_from_slice(&changes[range.end..]);
    Ok(complement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_sizes() {
        let partition = Partition::new(10, 3).unwrap();
        assert_eq!(partition.block(0).unwrap(), 0..3);
        assert_eq!(partition.block(1).unwrap(), 3..6);
        // Last block absorbs the remainder
        assert_eq!(partition.block(2).unwrap(), 6..10);

        let partition = Partition::new(10, 10).unwrap();
        for i in 0..10 {
            assert_eq!(partition.block(i).unwrap().len(), 1);
        }
    }

    #[test]
    fn test_subset_and_complement() {
        let changes: Vec<u32> = (0..10).collect();

        assert_eq!(subset_at(&changes, 0, 2).unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(subset_at(&changes, 1, 2).unwrap(), vec![5, 6, 7, 8, 9]);
        assert_eq!(
            complement_at(&changes, 1, 3).unwrap(),
            vec![0, 1, 2, 6, 7, 8, 9]
        );
        assert_eq!(complement_at(&changes, 2, 3).unwrap(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_partition_completeness() {
        for len in 1..40usize {
            let changes: Vec<usize> = (0..len).collect();
            for n in 1..=len {
                let mut rebuilt = Vec::new();
                for i in 0..n {
                    let subset = subset_at(&changes, i, n).unwrap();
                    let complement = complement_at(&changes, i, n).unwrap();
                    assert_eq!(subset.len() + complement.len(), len);
                    assert!(subset.iter().all(|c| !complement.contains(c)));
                    rebuilt.extend(subset);
                }
                assert_eq!(rebuilt, changes, "len={len} n={n}");
            }
        }
    }

    #[test]
    fn test_invalid_granularity() {
        let changes = vec![1, 2, 3];
        assert_eq!(
            subset_at(&changes, 0, 0),
            Err(MinimizerError::InvalidGranularity {
                granularity: 0,
                len: 3
            })
        );
        assert_eq!(
            complement_at(&changes, 0, 4),
            Err(MinimizerError::InvalidGranularity {
                granularity: 4,
                len: 3
            })
        );
        assert!(Partition::new(0, 1).is_err());
    }

    #[test]
    fn test_index_out_of_range() {
        let changes = vec![1, 2, 3, 4];
        assert_eq!(
            subset_at(&changes, 2, 2),
            Err(MinimizerError::PartitionOutOfRange {
                index: 2,
                granularity: 2
            })
        );
        assert!(complement_at(&changes, 7, 4).is_err());
    }

    #[test]
    fn test_input_untouched() {
        let changes = vec!["a", "b", "c", "d"];
        let _ = complement_at(&changes, 1, 2).unwrap();
        assert_eq!(changes, vec!["a", "b", "c", "d"]);
    }
}
