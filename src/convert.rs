//! Conversions between dense `f64` arrays and SparseData.
//!
//! `from_dense` merges adjacent equal values into runs in a single linear
//! pass; the `to_*` functions expand or summarise the runs.

use crate::error::{Result, SvecError};
use crate::sparse_data::{SparseData, VALUE_SIZE};
use crate::value::{nvp, same_run_value, to_option};

/// Per-element NULL flags, one bit per element, least significant bit first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NullBitmap {
    bits: Vec<u8>,
    len: usize,
}

impl NullBitmap {
    /// A bitmap of `len` elements with nothing marked NULL.
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![0; len.div_ceil(8)],
            len,
        }
    }

    pub fn from_flags(flags: &[bool]) -> Self {
        let mut bitmap = Self::new(flags.len());
        for (i, &null) in flags.iter().enumerate() {
            if null {
                bitmap.set_null(i);
            }
        }
        bitmap
    }

    pub fn set_null(&mut self, index: usize) {
        if index < self.len {
            self.bits[index / 8] |= 1 << (index % 8);
        }
    }

    /// Positions beyond the bitmap are never NULL.
    pub fn is_null(&self, index: usize) -> bool {
        index < self.len && self.bits[index / 8] & (1 << (index % 8)) != 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn null_count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }
}

pub fn from_dense(array: &[f64], nulls: Option<&NullBitmap>) -> Result<SparseData> {
    let mut sdata = SparseData::new_empty(0)?;
    let mut current: Option<(f64, i64)> = None;

    for (i, &raw) in array.iter().enumerate() {
        let value = match nulls {
            Some(bitmap) if bitmap.is_null(i) => nvp(),
            _ => raw,
        };

        current = match current {
            Some((run_value, count)) if same_run_value(run_value, value) => {
                Some((run_value, count + 1))
            }
            Some((run_value, count)) => {
                sdata.append_run(run_value, count)?;
                Some((value, 1))
            }
            None => Some((value, 1)),
        };
    }

    if let Some((run_value, count)) = current {
        sdata.append_run(run_value, count)?;
    }
    Ok(sdata)
}

/// Splits optional values into a dense array and its NULL bitmap.
pub fn from_options(values: &[Option<f64>]) -> Result<SparseData> {
    let array: Vec<f64> = values.iter().map(|v| v.unwrap_or(0.0)).collect();
    let flags: Vec<bool> = values.iter().map(Option::is_none).collect();
    from_dense(&array, Some(&NullBitmap::from_flags(&flags)))
}

/// Every logical value in order; NULLs stay as the `NVP` sentinel.
pub fn to_dense(sdata: &SparseData) -> Result<Vec<f64>> {
    let total = sdata.total_logical_count();
    let requested = usize::try_from(total)
        .ok()
        .and_then(|n| n.checked_mul(VALUE_SIZE))
        .ok_or(SvecError::AllocationFailure { requested: usize::MAX })?;

    let mut dense = Vec::new();
    dense
        .try_reserve_exact(total as usize)
        .map_err(|_| SvecError::AllocationFailure { requested })?;
    for run in sdata.runs() {
        dense.extend(std::iter::repeat(run.value).take(run.count as usize));
    }
    Ok(dense)
}

pub fn to_dense_options(sdata: &SparseData) -> Result<Vec<Option<f64>>> {
    Ok(to_dense(sdata)?.into_iter().map(to_option).collect())
}

/// Cumulative run boundaries: entry `i` is the sum of run lengths `0..=i`.
pub fn to_index_array(sdata: &SparseData) -> Vec<i64> {
    sdata
        .runs()
        .scan(0i64, |acc, run| {
            *acc += run.count as i64;
            Some(*acc)
        })
        .collect()
}

/// Length of each run, in order.
pub fn run_lengths(sdata: &SparseData) -> Vec<i64> {
    sdata.runs().map(|run| run.count as i64).collect()
}
