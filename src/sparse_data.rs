//! SparseData: the run-length encoded pair of buffers behind every svec.
//!
//! `values` holds one little-endian `f64` per run, `runs` holds the matching
//! run counts in the variable-length form of [`crate::runcount`]. Both are
//! kept in lock-step; every constructor either maintains or checks that.

use crate::buffer::GrowableBuffer;
use crate::error::{Result, SvecError};
use crate::runcount::{decode_run, encode_run, MAX_RUN_BYTES};
use crate::unnest::Unnest;
use byteorder::{ByteOrder, LittleEndian};

/// Host type identifier for 8-byte floats, carried on the wire.
pub const FLOAT8_TYPE_TAG: u32 = 701;

pub const VALUE_SIZE: usize = std::mem::size_of::<f64>();

/// Minimum capacities used when growing the value and run buffers.
pub const VALUES_GROWTH_FLOOR: usize = 9;
pub const RUNS_GROWTH_FLOOR: usize = 10;

/// Largest logical length; index arrays and run lengths are reported as `i64`.
pub const MAX_TOTAL_LOGICAL_COUNT: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Float8,
}

impl ElementType {
    pub fn tag(self) -> u32 {
        match self {
            ElementType::Float8 => FLOAT8_TYPE_TAG,
        }
    }

    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            FLOAT8_TYPE_TAG => Ok(ElementType::Float8),
            other => Err(SvecError::UnsupportedElementType(other)),
        }
    }
}

/// One decoded run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Run {
    pub value: f64,
    pub count: u64,
}

#[derive(Debug, Clone)]
pub struct SparseData {
    element_type: ElementType,
    values: GrowableBuffer,
    runs: GrowableBuffer,
    unique_run_count: usize,
    total_logical_count: u64,
}

impl SparseData {
    /// An empty SparseData sized for `expected_runs` appends without reallocating.
    pub fn new_empty(expected_runs: usize) -> Result<Self> {
        let values_capacity = expected_runs
            .checked_mul(VALUE_SIZE)
            .and_then(|n| n.checked_add(1))
            .ok_or(SvecError::AllocationFailure { requested: usize::MAX })?;
        let runs_capacity = expected_runs
            .checked_mul(MAX_RUN_BYTES)
            .and_then(|n| n.checked_add(1))
            .ok_or(SvecError::AllocationFailure { requested: usize::MAX })?;

        Ok(Self {
            element_type: ElementType::Float8,
            values: GrowableBuffer::with_capacity(values_capacity, VALUES_GROWTH_FLOOR)?,
            runs: GrowableBuffer::with_capacity(runs_capacity, RUNS_GROWTH_FLOOR)?,
            unique_run_count: 0,
            total_logical_count: 0,
        })
    }

    /// Rebuilds a SparseData from its raw parts and checks every invariant.
    pub fn from_raw_parts(
        element_type_tag: u32,
        unique_run_count: usize,
        total_logical_count: u64,
        values: Vec<u8>,
        runs: Vec<u8>,
    ) -> Result<Self> {
        let sdata = Self {
            element_type: ElementType::from_tag(element_type_tag)?,
            values: GrowableBuffer::from_vec(values, VALUES_GROWTH_FLOOR),
            runs: GrowableBuffer::from_vec(runs, RUNS_GROWTH_FLOOR),
            unique_run_count,
            total_logical_count,
        };
        sdata.validate()?;
        Ok(sdata)
    }

    pub fn append_run(&mut self, value: f64, count: i64) -> Result<()> {
        let encoded = encode_run(count)?;
        let total = self.total_logical_count.saturating_add(count as u64);
        if total > MAX_TOTAL_LOGICAL_COUNT {
            return Err(SvecError::CountOverflow { field: "total_logical_count", value: total });
        }

        let mut value_bytes = [0u8; VALUE_SIZE];
        LittleEndian::write_f64(&mut value_bytes, value);

        let values_len = self.values.len();
        self.values.append(&value_bytes)?;
        if let Err(e) = self.runs.append(&encoded) {
            // keep values and runs in lock-step
            self.values.truncate(values_len);
            return Err(e);
        }

        self.unique_run_count += 1;
        self.total_logical_count = total;
        Ok(())
    }

    /// A copy with doubled buffer capacities, for callers that keep appending.
    pub fn grow(&self) -> Result<Self> {
        Ok(Self {
            element_type: self.element_type,
            values: self.values.grown(VALUES_GROWTH_FLOOR)?,
            runs: self.runs.grown(RUNS_GROWTH_FLOOR)?,
            unique_run_count: self.unique_run_count,
            total_logical_count: self.total_logical_count,
        })
    }

    /// Drops buffer slack ahead of serialization.
    pub fn trim(&mut self) {
        self.values.trim_to_len();
        self.runs.trim_to_len();
    }

    pub fn validate(&self) -> Result<()> {
        let expected_values = self
            .unique_run_count
            .checked_mul(VALUE_SIZE)
            .ok_or_else(|| SvecError::InvalidSparseData("unique run count too large".to_string()))?;
        if self.values.len() != expected_values {
            return Err(SvecError::InvalidSparseData(format!(
                "{} value bytes for {} runs",
                self.values.len(),
                self.unique_run_count
            )));
        }

        let runs = self.runs.as_slice();
        let mut offset = 0;
        let mut decoded = 0usize;
        let mut total = 0u64;
        while offset < runs.len() {
            let (count, used) = decode_run(runs, offset)?;
            decoded += 1;
            total = total.saturating_add(count as u64);
            if total > MAX_TOTAL_LOGICAL_COUNT {
                return Err(SvecError::CountOverflow { field: "total_logical_count", value: total });
            }
            offset += used;
        }

        if decoded != self.unique_run_count {
            return Err(SvecError::InvalidSparseData(format!(
                "{} run counts for {} unique values",
                decoded, self.unique_run_count
            )));
        }
        if total != self.total_logical_count {
            return Err(SvecError::InvalidSparseData(format!(
                "runs sum to {} but total count is {}",
                total, self.total_logical_count
            )));
        }
        Ok(())
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn unique_run_count(&self) -> usize {
        self.unique_run_count
    }

    pub fn total_logical_count(&self) -> u64 {
        self.total_logical_count
    }

    pub fn is_empty(&self) -> bool {
        self.total_logical_count == 0
    }

    pub fn values_bytes(&self) -> &[u8] {
        self.values.as_slice()
    }

    pub fn runs_bytes(&self) -> &[u8] {
        self.runs.as_slice()
    }

    pub fn values_capacity(&self) -> usize {
        self.values.capacity()
    }

    pub fn runs_capacity(&self) -> usize {
        self.runs.capacity()
    }

    /// Unique value of run `index`.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        let start = index.checked_mul(VALUE_SIZE)?;
        let bytes = self.values.as_slice().get(start..start + VALUE_SIZE)?;
        Some(LittleEndian::read_f64(bytes))
    }

    pub fn unique_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values
            .as_slice()
            .chunks_exact(VALUE_SIZE)
            .map(LittleEndian::read_f64)
    }

    /// Runs in order, decoded one at a time.
    pub fn runs(&self) -> RunIter<'_> {
        RunIter {
            sdata: self,
            index: 0,
            offset: 0,
        }
    }

    /// Every logical value, expanded lazily.
    pub fn iter(&self) -> Unnest<'_> {
        Unnest::new(self)
    }
}

impl PartialEq for SparseData {
    fn eq(&self, other: &Self) -> bool {
        self.element_type == other.element_type
            && self.unique_run_count == other.unique_run_count
            && self.total_logical_count == other.total_logical_count
            && self.values == other.values
            && self.runs == other.runs
    }
}

impl<'a> IntoIterator for &'a SparseData {
    type Item = f64;
    type IntoIter = Unnest<'a>;

    fn into_iter(self) -> Unnest<'a> {
        self.iter()
    }
}

pub struct RunIter<'a> {
    sdata: &'a SparseData,
    index: usize,
    offset: usize,
}

impl Iterator for RunIter<'_> {
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        if self.index >= self.sdata.unique_run_count {
            return None;
        }
        // stream was validated on construction
        let (count, used) = decode_run(self.sdata.runs_bytes(), self.offset).ok()?;
        let value = self.sdata.value_at(self.index)?;
        self.index += 1;
        self.offset += used;
        Some(Run { value, count: count as u64 })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sdata.unique_run_count - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RunIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{is_nvp, nvp};

    fn build(pairs: &[(f64, i64)]) -> SparseData {
        let mut sdata = SparseData::new_empty(pairs.len()).unwrap();
        for &(value, count) in pairs {
            sdata.append_run(value, count).unwrap();
        }
        sdata
    }

    #[test]
    fn test_new_empty_presizes_buffers() {
        let sdata = SparseData::new_empty(4).unwrap();
        assert_eq!(sdata.values_capacity(), 33);
        assert_eq!(sdata.runs_capacity(), 37);
        assert_eq!(sdata.unique_run_count(), 0);
        assert_eq!(sdata.total_logical_count(), 0);
        assert!(sdata.values_bytes().is_empty());
        assert!(sdata.runs_bytes().is_empty());
        sdata.validate().unwrap();
    }

    #[test]
    fn test_append_run_updates_counts() {
        let sdata = build(&[(1.5, 3), (0.0, 1000), (nvp(), 2)]);
        assert_eq!(sdata.unique_run_count(), 3);
        assert_eq!(sdata.total_logical_count(), 1005);
        assert_eq!(sdata.values_bytes().len(), 24);
        // 1-byte, 3-byte and 1-byte counts
        assert_eq!(sdata.runs_bytes().len(), 5);
        sdata.validate().unwrap();

        let runs: Vec<Run> = sdata.runs().collect();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0], Run { value: 1.5, count: 3 });
        assert_eq!(runs[1], Run { value: 0.0, count: 1000 });
        assert!(is_nvp(runs[2].value));
        assert_eq!(runs[2].count, 2);
    }

    #[test]
    fn test_append_rejects_non_positive_counts() {
        let mut sdata = build(&[(1.0, 1)]);
        assert!(matches!(sdata.append_run(2.0, 0), Err(SvecError::InvalidRunLength(0))));
        assert!(matches!(sdata.append_run(2.0, -3), Err(SvecError::InvalidRunLength(-3))));
        assert_eq!(sdata.unique_run_count(), 1);
        assert_eq!(sdata.total_logical_count(), 1);
        sdata.validate().unwrap();
    }

    #[test]
    fn test_append_beyond_presized_capacity() {
        let mut sdata = SparseData::new_empty(0).unwrap();
        for i in 0..100 {
            sdata.append_run(i as f64, i + 1).unwrap();
        }
        assert_eq!(sdata.unique_run_count(), 100);
        assert_eq!(sdata.total_logical_count(), 5050);
        assert!(sdata.values_capacity() >= sdata.values_bytes().len());
        sdata.validate().unwrap();
    }

    #[test]
    fn test_total_capped_at_i64_max() {
        let mut sdata = build(&[(1.0, i64::MAX)]);
        assert_eq!(sdata.total_logical_count(), MAX_TOTAL_LOGICAL_COUNT);
        assert!(matches!(
            sdata.append_run(2.0, 1),
            Err(SvecError::CountOverflow { field: "total_logical_count", .. })
        ));
        assert_eq!(sdata.unique_run_count(), 1);
        sdata.validate().unwrap();

        // two maximal runs decoded from raw parts must not validate either
        let mut runs = sdata.runs_bytes().to_vec();
        runs.extend_from_slice(sdata.runs_bytes());
        let mut values = sdata.values_bytes().to_vec();
        values.extend_from_slice(sdata.values_bytes());
        let result = SparseData::from_raw_parts(FLOAT8_TYPE_TAG, 2, u64::MAX - 1, values, runs);
        assert!(matches!(result, Err(SvecError::CountOverflow { .. })));
    }

    #[test]
    fn test_huge_presize_reports_allocation_failure() {
        assert!(matches!(
            SparseData::new_empty(usize::MAX / 16),
            Err(SvecError::AllocationFailure { .. })
        ));
        assert!(matches!(
            SparseData::new_empty(usize::MAX),
            Err(SvecError::AllocationFailure { requested: usize::MAX })
        ));
    }

    #[test]
    fn test_grow_doubles_and_preserves_content() {
        let sdata = build(&[(4.0, 2), (5.0, 1)]);
        let values_cap = sdata.values_capacity();
        let runs_cap = sdata.runs_capacity();

        let grown = sdata.grow().unwrap();
        assert_eq!(grown.values_capacity(), values_cap * 2);
        assert_eq!(grown.runs_capacity(), runs_cap * 2);
        assert_eq!(grown, sdata);

        let empty =
            SparseData::from_raw_parts(FLOAT8_TYPE_TAG, 0, 0, Vec::new(), Vec::new()).unwrap();
        let floored = empty.grow().unwrap();
        assert_eq!(floored.values_capacity(), VALUES_GROWTH_FLOOR);
        assert_eq!(floored.runs_capacity(), RUNS_GROWTH_FLOOR);
    }

    #[test]
    fn test_trim_keeps_content() {
        let mut sdata = build(&[(1.0, 7)]);
        let before = sdata.clone();
        sdata.trim();
        assert_eq!(sdata.values_capacity(), sdata.values_bytes().len());
        assert_eq!(sdata.runs_capacity(), sdata.runs_bytes().len());
        assert_eq!(sdata, before);
    }

    #[test]
    fn test_validate_rejects_mismatched_counts() {
        let sdata = build(&[(1.0, 2), (2.0, 3)]);
        let values = sdata.values_bytes().to_vec();
        let runs = sdata.runs_bytes().to_vec();

        let raw = |unique, total, values: &[u8]| {
            let (values, runs) = (values.to_vec(), runs.clone());
            SparseData::from_raw_parts(FLOAT8_TYPE_TAG, unique, total, values, runs)
        };
        assert!(matches!(raw(3, 5, &values), Err(SvecError::InvalidSparseData(_))));
        assert!(matches!(raw(2, 6, &values), Err(SvecError::InvalidSparseData(_))));
        assert!(matches!(raw(2, 5, &values[..8]), Err(SvecError::InvalidSparseData(_))));

        let bad_type = SparseData::from_raw_parts(23, 2, 5, values.clone(), runs.clone());
        assert!(matches!(bad_type, Err(SvecError::UnsupportedElementType(23))));

        let ok = SparseData::from_raw_parts(FLOAT8_TYPE_TAG, 2, 5, values, runs).unwrap();
        assert_eq!(ok, sdata);
    }

    #[test]
    fn test_validate_rejects_corrupt_run_stream() {
        let sdata = build(&[(1.0, 300)]);
        let mut runs = sdata.runs_bytes().to_vec();
        runs.pop();
        let values = sdata.values_bytes().to_vec();
        let result = SparseData::from_raw_parts(FLOAT8_TYPE_TAG, 1, 300, values, runs);
        assert!(matches!(result, Err(SvecError::MalformedRunStream { offset: 0 })));
    }

    #[test]
    fn test_sum_of_runs_matches_total() {
        let sdata = build(&[(1.0, 1), (2.0, 127), (3.0, 128), (4.0, 40_000)]);
        let sum: u64 = sdata.runs().map(|run| run.count).sum();
        assert_eq!(sum, sdata.total_logical_count());
        assert_eq!(sdata.runs().len(), sdata.unique_run_count());
        assert_eq!(sdata.unique_values().count(), sdata.unique_run_count());
    }
}
