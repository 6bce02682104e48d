//! Lazy expansion of a SparseData into its logical values.
//!
//! Only the run currently being emitted is decoded; the cursor then advances
//! by that run's encoded width. Memory use is constant regardless of length.
//! The iterator is single pass: build a new one to iterate again.

use crate::runcount::decode_run;
use crate::sparse_data::SparseData;
use std::iter::FusedIterator;

pub struct Unnest<'a> {
    sdata: &'a SparseData,
    absolute_position: u64,
    run_index: usize,
    run_position: u64,
    cursor: usize,
    // (count, encoded width) of the run at `cursor`, decoded on first use
    current_run: Option<(u64, usize)>,
}

impl<'a> Unnest<'a> {
    pub fn new(sdata: &'a SparseData) -> Self {
        Self {
            sdata,
            absolute_position: 0,
            run_index: 0,
            run_position: 0,
            cursor: 0,
            current_run: None,
        }
    }

    /// Number of values already emitted.
    pub fn position(&self) -> u64 {
        self.absolute_position
    }

    fn remaining(&self) -> u64 {
        self.sdata.total_logical_count() - self.absolute_position
    }
}

impl Iterator for Unnest<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.absolute_position >= self.sdata.total_logical_count() {
            return None;
        }

        let (run_length, width) = match self.current_run {
            Some(run) => run,
            None => {
                // stream was validated on construction
                let (count, width) = decode_run(self.sdata.runs_bytes(), self.cursor).ok()?;
                let run = (count as u64, width);
                self.current_run = Some(run);
                run
            }
        };

        let value = self.sdata.value_at(self.run_index)?;
        self.absolute_position += 1;
        self.run_position += 1;

        if self.run_position >= run_length {
            self.run_position = 0;
            self.run_index += 1;
            self.cursor += width;
            self.current_run = None;
        }

        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining()) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl ExactSizeIterator for Unnest<'_> {}

impl FusedIterator for Unnest<'_> {}
