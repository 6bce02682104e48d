//! Append-only byte buffer with amortized doubling growth.
//!
//! Capacity is tracked explicitly so that growth and trimming are observable
//! and deterministic. Growth never resizes in place: it allocates a fresh
//! buffer and copies the existing bytes over.

use crate::error::{Result, SvecError};

#[derive(Debug, Clone)]
pub struct GrowableBuffer {
    data: Vec<u8>,
    capacity: usize,
    min_increment: usize,
}

impl GrowableBuffer {
    pub fn new(min_increment: usize) -> Self {
        Self {
            data: Vec::new(),
            capacity: 0,
            min_increment,
        }
    }

    pub fn with_capacity(capacity: usize, min_increment: usize) -> Result<Self> {
        Ok(Self {
            data: allocate(capacity)?,
            capacity,
            min_increment,
        })
    }

    /// Adopts `bytes` as-is; capacity equals length.
    pub fn from_vec(bytes: Vec<u8>, min_increment: usize) -> Self {
        let capacity = bytes.len();
        Self {
            data: bytes,
            capacity,
            min_increment,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let required = self
            .data
            .len()
            .checked_add(bytes.len())
            .ok_or(SvecError::AllocationFailure { requested: usize::MAX })?;

        if required > self.capacity {
            let new_capacity = self.capacity_for(required)?;
            self.reallocate(new_capacity)?;
        }

        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Shortens the buffer; capacity is unchanged.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Drops unused slack so that capacity equals length.
    pub fn trim_to_len(&mut self) {
        self.data.shrink_to_fit();
        self.capacity = self.data.len();
    }

    /// A copy of this buffer with capacity `max(floor, 2 * capacity)`.
    pub fn grown(&self, floor: usize) -> Result<Self> {
        let capacity = self.next_capacity(floor);
        let mut data = allocate(capacity)?;
        data.extend_from_slice(&self.data);
        Ok(Self {
            data,
            capacity,
            min_increment: self.min_increment,
        })
    }

    /// Doubles from `max(min_increment, 2 * capacity)` until `required` fits.
    fn capacity_for(&self, required: usize) -> Result<usize> {
        let mut new_capacity = self.next_capacity(self.min_increment);
        while new_capacity < required {
            new_capacity = new_capacity
                .checked_mul(2)
                .ok_or(SvecError::AllocationFailure { requested: required })?;
        }
        Ok(new_capacity)
    }

    fn next_capacity(&self, floor: usize) -> usize {
        floor.max(self.capacity.saturating_mul(2))
    }

    fn reallocate(&mut self, new_capacity: usize) -> Result<()> {
        log::trace!("growing buffer {} -> {} bytes", self.capacity, new_capacity);
        let mut fresh = allocate(new_capacity)?;
        fresh.extend_from_slice(&self.data);
        self.data = fresh;
        self.capacity = new_capacity;
        Ok(())
    }
}

impl PartialEq for GrowableBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

fn allocate(capacity: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(capacity)
        .map_err(|_| SvecError::AllocationFailure { requested: capacity })?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_within_capacity() {
        let mut buffer = GrowableBuffer::with_capacity(8, 4).unwrap();
        buffer.append(b"abcd").unwrap();
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.capacity(), 8);
        assert_eq!(buffer.as_slice(), b"abcd");
    }

    #[test]
    fn test_growth_doubles_with_floor() {
        let mut buffer = GrowableBuffer::new(10);
        buffer.append(b"x").unwrap();
        assert_eq!(buffer.capacity(), 10);

        buffer.append(&[0u8; 10]).unwrap();
        assert_eq!(buffer.capacity(), 20);
        assert_eq!(buffer.len(), 11);
    }

    #[test]
    fn test_large_append_keeps_doubling() {
        let mut buffer = GrowableBuffer::with_capacity(4, 1).unwrap();
        buffer.append(&[7u8; 33]).unwrap();
        assert_eq!(buffer.capacity(), 64);
        assert!(buffer.as_slice().iter().all(|&b| b == 7));
    }

    #[test]
    fn test_capacity_for_overflow() {
        let buffer = GrowableBuffer::new(3);
        assert_eq!(buffer.capacity_for(7).unwrap(), 12);
        assert!(matches!(
            buffer.capacity_for(usize::MAX),
            Err(SvecError::AllocationFailure { requested: usize::MAX })
        ));
    }

    #[test]
    fn test_huge_allocations_fail_cleanly() {
        assert!(matches!(
            GrowableBuffer::with_capacity(usize::MAX, 1),
            Err(SvecError::AllocationFailure { requested: usize::MAX })
        ));

        let mut buffer = GrowableBuffer::new(usize::MAX / 2 + 1);
        assert!(matches!(buffer.append(b"x"), Err(SvecError::AllocationFailure { .. })));
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 0);
    }

    #[test]
    fn test_trim_to_len() {
        let mut buffer = GrowableBuffer::with_capacity(100, 1).unwrap();
        buffer.append(b"hello").unwrap();
        buffer.trim_to_len();
        assert_eq!(buffer.capacity(), 5);
        assert_eq!(buffer.as_slice(), b"hello");
    }

    #[test]
    fn test_grown_copies_content() {
        let mut buffer = GrowableBuffer::with_capacity(3, 1).unwrap();
        buffer.append(b"abc").unwrap();

        let grown = buffer.grown(9).unwrap();
        assert_eq!(grown.capacity(), 9);
        assert_eq!(grown.as_slice(), b"abc");

        let again = grown.grown(9).unwrap();
        assert_eq!(again.capacity(), 18);
        assert_eq!(again, buffer);
    }
}
