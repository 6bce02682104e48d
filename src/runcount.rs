//! Variable-length encoding for run-length counts
//! Format: counts 1..=127 take a single byte holding `-count` (high bit set).
//! Larger counts take a tag byte giving the payload width (2, 4 or 8) followed
//! by the count as a little-endian signed integer of that width.
//! The first byte alone determines how many bytes the entry occupies.

use crate::error::{Result, SvecError};
use byteorder::{ByteOrder, LittleEndian};
use std::ops::Deref;

/// Widest possible encoding: tag byte plus an 8-byte payload.
pub const MAX_RUN_BYTES: usize = 9;

const WIDE_16: u8 = 2;
const WIDE_32: u8 = 4;
const WIDE_64: u8 = 8;

/// One encoded run count, held inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBytes {
    buf: [u8; MAX_RUN_BYTES],
    len: u8,
}

impl RunBytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }
}

impl Deref for RunBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

pub fn encode_run(count: i64) -> Result<RunBytes> {
    if count <= 0 {
        return Err(SvecError::InvalidRunLength(count));
    }

    let mut buf = [0u8; MAX_RUN_BYTES];
    let len = if count < 128 {
        buf[0] = (-(count as i8)) as u8;
        1
    } else if count < 1 << 15 {
        buf[0] = WIDE_16;
        LittleEndian::write_i16(&mut buf[1..3], count as i16);
        3
    } else if count < 1 << 31 {
        buf[0] = WIDE_32;
        LittleEndian::write_i32(&mut buf[1..5], count as i32);
        5
    } else {
        buf[0] = WIDE_64;
        LittleEndian::write_i64(&mut buf[1..9], count);
        9
    };

    Ok(RunBytes { buf, len })
}

/// Total width of the entry introduced by `first`, or `None` for an unknown tag.
pub fn encoded_width(first: u8) -> Option<usize> {
    if (first as i8) < 0 {
        return Some(1);
    }
    match first {
        WIDE_16 | WIDE_32 | WIDE_64 => Some(1 + first as usize),
        _ => None,
    }
}

/// Decodes the entry starting at `offset`, returning the count and the bytes it used.
pub fn decode_run(bytes: &[u8], offset: usize) -> Result<(i64, usize)> {
    let first = *bytes.get(offset).ok_or(SvecError::MalformedRunStream { offset })?;
    let width = encoded_width(first).ok_or(SvecError::MalformedRunStream { offset })?;
    let entry = bytes
        .get(offset..offset + width)
        .ok_or(SvecError::MalformedRunStream { offset })?;

    let count = match first {
        WIDE_16 => LittleEndian::read_i16(&entry[1..]) as i64,
        WIDE_32 => LittleEndian::read_i32(&entry[1..]) as i64,
        WIDE_64 => LittleEndian::read_i64(&entry[1..]),
        single => -((single as i8) as i64),
    };

    if count <= 0 {
        return Err(SvecError::MalformedRunStream { offset });
    }
    Ok((count, width))
}
