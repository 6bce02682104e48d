//! The NULL sentinel stored inside the numeric value buffer.
//!
//! A logical NULL is written as one reserved quiet-NaN bit pattern (`NVP`,
//! "no value present"). It is recognised by exact bit comparison only, so a
//! NaN produced by arithmetic stays an ordinary NaN and is never read back
//! as NULL.

/// Bit pattern of the NULL sentinel: quiet NaN with payload `0x4E56` ("NV").
pub const NVP_BITS: u64 = 0x7FF8_0000_0000_4E56;

/// Text token that stands for a NULL element in rendered output.
pub const NVP_TOKEN: &str = "NVP";

#[inline]
pub fn nvp() -> f64 {
    f64::from_bits(NVP_BITS)
}

#[inline]
pub fn is_nvp(value: f64) -> bool {
    value.to_bits() == NVP_BITS
}

#[inline]
pub fn to_option(value: f64) -> Option<f64> {
    if is_nvp(value) {
        None
    } else {
        Some(value)
    }
}

#[inline]
pub fn from_option(value: Option<f64>) -> f64 {
    value.unwrap_or_else(nvp)
}

/// Equality used when merging adjacent values into runs: two sentinels are
/// equal, everything else is exact floating-point `==`.
#[inline]
pub fn same_run_value(a: f64, b: f64) -> bool {
    a == b || (is_nvp(a) && is_nvp(b))
}
