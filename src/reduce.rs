//! Two-argument float reducers with NULL propagation.
//!
//! One NULL argument yields the other argument; two NULLs yield NULL.

pub fn min(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(left), Some(right)) => Some(if left < right { left } else { right }),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

pub fn max(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(left), Some(right)) => Some(if left > right { left } else { right }),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}
