//! Text form of a sparse vector: `{run,run,...}:{value,value,...}`
//!
//! The left array holds run lengths, the right array the unique value of each
//! run. Runs are taken verbatim, never re-merged. NULL values are written as
//! `NVP` and accepted as either `NVP` or `NULL`.

use crate::convert::run_lengths;
use crate::error::{Result, SvecError};
use crate::literal::{format_array_literal, parse_array_literal};
use crate::sparse_data::SparseData;
use crate::svec::SparseVector;
use crate::value::{nvp, to_option, NVP_TOKEN};

pub fn parse_svec(input: &str) -> Result<SparseVector> {
    let (counts_text, values_text) = input.split_once(':').ok_or(SvecError::MissingSeparator)?;

    let counts = parse_array_literal(counts_text)?
        .into_iter()
        .map(|element| {
            element
                .filter(|t| !is_null_token(t))
                .map(|t| parse_count(&t))
                .transpose()
        })
        .collect::<Result<Vec<Option<i64>>>>()?;
    let values = parse_array_literal(values_text)?
        .into_iter()
        .map(|element| match element {
            Some(t) if !is_null_token(&t) => parse_float8(&t),
            _ => Ok(nvp()),
        })
        .collect::<Result<Vec<f64>>>()?;

    if counts.len() != values.len() {
        return Err(SvecError::RunCountMismatch {
            counts: counts.len(),
            values: values.len(),
        });
    }
    let counts = counts
        .into_iter()
        .collect::<Option<Vec<i64>>>()
        .ok_or(SvecError::NullCountArray)?;
    if let Some(&bad) = counts.iter().find(|&&count| count <= 0) {
        return Err(SvecError::InvalidRunLength(bad));
    }

    let mut sdata = SparseData::new_empty(counts.len())?;
    for (&count, &value) in counts.iter().zip(values.iter()) {
        sdata.append_run(value, count)?;
    }
    SparseVector::from_sparse_data(sdata, true)
}

pub fn render_svec(svec: &SparseVector) -> String {
    render_sparse_data(svec.data())
}

pub fn render_sparse_data(sdata: &SparseData) -> String {
    let counts = format_array_literal(run_lengths(sdata).iter().map(|c| c.to_string()));
    let values = format_array_literal(sdata.unique_values().map(|v| match to_option(v) {
        Some(v) => format_float8(v),
        None => NVP_TOKEN.to_string(),
    }));
    format!("{}:{}", counts, values)
}

/// Parses a plain dense array literal such as `{1,NULL,2.5}`.
pub fn parse_dense_array(input: &str) -> Result<Vec<Option<f64>>> {
    parse_array_literal(input)?
        .into_iter()
        .map(|element| match element {
            Some(t) if !is_null_token(&t) => parse_float8(&t).map(Some),
            _ => Ok(None),
        })
        .collect()
}

/// Renders dense values as an array literal, NULLs as `NULL`.
pub fn render_dense_array(values: &[Option<f64>]) -> String {
    format_array_literal(values.iter().map(|v| match v {
        Some(v) => format_float8(*v),
        None => "NULL".to_string(),
    }))
}

/// Renders a float the way the host prints float8: shortest round-trip digits,
/// `%g`-style exponents outside `[1e-4, 1e15)`, and spelled-out specials.
pub fn format_float8(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e15).contains(&magnitude) {
        let formatted = format!("{:e}", value);
        if let Some((mantissa, exponent)) = formatted.split_once('e') {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            return format!("{}e{}{:0>2}", mantissa, sign, digits);
        }
        return formatted;
    }
    format!("{}", value)
}

/// Parses a float element, accepting the host spellings of the specials.
pub fn parse_float8(token: &str) -> Result<f64> {
    let token = token.trim();
    match token.to_ascii_lowercase().as_str() {
        "nan" => return Ok(f64::NAN),
        "infinity" | "+infinity" | "inf" | "+inf" => return Ok(f64::INFINITY),
        "-infinity" | "-inf" => return Ok(f64::NEG_INFINITY),
        _ => {}
    }
    let value = token
        .parse::<f64>()
        .map_err(|_| SvecError::MalformedLiteral(format!("invalid float value {:?}", token)))?;
    if !value.is_finite() {
        // only the spelled-out specials above may produce NaN or an infinity
        return Err(SvecError::MalformedLiteral(format!("float value {:?} is out of range", token)));
    }
    Ok(value)
}

fn parse_count(token: &str) -> Result<i64> {
    token
        .trim()
        .parse::<i64>()
        .map_err(|_| SvecError::MalformedLiteral(format!("invalid run length {:?}", token)))
}

fn is_null_token(token: &str) -> bool {
    token.eq_ignore_ascii_case(NVP_TOKEN) || token.eq_ignore_ascii_case("NULL")
}
