//! Rounding of numeric field values.

use crate::data::record::Record;

/// A field value, classified by whether it is a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// A finite floating point number.
    Number(f64),
    /// Anything else, e.g., an HGVS string or `NA`.
    Text(&'a str),
}

impl<'a> FieldValue<'a> {
    /// Classify a raw field value.
    pub fn parse(raw: &'a str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => FieldValue::Number(value),
            _ => FieldValue::Text(raw),
        }
    }

    /// Format the value with at most `places` decimal places.
    ///
    /// Numbers are rounded and written without trailing zeros, text is
    /// returned unchanged.
    pub fn rounded(&self, places: usize) -> String {
        match self {
            FieldValue::Number(value) => format_rounded(*value, places),
            FieldValue::Text(raw) => raw.to_string(),
        }
    }
}

/// Round `value` to `places` decimal places and strip insignificant zeros.
pub fn format_rounded(value: f64, places: usize) -> String {
    let formatted = format!("{:.*}", places, value);
    let trimmed = if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.')
    } else {
        formatted.as_str()
    };
    match trimmed {
        "-0" => "0".to_string(),
        _ => trimmed.to_string(),
    }
}

/// Round all numeric values of `record` in place.
pub fn round_record(record: &mut Record, places: usize) {
    for value in record.values_mut() {
        let number = match FieldValue::parse(value) {
            FieldValue::Number(number) => number,
            FieldValue::Text(_) => continue,
        };
        *value = format_rounded(number, places);
    }
}
