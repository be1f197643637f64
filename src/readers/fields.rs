use crate::error::{ProcessingError, Result};
use crate::utils::constants::EPW_MISSING_SENTINELS;

/// How a positional field is coerced after extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Decimal,
    Flag,
}

/// A decoded field. `Missing` is the explicit no-value marker; callers
/// must never conflate it with a numeric zero.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

/// 1-based inclusive column range within a fixed-width record, with an
/// optional trailing flag range ending at `flag_end`.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpan {
    pub start: usize,
    pub end: usize,
    pub flag_end: Option<usize>,
}

impl ColumnSpan {
    pub const fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            flag_end: None,
        }
    }

    pub const fn with_flag(start: usize, end: usize, flag_end: usize) -> Self {
        Self {
            start,
            end,
            flag_end: Some(flag_end),
        }
    }
}

/// Slice the value columns of `span` out of a fixed-width line.
///
/// Offsets are taken from the format's published 1-based layout; no
/// auto-detection is attempted. A line too short for the span is a
/// format error.
pub fn extract_columns<'a>(line: &'a str, span: &ColumnSpan) -> Result<&'a str> {
    line.get(span.start - 1..span.end).ok_or_else(|| {
        ProcessingError::InvalidFormat(format!(
            "record too short for columns {}..{} (len {})",
            span.start,
            span.end,
            line.len()
        ))
    })
}

/// Slice the flag columns of `span`, when the span has one.
pub fn extract_flag<'a>(line: &'a str, span: &ColumnSpan) -> Result<Option<&'a str>> {
    match span.flag_end {
        None => Ok(None),
        Some(flag_end) => line
            .get(span.end..flag_end)
            .map(Some)
            .ok_or_else(|| {
                ProcessingError::InvalidFormat(format!(
                    "record too short for flag columns {}..{} (len {})",
                    span.end + 1,
                    flag_end,
                    line.len()
                ))
            }),
    }
}

/// Decode one comma-delimited EPW field into a typed value.
///
/// The EPW sentinel family (`*`..`******`, `?`, `??`, `undefined`)
/// decodes to `Missing`. An empty field decodes to numeric zero, a
/// quirk of the source format's consumers, preserved deliberately. A
/// non-numeric token that is not a sentinel is a decode error; the
/// caller decides whether that is fatal.
pub fn decode_epw_field(text: &str, kind: FieldKind) -> Result<FieldValue> {
    if kind == FieldKind::Flag {
        return Ok(FieldValue::Text(text.to_string()));
    }

    let trimmed = text.trim();
    if EPW_MISSING_SENTINELS.contains(&trimmed) {
        return Ok(FieldValue::Missing);
    }
    if trimmed.is_empty() {
        return Ok(match kind {
            FieldKind::Integer => FieldValue::Int(0),
            FieldKind::Decimal => FieldValue::Float(0.0),
            FieldKind::Flag => unreachable!(),
        });
    }

    let value: f64 = trimmed
        .parse()
        .map_err(|_| ProcessingError::FieldDecode {
            value: trimmed.to_string(),
            kind: match kind {
                FieldKind::Integer => "integer",
                _ => "decimal",
            },
        })?;

    Ok(match kind {
        FieldKind::Integer => FieldValue::Int(value as i64),
        FieldKind::Decimal => FieldValue::Float(value),
        FieldKind::Flag => unreachable!(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sentinels_decode_to_missing() {
        for sentinel in ["*", "**", "***", "****", "*****", "******", "?", "??", "undefined"] {
            assert_eq!(
                decode_epw_field(sentinel, FieldKind::Decimal).unwrap(),
                FieldValue::Missing,
                "sentinel {:?}",
                sentinel
            );
            assert_eq!(
                decode_epw_field(sentinel, FieldKind::Integer).unwrap(),
                FieldValue::Missing
            );
        }
    }

    #[test]
    fn test_blank_decodes_to_zero_not_missing() {
        // Inconsistent with the sentinel rule above, but matches the
        // source format's observed consumers. See DESIGN.md.
        assert_eq!(
            decode_epw_field("", FieldKind::Decimal).unwrap(),
            FieldValue::Float(0.0)
        );
        assert_eq!(
            decode_epw_field("   ", FieldKind::Integer).unwrap(),
            FieldValue::Int(0)
        );
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(
            decode_epw_field("23.5", FieldKind::Decimal).unwrap(),
            FieldValue::Float(23.5)
        );
        assert_eq!(
            decode_epw_field("270", FieldKind::Integer).unwrap(),
            FieldValue::Int(270)
        );
        // Integer columns truncate decimal text the way the source data expects
        assert_eq!(
            decode_epw_field("9.0", FieldKind::Integer).unwrap(),
            FieldValue::Int(9)
        );
    }

    #[test]
    fn test_garbage_in_numeric_field_is_an_error() {
        let err = decode_epw_field("abc", FieldKind::Decimal).unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::FieldDecode { .. }
        ));
    }

    #[test]
    fn test_flag_fields_pass_through() {
        assert_eq!(
            decode_epw_field("?9?9?9", FieldKind::Flag).unwrap(),
            FieldValue::Text("?9?9?9".to_string())
        );
    }

    #[test]
    fn test_extract_columns_one_based_inclusive() {
        //        123456789
        let line = "ABCDEFGHI";
        let span = ColumnSpan::new(3, 5);
        assert_eq!(extract_columns(line, &span).unwrap(), "CDE");
    }

    #[test]
    fn test_extract_flag() {
        let line = "0123456789";
        let span = ColumnSpan::with_flag(2, 4, 6);
        assert_eq!(extract_columns(line, &span).unwrap(), "123");
        assert_eq!(extract_flag(line, &span).unwrap(), Some("45"));

        let plain = ColumnSpan::new(2, 4);
        assert_eq!(extract_flag(line, &plain).unwrap(), None);
    }

    #[test]
    fn test_short_record_is_a_format_error() {
        let span = ColumnSpan::new(8, 12);
        assert!(extract_columns("short", &span).is_err());
    }
}
