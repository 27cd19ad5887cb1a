//! Timestamp labels for frame captures.
//!
//! Labels are `HH:MM:SS` with two-digit, zero-padded fields. Hours widen
//! past 99 rather than wrapping. Parsing accepts both `HH:MM:SS` and the
//! hour-less `MM:SS` form.

/// Errors from parsing a timestamp label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimecodeError {
    #[error("Expected MM:SS or HH:MM:SS, got {0:?}")]
    Shape(String),

    #[error("Non-numeric field {field:?} in {label:?}")]
    NotANumber { label: String, field: String },

    #[error("Field out of range in {0:?} (minutes and seconds must be below 60)")]
    OutOfRange(String),
}

/// Split seconds into whole `(hours, minutes, seconds)`.
///
/// Fractional seconds are truncated; negative and non-finite input is
/// treated as zero.
pub fn split_hms(secs: f64) -> (u64, u64, u64) {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.trunc() as u64
    } else {
        0
    };
    (total / 3600, (total % 3600) / 60, total % 60)
}

/// Format seconds as an `HH:MM:SS` label.
pub fn format_timestamp(secs: f64) -> String {
    let (hours, minutes, seconds) = split_hms(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Parse an `HH:MM:SS` or `MM:SS` label back into whole seconds.
pub fn parse_timestamp(label: &str) -> Result<u64, TimecodeError> {
    let fields: Vec<&str> = label.trim().split(':').collect();
    let (hours, minutes, seconds) = match fields.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => ("0", *m, *s),
        _ => return Err(TimecodeError::Shape(label.to_string())),
    };

    let parse = |field: &str| {
        field
            .parse::<u64>()
            .map_err(|_| TimecodeError::NotANumber {
                label: label.to_string(),
                field: field.to_string(),
            })
    };

    let (h, m, s) = (parse(hours)?, parse(minutes)?, parse(seconds)?);
    if m >= 60 || s >= 60 {
        return Err(TimecodeError::OutOfRange(label.to_string()));
    }
    Ok(h * 3600 + m * 60 + s)
}
