//! Frame payload parsing
//!
//! A frame carries `width, angle[, height]` as decimal numbers. Fields may be
//! separated by commas, semicolons or whitespace.

use contracts::TelemetryFrame;

use crate::error::{LinkError, Result};

/// Parse frame text into a measurement
///
/// # Errors
/// `LinkError::MalformedPayload` when the field count is not 2 or 3, or a
/// field is not a finite number.
pub fn parse_frame(text: &str) -> Result<TelemetryFrame> {
    let fields: Vec<&str> = text
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace() || c == '\0')
        .filter(|field| !field.is_empty())
        .collect();

    if !(2..=3).contains(&fields.len()) {
        return Err(LinkError::malformed(
            text,
            format!("expected 2 or 3 fields, got {}", fields.len()),
        ));
    }

    let mut values = [0.0f64; 3];
    for (slot, field) in values.iter_mut().zip(&fields) {
        let value: f64 = field
            .parse()
            .map_err(|e| LinkError::malformed(text, format!("field {field:?}: {e}")))?;
        if !value.is_finite() {
            return Err(LinkError::malformed(
                text,
                format!("field {field:?} is not finite"),
            ));
        }
        *slot = value;
    }

    Ok(match fields.len() {
        3 => TelemetryFrame::with_height(values[0], values[1], values[2]),
        _ => TelemetryFrame::new(values[0], values[1]),
    })
}
