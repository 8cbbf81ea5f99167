//! Value coercion for loosely-typed numeric fields
//!
//! This is the only place where an unparsable numeric string degrades to
//! `0.0`. Shape violations (absent field, non-sequence, empty sequence, or a
//! first element that is neither number nor string) are errors. Elements after
//! the first are never inspected.

use serde_json::Value;

use crate::error::{Result, StatsError};
use crate::models::LooseNumber;

/// Coerce a raw field into a float
pub fn coerce(field: &'static str, raw: Option<&LooseNumber>) -> Result<f64> {
    let elements = match raw {
        Some(LooseNumber::Sequence(elements)) => elements,
        Some(LooseNumber::Other(value)) => {
            return Err(StatsError::malformed_field(
                field,
                format!("expected a sequence, got {value}"),
            ));
        }
        None => return Err(StatsError::malformed_field(field, "field is missing")),
    };

    match elements.first() {
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
            StatsError::malformed_field(field, format!("number {n} is not representable"))
        }),
        Some(Value::String(text)) => Ok(text.trim().parse::<f64>().unwrap_or(0.0)),
        Some(other) => Err(StatsError::malformed_field(
            field,
            format!("first element must be a number or string, got {other}"),
        )),
        None => Err(StatsError::malformed_field(field, "empty sequence")),
    }
}
