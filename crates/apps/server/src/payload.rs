//! JSON shapes for computed results.

use serde_json::{json, Map, Value};
use stats::{Outcome, Summary};

// Largest magnitude below which every integral f64 is exact as an i64.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Encodes a number the way JSON clients expect: `3` rather than `3.0`.
/// Non-finite values have no JSON form and become `null`.
pub fn number(x: f64) -> Value {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < MAX_EXACT_INT {
        return Value::from(x as i64);
    }
    serde_json::Number::from_f64(x)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

pub fn numbers(xs: &[f64]) -> Value {
    Value::Array(xs.iter().copied().map(number).collect())
}

fn summary_payload(summary: &Summary) -> Value {
    json!({
        "operation": "all",
        "mean": number(summary.mean),
        "median": number(summary.median),
        "mode": numbers(&summary.mode),
    })
}

/// The value stored for an outcome: a number, a list, or the flat summary.
pub fn saved_value(outcome: &Outcome) -> Value {
    match outcome {
        Outcome::Mean(v) | Outcome::Median(v) => number(*v),
        Outcome::Mode(modes) => numbers(modes),
        Outcome::All(summary) => summary_payload(summary),
    }
}

/// Response body: `{operation, value}`, except `all`, which is flat.
pub fn response_body(outcome: &Outcome) -> Value {
    if let Outcome::All(summary) = outcome {
        return summary_payload(summary);
    }
    let mut body = Map::new();
    body.insert(
        "operation".to_string(),
        Value::from(outcome.operation().as_str()),
    );
    body.insert("value".to_string(), saved_value(outcome));
    Value::Object(body)
}
