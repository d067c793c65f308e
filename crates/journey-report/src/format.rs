//! Display formatting for metric goals

use journey_core::{MeasurementType, Metric};

/// Rendered when a metric has no goal
pub const NO_GOAL: &str = "N/A";

/// Render a metric goal
///
/// Percentages print the plain number with a `%` suffix; counts and
/// durations use grouped thousands with at most three fraction digits.
#[must_use]
pub fn format_metric_goal(metric: &Metric) -> String {
    match (metric.metric_goal, metric.measurement_type) {
        (None, _) => NO_GOAL.to_string(),
        (Some(goal), MeasurementType::Percentage) => format!("{goal}%"),
        (Some(goal), _) => group_thousands(goal),
    }
}

/// `1234567.891` -> `1,234,567.891`
#[must_use]
pub fn group_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 5);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if !frac_part.is_empty() {
        grouped.push('.');
        grouped.push_str(frac_part);
    }

    let is_zero = int_part.bytes().all(|b| b == b'0') && frac_part.is_empty();
    if value.is_sign_negative() && !is_zero {
        grouped.insert(0, '-');
    }
    grouped
}
