//! # Duration Parsing
//!
//! Parses Kubernetes-style duration strings such as `500ms`, `30s`, `1m`, `1h` or `1d`.

use super::ConfigError;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

// Matches: <number><unit> where unit is ms, s, m, h or d (case insensitive)
static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<number>\d+)(?P<unit>ms|s|m|h|d)$")
        .expect("Failed to compile duration regex - this should never happen")
});

/// Parse a Kubernetes duration string into a [`Duration`]
///
/// The number must be greater than zero.
pub fn parse_kubernetes_duration(duration_str: &str) -> Result<Duration, ConfigError> {
    let duration_trimmed = duration_str.trim();

    if duration_trimmed.is_empty() {
        return Err(invalid(duration_trimmed, "duration string cannot be empty"));
    }

    let interval_lower = duration_trimmed.to_lowercase();
    let captures = DURATION_REGEX.captures(&interval_lower).ok_or_else(|| {
        invalid(
            duration_trimmed,
            "expected format <number><unit> (e.g. '500ms', '30s', '1m', '1h')",
        )
    })?;

    let number: u64 = captures["number"]
        .parse()
        .map_err(|e| invalid(duration_trimmed, &format!("invalid number: {e}")))?;

    if number == 0 {
        return Err(invalid(duration_trimmed, "number must be greater than 0"));
    }

    let millis_per_unit: u64 = match &captures["unit"] {
        "ms" => 1,
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        unit => {
            return Err(invalid(
                duration_trimmed,
                &format!("invalid unit '{unit}', expected ms, s, m, h or d"),
            ))
        }
    };

    let millis = number
        .checked_mul(millis_per_unit)
        .ok_or_else(|| invalid(duration_trimmed, "duration overflows"))?;

    Ok(Duration::from_millis(millis))
}

fn invalid(value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidDuration {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
