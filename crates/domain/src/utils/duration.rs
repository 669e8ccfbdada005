//! RFC 5545 `dur-value` parser used for VALARM triggers.

use chrono::Duration;

use crate::errors::{CalarmError, Result};

/// Parse a signed iCalendar duration such as `-PT15M`, `+PT15M`,
/// `-P0DT0H30M0S`, `-P1W` or `PT0S`.
///
/// # Errors
/// Returns `CalarmError::Parse` for anything that is not a well-formed
/// duration.
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let invalid = || CalarmError::Parse(format!("Invalid duration: {raw}"));
    let trimmed = raw.trim();

    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let body = rest.strip_prefix(['P', 'p']).ok_or_else(invalid)?;

    let (date_part, time_part) = match body.find(['T', 't']) {
        Some(index) => (&body[..index], Some(&body[index + 1..])),
        None => (body, None),
    };

    let mut seconds: i64 = 0;
    let mut components = 0;

    for (amount, unit) in components_of(date_part).ok_or_else(invalid)? {
        let factor = match unit {
            'W' => 7 * 86_400,
            'D' => 86_400,
            _ => return Err(invalid()),
        };
        seconds = accumulate(seconds, amount, factor).ok_or_else(invalid)?;
        components += 1;
    }

    if let Some(time_part) = time_part {
        let parsed = components_of(time_part).ok_or_else(invalid)?;
        if parsed.is_empty() {
            return Err(invalid());
        }
        for (amount, unit) in parsed {
            let factor = match unit {
                'H' => 3_600,
                'M' => 60,
                'S' => 1,
                _ => return Err(invalid()),
            };
            seconds = accumulate(seconds, amount, factor).ok_or_else(invalid)?;
            components += 1;
        }
    }

    if components == 0 {
        return Err(invalid());
    }

    let signed = if negative { -seconds } else { seconds };
    Duration::try_seconds(signed).ok_or_else(invalid)
}

/// Split `1D` / `0H30M0S` into `(amount, unit)` pairs. `None` on malformed
/// input.
fn components_of(part: &str) -> Option<Vec<(i64, char)>> {
    let mut result = Vec::new();
    let mut digits = String::new();

    for ch in part.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else {
            if digits.is_empty() {
                return None;
            }
            let amount = digits.parse::<i64>().ok()?;
            result.push((amount, ch.to_ascii_uppercase()));
            digits.clear();
        }
    }

    if digits.is_empty() {
        Some(result)
    } else {
        None
    }
}

fn accumulate(total: i64, amount: i64, factor: i64) -> Option<i64> {
    amount.checked_mul(factor).and_then(|value| total.checked_add(value))
}
