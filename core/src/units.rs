//! Parsers for the human-readable durations and rates used in configuration.

use crate::prelude::{NetworkError, NetworkResult};

fn unit_seconds(unit: &str) -> Option<f64> {
    match unit {
        "" | "s" | "sec" => Some(1.0),
        "m" | "min" => Some(60.0),
        "h" => Some(3600.0),
        "d" => Some(86_400.0),
        _ => None,
    }
}

fn split_number(text: &str) -> (&str, &str) {
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+' || c == 'e'))
        .unwrap_or(text.len());
    (&text[..end], text[end..].trim())
}

/// Parses durations such as `"1h"`, `"7m"`, `"30s"`, `"2d"` or `"300"` into seconds.
pub fn parse_duration(text: &str) -> NetworkResult<f64> {
    let trimmed = text.trim();
    let (number, unit) = split_number(trimmed);
    let value: f64 = number
        .parse()
        .map_err(|_| NetworkError::InvalidDuration(text.to_string()))?;
    let scale = unit_seconds(unit).ok_or_else(|| NetworkError::InvalidDuration(text.to_string()))?;
    let seconds = value * scale;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(NetworkError::InvalidDuration(text.to_string()));
    }
    Ok(seconds)
}

/// Parses rates such as `"1/s"`, `"5Hz"`, `"10/m"` or `"1"` into Hz.
pub fn parse_rate(text: &str) -> NetworkResult<f64> {
    let trimmed = text.trim();
    let invalid = || NetworkError::InvalidRate(text.to_string());

    let hz = if let Some((count, per)) = trimmed.split_once('/') {
        let count: f64 = count.trim().parse().map_err(|_| invalid())?;
        // "1/s" reads as one per second, "1/5s" as one per five seconds
        let per = per.trim();
        let period = if per.starts_with(|c: char| c.is_ascii_alphabetic()) {
            parse_duration(&format!("1{}", per))
        } else {
            parse_duration(per)
        }
        .map_err(|_| invalid())?;
        if period == 0.0 {
            return Err(invalid());
        }
        count / period
    } else {
        let number = trimmed
            .strip_suffix("Hz")
            .or_else(|| trimmed.strip_suffix("hz"))
            .unwrap_or(trimmed);
        number.trim().parse().map_err(|_| invalid())?
    };

    if !hz.is_finite() || hz <= 0.0 {
        return Err(invalid());
    }
    Ok(hz)
}
