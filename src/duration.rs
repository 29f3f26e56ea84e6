// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! ISO-8601 durations such as `P1D`, `PT5H4M` or `PT0.5S`.
//!
//! Fractional values are only allowed on seconds; the fraction is read
//! digit by digit into nanoseconds so `PT0.000123S` is exact.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::calendar::{Duration, NANOSECOND, SECOND, TIME_DIGITS};
use crate::error::CalendarError;

static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d*)(?:\.(\d+))?S)?)?$",
    )
    .expect("duration pattern is valid")
});

const UNITS: [char; 5] = ['Y', 'M', 'D', 'H', 'M'];

fn component(input: &str, digits: Option<regex::Match<'_>>) -> Result<i32, CalendarError> {
    match digits.map(|m| m.as_str()) {
        None | Some("") => Ok(0),
        Some(s) => s
            .parse()
            .map_err(|_| CalendarError::malformed_duration(input, "component out of range")),
    }
}

/// Parse an ISO-8601 duration into `[Y, m, d, H, M, S, ns]`.
///
/// ```
/// use timetemplates::duration::parse_duration;
/// assert_eq!(parse_duration("P1DT2H").unwrap(), [0, 0, 1, 2, 0, 0, 0]);
/// assert_eq!(parse_duration("PT0.5S").unwrap(), [0, 0, 0, 0, 0, 0, 500_000_000]);
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, CalendarError> {
    let Some(caps) = DURATION_PATTERN.captures(input) else {
        let reason = if input.contains('P') && input.contains('S') && !input.contains('T') {
            "ISO8601 duration expected but not found. Was the T missing before S?"
        } else {
            "ISO8601 duration expected but not found"
        };
        return Err(CalendarError::malformed_duration(input, reason));
    };

    let mut result = [0; TIME_DIGITS];
    for (slot, group) in (1..=6).enumerate() {
        result[slot] = component(input, caps.get(group))?;
    }
    if let Some(fraction) = caps.get(7) {
        let digits: String = fraction.as_str().chars().take(9).collect();
        let scale = 10_i32.pow(9 - digits.len() as u32);
        result[NANOSECOND] = digits
            .parse::<i32>()
            .map_err(|_| CalendarError::malformed_duration(input, "bad fractional seconds"))?
            * scale;
    }
    Ok(result)
}

/// Format up to seven duration components as ISO-8601, e.g.
/// `[0, 0, 7, 0, 0, 6]` as `P7DT6S`.
///
/// Only positive components are written. Sub-second values print with
/// three, six or nine decimals, whichever is exact. A zero duration is
/// `PT0S`, or `P0D` when no time-of-day components were given. Components
/// past the seventh are ignored.
pub fn format_duration(nn: &[i32]) -> String {
    let nn = &nn[..nn.len().min(TIME_DIGITS)];
    let mut sb = String::from("P");
    let mut need_t = false;

    for (i, (&value, unit)) in nn.iter().zip(UNITS).enumerate() {
        if i == 3 {
            need_t = true;
        }
        if value > 0 {
            if need_t {
                sb.push('T');
                need_t = false;
            }
            sb.push_str(&format!("{value}{unit}"));
        }
    }

    let seconds = nn.get(SECOND).copied().unwrap_or(0);
    let nanos = nn.get(NANOSECOND).copied().unwrap_or(0);
    if seconds > 0 || nanos > 0 {
        if !sb.contains('T') {
            sb.push('T');
        }
        if nanos == 0 {
            sb.push_str(&seconds.to_string());
        } else if nanos % 1_000_000 == 0 {
            sb.push_str(&format!("{seconds}.{:03}", nanos / 1_000_000));
        } else if nanos % 1000 == 0 {
            sb.push_str(&format!("{seconds}.{:06}", nanos / 1000));
        } else {
            sb.push_str(&format!("{seconds}.{nanos:09}"));
        }
        sb.push('S');
    }

    if sb.len() == 1 {
        sb.push_str(if nn.len() > 3 { "T0S" } else { "0D" });
    }
    sb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("P1D").unwrap(), [0, 0, 1, 0, 0, 0, 0]);
        assert_eq!(parse_duration("PT5H4M").unwrap(), [0, 0, 0, 5, 4, 0, 0]);
        assert_eq!(parse_duration("P1Y2M").unwrap(), [1, 2, 0, 0, 0, 0, 0]);
        assert_eq!(
            parse_duration("PT0.000123S").unwrap(),
            [0, 0, 0, 0, 0, 0, 123_000]
        );
        assert_eq!(parse_duration("PT52.000000S").unwrap(), [0, 0, 0, 0, 0, 52, 0]);
        assert_eq!(parse_duration("PT.5S").unwrap(), [0, 0, 0, 0, 0, 0, 500_000_000]);
        assert_eq!(parse_duration("P7DT6S").unwrap(), [0, 0, 7, 0, 0, 6, 0]);
    }

    #[test]
    fn test_parse_duration_errors() {
        let err = parse_duration("P1S").unwrap_err();
        assert!(err.to_string().contains("Was the T missing before S?"));
        assert!(parse_duration("1D").is_err());
        assert!(parse_duration("P1DX").is_err());
        assert!(parse_duration("P99999999999D").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(&[0, 0, 7, 0, 0, 6]), "P7DT6S");
        assert_eq!(format_duration(&[0, 0, 0, 0, 0, 0, 200_000]), "PT0.000200S");
        assert_eq!(format_duration(&[0, 0, 0, 0, 0, 0, 200_000_000]), "PT0.200S");
        assert_eq!(format_duration(&[0, 0, 0, 0, 0, 0, 200]), "PT0.000000200S");
        assert_eq!(format_duration(&[0, 0, 0, 0, 0, 2, 200_000]), "PT2.000200S");
        assert_eq!(format_duration(&[0, 0, 0, 0, 0, 0, 0]), "PT0S");
        assert_eq!(format_duration(&[0, 0, 1, 0, 0, 0, 0]), "P1D");
        assert_eq!(format_duration(&[0, 0]), "P0D");
        assert_eq!(format_duration(&[0, 0, 0, 5, 4, 0, 0]), "PT5H4M");
        assert_eq!(format_duration(&[0, 0, 1, 5, 0, 30, 0]), "P1DT5H30S");
    }

    #[test]
    fn test_duration_round_trip() {
        for s in ["PT5H4M", "P7DT6S", "PT0.000123S", "P1Y2M3DT4H5M6S"] {
            assert_eq!(format_duration(&parse_duration(s).unwrap()), s);
        }
    }
}
