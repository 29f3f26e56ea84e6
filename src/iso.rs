// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! ISO-8601 time strings.
//!
//! Accepted input forms for [`iso_time_to_array`]:
//!
//! | Form | Example |
//! |------|---------|
//! | year | `2021` |
//! | year-month | `2021-03` |
//! | ISO week | `2022-W08` |
//! | day of year | `2020-033`, `2020-033Z`, `2020-033T06:07:08.000010001` |
//! | calendar date | `2020-01-01`, `2020-01-01Z`, `2020-01-01T00:00Z` |
//! | relative | `now`, `now-P1D`, `lastday`, `lasthour-PT1H` |
//!
//! Output is always UTC with a trailing `Z`, by default to nanoseconds:
//! `1999-12-31T23:00:00.000000000Z`.

use chrono::{DateTime, SecondsFormat};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::calendar::{
    self, DecomposedTime, DATE_DIGITS, DAY, HOUR, MINUTE, MONTH, NANOSECOND, SECOND,
    TIME_DIGITS, YEAR,
};
use crate::duration::parse_duration;
use crate::error::CalendarError;

static LAST_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^last([a-z]+)([+-]P.*)?$").expect("last pattern is valid"));

/// Parse a run of ASCII digits. Signs and whitespace are rejected.
pub(crate) fn parse_digits(input: &str, s: &str) -> Result<i32, CalendarError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CalendarError::malformed_time(
            input,
            format!("expected digits, got \"{s}\""),
        ));
    }
    s.parse()
        .map_err(|_| CalendarError::malformed_time(input, format!("\"{s}\" is out of range")))
}

fn digits_at(input: &str, from: usize, to: usize) -> Result<i32, CalendarError> {
    let s = input
        .get(from..to)
        .ok_or_else(|| CalendarError::malformed_time(input, "string is too short"))?;
    parse_digits(input, s)
}

// ═══════════════════════════════════════════════════════════════════════════
// Parsing
// ═══════════════════════════════════════════════════════════════════════════

/// Decompose an ISO-8601 time. Day-of-year input is normalized into
/// month and day.
///
/// ```
/// use timetemplates::iso::iso_time_to_array;
/// assert_eq!(
///     iso_time_to_array("2020-034T06:07:08.000010001").unwrap(),
///     [2020, 2, 3, 6, 7, 8, 10_001]
/// );
/// ```
pub fn iso_time_to_array(time: &str) -> Result<DecomposedTime, CalendarError> {
    if time.starts_with("now") || time.starts_with("last") {
        return relative_time(time, calendar::now());
    }
    absolute_time(time)
}

/// Resolve `now…` and `last<unit>…` forms against the given current time.
pub(crate) fn relative_time(
    time: &str,
    now: DecomposedTime,
) -> Result<DecomposedTime, CalendarError> {
    let mut n = now;
    let remainder = if let Some(rest) = time.strip_prefix("now") {
        rest
    } else {
        let caps = LAST_PATTERN
            .captures(time)
            .ok_or_else(|| CalendarError::malformed_time(time, "expected lastday+P1D, etc"))?;
        let idigit = match caps.get(1).map_or("", |m| m.as_str()) {
            "year" => 1,
            "month" => 2,
            "day" => 3,
            "hour" => 4,
            "minute" => 5,
            "second" => 6,
            unit => {
                return Err(CalendarError::malformed_time(
                    time,
                    format!("unsupported unit: {unit}"),
                ))
            }
        };
        for slot in n.iter_mut().take(DATE_DIGITS).skip(idigit.max(1)) {
            *slot = 1;
        }
        for slot in n.iter_mut().skip(idigit.max(DATE_DIGITS)) {
            *slot = 0;
        }
        caps.get(2).map_or("", |m| m.as_str())
    };

    if remainder.is_empty() {
        Ok(n)
    } else if let Some(d) = remainder.strip_prefix('-') {
        calendar::subtract(&n, &parse_duration(d)?)
    } else if let Some(d) = remainder.strip_prefix('+') {
        calendar::add(&n, &parse_duration(d)?)
    } else {
        Err(CalendarError::malformed_time(
            time,
            "expected + or - after now",
        ))
    }
}

fn absolute_time(time: &str) -> Result<DecomposedTime, CalendarError> {
    if !time.is_ascii() {
        return Err(CalendarError::malformed_time(time, "non-ASCII characters"));
    }
    let bytes = time.as_bytes();
    let len = bytes.len();

    if len == 4 {
        return Ok([parse_digits(time, time)?, 1, 1, 0, 0, 0, 0]);
    }
    if len < 7 {
        return Err(CalendarError::malformed_time(
            time,
            "time must have 4 or at least 7 characters",
        ));
    }

    if bytes[4] != b'-' && bytes[4] != b'W' {
        return Err(CalendarError::malformed_time(
            time,
            "expected '-' after the year; compact dates are not supported",
        ));
    }

    let (mut result, rest) = match len {
        7 if bytes[4] == b'W' => {
            return calendar::from_week_of_year(digits_at(time, 0, 4)?, digits_at(time, 5, 7)?);
        }
        7 => ([digits_at(time, 0, 4)?, digits_at(time, 5, 7)?, 1, 0, 0, 0, 0], ""),
        8 if bytes[5] == b'W' => {
            return calendar::from_week_of_year(digits_at(time, 0, 4)?, digits_at(time, 6, 8)?);
        }
        8 => ([digits_at(time, 0, 4)?, 1, digits_at(time, 5, 8)?, 0, 0, 0, 0], ""),
        _ if bytes[8] == b'T' || bytes[8] == b'Z' => (
            [digits_at(time, 0, 4)?, 1, digits_at(time, 5, 8)?, 0, 0, 0, 0],
            &time[9..],
        ),
        _ => (
            [
                digits_at(time, 0, 4)?,
                digits_at(time, 5, 7)?,
                digits_at(time, 8, 10)?,
                0,
                0,
                0,
                0,
            ],
            time.get(11..).unwrap_or(""),
        ),
    };

    let rest = rest.strip_suffix('Z').unwrap_or(rest);
    if rest.len() >= 2 {
        result[HOUR] = digits_at(rest, 0, 2)?;
    }
    if rest.len() >= 5 {
        result[MINUTE] = digits_at(rest, 3, 5)?;
    }
    if rest.len() >= 8 {
        result[SECOND] = digits_at(rest, 6, 8)?;
    }
    if rest.len() > 9 {
        let fraction = &rest[9..rest.len().min(18)];
        result[NANOSECOND] =
            parse_digits(rest, fraction)? * 10_i32.pow(9 - fraction.len() as u32);
    }

    calendar::normalize(&mut result)?;
    Ok(result)
}

// ═══════════════════════════════════════════════════════════════════════════
// Formatting
// ═══════════════════════════════════════════════════════════════════════════

/// Format to nanoseconds, folding a day-of-year into month and day first.
///
/// ```
/// use timetemplates::iso::iso_time_from_array;
/// assert_eq!(
///     iso_time_from_array(&[2000, 1, 45, 23, 0, 0, 0]).unwrap(),
///     "2000-02-14T23:00:00.000000000Z"
/// );
/// ```
pub fn iso_time_from_array(nn: &DecomposedTime) -> Result<String, CalendarError> {
    let mut t = *nn;
    if t[MONTH] == 1 && t[DAY] > 31 {
        let month = calendar::month_for_day_of_year(t[YEAR], t[DAY])?;
        let first = calendar::day_of_year(t[YEAR], month, 1)?;
        t[DAY] = t[DAY] - first + 1;
        t[MONTH] = month;
    }
    Ok(format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:09}Z",
        t[YEAR], t[MONTH], t[DAY], t[HOUR], t[MINUTE], t[SECOND], t[NANOSECOND]
    ))
}

/// Format a time omitting trailing zero precision. `$Y-$m-$dT$H:$M` is the
/// coarsest form returned.
pub fn format_iso8601_time_brief(time: &DecomposedTime) -> Result<String, CalendarError> {
    let full = iso_time_from_array(time)?;
    let nanos = time[NANOSECOND];
    let cut = if nanos == 0 {
        if time[SECOND] == 0 {
            16
        } else {
            19
        }
    } else if nanos % 1_000_000 == 0 {
        23
    } else if nanos % 1000 == 0 {
        26
    } else {
        return Ok(full);
    };
    Ok(format!("{}Z", &full[..cut]))
}

/// `$Y-$m-$dT$H:$M:$S.$(subsec;places=9)Z` form of any accepted time.
pub fn normalize_time_string(time: &str) -> Result<String, CalendarError> {
    let nn = iso_time_to_array(time)?;
    Ok(format!(
        "{}-{:02}-{:02}T{:02}:{:02}:{:02}.{:09}Z",
        nn[YEAR], nn[MONTH], nn[DAY], nn[HOUR], nn[MINUTE], nn[SECOND], nn[NANOSECOND]
    ))
}

/// Rewrite `time` in the same shape as `example`, which may be
/// day-of-year (`2020-112T…`, `2020-112Z`) or calendar (`2020-04-21T…`,
/// `2020-04-21Z`) and is matched to its length.
///
/// ```
/// use timetemplates::iso::reformat_iso_time;
/// assert_eq!(
///     reformat_iso_time("2020-01-01T00:00Z", "2020-112Z").unwrap(),
///     "2020-04-21T00:00Z"
/// );
/// ```
pub fn reformat_iso_time(example: &str, time: &str) -> Result<String, CalendarError> {
    let marker = example
        .as_bytes()
        .get(8)
        .copied()
        .ok_or_else(|| CalendarError::malformed_time(example, "example is too short"))?;
    let nn = iso_time_to_array(&normalize_time_string(time)?)?;

    let formatted = match marker {
        b'T' | b'Z' => {
            let doy = calendar::day_of_year(nn[YEAR], nn[MONTH], nn[DAY])?;
            if marker == b'T' {
                format!(
                    "{}-{:03}T{:02}:{:02}:{:02}.{:09}Z",
                    nn[YEAR], doy, nn[HOUR], nn[MINUTE], nn[SECOND], nn[NANOSECOND]
                )
            } else {
                format!("{}-{:03}Z", nn[YEAR], doy)
            }
        }
        _ => match example.as_bytes().get(10).copied().unwrap_or(b'Z') {
            b'T' => format!(
                "{}-{:02}-{:02}T{:02}:{:02}:{:02}.{:09}Z",
                nn[YEAR], nn[MONTH], nn[DAY], nn[HOUR], nn[MINUTE], nn[SECOND], nn[NANOSECOND]
            ),
            _ => format!("{}-{:02}-{:02}Z", nn[YEAR], nn[MONTH], nn[DAY]),
        },
    };

    let keep = if example.ends_with('Z') {
        example.len() - 1
    } else {
        example.len()
    };
    let truncated = formatted.get(..keep).unwrap_or(&formatted);
    if example.ends_with('Z') {
        Ok(format!("{}Z", truncated.trim_end_matches('Z')))
    } else {
        Ok(truncated.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Day stepping
// ═══════════════════════════════════════════════════════════════════════════

fn shift_day(day: &str, by: i32) -> Result<String, CalendarError> {
    let mut nn = iso_time_to_array(day)?;
    nn[DAY] += by;
    calendar::normalize(&mut nn)?;
    Ok(format!("{:04}-{:02}-{:02}Z", nn[YEAR], nn[MONTH], nn[DAY]))
}

/// The following day as `$Y-$m-$dZ`; the time of day is ignored.
pub fn next_day(day: &str) -> Result<String, CalendarError> {
    shift_day(day, 1)
}

/// The preceding day as `$Y-$m-$dZ`; the time of day is ignored.
pub fn previous_day(day: &str) -> Result<String, CalendarError> {
    shift_day(day, -1)
}

const MIDNIGHT: &str = "00:00:00.000000000Z";

/// The next midnight, or `time` itself (normalized) if already at midnight.
pub fn ceil(time: &str) -> Result<String, CalendarError> {
    let time = normalize_time_string(time)?;
    if time.get(11..) == Some(MIDNIGHT) {
        return Ok(time);
    }
    let next = next_day(time.get(..11).unwrap_or(&time))?;
    Ok(format!("{}T{MIDNIGHT}", &next[..10]))
}

/// The previous midnight, or `time` itself (normalized) if already at midnight.
pub fn floor(time: &str) -> Result<String, CalendarError> {
    let time = normalize_time_string(time)?;
    if time.get(11..) == Some(MIDNIGHT) {
        return Ok(time);
    }
    Ok(format!("{}T{MIDNIGHT}", time.get(..10).unwrap_or(&time)))
}

/// Each day from `start` up to (excluding) `stop`, as `$Y-$m-$dZ`.
///
/// `stop` must be a day boundary written with at least a full date.
pub fn count_off_days(start: &str, stop: &str) -> Result<Vec<String>, CalendarError> {
    match stop.as_bytes().get(10) {
        Some(c) if !c.is_ascii_digit() => {}
        _ => {
            return Err(CalendarError::malformed_time(
                stop,
                "arguments must be $Y-$m-$dZ",
            ))
        }
    }
    let stop_day = format!("{}Z", &floor(stop)?[..10]);
    let mut nn = iso_time_to_array(start)?;
    nn[HOUR..TIME_DIGITS].fill(0);

    let mut result = Vec::new();
    loop {
        let day = format!("{:04}-{:02}-{:02}Z", nn[YEAR], nn[MONTH], nn[DAY]);
        if day >= stop_day {
            break;
        }
        result.push(day);
        nn[DAY] += 1;
        calendar::normalize(&mut nn)?;
    }
    Ok(result)
}

// ═══════════════════════════════════════════════════════════════════════════
// Epoch milliseconds
// ═══════════════════════════════════════════════════════════════════════════

/// Milliseconds since `1970-01-01T00:00Z`.
pub fn to_milliseconds_since_1970(time: &str) -> Result<i64, CalendarError> {
    let nn = iso_time_to_array(time)?;
    Ok(calendar::to_datetime(&nn)?.timestamp_millis())
}

/// Format milliseconds since `1970-01-01T00:00Z`, printing only as many
/// fractional digits as needed (`1970-01-01T00:00:00.001Z`).
pub fn from_milliseconds_since_1970(millis: i64) -> Result<String, CalendarError> {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .ok_or_else(|| CalendarError::malformed_time(&millis.to_string(), "out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_time_to_array() {
        assert_eq!(
            iso_time_to_array("2020-034T06:07:08.000010001").unwrap(),
            [2020, 2, 3, 6, 7, 8, 10_001]
        );
        assert_eq!(
            iso_time_to_array("2012-01-17T02:00:00.245").unwrap(),
            [2012, 1, 17, 2, 0, 0, 245_000_000]
        );
        assert_eq!(iso_time_to_array("2020-033T00:00").unwrap(), [2020, 2, 2, 0, 0, 0, 0]);
        assert_eq!(iso_time_to_array("2020-033Z").unwrap(), [2020, 2, 2, 0, 0, 0, 0]);
        assert_eq!(iso_time_to_array("2020-033").unwrap(), [2020, 2, 2, 0, 0, 0, 0]);
        assert_eq!(iso_time_to_array("2020-03-03Z").unwrap(), [2020, 3, 3, 0, 0, 0, 0]);
        assert_eq!(iso_time_to_array("2020-03").unwrap(), [2020, 3, 1, 0, 0, 0, 0]);
        assert_eq!(iso_time_to_array("2021").unwrap(), [2021, 1, 1, 0, 0, 0, 0]);
        assert_eq!(
            iso_time_to_array("2020-01-01T00:00Z").unwrap(),
            [2020, 1, 1, 0, 0, 0, 0]
        );
        assert_eq!(iso_time_to_array("2020-01-01T05Z").unwrap(), [2020, 1, 1, 5, 0, 0, 0]);
    }

    #[test]
    fn test_iso_time_to_array_weeks() {
        assert_eq!(iso_time_to_array("2022-W08").unwrap(), [2022, 2, 21, 0, 0, 0, 0]);
        assert_eq!(iso_time_to_array("2022W13").unwrap(), [2022, 3, 28, 0, 0, 0, 0]);
    }

    #[test]
    fn test_iso_time_to_array_errors() {
        assert!(iso_time_to_array("20").is_err());
        assert!(iso_time_to_array("2020-1").is_err());
        assert!(iso_time_to_array("2020-xx-01").is_err());
        assert!(iso_time_to_array("2020-01-01T1x:00Z").is_err());
        assert!(iso_time_to_array("2020-01-01T+1:00Z").is_err());
        assert!(iso_time_to_array("lastweek").is_err());
        assert!(iso_time_to_array("nowP1D").is_err());
        assert!(iso_time_to_array("20200101").is_err());
        assert!(iso_time_to_array("20200101T00:00Z").is_err());
    }

    #[test]
    fn test_relative_times() {
        let now = [2022, 3, 12, 11, 17, 5, 250];
        assert_eq!(relative_time("now", now).unwrap(), now);
        assert_eq!(
            relative_time("now-P1D", now).unwrap(),
            [2022, 3, 11, 11, 17, 5, 250]
        );
        assert_eq!(relative_time("lastday", now).unwrap(), [2022, 3, 12, 0, 0, 0, 0]);
        assert_eq!(relative_time("lastmonth", now).unwrap(), [2022, 3, 1, 0, 0, 0, 0]);
        assert_eq!(relative_time("lastyear", now).unwrap(), [2022, 1, 1, 0, 0, 0, 0]);
        assert_eq!(
            relative_time("lastday+PT1H", now).unwrap(),
            [2022, 3, 12, 1, 0, 0, 0]
        );
        assert_eq!(
            relative_time("lastminute+PT1M", now).unwrap(),
            [2022, 3, 12, 11, 18, 0, 0]
        );
        assert_eq!(
            relative_time("lasthour-PT1H", now).unwrap(),
            [2022, 3, 12, 10, 0, 0, 0]
        );
        assert!(iso_time_to_array("now").is_ok());
    }

    #[test]
    fn test_iso_time_from_array() {
        assert_eq!(
            iso_time_from_array(&[1999, 12, 31, 23, 0, 0, 0]).unwrap(),
            "1999-12-31T23:00:00.000000000Z"
        );
        assert_eq!(
            iso_time_from_array(&[2000, 1, 45, 23, 0, 0, 0]).unwrap(),
            "2000-02-14T23:00:00.000000000Z"
        );
    }

    #[test]
    fn test_format_brief() {
        assert_eq!(
            format_iso8601_time_brief(&[2000, 1, 2, 3, 4, 0, 0]).unwrap(),
            "2000-01-02T03:04Z"
        );
        assert_eq!(
            format_iso8601_time_brief(&[2000, 1, 2, 3, 4, 5, 0]).unwrap(),
            "2000-01-02T03:04:05Z"
        );
        assert_eq!(
            format_iso8601_time_brief(&[2000, 1, 2, 3, 4, 5, 6_000_000]).unwrap(),
            "2000-01-02T03:04:05.006Z"
        );
        assert_eq!(
            format_iso8601_time_brief(&[2000, 1, 2, 3, 4, 5, 6000]).unwrap(),
            "2000-01-02T03:04:05.000006Z"
        );
        assert_eq!(
            format_iso8601_time_brief(&[2000, 1, 2, 3, 4, 5, 6]).unwrap(),
            "2000-01-02T03:04:05.000000006Z"
        );
    }

    #[test]
    fn test_normalize_time_string() {
        assert_eq!(
            normalize_time_string("2020-03-04T24:00:00Z").unwrap(),
            "2020-03-05T00:00:00.000000000Z"
        );
    }

    #[test]
    fn test_reformat_iso_time() {
        assert_eq!(
            reformat_iso_time("2020-01-01T00:00Z", "2020-112Z").unwrap(),
            "2020-04-21T00:00Z"
        );
        assert_eq!(reformat_iso_time("2020-001Z", "2020-04-21").unwrap(), "2020-112Z");
        assert_eq!(
            reformat_iso_time("2020-001T00:00Z", "2020-04-21T12:30").unwrap(),
            "2020-112T12:30Z"
        );
        assert_eq!(reformat_iso_time("2020-01-01Z", "2020-112").unwrap(), "2020-04-21Z");
        assert_eq!(reformat_iso_time("2020-01-01", "2020-112").unwrap(), "2020-04-21");
    }

    #[test]
    fn test_day_stepping() {
        assert_eq!(next_day("2019-12-31Z").unwrap(), "2020-01-01Z");
        assert_eq!(previous_day("2020-01-01").unwrap(), "2019-12-31Z");
        assert_eq!(ceil("2000-01-01T00:00").unwrap(), "2000-01-01T00:00:00.000000000Z");
        assert_eq!(ceil("2000-01-01T23:59").unwrap(), "2000-01-02T00:00:00.000000000Z");
        assert_eq!(floor("2000-01-01T00:00").unwrap(), "2000-01-01T00:00:00.000000000Z");
        assert_eq!(floor("2000-01-01T23:59").unwrap(), "2000-01-01T00:00:00.000000000Z");
    }

    #[test]
    fn test_count_off_days() {
        let expected = vec!["1999-12-31Z", "2000-01-01Z", "2000-01-02Z"];
        assert_eq!(count_off_days("1999-12-31Z", "2000-01-03Z").unwrap(), expected);
        assert_eq!(
            count_off_days("1999-12-31T12:00Z", "2000-01-03T12:00Z").unwrap(),
            expected
        );
        assert_eq!(count_off_days("1999-01-01Z", "2000-01-01Z").unwrap().len(), 365);
        assert!(count_off_days("1999-12-31Z", "2000").is_err());
    }

    #[test]
    fn test_milliseconds_since_1970() {
        let ms = to_milliseconds_since_1970("2000-01-02T00:00:00.0Z").unwrap();
        assert_eq!(ms / 86_400_000, 10958);
        assert_eq!(ms % 86_400_000, 0);
        assert_eq!(
            to_milliseconds_since_1970("2020-07-09T16:35:27Z").unwrap(),
            1_594_312_527_000
        );
        assert_eq!(
            from_milliseconds_since_1970(1_594_312_527_000).unwrap(),
            "2020-07-09T16:35:27Z"
        );
        assert_eq!(
            from_milliseconds_since_1970(1).unwrap(),
            "1970-01-01T00:00:00.001Z"
        );
    }
}
