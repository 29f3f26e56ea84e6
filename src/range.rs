// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Time ranges: a start and a stop [`DecomposedTime`].
//!
//! The flat 14-integer form `[Y m d H M S ns Y m d H M S ns]` is available
//! through [`TimeRange::to_array`] and [`TimeRange::from_array`].

use std::fmt;
use std::str::FromStr;

use qtty::Days;

use crate::calendar::{
    self, DecomposedTime, Duration, DAY, HOUR, MINUTE, MONTH, SECOND, TIME_DIGITS,
    TIME_RANGE_DIGITS, YEAR,
};
use crate::duration::parse_duration;
use crate::error::CalendarError;
use crate::iso::{iso_time_from_array, iso_time_to_array};

#[cfg(feature = "serde")]
use serde::{ser::SerializeStruct, Deserialize, Deserializer, Serialize, Serializer};

/// Interval between two decomposed times.
///
/// A range is *valid* when `stop` is strictly after `start`; see
/// [`TimeRange::new`] and [`TimeRange::is_valid`].
///
/// # Examples
///
/// ```
/// use timetemplates::TimeRange;
///
/// let range: TimeRange = "1998-01-02/1998-01-17".parse().unwrap();
/// assert_eq!(range.start, [1998, 1, 2, 0, 0, 0, 0]);
/// assert_eq!(range.stop, [1998, 1, 17, 0, 0, 0, 0]);
/// assert_eq!(range.to_string(), "1998-01-02/1998-01-17");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    pub start: DecomposedTime,
    pub stop: DecomposedTime,
}

impl TimeRange {
    /// Creates a range, checking that `stop` is after `start`.
    pub fn new(start: DecomposedTime, stop: DecomposedTime) -> Result<Self, CalendarError> {
        if !calendar::gt(&stop, &start)? {
            return Err(CalendarError::EmptyRange);
        }
        Ok(Self { start, stop })
    }

    /// Creates a range without checking its ordering.
    #[inline]
    pub const fn from_parts(start: DecomposedTime, stop: DecomposedTime) -> Self {
        Self { start, stop }
    }

    /// Splits a 14-element array into start and stop.
    pub fn from_array(nn: &[i32; TIME_RANGE_DIGITS]) -> Self {
        let mut start = [0; TIME_DIGITS];
        let mut stop = [0; TIME_DIGITS];
        start.copy_from_slice(&nn[..TIME_DIGITS]);
        stop.copy_from_slice(&nn[TIME_DIGITS..]);
        Self { start, stop }
    }

    /// Concatenates start and stop into a 14-element array.
    pub fn to_array(&self) -> [i32; TIME_RANGE_DIGITS] {
        let mut nn = [0; TIME_RANGE_DIGITS];
        nn[..TIME_DIGITS].copy_from_slice(&self.start);
        nn[TIME_DIGITS..].copy_from_slice(&self.stop);
        nn
    }

    /// Both ends are plausible times (see [`calendar::is_valid_time`]) and
    /// `stop` is after `start`.
    pub fn is_valid(&self) -> bool {
        calendar::is_valid_time(&self.start).is_ok()
            && calendar::is_valid_time(&self.stop).is_ok()
            && calendar::gt(&self.stop, &self.start).unwrap_or(false)
    }

    /// Calendar width of the range, borrowing across one boundary per
    /// component. Day borrows use the length of the start month.
    fn width(&self) -> Result<Duration, CalendarError> {
        let mut width = [0; TIME_DIGITS];
        for (i, w) in width.iter_mut().enumerate() {
            *w = self.stop[i] - self.start[i];
        }
        if width[SECOND] < 0 {
            width[SECOND] += 60;
            width[MINUTE] -= 1;
        }
        if width[MINUTE] < 0 {
            width[MINUTE] += 60;
            width[HOUR] -= 1;
        }
        if width[HOUR] < 0 {
            width[HOUR] += 24;
            width[DAY] -= 1;
        }
        if width[DAY] < 0 {
            width[DAY] += calendar::days_in_month(self.start[YEAR], self.start[MONTH])?;
            width[MONTH] -= 1;
        }
        if width[MONTH] < 0 {
            width[MONTH] += 12;
            width[YEAR] -= 1;
        }
        Ok(width)
    }

    /// The adjacent range of the same calendar width that starts at `stop`.
    ///
    /// Widths should be a single component that divides its parent unit
    /// (1, 2, 3, 4 or 6 months, for example) and at least one second.
    ///
    /// ```
    /// use timetemplates::TimeRange;
    ///
    /// let r: TimeRange = "2022-12-05/2022-12-15".parse().unwrap();
    /// assert_eq!(r.next().unwrap().to_string(), "2022-12-15/2022-12-25");
    /// ```
    pub fn next(&self) -> Result<Self, CalendarError> {
        let width = self.width()?;
        Ok(Self {
            start: self.stop,
            stop: calendar::add(&self.stop, &width)?,
        })
    }

    /// The adjacent range of the same calendar width that ends at `start`.
    pub fn previous(&self) -> Result<Self, CalendarError> {
        let width = self.width()?;
        Ok(Self {
            start: calendar::subtract(&self.start, &width)?,
            stop: self.start,
        })
    }

    /// Length of the range in days, including fractions of a day.
    pub fn span_days(&self) -> Result<Days, CalendarError> {
        Ok(calendar::julian_date(&self.stop)? - calendar::julian_date(&self.start)?)
    }
}

impl From<[i32; TIME_RANGE_DIGITS]> for TimeRange {
    fn from(nn: [i32; TIME_RANGE_DIGITS]) -> Self {
        Self::from_array(&nn)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ISO-8601 ranges
// ═══════════════════════════════════════════════════════════════════════════

/// Format a range compactly: both ends are cut to the finest component that
/// is non-zero in either of them, down to whole days.
///
/// ```
/// use timetemplates::{range::format_iso8601_time_range, TimeRange};
///
/// let r = TimeRange::from_parts([1998, 1, 2, 0, 3, 0, 0], [1998, 1, 17, 0, 3, 0, 0]);
/// assert_eq!(
///     format_iso8601_time_range(&r).unwrap(),
///     "1998-01-02T00:03Z/1998-01-17T00:03Z"
/// );
/// ```
pub fn format_iso8601_time_range(range: &TimeRange) -> Result<String, CalendarError> {
    let ss1 = iso_time_from_array(&range.start)?;
    let ss2 = iso_time_from_array(&range.stop)?;
    let mut first_non_zero = TIME_DIGITS;
    while first_non_zero > 3
        && range.start[first_non_zero - 1] == 0
        && range.stop[first_non_zero - 1] == 0
    {
        first_non_zero -= 1;
    }
    let cut = |s: &str, n: usize, z: &str| format!("{}{z}", &s[..n]);
    Ok(match first_non_zero {
        3 => format!("{}/{}", cut(&ss1, 10, ""), cut(&ss2, 10, "")),
        4 | 5 => format!("{}/{}", cut(&ss1, 16, "Z"), cut(&ss2, 16, "Z")),
        6 => format!("{}/{}", cut(&ss1, 19, "Z"), cut(&ss2, 19, "Z")),
        _ => format!("{ss1}/{ss2}"),
    })
}

fn is_range_part(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_digit() || c == 'P') || s.starts_with("now")
}

/// A stop time written without its leading fields inherits them from the
/// start, so `2023-01-18T17:00/18:00` ends at `2023-01-18T18:00`.
fn complete_stop(start: &str, stop: &str) -> String {
    let full_year = stop.len() >= 4 && stop.as_bytes()[..4].iter().all(u8::is_ascii_digit);
    if full_year || start.starts_with("now") || start.starts_with("last") {
        return stop.to_string();
    }
    let start_bare = start.strip_suffix('Z').unwrap_or(start);
    let stop_bare = stop.strip_suffix('Z').unwrap_or(stop);
    match start_bare
        .len()
        .checked_sub(stop_bare.len())
        .and_then(|n| start_bare.get(..n))
    {
        Some(prefix) => format!("{prefix}{stop}"),
        None => stop.to_string(),
    }
}

/// Parse an ISO-8601 range: `start/stop`, `start/duration` or
/// `duration/stop`.
///
/// ```
/// use timetemplates::range::parse_iso8601_time_range;
///
/// let r = parse_iso8601_time_range("2022-W13/P7D").unwrap();
/// assert_eq!(r.start, [2022, 3, 28, 0, 0, 0, 0]);
/// assert_eq!(r.stop, [2022, 4, 4, 0, 0, 0, 0]);
/// ```
pub fn parse_iso8601_time_range(input: &str) -> Result<TimeRange, CalendarError> {
    let malformed = |reason: &str| CalendarError::MalformedRange {
        input: input.to_string(),
        reason: reason.to_string(),
    };
    let mut parts = input.split('/');
    let (Some(first), Some(second), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed(
            "expected one slash (/) splitting start and stop times",
        ));
    };
    if !is_range_part(first) {
        return Err(malformed(
            "first time/duration is misformatted. Should be ISO8601 time or duration like P1D",
        ));
    }
    if !is_range_part(second) {
        return Err(malformed(
            "second time/duration is misformatted. Should be ISO8601 time or duration like P1D",
        ));
    }

    if first.starts_with('P') {
        let duration = parse_duration(first)?;
        let stop = iso_time_to_array(second)?;
        let mut start = [0; TIME_DIGITS];
        for (i, s) in start.iter_mut().enumerate() {
            *s = stop[i] - duration[i];
        }
        calendar::normalize(&mut start)?;
        Ok(TimeRange { start, stop })
    } else if second.starts_with('P') {
        let start = iso_time_to_array(first)?;
        let stop = calendar::add(&start, &parse_duration(second)?)?;
        Ok(TimeRange { start, stop })
    } else {
        let start = iso_time_to_array(first)?;
        let stop = iso_time_to_array(&complete_stop(first, second))?;
        Ok(TimeRange { start, stop })
    }
}

impl FromStr for TimeRange {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_iso8601_time_range(s)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = format_iso8601_time_range(self).map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}

// Serde support: both ends as full ISO-8601 strings.
#[cfg(feature = "serde")]
impl Serialize for TimeRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::Error;

        let start = iso_time_from_array(&self.start).map_err(S::Error::custom)?;
        let stop = iso_time_from_array(&self.stop).map_err(S::Error::custom)?;
        let mut s = serializer.serialize_struct("TimeRange", 2)?;
        s.serialize_field("start", &start)?;
        s.serialize_field("stop", &stop)?;
        s.end()
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for TimeRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        struct Raw {
            start: String,
            stop: String,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(TimeRange::from_parts(
            iso_time_to_array(&raw.start).map_err(D::Error::custom)?,
            iso_time_to_array(&raw.stop).map_err(D::Error::custom)?,
        ))
    }
}
