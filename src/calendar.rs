// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Calendar kernel over decomposed times.
//!
//! A [`DecomposedTime`] is seven integers, most significant first:
//!
//! | Index | Constant | Component |
//! |-------|----------|-----------|
//! | 0 | [`YEAR`] | year (proleptic Gregorian) |
//! | 1 | [`MONTH`] | month, 1–12 |
//! | 2 | [`DAY`] | day of month, or day of year when month is 1 |
//! | 3 | [`HOUR`] | hour, 0–23 (24 is folded into the next day) |
//! | 4 | [`MINUTE`] | minute |
//! | 5 | [`SECOND`] | second |
//! | 6 | [`NANOSECOND`] | nanosecond |
//!
//! A [`Duration`] uses the same slots as a span ("5 months, 3 days") and is
//! only meaningful when combined with a base time via [`add`] or
//! [`subtract`].
//!
//! Nothing here validates on construction: [`normalize`] is the single place
//! where overflowing or underflowing components are carried into their
//! neighbours, including the day-of-year form `[Y, 1, doy, …]`.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use qtty::{Day, Days, Seconds};

use crate::error::CalendarError;

/// Number of components in a [`DecomposedTime`].
pub const TIME_DIGITS: usize = 7;

/// Number of date components (year, month, day).
pub const DATE_DIGITS: usize = 3;

/// Number of components in a flattened time range.
pub const TIME_RANGE_DIGITS: usize = 2 * TIME_DIGITS;

pub const YEAR: usize = 0;
pub const MONTH: usize = 1;
pub const DAY: usize = 2;
pub const HOUR: usize = 3;
pub const MINUTE: usize = 4;
pub const SECOND: usize = 5;
pub const NANOSECOND: usize = 6;

/// First year accepted by [`is_valid_time`].
pub const VALID_FIRST_YEAR: i32 = 1900;

/// Last year accepted by [`is_valid_time`].
pub const VALID_LAST_YEAR: i32 = 2100;

/// Earliest year representable by the template engine.
pub const MIN_VALID_YEAR: i32 = 1582;

/// Latest year representable by the template engine.
pub const MAX_VALID_YEAR: i32 = 9000;

pub(crate) const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// `[year, month, day, hour, minute, second, nanosecond]`.
pub type DecomposedTime = [i32; TIME_DIGITS];

/// Calendar span with the same slot layout as [`DecomposedTime`].
pub type Duration = [i32; TIME_DIGITS];

const DAYS_IN_MONTH: [[i32; 14]; 2] = [
    [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31, 0],
    [0, 31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31, 0],
];

const DAY_OFFSET: [[i32; 14]; 2] = [
    [0, 0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334, 365],
    [0, 0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335, 366],
];

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const MONTH_NAMES_FULL: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// ═══════════════════════════════════════════════════════════════════════════
// Calendar tables
// ═══════════════════════════════════════════════════════════════════════════

/// Gregorian leap-year rule.
#[inline]
pub const fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 400 == 0 || year % 100 != 0)
}

#[inline]
const fn leap_index(year: i32) -> usize {
    if is_leap_year(year) {
        1
    } else {
        0
    }
}

#[inline]
fn check_month(month: i32) -> Result<usize, CalendarError> {
    if (1..=12).contains(&month) {
        Ok(month as usize)
    } else {
        Err(CalendarError::OutOfRange {
            field: "month",
            value: month,
        })
    }
}

/// Number of days in `month` of `year`.
pub fn days_in_month(year: i32, month: i32) -> Result<i32, CalendarError> {
    Ok(DAYS_IN_MONTH[leap_index(year)][check_month(month)?])
}

/// Day of year for a calendar date. Month 1 passes `day` through, so a
/// day-of-year value is returned unchanged.
///
/// ```
/// assert_eq!(timetemplates::calendar::day_of_year(2000, 3, 1).unwrap(), 61);
/// ```
pub fn day_of_year(year: i32, month: i32, day: i32) -> Result<i32, CalendarError> {
    if month == 1 {
        return Ok(day);
    }
    let month = check_month(month)?;
    if day > 366 {
        return Err(CalendarError::OutOfRange {
            field: "day",
            value: day,
        });
    }
    Ok(DAY_OFFSET[leap_index(year)][month] + day)
}

/// The month (1–12) containing day-of-year `doy`.
pub fn month_for_day_of_year(year: i32, doy: i32) -> Result<i32, CalendarError> {
    let offsets = &DAY_OFFSET[leap_index(year)];
    if doy < 1 || doy > offsets[13] {
        return Err(CalendarError::OutOfRange {
            field: "day of year",
            value: doy,
        });
    }
    Ok((2..=12).rev().find(|&m| offsets[m] < doy).unwrap_or(1) as i32)
}

/// Three-letter English month name, `"Jan"` for 1.
pub fn month_name_abbrev(month: i32) -> Result<&'static str, CalendarError> {
    Ok(MONTH_NAMES[check_month(month)? - 1])
}

/// Full English month name, `"January"` for 1.
pub fn month_name_full(month: i32) -> Result<&'static str, CalendarError> {
    Ok(MONTH_NAMES_FULL[check_month(month)? - 1])
}

/// Month number for an English month name. Only the first three letters
/// are significant and case is ignored, so `"DECEMBER"` and `"dec"` are 12.
pub fn month_number(name: &str) -> Result<i32, CalendarError> {
    let prefix = name
        .get(..3)
        .ok_or_else(|| CalendarError::MonthName(name.to_string()))?;
    MONTH_NAMES
        .iter()
        .position(|m| m.eq_ignore_ascii_case(prefix))
        .map(|i| i as i32 + 1)
        .ok_or_else(|| CalendarError::MonthName(name.to_string()))
}

// ═══════════════════════════════════════════════════════════════════════════
// Julian day
// ═══════════════════════════════════════════════════════════════════════════

/// Integer Julian day number of a Gregorian date.
///
/// Month 1 with a day beyond 31 is read as a day of year.
///
/// ```
/// use timetemplates::calendar::julian_day;
/// assert_eq!(julian_day(2020, 7, 9).unwrap(), 2_459_040);
/// ```
pub fn julian_day(year: i32, month: i32, day: i32) -> Result<i32, CalendarError> {
    if year <= MIN_VALID_YEAR {
        return Err(CalendarError::YearTooEarly(year));
    }
    Ok(367 * year - 7 * (year + (month + 9) / 12) / 4 - 3 * ((year + (month - 9) / 7) / 100 + 1) / 4
        + 275 * month / 9
        + day
        + 1_721_029)
}

/// Inverse of [`julian_day`]; the time-of-day slots are zero.
pub fn from_julian_day(julian: i32) -> DecomposedTime {
    let j = julian + 32044;
    let g = j / 146_097;
    let dg = j % 146_097;
    let c = (dg / 36524 + 1) * 3 / 4;
    let dc = dg - c * 36524;
    let b = dc / 1461;
    let db = dc % 1461;
    let a = (db / 365 + 1) * 3 / 4;
    let da = db - a * 365;
    let y = g * 400 + c * 100 + b * 4 + a;
    let m = (da * 5 + 308) / 153 - 2;
    let d = da - (m + 4) * 153 / 5 + 122;
    [y - 4800 + (m + 2) / 12, (m + 2) % 12 + 1, d + 1, 0, 0, 0, 0]
}

/// Fractional Julian date of an instant, counted from noon.
pub fn julian_date(time: &DecomposedTime) -> Result<Days, CalendarError> {
    let t = normalized(time)?;
    let jd = julian_day(t[YEAR], t[MONTH], t[DAY])?;
    let seconds = f64::from(t[HOUR] * 3600 + t[MINUTE] * 60 + t[SECOND])
        + f64::from(t[NANOSECOND]) / 1e9;
    Ok(Days::new(f64::from(jd) - 0.5) + Seconds::new(seconds).to::<Day>())
}

/// Day of week, 0 for Monday through 6 for Sunday.
pub fn day_of_week(year: i32, month: i32, day: i32) -> Result<i32, CalendarError> {
    let since_2022 = julian_day(year, month, day)? - julian_day(2022, 1, 1)?;
    Ok((since_2022 - 2).rem_euclid(7))
}

/// Monday starting ISO week `week` of `year`.
///
/// Week 0 is tolerated and means the last week of the previous year.
pub fn from_week_of_year(year: i32, week: i32) -> Result<DecomposedTime, CalendarError> {
    let mut time = [year, 1, 0, 0, 0, 0, 0];
    let first = day_of_week(year, 1, 1)?;
    let doy = if first < 4 {
        let doy = week * 7 - 7 - first + 1;
        if doy < 1 {
            time[YEAR] -= 1;
            doy + if is_leap_year(time[YEAR]) { 366 } else { 365 }
        } else {
            doy
        }
    } else {
        week * 7 - first + 1
    };
    time[DAY] = doy;
    normalize(&mut time)?;
    Ok(time)
}

// ═══════════════════════════════════════════════════════════════════════════
// Normalization and arithmetic
// ═══════════════════════════════════════════════════════════════════════════

#[inline]
fn carry(time: &mut DecomposedTime, lower: usize, upper: usize, base: i32) {
    let c = time[lower].div_euclid(base);
    time[upper] += c;
    time[lower] -= c * base;
}

#[inline]
fn carry_months(time: &mut DecomposedTime) {
    let m0 = time[MONTH] - 1;
    time[YEAR] += m0.div_euclid(12);
    time[MONTH] = m0.rem_euclid(12) + 1;
}

/// Carry overflowing and underflowing components into their neighbours.
///
/// Hour 24 moves into the next day, day 0 becomes the last day of the
/// previous month, and a day beyond the end of its month (including the
/// day-of-year form) walks forward through months and years. Seconds 60
/// and 61 are ordinary overflow here and fold into the next minute.
///
/// ```
/// use timetemplates::calendar::normalize;
/// let mut t = [1979, 12, 37, 0, 0, 0, 0];
/// normalize(&mut t).unwrap();
/// assert_eq!(t, [1980, 1, 6, 0, 0, 0, 0]);
/// ```
pub fn normalize(time: &mut DecomposedTime) -> Result<(), CalendarError> {
    carry(time, NANOSECOND, SECOND, NANOS_PER_SECOND);
    carry(time, SECOND, MINUTE, 60);
    carry(time, MINUTE, HOUR, 60);
    carry(time, HOUR, DAY, 24);
    carry_months(time);

    while time[DAY] < 1 {
        time[MONTH] -= 1;
        carry_months(time);
        time[DAY] += days_in_month(time[YEAR], time[MONTH])?;
    }

    loop {
        let d = days_in_month(time[YEAR], time[MONTH])?;
        if time[DAY] <= d {
            break;
        }
        time[DAY] -= d;
        time[MONTH] += 1;
        carry_months(time);
    }
    Ok(())
}

/// Normalized copy of `time`.
pub fn normalized(time: &DecomposedTime) -> Result<DecomposedTime, CalendarError> {
    let mut t = *time;
    normalize(&mut t)?;
    Ok(t)
}

/// `base + offset`, always normalized.
pub fn add(base: &DecomposedTime, offset: &Duration) -> Result<DecomposedTime, CalendarError> {
    let mut result = [0; TIME_DIGITS];
    for (i, r) in result.iter_mut().enumerate() {
        *r = base[i] + offset[i];
    }
    normalize(&mut result)?;
    Ok(result)
}

/// `base - offset`.
///
/// The result is normalized only when it still looks like a calendar time
/// (year above 400), so subtracting two times yields a raw [`Duration`].
pub fn subtract(base: &DecomposedTime, offset: &Duration) -> Result<DecomposedTime, CalendarError> {
    let mut result = [0; TIME_DIGITS];
    for (i, r) in result.iter_mut().enumerate() {
        *r = base[i] - offset[i];
    }
    if result[YEAR] > 400 {
        normalize(&mut result)?;
    }
    Ok(result)
}

/// `t1 > t2` after normalizing both.
pub fn gt(t1: &DecomposedTime, t2: &DecomposedTime) -> Result<bool, CalendarError> {
    Ok(normalized(t1)? > normalized(t2)?)
}

/// `t1 == t2` after normalizing both.
pub fn eq(t1: &DecomposedTime, t2: &DecomposedTime) -> Result<bool, CalendarError> {
    Ok(normalized(t1)? == normalized(t2)?)
}

/// Check that `time` is a plausible instant: year 1900–2100, month 1–12,
/// and a day within its month (or within the year for the day-of-year form).
pub fn is_valid_time(time: &DecomposedTime) -> Result<(), CalendarError> {
    let year = time[YEAR];
    if !(VALID_FIRST_YEAR..=VALID_LAST_YEAR).contains(&year) {
        return Err(CalendarError::OutOfRange {
            field: "year",
            value: year,
        });
    }
    let month = check_month(time[MONTH])?;
    let leap = leap_index(year);
    let day = time[DAY];
    let last = if month > 1 {
        DAYS_IN_MONTH[leap][month]
    } else {
        DAY_OFFSET[leap][13]
    };
    if day < 1 || day > last {
        return Err(CalendarError::OutOfRange {
            field: "day",
            value: day,
        });
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// chrono bridges
// ═══════════════════════════════════════════════════════════════════════════

/// Decompose a UTC timestamp.
pub fn from_datetime(datetime: &DateTime<Utc>) -> DecomposedTime {
    [
        datetime.year(),
        datetime.month() as i32,
        datetime.day() as i32,
        datetime.hour() as i32,
        datetime.minute() as i32,
        datetime.second() as i32,
        datetime.nanosecond() as i32,
    ]
}

/// Recompose a UTC timestamp.
pub fn to_datetime(time: &DecomposedTime) -> Result<DateTime<Utc>, CalendarError> {
    let t = normalized(time)?;
    NaiveDate::from_ymd_opt(t[YEAR], t[MONTH] as u32, t[DAY] as u32)
        .and_then(|d| {
            d.and_hms_nano_opt(
                t[HOUR] as u32,
                t[MINUTE] as u32,
                t[SECOND] as u32,
                t[NANOSECOND] as u32,
            )
        })
        .map(|naive| naive.and_utc())
        .ok_or(CalendarError::OutOfRange {
            field: "year",
            value: t[YEAR],
        })
}

/// The current UTC time.
pub fn now() -> DecomposedTime {
    from_datetime(&Utc::now())
}
