// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! `$(periodic;offset=0;start=2000-001;period=P1D)`: numbered intervals.
//!
//! Index `offset` is the interval beginning at `start`; index `offset + n`
//! begins `n` periods later. Day counting goes through Julian day numbers so
//! month lengths never matter.

use super::{invalid, required, warn_unknown, Extras, FieldHandler, HandlerArgs};
use crate::calendar::{
    from_julian_day, julian_day, DecomposedTime, Duration, DAY, HOUR, MONTH, NANOSECOND,
    NANOS_PER_SECOND, TIME_DIGITS, YEAR,
};
use crate::duration::parse_duration;
use crate::error::HandlerError;
use crate::iso::iso_time_to_array;

/// Carry limits for the time-of-day slots.
const LIMITS: [i64; TIME_DIGITS] = [0, 0, 0, 24, 60, 60, NANOS_PER_SECOND as i64];

const MAX_LENGTH: usize = 16;

#[derive(Debug, Default, Clone)]
pub struct PeriodicFieldHandler {
    offset: i32,
    /// Julian day of the anchor date.
    julday: i32,
    /// Time of day of the anchor; the date slots are zero.
    start: DecomposedTime,
    period: Duration,
}

impl PeriodicFieldHandler {
    fn index(&self, field: &str) -> Result<i32, HandlerError> {
        field.trim().trim_start_matches('_').parse().map_err(|_| HandlerError::Rejected {
            value: field.to_string(),
            reason: "expected an integer index".into(),
        })
    }
}

impl FieldHandler for PeriodicFieldHandler {
    fn configure(&mut self, args: &HandlerArgs) -> Result<(), HandlerError> {
        warn_unknown("periodic", args, &["start", "offset", "period"]);

        let mut start = iso_time_to_array(required(args, "start")?)?;
        self.julday = julian_day(start[YEAR], start[MONTH], start[DAY])?;
        start[YEAR] = 0;
        start[MONTH] = 0;
        start[DAY] = 0;
        self.start = start;

        let offset = required(args, "offset")?;
        self.offset = offset
            .parse()
            .map_err(|_| invalid("offset", offset, "expected an integer"))?;

        let period = required(args, "period")?;
        let iso = if period.starts_with('P') {
            period.to_string()
        } else if period.ends_with('D') {
            return Err(invalid("period", period, "periodic unit for day is d, not D"));
        } else if period.ends_with('d') {
            format!("P{}", period.to_uppercase())
        } else {
            format!("PT{}", period.to_uppercase())
        };
        self.period = parse_duration(&iso)?;
        if self.period[YEAR] != 0 || self.period[MONTH] != 0 {
            return Err(invalid("period", period, "period must not contain years or months"));
        }
        Ok(())
    }

    fn regex(&self) -> Option<String> {
        Some("[0-9]+".into())
    }

    fn parse(
        &self,
        field: &str,
        start: &mut DecomposedTime,
        width: &mut Duration,
        _extras: &mut Extras,
    ) -> Result<(), HandlerError> {
        let add_offset = i64::from(self.index(field)? - self.offset);

        let mut t = [0_i64; TIME_DIGITS];
        for i in (HOUR..=NANOSECOND).rev() {
            t[i] += i64::from(self.start[i]) + add_offset * i64::from(self.period[i]);
            t[i - 1] += t[i].div_euclid(LIMITS[i]);
            t[i] = t[i].rem_euclid(LIMITS[i]);
        }

        let jd = i64::from(self.julday) + i64::from(self.period[DAY]) * add_offset + t[DAY];
        let jd = i32::try_from(jd).map_err(|_| HandlerError::Rejected {
            value: field.to_string(),
            reason: "index is too far from the anchor".into(),
        })?;
        let date = from_julian_day(jd);

        start[YEAR] = date[YEAR];
        start[MONTH] = date[MONTH];
        start[DAY] = date[DAY];
        for i in HOUR..=NANOSECOND {
            // each slot is below its carry limit here
            start[i] = t[i] as i32;
        }

        width[YEAR] = 0;
        width[MONTH] = 0;
        width[DAY..].copy_from_slice(&self.period[DAY..]);
        Ok(())
    }

    fn format(
        &self,
        start: &DecomposedTime,
        _width: &Duration,
        length: Option<usize>,
        _extras: &Extras,
    ) -> Result<String, HandlerError> {
        if self.period[HOUR..].iter().any(|&p| p != 0) || self.period[DAY] == 0 {
            return Err(HandlerError::Unformattable(
                "only an integer number of days is supported for formatting".into(),
            ));
        }
        let jd = julian_day(start[YEAR], start[MONTH], start[DAY])?;
        let index = (jd - self.julday).div_euclid(self.period[DAY]) + self.offset;
        let result = index.to_string();
        match length {
            Some(n) if n > MAX_LENGTH => Err(HandlerError::Unformattable(format!(
                "length {n} is more than {MAX_LENGTH}"
            ))),
            Some(n) if n > result.len() => Ok(format!("{}{result}", "_".repeat(n - result.len()))),
            _ => Ok(result),
        }
    }
}
