// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Parse engine: a name in, a [`TimeRange`] out.

use super::compile::{Field, FieldCode};
use super::Template;
use crate::calendar::{
    self, from_julian_day, julian_day, month_number, DecomposedTime, DAY, HOUR, MINUTE, MONTH,
    NANOSECOND, SECOND, YEAR,
};
use crate::error::ParseError;
use crate::handlers::Extras;
use crate::range::TimeRange;

const NANOS_PER_MILLI: i32 = 1_000_000;
const NANOS_PER_MICRO: i32 = 1_000;

impl Template {
    /// Parse `text` into the time range it denotes.
    ///
    /// Handler fields may record values in `extras`, for example the text
    /// of a named `$(x;name=sc)` field or the accumulated version of `$v`.
    ///
    /// ```
    /// use timetemplates::{Extras, Template};
    ///
    /// let t = Template::compile("data_$Y_$j.dat").unwrap();
    /// let range = t.parse("data_2009_032.dat", &mut Extras::new()).unwrap();
    /// assert_eq!(range.to_string(), "2009-02-01/2009-02-02");
    /// ```
    pub fn parse(&self, text: &str, extras: &mut Extras) -> Result<TimeRange, ParseError> {
        self.parse_from(text, &self.context, extras)
    }

    /// Parse `text`, taking the leading [`external_context`] components from
    /// `context` rather than from the template.
    ///
    /// [`external_context`]: Template::external_context
    pub fn parse_with_context(
        &self,
        text: &str,
        context: &DecomposedTime,
        extras: &mut Extras,
    ) -> Result<TimeRange, ParseError> {
        let mut merged = self.context;
        let n = self.external_context;
        merged[..n].copy_from_slice(&context[..n]);
        self.parse_from(text, &merged, extras)
    }

    fn parse_from(
        &self,
        text: &str,
        context: &DecomposedTime,
        extras: &mut Extras,
    ) -> Result<TimeRange, ParseError> {
        tracing::trace!(text, template = %self.spec, "parse");

        let too_short = || ParseError::TooShort(text.to_string());
        let missing = |delimiter: &str| ParseError::MissingDelimiter {
            delimiter: delimiter.to_string(),
            text: text.to_string(),
        };

        let mut start = *context;
        let mut stop = *context;
        let mut in_stop = false;
        let mut width = self.time_width;

        let mut offs = 0;
        let mut len = 0;
        let mut prev_end = 0;
        let last = self.fields.len().saturating_sub(1);

        for (index, field) in self.fields.iter().enumerate() {
            if Some(index) == self.stop_time_field {
                stop = start;
                in_stop = true;
            }

            offs = field.offset.unwrap_or(offs + len + self.delims[index].len());
            if text.get(prev_end..offs) != Some(self.delims[index].as_str()) {
                return Err(missing(self.delims[index].as_str()));
            }

            let next_delim = self.delims[index + 1].as_str();
            len = match field.length {
                Some(len) => len,
                None if next_delim.is_empty() => {
                    if index != last {
                        return Err(ParseError::NoDelimiter {
                            code: field.code.to_string(),
                            index: index + 1,
                        });
                    }
                    text.len().checked_sub(offs).ok_or_else(too_short)?
                }
                None => {
                    let rest = text.get(offs..).ok_or_else(too_short)?;
                    offs += rest.len() - rest.trim_start().len();
                    let rest = text.get(offs..).filter(|r| !r.is_empty());
                    rest.and_then(|r| r.find(next_delim))
                        .ok_or_else(|| missing(next_delim))?
                }
            };

            let raw = text.get(offs..offs + len).ok_or_else(too_short)?;
            prev_end = offs + len;
            tracing::trace!(code = %field.code, field = raw, "parse field");

            let time = if in_stop { &mut stop } else { &mut start };
            self.parse_field(index, field, raw, time, &mut width, extras)?;
        }

        let tail = text.get(prev_end..).ok_or_else(too_short)?;
        if let Some(delim) = self.delims.last() {
            if tail != delim.as_str() {
                return Err(missing(delim.as_str()));
            }
        }

        if let Some(phasestart) = &self.phasestart {
            // floor division keeps names before the anchor in their own bucket
            if width[MONTH] > 0 {
                start[MONTH] = (start[MONTH] - phasestart[MONTH]).div_euclid(width[MONTH])
                    * width[MONTH]
                    + phasestart[MONTH];
            } else if width[YEAR] > 0 {
                start[YEAR] = (start[YEAR] - phasestart[YEAR]).div_euclid(width[YEAR])
                    * width[YEAR]
                    + phasestart[YEAR];
            } else if width[DAY] > 1 {
                let anchor = julian_day(phasestart[YEAR], phasestart[MONTH], phasestart[DAY])?;
                let days = julian_day(start[YEAR], start[MONTH], start[DAY])? - anchor;
                let cycles = days.div_euclid(width[DAY]);
                start = from_julian_day(anchor + cycles * width[DAY]);
            } else {
                tracing::warn!(
                    template = %self.spec,
                    "phasestart can only be used when the step is a whole number of days"
                );
            }
            stop = calendar::add(&start, &width)?;
        } else if self.stop_time_field.is_none() {
            stop = calendar::add(&start, &width)?;
            // a divided day of year ends with its year: $Y$(j;div=100)
            if self.no_stop_carry
                && width[YEAR] == 0
                && width[MONTH] == 0
                && width[DAY] > 1
                && stop[YEAR] > start[YEAR]
            {
                stop[MONTH] = 1;
                stop[DAY] = 1;
            }
        }

        if let Some(shift) = &self.start_shift {
            start = calendar::add(&start, shift)?;
        }
        calendar::normalize(&mut start)?;
        if let Some(shift) = &self.stop_shift {
            stop = calendar::add(&stop, shift)?;
        }
        calendar::normalize(&mut stop)?;

        Ok(TimeRange::from_parts(start, stop))
    }

    fn parse_field(
        &self,
        index: usize,
        field: &Field,
        raw: &str,
        time: &mut DecomposedTime,
        width: &mut calendar::Duration,
        extras: &mut Extras,
    ) -> Result<(), ParseError> {
        let bad_field = || ParseError::BadField {
            index: index + 1,
            field: raw.to_string(),
        };
        let digits = || {
            raw.trim_matches(|c: char| c.is_whitespace() || c == '_')
                .parse::<i32>()
                .ok()
                .and_then(|value| value.checked_mul(field.div))
                .ok_or_else(bad_field)
        };

        match &field.code {
            FieldCode::Year => time[YEAR] = digits()?,
            FieldCode::TwoDigitYear => time[YEAR] = self.expand_two_digit_year(digits()?),
            FieldCode::DayOfYear => {
                time[MONTH] = 1;
                time[DAY] = digits()?;
            }
            FieldCode::Month => time[MONTH] = digits()?,
            FieldCode::Day => time[DAY] = digits()?,
            FieldCode::Hour => time[HOUR] = digits()?,
            FieldCode::Minute => time[MINUTE] = digits()?,
            FieldCode::Second => time[SECOND] = digits()?,
            FieldCode::Milli => {
                let millis = digits()?.checked_mul(NANOS_PER_MILLI).ok_or_else(bad_field)?;
                time[NANOSECOND] = millis
                    .checked_add(time[NANOSECOND] % NANOS_PER_MILLI)
                    .ok_or_else(bad_field)?;
            }
            FieldCode::Micro => {
                let ns = time[NANOSECOND];
                let micros = digits()?.checked_mul(NANOS_PER_MICRO).ok_or_else(bad_field)?;
                time[NANOSECOND] = (ns / NANOS_PER_MILLI * NANOS_PER_MILLI)
                    .checked_add(micros)
                    .and_then(|n| n.checked_add(ns % NANOS_PER_MICRO))
                    .ok_or_else(bad_field)?;
            }
            FieldCode::AmPm => match raw.chars().next() {
                Some('P' | 'p') if time[HOUR] != 12 => time[HOUR] += 12,
                Some('A' | 'a') if time[HOUR] == 12 => time[HOUR] = 0,
                Some('A' | 'a' | 'P' | 'p') => {}
                _ => return Err(bad_field()),
            },
            FieldCode::Zone => {
                let offset = digits()?;
                time[HOUR] -= offset / 100;
                time[MINUTE] -= offset % 100;
            }
            FieldCode::Ignore => {
                extras.insert("ignore".to_string(), raw.to_string());
            }
            FieldCode::MonthName => time[MONTH] = month_number(raw.trim())?,
            FieldCode::Handler(code) => {
                let Some(handler) = &field.handler else {
                    return Err(bad_field());
                };
                handler
                    .parse(raw, time, width, extras)
                    .map_err(|source| ParseError::Handler {
                        code: code.clone(),
                        field: raw.to_string(),
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// Two-digit years at or after the window start belong to its century.
    fn expand_two_digit_year(&self, yy: i32) -> i32 {
        let century = self.two_digit_year_start - self.two_digit_year_start.rem_euclid(100);
        if yy >= self.two_digit_year_start.rem_euclid(100) {
            century + yy
        } else {
            century + 100 + yy
        }
    }
}
