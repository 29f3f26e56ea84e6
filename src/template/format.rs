// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Format engine: a time range in, a name out.

use super::compile::{Field, FieldCode, MonthCase, Pad};
use super::Template;
use crate::calendar::{
    self, day_of_year, from_julian_day, julian_day, month_name_abbrev, month_name_full,
    DecomposedTime, Duration, DAY, HOUR, MINUTE, MONTH, NANOSECOND, SECOND, YEAR,
};
use crate::error::FormatError;
use crate::handlers::Extras;
use crate::iso::iso_time_to_array;
use crate::range::TimeRange;

const NANOS_PER_MILLI: i32 = 1_000_000;
const NANOS_PER_MICRO: i32 = 1_000;

impl Template {
    /// Format the range `start`/`stop`, given as ISO-8601 times.
    ///
    /// When the template carries an explicit `span`, `stop` is ignored and
    /// the range is `start` plus that span.
    ///
    /// ```
    /// use timetemplates::{Extras, Template};
    ///
    /// let t = Template::compile("data_$Y_$j.dat").unwrap();
    /// let name = t.format("2009-02-01", "2009-02-02", &Extras::new()).unwrap();
    /// assert_eq!(name, "data_2009_032.dat");
    /// ```
    pub fn format(&self, start: &str, stop: &str, extras: &Extras) -> Result<String, FormatError> {
        let start = iso_time_to_array(start)?;
        let stop = if self.time_width_is_explicit {
            calendar::add(&start, &self.time_width)?
        } else {
            iso_time_to_array(stop)?
        };
        self.format_time(&start, &stop, extras)
    }

    /// Format a [`TimeRange`].
    pub fn format_time_range(&self, range: &TimeRange, extras: &Extras) -> Result<String, FormatError> {
        self.format_time(&range.start, &range.stop, extras)
    }

    /// Format the range between two decomposed times.
    pub fn format_time(
        &self,
        start: &DecomposedTime,
        stop: &DecomposedTime,
        extras: &Extras,
    ) -> Result<String, FormatError> {
        let mut width = if self.time_width_is_explicit {
            self.time_width
        } else {
            calendar::subtract(stop, start)?
        };
        let mut start = match &self.start_shift {
            Some(shift) => calendar::subtract(start, shift)?,
            None => *start,
        };
        let mut stop = match &self.stop_shift {
            Some(shift) => calendar::subtract(stop, shift)?,
            None => *stop,
        };

        if self.time_width_is_explicit && self.time_width[DAY] > 0 {
            if let Some(phasestart) = &self.phasestart {
                let anchor = julian_day(phasestart[YEAR], phasestart[MONTH], phasestart[DAY])?;
                let days = julian_day(start[YEAR], start[MONTH], start[DAY])? - anchor;
                let cycles = days.div_euclid(self.time_width[DAY]);
                let aligned = from_julian_day(anchor + cycles * self.time_width[DAY]);
                start[..=DAY].copy_from_slice(&aligned[..=DAY]);
                stop = calendar::add(&start, &self.time_width)?;
            }
        }

        // handler output is re-parsed into scratch extras so the caller's
        // map is left untouched
        let mut scratch = extras.clone();
        let mut segments = Vec::with_capacity(2 * self.fields.len() + 1);
        let mut in_stop = false;

        for (index, field) in self.fields.iter().enumerate() {
            if Some(index) == self.stop_time_field {
                in_stop = true;
            }
            segments.push(self.delims[index].clone());

            let rendered = match &field.code {
                FieldCode::Ignore => return Err(FormatError::Unsupported("$(ignore)")),
                FieldCode::AmPm => return Err(FormatError::Unsupported("$p")),
                FieldCode::Zone => return Err(FormatError::Unsupported("$z")),
                FieldCode::MonthName => {
                    let time = if in_stop { &stop } else { &start };
                    month_name(field, time[MONTH])?
                }
                FieldCode::Handler(code) => self.format_handler(
                    code,
                    field,
                    in_stop,
                    &mut start,
                    &mut stop,
                    &mut width,
                    extras,
                    &mut scratch,
                )?,
                _ => {
                    let time = if in_stop { &mut stop } else { &mut start };
                    self.format_numeric(field, time)?
                }
            };
            tracing::trace!(code = %field.code, rendered = %rendered, "format field");
            segments.push(rendered);
        }
        if let Some(delim) = self.delims.last() {
            segments.push(delim.clone());
        }

        Ok(segments.concat().trim().to_string())
    }

    fn format_numeric(&self, field: &Field, time: &mut DecomposedTime) -> Result<String, FormatError> {
        let mut digit = match field.code {
            FieldCode::Year => time[YEAR],
            FieldCode::TwoDigitYear => time[YEAR].rem_euclid(100),
            FieldCode::DayOfYear => day_of_year(time[YEAR], time[MONTH], time[DAY])?,
            FieldCode::Month => time[MONTH],
            FieldCode::Day => time[DAY],
            FieldCode::Hour => time[HOUR],
            FieldCode::Minute => time[MINUTE],
            FieldCode::Second => time[SECOND],
            FieldCode::Milli => time[NANOSECOND] / NANOS_PER_MILLI,
            FieldCode::Micro => time[NANOSECOND] / NANOS_PER_MICRO % 1000,
            _ => return Err(FormatError::Unsupported("non-numeric field")),
        };

        let delta = field.delta;
        if delta > 1 {
            match field.code {
                // $j and $m count from 1
                FieldCode::DayOfYear | FieldCode::Month => digit = (digit - 1) / delta * delta + 1,
                FieldCode::Day => {
                    let phasestart = self.phasestart.as_ref().ok_or(FormatError::MissingPhaseStart)?;
                    let anchor = julian_day(phasestart[YEAR], phasestart[MONTH], phasestart[DAY])?;
                    let days = julian_day(time[YEAR], time[MONTH], time[DAY])? - anchor;
                    let aligned = from_julian_day(anchor + days.div_euclid(delta) * delta);
                    time[..=DAY].copy_from_slice(&aligned[..=DAY]);
                    digit = time[DAY];
                }
                _ => digit = digit / delta * delta,
            }
        }

        if field.div > 1 && field.length.is_some() {
            digit = digit.div_euclid(field.div);
        }

        Ok(match (field.length, field.pad) {
            (None, _) => digit.to_string(),
            (Some(len), Some(Pad::Space)) => format!("{digit:<len$}"),
            (Some(len), Some(Pad::Underscore)) => format!("{digit:_<len$}"),
            (Some(len), _) => format!("{digit:0len$}"),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn format_handler(
        &self,
        code: &str,
        field: &Field,
        in_stop: bool,
        start: &mut DecomposedTime,
        stop: &mut DecomposedTime,
        width: &mut Duration,
        extras: &Extras,
        scratch: &mut Extras,
    ) -> Result<String, FormatError> {
        let handler_error = |source| FormatError::Handler {
            code: code.to_string(),
            source,
        };
        let Some(handler) = &field.handler else {
            return Err(FormatError::Unsupported("unconfigured handler"));
        };

        let time = if in_stop { *stop } else { *start };
        let span = calendar::subtract(stop, &time)?;
        let ins = handler
            .format(&time, &span, field.length, extras)
            .map_err(handler_error)?;
        let ins = pad_handler_output(code, field, ins)?;

        let mut test_time = time;
        let mut test_width = *width;
        match handler.parse(&ins, &mut test_time, &mut test_width, scratch) {
            Ok(()) if in_stop => *stop = test_time,
            Ok(()) => {
                *start = test_time;
                *width = test_width;
                *stop = calendar::add(start, width)?;
            }
            Err(err) => {
                tracing::warn!(code, output = %ins, error = %err, "formatted field does not parse back");
            }
        }
        Ok(ins)
    }
}

/// Bring a handler's output to the field's fixed length using its pad.
fn pad_handler_output(code: &str, field: &Field, ins: String) -> Result<String, FormatError> {
    let Some(len) = field.length else {
        return Ok(ins);
    };
    let got = ins.chars().count();
    let fill = match field.pad {
        _ if got == len => return Ok(ins),
        Some(Pad::Zero) if got < len => '0',
        Some(Pad::Space) if got < len => ' ',
        Some(Pad::Underscore) if got < len => '_',
        _ => {
            return Err(FormatError::Length {
                code: code.to_string(),
                expected: len,
                got: ins,
            })
        }
    };
    let mut padded: String = std::iter::repeat(fill).take(len - got).collect();
    padded.push_str(&ins);
    Ok(padded)
}

fn month_name(field: &Field, month: i32) -> Result<String, FormatError> {
    let name = if field.full_name {
        month_name_full(month)?
    } else {
        month_name_abbrev(month)?
    };
    Ok(match field.case {
        MonthCase::Lower => name.to_lowercase(),
        MonthCase::Capitalized => name.to_string(),
        MonthCase::Upper => name.to_uppercase(),
    })
}

#[cfg(test)]
mod tests {
    use crate::handlers::Extras;
    use crate::{FormatError, Template};

    fn format(spec: &str, start: &str, stop: &str) -> String {
        Template::compile(spec)
            .unwrap()
            .format(start, stop, &Extras::new())
            .unwrap()
    }

    #[test]
    fn test_format_numeric_fields() {
        assert_eq!(format("data_$Y.dat", "2001-03-22", "2002-01-01"), "data_2001.dat");
        assert_eq!(format("$y$m$d", "2009-02-01", "2009-02-02"), "090201");
        assert_eq!(
            format("/gif/ac_$Y$j$H-$(Y;end)$j$H.gif", "1997-11-26T00:00Z", "1997-11-27T00:00Z"),
            "/gif/ac_199733000-199733100.gif"
        );
        assert_eq!(
            format("$Y$m$dT$H$M$S.$(milli)$(micro)", "2020-01-01T01:02:03.004005Z", "2020-01-01T01:02:03.004006Z"),
            "20200101T010203.004005"
        );
    }

    #[test]
    fn test_format_shift_and_end() {
        assert_eq!(
            format("$Y$m$d-$(Y;end)$m$(d;shift=1)", "2020-01-01", "2020-01-08"),
            "20200101-20200107"
        );
    }

    #[test]
    fn test_format_pad() {
        assert_eq!(format("$y $(m;pad=none) $(d;pad=none)", "2014-04-01", "2014-04-02"), "14 4 1");
        assert_eq!(format("$(m;pad=space)$Y", "2014-04-01", "2014-05-01"), "4 2014");
        assert_eq!(format("$Y$(m;pad=underscore)", "2014-04-01", "2014-05-01"), "20144_");
        assert_eq!(format("$-1Y $-1m", "2014-04-01", "2014-05-01"), "2014 4");
    }

    #[test]
    fn test_format_month_names() {
        assert_eq!(format("$(b;case=lc)", "2024-02-01", "2024-03-01"), "feb");
        assert_eq!(format("$(b;fmt=full)", "2024-02-01", "2024-03-01"), "february");
        assert_eq!(format("$(b;fmt=full;case=uc)", "2024-02-01", "2024-03-01"), "FEBRUARY");
        assert_eq!(
            format("$(b;fmt=full;case=cap) $(d;pad=none), $Y", "2022-02-02", "2022-02-03"),
            "February 2, 2022"
        );
    }

    #[test]
    fn test_format_delta_alignment() {
        assert_eq!(format("$Y$(m;delta=3)", "2022-05-10", "2022-05-11"), "202204");
        assert_eq!(format("$Y$m$d$(H;delta=6)", "2022-05-10T13:00", "2022-05-10T14:00"), "2022051012");
        assert_eq!(
            format("$Y$m$(d;delta=10;phasestart=1979-01-01)", "1979-12-30", "1979-12-31"),
            "19791227"
        );
        let t = Template::compile("$Y$m$(d;delta=10)").unwrap();
        assert_eq!(
            t.format("1979-12-30", "1979-12-31", &Extras::new()),
            Err(FormatError::MissingPhaseStart)
        );
    }

    #[test]
    fn test_format_divided_field() {
        assert_eq!(
            format("$Y/$Y$(j;div=100)XX/$Y$j.dat", "2024-07-05", "2024-07-06"),
            "2024/20241XX/2024187.dat"
        );
        assert_eq!(format("$Y$(j;div=100)XX", "2024-10-26", "2025-01-01"), "20243XX");
    }

    #[test]
    fn test_format_unsupported_fields() {
        let extras = Extras::new();
        for spec in ["$(ignore)_$Y", "$Y$m$d$H$p", "$Y$m$d$H$M$z"] {
            let t = Template::compile(spec).unwrap();
            assert!(matches!(
                t.format("2020-01-01", "2020-01-02", &extras),
                Err(FormatError::Unsupported(_))
            ));
        }
        let t = Template::compile("$Y_*.dat").unwrap();
        assert!(matches!(
            t.format("2020-01-01", "2021-01-01", &extras),
            Err(FormatError::Handler { .. })
        ));
    }

    #[test]
    fn test_format_handler_length() {
        let mut extras = Extras::new();
        extras.insert("sc".into(), "Apple".into());
        let t = Template::compile("/tmp/ap/$(x;name=sc;len=6;pad=_).dat").unwrap();
        assert_eq!(t.format("2020-01-01", "2020-01-02", &extras).unwrap(), "/tmp/ap/_Apple.dat");

        let t = Template::compile("/tmp/ap/$(x;name=sc;len=4).dat").unwrap();
        assert!(matches!(
            t.format("2020-01-01", "2020-01-02", &extras),
            Err(FormatError::Length { expected: 4, .. })
        ));
    }
}
