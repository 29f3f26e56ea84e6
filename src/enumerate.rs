// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Enumeration of every name a template produces over an interval.
//!
//! Each step formats the template at a pointer, parses the name back to
//! learn the interval it really covers, then moves the pointer to that
//! interval's stop. Month lengths, leap years and handler-defined periods
//! are therefore honoured without any stride arithmetic here.

use crate::calendar::{self, DecomposedTime};
use crate::error::{Error, FormatError, Result};
use crate::handlers::Extras;
use crate::iso::{iso_time_from_array, iso_time_to_array};
use crate::template::Template;

/// Upper bound on the number of names one enumeration may produce.
pub const MAX_ENUMERATION_STEPS: usize = 1_000_000;

/// Compile `spec` and list the names covering `start` to `stop`.
///
/// ```
/// let names = timetemplates::format_range(
///     "data_$Y.dat",
///     "2001-03-22",
///     "2004-08-18",
///     &Default::default(),
/// )
/// .unwrap();
/// assert_eq!(names, ["data_2001.dat", "data_2002.dat", "data_2003.dat", "data_2004.dat"]);
/// ```
pub fn format_range(spec: &str, start: &str, stop: &str, extras: &Extras) -> Result<Vec<String>> {
    let template = Template::compile(spec)?;
    format_template_range(&template, start, stop, extras)
}

/// List the names of `template` covering `start` (inclusive) to `stop`
/// (exclusive).
///
/// A template carrying both start and stop fields, such as
/// `$Y$m$d-$(Y;end)$m$d`, yields the single name for the whole interval.
///
/// # Errors
///
/// [`Error::InvertedRange`] when `start` is after `stop`,
/// [`Error::StalledEnumeration`] when a name fails to advance the pointer,
/// and [`Error::EnumerationLimit`] past [`MAX_ENUMERATION_STEPS`] names.
pub fn format_template_range(
    template: &Template,
    start: &str,
    stop: &str,
    extras: &Extras,
) -> Result<Vec<String>> {
    let mut ptr = iso_time_to_array(start)?;
    let stop_time = iso_time_to_array(stop)?;
    if ptr > stop_time {
        return Err(Error::InvertedRange);
    }

    let mut context = *template.context();
    let n = template.external_context();
    context[..n].copy_from_slice(&stop_time[..n]);

    let mut names = Vec::new();
    let mut first = true;
    while ptr < stop_time {
        let previous = ptr;
        let mut name = format_at(template, &ptr, extras)?;
        let range = template.parse_with_context(&name, &context, &mut Extras::new())?;
        if first {
            // the first name may begin before the requested start
            ptr = range.start;
            name = format_at(template, &ptr, extras)?;
            first = false;
        }

        if range.start == range.stop {
            names.push(template.format(start, stop, extras)?);
            break;
        }
        tracing::debug!(name = %name, start = ?range.start, stop = ?range.stop, "enumeration step");
        names.push(name);

        ptr = range.stop;
        if ptr == previous {
            return Err(Error::StalledEnumeration(iso_time_from_array(&ptr)?));
        }
        if names.len() >= MAX_ENUMERATION_STEPS && ptr < stop_time {
            return Err(Error::EnumerationLimit(MAX_ENUMERATION_STEPS));
        }
    }
    Ok(names)
}

/// Format the name whose interval contains `time`, using the template's own
/// implied width.
fn format_at(
    template: &Template,
    time: &DecomposedTime,
    extras: &Extras,
) -> std::result::Result<String, FormatError> {
    let stop = if template.time_width_is_explicit() {
        calendar::add(time, template.time_width())?
    } else {
        *time
    };
    template.format_time(time, &stop, extras)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerRegistry;

    fn names(spec: &str, start: &str, stop: &str) -> Vec<String> {
        format_range(spec, start, stop, &Extras::new()).unwrap()
    }

    #[test]
    fn test_yearly() {
        assert_eq!(
            names("data_$Y.dat", "2001-03-22", "2004-08-18"),
            ["data_2001.dat", "data_2002.dat", "data_2003.dat", "data_2004.dat"]
        );
    }

    #[test]
    fn test_daily_across_month_end() {
        assert_eq!(
            names("$Y$m$d", "2020-02-28", "2020-03-02"),
            ["20200228", "20200229", "20200301"]
        );
    }

    #[test]
    fn test_first_name_reanchors() {
        assert_eq!(
            names("$Y$m$d_$(H;delta=6)", "2020-01-01T07:00", "2020-01-01T13:00"),
            ["20200101_06", "20200101_12"]
        );
    }

    #[test]
    fn test_start_and_stop_fields_give_one_name() {
        assert_eq!(
            names("$Y$m$d-$(Y;end)$m$d", "2020-01-01", "2020-01-07"),
            ["20200101-20200107"]
        );
    }

    #[test]
    fn test_empty_and_inverted_ranges() {
        assert!(names("$Y$m$d", "2020-01-01", "2020-01-01").is_empty());
        assert_eq!(
            format_range("$Y$m$d", "2020-01-02", "2020-01-01", &Extras::new()),
            Err(Error::InvertedRange)
        );
    }

    #[test]
    fn test_stalled_template() {
        #[derive(Debug, Default)]
        struct Frozen;

        impl crate::FieldHandler for Frozen {
            fn configure(&mut self, _args: &crate::HandlerArgs) -> std::result::Result<(), crate::HandlerError> {
                Ok(())
            }
            fn regex(&self) -> Option<String> {
                None
            }
            fn parse(
                &self,
                _field: &str,
                start: &mut DecomposedTime,
                width: &mut calendar::Duration,
                _extras: &mut Extras,
            ) -> std::result::Result<(), crate::HandlerError> {
                *start = [2020, 1, 1, 0, 0, 0, 0];
                *width = [0, 0, 0, 0, 0, 0, 1];
                Ok(())
            }
            fn format(
                &self,
                _start: &DecomposedTime,
                _width: &calendar::Duration,
                _length: Option<usize>,
                _extras: &Extras,
            ) -> std::result::Result<String, crate::HandlerError> {
                Ok("frozen".into())
            }
        }

        let registry = HandlerRegistry::default().with_handler("frozen", || Box::new(Frozen));
        let t = Template::with_registry("$(frozen)", &registry).unwrap();
        let err = t.format_range("2020-01-01", "2020-01-02", &Extras::new());
        assert!(matches!(err, Err(Error::StalledEnumeration(_))));
    }
}
