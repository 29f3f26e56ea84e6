// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Time Templates
//!
//! This crate maps time-indexed resource names, such as the file names and
//! URLs of a data archive, to the time ranges they cover, and back.
//!
//! # Core types
//!
//! - [`Template`]: a compiled template such as `data_$Y_$j.dat`.
//! - [`TimeRange`]: a start and a stop [`DecomposedTime`].
//! - [`DecomposedTime`]: `[year, month, day, hour, minute, second, nanosecond]`.
//! - [`Duration`]: the same seven slots read as a span.
//! - [`FieldHandler`]: extension point for non-numeric fields, created per
//!   field from a [`HandlerRegistry`].
//!
//! # Field codes
//!
//! | Code | Field | Length |
//! |------|-------|--------|
//! | `Y` | year | 4 |
//! | `y` | two-digit year | 2 |
//! | `j` | day of year | 3 |
//! | `m` | month | 2 |
//! | `d` | day of month | 2 |
//! | `H` `M` `S` | hour, minute, second | 2 |
//! | `milli` `micro` | sub-second | 3 |
//! | `b` | month name | 3 |
//! | `p` | AM/PM, parse only | 2 |
//! | `z` | RFC-822 zone, parse only | 5 |
//! | `ignore` | skipped text | variable |
//!
//! Handler codes (`subsec`, `hrinterval`, `periodic`, `enum`, `x`, `v`) are
//! described in [`handlers`].
//!
//! # Example
//!
//! ```
//! use timetemplates::{format_range, Extras, Template};
//!
//! let t = Template::compile("data_$Y_$j.dat").unwrap();
//! let range = t.parse("data_2009_032.dat", &mut Extras::new()).unwrap();
//! assert_eq!(range.to_string(), "2009-02-01/2009-02-02");
//!
//! let names = format_range("$Y$m", "2000-11-15", "2001-02-01", &Extras::new()).unwrap();
//! assert_eq!(names, ["200011", "200012", "200101"]);
//! ```
//!
//! The calendar kernel ([`calendar`], [`duration`], [`iso`]) is usable on its
//! own.

pub mod calendar;
pub mod duration;
pub mod enumerate;
pub mod error;
pub mod handlers;
pub mod iso;
pub mod range;
pub mod template;

// ── Re-exports ────────────────────────────────────────────────────────────

pub use calendar::{add, julian_day, normalize, subtract, DecomposedTime, Duration};
pub use duration::{format_duration, parse_duration};
pub use enumerate::{format_range, format_template_range, MAX_ENUMERATION_STEPS};
pub use error::{
    CalendarError, CompileError, Error, FormatError, HandlerError, ParseError, Result,
};
pub use handlers::{
    Extras, FieldHandler, HandlerArgs, HandlerFactory, HandlerRegistry, VersioningType,
};
pub use iso::{iso_time_from_array, iso_time_to_array};
pub use range::{parse_iso8601_time_range, TimeRange};
pub use template::{Field, FieldCode, Pad, Template};

/// Compile a template with the built-in handlers.
///
/// Shorthand for [`Template::compile`].
pub fn compile(spec: &str) -> Result<Template, CompileError> {
    Template::compile(spec)
}
