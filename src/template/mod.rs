// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Compiled time templates.
//!
//! A template such as `data_$Y_$j.dat` names one file per day. Compiling it
//! yields a [`Template`], which parses names into [`TimeRange`]s and formats
//! ranges back into names.
//!
//! ```
//! use timetemplates::{Extras, Template};
//!
//! let t = Template::compile("$Y$m$d-$(Y;end)$m$(d;shift=1)").unwrap();
//! let range = t.parse("20200101-20200107", &mut Extras::new()).unwrap();
//! assert_eq!(range.to_string(), "2020-01-01/2020-01-08");
//! ```
//!
//! # Syntax
//!
//! | Form | Meaning |
//! |------|---------|
//! | `$Y` | single-letter field |
//! | `$(d;delta=10;phasestart=1979-01-01)` | field with qualifiers |
//! | `$5Y`, `$-1d` | explicit length; negative is variable |
//! | `$$` | literal dollar |
//! | `%{Y}`, `${Y}`, `*` | legacy spellings, rewritten on compile |

mod canonical;
mod compile;
mod format;
mod parse;

use std::fmt;
use std::str::FromStr;

use regex::Regex;

pub use canonical::{make_canonical, make_qualifiers_canonical};
pub use compile::{Field, FieldCode, Pad};

use crate::calendar::{DecomposedTime, Duration};
use crate::error::{CompileError, Result};
use crate::handlers::{Extras, HandlerRegistry};
use crate::range::TimeRange;

/// A compiled template, immutable apart from its external context.
#[derive(Debug)]
pub struct Template {
    pub(crate) spec: String,
    /// Literal text around the fields; one more entry than `fields`.
    pub(crate) delims: Vec<String>,
    pub(crate) fields: Vec<Field>,
    pub(crate) context: DecomposedTime,
    pub(crate) external_context: usize,
    pub(crate) time_width: Duration,
    pub(crate) time_width_is_explicit: bool,
    /// Index of the first field describing the stop time.
    pub(crate) stop_time_field: Option<usize>,
    pub(crate) start_shift: Option<Duration>,
    pub(crate) stop_shift: Option<Duration>,
    pub(crate) phasestart: Option<DecomposedTime>,
    pub(crate) two_digit_year_start: i32,
    /// Set by `div` on a fixed-width field: a multi-day step stops at the
    /// end of its year instead of carrying into the next.
    pub(crate) no_stop_carry: bool,
    pub(crate) regex: Regex,
}

impl Template {
    /// Compile `spec` with the built-in field handlers.
    pub fn compile(spec: &str) -> Result<Self, CompileError> {
        compile::compile(spec, &HandlerRegistry::default())
    }

    /// Compile `spec`, resolving handler codes against `registry`.
    pub fn with_registry(
        spec: &str,
        registry: &HandlerRegistry,
    ) -> Result<Self, CompileError> {
        compile::compile(spec, registry)
    }

    /// The template in canonical form.
    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Literal text before, between and after the fields.
    pub fn delimiters(&self) -> &[String] {
        &self.delims
    }

    /// Number of leading time components (year first) that the template
    /// does not supply itself: `data_$j.dat` needs the year, so it is 1.
    pub fn external_context(&self) -> usize {
        self.external_context
    }

    /// Time whose leading components fill in what the template lacks.
    pub fn context(&self) -> &DecomposedTime {
        &self.context
    }

    /// Copy the first [`external_context`](Self::external_context)
    /// components of `time` into the context.
    pub fn set_context(&mut self, time: &DecomposedTime) {
        let n = self.external_context;
        self.context[..n].copy_from_slice(&time[..n]);
    }

    /// Implied width of one formatted name, e.g. one day for `$Y$m$d`.
    pub fn time_width(&self) -> &Duration {
        &self.time_width
    }

    /// Whether [`time_width`](Self::time_width) came from a `span` qualifier.
    pub fn time_width_is_explicit(&self) -> bool {
        self.time_width_is_explicit
    }

    /// Regular expression matching names produced by this template.
    ///
    /// ```
    /// use timetemplates::Template;
    ///
    /// let t = Template::compile("data_$Y_$j.dat").unwrap();
    /// assert_eq!(t.regex(), r"^data_(.{4})_(.{3})\.dat$");
    /// ```
    pub fn regex(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether `name` has the shape of a name produced by this template.
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Every name needed to cover `start` to `stop`; see
    /// [`format_template_range`](crate::enumerate::format_template_range).
    pub fn format_range(&self, start: &str, stop: &str, extras: &Extras) -> Result<Vec<String>> {
        crate::enumerate::format_template_range(self, start, stop, extras)
    }

    /// Parse `text` and return the range it covers, discarding extras.
    pub fn parse_range(&self, text: &str) -> Result<TimeRange> {
        Ok(self.parse(text, &mut Extras::new())?)
    }
}

impl FromStr for Template {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}
