// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Error types.
//!
//! One enum per layer, innermost first:
//!
//! | Type | Raised by |
//! |------|-----------|
//! | [`CalendarError`] | calendar arithmetic, ISO-8601 times and durations |
//! | [`HandlerError`] | field handler `configure` / `parse` / `format` |
//! | [`CompileError`] | template compilation |
//! | [`ParseError`] | [`Template::parse`](crate::Template::parse) |
//! | [`FormatError`] | [`Template::format`](crate::Template::format) |
//! | [`Error`] | umbrella type, plus range enumeration failures |

use thiserror::Error;

/// Errors from the calendar kernel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("year must be more than 1582, got {0}")]
    YearTooEarly(i32),

    #[error("invalid {field}: {value}")]
    OutOfRange { field: &'static str, value: i32 },

    #[error("malformed time \"{input}\": {reason}")]
    MalformedTime { input: String, reason: String },

    #[error("malformed duration \"{input}\": {reason}")]
    MalformedDuration { input: String, reason: String },

    #[error("malformed time range \"{input}\": {reason}")]
    MalformedRange { input: String, reason: String },

    #[error("unrecognized month name \"{0}\"")]
    MonthName(String),

    #[error("stop time must be after start time")]
    EmptyRange,
}

impl CalendarError {
    pub(crate) fn malformed_time(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedTime {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_duration(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedDuration {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors reported by a [`FieldHandler`](crate::FieldHandler).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("missing argument \"{0}\"")]
    MissingArgument(&'static str),

    #[error("invalid argument {name}={value}: {reason}")]
    InvalidArgument {
        name: String,
        value: String,
        reason: String,
    },

    #[error("value \"{value}\" rejected: {reason}")]
    Rejected { value: String, reason: String },

    #[error("cannot format: {0}")]
    Unformattable(String),

    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

/// Errors raised while compiling a template string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("bad format code \"{code}\" in \"{template}\"")]
    UnknownFieldCode { code: String, template: String },

    #[error("opening paren but no closing paren in \"{0}\"")]
    UnmatchedParen(String),

    #[error("bad value for qualifier {name}={value}")]
    BadQualifierValue { name: String, value: String },

    #[error("{0} must be assigned an integer value (e.g. {0}=1)")]
    UnassignedContext(String),

    #[error("shift is empty on field \"{0}\"")]
    EmptyShift(String),

    #[error("no calendar unit for shift or width on field \"{0}\"")]
    NoUnit(String),

    #[error("$H must precede $p")]
    AmPmWithoutHour,

    #[error("handler \"{code}\" rejected its configuration: {source}")]
    Configure {
        code: String,
        #[source]
        source: HandlerError,
    },

    #[error("invalid pattern: {0}")]
    Regex(String),

    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

/// Errors raised while parsing a string with a compiled template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("string is too short: \"{0}\"")]
    TooShort(String),

    #[error("expected delimiter \"{delimiter}\" in \"{text}\"")]
    MissingDelimiter { delimiter: String, text: String },

    #[error("no delimiter specified after unknown length field \"{code}\", field number {index}")]
    NoDelimiter { code: String, index: usize },

    #[error("fail to parse field number {index}: \"{field}\"")]
    BadField { index: usize, field: String },

    #[error("field \"{code}\" rejected \"{field}\": {source}")]
    Handler {
        code: String,
        field: String,
        #[source]
        source: HandlerError,
    },

    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

/// Errors raised while formatting a time range with a compiled template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("cannot format a template containing \"{0}\"")]
    Unsupported(&'static str),

    #[error("phasestart not set for delta days")]
    MissingPhaseStart,

    #[error("length of field \"{code}\" is incorrect, should be {expected}, got \"{got}\"")]
    Length {
        code: String,
        expected: usize,
        got: String,
    },

    #[error("field \"{code}\" cannot be formatted: {source}")]
    Handler {
        code: String,
        #[source]
        source: HandlerError,
    },

    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

/// Umbrella error for the public API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("calendar error: {0}")]
    Calendar(#[from] CalendarError),

    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("start time must be before or equal to stop time")]
    InvertedRange,

    #[error("template fails to advance at {0}")]
    StalledEnumeration(String),

    #[error("enumeration exceeded {0} labels")]
    EnumerationLimit(usize),
}

/// Result alias defaulting to the umbrella [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
