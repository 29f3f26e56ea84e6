// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Template compiler: field resolution, qualifiers, offsets, granularity.

use std::fmt;
use std::str::FromStr;

use regex::Regex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::canonical::{make_canonical, make_qualifiers_canonical, split_fields};
use super::Template;
use crate::calendar::{
    DecomposedTime, Duration, DAY, HOUR, MINUTE, MIN_VALID_YEAR, MONTH, NANOSECOND, SECOND,
    TIME_DIGITS, YEAR,
};
use crate::duration::parse_duration;
use crate::error::CompileError;
use crate::handlers::{parse_args, FieldHandler, HandlerArgs, HandlerRegistry};
use crate::iso::iso_time_to_array;

/// Coarse width used when a template has no date field at all.
const NO_DATE_WIDTH_YEARS: i32 = 8000;

const DEFAULT_TWO_DIGIT_YEAR_START: i32 = 1950;

/// Precision ranks past [`SECOND`]: milliseconds, microseconds, nanoseconds.
const LSD_MILLI: i32 = 6;
const LSD_MICRO: i32 = 7;
const LSD_NANO: i32 = 8;

/// What a template field encodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FieldCode {
    /// `$Y`
    Year,
    /// `$y`
    TwoDigitYear,
    /// `$j`
    DayOfYear,
    /// `$m`
    Month,
    /// `$d`
    Day,
    /// `$H`
    Hour,
    /// `$M`
    Minute,
    /// `$S`
    Second,
    /// `$(milli)`
    Milli,
    /// `$(micro)`
    Micro,
    /// `$p`, parse only
    AmPm,
    /// `$z`, RFC-822 zone, parse only
    Zone,
    /// `$(ignore)`
    Ignore,
    /// `$b`
    MonthName,
    /// A registered [`FieldHandler`].
    Handler(String),
}

impl FieldCode {
    /// Resolve one of the fixed numeric codes.
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "Y" => Self::Year,
            "y" => Self::TwoDigitYear,
            "j" => Self::DayOfYear,
            "m" => Self::Month,
            "d" => Self::Day,
            "H" => Self::Hour,
            "M" => Self::Minute,
            "S" => Self::Second,
            "milli" => Self::Milli,
            "micro" => Self::Micro,
            "p" => Self::AmPm,
            "z" => Self::Zone,
            "ignore" => Self::Ignore,
            "b" => Self::MonthName,
            _ => return None,
        })
    }

    /// The code as written in a template.
    pub fn code(&self) -> &str {
        match self {
            Self::Year => "Y",
            Self::TwoDigitYear => "y",
            Self::DayOfYear => "j",
            Self::Month => "m",
            Self::Day => "d",
            Self::Hour => "H",
            Self::Minute => "M",
            Self::Second => "S",
            Self::Milli => "milli",
            Self::Micro => "micro",
            Self::AmPm => "p",
            Self::Zone => "z",
            Self::Ignore => "ignore",
            Self::MonthName => "b",
            Self::Handler(name) => name,
        }
    }

    /// Field length when no explicit width is given; `None` is variable.
    pub fn default_length(&self) -> Option<usize> {
        match self {
            Self::Year => Some(4),
            Self::DayOfYear | Self::Milli | Self::Micro | Self::MonthName => Some(3),
            Self::TwoDigitYear
            | Self::Month
            | Self::Day
            | Self::Hour
            | Self::Minute
            | Self::Second
            | Self::AmPm => Some(2),
            Self::Zone => Some(5),
            Self::Ignore | Self::Handler(_) => None,
        }
    }

    pub fn is_handler(&self) -> bool {
        matches!(self, Self::Handler(_))
    }

    /// Calendar precision rank, finer is larger. `None` for fields that say
    /// nothing about granularity.
    fn precision(&self) -> Option<i32> {
        match self {
            Self::Year | Self::TwoDigitYear => Some(0),
            Self::Month | Self::MonthName => Some(1),
            Self::DayOfYear | Self::Day => Some(2),
            Self::Hour => Some(3),
            Self::Minute => Some(4),
            Self::Second => Some(5),
            Self::Milli => Some(LSD_MILLI),
            Self::Micro => Some(LSD_MICRO),
            _ => None,
        }
    }

    /// Number of leading components the field itself supplies, minus one.
    fn context_digit(&self) -> Option<usize> {
        match self {
            Self::Year | Self::TwoDigitYear => Some(YEAR),
            Self::Month | Self::MonthName | Self::DayOfYear => Some(MONTH),
            Self::Day => Some(DAY),
            Self::Hour => Some(HOUR),
            Self::Minute => Some(MINUTE),
            Self::Second => Some(SECOND),
            _ => None,
        }
    }

    /// Time component used for unit-less `span` and `shift` values.
    fn digit(&self) -> Option<usize> {
        match self {
            Self::Year => Some(YEAR),
            Self::Month => Some(MONTH),
            Self::DayOfYear | Self::Day => Some(DAY),
            Self::Hour => Some(HOUR),
            Self::Minute => Some(MINUTE),
            Self::Second => Some(SECOND),
            _ => None,
        }
    }
}

impl fmt::Display for FieldCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Time component named by a one-letter unit code.
fn digit_for_unit(unit: char) -> Option<usize> {
    match unit {
        'Y' => Some(YEAR),
        'm' => Some(MONTH),
        'j' | 'd' => Some(DAY),
        'H' => Some(HOUR),
        'M' => Some(MINUTE),
        'S' => Some(SECOND),
        _ => None,
    }
}

/// Padding of a fixed-width field whose value is shorter than the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Pad {
    Zero,
    Space,
    Underscore,
    /// No padding: the field becomes variable width.
    None,
}

impl FromStr for Pad {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zero" => Ok(Self::Zero),
            "space" => Ok(Self::Space),
            "underscore" | "_" => Ok(Self::Underscore),
            "none" => Ok(Self::None),
            _ => Err(bad_value("pad", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum MonthCase {
    #[default]
    Lower,
    Capitalized,
    Upper,
}

/// One compiled field of a [`Template`].
#[derive(Debug)]
pub struct Field {
    pub(crate) code: FieldCode,
    pub(crate) qualifiers: Option<String>,
    pub(crate) offset: Option<usize>,
    pub(crate) length: Option<usize>,
    pub(crate) pad: Option<Pad>,
    /// `delta`/`span` step for floor-aligning numeric fields.
    pub(crate) delta: i32,
    /// `div`: the name carries the value divided by this.
    pub(crate) div: i32,
    pub(crate) case: MonthCase,
    pub(crate) full_name: bool,
    pub(crate) handler: Option<Box<dyn FieldHandler>>,
}

impl Field {
    pub fn code(&self) -> &FieldCode {
        &self.code
    }

    /// Raw qualifier string, e.g. `"shift=1;end"`.
    pub fn qualifiers(&self) -> Option<&str> {
        self.qualifiers.as_deref()
    }

    /// Byte offset within the name, when every preceding field has a fixed
    /// length.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Fixed length, or `None` for a field bounded by the next delimiter.
    pub fn length(&self) -> Option<usize> {
        self.length
    }

    pub fn pad(&self) -> Option<Pad> {
        self.pad
    }
}

fn bad_value(name: &str, value: &str) -> CompileError {
    CompileError::BadQualifierValue {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn parse_int(name: &str, value: &str) -> Result<i32, CompileError> {
    value.trim().parse().map_err(|_| bad_value(name, value))
}

/// A field as written, before resolution.
struct RawField {
    width: i32,
    code: String,
    qualifiers: Option<String>,
}

/// Split one `$`-piece into width prefix, code, qualifiers and the literal
/// delimiter that follows.
fn split_piece(piece: &str, spec: &str) -> Result<(RawField, String), CompileError> {
    let pp = piece
        .bytes()
        .take_while(|b| b.is_ascii_digit() || *b == b'-')
        .count();
    let width = if pp > 0 {
        parse_int("width", &piece[..pp])?
    } else {
        0
    };
    let rest = &piece[pp..];

    if let Some(group) = rest.strip_prefix('(') {
        let close = group
            .find(')')
            .ok_or_else(|| CompileError::UnmatchedParen(piece.to_string()))?;
        let inner = make_qualifiers_canonical(&group[..close]);
        let (code, qualifiers) = match inner.split_once(';') {
            Some((code, q)) => (code.to_string(), Some(q.to_string())),
            None => (inner.clone(), None),
        };
        let raw = RawField {
            width,
            code,
            qualifiers,
        };
        return Ok((raw, group[close + 1..].to_string()));
    }

    let mut chars = rest.chars();
    let code = chars.next().ok_or_else(|| CompileError::UnknownFieldCode {
        code: String::new(),
        template: spec.to_string(),
    })?;
    let raw = RawField {
        width,
        code: code.to_string(),
        qualifiers: None,
    };
    Ok((raw, chars.as_str().to_string()))
}

/// Mutable state threaded through compilation, left to right.
struct Compiler<'a> {
    spec: &'a str,
    pos: Option<usize>,
    lsd: i32,
    lsd_mult: i32,
    context: DecomposedTime,
    external_context: usize,
    time_width: Duration,
    time_width_is_explicit: bool,
    have_hour: bool,
    stop_time_field: Option<usize>,
    start_shift: Option<Duration>,
    stop_shift: Option<Duration>,
    phasestart: Option<DecomposedTime>,
    two_digit_year_start: i32,
    no_stop_carry: bool,
}

impl<'a> Compiler<'a> {
    fn new(spec: &'a str) -> Self {
        Self {
            spec,
            pos: Some(0),
            lsd: -1,
            lsd_mult: 1,
            context: [MIN_VALID_YEAR, 1, 1, 0, 0, 0, 0],
            external_context: TIME_DIGITS,
            time_width: [0; TIME_DIGITS],
            time_width_is_explicit: false,
            have_hour: false,
            stop_time_field: None,
            start_shift: None,
            stop_shift: None,
            phasestart: None,
            two_digit_year_start: DEFAULT_TWO_DIGIT_YEAR_START,
            no_stop_carry: false,
        }
    }

    fn set_lsd(&mut self, lsd: i32, mult: i32) {
        if lsd != self.lsd || mult != self.lsd_mult {
            tracing::debug!(lsd, width = mult, "least significant digit changed");
        }
        self.lsd = lsd;
        self.lsd_mult = mult;
    }

    fn set_context(&mut self, index: usize, value: &str, name: &str) -> Result<(), CompileError> {
        self.context[index] = parse_int(name, value)?;
        Ok(())
    }

    /// `span=4` (in the field's own unit) or `span=4H`. Returns the span and
    /// the component it applies to.
    fn handle_width(
        &mut self,
        code: &FieldCode,
        name: &str,
        value: &str,
    ) -> Result<(i32, usize), CompileError> {
        let (count, digit) = match value.chars().last() {
            Some(c) if c.is_ascii_alphabetic() => (
                &value[..value.len() - c.len_utf8()],
                digit_for_unit(c).ok_or_else(|| CompileError::NoUnit(code.to_string()))?,
            ),
            Some(_) => (value, code.digit().ok_or_else(|| CompileError::NoUnit(code.to_string()))?),
            None => return Err(bad_value(name, value)),
        };
        let span = parse_int(name, count)?;
        self.time_width[digit] = span;
        self.time_width_is_explicit = true;
        Ok((span, digit))
    }

    fn handle_period(&mut self, value: &str) -> Result<(), CompileError> {
        if value.starts_with('P') {
            let period = parse_duration(value).map_err(|_| bad_value("period", value))?;
            if let Some((j, &mult)) = period.iter().enumerate().find(|(_, &p)| p > 0) {
                let lsd = if j == NANOSECOND { LSD_NANO } else { j as i32 };
                self.set_lsd(lsd, mult);
            }
            return Ok(());
        }
        let unit = value.chars().last().ok_or_else(|| bad_value("period", value))?;
        let lsd = match unit {
            'N' => LSD_NANO,
            _ => digit_for_unit(unit).ok_or_else(|| bad_value("period", value))? as i32,
        };
        let mult = parse_int("period", &value[..value.len() - unit.len_utf8()])?;
        self.set_lsd(lsd, mult);
        Ok(())
    }

    fn handle_shift(&mut self, index: usize, code: &FieldCode, value: &str) -> Result<(), CompileError> {
        let (amount, digit) = match value.chars().last() {
            None => return Err(CompileError::EmptyShift(code.to_string())),
            Some(c) if c.is_ascii_alphabetic() => (
                &value[..value.len() - 1],
                digit_for_unit(c).ok_or_else(|| CompileError::NoUnit(code.to_string()))?,
            ),
            Some(_) => (value, code.digit().ok_or_else(|| CompileError::NoUnit(code.to_string()))?),
        };
        let amount = parse_int("shift", amount)?;
        let shift = if self.stop_time_field.map_or(true, |stop| index < stop) {
            &mut self.start_shift
        } else {
            &mut self.stop_shift
        };
        shift.get_or_insert([0; TIME_DIGITS])[digit] = amount;
        Ok(())
    }

    /// Interpret a field's qualifiers. Returns the field's `span`.
    fn qualifiers(&mut self, index: usize, field: &mut Field) -> Result<i32, CompileError> {
        let Some(qualifiers) = field.qualifiers.clone() else {
            return Ok(1);
        };
        let quals: Vec<&str> = qualifiers.split(';').map(str::trim).collect();

        // `end` applies before any `shift` on the same field
        if quals.iter().any(|q| *q == "end" || q.starts_with("end=")) && self.stop_time_field.is_none() {
            self.stop_time_field = Some(index);
        }

        let mut span = 1;
        for qual in quals {
            let Some((name, value)) = qual.split_once('=') else {
                match qual {
                    "end" | "" => {}
                    "Y" | "m" | "d" | "j" | "H" | "M" | "S" => {
                        return Err(CompileError::UnassignedContext(qual.to_string()));
                    }
                    _ if field.code.is_handler() => {}
                    _ => tracing::warn!(code = %field.code, qualifier = qual, "unrecognized qualifier ignored"),
                }
                continue;
            };
            let (name, value) = (name.trim(), value.trim());
            match name {
                "Y" => {
                    self.set_context(YEAR, value, name)?;
                    self.external_context = self.external_context.min(YEAR);
                }
                "m" => {
                    self.set_context(MONTH, value, name)?;
                    self.external_context = self.external_context.min(MONTH);
                }
                "d" => {
                    self.set_context(DAY, value, name)?;
                    self.external_context = self.external_context.min(DAY);
                }
                "j" => {
                    self.context[MONTH] = 1;
                    self.set_context(DAY, value, name)?;
                    self.external_context = self.external_context.min(MONTH);
                }
                "H" => {
                    self.set_context(HOUR, value, name)?;
                    self.external_context = self.external_context.min(HOUR);
                }
                "M" => {
                    self.set_context(MINUTE, value, name)?;
                    self.external_context = self.external_context.min(MINUTE);
                }
                "S" => {
                    self.set_context(SECOND, value, name)?;
                    self.external_context = self.external_context.min(SECOND);
                }
                "cadence" | "span" | "delta" | "resolution" => {
                    let (width, digit) = self.handle_width(&field.code, name, value)?;
                    span = width;
                    if field.code.digit() == Some(digit) {
                        field.delta = width;
                    }
                }
                "period" if !field.code.is_handler() => self.handle_period(value)?,
                "phasestart" => {
                    self.phasestart =
                        Some(iso_time_to_array(value).map_err(|_| bad_value(name, value))?);
                }
                "start" if field.code == FieldCode::TwoDigitYear => {
                    self.two_digit_year_start = parse_int(name, value)?;
                }
                "shift" => self.handle_shift(index, &field.code, value)?,
                "pad" => {
                    let pad: Pad = value.parse()?;
                    if pad == Pad::None {
                        field.length = None;
                        self.pos = None;
                    }
                    field.pad = Some(pad);
                }
                "case" => {
                    field.case = match value {
                        "lc" => MonthCase::Lower,
                        "cap" => MonthCase::Capitalized,
                        "uc" => MonthCase::Upper,
                        _ => return Err(bad_value(name, value)),
                    };
                }
                "fmt" => field.full_name = value == "full",
                "div" if !field.code.is_handler() => {
                    let div = value
                        .parse::<f64>()
                        .ok()
                        .filter(|d| (1.0..=f64::from(i32::MAX)).contains(d))
                        .ok_or_else(|| bad_value(name, value))? as i32;
                    field.div = div;
                    if let Some(len) = field.length {
                        let dropped = div.ilog10() as usize;
                        field.length = Some(len.saturating_sub(dropped).max(1));
                        self.no_stop_carry = true;
                    }
                }
                "len" => {
                    let len = parse_int(name, value)?;
                    field.length = usize::try_from(len).ok().filter(|&l| l > 0);
                }
                "end" | "id" | "places" => {}
                _ if field.code.is_handler() => {}
                _ => tracing::warn!(code = %field.code, qualifier = name, "unrecognized qualifier ignored"),
            }
        }

        if field.code == FieldCode::MonthName && field.full_name {
            field.length = None;
        }
        Ok(span)
    }
}

/// Compile `spec` against `registry`.
pub(crate) fn compile(spec: &str, registry: &HandlerRegistry) -> Result<Template, CompileError> {
    let canonical = make_canonical(spec);
    if canonical != spec {
        tracing::debug!(from = spec, to = %canonical, "template made canonical");
    }

    let pieces = split_fields(&canonical);
    let mut delims = Vec::with_capacity(pieces.len());
    delims.push(pieces[0].clone());
    let mut raw_fields = Vec::with_capacity(pieces.len() - 1);
    for piece in &pieces[1..] {
        let (raw, delim) = split_piece(piece, &canonical)?;
        raw_fields.push(raw);
        delims.push(delim);
    }

    let mut c = Compiler::new(&canonical);
    let mut fields = Vec::with_capacity(raw_fields.len());
    let mut pattern = format!("^{}", regex::escape(&delims[0]));

    for (index, raw) in raw_fields.into_iter().enumerate() {
        if let Some(pos) = c.pos {
            c.pos = Some(pos + delims[index].len());
        }

        let code = match FieldCode::from_code(&raw.code) {
            Some(code) => code,
            None if registry.contains(&raw.code) => FieldCode::Handler(raw.code.clone()),
            None => {
                return Err(CompileError::UnknownFieldCode {
                    code: raw.code,
                    template: c.spec.to_string(),
                })
            }
        };
        match code {
            FieldCode::Hour => c.have_hour = true,
            FieldCode::AmPm if !c.have_hour => return Err(CompileError::AmPmWithoutHour),
            _ => {}
        }

        let length = match (raw.width, &code) {
            (w, _) if w > 0 => Some(w as usize),
            (0, code) if !code.is_handler() => code.default_length(),
            _ => None,
        };

        let handler = match &code {
            FieldCode::Handler(name) => {
                let mut handler = registry.create(name).ok_or_else(|| {
                    CompileError::UnknownFieldCode {
                        code: name.clone(),
                        template: c.spec.to_string(),
                    }
                })?;
                let args = raw
                    .qualifiers
                    .as_deref()
                    .map(parse_args)
                    .unwrap_or_else(HandlerArgs::new);
                handler
                    .configure(&args)
                    .map_err(|source| CompileError::Configure {
                        code: name.clone(),
                        source,
                    })?;
                Some(handler)
            }
            _ => None,
        };

        let mut field = Field {
            code,
            qualifiers: raw.qualifiers,
            offset: c.pos,
            length,
            pad: None,
            delta: 1,
            div: 1,
            case: MonthCase::default(),
            full_name: false,
            handler,
        };

        let span = if field.qualifiers.is_some() {
            c.qualifiers(index, &mut field)?
        } else {
            // a repeated unqualified field resets the multiplier:
            // T$y$(m,delta=4)/$x_T$y$m$d.DAT
            if field.code.precision() == Some(c.lsd) {
                c.lsd_mult = 1;
            }
            1
        };

        c.pos = match (c.pos, field.length) {
            (Some(pos), Some(len)) => Some(pos + len),
            _ => None,
        };

        if let Some(digit) = field.code.context_digit() {
            c.external_context = c.external_context.min(digit);
        }

        if let Some(precision) = field.code.precision() {
            if precision > c.lsd && c.lsd_mult == 1 {
                // omni2_h0_mrg1hr_$Y$(m,span=6)$d_v01.cdf: the $d is ignored
                c.set_lsd(precision, span.max(field.div));
            }
        }

        let fragment = match (field.handler.as_ref().and_then(|h| h.regex()), field.length) {
            (Some(re), _) => re,
            (None, Some(len)) => format!(".{{{len}}}"),
            (None, None) => ".*".to_string(),
        };
        pattern.push_str(&format!("({fragment})"));
        pattern.push_str(&regex::escape(&delims[index + 1]));

        tracing::trace!(code = %field.code, offset = ?field.offset, length = ?field.length, "field compiled");
        fields.push(field);
    }
    pattern.push('$');

    if !c.time_width_is_explicit {
        match c.lsd {
            lsd @ 0..=5 => c.time_width[lsd as usize] = c.lsd_mult,
            LSD_MILLI => c.time_width[NANOSECOND] = c.lsd_mult * 1_000_000,
            LSD_MICRO => c.time_width[NANOSECOND] = c.lsd_mult * 1_000,
            LSD_NANO => c.time_width[NANOSECOND] = c.lsd_mult,
            _ => c.time_width[YEAR] = NO_DATE_WIDTH_YEARS,
        }
    }

    if c.stop_time_field.is_none() && c.start_shift.is_some() {
        c.stop_shift = c.start_shift;
    }

    let regex = Regex::new(&pattern).map_err(|e| CompileError::Regex(e.to_string()))?;

    Ok(Template {
        spec: canonical.clone(),
        delims,
        fields,
        context: c.context,
        external_context: c.external_context,
        time_width: c.time_width,
        time_width_is_explicit: c.time_width_is_explicit,
        stop_time_field: c.stop_time_field,
        start_shift: c.start_shift,
        stop_shift: c.stop_shift,
        phasestart: c.phasestart,
        two_digit_year_start: c.two_digit_year_start,
        no_stop_carry: c.no_stop_carry,
        regex,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_default(spec: &str) -> Template {
        compile(spec, &HandlerRegistry::default()).unwrap()
    }

    #[test]
    fn test_offsets_and_lengths() {
        let t = compile_default("data_$Y_$j.dat");
        let offsets: Vec<_> = t.fields.iter().map(|f| f.offset).collect();
        let lengths: Vec<_> = t.fields.iter().map(|f| f.length).collect();
        assert_eq!(offsets, vec![Some(5), Some(10)]);
        assert_eq!(lengths, vec![Some(4), Some(3)]);
        assert_eq!(t.delims, vec!["data_", "_", ".dat"]);
    }

    #[test]
    fn test_unknown_length_poisons_offsets() {
        let t = compile_default("$x_$Y$m");
        let offsets: Vec<_> = t.fields.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![Some(0), None, None]);
        assert_eq!(t.fields[0].length, None);
        assert_eq!(t.fields[1].length, Some(4));
    }

    #[test]
    fn test_explicit_width() {
        let t = compile_default("$5Y $-1m");
        assert_eq!(t.fields[0].length, Some(5));
        assert_eq!(t.fields[1].length, None);
    }

    #[test]
    fn test_implied_granularity() {
        assert_eq!(compile_default("$Y").time_width, [1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(compile_default("$Y$m").time_width, [0, 1, 0, 0, 0, 0, 0]);
        assert_eq!(compile_default("$Y$j").time_width, [0, 0, 1, 0, 0, 0, 0]);
        assert_eq!(compile_default("$Y$m$dT$H$M").time_width, [0, 0, 0, 0, 1, 0, 0]);
        assert_eq!(compile_default("$Y$m$d_$(milli)").time_width, [0, 0, 0, 0, 0, 0, 1_000_000]);
        assert_eq!(compile_default("$x.dat").time_width, [8000, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            compile_default("omni_$Y$(m;span=6)$d.cdf").time_width,
            [0, 6, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_period_qualifier() {
        let t = compile_default("$Y$m$(d;period=P3D)");
        assert_eq!(t.time_width, [0, 0, 3, 0, 0, 0, 0]);
        let t = compile_default("$Y$m$d$(H;period=6H)");
        assert_eq!(t.time_width, [0, 0, 0, 6, 0, 0, 0]);
    }

    #[test]
    fn test_span_with_unit() {
        let t = compile_default("$Y$m$(d;span=12H)");
        assert!(t.time_width_is_explicit);
        assert_eq!(t.time_width, [0, 0, 0, 12, 0, 0, 0]);
    }

    #[test]
    fn test_external_context() {
        assert_eq!(compile_default("$Y$m$d").external_context, 0);
        assert_eq!(compile_default("$j.dat").external_context, 1);
        assert_eq!(compile_default("$d.dat").external_context, 2);
        assert_eq!(compile_default("$(j;Y=2012)").external_context, 0);
        assert_eq!(compile_default("$(j;Y=2012)").context[YEAR], 2012);
        assert_eq!(compile_default("$y$b").external_context, 0);
    }

    #[test]
    fn test_shift_and_end() {
        let t = compile_default("$Y$m$d-$(Y;end)$m$(d;shift=1)");
        assert_eq!(t.stop_time_field, Some(3));
        assert_eq!(t.start_shift, None);
        assert_eq!(t.stop_shift, Some([0, 0, 1, 0, 0, 0, 0]));

        let t = compile_default("$Y$m$(d;shift=-2H)");
        assert_eq!(t.start_shift, Some([0, 0, 0, -2, 0, 0, 0]));
        assert_eq!(t.stop_shift, t.start_shift);

        let t = compile_default("$Y$m$d_$(d;shift=1;end)");
        assert_eq!(t.stop_time_field, Some(3));
        assert_eq!(t.stop_shift, Some([0, 0, 1, 0, 0, 0, 0]));
    }

    #[test]
    fn test_compile_errors() {
        let registry = HandlerRegistry::default();
        assert!(matches!(
            compile("$Q", &registry),
            Err(CompileError::UnknownFieldCode { .. })
        ));
        assert!(matches!(compile("$(Y;end", &registry), Err(CompileError::UnmatchedParen(_))));
        assert!(matches!(
            compile("$(j;Y)", &registry),
            Err(CompileError::UnassignedContext(_))
        ));
        assert!(matches!(
            compile("$(j;Y=abc)", &registry),
            Err(CompileError::BadQualifierValue { .. })
        ));
        assert!(matches!(compile("$p$H", &registry), Err(CompileError::AmPmWithoutHour)));
        assert!(matches!(compile("$(y;shift=)", &registry), Err(CompileError::EmptyShift(_))));
        assert!(matches!(compile("$(y;shift=1)", &registry), Err(CompileError::NoUnit(_))));
        assert!(matches!(compile("$(m;pad=zig)", &registry), Err(CompileError::BadQualifierValue { .. })));
        assert!(matches!(
            compile("$(subsec;places=12)", &registry),
            Err(CompileError::Configure { .. })
        ));
        assert!(matches!(
            compile("$(enum)", &HandlerRegistry::empty()),
            Err(CompileError::UnknownFieldCode { .. })
        ));
    }

    #[test]
    fn test_pad_none_makes_field_variable() {
        let t = compile_default("$y $(m;pad=none) $(d;pad=none)");
        assert_eq!(t.fields[1].length, None);
        assert_eq!(t.fields[1].pad, Some(Pad::None));
        assert_eq!(t.fields[2].offset, None);
    }

    #[test]
    fn test_month_name_qualifiers() {
        let t = compile_default("$(b;fmt=full;case=uc)");
        assert!(t.fields[0].full_name);
        assert_eq!(t.fields[0].case, MonthCase::Upper);
        assert_eq!(t.fields[0].length, None);
        assert_eq!(compile_default("$b").fields[0].length, Some(3));
    }

    #[test]
    fn test_two_digit_year_start() {
        assert_eq!(compile_default("$y").two_digit_year_start, 1950);
        assert_eq!(compile_default("$(y;start=2000)").two_digit_year_start, 2000);
    }

    #[test]
    fn test_div_shortens_field_and_widens_step() {
        let t = compile_default("$Y$(j;div=100)XX");
        assert_eq!(t.fields()[1].length(), Some(1));
        assert_eq!(t.time_width(), &[0, 0, 100, 0, 0, 0, 0]);
        assert!(!t.time_width_is_explicit());
        assert!(t.no_stop_carry);
        assert_eq!(t.regex(), r"^(.{4})(.{1})XX$");

        let t = compile_default("$Y$(j;div=100)XX/$j");
        assert_eq!(t.fields()[2].offset(), Some(8));
        assert_eq!(t.time_width(), &[0, 0, 1, 0, 0, 0, 0]);

        assert!(matches!(
            compile("$Y$(j;div=0)", &HandlerRegistry::default()),
            Err(CompileError::BadQualifierValue { .. })
        ));
    }

    #[test]
    fn test_field_code_table() {
        for code in ["Y", "y", "j", "m", "d", "H", "M", "S", "milli", "micro", "p", "z", "ignore", "b"] {
            assert_eq!(FieldCode::from_code(code).unwrap().code(), code);
        }
        assert_eq!(FieldCode::from_code("x"), None);
        assert_eq!(FieldCode::Zone.default_length(), Some(5));
        assert_eq!(FieldCode::Ignore.default_length(), None);
    }
}
