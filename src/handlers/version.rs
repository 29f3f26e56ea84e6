// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! `$v`, `$(v;sep)`, `$(v;alpha)`: version tokens.
//!
//! Versions never affect the time range. Each `$v` appends its text to
//! `extras["v"]`, joined by `.` when a template has several, so
//! `v$v.$v` on `v1.5` records `"1.5"`. Callers pick the latest file using
//! [`VersioningType::compare`].

use std::cmp::Ordering;

use super::{invalid, warn_unknown, Extras, FieldHandler, HandlerArgs};
use crate::calendar::{DecomposedTime, Duration};
use crate::error::HandlerError;

const VERSION_KEY: &str = "v";
const DEFAULT_VERSION: &str = "00";

/// Sort order of version strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersioningType {
    /// Decimal numbers: `4.10 > 4.01`.
    #[default]
    Numeric,
    /// Plain string order: `a001 < a002`.
    Alphanumeric,
    /// Integer components split on `.` or `-`: `4.3.23`, `1.1.3-01`.
    NumericSplit,
}

impl VersioningType {
    /// Compare two version strings under this ordering.
    ///
    /// Components that are not numbers fall back to string order, so the
    /// comparison is total.
    ///
    /// ```
    /// use std::cmp::Ordering;
    /// use timetemplates::VersioningType;
    /// assert_eq!(VersioningType::NumericSplit.compare("4.3.23", "4.10.1"), Ordering::Less);
    /// assert_eq!(VersioningType::Numeric.compare("4.10", "4.01"), Ordering::Greater);
    /// ```
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Alphanumeric => a.cmp(b),
            Self::Numeric => match (a.parse::<f64>(), b.parse::<f64>()) {
                (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => a.cmp(b),
            },
            Self::NumericSplit => {
                let pa: Vec<&str> = a.split(['.', '-']).collect();
                let pb: Vec<&str> = b.split(['.', '-']).collect();
                for (x, y) in pa.iter().zip(&pb) {
                    let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                        (Ok(x), Ok(y)) => x.cmp(&y),
                        _ => x.cmp(y),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                pa.len().cmp(&pb.len())
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VersionFieldHandler {
    versioning_type: VersioningType,
    /// Inclusive lower bound.
    version_ge: Option<String>,
    /// Exclusive upper bound.
    version_lt: Option<String>,
}

impl VersionFieldHandler {
    pub fn versioning_type(&self) -> VersioningType {
        self.versioning_type
    }

    /// Whether `version` lies within the `ge`/`lt` bounds.
    ///
    /// A dotted numeric version such as `1.5.15` (as accumulated from several
    /// `$v` fields) is compared component-wise.
    pub fn accepts(&self, version: &str) -> bool {
        let ordering = match self.versioning_type {
            VersioningType::Numeric if version.matches('.').count() > 1 => {
                VersioningType::NumericSplit
            }
            t => t,
        };
        let above = self
            .version_ge
            .as_deref()
            .map_or(true, |ge| ordering.compare(version, ge) != Ordering::Less);
        let below = self
            .version_lt
            .as_deref()
            .map_or(true, |lt| ordering.compare(version, lt) == Ordering::Less);
        above && below
    }
}

impl FieldHandler for VersionFieldHandler {
    fn configure(&mut self, args: &HandlerArgs) -> Result<(), HandlerError> {
        warn_unknown(
            "v",
            args,
            &["sep", "separator", "dotnotation", "alpha", "alphanumeric", "type", "ge", "lt"],
        );
        for unsupported in ["gt", "le"] {
            if let Some(value) = args.get(unsupported) {
                return Err(invalid(unsupported, value, "not supported, must be ge or lt"));
            }
        }

        let mut sep = args.contains_key("sep")
            || args.contains_key("separator")
            || args.contains_key("dotnotation");
        let mut alpha = args.contains_key("alpha") || args.contains_key("alphanumeric");
        match args.get("type").map(String::as_str) {
            Some("sep" | "dotnotation") => sep = true,
            Some("alpha" | "alphanumeric") => alpha = true,
            Some(other) => return Err(invalid("type", other, "expected sep or alpha")),
            None => {}
        }

        self.versioning_type = match (alpha, sep) {
            (true, true) => {
                return Err(invalid("alpha", "", "alpha with split not supported"));
            }
            (true, false) => VersioningType::Alphanumeric,
            (false, true) => VersioningType::NumericSplit,
            (false, false) => VersioningType::Numeric,
        };
        self.version_ge = args.get("ge").cloned();
        self.version_lt = args.get("lt").cloned();
        Ok(())
    }

    fn regex(&self) -> Option<String> {
        Some(".*".into())
    }

    fn parse(
        &self,
        field: &str,
        _start: &mut DecomposedTime,
        _width: &mut Duration,
        extras: &mut Extras,
    ) -> Result<(), HandlerError> {
        let version = match extras.get(VERSION_KEY) {
            Some(previous) => format!("{previous}.{field}"),
            None => field.to_string(),
        };
        extras.insert(VERSION_KEY.to_string(), version);
        Ok(())
    }

    fn format(
        &self,
        _start: &DecomposedTime,
        _width: &Duration,
        length: Option<usize>,
        extras: &Extras,
    ) -> Result<String, HandlerError> {
        let version = extras
            .get(VERSION_KEY)
            .map_or(DEFAULT_VERSION, String::as_str);
        Ok(match length {
            Some(n) if n > version.len() => format!("{version:0>n$}"),
            _ => version.to_string(),
        })
    }
}
