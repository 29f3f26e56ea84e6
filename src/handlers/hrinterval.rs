// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! `$(hrinterval;names=a,b,c,d)`: named equal partitions of the day.
//!
//! Four names split the day into six-hour intervals, so `"b"` is
//! `06:00/12:00`.

use super::{warn_unknown, Extras, FieldHandler, HandlerArgs};
use crate::calendar::{DecomposedTime, Duration, DAY, HOUR, MONTH, YEAR};
use crate::error::HandlerError;

#[derive(Debug, Default, Clone)]
pub struct HrintervalFieldHandler {
    names: Vec<String>,
    /// Hours per interval.
    mult: i32,
}

impl FieldHandler for HrintervalFieldHandler {
    fn configure(&mut self, args: &HandlerArgs) -> Result<(), HandlerError> {
        warn_unknown("hrinterval", args, &["values", "names"]);
        let (name, list) = match (args.get("values"), args.get("names")) {
            (Some(v), _) => ("values", v),
            (None, Some(n)) => ("names", n),
            (None, None) => return Err(HandlerError::MissingArgument("values")),
        };
        let names: Vec<String> = list.split(',').map(str::to_string).collect();
        let count = names.len() as i32;
        if 24 % count != 0 {
            return Err(super::invalid(
                name,
                list,
                "only 1,2,3,4,6,8 or 12 intervals",
            ));
        }
        self.mult = 24 / count;
        self.names = names;
        Ok(())
    }

    fn regex(&self) -> Option<String> {
        let alternatives: Vec<String> = self.names.iter().map(|n| regex::escape(n)).collect();
        Some(alternatives.join("|"))
    }

    fn parse(
        &self,
        field: &str,
        start: &mut DecomposedTime,
        width: &mut Duration,
        _extras: &mut Extras,
    ) -> Result<(), HandlerError> {
        let index = self
            .names
            .iter()
            .position(|n| n == field)
            .ok_or_else(|| HandlerError::Rejected {
                value: field.to_string(),
                reason: format!("expected one of {}", self.names.join(",")),
            })?;
        start[HOUR] = self.mult * index as i32;
        width[YEAR] = 0;
        width[MONTH] = 0;
        width[DAY] = 0;
        width[HOUR] = self.mult;
        Ok(())
    }

    fn format(
        &self,
        start: &DecomposedTime,
        _width: &Duration,
        _length: Option<usize>,
        _extras: &Extras,
    ) -> Result<String, HandlerError> {
        let hour = start[HOUR];
        if hour % self.mult != 0 {
            return Err(HandlerError::Unformattable(format!(
                "hour {hour} is not on a {}-hour boundary",
                self.mult
            )));
        }
        usize::try_from(hour / self.mult)
            .ok()
            .and_then(|i| self.names.get(i))
            .cloned()
            .ok_or_else(|| HandlerError::Unformattable(format!("no interval for hour {hour}")))
    }
}
