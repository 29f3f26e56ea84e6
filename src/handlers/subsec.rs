// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! `$(subsec;places=N)`: fixed-width fractional seconds.
//!
//! With `places=3`, `"245"` is 245 ms and the interval it denotes is one
//! millisecond wide.

use super::{invalid, required, warn_unknown, Extras, FieldHandler, HandlerArgs};
use crate::calendar::{DecomposedTime, Duration, NANOSECOND, SECOND};
use crate::error::HandlerError;

#[derive(Debug, Default, Clone)]
pub struct SubsecFieldHandler {
    places: usize,
    nanoseconds_factor: i32,
}

impl FieldHandler for SubsecFieldHandler {
    fn configure(&mut self, args: &HandlerArgs) -> Result<(), HandlerError> {
        warn_unknown("subsec", args, &["places"]);
        let value = required(args, "places")?;
        let places: usize = value
            .parse()
            .map_err(|_| invalid("places", value, "expected an integer"))?;
        if !(1..=9).contains(&places) {
            return Err(invalid("places", value, "only one to nine places allowed"));
        }
        self.places = places;
        self.nanoseconds_factor = 10_i32.pow(9 - places as u32);
        Ok(())
    }

    fn regex(&self) -> Option<String> {
        Some(format!("[0-9]{{{}}}", self.places))
    }

    fn parse(
        &self,
        field: &str,
        start: &mut DecomposedTime,
        width: &mut Duration,
        _extras: &mut Extras,
    ) -> Result<(), HandlerError> {
        let rejected = || HandlerError::Rejected {
            value: field.to_string(),
            reason: format!("expected {} digits", self.places),
        };
        let value: i32 = field.trim().parse().map_err(|_| rejected())?;
        start[NANOSECOND] = value
            .checked_mul(self.nanoseconds_factor)
            .ok_or_else(rejected)?;
        width[SECOND] = 0;
        width[NANOSECOND] = self.nanoseconds_factor;
        Ok(())
    }

    fn format(
        &self,
        start: &DecomposedTime,
        _width: &Duration,
        _length: Option<usize>,
        _extras: &Extras,
    ) -> Result<String, HandlerError> {
        // truncate so the digits name the interval containing `start`
        let value = start[NANOSECOND] / self.nanoseconds_factor;
        Ok(format!("{:0width$}", value, width = self.places))
    }
}
