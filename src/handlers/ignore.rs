// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! `$x`, `*` and `$(x;name=sc;regex=[ab])`: content that carries no time.
//!
//! A named field is recorded in the extras and can be formatted back from
//! them; an unnamed one is a wildcard and cannot be formatted.

use regex::Regex;

use super::{invalid, warn_unknown, Extras, FieldHandler, HandlerArgs};
use crate::calendar::{DecomposedTime, Duration};
use crate::error::HandlerError;

const UNNAMED: &str = "unnamed";

#[derive(Debug, Clone, Default)]
pub struct IgnoreFieldHandler {
    regex: Option<String>,
    pattern: Option<Regex>,
    name: Option<String>,
    trim_underscores: bool,
}

impl IgnoreFieldHandler {
    /// Extras key for the matched text, if the field is named.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl FieldHandler for IgnoreFieldHandler {
    fn configure(&mut self, args: &HandlerArgs) -> Result<(), HandlerError> {
        warn_unknown("x", args, &["regex", "name", "enum"]);
        if let Some(re) = args.get("regex") {
            let pattern = Regex::new(&format!("^(?:{re})"))
                .map_err(|e| invalid("regex", re, e.to_string()))?;
            self.pattern = Some(pattern);
            self.regex = Some(re.clone());
        }
        self.name = args
            .get("name")
            .filter(|n| n.as_str() != UNNAMED)
            .cloned();
        self.trim_underscores = matches!(
            args.get("pad").map(String::as_str),
            Some("_" | "underscore")
        );
        Ok(())
    }

    fn regex(&self) -> Option<String> {
        self.regex.clone()
    }

    fn parse(
        &self,
        field: &str,
        _start: &mut DecomposedTime,
        _width: &mut Duration,
        extras: &mut Extras,
    ) -> Result<(), HandlerError> {
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(field) {
                return Err(HandlerError::Rejected {
                    value: field.to_string(),
                    reason: format!("does not match regex {}", pattern.as_str()),
                });
            }
        }
        let content = if self.trim_underscores {
            field.trim_matches('_')
        } else {
            field
        };
        if let Some(name) = &self.name {
            extras.insert(name.clone(), content.to_string());
        }
        Ok(())
    }

    fn format(
        &self,
        _start: &DecomposedTime,
        _width: &Duration,
        _length: Option<usize>,
        extras: &Extras,
    ) -> Result<String, HandlerError> {
        let name = self.name.as_ref().ok_or_else(|| {
            HandlerError::Unformattable("an unnamed wildcard cannot be formatted".into())
        })?;
        extras
            .get(name)
            .cloned()
            .ok_or_else(|| HandlerError::Unformattable(format!("\"{name}\" is undefined in extras")))
    }
}
