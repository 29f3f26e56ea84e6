// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! `$(enum;values=a,b,c;id=sc)`: one of a closed set of strings, recorded in
//! the extras under `id`.

use super::{required, warn_unknown, Extras, FieldHandler, HandlerArgs};
use crate::calendar::{DecomposedTime, Duration};
use crate::error::HandlerError;

const DEFAULT_ID: &str = "unindentifiedEnum";

#[derive(Debug, Clone)]
pub struct EnumFieldHandler {
    values: Vec<String>,
    id: String,
}

impl Default for EnumFieldHandler {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            id: DEFAULT_ID.to_string(),
        }
    }
}

impl EnumFieldHandler {
    /// The accepted values, in template order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Extras key under which the parsed value is stored.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl FieldHandler for EnumFieldHandler {
    fn configure(&mut self, args: &HandlerArgs) -> Result<(), HandlerError> {
        warn_unknown("enum", args, &["values"]);
        let values = required(args, "values")?;
        let mut split: Vec<&str> = values.split(',').collect();
        if split.len() == 1 && values.contains('|') {
            tracing::debug!(values = %values, "legacy pipe-separated enum values");
            split = values.split('|').collect();
        }
        self.values = split.into_iter().map(str::to_string).collect();
        if let Some(id) = args.get("id") {
            self.id = id.clone();
        }
        Ok(())
    }

    fn regex(&self) -> Option<String> {
        let alternatives: Vec<String> = self.values.iter().map(|v| regex::escape(v)).collect();
        Some(alternatives.join("|"))
    }

    fn parse(
        &self,
        field: &str,
        _start: &mut DecomposedTime,
        _width: &mut Duration,
        extras: &mut Extras,
    ) -> Result<(), HandlerError> {
        if !self.values.iter().any(|v| v == field) {
            return Err(HandlerError::Rejected {
                value: field.to_string(),
                reason: format!("value is not in enum {}", self.values.join(",")),
            });
        }
        extras.insert(self.id.clone(), field.to_string());
        Ok(())
    }

    fn format(
        &self,
        _start: &DecomposedTime,
        _width: &Duration,
        _length: Option<usize>,
        extras: &Extras,
    ) -> Result<String, HandlerError> {
        let value = extras.get(&self.id).ok_or_else(|| {
            HandlerError::Unformattable(format!("\"{}\" is undefined in extras", self.id))
        })?;
        if self.values.contains(value) {
            Ok(value.clone())
        } else {
            Err(HandlerError::Unformattable(format!(
                "{} value \"{value}\" is not within enum {}",
                self.id,
                self.values.join(",")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::parse_args;

    #[test]
    fn test_parse_records_id() {
        let mut h = EnumFieldHandler::default();
        h.configure(&parse_args("values=a,b,c,d;id=sc")).unwrap();
        let mut extras = Extras::new();
        h.parse("d", &mut [0; 7], &mut [0; 7], &mut extras).unwrap();
        assert_eq!(extras["sc"], "d");
        assert!(h.parse("e", &mut [0; 7], &mut [0; 7], &mut extras).is_err());
    }

    #[test]
    fn test_default_id_and_pipes() {
        let mut h = EnumFieldHandler::default();
        h.configure(&parse_args("values=rbspa|rbspb")).unwrap();
        assert_eq!(h.values(), ["rbspa", "rbspb"]);
        assert_eq!(h.id(), "unindentifiedEnum");
        assert_eq!(h.regex().as_deref(), Some("rbspa|rbspb"));
    }

    #[test]
    fn test_format() {
        let mut h = EnumFieldHandler::default();
        h.configure(&parse_args("values=a,b;id=sc")).unwrap();
        let mut extras = Extras::new();
        assert!(h.format(&[0; 7], &[0; 7], None, &extras).is_err());
        extras.insert("sc".into(), "c".into());
        assert!(h.format(&[0; 7], &[0; 7], None, &extras).is_err());
        extras.insert("sc".into(), "b".into());
        assert_eq!(h.format(&[0; 7], &[0; 7], None, &extras).unwrap(), "b");
    }
}
