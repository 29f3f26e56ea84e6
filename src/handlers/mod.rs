// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Field handlers.
//!
//! Template fields that are not one of the fixed numeric codes (`$Y`, `$j`,
//! …) are delegated to a [`FieldHandler`]. A handler is configured once from
//! the field's qualifiers and is then asked to `parse` a substring into the
//! running start time and width, or to `format` a time back into a substring.
//!
//! Handlers are created per field from a [`HandlerRegistry`] of factories, so
//! two `$(enum;…)` fields in one template never share state.
//!
//! | Name | Handler | Example |
//! |------|---------|---------|
//! | `subsec` | [`SubsecFieldHandler`] | `$(subsec;places=3)` |
//! | `hrinterval` | [`HrintervalFieldHandler`] | `$(hrinterval;names=a,b,c,d)` |
//! | `periodic` | [`PeriodicFieldHandler`] | `$(periodic;offset=0;start=2000-001;period=P1D)` |
//! | `enum` | [`EnumFieldHandler`] | `$(enum;values=a,b,c;id=sc)` |
//! | `x` | [`IgnoreFieldHandler`] | `$(x;name=sc;regex=[ab])` |
//! | `v` | [`VersionFieldHandler`] | `$(v;sep)` |

mod enumeration;
mod hrinterval;
mod ignore;
mod periodic;
mod subsec;
mod version;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::calendar::{DecomposedTime, Duration};
use crate::error::HandlerError;

pub use enumeration::EnumFieldHandler;
pub use hrinterval::HrintervalFieldHandler;
pub use ignore::IgnoreFieldHandler;
pub use periodic::PeriodicFieldHandler;
pub use subsec::SubsecFieldHandler;
pub use version::{VersionFieldHandler, VersioningType};

/// Qualifiers of one field, `name → value`. Bare flags map to `""`.
pub type HandlerArgs = BTreeMap<String, String>;

/// Named values carried alongside a time range (`sc`, `v`, …).
pub type Extras = HashMap<String, String>;

/// Qualifiers interpreted by the template itself; handlers never warn about
/// these.
const TEMPLATE_QUALIFIERS: &[&str] = &["id", "pad", "len", "end", "shift"];

/// Capability interface of a custom template field.
pub trait FieldHandler: fmt::Debug + Send + Sync {
    /// Apply the field's qualifiers. Called exactly once, at compile time.
    fn configure(&mut self, args: &HandlerArgs) -> Result<(), HandlerError>;

    /// A regular expression matching valid field contents, or `None` to
    /// match anything.
    fn regex(&self) -> Option<String>;

    /// Interpret `field`, updating the start time, the width of the interval
    /// it denotes, and any named extras.
    fn parse(
        &self,
        field: &str,
        start: &mut DecomposedTime,
        width: &mut Duration,
        extras: &mut Extras,
    ) -> Result<(), HandlerError>;

    /// Render the field for `start`. `length` is the fixed field length when
    /// the template knows it.
    fn format(
        &self,
        start: &DecomposedTime,
        width: &Duration,
        length: Option<usize>,
        extras: &Extras,
    ) -> Result<String, HandlerError>;
}

/// Split a `;`-separated qualifier list into [`HandlerArgs`].
///
/// ```
/// use timetemplates::handlers::parse_args;
/// let args = parse_args("values=a,b;id=sc;sep");
/// assert_eq!(args["values"], "a,b");
/// assert_eq!(args["sep"], "");
/// ```
pub fn parse_args(qualifiers: &str) -> HandlerArgs {
    qualifiers
        .split(';')
        .map(|q| match q.split_once('=') {
            Some((name, value)) => (name.trim().to_string(), value.trim().to_string()),
            None => (q.trim().to_string(), String::new()),
        })
        .collect()
}

pub(crate) fn required<'a>(
    args: &'a HandlerArgs,
    name: &'static str,
) -> Result<&'a str, HandlerError> {
    args.get(name)
        .map(String::as_str)
        .ok_or(HandlerError::MissingArgument(name))
}

pub(crate) fn invalid(name: &str, value: &str, reason: impl Into<String>) -> HandlerError {
    HandlerError::InvalidArgument {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Log qualifiers that neither the handler nor the template understands.
pub(crate) fn warn_unknown(handler: &str, args: &HandlerArgs, known: &[&str]) {
    for name in args.keys() {
        if name.is_empty() || known.contains(&name.as_str()) {
            continue;
        }
        if TEMPLATE_QUALIFIERS.contains(&name.as_str()) {
            continue;
        }
        tracing::warn!(handler, qualifier = %name, "unrecognized qualifier ignored");
    }
}

/// Factory producing a freshly configured-to-be handler.
pub type HandlerFactory = Arc<dyn Fn() -> Box<dyn FieldHandler> + Send + Sync>;

/// Named factories used by the template compiler to resolve non-numeric
/// field codes.
///
/// `HandlerRegistry::default()` knows the six built-in handlers; custom ones
/// are added with [`register`](Self::register) or
/// [`with_handler`](Self::with_handler).
#[derive(Clone)]
pub struct HandlerRegistry {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerRegistry {
    /// A registry without any handlers.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register (or replace) the factory for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn FieldHandler> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_handler<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn FieldHandler> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    /// A new, unconfigured handler for `name`.
    pub fn create(&self, name: &str) -> Option<Box<dyn FieldHandler>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered handler names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::empty()
            .with_handler("subsec", || Box::<SubsecFieldHandler>::default())
            .with_handler("hrinterval", || Box::<HrintervalFieldHandler>::default())
            .with_handler("periodic", || Box::<PeriodicFieldHandler>::default())
            .with_handler("enum", || Box::<EnumFieldHandler>::default())
            .with_handler("x", || Box::<IgnoreFieldHandler>::default())
            .with_handler("v", || Box::<VersionFieldHandler>::default())
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
