// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Rewriting of legacy template dialects into the canonical `$code` /
//! `$(code;qualifier;…)` form, and splitting on field markers.

use once_cell::sync::Lazy;
use regex::Regex;

static OLD_WIDTH_BRACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([0-9]+)\{").expect("width brace pattern is valid"));

/// Convert `%{…}`, `${…}`, `$5{…}` and `*` into canonical form.
///
/// ```
/// use timetemplates::template::make_canonical;
/// assert_eq!(make_canonical("%{Y,m=02}*.dat"), "$(Y;m=02)$x.dat");
/// assert_eq!(make_canonical("$Y$m$d.dat"), "$Y$m$d.dat");
/// ```
pub fn make_canonical(spec: &str) -> String {
    let wildcard = spec.contains('*');
    let old_spec = spec.contains("${");
    let old_spec2 = OLD_WIDTH_BRACE.is_match(spec);
    if spec.starts_with('$') && !wildcard && !old_spec && !old_spec2 {
        return spec.to_string();
    }

    let mut s = spec.to_string();
    if s.contains('%') && !s.contains('$') {
        s = s.replace('%', "$");
    }
    if s.contains("${") && !s.contains("$(") {
        s = s.replace("${", "$(").replace('}', ")");
    }
    if old_spec2 && !s.contains("$(") {
        s = OLD_WIDTH_BRACE.replace_all(&s, "$$${1}(").replace('}', ")");
    }
    if wildcard {
        s = s.replace('*', "$x");
    }

    // the leading group may still use commas: $(Y,m=02)
    if s.starts_with('$') {
        let bytes = s.as_bytes();
        let mut i = 1;
        if bytes.get(i) == Some(&b'(') {
            i += 1;
        }
        while bytes.get(i).is_some_and(u8::is_ascii_alphabetic) {
            i += 1;
        }
        if bytes.get(i) == Some(&b',') {
            s.replace_range(i..=i, ";");
        }
    }
    s
}

/// Canonicalize the inside of one `(code,qualifiers)` group.
///
/// The first comma always separates the code from its qualifiers. Scanning
/// from the right, a later comma is a separator only when a `name=value`
/// follows it; otherwise it belongs to a value list, as in
/// `enum,values=01,02,03,id=foo` → `enum;values=01,02,03;id=foo`. A group
/// already using `;` is returned unchanged.
pub fn make_qualifiers_canonical(group: &str) -> String {
    let mut chars: Vec<char> = group.chars().collect();
    let Some(first) = chars.iter().position(|&c| c == ',' || c == ';') else {
        return group.to_string();
    };
    if chars[first] == ';' {
        return group.to_string();
    }
    chars[first] = ';';

    let mut expect_semi = false;
    for c in chars[first + 1..].iter_mut().rev() {
        match *c {
            '=' => expect_semi = true,
            ',' if expect_semi => {
                *c = ';';
                expect_semi = false;
            }
            ';' => expect_semi = false,
            _ => {}
        }
    }
    let canonical: String = chars.into_iter().collect();
    if canonical != group {
        tracing::debug!(from = group, to = %canonical, "qualifiers made canonical");
    }
    canonical
}

/// Split a canonical template on `$` field markers. The first element is
/// the literal text before the first field; `$$` is a literal dollar.
pub(crate) fn split_fields(spec: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut chars = spec.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            current.push(c);
        } else if chars.peek() == Some(&'$') {
            chars.next();
            current.push('$');
        } else {
            pieces.push(std::mem::take(&mut current));
        }
    }
    pieces.push(current);
    pieces
}
