//! Typed decoding of the scraped `scores` column.
//!
//! The scraper writes each title's content grid as a serialized mapping
//! literal, e.g. `{'Violence': '3', 'Drinking, Drugs & Smoking': '2'}`.
//! The blob is decoded here into [`AxisScores`] and never travels further
//! down the pipeline in its untyped form.

use tracing::debug;

use crate::types::{Axis, AxisScores};

/// Decode a `scores` cell. Missing or malformed blobs decode to all-missing.
pub fn decode_scores(blob: Option<&str>) -> AxisScores {
    let mut scores = AxisScores::default();
    let Some(blob) = blob else {
        return scores;
    };
    match parse_mapping(blob) {
        Some(entries) => {
            for (label, value) in entries {
                match Axis::from_source_label(&label) {
                    Some(axis) => scores.set(axis, value),
                    None => debug!(label = %label, "Ignoring unknown score axis"),
                }
            }
        }
        None => debug!(blob = %blob, "Score blob is not a mapping literal"),
    }
    scores
}

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn eat(&mut self, want: char) -> bool {
        self.skip_ws();
        if self.chars.peek() == Some(&want) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn quoted(&mut self) -> Option<String> {
        self.skip_ws();
        let quote = match self.chars.next()? {
            q @ ('\'' | '"') => q,
            _ => return None,
        };
        let mut out = String::new();
        loop {
            match self.chars.next()? {
                '\\' => out.push(self.chars.next()?),
                c if c == quote => return Some(out),
                c => out.push(c),
            }
        }
    }

    fn bare(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c == ',' || c == '}' {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        out.trim().to_string()
    }

    fn value(&mut self) -> Option<Option<i64>> {
        self.skip_ws();
        let raw = match *self.chars.peek()? {
            '\'' | '"' => self.quoted()?,
            _ => self.bare(),
        };
        Some(parse_rating(&raw))
    }
}

/// Parse a flat `{key: value, ...}` literal; `None` if it is not one.
fn parse_mapping(text: &str) -> Option<Vec<(String, Option<i64>)>> {
    let mut cur = Cursor::new(text);
    if !cur.eat('{') {
        return None;
    }
    let mut entries = Vec::new();
    if cur.eat('}') {
        return Some(entries);
    }
    loop {
        let key = cur.quoted()?;
        if !cur.eat(':') {
            return None;
        }
        let value = cur.value()?;
        entries.push((key, value));
        if cur.eat(',') {
            // tolerate a trailing comma before the closing brace
            if cur.eat('}') {
                break;
            }
            continue;
        }
        if cur.eat('}') {
            break;
        }
        return None;
    }
    Some(entries)
}

/// Integral ratings only; `"3"`, `3` and `3.0` are all 3.
fn parse_rating(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
        _ => None,
    }
}
