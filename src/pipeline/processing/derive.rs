//! Derivation of analytic columns from the joined catalog.
//!
//! Steps run in a fixed order: rename to analytic names, default-fill links
//! and age label, drop placeholder titles, parse the age floor, normalize the
//! ten axis ratings, mirror negative axes, count contributing axes, drop rows
//! missing required fields, and finally compute the aggregate score.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::constants::{DEFAULT_AGE_LABEL, DEFAULT_LINK_URL};
use crate::metrics::DerivationMetrics;
use crate::pipeline::processing::joiner::{JoinedRow, JoinedTable};
use crate::types::{Axis, AxisClass, AxisScores, NormalizedScores, Table, TitleRecord};

/// Clamp a raw rating into the published scale; anything outside `1..=5`
/// (including a missing value) means "not assessed".
pub fn normalize_score(raw: Option<i64>) -> u8 {
    match raw {
        Some(v @ 1..=5) => v as u8,
        _ => 0,
    }
}

/// Mirror a negative-class rating so that 5 is always the desirable end.
/// Unassessed (0) stays 0.
pub fn invert_score(value: u8) -> u8 {
    match value {
        1..=5 => 6 - value,
        _ => 0,
    }
}

fn age_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*age\s+(\d+)\s*\+\s*$").expect("static regex"))
}

/// `"age 13+"` becomes 13; a missing or unrecognized label becomes 0.
pub fn parse_age(label: Option<&str>) -> u32 {
    let Some(label) = label else {
        return 0;
    };
    if let Some(caps) = age_pattern().captures(label) {
        return caps[1].parse().unwrap_or(0);
    }
    label.trim().parse().unwrap_or(0)
}

/// Accepts `"2001"` as well as the float form `"2001.0"` some exports emit.
pub fn parse_release_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Ok(year) = raw.parse::<i32>() {
        return Some(year);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i32::MAX as f64 => Some(f as i32),
        _ => None,
    }
}

pub fn normalize_scores(raw: &AxisScores) -> NormalizedScores {
    let mut out = NormalizedScores::default();
    for axis in Axis::ALL {
        out.set(axis, normalize_score(raw.get(axis)));
    }
    out
}

pub fn inverted_scores(scores: &NormalizedScores) -> BTreeMap<Axis, u8> {
    Axis::ALL
        .into_iter()
        .filter(|a| a.class() == AxisClass::Negative)
        .map(|a| (a, invert_score(scores.get(a))))
        .collect()
}

/// Number of assessed axes plus one; the extra one keeps unrated titles from
/// dividing by zero.
pub fn contributing_axes(scores: &NormalizedScores) -> u32 {
    scores.iter().filter(|(_, v)| *v != 0).count() as u32 + 1
}

/// One decimal, ties to even: 3.25 becomes 3.2.
fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Positive ratings plus mirrored negative ratings, over contributing axes.
pub fn aggregate_score(scores: &NormalizedScores, inverted: &BTreeMap<Axis, u8>, non_zero: u32) -> f64 {
    let total: u32 = Axis::ALL
        .into_iter()
        .map(|axis| match axis.class() {
            AxisClass::Positive => scores.get(axis) as u32,
            AxisClass::Negative => inverted.get(&axis).copied().unwrap_or(0) as u32,
        })
        .sum();
    round1(total as f64 / non_zero as f64)
}

enum Dropped {
    Placeholder,
    MissingField(&'static str),
    BadYear,
}

impl Dropped {
    fn reason(&self) -> &'static str {
        match self {
            Dropped::Placeholder => "placeholder_title",
            Dropped::MissingField(_) => "missing_field",
            Dropped::BadYear => "bad_release_year",
        }
    }
}

fn derive_row(row: JoinedRow) -> Result<TitleRecord, Dropped> {
    let JoinedRow {
        catalog,
        issue_scores,
        social_issue,
        match_score,
    } = row;

    let hbo_url = catalog.hbogo_url.unwrap_or_else(|| DEFAULT_LINK_URL.to_string());
    let movie_trailer_url = catalog
        .movie_trailer_url
        .unwrap_or_else(|| DEFAULT_LINK_URL.to_string());
    if catalog.title.as_deref().map_or(false, |t| t.contains('{')) {
        return Err(Dropped::Placeholder);
    }

    let age_number = parse_age(catalog.age_child.as_deref());
    let age_child = catalog.age_child.unwrap_or_else(|| DEFAULT_AGE_LABEL.to_string());

    let scores = normalize_scores(&catalog.scores);
    let inverted = inverted_scores(&scores);
    let non_zero_scores = contributing_axes(&scores);

    let title = catalog.title.ok_or(Dropped::MissingField("title"))?;
    let summary = catalog.short_desc.ok_or(Dropped::MissingField("summary"))?;
    let poster = catalog.poster.ok_or(Dropped::MissingField("poster"))?;
    let raw_year = catalog
        .release_year
        .ok_or(Dropped::MissingField("release_year"))?;
    let original_release_year = parse_release_year(&raw_year).ok_or(Dropped::BadYear)?;

    let scored_issues = issue_scores
        .iter()
        .filter(|(_, v)| v.is_finite())
        .map(|(column, _)| column.clone())
        .collect();
    let issue_scores = issue_scores
        .into_iter()
        .map(|(column, v)| (column, if v.is_finite() { v } else { 0.0 }))
        .collect();

    let avg_score = aggregate_score(&scores, &inverted, non_zero_scores);

    Ok(TitleRecord {
        imdb_id: catalog.imdb_id,
        title,
        summary,
        original_release_year,
        age_child,
        age_number,
        poster,
        hbo_url,
        movie_trailer_url,
        scores,
        inverted,
        non_zero_scores,
        avg_score,
        issue_scores,
        scored_issues,
        social_issue,
        match_score,
    })
}

/// Turn the joined catalog into the analytic table. Rows that cannot be
/// derived are dropped; survivors keep their catalog order.
pub fn derive_table(joined: JoinedTable) -> Table {
    let input = joined.rows.len();
    let mut rows = Vec::with_capacity(input);
    for row in joined.rows {
        let imdb_id = row.catalog.imdb_id;
        match derive_row(row) {
            Ok(record) => rows.push(record),
            Err(dropped) => {
                if let Dropped::MissingField(field) = &dropped {
                    debug!(imdb_id, field, "Dropping row missing a required field");
                } else {
                    debug!(imdb_id, reason = dropped.reason(), "Dropping row");
                }
                DerivationMetrics::record_row_dropped(dropped.reason());
            }
        }
    }

    info!(input, output = rows.len(), "Derived analytic table");
    DerivationMetrics::record_rows_derived(rows.len());
    Table {
        issue_columns: joined.issue_columns,
        rows,
    }
}
