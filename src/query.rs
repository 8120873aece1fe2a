//! Read-only lookups over a materialized [`Table`]: discovery filters,
//! per-issue rankings and the trending-topic table.

use std::cmp::Ordering;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::pipeline::ingestion::tabular::{Delim, Tabular};
use crate::pipeline::processing::issue_column;
use crate::types::{Axis, Table, TitleRecord};

/// Inclusive range filters. `None` admits every value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryFilter {
    pub release_year: Option<RangeInclusive<i32>>,
    pub avg_score: Option<RangeInclusive<f64>>,
    pub age: Option<RangeInclusive<u32>>,
    pub axes: [Option<RangeInclusive<u8>>; 10],
}

impl DiscoveryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release_year(mut self, range: RangeInclusive<i32>) -> Self {
        self.release_year = Some(range);
        self
    }

    pub fn avg_score(mut self, range: RangeInclusive<f64>) -> Self {
        self.avg_score = Some(range);
        self
    }

    pub fn age(mut self, range: RangeInclusive<u32>) -> Self {
        self.age = Some(range);
        self
    }

    pub fn axis(mut self, axis: Axis, range: RangeInclusive<u8>) -> Self {
        self.axes[axis.index()] = Some(range);
        self
    }

    pub fn matches(&self, row: &TitleRecord) -> bool {
        fn admits<T: PartialOrd>(range: &Option<RangeInclusive<T>>, value: &T) -> bool {
            range.as_ref().map_or(true, |r| r.contains(value))
        }

        admits(&self.release_year, &row.original_release_year)
            && admits(&self.avg_score, &row.avg_score)
            && admits(&self.age, &row.age_number)
            && row
                .scores
                .iter()
                .all(|(axis, value)| admits(&self.axes[axis.index()], &value))
    }

    /// Rows passing every range, in table order.
    pub fn apply<'a>(&self, table: &'a Table) -> Vec<&'a TitleRecord> {
        table.rows.iter().filter(|row| self.matches(row)).collect()
    }
}

fn by_quality(a: &TitleRecord, b: &TitleRecord) -> Ordering {
    b.avg_score
        .total_cmp(&a.avg_score)
        .then_with(|| b.original_release_year.cmp(&a.original_release_year))
}

/// Every row ordered by average score, then release year, both descending.
pub fn rank_overall(table: &Table) -> Vec<&TitleRecord> {
    let mut rows: Vec<&TitleRecord> = table.rows.iter().collect();
    rows.sort_by(|a, b| by_quality(a, b));
    rows
}

/// Closest titles for a social issue, lowest distance first.
///
/// Rows absent from the issue's score table are placed after every scored
/// row, including exact 0.0 matches. Returns nothing when the issue has no
/// column in the table.
pub fn rank_for_issue<'a>(table: &'a Table, issue: &str, limit: usize) -> Vec<&'a TitleRecord> {
    let column = issue_column(issue);
    if !table.has_issue_column(&column) {
        debug!(issue, column = %column, "No score column for issue");
        return Vec::new();
    }

    let distance = |row: &TitleRecord| row.scored_issue(&column);
    let mut rows: Vec<&TitleRecord> = table.rows.iter().collect();
    rows.sort_by(|a, b| match (distance(a), distance(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| by_quality(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => by_quality(a, b),
    });
    rows.truncate(limit);
    rows
}

/// Daily relative interest per social issue (`Date` column plus one column
/// per topic).
#[derive(Debug, Clone)]
pub struct TrendTable {
    pub topics: Vec<String>,
    pub rows: Vec<(String, Vec<Option<f64>>)>,
}

impl TrendTable {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = Tabular::read(path, Delim::Csv)?;
        Self::from_tabular(raw)
    }

    fn from_tabular(raw: Tabular) -> Result<Self> {
        let date_idx = raw.require("Date")?;
        let topic_idx: Vec<usize> = (0..raw.headers.len()).filter(|i| *i != date_idx).collect();
        let topics = topic_idx.iter().map(|i| raw.headers[*i].clone()).collect();

        let mut rows = Vec::with_capacity(raw.rows.len());
        for row in &raw.rows {
            let Some(date) = Tabular::cell(row, date_idx) else {
                continue;
            };
            let values = topic_idx
                .iter()
                .map(|i| Tabular::cell(row, *i).and_then(|v| v.trim().parse::<f64>().ok()))
                .collect();
            rows.push((date.trim().to_string(), values));
        }
        if rows.is_empty() {
            return Err(PipelineError::tabular(&raw.path, "no dated rows"));
        }
        Ok(Self { topics, rows })
    }

    /// Topics ranked by their value on the latest date, highest first.
    /// Topics without a value on that date are left out.
    pub fn trending_issues(&self) -> Vec<(&str, f64)> {
        // ISO dates order lexicographically
        let Some((_, latest)) = self.rows.iter().max_by(|a, b| a.0.cmp(&b.0)) else {
            return Vec::new();
        };
        let mut ranked: Vec<(&str, f64)> = self
            .topics
            .iter()
            .zip(latest)
            .filter_map(|(topic, value)| value.map(|v| (topic.as_str(), v)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}
