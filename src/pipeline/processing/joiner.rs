use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::pipeline::ingestion::{CatalogRow, IssueMatch, ScoreTable};

/// Placeholder for catalog rows absent from an issue table. Replaced with 0
/// during derivation.
pub const UNSCORED: f64 = f64::INFINITY;

/// How issue affinity is attached to catalog rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum JoinStrategy {
    /// One `score_*` column per file in the score directory.
    #[default]
    PerIssueFiles,
    /// Single `issue_matching.csv` assigning each title one social issue.
    IssueMatching,
}

impl JoinStrategy {
    /// Segment added to cache file names; the default strategy has none.
    pub fn cache_tag(self) -> Option<&'static str> {
        match self {
            JoinStrategy::PerIssueFiles => None,
            JoinStrategy::IssueMatching => Some("issue_matching"),
        }
    }
}

impl FromStr for JoinStrategy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "per_issue_files" => Ok(JoinStrategy::PerIssueFiles),
            "issue_matching" => Ok(JoinStrategy::IssueMatching),
            other => Err(PipelineError::Config(format!("unknown join strategy '{}'", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JoinedRow {
    pub catalog: CatalogRow,
    pub issue_scores: BTreeMap<String, f64>,
    pub social_issue: Option<String>,
    pub match_score: Option<f64>,
}

impl JoinedRow {
    fn bare(catalog: CatalogRow) -> Self {
        Self {
            catalog,
            issue_scores: BTreeMap::new(),
            social_issue: None,
            match_score: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct JoinedTable {
    pub issue_columns: Vec<String>,
    pub rows: Vec<JoinedRow>,
}

/// Left-merge every score table into the catalog by identifier.
///
/// Row count and order follow the catalog. Each column starts at
/// [`UNSCORED`] and is overwritten only where the identifier appears in that
/// table. A column that is already present is left untouched.
pub fn join_issue_scores(catalog: Vec<CatalogRow>, tables: &[ScoreTable]) -> JoinedTable {
    let mut joined = JoinedTable {
        issue_columns: Vec::with_capacity(tables.len()),
        rows: catalog.into_iter().map(JoinedRow::bare).collect(),
    };

    for table in tables {
        if joined.issue_columns.contains(&table.column) {
            debug!(column = %table.column, "Column already joined, skipping");
            continue;
        }
        let mut matched = 0usize;
        for row in &mut joined.rows {
            let value = match table.scores.get(&row.catalog.imdb_id) {
                Some(&score) => {
                    matched += 1;
                    score
                }
                None => UNSCORED,
            };
            row.issue_scores.insert(table.column.clone(), value);
        }
        debug!(column = %table.column, matched, "Joined score table");
        joined.issue_columns.push(table.column.clone());
    }

    info!(
        rows = joined.rows.len(),
        columns = joined.issue_columns.len(),
        "Joined issue scores"
    );
    joined
}

/// Inner-join the catalog against the legacy issue matching table, keeping the
/// first match per identifier. Titles without a match are dropped.
pub fn join_issue_matching(catalog: Vec<CatalogRow>, matches: &[IssueMatch]) -> JoinedTable {
    let mut first: HashMap<u64, &IssueMatch> = HashMap::new();
    for m in matches {
        first.entry(m.imdb_id).or_insert(m);
    }

    let rows: Vec<JoinedRow> = catalog
        .into_iter()
        .filter_map(|row| {
            let m = first.get(&row.imdb_id)?;
            let mut joined = JoinedRow::bare(row);
            joined.social_issue = Some(m.social_issue.clone());
            joined.match_score = Some(m.match_score);
            Some(joined)
        })
        .collect();

    info!(rows = rows.len(), "Joined issue matching table");
    JoinedTable {
        issue_columns: Vec::new(),
        rows,
    }
}
