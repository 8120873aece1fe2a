use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::constants::*;
use crate::error::Result;
use crate::metrics::IngestionMetrics;
use crate::pipeline::ingestion::score_blob::decode_scores;
use crate::pipeline::ingestion::tabular::{Delim, Tabular};
use crate::pipeline::processing::naming::issue_column;
use crate::types::AxisScores;

/// One catalog row as read from `app_data.tsv`, before derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    pub imdb_id: u64,
    pub title: Option<String>,
    pub short_desc: Option<String>,
    pub release_year: Option<String>,
    pub hbogo_url: Option<String>,
    pub movie_trailer_url: Option<String>,
    pub age_child: Option<String>,
    pub poster: Option<String>,
    pub scores: AxisScores,
}

/// A per-issue affinity table, deduplicated by identifier (first row wins).
#[derive(Debug, Clone)]
pub struct ScoreTable {
    pub topic: String,
    pub column: String,
    pub path: PathBuf,
    pub scores: HashMap<u64, f64>,
}

/// One row of the legacy single-file issue matching table.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueMatch {
    pub imdb_id: u64,
    pub social_issue: String,
    pub match_score: f64,
}

/// Parse an identifier such as `tt0100000` into its integer form.
///
/// The `tt` prefix is optional; anything that is not all digits afterwards is
/// rejected rather than coerced.
pub fn parse_identifier(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let digits = raw.strip_prefix(ID_PREFIX).unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn owned(row: &[String], idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| Tabular::cell(row, i)).map(str::to_string)
}

/// Read the primary catalog. Rows with a malformed identifier are dropped;
/// duplicate identifiers keep their first occurrence.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogRow>> {
    let table = Tabular::read(path, Delim::Tsv)?;
    let id_idx = table.require(ID_COLUMN)?;

    let column = |name: &str| {
        let idx = table.column(name);
        if idx.is_none() {
            warn!(column = name, path = %path.display(), "Catalog column missing, values treated as absent");
        }
        idx
    };
    let title_idx = column(TITLE_COLUMN);
    let desc_idx = column(SUMMARY_COLUMN);
    let year_idx = column(RELEASE_YEAR_COLUMN);
    let hbo_idx = column(HBO_URL_COLUMN);
    let trailer_idx = column(TRAILER_URL_COLUMN);
    let age_idx = column(AGE_COLUMN);
    let poster_idx = column(POSTER_COLUMN);
    let scores_idx = column(SCORES_COLUMN);

    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(table.rows.len());
    for (line, row) in table.rows.iter().enumerate() {
        let raw_id = Tabular::cell(row, id_idx).unwrap_or_default();
        let Some(imdb_id) = parse_identifier(raw_id) else {
            warn!(line = line + 2, id = raw_id, "Dropping catalog row with malformed identifier");
            IngestionMetrics::record_row_rejected("malformed_id");
            continue;
        };
        if !seen.insert(imdb_id) {
            warn!(imdb_id, "Dropping duplicate catalog identifier");
            IngestionMetrics::record_row_rejected("duplicate_id");
            continue;
        }
        let blob = scores_idx.and_then(|i| Tabular::cell(row, i));
        rows.push(CatalogRow {
            imdb_id,
            title: owned(row, title_idx),
            short_desc: owned(row, desc_idx),
            release_year: owned(row, year_idx),
            hbogo_url: owned(row, hbo_idx),
            movie_trailer_url: owned(row, trailer_idx),
            age_child: owned(row, age_idx),
            poster: owned(row, poster_idx),
            scores: decode_scores(blob),
        });
    }

    info!(path = %path.display(), rows = rows.len(), "Loaded catalog");
    IngestionMetrics::record_catalog_rows(rows.len());
    Ok(rows)
}

/// Read a single per-issue score table. Returns `Ok(None)` when the file has
/// no usable score column.
pub fn load_score_table(path: &Path) -> Result<Option<ScoreTable>> {
    let topic = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let column = issue_column(&topic);

    let table = Tabular::read(path, Delim::Csv)?;
    let Some(id_idx) = table.column(ID_COLUMN) else {
        warn!(path = %path.display(), "Score table has no identifier column, skipping");
        return Ok(None);
    };
    let value_idx = table.column(SCORE_VALUE_COLUMN).or_else(|| {
        // a two-column table carries its score in whichever column is not the id
        let others: Vec<usize> = (0..table.headers.len()).filter(|&i| i != id_idx).collect();
        match others.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    });
    let Some(value_idx) = value_idx else {
        warn!(path = %path.display(), "Score table has no score column, skipping");
        return Ok(None);
    };

    let mut scores = HashMap::new();
    let mut skipped = 0usize;
    for row in &table.rows {
        let Some(imdb_id) = Tabular::cell(row, id_idx).and_then(parse_identifier) else {
            skipped += 1;
            continue;
        };
        let Some(score) = Tabular::cell(row, value_idx).and_then(|v| v.trim().parse::<f64>().ok())
        else {
            skipped += 1;
            continue;
        };
        if let Entry::Vacant(slot) = scores.entry(imdb_id) {
            slot.insert(score);
        }
    }
    if skipped > 0 {
        debug!(path = %path.display(), skipped, "Skipped unusable score rows");
    }

    Ok(Some(ScoreTable {
        topic,
        column,
        path: path.to_path_buf(),
        scores,
    }))
}

/// Every `*.csv` under `score_dir`, in lexicographic path order.
///
/// Tables whose derived column name was already claimed by an earlier table
/// are reported and skipped so the first claimant is kept.
pub fn load_score_tables(score_dir: &Path) -> Result<Vec<ScoreTable>> {
    if !score_dir.is_dir() {
        warn!(dir = %score_dir.display(), "Score directory not found, no issue scores loaded");
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(score_dir).sort_by_file_name() {
        let entry = entry?;
        let is_csv = entry.path().extension().map_or(false, |ext| ext == "csv");
        if entry.file_type().is_file() && is_csv {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    let mut claimed: HashSet<String> = HashSet::new();
    let mut tables = Vec::new();
    for path in paths {
        info!(path = %path.display(), "Reading score table");
        let Some(table) = load_score_table(&path)? else {
            continue;
        };
        if !claimed.insert(table.column.clone()) {
            warn!(
                path = %path.display(),
                column = %table.column,
                "Score column already loaded, keeping the earlier values"
            );
            IngestionMetrics::record_column_collision();
            continue;
        }
        IngestionMetrics::record_score_table(table.scores.len());
        tables.push(table);
    }
    Ok(tables)
}

/// Read the legacy `issue_matching.csv` table.
pub fn load_issue_matching(path: &Path) -> Result<Vec<IssueMatch>> {
    let table = Tabular::read(path, Delim::Csv)?;
    let id_idx = table.require(ID_COLUMN)?;
    let issue_idx = table.require(SOCIAL_ISSUE_COLUMN)?;
    let score_idx = table.require(MATCH_SCORE_COLUMN)?;

    let mut matches = Vec::new();
    for row in &table.rows {
        let imdb_id = Tabular::cell(row, id_idx).and_then(parse_identifier);
        let issue = Tabular::cell(row, issue_idx);
        let score = Tabular::cell(row, score_idx).and_then(|v| v.trim().parse::<f64>().ok());
        match (imdb_id, issue, score) {
            (Some(imdb_id), Some(issue), Some(match_score)) => matches.push(IssueMatch {
                imdb_id,
                social_issue: issue.to_string(),
                match_score,
            }),
            _ => IngestionMetrics::record_row_rejected("issue_matching"),
        }
    }
    info!(path = %path.display(), rows = matches.len(), "Loaded issue matching table");
    Ok(matches)
}
