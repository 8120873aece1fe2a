use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Whether a higher raw rating is desirable for an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisClass {
    Positive,
    Negative,
}

/// One content-rating category as published on the review pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    PositiveMessages,
    PositiveRoleModels,
    EducationalValue,
    Violence,
    Sex,
    Language,
    Consumerism,
    DrinkingDrugsSmoking,
    SexyStuff,
    ViolenceScariness,
}

impl Axis {
    pub const ALL: [Axis; 10] = [
        Axis::PositiveMessages,
        Axis::PositiveRoleModels,
        Axis::EducationalValue,
        Axis::Violence,
        Axis::Sex,
        Axis::Language,
        Axis::Consumerism,
        Axis::DrinkingDrugsSmoking,
        Axis::SexyStuff,
        Axis::ViolenceScariness,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn class(self) -> AxisClass {
        match self {
            Axis::PositiveMessages | Axis::PositiveRoleModels | Axis::EducationalValue => {
                AxisClass::Positive
            }
            _ => AxisClass::Negative,
        }
    }

    /// Label used as the key inside the scraped `scores` mapping.
    pub fn source_label(self) -> &'static str {
        match self {
            Axis::PositiveMessages => "Positive Messages",
            Axis::PositiveRoleModels => "Positive Role Models & Representations",
            Axis::EducationalValue => "Educational Value",
            Axis::Violence => "Violence",
            Axis::Sex => "Sex",
            Axis::Language => "Language",
            Axis::Consumerism => "Consumerism",
            Axis::DrinkingDrugsSmoking => "Drinking, Drugs & Smoking",
            Axis::SexyStuff => "Sexy Stuff",
            Axis::ViolenceScariness => "Violence & Scariness",
        }
    }

    /// Stable analytic column name.
    pub fn column(self) -> &'static str {
        match self {
            Axis::PositiveMessages => "positive_messages_score",
            Axis::PositiveRoleModels => "positive_role_models_score",
            Axis::EducationalValue => "educational_value_score",
            Axis::Violence => "violence_score",
            Axis::Sex => "sex_score",
            Axis::Language => "language_score",
            Axis::Consumerism => "consumerism_score",
            Axis::DrinkingDrugsSmoking => "drinking_drugs_smoking_score",
            Axis::SexyStuff => "sexy_stuff_score",
            Axis::ViolenceScariness => "violence_scariness_score",
        }
    }

    pub fn from_source_label(label: &str) -> Option<Axis> {
        let label = label.trim();
        Axis::ALL.into_iter().find(|a| a.source_label() == label)
    }

    pub fn from_column(column: &str) -> Option<Axis> {
        Axis::ALL.into_iter().find(|a| a.column() == column)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Raw axis ratings decoded from a catalog row's `scores` blob.
///
/// Values are kept exactly as decoded; normalization happens in the
/// derivation step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisScores {
    values: [Option<i64>; 10],
}

impl AxisScores {
    pub fn get(&self, axis: Axis) -> Option<i64> {
        self.values[axis.index()]
    }

    pub fn set(&mut self, axis: Axis, value: Option<i64>) {
        self.values[axis.index()] = value;
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// Axis ratings after normalization: every value is in `0..=5`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedScores {
    values: [u8; 10],
}

impl NormalizedScores {
    pub fn get(&self, axis: Axis) -> u8 {
        self.values[axis.index()]
    }

    pub(crate) fn set(&mut self, axis: Axis, value: u8) {
        self.values[axis.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, u8)> + '_ {
        Axis::ALL.into_iter().map(move |a| (a, self.get(a)))
    }
}

/// One fully derived catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleRecord {
    pub imdb_id: u64,
    pub title: String,
    pub summary: String,
    pub original_release_year: i32,
    pub age_child: String,
    pub age_number: u32,
    pub poster: String,
    pub hbo_url: String,
    pub movie_trailer_url: String,
    pub scores: NormalizedScores,
    /// Mirrored negative-class scores keyed by the source axis.
    pub inverted: BTreeMap<Axis, u8>,
    pub non_zero_scores: u32,
    pub avg_score: f64,
    /// Per-issue affinity keyed by derived column name; 0.0 when unscored.
    pub issue_scores: BTreeMap<String, f64>,
    /// Columns whose value came from a score table. Tells a real 0.0
    /// distance apart from the unscored fill.
    pub scored_issues: BTreeSet<String>,
    pub social_issue: Option<String>,
    pub match_score: Option<f64>,
}

impl TitleRecord {
    pub fn issue_score(&self, column: &str) -> Option<f64> {
        self.issue_scores.get(column).copied()
    }

    /// Distance for `column` only when the title appeared in that score table.
    pub fn scored_issue(&self, column: &str) -> Option<f64> {
        if self.scored_issues.contains(column) {
            self.issue_score(column)
        } else {
            None
        }
    }

    pub fn inverted_score(&self, axis: Axis) -> Option<u8> {
        self.inverted.get(&axis).copied()
    }
}

/// The materialized analytic table handed to the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Derived `score_*` columns in load order.
    pub issue_columns: Vec<String>,
    pub rows: Vec<TitleRecord>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, imdb_id: u64) -> Option<&TitleRecord> {
        self.rows.iter().find(|r| r.imdb_id == imdb_id)
    }

    pub fn has_issue_column(&self, column: &str) -> bool {
        self.issue_columns.iter().any(|c| c == column)
    }
}
