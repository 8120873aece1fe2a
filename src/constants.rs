/// File and column name constants shared by the loaders and the cache store.
/// These pin the on-disk layout produced by the scraping scripts.

// Data root layout
pub const CATALOG_FILE: &str = "app_data.tsv";
pub const SCORE_DIR: &str = "score_data";
pub const ISSUE_MATCHING_FILE: &str = "issue_matching.csv";
pub const TREND_FILE: &str = "trend30.csv";
pub const DEFAULT_STEM: &str = "data_bundle";

// Cache artifacts
pub const CACHE_EXTENSION: &str = "bin";
pub const LEGACY_CACHE_EXTENSION: &str = "feather";
pub const CACHE_FORMAT_VERSION: u32 = 2;
pub const FRESHNESS_KEY_LEN: usize = 8;

// Inputs that participate in the freshness key
pub const DEFAULT_KEY_EXTENSIONS: &[&str] = &["csv", "tsv"];

// Identifier convention
pub const ID_COLUMN: &str = "imdb_id";
pub const ID_PREFIX: &str = "tt";

// Score table columns
pub const SCORE_VALUE_COLUMN: &str = "inf_dist_summary";
pub const ISSUE_COLUMN_PREFIX: &str = "score_";
pub const SOCIAL_ISSUE_COLUMN: &str = "social_issue";
pub const MATCH_SCORE_COLUMN: &str = "match_score";

// Catalog columns (raw names)
pub const TITLE_COLUMN: &str = "title";
pub const SUMMARY_COLUMN: &str = "short_desc";
pub const RELEASE_YEAR_COLUMN: &str = "release_year";
pub const HBO_URL_COLUMN: &str = "hbogo_url";
pub const TRAILER_URL_COLUMN: &str = "movie_trailer_url";
pub const AGE_COLUMN: &str = "age_child";
pub const POSTER_COLUMN: &str = "poster";
pub const SCORES_COLUMN: &str = "scores";

// Fallbacks for missing catalog values
pub const DEFAULT_LINK_URL: &str = "https://play.hbonow.com/";
pub const DEFAULT_AGE_LABEL: &str = "Not Set";

// Cells that pandas-era exports wrote for missing values
pub const MISSING_MARKERS: &[&str] = &["", "None", "NaN", "nan", "null"];

/// Returns true when a raw cell should be treated as absent.
pub fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}
