use std::fs;
use std::mem::take;
use std::path::{Path, PathBuf};

use crate::constants::is_missing;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delim {
    Csv,
    Tsv,
}

impl Delim {
    pub fn sep(self) -> char {
        match self {
            Delim::Csv => ',',
            Delim::Tsv => '\t',
        }
    }
}

/// Quote-aware CSV/TSV row splitter (RFC 4180 quoting, CRLF tolerant).
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else if field.is_empty() {
                    in_quotes = true;
                } else {
                    // stray quote inside an unquoted field is literal
                    field.push('"');
                }
            }
            c if c == sep && !in_quotes => {
                row.push(take(&mut field));
            }
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // Flush a trailing row without a newline, even if quotes were unterminated
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

/// A header-addressed table read from disk.
#[derive(Debug, Clone)]
pub struct Tabular {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Tabular {
    pub fn read(path: &Path, delim: Delim) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(path, &text, delim)
    }

    pub fn parse(path: &Path, text: &str, delim: Delim) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut rows = parse_rows(text, delim.sep());
        if rows.is_empty() {
            return Err(PipelineError::tabular(path, "missing header row"));
        }
        let headers = rows.remove(0).into_iter().map(|h| h.trim().to_string()).collect();
        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require(&self, name: &str) -> Result<usize> {
        self.column(name)
            .ok_or_else(|| PipelineError::tabular(&self.path, format!("missing required column '{}'", name)))
    }

    /// Cell value at `idx`, or `None` for short rows and missing markers.
    pub fn cell<'a>(row: &'a [String], idx: usize) -> Option<&'a str> {
        row.get(idx).map(String::as_str).filter(|c| !is_missing(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows_handles_quotes_and_crlf() {
        let rows = parse_rows("a,b\r\n\"x, y\",\"say \"\"hi\"\"\"\r\n", ',');
        assert_eq!(rows, vec![vec!["a", "b"], vec!["x, y", "say \"hi\""]]);
    }

    #[test]
    fn test_parse_rows_keeps_tabs_inside_quotes() {
        let rows = parse_rows("id\tscores\ntt1\t\"{'Sex': '1',\t'Language': 2}\"", '\t');
        assert_eq!(rows[1][1], "{'Sex': '1',\t'Language': 2}");
    }

    #[test]
    fn test_parse_rows_skips_blank_lines_and_keeps_empty_cells() {
        let rows = parse_rows("a,b\n\n1,\n", ',');
        assert_eq!(rows, vec![vec!["a", "b"], vec!["1", ""]]);
    }

    #[test]
    fn test_apostrophes_in_unquoted_tsv_fields() {
        let rows = parse_rows("title\nIt's a \"big\" day\n", '\t');
        assert_eq!(rows[1][0], "It's a \"big\" day");
    }

    #[test]
    fn test_tabular_requires_header() {
        let err = Tabular::parse(Path::new("empty.csv"), "", Delim::Csv).unwrap_err();
        assert!(err.to_string().contains("missing header row"));
    }

    #[test]
    fn test_missing_markers_read_as_none() {
        let t = Tabular::parse(Path::new("t.csv"), "a,b,c\nNone,,x\n", Delim::Csv).unwrap();
        let row = &t.rows[0];
        assert_eq!(Tabular::cell(row, 0), None);
        assert_eq!(Tabular::cell(row, 1), None);
        assert_eq!(Tabular::cell(row, 2), Some("x"));
        assert_eq!(Tabular::cell(row, 7), None);
        assert!(t.require("d").is_err());
    }
}
