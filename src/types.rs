use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One person whose profile page is scraped, identified by its URL slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(String);

impl Subject {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `.` and `..` cannot be appended to a profile URL as a path segment.
    pub fn is_dot_segment(&self) -> bool {
        matches!(self.0.as_str(), "." | "..")
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Subject {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Subject {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorecardRow {
    #[serde(rename = "Person")]
    pub person: Subject,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Percent")]
    pub percent: String,
    #[serde(rename = "Total")]
    pub total: String,
}

impl ScorecardRow {
    pub const COLUMNS: [&'static str; 4] = ["Person", "Category", "Percent", "Total"];

    pub fn new(
        person: Subject,
        category: impl Into<String>,
        percent: impl Into<String>,
        total: impl Into<String>,
    ) -> Self {
        Self {
            person,
            category: category.into(),
            percent: percent.into(),
            total: total.into(),
        }
    }

    pub fn cells(&self) -> [&str; 4] {
        [
            self.person.as_str(),
            &self.category,
            &self.percent,
            &self.total,
        ]
    }
}

/// Append-only, ordered collection of rows for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    rows: Vec<ScorecardRow>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: ScorecardRow) {
        self.rows.push(row);
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = ScorecardRow>) {
        self.rows.extend(rows);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScorecardRow> {
        self.rows.iter()
    }

    pub fn rows(&self) -> &[ScorecardRow] {
        &self.rows
    }

    pub fn rows_for<'a>(&'a self, subject: &'a Subject) -> impl Iterator<Item = &'a ScorecardRow> {
        self.rows.iter().filter(move |r| &r.person == subject)
    }

    pub fn into_rows(self) -> Vec<ScorecardRow> {
        self.rows
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ScorecardRow;
    type IntoIter = std::slice::Iter<'a, ScorecardRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedSubject {
    pub subject: Subject,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: uuid::Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub rows: ResultSet,
    pub skipped: Vec<SkippedSubject>,
}

impl RunReport {
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
