use std::cmp::Ordering;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::{debug, info, trace};

use crate::domain::TwError;

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: String,
    pub views: u64,
    pub article: String,
    // Parsed once; None for dates that do not parse
    parsed: Option<NaiveDateTime>,
}

impl Record {
    pub fn new(date: impl Into<String>, views: u64, article: impl Into<String>) -> Self {
        let date = date.into();
        let parsed = parse_date(&date);
        Self {
            date,
            views,
            article: article.into(),
            parsed,
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDateTime> {
        self.parsed
    }

    pub fn as_csv(&self) -> String {
        [self.date.as_str(), &self.views.to_string(), self.article.as_str()]
            .iter()
            .map(|c| wrap_cell_content(c))
            .collect::<Vec<String>>()
            .join(",")
    }
}

fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok()
}

/// Most recent first, ties broken by views, highest first.
/// Unparseable dates are the smallest value and end up last.
pub fn by_date(a: &Record, b: &Record) -> Ordering {
    b.parsed
        .cmp(&a.parsed)
        .then_with(|| b.views.cmp(&a.views))
}

/// Highest views first, ties broken by date, most recent first.
pub fn by_views(a: &Record, b: &Record) -> Ordering {
    b.views
        .cmp(&a.views)
        .then_with(|| b.parsed.cmp(&a.parsed))
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.contains('"');
    let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',' || c == '"');
    let mut out = c.to_string();

    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping {
        out = format!("\"{out}\"");
    }
    out
}

pub fn default_records() -> Vec<Record> {
    vec![
        Record::new("2022-09-01", 100, "Article 1"),
        Record::new("2023-09-01", 100, "Article 1"),
        Record::new("2023-09-02", 150, "Article 2"),
        Record::new("2023-09-02", 120, "Article 3"),
        Record::new("2020-09-03", 200, "Article 4"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Views,
}

/// Working copy of the records plus a row view over them.
/// Sorting reorders `records` in place; filtering only rebuilds `rows`.
#[derive(Debug, Default)]
pub struct SortableTable {
    records: Vec<Record>,
    rows: Vec<usize>, // Mapping of visible row index to record index
    filter: Option<String>,
    sorted_by: Option<SortKey>,
    cursor_row: usize,
}

impl SortableTable {
    pub fn new(records: Vec<Record>) -> Self {
        let mut table = Self {
            records,
            ..Default::default()
        };
        table.rebuild_rows();
        table
    }

    pub fn load(path: &Path) -> Result<Self, TwError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TwError::FileNotFound,
            ErrorKind::PermissionDenied => TwError::PermissionDenied,
            _ => TwError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(TwError::LoadingFailed("Not a file!".into()));
        }
        let df = LazyCsvReader::new(PlPath::Local(path.into()))
            .with_has_header(true)
            .finish()?
            .collect()?;
        let records = Self::records_from_frame(&df)?;
        info!("Loaded {} records from {:?}", records.len(), path);
        Ok(Self::new(records))
    }

    fn records_from_frame(df: &DataFrame) -> Result<Vec<Record>, TwError> {
        let dates = Self::string_column(df, "date")?;
        let views = Self::string_column(df, "views")?;
        let articles = Self::string_column(df, "article")?;

        dates
            .into_iter()
            .zip(views)
            .zip(articles)
            .enumerate()
            .map(|(idx, ((date, views), article))| {
                let views = views.trim().parse::<u64>().map_err(|_| {
                    TwError::LoadingFailed(format!("row {}: invalid views {views:?}", idx + 1))
                })?;
                Ok(Record::new(date, views, article))
            })
            .collect()
    }

    fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>, TwError> {
        let col = df.column(name)?.cast(&DataType::String)?;
        let series = col.str()?;
        let data = series
            .into_iter()
            .map(|v| v.map(str::to_string).unwrap_or_default())
            .collect::<Vec<String>>();
        debug!("Column {name}: {} rows", data.len());
        Ok(data)
    }

    pub fn sort_by_date(&mut self) {
        self.sort(SortKey::Date);
    }

    pub fn sort_by_views(&mut self) {
        self.sort(SortKey::Views);
    }

    fn sort(&mut self, key: SortKey) {
        // Vec::sort_by is stable, equal keys keep their current order
        match key {
            SortKey::Date => self.records.sort_by(by_date),
            SortKey::Views => self.records.sort_by(by_views),
        }
        self.sorted_by = Some(key);
        self.rebuild_rows();
        trace!("Sorted table by {key:?}");
    }

    /// Restrict the visible rows to articles containing `term`.
    /// An empty term removes the filter.
    pub fn filter(&mut self, term: &str) {
        let term = term.trim();
        self.filter = (!term.is_empty()).then(|| term.to_string());
        self.rebuild_rows();
    }

    fn rebuild_rows(&mut self) {
        let term = self.filter.as_ref().map(|t| t.to_lowercase());
        self.rows = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| match &term {
                Some(t) => r.article.to_lowercase().contains(t),
                None => true,
            })
            .map(|(idx, _)| idx)
            .collect();
        self.cursor_row = self.cursor_row.min(self.rows.len().saturating_sub(1));
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn visible(&self) -> impl Iterator<Item = &Record> {
        self.rows.iter().map(|&idx| &self.records[idx])
    }

    pub fn visible_len(&self) -> usize {
        self.rows.len()
    }

    pub fn filter_term(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn sorted_by(&self) -> Option<SortKey> {
        self.sorted_by
    }

    pub fn cursor_row(&self) -> usize {
        self.cursor_row
    }

    pub fn selected(&self) -> Option<&Record> {
        self.rows.get(self.cursor_row).map(|&idx| &self.records[idx])
    }

    pub fn move_up(&mut self, size: usize) {
        self.cursor_row = self.cursor_row.saturating_sub(size);
    }

    pub fn move_down(&mut self, size: usize) {
        self.cursor_row = (self.cursor_row + size).min(self.rows.len().saturating_sub(1));
    }

    pub fn move_beginning(&mut self) {
        self.cursor_row = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_row = self.rows.len().saturating_sub(1);
    }
}
