//! Roster intake: fetching the raw grid and turning it into hire records.

use std::path::Path;

use chrono::{Duration, NaiveDate};

use super::domain::HireRecord;
use crate::google::GoogleApiError;

/// Rectangular-ish cell grid; the first row holds header labels.
pub type Grid = Vec<Vec<String>>;

const COLUMN_COUNT: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read roster from Google Sheets: {0}")]
    Sheets(#[from] GoogleApiError),
    #[error("invalid roster CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// Anything that can hand back the roster grid for a source identifier and range.
pub trait RosterSource {
    fn fetch_grid(&self, source_id: &str, range: &str) -> Result<Grid, RosterError>;
}

/// Reads a local CSV export. The source identifier is the file path and,
/// like a Sheets `A:E` read, only the first five columns are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRosterSource;

impl CsvRosterSource {
    pub fn read<R: std::io::Read>(reader: R) -> Result<Grid, RosterError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut grid = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            grid.push(
                record
                    .iter()
                    .take(COLUMN_COUNT)
                    .map(str::to_string)
                    .collect(),
            );
        }
        Ok(grid)
    }
}

impl RosterSource for CsvRosterSource {
    fn fetch_grid(&self, source_id: &str, _range: &str) -> Result<Grid, RosterError> {
        let file = std::fs::File::open(Path::new(source_id)).map_err(csv::Error::from)?;
        Self::read(file)
    }
}

/// Where each field lives in a data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub name: usize,
    pub email: usize,
    pub department: usize,
    pub start_date: usize,
    pub manager: usize,
}

impl ColumnMap {
    /// Match header labels case-insensitively; any label that is missing
    /// falls back to its fixed position.
    pub fn resolve(header: &[String]) -> Self {
        let labels: Vec<String> = header
            .iter()
            .map(|label| label.trim().to_lowercase())
            .collect();
        let column = |label: &str, fallback: usize| {
            labels
                .iter()
                .position(|candidate| candidate == label)
                .unwrap_or(fallback)
        };

        Self {
            name: column("name", 0),
            email: column("email", 1),
            department: column("department", 2),
            start_date: column("startdate", 3),
            manager: column("manager", 4),
        }
    }
}

pub fn parse_start_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Last day of the window, or `None` when it falls outside chrono's calendar.
pub fn window_end(today: NaiveDate, window_days: i64) -> Option<NaiveDate> {
    Duration::try_days(window_days).and_then(|span| today.checked_add_signed(span))
}

/// Hires starting within `[today, today + window_days]`, in row order.
///
/// Rows with fewer than five cells or an unparseable start date are skipped.
pub fn parse_upcoming_hires(grid: &[Vec<String>], window_days: i64, today: NaiveDate) -> Vec<HireRecord> {
    let Some((header, rows)) = grid.split_first() else {
        return Vec::new();
    };

    let columns = ColumnMap::resolve(header);
    let within = window_end(today, window_days)
        .unwrap_or(if window_days < 0 { NaiveDate::MIN } else { NaiveDate::MAX });

    rows.iter()
        .filter(|row| row.len() >= COLUMN_COUNT)
        .filter_map(|row| hire_from_row(row, &columns))
        .filter(|hire| today <= hire.start_date && hire.start_date <= within)
        .collect()
}

fn hire_from_row(row: &[String], columns: &ColumnMap) -> Option<HireRecord> {
    let cell = |index: usize| row.get(index).map(|value| value.trim().to_string());

    let start_date = parse_start_date(row.get(columns.start_date)?)?;
    Some(HireRecord {
        name: cell(columns.name)?,
        email: cell(columns.email)?,
        department: cell(columns.department)?,
        start_date,
        manager: cell(columns.manager)?,
    })
}
