//! CSV export of pain point and touchpoint reports
//!
//! Text cells are always quoted with inner quotes doubled, numbers are
//! written bare and absent values are left blank. Rows are joined with
//! `\n` and the header is the column labels joined with `,`.

use crate::error::ReportError;
use crate::summary::{PainPointRow, TouchpointRow};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// File name of the pain point export
pub const PAIN_POINTS_CSV: &str = "pain-points-report.csv";

/// File name of the touchpoint export
pub const TOUCHPOINTS_CSV: &str = "touchpoints-report.csv";

/// One CSV value
#[derive(Debug, Clone, PartialEq)]
pub enum CsvCell {
    Text(String),
    Number(f64),
    Empty,
}

impl CsvCell {
    /// Text cell, or empty when absent
    pub fn text_or_empty(value: Option<&str>) -> Self {
        value.map_or(Self::Empty, |v| Self::Text(v.to_string()))
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Self::Text(text) => {
                out.push('"');
                out.push_str(&text.replace('"', "\"\""));
                out.push('"');
            }
            Self::Number(n) => {
                let _ = write!(out, "{n}");
            }
            Self::Empty => {}
        }
    }
}

/// A labelled column and how to read it from a row
pub struct Column<R> {
    pub label: &'static str,
    pub value: fn(&R) -> CsvCell,
}

impl<R> Column<R> {
    /// Column with label and accessor
    pub const fn new(label: &'static str, value: fn(&R) -> CsvCell) -> Self {
        Self { label, value }
    }
}

/// Render rows under a fixed column spec
#[must_use]
pub fn to_csv<R>(columns: &[Column<R>], rows: &[R]) -> String {
    let mut out = columns
        .iter()
        .map(|c| c.label)
        .collect::<Vec<_>>()
        .join(",");

    for row in rows {
        out.push('\n');
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            (column.value)(row).write_to(&mut out);
        }
    }
    out
}

/// Pain point export columns
pub const PAIN_POINT_COLUMNS: &[Column<PainPointRow>] = &[
    Column::new("Stage", |r| CsvCell::Text(r.stage_name.clone())),
    Column::new("User Action", |r| CsvCell::Text(r.user_action.clone())),
    Column::new("Description", |r| {
        CsvCell::Text(r.pain_point.description.clone())
    }),
    Column::new("Severity", |r| {
        CsvCell::text_or_empty(r.pain_point.severity.map(|s| s.as_str()))
    }),
];

/// Touchpoint export columns
pub const TOUCHPOINT_COLUMNS: &[Column<TouchpointRow>] = &[
    Column::new("Stage", |r| CsvCell::Text(r.stage_name.clone())),
    Column::new("User Action", |r| CsvCell::Text(r.user_action.clone())),
    Column::new("Title", |r| CsvCell::Text(r.touchpoint.title.clone())),
    Column::new("Type", |r| {
        CsvCell::Text(r.touchpoint.touchpoint_type.as_str().to_string())
    }),
    Column::new("Description", |r| {
        CsvCell::text_or_empty(r.touchpoint.description.as_deref())
    }),
    Column::new("Content URL", |r| {
        CsvCell::text_or_empty(r.touchpoint.content_url.as_deref())
    }),
];

/// A rendered export ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: &'static str,
    pub contents: String,
}

/// Pain point export
#[must_use]
pub fn pain_points_csv(rows: &[PainPointRow]) -> Export {
    Export {
        file_name: PAIN_POINTS_CSV,
        contents: to_csv(PAIN_POINT_COLUMNS, rows),
    }
}

/// Touchpoint export
#[must_use]
pub fn touchpoints_csv(rows: &[TouchpointRow]) -> Export {
    Export {
        file_name: TOUCHPOINTS_CSV,
        contents: to_csv(TOUCHPOINT_COLUMNS, rows),
    }
}

/// Write an export into `dir`, creating it if needed
///
/// Returns the written path. An existing file is replaced.
///
/// # Errors
/// - `ReportError::Io`
pub fn write_export(dir: &Path, export: &Export) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(export.file_name);
    std::fs::write(&path, &export.contents).map_err(|source| ReportError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = export.contents.len(), "report exported");
    Ok(path)
}
