use std::fmt;
use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::error::GeoError;

pub const TABLE_BEGIN: &str = "!series_matrix_table_begin";
pub const TABLE_END: &str = "!series_matrix_table_end";
pub const SAMPLE_TITLE: &str = "!Sample_title";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionKind {
    DataTable,
    SampleHeader,
}

impl SectionKind {
    fn start_marker(&self) -> &'static str {
        match self {
            SectionKind::DataTable => TABLE_BEGIN,
            SectionKind::SampleHeader => SAMPLE_TITLE,
        }
    }

    fn end_marker(&self) -> &'static str {
        match self {
            SectionKind::DataTable => TABLE_END,
            SectionKind::SampleHeader => TABLE_BEGIN,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::DataTable => write!(f, "data table"),
            SectionKind::SampleHeader => write!(f, "sample header"),
        }
    }
}

// start_line holds the marker, the header follows, then row_count data lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionBounds {
    pub kind: SectionKind,
    pub start_line: usize,
    pub row_count: usize,
}

impl SectionBounds {
    pub fn header_line(&self) -> usize {
        self.start_line + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocatorState {
    Seeking,
    InSection { start: usize },
    Done { start: usize, end: usize },
}

impl LocatorState {
    fn advance(self, kind: SectionKind, line_index: usize, line: &str) -> Self {
        match self {
            LocatorState::Seeking if line.contains(kind.start_marker()) => {
                LocatorState::InSection { start: line_index }
            }
            LocatorState::InSection { start } if line.contains(kind.end_marker()) => {
                LocatorState::Done {
                    start,
                    end: line_index - 1,
                }
            }
            state => state,
        }
    }
}

pub fn locate_section<R: BufRead>(
    mut reader: R,
    kind: SectionKind,
    path: &str,
) -> Result<SectionBounds, GeoError> {
    let mut state = LocatorState::Seeking;
    let mut line_index = 0usize;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|err| GeoError::Filesystem(format!("read {path}: {err}")))?;
        if read == 0 {
            break;
        }
        state = state.advance(kind, line_index, &String::from_utf8_lossy(&buf));
        if let LocatorState::Done { start, end } = state {
            let row_count = end.saturating_sub(start + 1);
            tracing::debug!(%kind, start, row_count, "located matrix section");
            return Ok(SectionBounds {
                kind,
                start_line: start,
                row_count,
            });
        }
        line_index += 1;
    }

    Err(GeoError::SectionNotFound {
        section: kind.to_string(),
        path: path.to_string(),
    })
}
