use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};

use crate::error::GeoError;

static SAMPLE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\t(\S+)").expect("sample row pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRow {
    pub site: String,
    pub measurement: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    Valid(SampleRow),
    Rejected(Vec<u8>),
}

// Bytes that are not valid UTF-8 never count as token characters.
pub fn classify_line(line: &[u8]) -> LineClass {
    let row = SAMPLE_ROW.captures(line).and_then(|caps| {
        Some(SampleRow {
            site: std::str::from_utf8(&caps[1]).ok()?.to_string(),
            measurement: std::str::from_utf8(&caps[2]).ok()?.to_string(),
        })
    });
    match row {
        Some(row) => LineClass::Valid(row),
        None => LineClass::Rejected(line.to_vec()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanedSample {
    pub rows: Vec<SampleRow>,
    pub rejects: Vec<Vec<u8>>,
}

impl CleanedSample {
    pub fn line_count(&self) -> usize {
        self.rows.len() + self.rejects.len()
    }

    pub fn push_line(&mut self, line: &[u8]) {
        match classify_line(line) {
            LineClass::Valid(row) => self.rows.push(row),
            LineClass::Rejected(raw) => self.rejects.push(raw),
        }
    }
}

pub fn clean_reader<R: BufRead>(mut reader: R) -> Result<CleanedSample, GeoError> {
    let mut cleaned = CleanedSample::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|err| GeoError::Filesystem(err.to_string()))?;
        if read == 0 {
            break;
        }
        cleaned.push_line(&buf);
    }
    Ok(cleaned)
}

pub fn clean_file(path: &Path) -> Result<CleanedSample, GeoError> {
    if path.is_dir() {
        return Err(GeoError::Filesystem(format!(
            "{} is a directory, expected a sample file",
            path.display()
        )));
    }
    let file = File::open(path)
        .map_err(|err| GeoError::Filesystem(format!("open {}: {err}", path.display())))?;
    clean_reader(BufReader::new(file))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleTable {
    pub index: Vec<String>,
    pub measurement: Vec<String>,
}

impl SampleTable {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, site: &str) -> Option<&str> {
        self.index
            .iter()
            .position(|value| value == site)
            .map(|pos| self.measurement[pos].as_str())
    }
}

impl From<&CleanedSample> for SampleTable {
    fn from(cleaned: &CleanedSample) -> Self {
        let (index, measurement) = cleaned
            .rows
            .iter()
            .map(|row| (row.site.clone(), row.measurement.clone()))
            .unzip();
        Self { index, measurement }
    }
}

pub fn load_sample_table(path: &Path) -> Result<SampleTable, GeoError> {
    let cleaned = clean_file(path)?;
    if !cleaned.rejects.is_empty() {
        tracing::debug!(
            path = %path.display(),
            rejects = cleaned.rejects.len(),
            "skipped malformed sample lines"
        );
    }
    Ok(SampleTable::from(&cleaned))
}
