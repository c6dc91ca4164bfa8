use std::io::BufRead;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

use crate::error::GeoError;
use crate::section::SectionBounds;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixTable {
    pub index_name: Option<String>,
    pub columns: Vec<String>,
    pub index: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl MatrixTable {
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn set_index(mut self, name: &str) -> Result<Self, GeoError> {
        let pos = self
            .column_position(name)
            .ok_or_else(|| GeoError::MissingColumn {
                table: self.index_name.clone().unwrap_or_else(|| "matrix".to_string()),
                column: name.to_string(),
            })?;
        self.columns.remove(pos);
        self.index = self.rows.iter_mut().map(|row| row.remove(pos)).collect();
        self.index_name = Some(name.to_string());
        Ok(self)
    }

    pub fn filter_index(mut self, value: &str) -> Self {
        let (index, rows) = self
            .index
            .into_iter()
            .zip(self.rows)
            .filter(|(label, _)| label == value)
            .unzip();
        self.index = index;
        self.rows = rows;
        self
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let pos = self.column_position(name)?;
        Some(self.rows.iter().map(|row| row[pos].as_str()).collect())
    }

    pub fn row(&self, label: &str) -> Option<&[String]> {
        self.index
            .iter()
            .position(|value| value == label)
            .map(|pos| self.rows[pos].as_slice())
    }

    pub fn value_f64(&self, label: &str, column: &str) -> Option<f64> {
        let pos = self.column_position(column)?;
        self.row(label)?.get(pos)?.trim().parse().ok()
    }

    pub fn head(&self, n: usize) -> MatrixTable {
        MatrixTable {
            index_name: self.index_name.clone(),
            columns: self.columns.clone(),
            index: self.index.iter().take(n).cloned().collect(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

// Blank lines count towards row_count but produce no row.
pub fn read_section<R: BufRead>(
    mut reader: R,
    bounds: &SectionBounds,
) -> Result<MatrixTable, GeoError> {
    let header_line = bounds.header_line();
    let last_line = header_line + bounds.row_count;
    let mut text = String::new();
    let mut line_index = 0usize;
    let mut buf = Vec::new();

    while line_index <= last_line {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|err| GeoError::Filesystem(err.to_string()))?;
        if read == 0 {
            break;
        }
        if line_index >= header_line {
            let line = String::from_utf8_lossy(&buf);
            if !line.trim().is_empty() {
                text.push_str(line.trim_end_matches(['\r', '\n']));
                text.push('\n');
            }
        }
        line_index += 1;
    }

    parse_tab_table(&text)
}

pub fn parse_tab_table(text: &str) -> Result<MatrixTable, GeoError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = reader.records();

    let columns: Vec<String> = match records.next() {
        Some(record) => record
            .map_err(|err| GeoError::TableParse(err.to_string()))?
            .iter()
            .map(|cell| cell.trim().to_string())
            .collect(),
        None => return Err(GeoError::TableParse("missing header row".to_string())),
    };

    let mut rows = Vec::new();
    for (line, record) in records.enumerate() {
        let record = record.map_err(|err| GeoError::TableParse(err.to_string()))?;
        if record.len() > columns.len() {
            return Err(GeoError::TableParse(format!(
                "row {} has {} cells, header has {}",
                line + 1,
                record.len(),
                columns.len()
            )));
        }
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(columns.len(), String::new());
        rows.push(row);
    }

    Ok(MatrixTable {
        index_name: None,
        index: (0..rows.len()).map(|pos| pos.to_string()).collect(),
        columns,
        rows,
    })
}
