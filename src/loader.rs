use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::cache::{CacheBackend, CacheKey, TableCache};
use crate::domain::{SeriesAccession, TableKind};
use crate::error::GeoError;
use crate::section::{SectionBounds, SectionKind, locate_section};
use crate::table::{MatrixTable, read_section};

pub const SERIES_INDEX: &str = "ID_REF";
pub const INFO_INDEX: &str = "!Sample_geo_accession";
pub const CHARACTERISTICS_ROW: &str = "!Sample_characteristics_ch1";

pub struct MatrixTableLoader<B: CacheBackend> {
    cache: TableCache<B>,
}

impl<B: CacheBackend> MatrixTableLoader<B> {
    pub fn new(backend: B) -> Self {
        Self {
            cache: TableCache::new(backend),
        }
    }

    pub fn cache(&self) -> &TableCache<B> {
        &self.cache
    }

    pub fn load(
        &self,
        path: &Path,
        kind: MatrixKind,
        dataset: &SeriesAccession,
    ) -> Result<MatrixTable, GeoError> {
        let key = CacheKey::new(dataset.clone(), kind.table_kind());
        self.cache.get_or_compute(&key, || parse_matrix(path, kind))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    Series,
    Info,
}

impl MatrixKind {
    pub fn table_kind(&self) -> TableKind {
        match self {
            MatrixKind::Series => TableKind::Series,
            MatrixKind::Info => TableKind::Info,
        }
    }

    pub fn section(&self) -> SectionKind {
        match self {
            MatrixKind::Series => SectionKind::DataTable,
            MatrixKind::Info => SectionKind::SampleHeader,
        }
    }
}

pub fn parse_matrix(path: &Path, kind: MatrixKind) -> Result<MatrixTable, GeoError> {
    let shown = path.display().to_string();
    let bounds = locate_section(open(path)?, kind.section(), &shown)?;
    let table = read_bounded(path, &bounds)?;
    let table = match kind {
        MatrixKind::Series => table.set_index(SERIES_INDEX)?,
        MatrixKind::Info => table
            .set_index(INFO_INDEX)?
            .filter_index(CHARACTERISTICS_ROW),
    };
    tracing::debug!(
        path = %shown,
        rows = table.rows.len(),
        columns = table.columns.len(),
        "parsed {} table",
        kind.table_kind()
    );
    Ok(table)
}

fn read_bounded(path: &Path, bounds: &SectionBounds) -> Result<MatrixTable, GeoError> {
    read_section(open(path)?, bounds)
}

fn open(path: &Path) -> Result<BufReader<File>, GeoError> {
    let file = File::open(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            GeoError::DatasetNotFound(path.display().to_string())
        } else {
            GeoError::Filesystem(format!("open {}: {err}", path.display()))
        }
    })?;
    Ok(BufReader::new(file))
}
