use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::annotation::{self, AnnotationField};
use crate::archive::{extract_family_archive, extract_series_matrix, remove_archive};
use crate::cache::{CacheBackend, CacheKey, FsCacheBackend};
use crate::config::SeriesRequest;
use crate::domain::{AnnotationQuery, ArchiveKind, SampleAccession, SeriesAccession, TableKind};
use crate::error::GeoError;
use crate::geo::GeoClient;
use crate::loader::{MatrixKind, MatrixTableLoader};
use crate::sample_file::{CleanedSample, SampleRow, SampleTable, clean_file};
use crate::sample_index::{SampleIndex, build_sample_index, list_family_files, load_family_samples};
use crate::store::Store;
use crate::table::MatrixTable;

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub extract: bool,
    pub force: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            extract: true,
            force: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub items: Vec<FetchItemResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchItemResult {
    pub accession: String,
    pub kind: String,
    pub action: String,
    pub archive_path: Option<String>,
    pub extracted_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesSummary {
    pub dataset: String,
    pub rows: usize,
    pub columns: usize,
    pub head: MatrixTable,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotationResult {
    pub dataset: String,
    pub sample: String,
    pub value: Option<AnnotationField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleIndexResult {
    pub dataset: String,
    pub samples: SampleIndex,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanResult {
    pub path: String,
    pub valid_rows: usize,
    pub rejected_rows: usize,
    pub head: Vec<SampleRow>,
    pub rejects: Vec<String>,
}

impl CleanResult {
    pub fn new(path: &Path, cleaned: &CleanedSample, head: usize) -> Self {
        Self {
            path: path.display().to_string(),
            valid_rows: cleaned.rows.len(),
            rejected_rows: cleaned.rejects.len(),
            head: cleaned.rows.iter().take(head).cloned().collect(),
            rejects: cleaned
                .rejects
                .iter()
                .map(|raw| String::from_utf8_lossy(raw).into_owned())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearResult {
    pub dataset: Option<String>,
    pub cleared: bool,
}

pub struct App<G: GeoClient, B: CacheBackend = FsCacheBackend> {
    store: Store,
    geo: G,
    loader: MatrixTableLoader<B>,
}

impl<G: GeoClient> App<G, FsCacheBackend> {
    pub fn new(store: Store, geo: G) -> Self {
        let backend = store.cache_backend();
        Self::with_backend(store, geo, backend)
    }
}

impl<G: GeoClient, B: CacheBackend> App<G, B> {
    pub fn with_backend(store: Store, geo: G, backend: B) -> Self {
        Self {
            store,
            geo,
            loader: MatrixTableLoader::new(backend),
        }
    }

    pub fn geo(&self) -> &G {
        &self.geo
    }

    pub fn fetch(
        &self,
        requests: &[SeriesRequest],
        options: FetchOptions,
    ) -> Result<FetchResult, GeoError> {
        self.store.ensure_data_root()?;
        let items = requests
            .iter()
            .map(|request| self.fetch_single(&request.accession, request.kind, options))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FetchResult { items })
    }

    fn fetch_single(
        &self,
        acc: &SeriesAccession,
        kind: ArchiveKind,
        options: FetchOptions,
    ) -> Result<FetchItemResult, GeoError> {
        let archive = self.store.archive_path(acc, kind);
        let extracted = match kind {
            ArchiveKind::SeriesMatrix => self.store.series_matrix_path(acc),
            ArchiveKind::Miniml => self.store.family_xml_path(acc),
        };
        let mut result = FetchItemResult {
            accession: acc.to_string(),
            kind: kind.to_string(),
            action: "present".to_string(),
            archive_path: None,
            extracted_path: None,
        };

        if !options.force && self.store.has_archive_or_extracted(acc, kind) {
            if extracted.as_std_path().exists() || !options.extract {
                tracing::debug!(%acc, %kind, "already on disk, skipping download");
                result.archive_path = archive
                    .as_std_path()
                    .exists()
                    .then(|| archive.to_string());
                result.extracted_path = extracted
                    .as_std_path()
                    .exists()
                    .then(|| extracted.to_string());
                return Ok(result);
            }
            result.action = "extract".to_string();
        } else {
            self.geo
                .download_archive(acc, kind, archive.as_std_path())?;
            result.action = "download".to_string();
        }

        if !options.extract {
            result.archive_path = Some(archive.to_string());
            return Ok(result);
        }

        match kind {
            ArchiveKind::SeriesMatrix => {
                extract_series_matrix(archive.as_std_path(), extracted.as_std_path())?
            }
            ArchiveKind::Miniml => extract_family_archive(
                archive.as_std_path(),
                self.store.family_dir(acc).as_std_path(),
            )?,
        }
        remove_archive(archive.as_std_path())?;
        if self.loader.cache().remove_dataset(acc)? {
            tracing::info!(%acc, "invalidated cached tables after extraction");
        }
        result.extracted_path = Some(extracted.to_string());
        Ok(result)
    }

    pub fn series_table(&self, acc: &SeriesAccession) -> Result<MatrixTable, GeoError> {
        let path = self.store.series_matrix_path(acc);
        self.loader
            .load(path.as_std_path(), MatrixKind::Series, acc)
    }

    pub fn info_table(&self, acc: &SeriesAccession) -> Result<MatrixTable, GeoError> {
        let path = self.store.series_matrix_path(acc);
        self.loader.load(path.as_std_path(), MatrixKind::Info, acc)
    }

    pub fn series_summary(
        &self,
        acc: &SeriesAccession,
        head: usize,
    ) -> Result<SeriesSummary, GeoError> {
        let table = self.series_table(acc)?;
        let (rows, columns) = table.shape();
        Ok(SeriesSummary {
            dataset: acc.to_string(),
            rows,
            columns,
            head: table.head(head),
        })
    }

    pub fn annotation(
        &self,
        acc: &SeriesAccession,
        sample: &SampleAccession,
        query: AnnotationQuery,
    ) -> Result<Option<AnnotationField>, GeoError> {
        let info = self.info_table(acc)?;
        let rows = info
            .column(sample.as_str())
            .ok_or_else(|| GeoError::SampleNotFound {
                dataset: acc.to_string(),
                sample: sample.to_string(),
            })?;
        Ok(annotation::extract(rows.as_slice(), query))
    }

    pub fn sample_index(&self, acc: &SeriesAccession) -> Result<SampleIndex, GeoError> {
        let files = list_family_files(&self.store.family_dir(acc))?;
        Ok(build_sample_index(files))
    }

    pub fn sample_position(
        &self,
        acc: &SeriesAccession,
        sample: &SampleAccession,
    ) -> Result<Option<usize>, GeoError> {
        Ok(self.sample_index(acc)?.get(sample.as_str()))
    }

    pub fn family_samples(
        &self,
        acc: &SeriesAccession,
    ) -> Result<BTreeMap<String, SampleTable>, GeoError> {
        let key = CacheKey::new(acc.clone(), TableKind::FamilySamples);
        let family_dir = self.store.family_dir(acc);
        self.loader
            .cache()
            .get_or_compute(&key, || load_family_samples(&family_dir))
    }

    pub fn clean_sample_file(&self, path: &Path, head: usize) -> Result<CleanResult, GeoError> {
        let cleaned = clean_file(path)?;
        Ok(CleanResult::new(path, &cleaned, head))
    }

    pub fn clear_cache(&self, acc: Option<&SeriesAccession>) -> Result<ClearResult, GeoError> {
        let cleared = match acc {
            Some(acc) => self.loader.cache().remove_dataset(acc)?,
            None => {
                self.loader.cache().clear()?;
                true
            }
        };
        Ok(ClearResult {
            dataset: acc.map(|acc| acc.to_string()),
            cleared,
        })
    }
}
