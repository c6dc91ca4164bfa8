use std::fs;
use std::io;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;

use crate::cache::FsCacheBackend;
use crate::domain::{ArchiveKind, SeriesAccession};
use crate::error::GeoError;

pub const DATA_DIR: &str = "data";
pub const CACHE_DIR: &str = ".geo_tools_cache";

#[derive(Debug, Clone)]
pub struct Store {
    data_root: Utf8PathBuf,
    cache_root: Utf8PathBuf,
}

impl Store {
    pub fn new_with_paths(data_root: Utf8PathBuf, cache_root: Utf8PathBuf) -> Self {
        Self {
            data_root,
            cache_root,
        }
    }

    pub fn user_cache_root() -> Result<Utf8PathBuf, GeoError> {
        BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("geo-tools")).ok()
            })
            .ok_or_else(|| GeoError::Filesystem("unable to resolve cache directory".to_string()))
    }

    pub fn data_root(&self) -> &Utf8Path {
        &self.data_root
    }

    pub fn cache_root(&self) -> &Utf8Path {
        &self.cache_root
    }

    pub fn cache_backend(&self) -> FsCacheBackend {
        FsCacheBackend::new(self.cache_root.clone())
    }

    pub fn family_dir(&self, acc: &SeriesAccession) -> Utf8PathBuf {
        self.data_root.join(acc.as_str())
    }

    pub fn series_matrix_path(&self, acc: &SeriesAccession) -> Utf8PathBuf {
        self.family_dir(acc)
            .join(format!("{acc}_series_matrix.txt"))
    }

    pub fn family_xml_path(&self, acc: &SeriesAccession) -> Utf8PathBuf {
        self.family_dir(acc).join(format!("{acc}_family.xml"))
    }

    pub fn archive_path(&self, acc: &SeriesAccession, kind: ArchiveKind) -> Utf8PathBuf {
        self.data_root.join(kind.file_name(acc))
    }

    pub fn has_archive_or_extracted(&self, acc: &SeriesAccession, kind: ArchiveKind) -> bool {
        let extracted = match kind {
            ArchiveKind::SeriesMatrix => self.series_matrix_path(acc),
            ArchiveKind::Miniml => self.family_xml_path(acc),
        };
        self.archive_path(acc, kind).as_std_path().exists() || extracted.as_std_path().exists()
    }

    pub fn ensure_data_root(&self) -> Result<(), GeoError> {
        fs::create_dir_all(self.data_root.as_std_path())
            .map_err(|err| GeoError::Filesystem(err.to_string()))
    }
}

pub fn atomic_rename_dir(from: &Path, to: &Path) -> io::Result<()> {
    if to.exists() {
        fs::remove_dir_all(to)?;
    }
    fs::rename(from, to)
}
