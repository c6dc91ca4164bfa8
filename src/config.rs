use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{ArchiveKind, SeriesAccession};
use crate::error::GeoError;
use crate::store::{CACHE_DIR, DATA_DIR, Store};

pub const CONFIG_FILE: &str = "geo-tools.json";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub data_root: Option<String>,
    #[serde(default)]
    pub cache_root: Option<String>,
    #[serde(default)]
    pub user_cache: bool,
    #[serde(default)]
    pub series: Vec<SeriesEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SeriesEntry {
    Shorthand(String),
    Detailed(SeriesEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SeriesEntryObject {
    pub accession: String,
    #[serde(default)]
    pub kind: Option<ArchiveKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub accession: SeriesAccession,
    pub kind: ArchiveKind,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub data_root: Utf8PathBuf,
    pub cache_root: Utf8PathBuf,
    pub series: Vec<SeriesRequest>,
}

impl ResolvedConfig {
    pub fn store(&self) -> Store {
        Store::new_with_paths(self.data_root.clone(), self.cache_root.clone())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    // Without an explicit path a missing geo-tools.json resolves to the defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, GeoError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| GeoError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| GeoError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, GeoError> {
        let schema_version = config.schema_version.unwrap_or(SCHEMA_VERSION);
        if schema_version != SCHEMA_VERSION {
            return Err(GeoError::ConfigParse(format!(
                "unsupported schema_version {schema_version}, expected {SCHEMA_VERSION}"
            )));
        }

        let data_root = Utf8PathBuf::from(config.data_root.as_deref().unwrap_or(DATA_DIR));
        let cache_root = match (config.cache_root, config.user_cache) {
            (Some(root), _) => Utf8PathBuf::from(root),
            (None, true) => Store::user_cache_root()?,
            (None, false) => Utf8PathBuf::from(CACHE_DIR),
        };

        let series = config
            .series
            .into_iter()
            .map(|entry| match entry {
                SeriesEntry::Shorthand(value) => Ok(SeriesRequest {
                    accession: value.parse()?,
                    kind: ArchiveKind::default(),
                }),
                SeriesEntry::Detailed(obj) => Ok(SeriesRequest {
                    accession: obj.accession.parse()?,
                    kind: obj.kind.unwrap_or_default(),
                }),
            })
            .collect::<Result<Vec<_>, GeoError>>()?;

        Ok(ResolvedConfig {
            schema_version,
            data_root,
            cache_root,
            series,
        })
    }
}
