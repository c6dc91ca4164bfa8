use std::collections::BTreeMap;
use std::fs;
use std::sync::LazyLock;

use camino::Utf8Path;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::GeoError;
use crate::sample_file::{SampleTable, load_sample_table};

static SAMPLE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^GSM\d+").expect("sample accession pattern"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleIndex {
    positions: BTreeMap<String, usize>,
}

impl SampleIndex {
    pub fn get(&self, sample: &str) -> Option<usize> {
        self.positions.get(sample).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.positions.iter().map(|(sample, pos)| (sample.as_str(), *pos))
    }
}

pub fn sample_accession(file_name: &str) -> Option<&str> {
    SAMPLE_PREFIX.find(file_name).map(|found| found.as_str())
}

// A repeated accession keeps its last position.
pub fn build_sample_index<I, S>(file_names: I) -> SampleIndex
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let positions = file_names
        .into_iter()
        .filter_map(|name| sample_accession(name.as_ref()).map(str::to_string))
        .enumerate()
        .map(|(pos, sample)| (sample, pos))
        .collect();
    SampleIndex { positions }
}

pub fn list_family_files(family_dir: &Utf8Path) -> Result<Vec<String>, GeoError> {
    if !family_dir.as_std_path().is_dir() {
        return Err(GeoError::DatasetNotFound(family_dir.to_string()));
    }
    let entries = fs::read_dir(family_dir.as_std_path())
        .map_err(|err| GeoError::Filesystem(err.to_string()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| GeoError::Filesystem(err.to_string()))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

pub fn load_family_samples(
    family_dir: &Utf8Path,
) -> Result<BTreeMap<String, SampleTable>, GeoError> {
    let mut samples = BTreeMap::new();
    for name in list_family_files(family_dir)? {
        let Some(sample) = sample_accession(&name) else {
            continue;
        };
        let path = family_dir.join(&name);
        if !path.as_std_path().is_file() {
            continue;
        }
        let table = load_sample_table(path.as_std_path())?;
        samples.insert(sample.to_string(), table);
    }
    tracing::debug!(family = %family_dir, samples = samples.len(), "loaded family samples");
    Ok(samples)
}
