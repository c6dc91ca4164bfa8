use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::GeoError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesAccession(String);

impl SeriesAccession {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn number(&self) -> u64 {
        self.0
            .trim_start_matches("GSE")
            .parse()
            .unwrap_or_default()
    }
}

impl fmt::Display for SeriesAccession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SeriesAccession {
    type Err = GeoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        if !is_accession(&normalized, "GSE") {
            return Err(GeoError::InvalidSeriesAccession(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SampleAccession(String);

impl SampleAccession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleAccession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SampleAccession {
    type Err = GeoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        if !is_accession(&normalized, "GSM") {
            return Err(GeoError::InvalidSampleAccession(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

fn is_accession(value: &str, prefix: &str) -> bool {
    value
        .strip_prefix(prefix)
        .map(|digits| !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit()))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Series,
    Info,
    FamilySamples,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Series => "series",
            TableKind::Info => "info",
            TableKind::FamilySamples => "family_samples",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveKind {
    #[default]
    SeriesMatrix,
    Miniml,
}

impl ArchiveKind {
    pub fn remote_dir(&self) -> &'static str {
        match self {
            ArchiveKind::SeriesMatrix => "matrix",
            ArchiveKind::Miniml => "miniml",
        }
    }

    pub fn file_name(&self, accession: &SeriesAccession) -> String {
        match self {
            ArchiveKind::SeriesMatrix => format!("{accession}_series_matrix.txt.gz"),
            ArchiveKind::Miniml => format!("{accession}_family.xml.tgz"),
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveKind::SeriesMatrix => write!(f, "series-matrix"),
            ArchiveKind::Miniml => write!(f, "miniml"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DiseaseMode {
    Binary,
    #[default]
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationQuery {
    Age,
    MutationStatus,
    DiseaseState(DiseaseMode),
}

impl AnnotationQuery {
    pub fn with_disease_mode(self, mode: Option<DiseaseMode>) -> Self {
        match (self, mode) {
            (AnnotationQuery::DiseaseState(_), Some(mode)) => AnnotationQuery::DiseaseState(mode),
            (query, _) => query,
        }
    }
}

impl FromStr for AnnotationQuery {
    type Err = GeoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "age" => Ok(AnnotationQuery::Age),
            "brca1" | "mutation-status" => Ok(AnnotationQuery::MutationStatus),
            "arthritis" => Ok(AnnotationQuery::DiseaseState(DiseaseMode::Binary)),
            "crohns" | "disease-state" => Ok(AnnotationQuery::DiseaseState(DiseaseMode::Raw)),
            _ => Err(GeoError::InvalidAnnotationField(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_series_accession_valid() {
        let acc: SeriesAccession = " gse41037 ".parse().unwrap();
        assert_eq!(acc.as_str(), "GSE41037");
        assert_eq!(acc.number(), 41037);
    }

    #[test]
    fn parse_series_accession_invalid() {
        let err = "GSM41037".parse::<SeriesAccession>().unwrap_err();
        assert_matches!(err, GeoError::InvalidSeriesAccession(_));
        let err = "GSE".parse::<SeriesAccession>().unwrap_err();
        assert_matches!(err, GeoError::InvalidSeriesAccession(_));
    }

    #[test]
    fn parse_sample_accession() {
        let acc: SampleAccession = "GSM1007129".parse().unwrap();
        assert_eq!(acc.to_string(), "GSM1007129");
        assert_matches!(
            "GSM12a".parse::<SampleAccession>(),
            Err(GeoError::InvalidSampleAccession(_))
        );
    }

    #[test]
    fn archive_file_names() {
        let acc: SeriesAccession = "GSE42861".parse().unwrap();
        assert_eq!(
            ArchiveKind::SeriesMatrix.file_name(&acc),
            "GSE42861_series_matrix.txt.gz"
        );
        assert_eq!(ArchiveKind::Miniml.file_name(&acc), "GSE42861_family.xml.tgz");
    }

    #[test]
    fn parse_annotation_aliases() {
        assert_eq!("age".parse::<AnnotationQuery>().unwrap(), AnnotationQuery::Age);
        assert_eq!(
            "brca1".parse::<AnnotationQuery>().unwrap(),
            AnnotationQuery::MutationStatus
        );
        assert_eq!(
            "arthritis".parse::<AnnotationQuery>().unwrap(),
            AnnotationQuery::DiseaseState(DiseaseMode::Binary)
        );
        assert_eq!(
            "crohns".parse::<AnnotationQuery>().unwrap(),
            AnnotationQuery::DiseaseState(DiseaseMode::Raw)
        );
        assert_matches!(
            "height".parse::<AnnotationQuery>(),
            Err(GeoError::InvalidAnnotationField(_))
        );
    }

    #[test]
    fn disease_mode_override_only_touches_disease_state() {
        let query = AnnotationQuery::DiseaseState(DiseaseMode::Raw)
            .with_disease_mode(Some(DiseaseMode::Binary));
        assert_eq!(query, AnnotationQuery::DiseaseState(DiseaseMode::Binary));
        assert_eq!(
            AnnotationQuery::Age.with_disease_mode(Some(DiseaseMode::Binary)),
            AnnotationQuery::Age
        );
    }
}
