use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::{ArchiveKind, SeriesAccession};
use crate::error::GeoError;

const GEO_BASE_URL: &str = "https://ftp.ncbi.nlm.nih.gov/geo/series";

pub trait GeoClient: Send + Sync {
    fn download_archive(
        &self,
        accession: &SeriesAccession,
        kind: ArchiveKind,
        destination: &Path,
    ) -> Result<(), GeoError>;
}

#[derive(Clone)]
pub struct GeoHttpClient {
    client: Client,
    base_url: String,
}

impl GeoHttpClient {
    pub fn new() -> Result<Self, GeoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("geo-tools/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| GeoError::Filesystem(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|err| GeoError::GeoHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: GEO_BASE_URL.to_string(),
        })
    }

    pub fn archive_url(&self, accession: &SeriesAccession, kind: ArchiveKind) -> String {
        archive_url(&self.base_url, accession, kind)
    }

    fn write_response_to_file(
        &self,
        mut response: reqwest::blocking::Response,
        destination: &Path,
    ) -> Result<(), GeoError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "GEO request failed".to_string());
            return Err(GeoError::GeoStatus { status, message });
        }
        let parent = destination
            .parent()
            .ok_or_else(|| GeoError::Filesystem("invalid destination path".to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix(".geo-download")
            .tempfile_in(parent)
            .map_err(|err| GeoError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, temp.as_file_mut())
            .map_err(|err| GeoError::GeoHttp(err.to_string()))?;
        temp.persist(destination)
            .map_err(|err| GeoError::Filesystem(err.error.to_string()))?;
        Ok(())
    }
}

impl GeoClient for GeoHttpClient {
    fn download_archive(
        &self,
        accession: &SeriesAccession,
        kind: ArchiveKind,
        destination: &Path,
    ) -> Result<(), GeoError> {
        let url = self.archive_url(accession, kind);
        tracing::info!(%url, "downloading GEO archive");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| GeoError::GeoHttp(err.to_string()))?;
        self.write_response_to_file(response, destination)
    }
}

pub fn archive_url(base_url: &str, accession: &SeriesAccession, kind: ArchiveKind) -> String {
    format!(
        "{base_url}/{prefix}/{acc}/{dir}/{file}",
        prefix = geo_series_prefix(accession),
        acc = accession.as_str(),
        dir = kind.remote_dir(),
        file = kind.file_name(accession)
    )
}

// GSE41037 lives under GSE41nnn, GSE171 under GSEnnn.
pub fn geo_series_prefix(accession: &SeriesAccession) -> String {
    match accession.number() / 1000 {
        0 => "GSEnnn".to_string(),
        head => format!("GSE{head}nnn"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_prefix() {
        let acc: SeriesAccession = "GSE41037".parse().unwrap();
        assert_eq!(geo_series_prefix(&acc), "GSE41nnn");
        let acc: SeriesAccession = "GSE171".parse().unwrap();
        assert_eq!(geo_series_prefix(&acc), "GSEnnn");
        let acc: SeriesAccession = "GSE1000".parse().unwrap();
        assert_eq!(geo_series_prefix(&acc), "GSE1nnn");
    }

    #[test]
    fn matrix_and_miniml_urls() {
        let acc: SeriesAccession = "GSE42861".parse().unwrap();
        assert_eq!(
            archive_url(GEO_BASE_URL, &acc, ArchiveKind::SeriesMatrix),
            "https://ftp.ncbi.nlm.nih.gov/geo/series/GSE42nnn/GSE42861/matrix/GSE42861_series_matrix.txt.gz"
        );
        assert_eq!(
            archive_url(GEO_BASE_URL, &acc, ArchiveKind::Miniml),
            "https://ftp.ncbi.nlm.nih.gov/geo/series/GSE42nnn/GSE42861/miniml/GSE42861_family.xml.tgz"
        );
    }
}
