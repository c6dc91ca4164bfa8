use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use flate2::read::{GzDecoder, MultiGzDecoder};
use tar::Archive;
use tempfile::Builder;

use crate::error::GeoError;
use crate::store::atomic_rename_dir;

// Invalid UTF-8 is replaced.
pub fn extract_series_matrix(archive_path: &Path, destination: &Path) -> Result<(), GeoError> {
    let file = fs::File::open(archive_path).map_err(|err| {
        GeoError::ArchiveExtraction(format!("open {}: {err}", archive_path.display()))
    })?;
    let mut bytes = Vec::new();
    MultiGzDecoder::new(file)
        .read_to_end(&mut bytes)
        .map_err(|err| GeoError::ArchiveExtraction(err.to_string()))?;
    let text = String::from_utf8_lossy(&bytes);

    let parent = destination
        .parent()
        .ok_or_else(|| GeoError::Filesystem("invalid destination path".to_string()))?;
    fs::create_dir_all(parent).map_err(|err| GeoError::Filesystem(err.to_string()))?;
    let mut temp = Builder::new()
        .prefix(".geo-matrix")
        .tempfile_in(parent)
        .map_err(|err| GeoError::Filesystem(err.to_string()))?;
    temp.write_all(text.as_bytes())
        .map_err(|err| GeoError::Filesystem(err.to_string()))?;
    temp.persist(destination)
        .map_err(|err| GeoError::Filesystem(err.error.to_string()))?;
    tracing::info!(
        archive = %archive_path.display(),
        output = %destination.display(),
        "extracted series matrix"
    );
    Ok(())
}

// Existing files in target_dir survive unless the archive has the same name.
pub fn extract_family_archive(archive_path: &Path, target_dir: &Path) -> Result<(), GeoError> {
    let parent = target_dir
        .parent()
        .ok_or_else(|| GeoError::Filesystem("invalid destination path".to_string()))?;
    fs::create_dir_all(parent).map_err(|err| GeoError::Filesystem(err.to_string()))?;
    let staging = Builder::new()
        .prefix(".geo-family")
        .tempdir_in(parent)
        .map_err(|err| GeoError::Filesystem(err.to_string()))?;

    let file = fs::File::open(archive_path).map_err(|err| {
        GeoError::ArchiveExtraction(format!("open {}: {err}", archive_path.display()))
    })?;
    let mut archive = Archive::new(GzDecoder::new(file));
    let entries = archive
        .entries()
        .map_err(|err| GeoError::ArchiveExtraction(format!("read tar entries: {err}")))?;
    let mut count = 0usize;
    for entry in entries {
        let mut entry =
            entry.map_err(|err| GeoError::ArchiveExtraction(format!("read tar entry: {err}")))?;
        let unpacked = entry
            .unpack_in(staging.path())
            .map_err(|err| GeoError::ArchiveExtraction(err.to_string()))?;
        if !unpacked {
            return Err(GeoError::ArchiveExtraction(
                "tar entry path traversal detected".to_string(),
            ));
        }
        count += 1;
    }

    fs::create_dir_all(target_dir).map_err(|err| GeoError::Filesystem(err.to_string()))?;
    let staged =
        fs::read_dir(staging.path()).map_err(|err| GeoError::Filesystem(err.to_string()))?;
    for entry in staged {
        let entry = entry.map_err(|err| GeoError::Filesystem(err.to_string()))?;
        let target = target_dir.join(entry.file_name());
        let moved = if entry.path().is_dir() {
            atomic_rename_dir(&entry.path(), &target)
        } else {
            fs::rename(entry.path(), &target)
        };
        moved.map_err(|err| GeoError::Filesystem(err.to_string()))?;
    }
    tracing::info!(
        archive = %archive_path.display(),
        output = %target_dir.display(),
        entries = count,
        "extracted family archive"
    );
    Ok(())
}

pub fn remove_archive(archive_path: &Path) -> Result<(), GeoError> {
    match fs::remove_file(archive_path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(GeoError::Filesystem(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;

    fn gzip(content: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn series_matrix_multi_member_gzip() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("GSE1_series_matrix.txt.gz");
        let mut bytes = gzip(b"!Series_title\t\"a\"\n");
        bytes.extend(gzip(b"!series_matrix_table_begin\n"));
        fs::write(&archive, bytes).unwrap();

        let output = temp.path().join("GSE1").join("GSE1_series_matrix.txt");
        extract_series_matrix(&archive, &output).unwrap();
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "!Series_title\t\"a\"\n!series_matrix_table_begin\n"
        );
    }

    #[test]
    fn family_archive_unpacks_into_target() {
        let temp = tempfile::tempdir().unwrap();
        let archive_path = temp.path().join("GSE1_family.xml.tgz");
        {
            let encoder = GzEncoder::new(
                fs::File::create(&archive_path).unwrap(),
                Compression::default(),
            );
            let mut builder = tar::Builder::new(encoder);
            let data = b"cg1\t0.1\n";
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, "GSM1-tbl-1.txt", &data[..])
                .unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }

        let target = temp.path().join("GSE1");
        extract_family_archive(&archive_path, &target).unwrap();
        assert_eq!(
            fs::read_to_string(target.join("GSM1-tbl-1.txt")).unwrap(),
            "cg1\t0.1\n"
        );
    }

    #[test]
    fn family_archive_keeps_existing_files() {
        let temp = tempfile::tempdir().unwrap();
        let archive_path = temp.path().join("GSE3_family.xml.tgz");
        {
            let encoder = GzEncoder::new(
                fs::File::create(&archive_path).unwrap(),
                Compression::default(),
            );
            let mut builder = tar::Builder::new(encoder);
            let mut header = tar::Header::new_gnu();
            header.set_size(5);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, "GSE3_family.xml", &b"<xml>"[..])
                .unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }
        let target = temp.path().join("GSE3");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("GSE3_series_matrix.txt"), "matrix").unwrap();

        extract_family_archive(&archive_path, &target).unwrap();
        assert!(target.join("GSE3_family.xml").exists());
        assert_eq!(
            fs::read_to_string(target.join("GSE3_series_matrix.txt")).unwrap(),
            "matrix"
        );
    }

    #[test]
    fn corrupt_archive_leaves_no_target() {
        let temp = tempfile::tempdir().unwrap();
        let archive_path = temp.path().join("GSE2_family.xml.tgz");
        fs::write(&archive_path, b"not a gzip stream").unwrap();

        let target = temp.path().join("GSE2");
        assert!(extract_family_archive(&archive_path, &target).is_err());
        assert!(!target.exists());
    }
}
