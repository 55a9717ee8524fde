use anyhow::{Context, Result};
use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

/// Pack `files` flat (by file name) into a new deflate-compressed archive at `zip_path`.
pub fn bundle_zip(zip_path: &Path, files: &[PathBuf]) -> Result<()> {
    let out = File::create(zip_path)
        .with_context(|| format!("creating archive {}", zip_path.display()))?;
    let mut zip = ZipWriter::new(out);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .with_context(|| format!("no file name in {}", path.display()))?;
        zip.start_file(name.as_str(), options)
            .with_context(|| format!("adding {} to archive", name))?;
        let mut src =
            File::open(path).with_context(|| format!("opening {}", path.display()))?;
        io::copy(&mut src, &mut zip).with_context(|| format!("compressing {}", name))?;
    }

    zip.finish().context("finishing archive")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, io::Read};
    use tempfile::TempDir;
    use zip::ZipArchive;

    #[test]
    fn bundles_files_by_name() -> Result<()> {
        let dir = TempDir::new()?;
        let a = dir.path().join("a_cleaned.csv");
        let b = dir.path().join("batch_summary.json");
        fs::write(&a, "Timestamp,Time,Value [kWh]\n")?;
        fs::write(&b, "{}")?;
        let zip_path = dir.path().join("bundle.zip");

        bundle_zip(&zip_path, &[a, b])?;

        let mut archive = ZipArchive::new(File::open(&zip_path)?)?;
        assert_eq!(archive.len(), 2);
        let mut content = String::new();
        archive.by_name("batch_summary.json")?.read_to_string(&mut content)?;
        assert_eq!(content, "{}");
        assert!(archive.by_name("a_cleaned.csv").is_ok());
        Ok(())
    }
}
