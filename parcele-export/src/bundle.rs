//! Archive des artefacts (.tar.bz2)

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use bzip2::Compression;
use tar::{Archive, Builder};
use tracing::debug;

/// Écrit les fichiers dans une archive tar compressée bzip2
///
/// Chaque fichier est stocké à la racine de l'archive sous son nom de base.
/// Retourne la taille de l'archive en octets.
pub fn write_bundle(archive_path: &Path, files: &[PathBuf]) -> Result<u64> {
    let file = File::create(archive_path)
        .with_context(|| format!("Cannot create {}", archive_path.display()))?;
    let encoder = BzEncoder::new(file, Compression::best());
    let mut builder = Builder::new(encoder);

    for path in files {
        let name = path
            .file_name()
            .with_context(|| format!("Not a file path: {}", path.display()))?;
        debug!(file = %path.display(), "Adding to bundle");
        builder
            .append_path_with_name(path, name)
            .with_context(|| format!("Cannot add {} to bundle", path.display()))?;
    }

    let encoder = builder.into_inner().context("Failed to finish tar stream")?;
    let mut file = encoder.finish().context("Failed to finish bzip2 stream")?;
    file.flush()?;

    let size = std::fs::metadata(archive_path)?.len();
    Ok(size)
}

/// Liste les noms des entrées d'une archive
pub fn list_bundle(archive_path: &Path) -> Result<Vec<String>> {
    let file = File::open(archive_path)
        .with_context(|| format!("Cannot open {}", archive_path.display()))?;
    let mut archive = Archive::new(BzDecoder::new(file));

    let mut names = Vec::new();
    for entry in archive.entries()? {
        let entry = entry?;
        names.push(entry.path()?.to_string_lossy().to_string());
    }
    Ok(names)
}
