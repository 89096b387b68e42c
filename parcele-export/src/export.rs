//! Export : documents d'extraction -> parcels.json, parcels.geojson, parcels_all.kml
//!
//! Les documents sont lus en parallèle (ordre conservé), fusionnés, puis le
//! pipeline synchrone tourne dans `spawn_blocking`. Un document illisible ou
//! un artefact en échec est consigné dans le rapport sans interrompre l'export.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use carte_funciara::extract::parse_extraction;
use carte_funciara::{
    Artifact, CarteFunciaraError, ExtractionResult, Extractor, ParcelCollection, Pipeline,
    PipelineConfig,
};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::bundle::write_bundle;
use crate::report::{ExportReport, WrittenFile};

/// Export JSON brut
pub const JSON_FILE: &str = "parcels.json";
/// FeatureCollection GeoJSON
pub const GEOJSON_FILE: &str = "parcels.geojson";
/// Document KML
pub const KML_FILE: &str = "parcels_all.kml";
/// Archive des artefacts
pub const BUNDLE_FILE: &str = "parcels_export.tar.bz2";
/// Rapport d'export
pub const REPORT_FILE: &str = "export_report.json";

/// Extracteur qui relit un résultat d'extraction déjà produit (`{crs, parcels}`)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExtractor;

impl Extractor for JsonExtractor {
    fn extract(&self, name: &str, document: &[u8]) -> Result<ExtractionResult, CarteFunciaraError> {
        parse_extraction(name, document)
    }
}

/// Paramètres d'un export
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Fichiers ou répertoires d'entrée
    pub inputs: Vec<PathBuf>,
    /// Répertoire de sortie (créé si absent)
    pub output_dir: PathBuf,
    pub pipeline: PipelineConfig,
    /// Créer l'archive tar.bz2
    pub bundle: bool,
    /// Nombre de documents lus en parallèle
    pub jobs: usize,
}

impl ExportOptions {
    pub fn new(inputs: Vec<PathBuf>, output_dir: PathBuf) -> Self {
        Self {
            inputs,
            output_dir,
            pipeline: PipelineConfig::default(),
            bundle: true,
            jobs: default_jobs(),
        }
    }
}

/// Parallélisme par défaut
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Collecte récursivement les documents `.json`
///
/// Les fichiers passés explicitement sont gardés quelle que soit leur
/// extension; les répertoires sont parcourus en ordre alphabétique.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    for path in paths {
        if path.is_dir() {
            collect_dir(path, &mut inputs)?;
        } else if path.is_file() {
            inputs.push(path.clone());
        } else {
            anyhow::bail!("Input not found: {}", path.display());
        }
    }

    Ok(inputs)
}

fn collect_dir(dir: &Path, inputs: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Cannot read directory {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    entries.sort();

    for entry_path in entries {
        if entry_path.is_dir() {
            collect_dir(&entry_path, inputs)?;
        } else if entry_path.extension().map_or(false, |ext| ext == "json") {
            inputs.push(entry_path);
        }
    }
    Ok(())
}

/// Nom lisible d'un document pour les messages
fn input_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Lit et décode les documents, au plus `jobs` à la fois, dans l'ordre d'entrée
pub async fn load_inputs<E>(
    paths: Vec<PathBuf>,
    extractor: Arc<E>,
    jobs: usize,
) -> Vec<(PathBuf, Result<ExtractionResult>)>
where
    E: Extractor + Send + Sync + 'static,
{
    stream::iter(paths)
        .map(|path| {
            let extractor = Arc::clone(&extractor);
            async move {
                let result = load_one(&path, extractor).await;
                (path, result)
            }
        })
        .buffered(jobs.max(1))
        .collect()
        .await
}

async fn load_one<E>(path: &Path, extractor: Arc<E>) -> Result<ExtractionResult>
where
    E: Extractor + Send + Sync + 'static,
{
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let name = input_name(path);

    let result = tokio::task::spawn_blocking(move || extractor.extract(&name, &bytes))
        .await
        .context("Extraction task failed")??;

    debug!(
        input = %path.display(),
        parcels = result.parcels.len(),
        crs = ?result.crs,
        "Loaded extraction result"
    );
    Ok(result)
}

/// Exécute un export complet et écrit le rapport dans le répertoire de sortie
pub async fn run_export(options: &ExportOptions) -> Result<ExportReport> {
    run_export_with(options, Arc::new(JsonExtractor)).await
}

/// Comme [`run_export`], avec un extracteur fourni par l'appelant
pub async fn run_export_with<E>(options: &ExportOptions, extractor: Arc<E>) -> Result<ExportReport>
where
    E: Extractor + Send + Sync + 'static,
{
    let started_at = Instant::now();
    let mut report = ExportReport::new();

    let inputs = collect_inputs(&options.inputs)?;
    if inputs.is_empty() {
        anyhow::bail!("No extraction results (.json) found in the given inputs");
    }
    info!(inputs = inputs.len(), jobs = options.jobs, "Loading extraction results");

    let mut results = Vec::with_capacity(inputs.len());
    for (path, loaded) in load_inputs(inputs, extractor, options.jobs).await {
        match loaded {
            Ok(result) => {
                report.record_input_success(result.parcels.len());
                results.push(result);
            }
            Err(e) => {
                warn!("Failed to load {}: {:#}", path.display(), e);
                report.record_input_failure(&input_name(&path), &format!("{:#}", e));
            }
        }
    }

    let collection = ParcelCollection::from_extractions(results);
    let pipeline = Pipeline::new(options.pipeline.clone());

    let output = tokio::task::spawn_blocking(move || pipeline.run(&collection))
        .await
        .context("Pipeline task failed")?;

    report.source_crs = Some(output.source_crs.clone());
    report.record_skipped(&output.skipped);

    let output_dir = &options.output_dir;
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Cannot create {}", output_dir.display()))?;

    let geojson = output.geojson.and_then(|g| g.to_bytes());
    let kml = output.kml.map(|doc| doc.into_bytes());
    let artifacts = [
        (Artifact::Json, JSON_FILE, output.json),
        (Artifact::GeoJson, GEOJSON_FILE, geojson),
        (Artifact::Kml, KML_FILE, kml),
    ];

    let mut written = Vec::new();
    for (artifact, file_name, bytes) in artifacts {
        match bytes {
            Ok(bytes) => {
                let path = output_dir.join(file_name);
                let entry = write_artifact(&path, &artifact.to_string(), &bytes).await?;
                info!(file = %path.display(), bytes = entry.size_bytes, "Wrote {}", artifact);
                report.record_artifact(entry);
                written.push(path);
            }
            Err(e) => {
                // Un fichier d'une exécution précédente ne doit pas passer pour le résultat
                remove_stale(&output_dir.join(file_name)).await?;
                report.record_artifact_failure(artifact, &e.to_string());
            }
        }
    }

    if !options.bundle || written.is_empty() {
        remove_stale(&output_dir.join(BUNDLE_FILE)).await?;
    } else {
        let bundle_path = output_dir.join(BUNDLE_FILE);
        let result = tokio::task::spawn_blocking({
            let bundle_path = bundle_path.clone();
            move || -> Result<WrittenFile> {
                let size = write_bundle(&bundle_path, &written)?;
                Ok(WrittenFile {
                    artifact: "bundle".to_string(),
                    file: BUNDLE_FILE.to_string(),
                    size_bytes: size,
                    checksum: compute_file_checksum(&bundle_path)?,
                })
            }
        })
        .await
        .context("Bundle task failed")?;

        match result {
            Ok(entry) => {
                info!(file = %bundle_path.display(), bytes = entry.size_bytes, "Wrote bundle");
                report.bundle = Some(entry);
            }
            Err(e) => {
                warn!("Failed to write bundle: {:#}", e);
                report.record_error(&format!("bundle: {:#}", e));
            }
        }
    }

    report.set_duration(started_at.elapsed());
    report.finalize();

    let report_path = output_dir.join(REPORT_FILE);
    report
        .save_to_file(&report_path)
        .with_context(|| format!("Cannot write {}", report_path.display()))?;

    info!("{}", report.summary());
    Ok(report)
}

/// Écrit un artefact et calcule sa taille et son checksum
async fn write_artifact(path: &Path, artifact: &str, bytes: &[u8]) -> Result<WrittenFile> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Cannot write {}", path.display()))?;

    Ok(WrittenFile {
        artifact: artifact.to_string(),
        file: input_name(path),
        size_bytes: bytes.len() as u64,
        checksum: blake3::hash(bytes).to_hex().to_string(),
    })
}

/// Supprime un artefact laissé par un export précédent, s'il existe
async fn remove_stale(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            warn!(file = %path.display(), "Removed stale artifact from a previous export");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Cannot remove stale {}", path.display())),
    }
}

/// Calcule le checksum blake3 d'un fichier
pub fn compute_file_checksum(path: &Path) -> Result<String> {
    use std::fs::File;
    use std::io::Read;

    let mut file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 65536]; // 64KB buffer

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}
