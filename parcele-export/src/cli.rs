//! Définition et implémentation des commandes CLI
//!
//! - `export`: extraits JSON -> parcels.json, parcels.geojson, parcels_all.kml
//! - `schema`: schéma JSON du service d'extraction

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use parcele_export::export::default_jobs;
use parcele_export::{run_export, Config, ExportOptions, ExportStatus};
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Export extraction results to JSON, GeoJSON and KML
    Export(ExportArgs),

    /// Print the JSON schema extraction results must follow
    Schema,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Extraction result (.json) or directory searched recursively
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Output directory (défaut : env CF_OUTPUT_DIR)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to a JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Source reference system when documents carry none (défaut : EPSG:3844)
    #[arg(long)]
    pub crs: Option<String>,

    /// GeoJSON reference system: EPSG:4326 or EPSG:3857 (défaut : EPSG:4326)
    #[arg(long)]
    pub target_crs: Option<String>,

    /// Add one label point per parcel to the GeoJSON
    #[arg(long)]
    pub labels: bool,

    /// Do not create parcels_export.tar.bz2
    #[arg(long)]
    pub no_bundle: bool,

    /// Maximum number of documents read concurrently
    #[arg(long, alias = "threads")]
    pub jobs: Option<usize>,
}

/// Fusionne fichier de config, environnement et options CLI
pub fn resolve_config(args: &ExportArgs) -> Result<Config> {
    let mut config = Config::load_or_default(args.config.as_deref())?;
    config.apply_env()?;

    if let Some(crs) = &args.crs {
        config.source_crs = crs.clone();
    }
    if let Some(target) = &args.target_crs {
        config.target_crs = target.clone();
    }
    if args.labels {
        config.label_points = true;
    }
    if args.no_bundle {
        config.bundle = false;
    }
    if let Some(output) = &args.output {
        config.output_dir = Some(output.clone());
    }
    if args.jobs.is_some() {
        config.jobs = args.jobs;
    }
    Ok(config)
}

/// Exécute la commande export
pub async fn cmd_export(args: ExportArgs) -> Result<()> {
    let config = resolve_config(&args)?;

    let output_dir = config
        .output_dir
        .clone()
        .context("No output directory: use --output or set CF_OUTPUT_DIR")?;
    let jobs = config.jobs.unwrap_or_else(default_jobs);

    println!("=== Export ===");
    println!("Inputs: {}", args.input.len());
    println!("Output: {}", output_dir.display());
    println!("Default source CRS: {}", config.source_crs);
    println!("GeoJSON CRS: {}", config.target_crs);
    println!("Label points: {}", config.label_points);
    println!("Bundle: {}", config.bundle);
    println!("Jobs: {}", jobs);

    let options = ExportOptions {
        inputs: args.input,
        output_dir,
        pipeline: config.pipeline_config(),
        bundle: config.bundle,
        jobs,
    };

    let report = run_export(&options).await?;
    report.display();

    if report.status == ExportStatus::Failed {
        anyhow::bail!("Export failed: {}", report.summary());
    }
    info!("Export complete: {}", report.summary());
    Ok(())
}

/// Exécute la commande schema
pub fn cmd_schema() -> Result<()> {
    let schema = carte_funciara::extraction_schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(input: &str) -> ExportArgs {
        ExportArgs {
            input: vec![PathBuf::from(input)],
            output: None,
            config: None,
            crs: None,
            target_crs: None,
            labels: false,
            no_bundle: false,
            jobs: None,
        }
    }

    #[test]
    fn test_flags_override_config() {
        let mut a = args("extras.json");
        a.crs = Some("EPSG:4326".to_string());
        a.target_crs = Some("EPSG:3857".to_string());
        a.labels = true;
        a.no_bundle = true;
        a.output = Some(PathBuf::from("out"));
        a.jobs = Some(2);

        let config = resolve_config(&a).unwrap();
        assert_eq!(config.source_crs, "EPSG:4326");
        assert_eq!(config.target_crs, "EPSG:3857");
        assert!(config.label_points);
        assert!(!config.bundle);
        assert_eq!(config.output_dir, Some(PathBuf::from("out")));
        assert_eq!(config.jobs, Some(2));
    }

    #[test]
    fn test_missing_config_file() {
        let mut a = args("extras.json");
        a.config = Some(PathBuf::from("/nonexistent/config.json"));
        assert!(resolve_config(&a).is_err());
    }
}
