//! Configuration de l'export
//!
//! Ordre de priorité : valeurs par défaut, fichier JSON, variables
//! d'environnement (`CF_*`), puis options de la ligne de commande.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use carte_funciara::crs::{STEREO70, WGS84};
use carte_funciara::PipelineConfig;
use serde::{Deserialize, Serialize};

/// Système source par défaut quand aucune directive n'est présente
pub const ENV_SOURCE_CRS: &str = "CF_SOURCE_CRS";
/// Système cible du GeoJSON
pub const ENV_TARGET_CRS: &str = "CF_TARGET_CRS";
/// Points d'étiquette dans le GeoJSON (`true`/`false`, `1`/`0`, ...)
pub const ENV_LABEL_POINTS: &str = "CF_LABEL_POINTS";
/// Répertoire de sortie
pub const ENV_OUTPUT_DIR: &str = "CF_OUTPUT_DIR";

/// Configuration principale
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Système source utilisé si les documents n'indiquent pas de CRS
    pub source_crs: String,

    /// Système cible du GeoJSON (EPSG:4326 ou EPSG:3857)
    pub target_crs: String,

    /// Ajouter un point d'étiquette par parcelle au GeoJSON
    pub label_points: bool,

    /// Nom de la FeatureCollection
    pub collection_name: String,

    /// Nom du document KML
    pub document_name: String,

    /// Répertoire de sortie
    pub output_dir: Option<PathBuf>,

    /// Créer l'archive parcels_export.tar.bz2
    pub bundle: bool,

    /// Nombre de documents lus en parallèle
    pub jobs: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_crs: STEREO70.to_string(),
            target_crs: WGS84.to_string(),
            label_points: false,
            collection_name: "parcels".to_string(),
            document_name: "Parcele".to_string(),
            output_dir: None,
            bundle: true,
            jobs: None,
        }
    }
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Fichier si fourni, sinon valeurs par défaut
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Applique les variables d'environnement `CF_*`
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applique des surcharges lues via `lookup` (clé -> valeur)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty(ENV_SOURCE_CRS) {
            self.source_crs = v.trim().to_string();
        }
        if let Some(v) = non_empty(ENV_TARGET_CRS) {
            self.target_crs = v.trim().to_string();
        }
        if let Some(v) = non_empty(ENV_LABEL_POINTS) {
            self.label_points = parse_bool(&v)
                .with_context(|| format!("Invalid {}: '{}'", ENV_LABEL_POINTS, v))?;
        }
        if let Some(v) = non_empty(ENV_OUTPUT_DIR) {
            self.output_dir = Some(PathBuf::from(v.trim()));
        }
        Ok(())
    }

    /// Configuration du pipeline correspondante
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            default_source_crs: self.source_crs.clone(),
            geojson_target_crs: self.target_crs.clone(),
            include_label_points: self.label_points,
            collection_name: self.collection_name.clone(),
            document_name: self.document_name.clone(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_pipeline() {
        let config = Config::default();
        assert_eq!(config.pipeline_config(), PipelineConfig::default());
        assert!(config.bundle);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{"label_points": true}"#).unwrap();
        assert!(config.label_points);
        assert_eq!(config.source_crs, "EPSG:3844");
        assert_eq!(config.document_name, "Parcele");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<Config, _> = serde_json::from_str(r#"{"srid": 4326}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup(&[
                ("CF_SOURCE_CRS", " EPSG:4326 "),
                ("CF_TARGET_CRS", "EPSG:3857"),
                ("CF_LABEL_POINTS", "yes"),
                ("CF_OUTPUT_DIR", "/tmp/out"),
            ]))
            .unwrap();

        assert_eq!(config.source_crs, "EPSG:4326");
        assert_eq!(config.target_crs, "EPSG:3857");
        assert!(config.label_points);
        assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup(&[("CF_SOURCE_CRS", ""), ("CF_LABEL_POINTS", "  ")]))
            .unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup(&[("CF_LABEL_POINTS", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("CF_LABEL_POINTS"));
    }
}
