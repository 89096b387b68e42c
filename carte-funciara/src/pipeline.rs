//! Orchestration : JSON brut, GeoJSON et KML depuis une collection de parcelles
//!
//! Chaque artefact réussit ou échoue indépendamment: un échec de reprojection
//! n'empêche jamais l'export JSON brut.

use tracing::{error, info, warn};

use crate::crs::{STEREO70, WGS84};
use crate::emit::geojson::{self, GeoJsonOptions, GeoJsonOutput};
use crate::emit::kml::{self, KmlDocument};
use crate::emit::skipped_parcels;
use crate::error::Artifact;
use crate::types::{ParcelCollection, ParcelRecord, SkippedParcel};
use crate::CarteFunciaraError;

/// Configuration explicite d'une exécution
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Système source utilisé quand la collection n'a pas de directive CRS
    pub default_source_crs: String,
    /// Système cible du GeoJSON (le KML est toujours en WGS84)
    pub geojson_target_crs: String,
    /// Ajouter des points d'étiquette au GeoJSON
    pub include_label_points: bool,
    /// Membre `name` de la FeatureCollection
    pub collection_name: String,
    /// `<name>` du document KML
    pub document_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_source_crs: STEREO70.to_string(),
            geojson_target_crs: WGS84.to_string(),
            include_label_points: false,
            collection_name: "parcels".to_string(),
            document_name: "Parcele".to_string(),
        }
    }
}

/// Résultat d'une exécution, un `Result` par artefact
#[derive(Debug)]
pub struct PipelineOutput {
    /// Système source effectivement utilisé
    pub source_crs: String,
    pub json: Result<Vec<u8>, CarteFunciaraError>,
    pub geojson: Result<GeoJsonOutput, CarteFunciaraError>,
    pub kml: Result<KmlDocument, CarteFunciaraError>,
    /// Parcelles exclues des deux sorties géométriques (même règle)
    pub skipped: Vec<SkippedParcel>,
}

impl PipelineOutput {
    /// Vrai si les trois artefacts ont été produits
    pub fn is_complete(&self) -> bool {
        self.json.is_ok() && self.geojson.is_ok() && self.kml.is_ok()
    }

    /// Artefacts en échec avec leur erreur
    pub fn failures(&self) -> Vec<(Artifact, &CarteFunciaraError)> {
        let mut failures = Vec::new();
        if let Err(e) = &self.json {
            failures.push((Artifact::Json, e));
        }
        if let Err(e) = &self.geojson {
            failures.push((Artifact::GeoJson, e));
        }
        if let Err(e) = &self.kml {
            failures.push((Artifact::Kml, e));
        }
        failures
    }
}

/// Pipeline de conversion
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Directive CRS si présente, sinon le système par défaut
    pub fn resolve_source_crs(&self, directive: Option<&str>) -> String {
        match directive {
            Some(crs) => crs.to_string(),
            None => self.config.default_source_crs.clone(),
        }
    }

    /// Exécute le pipeline sur des parcelles et une directive CRS
    pub fn run_records(
        &self,
        parcels: Vec<ParcelRecord>,
        crs_directive: Option<String>,
    ) -> PipelineOutput {
        self.run(&ParcelCollection::new(crs_directive, parcels))
    }

    /// Exécute le pipeline sur une collection
    pub fn run(&self, collection: &ParcelCollection) -> PipelineOutput {
        let source_crs = self.resolve_source_crs(collection.crs.as_deref());
        info!(
            parcels = collection.len(),
            source_crs = %source_crs,
            defaulted = collection.crs.is_none(),
            "Running pipeline"
        );

        let json = collection.to_json_bytes().map_err(|e| {
            CarteFunciaraError::emission(Artifact::Json, format!("serialization: {}", e))
        });

        let geojson_options = GeoJsonOptions {
            name: self.config.collection_name.clone(),
            include_label_points: self.config.include_label_points,
            generated_at: None,
        };
        // Les deux documents sont indépendants
        let (geojson, kml) = rayon::join(
            || {
                geojson::emit(
                    &collection.parcels,
                    &source_crs,
                    &self.config.geojson_target_crs,
                    &geojson_options,
                )
            },
            || {
                kml::emit(&collection.parcels, &source_crs, &self.config.document_name)
                    .map(|out| out.document)
            },
        );

        let skipped = skipped_parcels(&collection.parcels);
        if !skipped.is_empty() {
            let list: Vec<String> = skipped.iter().map(|s| s.to_string()).collect();
            warn!(
                count = skipped.len(),
                parcels = %list.join(", "),
                "Parcels without enough coordinates were left out of KML/GeoJSON"
            );
        }

        let output = PipelineOutput {
            source_crs,
            json,
            geojson,
            kml,
            skipped,
        };

        for (artifact, e) in output.failures() {
            error!(artifact = %artifact, error = %e, "Artifact generation failed");
        }

        output
    }
}
