//! Rapport d'export avec graceful degradation
//!
//! Ce module collecte les résultats d'un export (documents lus, parcelles
//! cartographiées ou exclues, artefacts écrits) et les erreurs rencontrées.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use carte_funciara::{Artifact, SkippedParcel};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Statut global de l'export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportStatus {
    /// Tous les documents lus, tous les artefacts écrits
    Success,
    /// Au moins un artefact écrit malgré des erreurs
    PartialSuccess,
    /// Aucun artefact exploitable
    Failed,
}

/// Niveau de sévérité des erreurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorLevel {
    /// Erreur fatale: l'export brut lui-même a échoué
    Fatal,
    /// Erreur: document ou artefact manquant
    Error,
}

/// Erreur d'export avec contexte
#[derive(Debug, Clone, Serialize)]
pub struct ExportError {
    /// Niveau de sévérité
    pub level: ErrorLevel,
    /// Document d'entrée concerné (optionnel)
    pub input: Option<String>,
    /// Artefact concerné (optionnel)
    pub artifact: Option<String>,
    /// Message d'erreur
    pub message: String,
}

/// Warning d'export (parcelle non cartographiée)
#[derive(Debug, Clone, Serialize)]
pub struct ExportWarning {
    /// Parcelle concernée
    pub parcel: String,
    /// Message de warning
    pub message: String,
}

/// Fichier écrit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrittenFile {
    /// Artefact (`JSON`, `GeoJSON`, `KML`, `bundle`)
    pub artifact: String,
    /// Nom du fichier dans le répertoire de sortie
    pub file: String,
    /// Taille en octets
    pub size_bytes: u64,
    /// Checksum blake3 (hex)
    pub checksum: String,
}

/// Rapport complet d'export
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    /// Début de l'export
    pub started_at: DateTime<Utc>,
    /// Durée de l'export
    pub duration_secs: f64,
    /// Statut global
    pub status: ExportStatus,
    /// Système source effectivement utilisé
    pub source_crs: Option<String>,

    // Compteurs globaux
    /// Nombre de documents traités
    pub inputs_processed: usize,
    /// Nombre de documents en erreur
    pub inputs_failed: usize,
    /// Nombre de parcelles lues
    pub parcels_total: usize,
    /// Nombre de parcelles présentes dans GeoJSON/KML
    pub parcels_mapped: usize,
    /// Nombre de parcelles exclues faute de sommets
    pub parcels_skipped: usize,

    /// Artefacts écrits
    pub artifacts: Vec<WrittenFile>,
    /// Archive des artefacts
    pub bundle: Option<WrittenFile>,

    /// Liste des erreurs
    pub errors: Vec<ExportError>,
    /// Liste des warnings
    pub warnings: Vec<ExportWarning>,
}

impl Default for ExportReport {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            duration_secs: 0.0,
            status: ExportStatus::Success,
            source_crs: None,
            inputs_processed: 0,
            inputs_failed: 0,
            parcels_total: 0,
            parcels_mapped: 0,
            parcels_skipped: 0,
            artifacts: Vec::new(),
            bundle: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ExportReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre un document lu avec succès
    pub fn record_input_success(&mut self, parcels: usize) {
        self.inputs_processed += 1;
        self.parcels_total += parcels;
    }

    /// Enregistre un document en échec
    pub fn record_input_failure(&mut self, input: &str, message: &str) {
        self.inputs_processed += 1;
        self.inputs_failed += 1;
        self.errors.push(ExportError {
            level: ErrorLevel::Error,
            input: Some(input.to_string()),
            artifact: None,
            message: message.to_string(),
        });
    }

    /// Enregistre les parcelles exclues des sorties géométriques
    pub fn record_skipped(&mut self, skipped: &[SkippedParcel]) {
        self.parcels_skipped = skipped.len();
        self.parcels_mapped = self.parcels_total.saturating_sub(skipped.len());
        for s in skipped {
            let parcel = match s.nr_cadastral {
                Some(nr) => format!("#{} (nr_cadastral {})", s.index, nr),
                None => format!("#{}", s.index),
            };
            self.warnings.push(ExportWarning {
                parcel,
                message: format!("{} point(s), left out of GeoJSON and KML", s.points),
            });
        }
    }

    /// Enregistre un artefact écrit
    pub fn record_artifact(&mut self, file: WrittenFile) {
        self.artifacts.push(file);
    }

    /// Enregistre un artefact non produit
    pub fn record_artifact_failure(&mut self, artifact: Artifact, message: &str) {
        // Sans JSON brut, l'export n'a rien conservé
        let level = match artifact {
            Artifact::Json => ErrorLevel::Fatal,
            _ => ErrorLevel::Error,
        };
        self.errors.push(ExportError {
            level,
            input: None,
            artifact: Some(artifact.to_string()),
            message: message.to_string(),
        });
    }

    /// Enregistre une erreur sans artefact ni document associé
    pub fn record_error(&mut self, message: &str) {
        self.errors.push(ExportError {
            level: ErrorLevel::Error,
            input: None,
            artifact: None,
            message: message.to_string(),
        });
    }

    /// Définit la durée de l'export
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final basé sur les erreurs
    pub fn finalize(&mut self) {
        let has_fatal = self.errors.iter().any(|e| e.level == ErrorLevel::Fatal);
        let has_errors = !self.errors.is_empty();
        let has_output = !self.artifacts.is_empty();
        let all_inputs_failed =
            self.inputs_processed > 0 && self.inputs_failed == self.inputs_processed;

        self.status = if has_fatal || all_inputs_failed {
            ExportStatus::Failed
        } else if has_errors && has_output {
            ExportStatus::PartialSuccess
        } else if has_errors {
            ExportStatus::Failed
        } else {
            ExportStatus::Success
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("EXPORT REPORT - {}", self.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);
        if let Some(crs) = &self.source_crs {
            println!("Source CRS: {}", crs);
        }

        println!("\n--- SUMMARY ---");
        println!(
            "Inputs: {} processed, {} failed",
            self.inputs_processed, self.inputs_failed
        );
        println!(
            "Parcels: {} total, {} mapped, {} skipped",
            self.parcels_total, self.parcels_mapped, self.parcels_skipped
        );

        if !self.artifacts.is_empty() {
            println!("\n--- FILES ---");
            for f in self.artifacts.iter().chain(self.bundle.iter()) {
                println!(
                    "  {}: {} ({} bytes, blake3 {})",
                    f.artifact,
                    f.file,
                    f.size_bytes,
                    &f.checksum[..f.checksum.len().min(16)]
                );
            }
        }

        if !self.warnings.is_empty() {
            println!("\n--- WARNINGS ({}) ---", self.warnings.len());
            for w in self.warnings.iter().take(10) {
                println!("  [{}] {}", w.parcel, w.message);
            }
            if self.warnings.len() > 10 {
                println!("  ... and {} more", self.warnings.len() - 10);
            }
        }

        if !self.errors.is_empty() {
            println!("\n--- ERRORS ({}) ---", self.errors.len());
            for e in self.errors.iter().take(20) {
                let location = match (&e.input, &e.artifact) {
                    (Some(i), Some(a)) => format!("[{}:{}]", i, a),
                    (Some(i), None) => format!("[{}]", i),
                    (None, Some(a)) => format!("[{}]", a),
                    _ => String::new(),
                };
                println!("  {:?} {} {}", e.level, location, e.message);
            }
            if self.errors.len() > 20 {
                println!("  ... and {} more", self.errors.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{:?}: {} parcels ({} mapped, {} skipped), {} files, {} errors",
            self.status,
            self.parcels_total,
            self.parcels_mapped,
            self.parcels_skipped,
            self.artifacts.len(),
            self.errors.len()
        )
    }
}
