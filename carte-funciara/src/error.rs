//! Types d'erreurs pour le crate carte-funciara

use std::fmt;

use thiserror::Error;

/// Artefact produit par le pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// Export JSON brut `{crs, parcels}`
    Json,
    /// FeatureCollection GeoJSON
    GeoJson,
    /// Document KML
    Kml,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("JSON"),
            Self::GeoJson => f.write_str("GeoJSON"),
            Self::Kml => f.write_str("KML"),
        }
    }
}

/// Erreurs pouvant survenir lors de la reprojection ou de l'émission
#[derive(Debug, Error)]
pub enum CarteFunciaraError {
    /// Identifiant de système de référence inconnu ou non supporté dans ce rôle
    #[error("Unknown reference system: {identifier} ({reason})")]
    UnknownReferenceSystem { identifier: String, reason: String },

    /// Coordonnée non transformable (NaN, infini, hors domaine)
    #[error("Invalid coordinate ({x}, {y}): {reason}")]
    InvalidCoordinate { x: f64, y: f64, reason: String },

    /// Séquence de points vide
    #[error("Cannot build a ring from an empty point sequence")]
    EmptyGeometry,

    /// Erreur rattachée à une parcelle précise
    #[error("Parcel {parcel}: {source}")]
    Parcel {
        parcel: String,
        #[source]
        source: Box<CarteFunciaraError>,
    },

    /// Échec inattendu lors de l'assemblage d'un document
    #[error("{artifact} emission failed: {reason}")]
    Emission { artifact: Artifact, reason: String },

    /// Document d'extraction invalide
    #[error("Invalid extraction document {document}: {reason}")]
    InvalidExtraction { document: String, reason: String },

    /// Erreur de sérialisation JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CarteFunciaraError {
    /// Crée une erreur de système de référence inconnu
    pub fn unknown_crs(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnknownReferenceSystem {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de coordonnée invalide
    pub fn invalid_coordinate(x: f64, y: f64, reason: impl Into<String>) -> Self {
        Self::InvalidCoordinate {
            x,
            y,
            reason: reason.into(),
        }
    }

    /// Rattache l'erreur à une parcelle
    pub fn for_parcel(self, parcel: impl Into<String>) -> Self {
        Self::Parcel {
            parcel: parcel.into(),
            source: Box::new(self),
        }
    }

    /// Crée une erreur d'émission
    pub fn emission(artifact: Artifact, reason: impl Into<String>) -> Self {
        Self::Emission {
            artifact,
            reason: reason.into(),
        }
    }

    /// Vrai si l'erreur (ou sa cause) est un système de référence inconnu
    pub fn is_unknown_reference_system(&self) -> bool {
        match self {
            Self::UnknownReferenceSystem { .. } => true,
            Self::Parcel { source, .. } => source.is_unknown_reference_system(),
            _ => false,
        }
    }
}
