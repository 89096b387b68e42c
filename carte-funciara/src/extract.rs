//! Interface avec le service d'extraction
//!
//! L'extraction (lecture d'un extrait de carte funciară PDF par un modèle)
//! est un collaborateur externe. Ce module fixe seulement son contrat:
//! le schéma JSON strict qu'il doit respecter et le trait [`Extractor`].

use serde_json::{json, Value};

use crate::types::ExtractionResult;
use crate::CarteFunciaraError;

/// Service qui transforme un document en résultat d'extraction
pub trait Extractor {
    /// `name` sert uniquement au contexte des messages d'erreur
    fn extract(&self, name: &str, document: &[u8]) -> Result<ExtractionResult, CarteFunciaraError>;
}

/// Décode un document déjà extrait (`{crs, parcels}`)
pub fn parse_extraction(name: &str, bytes: &[u8]) -> Result<ExtractionResult, CarteFunciaraError> {
    serde_json::from_slice(bytes).map_err(|e| CarteFunciaraError::InvalidExtraction {
        document: name.to_string(),
        reason: e.to_string(),
    })
}

fn nullable(kind: &str) -> Value {
    json!({ "type": [kind, "null"] })
}

/// Schéma JSON strict du résultat d'extraction
///
/// Tous les champs sont requis et nullables, aucune propriété additionnelle.
pub fn extraction_schema() -> Value {
    let encumbrance = json!({
        "type": "object",
        "properties": {
            "tip": nullable("string"),
            "descriere": nullable("string"),
            "act": nullable("string"),
            "data": nullable("string"),
            "referinta": nullable("string"),
        },
        "required": ["tip", "descriere", "act", "data", "referinta"],
        "additionalProperties": false,
    });

    let parcel = json!({
        "type": "object",
        "properties": {
            "IE": nullable("string"),
            "nr_cadastral": nullable("integer"),
            "proprietar": nullable("string"),
            "localitate": nullable("string"),
            "judet": nullable("string"),
            "categorie_folosinta": nullable("string"),
            "intravilan": nullable("boolean"),
            "suprafata_mp": nullable("integer"),
            "tarla": nullable("string"),
            "parcela": nullable("string"),
            "nr_topo": nullable("string"),
            "observatii": nullable("string"),
            "sarcini": { "type": "array", "items": encumbrance },
            "points_xy": {
                "type": "array",
                "items": {
                    "type": "array",
                    "minItems": 2,
                    "maxItems": 2,
                    "items": { "type": "number" },
                },
            },
        },
        "required": [
            "IE", "nr_cadastral", "proprietar", "localitate", "judet",
            "categorie_folosinta", "intravilan", "suprafata_mp", "tarla", "parcela",
            "nr_topo", "observatii", "sarcini", "points_xy",
        ],
        "additionalProperties": false,
    });

    json!({
        "type": "object",
        "properties": {
            "crs": nullable("string"),
            "parcels": { "type": "array", "items": parcel },
        },
        "required": ["crs", "parcels"],
        "additionalProperties": false,
    })
}
