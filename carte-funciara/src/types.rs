//! Types de données pour le crate carte-funciara
//!
//! Les noms de champs suivent le schéma d'extraction (voir [`crate::extract`]),
//! ce qui permet de relire et réécrire l'export JSON brut sans table de correspondance.

use std::fmt;

use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::crs::merge_crs;

/// Une sarcină (charge inscrite au livre foncier : ipotecă, servitute, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncumbranceRecord {
    /// Type de charge, si mentionné explicitement
    pub tip: Option<String>,
    /// Nom du créancier / bénéficiaire
    pub descriere: Option<String>,
    /// Acte de référence
    pub act: Option<String>,
    /// Date de l'acte
    pub data: Option<String>,
    /// Code de référence
    pub referinta: Option<String>,
}

/// Une parcelle cadastrale telle que produite par l'extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParcelRecord {
    /// Numéro d'inscription interne
    #[serde(rename = "IE")]
    pub ie: Option<String>,
    pub nr_cadastral: Option<i64>,
    pub proprietar: Option<String>,
    pub localitate: Option<String>,
    pub judet: Option<String>,
    pub categorie_folosinta: Option<String>,
    pub intravilan: Option<bool>,
    pub suprafata_mp: Option<i64>,
    pub tarla: Option<String>,
    pub parcela: Option<String>,
    pub nr_topo: Option<String>,
    pub observatii: Option<String>,

    /// Charges inscrites; vide = aucune charge mentionnée (jamais null)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sarcini: Vec<EncumbranceRecord>,

    /// Sommets (x, y) dans le système projeté source, ordre significatif
    #[serde(default, deserialize_with = "null_as_empty")]
    pub points_xy: Vec<[f64; 2]>,

    /// Objet JSON lu en entrée, réécrit tel quel par l'export brut
    /// (entiers, clés absentes et ordre des clés compris)
    #[serde(skip)]
    pub source: Option<Map<String, Value>>,
}

/// Nombre minimal de sommets pour qu'une parcelle soit cartographiable
pub const MIN_MAPPABLE_POINTS: usize = 3;

impl ParcelRecord {
    /// Vrai si la parcelle a assez de sommets pour former un polygone
    pub fn is_mappable(&self) -> bool {
        self.points_xy.len() >= MIN_MAPPABLE_POINTS
    }

    /// Libellé du numéro cadastral (`n/a` si absent)
    pub fn cadastral_label(&self) -> String {
        match self.nr_cadastral {
            Some(nr) => nr.to_string(),
            None => "n/a".to_string(),
        }
    }

    /// Descriptions des sarcini non vides, jointes par `"; "`
    pub fn encumbrance_names(&self) -> String {
        self.sarcini
            .iter()
            .filter_map(|s| s.descriere.as_deref())
            .filter(|d| !d.is_empty())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Identifiant lisible pour les messages d'erreur
    pub fn locator(&self, index: usize) -> String {
        match (self.nr_cadastral, self.ie.as_deref()) {
            (Some(nr), Some(ie)) => format!("#{} (nr_cadastral {}, IE {})", index, nr, ie),
            (Some(nr), None) => format!("#{} (nr_cadastral {})", index, nr),
            (None, Some(ie)) => format!("#{} (IE {})", index, ie),
            (None, None) => format!("#{}", index),
        }
    }
}

/// Résultat d'extraction d'un document (contrat du service d'extraction)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub crs: Option<String>,
    #[serde(
        default,
        deserialize_with = "parcels_with_source",
        serialize_with = "serialize_parcels"
    )]
    pub parcels: Vec<ParcelRecord>,
}

/// Ensemble de parcelles d'une exécution, avec la directive CRS fusionnée
///
/// Assemblé une fois puis lu par les émetteurs. La forme sérialisée est
/// l'export JSON brut `{crs, parcels}`: une parcelle lue depuis du JSON y
/// est réécrite à partir de son objet d'origine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParcelCollection {
    pub crs: Option<String>,
    #[serde(
        default,
        deserialize_with = "parcels_with_source",
        serialize_with = "serialize_parcels"
    )]
    pub parcels: Vec<ParcelRecord>,
}

impl ParcelCollection {
    pub fn new(crs: Option<String>, parcels: Vec<ParcelRecord>) -> Self {
        Self { crs, parcels }
    }

    /// Concatène plusieurs résultats d'extraction et fusionne leur CRS
    pub fn from_extractions(results: Vec<ExtractionResult>) -> Self {
        let crs_values: Vec<Option<String>> = results.iter().map(|r| r.crs.clone()).collect();
        let crs = merge_crs(&crs_values);
        let parcels = results.into_iter().flat_map(|r| r.parcels).collect();
        Self { crs, parcels }
    }

    pub fn len(&self) -> usize {
        self.parcels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parcels.is_empty()
    }

    /// Export JSON brut: compact, UTF-8, caractères non-ASCII conservés tels quels
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Parcelle exclue des sorties géométriques faute de sommets suffisants
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedParcel {
    /// Position dans la collection d'entrée
    pub index: usize,
    pub nr_cadastral: Option<i64>,
    #[serde(rename = "IE")]
    pub ie: Option<String>,
    /// Nombre de sommets disponibles
    pub points: usize,
}

impl SkippedParcel {
    pub fn from_record(index: usize, record: &ParcelRecord) -> Self {
        Self {
            index,
            nr_cadastral: record.nr_cadastral,
            ie: record.ie.clone(),
            points: record.points_xy.len(),
        }
    }
}

impl fmt::Display for SkippedParcel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.nr_cadastral {
            Some(nr) => write!(f, "parcel #{} (nr_cadastral {})", self.index, nr)?,
            None => write!(f, "parcel #{} (no nr_cadastral)", self.index)?,
        }
        write!(
            f,
            ": {} point(s), at least {} required",
            self.points, MIN_MAPPABLE_POINTS
        )
    }
}

/// Désérialise les parcelles en conservant l'objet JSON de chacune
fn parcels_with_source<'de, D>(deserializer: D) -> Result<Vec<ParcelRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let objects: Vec<Map<String, Value>> = null_as_empty(deserializer)?;
    objects
        .into_iter()
        .enumerate()
        .map(|(index, object)| {
            let mut record = ParcelRecord::deserialize(Value::Object(object.clone()))
                .map_err(|e| D::Error::custom(format!("parcel #{}: {}", index, e)))?;
            record.source = Some(object);
            Ok(record)
        })
        .collect()
}

/// Sérialise les parcelles, depuis leur objet d'origine quand il existe
fn serialize_parcels<S>(parcels: &[ParcelRecord], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut seq = serializer.serialize_seq(Some(parcels.len()))?;
    for parcel in parcels {
        match &parcel.source {
            Some(object) => seq.serialize_element(object)?,
            None => seq.serialize_element(parcel)?,
        }
    }
    seq.end()
}

/// Désérialise `null` comme une séquence vide
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
