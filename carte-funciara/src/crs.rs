//! Identifiants de systèmes de référence et règle de fusion
//!
//! Formes acceptées (insensibles à la casse) :
//! - `EPSG:3844`, `EPSG::3844`
//! - `urn:ogc:def:crs:EPSG::3844`, `urn:ogc:def:crs:EPSG:6.18:3844`
//! - alias `Stereo70` / `Stereo 70` (3844) et `CRS84` / `OGC:CRS84` (4326)

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::CarteFunciaraError;

/// Système projeté pour lequel l'extraction est calibrée (Stereo 70)
pub const STEREO70: &str = "EPSG:3844";

/// Système géographique cible par défaut (WGS84)
pub const WGS84: &str = "EPSG:4326";

/// Systèmes de référence connus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crs {
    /// Pulkovo 1942(58) / Stereo70 (EPSG:3844)
    Stereo70,
    /// WGS84 géographique, ordre lon/lat (EPSG:4326)
    Wgs84,
    /// Web Mercator (EPSG:3857)
    WebMercator,
}

impl Crs {
    /// Mapping EPSG -> système
    const KNOWN: &'static [(u32, Crs)] = &[
        (3844, Crs::Stereo70),
        (4326, Crs::Wgs84),
        (3857, Crs::WebMercator),
    ];

    pub fn from_epsg(code: u32) -> Option<Self> {
        Self::KNOWN
            .iter()
            .find(|(epsg, _)| *epsg == code)
            .map(|(_, crs)| *crs)
    }

    pub fn epsg(self) -> u32 {
        match self {
            Self::Stereo70 => 3844,
            Self::Wgs84 => 4326,
            Self::WebMercator => 3857,
        }
    }

    /// Parse un identifiant textuel
    pub fn parse(identifier: &str) -> Result<Self, CarteFunciaraError> {
        let trimmed = identifier.trim();

        if let Some(crs) = parse_alias(trimmed) {
            return Ok(crs);
        }

        let code = parse_epsg_code(trimmed).ok_or_else(|| {
            CarteFunciaraError::unknown_crs(identifier, "not an EPSG identifier")
        })?;

        Self::from_epsg(code).ok_or_else(|| {
            CarteFunciaraError::unknown_crs(
                identifier,
                "supported: EPSG:3844, EPSG:4326, EPSG:3857",
            )
        })
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

fn parse_alias(identifier: &str) -> Option<Crs> {
    let normalized: String = identifier
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    match normalized.as_str() {
        "stereo70" => Some(Crs::Stereo70),
        "crs84" | "ogc:crs84" | "urn:ogc:def:crs:ogc:1.3:crs84" => Some(Crs::Wgs84),
        _ => None,
    }
}

fn parse_epsg_code(identifier: &str) -> Option<u32> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:urn:ogc:def:crs:epsg:[0-9.]*:|epsg::?)([0-9]{4,6})$")
            .expect("valid EPSG regex")
    });
    re.captures(identifier)?.get(1)?.as_str().parse().ok()
}

/// Fusionne les directives CRS de plusieurs documents
///
/// Le résultat vaut `EPSG:3844` seulement si au moins un document l'indique
/// exactement et qu'aucun autre n'indique un identifiant non nul différent.
/// Sinon `None` (le pipeline retombe sur son système par défaut).
pub fn merge_crs(values: &[Option<String>]) -> Option<String> {
    let has_stereo = values.iter().any(|c| c.as_deref() == Some(STEREO70));
    let has_conflict = values
        .iter()
        .flatten()
        .any(|c| c.as_str() != STEREO70);

    if has_stereo && !has_conflict {
        Some(STEREO70.to_string())
    } else {
        None
    }
}
