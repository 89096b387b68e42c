//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Sources supportées :
//! - Stereo 70 (EPSG:3844) - système national roumain
//! - WGS84 (EPSG:4326) - identité
//!
//! Cibles supportées :
//! - WGS84 (EPSG:4326)
//! - Web Mercator (EPSG:3857)
//!
//! Entrée toujours en (x, y) = (easting, northing), sortie toujours en
//! (longitude, latitude) ou (x, y) Mercator, quel que soit l'ordre d'axes
//! officiel du système.

mod datum;
mod ellipsoid;
mod mercator;
mod stereo70;

use crate::crs::Crs;
use crate::CarteFunciaraError;

use stereo70::ConformalSphere;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Transformation de coordonnées réutilisable `(x, y) -> (lon, lat)`
///
/// Implémentée par [`Reprojector`] et par toute closure `Fn(f64, f64) -> (f64, f64)`.
pub trait CoordTransform: Sync {
    fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), CarteFunciaraError>;
}

impl<F> CoordTransform for F
where
    F: Fn(f64, f64) -> (f64, f64) + Sync,
{
    fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), CarteFunciaraError> {
        Ok(self(x, y))
    }
}

/// Reprojection entre un système source et un système cible
///
/// Les constantes de projection sont calculées une seule fois à la construction.
pub struct Reprojector {
    source: Crs,
    target: Crs,
    sphere: Option<ConformalSphere>,
}

impl Reprojector {
    /// Crée un reprojector depuis deux identifiants textuels (`EPSG:3844`, ...)
    pub fn new(source: &str, target: &str) -> Result<Self, CarteFunciaraError> {
        let source_crs = Crs::parse(source)?;
        let target_crs = Crs::parse(target)?;
        Self::from_crs(source_crs, target_crs)
    }

    /// Crée un reprojector depuis deux systèmes connus
    pub fn from_crs(source: Crs, target: Crs) -> Result<Self, CarteFunciaraError> {
        if source != target {
            if !Self::is_supported_source(source) {
                return Err(CarteFunciaraError::unknown_crs(
                    source.to_string(),
                    "not supported as a source; sources: EPSG:3844, EPSG:4326",
                ));
            }
            if !Self::is_supported_target(target) {
                return Err(CarteFunciaraError::unknown_crs(
                    target.to_string(),
                    "not supported as a target; targets: EPSG:4326, EPSG:3857",
                ));
            }
        }

        let sphere = (source == Crs::Stereo70 && source != target).then(ConformalSphere::stereo70);

        Ok(Self {
            source,
            target,
            sphere,
        })
    }

    /// Vérifie si le système source est supporté
    pub fn is_supported_source(crs: Crs) -> bool {
        matches!(crs, Crs::Stereo70 | Crs::Wgs84)
    }

    /// Vérifie si le système cible est supporté
    pub fn is_supported_target(crs: Crs) -> bool {
        matches!(crs, Crs::Wgs84 | Crs::WebMercator)
    }

    pub fn source(&self) -> Crs {
        self.source
    }

    pub fn target(&self) -> Crs {
        self.target
    }

    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), CarteFunciaraError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(CarteFunciaraError::invalid_coordinate(
                x,
                y,
                "input is not finite",
            ));
        }

        if self.is_identity() {
            return Ok((x, y));
        }

        // Étape 1: Source → Géographique (WGS84)
        let geo = self.source_to_geographic(x, y)?;

        // Étape 2: Géographique → Cible
        let (tx, ty) = match self.target {
            Crs::Wgs84 => geo.to_degrees(),
            Crs::WebMercator => mercator::geographic_to_web_mercator(geo),
            Crs::Stereo70 => {
                return Err(CarteFunciaraError::unknown_crs(
                    self.target.to_string(),
                    "not supported as a target",
                ))
            }
        };

        if !tx.is_finite() || !ty.is_finite() {
            return Err(CarteFunciaraError::invalid_coordinate(
                x,
                y,
                format!("{} -> {} produced a non-finite result", self.source, self.target),
            ));
        }

        Ok((tx, ty))
    }

    /// Convertit les coordonnées source en géographique (WGS84)
    fn source_to_geographic(&self, x: f64, y: f64) -> Result<Geographic, CarteFunciaraError> {
        match (self.source, &self.sphere) {
            (Crs::Stereo70, Some(sphere)) => Ok(datum::pulkovo58_to_wgs84(sphere.inverse(x, y))),
            (Crs::Wgs84, _) => Ok(Geographic::from_degrees(x, y)),
            _ => Err(CarteFunciaraError::unknown_crs(
                self.source.to_string(),
                "not supported as a source",
            )),
        }
    }

    /// Retourne une description du reprojector utilisé
    pub fn description(&self) -> String {
        if self.is_identity() {
            format!("identity ({})", self.source)
        } else {
            format!("{} -> {} (pure Rust)", self.source, self.target)
        }
    }
}

impl CoordTransform for Reprojector {
    fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), CarteFunciaraError> {
        self.transform_point(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo70_to_wgs84() {
        // Bucarest (environ 26.10°E, 44.44°N)
        let reproj = Reprojector::new("EPSG:3844", "EPSG:4326").unwrap();
        let (lon, lat) = reproj.transform_point(588000.0, 327000.0).unwrap();

        assert!((lon - 26.1036).abs() < 0.001, "lon={}", lon);
        assert!((lat - 44.4376).abs() < 0.001, "lat={}", lat);
    }

    #[test]
    fn test_axis_order_is_easting_northing() {
        // Un déplacement vers l'est ne change (presque) que la longitude
        let reproj = Reprojector::new("EPSG:3844", "EPSG:4326").unwrap();
        let (lon_a, lat_a) = reproj.transform_point(500000.0, 300000.0).unwrap();
        let (lon_b, lat_b) = reproj.transform_point(510000.0, 300000.0).unwrap();

        assert!(lon_b - lon_a > 0.1, "lon_a={} lon_b={}", lon_a, lon_b);
        assert!((lat_b - lat_a).abs() < 0.01, "lat_a={} lat_b={}", lat_a, lat_b);
    }

    #[test]
    fn test_stereo70_to_web_mercator() {
        let reproj = Reprojector::new("EPSG:3844", "EPSG:3857").unwrap();
        let (x, y) = reproj.transform_point(588000.0, 327000.0).unwrap();

        // Bucarest en Web Mercator: X ≈ 2.906e6, Y ≈ 5.532e6
        assert!((x - 2_906_000.0).abs() < 5000.0, "x={}", x);
        assert!((y - 5_532_000.0).abs() < 5000.0, "y={}", y);
    }

    #[test]
    fn test_identity_transform() {
        let reproj = Reprojector::new("EPSG:4326", "EPSG:4326").unwrap();
        assert!(reproj.is_identity());
        assert_eq!(reproj.transform_point(26.1, 44.4).unwrap(), (26.1, 44.4));
    }

    #[test]
    fn test_unknown_source() {
        let err = Reprojector::new("EPSG:99999", "EPSG:4326").err().unwrap();
        assert!(err.is_unknown_reference_system());
    }

    #[test]
    fn test_unknown_target() {
        let err = Reprojector::new("EPSG:3844", "EPSG:2154").err().unwrap();
        assert!(err.is_unknown_reference_system());
    }

    #[test]
    fn test_unsupported_roles() {
        assert!(Reprojector::new("EPSG:3857", "EPSG:4326").is_err());
        assert!(Reprojector::new("EPSG:4326", "EPSG:3844").is_err());
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let reproj = Reprojector::new("EPSG:3844", "EPSG:4326").unwrap();
        assert!(reproj.transform_point(f64::NAN, 300000.0).is_err());
        assert!(reproj.transform_point(500000.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_closure_as_transform() {
        let shift = |x: f64, y: f64| (x + 1.0, y - 1.0);
        assert_eq!(shift.transform(1.0, 1.0).unwrap(), (2.0, 0.0));
    }
}
