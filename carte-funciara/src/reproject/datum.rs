//! Changement de datum Pulkovo 1942(58) -> WGS84
//!
//! Transformation de Helmert à 7 paramètres (convention position vector)
//! appliquée en coordonnées géocentriques.

use super::ellipsoid::{Krassowsky1940, WGS84};
use super::Geographic;

/// Paramètres de Helmert (translations en mètres, rotations en secondes d'arc, échelle en ppm)
struct Helmert {
    tx: f64,
    ty: f64,
    tz: f64,
    rx: f64,
    ry: f64,
    rz: f64,
    ppm: f64,
}

/// Pulkovo 1942(58) -> WGS84 pour la Roumanie
const PULKOVO58_TO_WGS84: Helmert = Helmert {
    tx: 2.3287,
    ty: -147.0425,
    tz: -92.0802,
    rx: 0.3092483,
    ry: -0.32482185,
    rz: -0.49729934,
    ppm: 5.68906266,
};

const ARCSEC: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// Convertit un point géographique Pulkovo 1942(58) (h = 0) en WGS84
pub fn pulkovo58_to_wgs84(geo: Geographic) -> Geographic {
    let (x, y, z) = geographic_to_geocentric(geo, Krassowsky1940::A, Krassowsky1940::E2);

    let p = &PULKOVO58_TO_WGS84;
    let (rx, ry, rz) = (p.rx * ARCSEC, p.ry * ARCSEC, p.rz * ARCSEC);
    let s = 1.0 + p.ppm * 1e-6;

    let x2 = p.tx + s * (x - rz * y + ry * z);
    let y2 = p.ty + s * (rz * x + y - rx * z);
    let z2 = p.tz + s * (-ry * x + rx * y + z);

    geocentric_to_geographic(x2, y2, z2, WGS84::A, WGS84::E2)
}

fn geographic_to_geocentric(geo: Geographic, a: f64, e2: f64) -> (f64, f64, f64) {
    let sin_lat = geo.lat.sin();
    let nu = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let x = nu * geo.lat.cos() * geo.lon.cos();
    let y = nu * geo.lat.cos() * geo.lon.sin();
    let z = nu * (1.0 - e2) * sin_lat;
    (x, y, z)
}

/// Géocentrique -> géographique (itératif, la hauteur est ignorée en sortie)
fn geocentric_to_geographic(x: f64, y: f64, z: f64, a: f64, e2: f64) -> Geographic {
    let p = x.hypot(y);
    let lon = y.atan2(x);
    let mut lat = z.atan2(p * (1.0 - e2));

    for _ in 0..10 {
        let sin_lat = lat.sin();
        let nu = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let h = p / lat.cos() - nu;
        let new_lat = z.atan2(p * (1.0 - e2 * nu / (nu + h)));
        if (new_lat - lat).abs() < 1e-14 {
            return Geographic::new(lon, new_lat);
        }
        lat = new_lat;
    }
    Geographic::new(lon, lat)
}
