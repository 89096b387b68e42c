//! Projection Stereo 70 (EPSG:3844)
//!
//! Stéréographique oblique (méthode EPSG 9809) sur l'ellipsoïde Krassowsky 1940.
//! Les coordonnées sont en (easting, northing), comme dans les extraits de carte funciară.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use super::ellipsoid::Krassowsky1940;
use super::Geographic;

/// Paramètres Stereo 70
struct Stereo70 {
    /// Latitude origine
    lat0: f64,
    /// Longitude origine
    lon0: f64,
    /// Facteur d'échelle à l'origine
    k0: f64,
    /// False easting
    x0: f64,
    /// False northing
    y0: f64,
}

impl Default for Stereo70 {
    fn default() -> Self {
        Self {
            lat0: 46.0_f64.to_radians(), // 46°N
            lon0: 25.0_f64.to_radians(), // 25°E
            k0: 0.99975,
            x0: 500000.0,
            y0: 500000.0,
        }
    }
}

/// Constantes dérivées de la sphère conforme
pub(crate) struct ConformalSphere {
    params: Stereo70,
    /// Rayon de la sphère conforme
    r: f64,
    n: f64,
    c: f64,
    /// Latitude conforme de l'origine
    chi0: f64,
}

impl ConformalSphere {
    pub(crate) fn stereo70() -> Self {
        let params = Stereo70::default();
        let a = Krassowsky1940::A;
        let e = Krassowsky1940::E;
        let e2 = Krassowsky1940::E2;

        let sin0 = params.lat0.sin();
        let rho0 = a * (1.0 - e2) / (1.0 - e2 * sin0 * sin0).powf(1.5);
        let nu0 = a / (1.0 - e2 * sin0 * sin0).sqrt();
        let r = (rho0 * nu0).sqrt();

        let n = (1.0 + e2 * params.lat0.cos().powi(4) / (1.0 - e2)).sqrt();
        let s1 = (1.0 + sin0) / (1.0 - sin0);
        let s2 = (1.0 - e * sin0) / (1.0 + e * sin0);
        let w1 = (s1 * s2.powf(e)).powf(n);
        let sin_chi00 = (w1 - 1.0) / (w1 + 1.0);
        let c = (n + sin0) * (1.0 - sin_chi00) / ((n - sin0) * (1.0 + sin_chi00));
        let w2 = c * w1;
        let chi0 = ((w2 - 1.0) / (w2 + 1.0)).asin();

        Self {
            params,
            r,
            n,
            c,
            chi0,
        }
    }

    /// Inverse : (easting, northing) -> géographique sur Krassowsky
    pub(crate) fn inverse(&self, easting: f64, northing: f64) -> Geographic {
        let p = &self.params;
        let rk = self.r * p.k0;
        let de = easting - p.x0;
        let dn = northing - p.y0;

        let g = 2.0 * rk * (FRAC_PI_4 - self.chi0 / 2.0).tan();
        let h = 4.0 * rk * self.chi0.tan() + g;
        let i = (de / (h + dn)).atan();
        let j = (de / (g - dn)).atan() - i;

        let chi = self.chi0 + 2.0 * ((dn - de * (j / 2.0).tan()) / (2.0 * rk)).atan();
        let big_lambda = j + 2.0 * i + p.lon0;
        let lon = (big_lambda - p.lon0) / self.n + p.lon0;

        let sin_chi = chi.sin();
        let psi = 0.5 * ((1.0 + sin_chi) / (self.c * (1.0 - sin_chi))).ln() / self.n;
        let lat = latitude_from_isometric(psi, Krassowsky1940::E, Krassowsky1940::E2);

        Geographic::new(lon, lat)
    }
}

/// Calcule la latitude depuis la latitude isométrique (itératif)
fn latitude_from_isometric(psi: f64, e: f64, e2: f64) -> f64 {
    let mut lat = 2.0 * psi.exp().atan() - FRAC_PI_2;

    for _ in 0..20 {
        let sin_lat = lat.sin();
        let iso = ((FRAC_PI_4 + lat / 2.0).tan()
            * ((1.0 - e * sin_lat) / (1.0 + e * sin_lat)).powf(e / 2.0))
        .ln();
        let new_lat = lat - (iso - psi) * lat.cos() * (1.0 - e2 * sin_lat * sin_lat) / (1.0 - e2);

        if (new_lat - lat).abs() < 1e-14 {
            return new_lat;
        }
        lat = new_lat;
    }
    lat
}
