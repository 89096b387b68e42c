//! Définitions des ellipsoïdes

/// Ellipsoïde WGS84
pub struct WGS84;

impl WGS84 {
    /// Demi-grand axe (rayon équatorial) en mètres
    pub const A: f64 = 6378137.0;

    /// Aplatissement
    pub const F: f64 = 1.0 / 298.257223563;

    /// Première excentricité au carré
    pub const E2: f64 = 2.0 * Self::F - Self::F * Self::F;
}

/// Ellipsoïde Krassowsky 1940 (datum Pulkovo 1942(58), utilisé par Stereo 70)
pub struct Krassowsky1940;

impl Krassowsky1940 {
    pub const A: f64 = 6378245.0;
    pub const F: f64 = 1.0 / 298.3;
    pub const E2: f64 = 2.0 * Self::F - Self::F * Self::F;
    pub const E: f64 = 0.08181333401693115; // sqrt(E2)
}
