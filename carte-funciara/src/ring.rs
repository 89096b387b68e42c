//! Construction des rings reprojetés et de leur point d'étiquette

use geo::{Coord, LineString, Point, Polygon};

use crate::reproject::CoordTransform;
use crate::CarteFunciaraError;

/// Ring fermé en coordonnées cibles, avec son centroïde
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    /// Sommets fermés (premier == dernier), ordre source conservé
    pub exterior: LineString<f64>,
    /// Moyenne des sommets, point de fermeture exclu
    pub centroid: Point<f64>,
}

impl Ring {
    /// Reprojette `points` et ferme le ring
    pub fn build<T>(points: &[[f64; 2]], transform: &T) -> Result<Self, CarteFunciaraError>
    where
        T: CoordTransform + ?Sized,
    {
        let exterior = build_ring(points, transform)?;
        let centroid = centroid(&exterior).ok_or(CarteFunciaraError::EmptyGeometry)?;
        Ok(Self { exterior, centroid })
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(self.exterior.clone(), vec![])
    }

    pub fn len(&self) -> usize {
        self.exterior.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exterior.0.is_empty()
    }
}

/// Reprojette chaque point dans l'ordre et ferme la séquence si nécessaire
///
/// Ne rejette pas les séquences courtes: la règle des 3 sommets est appliquée
/// par les appelants qui produisent des polygones. Un ring déjà fermé n'est
/// pas refermé une seconde fois. Aucun sommet n'est réordonné ni dédoublonné.
pub fn build_ring<T>(
    points: &[[f64; 2]],
    transform: &T,
) -> Result<LineString<f64>, CarteFunciaraError>
where
    T: CoordTransform + ?Sized,
{
    if points.is_empty() {
        return Err(CarteFunciaraError::EmptyGeometry);
    }

    let mut coords = points
        .iter()
        .map(|&[x, y]| {
            let (lon, lat) = transform.transform(x, y)?;
            Ok(Coord { x: lon, y: lat })
        })
        .collect::<Result<Vec<Coord<f64>>, CarteFunciaraError>>()?;

    let first = coords[0];
    let last = coords[coords.len() - 1];
    if first != last {
        coords.push(first);
    }

    Ok(LineString::new(coords))
}

/// Centroïde naïf : moyenne arithmétique des sommets
///
/// Le point de fermeture dupliqué est exclu dès que le ring a plus d'un point.
/// Ce n'est pas le centre de gravité surfacique: pour un polygone non convexe
/// ou aux sommets inégalement répartis, le point peut tomber hors du polygone.
pub fn centroid(ring: &LineString<f64>) -> Option<Point<f64>> {
    let coords = &ring.0;
    let vertices = match coords.len() {
        0 => return None,
        1 => &coords[..],
        n => &coords[..n - 1],
    };

    let count = vertices.len() as f64;
    let (sum_x, sum_y) = vertices
        .iter()
        .fold((0.0, 0.0), |(sx, sy), c| (sx + c.x, sy + c.y));

    Some(Point::new(sum_x / count, sum_y / count))
}
