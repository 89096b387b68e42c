//! Émetteurs GeoJSON et KML
//!
//! Les deux émetteurs partagent la même règle d'exclusion (moins de 3 sommets)
//! et la même préparation des rings, parallélisée par parcelle.

pub mod geojson;
pub mod kml;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::reproject::CoordTransform;
use crate::ring::Ring;
use crate::types::{ParcelRecord, SkippedParcel};
use crate::CarteFunciaraError;

/// Parcelle cartographiable avec son ring reprojeté
#[derive(Debug, Clone)]
pub struct MappedParcel<'a> {
    /// Position dans la collection d'entrée
    pub index: usize,
    pub record: &'a ParcelRecord,
    pub ring: Ring,
}

/// Sépare les parcelles cartographiables des parcelles à exclure
pub fn partition(parcels: &[ParcelRecord]) -> (Vec<(usize, &ParcelRecord)>, Vec<SkippedParcel>) {
    let mut mappable = Vec::with_capacity(parcels.len());
    let mut skipped = Vec::new();

    for (index, record) in parcels.iter().enumerate() {
        if record.is_mappable() {
            mappable.push((index, record));
        } else {
            skipped.push(SkippedParcel::from_record(index, record));
        }
    }

    (mappable, skipped)
}

/// Liste des parcelles exclues des sorties géométriques
pub fn skipped_parcels(parcels: &[ParcelRecord]) -> Vec<SkippedParcel> {
    partition(parcels).1
}

/// Construit les rings de toutes les parcelles cartographiables
///
/// Le calcul est réparti sur le pool rayon; `collect` sur un itérateur indexé
/// restitue l'ordre d'entrée. Si plusieurs parcelles échouent, l'erreur
/// renvoyée est celle de la première dans l'ordre d'entrée, avec son
/// identifiant.
pub fn prepare_rings<'a, T>(
    parcels: &'a [ParcelRecord],
    transform: &T,
) -> Result<(Vec<MappedParcel<'a>>, Vec<SkippedParcel>), CarteFunciaraError>
where
    T: CoordTransform + ?Sized,
{
    let (mappable, skipped) = partition(parcels);

    for s in &skipped {
        warn!(parcel = %s, "Skipping parcel with insufficient geometry");
    }

    // Tous les résultats d'abord: l'erreur renvoyée est celle de plus petit index
    let results: Vec<Result<MappedParcel<'a>, CarteFunciaraError>> = mappable
        .par_iter()
        .map(|&(index, record)| {
            let ring = Ring::build(&record.points_xy, transform)
                .map_err(|e| e.for_parcel(record.locator(index)))?;
            Ok(MappedParcel {
                index,
                record,
                ring,
            })
        })
        .collect();
    let mapped = results.into_iter().collect::<Result<Vec<_>, _>>()?;

    debug!(
        mapped = mapped.len(),
        skipped = skipped.len(),
        "Rings prepared"
    );

    Ok((mapped, skipped))
}
