//! Émission GeoJSON (FeatureCollection, RFC 7946)
//!
//! Écart volontaire à la RFC 7946 : un membre `crs` nommant le système cible
//! est conservé pour la compatibilité avec les outils SIG qui le lisent encore.

use chrono::{DateTime, SecondsFormat, Utc};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;
use tracing::info;

use super::{prepare_rings, MappedParcel};
use crate::error::Artifact;
use crate::reproject::Reprojector;
use crate::types::{ParcelRecord, SkippedParcel};
use crate::CarteFunciaraError;

/// Valeur du marqueur des points d'étiquette
pub const LABEL_POINT: &str = "label_point";

/// Options d'émission GeoJSON
#[derive(Debug, Clone)]
pub struct GeoJsonOptions {
    /// Nom de la collection (membre `name`)
    pub name: String,
    /// Ajouter un Point au centroïde de chaque parcelle
    pub include_label_points: bool,
    /// Horodatage imposé; `None` = maintenant
    pub generated_at: Option<DateTime<Utc>>,
}

impl Default for GeoJsonOptions {
    fn default() -> Self {
        Self {
            name: "parcels".to_string(),
            include_label_points: true,
            generated_at: None,
        }
    }
}

/// Document GeoJSON et parcelles exclues
#[derive(Debug, Clone)]
pub struct GeoJsonOutput {
    pub collection: FeatureCollection,
    pub skipped: Vec<SkippedParcel>,
}

impl GeoJsonOutput {
    /// Sérialisation compacte UTF-8 (non-ASCII conservé)
    pub fn to_bytes(&self) -> Result<Vec<u8>, CarteFunciaraError> {
        serde_json::to_vec(&self.collection).map_err(|e| {
            CarteFunciaraError::emission(Artifact::GeoJson, format!("serialization: {}", e))
        })
    }
}

/// Reprojette les parcelles et construit la FeatureCollection
pub fn emit(
    parcels: &[ParcelRecord],
    source_crs: &str,
    target_crs: &str,
    options: &GeoJsonOptions,
) -> Result<GeoJsonOutput, CarteFunciaraError> {
    let reprojector = Reprojector::new(source_crs, target_crs)?;
    let (mapped, skipped) = prepare_rings(parcels, &reprojector)?;

    let collection = build_collection(&mapped, &reprojector.target().to_string(), options)?;

    info!(
        features = collection.features.len(),
        skipped = skipped.len(),
        reprojection = %reprojector.description(),
        "GeoJSON document built"
    );

    Ok(GeoJsonOutput {
        collection,
        skipped,
    })
}

/// Assemble la FeatureCollection depuis des parcelles déjà reprojetées
pub fn build_collection(
    mapped: &[MappedParcel<'_>],
    target_crs: &str,
    options: &GeoJsonOptions,
) -> Result<FeatureCollection, CarteFunciaraError> {
    let per_parcel = if options.include_label_points { 2 } else { 1 };
    let mut features = Vec::with_capacity(mapped.len() * per_parcel);

    for parcel in mapped {
        let properties = parcel_properties(parcel.record)
            .map_err(|e| e.for_parcel(parcel.record.locator(parcel.index)))?;

        let polygon = parcel.ring.to_polygon();
        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::from(&polygon))),
            id: None,
            properties: Some(properties.clone()),
            foreign_members: None,
        });

        if options.include_label_points {
            let mut label_properties = properties;
            label_properties.insert("feature_type".to_string(), json!(LABEL_POINT));

            let c = parcel.ring.centroid;
            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![c.x(), c.y()]))),
                id: None,
                properties: Some(label_properties),
                foreign_members: None,
            });
        }
    }

    let generated_at = options.generated_at.unwrap_or_else(Utc::now);

    let mut foreign_members = JsonObject::new();
    foreign_members.insert("name".to_string(), json!(options.name));
    foreign_members.insert(
        "crs".to_string(),
        json!({"type": "name", "properties": {"name": target_crs}}),
    );
    foreign_members.insert(
        "generated_at".to_string(),
        json!(generated_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
    );

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign_members),
    })
}

/// Propriétés d'une parcelle: tous les champs sauf la géométrie
pub fn parcel_properties(record: &ParcelRecord) -> Result<JsonObject, CarteFunciaraError> {
    match serde_json::to_value(record)? {
        serde_json::Value::Object(mut map) => {
            map.remove("points_xy");
            Ok(map)
        }
        other => Err(CarteFunciaraError::emission(
            Artifact::GeoJson,
            format!("parcel serialized to a non-object value: {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parcel(nr: i64, points: Vec<[f64; 2]>) -> ParcelRecord {
        ParcelRecord {
            nr_cadastral: Some(nr),
            proprietar: Some("Ionescu Ana".to_string()),
            points_xy: points,
            ..Default::default()
        }
    }

    fn square(offset: f64) -> Vec<[f64; 2]> {
        vec![
            [offset, 0.0],
            [offset + 1.0, 0.0],
            [offset + 1.0, 1.0],
            [offset, 1.0],
        ]
    }

    fn options(include_label_points: bool) -> GeoJsonOptions {
        GeoJsonOptions {
            name: "parcels".to_string(),
            include_label_points,
            generated_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()),
        }
    }

    fn numbers_and_kinds(collection: &FeatureCollection) -> Vec<(i64, &'static str)> {
        collection
            .features
            .iter()
            .map(|f| {
                let nr = f.properties.as_ref().unwrap()["nr_cadastral"].as_i64().unwrap();
                let kind = match f.geometry.as_ref().unwrap().value {
                    Value::Polygon(_) => "polygon",
                    Value::Point(_) => "label",
                    _ => "other",
                };
                (nr, kind)
            })
            .collect()
    }

    #[test]
    fn test_properties_exclude_geometry() {
        let props = parcel_properties(&parcel(5, square(0.0))).unwrap();
        assert!(!props.contains_key("points_xy"));
        assert_eq!(props["nr_cadastral"], json!(5));
        assert_eq!(props["sarcini"], json!([]));
        assert!(props.contains_key("IE"));
    }

    #[test]
    fn test_order_with_labels() {
        let parcels = vec![
            parcel(1, square(0.0)),
            parcel(2, square(10.0)),
            parcel(3, square(20.0)),
        ];
        let out = emit(&parcels, "EPSG:4326", "EPSG:4326", &options(true)).unwrap();

        assert_eq!(
            numbers_and_kinds(&out.collection),
            vec![
                (1, "polygon"),
                (1, "label"),
                (2, "polygon"),
                (2, "label"),
                (3, "polygon"),
                (3, "label"),
            ]
        );
    }

    #[test]
    fn test_order_without_labels() {
        let parcels = vec![
            parcel(1, square(0.0)),
            parcel(2, square(10.0)),
            parcel(3, square(20.0)),
        ];
        let out = emit(&parcels, "EPSG:4326", "EPSG:4326", &options(false)).unwrap();

        assert_eq!(
            numbers_and_kinds(&out.collection),
            vec![(1, "polygon"), (2, "polygon"), (3, "polygon")]
        );
    }

    #[test]
    fn test_label_point_marker_and_centroid() {
        let out = emit(
            &[parcel(9, square(0.0))],
            "EPSG:4326",
            "EPSG:4326",
            &options(true),
        )
        .unwrap();

        let label = &out.collection.features[1];
        assert_eq!(
            label.properties.as_ref().unwrap()["feature_type"],
            json!(LABEL_POINT)
        );
        assert_eq!(
            label.geometry.as_ref().unwrap().value,
            Value::Point(vec![0.5, 0.5])
        );

        let polygon = &out.collection.features[0];
        assert!(!polygon
            .properties
            .as_ref()
            .unwrap()
            .contains_key("feature_type"));
        match &polygon.geometry.as_ref().unwrap().value {
            Value::Polygon(rings) => {
                assert_eq!(rings.len(), 1);
                assert_eq!(rings[0].len(), 5);
                assert_eq!(rings[0].first(), rings[0].last());
            }
            other => panic!("Expected Polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_short_parcels_skipped() {
        let parcels = vec![
            parcel(1, square(0.0)),
            parcel(2, vec![[0.0, 0.0], [1.0, 1.0]]),
        ];
        let out = emit(&parcels, "EPSG:4326", "EPSG:4326", &options(true)).unwrap();

        assert_eq!(out.collection.features.len(), 2);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].nr_cadastral, Some(2));
    }

    #[test]
    fn test_envelope() {
        let out = emit(
            &[parcel(1, square(0.0))],
            "EPSG:4326",
            "EPSG:4326",
            &options(false),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out.to_bytes().unwrap()).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["name"], "parcels");
        assert_eq!(value["crs"]["type"], "name");
        assert_eq!(value["crs"]["properties"]["name"], "EPSG:4326");
        assert_eq!(value["generated_at"], "2024-05-01T08:30:00.000000Z");
        assert_eq!(value["features"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_crs_is_fatal() {
        let err = emit(
            &[parcel(1, square(0.0))],
            "EPSG:31700",
            "EPSG:4326",
            &options(false),
        )
        .unwrap_err();
        assert!(err.is_unknown_reference_system());
    }

    #[test]
    fn test_non_ascii_kept_literal() {
        let mut p = parcel(1, square(0.0));
        p.judet = Some("Județul Brașov".to_string());
        let out = emit(&[p], "EPSG:4326", "EPSG:4326", &options(false)).unwrap();
        let text = String::from_utf8(out.to_bytes().unwrap()).unwrap();
        assert!(text.contains("Județul Brașov"));
    }
}
