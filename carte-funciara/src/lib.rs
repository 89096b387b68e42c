//! # carte-funciara
//!
//! Post-traitement déterministe des extraits de carte funciară (livre foncier roumain):
//! parcelles extraites -> rings reprojetés -> GeoJSON et KML.
//!
//! ## Features
//!
//! - Reprojection Stereo 70 (EPSG:3844) -> WGS84 / Web Mercator en Rust pur
//! - Fermeture des rings sans réordonner ni dédoublonner les sommets
//! - Centroïde par moyenne des sommets pour le placement des étiquettes
//! - FeatureCollection GeoJSON (crate `geojson`) et document KML 2.2 échappé
//! - Construction des rings parallélisée par parcelle (`rayon`), ordre conservé
//!
//! ## Usage
//!
//! ```rust,ignore
//! use carte_funciara::{ExtractionResult, ParcelCollection, Pipeline};
//!
//! let results: Vec<ExtractionResult> = load_extractions()?;
//! let collection = ParcelCollection::from_extractions(results);
//! let output = Pipeline::default().run(&collection);
//!
//! for skipped in &output.skipped {
//!     println!("Non cartographiée: {}", skipped);
//! }
//! ```

pub mod crs;
pub mod emit;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod reproject;
pub mod ring;
pub mod types;

pub use crs::{merge_crs, Crs};
pub use error::{Artifact, CarteFunciaraError};
pub use extract::{extraction_schema, Extractor};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput};
pub use reproject::{CoordTransform, Reprojector};
pub use ring::Ring;
pub use types::{
    EncumbranceRecord, ExtractionResult, ParcelCollection, ParcelRecord, SkippedParcel,
};
