//! # parcele-export
//!
//! Export des extraits de carte funciară vers JSON, GeoJSON et KML.
//!
//! ## Features
//!
//! - Lecture parallèle des résultats d'extraction (`{crs, parcels}`)
//! - Pipeline `carte-funciara` (reprojection Stereo 70 -> WGS84)
//! - Archive tar.bz2 des artefacts
//! - Rapport d'export JSON avec checksums blake3
//!
//! ## Usage CLI
//!
//! ```bash
//! # Export d'un dossier d'extraits
//! parcele-export export --input ./extrase/ --output ./out/
//!
//! # Points d'étiquette dans le GeoJSON, sans archive
//! parcele-export export -i a.json -i b.json -o ./out/ --labels --no-bundle
//!
//! # Schéma JSON attendu du service d'extraction
//! parcele-export schema
//! ```

pub mod bundle;
pub mod config;
pub mod export;
pub mod report;

pub use config::Config;
pub use export::{run_export, ExportOptions, JsonExtractor};
pub use report::{ExportReport, ExportStatus};
