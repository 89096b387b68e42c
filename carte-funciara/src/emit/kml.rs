//! Émission KML 2.2 (polygones + étiquettes)
//!
//! Chaque parcelle cartographiable produit deux placemarks : le polygone
//! (style `polyStyle`) et un point au centroïde (style `labelStyle`).
//! Le texte des descriptions est du HTML dans une section CDATA; chaque
//! valeur y est échappée individuellement.

use std::fmt::Write;

use tracing::info;

use super::{prepare_rings, MappedParcel};
use crate::crs::WGS84;
use crate::error::Artifact;
use crate::reproject::Reprojector;
use crate::types::{ParcelRecord, SkippedParcel};
use crate::CarteFunciaraError;

/// Namespace KML 2.2
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Identifiant du style polygone
pub const POLYGON_STYLE: &str = "polyStyle";

/// Identifiant du style étiquette
pub const LABEL_STYLE: &str = "labelStyle";

/// Document KML sérialisé
#[derive(Debug, Clone, PartialEq)]
pub struct KmlDocument {
    content: String,
    /// Nombre de placemarks émis
    pub placemarks: usize,
}

impl KmlDocument {
    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.content.into_bytes()
    }
}

/// Document KML et parcelles exclues
#[derive(Debug, Clone)]
pub struct KmlOutput {
    pub document: KmlDocument,
    pub skipped: Vec<SkippedParcel>,
}

/// Reprojette vers WGS84 et construit le document KML
pub fn emit(
    parcels: &[ParcelRecord],
    source_crs: &str,
    document_name: &str,
) -> Result<KmlOutput, CarteFunciaraError> {
    let reprojector = Reprojector::new(source_crs, WGS84)?;
    let (mapped, skipped) = prepare_rings(parcels, &reprojector)?;

    let document = build_document(&mapped, document_name)?;

    info!(
        placemarks = document.placemarks,
        skipped = skipped.len(),
        reprojection = %reprojector.description(),
        "KML document built"
    );

    Ok(KmlOutput { document, skipped })
}

/// Assemble le document depuis des parcelles déjà reprojetées en WGS84
pub fn build_document(
    mapped: &[MappedParcel<'_>],
    document_name: &str,
) -> Result<KmlDocument, CarteFunciaraError> {
    let mut out = String::with_capacity(1024 + mapped.len() * 2048);
    write_document(&mut out, mapped, document_name)
        .map_err(|e| CarteFunciaraError::emission(Artifact::Kml, e.to_string()))?;

    Ok(KmlDocument {
        content: out,
        placemarks: mapped.len() * 2,
    })
}

fn write_document(
    out: &mut String,
    mapped: &[MappedParcel<'_>],
    document_name: &str,
) -> std::fmt::Result {
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, r#"<kml xmlns="{}">"#, KML_NAMESPACE)?;
    writeln!(out, "<Document>")?;
    writeln!(out, "  <name>{}</name>", escape_xml(document_name))?;
    write_styles(out)?;

    for parcel in mapped {
        write_parcel(out, parcel)?;
    }

    writeln!(out, "</Document>")?;
    writeln!(out, "</kml>")?;
    Ok(())
}

fn write_styles(out: &mut String) -> std::fmt::Result {
    writeln!(out, r#"  <Style id="{}">"#, POLYGON_STYLE)?;
    writeln!(out, "    <LineStyle>")?;
    writeln!(out, "      <width>2</width>")?;
    writeln!(out, "    </LineStyle>")?;
    writeln!(out, "    <PolyStyle>")?;
    writeln!(out, "      <color>61FAFF7F</color>")?;
    writeln!(out, "      <outline>1</outline>")?;
    writeln!(out, "    </PolyStyle>")?;
    writeln!(out, "  </Style>")?;
    writeln!(out, r#"  <Style id="{}">"#, LABEL_STYLE)?;
    writeln!(out, "    <LabelStyle>")?;
    writeln!(out, "      <scale>1.3</scale>")?;
    writeln!(out, "    </LabelStyle>")?;
    writeln!(out, "    <IconStyle>")?;
    writeln!(out, "      <scale>0</scale>")?;
    writeln!(out, "    </IconStyle>")?;
    writeln!(out, "  </Style>")?;
    Ok(())
}

/// Écrit le placemark polygone puis le placemark étiquette d'une parcelle
fn write_parcel(out: &mut String, parcel: &MappedParcel<'_>) -> std::fmt::Result {
    let record = parcel.record;
    let label = record.cadastral_label();
    let description = build_description(record);

    // Polygone
    writeln!(out, "  <Placemark>")?;
    writeln!(out, "    <name>Parcel {}</name>", escape_xml(&label))?;
    writeln!(out, "    <description><![CDATA[{}]]></description>", description)?;
    writeln!(out, "    <styleUrl>#{}</styleUrl>", POLYGON_STYLE)?;
    writeln!(out, "    <Polygon>")?;
    writeln!(out, "      <tessellate>1</tessellate>")?;
    writeln!(out, "      <outerBoundaryIs>")?;
    writeln!(out, "        <LinearRing>")?;
    writeln!(out, "          <coordinates>")?;
    for c in parcel.ring.exterior.coords() {
        writeln!(out, "{},{},0", c.x, c.y)?;
    }
    writeln!(out, "          </coordinates>")?;
    writeln!(out, "        </LinearRing>")?;
    writeln!(out, "      </outerBoundaryIs>")?;
    writeln!(out, "    </Polygon>")?;
    writeln!(out, "  </Placemark>")?;

    // Étiquette au centroïde
    let c = parcel.ring.centroid;
    writeln!(out, "  <Placemark>")?;
    writeln!(out, "    <name>{}</name>", escape_xml(&label))?;
    writeln!(out, "    <description><![CDATA[{}]]></description>", description)?;
    writeln!(out, "    <styleUrl>#{}</styleUrl>", LABEL_STYLE)?;
    writeln!(out, "    <Point>")?;
    writeln!(out, "      <coordinates>{},{},0</coordinates>", c.x(), c.y())?;
    writeln!(out, "    </Point>")?;
    writeln!(out, "  </Placemark>")?;
    Ok(())
}

/// Fragment HTML de la description; chaque valeur est échappée
pub fn build_description(record: &ParcelRecord) -> String {
    let field = |v: &Option<String>| escape_xml(v.as_deref().unwrap_or(""));

    format!(
        "<b>CF:</b> {}<br/>\
         <b>Proprietar:</b> {}<br/>\
         <b>Localitate:</b> {}<br/>\
         <b>Județ:</b> {}<br/>\
         <b>Detalii:</b> {}<br/>\
         <b>Sarcini (denumire):</b> {}<br/>",
        escape_xml(&record.cadastral_label()),
        field(&record.proprietar),
        field(&record.localitate),
        field(&record.judet),
        field(&record.observatii),
        escape_xml(&record.encumbrance_names()),
    )
}

/// Échappe une chaîne pour XML/HTML (`&`, `<`, `>`, guillemets)
///
/// `]]>` ne peut pas survivre à l'échappement, la section CDATA reste donc bien formée.
pub fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            c => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EncumbranceRecord;

    fn parcel(nr: i64, points: Vec<[f64; 2]>) -> ParcelRecord {
        ParcelRecord {
            nr_cadastral: Some(nr),
            proprietar: Some("Popa Vasile".to_string()),
            localitate: Some("Snagov".to_string()),
            judet: Some("Ilfov".to_string()),
            points_xy: points,
            ..Default::default()
        }
    }

    fn triangle() -> Vec<[f64; 2]> {
        vec![[26.0, 44.0], [26.001, 44.0], [26.001, 44.001]]
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("hello"), "hello");
        assert_eq!(escape_xml("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
        assert_eq!(escape_xml("l'eau"), "l&#39;eau");
        assert_eq!(escape_xml("x]]>y"), "x]]&gt;y");
    }

    #[test]
    fn test_document_structure() {
        let out = emit(&[parcel(123, triangle())], "EPSG:4326", "Parcele").unwrap();
        let kml = out.document.as_str();

        assert!(kml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(kml.contains(r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#));
        assert!(kml.contains("<name>Parcele</name>"));
        assert!(kml.contains(r#"<Style id="polyStyle">"#));
        assert!(kml.contains(r#"<Style id="labelStyle">"#));
        assert_eq!(kml.matches("<Placemark>").count(), 2);
        assert!(kml.contains("<name>Parcel 123</name>"));
        assert!(kml.contains("<name>123</name>"));
        assert!(kml.contains("<tessellate>1</tessellate>"));
        assert!(kml.contains("<styleUrl>#polyStyle</styleUrl>"));
        assert!(kml.contains("<styleUrl>#labelStyle</styleUrl>"));
        assert_eq!(out.document.placemarks, 2);
    }

    #[test]
    fn test_coordinates_one_vertex_per_line_closed() {
        let out = emit(&[parcel(1, triangle())], "EPSG:4326", "Parcele").unwrap();
        let kml = out.document.as_str();

        let start = kml.find("<coordinates>\n").unwrap() + "<coordinates>\n".len();
        let end = kml[start..].find("          </coordinates>").unwrap() + start;
        let lines: Vec<&str> = kml[start..end].lines().collect();

        assert_eq!(lines, vec!["26,44,0", "26.001,44,0", "26.001,44.001,0", "26,44,0"]);
    }

    #[test]
    fn test_label_point_at_centroid() {
        let out = emit(
            &[parcel(1, vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]])],
            "EPSG:4326",
            "Parcele",
        )
        .unwrap();
        assert!(out
            .document
            .as_str()
            .contains("<coordinates>0.5,0.5,0</coordinates>"));
    }

    #[test]
    fn test_hostile_owner_is_escaped() {
        let mut p = parcel(5, triangle());
        p.proprietar = Some(r#"<script>"Ion" & Co</script>]]>"#.to_string());
        let out = emit(&[p], "EPSG:4326", "Parcele").unwrap();
        let kml = out.document.as_str();

        assert!(!kml.contains("<script>"));
        assert!(kml.contains("&lt;script&gt;&quot;Ion&quot; &amp; Co&lt;/script&gt;]]&gt;"));
        // Une seule fin de CDATA par description
        assert_eq!(kml.matches("]]>").count(), 2);
    }

    #[test]
    fn test_description_fields() {
        let mut p = parcel(77, triangle());
        p.observatii = Some("extravilan".to_string());
        p.sarcini = vec![
            EncumbranceRecord {
                descriere: Some("BCR & Co".to_string()),
                ..Default::default()
            },
            EncumbranceRecord::default(),
            EncumbranceRecord {
                descriere: Some("CEC Bank".to_string()),
                ..Default::default()
            },
        ];
        let html = build_description(&p);

        assert!(html.contains("<b>CF:</b> 77<br/>"));
        assert!(html.contains("<b>Proprietar:</b> Popa Vasile<br/>"));
        assert!(html.contains("<b>Județ:</b> Ilfov<br/>"));
        assert!(html.contains("<b>Detalii:</b> extravilan<br/>"));
        assert!(html.contains("<b>Sarcini (denumire):</b> BCR &amp; Co; CEC Bank<br/>"));
    }

    #[test]
    fn test_missing_cadastral_number() {
        let mut p = parcel(1, triangle());
        p.nr_cadastral = None;
        let out = emit(&[p], "EPSG:4326", "Parcele").unwrap();
        assert!(out.document.as_str().contains("<name>Parcel n/a</name>"));
    }

    #[test]
    fn test_short_parcel_not_emitted() {
        let parcels = vec![parcel(1, triangle()), parcel(2, vec![[0.0, 0.0], [1.0, 1.0]])];
        let out = emit(&parcels, "EPSG:4326", "Parcele").unwrap();

        assert_eq!(out.document.placemarks, 2);
        assert!(!out.document.as_str().contains("Parcel 2<"));
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].nr_cadastral, Some(2));
    }

    /// Noms des placemarks, dans l'ordre du document
    fn placemark_names(kml: &str) -> Vec<String> {
        kml.lines()
            .filter_map(|line| line.strip_prefix("    <name>"))
            .filter_map(|line| line.strip_suffix("</name>"))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_placemarks_follow_input_order() {
        // Assez de parcelles pour que rayon découpe le travail
        let parcels: Vec<ParcelRecord> = (0..64)
            .map(|i| {
                let dx = i as f64 * 0.01;
                let points = if i == 17 {
                    vec![[26.0, 44.0]]
                } else {
                    vec![[26.0 + dx, 44.0], [26.005 + dx, 44.0], [26.005 + dx, 44.005]]
                };
                parcel(i, points)
            })
            .collect();

        let out = emit(&parcels, "EPSG:4326", "Parcele").unwrap();

        let expected: Vec<String> = (0..64)
            .filter(|&i| i != 17)
            .flat_map(|i| [format!("Parcel {}", i), i.to_string()])
            .collect();
        assert_eq!(placemark_names(out.document.as_str()), expected);
        assert_eq!(out.document.placemarks, 126);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].index, 17);
    }

    #[test]
    fn test_stereo70_source() {
        let out = emit(
            &[parcel(
                123,
                vec![[500000.0, 300000.0], [500010.0, 300000.0], [500010.0, 300010.0]],
            )],
            "EPSG:3844",
            "Parcele",
        )
        .unwrap();
        let kml = out.document.as_str();
        assert!(kml.contains("24.99814"), "{}", kml);
        assert!(kml.contains(",44.2000"), "{}", kml);
    }

    #[test]
    fn test_unknown_source_is_fatal() {
        let err = emit(&[parcel(1, triangle())], "EPSG:2154", "Parcele").unwrap_err();
        assert!(err.is_unknown_reference_system());
    }
}
