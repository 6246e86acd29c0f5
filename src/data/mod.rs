use crate::error::{LoadError, Result};
use geojson::{Feature, GeoJson, Geometry, Value};
use serde::Deserialize;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// A closed ring of (lon, lat) coordinates
pub type Ring = Vec<(f64, f64)>;

/// Exterior ring followed by any holes
pub type Polygon = Vec<Ring>;

/// One row of the project table
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectRecord {
    pub flow_type: Option<String>,
    pub recipient_key: Option<String>,
}

/// One country from the geography source
#[derive(Clone, Debug, PartialEq)]
pub struct CountryFeature {
    pub name: String,
    /// Raw identifier, not normalized
    pub iso_key: Option<String>,
    pub polygons: Vec<Polygon>,
}

/// Property names to read from each geography feature
#[derive(Clone, Debug)]
pub struct GeographyFields {
    pub iso: String,
    pub name: String,
}

impl Default for GeographyFields {
    fn default() -> Self {
        Self {
            iso: "ISO3166-1-Alpha-3".to_string(),
            name: "name".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ProjectRow {
    #[serde(rename = "Flow Type")]
    flow_type: Option<String>,
    #[serde(rename = "Recipient ISO-3")]
    recipient_key: Option<String>,
}

/// Load both sources at once. Fails if either load fails.
pub fn load_sources(
    geography: &Path,
    projects: &Path,
    fields: &GeographyFields,
) -> Result<(Vec<CountryFeature>, Vec<ProjectRecord>)> {
    let (features, records) = rayon::join(
        || load_geography(geography, fields),
        || load_projects(projects),
    );
    let (features, records) = (features?, records?);

    info!(
        features = features.len(),
        records = records.len(),
        "loaded geography and project table"
    );
    Ok((features, records))
}

/// Load the project table from a CSV file
pub fn load_projects(path: &Path) -> Result<Vec<ProjectRecord>> {
    let file = fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_projects(file).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse CSV rows with `Flow Type` and `Recipient ISO-3` columns
pub fn parse_projects<R: Read>(reader: R) -> std::result::Result<Vec<ProjectRecord>, csv::Error> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for row in rdr.deserialize() {
        let row: ProjectRow = row?;
        records.push(ProjectRecord {
            flow_type: row.flow_type.map(|f| canonical_flow_type(&f)),
            // Empty and whitespace-only cells both mean "no recipient"
            recipient_key: row.recipient_key.filter(|k| !k.trim().is_empty()),
        });
    }
    debug!(rows = records.len(), "parsed project table");
    Ok(records)
}

/// Raw exports label flows "Grant" / "Loan"; the map works on ODA / OOF
fn canonical_flow_type(raw: &str) -> String {
    match raw.trim() {
        "Grant" => "ODA".to_string(),
        "Loan" => "OOF".to_string(),
        other => other.to_string(),
    }
}

/// Load country features from a GeoJSON FeatureCollection
pub fn load_geography(path: &Path, fields: &GeographyFields) -> Result<Vec<CountryFeature>> {
    let mut bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let geojson: GeoJson =
        simd_json::serde::from_slice(&mut bytes).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc
            .features
            .iter()
            .map(|f| country_from_feature(f, fields))
            .collect()),
        _ => Err(LoadError::NotFeatureCollection {
            path: path.to_path_buf(),
        }),
    }
}

fn country_from_feature(feature: &Feature, fields: &GeographyFields) -> CountryFeature {
    let props = feature.properties.as_ref();

    let name = props
        .and_then(|p| p.get(&fields.name))
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown")
        .to_string();

    let iso_key = props
        .and_then(|p| p.get(&fields.iso))
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let mut polygons = Vec::new();
    if let Some(ref geometry) = feature.geometry {
        collect_polygons(geometry, &mut polygons);
    }

    CountryFeature {
        name,
        iso_key,
        polygons,
    }
}

fn collect_polygons(geometry: &Geometry, out: &mut Vec<Polygon>) {
    let to_ring = |coords: &Vec<Vec<f64>>| -> Ring {
        coords
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| (c[0], c[1]))
            .collect()
    };

    match &geometry.value {
        Value::Polygon(rings) => {
            out.push(rings.iter().map(to_ring).collect());
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                out.push(rings.iter().map(to_ring).collect());
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const WORLD: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "name": "Kenya", "ISO3166-1-Alpha-3": "ken " },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[34.0, -4.0], [41.0, -4.0], [41.0, 4.0], [34.0, 4.0], [34.0, -4.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "Nowhere" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                        [[[2.0, 2.0], [3.0, 2.0], [3.0, 3.0], [2.0, 2.0]]]
                    ]
                }
            }
        ]
    }"#;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_projects() {
        let csv = "Recipient ISO-3,Flow Type\nken,ODA\n,OOF\n usa ,Loan\nbra, Grant \n";
        let records = parse_projects(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].recipient_key.as_deref(), Some("ken"));
        assert_eq!(records[0].flow_type.as_deref(), Some("ODA"));
        assert_eq!(records[1].recipient_key, None);
        assert_eq!(records[2].recipient_key.as_deref(), Some(" usa "));
        assert_eq!(records[2].flow_type.as_deref(), Some("OOF"));
        assert_eq!(records[3].flow_type.as_deref(), Some("ODA"));
    }

    #[test]
    fn test_blank_recipient_cells_are_absent() {
        let csv = "Flow Type,Recipient ISO-3\nODA,\nODA,\"   \"\nODA, ken\n";
        let records = parse_projects(csv.as_bytes()).unwrap();
        assert_eq!(records[0].recipient_key, None);
        assert_eq!(records[1].recipient_key, None);
        assert_eq!(records[2].recipient_key.as_deref(), Some(" ken"));

        let counts = crate::aggregate::aggregate(&records, crate::aggregate::FlowCategory::Oda);
        assert_eq!(counts.unkeyed(), 2);
        assert_eq!(counts.get(""), None);
        assert_eq!(counts.get("KEN"), Some(1));
    }

    #[test]
    fn test_unknown_flow_label_kept() {
        let records = parse_projects("Flow Type,Recipient ISO-3\nEquity,ken\n".as_bytes()).unwrap();
        assert_eq!(records[0].flow_type.as_deref(), Some("Equity"));
    }

    #[test]
    fn test_load_geography() {
        let file = write_temp(WORLD);
        let features = load_geography(file.path(), &GeographyFields::default()).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].name, "Kenya");
        assert_eq!(features[0].iso_key.as_deref(), Some("ken "));
        assert_eq!(features[0].polygons.len(), 1);
        assert_eq!(features[0].polygons[0][0].len(), 5);
        assert_eq!(features[1].iso_key, None);
        assert_eq!(features[1].polygons.len(), 2);
    }

    #[test]
    fn test_not_feature_collection() {
        let file = write_temp(r#"{"type": "Point", "coordinates": [1.0, 2.0]}"#);
        let err = load_geography(file.path(), &GeographyFields::default()).unwrap_err();
        assert!(matches!(err, LoadError::NotFeatureCollection { .. }));
    }

    #[test]
    fn test_load_sources_fails_if_either_fails() {
        let geo = write_temp(WORLD);
        let csv = write_temp("Flow Type,Recipient ISO-3\nODA,ken\n");
        let missing = Path::new("/nonexistent/aiddata.csv");
        let fields = GeographyFields::default();

        assert!(load_sources(geo.path(), csv.path(), &fields).is_ok());
        assert!(matches!(
            load_sources(geo.path(), missing, &fields),
            Err(LoadError::Io { .. })
        ));
        let bad_geo = write_temp("{ not json");
        assert!(matches!(
            load_sources(bad_geo.path(), csv.path(), &fields),
            Err(LoadError::Json { .. })
        ));
    }
}
