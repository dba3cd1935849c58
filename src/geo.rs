//! Boundary geometry: GeoJSON loading, code lookup, and hit-testing.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::data::loader::LoadError;
use crate::data::store::PathCache;

// ---------------------------------------------------------------------------
// Raw GeoJSON shapes (serde)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawCollection {
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: serde_json::Map<String, JsonValue>,
    geometry: Option<RawGeometry>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: JsonValue,
}

// ---------------------------------------------------------------------------
// GeoFeature / GeoMap
// ---------------------------------------------------------------------------

/// One region boundary, keyed by its FIPS id.
#[derive(Debug, Clone)]
pub struct GeoFeature {
    /// FIPS code: the `STATE` property, plus `COUNTY` when present.
    pub id: String,
    /// The `NAME` property, when present.
    pub name: Option<String>,
    /// Every polygon ring (outer and holes) as closed `[lon, lat]` runs.
    pub rings: Vec<Vec<[f64; 2]>>,
}

impl GeoFeature {
    /// Even-odd point-in-polygon test over all rings.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let mut inside = false;
        for ring in &self.rings {
            if ring.len() < 3 {
                continue;
            }
            let mut j = ring.len() - 1;
            for i in 0..ring.len() {
                let [xi, yi] = ring[i];
                let [xj, yj] = ring[j];
                if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
                    inside = !inside;
                }
                j = i;
            }
        }
        inside
    }

    /// Bounding box as `(min_lon, min_lat, max_lon, max_lat)`.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for [lon, lat] in self.rings.iter().flatten() {
            bounds = Some(match bounds {
                None => (*lon, *lat, *lon, *lat),
                Some((min_lon, min_lat, max_lon, max_lat)) => (
                    min_lon.min(*lon),
                    min_lat.min(*lat),
                    max_lon.max(*lon),
                    max_lat.max(*lat),
                ),
            });
        }
        bounds
    }
}

/// A loaded boundary collection, keyed by FIPS id.
#[derive(Debug, Clone, Default)]
pub struct GeoMap {
    pub features: Vec<GeoFeature>,
}

impl GeoMap {
    /// The boundary for an exact code. A miss is an absence, not an error;
    /// callers omit the region from the render.
    pub fn get(&self, code: &str) -> Option<&GeoFeature> {
        self.features.iter().find(|f| f.id == code)
    }

    /// All boundaries under a code prefix (an empty prefix selects every
    /// feature).
    pub fn region(&self, prefix: &str) -> Vec<&GeoFeature> {
        self.features
            .iter()
            .filter(|f| f.id.starts_with(prefix))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a GeoJSON FeatureCollection.
///
/// The source files carry no `id` member, so each feature's id is
/// synthesized from its `STATE` (and, for county files, `COUNTY`) FIPS
/// properties, exactly as the case tables key their rows.
pub fn load_geo(path: &Path) -> Result<GeoMap, LoadError> {
    let open_err = |source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    };
    let mut bytes = Vec::new();
    std::fs::File::open(path)
        .map_err(open_err)?
        .read_to_end(&mut bytes)
        .map_err(open_err)?;

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        // The county boundary file ships as ISO-8859-1; its bytes map 1:1
        // onto the first 256 code points.
        Err(err) => err.into_bytes().iter().map(|&b| b as char).collect(),
    };

    let raw: RawCollection = serde_json::from_str(&text)?;

    // County files carry a COUNTY property on every feature, state files
    // never do; decide from the first feature, as the ids must be uniform.
    let with_county = raw
        .features
        .first()
        .is_some_and(|f| f.properties.contains_key("COUNTY"));

    let mut features = Vec::with_capacity(raw.features.len());
    for (index, feature) in raw.features.into_iter().enumerate() {
        let mut id = property(&feature, "STATE").ok_or_else(|| LoadError::Malformed {
            row: index,
            message: "feature has no STATE property".to_string(),
        })?;
        if with_county {
            id.push_str(&property(&feature, "COUNTY").ok_or_else(|| LoadError::Malformed {
                row: index,
                message: "feature has no COUNTY property".to_string(),
            })?);
        }

        let name = property(&feature, "NAME");

        let rings = match feature.geometry {
            Some(geometry) => flatten_rings(&geometry, index)?,
            None => Vec::new(),
        };

        features.push(GeoFeature { id, name, rings });
    }

    Ok(GeoMap { features })
}

fn property(feature: &RawFeature, key: &str) -> Option<String> {
    match feature.properties.get(key) {
        Some(JsonValue::String(s)) => Some(s.clone()),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Flatten Polygon/MultiPolygon coordinates into plain rings. The Aleutian
/// islands cross the antimeridian, so positive longitudes are shifted west
/// by 360° to keep Alaska contiguous on a flat plot.
fn flatten_rings(geometry: &RawGeometry, index: usize) -> Result<Vec<Vec<[f64; 2]>>, LoadError> {
    let malformed = |message: String| LoadError::Malformed {
        row: index,
        message,
    };

    let raw_rings: Vec<&JsonValue> = match geometry.kind.as_str() {
        "Polygon" => geometry
            .coordinates
            .as_array()
            .ok_or_else(|| malformed("Polygon coordinates are not an array".to_string()))?
            .iter()
            .collect(),
        "MultiPolygon" => geometry
            .coordinates
            .as_array()
            .ok_or_else(|| malformed("MultiPolygon coordinates are not an array".to_string()))?
            .iter()
            .filter_map(|polygon| polygon.as_array())
            .flatten()
            .collect(),
        other => {
            log::warn!("feature {index}: skipping unsupported geometry type {other}");
            return Ok(Vec::new());
        }
    };

    let mut rings = Vec::with_capacity(raw_rings.len());
    for raw_ring in raw_rings {
        let positions = raw_ring
            .as_array()
            .ok_or_else(|| malformed("ring is not an array".to_string()))?;
        let mut ring = Vec::with_capacity(positions.len());
        for position in positions {
            let pair = position.as_array().and_then(|p| {
                Some([p.first()?.as_f64()?, p.get(1)?.as_f64()?])
            });
            let [mut lon, lat] =
                pair.ok_or_else(|| malformed("position is not a [lon, lat] pair".to_string()))?;
            if lon > 0.0 {
                lon -= 360.0;
            }
            ring.push([lon, lat]);
        }
        rings.push(ring);
    }
    Ok(rings)
}

// ---------------------------------------------------------------------------
// GeoStore – the geometry cache
// ---------------------------------------------------------------------------

/// Lazily loads and memoizes [`GeoMap`]s by source path, with the same
/// singleton-per-path discipline as the table store.
#[derive(Debug, Default)]
pub struct GeoStore {
    cache: PathCache<GeoMap>,
}

impl GeoStore {
    pub fn new() -> Self {
        GeoStore {
            cache: PathCache::new(),
        }
    }

    /// The unique boundary collection for `path`, loading it on first
    /// request.
    pub fn map(&mut self, path: &Path) -> Result<Arc<GeoMap>, LoadError> {
        self.cache.get_or_insert(path, |p| {
            let map = load_geo(p)?;
            log::info!("loaded {} boundaries from {}", map.len(), p.display());
            Ok(map)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn geojson_file(contents: &[u8]) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".geojson")
            .tempfile()
            .unwrap();
        file.write_all(contents).unwrap();
        file
    }

    const COUNTY_COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"STATE": "42", "COUNTY": "003", "NAME": "Allegheny"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-80.0, 40.0], [-79.0, 40.0], [-79.0, 41.0], [-80.0, 41.0], [-80.0, 40.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"STATE": "01", "COUNTY": "001", "NAME": "Autauga"},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[-87.0, 32.0], [-86.0, 32.0], [-86.0, 33.0], [-87.0, 32.0]]]]
                }
            }
        ]
    }"#;

    #[test]
    fn ids_concatenate_state_and_county() {
        let file = geojson_file(COUNTY_COLLECTION.as_bytes());
        let map = load_geo(file.path()).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.features[0].id, "42003");
        assert_eq!(map.features[1].id, "01001");
    }

    #[test]
    fn state_files_use_the_state_code_alone() {
        let file = geojson_file(
            br#"{"features": [{"properties": {"STATE": "42", "NAME": "Pennsylvania"},
                 "geometry": {"type": "Polygon",
                 "coordinates": [[[-80.0, 40.0], [-75.0, 40.0], [-75.0, 42.0], [-80.0, 40.0]]]}}]}"#,
        );
        let map = load_geo(file.path()).unwrap();
        assert_eq!(map.features[0].id, "42");
        assert_eq!(map.features[0].name.as_deref(), Some("Pennsylvania"));
    }

    #[test]
    fn lookup_miss_is_an_absence() {
        let file = geojson_file(COUNTY_COLLECTION.as_bytes());
        let map = load_geo(file.path()).unwrap();

        assert!(map.get("42003").is_some());
        assert!(map.get("99999").is_none());
    }

    #[test]
    fn region_returns_features_under_a_prefix() {
        let file = geojson_file(COUNTY_COLLECTION.as_bytes());
        let map = load_geo(file.path()).unwrap();

        let pa = map.region("42");
        assert_eq!(pa.len(), 1);
        assert_eq!(pa[0].id, "42003");
        assert_eq!(map.region("").len(), 2);
    }

    #[test]
    fn contains_uses_the_even_odd_rule() {
        let file = geojson_file(COUNTY_COLLECTION.as_bytes());
        let map = load_geo(file.path()).unwrap();
        let allegheny = map.get("42003").unwrap();

        assert!(allegheny.contains(-79.5, 40.5));
        assert!(!allegheny.contains(-78.0, 40.5));
    }

    #[test]
    fn positive_longitudes_shift_west_of_the_antimeridian() {
        let file = geojson_file(
            br#"{"features": [{"properties": {"STATE": "02", "NAME": "Alaska"},
                 "geometry": {"type": "Polygon",
                 "coordinates": [[[170.0, 52.0], [179.0, 52.0], [179.0, 53.0], [170.0, 52.0]]]}}]}"#,
        );
        let map = load_geo(file.path()).unwrap();
        let alaska = map.get("02").unwrap();
        assert!(alaska.rings[0].iter().all(|[lon, _]| *lon < 0.0));
    }

    #[test]
    fn latin_1_files_decode() {
        // "Doña Ana" with 0xF1 for ñ, as in the ISO-8859-1 county file.
        let mut contents = Vec::new();
        contents.extend_from_slice(br#"{"features": [{"properties": {"STATE": "35", "COUNTY": "013", "NAME": "Do"#);
        contents.push(0xF1);
        contents.extend_from_slice(br#"a Ana"}, "geometry": null}]}"#);

        let file = geojson_file(&contents);
        let map = load_geo(file.path()).unwrap();
        assert_eq!(map.features[0].name.as_deref(), Some("Doña Ana"));
    }

    #[test]
    fn missing_state_property_is_a_load_error() {
        let file = geojson_file(br#"{"features": [{"properties": {"NAME": "nowhere"}, "geometry": null}]}"#);
        let err = load_geo(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { row: 0, .. }));
    }

    #[test]
    fn same_path_returns_the_identical_map() {
        let file = geojson_file(COUNTY_COLLECTION.as_bytes());

        let mut store = GeoStore::new();
        let first = store.map(file.path()).unwrap();
        let second = store.map(file.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
