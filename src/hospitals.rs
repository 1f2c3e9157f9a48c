use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::{Coordinate, distance_km};

pub const UNNAMED_HOSPITAL: &str = "Unnamed Hospital";

/// Overpass ids are integers; other sources may hand out strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PoiId {
    Num(u64),
    Text(String),
}

impl fmt::Display for PoiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoiId::Num(n) => write!(f, "{n}"),
            PoiId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoiTags {
    pub name: Option<String>,
    #[serde(rename = "addr:street")]
    pub street: Option<String>,
    #[serde(rename = "addr:city")]
    pub city: Option<String>,
    #[serde(rename = "addr:state")]
    pub state: Option<String>,
    #[serde(rename = "addr:postcode")]
    pub postcode: Option<String>,
}

/// One `node` from an Overpass `out body` answer.
#[derive(Debug, Clone, Deserialize)]
pub struct OverpassElement {
    pub id: PoiId,
    #[serde(default)]
    pub tags: PoiTags,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointOfInterest {
    pub id: PoiId,
    pub name: String,
    pub address: String,
    pub location: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPoint {
    #[serde(flatten)]
    pub poi: PointOfInterest,
    pub distance_km: f64,
}

impl RankedPoint {
    pub fn maps_url(&self) -> String {
        format!(
            "https://www.google.com/maps/search/?api=1&query={},{}",
            self.poi.location.lat, self.poi.location.lon
        )
    }

    pub fn distance_label(&self) -> String {
        format!("{:.2} km", self.distance_km)
    }
}

/// Street, city, state, postcode; blanks skipped.
pub fn compose_address(tags: &PoiTags) -> String {
    [&tags.street, &tags.city, &tags.state, &tags.postcode]
        .into_iter()
        .filter_map(|part| part.as_deref().map(str::trim))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `None` when the element has no usable position.
pub fn normalize(el: &OverpassElement) -> Option<PointOfInterest> {
    let (lat, lon) = match (el.lat, el.lon) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => (lat, lon),
        _ => return None,
    };

    let name = el
        .tags
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNNAMED_HOSPITAL)
        .to_string();

    Some(PointOfInterest {
        id: el.id.clone(),
        name,
        address: compose_address(&el.tags),
        location: Coordinate::new(lat, lon),
    })
}

/// Normalizes `raw` and orders it nearest-first from `origin`.
///
/// Equal distances keep their input order. The result is never truncated; how many to
/// show is up to the caller.
pub fn rank(origin: Coordinate, raw: &[OverpassElement]) -> Vec<RankedPoint> {
    let mut out: Vec<RankedPoint> = raw
        .iter()
        .filter_map(normalize)
        .map(|poi| {
            let distance_km = distance_km(origin, poi.location);
            RankedPoint { poi, distance_km }
        })
        .collect();
    out.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    out
}

/// Overpass QL for hospitals within `radius_m` metres of `origin`.
pub fn overpass_query(origin: Coordinate, radius_m: u32) -> String {
    format!(
        "[out:json];node[\"amenity\"=\"hospital\"](around:{radius_m},{},{});out body;",
        origin.lat, origin.lon
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const ORIGIN: Coordinate = Coordinate::new(12.9716, 77.6412);

    fn element(id: u64, name: Option<&str>, pos: Option<(f64, f64)>) -> OverpassElement {
        OverpassElement {
            id: PoiId::Num(id),
            tags: PoiTags {
                name: name.map(str::to_string),
                ..PoiTags::default()
            },
            lat: pos.map(|p| p.0),
            lon: pos.map(|p| p.1),
        }
    }

    #[test]
    fn ids_decode_as_number_or_text() {
        let el: OverpassElement =
            serde_json::from_str(r#"{"id": 3519870171, "lat": 12.9, "lon": 77.6}"#).unwrap();
        assert_eq!(el.id, PoiId::Num(3_519_870_171));
        assert_eq!(el.id.to_string(), "3519870171");
        let el: OverpassElement = serde_json::from_str(r#"{"id": "way/42"}"#).unwrap();
        assert_eq!(el.id.to_string(), "way/42");
    }

    #[test]
    fn empty_input_ranks_empty() {
        assert!(rank(ORIGIN, &[]).is_empty());
    }

    #[test]
    fn drops_elements_without_position() {
        let raw = vec![
            element(1, Some("A"), Some((12.97, 77.64))),
            element(2, Some("B"), None),
            OverpassElement {
                lat: Some(12.9),
                lon: None,
                ..element(3, Some("C"), None)
            },
            element(4, Some("D"), Some((f64::NAN, 77.6))),
        ];
        let ranked = rank(ORIGIN, &raw);
        let ids: Vec<_> = ranked.iter().map(|r| r.poi.id.clone()).collect();
        assert_eq!(ids, vec![PoiId::Num(1)]);
    }

    #[test]
    fn missing_or_blank_name_gets_sentinel() {
        let raw = vec![
            element(1, None, Some((12.97, 77.64))),
            element(2, Some("   "), Some((12.98, 77.64))),
        ];
        let ranked = rank(ORIGIN, &raw);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|r| r.poi.name == UNNAMED_HOSPITAL));
    }

    #[test]
    fn address_skips_absent_parts() {
        let tags = PoiTags {
            street: Some("100 Feet Road".into()),
            city: None,
            state: Some(" Karnataka ".into()),
            postcode: Some("".into()),
            ..PoiTags::default()
        };
        assert_eq!(compose_address(&tags), "100 Feet Road, Karnataka");
        assert_eq!(compose_address(&PoiTags::default()), "");
    }

    #[test]
    fn sorted_nearest_first() {
        let raw = vec![
            element(1, Some("Far"), Some((13.10, 77.60))),
            element(2, Some("Near"), Some((12.972, 77.642))),
            element(3, Some("Mid"), Some((12.93, 77.62))),
        ];
        let names: Vec<_> = rank(ORIGIN, &raw)
            .into_iter()
            .map(|r| r.poi.name)
            .collect();
        assert_eq!(names, vec!["Near", "Mid", "Far"]);
    }

    #[test]
    fn random_inputs_are_sorted_and_stable() {
        let mut rng = StdRng::seed_from_u64(42);
        // A handful of fixed positions so ties are frequent.
        let spots: Vec<(f64, f64)> = (0..6)
            .map(|_| (rng.gen_range(12.8..13.1), rng.gen_range(77.5..77.8)))
            .collect();

        for _ in 0..50 {
            let n: u64 = rng.gen_range(0..40);
            let raw: Vec<_> = (0..n)
                .map(|i| {
                    let pos = if rng.gen_bool(0.1) {
                        None
                    } else {
                        Some(spots[rng.gen_range(0..spots.len())])
                    };
                    element(i, Some("H"), pos)
                })
                .collect();

            let ranked = rank(ORIGIN, &raw);
            let kept = raw.iter().filter(|e| e.lat.is_some()).count();
            assert_eq!(ranked.len(), kept);

            for pair in ranked.windows(2) {
                assert!(pair[0].distance_km <= pair[1].distance_km);
                if pair[0].distance_km == pair[1].distance_km {
                    let (PoiId::Num(a), PoiId::Num(b)) = (&pair[0].poi.id, &pair[1].poi.id) else {
                        panic!("numeric ids expected");
                    };
                    assert!(a < b, "tie order not preserved");
                }
            }
        }
    }

    #[test]
    fn decodes_overpass_payload() {
        let body = r#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 271828, "lat": 12.96, "lon": 77.64,
                 "tags": {"amenity": "hospital", "name": "Chinmaya", "addr:city": "Bengaluru"}},
                {"type": "node", "id": 314159, "lat": 12.99, "lon": 77.60}
            ]
        }"#;
        let resp: OverpassResponse = serde_json::from_str(body).unwrap();
        let ranked = rank(ORIGIN, &resp.elements);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].poi.name, "Chinmaya");
        assert_eq!(ranked[0].poi.address, "Bengaluru");
        assert_eq!(ranked[1].poi.name, UNNAMED_HOSPITAL);
    }

    #[test]
    fn display_helpers() {
        let r = RankedPoint {
            poi: PointOfInterest {
                id: PoiId::Text("w1".into()),
                name: "X".into(),
                address: String::new(),
                location: Coordinate::new(12.5, 77.25),
            },
            distance_km: 1.23456,
        };
        assert_eq!(r.distance_label(), "1.23 km");
        assert_eq!(
            r.maps_url(),
            "https://www.google.com/maps/search/?api=1&query=12.5,77.25"
        );
        assert_eq!(
            overpass_query(Coordinate::new(1.5, 2.5), 5000),
            "[out:json];node[\"amenity\"=\"hospital\"](around:5000,1.5,2.5);out body;"
        );
    }
}
