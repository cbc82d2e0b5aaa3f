//! Coordinate extraction from the free-form location blobs stored on openings.
//!
//! Openings carry whatever the posting form saved: a `{lat, lng}` object, a geocoder response
//! with `geometry.location`, a `"lat,lng"` string, or nothing useful at all. Anything that does
//! not yield an in-range pair is treated as "no location".

use serde_json::Value;

use super::distance::GeoPoint;

const LATITUDE_KEYS: [&str; 2] = ["lat", "latitude"];
const LONGITUDE_KEYS: [&str; 4] = ["lng", "lon", "long", "longitude"];
const NESTED_KEYS: [&str; 3] = ["geometry", "location", "coordinates"];

pub fn parse_location_blob(blob: &Value) -> Option<GeoPoint> {
    match blob {
        Value::String(raw) => parse_pair(raw).or_else(|| {
            // Some legacy rows double-encode the object as a JSON string.
            serde_json::from_str::<Value>(raw)
                .ok()
                .filter(Value::is_object)
                .and_then(|inner| parse_location_blob(&inner))
        }),
        Value::Object(map) => {
            let lat = LATITUDE_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(coordinate));
            let lng = LONGITUDE_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(coordinate));
            if let (Some(lat), Some(lng)) = (lat, lng) {
                return GeoPoint::checked(lat, lng);
            }

            NESTED_KEYS
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(parse_location_blob)
        }
        // GeoJSON ordering: [lng, lat]
        Value::Array(items) if items.len() == 2 => {
            let lng = coordinate(&items[0])?;
            let lat = coordinate(&items[1])?;
            GeoPoint::checked(lat, lng)
        }
        _ => None,
    }
}

fn coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn parse_pair(raw: &str) -> Option<GeoPoint> {
    let (lat, lng) = raw.split_once(',')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lng = lng.trim().parse::<f64>().ok()?;
    GeoPoint::checked(lat, lng)
}
