//! The exoplanet record as delivered by the archive.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One planet row. Every column may be missing, `null` or of the wrong type;
/// such columns read as `None` without affecting the rest of the row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExoplanetRecord {
    #[serde(deserialize_with = "lenient_text")]
    pub pl_name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub discoverymethod: Option<String>,
    /// Orbital period in days.
    #[serde(deserialize_with = "lenient_number")]
    pub pl_orbper: Option<f64>,
    /// Semi-major axis in AU.
    #[serde(deserialize_with = "lenient_number")]
    pub pl_orbsmax: Option<f64>,
    /// Alternate semi-major axis column used by some samples.
    #[serde(deserialize_with = "lenient_number")]
    pub orbital_distance: Option<f64>,
    /// Radius in Earth radii.
    #[serde(deserialize_with = "lenient_number")]
    pub pl_rade: Option<f64>,
    /// Mass in Earth masses.
    #[serde(deserialize_with = "lenient_number")]
    pub pl_masse: Option<f64>,
    /// Distance to the system in parsecs.
    #[serde(deserialize_with = "lenient_number")]
    pub sy_dist: Option<f64>,
}

/// A JSON number, or a string holding one. Anything else is `None`.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

impl ExoplanetRecord {
    /// Semi-major axis in AU, preferring `pl_orbsmax`. Non-finite values count as missing.
    pub fn semi_major_axis(&self) -> Option<f64> {
        self.pl_orbsmax
            .filter(|v| v.is_finite())
            .or(self.orbital_distance.filter(|v| v.is_finite()))
    }

    pub fn mass(&self) -> Option<f64> {
        self.pl_masse.filter(|v| v.is_finite())
    }

    pub fn radius(&self) -> Option<f64> {
        self.pl_rade.filter(|v| v.is_finite())
    }
}

/// Parse a JSON array into records, skipping entries that are not objects.
///
/// Returns `None` when the document is not an array.
pub fn records_from_json(value: serde_json::Value) -> Option<Vec<ExoplanetRecord>> {
    let serde_json::Value::Array(entries) = value else {
        return None;
    };
    let total = entries.len();
    let records: Vec<ExoplanetRecord> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match serde_json::from_value(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Skipping malformed exoplanet entry {i}: {e}");
                None
            }
        })
        .collect();
    if records.len() < total {
        log::warn!("Kept {} of {total} exoplanet entries", records.len());
    }
    Some(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nulls_and_missing_fields_are_none() {
        let record: ExoplanetRecord =
            serde_json::from_value(json!({"pl_name": "Kepler-22 b", "pl_masse": null})).unwrap();
        assert_eq!(record.pl_name.as_deref(), Some("Kepler-22 b"));
        assert_eq!(record.pl_masse, None);
        assert_eq!(record.semi_major_axis(), None);
    }

    #[test]
    fn test_semi_major_axis_prefers_orbsmax() {
        let record = ExoplanetRecord {
            pl_orbsmax: Some(0.5),
            orbital_distance: Some(2.0),
            ..Default::default()
        };
        assert_eq!(record.semi_major_axis(), Some(0.5));

        let alternate = ExoplanetRecord {
            pl_orbsmax: Some(f64::NAN),
            orbital_distance: Some(2.0),
            ..Default::default()
        };
        assert_eq!(alternate.semi_major_axis(), Some(2.0));
    }

    #[test]
    fn test_records_from_json_skips_non_object_entries() {
        let value = json!([{"pl_name": "a"}, 42, "row", {"pl_name": "c"}]);
        let records = records_from_json(value).unwrap();
        let names: Vec<_> = records.iter().filter_map(|r| r.pl_name.as_deref()).collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn test_mistyped_columns_keep_the_row() {
        let value = json!([
            {"pl_name": "a", "pl_orbsmax": 1.2},
            {"pl_name": "b", "pl_orbsmax": "far", "sy_dist": [1]},
            {"pl_name": "c", "sy_dist": "12.3", "pl_masse": true},
            {"pl_name": 7, "pl_rade": {"v": 1}}
        ]);
        let records = records_from_json(value).unwrap();
        assert_eq!(records.len(), 4, "every row is kept in archive order");
        let names: Vec<_> = records.iter().filter_map(|r| r.pl_name.as_deref()).collect();
        assert_eq!(names, ["a", "b", "c", "7"]);

        assert_eq!(records[1].pl_orbsmax, None);
        assert_eq!(records[1].sy_dist, None);
        assert_eq!(records[2].sy_dist, Some(12.3));
        assert_eq!(records[2].pl_masse, None);
        assert_eq!(records[3].pl_rade, None);
    }

    #[test]
    fn test_records_from_json_rejects_non_arrays() {
        assert!(records_from_json(json!({"error": "rate limited"})).is_none());
        assert!(records_from_json(json!("text")).is_none());
    }

    #[test]
    fn test_unknown_columns_are_ignored() {
        let records = records_from_json(json!([{"pl_name": "x", "hostname": "y"}])).unwrap();
        assert_eq!(records.len(), 1);
    }
}
