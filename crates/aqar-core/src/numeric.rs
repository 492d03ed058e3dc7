//! Lenient numeric deserialization for upstream intake payloads.
//!
//! Source systems send price/area/duration fields as numbers, numeric
//! strings, or garbage. Unparseable values degrade to `None` so scoring
//! skips the sub-criterion instead of rejecting the payload.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn coerce_i64(raw: Raw) -> Option<i64> {
    match raw {
        Raw::Int(v) => Some(v),
        Raw::Float(v) if v.is_finite() => {
            let rounded = v.round();
            #[allow(clippy::cast_precision_loss)]
            let max = i64::MAX as f64;
            if rounded.abs() <= max {
                #[allow(clippy::cast_possible_truncation)]
                let as_int = rounded as i64;
                Some(as_int)
            } else {
                None
            }
        }
        Raw::Float(_) | Raw::Other(_) => None,
        Raw::Text(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(|v| coerce_i64(Raw::Float(v))))
        }
    }
}

/// Deserialize an optional i64 that may arrive as a number or string.
///
/// # Errors
///
/// Never fails on malformed values; only on a structurally broken stream.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(raw.and_then(coerce_i64))
}

/// Deserialize an optional i32 that may arrive as a number or string.
///
/// Values outside i32 range degrade to `None`.
///
/// # Errors
///
/// Never fails on malformed values; only on a structurally broken stream.
pub fn lenient_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(raw.and_then(coerce_i64).and_then(|v| i32::try_from(v).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(default, deserialize_with = "lenient_i64")]
        price: Option<i64>,
        #[serde(default, deserialize_with = "lenient_i32")]
        area_sqm: Option<i32>,
    }

    fn parse(json: &str) -> Payload {
        serde_json::from_str(json).expect("payload should deserialize")
    }

    #[test]
    fn plain_numbers_pass_through() {
        let p = parse(r#"{"price": 900000, "area_sqm": 350}"#);
        assert_eq!(p.price, Some(900_000));
        assert_eq!(p.area_sqm, Some(350));
    }

    #[test]
    fn numeric_strings_are_parsed() {
        let p = parse(r#"{"price": " 900000 ", "area_sqm": "350"}"#);
        assert_eq!(p.price, Some(900_000));
        assert_eq!(p.area_sqm, Some(350));
    }

    #[test]
    fn float_strings_round() {
        let p = parse(r#"{"price": "899999.6", "area_sqm": 349.5}"#);
        assert_eq!(p.price, Some(900_000));
        assert_eq!(p.area_sqm, Some(350));
    }

    #[test]
    fn garbage_degrades_to_none() {
        let p = parse(r#"{"price": "about a million", "area_sqm": {"unit": "sqm"}}"#);
        assert_eq!(p.price, None);
        assert_eq!(p.area_sqm, None);
    }

    #[test]
    fn missing_and_null_are_none() {
        let p = parse(r#"{"price": null}"#);
        assert_eq!(p.price, None);
        assert_eq!(p.area_sqm, None);
    }

    #[test]
    fn out_of_range_i32_degrades_to_none() {
        let p = parse(r#"{"area_sqm": 999999999999}"#);
        assert_eq!(p.area_sqm, None);
    }
}
