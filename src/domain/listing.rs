//! Listing input types and the request validator.
//!
//! A `RawListing` holds the boundary input exactly as received: every field
//! is an optional JSON value, so missing or mistyped input becomes a
//! reported validation failure instead of a deserialization error. The
//! validator collects every failure in one pass before any transformation
//! runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::encode::{GENRE_FIELD, TYPE_FIELD};
use super::features::CONTINUOUS_FEATURES;

/// Deployment encoding variant: some deployments encode the sale channel
/// as an additional categorical field, some omit it entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingVariant {
    /// Encode `channel` as the `sale_channel` categorical field.
    WithChannel,
    /// Ignore `channel`; the model was trained without it.
    WithoutChannel,
}

impl EncodingVariant {
    /// Resolve the variant from `BIDCAST_ENCODING_VARIANT`
    /// ("no-channel" selects [`EncodingVariant::WithoutChannel`]).
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var("BIDCAST_ENCODING_VARIANT").as_deref() {
            Ok("no-channel" | "no_channel" | "without-channel") => Self::WithoutChannel,
            _ => Self::WithChannel,
        }
    }

    #[must_use]
    pub fn uses_channel(self) -> bool {
        matches!(self, Self::WithChannel)
    }
}

/// Raw listing record as received at the boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawListing {
    /// Listing type category (1, 2, or 3)
    #[serde(rename = "type", default)]
    pub listing_type: Option<Value>,

    /// Genre category (1 through 7)
    #[serde(default)]
    pub genre: Option<Value>,

    /// Internal engagement index
    #[serde(default)]
    pub e1: Option<Value>,

    /// Internal history index
    #[serde(default)]
    pub b1: Option<Value>,

    /// Internal popularity index
    #[serde(default)]
    pub p1: Option<Value>,

    /// External engagement index
    #[serde(default)]
    pub e2: Option<Value>,

    /// External history index
    #[serde(default)]
    pub b2: Option<Value>,

    /// External popularity index
    #[serde(default)]
    pub p2: Option<Value>,

    /// Sale channel category (required only in the with-channel variant)
    #[serde(default)]
    pub channel: Option<Value>,
}

/// Collected field-level validation failures.
///
/// Keys are request field names, values are human-readable messages. An
/// empty set means the request is valid.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Validated, typed listing record ready for the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub listing_type: i64,
    pub genre: i64,
    pub channel: Option<i64>,
    /// Canonical feature name → raw index value.
    indices: BTreeMap<String, f64>,
}

impl ListingRecord {
    /// The six continuous indices keyed by canonical feature name.
    #[must_use]
    pub fn named_indices(&self) -> &BTreeMap<String, f64> {
        &self.indices
    }
}

impl RawListing {
    /// Validate the raw input and produce a typed record.
    ///
    /// All failures are collected and reported together: presence of every
    /// required field, category membership for `type` and `genre`, and
    /// numeric parsing plus non-negativity for the six indices. `channel`
    /// is required only when the encoding variant uses it.
    ///
    /// # Errors
    /// Returns the full set of field → message failures.
    pub fn validate(&self, variant: EncodingVariant) -> Result<ListingRecord, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let listing_type = validate_category(&mut errors, "type", &self.listing_type, &TYPE_FIELD);
        let genre = validate_category(&mut errors, "genre", &self.genre, &GENRE_FIELD);

        let channel = if variant.uses_channel() {
            match &self.channel {
                None => {
                    errors.insert("channel", "channel is required");
                    None
                }
                Some(value) => match as_integer(value) {
                    Some(code) => Some(code),
                    None => {
                        errors.insert("channel", "channel must be an integer");
                        None
                    }
                },
            }
        } else {
            None
        };

        let mut indices = BTreeMap::new();
        for (key, canonical) in CONTINUOUS_FEATURES {
            match index_value(self, key) {
                None => errors.insert(key, format!("{key} is required")),
                Some(value) => match as_number(value) {
                    None => errors.insert(key, format!("{key} must be a number")),
                    Some(v) if v < 0.0 => {
                        errors.insert(key, format!("{key} must be non-negative"));
                    }
                    Some(v) => {
                        indices.insert(canonical.to_string(), v);
                    }
                },
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ListingRecord {
            // A None here would have inserted an error above.
            listing_type: listing_type.expect("validated"),
            genre: genre.expect("validated"),
            channel,
            indices,
        })
    }
}

fn index_value<'a>(raw: &'a RawListing, key: &str) -> Option<&'a Value> {
    match key {
        "e1" => raw.e1.as_ref(),
        "b1" => raw.b1.as_ref(),
        "p1" => raw.p1.as_ref(),
        "e2" => raw.e2.as_ref(),
        "b2" => raw.b2.as_ref(),
        "p2" => raw.p2.as_ref(),
        _ => None,
    }
}

fn validate_category(
    errors: &mut ValidationErrors,
    field: &str,
    value: &Option<Value>,
    spec: &super::encode::CategoricalField,
) -> Option<i64> {
    let Some(value) = value else {
        errors.insert(field, format!("{field} is required"));
        return None;
    };

    let Some(code) = as_integer(value) else {
        errors.insert(field, format!("{field} must be an integer"));
        return None;
    };

    if !spec.contains(code) {
        let allowed = spec
            .categories
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        errors.insert(field, format!("{field} must be one of {allowed}"));
        return None;
    }

    Some(code)
}

/// Parse a JSON value as an integer category code. Accepts integral
/// numbers and numeric strings, matching the original lenient boundary.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse a JSON value as a float. Accepts numbers and numeric strings.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_listing() -> RawListing {
        serde_json::from_value(json!({
            "type": 1,
            "genre": 3,
            "e1": 111,
            "b1": 111,
            "p1": 10000,
            "e2": 222,
            "b2": 222,
            "p2": 20000,
            "channel": 1
        }))
        .expect("Should deserialize")
    }

    #[test]
    fn test_valid_listing() {
        let record = complete_listing()
            .validate(EncodingVariant::WithChannel)
            .expect("Should validate");

        assert_eq!(record.listing_type, 1);
        assert_eq!(record.genre, 3);
        assert_eq!(record.channel, Some(1));
        assert_eq!(record.named_indices()["In_Engagement"], 111.0);
        assert_eq!(record.named_indices()["Ex_Popularity"], 20000.0);
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let mut raw = complete_listing();
        raw.listing_type = Some(json!("2"));
        raw.e1 = Some(json!("111.5"));

        let record = raw
            .validate(EncodingVariant::WithChannel)
            .expect("Should validate");
        assert_eq!(record.listing_type, 2);
        assert_eq!(record.named_indices()["In_Engagement"], 111.5);
    }

    #[test]
    fn test_missing_fields_all_reported() {
        let mut raw = complete_listing();
        raw.genre = None;
        raw.b2 = None;

        let errors = raw
            .validate(EncodingVariant::WithChannel)
            .expect_err("Should fail");
        assert_eq!(errors.len(), 2);
        assert!(errors.contains("genre"));
        assert!(errors.contains("b2"));
    }

    #[test]
    fn test_invalid_category_reported_per_field() {
        let mut raw = complete_listing();
        raw.listing_type = Some(json!(5));
        raw.genre = Some(json!(0));

        let errors = raw
            .validate(EncodingVariant::WithChannel)
            .expect_err("Should fail");
        assert!(errors.contains("type"));
        assert!(errors.contains("genre"));
    }

    #[test]
    fn test_negative_and_unparsable_indices() {
        let mut raw = complete_listing();
        raw.p1 = Some(json!(-1));
        raw.e2 = Some(json!("not a number"));

        let errors = raw
            .validate(EncodingVariant::WithChannel)
            .expect_err("Should fail");
        assert_eq!(errors.len(), 2);
        assert!(errors.contains("p1"));
        assert!(errors.contains("e2"));
    }

    #[test]
    fn test_channel_optional_without_variant() {
        let mut raw = complete_listing();
        raw.channel = None;

        raw.validate(EncodingVariant::WithChannel)
            .expect_err("Channel variant requires channel");

        let record = raw
            .validate(EncodingVariant::WithoutChannel)
            .expect("Should validate without channel");
        assert_eq!(record.channel, None);
    }
}
