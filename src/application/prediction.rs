//! Prediction service: Orchestrates the scoring pipeline.
//!
//! This service coordinates:
//! - Request validation (all failures collected up front)
//! - Standardization (or its explicit bypass)
//! - Categorical dummy encoding
//! - Schema alignment against the model feature list
//! - Scoring and decision derivation

use std::sync::Arc;

use crate::domain::{
    align, encode, standardize, EncodingVariant, Prediction, RawListing, StandardizationTable,
    StandardizedIndices,
};
use crate::ports::Classifier;
use crate::BidcastError;

/// Service for running the prediction pipeline.
///
/// Stateless per call: the classifier and table are immutable after
/// construction, so one instance serves any number of requests without
/// locking.
pub struct PredictionService<C>
where
    C: Classifier,
{
    classifier: Arc<C>,
    table: Option<Arc<StandardizationTable>>,
    variant: EncodingVariant,
}

impl<C> PredictionService<C>
where
    C: Classifier,
{
    /// Create a new prediction service.
    pub fn new(
        classifier: Arc<C>,
        table: Option<Arc<StandardizationTable>>,
        variant: EncodingVariant,
    ) -> Self {
        Self {
            classifier,
            table,
            variant,
        }
    }

    /// Run the full pipeline on a raw listing.
    ///
    /// Validation failures stop the pipeline before any transformation;
    /// every other stage is total over validated input, so a failure
    /// there is classified as unexpected.
    ///
    /// # Errors
    /// Returns [`BidcastError::Validation`] with the full failure set, or
    /// [`BidcastError::Unexpected`] if scoring rejects the vector.
    pub fn predict(&self, raw: &RawListing) -> crate::Result<Prediction> {
        let record = raw
            .validate(self.variant)
            .map_err(BidcastError::Validation)?;

        let standardized = match &self.table {
            Some(table) => standardize(record.named_indices(), table),
            None => {
                tracing::debug!("Standardization bypassed: no table for this process");
                record.named_indices().clone()
            }
        };

        let encoded = encode(&record, &standardized, self.variant);
        let aligned = align(&encoded, self.classifier.feature_list());
        tracing::debug!(
            "Aligned {} of {} encoded features to the model schema",
            aligned.len(),
            encoded.len()
        );

        let probability = self
            .classifier
            .positive_probability(&aligned)
            .map_err(|e| BidcastError::Unexpected(e.to_string()))?;

        let prediction = Prediction::new(probability, StandardizedIndices::from_named(&standardized));
        let details = prediction.details();
        tracing::info!(
            "Prediction complete: result={}, percentage={:.2}%, confidence={:.2}%",
            prediction.result,
            prediction.percentage,
            details.confidence
        );

        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::artifact::{LoadedModel, ModelArtifact};
    use crate::domain::{FeatureStats, Outcome};
    use serde_json::json;
    use std::path::Path;

    fn listing(value: serde_json::Value) -> RawListing {
        serde_json::from_value(value).expect("Should deserialize")
    }

    fn scenario_listing() -> RawListing {
        listing(json!({
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
    }

    fn write_model(dir: &Path, artifact: &ModelArtifact) -> LoadedModel {
        let path = dir.join("model.json");
        std::fs::write(&path, serde_json::to_string(artifact).expect("serialize"))
            .expect("write model");
        LoadedModel::load(&path, Path::new("unused.json")).expect("Should load")
    }

    fn scenario_model(dir: &Path) -> LoadedModel {
        write_model(
            dir,
            &ModelArtifact::Intercept {
                feature_names: vec![
                    "const".into(),
                    "In_Engagement".into(),
                    "Type_2".into(),
                    "Genre_3".into(),
                ],
                coefficients: vec![0.5, 0.0, 0.0, 1.0],
            },
        )
    }

    fn scenario_table() -> StandardizationTable {
        [(
            "In_Engagement".to_string(),
            FeatureStats {
                mean: 111.0,
                std: 1.0,
            },
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_end_to_end_known_model() {
        let temp = tempfile::tempdir().expect("tempdir");
        let service = PredictionService::new(
            Arc::new(scenario_model(temp.path())),
            Some(Arc::new(scenario_table())),
            EncodingVariant::WithChannel,
        );

        let prediction = service
            .predict(&scenario_listing())
            .expect("Should predict");

        // logit = 0.5 (const) + 1.0 (Genre_3); sigmoid(1.5) = 0.81757...
        assert_eq!(prediction.result, Outcome::Up);
        assert!((prediction.percentage - 81.76).abs() < 1e-9);
        // Standardized echo: e1 was centered to 0, the rest passed through.
        assert_eq!(prediction.indices.e1, 0.0);
        assert_eq!(prediction.indices.b1, 111.0);
        assert_eq!(prediction.indices.p2, 20000.0);

        // Same input, same output: the pipeline is deterministic.
        let again = service.predict(&scenario_listing()).expect("Should predict");
        assert_eq!(again.percentage, prediction.percentage);
        assert_eq!(again.result, prediction.result);
    }

    #[test]
    fn test_invalid_category_stops_the_pipeline() {
        let temp = tempfile::tempdir().expect("tempdir");
        let service = PredictionService::new(
            Arc::new(scenario_model(temp.path())),
            Some(Arc::new(scenario_table())),
            EncodingVariant::WithChannel,
        );

        let mut raw = scenario_listing();
        raw.listing_type = Some(json!(5));

        let err = service.predict(&raw).expect_err("Should fail validation");
        match err {
            BidcastError::Validation(errors) => {
                assert!(errors.contains("type"));
                assert_eq!(errors.len(), 1);
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_bypass_echoes_raw_indices() {
        let temp = tempfile::tempdir().expect("tempdir");
        let service = PredictionService::new(
            Arc::new(scenario_model(temp.path())),
            None,
            EncodingVariant::WithChannel,
        );

        let prediction = service
            .predict(&scenario_listing())
            .expect("Should predict");

        assert_eq!(prediction.indices.e1, 111.0);
        assert_eq!(prediction.indices.b1, 111.0);
        assert_eq!(prediction.indices.p1, 10000.0);
        assert_eq!(prediction.indices.e2, 222.0);
        assert_eq!(prediction.indices.b2, 222.0);
        assert_eq!(prediction.indices.p2, 20000.0);
    }

    #[test]
    fn test_margin_family_end_to_end() {
        let temp = tempfile::tempdir().expect("tempdir");
        let model = write_model(
            temp.path(),
            &ModelArtifact::Margin {
                feature_names: Some(vec!["Type_3".into(), "sale_channel_2".into()]),
                coefficients: vec![2.0, -1.0],
                intercept: -0.5,
            },
        );
        let service =
            PredictionService::new(Arc::new(model), None, EncodingVariant::WithChannel);

        let mut raw = scenario_listing();
        raw.listing_type = Some(json!(3));
        raw.channel = Some(json!(2));

        let prediction = service.predict(&raw).expect("Should predict");

        // logit = -0.5 + 2.0 (Type_3) - 1.0 (sale_channel_2) = 0.5
        let expected = 1.0 / (1.0 + (-0.5f64).exp());
        assert_eq!(prediction.result, Outcome::Up);
        assert!((prediction.probability - expected).abs() < 1e-12);
    }
}
