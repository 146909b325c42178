use serde::Serialize;

use crate::error::AnalysisError;

/// Polarity cut-offs used to turn a compound score into a label.
///
/// Both bounds are inclusive: `polarity >= positive` is positive and
/// `polarity <= negative` is negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentThresholds {
    pub positive: f64,
    pub negative: f64,
}

impl SentimentThresholds {
    /// Thresholds at `+threshold` / `-threshold`.
    #[must_use]
    pub fn symmetric(threshold: f64) -> Self {
        Self {
            positive: threshold,
            negative: -threshold,
        }
    }
}

impl Default for SentimentThresholds {
    fn default() -> Self {
        Self::symmetric(0.05)
    }
}

/// Parameters for the latent Dirichlet allocation topic model.
#[derive(Debug, Clone)]
pub struct TopicConfig {
    /// Number of latent topics (`k`).
    pub num_topics: usize,
    /// Full EM passes over the corpus.
    pub passes: usize,
    /// Tokens reported per topic.
    pub top_words: usize,
    /// Corpora smaller than this yield [`ModelOutcome::InsufficientData`].
    pub min_documents: usize,
    /// Per-document variational iterations cap.
    pub max_iterations: usize,
    pub seed: u64,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            num_topics: 3,
            passes: 5,
            top_words: 5,
            min_documents: 10,
            max_iterations: 50,
            seed: 42,
        }
    }
}

impl TopicConfig {
    pub(crate) fn validate(&self) -> Result<(), AnalysisError> {
        if self.num_topics == 0 {
            return Err(AnalysisError::invalid("num_topics", "must be at least 1"));
        }
        if self.passes == 0 {
            return Err(AnalysisError::invalid("passes", "must be at least 1"));
        }
        if self.max_iterations == 0 {
            return Err(AnalysisError::invalid("max_iterations", "must be at least 1"));
        }
        Ok(())
    }
}

/// Parameters for the isolation-forest anomaly detector.
#[derive(Debug, Clone)]
pub struct AnomalyConfig {
    pub num_trees: usize,
    /// Upper bound on the per-tree sub-sample size; the effective size is
    /// `min(max_samples, n)`.
    pub max_samples: usize,
    /// Expected share of outliers, in `(0, 0.5]`.
    pub contamination: f64,
    /// Batches smaller than this yield [`ModelOutcome::InsufficientData`].
    pub min_samples: usize,
    pub seed: u64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            num_trees: 100,
            max_samples: 256,
            contamination: 0.1,
            min_samples: 5,
            seed: 42,
        }
    }
}

impl AnomalyConfig {
    pub(crate) fn validate(&self) -> Result<(), AnalysisError> {
        if self.num_trees == 0 {
            return Err(AnalysisError::invalid("num_trees", "must be at least 1"));
        }
        if self.max_samples == 0 {
            return Err(AnalysisError::invalid("max_samples", "must be at least 1"));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(AnalysisError::invalid(
                "contamination",
                format!("{} is outside (0, 0.5]", self.contamination),
            ));
        }
        Ok(())
    }
}

/// Result of a model run that needs a minimum amount of input.
///
/// Too little data is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutcome<T> {
    Fitted(T),
    InsufficientData { required: usize, found: usize },
}

impl<T> ModelOutcome<T> {
    /// The fitted value, if any.
    pub fn fitted(self) -> Option<T> {
        match self {
            ModelOutcome::Fitted(value) => Some(value),
            ModelOutcome::InsufficientData { .. } => None,
        }
    }

    #[must_use]
    pub fn is_fitted(&self) -> bool {
        matches!(self, ModelOutcome::Fitted(_))
    }
}

/// One latent topic: its ephemeral id and its highest-weight tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topic {
    pub topic_id: usize,
    pub words: Vec<TopicWord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicWord {
    pub word: String,
    pub probability: f64,
}

/// A post selected as an outlier by the anomaly detector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outlier {
    pub id: i64,
    pub engagement_score: f64,
    /// Isolation score in `(0, 1]`; higher is more anomalous.
    pub anomaly_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_are_symmetric() {
        let t = SentimentThresholds::default();
        assert!((t.positive - 0.05).abs() < f64::EPSILON);
        assert!((t.negative + 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn topic_config_rejects_zero_topics() {
        let cfg = TopicConfig {
            num_topics: 0,
            ..TopicConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(AnalysisError::InvalidParameter { name: "num_topics", .. })
        ));
    }

    #[test]
    fn anomaly_config_rejects_out_of_range_contamination() {
        for contamination in [0.0, 0.75, f64::NAN] {
            let cfg = AnomalyConfig {
                contamination,
                ..AnomalyConfig::default()
            };
            assert!(cfg.validate().is_err(), "accepted {contamination}");
        }
    }

    #[test]
    fn model_outcome_fitted_unwraps_value() {
        assert_eq!(ModelOutcome::Fitted(3).fitted(), Some(3));
        let empty: ModelOutcome<i32> = ModelOutcome::InsufficientData {
            required: 5,
            found: 4,
        };
        assert!(!empty.is_fitted());
        assert_eq!(empty.fitted(), None);
    }
}
