//! Isolation-forest outlier detection over engagement scores.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::AnalysisError;
use crate::types::{AnomalyConfig, ModelOutcome, Outlier};

const EULER_GAMMA: f64 = 0.577_215_664_9;

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// An ensemble of random isolation trees over one-dimensional values.
///
/// Works on any non-empty batch; the minimum-size gate lives in
/// [`detect_anomalies`].
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

impl IsolationForest {
    /// Grow `config.num_trees` trees, each over `min(config.max_samples, n)`
    /// values drawn without replacement.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidParameter`] for an invalid config, an
    /// empty batch or non-finite values.
    pub fn fit(values: &[f64], config: &AnomalyConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        if values.is_empty() {
            return Err(AnalysisError::invalid("values", "batch is empty"));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::invalid("values", "batch contains non-finite values"));
        }

        let sample_size = config.max_samples.min(values.len());
        let height_limit = height_limit(sample_size);
        let mut rng = StdRng::seed_from_u64(config.seed);

        let trees = (0..config.num_trees)
            .map(|_| {
                let sample: Vec<f64> = rand::seq::index::sample(&mut rng, values.len(), sample_size)
                    .into_iter()
                    .map(|i| values[i])
                    .collect();
                grow(sample, 0, height_limit, &mut rng)
            })
            .collect();

        Ok(Self { trees, sample_size })
    }

    /// Anomaly score `2^(-E[h(x)] / c(psi))` in `(0, 1]`; higher is more
    /// anomalous. A forest fitted on a single value scores everything 0.5.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self, value: f64) -> f64 {
        let normalizer = average_path_length(self.sample_size);
        if normalizer <= 0.0 {
            return 0.5;
        }
        let mean_depth = self
            .trees
            .iter()
            .map(|tree| path_length(tree, value, 0))
            .sum::<f64>()
            / self.trees.len() as f64;
        2f64.powf(-mean_depth / normalizer)
    }

    #[must_use]
    pub fn score_samples(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.score(v)).collect()
    }

    /// Indices of values whose score lies strictly above the
    /// `(1 - contamination)` percentile of the batch's scores.
    #[must_use]
    pub fn outlier_indices(&self, values: &[f64], contamination: f64) -> Vec<usize> {
        let scores = self.score_samples(values);
        let threshold = percentile(&scores, 1.0 - contamination);
        scores
            .iter()
            .enumerate()
            .filter(|(_, s)| **s > threshold)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Flag `(post_id, engagement_score)` samples whose engagement is anomalous
/// relative to the batch.
///
/// Returns [`ModelOutcome::InsufficientData`] below `config.min_samples`.
/// Outliers are ordered by anomaly score, then engagement, both descending.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidParameter`] for an invalid config or
/// non-finite engagement scores.
pub fn detect_anomalies(
    samples: &[(i64, f64)],
    config: &AnomalyConfig,
) -> Result<ModelOutcome<Vec<Outlier>>, AnalysisError> {
    config.validate()?;
    if samples.len() < config.min_samples {
        tracing::warn!(
            required = config.min_samples,
            found = samples.len(),
            "not enough posts for anomaly detection"
        );
        return Ok(ModelOutcome::InsufficientData {
            required: config.min_samples,
            found: samples.len(),
        });
    }

    let values: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
    let forest = IsolationForest::fit(&values, config)?;
    let mut outliers: Vec<Outlier> = forest
        .outlier_indices(&values, config.contamination)
        .into_iter()
        .map(|i| {
            let (id, engagement_score) = samples[i];
            Outlier {
                id,
                engagement_score,
                anomaly_score: forest.score(engagement_score),
            }
        })
        .collect();
    outliers.sort_by(|a, b| {
        b.anomaly_score
            .total_cmp(&a.anomaly_score)
            .then_with(|| b.engagement_score.total_cmp(&a.engagement_score))
            .then_with(|| a.id.cmp(&b.id))
    });

    tracing::debug!(
        samples = samples.len(),
        outliers = outliers.len(),
        "anomaly detection complete"
    );
    Ok(ModelOutcome::Fitted(outliers))
}

fn grow(values: Vec<f64>, depth: usize, limit: usize, rng: &mut StdRng) -> Node {
    if depth >= limit || values.len() <= 1 {
        return Node::Leaf { size: values.len() };
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min >= max {
        return Node::Leaf { size: values.len() };
    }

    let threshold = rng.random_range(min..max);
    let (left, right): (Vec<f64>, Vec<f64>) = values.into_iter().partition(|v| *v < threshold);
    Node::Split {
        threshold,
        left: Box::new(grow(left, depth + 1, limit, rng)),
        right: Box::new(grow(right, depth + 1, limit, rng)),
    }
}

#[allow(clippy::cast_precision_loss)]
fn path_length(node: &Node, value: f64, depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            threshold,
            left,
            right,
        } => {
            let next = if value < *threshold { left } else { right };
            path_length(next, value, depth + 1)
        }
    }
}

/// `ceil(log2(psi))`, the depth at which trees stop splitting.
fn height_limit(sample_size: usize) -> usize {
    if sample_size <= 1 {
        0
    } else {
        (usize::BITS - (sample_size - 1).leading_zeros()) as usize
    }
}

/// Expected path length of an unsuccessful BST search over `n` points.
#[allow(clippy::cast_precision_loss)]
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile, `q` in `[0, 1]`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let Some(&last) = sorted.last() else {
        return f64::NAN;
    };
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if upper >= sorted.len() {
        return last;
    }
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: &[f64]) -> Vec<(i64, f64)> {
        (1_i64..).zip(values.iter().copied()).collect()
    }

    #[test]
    fn average_path_length_known_values() {
        assert!(average_path_length(1).abs() < f64::EPSILON);
        assert!((average_path_length(2) - 1.0).abs() < f64::EPSILON);
        let c256 = average_path_length(256);
        assert!((c256 - 10.244_770_920_374_31).abs() < 1e-6, "got {c256}");
    }

    #[test]
    fn height_limit_is_ceil_log2() {
        assert_eq!(height_limit(1), 0);
        assert_eq!(height_limit(2), 1);
        assert_eq!(height_limit(3), 2);
        assert_eq!(height_limit(256), 8);
        assert_eq!(height_limit(257), 9);
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&v, 0.5) - 2.5).abs() < 1e-12);
        assert!((percentile(&v, 0.9) - 3.7).abs() < 1e-12);
        assert!((percentile(&v, 1.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn forest_flags_only_the_extreme_value() {
        let values = [10.0, 12.0, 5000.0];
        let forest = IsolationForest::fit(&values, &AnomalyConfig::default()).unwrap();
        assert_eq!(forest.outlier_indices(&values, 0.1), vec![2]);
        let scores = forest.score_samples(&values);
        assert!(scores[2] > scores[0] && scores[2] > scores[1]);
    }

    #[test]
    fn single_value_forest_is_uninformative() {
        let forest = IsolationForest::fit(&[42.0], &AnomalyConfig::default()).unwrap();
        assert!((forest.score(42.0) - 0.5).abs() < f64::EPSILON);
        assert!(forest.outlier_indices(&[42.0], 0.1).is_empty());
    }

    #[test]
    fn fit_rejects_empty_and_non_finite() {
        let cfg = AnomalyConfig::default();
        assert!(IsolationForest::fit(&[], &cfg).is_err());
        assert!(IsolationForest::fit(&[1.0, f64::NAN], &cfg).is_err());
    }

    #[test]
    fn four_posts_is_insufficient_data() {
        let outcome =
            detect_anomalies(&samples(&[1.0, 2.0, 3.0, 400.0]), &AnomalyConfig::default()).unwrap();
        assert_eq!(
            outcome,
            ModelOutcome::InsufficientData {
                required: 5,
                found: 4
            }
        );
    }

    #[test]
    fn viral_post_is_flagged() {
        let mut values: Vec<f64> = (0..30).map(|i| 100.0 + f64::from(i) * 3.0).collect();
        values.push(25_000.0);
        let outliers = detect_anomalies(&samples(&values), &AnomalyConfig::default())
            .unwrap()
            .fitted()
            .expect("enough samples");
        assert!(!outliers.is_empty());
        assert_eq!(outliers[0].id, 31);
        assert!((outliers[0].engagement_score - 25_000.0).abs() < f64::EPSILON);
        assert!(outliers.len() <= 4);
    }

    #[test]
    fn detection_flags_the_same_posts_as_the_forest() {
        let values = [40.0, 42.0, 45.0, 41.0, 39.0, 44.0, 43.0, 900.0, 38.0, 1.0];
        let cfg = AnomalyConfig::default();
        let forest = IsolationForest::fit(&values, &cfg).unwrap();
        let mut expected: Vec<i64> = forest
            .outlier_indices(&values, cfg.contamination)
            .into_iter()
            .map(|i| i64::try_from(i).unwrap() + 1)
            .collect();
        expected.sort_unstable();

        let mut flagged: Vec<i64> = detect_anomalies(&samples(&values), &cfg)
            .unwrap()
            .fitted()
            .expect("enough samples")
            .iter()
            .map(|o| o.id)
            .collect();
        flagged.sort_unstable();
        assert_eq!(flagged, expected);
    }

    #[test]
    fn outlier_count_is_bounded_by_contamination() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in [5usize, 6, 9, 10, 11, 23, 50, 120, 300] {
            let mut values: Vec<f64> = (0..n)
                .map(|i| {
                    #[allow(clippy::cast_precision_loss)]
                    let base = i as f64;
                    base + rng.random_range(0.0..0.5)
                })
                .collect();
            values[n - 1] *= 50.0;
            let outliers = detect_anomalies(&samples(&values), &AnomalyConfig::default())
                .unwrap()
                .fitted()
                .expect("enough samples");
            #[allow(
                clippy::cast_precision_loss,
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss
            )]
            let bound = (0.1 * n as f64).ceil() as usize;
            assert!(outliers.len() <= bound, "n={n}: {} > {bound}", outliers.len());
        }
    }

    #[test]
    fn outliers_are_ordered_by_score() {
        let values = [5.0, 6.0, 7.0, 5.5, 6.5, 7.5, 5.2, 6.2, 900.0, 2000.0, 6.8, 5.9];
        let cfg = AnomalyConfig {
            contamination: 0.2,
            ..AnomalyConfig::default()
        };
        let outliers = detect_anomalies(&samples(&values), &cfg)
            .unwrap()
            .fitted()
            .expect("enough samples");
        for pair in outliers.windows(2) {
            assert!(pair[0].anomaly_score >= pair[1].anomaly_score);
        }
    }

    #[test]
    fn detection_is_deterministic_for_a_seed() {
        let values: Vec<f64> = (0..40).map(|i| f64::from(i * i)).collect();
        let cfg = AnomalyConfig::default();
        let a = detect_anomalies(&samples(&values), &cfg).unwrap();
        let b = detect_anomalies(&samples(&values), &cfg).unwrap();
        assert_eq!(a, b);
    }
}
