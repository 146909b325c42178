//! Latent Dirichlet allocation fitted with batch variational EM.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::AnalysisError;
use crate::types::{ModelOutcome, Topic, TopicConfig, TopicWord};

/// Mean absolute change in a document's `gamma` below which the E-step stops.
const GAMMA_THRESHOLD: f64 = 1e-3;

/// A fitted topic model: vocabulary plus the variational topic-word
/// parameters (`lambda`, one row per topic).
#[derive(Debug, Clone)]
pub struct LdaModel {
    vocabulary: Vec<String>,
    lambda: Vec<Vec<f64>>,
}

type BagOfWords = Vec<(usize, f64)>;

impl LdaModel {
    /// Fit `config.num_topics` topics over whitespace-tokenized documents.
    ///
    /// Empty documents are ignored. The fit is deterministic for a given
    /// corpus and `config.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidParameter`] for an invalid config or a
    /// corpus with no tokens.
    pub fn fit(documents: &[&str], config: &TopicConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let (vocabulary, corpus) = build_corpus(documents);
        if vocabulary.is_empty() {
            return Err(AnalysisError::invalid("documents", "corpus has no tokens"));
        }

        let k = config.num_topics;
        let v = vocabulary.len();
        #[allow(clippy::cast_precision_loss)]
        let prior = 1.0 / k as f64;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut lambda: Vec<Vec<f64>> = (0..k)
            .map(|_| (0..v).map(|_| rng.random_range(0.9..1.1)).collect())
            .collect();

        for pass in 0..config.passes {
            let exp_elog_beta = expected_log_exp(&lambda);
            let mut sstats = vec![vec![0.0; v]; k];
            let mut converged_docs = 0usize;

            for bow in &corpus {
                let (exp_elog_theta, phinorm, converged) =
                    infer_document(bow, &exp_elog_beta, prior, config.max_iterations, &mut rng);
                if converged {
                    converged_docs += 1;
                }
                for (t, row) in sstats.iter_mut().enumerate() {
                    for (&(id, count), norm) in bow.iter().zip(&phinorm) {
                        row[id] += exp_elog_theta[t] * count / norm;
                    }
                }
            }

            for (t, row) in lambda.iter_mut().enumerate() {
                for (w, value) in row.iter_mut().enumerate() {
                    *value = prior + sstats[t][w] * exp_elog_beta[t][w];
                }
            }
            tracing::debug!(
                pass,
                converged_docs,
                documents = corpus.len(),
                "topic model pass complete"
            );
        }

        Ok(Self { vocabulary, lambda })
    }

    /// Number of fitted topics.
    #[must_use]
    pub fn num_topics(&self) -> usize {
        self.lambda.len()
    }

    /// Each topic's `top_n` highest-probability tokens, best first.
    ///
    /// Ties are broken alphabetically so output is stable.
    #[must_use]
    pub fn topics(&self, top_n: usize) -> Vec<Topic> {
        self.lambda
            .iter()
            .enumerate()
            .map(|(topic_id, row)| {
                let total: f64 = row.iter().sum();
                let mut words: Vec<TopicWord> = row
                    .iter()
                    .zip(&self.vocabulary)
                    .map(|(weight, word)| TopicWord {
                        word: word.clone(),
                        probability: weight / total,
                    })
                    .collect();
                words.sort_by(|a, b| {
                    b.probability
                        .total_cmp(&a.probability)
                        .then_with(|| a.word.cmp(&b.word))
                });
                words.truncate(top_n);
                Topic { topic_id, words }
            })
            .collect()
    }
}

/// Fit a topic model over normalized post texts and report its topics.
///
/// Documents with no tokens are skipped; fewer than `config.min_documents`
/// remaining documents yields [`ModelOutcome::InsufficientData`].
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidParameter`] if `config` is invalid.
pub fn extract_topics(
    documents: &[&str],
    config: &TopicConfig,
) -> Result<ModelOutcome<Vec<Topic>>, AnalysisError> {
    config.validate()?;
    let usable: Vec<&str> = documents
        .iter()
        .copied()
        .filter(|doc| !doc.trim().is_empty())
        .collect();

    if usable.len() < config.min_documents {
        tracing::warn!(
            required = config.min_documents,
            found = usable.len(),
            "not enough documents for topic modeling"
        );
        return Ok(ModelOutcome::InsufficientData {
            required: config.min_documents,
            found: usable.len(),
        });
    }

    let model = LdaModel::fit(&usable, config)?;
    Ok(ModelOutcome::Fitted(model.topics(config.top_words)))
}

/// Assign token ids in first-seen order and count tokens per document.
fn build_corpus(documents: &[&str]) -> (Vec<String>, Vec<BagOfWords>) {
    let mut ids: HashMap<&str, usize> = HashMap::new();
    let mut vocabulary = Vec::new();
    let mut corpus = Vec::with_capacity(documents.len());

    for doc in documents {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in doc.split_whitespace() {
            let id = *ids.entry(token).or_insert_with(|| {
                vocabulary.push(token.to_string());
                vocabulary.len() - 1
            });
            *counts.entry(id).or_insert(0.0) += 1.0;
        }
        if !counts.is_empty() {
            corpus.push(counts.into_iter().collect());
        }
    }
    (vocabulary, corpus)
}

/// Variational E-step for one document.
///
/// Returns `exp(E[log theta])`, the per-token normalizers and whether
/// `gamma` converged within `max_iterations`.
fn infer_document(
    bow: &[(usize, f64)],
    exp_elog_beta: &[Vec<f64>],
    alpha: f64,
    max_iterations: usize,
    rng: &mut StdRng,
) -> (Vec<f64>, Vec<f64>, bool) {
    let k = exp_elog_beta.len();
    let mut gamma: Vec<f64> = (0..k).map(|_| rng.random_range(0.9..1.1)).collect();
    let mut exp_elog_theta = dirichlet_expectation_exp(&gamma);
    let mut phinorm = phi_normalizers(bow, &exp_elog_theta, exp_elog_beta);
    let mut converged = false;

    for _ in 0..max_iterations {
        let last = gamma.clone();
        for t in 0..k {
            let weighted: f64 = bow
                .iter()
                .zip(&phinorm)
                .map(|(&(id, count), norm)| count / norm * exp_elog_beta[t][id])
                .sum();
            gamma[t] = alpha + exp_elog_theta[t] * weighted;
        }
        exp_elog_theta = dirichlet_expectation_exp(&gamma);
        phinorm = phi_normalizers(bow, &exp_elog_theta, exp_elog_beta);

        #[allow(clippy::cast_precision_loss)]
        let mean_change =
            gamma.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum::<f64>() / k as f64;
        if mean_change < GAMMA_THRESHOLD {
            converged = true;
            break;
        }
    }
    (exp_elog_theta, phinorm, converged)
}

fn phi_normalizers(bow: &[(usize, f64)], exp_elog_theta: &[f64], exp_elog_beta: &[Vec<f64>]) -> Vec<f64> {
    bow.iter()
        .map(|&(id, _)| {
            exp_elog_theta
                .iter()
                .zip(exp_elog_beta)
                .map(|(theta, beta)| theta * beta[id])
                .sum::<f64>()
                + 1e-100
        })
        .collect()
}

/// `exp(E[log x])` for `x ~ Dirichlet(params)`.
fn dirichlet_expectation_exp(params: &[f64]) -> Vec<f64> {
    let total = digamma(params.iter().sum());
    params.iter().map(|&p| (digamma(p) - total).exp()).collect()
}

fn expected_log_exp(lambda: &[Vec<f64>]) -> Vec<Vec<f64>> {
    lambda.iter().map(|row| dirichlet_expectation_exp(row)).collect()
}

/// Digamma function for positive arguments.
///
/// Shifts `x` above 6 with the recurrence `psi(x) = psi(x + 1) - 1/x`, then
/// applies the asymptotic series.
pub(crate) fn digamma(mut x: f64) -> f64 {
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    result + x.ln()
        - 0.5 / x
        - f * (1.0 / 12.0 - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f / 132.0))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_theme_corpus() -> Vec<&'static str> {
        let mut docs = Vec::new();
        docs.extend(std::iter::repeat_n("python code programming developer", 6));
        docs.extend(std::iter::repeat_n("python developer code library", 4));
        docs.extend(std::iter::repeat_n("football match goal team", 6));
        docs.extend(std::iter::repeat_n("football team stadium goal", 4));
        docs
    }

    #[test]
    fn digamma_matches_known_values() {
        assert!((digamma(1.0) + 0.577_215_664_901_532_9).abs() < 1e-9);
        assert!((digamma(0.5) + 1.963_510_026_021_423_5).abs() < 1e-9);
        assert!((digamma(10.0) - 2.251_752_589_066_721).abs() < 1e-9);
    }

    #[test]
    fn too_few_documents_is_insufficient_data() {
        let docs = vec!["python code"; 9];
        let outcome = extract_topics(&docs, &TopicConfig::default()).unwrap();
        assert_eq!(
            outcome,
            ModelOutcome::InsufficientData {
                required: 10,
                found: 9
            }
        );
    }

    #[test]
    fn empty_documents_do_not_count() {
        let mut docs = vec!["python code"; 9];
        docs.extend(["", "   "]);
        let outcome = extract_topics(&docs, &TopicConfig::default()).unwrap();
        assert!(matches!(
            outcome,
            ModelOutcome::InsufficientData { found: 9, .. }
        ));
    }

    #[test]
    fn invalid_config_is_an_error() {
        let cfg = TopicConfig {
            passes: 0,
            ..TopicConfig::default()
        };
        assert!(extract_topics(&two_theme_corpus(), &cfg).is_err());
    }

    #[test]
    fn reports_k_topics_with_ranked_words() {
        let outcome = extract_topics(&two_theme_corpus(), &TopicConfig::default()).unwrap();
        let topics = outcome.fitted().expect("enough documents");
        assert_eq!(topics.len(), 3);
        for (i, topic) in topics.iter().enumerate() {
            assert_eq!(topic.topic_id, i);
            assert_eq!(topic.words.len(), 5);
            for pair in topic.words.windows(2) {
                assert!(pair[0].probability >= pair[1].probability);
            }
            assert!(topic.words.iter().all(|w| w.probability > 0.0 && w.probability <= 1.0));
        }
    }

    #[test]
    fn separates_distinct_themes() {
        let cfg = TopicConfig {
            num_topics: 2,
            top_words: 4,
            ..TopicConfig::default()
        };
        let topics = extract_topics(&two_theme_corpus(), &cfg)
            .unwrap()
            .fitted()
            .expect("enough documents");
        let coding = ["python", "code", "programming", "developer", "library"];
        let sport = ["football", "match", "goal", "team", "stadium"];
        for topic in &topics {
            let words: Vec<&str> = topic.words.iter().map(|w| w.word.as_str()).collect();
            let pure = words.iter().all(|w| coding.contains(w)) || words.iter().all(|w| sport.contains(w));
            assert!(pure, "mixed topic: {words:?}");
        }
        assert_ne!(topics[0].words[0].word, topics[1].words[0].word);
    }

    #[test]
    fn fit_is_deterministic_for_a_seed() {
        let docs = two_theme_corpus();
        let cfg = TopicConfig::default();
        let first = extract_topics(&docs, &cfg).unwrap();
        let second = extract_topics(&docs, &cfg).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn fit_rejects_token_free_corpus() {
        let err = LdaModel::fit(&["", " "], &TopicConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter { name: "documents", .. }));
    }
}
