//! Valence-lexicon sentiment scorer.
//!
//! Rule-based scorer in the VADER family: each word carries a valence on a
//! `[-4, 4]` scale, adjusted by preceding intensifiers, negations in a
//! three-token window, contrastive "but", ALL-CAPS emphasis and exclamation
//! marks. The summed valence is squashed into `[-1, 1]`.

use serde::Serialize;
use trendwatch_core::SentimentLabel;

use crate::types::SentimentThresholds;

/// Word valences on the `[-4, 4]` scale. Keys are lowercase.
pub(crate) const LEXICON: &[(&str, f64)] = &[
    // Positive
    ("agree", 1.5),
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("beautiful", 2.9),
    ("benefit", 2.0),
    ("best", 3.2),
    ("better", 1.9),
    ("brilliant", 2.8),
    ("celebrate", 2.7),
    ("cool", 1.3),
    ("easy", 1.9),
    ("enjoy", 2.2),
    ("enjoyed", 2.3),
    ("excellent", 2.7),
    ("excited", 1.4),
    ("exciting", 2.2),
    ("fantastic", 2.6),
    ("fascinating", 2.4),
    ("favorite", 2.0),
    ("fun", 2.3),
    ("glad", 2.0),
    ("good", 1.9),
    ("great", 3.1),
    ("growth", 1.6),
    ("haha", 2.0),
    ("happy", 2.7),
    ("helpful", 1.8),
    ("hope", 1.9),
    ("impressive", 2.3),
    ("improve", 1.9),
    ("improved", 2.1),
    ("incredible", 2.2),
    ("innovative", 1.9),
    ("inspiring", 2.4),
    ("interesting", 1.7),
    ("like", 1.5),
    ("liked", 1.8),
    ("lol", 2.9),
    ("love", 3.2),
    ("loved", 2.9),
    ("lovely", 2.8),
    ("loves", 2.7),
    ("nice", 1.8),
    ("ok", 1.2),
    ("okay", 0.9),
    ("perfect", 2.7),
    ("positive", 2.6),
    ("powerful", 1.8),
    ("promising", 1.7),
    ("proud", 2.1),
    ("recommend", 1.5),
    ("smart", 1.7),
    ("strong", 2.3),
    ("success", 2.7),
    ("successful", 2.8),
    ("support", 1.7),
    ("thank", 1.5),
    ("thanks", 1.9),
    ("trust", 2.3),
    ("useful", 1.9),
    ("win", 2.8),
    ("winning", 2.4),
    ("wins", 2.7),
    ("wonderful", 2.7),
    ("wow", 2.8),
    ("yes", 1.7),
    // Negative
    ("angry", -2.3),
    ("annoying", -1.7),
    ("awful", -2.0),
    ("bad", -2.5),
    ("boring", -1.3),
    ("broken", -2.1),
    ("confusing", -1.3),
    ("crash", -1.7),
    ("crisis", -3.1),
    ("cry", -2.1),
    ("danger", -2.4),
    ("dangerous", -2.1),
    ("dead", -3.3),
    ("difficult", -1.5),
    ("disappointed", -1.9),
    ("disappointing", -2.2),
    ("disaster", -3.1),
    ("doubt", -1.5),
    ("fail", -2.5),
    ("failed", -2.3),
    ("failure", -2.3),
    ("fake", -2.1),
    ("fear", -2.2),
    ("fraud", -2.8),
    ("hate", -2.7),
    ("hated", -3.2),
    ("horrible", -2.5),
    ("hurt", -2.4),
    ("kill", -3.7),
    ("lose", -1.7),
    ("loss", -1.3),
    ("lost", -1.3),
    ("negative", -2.7),
    ("overrated", -1.5),
    ("pain", -2.3),
    ("poor", -2.1),
    ("problem", -1.7),
    ("problems", -1.7),
    ("risk", -1.1),
    ("sad", -2.1),
    ("scam", -2.2),
    ("scary", -2.2),
    ("spam", -1.5),
    ("stupid", -2.4),
    ("sucks", -1.5),
    ("terrible", -2.1),
    ("ugly", -2.3),
    ("useless", -1.8),
    ("waste", -1.8),
    ("worried", -1.2),
    ("worry", -1.9),
    ("worse", -2.1),
    ("worst", -3.1),
    ("wrong", -2.1),
];

const BOOST_INCR: f64 = 0.293;
const BOOST_DECR: f64 = -0.293;
const CAPS_INCR: f64 = 0.733;
const NEGATION_SCALAR: f64 = -0.74;
const NORMALIZE_ALPHA: f64 = 15.0;

const BOOSTERS_INCR: &[&str] = &[
    "absolutely", "amazingly", "completely", "deeply", "especially", "extremely", "highly",
    "hugely", "incredibly", "insanely", "most", "particularly", "really", "so", "super",
    "totally", "truly", "very",
];

const BOOSTERS_DECR: &[&str] = &[
    "almost", "barely", "hardly", "marginally", "partly", "scarcely", "slightly", "somewhat",
];

const NEGATIONS: &[&str] = &[
    "aint", "cannot", "cant", "couldnt", "didnt", "doesnt", "dont", "hadnt", "hasnt", "havent",
    "isnt", "neither", "never", "no", "nobody", "none", "nor", "not", "nothing", "nowhere",
    "rarely", "seldom", "shouldnt", "wasnt", "werent", "without", "wont", "wouldnt",
];

/// Proportions of positive/negative/neutral content plus the compound score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentScores {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
    /// Normalized overall polarity in `[-1, 1]`.
    pub compound: f64,
}

impl SentimentScores {
    const EMPTY: SentimentScores = SentimentScores {
        positive: 0.0,
        negative: 0.0,
        neutral: 1.0,
        compound: 0.0,
    };
}

/// Full score breakdown for `text`. Empty text is fully neutral.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn polarity_scores(text: &str) -> SentimentScores {
    let words = tokenize(text);
    if words.is_empty() {
        return SentimentScores::EMPTY;
    }

    let cap_differential = has_cap_differential(&words);
    let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();

    let mut sentiments: Vec<f64> = (0..words.len())
        .map(|i| word_valence(&words, &lowered, i, cap_differential))
        .collect();

    if let Some(pivot) = lowered.iter().position(|w| w == "but") {
        for (i, s) in sentiments.iter_mut().enumerate() {
            if i < pivot {
                *s *= 0.5;
            } else if i > pivot {
                *s *= 1.5;
            }
        }
    }

    let punct_amp = punctuation_emphasis(text);
    let total: f64 = sentiments.iter().sum();
    let compound = if total == 0.0 {
        0.0
    } else {
        squash(total + total.signum() * punct_amp)
    };

    let mut pos_sum = 0.0;
    let mut neg_sum = 0.0;
    let mut neutral_count = 0usize;
    for &s in &sentiments {
        if s > 0.0 {
            pos_sum += s + 1.0;
        } else if s < 0.0 {
            neg_sum += s - 1.0;
        } else {
            neutral_count += 1;
        }
    }
    if pos_sum > neg_sum.abs() {
        pos_sum += punct_amp;
    } else if pos_sum < neg_sum.abs() {
        neg_sum -= punct_amp;
    }

    let denominator = pos_sum + neg_sum.abs() + neutral_count as f64;
    SentimentScores {
        positive: (pos_sum / denominator).abs(),
        negative: (neg_sum / denominator).abs(),
        neutral: (neutral_count as f64 / denominator).abs(),
        compound,
    }
}

/// Compound polarity of `text` in `[-1, 1]`.
#[must_use]
pub fn polarity(text: &str) -> f64 {
    polarity_scores(text).compound
}

/// Label and polarity for `text`. Empty text is `(Neutral, 0.0)`.
#[must_use]
pub fn sentiment(text: &str, thresholds: &SentimentThresholds) -> (SentimentLabel, f64) {
    let compound = polarity(text);
    (classify(compound, thresholds), compound)
}

/// Map a polarity to a label. Both thresholds are inclusive.
#[must_use]
pub fn classify(polarity: f64, thresholds: &SentimentThresholds) -> SentimentLabel {
    if polarity >= thresholds.positive {
        SentimentLabel::Positive
    } else if polarity <= thresholds.negative {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Per-label post counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentDistribution {
    pub fn add(&mut self, label: SentimentLabel, count: usize) {
        match label {
            SentimentLabel::Positive => self.positive += count,
            SentimentLabel::Negative => self.negative += count,
            SentimentLabel::Neutral => self.neutral += count,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }
}

/// Label distribution and mean polarity over a set of scored posts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentSummary {
    pub distribution: SentimentDistribution,
    pub average_sentiment: f64,
    pub total_analyzed: usize,
}

impl SentimentSummary {
    /// Combine `(label, count, mean polarity)` groups, weighting each mean
    /// by its count. `None` when the groups hold no posts.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_groups<I>(groups: I) -> Option<Self>
    where
        I: IntoIterator<Item = (SentimentLabel, usize, f64)>,
    {
        let mut distribution = SentimentDistribution::default();
        let mut weighted = 0.0;
        for (label, count, mean) in groups {
            distribution.add(label, count);
            weighted += mean * count as f64;
        }

        let total = distribution.total();
        if total == 0 {
            return None;
        }
        Some(Self {
            distribution,
            average_sentiment: weighted / total as f64,
            total_analyzed: total,
        })
    }

    /// Score each text and summarize the results.
    #[must_use]
    pub fn from_texts<'a, I>(texts: I, thresholds: &SentimentThresholds) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self::from_groups(texts.into_iter().map(|text| {
            let (label, score) = sentiment(text, thresholds);
            (label, 1, score)
        }))
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !(c.is_alphanumeric() || c == '\'')))
        .filter(|w| !w.is_empty())
        .collect()
}

fn is_all_caps(word: &str) -> bool {
    word.chars().any(char::is_alphabetic) && !word.chars().any(char::is_lowercase)
}

/// Caps emphasis only counts when some, but not all, words are upper-case.
fn has_cap_differential(words: &[&str]) -> bool {
    let caps = words.iter().filter(|w| is_all_caps(w)).count();
    caps > 0 && caps < words.len()
}

fn lexicon_valence(word: &str) -> Option<f64> {
    LEXICON
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, valence)| *valence)
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.contains("n't")
}

fn booster_scalar(word: &str, lowered: &str, valence: f64, cap_differential: bool) -> f64 {
    let mut scalar = if BOOSTERS_INCR.contains(&lowered) {
        BOOST_INCR
    } else if BOOSTERS_DECR.contains(&lowered) {
        BOOST_DECR
    } else {
        return 0.0;
    };
    if valence < 0.0 {
        scalar = -scalar;
    }
    if cap_differential && is_all_caps(word) {
        scalar += CAPS_INCR.copysign(valence);
    }
    scalar
}

fn word_valence(words: &[&str], lowered: &[String], i: usize, cap_differential: bool) -> f64 {
    let word = lowered[i].as_str();
    if BOOSTERS_INCR.contains(&word) || BOOSTERS_DECR.contains(&word) {
        return 0.0;
    }
    let Some(mut valence) = lexicon_valence(word) else {
        return 0.0;
    };

    if cap_differential && is_all_caps(words[i]) {
        valence += CAPS_INCR.copysign(valence);
    }

    for distance in 1..=3usize {
        if i < distance {
            break;
        }
        let j = i - distance;
        let prev = lowered[j].as_str();
        if lexicon_valence(prev).is_none() {
            let mut boost = booster_scalar(words[j], prev, valence, cap_differential);
            match distance {
                2 => boost *= 0.95,
                3 => boost *= 0.9,
                _ => {}
            }
            valence += boost;
        }
        if is_negation(prev) {
            valence *= NEGATION_SCALAR;
        }
    }
    valence
}

#[allow(clippy::cast_precision_loss)]
fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(4);
    let questions = text.matches('?').count();
    let question_amp = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * 0.18,
        _ => 0.96,
    };
    exclamations as f64 * 0.292 + question_amp
}

fn squash(score: f64) -> f64 {
    (score / (score * score + NORMALIZE_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> SentimentThresholds {
        SentimentThresholds::default()
    }

    #[test]
    fn positive_text_is_positive() {
        let (label, score) = sentiment("I love this amazing product! It's fantastic!", &defaults());
        assert_eq!(label, SentimentLabel::Positive);
        assert!(score > 0.0);
    }

    #[test]
    fn negative_text_is_negative() {
        let (label, score) = sentiment("This is terrible and awful. I hate it.", &defaults());
        assert_eq!(label, SentimentLabel::Negative);
        assert!(score < 0.0);
    }

    #[test]
    fn factual_text_is_neutral() {
        let (label, score) = sentiment("The product exists. It is available.", &defaults());
        assert_eq!(label, SentimentLabel::Neutral);
        assert!(score.abs() < f64::EPSILON);
    }

    #[test]
    fn empty_text_is_neutral_zero() {
        assert_eq!(sentiment("", &defaults()), (SentimentLabel::Neutral, 0.0));
        assert_eq!(polarity_scores("   "), SentimentScores::EMPTY);
    }

    #[test]
    fn negation_flips_polarity() {
        assert!(polarity("this is good") > 0.0);
        assert!(polarity("this is not good") < 0.0);
        assert!(polarity("this isn't good") < 0.0);
        assert!(polarity("never really that good") < 0.0);
    }

    #[test]
    fn boosters_and_exclamations_intensify() {
        let plain = polarity("the demo was good");
        assert!(polarity("the demo was very good") > plain);
        assert!(polarity("the demo was good!!!") > plain);
        assert!(polarity("the demo was slightly good") < plain);
    }

    #[test]
    fn caps_emphasis_only_with_mixed_case() {
        assert!(polarity("this launch is GREAT") > polarity("this launch is great"));
        let all_caps = polarity("THIS LAUNCH IS GREAT");
        assert!((all_caps - polarity("this launch is great")).abs() < 1e-12);
    }

    #[test]
    fn clause_after_but_dominates() {
        let score = polarity("the model is great but the docs are terrible");
        assert!(score < 0.0, "expected negative, got {score}");
    }

    #[test]
    fn compound_stays_in_range() {
        let text = "best best best amazing awesome love love great fantastic wonderful!!!!";
        let score = polarity(text);
        assert!(score > 0.9 && score <= 1.0, "got {score}");
        let neg = polarity("worst worst terrible awful hate horrible disaster kill");
        assert!((-1.0..-0.9).contains(&neg), "got {neg}");
    }

    #[test]
    fn proportions_sum_to_one() {
        let scores = polarity_scores("good product, bad support, plain box");
        let sum = scores.positive + scores.negative + scores.neutral;
        assert!((sum - 1.0).abs() < 1e-9, "got {sum}");
    }

    #[test]
    fn classify_boundaries_are_inclusive() {
        let t = defaults();
        assert_eq!(classify(0.05, &t), SentimentLabel::Positive);
        assert_eq!(classify(-0.05, &t), SentimentLabel::Negative);
        assert_eq!(classify(0.049, &t), SentimentLabel::Neutral);
        assert_eq!(classify(-0.049, &t), SentimentLabel::Neutral);
        assert_eq!(classify(0.0, &t), SentimentLabel::Neutral);
    }

    #[test]
    fn classify_honors_custom_thresholds() {
        let t = SentimentThresholds::symmetric(0.5);
        assert_eq!(classify(0.3, &t), SentimentLabel::Neutral);
        assert_eq!(classify(0.5, &t), SentimentLabel::Positive);
        assert_eq!(classify(-0.7, &t), SentimentLabel::Negative);
    }

    #[test]
    fn summary_from_texts_counts_each_label() {
        let summary = SentimentSummary::from_texts(
            ["I love this!", "This is bad.", "Neutral statement."],
            &defaults(),
        )
        .expect("summary");
        assert_eq!(
            summary.distribution,
            SentimentDistribution {
                positive: 1,
                negative: 1,
                neutral: 1
            }
        );
        assert_eq!(summary.total_analyzed, 3);
        assert!((-1.0..=1.0).contains(&summary.average_sentiment));
    }

    #[test]
    fn summary_weights_group_means_by_count() {
        let summary = SentimentSummary::from_groups([
            (SentimentLabel::Negative, 1, -0.5),
            (SentimentLabel::Neutral, 1, 0.0),
            (SentimentLabel::Positive, 2, 0.5),
        ])
        .expect("summary");
        assert_eq!(summary.distribution.positive, 2);
        assert_eq!(summary.total_analyzed, 4);
        assert!((summary.average_sentiment - 0.125).abs() < 1e-12);
    }

    #[test]
    fn summary_of_nothing_is_none() {
        assert!(SentimentSummary::from_texts(std::iter::empty(), &defaults()).is_none());
        assert!(SentimentSummary::from_groups([(SentimentLabel::Positive, 0, 0.9)]).is_none());
    }
}
