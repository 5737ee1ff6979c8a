//! Word-weight lexicon classifier tuned for live-chat slang.

use crate::classifier::Classifier;
use crate::error::ClassifierError;

/// Chat word weights.
///
/// Keys are lowercase single words. Values in `(0.0, 1.0]` are positive,
/// in `[-1.0, 0.0)` are negative. The final score is clamped to `[-1.0, 1.0]`.
pub(crate) const LEXICON: &[(&str, f32)] = &[
    // Positive signals
    ("gg", 0.4),
    ("nice", 0.4),
    ("great", 0.4),
    ("good", 0.3),
    ("love", 0.5),
    ("awesome", 0.5),
    ("amazing", 0.5),
    ("best", 0.5),
    ("lol", 0.2),
    ("lmao", 0.2),
    ("pog", 0.5),
    ("poggers", 0.5),
    ("hype", 0.4),
    ("thanks", 0.3),
    ("thank", 0.3),
    ("wow", 0.3),
    ("cool", 0.3),
    ("beautiful", 0.4),
    ("congrats", 0.5),
    ("win", 0.4),
    // Negative signals
    ("bad", -0.4),
    ("boring", -0.5),
    ("trash", -0.6),
    ("hate", -0.6),
    ("worst", -0.6),
    ("terrible", -0.6),
    ("awful", -0.6),
    ("lag", -0.3),
    ("laggy", -0.4),
    ("scam", -0.7),
    ("cringe", -0.5),
    ("sad", -0.3),
    ("annoying", -0.4),
    ("stupid", -0.5),
    ("fail", -0.4),
    ("lose", -0.3),
    ("lost", -0.3),
    ("unfair", -0.4),
    ("ugh", -0.3),
    ("rip", -0.2),
];

/// Scores at or above this are labeled positive.
const POSITIVE_THRESHOLD: f32 = 0.2;
/// Scores at or below this are labeled negative.
const NEGATIVE_THRESHOLD: f32 = -0.2;

/// Score a text string using the chat lexicon.
///
/// Splits text into lowercase words, sums matching weights, and clamps
/// the result to `[-1.0, 1.0]`. Returns `0.0` for empty or unknown text.
#[must_use]
pub fn lexicon_score(text: &str) -> f32 {
    let mut score = 0.0_f32;
    for word in text.split_whitespace() {
        let w = word
            .trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();
        for &(lex_word, weight) in LEXICON {
            if w == lex_word {
                score += weight;
                break;
            }
        }
    }
    score.clamp(-1.0, 1.0)
}

/// Offline classifier that emits three-class model label ids
/// (`LABEL_0` negative, `LABEL_1` neutral, `LABEL_2` positive).
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    fn label_for(text: &str) -> Result<&'static str, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::InvalidInput("empty message".to_owned()));
        }
        let score = lexicon_score(text);
        Ok(if score >= POSITIVE_THRESHOLD {
            "LABEL_2"
        } else if score <= NEGATIVE_THRESHOLD {
            "LABEL_0"
        } else {
            "LABEL_1"
        })
    }
}

impl Classifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> Result<String, ClassifierError> {
        Self::label_for(text).map(str::to_owned)
    }
}
