//! Lexical emotion classifier.
//!
//! Scores polarity from an embedded word-valence lexicon, then maps the
//! score to one of eight emotions with a fixed rule order. Pure and
//! deterministic: the same text always yields the same reading.

use moodcart_common::{Emotion, EmotionReading};

/// Confidence reported for neutral readings.
///
/// A floor, not a measurement: neutral text has polarity near zero, and a
/// zero confidence would read as "no classification" downstream.
pub const NEUTRAL_CONFIDENCE: f64 = 0.3;

/// Positive/negative cutoffs. Both are exclusive: exactly 0.3 is not
/// positive, exactly -0.3 is not negative.
const POSITIVE_BOUND: f64 = 0.3;
const NEGATIVE_BOUND: f64 = -0.3;

/// Upper edge of the mildly-negative band that reads as confusion.
const CONFUSED_BOUND: f64 = -0.1;

/// Signed word valences. Scores are averaged over every recognized word,
/// so a lone strong word dominates short utterances.
const LEXICON: &[(&str, f64)] = &[
    // positive
    ("amazing", 0.9),
    ("awesome", 0.9),
    ("fantastic", 0.9),
    ("wonderful", 0.85),
    ("perfect", 0.9),
    ("excellent", 0.85),
    ("thrilled", 0.9),
    ("excited", 0.75),
    ("great", 0.8),
    ("happy", 0.8),
    ("love", 0.7),
    ("loved", 0.7),
    ("good", 0.7),
    ("nice", 0.6),
    ("glad", 0.6),
    ("delighted", 0.85),
    ("beautiful", 0.75),
    ("best", 0.8),
    ("enjoy", 0.6),
    ("fun", 0.6),
    // negative
    ("terrible", -0.9),
    ("horrible", -0.9),
    ("awful", -0.85),
    ("worst", -0.85),
    ("hate", -0.8),
    ("angry", -0.8),
    ("miserable", -0.8),
    ("depressed", -0.8),
    ("exhausted", -0.8),
    ("frustrated", -0.7),
    ("frustrating", -0.7),
    ("bad", -0.7),
    ("sad", -0.7),
    ("upset", -0.65),
    ("stressed", -0.65),
    ("overwhelmed", -0.65),
    ("annoyed", -0.6),
    ("irritated", -0.6),
    ("tired", -0.6),
    ("worried", -0.5),
    ("anxious", -0.5),
    ("lonely", -0.6),
    ("down", -0.5),
    ("busy", -0.4),
    // mildly negative, lands in the confused band on its own
    ("confused", -0.2),
    ("unsure", -0.2),
    ("lost", -0.2),
    ("confusing", -0.2),
];

/// Words that flip the sign of the next sentiment word.
const NEGATORS: &[&str] = &[
    "not", "no", "never", "dont", "don't", "cant", "can't", "wont", "won't", "isnt", "isn't",
    "hardly",
];

/// Keyword sub-lexicons, checked as substrings of the lowercased text so
/// stems like "frustrat" cover both "frustrated" and "frustrating".
const EXCITEMENT_WORDS: &[&str] = &["excited", "thrilled", "amazing", "fantastic"];
const STRESS_WORDS: &[&str] = &["stress", "overwhelm", "pressure", "busy"];
const FRUSTRATION_WORDS: &[&str] = &["frustrat", "annoyed", "irritat", "upset"];
const FATIGUE_WORDS: &[&str] = &["tired", "exhausted", "worn out"];

/// Polarity in [-1, 1] and subjectivity in [0, 1] for a piece of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sentiment {
    pub polarity: f64,
    pub subjectivity: f64,
}

/// Score text against the embedded lexicon.
///
/// Polarity is the mean signed valence of recognized words; subjectivity
/// is the mean absolute valence. Text with no recognized words scores
/// (0, 0), which classifies as neutral.
pub fn score(text: &str) -> Sentiment {
    let mut total = 0.0;
    let mut weight = 0.0;
    let mut count = 0usize;
    let mut negated = false;

    for raw in text.split_whitespace() {
        let word: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '\'')
            .collect::<String>()
            .to_lowercase();
        if word.is_empty() {
            continue;
        }

        if NEGATORS.contains(&word.as_str()) {
            negated = true;
            continue;
        }

        if let Some((_, valence)) = LEXICON.iter().find(|(w, _)| *w == word) {
            let valence = if negated { -valence } else { *valence };
            total += valence;
            weight += valence.abs();
            count += 1;
        }
        negated = false;
    }

    if count == 0 {
        return Sentiment {
            polarity: 0.0,
            subjectivity: 0.0,
        };
    }

    Sentiment {
        polarity: (total / count as f64).clamp(-1.0, 1.0),
        subjectivity: (weight / count as f64).clamp(0.0, 1.0),
    }
}

/// Classify an utterance into an emotion with a confidence.
pub fn classify(text: &str) -> EmotionReading {
    from_sentiment(score(text), text)
}

/// Map a sentiment score to an emotion, consulting the text for keyword
/// overrides.
///
/// Rule order matters: keyword overrides inside the positive and negative
/// branches are checked before the plain happy/sad defaults, and the
/// confused band is only reached when the text is not strongly negative.
fn from_sentiment(sentiment: Sentiment, text: &str) -> EmotionReading {
    let polarity = sentiment.polarity;
    let lowered = text.to_lowercase();

    let contains_any = |words: &[&str]| words.iter().any(|w| lowered.contains(w));

    let emotion = if polarity > POSITIVE_BOUND {
        if contains_any(EXCITEMENT_WORDS) {
            Emotion::Excited
        } else {
            Emotion::Happy
        }
    } else if polarity < NEGATIVE_BOUND {
        if contains_any(STRESS_WORDS) {
            Emotion::Stressed
        } else if contains_any(FRUSTRATION_WORDS) {
            Emotion::Frustrated
        } else if contains_any(FATIGUE_WORDS) {
            Emotion::Tired
        } else {
            Emotion::Sad
        }
    } else if polarity < CONFUSED_BOUND {
        Emotion::Confused
    } else {
        Emotion::Neutral
    };

    let confidence = match emotion {
        Emotion::Neutral => NEUTRAL_CONFIDENCE,
        _ => polarity.abs(),
    };

    EmotionReading { emotion, confidence }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_without_excitement_keywords() {
        let reading = classify("I need a great birthday gift");
        assert_eq!(reading.emotion, Emotion::Happy);
        assert!((reading.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_excited_keyword_overrides_happy() {
        let reading = classify("I am so excited, this is amazing");
        assert_eq!(reading.emotion, Emotion::Excited);
    }

    #[test]
    fn test_stress_keyword_wins_over_other_negatives() {
        // "stressed" is both a valence word and a stress keyword
        let reading = classify("I am so stressed and exhausted");
        assert_eq!(reading.emotion, Emotion::Stressed);
    }

    #[test]
    fn test_frustration_branch() {
        let reading = classify("this is terrible, I am so annoyed");
        assert_eq!(reading.emotion, Emotion::Frustrated);
    }

    #[test]
    fn test_fatigue_branch() {
        let reading = classify("I feel completely exhausted and worn out");
        assert_eq!(reading.emotion, Emotion::Tired);
    }

    #[test]
    fn test_plain_negative_reads_sad() {
        let reading = classify("I feel miserable today");
        assert_eq!(reading.emotion, Emotion::Sad);
        assert!((reading.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_mildly_negative_reads_confused() {
        let reading = classify("I am confused about this");
        assert_eq!(reading.emotion, Emotion::Confused);
        assert!((reading.confidence - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_unscorable_text_is_neutral_with_floor() {
        let reading = classify("laptop under 50000");
        assert_eq!(reading.emotion, Emotion::Neutral);
        assert!((reading.confidence - NEUTRAL_CONFIDENCE).abs() < 1e-9);
    }

    #[test]
    fn test_empty_text_is_neutral() {
        let reading = classify("");
        assert_eq!(reading.emotion, Emotion::Neutral);
        assert!((reading.confidence - NEUTRAL_CONFIDENCE).abs() < 1e-9);
    }

    fn sentiment(polarity: f64) -> Sentiment {
        Sentiment {
            polarity,
            subjectivity: 0.5,
        }
    }

    #[test]
    fn test_positive_bound_is_exclusive() {
        // Lexicon averages rarely land exactly on the bound in f64, so the
        // rule is driven directly with literal polarities.
        let on_bound = from_sentiment(sentiment(0.3), "a great day");
        assert_eq!(on_bound.emotion, Emotion::Neutral);
        assert!((on_bound.confidence - NEUTRAL_CONFIDENCE).abs() < 1e-9);

        let above = from_sentiment(sentiment(0.31), "a great day");
        assert_eq!(above.emotion, Emotion::Happy);
    }

    #[test]
    fn test_negative_bound_is_exclusive() {
        // Exactly -0.3 is not strictly below the bound, so it falls into
        // the confused band; the stress keyword only fires past the bound.
        let on_bound = from_sentiment(sentiment(-0.3), "busy and stressed");
        assert_eq!(on_bound.emotion, Emotion::Confused);
        assert!((on_bound.confidence - 0.3).abs() < 1e-9);

        let below = from_sentiment(sentiment(-0.31), "busy and stressed");
        assert_eq!(below.emotion, Emotion::Stressed);
    }

    #[test]
    fn test_negation_flips_valence() {
        // "not good" scores -0.7, past the negative bound
        let reading = classify("this is not good");
        assert_eq!(reading.emotion, Emotion::Sad);

        let sentiment = score("this is not good");
        assert!(sentiment.polarity < 0.0);
    }

    #[test]
    fn test_negator_only_affects_next_word() {
        // Negation applies to "good", not to "great" two words later
        let s = score("not good but great");
        // (-0.7 + 0.8) / 2
        assert!((s.polarity - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let a = classify("I need a relaxing gift, feeling stressed and overwhelmed");
        let b = classify("I need a relaxing gift, feeling stressed and overwhelmed");
        assert_eq!(a.emotion, b.emotion);
        assert_eq!(a.confidence, b.confidence);
    }

    #[test]
    fn test_subjectivity_bounds() {
        let s = score("amazing terrible good bad");
        assert!(s.subjectivity > 0.0 && s.subjectivity <= 1.0);
        assert_eq!(score("").subjectivity, 0.0);
    }
}
