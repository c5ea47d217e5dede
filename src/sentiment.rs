use crate::models::Sentiment;

/// Valence lexicon: word -> polarity in [-1, 1].
/// Every entry also counts as subjective when computing subjectivity.
const LEXICON: &[(&str, f64)] = &[
    ("love", 0.9),
    ("loved", 0.9),
    ("wonderful", 0.9),
    ("amazing", 0.85),
    ("excellent", 0.85),
    ("great", 0.8),
    ("happy", 0.75),
    ("glad", 0.7),
    ("good", 0.6),
    ("nice", 0.6),
    ("like", 0.5),
    ("enjoy", 0.6),
    ("enjoyed", 0.6),
    ("helpful", 0.5),
    ("welcome", 0.4),
    ("comfortable", 0.5),
    ("optimistic", 0.6),
    ("hopeful", 0.6),
    ("excited", 0.7),
    ("fine", 0.3),
    ("okay", 0.2),
    ("hate", -0.9),
    ("hated", -0.9),
    ("terrible", -0.85),
    ("awful", -0.85),
    ("horrible", -0.85),
    ("miserable", -0.8),
    ("depressed", -0.8),
    ("sad", -0.7),
    ("lonely", -0.65),
    ("homesick", -0.65),
    ("anxious", -0.6),
    ("worried", -0.6),
    ("stressed", -0.6),
    ("bad", -0.6),
    ("afraid", -0.55),
    ("scared", -0.55),
    ("confused", -0.4),
    ("tired", -0.35),
    ("dislike", -0.5),
    ("annoying", -0.5),
    ("difficult", -0.4),
    ("hard", -0.3),
    ("lost", -0.4),
];

/// Multiplier applied to the following lexicon word
const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("so", 1.2),
    ("extremely", 1.5),
    ("totally", 1.3),
    ("quite", 1.1),
    ("slightly", 0.6),
    ("somewhat", 0.7),
];

const NEGATIONS: &[&str] = &["not", "no", "never", "dont", "don't", "cant", "can't", "isnt", "isn't"];

fn lookup(word: &str) -> Option<f64> {
    LEXICON
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, v)| *v)
}

fn intensity(word: &str) -> Option<f64> {
    INTENSIFIERS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, v)| *v)
}

/// Score raw text for polarity and subjectivity.
///
/// Pure and deterministic: token-level lexicon lookup with a one-word
/// negation window ("not happy" flips sign) and intensifier boost
/// ("very sad" scores lower than "sad"). Polarity is the clamped average
/// over scored tokens; subjectivity is the fraction of tokens that carried
/// any opinion signal.
pub fn score(text: &str) -> Sentiment {
    let tokens: Vec<String> = text
        .split_whitespace()
        .map(|t| {
            t.chars()
                .filter(|c| c.is_alphanumeric() || *c == '\'')
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.is_empty() {
        return Sentiment {
            polarity: 0.0,
            subjectivity: 0.0,
        };
    }

    let mut scores: Vec<f64> = Vec::new();
    let mut subjective_tokens = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        let Some(base) = lookup(token) else { continue };
        subjective_tokens += 1;

        let mut value = base;
        // One intensifier directly before the word, with an optional
        // negation before or around it
        if i >= 1 {
            if let Some(mult) = intensity(&tokens[i - 1]) {
                value *= mult;
                if i >= 2 && NEGATIONS.contains(&tokens[i - 2].as_str()) {
                    value = -value * 0.75;
                }
            } else if NEGATIONS.contains(&tokens[i - 1].as_str()) {
                value = -value * 0.75;
            }
        }
        scores.push(value.clamp(-1.0, 1.0));
    }

    let polarity = if scores.is_empty() {
        0.0
    } else {
        (scores.iter().sum::<f64>() / scores.len() as f64).clamp(-1.0, 1.0)
    };
    let subjectivity = (subjective_tokens as f64 / tokens.len() as f64).clamp(0.0, 1.0);

    Sentiment {
        polarity,
        subjectivity,
    }
}
