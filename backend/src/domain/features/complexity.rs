//! Task complexity estimate in `[0, 1]`.
//!
//! Keyword heuristics over prompt text, or a weighted blend of
//! interaction-style signals when no text is available.

use std::collections::BTreeMap;

/// Returned for empty input.
pub const DEFAULT_COMPLEXITY: f64 = 0.5;

const SHORT_PROMPT_WORDS: usize = 20;
const LONG_PROMPT_WORDS: usize = 100;
const LENGTH_MIN: f64 = 0.05;
const LENGTH_MAX: f64 = 0.20;

struct KeywordFactor {
    keywords: &'static [&'static str],
    per_hit: f64,
    cap: f64,
}

const CONSTRAINTS: KeywordFactor = KeywordFactor {
    keywords: &[
        "must", "should", "not", "except", "avoid", "only", "limit", "without", "require",
        "constraint", "restrict", "specific", "exactly", "precisely", "format", "include",
        "handle", "optimize",
    ],
    per_hit: 0.23,
    cap: 0.70,
};

const MULTI_STEP: KeywordFactor = KeywordFactor {
    keywords: &[
        "first", "then", "next", "after", "finally", "step", "stage", "phase", "follow",
        "sequence", "order", "and then", "subsequently", "moreover",
    ],
    per_hit: 0.20,
    cap: 0.60,
};

const STRUCTURE: KeywordFactor = KeywordFactor {
    keywords: &[
        "structure", "organize", "format", "template", "outline", "list", "number", "bullet",
        "table", "section", "header", "subheader", "code", "json", "xml",
    ],
    per_hit: 0.04,
    cap: 0.12,
};

const EXAMPLES: KeywordFactor = KeywordFactor {
    keywords: &[
        "example", "like", "such as", "for instance", "e.g", "show", "demonstrate",
        "illustration", "sample", "template", "reference",
    ],
    per_hit: 0.027,
    cap: 0.08,
};

impl KeywordFactor {
    /// Counts substring occurrences, like a plain `str::matches` scan.
    fn hits(&self, text: &str) -> usize {
        self.keywords.iter().map(|k| text.matches(k).count()).sum()
    }

    fn score(&self, text: &str) -> f64 {
        (self.per_hit * self.hits(text) as f64).min(self.cap)
    }
}

fn length_score(words: usize) -> f64 {
    if words < SHORT_PROMPT_WORDS {
        LENGTH_MIN
    } else if words > LONG_PROMPT_WORDS {
        LENGTH_MAX
    } else {
        let span = (LONG_PROMPT_WORDS - SHORT_PROMPT_WORDS) as f64;
        let t = (words - SHORT_PROMPT_WORDS) as f64 / span;
        LENGTH_MIN + (LENGTH_MAX - LENGTH_MIN) * t
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct ComplexityCalculator;

impl ComplexityCalculator {
    pub fn from_text(prompt: &str) -> f64 {
        if prompt.trim().is_empty() {
            return DEFAULT_COMPLEXITY;
        }
        let lower = prompt.to_lowercase();
        let words = prompt.split_whitespace().count();

        let total = length_score(words)
            + CONSTRAINTS.score(&lower)
            + MULTI_STEP.score(&lower)
            + STRUCTURE.score(&lower)
            + EXAMPLES.score(&lower);

        let score = round2(total.min(1.0));
        tracing::debug!(words, score, "complexity from text");
        score
    }

    pub fn from_signals(signals: &BTreeMap<String, f64>) -> f64 {
        if signals.is_empty() {
            return DEFAULT_COMPLEXITY;
        }
        let signal = |name: &str| signals.get(name).copied().unwrap_or(0.0).max(0.0);

        let total = signal("MULTI_STEP") * 0.4 + signal("ITERATIVE") * 0.3
            + signal("GOAL_ORIENTED") * 0.2
            - signal("CASUAL") * 0.2;

        round2(total.clamp(0.0, 1.0))
    }
}
