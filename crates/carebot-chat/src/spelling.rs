//! Token-level spelling correction.

/// Suggests a replacement for a single token.
pub trait Spellchecker: Send + Sync {
    /// Best correction for `token`, or `None` to keep it as typed.
    fn correct(&self, token: &str) -> Option<String>;

    /// Correct each space-delimited token independently.
    fn correct_text(&self, text: &str) -> String {
        text.split(' ')
            .map(|token| self.correct(token).unwrap_or_else(|| token.to_string()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Vocabulary the hospital assistant expects users to type.
pub const DEFAULT_VOCABULARY: &[&str] = &[
    "rwanda",
    "bulbula",
    "branch",
    "location",
    "address",
    "doctor",
    "specialty",
    "emergency",
    "contact",
    "services",
    "departments",
    "availability",
    "day",
    "doctors",
    "specialist",
    "appointment",
    "outpatient",
];

/// Dictionary corrector using optimal-string-alignment distance.
#[derive(Debug, Clone)]
pub struct DictionarySpellchecker {
    words: Vec<String>,
    max_distance: usize,
}

impl Default for DictionarySpellchecker {
    fn default() -> Self {
        Self::new(DEFAULT_VOCABULARY.iter().copied(), 1)
    }
}

impl DictionarySpellchecker {
    pub fn new<'a>(words: impl IntoIterator<Item = &'a str>, max_distance: usize) -> Self {
        Self {
            words: words.into_iter().map(str::to_lowercase).collect(),
            max_distance,
        }
    }

    pub fn with_max_distance(mut self, max_distance: usize) -> Self {
        self.max_distance = max_distance;
        self
    }
}

impl Spellchecker for DictionarySpellchecker {
    fn correct(&self, token: &str) -> Option<String> {
        if token.is_empty() {
            return None;
        }
        let lower = token.to_lowercase();
        if self.words.contains(&lower) {
            return Some(lower);
        }

        let mut best: Option<(usize, &String)> = None;
        for word in &self.words {
            let distance = strsim::osa_distance(&lower, word);
            if distance > self.max_distance {
                continue;
            }
            if best.map_or(true, |(d, _)| distance < d) {
                best = Some((distance, word));
            }
        }
        best.map(|(_, word)| word.clone())
    }
}
