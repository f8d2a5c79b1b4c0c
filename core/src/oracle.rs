//! Linguistic oracle: the black-box service that maps a lowercased token to
//! ranked candidate analyses.
//!
//! The normalizer only ever looks at the top-ranked candidate, and only at its
//! normal form, score and word class. Two adapters ship with the crate: a
//! Snowball stemmer and a lookup table loaded from an analyzer dump.

use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ConfigError, OracleError};

/// Coarse grammatical class of an analysis, parsed from morphological tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WordClass {
    Noun,
    Adjective,
    Verb,
    Participle,
    Gerund,
    Numeral,
    Adverb,
    Pronoun,
    Preposition,
    Conjunction,
    Particle,
    Interjection,
    Number,
    Roman,
    Latin,
    Punctuation,
    Unknown,
}

impl WordClass {
    pub fn tag(&self) -> &'static str {
        match self {
            WordClass::Noun => "NOUN",
            WordClass::Adjective => "ADJF",
            WordClass::Verb => "VERB",
            WordClass::Participle => "PRTF",
            WordClass::Gerund => "GRND",
            WordClass::Numeral => "NUMR",
            WordClass::Adverb => "ADVB",
            WordClass::Pronoun => "NPRO",
            WordClass::Preposition => "PREP",
            WordClass::Conjunction => "CONJ",
            WordClass::Particle => "PRCL",
            WordClass::Interjection => "INTJ",
            WordClass::Number => "NUMB",
            WordClass::Roman => "ROMN",
            WordClass::Latin => "LATN",
            WordClass::Punctuation => "PNCT",
            WordClass::Unknown => "UNKN",
        }
    }
}

impl fmt::Display for WordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for WordClass {
    type Err = String;

    /// Accepts a bare tag or a full tag string such as `NUMB,intg`; only the
    /// leading part-of-speech is used.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let head = s.split([',', ' ']).next().unwrap_or("").trim().to_ascii_uppercase();
        let class = match head.as_str() {
            "NOUN" => WordClass::Noun,
            "ADJF" | "ADJS" | "COMP" => WordClass::Adjective,
            "VERB" | "INFN" => WordClass::Verb,
            "PRTF" | "PRTS" => WordClass::Participle,
            "GRND" => WordClass::Gerund,
            "NUMR" => WordClass::Numeral,
            "ADVB" | "PRED" => WordClass::Adverb,
            "NPRO" => WordClass::Pronoun,
            "PREP" => WordClass::Preposition,
            "CONJ" => WordClass::Conjunction,
            "PRCL" => WordClass::Particle,
            "INTJ" => WordClass::Interjection,
            "NUMB" => WordClass::Number,
            "ROMN" => WordClass::Roman,
            "LATN" => WordClass::Latin,
            "PNCT" => WordClass::Punctuation,
            "UNKN" => WordClass::Unknown,
            other => return Err(format!("unknown word class tag {other:?}")),
        };
        Ok(class)
    }
}

impl TryFrom<String> for WordClass {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<WordClass> for String {
    fn from(c: WordClass) -> Self {
        c.tag().to_string()
    }
}

/// One candidate analysis of a token.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub normal_form: String,
    /// Confidence in [0, 1].
    pub score: f32,
    pub class: WordClass,
}

impl Analysis {
    pub fn new(normal_form: impl Into<String>, score: f32, class: WordClass) -> Self {
        Self { normal_form: normal_form.into(), score, class }
    }
}

/// Capability interface over a stemmer or lemmatizer.
///
/// Calls are synchronous and may be CPU-heavy; implementations must be safe
/// to share across indexing threads.
pub trait LinguisticOracle: Send + Sync {
    /// Candidates for `token`, best first. An empty list means the oracle has
    /// nothing to say about the token.
    fn analyze(&self, token: &str) -> Result<Vec<Analysis>, OracleError>;

    fn top(&self, token: &str) -> Result<Option<Analysis>, OracleError> {
        Ok(self.analyze(token)?.into_iter().next())
    }
}

/// Snowball stemmer adapter: exactly one candidate with full confidence.
pub struct StemmerOracle {
    stemmer: Stemmer,
    language: &'static str,
}

impl StemmerOracle {
    pub fn new(language: &str) -> Result<Self, ConfigError> {
        let (algorithm, name) = match language.to_ascii_lowercase().as_str() {
            "russian" | "ru" => (Algorithm::Russian, "russian"),
            "english" | "en" => (Algorithm::English, "english"),
            "german" | "de" => (Algorithm::German, "german"),
            "french" | "fr" => (Algorithm::French, "french"),
            "spanish" | "es" => (Algorithm::Spanish, "spanish"),
            "italian" | "it" => (Algorithm::Italian, "italian"),
            "portuguese" | "pt" => (Algorithm::Portuguese, "portuguese"),
            "dutch" | "nl" => (Algorithm::Dutch, "dutch"),
            "swedish" | "sv" => (Algorithm::Swedish, "swedish"),
            _ => return Err(ConfigError::Language(language.to_string())),
        };
        Ok(Self { stemmer: Stemmer::create(algorithm), language: name })
    }

    pub fn russian() -> Self {
        Self { stemmer: Stemmer::create(Algorithm::Russian), language: "russian" }
    }

    pub fn language(&self) -> &str {
        self.language
    }
}

impl LinguisticOracle for StemmerOracle {
    fn analyze(&self, token: &str) -> Result<Vec<Analysis>, OracleError> {
        let stem = self.stemmer.stem(token);
        if stem.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Analysis::new(stem.into_owned(), 1.0, WordClass::Unknown)])
    }
}

/// Lookup-table oracle, typically loaded from a morphological analyzer dump.
///
/// Tokens missing from the table go to the fallback oracle when one is set,
/// otherwise they get no candidates.
#[derive(Default)]
pub struct DictionaryOracle {
    entries: HashMap<String, Vec<Analysis>>,
    fallback: Option<Box<dyn LinguisticOracle>>,
}

impl DictionaryOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(mut self, fallback: Box<dyn LinguisticOracle>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Add a candidate for `token`, keeping candidates ordered by descending score.
    pub fn insert(&mut self, token: impl Into<String>, analysis: Analysis) {
        let candidates = self.entries.entry(token.into()).or_default();
        let at = candidates.partition_point(|a| a.score >= analysis.score);
        candidates.insert(at, analysis);
    }

    /// Parse `token<TAB>normal_form<TAB>score<TAB>TAG` lines. Blank lines and
    /// lines starting with `#` are ignored.
    pub fn from_tsv_str(text: &str) -> Result<Self, ConfigError> {
        let mut oracle = Self::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let bad = |reason: String| ConfigError::Dictionary { line: i + 1, reason };
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 4 {
                return Err(bad(format!("expected 4 tab-separated fields, got {}", fields.len())));
            }
            let score: f32 = fields[2].trim().parse().map_err(|_| bad(format!("bad score {:?}", fields[2])))?;
            if !(0.0..=1.0).contains(&score) {
                return Err(bad(format!("score {score} outside [0, 1]")));
            }
            let class: WordClass = fields[3].parse().map_err(bad)?;
            oracle.insert(fields[0].trim().to_lowercase(), Analysis::new(fields[1].trim(), score, class));
        }
        Ok(oracle)
    }

    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_tsv_str(&text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LinguisticOracle for DictionaryOracle {
    fn analyze(&self, token: &str) -> Result<Vec<Analysis>, OracleError> {
        match self.entries.get(token) {
            Some(candidates) => Ok(candidates.clone()),
            None => match &self.fallback {
                Some(fallback) => fallback.analyze(token),
                None => Ok(Vec::new()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stemmer_is_deterministic() {
        let o = StemmerOracle::russian();
        let a = o.top("собака").unwrap().unwrap();
        let b = o.top("собака").unwrap().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.score, 1.0);
    }

    #[test]
    fn unknown_language_is_rejected() {
        assert!(matches!(StemmerOracle::new("klingon"), Err(ConfigError::Language(_))));
    }

    #[test]
    fn dictionary_orders_by_score_and_falls_back() {
        let tsv = "# token\tlemma\tscore\ttag\nстали\tстать\t0.6\tVERB\nстали\tсталь\t0.4\tNOUN\n";
        let o = DictionaryOracle::from_tsv_str(tsv)
            .unwrap()
            .with_fallback(Box::new(StemmerOracle::russian()));
        let top = o.top("стали").unwrap().unwrap();
        assert_eq!(top.normal_form, "стать");
        assert_eq!(top.class, WordClass::Verb);
        assert_eq!(o.analyze("стали").unwrap().len(), 2);
        assert!(o.top("кошка").unwrap().is_some());
    }

    #[test]
    fn dictionary_reports_bad_lines() {
        let Err(err) = DictionaryOracle::from_tsv_str("кот\tкот\tмного\tNOUN\n") else {
            panic!("score column should be rejected");
        };
        assert!(matches!(err, ConfigError::Dictionary { line: 1, .. }));
    }

    #[test]
    fn parses_full_tags() {
        assert_eq!("NUMB,intg".parse::<WordClass>().unwrap(), WordClass::Number);
        assert_eq!("INFN,perf tran".parse::<WordClass>().unwrap(), WordClass::Verb);
        assert!("XYZ".parse::<WordClass>().is_err());
    }
}
