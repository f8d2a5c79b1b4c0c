use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ConfigError;
use crate::normalizer::Normalizer;
use crate::oracle::{DictionaryOracle, LinguisticOracle, StemmerOracle, WordClass};
use crate::stopwords::Stopwords;

/// Token acceptance rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Minimum token length in characters.
    pub min_token_len: usize,
    /// Lowest oracle score that still yields a lemma.
    pub confidence_threshold: f32,
    /// A lowercased token must match this pattern in full to be indexed.
    pub term_pattern: String,
    /// Tokens whose top analysis has one of these classes are dropped entirely.
    pub excluded_classes: Vec<WordClass>,
    /// Apply NFKC before tokenizing.
    pub nfkc: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            min_token_len: 2,
            confidence_threshold: 0.5,
            term_pattern: "^[а-яё]{2,}$".to_string(),
            excluded_classes: Vec::new(),
            nfkc: true,
        }
    }
}

impl NormalizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Threshold(self.confidence_threshold));
        }
        self.term_regex()?;
        Ok(())
    }

    /// `term_pattern` anchored at both ends.
    pub fn term_regex(&self) -> Result<regex::Regex, ConfigError> {
        Ok(regex::Regex::new(&format!("^(?:{})$", self.term_pattern))?)
    }
}

/// Everything needed to stand up a normalizer and an index build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub normalizer: NormalizerConfig,
    /// Snowball language used when no dictionary is given, or for its fallback.
    pub stemmer_language: String,
    /// Stopword file, one word per line. The built-in Russian list otherwise.
    pub stopwords_path: Option<PathBuf>,
    /// Analyzer dump in `token<TAB>lemma<TAB>score<TAB>TAG` form.
    pub dictionary_path: Option<PathBuf>,
    /// Indexing worker count; defaults to available parallelism.
    pub threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            stemmer_language: "russian".to_string(),
            stopwords_path: None,
            dictionary_path: None,
            threads: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        config.normalizer.validate()?;
        Ok(config)
    }

    pub fn stopwords(&self) -> Result<Stopwords, ConfigError> {
        match &self.stopwords_path {
            Some(path) => Ok(Stopwords::from_file(path)?),
            None => Ok(Stopwords::russian()),
        }
    }

    /// Dictionary oracle backed by the stemmer when a dictionary is configured,
    /// the bare stemmer otherwise.
    pub fn oracle(&self) -> Result<Arc<dyn LinguisticOracle>, ConfigError> {
        let stemmer = StemmerOracle::new(&self.stemmer_language)?;
        match &self.dictionary_path {
            Some(path) => {
                let dict = DictionaryOracle::from_tsv(path)?.with_fallback(Box::new(stemmer));
                Ok(Arc::new(dict))
            }
            None => Ok(Arc::new(stemmer)),
        }
    }

    pub fn normalizer(&self) -> Result<Normalizer, ConfigError> {
        Normalizer::with_config(self.normalizer.clone(), self.stopwords()?, self.oracle()?)
    }
}
