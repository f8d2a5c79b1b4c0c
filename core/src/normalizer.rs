//! Text normalization: raw document text in, accepted index terms out.
//!
//! Every token is lowercased and filtered (length, stopwords, term pattern).
//! Survivors always count as surface terms. The oracle's top analysis adds a
//! lemma only when its score clears the confidence threshold; an oracle error
//! is treated the same way as a low score so one bad token never sinks a
//! document.

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::AddAssign;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

use crate::config::NormalizerConfig;
use crate::error::ConfigError;
use crate::index::TermKind;
use crate::oracle::{Analysis, LinguisticOracle};
use crate::stopwords::Stopwords;
use crate::tokenizer::{tokenize, tokenize_raw};

/// An accepted token with its lemma, if the oracle was confident enough.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedToken {
    pub surface: String,
    pub lemma: Option<String>,
    /// Score of the top analysis, 0 when the oracle failed or had no answer.
    pub confidence: f32,
}

/// Per-token outcome counters, summed into the index build report.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NormalizationStats {
    pub accepted: u64,
    pub rejected: u64,
    pub oracle_failures: u64,
    pub low_confidence: u64,
    pub excluded_class: u64,
}

impl AddAssign for NormalizationStats {
    fn add_assign(&mut self, rhs: Self) {
        self.accepted += rhs.accepted;
        self.rejected += rhs.rejected;
        self.oracle_failures += rhs.oracle_failures;
        self.low_confidence += rhs.low_confidence;
        self.excluded_class += rhs.excluded_class;
    }
}

#[derive(Debug, Default, Clone)]
pub struct NormalizedDocument {
    /// Accepted tokens in text order, repeats included.
    pub tokens: Vec<NormalizedToken>,
    pub stats: NormalizationStats,
}

impl NormalizedDocument {
    pub fn total_terms(&self) -> u32 {
        self.tokens.len() as u32
    }

    pub fn surface_counts(&self) -> HashMap<String, u32> {
        let mut counts = HashMap::new();
        for t in &self.tokens {
            *counts.entry(t.surface.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn surface_terms(&self) -> BTreeSet<&str> {
        self.tokens.iter().map(|t| t.surface.as_str()).collect()
    }

    /// lemma → surface tokens that were mapped to it.
    pub fn lemma_forms(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut forms: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for t in &self.tokens {
            if let Some(lemma) = &t.lemma {
                forms.entry(lemma.clone()).or_default().insert(t.surface.clone());
            }
        }
        forms
    }
}

#[derive(Clone)]
enum Verdict {
    Failed,
    Unanalyzed,
    Analyzed(Analysis),
}

pub struct Normalizer {
    config: NormalizerConfig,
    term_re: Regex,
    stopwords: Stopwords,
    oracle: Arc<dyn LinguisticOracle>,
}

impl Normalizer {
    pub fn new(stopwords: Stopwords, oracle: Arc<dyn LinguisticOracle>) -> Result<Self, ConfigError> {
        Self::with_config(NormalizerConfig::default(), stopwords, oracle)
    }

    pub fn with_config(
        config: NormalizerConfig,
        stopwords: Stopwords,
        oracle: Arc<dyn LinguisticOracle>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let term_re = config.term_regex()?;
        Ok(Self { config, term_re, stopwords, oracle })
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    pub fn stopwords(&self) -> &Stopwords {
        &self.stopwords
    }

    /// Length, stopword and pattern checks on an already lowercased token.
    pub fn is_candidate(&self, lower: &str) -> bool {
        if lower.chars().count() < self.config.min_token_len {
            return false;
        }
        if self.stopwords.contains(lower) {
            return false;
        }
        if lower.chars().all(|c| c.is_numeric()) {
            return false;
        }
        self.term_re.is_match(lower)
    }

    pub fn normalize(&self, text: &str) -> NormalizedDocument {
        let raw = if self.config.nfkc { tokenize(text) } else { tokenize_raw(text) };
        let mut doc = NormalizedDocument::default();
        let mut verdicts: HashMap<String, Verdict> = HashMap::new();

        for (token, _pos) in raw {
            let lower = token.to_lowercase();
            if !self.is_candidate(&lower) {
                doc.stats.rejected += 1;
                continue;
            }
            let verdict = verdicts
                .entry(lower.clone())
                .or_insert_with(|| self.consult(&lower))
                .clone();

            let (lemma, confidence) = match verdict {
                Verdict::Failed => {
                    doc.stats.oracle_failures += 1;
                    (None, 0.0)
                }
                Verdict::Unanalyzed => {
                    doc.stats.low_confidence += 1;
                    (None, 0.0)
                }
                Verdict::Analyzed(a) if self.config.excluded_classes.contains(&a.class) => {
                    doc.stats.excluded_class += 1;
                    doc.stats.rejected += 1;
                    continue;
                }
                Verdict::Analyzed(a) if a.score >= self.config.confidence_threshold => (Some(a.normal_form), a.score),
                Verdict::Analyzed(a) => {
                    doc.stats.low_confidence += 1;
                    (None, a.score)
                }
            };
            doc.stats.accepted += 1;
            doc.tokens.push(NormalizedToken { surface: lower, lemma, confidence });
        }
        doc
    }

    fn consult(&self, lower: &str) -> Verdict {
        match self.oracle.top(lower) {
            Ok(Some(analysis)) => Verdict::Analyzed(analysis),
            Ok(None) => Verdict::Unanalyzed,
            Err(e) => {
                tracing::warn!(token = lower, error = %e, "oracle failed, token kept for surface index only");
                Verdict::Failed
            }
        }
    }

    /// Map a query word onto the term it would be looked up under.
    ///
    /// Lemma lookups take the oracle's top normal form regardless of score and
    /// fall back to the lowercased word when the oracle has no answer.
    pub fn query_term(&self, word: &str, kind: TermKind) -> String {
        let lower = if self.config.nfkc {
            word.nfkc().collect::<String>().to_lowercase()
        } else {
            word.to_lowercase()
        };
        match kind {
            TermKind::Surface => lower,
            TermKind::Lemma => match self.oracle.top(&lower) {
                Ok(Some(a)) => a.normal_form,
                Ok(None) => lower,
                Err(e) => {
                    tracing::warn!(word = lower, error = %e, "oracle failed on query word");
                    lower
                }
            },
        }
    }
}
