use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::index::{InvertedIndex, TermKind};
use crate::DocId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TermScore {
    pub tf: f64,
    pub idf: f64,
    pub tfidf: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDoc {
    pub doc_id: DocId,
    pub score: f64,
}

/// Read-only TF-IDF over a built index.
pub struct Scorer<'a> {
    index: &'a InvertedIndex,
}

impl<'a> Scorer<'a> {
    pub fn new(index: &'a InvertedIndex) -> Self {
        Self { index }
    }

    /// count(term, doc) / accepted terms in doc; 0 for a document without terms.
    pub fn tf(&self, term: &str, doc_id: DocId, kind: TermKind) -> f64 {
        match self.index.doc_stats(doc_id) {
            Some(stats) if stats.total_terms > 0 => stats.count(term, kind) as f64 / stats.total_terms as f64,
            _ => 0.0,
        }
    }

    /// ln(N / (1 + df)), defined as 0 when no document holds the term.
    ///
    /// Goes negative for a term found in every document; that is kept as is.
    pub fn idf(&self, term: &str, kind: TermKind) -> f64 {
        let df = self.index.doc_freq(term, kind);
        if df == 0 {
            return 0.0;
        }
        (self.index.num_docs() as f64 / (1 + df) as f64).ln()
    }

    pub fn score(&self, term: &str, doc_id: DocId, kind: TermKind) -> TermScore {
        let tf = self.tf(term, doc_id, kind);
        let idf = self.idf(term, kind);
        TermScore { tf, idf, tfidf: tf * idf }
    }

    /// Scores for every term of one document, sorted by term.
    pub fn document_report(&self, doc_id: DocId, kind: TermKind) -> Vec<(String, TermScore)> {
        let Some(stats) = self.index.doc_stats(doc_id) else {
            return Vec::new();
        };
        stats
            .terms(kind)
            .into_iter()
            .map(|term| (term.to_string(), self.score(term, doc_id, kind)))
            .collect()
    }

    /// Order `docs` by the summed tf-idf of `terms`, best first, ties by id.
    pub fn rank(&self, docs: &BTreeSet<DocId>, terms: &[String], kind: TermKind) -> Vec<RankedDoc> {
        let mut ranked: Vec<RankedDoc> = docs
            .iter()
            .map(|&doc_id| RankedDoc {
                doc_id,
                score: terms.iter().map(|t| self.score(t, doc_id, kind).tfidf).sum(),
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.doc_id.cmp(&b.doc_id))
        });
        ranked
    }
}

pub fn score(term: &str, doc_id: DocId, index: &InvertedIndex, kind: TermKind) -> TermScore {
    Scorer::new(index).score(term, doc_id, kind)
}
