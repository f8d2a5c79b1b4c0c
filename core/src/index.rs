use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use crate::normalizer::{NormalizationStats, NormalizedDocument, Normalizer};
use crate::DocId;

static EMPTY: BTreeSet<DocId> = BTreeSet::new();

/// Which of the two side-by-side namespaces a term belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermKind {
    /// Lowercased tokens as they appeared in the text.
    Surface,
    /// Oracle normal forms.
    #[default]
    Lemma,
}

/// Term counts for one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocStats {
    /// Accepted surface tokens, repeats included.
    pub total_terms: u32,
    pub surface_counts: HashMap<String, u32>,
    /// lemma → surface tokens mapped to it
    pub lemma_forms: BTreeMap<String, BTreeSet<String>>,
    pub lemma_counts: HashMap<String, u32>,
}

impl DocStats {
    fn from_normalized(doc: &NormalizedDocument) -> Self {
        let surface_counts = doc.surface_counts();
        let lemma_forms = doc.lemma_forms();
        // A lemma counts every surface form mapped to it, plus its own
        // occurrences as a surface token.
        let lemma_counts = lemma_forms
            .iter()
            .map(|(lemma, forms)| {
                let mapped: u32 = forms.iter().filter_map(|f| surface_counts.get(f)).sum();
                let literal = surface_counts.get(lemma).copied().unwrap_or(0);
                (lemma.clone(), mapped + literal)
            })
            .collect();
        Self { total_terms: doc.total_terms(), surface_counts, lemma_forms, lemma_counts }
    }

    pub fn count(&self, term: &str, kind: TermKind) -> u32 {
        let counts = match kind {
            TermKind::Surface => &self.surface_counts,
            TermKind::Lemma => &self.lemma_counts,
        };
        counts.get(term).copied().unwrap_or(0)
    }

    /// Distinct terms of the given kind, sorted.
    pub fn terms(&self, kind: TermKind) -> Vec<&str> {
        let mut terms: Vec<&str> = match kind {
            TermKind::Surface => self.surface_counts.keys().map(String::as_str).collect(),
            TermKind::Lemma => self.lemma_counts.keys().map(String::as_str).collect(),
        };
        terms.sort_unstable();
        terms
    }
}

/// Summary of one index build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub documents: usize,
    pub empty_documents: usize,
    pub surface_terms: usize,
    pub lemma_terms: usize,
    pub tokens: NormalizationStats,
}

/// Surface and lemma postings plus per-document counts.
///
/// Only [`IndexBuilder`] constructs a populated index, and nothing mutates it
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvertedIndex {
    surface: HashMap<String, BTreeSet<DocId>>,
    lemma: HashMap<String, BTreeSet<DocId>>,
    universe: BTreeSet<DocId>,
    docs: BTreeMap<DocId, DocStats>,
    report: BuildReport,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn namespace(&self, kind: TermKind) -> &HashMap<String, BTreeSet<DocId>> {
        match kind {
            TermKind::Surface => &self.surface,
            TermKind::Lemma => &self.lemma,
        }
    }

    pub fn postings(&self, term: &str, kind: TermKind) -> Option<&BTreeSet<DocId>> {
        self.namespace(kind).get(term)
    }

    /// Postings for `term`, empty when the term is unknown.
    pub fn postings_or_empty(&self, term: &str, kind: TermKind) -> &BTreeSet<DocId> {
        self.postings(term, kind).unwrap_or(&EMPTY)
    }

    pub fn doc_freq(&self, term: &str, kind: TermKind) -> usize {
        self.postings(term, kind).map_or(0, BTreeSet::len)
    }

    /// Every document id handed to the build, including ones without terms.
    pub fn universe(&self) -> &BTreeSet<DocId> {
        &self.universe
    }

    pub fn num_docs(&self) -> usize {
        self.universe.len()
    }

    pub fn doc_stats(&self, doc_id: DocId) -> Option<&DocStats> {
        self.docs.get(&doc_id)
    }

    pub fn num_terms(&self, kind: TermKind) -> usize {
        self.namespace(kind).len()
    }

    /// All terms of a namespace, sorted.
    pub fn terms(&self, kind: TermKind) -> Vec<&str> {
        let mut terms: Vec<&str> = self.namespace(kind).keys().map(String::as_str).collect();
        terms.sort_unstable();
        terms
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    fn merge(&mut self, doc_id: DocId, doc: &NormalizedDocument) {
        let stats = DocStats::from_normalized(doc);
        for term in stats.surface_counts.keys() {
            self.surface.entry(term.clone()).or_default().insert(doc_id);
        }
        for lemma in stats.lemma_forms.keys() {
            self.lemma.entry(lemma.clone()).or_default().insert(doc_id);
        }
        if stats.total_terms == 0 {
            self.report.empty_documents += 1;
        }
        self.report.tokens += doc.stats;
        self.docs.insert(doc_id, stats);
    }
}

/// Builds an [`InvertedIndex`] by normalizing documents in parallel and
/// merging the per-document shards once all of them are done.
pub struct IndexBuilder<'a> {
    normalizer: &'a Normalizer,
    threads: Option<usize>,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(normalizer: &'a Normalizer) -> Self {
        Self { normalizer, threads: None }
    }

    /// Worker count; `None` uses the global pool sized to available parallelism.
    pub fn threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads.filter(|&n| n > 0);
        self
    }

    pub fn build(&self, documents: &BTreeMap<DocId, String>) -> InvertedIndex {
        let start = Instant::now();
        let mut shards = match self.threads {
            Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => pool.install(|| self.normalize_all(documents)),
                Err(e) => {
                    tracing::warn!(threads = n, error = %e, "could not start indexing pool, using global pool");
                    self.normalize_all(documents)
                }
            },
            None => self.normalize_all(documents),
        };
        shards.sort_unstable_by_key(|(doc_id, _)| *doc_id);

        let mut index = InvertedIndex { universe: documents.keys().copied().collect(), ..Default::default() };
        for (doc_id, doc) in &shards {
            index.merge(*doc_id, doc);
        }
        index.report.documents = index.universe.len();
        index.report.surface_terms = index.surface.len();
        index.report.lemma_terms = index.lemma.len();

        let r = &index.report;
        tracing::info!(
            num_docs = r.documents,
            surface_terms = r.surface_terms,
            lemma_terms = r.lemma_terms,
            oracle_failures = r.tokens.oracle_failures,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "index built"
        );
        index
    }

    fn normalize_all(&self, documents: &BTreeMap<DocId, String>) -> Vec<(DocId, NormalizedDocument)> {
        documents
            .par_iter()
            .map(|(&doc_id, text)| {
                let doc = self.normalizer.normalize(text);
                tracing::debug!(doc_id, terms = doc.tokens.len(), "normalized document");
                (doc_id, doc)
            })
            .collect()
    }
}

/// Build with the default worker pool.
pub fn build_index(documents: &BTreeMap<DocId, String>, normalizer: &Normalizer) -> InvertedIndex {
    IndexBuilder::new(normalizer).build(documents)
}

/// Published reference to an immutable value, swapped wholesale on rebuild.
///
/// Readers take a snapshot and keep using it even if a newer value is
/// published meanwhile.
pub struct IndexHandle<T = InvertedIndex> {
    current: RwLock<Arc<T>>,
}

impl<T> IndexHandle<T> {
    pub fn new(value: T) -> Self {
        Self { current: RwLock::new(Arc::new(value)) }
    }

    pub fn snapshot(&self) -> Arc<T> {
        self.current.read().clone()
    }

    /// Replace the published value, returning the previous one.
    pub fn publish(&self, value: T) -> Arc<T> {
        std::mem::replace(&mut *self.current.write(), Arc::new(value))
    }
}
