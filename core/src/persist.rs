//! Write-only text dumps of a built index. Nothing here is read back; every
//! run rebuilds the index from the documents.

use crate::index::{BuildReport, InvertedIndex, TermKind};
use crate::scoring::Scorer;
use crate::DocId;
use anyhow::Result;
use serde::Serialize;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
pub struct MetaFile {
    pub num_docs: usize,
    pub created_at: String,
    pub version: u32,
    pub report: BuildReport,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn inverted_index(&self) -> PathBuf { self.root.join("inverted_index.txt") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    pub fn tokens_dir(&self) -> PathBuf { self.root.join("tokens") }
    pub fn lemmas_dir(&self) -> PathBuf { self.root.join("lemmas") }
    pub fn token_list(&self, doc_id: DocId) -> PathBuf {
        self.root.join("token_lists").join(format!("page_{doc_id}.txt"))
    }
    pub fn lemma_forms(&self, doc_id: DocId) -> PathBuf {
        self.root.join("lemma_forms").join(format!("page_{doc_id}.txt"))
    }
    pub fn report(&self, kind: TermKind, doc_id: DocId) -> PathBuf {
        let dir = match kind {
            TermKind::Surface => self.tokens_dir(),
            TermKind::Lemma => self.lemmas_dir(),
        };
        dir.join(format!("page_{doc_id}.txt"))
    }
}

/// `term id id ...` per line, terms and ids ascending.
pub fn write_inverted_index<W: Write>(index: &InvertedIndex, kind: TermKind, out: &mut W) -> Result<()> {
    for term in index.terms(kind) {
        write!(out, "{term}")?;
        for doc_id in index.postings_or_empty(term, kind) {
            write!(out, " {doc_id}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// `term idf tfidf` per line for one document, six decimals.
pub fn write_doc_report<W: Write>(index: &InvertedIndex, doc_id: DocId, kind: TermKind, out: &mut W) -> Result<()> {
    for (term, score) in Scorer::new(index).document_report(doc_id, kind) {
        writeln!(out, "{term} {:.6} {:.6}", score.idf, score.tfidf)?;
    }
    Ok(())
}

/// Distinct accepted surface tokens of one document, one per line, sorted.
pub fn write_token_list<W: Write>(index: &InvertedIndex, doc_id: DocId, out: &mut W) -> Result<()> {
    if let Some(stats) = index.doc_stats(doc_id) {
        for term in stats.terms(TermKind::Surface) {
            writeln!(out, "{term}")?;
        }
    }
    Ok(())
}

/// `lemma form form ...` per line for one document.
pub fn write_lemma_forms<W: Write>(index: &InvertedIndex, doc_id: DocId, out: &mut W) -> Result<()> {
    if let Some(stats) = index.doc_stats(doc_id) {
        for (lemma, forms) in &stats.lemma_forms {
            write!(out, "{lemma}")?;
            for form in forms {
                write!(out, " {form}")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

pub fn save_inverted_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = BufWriter::new(File::create(paths.inverted_index())?);
    write_inverted_index(index, TermKind::Lemma, &mut f)?;
    f.flush()?;
    Ok(())
}

pub fn save_doc_reports(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    create_dir_all(paths.tokens_dir())?;
    create_dir_all(paths.lemmas_dir())?;
    for &doc_id in index.universe() {
        for kind in [TermKind::Surface, TermKind::Lemma] {
            let mut f = BufWriter::new(File::create(paths.report(kind, doc_id))?);
            write_doc_report(index, doc_id, kind, &mut f)?;
            f.flush()?;
        }
    }
    Ok(())
}

pub fn save_token_lists(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    for &doc_id in index.universe() {
        let path = paths.token_list(doc_id);
        if let Some(dir) = path.parent() {
            create_dir_all(dir)?;
        }
        let mut f = BufWriter::new(File::create(&path)?);
        write_token_list(index, doc_id, &mut f)?;
        f.flush()?;

        let path = paths.lemma_forms(doc_id);
        if let Some(dir) = path.parent() {
            create_dir_all(dir)?;
        }
        let mut f = BufWriter::new(File::create(&path)?);
        write_lemma_forms(index, doc_id, &mut f)?;
        f.flush()?;
    }
    Ok(())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

/// Write every dump for `index` under `paths.root`.
pub fn export_all(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    save_inverted_index(paths, index)?;
    save_doc_reports(paths, index)?;
    save_token_lists(paths, index)?;
    let meta = MetaFile {
        num_docs: index.num_docs(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: FORMAT_VERSION,
        report: index.report().clone(),
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, "export complete");
    Ok(())
}
