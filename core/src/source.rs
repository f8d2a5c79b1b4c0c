//! Document source: raw text keyed by document id, plus the optional locator
//! table used to render results.
//!
//! Documents come from a directory of `.txt`/`.html` files (the id is the
//! digits of the file name) or from JSON/JSONL records. HTML is reduced to
//! plain text before it reaches the normalizer.

use anyhow::{bail, Context, Result};
use scraper::Html;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use walkdir::WalkDir;

use crate::DocId;

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: DocId,
    body: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    pub texts: BTreeMap<DocId, String>,
    pub locators: HashMap<DocId, String>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document; ids must be unique within one set.
    pub fn insert(&mut self, doc_id: DocId, text: String) -> Result<()> {
        if self.texts.contains_key(&doc_id) {
            bail!("duplicate document id {doc_id}");
        }
        self.texts.insert(doc_id, text);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn text(&self, doc_id: DocId) -> Option<&str> {
        self.texts.get(&doc_id).map(String::as_str)
    }

    pub fn locator(&self, doc_id: DocId) -> Option<&str> {
        self.locators.get(&doc_id).map(String::as_str)
    }

    /// Load a directory, a single JSON/JSONL file, or a single text/HTML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut set = Self::new();
        if path.is_dir() {
            set.add_dir(path)?;
        } else if path.is_file() {
            set.add_file(path)?;
        } else {
            bail!("document source {} does not exist", path.display());
        }
        tracing::info!(source = %path.display(), num_docs = set.len(), "loaded documents");
        Ok(set)
    }

    fn add_dir(&mut self, dir: &Path) -> Result<()> {
        let mut files: Vec<_> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();
        files.sort();
        for file in files {
            self.add_file(&file)?;
        }
        Ok(())
    }

    fn add_file(&mut self, file: &Path) -> Result<()> {
        let ext = file.extension().and_then(|s| s.to_str()).map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("jsonl") => self.add_jsonl(file),
            Some("json") => self.add_json(file),
            Some("txt") | Some("html") | Some("htm") => {
                let name = file.file_stem().and_then(|s| s.to_str()).unwrap_or("");
                let Some(doc_id) = doc_id_from_name(name) else {
                    tracing::warn!(file = %file.display(), "no digits in file name, skipping");
                    return Ok(());
                };
                let raw = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
                let text = if ext.as_deref() == Some("txt") { raw } else { html_to_text(&raw) };
                self.insert(doc_id, text).with_context(|| format!("loading {}", file.display()))
            }
            _ => {
                tracing::debug!(file = %file.display(), "unsupported extension, skipping");
                Ok(())
            }
        }
    }

    fn add_jsonl(&mut self, file: &Path) -> Result<()> {
        let reader = BufReader::new(File::open(file)?);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let doc: InputDoc = serde_json::from_str(&line).with_context(|| format!("parsing {}", file.display()))?;
            self.add_input(doc)?;
        }
        Ok(())
    }

    fn add_json(&mut self, file: &Path) -> Result<()> {
        let reader = BufReader::new(File::open(file)?);
        let json: serde_json::Value = serde_json::from_reader(reader)?;
        match json {
            serde_json::Value::Array(arr) => {
                for v in arr {
                    self.add_input(serde_json::from_value(v)?)?;
                }
            }
            serde_json::Value::Object(_) => self.add_input(serde_json::from_value(json)?)?,
            _ => bail!("{}: expected a document object or an array of them", file.display()),
        }
        Ok(())
    }

    fn add_input(&mut self, doc: InputDoc) -> Result<()> {
        if let Some(url) = doc.url {
            self.locators.insert(doc.id, url);
        }
        self.insert(doc.id, doc.body)
    }

    /// Read `<id> <locator>` lines; returns how many were loaded. Entries from
    /// the table override locators that came with JSON documents.
    pub fn load_locators<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let text = fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading locators {}", path.as_ref().display()))?;
        let mut loaded = 0;
        for (i, line) in text.lines().enumerate() {
            let mut parts = line.split_whitespace();
            let (Some(id), Some(locator), None) = (parts.next(), parts.next(), parts.next()) else {
                if !line.trim().is_empty() {
                    tracing::warn!(line = i + 1, "malformed locator line, skipping");
                }
                continue;
            };
            let doc_id: DocId = id.parse().with_context(|| format!("locator line {}: bad id {id:?}", i + 1))?;
            self.locators.insert(doc_id, locator.to_string());
            loaded += 1;
        }
        Ok(loaded)
    }
}

/// All decimal digits of a file name, read as one number: `page_12` → 12.
pub fn doc_id_from_name(name: &str) -> Option<DocId> {
    let digits: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Visible text of an HTML page: text nodes trimmed and joined by single
/// spaces, skipping `script` and `style`.
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut parts: Vec<&str> = Vec::new();
    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else { continue };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| matches!(e.name(), "script" | "style" | "noscript")))
            .unwrap_or(false);
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }
    parts.join(" ")
}
