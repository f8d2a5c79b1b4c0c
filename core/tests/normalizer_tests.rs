use lemmadex_core::error::OracleError;
use lemmadex_core::oracle::{Analysis, DictionaryOracle, LinguisticOracle, WordClass};
use lemmadex_core::{NormalizerConfig, Normalizer, Stopwords, TermKind};
use std::sync::Arc;

struct Flaky;

impl LinguisticOracle for Flaky {
    fn analyze(&self, token: &str) -> Result<Vec<Analysis>, OracleError> {
        if token == "сбой" {
            return Err(OracleError::Unavailable("timeout".into()));
        }
        Ok(vec![Analysis::new(token, 1.0, WordClass::Noun)])
    }
}

fn dictionary() -> DictionaryOracle {
    let mut d = DictionaryOracle::new();
    d.insert("коты", Analysis::new("кот", 0.8, WordClass::Noun));
    d.insert("стали", Analysis::new("стать", 0.49, WordClass::Verb));
    d.insert("под", Analysis::new("под", 0.9, WordClass::Preposition));
    d
}

#[test]
fn it_filters_and_lowercases() {
    let n = Normalizer::new(["и", "на"].into_iter().collect(), Arc::new(Flaky)).unwrap();
    let doc = n.normalize("Кот И собака, 2024 года; x ю Dog кот2 ЁЖ");
    let words: Vec<&str> = doc.tokens.iter().map(|t| t.surface.as_str()).collect();
    assert_eq!(words, vec!["кот", "собака", "года", "ёж"]);
    assert_eq!(doc.stats.accepted, 4);
}

#[test]
fn low_confidence_keeps_surface_only() {
    let n = Normalizer::new(Stopwords::empty(), Arc::new(dictionary())).unwrap();
    let doc = n.normalize("Коты стали");
    assert_eq!(doc.tokens[0].lemma.as_deref(), Some("кот"));
    assert_eq!(doc.tokens[1].surface, "стали");
    assert_eq!(doc.tokens[1].lemma, None);
    assert_eq!(doc.tokens[1].confidence, 0.49);
    assert_eq!(doc.stats.low_confidence, 1);
    let forms = doc.lemma_forms();
    assert_eq!(forms.len(), 1);
    assert!(forms["кот"].contains("коты"));
}

#[test]
fn oracle_failure_is_isolated_to_the_token() {
    let n = Normalizer::new(Stopwords::empty(), Arc::new(Flaky)).unwrap();
    let doc = n.normalize("сбой сбой кот");
    assert_eq!(doc.tokens.len(), 3);
    assert_eq!(doc.tokens[0].lemma, None);
    assert_eq!(doc.tokens[2].lemma.as_deref(), Some("кот"));
    assert_eq!(doc.stats.oracle_failures, 2);
}

#[test]
fn excluded_classes_drop_the_token() {
    let config = NormalizerConfig { excluded_classes: vec![WordClass::Preposition], ..Default::default() };
    let n = Normalizer::with_config(config, Stopwords::empty(), Arc::new(dictionary())).unwrap();
    let doc = n.normalize("коты под столом");
    let words: Vec<&str> = doc.tokens.iter().map(|t| t.surface.as_str()).collect();
    assert_eq!(words, vec!["коты", "столом"]);
    assert_eq!(doc.stats.excluded_class, 1);
}

#[test]
fn query_terms_follow_the_oracle() {
    let n = Normalizer::new(Stopwords::empty(), Arc::new(dictionary())).unwrap();
    assert_eq!(n.query_term("КОТЫ", TermKind::Lemma), "кот");
    assert_eq!(n.query_term("КОТЫ", TermKind::Surface), "коты");
    // the query path ignores the threshold
    assert_eq!(n.query_term("стали", TermKind::Lemma), "стать");
    assert_eq!(n.query_term("неведомо", TermKind::Lemma), "неведомо");
}
