use lemmadex_core::error::OracleError;
use lemmadex_core::oracle::{Analysis, LinguisticOracle, WordClass};
use lemmadex_core::persist::{export_all, write_doc_report, write_inverted_index, write_lemma_forms, IndexPaths};
use lemmadex_core::{build_index, DictionaryOracle, DocId, InvertedIndex, Normalizer, Scorer, Stopwords, TermKind};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

struct Identity;

impl LinguisticOracle for Identity {
    fn analyze(&self, token: &str) -> Result<Vec<Analysis>, OracleError> {
        Ok(vec![Analysis::new(token, 1.0, WordClass::Noun)])
    }
}

fn index_of(items: &[(DocId, &str)]) -> InvertedIndex {
    let n = Normalizer::new(Stopwords::empty(), Arc::new(Identity)).unwrap();
    let docs: BTreeMap<DocId, String> = items.iter().map(|(id, t)| (*id, t.to_string())).collect();
    build_index(&docs, &n)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

#[test]
fn tf_idf_for_surface_terms() {
    let index = index_of(&[(1, "кот кот собака"), (2, "кот"), (3, "рыба"), (4, "")]);
    let s = Scorer::new(&index);
    let score = s.score("кот", 1, TermKind::Surface);
    assert!(close(score.tf, 2.0 / 3.0));
    assert!(close(score.idf, (4.0f64 / 3.0).ln()));
    assert!(close(score.tfidf, score.tf * score.idf));
    // the document without terms has tf 0, not NaN
    assert_eq!(s.tf("кот", 4, TermKind::Surface), 0.0);
    assert_eq!(s.tf("кот", 99, TermKind::Surface), 0.0);
}

#[test]
fn idf_boundaries() {
    let index = index_of(&[(1, "кот"), (2, "кот пёс")]);
    let s = Scorer::new(&index);
    let everywhere = s.idf("кот", TermKind::Surface);
    assert!(close(everywhere, (2.0f64 / 3.0).ln()));
    assert!(everywhere < 0.0);
    assert_eq!(s.idf("лиса", TermKind::Surface), 0.0);
    assert_eq!(s.score("лиса", 1, TermKind::Surface).tfidf, 0.0);
}

#[test]
fn empty_corpus_scores_zero() {
    let index = index_of(&[]);
    let s = Scorer::new(&index);
    let score = s.score("кот", 1, TermKind::Lemma);
    assert_eq!((score.tf, score.idf, score.tfidf), (0.0, 0.0, 0.0));
}

#[test]
fn rank_orders_by_tfidf_then_id() {
    let index = index_of(&[(1, "кот собака рыба"), (2, "кот"), (3, "кот"), (4, "лиса"), (5, "лиса")]);
    let s = Scorer::new(&index);
    let docs: BTreeSet<DocId> = [1, 2, 3].into_iter().collect();
    let ranked = s.rank(&docs, &["кот".to_string()], TermKind::Surface);
    let order: Vec<DocId> = ranked.iter().map(|r| r.doc_id).collect();
    assert_eq!(order, vec![2, 3, 1]);
    assert!(ranked[0].score > ranked[2].score);
}

#[test]
fn exports_are_line_oriented() {
    let index = index_of(&[(2, "кот собака"), (1, "кот"), (3, "")]);
    let mut out = Vec::new();
    write_inverted_index(&index, TermKind::Lemma, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "кот 1 2\nсобака 2\n");

    let mut out = Vec::new();
    write_doc_report(&index, 2, TermKind::Surface, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    // кот: df 2 of 3 documents, idf ln(3/3) = 0
    assert_eq!(lines[0], "кот 0.000000 0.000000");
    assert!(lines[1].starts_with("собака 0.405465 "));
}

#[test]
fn exports_token_lists_and_lemma_forms() {
    let mut dict = DictionaryOracle::new();
    dict.insert("коты", Analysis::new("кот", 0.9, WordClass::Noun));
    dict.insert("кота", Analysis::new("кот", 0.8, WordClass::Noun));
    dict.insert("спят", Analysis::new("спать", 0.9, WordClass::Verb));
    let n = Normalizer::new(Stopwords::empty(), Arc::new(dict)).unwrap();
    let docs: BTreeMap<DocId, String> = [(1, "коты спят, кота нет".to_string()), (2, String::new())].into_iter().collect();
    let index = build_index(&docs, &n);

    let mut out = Vec::new();
    write_lemma_forms(&index, 1, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "кот кота коты\nспать спят\n");

    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    export_all(&paths, &index).unwrap();
    let tokens = std::fs::read_to_string(paths.token_list(1)).unwrap();
    assert_eq!(tokens, "кота\nкоты\nнет\nспят\n");
    assert_eq!(std::fs::read_to_string(paths.lemma_forms(2)).unwrap(), "");
    assert!(paths.report(TermKind::Lemma, 2).exists());
    assert!(paths.meta().exists());
}
