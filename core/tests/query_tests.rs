use lemmadex_core::error::OracleError;
use lemmadex_core::oracle::{Analysis, LinguisticOracle, WordClass};
use lemmadex_core::query::evaluate;
use lemmadex_core::{build_index, DocId, Evaluator, InvertedIndex, Normalizer, Query, QueryError, StemmerOracle, Stopwords, TermKind};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Every token is its own lemma.
struct Identity;

impl LinguisticOracle for Identity {
    fn analyze(&self, token: &str) -> Result<Vec<Analysis>, OracleError> {
        Ok(vec![Analysis::new(token, 1.0, WordClass::Noun)])
    }
}

fn corpus(items: &[(DocId, &str)]) -> BTreeMap<DocId, String> {
    items.iter().map(|(id, t)| (*id, t.to_string())).collect()
}

fn set(ids: &[DocId]) -> BTreeSet<DocId> {
    ids.iter().copied().collect()
}

fn fixture() -> (Normalizer, InvertedIndex) {
    let n = Normalizer::new(Stopwords::empty(), Arc::new(Identity)).unwrap();
    let index = build_index(
        &corpus(&[(1, "альфа бета"), (2, "бета гамма"), (3, "гамма"), (4, "дельта альфа"), (5, "")]),
        &n,
    );
    (n, index)
}

#[test]
fn single_terms_and_operators() {
    let (n, index) = fixture();
    let ev = Evaluator::new(&index, &n);
    assert_eq!(ev.evaluate("бета").unwrap(), set(&[1, 2]));
    assert_eq!(ev.evaluate("бета AND гамма").unwrap(), set(&[2]));
    assert_eq!(ev.evaluate("бета or гамма").unwrap(), set(&[1, 2, 3]));
    assert_eq!(ev.evaluate("Альфа And NOT бета").unwrap(), set(&[4]));
}

#[test]
fn negation_is_taken_against_the_universe() {
    let (n, index) = fixture();
    // document 5 has no terms but is still a candidate for negation
    assert_eq!(evaluate("NOT альфа", &index, &n).unwrap(), set(&[2, 3, 5]));
    assert_eq!(evaluate("NOT ()", &index, &n).unwrap(), set(&[1, 2, 3, 4, 5]));
}

#[test]
fn negation_closure() {
    let (n, index) = fixture();
    let ev = Evaluator::new(&index, &n);
    let queries = ["альфа", "бета OR дельта", "(гамма AND бета) OR альфа", "NOT гамма AND альфа", "нет", ""];
    for q in queries {
        let direct = ev.evaluate(q).unwrap();
        let expected: BTreeSet<DocId> = index.universe().difference(&direct).copied().collect();
        assert_eq!(ev.evaluate(&format!("NOT ({q})")).unwrap(), expected, "query {q:?}");
    }
}

#[test]
fn double_negation_cancels() {
    let (n, index) = fixture();
    let ev = Evaluator::new(&index, &n);
    for term in ["альфа", "гамма", "нет"] {
        assert_eq!(ev.evaluate(&format!("NOT NOT {term}")).unwrap(), ev.evaluate(term).unwrap());
    }
    assert_eq!(ev.evaluate("NOT NOT NOT альфа").unwrap(), ev.evaluate("NOT альфа").unwrap());
}

#[test]
fn unknown_terms_are_empty() {
    let (n, index) = fixture();
    let ev = Evaluator::new(&index, &n);
    assert!(ev.evaluate("неизвестно").unwrap().is_empty());
    assert!(ev.evaluate("неизвестно AND бета").unwrap().is_empty());
    assert_eq!(ev.evaluate("неизвестно OR бета").unwrap(), ev.evaluate("бета").unwrap());
}

#[test]
fn and_or_fold_left_to_right() {
    let n = Normalizer::new(Stopwords::empty(), Arc::new(Identity)).unwrap();
    let index = build_index(&corpus(&[(1, "красный"), (2, "синий"), (3, "зелёный")]), &n);
    let ev = Evaluator::new(&index, &n);

    let a = ev.evaluate("красный").unwrap();
    let b = ev.evaluate("синий").unwrap();
    let c = ev.evaluate("зелёный").unwrap();
    let left: BTreeSet<DocId> = a.union(&b).copied().collect::<BTreeSet<_>>().intersection(&c).copied().collect();
    let conventional: BTreeSet<DocId> = a.union(&b.intersection(&c).copied().collect()).copied().collect();

    let got = ev.evaluate("красный OR синий AND зелёный").unwrap();
    assert_eq!(got, left);
    assert!(got.is_empty());
    assert_ne!(got, conventional);
    assert_eq!(ev.evaluate("красный OR (синий AND зелёный)").unwrap(), set(&[1]));
    assert_eq!(ev.evaluate("зелёный AND синий OR красный").unwrap(), set(&[1]));
}

#[test]
fn empty_queries_match_nothing() {
    let (n, index) = fixture();
    let ev = Evaluator::new(&index, &n);
    assert!(ev.evaluate("").unwrap().is_empty());
    assert!(ev.evaluate("   ").unwrap().is_empty());
    assert!(ev.evaluate("()").unwrap().is_empty());
    assert_eq!(ev.evaluate("(((бета)))").unwrap(), set(&[1, 2]));
}

#[test]
fn malformed_queries_are_errors() {
    let (n, index) = fixture();
    let ev = Evaluator::new(&index, &n);
    assert!(matches!(ev.evaluate("AND бета"), Err(QueryError::MissingLeftOperand { .. })));
    assert!(matches!(ev.evaluate("бета OR"), Err(QueryError::MissingRightOperand { .. })));
    assert!(matches!(ev.evaluate("бета AND OR гамма"), Err(QueryError::OperatorInOperandPosition { .. })));
    assert!(matches!(ev.evaluate("NOT AND бета"), Err(QueryError::OperatorInOperandPosition { .. })));
    assert_eq!(ev.evaluate("NOT"), Err(QueryError::DanglingNot));
    assert_eq!(ev.evaluate("бета AND (гамма NOT)"), Err(QueryError::DanglingNot));
    assert_eq!(ev.evaluate("бета гамма"), Err(QueryError::MissingOperator));
    assert!(matches!(ev.evaluate("(бета"), Err(QueryError::UnclosedGroup { open: 1 })));
    assert!(matches!(ev.evaluate("бета)"), Err(QueryError::UnexpectedClose { .. })));
}

#[test]
fn surface_namespace_is_queryable() {
    let mut dict = lemmadex_core::DictionaryOracle::new();
    dict.insert("коты", Analysis::new("кот", 0.9, WordClass::Noun));
    let n = Normalizer::new(Stopwords::empty(), Arc::new(dict)).unwrap();
    let index = build_index(&corpus(&[(1, "коты"), (2, "кот")]), &n);
    let lemma = Evaluator::new(&index, &n);
    let surface = Evaluator::new(&index, &n).kind(TermKind::Surface);
    // "кот" in doc 2 had no analysis, so it only reaches the surface index
    assert_eq!(lemma.evaluate("кот").unwrap(), set(&[1]));
    assert_eq!(surface.evaluate("кот").unwrap(), set(&[2]));
    assert_eq!(surface.evaluate("коты OR кот").unwrap(), set(&[1, 2]));
}

#[test]
fn ranking_terms_skip_negated_words() {
    let (n, index) = fixture();
    let ev = Evaluator::new(&index, &n);
    let q = Query::parse("Бета AND NOT альфа OR бета").unwrap();
    assert_eq!(ev.terms(&q), vec!["бета".to_string()]);

    let q = Query::parse("гамма AND NOT (альфа AND бета)").unwrap();
    assert_eq!(ev.terms(&q), vec!["гамма".to_string()]);
    assert_eq!(ev.evaluate_query(&q).unwrap(), set(&[2, 3]));
}

#[test]
fn news_scenario() {
    let stopwords: Stopwords = ["и", "на"].into_iter().collect();
    let n = Normalizer::new(stopwords, Arc::new(StemmerOracle::russian())).unwrap();
    let index = build_index(
        &corpus(&[(1, "кот сидит на окне"), (2, "кот и собака играют"), (3, "собака бежит")]),
        &n,
    );

    let cat = n.query_term("кот", TermKind::Lemma);
    let dog = n.query_term("собака", TermKind::Lemma);
    assert_eq!(index.postings_or_empty(&cat, TermKind::Lemma), &set(&[1, 2]));
    assert_eq!(index.postings_or_empty(&dog, TermKind::Lemma), &set(&[2, 3]));

    let ev = Evaluator::new(&index, &n);
    assert_eq!(ev.evaluate("кот AND собака").unwrap(), set(&[2]));
    assert_eq!(ev.evaluate("кот OR собака").unwrap(), set(&[1, 2, 3]));
    assert_eq!(ev.evaluate("NOT кот").unwrap(), set(&[3]));
}

#[test]
fn rebuild_is_deterministic_and_postings_match_counts() {
    let (_n, index) = fixture();
    let (_, again) = fixture();
    assert_eq!(index, again);

    for kind in [TermKind::Surface, TermKind::Lemma] {
        for &doc_id in index.universe() {
            let stats = index.doc_stats(doc_id).unwrap();
            for term in index.terms(kind) {
                let posted = index.postings_or_empty(term, kind).contains(&doc_id);
                assert_eq!(posted, stats.count(term, kind) > 0, "{term} in {doc_id}");
            }
        }
    }
}
