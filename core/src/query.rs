//! Boolean queries over the inverted index.
//!
//! A query is a whitespace-separated mix of words, `AND`, `OR`, `NOT`
//! (any case) and parentheses. Evaluation keeps a stack of operand lists: `(`
//! opens a new list, `)` reduces it to one set and appends that set to the
//! enclosing list.
//!
//! AND and OR have equal precedence and combine strictly left to right, so
//! `a OR b AND c` means `(a OR b) AND c`. Callers depend on this; use
//! parentheses for anything else. `NOT` negates the operand right after it
//! against the universe of indexed documents, and a run of `NOT`s cancels
//! pairwise.

use std::collections::BTreeSet;
use std::fmt;
use std::mem;

use crate::error::QueryError;
use crate::index::{InvertedIndex, TermKind};
use crate::normalizer::Normalizer;
use crate::DocId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOp::And => f.write_str("AND"),
            BoolOp::Or => f.write_str("OR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryToken {
    Open,
    Close,
    Op(BoolOp),
    Not,
    Word(String),
}

/// A tokenized query with balanced parentheses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    tokens: Vec<QueryToken>,
}

impl Query {
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        let padded = text.replace('(', " ( ").replace(')', " ) ");
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        for (position, word) in padded.split_whitespace().enumerate() {
            let token = match word.to_lowercase().as_str() {
                "(" => {
                    depth += 1;
                    QueryToken::Open
                }
                ")" => {
                    depth = depth.checked_sub(1).ok_or(QueryError::UnexpectedClose { position })?;
                    QueryToken::Close
                }
                "and" => QueryToken::Op(BoolOp::And),
                "or" => QueryToken::Op(BoolOp::Or),
                "not" => QueryToken::Not,
                _ => QueryToken::Word(word.to_string()),
            };
            tokens.push(token);
        }
        if depth > 0 {
            return Err(QueryError::UnclosedGroup { open: depth });
        }
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[QueryToken] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Words under an even number of negations, counting those applied to
    /// enclosing groups, in query order.
    pub fn positive_words(&self) -> Vec<&str> {
        // negation parity of each open group, outermost first
        let mut groups = vec![false];
        let mut pending = false;
        let mut words = Vec::new();
        for token in &self.tokens {
            let outer = groups.last().copied().unwrap_or(false);
            match token {
                QueryToken::Not => pending = !pending,
                QueryToken::Word(w) => {
                    if outer == pending {
                        words.push(w.as_str());
                    }
                    pending = false;
                }
                QueryToken::Open => {
                    groups.push(outer != pending);
                    pending = false;
                }
                QueryToken::Close => {
                    groups.pop();
                    pending = false;
                }
                QueryToken::Op(_) => pending = false,
            }
        }
        words
    }
}

enum Item {
    Set(BTreeSet<DocId>),
    Op(BoolOp),
    Not,
}

enum Resolved {
    Set(BTreeSet<DocId>),
    Op(BoolOp),
}

pub struct Evaluator<'a> {
    index: &'a InvertedIndex,
    normalizer: &'a Normalizer,
    kind: TermKind,
}

impl<'a> Evaluator<'a> {
    /// Evaluates against the lemma namespace.
    pub fn new(index: &'a InvertedIndex, normalizer: &'a Normalizer) -> Self {
        Self { index, normalizer, kind: TermKind::Lemma }
    }

    pub fn kind(mut self, kind: TermKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn evaluate(&self, query: &str) -> Result<BTreeSet<DocId>, QueryError> {
        self.evaluate_query(&Query::parse(query)?)
    }

    pub fn evaluate_query(&self, query: &Query) -> Result<BTreeSet<DocId>, QueryError> {
        let mut stack: Vec<Vec<Item>> = Vec::new();
        let mut current: Vec<Item> = Vec::new();

        for (position, token) in query.tokens().iter().enumerate() {
            match token {
                QueryToken::Open => stack.push(mem::take(&mut current)),
                QueryToken::Close => {
                    let resolved = self.reduce(mem::take(&mut current))?;
                    current = stack.pop().ok_or(QueryError::UnexpectedClose { position })?;
                    current.push(Item::Set(resolved));
                }
                QueryToken::Op(op) => current.push(Item::Op(*op)),
                QueryToken::Not => current.push(Item::Not),
                QueryToken::Word(word) => current.push(Item::Set(self.lookup(word))),
            }
        }
        if !stack.is_empty() {
            return Err(QueryError::UnclosedGroup { open: stack.len() });
        }
        self.reduce(current)
    }

    /// Normalized, de-duplicated terms of the query's positive words.
    pub fn terms(&self, query: &Query) -> Vec<String> {
        let mut seen = BTreeSet::new();
        query
            .positive_words()
            .into_iter()
            .map(|w| self.normalizer.query_term(w, self.kind))
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }

    fn lookup(&self, word: &str) -> BTreeSet<DocId> {
        let term = self.normalizer.query_term(word, self.kind);
        self.index.postings_or_empty(&term, self.kind).clone()
    }

    /// Apply pending negations, then fold operands left to right.
    fn reduce(&self, items: Vec<Item>) -> Result<BTreeSet<DocId>, QueryError> {
        let mut negate = false;
        let mut seq = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Item::Not => negate = !negate,
                Item::Set(set) => {
                    let set = if negate { self.index.universe().difference(&set).copied().collect() } else { set };
                    seq.push(Resolved::Set(set));
                    negate = false;
                }
                Item::Op(op) => {
                    if negate {
                        return Err(QueryError::OperatorInOperandPosition { op });
                    }
                    seq.push(Resolved::Op(op));
                }
            }
        }
        if negate {
            return Err(QueryError::DanglingNot);
        }

        let mut seq = seq.into_iter();
        let mut result = match seq.next() {
            None => return Ok(BTreeSet::new()),
            Some(Resolved::Op(op)) => return Err(QueryError::MissingLeftOperand { op }),
            Some(Resolved::Set(set)) => set,
        };
        while let Some(next) = seq.next() {
            let op = match next {
                Resolved::Op(op) => op,
                Resolved::Set(_) => return Err(QueryError::MissingOperator),
            };
            let operand = match seq.next() {
                Some(Resolved::Set(set)) => set,
                Some(Resolved::Op(_)) => return Err(QueryError::OperatorInOperandPosition { op }),
                None => return Err(QueryError::MissingRightOperand { op }),
            };
            result = match op {
                BoolOp::And => result.intersection(&operand).copied().collect(),
                BoolOp::Or => {
                    result.extend(operand);
                    result
                }
            };
        }
        Ok(result)
    }
}

/// Evaluate `query` against the lemma namespace of `index`.
pub fn evaluate(query: &str, index: &InvertedIndex, normalizer: &Normalizer) -> Result<BTreeSet<DocId>, QueryError> {
    Evaluator::new(index, normalizer).evaluate(query)
}
