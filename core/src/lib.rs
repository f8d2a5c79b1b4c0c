pub mod config;
pub mod error;
pub mod index;
pub mod normalizer;
pub mod oracle;
pub mod persist;
pub mod query;
pub mod scoring;
pub mod source;
pub mod stopwords;
pub mod tokenizer;

pub use config::{EngineConfig, NormalizerConfig};
pub use error::{ConfigError, OracleError, QueryError};
pub use index::{build_index, BuildReport, IndexBuilder, IndexHandle, InvertedIndex, TermKind};
pub use normalizer::{NormalizedDocument, NormalizedToken, Normalizer};
pub use oracle::{Analysis, DictionaryOracle, LinguisticOracle, StemmerOracle, WordClass};
pub use query::{Evaluator, Query};
pub use scoring::{RankedDoc, Scorer, TermScore};
pub use source::DocumentSet;
pub use stopwords::Stopwords;

pub type DocId = u32;
