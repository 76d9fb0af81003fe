//! Word-order queries
//!
//! Reconstructs, for every clause, the sequence of grammatical relations in
//! source order, keeping only the relations a caller asks for and optionally
//! renaming them and pairing them with their agreement values.
//!
//! Queries run against any `WordOrderSource`: the `ClauseDocument` straight
//! out of segmentation, or an `AnnotationGraph` built from it.
//!
//! # Examples
//!
//! ```
//! use clausetab::{ParserConfig, TableParser, TierNumbers, WordOrderQuery};
//!
//! let table = "c1\t\tc2\ndecl\t\tquest\nSBJ\tOBJ\tVERB\nzero\t\t3sg\n";
//! let config = ParserConfig::new(TierNumbers {
//!     clause_id: 0,
//!     clause_type: 1,
//!     grammatical_relation: 2,
//!     pos_agreement: 3,
//!     block_len: 4,
//! });
//! let parser = TableParser::from_string(table, &config).unwrap();
//!
//! let query = WordOrderQuery::new().with_terms(["SBJ", "VERB"]);
//! for word_order in query.run(parser.document()) {
//!     let word_order = word_order.unwrap();
//!     println!("{}: {:?}", word_order.clause_id, word_order.relations);
//! }
//! ```

use crate::clause::ClauseDocument;
use crate::graph::{AnnotationGraph, NodeId};
use crate::ids::AnnotationId;
use crate::segmenter::ZERO_PREFIX;
use crate::tier::{AnnotationKey, Tier};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

/// A clause without exactly one clause type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Clause {clause:?} has no clause type")]
    MissingClauseType { clause: String },

    #[error("Clause {clause:?} has {found} clause types")]
    AmbiguousClauseType { clause: String, found: usize },
}

/// Lookups a word-order query needs
pub trait WordOrderSource {
    /// Handle for one relation instance
    type Relation: Copy;

    /// Identity of the clause at `index`, in creation order
    fn clause_at(&self, index: usize) -> Option<&str>;

    fn clause_types(&self, clause: &str) -> Vec<&str>;

    /// Relations of a clause in word order
    fn relations(&self, clause: &str) -> Vec<(Self::Relation, &str)>;

    fn agreements(&self, relation: Self::Relation) -> Vec<&str>;
}

impl WordOrderSource for ClauseDocument {
    type Relation = AnnotationId;

    fn clause_at(&self, index: usize) -> Option<&str> {
        self.clauses().get(index).map(|c| c.id.as_str())
    }

    fn clause_types(&self, clause: &str) -> Vec<&str> {
        self.get(clause)
            .map(|c| c.clause_type.as_str())
            .into_iter()
            .collect()
    }

    fn relations(&self, clause: &str) -> Vec<(AnnotationId, &str)> {
        self.get(clause)
            .map(|c| c.relations.iter().map(|r| (r.id, r.label.as_str())).collect())
            .unwrap_or_default()
    }

    fn agreements(&self, relation: AnnotationId) -> Vec<&str> {
        self.relation(relation)
            .and_then(|r| r.agreement.as_deref())
            .into_iter()
            .collect()
    }
}

impl AnnotationGraph {
    fn clause_node(&self, clause: &str) -> Option<NodeId> {
        self.node_for(&AnnotationKey::Token(clause.to_string()))
            .map(|node| node.id)
    }

    fn child_values(&self, node: Option<NodeId>, tier: Tier) -> Vec<&str> {
        node.map(|id| {
            self.children_in_tier(id, tier)
                .into_iter()
                .map(|child| child.value.as_str())
                .collect()
        })
        .unwrap_or_default()
    }
}

impl WordOrderSource for AnnotationGraph {
    type Relation = NodeId;

    fn clause_at(&self, index: usize) -> Option<&str> {
        let id = *self.tier_nodes(Tier::ClauseId).get(index)?;
        self.get_node(id).map(|node| node.value.as_str())
    }

    fn clause_types(&self, clause: &str) -> Vec<&str> {
        self.child_values(self.clause_node(clause), Tier::ClauseType)
    }

    fn relations(&self, clause: &str) -> Vec<(NodeId, &str)> {
        self.clause_node(clause)
            .map(|id| {
                self.children_in_tier(id, Tier::GrammaticalRelation)
                    .into_iter()
                    .map(|child| (child.id, child.value.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn agreements(&self, relation: NodeId) -> Vec<&str> {
        self.child_values(Some(relation), Tier::Agreement)
    }
}

/// Word order of one clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordOrder {
    pub clause_id: String,
    /// Retained (and renamed) relation labels in source order
    pub relations: Vec<String>,
    pub clause_type: String,
    /// Agreement values of the retained relations; may be shorter than
    /// `relations` where a relation has no single agreement value
    pub agreements: Vec<String>,
}

/// Which relations to keep and how to report them
///
/// With no terms, nothing is retained. Terms and renames match the label
/// without its `zero-` prefix; the prefix is kept on output.
#[derive(Debug, Clone, Default)]
pub struct WordOrderQuery {
    terms: Option<FxHashSet<String>>,
    renames: FxHashMap<String, String>,
    with_agreement: bool,
}

impl WordOrderQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relation labels to retain
    pub fn with_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms = Some(terms.into_iter().map(Into::into).collect());
        self
    }

    /// Report a retained label under another name
    pub fn with_rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renames.insert(from.into(), to.into());
        self
    }

    pub fn with_renames<I, K, V>(mut self, renames: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.renames
            .extend(renames.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Also collect agreement values
    pub fn with_agreement(mut self, with_agreement: bool) -> Self {
        self.with_agreement = with_agreement;
        self
    }

    /// Lazily compute word orders, one per clause
    ///
    /// Each call starts again from the first clause.
    pub fn run<'a, S: WordOrderSource>(&'a self, source: &'a S) -> WordOrders<'a, S> {
        WordOrders {
            query: self,
            source,
            position: 0,
            failed: false,
        }
    }

    /// The label to report for `label`, or `None` if it is not retained
    fn render(&self, label: &str) -> Option<String> {
        let (prefix, base) = match label.strip_prefix(ZERO_PREFIX) {
            Some(base) => (ZERO_PREFIX, base),
            None => ("", label),
        };
        if !self.terms.as_ref()?.contains(base) {
            return None;
        }
        let name = self.renames.get(base).map(String::as_str).unwrap_or(base);
        Some(format!("{}{}", prefix, name))
    }

    fn word_order<S: WordOrderSource>(
        &self,
        source: &S,
        clause: &str,
    ) -> Result<WordOrder, QueryError> {
        let clause_type = match source.clause_types(clause).as_slice() {
            [clause_type] => clause_type.to_string(),
            [] => {
                return Err(QueryError::MissingClauseType {
                    clause: clause.to_string(),
                });
            }
            types => {
                return Err(QueryError::AmbiguousClauseType {
                    clause: clause.to_string(),
                    found: types.len(),
                });
            }
        };

        let mut relations = Vec::new();
        let mut agreements = Vec::new();
        for (relation, label) in source.relations(clause) {
            let Some(rendered) = self.render(label) else {
                continue;
            };
            relations.push(rendered);

            if self.with_agreement {
                match source.agreements(relation).as_slice() {
                    [agreement] => agreements.push(agreement.to_string()),
                    found => tracing::warn!(
                        clause,
                        relation = label,
                        found = found.len(),
                        "Expected exactly one agreement value"
                    ),
                }
            }
        }

        Ok(WordOrder {
            clause_id: clause.to_string(),
            relations,
            clause_type,
            agreements,
        })
    }
}

/// Iterator over the word orders of a source
///
/// Ends after the first error.
pub struct WordOrders<'a, S: WordOrderSource> {
    query: &'a WordOrderQuery,
    source: &'a S,
    position: usize,
    failed: bool,
}

impl<S: WordOrderSource> Iterator for WordOrders<'_, S> {
    type Item = Result<WordOrder, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let clause = self.source.clause_at(self.position)?;
        self.position += 1;

        let result = self.query.word_order(self.source, clause);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}
