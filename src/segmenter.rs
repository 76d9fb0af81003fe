//! Clause segmentation
//!
//! Walks the columns of each block left to right. A non-empty clause-id cell
//! opens a new clause; every non-empty relation cell becomes a relation
//! annotation of the clause that is current at that column.
//!
//! Relation labels are normalized as they are allocated:
//! - the literal `say` becomes `SAY`
//! - a label whose agreement cell mentions `zero` gets a `zero-` prefix

use crate::clause::{Clause, ClauseDocument, ClauseId, RelationAnnotation};
use crate::ids::IdAllocator;
use crate::table::RowBlock;
use thiserror::Error;

/// Prefix marking a relation with no overt agreement
pub const ZERO_PREFIX: &str = "zero-";

/// Non-fatal problem found while segmenting
///
/// The offending column is skipped and segmentation continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("Block {block}, column {column}: duplicate clause id {clause:?}, column skipped")]
    DuplicateClause {
        clause: ClauseId,
        block: usize,
        column: usize,
    },

    #[error("Block {block}, column {column}: relation {label:?} has no clause, dropped")]
    OrphanRelation {
        label: String,
        block: usize,
        column: usize,
    },
}

/// Normalize a trimmed relation cell given its trimmed agreement cell
///
/// Only a cell that is exactly `say` becomes `SAY`; `say` inside a longer
/// label is left alone. The `zero-` prefix is added whenever the agreement
/// mentions `zero`, even to a label that already carries it. With an
/// agreement that does not mention `zero`, normalizing an output again
/// leaves it unchanged.
pub fn normalize_relation(relation: &str, agreement: &str) -> String {
    let relation = if relation == "say" { "SAY" } else { relation };
    if agreement.contains("zero") {
        format!("{}{}", ZERO_PREFIX, relation)
    } else {
        relation.to_string()
    }
}

/// Builds a `ClauseDocument` block by block
///
/// Owns the identity allocator for the parse run; hand it on with
/// `into_parts` so later annotations continue the same sequence.
#[derive(Debug, Default)]
pub struct ClauseSegmenter {
    ids: IdAllocator,
    document: ClauseDocument,
    diagnostics: Vec<Diagnostic>,
}

impl ClauseSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segment one block into clauses
    ///
    /// The current clause does not carry over from the previous block.
    pub fn segment_block(&mut self, block: &RowBlock) {
        let mut current: Option<usize> = None;

        for (column, cells) in block.iter_columns().enumerate() {
            let clause_id = cells.clause_id.trim();
            if !clause_id.is_empty() {
                let clause = Clause::new(clause_id, cells.clause_type.trim());
                match self.document.add_clause(clause) {
                    Some(index) => current = Some(index),
                    None => {
                        // Keep appending to whatever clause was current
                        self.report(Diagnostic::DuplicateClause {
                            clause: clause_id.to_string(),
                            block: block.index,
                            column,
                        });
                        continue;
                    }
                }
            }

            let relation = cells.grammatical_relation.trim();
            if relation.is_empty() {
                continue;
            }
            let agreement = cells.pos_agreement.trim();
            let label = normalize_relation(relation, agreement);

            let Some(index) = current else {
                self.report(Diagnostic::OrphanRelation {
                    label,
                    block: block.index,
                    column,
                });
                continue;
            };

            let clause = self.document.clauses()[index].id.clone();
            let relation = RelationAnnotation {
                id: self.ids.next_id(),
                label,
                clause,
                agreement: Some(agreement.to_string()).filter(|a| !a.is_empty()),
            };
            self.document.push_relation(index, relation);
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::DuplicateClause { .. } => tracing::error!("{}", diagnostic),
            Diagnostic::OrphanRelation { .. } => tracing::warn!("{}", diagnostic),
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn document(&self) -> &ClauseDocument {
        &self.document
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Finish segmenting
    pub fn into_parts(self) -> (ClauseDocument, IdAllocator, Vec<Diagnostic>) {
        (self.document, self.ids, self.diagnostics)
    }
}
