//! Clause data structures
//!
//! A `ClauseDocument` holds every clause of one table in the order the
//! clauses were created. Each clause owns its relation annotations in source
//! column order, which is the clause's word order and is never re-sorted.

use crate::ids::AnnotationId;
use rustc_hash::FxHashMap;

/// Clause identity: the raw token from the `clause_id` row
pub type ClauseId = String;

/// One grammatical-relation instance within a clause's word order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationAnnotation {
    pub id: AnnotationId,
    /// Normalized label (`zero-` prefixing and `SAY` substitution applied)
    pub label: String,
    pub clause: ClauseId,
    /// Agreement marking, absent when the source cell was empty
    pub agreement: Option<String>,
}

/// A segmented clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub id: ClauseId,
    /// Trimmed clause-type cell, empty when the cell was blank
    pub clause_type: String,
    pub relations: Vec<RelationAnnotation>,
}

impl Clause {
    pub fn new(id: &str, clause_type: &str) -> Self {
        Self {
            id: id.to_string(),
            clause_type: clause_type.to_string(),
            relations: Vec::new(),
        }
    }

    /// Relation labels in word order
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.relations.iter().map(|r| r.label.as_str())
    }
}

/// All clauses of a table, in creation order
#[derive(Debug, Clone, Default)]
pub struct ClauseDocument {
    clauses: Vec<Clause>,
    by_id: FxHashMap<ClauseId, usize>,
    by_relation: FxHashMap<AnnotationId, (usize, usize)>,
}

impl ClauseDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clause, refusing one whose identity is already taken
    ///
    /// Returns the clause's position, or `None` for a duplicate; the existing
    /// clause is left untouched.
    pub fn add_clause(&mut self, clause: Clause) -> Option<usize> {
        if self.by_id.contains_key(&clause.id) {
            return None;
        }
        let index = self.clauses.len();
        self.by_id.insert(clause.id.clone(), index);
        for (pos, relation) in clause.relations.iter().enumerate() {
            self.by_relation.insert(relation.id, (index, pos));
        }
        self.clauses.push(clause);
        Some(index)
    }

    /// Append a relation to the clause at `index`
    pub fn push_relation(&mut self, index: usize, relation: RelationAnnotation) {
        if let Some(clause) = self.clauses.get_mut(index) {
            self.by_relation
                .insert(relation.id, (index, clause.relations.len()));
            clause.relations.push(relation);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Get a clause by identity
    pub fn get(&self, id: &str) -> Option<&Clause> {
        self.by_id.get(id).map(|&index| &self.clauses[index])
    }

    /// Get a relation annotation by identity
    pub fn relation(&self, id: AnnotationId) -> Option<&RelationAnnotation> {
        self.by_relation
            .get(&id)
            .map(|&(clause, pos)| &self.clauses[clause].relations[pos])
    }

    /// Clauses in creation order
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Clause> {
        self.clauses.iter()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Total number of relation annotations
    pub fn relation_count(&self) -> usize {
        self.by_relation.len()
    }
}

impl<'a> IntoIterator for &'a ClauseDocument {
    type Item = &'a Clause;
    type IntoIter = std::slice::Iter<'a, Clause>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(id: AnnotationId, label: &str, clause: &str) -> RelationAnnotation {
        RelationAnnotation {
            id,
            label: label.to_string(),
            clause: clause.to_string(),
            agreement: None,
        }
    }

    #[test]
    fn test_document_creation() {
        let mut doc = ClauseDocument::new();
        let first = doc.add_clause(Clause::new("c1", "decl"));
        let second = doc.add_clause(Clause::new("c2", ""));

        assert_eq!(first, Some(0));
        assert_eq!(second, Some(1));
        assert_eq!(doc.len(), 2);
        assert!(doc.contains("c1"));
        assert_eq!(doc.get("c1").unwrap().clause_type, "decl");
        assert_eq!(doc.get("c2").unwrap().clause_type, "");
        assert!(doc.get("c3").is_none());
    }

    #[test]
    fn test_duplicate_clause_refused() {
        let mut doc = ClauseDocument::new();
        let index = doc.add_clause(Clause::new("c1", "decl")).unwrap();
        doc.push_relation(index, relation(0, "SBJ", "c1"));

        let mut duplicate = Clause::new("c1", "quest");
        duplicate.relations.push(relation(1, "OBJ", "c1"));
        assert_eq!(doc.add_clause(duplicate), None);

        let c1 = doc.get("c1").unwrap();
        assert_eq!(c1.clause_type, "decl");
        assert_eq!(c1.labels().collect::<Vec<_>>(), vec!["SBJ"]);
        assert!(doc.relation(1).is_none());
    }

    #[test]
    fn test_relation_lookup() {
        let mut doc = ClauseDocument::new();
        let index = doc.add_clause(Clause::new("c1", "decl")).unwrap();
        doc.push_relation(index, relation(0, "SBJ", "c1"));
        doc.push_relation(index, relation(1, "VERB", "c1"));

        assert_eq!(doc.relation(1).unwrap().label, "VERB");
        assert_eq!(doc.relation(1).unwrap().clause, "c1");
        assert_eq!(doc.relation_count(), 2);
        assert_eq!(
            doc.get("c1").unwrap().labels().collect::<Vec<_>>(),
            vec!["SBJ", "VERB"]
        );
    }

    #[test]
    fn test_iteration_order() {
        let mut doc = ClauseDocument::new();
        for id in ["b", "a", "c"] {
            doc.add_clause(Clause::new(id, "decl"));
        }
        let ids: Vec<_> = doc.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
