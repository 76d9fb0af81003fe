//! Tier capability surface
//!
//! The conversion driver walks this surface to build an annotation graph:
//! it asks for the root tiers, the child tiers of each tier, and the
//! annotations of a tier under a given parent annotation. The tier set is
//! fixed, so dispatch is a plain match on `Tier`.
//!
//! ```text
//! clause_id
//! ├── grammatical_relation
//! │   └── agreement
//! └── clause_type
//! ```

use crate::clause::{Clause, ClauseId, RelationAnnotation};
use crate::ids::AnnotationId;
use crate::parser::TableParser;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A named level of the annotation hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    ClauseId,
    GrammaticalRelation,
    ClauseType,
    Agreement,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown tier: {0}")]
pub struct UnknownTier(pub String);

impl Tier {
    pub const ALL: [Tier; 4] = [
        Tier::ClauseId,
        Tier::GrammaticalRelation,
        Tier::ClauseType,
        Tier::Agreement,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tier::ClauseId => "clause_id",
            Tier::GrammaticalRelation => "grammatical_relation",
            Tier::ClauseType => "clause_type",
            Tier::Agreement => "agreement",
        }
    }

    /// Child tiers, in the order the driver visits them
    pub fn children(self) -> &'static [Tier] {
        match self {
            Tier::ClauseId => &[Tier::GrammaticalRelation, Tier::ClauseType],
            Tier::GrammaticalRelation => &[Tier::Agreement],
            Tier::ClauseType | Tier::Agreement => &[],
        }
    }

    pub fn parent(self) -> Option<Tier> {
        match self {
            Tier::ClauseId => None,
            Tier::GrammaticalRelation | Tier::ClauseType => Some(Tier::ClauseId),
            Tier::Agreement => Some(Tier::GrammaticalRelation),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|tier| tier.name() == s)
            .ok_or_else(|| UnknownTier(s.to_string()))
    }
}

/// Identity of an exposed annotation
///
/// Clauses are addressed by their source token; everything else by an
/// allocated integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnnotationKey {
    Token(ClauseId),
    Allocated(AnnotationId),
}

impl fmt::Display for AnnotationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationKey::Token(token) => f.write_str(token),
            AnnotationKey::Allocated(id) => write!(f, "{}", id),
        }
    }
}

/// An annotation instance handed to the conversion driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub key: AnnotationKey,
    pub value: String,
}

impl Annotation {
    pub fn token(token: &str) -> Self {
        Self {
            key: AnnotationKey::Token(token.to_string()),
            value: token.to_string(),
        }
    }

    pub fn allocated(id: AnnotationId, value: impl Into<String>) -> Self {
        Self {
            key: AnnotationKey::Allocated(id),
            value: value.into(),
        }
    }
}

/// Character span of an annotation in primary data
pub type Region = (usize, usize);

impl TableParser {
    pub fn root_tiers(&self) -> Vec<Tier> {
        vec![Tier::ClauseId]
    }

    pub fn child_tiers(&self, tier: Tier) -> &'static [Tier] {
        tier.children()
    }

    /// Annotations of `tier` below `parent`
    ///
    /// Clause-type and agreement annotations have no identity of their own in
    /// the table, so each call allocates fresh identities for them. Relation
    /// annotations keep the identities allocated during segmentation.
    pub fn annotations_for_tier(
        &mut self,
        tier: Tier,
        parent: Option<&Annotation>,
    ) -> Vec<Annotation> {
        match tier {
            Tier::ClauseId => self
                .document
                .iter()
                .map(|clause| Annotation::token(&clause.id))
                .collect(),

            Tier::ClauseType => {
                let clause_type = parent
                    .and_then(|p| self.parent_clause(p))
                    .map(|clause| clause.clause_type.clone());
                match clause_type {
                    Some(value) => vec![Annotation::allocated(self.next_id(), value)],
                    None => Vec::new(),
                }
            }

            Tier::GrammaticalRelation => parent
                .and_then(|p| self.parent_clause(p))
                .map(|clause| {
                    clause
                        .relations
                        .iter()
                        .map(|r| Annotation::allocated(r.id, r.label.as_str()))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default(),

            Tier::Agreement => {
                let agreement = parent
                    .and_then(|p| self.parent_relation(p))
                    .and_then(|relation| relation.agreement.clone());
                match agreement {
                    Some(value) => vec![Annotation::allocated(self.next_id(), value)],
                    None => Vec::new(),
                }
            }
        }
    }

    /// Always false: clause tables carry no primary-data offsets
    pub fn tier_has_regions(&self, _tier: Tier) -> bool {
        false
    }

    pub fn region_for_annotation(&self, _annotation: &Annotation) -> Option<Region> {
        None
    }

    pub fn primary_data(&self) -> Option<&str> {
        None
    }

    fn parent_clause(&self, parent: &Annotation) -> Option<&Clause> {
        match &parent.key {
            AnnotationKey::Token(id) => self.document.get(id),
            AnnotationKey::Allocated(_) => {
                tracing::debug!("{} is not a clause annotation", parent.key);
                None
            }
        }
    }

    fn parent_relation(&self, parent: &Annotation) -> Option<&RelationAnnotation> {
        match &parent.key {
            AnnotationKey::Allocated(id) => self.document.relation(*id),
            AnnotationKey::Token(_) => {
                tracing::debug!("{} is not a relation annotation", parent.key);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ParserConfig, TierNumbers};

    const EXAMPLE: &str = "c1\t\tc2\n\
                           decl\t\tquest\n\
                           SBJ\tOBJ\tVERB\n\
                           zero\t\t3sg\n";

    fn parser() -> TableParser {
        let config = ParserConfig::new(TierNumbers {
            clause_id: 0,
            clause_type: 1,
            grammatical_relation: 2,
            pos_agreement: 3,
            block_len: 4,
        });
        TableParser::from_string(EXAMPLE, &config).unwrap()
    }

    #[test]
    fn test_tier_names() {
        for tier in Tier::ALL {
            assert_eq!(tier.name().parse::<Tier>().unwrap(), tier);
        }
        assert_eq!(Tier::GrammaticalRelation.to_string(), "grammatical_relation");
        assert_eq!("words".parse::<Tier>(), Err(UnknownTier("words".to_string())));
    }

    #[test]
    fn test_tier_hierarchy() {
        let parser = parser();
        assert_eq!(parser.root_tiers(), vec![Tier::ClauseId]);
        assert_eq!(
            parser.child_tiers(Tier::ClauseId),
            &[Tier::GrammaticalRelation, Tier::ClauseType]
        );
        assert_eq!(parser.child_tiers(Tier::GrammaticalRelation), &[Tier::Agreement]);
        assert!(parser.child_tiers(Tier::ClauseType).is_empty());
        assert!(parser.child_tiers(Tier::Agreement).is_empty());

        for tier in Tier::ALL {
            for child in tier.children() {
                assert_eq!(child.parent(), Some(tier));
            }
        }
    }

    #[test]
    fn test_clause_annotations() {
        let mut parser = parser();
        let clauses = parser.annotations_for_tier(Tier::ClauseId, None);
        assert_eq!(clauses, vec![Annotation::token("c1"), Annotation::token("c2")]);
        assert_eq!(clauses[0].value, "c1");
    }

    #[test]
    fn test_relation_annotations_reuse_ids() {
        let mut parser = parser();
        let c1 = Annotation::token("c1");

        let relations = parser.annotations_for_tier(Tier::GrammaticalRelation, Some(&c1));
        assert_eq!(
            relations,
            vec![
                Annotation::allocated(0, "zero-SBJ"),
                Annotation::allocated(1, "OBJ")
            ]
        );

        // Asking again yields the same identities
        let again = parser.annotations_for_tier(Tier::GrammaticalRelation, Some(&c1));
        assert_eq!(relations, again);
    }

    #[test]
    fn test_clause_type_allocates_fresh_id() {
        let mut parser = parser();
        let c2 = Annotation::token("c2");

        let types = parser.annotations_for_tier(Tier::ClauseType, Some(&c2));
        assert_eq!(types, vec![Annotation::allocated(3, "quest")]);

        let types = parser.annotations_for_tier(Tier::ClauseType, Some(&c2));
        assert_eq!(types, vec![Annotation::allocated(4, "quest")]);
    }

    #[test]
    fn test_blank_clause_type_still_annotated() {
        let config = ParserConfig::new(TierNumbers {
            clause_id: 0,
            clause_type: 1,
            grammatical_relation: 2,
            pos_agreement: 3,
            block_len: 4,
        });
        let mut parser = TableParser::from_string("c1\tc2\ndecl\t \nSBJ\tVERB\n\t\n", &config).unwrap();

        let types = parser.annotations_for_tier(Tier::ClauseType, Some(&Annotation::token("c2")));
        assert_eq!(types, vec![Annotation::allocated(2, "")]);
    }

    #[test]
    fn test_agreement_annotations() {
        let mut parser = parser();
        let verb = Annotation::allocated(2, "VERB");
        let obj = Annotation::allocated(1, "OBJ");

        let agreement = parser.annotations_for_tier(Tier::Agreement, Some(&verb));
        assert_eq!(agreement, vec![Annotation::allocated(3, "3sg")]);

        // Empty agreement cell: nothing, and no identity consumed
        assert!(parser.annotations_for_tier(Tier::Agreement, Some(&obj)).is_empty());
        assert_eq!(parser.next_id(), 4);
    }

    #[test]
    fn test_mismatched_parents() {
        let mut parser = parser();
        let c1 = Annotation::token("c1");
        let relation = Annotation::allocated(0, "zero-SBJ");
        let unknown = Annotation::token("c9");

        assert!(parser.annotations_for_tier(Tier::Agreement, Some(&c1)).is_empty());
        assert!(parser.annotations_for_tier(Tier::ClauseType, Some(&relation)).is_empty());
        assert!(parser.annotations_for_tier(Tier::GrammaticalRelation, Some(&unknown)).is_empty());
        assert!(parser.annotations_for_tier(Tier::ClauseType, None).is_empty());
    }

    #[test]
    fn test_no_regions() {
        let parser = parser();
        assert!(Tier::ALL.iter().all(|&tier| !parser.tier_has_regions(tier)));
        assert_eq!(parser.region_for_annotation(&Annotation::token("c1")), None);
        assert_eq!(parser.primary_data(), None);
    }
}
