//! Annotation graph and conversion driver
//!
//! `GraphConverter` walks the tier surface of a `TableParser` depth-first and
//! materializes every annotation as a node of an `AnnotationGraph`, linked to
//! the annotation it was requested under. `AnnotationDocument` holds the
//! result together with the tier hierarchy it was built from.

use crate::clause::ClauseDocument;
use crate::config::ParserConfig;
use crate::parser::TableParser;
use crate::table::TableError;
use crate::tier::{Annotation, AnnotationKey, Tier};
use rustc_hash::FxHashMap;
use std::path::Path;
use thiserror::Error;

/// Position of a node in the graph
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Annotation {0} is already in the graph")]
    DuplicateAnnotation(AnnotationKey),

    #[error("No node with id {0}")]
    UnknownNode(NodeId),

    #[error("Source exposes no root tier")]
    NoRootTier,
}

/// Error while building an annotation document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// One annotation in the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: NodeId,
    pub key: AnnotationKey,
    pub tier: Tier,
    pub value: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Annotations linked parent to child
#[derive(Debug, Clone, Default)]
pub struct AnnotationGraph {
    nodes: Vec<GraphNode>,
    by_key: FxHashMap<AnnotationKey, NodeId>,
    by_tier: FxHashMap<Tier, Vec<NodeId>>,
}

impl AnnotationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an annotation below `parent` (or as a root)
    pub fn add_annotation(
        &mut self,
        tier: Tier,
        annotation: Annotation,
        parent: Option<NodeId>,
    ) -> Result<NodeId, GraphError> {
        if self.by_key.contains_key(&annotation.key) {
            return Err(GraphError::DuplicateAnnotation(annotation.key));
        }
        if let Some(parent_id) = parent {
            if parent_id >= self.nodes.len() {
                return Err(GraphError::UnknownNode(parent_id));
            }
        }

        let id = self.nodes.len();
        self.by_key.insert(annotation.key.clone(), id);
        self.by_tier.entry(tier).or_default().push(id);
        self.nodes.push(GraphNode {
            id,
            key: annotation.key,
            tier,
            value: annotation.value,
            parent: None,
            children: Vec::new(),
        });
        if let Some(parent_id) = parent {
            self.set_parent(id, parent_id);
        }

        Ok(id)
    }

    fn set_parent(&mut self, child_id: NodeId, parent_id: NodeId) {
        if let Some(child) = self.nodes.get_mut(child_id) {
            child.parent = Some(parent_id);
        }
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.children.push(child_id);
        }
    }

    pub fn get_node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Look a node up by its annotation identity
    pub fn node_for(&self, key: &AnnotationKey) -> Option<&GraphNode> {
        self.by_key.get(key).and_then(|&id| self.get_node(id))
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Nodes of one tier, in insertion order
    pub fn nodes_in_tier(&self, tier: Tier) -> impl Iterator<Item = &GraphNode> + '_ {
        self.tier_nodes(tier)
            .iter()
            .filter_map(|&id| self.get_node(id))
    }

    /// Node ids of a tier, in insertion order
    pub fn tier_nodes(&self, tier: Tier) -> &[NodeId] {
        self.by_tier.get(&tier).map(Vec::as_slice).unwrap_or_default()
    }

    /// Children of a node, in insertion order
    pub fn children(&self, node_id: NodeId) -> Vec<&GraphNode> {
        match self.get_node(node_id) {
            Some(node) => node
                .children
                .iter()
                .filter_map(|&id| self.get_node(id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Children of a node that belong to `tier`
    pub fn children_in_tier(&self, node_id: NodeId, tier: Tier) -> Vec<&GraphNode> {
        self.children(node_id)
            .into_iter()
            .filter(|child| child.tier == tier)
            .collect()
    }

    pub fn parent(&self, node_id: NodeId) -> Option<&GraphNode> {
        self.get_node(node_id)
            .and_then(|node| node.parent)
            .and_then(|parent_id| self.get_node(parent_id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A tier and the tiers below it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierHierarchy {
    pub tier: Tier,
    pub children: Vec<TierHierarchy>,
}

impl TierHierarchy {
    /// Build the hierarchy below `tier` from a parser's tier surface
    pub fn from_parser(parser: &TableParser, tier: Tier) -> Self {
        Self {
            tier,
            children: parser
                .child_tiers(tier)
                .iter()
                .map(|&child| Self::from_parser(parser, child))
                .collect(),
        }
    }

    /// All tiers, depth-first
    pub fn tiers(&self) -> Vec<Tier> {
        let mut tiers = vec![self.tier];
        for child in &self.children {
            tiers.extend(child.tiers());
        }
        tiers
    }
}

/// Shape of a document's annotations, derived from its first tier hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureType {
    pub hierarchy: TierHierarchy,
    parents: FxHashMap<Tier, Tier>,
}

impl StructureType {
    pub fn new(hierarchy: TierHierarchy) -> Self {
        let mut parents = FxHashMap::default();
        let mut stack = vec![&hierarchy];
        while let Some(level) = stack.pop() {
            for child in &level.children {
                parents.insert(child.tier, level.tier);
                stack.push(child);
            }
        }
        Self { hierarchy, parents }
    }

    pub fn root(&self) -> Tier {
        self.hierarchy.tier
    }

    pub fn tiers(&self) -> Vec<Tier> {
        self.hierarchy.tiers()
    }

    pub fn contains(&self, tier: Tier) -> bool {
        tier == self.root() || self.parents.contains_key(&tier)
    }

    pub fn parent_of(&self, tier: Tier) -> Option<Tier> {
        self.parents.get(&tier).copied()
    }

    /// Distance from the root tier; `None` for tiers outside the structure
    pub fn depth_of(&self, tier: Tier) -> Option<usize> {
        if !self.contains(tier) {
            return None;
        }
        let mut depth = 0;
        let mut current = tier;
        while let Some(parent) = self.parent_of(current) {
            depth += 1;
            current = parent;
        }
        Some(depth)
    }
}

/// Walks a parser's tier surface to build an annotation graph
pub struct GraphConverter<'a> {
    parser: &'a mut TableParser,
    graph: AnnotationGraph,
}

impl<'a> GraphConverter<'a> {
    pub fn new(parser: &'a mut TableParser) -> Self {
        Self {
            parser,
            graph: AnnotationGraph::new(),
        }
    }

    /// Convert every root tier, returning the hierarchies and the graph
    pub fn convert(mut self) -> Result<(Vec<TierHierarchy>, AnnotationGraph), GraphError> {
        let roots = self.parser.root_tiers();
        if roots.is_empty() {
            return Err(GraphError::NoRootTier);
        }

        let mut hierarchies = Vec::with_capacity(roots.len());
        for tier in roots {
            hierarchies.push(TierHierarchy::from_parser(self.parser, tier));
            for annotation in self.parser.annotations_for_tier(tier, None) {
                self.add_subtree(tier, annotation, None)?;
            }
        }

        tracing::debug!(nodes = self.graph.len(), "Converted tier surface to graph");
        Ok((hierarchies, self.graph))
    }

    fn add_subtree(
        &mut self,
        tier: Tier,
        annotation: Annotation,
        parent: Option<NodeId>,
    ) -> Result<(), GraphError> {
        let node = self.graph.add_annotation(tier, annotation.clone(), parent)?;
        for &child_tier in self.parser.child_tiers(tier) {
            for child in self.parser.annotations_for_tier(child_tier, Some(&annotation)) {
                self.add_subtree(child_tier, child, Some(node))?;
            }
        }
        Ok(())
    }
}

/// A converted clause table
///
/// Keeps the clause document next to the graph so either can be queried.
#[derive(Debug)]
pub struct AnnotationDocument {
    pub tier_hierarchies: Vec<TierHierarchy>,
    pub structure_type: StructureType,
    pub graph: AnnotationGraph,
    pub clauses: ClauseDocument,
}

impl AnnotationDocument {
    /// Parse and convert a table file
    pub fn from_file(path: impl AsRef<Path>, config: &ParserConfig) -> Result<Self, DocumentError> {
        let parser = TableParser::from_file(path, config)?;
        Ok(Self::from_parser(parser)?)
    }

    pub fn from_string(text: &str, config: &ParserConfig) -> Result<Self, DocumentError> {
        let parser = TableParser::from_string(text, config)?;
        Ok(Self::from_parser(parser)?)
    }

    pub fn from_parser(mut parser: TableParser) -> Result<Self, GraphError> {
        let (tier_hierarchies, graph) = GraphConverter::new(&mut parser).convert()?;
        let first = tier_hierarchies.first().cloned().ok_or(GraphError::NoRootTier)?;

        Ok(Self {
            structure_type: StructureType::new(first),
            tier_hierarchies,
            graph,
            clauses: parser.into_document(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TierNumbers;

    const EXAMPLE: &str = "c1\t\tc2\n\
                           decl\t\tquest\n\
                           SBJ\tOBJ\tVERB\n\
                           zero\t\t3sg\n";

    fn config() -> ParserConfig {
        ParserConfig::new(TierNumbers {
            clause_id: 0,
            clause_type: 1,
            grammatical_relation: 2,
            pos_agreement: 3,
            block_len: 4,
        })
    }

    fn values<'a>(nodes: &[&'a GraphNode]) -> Vec<&'a str> {
        nodes.iter().map(|n| n.value.as_str()).collect()
    }

    #[test]
    fn test_graph_creation() {
        let mut graph = AnnotationGraph::new();
        let clause = graph
            .add_annotation(Tier::ClauseId, Annotation::token("c1"), None)
            .unwrap();
        let relation = graph
            .add_annotation(Tier::GrammaticalRelation, Annotation::allocated(0, "SBJ"), Some(clause))
            .unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.parent(relation).unwrap().id, clause);
        assert_eq!(graph.children(clause).len(), 1);
        assert!(graph.parent(clause).is_none());
        assert_eq!(
            graph.node_for(&AnnotationKey::Allocated(0)).unwrap().value,
            "SBJ"
        );
        assert_eq!(graph.tier_nodes(Tier::ClauseId), &[clause]);
        assert_eq!(graph.tier_nodes(Tier::GrammaticalRelation), &[relation]);
        assert!(graph.tier_nodes(Tier::Agreement).is_empty());
    }

    #[test]
    fn test_graph_rejects_duplicates_and_bad_parents() {
        let mut graph = AnnotationGraph::new();
        graph
            .add_annotation(Tier::ClauseId, Annotation::token("c1"), None)
            .unwrap();

        assert_eq!(
            graph.add_annotation(Tier::ClauseId, Annotation::token("c1"), None),
            Err(GraphError::DuplicateAnnotation(AnnotationKey::Token("c1".to_string())))
        );
        assert_eq!(
            graph.add_annotation(Tier::ClauseType, Annotation::allocated(5, "decl"), Some(7)),
            Err(GraphError::UnknownNode(7))
        );
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_tier_hierarchy() {
        let parser = TableParser::from_string(EXAMPLE, &config()).unwrap();
        let hierarchy = TierHierarchy::from_parser(&parser, Tier::ClauseId);

        assert_eq!(
            hierarchy.tiers(),
            vec![
                Tier::ClauseId,
                Tier::GrammaticalRelation,
                Tier::Agreement,
                Tier::ClauseType
            ]
        );

        let structure = StructureType::new(hierarchy);
        assert_eq!(structure.root(), Tier::ClauseId);
        assert_eq!(structure.parent_of(Tier::Agreement), Some(Tier::GrammaticalRelation));
        assert_eq!(structure.parent_of(Tier::ClauseId), None);
        assert_eq!(structure.depth_of(Tier::ClauseId), Some(0));
        assert_eq!(structure.depth_of(Tier::ClauseType), Some(1));
        assert_eq!(structure.depth_of(Tier::Agreement), Some(2));
    }

    #[test]
    fn test_structure_type_partial_hierarchy() {
        let structure = StructureType::new(TierHierarchy {
            tier: Tier::GrammaticalRelation,
            children: Vec::new(),
        });
        assert!(!structure.contains(Tier::ClauseId));
        assert_eq!(structure.depth_of(Tier::Agreement), None);
        assert_eq!(structure.tiers(), vec![Tier::GrammaticalRelation]);
    }

    #[test]
    fn test_convert_example() {
        let doc = AnnotationDocument::from_string(EXAMPLE, &config()).unwrap();
        let graph = &doc.graph;

        assert_eq!(doc.tier_hierarchies.len(), 1);
        assert_eq!(doc.structure_type.root(), Tier::ClauseId);
        assert_eq!(doc.clauses.len(), 2);

        // 2 clauses + 3 relations + 2 clause types + 2 agreements
        assert_eq!(graph.len(), 9);

        let clauses: Vec<_> = graph.nodes_in_tier(Tier::ClauseId).collect();
        assert_eq!(values(&clauses), vec!["c1", "c2"]);
        assert!(clauses.iter().all(|n| n.parent.is_none()));

        let c1 = clauses[0].id;
        let relations = graph.children_in_tier(c1, Tier::GrammaticalRelation);
        assert_eq!(values(&relations), vec!["zero-SBJ", "OBJ"]);
        assert_eq!(relations[0].key, AnnotationKey::Allocated(0));
        assert_eq!(relations[1].key, AnnotationKey::Allocated(1));
        assert_eq!(values(&graph.children_in_tier(c1, Tier::ClauseType)), vec!["decl"]);

        let sbj_agreement = graph.children_in_tier(relations[0].id, Tier::Agreement);
        assert_eq!(values(&sbj_agreement), vec!["zero"]);
        assert!(graph.children_in_tier(relations[1].id, Tier::Agreement).is_empty());

        let c2 = clauses[1].id;
        let verb = graph.children_in_tier(c2, Tier::GrammaticalRelation);
        assert_eq!(values(&verb), vec!["VERB"]);
        assert_eq!(
            values(&graph.children_in_tier(verb[0].id, Tier::Agreement)),
            vec!["3sg"]
        );
        assert_eq!(values(&graph.children_in_tier(c2, Tier::ClauseType)), vec!["quest"]);
    }

    #[test]
    fn test_converted_ids_are_unique() {
        let doc = AnnotationDocument::from_string(EXAMPLE, &config()).unwrap();
        let mut allocated: Vec<_> = doc
            .graph
            .nodes()
            .iter()
            .filter_map(|n| match n.key {
                AnnotationKey::Allocated(id) => Some(id),
                AnnotationKey::Token(_) => None,
            })
            .collect();
        let total = allocated.len();
        allocated.sort();
        allocated.dedup();

        assert_eq!(allocated.len(), total);
        assert_eq!(allocated, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_from_file_missing() {
        let result = AnnotationDocument::from_file("/nonexistent/clauses.tsv", &config());
        assert!(matches!(
            result,
            Err(DocumentError::Table(TableError::FileOpen { .. }))
        ));
    }
}
