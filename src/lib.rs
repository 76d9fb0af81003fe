//! Clausetab: clause-segmented word-order tables as annotation graphs
//!
//! Reads tables that transcribe clauses column by column (clause ids, clause
//! types, grammatical relations, agreement markers), segments them into
//! clauses, exposes the result as a tier hierarchy for graph conversion, and
//! answers word-order queries over it.

pub mod clause; // Clause and relation data structures
pub mod config; // Table layout configuration
pub mod graph; // Annotation graph and conversion driver
pub mod ids; // Annotation identity allocation
pub mod parser; // Table → clauses entry point
pub mod query; // Word-order queries
pub mod segmenter; // Column walk, clause boundaries, label normalization
pub mod table; // Block-wise table reading
pub mod tier; // Tier capability surface

// Re-exports for convenience
pub use clause::{Clause, ClauseDocument, ClauseId, RelationAnnotation};
pub use config::{ConfigError, ParserConfig, TierNumbers};
pub use graph::{AnnotationDocument, AnnotationGraph, DocumentError, GraphConverter, GraphError};
pub use ids::{AnnotationId, IdAllocator};
pub use parser::TableParser;
pub use query::{QueryError, WordOrder, WordOrderQuery, WordOrderSource};
pub use segmenter::{Diagnostic, normalize_relation};
pub use table::{BlockReader, RowBlock, TableError};
pub use tier::{Annotation, AnnotationKey, Tier};
