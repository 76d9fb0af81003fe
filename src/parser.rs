//! Clause table parsing
//!
//! `TableParser` runs the whole pipeline for one table: blocks are read,
//! segmented into clauses, and the result kept together with the identity
//! allocator so the tier surface can continue its sequence.

use crate::clause::ClauseDocument;
use crate::config::ParserConfig;
use crate::ids::{AnnotationId, IdAllocator};
use crate::segmenter::{ClauseSegmenter, Diagnostic};
use crate::table::{BlockReader, RowBlock, TableError};
use std::io::BufRead;
use std::path::Path;

/// A fully segmented clause table
#[derive(Debug)]
pub struct TableParser {
    pub(crate) document: ClauseDocument,
    pub(crate) ids: IdAllocator,
    diagnostics: Vec<Diagnostic>,
}

impl TableParser {
    /// Parse a table file (plain or `.gz`)
    pub fn from_file(path: impl AsRef<Path>, config: &ParserConfig) -> Result<Self, TableError> {
        let path = path.as_ref();
        tracing::info!("Parsing clause table {:?}", path);
        Self::from_blocks(BlockReader::from_file(path, config)?)
    }

    /// Parse an in-memory table
    pub fn from_string(text: &str, config: &ParserConfig) -> Result<Self, TableError> {
        Self::from_blocks(BlockReader::from_string(text, config)?)
    }

    pub fn from_reader<R: BufRead>(reader: R, config: &ParserConfig) -> Result<Self, TableError> {
        Self::from_blocks(BlockReader::from_reader(reader, config)?)
    }

    /// Segment a sequence of blocks, stopping at the first read error
    pub fn from_blocks<I>(blocks: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = Result<RowBlock, TableError>>,
    {
        let mut segmenter = ClauseSegmenter::new();
        for block in blocks {
            segmenter.segment_block(&block?);
        }

        let (document, ids, diagnostics) = segmenter.into_parts();
        tracing::info!(
            clauses = document.len(),
            relations = document.relation_count(),
            diagnostics = diagnostics.len(),
            "Parsed clause table"
        );

        Ok(Self {
            document,
            ids,
            diagnostics,
        })
    }

    pub fn document(&self) -> &ClauseDocument {
        &self.document
    }

    /// Duplicate clauses and orphan relations met while segmenting
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_document(self) -> ClauseDocument {
        self.document
    }

    /// Allocate an identity from the parse run's sequence
    pub(crate) fn next_id(&mut self) -> AnnotationId {
        self.ids.next_id()
    }
}
