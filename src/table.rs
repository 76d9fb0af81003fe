//! Clause table reading
//!
//! Reads a delimiter-separated UTF-8 table organized as repeating blocks of
//! `block_len` rows and yields the four configured rows of each block as
//! parallel column arrays. Plain and gzip-compressed (`.gz`) files are
//! supported.
//!
//! Each physical line is one row, blank lines included. Cells are split with
//! the `csv` crate, so quoted cells lose their quotes; otherwise they are kept
//! as they appear in the file. Trimming and normalization happen in the
//! segmenter.

use crate::config::{ConfigError, ParserConfig, TierNumbers};
use csv::{ReaderBuilder, StringRecord};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Lines};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unrecoverable error while reading a table
#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to open {path}: {source}")]
    FileOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Read error at line {line}: {source}")]
    Io {
        line: usize,
        source: std::io::Error,
    },

    #[error("Malformed row at line {line}: {source}")]
    Csv { line: usize, source: csv::Error },

    #[error("Block {block}: {row} row has {found} columns, expected {expected}")]
    ColumnMismatch {
        block: usize,
        row: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Block {block} ends after {rows} of {expected} rows")]
    TruncatedBlock {
        block: usize,
        rows: usize,
        expected: usize,
    },
}

/// The four captured rows of one block, as parallel column arrays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowBlock {
    /// 0-based position of the block in the table
    pub index: usize,
    pub clause_ids: Vec<String>,
    pub clause_types: Vec<String>,
    pub grammatical_relations: Vec<String>,
    pub pos_agreement: Vec<String>,
}

/// The four cells of one column of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnCells<'a> {
    pub clause_id: &'a str,
    pub clause_type: &'a str,
    pub grammatical_relation: &'a str,
    pub pos_agreement: &'a str,
}

impl RowBlock {
    /// Build a block from its four rows, which must have equal lengths
    pub fn from_rows(
        index: usize,
        clause_ids: Vec<String>,
        clause_types: Vec<String>,
        grammatical_relations: Vec<String>,
        pos_agreement: Vec<String>,
    ) -> Result<Self, TableError> {
        let expected = clause_ids.len();
        let others = [
            ("clause_type", clause_types.len()),
            ("grammatical_relation", grammatical_relations.len()),
            ("pos_agreement", pos_agreement.len()),
        ];
        if let Some(&(row, found)) = others.iter().find(|(_, len)| *len != expected) {
            return Err(TableError::ColumnMismatch {
                block: index,
                row,
                expected,
                found,
            });
        }

        Ok(Self {
            index,
            clause_ids,
            clause_types,
            grammatical_relations,
            pos_agreement,
        })
    }

    /// Number of columns in the block
    pub fn columns(&self) -> usize {
        self.clause_ids.len()
    }

    /// Cells of column `j`
    pub fn column(&self, j: usize) -> Option<ColumnCells<'_>> {
        Some(ColumnCells {
            clause_id: self.clause_ids.get(j)?,
            clause_type: self.clause_types.get(j)?,
            grammatical_relation: self.grammatical_relations.get(j)?,
            pos_agreement: self.pos_agreement.get(j)?,
        })
    }

    /// Columns left to right
    pub fn iter_columns(&self) -> impl Iterator<Item = ColumnCells<'_>> + '_ {
        (0..self.columns()).filter_map(move |j| self.column(j))
    }
}

/// Reader that iterates over the blocks of a clause table
pub struct BlockReader<R: BufRead> {
    lines: Lines<R>,
    line_num: usize,
    block_index: usize,
    cells: ReaderBuilder,
    config: ParserConfig,
    done: bool,
}

impl BlockReader<Box<dyn BufRead>> {
    /// Create a reader from a file path
    ///
    /// Files ending in `.gz` are decompressed on the fly.
    pub fn from_file(path: impl AsRef<Path>, config: &ParserConfig) -> Result<Self, TableError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TableError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;

        let reader: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        Self::from_reader(reader, config)
    }
}

impl BlockReader<Cursor<String>> {
    /// Create a reader from an in-memory table
    pub fn from_string(text: &str, config: &ParserConfig) -> Result<Self, TableError> {
        Self::from_reader(Cursor::new(text.to_string()), config)
    }
}

impl<R: BufRead> BlockReader<R> {
    /// Create a reader over any buffered source
    pub fn from_reader(reader: R, config: &ParserConfig) -> Result<Self, TableError> {
        config.validate()?;
        Ok(Self {
            lines: reader.lines(),
            line_num: 0,
            block_index: 0,
            cells: cell_reader(config.delimiter_byte()?),
            config: config.clone(),
            done: false,
        })
    }

    fn tier_numbers(&self) -> TierNumbers {
        self.config.tier_numbers
    }

    /// Collect the next `block_len` retained rows
    ///
    /// Returns fewer rows only at end of input.
    fn read_rows(&mut self) -> Result<Vec<Vec<String>>, TableError> {
        let block_len = self.tier_numbers().block_len;
        let mut rows = Vec::with_capacity(block_len);

        while rows.len() < block_len {
            match self.lines.next() {
                None => break,
                Some(Err(source)) => {
                    return Err(TableError::Io {
                        line: self.line_num + 1,
                        source,
                    });
                }
                Some(Ok(line)) => {
                    self.line_num += 1;
                    let cells = split_cells(&self.cells, &line).map_err(|source| {
                        TableError::Csv {
                            line: self.line_num,
                            source,
                        }
                    })?;
                    if cells.first().is_some_and(|first| self.config.is_skipped(first)) {
                        continue;
                    }
                    rows.push(cells);
                }
            }
        }

        Ok(rows)
    }
}

impl<R: BufRead> Iterator for BlockReader<R> {
    type Item = Result<RowBlock, TableError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut rows = match self.read_rows() {
            Ok(rows) => rows,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        let expected = self.tier_numbers().block_len;
        if rows.len() < expected {
            self.done = true;
            // Trailing blank lines are not a block
            if rows.iter().flatten().all(|cell| cell.trim().is_empty()) {
                return None;
            }
            return Some(Err(TableError::TruncatedBlock {
                block: self.block_index,
                rows: rows.len(),
                expected,
            }));
        }

        let index = self.block_index;
        self.block_index += 1;
        tracing::debug!(block = index, line = self.line_num, "read block");

        let numbers = self.tier_numbers();
        let block = RowBlock::from_rows(
            index,
            std::mem::take(&mut rows[numbers.clause_id]),
            std::mem::take(&mut rows[numbers.clause_type]),
            std::mem::take(&mut rows[numbers.grammatical_relation]),
            std::mem::take(&mut rows[numbers.pos_agreement]),
        );
        if block.is_err() {
            self.done = true;
        }
        Some(block)
    }
}

/// Cell splitter for single rows: no header row, ragged rows allowed
pub fn cell_reader(delimiter: u8) -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.delimiter(delimiter).has_headers(false).flexible(true);
    builder
}

/// Split one line into cells, removing the quotes around quoted cells
///
/// An empty line is a row with a single empty cell.
pub fn split_cells(cells: &ReaderBuilder, line: &str) -> Result<Vec<String>, csv::Error> {
    let mut record = StringRecord::new();
    if !cells.from_reader(line.as_bytes()).read_record(&mut record)? {
        return Ok(vec![String::new()]);
    }
    Ok(record.iter().map(str::to_string).collect())
}
