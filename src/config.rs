//! Table layout configuration
//!
//! A clause table repeats a fixed block of rows. `TierNumbers` says which row
//! inside each block carries which tier and how long a block is;
//! `ParserConfig` adds the cell delimiter and the comment markers whose rows
//! are dropped before blocks are counted.
//!
//! Configurations can be built in code or read from TOML:
//!
//! ```toml
//! delimiter = "\t"
//! skip_lines = ["#", "%"]
//!
//! [tier_numbers]
//! clause_id = 2
//! clause_type = 3
//! grammatical_relation = 4
//! pos_agreement = 5
//! block_len = 8
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error in a parser configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid config: block length must be at least 1")]
    EmptyBlock,

    #[error("Invalid config: {row} offset {offset} is outside a block of {block_len} rows")]
    OffsetOutOfRange {
        row: &'static str,
        offset: usize,
        block_len: usize,
    },

    #[error("Invalid config: {first} and {second} share row offset {offset}")]
    SharedOffset {
        first: &'static str,
        second: &'static str,
        offset: usize,
    },

    #[error("Invalid config: delimiter {0:?} is not a single-byte character")]
    Delimiter(char),
}

/// Row offsets of the four captured rows within one block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TierNumbers {
    pub clause_id: usize,
    pub clause_type: usize,
    pub grammatical_relation: usize,
    pub pos_agreement: usize,
    /// Total rows per block, captured or not
    pub block_len: usize,
}

impl Default for TierNumbers {
    fn default() -> Self {
        Self {
            clause_id: 2,
            clause_type: 3,
            grammatical_relation: 4,
            pos_agreement: 5,
            block_len: 8,
        }
    }
}

impl TierNumbers {
    /// Named offsets, in the order the rows are reported in errors
    pub fn named_offsets(&self) -> [(&'static str, usize); 4] {
        [
            ("clause_id", self.clause_id),
            ("clause_type", self.clause_type),
            ("grammatical_relation", self.grammatical_relation),
            ("pos_agreement", self.pos_agreement),
        ]
    }

    /// Check that every offset falls inside the block and no two rows collide
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_len == 0 {
            return Err(ConfigError::EmptyBlock);
        }

        let offsets = self.named_offsets();
        for (i, &(row, offset)) in offsets.iter().enumerate() {
            if offset >= self.block_len {
                return Err(ConfigError::OffsetOutOfRange {
                    row,
                    offset,
                    block_len: self.block_len,
                });
            }
            if let Some(&(first, _)) = offsets[..i].iter().find(|(_, o)| *o == offset) {
                return Err(ConfigError::SharedOffset {
                    first,
                    second: row,
                    offset,
                });
            }
        }

        Ok(())
    }
}

/// Everything the block reader needs to know about a table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    pub delimiter: char,
    /// Rows whose first cell equals one of these are ignored entirely
    pub skip_lines: Vec<String>,
    pub tier_numbers: TierNumbers,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            skip_lines: Vec::new(),
            tier_numbers: TierNumbers::default(),
        }
    }
}

impl ParserConfig {
    pub fn new(tier_numbers: TierNumbers) -> Self {
        Self {
            tier_numbers,
            ..Self::default()
        }
    }

    pub fn with_skip_lines<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_lines = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse and validate a TOML configuration
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ParserConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delimiter_byte()?;
        self.tier_numbers.validate()
    }

    /// The delimiter as a byte, for the csv cell splitter
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(ConfigError::Delimiter(self.delimiter))
        }
    }

    /// Whether a row starting with this cell should be dropped
    pub fn is_skipped(&self, first_cell: &str) -> bool {
        self.skip_lines.iter().any(|marker| marker == first_cell)
    }
}
