//! Errors that abort the parse of one k-best alternative.
//!
//! These are internal defects or malformed input, never grammar coverage
//! gaps: a sentence the grammar can't fully derive still gets a tree.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
  #[error("cannot parse an empty sentence")]
  EmptySentence,

  #[error("word {word} has no analysis selected for alternative {kbest}")]
  MissingAnalysis { word: usize, kbest: usize },

  #[error("cell ({span},{start}) is outside a chart over {size} words")]
  CellOutOfBounds { span: usize, start: usize, size: usize },

  #[error("cell ({span},{start}) holds no completed edge")]
  EmptyCell { span: usize, start: usize },

  #[error("tried to shift a completed {head} edge")]
  InactiveShift { head: String },

  #[error("tree has {leaves} leaves but the sentence has {words} words")]
  LeafMismatch { leaves: usize, words: usize },
}
